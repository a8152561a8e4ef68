//! Pipeline selection and the parse entry points.
//!
//! The capability probe runs once per process and the resolved pipeline
//! is cached alongside it; every later parse reuses that choice. A tier
//! that detection never proved is never entered, which is what makes the
//! `unsafe` stage-1 calls sound.

use core::sync::atomic::{AtomicU8, Ordering};

use log::error;

use crate::capability::{self, CapabilityTier};
use crate::document::{DEFAULT_MAX_DEPTH, ParsedDocument};
use crate::error::ErrorCode;
use crate::input::PaddedInput;
use crate::{stage1, stage2};

/// The stage-1 implementation a parse will run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Pipeline {
    #[cfg(target_arch = "x86_64")]
    Avx2,
    #[cfg(target_arch = "x86_64")]
    Sse42,
    #[cfg(target_arch = "aarch64")]
    Neon,
    #[cfg(feature = "fallback")]
    Fallback,
}

const UNRESOLVED: u8 = 0;
const UNSUPPORTED: u8 = 1;

static CACHED: AtomicU8 = AtomicU8::new(UNRESOLVED);

fn encode(pipeline: Pipeline) -> u8 {
    match pipeline {
        #[cfg(target_arch = "x86_64")]
        Pipeline::Avx2 => 2,
        #[cfg(target_arch = "x86_64")]
        Pipeline::Sse42 => 3,
        #[cfg(target_arch = "aarch64")]
        Pipeline::Neon => 4,
        #[cfg(feature = "fallback")]
        Pipeline::Fallback => 5,
    }
}

fn decode(raw: u8) -> Result<Pipeline, ErrorCode> {
    match raw {
        #[cfg(target_arch = "x86_64")]
        2 => Ok(Pipeline::Avx2),
        #[cfg(target_arch = "x86_64")]
        3 => Ok(Pipeline::Sse42),
        #[cfg(target_arch = "aarch64")]
        4 => Ok(Pipeline::Neon),
        #[cfg(feature = "fallback")]
        5 => Ok(Pipeline::Fallback),
        _ => Err(ErrorCode::UnsupportedHardware),
    }
}

fn select_from_tier() -> Result<Pipeline, ErrorCode> {
    let tier = capability::detect();
    #[cfg(target_arch = "x86_64")]
    match tier {
        CapabilityTier::Avx2 => return Ok(Pipeline::Avx2),
        CapabilityTier::Sse42 => return Ok(Pipeline::Sse42),
        _ => {}
    }
    #[cfg(target_arch = "aarch64")]
    if tier == CapabilityTier::Neon {
        return Ok(Pipeline::Neon);
    }
    let _ = tier;
    #[cfg(feature = "fallback")]
    {
        Ok(Pipeline::Fallback)
    }
    #[cfg(not(feature = "fallback"))]
    {
        Err(ErrorCode::UnsupportedHardware)
    }
}

/// Resolves the pipeline once per process and caches the choice.
///
/// Concurrent first calls may race the resolution; every racer computes
/// the same answer from the same host, so the cache is write-once in
/// effect.
fn resolve() -> Result<Pipeline, ErrorCode> {
    match CACHED.load(Ordering::Relaxed) {
        UNRESOLVED => match select_from_tier() {
            Ok(pipeline) => {
                CACHED.store(encode(pipeline), Ordering::Relaxed);
                Ok(pipeline)
            }
            Err(code) => {
                CACHED.store(UNSUPPORTED, Ordering::Relaxed);
                Err(code)
            }
        },
        raw => decode(raw),
    }
}

fn stage1_scan(
    pipeline: Pipeline,
    bytes: &[u8],
    doc: &mut ParsedDocument,
) -> Result<(), ErrorCode> {
    match pipeline {
        #[cfg(target_arch = "x86_64")]
        // SAFETY: selected only after detection proved AVX2.
        Pipeline::Avx2 => unsafe { stage1::scan_avx2(bytes, doc) },
        #[cfg(target_arch = "x86_64")]
        // SAFETY: selected only after detection proved SSE4.2.
        Pipeline::Sse42 => unsafe { stage1::scan_sse42(bytes, doc) },
        #[cfg(target_arch = "aarch64")]
        // SAFETY: NEON is architecturally guaranteed on aarch64.
        Pipeline::Neon => unsafe { stage1::scan_neon(bytes, doc) },
        #[cfg(feature = "fallback")]
        Pipeline::Fallback => stage1::scan_fallback(bytes, doc),
    }
}

fn run_to_completion(
    pipeline: Pipeline,
    padded: &PaddedInput<'_>,
    doc: &mut ParsedDocument,
) -> Result<(), ErrorCode> {
    doc.start_parse();
    let bytes = padded.bytes();
    let staged = match stage1_scan(pipeline, bytes, doc) {
        // SAFETY: `bytes` comes out of a PaddedInput, which keeps PADDING
        // bytes past the end readable.
        Ok(()) => unsafe { stage2::build_tape(bytes, doc) },
        Err(code) => Err(code),
    };
    match staged {
        Ok(()) => {
            doc.record_success();
            Ok(())
        }
        Err(code) => {
            doc.record_failure(code);
            Err(code)
        }
    }
}

/// Parses `input` into `doc`, reusing the document's buffers.
///
/// The input tail is guarded first: when it sits close enough to a page
/// boundary that the parser's over-read window could cross, the input is
/// copied into a padded temporary for the duration of the call.
///
/// # Errors
///
/// [`ErrorCode::UnsupportedHardware`], [`ErrorCode::CapacityExceeded`],
/// and guard [`ErrorCode::OutOfMemory`] fail before the document is
/// touched, leaving any prior parse intact. Stage errors mark the
/// document invalid and are returned as well.
pub fn parse(input: &[u8], doc: &mut ParsedDocument) -> Result<(), ErrorCode> {
    let pipeline = resolve()?;
    if input.len() > doc.byte_capacity() {
        return Err(ErrorCode::CapacityExceeded);
    }
    let padded = PaddedInput::prepare(input, true)?;
    run_to_completion(pipeline, &padded, doc)
}

/// Parses without guarding the input tail; nothing is ever copied.
///
/// # Safety
///
/// The caller must guarantee that `input.len() + PADDING` bytes are
/// readable from the start of `input`. The bytes past `input.len()` may
/// hold anything; they never influence the parse result.
///
/// # Errors
///
/// Same as [`parse`].
pub unsafe fn parse_unpadded(input: &[u8], doc: &mut ParsedDocument) -> Result<(), ErrorCode> {
    let pipeline = resolve()?;
    if input.len() > doc.byte_capacity() {
        return Err(ErrorCode::CapacityExceeded);
    }
    let padded = PaddedInput::prepare(input, false)?;
    run_to_completion(pipeline, &padded, doc)
}

/// Allocates a document sized for `input` and parses into it.
///
/// Never fails outward; inspect the returned document's
/// [`ParsedDocument::is_valid`] and [`ParsedDocument::error`] instead.
#[must_use]
pub fn build_document(input: &[u8]) -> ParsedDocument {
    let mut doc = ParsedDocument::new();
    if let Err(code) = doc.allocate_capacity(input.len(), DEFAULT_MAX_DEPTH) {
        error!("allocating for a {} byte document failed: {code}", input.len());
        doc.record_failure(code);
        return doc;
    }
    if let Err(code) = parse(input, &mut doc) {
        // Pre-stage failures leave no mark on the document themselves.
        if doc.error().is_none() {
            doc.record_failure(code);
        }
    }
    doc
}
