//! SSE4.2-tier block classifier: four 16-byte loads per block. The block
//! arithmetic itself only needs SSE2-level compares and movemask; the tier
//! keeps the dispatch ladder's gate.
#![allow(clippy::cast_sign_loss, clippy::cast_possible_wrap)]

use core::arch::x86_64::{
    __m128i, _mm_cmpeq_epi8, _mm_loadu_si128, _mm_movemask_epi8, _mm_or_si128, _mm_set1_epi8,
};

use super::{Blocks, Classifier};

pub(crate) struct Sse42;

#[inline(always)]
unsafe fn eq(v: __m128i, byte: u8) -> __m128i {
    // SAFETY: SSE2 is baseline on x86-64.
    unsafe { _mm_cmpeq_epi8(v, _mm_set1_epi8(byte as i8)) }
}

#[inline(always)]
unsafe fn whitespace(v: __m128i) -> __m128i {
    // SAFETY: SSE2 is baseline on x86-64.
    unsafe {
        _mm_or_si128(
            _mm_or_si128(eq(v, b' '), eq(v, b'\t')),
            _mm_or_si128(eq(v, b'\n'), eq(v, b'\r')),
        )
    }
}

#[inline(always)]
unsafe fn op(v: __m128i) -> __m128i {
    // SAFETY: SSE2 is baseline on x86-64.
    unsafe {
        _mm_or_si128(
            _mm_or_si128(
                _mm_or_si128(eq(v, b'{'), eq(v, b'}')),
                _mm_or_si128(eq(v, b'['), eq(v, b']')),
            ),
            _mm_or_si128(eq(v, b':'), eq(v, b',')),
        )
    }
}

#[inline(always)]
unsafe fn mask16(v: __m128i) -> u64 {
    // SAFETY: SSE2 is baseline on x86-64.
    unsafe { _mm_movemask_epi8(v) as u32 as u64 }
}

impl Classifier for Sse42 {
    #[inline(always)]
    unsafe fn classify(block: *const u8) -> Blocks {
        // SAFETY: the caller guarantees 64 readable bytes; unaligned loads.
        unsafe {
            let mut out = Blocks::default();
            let mut chunk = 0usize;
            while chunk < 4 {
                let v = _mm_loadu_si128(block.add(chunk * 16).cast());
                let shift = chunk * 16;
                out.backslash |= mask16(eq(v, b'\\')) << shift;
                out.quote |= mask16(eq(v, b'"')) << shift;
                out.whitespace |= mask16(whitespace(v)) << shift;
                out.op |= mask16(op(v)) << shift;
                chunk += 1;
            }
            out
        }
    }
}
