//! Stage 1: the structural scanner.
//!
//! The input is consumed in 64-byte blocks. A tier-specific classifier
//! turns each block into four bitmasks (backslashes, quotes, whitespace,
//! structural characters); everything after that is shared 64-bit mask
//! arithmetic: resolve which characters are escaped (odd-length backslash
//! runs, with a carry across blocks), derive the inside-string mask from
//! quote parity (prefix XOR, carried across blocks), flag scalar starts
//! that follow whitespace or a structural character, and flatten the final
//! mask into byte offsets.
//!
//! The offsets are strictly increasing and cover every `{ } [ ] : ,`, the
//! opening quote of every string, and the first byte of every number or
//! literal outside strings. A trailing partial block is copied into a
//! space-filled local buffer before classification, so stage 1 itself
//! never reads past the input.

use alloc::vec::Vec;

use crate::document::ParsedDocument;
use crate::error::ErrorCode;

#[cfg(target_arch = "x86_64")]
mod avx2;
#[cfg(feature = "fallback")]
mod fallback;
#[cfg(target_arch = "aarch64")]
mod neon;
#[cfg(target_arch = "x86_64")]
mod sse42;

/// Per-block classification masks; bit `i` describes byte `i` of the block.
#[derive(Default, Clone, Copy)]
pub(crate) struct Blocks {
    pub backslash: u64,
    pub quote: u64,
    pub whitespace: u64,
    pub op: u64,
}

/// One SIMD tier's block classifier.
pub(crate) trait Classifier {
    /// Classifies one 64-byte block.
    ///
    /// # Safety
    ///
    /// `block` must point at 64 readable bytes.
    unsafe fn classify(block: *const u8) -> Blocks;
}

/// Carries threaded through consecutive blocks.
struct ScanState {
    /// 1 when the previous block ended in an odd-length backslash run.
    ends_odd_backslash: u64,
    /// All-ones while inside a string that started in an earlier block.
    inside_quote: u64,
    /// Bit 63 of the previous block's structural-or-whitespace mask; the
    /// virtual byte before the input counts as whitespace so a scalar at
    /// offset 0 is flagged.
    ends_pseudo_pred: u64,
}

const EVEN_BITS: u64 = 0x5555_5555_5555_5555;

fn prefix_xor(bitmask: u64) -> u64 {
    let mut x = bitmask;
    x ^= x << 1;
    x ^= x << 2;
    x ^= x << 4;
    x ^= x << 8;
    x ^= x << 16;
    x ^= x << 32;
    x
}

/// Marks characters escaped by an odd-length backslash run.
fn odd_backslash_ends(backslash: u64, state: &mut ScanState) -> u64 {
    let start_edges = backslash & !(backslash << 1);
    let even_start_mask = EVEN_BITS ^ state.ends_odd_backslash;
    let even_starts = start_edges & even_start_mask;
    let odd_starts = start_edges & !even_start_mask;

    let even_carries = backslash.wrapping_add(even_starts);
    let (mut odd_carries, ends_odd) = backslash.overflowing_add(odd_starts);
    odd_carries |= state.ends_odd_backslash;
    state.ends_odd_backslash = u64::from(ends_odd);

    let even_carry_ends = even_carries & !backslash;
    let odd_carry_ends = odd_carries & !backslash;
    (even_carry_ends & !EVEN_BITS) | (odd_carry_ends & EVEN_BITS)
}

#[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
fn process_block(
    blocks: Blocks,
    block_start: usize,
    state: &mut ScanState,
    indexes: &mut Vec<u32>,
) {
    let escaped = odd_backslash_ends(blocks.backslash, state);

    let quote_bits = blocks.quote & !escaped;
    let quote_mask = prefix_xor(quote_bits) ^ state.inside_quote;
    state.inside_quote = (quote_mask as i64 >> 63) as u64;

    let mut structurals = blocks.op & !quote_mask;
    structurals |= quote_bits;

    let pseudo_pred = structurals | blocks.whitespace;
    let shifted_pseudo_pred = (pseudo_pred << 1) | state.ends_pseudo_pred;
    state.ends_pseudo_pred = pseudo_pred >> 63;
    let pseudo_structurals = shifted_pseudo_pred & !blocks.whitespace & !quote_mask;
    structurals |= pseudo_structurals;

    // Closing quotes served their purpose in the parity math; only the
    // opening quote of each string is reported.
    structurals &= !(quote_bits & !quote_mask);

    flatten_bits(structurals, block_start, indexes);
}

#[allow(clippy::cast_possible_truncation)]
fn flatten_bits(structurals: u64, block_start: usize, indexes: &mut Vec<u32>) {
    let mut bits = structurals;
    while bits != 0 {
        // Offsets stay below the u32-bounded input length.
        indexes.push((block_start + bits.trailing_zeros() as usize) as u32);
        bits &= bits.wrapping_sub(1);
    }
}

/// Runs the scan with classifier `C`, filling the document's
/// structural-index scratch.
fn scan<C: Classifier>(input: &[u8], doc: &mut ParsedDocument) -> Result<(), ErrorCode> {
    let len = input.len();
    let indexes = &mut doc.structural_indexes;
    let mut state = ScanState {
        ends_odd_backslash: 0,
        inside_quote: 0,
        ends_pseudo_pred: 1,
    };

    let mut idx = 0usize;
    while idx + 64 <= len {
        // SAFETY: idx + 64 <= len, so 64 bytes are readable.
        let blocks = unsafe { C::classify(input.as_ptr().add(idx)) };
        process_block(blocks, idx, &mut state, indexes);
        idx += 64;
    }
    if idx < len {
        // Spaces are whitespace, so the fill can introduce no structurals
        // and terminates any scalar cleanly.
        let mut tail = [0x20u8; 64];
        tail[..len - idx].copy_from_slice(&input[idx..]);
        // SAFETY: the local buffer is 64 bytes.
        let blocks = unsafe { C::classify(tail.as_ptr()) };
        process_block(blocks, idx, &mut state, indexes);
    }

    if state.inside_quote != 0 {
        return Err(ErrorCode::UnterminatedString);
    }
    if indexes.is_empty() {
        return Err(ErrorCode::EmptyInput);
    }
    // Sentinel used as an offset bound by stage 2; never dereferenced.
    indexes.push(u32::try_from(len).map_err(|_| ErrorCode::CapacityExceeded)?);
    Ok(())
}

/// AVX2 scan entry.
///
/// # Safety
///
/// The host CPU must support AVX2 (guaranteed by dispatch-time detection).
#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
pub(crate) unsafe fn scan_avx2(input: &[u8], doc: &mut ParsedDocument) -> Result<(), ErrorCode> {
    scan::<avx2::Avx2>(input, doc)
}

/// SSE4.2-tier scan entry.
///
/// # Safety
///
/// The host CPU must support SSE4.2 (guaranteed by dispatch-time
/// detection).
#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "sse4.2")]
pub(crate) unsafe fn scan_sse42(input: &[u8], doc: &mut ParsedDocument) -> Result<(), ErrorCode> {
    scan::<sse42::Sse42>(input, doc)
}

/// NEON scan entry.
///
/// # Safety
///
/// NEON is architecturally mandatory on aarch64; callable whenever the
/// dispatcher selected it.
#[cfg(target_arch = "aarch64")]
#[target_feature(enable = "neon")]
pub(crate) unsafe fn scan_neon(input: &[u8], doc: &mut ParsedDocument) -> Result<(), ErrorCode> {
    scan::<neon::Neon>(input, doc)
}

/// Portable scan entry.
#[cfg(feature = "fallback")]
pub(crate) fn scan_fallback(input: &[u8], doc: &mut ParsedDocument) -> Result<(), ErrorCode> {
    scan::<fallback::Fallback>(input, doc)
}
