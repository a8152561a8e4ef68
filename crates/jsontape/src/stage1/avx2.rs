//! AVX2 block classifier: two 32-byte loads per block, one compare and
//! movemask per character class lane.
#![allow(clippy::cast_sign_loss, clippy::cast_possible_wrap)]

use core::arch::x86_64::{
    __m256i, _mm256_cmpeq_epi8, _mm256_loadu_si256, _mm256_movemask_epi8, _mm256_or_si256,
    _mm256_set1_epi8,
};

use super::{Blocks, Classifier};

pub(crate) struct Avx2;

#[inline(always)]
unsafe fn eq(v: __m256i, byte: u8) -> __m256i {
    // SAFETY: caller runs with AVX2 available.
    unsafe { _mm256_cmpeq_epi8(v, _mm256_set1_epi8(byte as i8)) }
}

#[inline(always)]
unsafe fn whitespace(v: __m256i) -> __m256i {
    // SAFETY: caller runs with AVX2 available.
    unsafe {
        _mm256_or_si256(
            _mm256_or_si256(eq(v, b' '), eq(v, b'\t')),
            _mm256_or_si256(eq(v, b'\n'), eq(v, b'\r')),
        )
    }
}

#[inline(always)]
unsafe fn op(v: __m256i) -> __m256i {
    // SAFETY: caller runs with AVX2 available.
    unsafe {
        _mm256_or_si256(
            _mm256_or_si256(
                _mm256_or_si256(eq(v, b'{'), eq(v, b'}')),
                _mm256_or_si256(eq(v, b'['), eq(v, b']')),
            ),
            _mm256_or_si256(eq(v, b':'), eq(v, b',')),
        )
    }
}

#[inline(always)]
unsafe fn combine(lo: __m256i, hi: __m256i) -> u64 {
    // SAFETY: caller runs with AVX2 available.
    unsafe {
        let lo_bits = _mm256_movemask_epi8(lo) as u32;
        let hi_bits = _mm256_movemask_epi8(hi) as u32;
        u64::from(lo_bits) | (u64::from(hi_bits) << 32)
    }
}

impl Classifier for Avx2 {
    #[inline(always)]
    unsafe fn classify(block: *const u8) -> Blocks {
        // SAFETY: the caller guarantees 64 readable bytes; unaligned loads.
        unsafe {
            let lo = _mm256_loadu_si256(block.cast());
            let hi = _mm256_loadu_si256(block.add(32).cast());
            Blocks {
                backslash: combine(eq(lo, b'\\'), eq(hi, b'\\')),
                quote: combine(eq(lo, b'"'), eq(hi, b'"')),
                whitespace: combine(whitespace(lo), whitespace(hi)),
                op: combine(op(lo), op(hi)),
            }
        }
    }
}
