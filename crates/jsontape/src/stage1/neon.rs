//! NEON block classifier: four 16-byte loads per block. Compare results
//! are all-ones lanes; the mask is folded out through a 16-byte store.

use core::arch::aarch64::{uint8x16_t, vceqq_u8, vdupq_n_u8, vld1q_u8, vorrq_u8, vst1q_u8};

use super::{Blocks, Classifier};

pub(crate) struct Neon;

#[inline(always)]
unsafe fn eq(v: uint8x16_t, byte: u8) -> uint8x16_t {
    // SAFETY: NEON is mandatory on aarch64.
    unsafe { vceqq_u8(v, vdupq_n_u8(byte)) }
}

#[inline(always)]
unsafe fn whitespace(v: uint8x16_t) -> uint8x16_t {
    // SAFETY: NEON is mandatory on aarch64.
    unsafe {
        vorrq_u8(
            vorrq_u8(eq(v, b' '), eq(v, b'\t')),
            vorrq_u8(eq(v, b'\n'), eq(v, b'\r')),
        )
    }
}

#[inline(always)]
unsafe fn op(v: uint8x16_t) -> uint8x16_t {
    // SAFETY: NEON is mandatory on aarch64.
    unsafe {
        vorrq_u8(
            vorrq_u8(
                vorrq_u8(eq(v, b'{'), eq(v, b'}')),
                vorrq_u8(eq(v, b'['), eq(v, b']')),
            ),
            vorrq_u8(eq(v, b':'), eq(v, b',')),
        )
    }
}

#[inline(always)]
unsafe fn mask16(v: uint8x16_t) -> u64 {
    let mut lanes = [0u8; 16];
    // SAFETY: the local buffer holds exactly one vector.
    unsafe { vst1q_u8(lanes.as_mut_ptr(), v) };
    let mut bits = 0u64;
    let mut lane = 0;
    while lane < 16 {
        bits |= u64::from(lanes[lane] & 1) << lane;
        lane += 1;
    }
    bits
}

impl Classifier for Neon {
    #[inline(always)]
    unsafe fn classify(block: *const u8) -> Blocks {
        // SAFETY: the caller guarantees 64 readable bytes; unaligned loads.
        unsafe {
            let mut out = Blocks::default();
            let mut chunk = 0usize;
            while chunk < 4 {
                let v = vld1q_u8(block.add(chunk * 16));
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
