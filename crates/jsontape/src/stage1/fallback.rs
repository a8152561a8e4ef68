//! Portable block classifier: one pass over the 64 bytes, setting mask
//! bits per byte. Used when no SIMD tier applies.

use super::{Blocks, Classifier};

pub(crate) struct Fallback;

impl Classifier for Fallback {
    #[inline(always)]
    unsafe fn classify(block: *const u8) -> Blocks {
        // SAFETY: the caller guarantees 64 readable bytes.
        let bytes = unsafe { core::slice::from_raw_parts(block, 64) };
        let mut out = Blocks::default();
        for (i, &byte) in bytes.iter().enumerate() {
            let bit = 1u64 << i;
            match byte {
                b'\\' => out.backslash |= bit,
                b'"' => out.quote |= bit,
                b' ' | b'\t' | b'\n' | b'\r' => out.whitespace |= bit,
                b'{' | b'}' | b'[' | b']' | b':' | b',' => out.op |= bit,
                _ => {}
            }
        }
        out
    }
}
