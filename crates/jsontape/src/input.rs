//! Input buffer guard.
//!
//! Stage 2's in-string scans read in fixed-width steps and may touch up to
//! [`PADDING`] bytes past the logical end of the input. That over-read is
//! harmless as long as the bytes are *readable*; their content never
//! reaches a parse result. The guard decides, per parse call, whether the
//! caller's buffer can be over-read in place: only when the padding window
//! would spill onto the next memory page does it copy the input into an
//! owned buffer with a zero-filled tail. The owned buffer is dropped when
//! the guard goes out of scope, on success and error paths alike.

use alloc::vec::Vec;

use crate::error::ErrorCode;

/// Bytes past the logical input length the parser may read.
///
/// Callers using [`parse_unpadded`](crate::parse_unpadded) guarantee their
/// buffer stays readable this far past the end; the content of those bytes
/// does not matter.
pub const PADDING: usize = 32;

const DEFAULT_PAGE_SIZE: usize = 4096;

/// Input bytes with a readable padding window past the end.
///
/// `Borrowed` promises readability either by the page computation (the
/// window stays on the input's last page) or by the caller's contract in
/// the unpadded entry point. `Owned` is a copy whose padding really exists
/// and is zeroed.
pub(crate) enum PaddedInput<'a> {
    Borrowed(&'a [u8]),
    Owned { buf: Vec<u8>, len: usize },
}

impl<'a> PaddedInput<'a> {
    /// Wraps `input` for parsing, copying it into a padded buffer only
    /// when over-reading in place could fault.
    pub(crate) fn prepare(
        input: &'a [u8],
        reallocate_if_needed: bool,
    ) -> Result<Self, ErrorCode> {
        if !reallocate_if_needed || input.is_empty() {
            return Ok(Self::Borrowed(input));
        }
        if !tail_crosses_page(input.as_ptr() as usize, input.len(), page_size()) {
            return Ok(Self::Borrowed(input));
        }
        let mut buf = Vec::new();
        buf.try_reserve_exact(input.len() + PADDING)
            .map_err(|_| ErrorCode::OutOfMemory)?;
        buf.extend_from_slice(input);
        buf.resize(input.len() + PADDING, 0);
        Ok(Self::Owned {
            buf,
            len: input.len(),
        })
    }

    /// The logical input bytes, without padding.
    pub(crate) fn bytes(&self) -> &[u8] {
        match self {
            Self::Borrowed(slice) => slice,
            Self::Owned { buf, len } => &buf[..*len],
        }
    }

    /// Base pointer for reads that may run into the padding window.
    ///
    /// Reads must stay below `bytes().len() + PADDING`.
    pub(crate) fn padded_ptr(&self) -> *const u8 {
        match self {
            Self::Borrowed(slice) => slice.as_ptr(),
            Self::Owned { buf, .. } => buf.as_ptr(),
        }
    }

    /// Whether `prepare` copied the input.
    pub(crate) fn was_copied(&self) -> bool {
        matches!(self, Self::Owned { .. })
    }
}

/// True when reading [`PADDING`] bytes past the input's last byte could
/// touch the page after the one that byte lives on.
///
/// Pure in all three arguments so the decision table is testable without
/// arranging real page boundaries.
pub(crate) fn tail_crosses_page(addr: usize, len: usize, page_size: usize) -> bool {
    let last = addr + len.saturating_sub(1);
    (last % page_size) + PADDING >= page_size
}

#[cfg(unix)]
fn page_size() -> usize {
    // SAFETY: sysconf has no preconditions.
    let raw = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    match usize::try_from(raw) {
        Ok(size) if size > 0 => size,
        _ => DEFAULT_PAGE_SIZE,
    }
}

#[cfg(not(unix))]
fn page_size() -> usize {
    DEFAULT_PAGE_SIZE
}
