//! String parsing and de-escaping into the side buffer.
//!
//! Each string becomes one record in the buffer: a little-endian u32
//! length prefix, the de-escaped UTF-8 bytes, then a NUL. The tape word
//! stores the record's starting offset. Content may itself contain NUL;
//! only the length prefix is authoritative.

use alloc::vec::Vec;
use core::ptr;

use crate::error::ErrorCode;
use crate::tape::STRING_LEN_BYTES;

/// Fixed step of the in-string scan; reads may extend this far past the
/// current position, which the padded-input contract keeps in bounds.
const CHUNK: usize = 16;

/// Parses the string whose opening quote sits at `offset`, appending a
/// record to `buf` and returning the record's offset.
///
/// # Safety
///
/// `bytes` must be readable for [`crate::input::PADDING`] bytes past its
/// end.
pub(super) unsafe fn parse_string(
    bytes: &[u8],
    offset: usize,
    buf: &mut Vec<u8>,
) -> Result<usize, ErrorCode> {
    let record_start = buf.len();
    buf.extend_from_slice(&[0u8; STRING_LEN_BYTES]);
    let content_start = buf.len();

    let len = bytes.len();
    let mut src = offset + 1;
    loop {
        // Stage 1 proved the closing quote exists before the input ends;
        // reaching it breaks out below.
        if src >= len {
            return Err(ErrorCode::UnterminatedString);
        }
        let mut chunk = [0u8; CHUNK];
        // SAFETY: src < len, and the contract guarantees PADDING (>= CHUNK)
        // readable bytes past the end.
        unsafe { ptr::copy_nonoverlapping(bytes.as_ptr().add(src), chunk.as_mut_ptr(), CHUNK) };

        let mut special = None;
        for (at, &byte) in chunk.iter().enumerate() {
            if byte == b'"' || byte == b'\\' || byte < 0x20 {
                special = Some((at, byte));
                break;
            }
        }
        match special {
            // The closer is still ahead, so all CHUNK bytes are content.
            None => {
                buf.extend_from_slice(&chunk);
                src += CHUNK;
            }
            Some((at, b'"')) => {
                buf.extend_from_slice(&chunk[..at]);
                return finish_record(record_start, content_start, buf);
            }
            Some((at, b'\\')) => {
                buf.extend_from_slice(&chunk[..at]);
                src = unescape(bytes, src + at, buf)?;
            }
            Some(_) => return Err(ErrorCode::UnescapedControl),
        }
    }
}

/// Validates the accumulated content, patches the length prefix, and
/// terminates the record.
fn finish_record(
    record_start: usize,
    content_start: usize,
    buf: &mut Vec<u8>,
) -> Result<usize, ErrorCode> {
    let content = &buf[content_start..];
    if core::str::from_utf8(content).is_err() {
        return Err(ErrorCode::InvalidUtf8);
    }
    let prefix = u32::try_from(content.len()).map_err(|_| ErrorCode::CapacityExceeded)?;
    buf[record_start..record_start + STRING_LEN_BYTES].copy_from_slice(&prefix.to_le_bytes());
    buf.push(0);
    Ok(record_start)
}

/// Decodes one escape sequence starting at the backslash at `src`;
/// returns the offset just past it.
fn unescape(bytes: &[u8], src: usize, buf: &mut Vec<u8>) -> Result<usize, ErrorCode> {
    let code = *bytes.get(src + 1).ok_or(ErrorCode::UnterminatedString)?;
    let literal = match code {
        b'"' => b'"',
        b'\\' => b'\\',
        b'/' => b'/',
        b'b' => 0x08,
        b'f' => 0x0C,
        b'n' => b'\n',
        b'r' => b'\r',
        b't' => b'\t',
        b'u' => return unescape_unicode(bytes, src, buf),
        _ => return Err(ErrorCode::InvalidEscape),
    };
    buf.push(literal);
    Ok(src + 2)
}

/// Decodes `\uXXXX`, pairing surrogates; `src` sits at the backslash.
fn unescape_unicode(bytes: &[u8], src: usize, buf: &mut Vec<u8>) -> Result<usize, ErrorCode> {
    let first = hex4(bytes.get(src + 2..src + 6).ok_or(ErrorCode::InvalidEscape)?)?;
    if (0xDC00..=0xDFFF).contains(&first) {
        return Err(ErrorCode::InvalidUtf8);
    }
    if (0xD800..=0xDBFF).contains(&first) {
        if bytes.get(src + 6..src + 8) != Some(b"\\u") {
            return Err(ErrorCode::InvalidUtf8);
        }
        let second = hex4(bytes.get(src + 8..src + 12).ok_or(ErrorCode::InvalidEscape)?)?;
        if !(0xDC00..=0xDFFF).contains(&second) {
            return Err(ErrorCode::InvalidUtf8);
        }
        let code_point = 0x10000 + ((first - 0xD800) << 10) + (second - 0xDC00);
        push_code_point(code_point, buf)?;
        return Ok(src + 12);
    }
    push_code_point(first, buf)?;
    Ok(src + 6)
}

fn push_code_point(code_point: u32, buf: &mut Vec<u8>) -> Result<(), ErrorCode> {
    let ch = char::from_u32(code_point).ok_or(ErrorCode::InvalidUtf8)?;
    buf.extend_from_slice(ch.encode_utf8(&mut [0u8; 4]).as_bytes());
    Ok(())
}

fn hex4(digits: &[u8]) -> Result<u32, ErrorCode> {
    let mut value = 0u32;
    for &digit in digits {
        let nibble = match digit {
            b'0'..=b'9' => u32::from(digit - b'0'),
            b'a'..=b'f' => u32::from(digit - b'a' + 10),
            b'A'..=b'F' => u32::from(digit - b'A' + 10),
            _ => return Err(ErrorCode::InvalidEscape),
        };
        value = (value << 4) | nibble;
    }
    Ok(value)
}
