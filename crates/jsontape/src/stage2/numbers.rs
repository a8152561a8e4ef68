//! Number grammar validation and materialization.
//!
//! The token is validated against the JSON number grammar first; only
//! then is it converted. Integers that fit i64 take the integer path,
//! everything else (fraction, exponent, or overflow) becomes a double.

use crate::error::ErrorCode;

use super::is_structural_or_whitespace;

pub(super) enum ParsedNumber {
    Int(i64),
    Double(f64),
}

/// Parses the number token starting at `offset`. The scan is bounded by
/// the input length; trailing padding bytes are never consulted.
pub(super) fn parse_number(bytes: &[u8], offset: usize) -> Result<ParsedNumber, ErrorCode> {
    let mut idx = offset;
    let negative = bytes.get(idx).copied() == Some(b'-');
    if negative {
        idx += 1;
    }

    let digits_start = idx;
    match bytes.get(idx).copied() {
        Some(b'0') => {
            idx += 1;
            // Leading zero admits no further integer digits.
            if matches!(bytes.get(idx).copied(), Some(b'0'..=b'9')) {
                return Err(ErrorCode::InvalidNumber);
            }
        }
        Some(b'1'..=b'9') => {
            while matches!(bytes.get(idx).copied(), Some(b'0'..=b'9')) {
                idx += 1;
            }
        }
        _ => return Err(ErrorCode::InvalidNumber),
    }
    let digits_end = idx;

    let mut is_double = false;
    if bytes.get(idx).copied() == Some(b'.') {
        is_double = true;
        idx += 1;
        let fraction_start = idx;
        while matches!(bytes.get(idx).copied(), Some(b'0'..=b'9')) {
            idx += 1;
        }
        if idx == fraction_start {
            return Err(ErrorCode::InvalidNumber);
        }
    }
    if matches!(bytes.get(idx).copied(), Some(b'e' | b'E')) {
        is_double = true;
        idx += 1;
        if matches!(bytes.get(idx).copied(), Some(b'+' | b'-')) {
            idx += 1;
        }
        let exponent_start = idx;
        while matches!(bytes.get(idx).copied(), Some(b'0'..=b'9')) {
            idx += 1;
        }
        if idx == exponent_start {
            return Err(ErrorCode::InvalidNumber);
        }
    }

    match bytes.get(idx) {
        None => {}
        Some(&byte) if is_structural_or_whitespace(byte) => {}
        Some(_) => return Err(ErrorCode::InvalidNumber),
    }

    if !is_double {
        if let Some(value) = integer_value(&bytes[digits_start..digits_end], negative) {
            return Ok(ParsedNumber::Int(value));
        }
    }
    // The token passed the grammar above, so this parse only fails on
    // values a double cannot hold at all; overflow rounds to infinity the
    // way the conversion routine defines it.
    fast_float::parse(&bytes[offset..idx])
        .map(ParsedNumber::Double)
        .map_err(|_| ErrorCode::InvalidNumber)
}

/// Digits-to-i64, or `None` when the magnitude cannot be represented.
fn integer_value(digits: &[u8], negative: bool) -> Option<i64> {
    let mut magnitude = 0u64;
    for &digit in digits {
        magnitude = magnitude
            .checked_mul(10)?
            .checked_add(u64::from(digit - b'0'))?;
    }
    if negative {
        // 2^63 is representable only as i64::MIN.
        (magnitude <= 1u64 << 63).then(|| 0i64.wrapping_sub_unsigned(magnitude))
    } else {
        i64::try_from(magnitude).ok()
    }
}
