use alloc::string::ToString;
use alloc::vec;
use alloc::vec::Vec;

use bstr::ByteSlice;

use crate::capability::{self, CapabilityTier};
use crate::{ErrorCode, ParsedDocument, stage1};

fn offsets(input: &[u8]) -> Vec<u32> {
    let mut doc = ParsedDocument::with_capacity(input.len().max(1)).unwrap();
    stage1::scan_fallback(input, &mut doc).unwrap();
    doc.structural_indexes.clone()
}

#[test]
fn test_object_offsets() {
    // Opening quotes count; closing quotes and in-string bytes do not.
    // The final entry is the length sentinel.
    assert_eq!(offsets(br#"{"a": 1}"#), vec![0, 1, 4, 6, 7, 8]);
}

#[test]
fn test_closing_quote_not_reported() {
    assert_eq!(offsets(br#""ab""#), vec![0, 4]);
}

#[test]
fn test_escaped_quote_stays_inside_string() {
    assert_eq!(offsets(br#""a\"b""#), vec![0, 6]);
}

#[test]
fn test_backslash_run_parity() {
    // "\\" : the even run leaves the final quote as the closer.
    assert_eq!(offsets(b"\"\\\\\""), vec![0, 4]);
    // "\"" : the odd run escapes the middle quote.
    assert_eq!(offsets(b"\"\\\"\""), vec![0, 4]);
}

#[test]
fn test_structurals_inside_string_masked() {
    assert_eq!(offsets(br#""{,}[]:""#), vec![0, 8]);
}

#[test]
fn test_scalar_starts_flagged() {
    assert_eq!(offsets(b"[1, 2e3, null]"), vec![0, 1, 2, 4, 7, 9, 13, 14]);
}

#[test]
fn test_scalar_at_offset_zero() {
    assert_eq!(offsets(b"42 "), vec![0, 3]);
    assert_eq!(offsets(b"true"), vec![0, 4]);
}

#[test]
fn test_string_state_crosses_blocks() {
    let mut input = vec![b'"'];
    input.extend_from_slice(&[b'a'; 100]);
    input.push(b'"');
    assert_eq!(offsets(&input), vec![0, 102]);
}

#[test]
fn test_backslash_carry_crosses_blocks() {
    // The backslash lands on byte 63, its escaped quote on byte 64.
    let mut input = vec![b'"'];
    input.extend_from_slice(&[b'a'; 62]);
    input.extend_from_slice(b"\\\"b\"");
    assert_eq!(input.len(), 67);
    assert_eq!(offsets(&input), vec![0, 67]);
}

#[test]
fn test_offsets_strictly_increase() {
    let mut input = Vec::from(&b"["[..]);
    for i in 0..60 {
        if i > 0 {
            input.push(b',');
        }
        input.extend_from_slice(i.to_string().as_bytes());
    }
    input.push(b']');
    let found = offsets(&input);
    assert!(input.len() > 128);
    assert!(found.windows(2).all(|pair| pair[0] < pair[1]));
    assert_eq!(*found.last().unwrap() as usize, input.len());
}

#[test]
fn test_scan_rejects_unterminated_string() {
    let mut doc = ParsedDocument::with_capacity(16).unwrap();
    assert_eq!(
        stage1::scan_fallback(br#""abc"#, &mut doc),
        Err(ErrorCode::UnterminatedString)
    );
}

#[test]
fn test_scan_rejects_blank_input() {
    let mut doc = ParsedDocument::with_capacity(16).unwrap();
    assert_eq!(stage1::scan_fallback(b"", &mut doc), Err(ErrorCode::EmptyInput));
    doc.start_parse();
    assert_eq!(
        stage1::scan_fallback(b" \t\r\n", &mut doc),
        Err(ErrorCode::EmptyInput)
    );
}

const TIER_CORPUS: &[&[u8]] = &[
    br#"{"a": 1}"#,
    br#"{"deep":{"er":[1,2,{"est":[null,true,false]}]},"s":"x"}"#,
    "\"esc \\\" \\\\ é tail\"".as_bytes(),
    b"[0.5,1e9,-33,17,2.25e-4]",
    b"   [ 1 ,\t2 ,\n3 ]   ",
    "[\"aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa\",
        {\"k\\\\\":\"v\",\"n\":[[[]]]}, 123456789012345678, \"😀\"]"
        .as_bytes(),
];

#[cfg(target_arch = "x86_64")]
#[test]
fn test_x86_tiers_match_fallback() {
    let tier = capability::detect();
    for &input in TIER_CORPUS {
        let expected = offsets(input);
        if matches!(tier, CapabilityTier::Sse42 | CapabilityTier::Avx2) {
            let mut doc = ParsedDocument::with_capacity(input.len()).unwrap();
            // SAFETY: detection proved at least SSE4.2 on this host.
            unsafe { stage1::scan_sse42(input, &mut doc).unwrap() };
            assert_eq!(
                doc.structural_indexes,
                expected,
                "sse4.2 disagrees on {:?}",
                input.as_bstr()
            );
        }
        if tier == CapabilityTier::Avx2 {
            let mut doc = ParsedDocument::with_capacity(input.len()).unwrap();
            // SAFETY: detection proved AVX2 on this host.
            unsafe { stage1::scan_avx2(input, &mut doc).unwrap() };
            assert_eq!(
                doc.structural_indexes,
                expected,
                "avx2 disagrees on {:?}",
                input.as_bstr()
            );
        }
    }
}

#[cfg(target_arch = "aarch64")]
#[test]
fn test_neon_matches_fallback() {
    assert_eq!(capability::detect(), CapabilityTier::Neon);
    for &input in TIER_CORPUS {
        let expected = offsets(input);
        let mut doc = ParsedDocument::with_capacity(input.len()).unwrap();
        // SAFETY: NEON is architecturally guaranteed on aarch64.
        unsafe { stage1::scan_neon(input, &mut doc).unwrap() };
        assert_eq!(
            doc.structural_indexes,
            expected,
            "neon disagrees on {:?}",
            input.as_bstr()
        );
    }
}

#[test]
fn test_detection_is_stable() {
    let first = capability::detect();
    assert_eq!(capability::detect(), first);
    capability::reset();
    assert_eq!(capability::detect(), first);
}
