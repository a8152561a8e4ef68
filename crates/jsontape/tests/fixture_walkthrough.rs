//! End-to-end pass over one realistic document: parse, navigate, resolve
//! pointers, and cross-check the decoded structure against `serde_json`.
#![allow(missing_docs)]

use jsontape::{ParsedDocument, TapeIterator, TapeTag, build_document, parse};

const FIXTURE: &str = r#"
{
    "moderation": {
        "decision": "allow",
        "reason": null
    },
    "request": {
        "filename": "example.rs",
        "language": "rust",
        "options": {
            "opt_level": 2,
            "lto": true,
            "features": [
                "serde",
                "tokio"
            ]
        }
    },
    "snippets": [
        "fn main() {}",
        "println!(\"hi\")"
    ],
    "scores": [0.5, -1.25, 3e2],
    "entities": [
        {
            "type": "function",
            "name": "main"
        },
        {
            "type": "macro",
            "name": "println"
        }
    ],
    "weird/key": 1,
    "weird~key": 2
}"#;

fn decode(it: &TapeIterator<'_>) -> serde_json::Value {
    match it.tag() {
        TapeTag::ObjectOpen => {
            let mut map = serde_json::Map::new();
            let mut walker = it.clone();
            if walker.down() {
                loop {
                    let key = walker.string_str().expect("object key").to_owned();
                    assert!(walker.next());
                    map.insert(key, decode(&walker));
                    if !walker.next() {
                        break;
                    }
                }
            }
            serde_json::Value::Object(map)
        }
        TapeTag::ArrayOpen => {
            let mut items = Vec::new();
            let mut walker = it.clone();
            if walker.down() {
                loop {
                    items.push(decode(&walker));
                    if !walker.next() {
                        break;
                    }
                }
            }
            serde_json::Value::Array(items)
        }
        TapeTag::String => it.string_str().expect("string").into(),
        TapeTag::Int64 => it.integer().expect("integer").into(),
        TapeTag::Double => serde_json::Number::from_f64(it.double().expect("double"))
            .map_or(serde_json::Value::Null, serde_json::Value::Number),
        TapeTag::True => true.into(),
        TapeTag::False => false.into(),
        TapeTag::Null => serde_json::Value::Null,
        tag => panic!("tape node {tag:?} is not a value"),
    }
}

/// Whitespace stripper standing in for the external minifier; quoted
/// sections pass through untouched.
fn minify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;
    for ch in text.chars() {
        if in_string {
            out.push(ch);
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
        } else if !matches!(ch, ' ' | '\t' | '\n' | '\r') {
            out.push(ch);
            if ch == '"' {
                in_string = true;
            }
        }
    }
    out
}

#[test]
fn fixture_matches_serde_json() {
    let doc = build_document(FIXTURE.as_bytes());
    assert!(doc.is_valid(), "{:?}", doc.error());
    let expected: serde_json::Value = serde_json::from_str(FIXTURE).unwrap();
    assert_eq!(decode(&doc.iter().unwrap()), expected);
}

#[test]
fn minified_fixture_parses_to_the_same_tape() {
    let original = build_document(FIXTURE.as_bytes());
    let minified = build_document(minify(FIXTURE).as_bytes());
    assert!(original.is_valid() && minified.is_valid());

    // Whitespace never reaches the tape, so the two parses agree word for
    // word (string-buffer offsets included).
    let mut left = String::new();
    let mut right = String::new();
    assert!(original.dump_tape(&mut left));
    assert!(minified.dump_tape(&mut right));
    assert_eq!(left, right);
}

#[test]
fn pointers_reach_into_the_fixture() {
    let doc = build_document(FIXTURE.as_bytes());
    let mut it = doc.iter().unwrap();

    assert!(it.move_to("/moderation/decision"));
    assert_eq!(it.string_str(), Some("allow"));

    assert!(it.move_to("/request/options/opt_level"));
    assert_eq!(it.integer(), Some(2));

    assert!(it.move_to("/request/options/features/1"));
    assert_eq!(it.string_str(), Some("tokio"));

    assert!(it.move_to("/scores/1"));
    assert_eq!(it.double(), Some(-1.25));

    assert!(it.move_to("/entities/1/name"));
    assert_eq!(it.string_str(), Some("println"));

    assert!(it.move_to("/weird~1key"));
    assert_eq!(it.integer(), Some(1));
    assert!(it.move_to("/weird~0key"));
    assert_eq!(it.integer(), Some(2));

    assert!(it.move_to("/snippets/-"));
    assert_eq!(it.tag(), TapeTag::ArrayClose);

    // A miss is transactional: the cursor stays parked on the closer.
    assert!(!it.move_to("/moderation/missing"));
    assert_eq!(it.tag(), TapeTag::ArrayClose);
}

#[test]
fn replayed_navigation_is_deterministic() {
    let doc = build_document(FIXTURE.as_bytes());
    let mut it = doc.iter().unwrap();

    let mut walk = |it: &mut jsontape::TapeIterator<'_>| {
        let mut trail = Vec::new();
        assert!(it.down());
        trail.push(it.tape_location());
        while it.next() {
            trail.push(it.tape_location());
            if it.is_object() && it.down() {
                trail.push(it.tape_location());
                it.up();
                trail.push(it.tape_location());
            }
        }
        trail.push(it.tape_location());
        trail
    };

    let first = walk(&mut it);
    it.rewind();
    let second = walk(&mut it);
    assert_eq!(first, second);
}

#[test]
fn document_reuse_with_preallocated_capacity() {
    let mut doc = ParsedDocument::with_capacity(FIXTURE.len()).unwrap();
    parse(FIXTURE.as_bytes(), &mut doc).unwrap();
    let expected = decode(&doc.iter().unwrap());

    // A second parse of a smaller input reuses the same buffers.
    parse(br#"{"tiny":[1]}"#, &mut doc).unwrap();
    let mut it = doc.iter().unwrap();
    assert!(it.move_to("/tiny/0"));
    assert_eq!(it.integer(), Some(1));

    // And the fixture still fits afterwards.
    parse(FIXTURE.as_bytes(), &mut doc).unwrap();
    assert_eq!(decode(&doc.iter().unwrap()), expected);
}
