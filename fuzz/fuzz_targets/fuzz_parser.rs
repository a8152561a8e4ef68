#![no_main]
//! Two fuzzing modes share one target. Raw mode throws the input bytes at
//! the parser and, when they happen to parse, walks every node of the
//! resulting tape. Structured mode derives a JSON value from the same
//! bytes, serializes it, and requires the tape to decode back to an equal
//! value, with every top-level member reachable by pointer.

use arbitrary::{Arbitrary, Unstructured};
use jsontape::{TapeIterator, TapeTag, build_document};
use libfuzzer_sys::fuzz_target;
use serde_json::{Map, Value};

#[derive(Debug)]
struct ArbitraryValue(Value);

impl<'a> Arbitrary<'a> for ArbitraryValue {
    fn arbitrary(u: &mut Unstructured<'a>) -> arbitrary::Result<Self> {
        arbitrary_value(u, 4).map(ArbitraryValue)
    }
}

fn arbitrary_value(u: &mut Unstructured<'_>, depth: usize) -> arbitrary::Result<Value> {
    let variants = if depth == 0 { 5 } else { 7 };
    Ok(match u.choose_index(variants)? {
        0 => Value::Null,
        1 => Value::Bool(u.arbitrary()?),
        2 => Value::from(i64::arbitrary(u)?),
        3 => {
            let n: f64 = u.arbitrary()?;
            serde_json::Number::from_f64(n).map_or(Value::Null, Value::Number)
        }
        4 => Value::String(u.arbitrary()?),
        5 => {
            let len = u.choose_index(5)?;
            let mut items = Vec::with_capacity(len);
            for _ in 0..len {
                items.push(arbitrary_value(u, depth - 1)?);
            }
            Value::Array(items)
        }
        _ => {
            let len = u.choose_index(5)?;
            let mut map = Map::new();
            for _ in 0..len {
                map.insert(u.arbitrary()?, arbitrary_value(u, depth - 1)?);
            }
            Value::Object(map)
        }
    })
}

fn decode(it: &TapeIterator<'_>) -> Value {
    match it.tag() {
        TapeTag::ObjectOpen => {
            let mut map = Map::new();
            let mut walker = it.clone();
            if walker.down() {
                loop {
                    let key = walker.string_str().expect("object key").to_owned();
                    assert!(walker.next(), "key must be followed by a value");
                    map.insert(key, decode(&walker));
                    if !walker.next() {
                        break;
                    }
                }
            }
            Value::Object(map)
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
            Value::Array(items)
        }
        TapeTag::String => Value::String(it.string_str().expect("valid UTF-8").to_owned()),
        TapeTag::Int64 => Value::from(it.integer().expect("integer payload")),
        TapeTag::Double => {
            serde_json::Number::from_f64(it.double().expect("double payload"))
                .map_or(Value::Null, Value::Number)
        }
        TapeTag::True => Value::Bool(true),
        TapeTag::False => Value::Bool(false),
        TapeTag::Null => Value::Null,
        tag => panic!("tape node {tag:?} is not a value"),
    }
}

fn pointer_segment(key: &str) -> String {
    key.replace('\\', "\\\\").replace('~', "~0").replace('/', "~1")
}

fn raw_mode(data: &[u8]) {
    let doc = build_document(data);
    if !doc.is_valid() {
        assert!(doc.error().is_some());
        return;
    }
    let it = doc.iter().expect("valid document has an iterator");
    let _ = decode(&it);
    let mut listing = String::new();
    assert!(doc.dump_tape(&mut listing));
}

fn structured_mode(data: &[u8]) {
    let Ok(value) = ArbitraryValue::arbitrary(&mut Unstructured::new(data)) else {
        return;
    };
    let text = value.0.to_string();
    let doc = build_document(text.as_bytes());
    assert!(doc.is_valid(), "rejected serde output {text:?}: {:?}", doc.error());

    let mut it = doc.iter().expect("valid document");
    assert_eq!(decode(&it), value.0, "tape decodes differently for {text:?}");

    if let Value::Object(map) = &value.0 {
        for key in map.keys() {
            assert!(
                it.move_to(&format!("/{}", pointer_segment(key))),
                "member {key:?} unreachable in {text:?}"
            );
        }
    }
}

fuzz_target!(|data: &[u8]| {
    raw_mode(data);
    structured_mode(data);
});
