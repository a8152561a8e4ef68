use alloc::string::String;

use crate::{TapeTag, build_document};

#[test]
fn test_fresh_cursor_sits_on_top_value() {
    let doc = build_document(br#"{"a":1}"#);
    let it = doc.iter().unwrap();
    assert_eq!(it.tag(), TapeTag::ObjectOpen);
    assert_eq!(it.depth(), 1);
    assert_eq!(it.tape_location(), 1);
    assert_eq!(it.scope_tag(), TapeTag::ObjectOpen);
    assert!(it.is_object());
    assert!(!it.is_array());
}

#[test]
fn test_down_lands_on_first_child() {
    let doc = build_document(b"[10,[20],30]");
    let mut it = doc.iter().unwrap();
    assert!(it.down());
    assert_eq!(it.depth(), 2);
    assert_eq!(it.tape_location(), 2);
    assert_eq!(it.integer(), Some(10));
    assert_eq!(it.scope_tag(), TapeTag::ArrayOpen);
}

#[test]
fn test_down_rejects_scalars_and_empty_containers() {
    let doc = build_document(b"7");
    let mut it = doc.iter().unwrap();
    assert!(!it.down());
    assert_eq!(it.tape_location(), 1);

    let doc = build_document(b"[]");
    let mut it = doc.iter().unwrap();
    assert!(!it.down());
    assert_eq!(it.depth(), 1);

    let doc = build_document(b"{}");
    let mut it = doc.iter().unwrap();
    assert!(!it.down());
}

#[test]
fn test_next_skips_whole_containers() {
    let doc = build_document(b"[10,[20],30]");
    let mut it = doc.iter().unwrap();
    assert!(it.down());
    assert!(it.next());
    assert_eq!(it.tape_location(), 4);
    assert!(it.is_array());
    // One step from the opener to the element after the closer.
    assert!(it.next());
    assert_eq!(it.tape_location(), 8);
    assert_eq!(it.integer(), Some(30));
}

#[test]
fn test_next_parks_on_closer() {
    let doc = build_document(b"[1,2]");
    let mut it = doc.iter().unwrap();
    assert!(it.down());
    assert!(it.next());
    assert!(!it.next());
    assert_eq!(it.tag(), TapeTag::ArrayClose);
    assert_eq!(it.tape_location(), 6);
    // Repeated calls from the closer stay put.
    assert!(!it.next());
    assert_eq!(it.tape_location(), 6);
}

#[test]
fn test_next_from_object_member() {
    let doc = build_document(br#"{"a":1}"#);
    let mut it = doc.iter().unwrap();
    assert!(it.down());
    assert_eq!(it.string_str(), Some("a"));
    assert!(it.next());
    assert_eq!(it.integer(), Some(1));
    assert!(!it.next());
    assert_eq!(it.tag(), TapeTag::ObjectClose);
}

#[test]
fn test_root_scalar_has_no_sibling() {
    let doc = build_document(b"7");
    let mut it = doc.iter().unwrap();
    assert!(!it.next());
    assert_eq!(it.tape_location(), 1);
    assert_eq!(it.integer(), Some(7));
}

#[test]
fn test_up_lands_on_scope_start() {
    let doc = build_document(b"[10,[20],30]");
    let mut it = doc.iter().unwrap();
    assert!(it.down());
    assert!(it.next());
    assert!(it.down());
    assert_eq!(it.integer(), Some(20));
    assert_eq!(it.depth(), 3);
    // Up returns to the first node of the enclosing scope, not to the
    // container that was entered.
    assert!(it.up());
    assert_eq!(it.depth(), 2);
    assert_eq!(it.tape_location(), 2);
    assert_eq!(it.integer(), Some(10));
}

#[test]
fn test_up_from_parked_closer() {
    let doc = build_document(b"[1,2]");
    let mut it = doc.iter().unwrap();
    assert!(it.down());
    while it.next() {}
    assert_eq!(it.tag(), TapeTag::ArrayClose);
    assert!(it.up());
    assert_eq!(it.depth(), 1);
    assert_eq!(it.tape_location(), 1);
    assert!(it.is_array());
}

#[test]
fn test_up_refuses_at_top() {
    let doc = build_document(b"[1]");
    let mut it = doc.iter().unwrap();
    assert!(!it.up());
    assert_eq!(it.depth(), 1);
    it.down();
    assert!(it.up());
    assert!(!it.up());
}

#[test]
fn test_rewind_restores_start() {
    let doc = build_document(br#"{"a":[1,{"b":2}]}"#);
    let mut it = doc.iter().unwrap();
    assert!(it.move_to("/a/1/b"));
    assert_eq!(it.integer(), Some(2));
    it.rewind();
    assert_eq!(it.tape_location(), 1);
    assert_eq!(it.depth(), 1);
    assert_eq!(it.tag(), TapeTag::ObjectOpen);
    // Rewinding an already-rewound cursor changes nothing.
    it.rewind();
    assert_eq!(it.tape_location(), 1);
    assert_eq!(it.depth(), 1);
    assert!(it.down());
    assert_eq!(it.string_str(), Some("a"));
}

#[test]
fn test_scope_tag_follows_descent() {
    let doc = build_document(br#"{"a":[1]}"#);
    let mut it = doc.iter().unwrap();
    assert_eq!(it.scope_tag(), TapeTag::ObjectOpen);
    assert!(it.down());
    assert_eq!(it.scope_tag(), TapeTag::ObjectOpen);
    assert!(it.next());
    assert!(it.down());
    assert_eq!(it.scope_tag(), TapeTag::ArrayOpen);
}

#[test]
fn test_scalar_accessors_are_typed() {
    let doc = build_document(br#"[1,2.5,"s"]"#);
    let mut it = doc.iter().unwrap();
    assert!(it.down());
    assert!(it.is_integer());
    assert_eq!(it.integer(), Some(1));
    assert_eq!(it.double(), None);
    assert_eq!(it.string_bytes(), None);
    assert!(it.next());
    assert!(it.is_double());
    assert_eq!(it.double(), Some(2.5));
    assert_eq!(it.integer(), None);
    assert!(it.next());
    assert!(it.is_string());
    assert_eq!(it.string_str(), Some("s"));
    assert_eq!(it.integer(), None);
}

#[test]
fn test_literal_predicates() {
    let doc = build_document(b"[true,false,null]");
    let mut it = doc.iter().unwrap();
    it.down();
    assert!(it.is_true());
    assert!(!it.is_false());
    it.next();
    assert!(it.is_false());
    it.next();
    assert!(it.is_null());
    assert!(!it.is_true());
}

#[test]
fn test_string_borrow_outlives_navigation() {
    let doc = build_document(br#"{"key":"value"}"#);
    let mut it = doc.iter().unwrap();
    it.down();
    let key = it.string_str().unwrap();
    it.next();
    let value = it.string_bytes().unwrap();
    it.rewind();
    assert_eq!(key, "key");
    assert_eq!(value, b"value");
}

#[test]
fn test_clone_is_independent() {
    let doc = build_document(b"[1,[2]]");
    let mut it = doc.iter().unwrap();
    it.down();
    let parked = it.clone();
    assert!(it.next());
    assert!(it.down());
    assert_eq!(it.integer(), Some(2));
    assert_eq!(parked.integer(), Some(1));
    assert_eq!(parked.depth(), 2);
}

#[test]
fn test_print_scalars() {
    let doc = build_document(b"[-42,2.5,true,false,null]");
    let mut it = doc.iter().unwrap();
    it.down();
    for expected in ["-42", "2.5", "true", "false", "null"] {
        let mut out = String::new();
        assert!(it.print(&mut out, true));
        assert_eq!(out, expected);
        it.next();
    }
}

#[test]
fn test_print_extreme_integers() {
    let doc = build_document(b"[-9223372036854775808,9223372036854775807]");
    let mut it = doc.iter().unwrap();
    it.down();
    let mut out = String::new();
    assert!(it.print(&mut out, true));
    assert_eq!(out, "-9223372036854775808");
    it.next();
    out.clear();
    assert!(it.print(&mut out, true));
    assert_eq!(out, "9223372036854775807");
}

#[test]
fn test_print_string_escaping() {
    let doc = build_document(br#""a\"b\nc\u001f""#);
    let it = doc.iter().unwrap();

    let mut escaped = String::new();
    assert!(it.print(&mut escaped, true));
    assert_eq!(escaped, r#""a\"b\nc\u001f""#);

    let mut verbatim = String::new();
    assert!(it.print(&mut verbatim, false));
    assert_eq!(verbatim, "\"a\"b\nc\u{1f}\"");
}

#[test]
fn test_print_brackets() {
    let doc = build_document(b"[1]");
    let mut it = doc.iter().unwrap();
    let mut out = String::new();
    assert!(it.print(&mut out, true));
    assert_eq!(out, "[");
    it.down();
    while it.next() {}
    out.clear();
    assert!(it.print(&mut out, true));
    assert_eq!(out, "]");
}
