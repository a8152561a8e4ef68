//! Demonstrates random access into a parsed document with JSON Pointers.
//!
//! A deployment manifest is parsed once into a tape, then interrogated
//! from several angles without ever materializing a tree:
//!
//! 1. Direct pointer lookups (`/services/0/port`), including RFC 6901
//!    escaping for keys that contain `/` or `~`.
//! 2. A manual cursor walk (`down`/`next`/`up`) that lists every service.
//! 3. The diagnostic tape listing, showing what the parser actually built.
//!
//! Run with
//!
//! ```bash
//! cargo run -p jsontape --example pointer_lookup
//! ```

use jsontape::build_document;

const MANIFEST: &str = r#"{
    "app": "ingest",
    "replicas": 3,
    "services": [
        {"name": "api",    "port": 8080, "public": true},
        {"name": "worker", "port": 9100, "public": false}
    ],
    "limits": {"cpu/max": 2.5, "mem~gb": 8}
}"#;

fn main() {
    let doc = build_document(MANIFEST.as_bytes());
    if !doc.is_valid() {
        eprintln!("manifest rejected: {}", doc.error().expect("failed parse"));
        return;
    }
    let mut it = doc.iter().expect("valid document");

    // Plain pointer lookups.
    assert!(it.move_to("/app"));
    println!("app      = {}", it.string_str().expect("string"));

    assert!(it.move_to("/replicas"));
    println!("replicas = {}", it.integer().expect("integer"));

    assert!(it.move_to("/services/0/port"));
    println!("api port = {}", it.integer().expect("integer"));

    // Keys containing '/' and '~' use the ~1 / ~0 escapes.
    assert!(it.move_to("/limits/cpu~1max"));
    println!("cpu max  = {}", it.double().expect("double"));
    assert!(it.move_to("/limits/mem~0gb"));
    println!("mem gb   = {}", it.integer().expect("integer"));

    // A miss leaves the cursor exactly where it was.
    let before = it.tape_location();
    assert!(!it.move_to("/services/7/port"));
    assert_eq!(it.tape_location(), before);

    // Manual walk over the services array.
    println!("services:");
    assert!(it.move_to("/services"));
    if it.down() {
        loop {
            let mut service = it.clone();
            if service.move_to_key(b"name") {
                println!("  - {}", service.string_str().expect("string"));
            }
            if !it.next() {
                break;
            }
        }
    }

    // What the tape itself looks like.
    let mut listing = String::new();
    if doc.dump_tape(&mut listing) {
        println!("tape:\n{listing}");
    }
}
