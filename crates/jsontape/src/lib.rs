//! Two-stage JSON parser producing a flat 64-bit tagged-word tape.
//!
//! Stage 1 scans the raw bytes with the widest SIMD tier the host supports
//! and records the offset of every structural byte; stage 2 replays those
//! offsets into a [`ParsedDocument`]: a tape of tagged words plus a side
//! buffer of de-escaped string bytes. No tree of heap nodes is ever built.
//! A [`TapeIterator`] then navigates the tape (down/next/up), extracts
//! scalars, and resolves RFC 6901 JSON Pointers with transactional
//! movement semantics.
//!
//! ```rust
//! use jsontape::build_document;
//!
//! let doc = build_document(br#"{"answers":[1,2,42]}"#);
//! assert!(doc.is_valid());
//! let mut it = doc.iter().unwrap();
//! assert!(it.move_to("/answers/2"));
//! assert_eq!(it.integer(), Some(42));
//! ```

#![no_std]
#![allow(missing_docs)]
extern crate alloc;

#[cfg(any(test, feature = "std"))]
extern crate std;

mod capability;
mod dispatch;
mod document;
mod error;
mod input;
mod iterator;
mod stage1;
mod stage2;
mod tape;

#[cfg(test)]
mod tests;

pub use capability::CapabilityTier;
pub use dispatch::{build_document, parse, parse_unpadded};
pub use document::{DEFAULT_MAX_DEPTH, ParsedDocument};
pub use error::ErrorCode;
pub use input::PADDING;
pub use iterator::TapeIterator;
pub use tape::TapeTag;
