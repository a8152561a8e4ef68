//! The parsed-document container.
//!
//! A [`ParsedDocument`] owns everything a parse produces: the tape, the
//! string buffer, and the scratch both stages reuse across parses. Its
//! capacities are fixed when allocated and never grow implicitly; the same
//! document can be re-parsed with any input that fits them.

use core::fmt;

use alloc::vec::Vec;
use bstr::ByteSlice;

use crate::error::ErrorCode;
use crate::iterator::TapeIterator;
use crate::stage2::ScopeFrame;
use crate::tape::{self, STRING_LEN_BYTES, TapeTag};

/// Nesting depth a document accepts unless told otherwise.
pub const DEFAULT_MAX_DEPTH: usize = 1024;

/// A parsed JSON document: tape, string buffer, and capacity state.
///
/// The lifecycle is allocate once, parse many:
///
/// ```rust
/// use jsontape::{ParsedDocument, parse};
///
/// let mut doc = ParsedDocument::with_capacity(4096).unwrap();
/// parse(br#"[1,2,3]"#, &mut doc).unwrap();
/// assert!(doc.is_valid());
/// parse(br#""another input""#, &mut doc).unwrap();
/// ```
///
/// Parsing takes `&mut self` while iterators borrow `&self`, so the borrow
/// checker rules out navigating a document mid-re-parse.
pub struct ParsedDocument {
    byte_capacity: usize,
    depth_capacity: usize,
    valid: bool,
    error: Option<ErrorCode>,
    pub(crate) tape: Vec<u64>,
    pub(crate) string_buf: Vec<u8>,
    pub(crate) structural_indexes: Vec<u32>,
    pub(crate) scopes: Vec<ScopeFrame>,
}

fn round_up_64(n: u64) -> u64 {
    (n + 63) & !63
}

impl ParsedDocument {
    /// Creates a document with no capacity; [`allocate_capacity`] must run
    /// before it can hold a parse.
    ///
    /// [`allocate_capacity`]: Self::allocate_capacity
    #[must_use]
    pub fn new() -> Self {
        Self {
            byte_capacity: 0,
            depth_capacity: 0,
            valid: false,
            error: None,
            tape: Vec::new(),
            string_buf: Vec::new(),
            structural_indexes: Vec::new(),
            scopes: Vec::new(),
        }
    }

    /// Creates a document sized for inputs up to `bytes` long, with the
    /// default depth capacity.
    pub fn with_capacity(bytes: usize) -> Result<Self, ErrorCode> {
        let mut doc = Self::new();
        doc.allocate_capacity(bytes, DEFAULT_MAX_DEPTH)?;
        Ok(doc)
    }

    /// Sizes the document for inputs up to `bytes` long and containers
    /// nested up to `max_depth` deep.
    ///
    /// Buffer bounds derive from the input length: a valid document's tape
    /// never exceeds `input length + 3` words and its de-escaped strings
    /// never exceed `5/3 · input length` bytes including record overhead,
    /// so nothing here ever needs to grow mid-parse. Any prior parse in
    /// this document is discarded.
    ///
    /// # Errors
    ///
    /// [`ErrorCode::CapacityExceeded`] when `bytes` cannot be indexed by
    /// the tape encoding; [`ErrorCode::OutOfMemory`] when an allocation
    /// fails.
    pub fn allocate_capacity(&mut self, bytes: usize, max_depth: usize) -> Result<(), ErrorCode> {
        let len = u64::from(u32::try_from(bytes).map_err(|_| ErrorCode::CapacityExceeded)?);
        let tape_cap = to_usize(round_up_64(len) + 8)?;
        let string_cap = to_usize(round_up_64(5 * len / 3 + 32))?;
        let index_cap = to_usize(round_up_64(len) + 2 + 7)?;

        self.valid = false;
        self.error = None;
        self.tape.clear();
        self.string_buf.clear();
        self.structural_indexes.clear();
        self.scopes.clear();

        self.tape
            .try_reserve_exact(tape_cap)
            .map_err(|_| ErrorCode::OutOfMemory)?;
        self.string_buf
            .try_reserve_exact(string_cap)
            .map_err(|_| ErrorCode::OutOfMemory)?;
        self.structural_indexes
            .try_reserve_exact(index_cap)
            .map_err(|_| ErrorCode::OutOfMemory)?;
        self.scopes
            .try_reserve_exact(max_depth)
            .map_err(|_| ErrorCode::OutOfMemory)?;

        self.byte_capacity = bytes;
        self.depth_capacity = max_depth;
        Ok(())
    }

    /// Releases every buffer and resets capacities to zero.
    pub fn deallocate(&mut self) {
        *self = Self::new();
    }

    /// Whether the document holds a completed, successful parse.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// The error recorded by the most recent failed parse, if any.
    #[must_use]
    pub fn error(&self) -> Option<ErrorCode> {
        self.error
    }

    /// Longest input this document can parse.
    #[must_use]
    pub fn byte_capacity(&self) -> usize {
        self.byte_capacity
    }

    /// Deepest container nesting this document can parse.
    #[must_use]
    pub fn depth_capacity(&self) -> usize {
        self.depth_capacity
    }

    /// Builds a navigation iterator over this document.
    ///
    /// # Errors
    ///
    /// Fails closed on a document that is not valid: the stored parse
    /// error, or [`ErrorCode::Uninitialized`] if nothing was ever parsed.
    pub fn iter(&self) -> Result<TapeIterator<'_>, ErrorCode> {
        TapeIterator::new(self)
    }

    /// Writes a one-word-per-line listing of the tape, for diagnostics.
    ///
    /// This is not JSON output; it shows tape indexes, tag mnemonics, and
    /// payloads the way the tape stores them. Returns `false` on an
    /// invalid document or a formatting failure.
    pub fn dump_tape<W: fmt::Write>(&self, out: &mut W) -> bool {
        if !self.valid {
            return false;
        }
        self.dump_tape_fallible(out).is_some()
    }

    #[allow(clippy::cast_possible_wrap)]
    fn dump_tape_fallible<W: fmt::Write>(&self, out: &mut W) -> Option<()> {
        let mut idx = 0usize;
        while idx < self.tape.len() {
            let word = self.tape[idx];
            let tag = TapeTag::from_word(word)?;
            let payload = tape::payload(word);
            match tag {
                TapeTag::Root => {
                    writeln!(out, "{idx} : r ({payload})").ok()?;
                }
                TapeTag::ObjectOpen | TapeTag::ArrayOpen | TapeTag::ObjectClose
                | TapeTag::ArrayClose => {
                    writeln!(out, "{idx} : {} -> {payload}", tag.as_char()).ok()?;
                }
                TapeTag::String => {
                    let bytes = self.string_record(to_usize(payload).ok()?)?;
                    writeln!(out, "{idx} : \" {:?}", bytes.as_bstr()).ok()?;
                }
                TapeTag::Int64 => {
                    let raw = *self.tape.get(idx + 1)?;
                    let mut buf = itoa::Buffer::new();
                    writeln!(out, "{idx} : l {}", buf.format(raw as i64)).ok()?;
                    idx += 1;
                }
                TapeTag::Double => {
                    let raw = *self.tape.get(idx + 1)?;
                    let mut buf = ryu::Buffer::new();
                    writeln!(out, "{idx} : d {}", buf.format(f64::from_bits(raw))).ok()?;
                    idx += 1;
                }
                TapeTag::True | TapeTag::False | TapeTag::Null => {
                    writeln!(out, "{idx} : {}", tag.as_char()).ok()?;
                }
            }
            idx += 1;
        }
        Some(())
    }

    /// De-escaped bytes of the string record starting at `offset`.
    pub(crate) fn string_record(&self, offset: usize) -> Option<&[u8]> {
        let prefix = self.string_buf.get(offset..offset + STRING_LEN_BYTES)?;
        let len = u32::from_le_bytes(prefix.try_into().ok()?) as usize;
        let start = offset + STRING_LEN_BYTES;
        self.string_buf.get(start..start + len)
    }

    /// Clears parse state ahead of stage 1. Capacities are untouched.
    pub(crate) fn start_parse(&mut self) {
        self.valid = false;
        self.error = None;
        self.tape.clear();
        self.string_buf.clear();
        self.structural_indexes.clear();
        self.scopes.clear();
    }

    pub(crate) fn record_success(&mut self) {
        self.valid = true;
        self.error = None;
    }

    pub(crate) fn record_failure(&mut self, error: ErrorCode) {
        self.valid = false;
        self.error = Some(error);
    }

    /// Index the next tape word will land at.
    pub(crate) fn current_loc(&self) -> usize {
        self.tape.len()
    }

    pub(crate) fn write_tape(&mut self, payload: u64, tag: TapeTag) {
        self.tape.push(tape::pack(tag, payload));
    }

    /// Appends a raw companion word (number bits).
    pub(crate) fn push_raw(&mut self, bits: u64) {
        self.tape.push(bits);
    }

    /// Back-patches the word at `index` by OR-ing `payload` in; the word
    /// must have been written with payload 0.
    pub(crate) fn annotate(&mut self, index: usize, payload: u64) {
        debug_assert!(payload <= tape::VALUE_MASK);
        self.tape[index] |= payload;
    }
}

impl Default for ParsedDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ParsedDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParsedDocument")
            .field("byte_capacity", &self.byte_capacity)
            .field("depth_capacity", &self.depth_capacity)
            .field("valid", &self.valid)
            .field("error", &self.error)
            .field("tape_words", &self.tape.len())
            .field("string_bytes", &self.string_buf.len())
            .finish()
    }
}

fn to_usize(value: u64) -> Result<usize, ErrorCode> {
    usize::try_from(value).map_err(|_| ErrorCode::CapacityExceeded)
}
