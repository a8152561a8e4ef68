//! Cursor navigation over a parsed tape.
//!
//! A [`TapeIterator`] borrows the document immutably, so the borrow
//! checker already forbids re-parsing a document while any iterator over
//! it is alive. Navigation is pure cursor movement; nothing on the tape
//! is ever modified.

use alloc::vec::Vec;
use core::fmt;

use crate::document::ParsedDocument;
use crate::error::ErrorCode;
use crate::tape::{self, TapeTag};

/// One level of the cursor's depth stack.
#[derive(Clone, Copy, Debug)]
struct ScopeEntry {
    /// Tape index of the first node in the scope.
    start: usize,
    /// Tag of the enclosing container; at depth 1 the top value's own tag.
    tag: TapeTag,
}

/// Saved cursor state for transactional movement.
struct Snapshot {
    location: usize,
    word: u64,
    tag: TapeTag,
    depth: usize,
    stack: Vec<ScopeEntry>,
}

/// A cursor over one [`ParsedDocument`]'s tape.
///
/// The cursor tracks a tape location plus a depth stack; entry 0 of the
/// stack is the root sentinel and entry 1 the top-level value, so a
/// freshly built iterator sits at depth 1 on the document's single top
/// value. [`down`], [`next`], and [`up`] return `false` instead of
/// moving when a move is not possible; [`move_to`] resolves RFC 6901
/// JSON Pointers transactionally.
///
/// [`down`]: Self::down
/// [`next`]: Self::next
/// [`up`]: Self::up
/// [`move_to`]: Self::move_to
#[derive(Clone, Debug)]
pub struct TapeIterator<'a> {
    doc: &'a ParsedDocument,
    location: usize,
    word: u64,
    tag: TapeTag,
    depth: usize,
    stack: Vec<ScopeEntry>,
}

impl<'a> TapeIterator<'a> {
    /// Builds a cursor positioned on the document's top-level value.
    ///
    /// # Errors
    ///
    /// The document's stored parse error when it is invalid,
    /// [`ErrorCode::Uninitialized`] when nothing was ever parsed into
    /// it, and [`ErrorCode::OutOfMemory`] when the depth stack cannot
    /// be allocated.
    pub(crate) fn new(doc: &'a ParsedDocument) -> Result<Self, ErrorCode> {
        if !doc.is_valid() {
            return Err(doc.error().unwrap_or(ErrorCode::Uninitialized));
        }
        let root = doc.tape.first().copied().ok_or(ErrorCode::Uninitialized)?;
        if TapeTag::from_word(root) != Some(TapeTag::Root) {
            return Err(ErrorCode::Uninitialized);
        }
        let word = doc.tape.get(1).copied().ok_or(ErrorCode::Uninitialized)?;
        let tag = TapeTag::from_word(word).ok_or(ErrorCode::Uninitialized)?;

        let mut stack = Vec::new();
        // Two sentinel entries plus one per nesting level.
        stack
            .try_reserve_exact(doc.depth_capacity() + 2)
            .map_err(|_| ErrorCode::OutOfMemory)?;
        stack.push(ScopeEntry {
            start: 0,
            tag: TapeTag::Root,
        });
        stack.push(ScopeEntry { start: 1, tag });

        Ok(Self {
            doc,
            location: 1,
            word,
            tag,
            depth: 1,
            stack,
        })
    }

    /// Tag of the node under the cursor.
    #[must_use]
    pub fn tag(&self) -> TapeTag {
        self.tag
    }

    /// Current nesting depth; the top-level value sits at depth 1.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Tape index of the node under the cursor.
    #[must_use]
    pub fn tape_location(&self) -> usize {
        self.location
    }

    /// Tag of the scope the cursor is inside; at depth 1 this is the top
    /// value's own tag.
    #[must_use]
    pub fn scope_tag(&self) -> TapeTag {
        self.stack[self.depth].tag
    }

    #[must_use]
    pub fn is_object(&self) -> bool {
        self.tag == TapeTag::ObjectOpen
    }

    #[must_use]
    pub fn is_array(&self) -> bool {
        self.tag == TapeTag::ArrayOpen
    }

    #[must_use]
    pub fn is_string(&self) -> bool {
        self.tag == TapeTag::String
    }

    #[must_use]
    pub fn is_integer(&self) -> bool {
        self.tag == TapeTag::Int64
    }

    #[must_use]
    pub fn is_double(&self) -> bool {
        self.tag == TapeTag::Double
    }

    #[must_use]
    pub fn is_true(&self) -> bool {
        self.tag == TapeTag::True
    }

    #[must_use]
    pub fn is_false(&self) -> bool {
        self.tag == TapeTag::False
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        self.tag == TapeTag::Null
    }

    /// The integer under the cursor, when it is one.
    #[must_use]
    pub fn integer(&self) -> Option<i64> {
        if self.tag != TapeTag::Int64 {
            return None;
        }
        let raw = self.doc.tape.get(self.location + 1).copied()?;
        Some(reinterpret_signed(raw))
    }

    /// The double under the cursor, when it is one.
    #[must_use]
    pub fn double(&self) -> Option<f64> {
        if self.tag != TapeTag::Double {
            return None;
        }
        let raw = self.doc.tape.get(self.location + 1).copied()?;
        Some(f64::from_bits(raw))
    }

    /// De-escaped bytes of the string under the cursor. The slice
    /// borrows the document, not the cursor, so it outlives navigation.
    #[must_use]
    pub fn string_bytes(&self) -> Option<&'a [u8]> {
        if self.tag != TapeTag::String {
            return None;
        }
        let offset = usize::try_from(tape::payload(self.word)).ok()?;
        self.doc.string_record(offset)
    }

    /// The string under the cursor as `&str`; parsing already validated
    /// the bytes as UTF-8.
    #[must_use]
    pub fn string_str(&self) -> Option<&'a str> {
        core::str::from_utf8(self.string_bytes()?).ok()
    }

    /// Descends into the container under the cursor, landing on its
    /// first child. Fails on a non-container and on an empty container.
    pub fn down(&mut self) -> bool {
        let container = self.tag;
        if !container.is_container_open() {
            return false;
        }
        let Ok(closer) = usize::try_from(tape::payload(self.word)) else {
            return false;
        };
        // An opener whose closer is the very next word has no children.
        if closer == self.location + 1 {
            return false;
        }
        let start = self.location + 1;
        if !self.load(start) {
            return false;
        }
        self.depth += 1;
        self.stack.push(ScopeEntry {
            start,
            tag: container,
        });
        true
    }

    /// Moves to the next sibling, skipping over the current value's
    /// children in O(1) via the bracket payload. When no sibling
    /// remains, returns `false` and parks the cursor on the scope's
    /// closing bracket.
    pub fn next(&mut self) -> bool {
        if self.tag.is_container_close() || self.tag == TapeTag::Root {
            return false;
        }
        let npos = if self.tag.is_container_open() {
            match usize::try_from(tape::payload(self.word)) {
                Ok(closer) => closer + 1,
                Err(_) => return false,
            }
        } else if self.tag.is_number() {
            self.location + 2
        } else {
            self.location + 1
        };
        let Some(word) = self.doc.tape.get(npos).copied() else {
            return false;
        };
        let Some(tag) = TapeTag::from_word(word) else {
            return false;
        };
        if tag == TapeTag::Root {
            // Nothing follows the top-level value.
            return false;
        }
        self.location = npos;
        self.word = word;
        self.tag = tag;
        !tag.is_container_close()
    }

    /// Pops one level, landing on the first node of the enclosing scope.
    /// Fails at the top level.
    pub fn up(&mut self) -> bool {
        if self.depth <= 1 {
            return false;
        }
        let start = self.stack[self.depth - 1].start;
        if !self.load(start) {
            return false;
        }
        self.stack.pop();
        self.depth -= 1;
        true
    }

    /// Returns the cursor to the freshly-constructed state.
    pub fn rewind(&mut self) {
        self.stack.truncate(2);
        self.depth = 1;
        // Index 1 always holds the top value on a valid document.
        let _ = self.load(1);
    }

    /// Renders the node under the cursor: scalars as JSON text, brackets
    /// as their single character. Strings print quoted; with
    /// `escape_strings` unset their bytes are written verbatim, which is
    /// safe for embedded NUL. Returns `false` for a non-renderable node
    /// or a sink error.
    pub fn print<W: fmt::Write>(&self, out: &mut W, escape_strings: bool) -> bool {
        self.print_fallible(out, escape_strings).is_some()
    }

    fn print_fallible<W: fmt::Write>(&self, out: &mut W, escape_strings: bool) -> Option<()> {
        match self.tag {
            TapeTag::String => {
                let content = self.string_str()?;
                out.write_char('"').ok()?;
                if escape_strings {
                    write_escaped(out, content).ok()?;
                } else {
                    out.write_str(content).ok()?;
                }
                out.write_char('"').ok()
            }
            TapeTag::Int64 => {
                let mut buf = itoa::Buffer::new();
                out.write_str(buf.format(self.integer()?)).ok()
            }
            TapeTag::Double => {
                let mut buf = ryu::Buffer::new();
                out.write_str(buf.format(self.double()?)).ok()
            }
            TapeTag::True => out.write_str("true").ok(),
            TapeTag::False => out.write_str("false").ok(),
            TapeTag::Null => out.write_str("null").ok(),
            TapeTag::ObjectOpen | TapeTag::ObjectClose | TapeTag::ArrayOpen
            | TapeTag::ArrayClose => out.write_char(self.tag.as_char()).ok(),
            TapeTag::Root => None,
        }
    }

    /// Descends into the object under the cursor and lands on the value
    /// whose key equals `key` (bytewise). On a miss the cursor is left
    /// on the first node of the enclosing scope.
    pub fn move_to_key(&mut self, key: &[u8]) -> bool {
        if self.tag != TapeTag::ObjectOpen {
            return false;
        }
        if !self.down() {
            return false;
        }
        loop {
            let hit = self
                .string_bytes()
                .is_some_and(|candidate| candidate == key);
            // The member value always follows its key word.
            if !self.next() {
                break;
            }
            if hit {
                return true;
            }
            if !self.next() {
                break;
            }
        }
        self.up();
        false
    }

    /// Descends into the array under the cursor and lands on element
    /// `index`. On an out-of-range index the cursor is left on the first
    /// node of the enclosing scope.
    pub fn move_to_index(&mut self, index: usize) -> bool {
        if self.tag != TapeTag::ArrayOpen {
            return false;
        }
        if !self.down() {
            return false;
        }
        for _ in 0..index {
            if !self.next() {
                self.up();
                return false;
            }
        }
        true
    }

    /// Resolves an RFC 6901 JSON Pointer from the document root.
    ///
    /// A leading `#` marks a URI-fragment-encoded pointer: percent
    /// escapes are hex-decoded first, re-escaping decoded `"`, `\`, and
    /// control bytes with a backslash so the pointer grammar can carry
    /// them. Within segments, `~1` decodes to `/` and `~0` to `~`.
    ///
    /// For arrays a segment is a non-negative integer, or `-` as the
    /// final segment to mean one past the last element (the cursor parks
    /// on the closing bracket, where [`Self::up`] and further pointer
    /// calls behave normally).
    ///
    /// Movement is transactional: the empty pointer rewinds to the root
    /// and succeeds; on any failure the cursor is restored to exactly
    /// the state it held before the call.
    pub fn move_to(&mut self, pointer: &str) -> bool {
        let bytes = pointer.as_bytes();
        let decoded;
        let pointer_bytes: &[u8] = if let Some((&b'#', fragment)) = bytes.split_first() {
            match fragment_decode(fragment) {
                Some(buffer) => {
                    decoded = buffer;
                    &decoded
                }
                None => return false,
            }
        } else {
            bytes
        };

        let saved = self.snapshot();
        self.rewind();
        if self.resolve_pointer(pointer_bytes) {
            true
        } else {
            self.restore(saved);
            false
        }
    }

    fn resolve_pointer(&mut self, mut pointer: &[u8]) -> bool {
        while !pointer.is_empty() {
            if pointer[0] != b'/' {
                return false;
            }
            let rest = &pointer[1..];
            let segment_end = rest.iter().position(|&b| b == b'/').unwrap_or(rest.len());
            let (segment, remaining) = rest.split_at(segment_end);
            match self.tag {
                TapeTag::ObjectOpen => {
                    let Some(key) = unescape_segment(segment) else {
                        return false;
                    };
                    if !self.move_to_key(&key) {
                        return false;
                    }
                }
                TapeTag::ArrayOpen => {
                    if segment == b"-" {
                        // Append position: meaningful only as the last
                        // segment and never on an empty array.
                        return remaining.is_empty() && self.move_to_array_end();
                    }
                    let Some(index) = parse_array_index(segment) else {
                        return false;
                    };
                    if !self.move_to_index(index) {
                        return false;
                    }
                }
                _ => return false,
            }
            pointer = remaining;
        }
        true
    }

    fn move_to_array_end(&mut self) -> bool {
        if !self.down() {
            return false;
        }
        while self.next() {}
        true
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            location: self.location,
            word: self.word,
            tag: self.tag,
            depth: self.depth,
            stack: self.stack.clone(),
        }
    }

    fn restore(&mut self, saved: Snapshot) {
        self.location = saved.location;
        self.word = saved.word;
        self.tag = saved.tag;
        self.depth = saved.depth;
        self.stack = saved.stack;
    }

    /// Points the cursor at `index`; `false` (cursor untouched) when the
    /// word there is not addressable.
    fn load(&mut self, index: usize) -> bool {
        let Some(word) = self.doc.tape.get(index).copied() else {
            return false;
        };
        let Some(tag) = TapeTag::from_word(word) else {
            return false;
        };
        self.location = index;
        self.word = word;
        self.tag = tag;
        true
    }
}

#[allow(clippy::cast_possible_wrap)]
fn reinterpret_signed(raw: u64) -> i64 {
    raw as i64
}

fn write_escaped<W: fmt::Write>(out: &mut W, content: &str) -> fmt::Result {
    for ch in content.chars() {
        match ch {
            '"' => out.write_str("\\\"")?,
            '\\' => out.write_str("\\\\")?,
            '\u{8}' => out.write_str("\\b")?,
            '\u{c}' => out.write_str("\\f")?,
            '\n' => out.write_str("\\n")?,
            '\r' => out.write_str("\\r")?,
            '\t' => out.write_str("\\t")?,
            ch if u32::from(ch) < 0x20 => write!(out, "\\u{:04x}", u32::from(ch))?,
            ch => out.write_char(ch)?,
        }
    }
    Ok(())
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

/// Decodes the URI-fragment form after its `#`; `None` on a malformed
/// percent escape.
fn fragment_decode(fragment: &[u8]) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(fragment.len());
    let mut i = 0;
    while i < fragment.len() {
        let byte = fragment[i];
        if byte == b'%' {
            let high = hex_value(*fragment.get(i + 1)?)?;
            let low = hex_value(*fragment.get(i + 2)?)?;
            let decoded = (high << 4) | low;
            if decoded == b'\\' || decoded == b'"' || decoded <= 0x1F {
                out.push(b'\\');
            }
            out.push(decoded);
            i += 3;
        } else {
            out.push(byte);
            i += 1;
        }
    }
    Some(out)
}

/// Undoes pointer-segment escaping: `~1` is `/`, `~0` is `~`, and a
/// backslash carries a literal `"`, `\`, or control byte. A `~` before
/// anything else passes through unchanged.
fn unescape_segment(segment: &[u8]) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(segment.len());
    let mut i = 0;
    while i < segment.len() {
        match segment[i] {
            b'~' => match segment.get(i + 1).copied() {
                Some(b'0') => {
                    out.push(b'~');
                    i += 2;
                }
                Some(b'1') => {
                    out.push(b'/');
                    i += 2;
                }
                _ => {
                    out.push(b'~');
                    i += 1;
                }
            },
            b'\\' => {
                let escaped = *segment.get(i + 1)?;
                if escaped == b'\\' || escaped == b'"' || escaped <= 0x1F {
                    out.push(escaped);
                    i += 2;
                } else {
                    return None;
                }
            }
            byte => {
                out.push(byte);
                i += 1;
            }
        }
    }
    Some(out)
}

fn parse_array_index(segment: &[u8]) -> Option<usize> {
    if segment.is_empty() {
        return None;
    }
    let mut value = 0usize;
    for &digit in segment {
        if !digit.is_ascii_digit() {
            return None;
        }
        value = value
            .checked_mul(10)?
            .checked_add(usize::from(digit - b'0'))?;
    }
    Some(value)
}
