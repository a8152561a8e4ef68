//! Stage 2: the tape builder.
//!
//! Replays stage 1's structural offsets left to right through a state
//! machine, writing tape words as it goes. Containers push a frame onto
//! the scope stack when they open; when the matching closer arrives the
//! frame is popped and both bracket words are patched with each other's
//! tape index. Scalars are handed to the string and number sub-parsers.
//!
//! The machine never rescans the input between offsets; whitespace was
//! already discarded by stage 1.

use alloc::vec::Vec;
use core::mem;

use crate::document::ParsedDocument;
use crate::error::ErrorCode;
use crate::tape::TapeTag;

mod numbers;
mod strings;

use numbers::ParsedNumber;

/// One open container awaiting its closer.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ScopeFrame {
    /// Tape index of the open-bracket word, patched when the scope ends.
    pub open_index: usize,
    pub kind: ScopeKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ScopeKind {
    Object,
    Array,
}

/// What the next structural token is allowed to be.
#[derive(Clone, Copy, Debug)]
enum State {
    /// After `{`: a key or an immediate `}`.
    ObjectFirstKey,
    /// After a `,` inside an object: a key.
    ObjectKey,
    /// After a key: the `:` separator.
    ObjectSep,
    /// After `:`: a value.
    ObjectValue,
    /// After an object member: `,` or `}`.
    ObjectContinue,
    /// After `[`: a value or an immediate `]`.
    ArrayFirstValue,
    /// After a `,` inside an array: a value.
    ArrayValue,
    /// After an array element: `,` or `]`.
    ArrayContinue,
    /// After the root value: nothing.
    End,
}

/// Characters that may legally follow a scalar token.
pub(super) fn is_structural_or_whitespace(byte: u8) -> bool {
    matches!(
        byte,
        b'{' | b'}' | b'[' | b']' | b':' | b',' | b' ' | b'\t' | b'\n' | b'\r'
    )
}

/// Tape indexes fit the 56-bit payload; inputs are u32-bounded.
#[allow(clippy::cast_possible_truncation)]
fn loc64(index: usize) -> u64 {
    index as u64
}

/// Builds the tape from the structural offsets recorded in `doc`.
///
/// # Safety
///
/// `bytes` must be readable for [`crate::input::PADDING`] bytes past its
/// end; the in-string scan reads through that window.
pub(crate) unsafe fn build_tape(bytes: &[u8], doc: &mut ParsedDocument) -> Result<(), ErrorCode> {
    // The index and scope buffers are moved out for the walk so the tape
    // can be written while they are read; both keep their allocations.
    let indexes = mem::take(&mut doc.structural_indexes);
    let scopes = mem::take(&mut doc.scopes);
    let mut walker = Walker {
        bytes,
        indexes: &indexes,
        pos: 0,
        scopes,
        doc,
    };
    // SAFETY: forwarded contract.
    let result = unsafe { walker.run() };
    let Walker { scopes, doc, .. } = walker;
    doc.scopes = scopes;
    doc.structural_indexes = indexes;
    result
}

struct Walker<'a, 'd> {
    bytes: &'a [u8],
    indexes: &'a [u32],
    pos: usize,
    scopes: Vec<ScopeFrame>,
    doc: &'d mut ParsedDocument,
}

impl Walker<'_, '_> {
    /// # Safety
    ///
    /// Same padded-input contract as [`build_tape`].
    unsafe fn run(&mut self) -> Result<(), ErrorCode> {
        self.doc.write_tape(0, TapeTag::Root);

        let Some((offset, byte)) = self.next_token() else {
            return Err(ErrorCode::EmptyInput);
        };
        // SAFETY: forwarded contract.
        let mut state = unsafe { self.value(offset, byte)? };

        while let Some((offset, byte)) = self.next_token() {
            state = match state {
                State::ObjectFirstKey => match byte {
                    // SAFETY: forwarded contract.
                    b'"' => unsafe {
                        self.string(offset)?;
                        State::ObjectSep
                    },
                    b'}' => self.close_scope(ScopeKind::Object, TapeTag::ObjectClose)?,
                    b']' => return Err(ErrorCode::DepthMismatch),
                    _ => return Err(ErrorCode::UnexpectedContent),
                },
                State::ObjectKey => match byte {
                    // SAFETY: forwarded contract.
                    b'"' => unsafe {
                        self.string(offset)?;
                        State::ObjectSep
                    },
                    _ => return Err(ErrorCode::UnexpectedContent),
                },
                State::ObjectSep => match byte {
                    b':' => State::ObjectValue,
                    _ => return Err(ErrorCode::UnexpectedContent),
                },
                // SAFETY: forwarded contract.
                State::ObjectValue => unsafe { self.value(offset, byte)? },
                State::ObjectContinue => match byte {
                    b',' => State::ObjectKey,
                    b'}' => self.close_scope(ScopeKind::Object, TapeTag::ObjectClose)?,
                    b']' => return Err(ErrorCode::DepthMismatch),
                    _ => return Err(ErrorCode::UnexpectedContent),
                },
                State::ArrayFirstValue => match byte {
                    b']' => self.close_scope(ScopeKind::Array, TapeTag::ArrayClose)?,
                    b'}' => return Err(ErrorCode::DepthMismatch),
                    // SAFETY: forwarded contract.
                    _ => unsafe { self.value(offset, byte)? },
                },
                // SAFETY: forwarded contract.
                State::ArrayValue => unsafe { self.value(offset, byte)? },
                State::ArrayContinue => match byte {
                    b',' => State::ArrayValue,
                    b']' => self.close_scope(ScopeKind::Array, TapeTag::ArrayClose)?,
                    b'}' => return Err(ErrorCode::DepthMismatch),
                    _ => return Err(ErrorCode::UnexpectedContent),
                },
                State::End => return Err(ErrorCode::TrailingContent),
            };
        }

        match state {
            State::End => {
                self.doc.write_tape(0, TapeTag::Root);
                let total = loc64(self.doc.current_loc());
                self.doc.annotate(0, total);
                Ok(())
            }
            _ => Err(ErrorCode::UnbalancedBrackets),
        }
    }

    /// Next structural offset and its byte; the final index is the length
    /// sentinel and is never yielded.
    fn next_token(&mut self) -> Option<(usize, u8)> {
        if self.pos + 1 >= self.indexes.len() {
            return None;
        }
        let offset = self.indexes[self.pos] as usize;
        self.pos += 1;
        // Stage 1 only records offsets below the input length.
        Some((offset, self.bytes[offset]))
    }

    /// # Safety
    ///
    /// Same padded-input contract as [`build_tape`].
    unsafe fn value(&mut self, offset: usize, byte: u8) -> Result<State, ErrorCode> {
        match byte {
            b'{' => self.open_scope(ScopeKind::Object),
            b'[' => self.open_scope(ScopeKind::Array),
            b'"' => {
                // SAFETY: forwarded contract.
                unsafe { self.string(offset)? };
                Ok(self.after_value())
            }
            b't' => {
                self.atom(offset, b"true", TapeTag::True)?;
                Ok(self.after_value())
            }
            b'f' => {
                self.atom(offset, b"false", TapeTag::False)?;
                Ok(self.after_value())
            }
            b'n' => {
                self.atom(offset, b"null", TapeTag::Null)?;
                Ok(self.after_value())
            }
            b'-' | b'0'..=b'9' => {
                self.number(offset)?;
                Ok(self.after_value())
            }
            b'}' | b']' => Err(if self.scopes.is_empty() {
                ErrorCode::DepthMismatch
            } else {
                ErrorCode::UnexpectedContent
            }),
            _ => Err(ErrorCode::UnexpectedContent),
        }
    }

    fn open_scope(&mut self, kind: ScopeKind) -> Result<State, ErrorCode> {
        if self.scopes.len() >= self.doc.depth_capacity() {
            return Err(ErrorCode::DepthExceeded);
        }
        let open_index = self.doc.current_loc();
        self.scopes.push(ScopeFrame { open_index, kind });
        match kind {
            ScopeKind::Object => {
                self.doc.write_tape(0, TapeTag::ObjectOpen);
                Ok(State::ObjectFirstKey)
            }
            ScopeKind::Array => {
                self.doc.write_tape(0, TapeTag::ArrayOpen);
                Ok(State::ArrayFirstValue)
            }
        }
    }

    fn close_scope(&mut self, kind: ScopeKind, closer: TapeTag) -> Result<State, ErrorCode> {
        let Some(frame) = self.scopes.pop() else {
            return Err(ErrorCode::DepthMismatch);
        };
        if frame.kind != kind {
            return Err(ErrorCode::DepthMismatch);
        }
        let closer_index = self.doc.current_loc();
        self.doc.write_tape(loc64(frame.open_index), closer);
        self.doc.annotate(frame.open_index, loc64(closer_index));
        Ok(self.after_value())
    }

    fn after_value(&self) -> State {
        match self.scopes.last() {
            None => State::End,
            Some(frame) if frame.kind == ScopeKind::Object => State::ObjectContinue,
            Some(_) => State::ArrayContinue,
        }
    }

    /// # Safety
    ///
    /// Same padded-input contract as [`build_tape`].
    unsafe fn string(&mut self, offset: usize) -> Result<(), ErrorCode> {
        // SAFETY: forwarded contract.
        let record = unsafe { strings::parse_string(self.bytes, offset, &mut self.doc.string_buf)? };
        self.doc.write_tape(loc64(record), TapeTag::String);
        Ok(())
    }

    fn atom(&mut self, offset: usize, text: &[u8], tag: TapeTag) -> Result<(), ErrorCode> {
        let end = offset + text.len();
        if self.bytes.get(offset..end) != Some(text) {
            return Err(ErrorCode::InvalidLiteral);
        }
        match self.bytes.get(end) {
            None => {}
            Some(&b) if is_structural_or_whitespace(b) => {}
            Some(_) => return Err(ErrorCode::InvalidLiteral),
        }
        self.doc.write_tape(0, tag);
        Ok(())
    }

    #[allow(clippy::cast_sign_loss)]
    fn number(&mut self, offset: usize) -> Result<(), ErrorCode> {
        match numbers::parse_number(self.bytes, offset)? {
            ParsedNumber::Int(value) => {
                self.doc.write_tape(0, TapeTag::Int64);
                self.doc.push_raw(value as u64);
            }
            ParsedNumber::Double(value) => {
                self.doc.write_tape(0, TapeTag::Double);
                self.doc.push_raw(value.to_bits());
            }
        }
        Ok(())
    }
}
