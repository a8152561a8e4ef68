//! Tape word encoding.
//!
//! A tape word is 64 bits: an 8-bit tag in the top byte and a 56-bit
//! payload below it. What the payload means depends on the tag:
//!
//! * container openers hold the tape index of their matching closer, and
//!   closers hold the opener's index — skipping a whole container is one
//!   jump, never a walk over its children;
//! * the opening root word holds the total tape length, the closing root
//!   word holds 0;
//! * string words hold a byte offset into the document's string buffer,
//!   where a 4-byte little-endian length, the de-escaped bytes, and one
//!   NUL terminator are laid out contiguously;
//! * `Int64`/`Double` words hold payload 0 and are followed by one
//!   companion word carrying the raw `i64`/`f64` bits, so traversal
//!   advances by two over numeric entries;
//! * `True`/`False`/`Null` need no payload.

/// Mask selecting the 56-bit payload of a tape word.
pub(crate) const VALUE_MASK: u64 = 0x00FF_FFFF_FFFF_FFFF;

/// Number of bytes the string buffer spends on each record's length prefix.
pub(crate) const STRING_LEN_BYTES: usize = 4;

/// Tag stored in the top byte of a tape word.
///
/// The discriminants are the ASCII bytes the tape format uses, so a tag
/// renders as a one-character mnemonic in dumps (`r { } [ ] " l d t f n`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TapeTag {
    /// Sentinel bracketing the whole tape (index 0 and the final word).
    Root = b'r',
    /// `{`
    ObjectOpen = b'{',
    /// `}`
    ObjectClose = b'}',
    /// `[`
    ArrayOpen = b'[',
    /// `]`
    ArrayClose = b']',
    /// A string; payload points into the string buffer.
    String = b'"',
    /// A signed 64-bit integer; the next word holds its bits.
    Int64 = b'l',
    /// An IEEE double; the next word holds its bits.
    Double = b'd',
    /// `true`
    True = b't',
    /// `false`
    False = b'f',
    /// `null`
    Null = b'n',
}

impl TapeTag {
    /// Decodes the tag byte of a raw tape word.
    pub(crate) fn from_word(word: u64) -> Option<Self> {
        Self::from_byte((word >> 56) as u8)
    }

    pub(crate) fn from_byte(byte: u8) -> Option<Self> {
        Some(match byte {
            b'r' => Self::Root,
            b'{' => Self::ObjectOpen,
            b'}' => Self::ObjectClose,
            b'[' => Self::ArrayOpen,
            b']' => Self::ArrayClose,
            b'"' => Self::String,
            b'l' => Self::Int64,
            b'd' => Self::Double,
            b't' => Self::True,
            b'f' => Self::False,
            b'n' => Self::Null,
            _ => return None,
        })
    }

    /// The ASCII mnemonic byte of this tag.
    #[must_use]
    pub fn as_byte(self) -> u8 {
        self as u8
    }

    /// The mnemonic as a `char`, for dumps and messages.
    #[must_use]
    pub fn as_char(self) -> char {
        char::from(self as u8)
    }

    /// True for `{` and `[`.
    #[must_use]
    pub fn is_container_open(self) -> bool {
        matches!(self, Self::ObjectOpen | Self::ArrayOpen)
    }

    /// True for `}` and `]`.
    #[must_use]
    pub fn is_container_close(self) -> bool {
        matches!(self, Self::ObjectClose | Self::ArrayClose)
    }

    /// True for the two-word numeric entries.
    #[must_use]
    pub fn is_number(self) -> bool {
        matches!(self, Self::Int64 | Self::Double)
    }
}

/// Packs a tag and a payload into one tape word.
///
/// The payload must fit in 56 bits; `allocate_capacity` bounds every index
/// and offset written here well below that.
pub(crate) fn pack(tag: TapeTag, payload: u64) -> u64 {
    debug_assert!(payload <= VALUE_MASK);
    (u64::from(tag.as_byte()) << 56) | payload
}

/// The 56-bit payload of a raw tape word.
pub(crate) fn payload(word: u64) -> u64 {
    word & VALUE_MASK
}
