use thiserror::Error;

/// Outcome of a parse or iterator-construction call.
///
/// The taxonomy splits three ways:
///
/// * capacity/resource errors ([`CapacityExceeded`], [`OutOfMemory`],
///   [`DepthExceeded`]) — always fatal to the current call, never retried
///   internally;
/// * malformed-input errors (everything from [`DepthMismatch`] through
///   [`TrailingContent`]) — parsing aborts at the first one detected and
///   the document's validity flag is cleared;
/// * environment errors ([`UnsupportedHardware`]) — detected once at
///   dispatch time.
///
/// Navigation failures (`move_to`, `down`, `next`, `up` returning `false`)
/// are ordinary boolean outcomes, not error codes.
///
/// The `Display` impl is the human-readable message table.
///
/// [`CapacityExceeded`]: ErrorCode::CapacityExceeded
/// [`OutOfMemory`]: ErrorCode::OutOfMemory
/// [`DepthExceeded`]: ErrorCode::DepthExceeded
/// [`DepthMismatch`]: ErrorCode::DepthMismatch
/// [`TrailingContent`]: ErrorCode::TrailingContent
/// [`UnsupportedHardware`]: ErrorCode::UnsupportedHardware
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// The input is longer than the document's pre-allocated byte capacity.
    #[error("document capacity is smaller than the input")]
    CapacityExceeded,
    /// An allocation failed while sizing the document or the padded copy.
    #[error("memory allocation failed")]
    OutOfMemory,
    /// Containers nest deeper than the document's depth capacity.
    #[error("nesting depth exceeds the document's depth capacity")]
    DepthExceeded,
    /// A closing bracket appeared with no open scope, or its type
    /// disagrees with the scope it closes.
    #[error("closing bracket does not match the open scope")]
    DepthMismatch,
    /// The input ended with one or more scopes still open.
    #[error("input ended with unclosed brackets")]
    UnbalancedBrackets,
    /// A string ran to the end of the input without a closing quote.
    #[error("unterminated string")]
    UnterminatedString,
    /// A control byte (< 0x20) appeared unescaped inside a string.
    #[error("unescaped control character inside a string")]
    UnescapedControl,
    /// A backslash escape other than the JSON set, or malformed `\uXXXX`
    /// hex digits.
    #[error("invalid escape sequence inside a string")]
    InvalidEscape,
    /// A token starting like `true`/`false`/`null` did not spell it out.
    #[error("invalid literal")]
    InvalidLiteral,
    /// A number violating the JSON grammar (leading zero, bare minus,
    /// missing exponent digits, ...).
    #[error("invalid number")]
    InvalidNumber,
    /// String content is not valid UTF-8, or a `\u` escape encodes a lone
    /// surrogate.
    #[error("invalid UTF-8 inside a string")]
    InvalidUtf8,
    /// A byte that cannot start any JSON value appeared where a value was
    /// expected.
    #[error("unexpected content where a value was expected")]
    UnexpectedContent,
    /// The input is empty or all whitespace.
    #[error("empty input")]
    EmptyInput,
    /// Non-whitespace content followed the single top-level value.
    #[error("trailing content after the top-level value")]
    TrailingContent,
    /// No compiled pipeline matches the host CPU.
    #[error("no supported SIMD instruction set on this host")]
    UnsupportedHardware,
    /// The document has never held a successful parse.
    #[error("document has not been parsed")]
    Uninitialized,
}
