use alloc::string::String;

use thiserror::Error;

/// A recoverable failure while applying a format template.
///
/// Template errors are the one class of failure in this crate that is driven
/// by externally supplied data, so they are reported as values rather than
/// panics. When a format call fails the destination value is rolled back to
/// its pre-call state; no partial output is retained.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormatError {
    /// A template used both `%n$` positional and plain sequential specifiers.
    #[error("cannot mix \"%\" and \"%n$\" conversion specifiers")]
    MixedSpecifiers,
    /// A sequential specifier ran past the end of the argument list.
    #[error("not enough arguments for all format specifiers")]
    NotEnoughArguments,
    /// A `%n$` index named an argument outside the supplied list.
    #[error("\"%n$\" argument index out of range")]
    IndexOutOfRange,
    /// The template ended inside a conversion specifier.
    #[error("format string ended in middle of field specifier")]
    TruncatedSpecifier,
    /// An unrecognized conversion character.
    #[error("bad field specifier \"{0}\"")]
    BadSpecifier(char),
    /// `%u` combined with the arbitrary-precision length modifier.
    #[error("unsigned bignum format is invalid")]
    UnsignedBignum,
    /// A literal width or precision too large to represent.
    #[error("field width overflow")]
    WidthOverflow,
    /// An argument could not be coerced to the type the conversion demands.
    #[error("expected {expected} but got \"{value}\"")]
    NotCoercible {
        /// What the conversion required, e.g. `"integer"`.
        expected: &'static str,
        /// Display form of the offending argument.
        value: String,
    },
}

impl FormatError {
    pub(crate) fn not_coercible(expected: &'static str, value: impl core::fmt::Display) -> Self {
        FormatError::NotCoercible {
            expected,
            value: alloc::format!("{value}"),
        }
    }
}
