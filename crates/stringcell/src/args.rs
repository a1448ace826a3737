//! Format arguments.
//!
//! The template engine takes its arguments as a slice of [`FormatArg`], a
//! small sum over the value shapes a conversion can consume. Conversions
//! coerce on demand: `%s` renders any shape, `%d` accepts integers of any
//! width and numeric text but refuses floats, `%f` accepts anything with a
//! numeric reading. The [`args!`] macro builds the slice from mixed operand
//! types at the call site.

use core::fmt;

use alloc::string::{String, ToString};
use num_bigint::BigInt;
use num_traits::ToPrimitive;

use crate::{FormatError, StringValue};

/// One operand for a format template.
#[derive(Debug, Clone)]
pub enum FormatArg {
    /// A string operand.
    Str(StringValue),
    /// A machine integer operand.
    Int(i64),
    /// A floating operand.
    Float(f64),
    /// An arbitrary-precision integer operand.
    Big(BigInt),
}

/// An integer operand after coercion, before width truncation.
pub(crate) enum IntValue {
    Small(i64),
    Big(BigInt),
}

impl FormatArg {
    /// Coerces to an integer. Floats are refused rather than rounded;
    /// string operands are parsed as decimal, falling back to arbitrary
    /// precision when out of `i64` range.
    pub(crate) fn int_value(&self) -> Result<IntValue, FormatError> {
        match self {
            FormatArg::Int(v) => Ok(IntValue::Small(*v)),
            FormatArg::Big(v) => Ok(IntValue::Big(v.clone())),
            FormatArg::Float(v) => Err(FormatError::not_coercible("integer", v)),
            FormatArg::Str(v) => parse_int_text(&v.to_string())
                .ok_or_else(|| FormatError::not_coercible("integer", v)),
        }
    }

    /// Coerces to an integer that must fit a machine word, as width and
    /// precision operands must.
    pub(crate) fn small_int_value(&self) -> Result<i64, FormatError> {
        match self.int_value()? {
            IntValue::Small(v) => Ok(v),
            IntValue::Big(_) => Err(FormatError::WidthOverflow),
        }
    }

    /// Coerces to a float. Integer operands widen; string operands are
    /// parsed, accepting the usual `inf` and `nan` spellings.
    pub(crate) fn float_value(&self) -> Result<f64, FormatError> {
        match self {
            FormatArg::Float(v) => Ok(*v),
            #[allow(clippy::cast_precision_loss)]
            FormatArg::Int(v) => Ok(*v as f64),
            FormatArg::Big(v) => v
                .to_f64()
                .ok_or_else(|| FormatError::not_coercible("floating-point value", v)),
            FormatArg::Str(v) => {
                let text = v.to_string();
                text.trim_matches(|c: char| c.is_ascii_whitespace())
                    .parse::<f64>()
                    .map_err(|_| FormatError::not_coercible("floating-point value", v))
            }
        }
    }

    /// Coerces to a character for `%c`: the operand is an integer code
    /// point, which must name a scalar value.
    pub(crate) fn code_point(&self) -> Result<char, FormatError> {
        let raw = match self.int_value()? {
            IntValue::Small(v) => v,
            IntValue::Big(big) => big
                .to_i64()
                .ok_or_else(|| FormatError::not_coercible("character code point", self))?,
        };
        u32::try_from(raw)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| FormatError::not_coercible("character code point", self))
    }

    /// Appends the operand's string rendering, reusing an existing string
    /// operand's representation directly.
    pub(crate) fn append_to(&self, dest: &mut StringValue) {
        match self {
            FormatArg::Str(v) => dest.append_value(v),
            other => {
                let text = other.to_string();
                dest.append_bytes(text.as_bytes());
            }
        }
    }
}

fn parse_int_text(text: &str) -> Option<IntValue> {
    let trimmed = text.trim_matches(|c: char| c.is_ascii_whitespace());
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(v) = trimmed.parse::<i64>() {
        return Some(IntValue::Small(v));
    }
    trimmed.parse::<BigInt>().ok().map(IntValue::Big)
}

impl fmt::Display for FormatArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatArg::Str(v) => v.fmt(f),
            FormatArg::Int(v) => write!(f, "{v}"),
            FormatArg::Float(v) => write!(f, "{v}"),
            FormatArg::Big(v) => write!(f, "{v}"),
        }
    }
}

impl From<i64> for FormatArg {
    fn from(v: i64) -> Self {
        FormatArg::Int(v)
    }
}

impl From<i32> for FormatArg {
    fn from(v: i32) -> Self {
        FormatArg::Int(i64::from(v))
    }
}

impl From<i16> for FormatArg {
    fn from(v: i16) -> Self {
        FormatArg::Int(i64::from(v))
    }
}

impl From<u32> for FormatArg {
    fn from(v: u32) -> Self {
        FormatArg::Int(i64::from(v))
    }
}

impl From<u64> for FormatArg {
    fn from(v: u64) -> Self {
        match i64::try_from(v) {
            Ok(small) => FormatArg::Int(small),
            Err(_) => FormatArg::Big(BigInt::from(v)),
        }
    }
}

impl From<f64> for FormatArg {
    fn from(v: f64) -> Self {
        FormatArg::Float(v)
    }
}

impl From<BigInt> for FormatArg {
    fn from(v: BigInt) -> Self {
        FormatArg::Big(v)
    }
}

impl From<&str> for FormatArg {
    fn from(v: &str) -> Self {
        FormatArg::Str(StringValue::from_str(v))
    }
}

impl From<String> for FormatArg {
    fn from(v: String) -> Self {
        FormatArg::Str(StringValue::from_str(&v))
    }
}

impl From<StringValue> for FormatArg {
    fn from(v: StringValue) -> Self {
        FormatArg::Str(v)
    }
}

impl From<&StringValue> for FormatArg {
    fn from(v: &StringValue) -> Self {
        FormatArg::Str(v.clone())
    }
}

impl From<char> for FormatArg {
    fn from(v: char) -> Self {
        let mut buf = [0u8; 4];
        FormatArg::Str(StringValue::from_str(v.encode_utf8(&mut buf)))
    }
}

/// Builds a `Vec<FormatArg>` from mixed operands.
///
/// ```
/// use stringcell::{StringValue, args};
///
/// let mut v = StringValue::new();
/// v.append_format("%s=%d", &args!["answer", 42]).unwrap();
/// assert_eq!(v, StringValue::from_str("answer=42"));
/// ```
#[macro_export]
macro_rules! args {
    [] => { $crate::vec::Vec::<$crate::FormatArg>::new() };
    [$($arg:expr),+ $(,)?] => {
        $crate::vec![$($crate::FormatArg::from($arg)),+]
    };
}
