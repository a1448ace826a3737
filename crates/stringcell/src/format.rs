//! The `%`-template engine.
//!
//! Templates follow the printf family: literal text with `%` conversion
//! specifiers, each built from an optional `%n$` argument position, flags
//! (`-`, `+`, space, `0`, `#`), a width and precision (literal digits or `*`
//! consuming an argument), a length modifier (`h`, `l`, `ll`) and a
//! conversion character. Positional and sequential specifiers cannot be
//! mixed within one template.
//!
//! Width and padding count characters, not bytes. On any error the
//! destination is rolled back to its length before the call; a template
//! application is all-or-nothing.

use alloc::{string::String, vec};
use num_bigint::{BigInt, Sign};
use num_traits::ToPrimitive;

use crate::{
    FormatArg, FormatError, StringValue,
    args::IntValue,
    float::{FloatConv, FloatSpec, format_float},
};

/// Formats `template` with `args` into a fresh value.
///
/// # Errors
///
/// Returns a [`FormatError`] describing the first malformed specifier or
/// unusable argument.
pub fn format(template: &str, args: &[FormatArg]) -> Result<StringValue, FormatError> {
    let mut out = StringValue::new();
    run_template(&mut out, template, args)?;
    Ok(out)
}

impl StringValue {
    /// Appends `template` formatted with `args`. On error the value is
    /// restored to its state before the call and nothing is retained.
    ///
    /// # Errors
    ///
    /// Returns a [`FormatError`] describing the first malformed specifier
    /// or unusable argument.
    pub fn append_format(
        &mut self,
        template: &str,
        args: &[FormatArg],
    ) -> Result<(), FormatError> {
        // Truncating back to the pre-call byte length is not enough: a
        // malformed byte form re-encodes canonically once an append routes
        // through the unit form, so the snapshot keeps the value whole.
        let snapshot = self.clone();
        match run_template(self, template, args) {
            Ok(()) => Ok(()),
            Err(err) => {
                *self = snapshot;
                Err(err)
            }
        }
    }

    /// Infallible front-end over [`append_format`](Self::append_format):
    /// a template error appends a diagnostic instead of being returned,
    /// so call sites composing log or message text never branch.
    pub fn append_printf(&mut self, template: &str, args: &[FormatArg]) {
        if let Err(err) = self.append_format(template, args) {
            let diagnostic =
                alloc::format!("unable to format \"{template}\" with supplied arguments: {err}");
            self.append_bytes(diagnostic.as_bytes());
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Length {
    Native,
    Short,
    Wide,
    Big,
}

fn arg_at<'a>(
    args: &'a [FormatArg],
    index: usize,
    xpg: bool,
) -> Result<&'a FormatArg, FormatError> {
    args.get(index).ok_or(if xpg {
        FormatError::IndexOutOfRange
    } else {
        FormatError::NotEnoughArguments
    })
}

/// Accumulates a decimal run starting at `*i`, which must be a digit.
fn scan_number(bytes: &[u8], i: &mut usize) -> Result<usize, FormatError> {
    let mut value: usize = 0;
    while let Some(d) = bytes.get(*i).filter(|b| b.is_ascii_digit()) {
        value = value
            .checked_mul(10)
            .and_then(|v| v.checked_add(usize::from(d - b'0')))
            .ok_or(FormatError::WidthOverflow)?;
        *i += 1;
    }
    Ok(value)
}

/// Appends `segment` space-padded to `width` characters, left-aligned when
/// `minus` is set.
fn emit_padded(dest: &mut StringValue, segment: &mut StringValue, width: usize, minus: bool) {
    let length = segment.char_length();
    let pad = width.saturating_sub(length);
    if pad > 0 && !minus {
        let spaces = vec![b' '; pad];
        dest.append_bytes(&spaces);
    }
    dest.append_value(segment);
    if pad > 0 && minus {
        let spaces = vec![b' '; pad];
        dest.append_bytes(&spaces);
    }
}

/// Reduces a bignum into the low 64 bits, two's complement.
fn wrap_big(big: &BigInt) -> i64 {
    if let Some(v) = big.to_i64() {
        return v;
    }
    let modulus = BigInt::from(1u8) << 64u32;
    let low = ((big % &modulus) + &modulus) % &modulus;
    let bits = low.to_u64().unwrap_or(0);
    bits as i64
}

#[allow(clippy::too_many_lines)]
fn run_template(
    dest: &mut StringValue,
    template: &str,
    args: &[FormatArg],
) -> Result<(), FormatError> {
    let bytes = template.as_bytes();
    let mut i = 0;
    let mut obj_index: usize = 0;
    let mut got_xpg = false;
    let mut got_sequential = false;

    while i < bytes.len() {
        let span = i;
        while i < bytes.len() && bytes[i] != b'%' {
            i += 1;
        }
        if i > span {
            dest.append_bytes(&bytes[span..i]);
        }
        if i == bytes.len() {
            break;
        }
        i += 1;
        if bytes.get(i) == Some(&b'%') {
            dest.append_bytes(b"%");
            i += 1;
            continue;
        }

        // Argument position. A digit run is positional only when a `$`
        // follows; otherwise it is the width and is re-scanned below.
        if bytes.get(i).is_some_and(u8::is_ascii_digit) {
            let digits_at = i;
            let position = scan_number(bytes, &mut i)?;
            if bytes.get(i) == Some(&b'$') {
                i += 1;
                if got_sequential {
                    return Err(FormatError::MixedSpecifiers);
                }
                got_xpg = true;
                obj_index = position
                    .checked_sub(1)
                    .ok_or(FormatError::IndexOutOfRange)?;
            } else {
                i = digits_at;
                if got_xpg {
                    return Err(FormatError::MixedSpecifiers);
                }
                got_sequential = true;
            }
        } else {
            if got_xpg {
                return Err(FormatError::MixedSpecifiers);
            }
            got_sequential = true;
        }
        arg_at(args, obj_index, got_xpg)?;

        let mut minus = false;
        let mut plus = false;
        let mut space = false;
        let mut zero = false;
        let mut hash = false;
        while let Some(&flag) = bytes.get(i) {
            match flag {
                b'-' => minus = true,
                b'+' => plus = true,
                b' ' => space = true,
                b'0' => zero = true,
                b'#' => hash = true,
                _ => break,
            }
            i += 1;
        }

        let mut width = 0usize;
        if bytes.get(i).is_some_and(u8::is_ascii_digit) {
            width = scan_number(bytes, &mut i)?;
        } else if bytes.get(i) == Some(&b'*') {
            i += 1;
            let requested = arg_at(args, obj_index, got_xpg)?.small_int_value()?;
            obj_index += 1;
            if requested < 0 {
                minus = true;
                width = usize::try_from(requested.unsigned_abs())
                    .map_err(|_| FormatError::WidthOverflow)?;
            } else {
                width = usize::try_from(requested).map_err(|_| FormatError::WidthOverflow)?;
            }
        }

        let mut precision: Option<usize> = None;
        if bytes.get(i) == Some(&b'.') {
            i += 1;
            if bytes.get(i).is_some_and(u8::is_ascii_digit) {
                precision = Some(scan_number(bytes, &mut i)?);
            } else if bytes.get(i) == Some(&b'*') {
                i += 1;
                let requested = arg_at(args, obj_index, got_xpg)?.small_int_value()?;
                obj_index += 1;
                let clamped = usize::try_from(requested.max(0))
                    .map_err(|_| FormatError::WidthOverflow)?;
                precision = Some(clamped);
            } else {
                precision = Some(0);
            }
        }

        let mut length = Length::Native;
        match bytes.get(i) {
            Some(b'h') => {
                length = Length::Short;
                i += 1;
            }
            Some(b'l') => {
                i += 1;
                if bytes.get(i) == Some(&b'l') {
                    length = Length::Big;
                    i += 1;
                } else {
                    length = Length::Wide;
                }
            }
            _ => {}
        }

        let Some(&conv_byte) = bytes.get(i) else {
            return Err(FormatError::TruncatedSpecifier);
        };
        let conv = if conv_byte == b'i' { b'd' } else { conv_byte };

        match conv {
            b's' => {
                let mut segment = StringValue::new();
                arg_at(args, obj_index, got_xpg)?.append_to(&mut segment);
                i += 1;
                if let Some(p) = precision {
                    if segment.char_length() > p {
                        segment = if p == 0 {
                            StringValue::new()
                        } else {
                            segment.substring(0, p - 1)
                        };
                    }
                }
                emit_padded(dest, &mut segment, width, minus);
            }
            b'c' => {
                let unit = arg_at(args, obj_index, got_xpg)?.code_point()?;
                i += 1;
                let mut segment = StringValue::from_units(&[unit]);
                emit_padded(dest, &mut segment, width, minus);
            }
            b'd' | b'u' | b'o' | b'x' | b'X' | b'b' => {
                let arg = arg_at(args, obj_index, got_xpg)?;
                i += 1;
                let mut segment = integer_segment(
                    arg, conv, length, plus, space, zero, hash, minus, width, precision,
                )?;
                if conv == b'X' {
                    segment.make_ascii_uppercase();
                }
                let mut segment = StringValue::from_str(&segment);
                emit_padded(dest, &mut segment, width, minus);
            }
            b'e' | b'E' | b'f' | b'g' | b'G' => {
                let value = arg_at(args, obj_index, got_xpg)?.float_value()?;
                i += 1;
                let spec = FloatSpec {
                    minus,
                    plus,
                    space,
                    hash,
                    zero,
                    width,
                    precision,
                    conv: match conv {
                        b'e' | b'E' => FloatConv::Scientific,
                        b'f' => FloatConv::Fixed,
                        _ => FloatConv::General,
                    },
                };
                let mut body = format_float(value, &spec);
                if conv.is_ascii_uppercase() {
                    body.make_ascii_uppercase();
                }
                let mut segment = StringValue::from_str(&body);
                emit_padded(dest, &mut segment, width, minus);
            }
            _ => {
                let (offending, _) = crate::bridge::decode_char(&bytes[i..]);
                return Err(FormatError::BadSpecifier(offending));
            }
        }
        obj_index += usize::from(got_sequential);
    }
    Ok(())
}

/// Builds the sign, base prefix, zero padding and digits of one integer
/// conversion as ASCII. Space padding to `width` is the caller's.
#[allow(clippy::too_many_arguments, clippy::fn_params_excessive_bools)]
fn integer_segment(
    arg: &FormatArg,
    conv: u8,
    length: Length,
    plus: bool,
    space: bool,
    zero: bool,
    hash: bool,
    minus: bool,
    width: usize,
    precision: Option<usize>,
) -> Result<String, FormatError> {
    let big_value;
    let narrow_value;
    if length == Length::Big {
        if conv == b'u' {
            return Err(FormatError::UnsignedBignum);
        }
        big_value = Some(match arg.int_value()? {
            IntValue::Small(v) => BigInt::from(v),
            IntValue::Big(b) => b,
        });
        narrow_value = 0;
    } else {
        let raw = match arg.int_value()? {
            IntValue::Small(v) => v,
            IntValue::Big(b) => wrap_big(&b),
        };
        // Excess width truncates, two's complement.
        #[allow(clippy::cast_possible_truncation)]
        {
            narrow_value = match length {
                Length::Short => i64::from(raw as i16),
                Length::Native => i64::from(raw as i32),
                Length::Wide | Length::Big => raw,
            };
        }
        big_value = None;
    }

    let is_negative = match &big_value {
        Some(big) => big.sign() == Sign::Minus,
        None => conv == b'd' && narrow_value < 0,
    };

    let mut segment = String::new();
    if (is_negative || plus || space) && (big_value.is_some() || conv == b'd') {
        segment.push(if is_negative {
            '-'
        } else if plus {
            '+'
        } else {
            ' '
        });
    }

    let mut precision = precision;
    if hash {
        match conv {
            b'o' => {
                segment.push('0');
                if let Some(p) = &mut precision {
                    *p = p.saturating_sub(1);
                }
            }
            b'x' | b'X' => segment.push_str("0x"),
            b'b' => segment.push_str("0b"),
            _ => {}
        }
    }

    let digits = match &big_value {
        Some(big) => {
            let magnitude = big.magnitude();
            match conv {
                b'd' => magnitude.to_str_radix(10),
                b'o' => magnitude.to_str_radix(8),
                b'x' | b'X' => magnitude.to_str_radix(16),
                _ => magnitude.to_str_radix(2),
            }
        }
        None => {
            #[allow(clippy::cast_sign_loss)]
            let unsigned = match length {
                Length::Short => u64::from(narrow_value as u16),
                Length::Native => u64::from(narrow_value as u32),
                Length::Wide | Length::Big => narrow_value as u64,
            };
            match conv {
                b'd' => alloc::format!("{}", narrow_value.unsigned_abs()),
                b'u' => alloc::format!("{unsigned}"),
                b'o' => alloc::format!("{unsigned:o}"),
                b'x' | b'X' => alloc::format!("{unsigned:x}"),
                _ => alloc::format!("{unsigned:b}"),
            }
        }
    };
    // `%#o` of zero already printed its one zero as the prefix.
    let digits = if digits == "0" && hash && conv == b'o' {
        String::new()
    } else {
        digits
    };

    let mut pad_zeros = 0;
    if let Some(p) = precision {
        pad_zeros = p.saturating_sub(digits.len());
    }
    // The precision supplies minimum digits and supersedes the zero flag.
    if precision.is_none() && zero && !minus {
        let occupied = segment.len() + digits.len();
        if occupied < width {
            pad_zeros = width - occupied;
        }
    }
    for _ in 0..pad_zeros {
        segment.push('0');
    }
    segment.push_str(&digits);
    Ok(segment)
}

#[cfg(test)]
mod tests {
    use num_bigint::BigInt;

    use super::format;
    use crate::{FormatError, StringValue, args};

    fn fmt(template: &str, args: &[crate::FormatArg]) -> StringValue {
        format(template, args).unwrap()
    }

    #[test]
    fn literal_text_passes_through() {
        assert_eq!(fmt("plain ↑ text", &args![]), "plain ↑ text".into());
        assert_eq!(fmt("100%% sure", &args![]), "100% sure".into());
    }

    #[test]
    fn decimal_conversions() {
        assert_eq!(fmt("%d", &args![7]), "7".into());
        assert_eq!(fmt("%d", &args![-7]), "-7".into());
        assert_eq!(fmt("%+d", &args![7]), "+7".into());
        assert_eq!(fmt("% d", &args![7]), " 7".into());
        assert_eq!(fmt("%i", &args![42]), "42".into());
    }

    #[test]
    fn width_and_alignment() {
        assert_eq!(fmt("%5d|", &args![42]), "   42|".into());
        assert_eq!(fmt("%-5d|", &args![3]), "3    |".into());
        assert_eq!(fmt("%05d", &args![42]), "00042".into());
        assert_eq!(fmt("%*d", &args![5, 42]), "   42".into());
        assert_eq!(fmt("%*d", &args![-5, 42]), "42   ".into());
    }

    #[test]
    fn precision_on_integers_supplies_digits() {
        assert_eq!(fmt("%.5d", &args![42]), "00042".into());
        // Precision beats the zero flag.
        assert_eq!(fmt("%08.5d", &args![42]), "   00042".into());
    }

    #[test]
    fn alternate_bases() {
        assert_eq!(fmt("%o", &args![8]), "10".into());
        assert_eq!(fmt("%#o", &args![8]), "010".into());
        assert_eq!(fmt("%#o", &args![0]), "0".into());
        assert_eq!(fmt("%x", &args![255]), "ff".into());
        assert_eq!(fmt("%#x", &args![255]), "0xff".into());
        assert_eq!(fmt("%X", &args![255]), "FF".into());
        assert_eq!(fmt("%#X", &args![255]), "0XFF".into());
        assert_eq!(fmt("%b", &args![5]), "101".into());
        assert_eq!(fmt("%#b", &args![5]), "0b101".into());
    }

    #[test]
    fn unsigned_reinterprets_two_complement() {
        assert_eq!(fmt("%u", &args![-1]), "4294967295".into());
        assert_eq!(fmt("%lu", &args![-1]), "18446744073709551615".into());
        assert_eq!(fmt("%hu", &args![-1]), "65535".into());
        assert_eq!(fmt("%hd", &args![65537]), "1".into());
    }

    #[test]
    fn bignum_conversions() {
        let big: BigInt = BigInt::from(1) << 100u32;
        assert_eq!(
            fmt("%lld", &args![big.clone()]),
            "1267650600228229401496703205376".into()
        );
        assert_eq!(fmt("%+lld", &args![BigInt::from(5)]), "+5".into());
        assert_eq!(fmt("%llx", &args![BigInt::from(255)]), "ff".into());
        assert_eq!(
            format("%llu", &args![big]),
            Err(FormatError::UnsignedBignum)
        );
    }

    #[test]
    fn string_conversions() {
        assert_eq!(fmt("%s", &args!["hi"]), "hi".into());
        assert_eq!(fmt("[%6s]", &args!["hi"]), "[    hi]".into());
        assert_eq!(fmt("[%-6s]", &args!["hi"]), "[hi    ]".into());
        assert_eq!(fmt("%.3s", &args!["abcdef"]), "abc".into());
        assert_eq!(fmt("%.0s", &args!["abcdef"]), "".into());
        // Width counts characters, not bytes.
        assert_eq!(fmt("[%4s]", &args!["↑↑"]), "[  ↑↑]".into());
    }

    #[test]
    fn character_conversion() {
        assert_eq!(fmt("%c", &args![97]), "a".into());
        assert_eq!(fmt("%c", &args![0x2191]), "↑".into());
        assert_eq!(fmt("[%3c]", &args![97]), "[  a]".into());
        assert!(format("%c", &args![0xD800]).is_err());
    }

    #[test]
    fn float_conversions() {
        assert_eq!(fmt("%f", &args![3.14]), "3.140000".into());
        assert_eq!(fmt("%5.2f", &args![3.14159]), " 3.14".into());
        assert_eq!(fmt("%e", &args![1234.5]), "1.234500e+03".into());
        assert_eq!(fmt("%E", &args![1234.5]), "1.234500E+03".into());
        assert_eq!(fmt("%g", &args![0.00001]), "1e-05".into());
        assert_eq!(fmt("%G", &args![0.00001]), "1E-05".into());
        assert_eq!(fmt("%08.2f", &args![-3.5]), "-0003.50".into());
        assert_eq!(fmt("%f", &args![2]), "2.000000".into());
    }

    #[test]
    fn positional_specifiers() {
        assert_eq!(fmt("%2$s-%1$s", &args!["a", "b"]), "b-a".into());
        assert_eq!(fmt("%1$s%1$s", &args!["x"]), "xx".into());
        assert_eq!(
            format("%1$s %s", &args!["a", "b"]),
            Err(FormatError::MixedSpecifiers)
        );
        assert_eq!(
            format("%s %1$s", &args!["a", "b"]),
            Err(FormatError::MixedSpecifiers)
        );
        assert_eq!(
            format("%3$s", &args!["a", "b"]),
            Err(FormatError::IndexOutOfRange)
        );
        assert_eq!(format("%0$s", &args!["a"]), Err(FormatError::IndexOutOfRange));
    }

    #[test]
    fn specifier_errors() {
        assert_eq!(
            format("%d %d", &args![1]),
            Err(FormatError::NotEnoughArguments)
        );
        assert_eq!(format("%d", &args![]), Err(FormatError::NotEnoughArguments));
        // The argument check runs before the specifier is scanned.
        assert_eq!(format("abc %", &args![]), Err(FormatError::NotEnoughArguments));
        assert_eq!(format("abc %", &args![1]), Err(FormatError::TruncatedSpecifier));
        assert_eq!(format("%5", &args![1]), Err(FormatError::TruncatedSpecifier));
        assert_eq!(format("%q", &args![1]), Err(FormatError::BadSpecifier('q')));
        assert_eq!(
            format("%d", &args![1.5]),
            Err(FormatError::NotCoercible {
                expected: "integer",
                value: "1.5".into()
            })
        );
    }

    #[test]
    fn errors_roll_back_the_destination() {
        let mut dest = StringValue::from_str("keep:");
        let err = dest.append_format("%s %d %d", &args!["one", 2]);
        assert!(err.is_err());
        assert_eq!(dest, StringValue::from_str("keep:"));
    }

    #[test]
    fn rollback_preserves_malformed_byte_destinations() {
        // A stray 0xFF plus a two-byte "é": 3 verbatim bytes, 2 characters.
        // The failing template appends before it errors, which collapses
        // the value to its unit form; rollback must restore the verbatim
        // bytes, not a canonical re-encoding truncated to the old length.
        let raw = [0xFF, 0xC3, 0xA9];
        let mut dest = StringValue::from_bytes(&raw);
        dest.char_length();
        assert!(dest.append_format("%s %d", &args!["x"]).is_err());
        assert_eq!(dest.to_bytes(), raw);
        assert!(dest.chars().eq(['ÿ', 'é']));
    }

    #[test]
    fn printf_front_end_reports_inline() {
        let mut dest = StringValue::from_str("log ");
        dest.append_printf("%d items", &args![3]);
        assert_eq!(dest, StringValue::from_str("log 3 items"));

        let mut bad = StringValue::new();
        bad.append_printf("%d", &args![]);
        assert_eq!(
            bad,
            StringValue::from_str(
                "unable to format \"%d\" with supplied arguments: \
                 not enough arguments for all format specifiers"
            )
        );
    }

    #[test]
    fn numeric_text_arguments_coerce() {
        assert_eq!(fmt("%d", &args!["42"]), "42".into());
        assert_eq!(fmt("%x", &args!["255"]), "ff".into());
        assert_eq!(fmt("%f", &args!["2.5"]), "2.500000".into());
    }
}
