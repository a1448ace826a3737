//! Floating-point field rendering for the template engine.
//!
//! Produces the `%e`, `%f` and `%g` field body as ASCII, including the sign
//! glyph and any zero padding, so the engine only has to apply space padding
//! and the uppercase transform. Exponents always carry an explicit sign and
//! at least two digits.

use alloc::{
    format,
    string::{String, ToString},
};

/// Which floating conversion a specifier selected. Uppercase variants are
/// the caller's concern; the body is produced in lowercase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum FloatConv {
    Scientific,
    Fixed,
    General,
}

/// The flags and geometry of one floating specifier.
pub(crate) struct FloatSpec {
    pub minus: bool,
    pub plus: bool,
    pub space: bool,
    pub hash: bool,
    pub zero: bool,
    pub width: usize,
    pub precision: Option<usize>,
    pub conv: FloatConv,
}

/// Renders `value` per `spec`. The result includes the sign and, for the
/// zero flag, left padding to `spec.width`; space padding is left to the
/// caller. Non-finite values ignore the zero flag.
pub(crate) fn format_float(value: f64, spec: &FloatSpec) -> String {
    let negative = value.is_sign_negative() && !value.is_nan();
    let sign = if negative {
        "-"
    } else if spec.plus {
        "+"
    } else if spec.space {
        " "
    } else {
        ""
    };
    if !value.is_finite() {
        let body = if value.is_nan() { "nan" } else { "inf" };
        return format!("{sign}{body}");
    }
    let magnitude = value.abs();
    let body = match spec.conv {
        FloatConv::Fixed => fixed(magnitude, spec.precision.unwrap_or(6), spec.hash),
        FloatConv::Scientific => scientific(magnitude, spec.precision.unwrap_or(6), spec.hash),
        FloatConv::General => general(magnitude, spec.precision.unwrap_or(6), spec.hash),
    };
    let mut out = String::with_capacity(sign.len() + body.len());
    out.push_str(sign);
    if spec.zero && !spec.minus && sign.len() + body.len() < spec.width {
        for _ in 0..spec.width - sign.len() - body.len() {
            out.push('0');
        }
    }
    out.push_str(&body);
    out
}

fn fixed(magnitude: f64, precision: usize, hash: bool) -> String {
    let mut out = format!("{magnitude:.precision$}");
    if hash && precision == 0 {
        out.push('.');
    }
    out
}

fn scientific(magnitude: f64, precision: usize, hash: bool) -> String {
    let rendered = format!("{magnitude:.precision$e}");
    let (mantissa, exponent) = match rendered.split_once('e') {
        Some(parts) => parts,
        None => (rendered.as_str(), "0"),
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let mut out = String::from(mantissa);
    if hash && precision == 0 {
        out.push('.');
    }
    push_exponent(&mut out, exponent);
    out
}

fn general(magnitude: f64, precision: usize, hash: bool) -> String {
    let significant = precision.max(1);
    // The decimal exponent after rounding to `significant` digits decides
    // between fixed and scientific style.
    let frac = significant - 1;
    let probe = format!("{magnitude:.frac$e}");
    let exponent: i32 = match probe.split_once('e') {
        Some((_, e)) => e.parse().unwrap_or(0),
        None => 0,
    };
    let mut out = if i64::from(exponent) >= -4 && i64::from(exponent) < significant as i64 {
        let frac = (significant as i64 - 1 - i64::from(exponent)) as usize;
        format!("{magnitude:.frac$}")
    } else {
        scientific(magnitude, frac, false)
    };
    if !hash {
        trim_trailing_zeros(&mut out);
    }
    out
}

/// Drops trailing fractional zeros (and a then-bare point), leaving any
/// exponent suffix intact.
fn trim_trailing_zeros(out: &mut String) {
    let (mantissa_end, suffix) = match out.find('e') {
        Some(pos) => (pos, out[pos..].to_string()),
        None => (out.len(), String::new()),
    };
    if !out[..mantissa_end].contains('.') {
        return;
    }
    let mut keep = mantissa_end;
    while keep > 0 && out.as_bytes()[keep - 1] == b'0' {
        keep -= 1;
    }
    if keep > 0 && out.as_bytes()[keep - 1] == b'.' {
        keep -= 1;
    }
    out.truncate(keep);
    out.push_str(&suffix);
}

fn push_exponent(out: &mut String, exponent: i32) {
    out.push('e');
    out.push(if exponent < 0 { '-' } else { '+' });
    let magnitude = exponent.unsigned_abs();
    if magnitude < 10 {
        out.push('0');
    }
    out.push_str(&magnitude.to_string());
}
