//! Conversions between the byte form and the code-unit form.
//!
//! The byte form is UTF-8 with a lenient decode: any byte sequence is
//! decodable, and a byte that does not begin a well-formed scalar is taken as
//! a single character whose code point is the byte value. Construction keeps
//! input bytes verbatim, so decoding never has to be reversible; re-encoding
//! (after a mutation through the unit form) always produces canonical UTF-8.

use alloc::vec::Vec;

/// Decodes the first character of `bytes`, returning it with the number of
/// bytes consumed. `bytes` must be non-empty.
///
/// Malformed input consumes exactly one byte and yields that byte as a
/// character, so every position eventually advances.
pub(crate) fn decode_char(bytes: &[u8]) -> (char, usize) {
    let b0 = bytes[0];
    if b0 < 0x80 {
        return (b0 as char, 1);
    }
    let len = match b0 {
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        // Continuation byte, overlong lead (C0/C1), or out-of-range lead.
        _ => return (b0 as char, 1),
    };
    if bytes.len() < len || !bytes[1..len].iter().all(|b| (b & 0xC0) == 0x80) {
        return (b0 as char, 1);
    }
    let cp = match len {
        2 => (u32::from(b0 & 0x1F) << 6) | u32::from(bytes[1] & 0x3F),
        3 => {
            (u32::from(b0 & 0x0F) << 12)
                | (u32::from(bytes[1] & 0x3F) << 6)
                | u32::from(bytes[2] & 0x3F)
        }
        _ => {
            (u32::from(b0 & 0x07) << 18)
                | (u32::from(bytes[1] & 0x3F) << 12)
                | (u32::from(bytes[2] & 0x3F) << 6)
                | u32::from(bytes[3] & 0x3F)
        }
    };
    match char::from_u32(cp) {
        // Reject overlong encodings; surrogates already fail from_u32.
        Some(c) if c.len_utf8() == len => (c, len),
        _ => (b0 as char, 1),
    }
}

/// Length in bytes of the longest prefix in which every byte is a single
/// character: ASCII, or a byte the lenient decoder treats as standalone.
///
/// This is the speed-sensitive scan used by lazy character counting. Bytes
/// below `0xC0` can never begin a multi-unit character, so they count one
/// each without decoding.
pub(crate) fn single_unit_prefix(bytes: &[u8]) -> usize {
    bytes.iter().position(|&b| b >= 0xC0).unwrap_or(bytes.len())
}

/// Counts the characters of `bytes` under the lenient decode, walking the
/// single-unit prefix in bulk and decoding only the remainder.
pub(crate) fn count_chars(bytes: &[u8]) -> usize {
    let prefix = single_unit_prefix(bytes);
    let mut count = prefix;
    let mut rest = &bytes[prefix..];
    while !rest.is_empty() {
        let (_, step) = decode_char(rest);
        rest = &rest[step..];
        count += 1;
    }
    count
}

/// Decodes `bytes` onto the end of `out`.
pub(crate) fn decode_into(bytes: &[u8], out: &mut Vec<char>) {
    let mut rest = bytes;
    while !rest.is_empty() {
        let (c, step) = decode_char(rest);
        out.push(c);
        rest = &rest[step..];
    }
}

/// Encodes `units` as canonical UTF-8 onto the end of `out`.
pub(crate) fn encode_into(units: &[char], out: &mut Vec<u8>) {
    let mut buf = [0u8; 4];
    for &c in units {
        out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
    }
}

/// Number of bytes `units` occupies once encoded.
pub(crate) fn encoded_len(units: &[char]) -> usize {
    units.iter().map(|c| c.len_utf8()).sum()
}

/// Steps back from byte offset `at` to the start of the preceding character,
/// skipping over at most three continuation bytes. Returns `0` when `at` is
/// at or before the first character.
pub(crate) fn prev_boundary(bytes: &[u8], at: usize) -> usize {
    if at == 0 {
        return 0;
    }
    let mut i = at - 1;
    let floor = at.saturating_sub(4);
    while i > floor && (bytes[i] & 0xC0) == 0x80 {
        i -= 1;
    }
    i
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::{count_chars, decode_char, decode_into, encode_into, prev_boundary};

    #[test]
    fn ascii_decodes_one_byte_each() {
        assert_eq!(decode_char(b"abc"), ('a', 1));
        assert_eq!(count_chars(b"hello"), 5);
    }

    #[test]
    fn multibyte_scalars_round_trip() {
        for s in ["å", "β", "↑", "👍", "aß↑👍z"] {
            let mut units = Vec::new();
            decode_into(s.as_bytes(), &mut units);
            assert_eq!(units, s.chars().collect::<Vec<_>>());
            let mut bytes = Vec::new();
            encode_into(&units, &mut bytes);
            assert_eq!(bytes, s.as_bytes());
        }
    }

    #[test]
    fn stray_bytes_count_singly() {
        // A lone continuation byte and an overlong lead each decode to
        // themselves.
        assert_eq!(decode_char(&[0x80, b'a']), ('\u{80}', 1));
        assert_eq!(decode_char(&[0xC0, 0xAF]), ('\u{C0}', 1));
        // A truncated sequence consumes only its lead byte.
        assert_eq!(decode_char(&[0xE2, 0x86]), ('\u{E2}', 1));
        assert_eq!(count_chars(&[0x80, 0xC0, 0xAF, b'x']), 4);
    }

    #[test]
    fn surrogate_encodings_are_rejected() {
        // UTF-8 encoding of U+D800; decodes as three stray bytes.
        assert_eq!(count_chars(&[0xED, 0xA0, 0x80]), 3);
    }

    #[test]
    fn prev_boundary_skips_continuations() {
        let s = "a↑b".as_bytes(); // 61 E2 86 91 62
        assert_eq!(prev_boundary(s, 5), 4);
        assert_eq!(prev_boundary(s, 4), 1);
        assert_eq!(prev_boundary(s, 3), 1);
        assert_eq!(prev_boundary(s, 1), 0);
        assert_eq!(prev_boundary(s, 0), 0);
    }
}
