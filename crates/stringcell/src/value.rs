//! The dual-representation string value.
//!
//! A [`StringValue`] owns one abstract character sequence held in up to two
//! encodings: a variable-width byte form (UTF-8 under the lenient decode of
//! [`crate::bridge`]) and a fixed-width unit form (`Vec<char>`, one unit per
//! character). Which forms are present, and which is authoritative, is a
//! type-level fact carried by [`Repr`] rather than a pair of invalidation
//! flags:
//!
//! - `Bytes` — byte form only; the character count is cached lazily. When
//!   the count equals the byte length every character is a single unit and
//!   the unit form is never materialized.
//! - `Units` — unit form only, authoritative; the byte form is stale and is
//!   re-encoded on demand.
//! - `Both` — both forms, consistent; the unit form is authoritative.
//! - `Binary` — raw bytes with no character semantics, the interop fast
//!   path. Character-level reads treat each byte as one character and never
//!   engage the decoder.
//!
//! All mutators take `&mut self`: exclusive access is the kernel's proof of
//! unique ownership. The reference-counted, copy-on-write layer lives in
//! [`crate::shared`].

use alloc::vec::Vec;
use core::{
    fmt::{self, Write as _},
    slice,
};

use alloc::collections::TryReserveError;
use bstr::BStr;

use crate::{bridge, grow};

/// Lazily computed character count of a byte-form value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CharCount {
    Unknown,
    Known(usize),
}

#[derive(Clone)]
pub(crate) enum Repr {
    Binary(Vec<u8>),
    Bytes { bytes: Vec<u8>, chars: CharCount },
    Units(Vec<char>),
    Both { bytes: Vec<u8>, units: Vec<char> },
}

/// A mutable string value with interchangeable byte and code-unit encodings.
#[derive(Clone)]
pub struct StringValue {
    pub(crate) repr: Repr,
}

impl StringValue {
    /// Creates an empty value.
    #[must_use]
    pub fn new() -> Self {
        StringValue {
            repr: Repr::Bytes {
                bytes: Vec::new(),
                chars: CharCount::Known(0),
            },
        }
    }

    /// Creates a value from a byte sequence, stored verbatim.
    ///
    /// The bytes are interpreted as characters lazily and leniently; until a
    /// mutation routes through the unit form, [`to_bytes`](Self::to_bytes)
    /// returns exactly the input.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        StringValue {
            repr: Repr::Bytes {
                bytes: bytes.to_vec(),
                chars: CharCount::Unknown,
            },
        }
    }

    /// Creates a value from text. Equivalent to
    /// [`from_bytes`](Self::from_bytes) on the UTF-8 bytes.
    #[must_use]
    pub fn from_str(text: &str) -> Self {
        Self::from_bytes(text.as_bytes())
    }

    /// Creates a value holding the unit form directly.
    #[must_use]
    pub fn from_units(units: &[char]) -> Self {
        StringValue {
            repr: Repr::Units(units.to_vec()),
        }
    }

    /// Creates a raw-binary value with no character semantics.
    #[must_use]
    pub fn from_binary(bytes: &[u8]) -> Self {
        StringValue {
            repr: Repr::Binary(bytes.to_vec()),
        }
    }

    /// Returns the raw bytes when this is a binary value.
    #[must_use]
    pub fn as_binary(&self) -> Option<&[u8]> {
        match &self.repr {
            Repr::Binary(b) => Some(b),
            _ => None,
        }
    }

    /// True when the value holds no characters (or, for binary, no bytes).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match &self.repr {
            Repr::Binary(b) => b.is_empty(),
            Repr::Bytes { bytes, .. } => bytes.is_empty(),
            Repr::Units(units) | Repr::Both { units, .. } => units.is_empty(),
        }
    }

    /// Number of abstract characters, computing and caching it on first use.
    ///
    /// The first call on a byte-form value scans the longest single-unit
    /// prefix in bulk and decodes only the remainder. If every character
    /// turned out to be a single unit only the count is recorded; otherwise
    /// the unit form is materialized as a side effect, since multi-unit
    /// indexing needs it anyway.
    pub fn char_length(&mut self) -> usize {
        match &mut self.repr {
            Repr::Binary(b) => b.len(),
            Repr::Units(units) | Repr::Both { units, .. } => units.len(),
            Repr::Bytes {
                chars: CharCount::Known(n),
                ..
            } => *n,
            Repr::Bytes { bytes, chars } => {
                let n = bridge::count_chars(bytes);
                if n == bytes.len() {
                    *chars = CharCount::Known(n);
                    n
                } else {
                    let mut units = Vec::new();
                    grow::grow_units(&mut units, n);
                    bridge::decode_into(bytes, &mut units);
                    self.repr = Repr::Both {
                        bytes: core::mem::take(bytes),
                        units,
                    };
                    n
                }
            }
        }
    }

    /// Character count without touching the cache. Costs a full scan when
    /// the value has only an uncounted byte form; used by shared handles
    /// that cannot mutate.
    #[must_use]
    pub(crate) fn char_length_uncached(&self) -> usize {
        match &self.repr {
            Repr::Binary(b) => b.len(),
            Repr::Units(units) | Repr::Both { units, .. } => units.len(),
            Repr::Bytes {
                chars: CharCount::Known(n),
                ..
            } => *n,
            Repr::Bytes { bytes, .. } => bridge::count_chars(bytes),
        }
    }

    /// The `index`'th character. `index` must be in range; an out-of-range
    /// index is a caller bug and panics.
    ///
    /// All-single-unit values read their bytes directly; otherwise the unit
    /// form (materialized by the length computation) is indexed.
    pub fn char_at(&mut self, index: usize) -> char {
        let len = self.char_length();
        assert!(index < len, "char_at index {index} out of range ({len})");
        match &self.repr {
            Repr::Binary(b) => return b[index] as char,
            Repr::Bytes {
                bytes,
                chars: CharCount::Known(n),
            } if *n == bytes.len() => return bytes[index] as char,
            Repr::Units(units) | Repr::Both { units, .. } => return units[index],
            // Known multi-unit count without a unit form (an append summed
            // the counts); indexing needs the units.
            Repr::Bytes { .. } => {}
        }
        self.materialize_units();
        match &self.repr {
            Repr::Units(units) | Repr::Both { units, .. } => units[index],
            _ => unreachable!(),
        }
    }

    /// Non-caching form of [`char_at`](Self::char_at) for shared handles.
    pub(crate) fn char_at_uncached(&self, index: usize) -> char {
        let len = self.char_length_uncached();
        assert!(index < len, "char_at index {index} out of range ({len})");
        match &self.repr {
            Repr::Binary(b) => b[index] as char,
            Repr::Bytes {
                bytes,
                chars: CharCount::Known(n),
            } if *n == bytes.len() => bytes[index] as char,
            Repr::Bytes { bytes, .. } => {
                let mut rest = bytes.as_slice();
                for _ in 0..index {
                    let (_, step) = bridge::decode_char(rest);
                    rest = &rest[step..];
                }
                bridge::decode_char(rest).0
            }
            Repr::Units(units) | Repr::Both { units, .. } => units[index],
        }
    }

    /// Forces the unit form, returning it. A binary value is promoted to a
    /// character value first (each byte becoming the character of the same
    /// code point).
    pub fn to_units(&mut self) -> &[char] {
        self.materialize_units();
        match &self.repr {
            Repr::Units(units) | Repr::Both { units, .. } => units,
            _ => unreachable!(),
        }
    }

    /// Forces the byte form, returning it. For a binary value this is the
    /// raw byte view. A stale byte form is re-encoded from the units.
    pub fn to_bytes(&mut self) -> &[u8] {
        self.materialize_bytes();
        match &self.repr {
            Repr::Binary(bytes)
            | Repr::Bytes { bytes, .. }
            | Repr::Both { bytes, .. } => bytes,
            Repr::Units(_) => unreachable!(),
        }
    }

    pub(crate) fn materialize_units(&mut self) {
        match &mut self.repr {
            Repr::Units(_) | Repr::Both { .. } => {}
            Repr::Bytes { bytes, .. } => {
                let mut units = Vec::new();
                bridge::decode_into(bytes, &mut units);
                self.repr = Repr::Both {
                    bytes: core::mem::take(bytes),
                    units,
                };
            }
            Repr::Binary(_) => self.promote_binary(),
        }
    }

    pub(crate) fn materialize_bytes(&mut self) {
        if let Repr::Units(units) = &mut self.repr {
            let mut bytes = Vec::new();
            grow::grow_bytes(&mut bytes, bridge::encoded_len(units));
            bridge::encode_into(units, &mut bytes);
            self.repr = Repr::Both {
                bytes,
                units: core::mem::take(units),
            };
        }
    }

    /// Gives a binary value character semantics: each byte becomes one
    /// character. The byte form is re-encoded canonically, so high bytes
    /// widen to two-byte sequences.
    fn promote_binary(&mut self) {
        let Repr::Binary(raw) = &mut self.repr else {
            return;
        };
        let raw = core::mem::take(raw);
        if raw.is_ascii() {
            self.repr = Repr::Bytes {
                chars: CharCount::Known(raw.len()),
                bytes: raw,
            };
        } else {
            let units: Vec<char> = raw.iter().map(|&b| b as char).collect();
            let mut bytes = Vec::new();
            grow::grow_bytes(&mut bytes, bridge::encoded_len(&units));
            bridge::encode_into(&units, &mut bytes);
            self.repr = Repr::Both { bytes, units };
        }
    }

    /// Resizes the live representation to `length` in its own dimension:
    /// bytes for byte-form and binary values, units for unit-form values.
    /// Growth zero-fills; resizing the byte form resets the character count
    /// and drops a stale unit form.
    pub fn set_length(&mut self, length: usize) {
        match &mut self.repr {
            Repr::Binary(bytes) => {
                if length > bytes.len() {
                    bytes.reserve_exact(length - bytes.len());
                }
                bytes.resize(length, 0);
            }
            Repr::Bytes { bytes, chars } => {
                if length > bytes.len() {
                    bytes.reserve_exact(length - bytes.len());
                }
                bytes.resize(length, 0);
                *chars = CharCount::Unknown;
            }
            Repr::Both { bytes, .. } => {
                let mut bytes = core::mem::take(bytes);
                if length > bytes.len() {
                    bytes.reserve_exact(length - bytes.len());
                }
                bytes.resize(length, 0);
                self.repr = Repr::Bytes {
                    bytes,
                    chars: CharCount::Unknown,
                };
            }
            Repr::Units(units) => {
                if length > units.len() {
                    units.reserve_exact(length - units.len());
                }
                units.resize(length, '\0');
            }
        }
    }

    /// Fallible form of [`set_length`](Self::set_length): allocation refusal
    /// is reported and leaves the value unmodified.
    ///
    /// # Errors
    ///
    /// Returns the allocator's refusal when the requested length cannot be
    /// reserved.
    pub fn attempt_set_length(&mut self, length: usize) -> Result<(), TryReserveError> {
        match &mut self.repr {
            Repr::Binary(bytes) => {
                if length > bytes.len() {
                    bytes.try_reserve_exact(length - bytes.len())?;
                }
                bytes.resize(length, 0);
            }
            Repr::Bytes { bytes, chars } => {
                if length > bytes.len() {
                    bytes.try_reserve_exact(length - bytes.len())?;
                }
                bytes.resize(length, 0);
                *chars = CharCount::Unknown;
            }
            Repr::Both { bytes, .. } => {
                if length > bytes.len() {
                    bytes.try_reserve_exact(length - bytes.len())?;
                }
                let mut bytes = core::mem::take(bytes);
                bytes.resize(length, 0);
                self.repr = Repr::Bytes {
                    bytes,
                    chars: CharCount::Unknown,
                };
            }
            Repr::Units(units) => {
                if length > units.len() {
                    units.try_reserve_exact(length - units.len())?;
                }
                units.resize(length, '\0');
            }
        }
        Ok(())
    }

    /// The characters from `first` through `last` inclusive, as a new value.
    /// Indices must be in range with `first <= last`.
    ///
    /// All-single-unit values slice bytes directly and the result's count is
    /// known without a rescan; otherwise the unit form is sliced.
    pub fn substring(&mut self, first: usize, last: usize) -> StringValue {
        let len = self.char_length();
        assert!(
            first <= last && last < len,
            "substring range {first}..={last} out of range ({len})"
        );
        match &self.repr {
            Repr::Binary(b) => return StringValue::from_binary(&b[first..=last]),
            Repr::Bytes {
                bytes,
                chars: CharCount::Known(n),
            } if *n == bytes.len() => {
                return StringValue {
                    repr: Repr::Bytes {
                        bytes: bytes[first..=last].to_vec(),
                        chars: CharCount::Known(last - first + 1),
                    },
                };
            }
            Repr::Units(units) | Repr::Both { units, .. } => {
                return StringValue::from_units(&units[first..=last]);
            }
            Repr::Bytes { .. } => {}
        }
        self.materialize_units();
        match &self.repr {
            Repr::Units(units) | Repr::Both { units, .. } => {
                StringValue::from_units(&units[first..=last])
            }
            _ => unreachable!(),
        }
    }

    /// Non-caching form of [`substring`](Self::substring) for shared
    /// handles.
    pub(crate) fn substring_uncached(&self, first: usize, last: usize) -> StringValue {
        let len = self.char_length_uncached();
        assert!(
            first <= last && last < len,
            "substring range {first}..={last} out of range ({len})"
        );
        match &self.repr {
            Repr::Binary(b) => StringValue::from_binary(&b[first..=last]),
            Repr::Bytes { bytes, .. } if len == bytes.len() => StringValue {
                repr: Repr::Bytes {
                    bytes: bytes[first..=last].to_vec(),
                    chars: CharCount::Known(last - first + 1),
                },
            },
            _ => {
                let units: Vec<char> = self.chars().skip(first).take(last - first + 1).collect();
                StringValue {
                    repr: Repr::Units(units),
                }
            }
        }
    }

    /// Reverses the character sequence in place. Length 0 or 1 is a no-op.
    ///
    /// The authoritative representation is reversed; when that is the unit
    /// form the stale byte form is dropped.
    pub fn reverse_in_place(&mut self) {
        if self.char_length() <= 1 {
            return;
        }
        match &mut self.repr {
            Repr::Binary(bytes) => {
                bytes.reverse();
                return;
            }
            Repr::Bytes {
                bytes,
                chars: CharCount::Known(n),
            } if *n == bytes.len() => {
                bytes.reverse();
                return;
            }
            Repr::Units(units) => {
                units.reverse();
                return;
            }
            Repr::Both { .. } | Repr::Bytes { .. } => {}
        }
        self.materialize_units();
        if let Repr::Both { units, .. } = &mut self.repr {
            let mut units = core::mem::take(units);
            units.reverse();
            self.repr = Repr::Units(units);
        }
    }

    /// A reversed copy, leaving `self` untouched. The copy-on-write path
    /// for shared values.
    #[must_use]
    pub(crate) fn reversed(&self) -> StringValue {
        match &self.repr {
            Repr::Binary(b) => {
                let mut rev = b.clone();
                rev.reverse();
                StringValue {
                    repr: Repr::Binary(rev),
                }
            }
            Repr::Bytes { bytes, chars } => {
                let single_unit = match chars {
                    CharCount::Known(n) => *n == bytes.len(),
                    CharCount::Unknown => bridge::count_chars(bytes) == bytes.len(),
                };
                if single_unit {
                    let mut rev = bytes.clone();
                    rev.reverse();
                    StringValue {
                        repr: Repr::Bytes {
                            chars: CharCount::Known(rev.len()),
                            bytes: rev,
                        },
                    }
                } else {
                    let mut units = Vec::new();
                    bridge::decode_into(bytes, &mut units);
                    units.reverse();
                    StringValue {
                        repr: Repr::Units(units),
                    }
                }
            }
            Repr::Units(units) | Repr::Both { units, .. } => {
                let mut rev = units.clone();
                rev.reverse();
                StringValue {
                    repr: Repr::Units(rev),
                }
            }
        }
    }

    /// Capacity of the live byte form, zero when only the unit form is held.
    #[cfg(test)]
    pub(crate) fn byte_capacity(&self) -> usize {
        match &self.repr {
            Repr::Binary(bytes)
            | Repr::Bytes { bytes, .. }
            | Repr::Both { bytes, .. } => bytes.capacity(),
            Repr::Units(_) => 0,
        }
    }

    /// Iterates the abstract character sequence without mutating any cache.
    pub fn chars(&self) -> Chars<'_> {
        Chars {
            inner: match &self.repr {
                Repr::Binary(b) => CharsInner::Latin1(b.iter()),
                Repr::Bytes { bytes, .. } => CharsInner::Decode(bytes),
                Repr::Units(units) | Repr::Both { units, .. } => CharsInner::Units(units.iter()),
            },
        }
    }
}

impl Default for StringValue {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for StringValue {
    fn from(text: &str) -> Self {
        Self::from_str(text)
    }
}

/// Iterator over a value's characters. See [`StringValue::chars`].
pub struct Chars<'a> {
    inner: CharsInner<'a>,
}

enum CharsInner<'a> {
    Latin1(slice::Iter<'a, u8>),
    Decode(&'a [u8]),
    Units(slice::Iter<'a, char>),
}

impl Iterator for Chars<'_> {
    type Item = char;

    fn next(&mut self) -> Option<char> {
        match &mut self.inner {
            CharsInner::Latin1(iter) => iter.next().map(|&b| b as char),
            CharsInner::Decode(rest) => {
                if rest.is_empty() {
                    return None;
                }
                let (c, step) = bridge::decode_char(rest);
                *rest = &rest[step..];
                Some(c)
            }
            CharsInner::Units(iter) => iter.next().copied(),
        }
    }
}

/// Equality of the abstract character sequence, independent of which
/// representations happen to be materialized.
impl PartialEq for StringValue {
    fn eq(&self, other: &Self) -> bool {
        self.chars().eq(other.chars())
    }
}

impl Eq for StringValue {}

impl fmt::Display for StringValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in self.chars() {
            f.write_char(c)?;
        }
        Ok(())
    }
}

impl fmt::Debug for StringValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.repr {
            Repr::Binary(b) => write!(f, "Binary({:?})", BStr::new(b)),
            Repr::Bytes { bytes, chars } => {
                write!(f, "Bytes({:?}, {chars:?})", BStr::new(bytes))
            }
            Repr::Units(units) => {
                let text: alloc::string::String = units.iter().collect();
                write!(f, "Units({text:?})")
            }
            Repr::Both { bytes, .. } => write!(f, "Both({:?})", BStr::new(bytes)),
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::{CharCount, Repr, StringValue};

    #[test]
    fn lazy_count_keeps_ascii_byte_only() {
        let mut v = StringValue::from_str("hello");
        assert_eq!(v.char_length(), 5);
        assert!(matches!(
            v.repr,
            Repr::Bytes {
                chars: CharCount::Known(5),
                ..
            }
        ));
    }

    #[test]
    fn lazy_count_materializes_units_for_multibyte() {
        let mut v = StringValue::from_str("aß↑");
        assert_eq!(v.char_length(), 3);
        assert!(matches!(v.repr, Repr::Both { .. }));
        assert_eq!(v.char_at(1), 'ß');
        assert_eq!(v.char_at(2), '↑');
    }

    #[test]
    fn bytes_survive_round_trip_even_when_malformed() {
        let raw = [b'a', 0xFF, 0x80, b'z'];
        let mut v = StringValue::from_bytes(&raw);
        assert_eq!(v.char_length(), 4);
        assert_eq!(v.to_bytes(), raw);
    }

    #[test]
    fn binary_reads_bypass_decoding() {
        let mut v = StringValue::from_binary(&[0x00, 0xFF, 0x41]);
        assert_eq!(v.char_length(), 3);
        assert_eq!(v.char_at(1), '\u{FF}');
        assert_eq!(v.to_bytes(), [0x00, 0xFF, 0x41]);
    }

    #[test]
    fn unit_round_trip() {
        let units: Vec<char> = "x↑y👍".chars().collect();
        let mut v = StringValue::from_units(&units);
        assert_eq!(v.to_units(), units.as_slice());
        assert_eq!(v.to_bytes(), "x↑y👍".as_bytes());
    }

    #[test]
    fn set_length_truncates_and_grows() {
        let mut v = StringValue::from_str("abcdef");
        v.set_length(3);
        assert_eq!(v.to_bytes(), b"abc");
        v.set_length(5);
        assert_eq!(v.to_bytes(), b"abc\0\0");
    }

    #[test]
    fn set_length_on_unit_form_stays_units() {
        let mut v = StringValue::from_units(&['↑', '↓']);
        v.set_length(1);
        assert_eq!(v.to_units(), &['↑']);
    }

    #[test]
    fn substring_slices_bytes_when_single_unit() {
        let mut v = StringValue::from_str("hello");
        let sub = v.substring(1, 3);
        assert_eq!(sub, StringValue::from_str("ell"));
    }

    #[test]
    fn substring_slices_units_otherwise() {
        let mut v = StringValue::from_str("a↑b↓c");
        let sub = v.substring(1, 3);
        assert_eq!(sub, StringValue::from_str("↑b↓"));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn substring_out_of_range_is_fatal() {
        let mut v = StringValue::from_str("ab");
        let _ = v.substring(0, 2);
    }

    #[test]
    fn reverse_in_place_multibyte() {
        let mut v = StringValue::from_str("a↑b");
        v.reverse_in_place();
        assert_eq!(v, StringValue::from_str("b↑a"));
    }

    #[test]
    fn reversed_copy_leaves_source() {
        let v = StringValue::from_str("abc");
        let r = v.reversed();
        assert_eq!(r, StringValue::from_str("cba"));
        assert_eq!(v, StringValue::from_str("abc"));
    }

    #[test]
    fn equality_is_representation_independent() {
        let a = StringValue::from_str("a↑");
        let b = StringValue::from_units(&['a', '↑']);
        assert_eq!(a, b);
    }
}
