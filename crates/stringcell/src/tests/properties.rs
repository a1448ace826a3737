use alloc::{string::String, vec::Vec};

use quickcheck::QuickCheck;

use crate::StringValue;

const TESTS: u64 = 1_000;

/// Property: constructing from text preserves the bytes exactly and counts
/// the same characters the source iterator sees.
#[test]
fn text_round_trips_quickcheck() {
    fn prop(text: String) -> bool {
        let mut v = StringValue::from_str(&text);
        v.char_length() == text.chars().count()
            && v.to_bytes() == text.as_bytes()
            && v.chars().eq(text.chars())
    }

    QuickCheck::new()
        .tests(TESTS)
        .quickcheck(prop as fn(String) -> bool);
}

/// Property: arbitrary bytes, including malformed encodings, survive a
/// construct-and-read-back cycle verbatim, and the lazy count agrees with
/// the iterator.
#[test]
fn arbitrary_bytes_round_trip_quickcheck() {
    fn prop(bytes: Vec<u8>) -> bool {
        let mut v = StringValue::from_bytes(&bytes);
        let counted = v.chars().count();
        v.char_length() == counted && v.to_bytes() == bytes.as_slice()
    }

    QuickCheck::new()
        .tests(TESTS)
        .quickcheck(prop as fn(Vec<u8>) -> bool);
}

/// Property: the unit form and the byte form of a text value agree.
#[test]
fn unit_form_round_trips_quickcheck() {
    fn prop(text: String) -> bool {
        let units: Vec<char> = text.chars().collect();
        let mut v = StringValue::from_units(&units);
        v.to_units() == units.as_slice() && {
            let mut w = StringValue::from_units(&units);
            w.to_bytes() == text.as_bytes()
        }
    }

    QuickCheck::new()
        .tests(TESTS)
        .quickcheck(prop as fn(String) -> bool);
}

/// Property: reversing twice restores the original character sequence, for
/// arbitrary (possibly malformed) input bytes.
#[test]
fn reverse_is_an_involution_quickcheck() {
    fn prop(bytes: Vec<u8>) -> bool {
        let v = StringValue::from_bytes(&bytes);
        let mut w = v.clone();
        w.reverse_in_place();
        w.reverse_in_place();
        w == v
    }

    QuickCheck::new()
        .tests(TESTS)
        .quickcheck(prop as fn(Vec<u8>) -> bool);
}

/// Property: appending text appends exactly its characters, whatever
/// representation the destination happens to hold.
#[test]
fn append_concatenates_characters_quickcheck() {
    fn prop(a: String, b: String, via_units: bool) -> bool {
        let mut v = StringValue::from_str(&a);
        if via_units {
            // Force the unit form first so the append takes the other path.
            v.char_length();
            let units: Vec<char> = b.chars().collect();
            v.append_units(&units);
        } else {
            v.append_bytes(b.as_bytes());
        }
        let expected: Vec<char> = a.chars().chain(b.chars()).collect();
        v.to_units() == expected.as_slice()
    }

    QuickCheck::new()
        .tests(TESTS)
        .quickcheck(prop as fn(String, String, bool) -> bool);
}

/// Property: a substring reads back the same slice of the character
/// sequence, and indexing agrees with iteration.
#[test]
fn substring_matches_char_slice_quickcheck() {
    fn prop(text: String, first: usize, span: usize) -> bool {
        let chars: Vec<char> = text.chars().collect();
        if chars.is_empty() {
            return true;
        }
        let first = first % chars.len();
        let last = first + span % (chars.len() - first);
        let mut v = StringValue::from_str(&text);
        let mut sub = v.substring(first, last);
        sub.to_units() == &chars[first..=last] && v.char_at(first) == chars[first]
    }

    QuickCheck::new()
        .tests(TESTS)
        .quickcheck(prop as fn(String, usize, usize) -> bool);
}

/// Property: a limited append never exceeds the limit when it truncates,
/// and copies everything when the input fits.
#[test]
fn limited_append_stays_within_limit_quickcheck() {
    fn prop(bytes: Vec<u8>, limit: usize) -> bool {
        let limit = 3 + limit % 61;
        let mut v = StringValue::new();
        v.append_limited(&bytes, limit, None);
        if bytes.len() <= limit {
            v.to_bytes() == bytes.as_slice()
        } else {
            let out = v.to_bytes();
            out.len() <= limit && out.ends_with(b"...")
        }
    }

    QuickCheck::new()
        .tests(TESTS)
        .quickcheck(prop as fn(Vec<u8>, usize) -> bool);
}
