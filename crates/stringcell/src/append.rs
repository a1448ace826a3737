//! The append engine: four directed appends over the two representations.
//!
//! Appends extend whichever representation is currently live — the unit form
//! when one is present (it is authoritative), the byte form otherwise — and
//! invalidate the other side: a byte append resets the cached character
//! count, a unit append drops the stale byte form. The two forms are never
//! both kept authoritative across an asymmetric append.

use alloc::{collections::TryReserveError, vec::Vec};

use crate::{
    bridge, grow,
    value::{CharCount, Repr, StringValue},
};

impl StringValue {
    /// Appends a byte sequence.
    ///
    /// A live unit form is extended with the decoded characters and the byte
    /// form dropped; a byte-form value is extended in place with its count
    /// reset to unknown. A binary destination is promoted to a character
    /// value first.
    pub fn append_bytes(&mut self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        if matches!(self.repr, Repr::Binary(_)) {
            self.materialize_units();
        }
        match &mut self.repr {
            Repr::Bytes { bytes: dst, chars } => {
                grow::grow_bytes(dst, bytes.len());
                dst.extend_from_slice(bytes);
                *chars = CharCount::Unknown;
            }
            Repr::Units(units) => {
                append_decoded(units, bytes);
            }
            Repr::Both { units, .. } => {
                let mut units = core::mem::take(units);
                append_decoded(&mut units, bytes);
                self.repr = Repr::Units(units);
            }
            Repr::Binary(_) => unreachable!(),
        }
    }

    /// Fallible form of [`append_bytes`](Self::append_bytes); allocation
    /// refusal leaves the value unmodified.
    ///
    /// # Errors
    ///
    /// Returns the allocator's refusal when the grown buffer cannot be
    /// reserved.
    pub fn attempt_append_bytes(&mut self, bytes: &[u8]) -> Result<(), TryReserveError> {
        if bytes.is_empty() {
            return Ok(());
        }
        if matches!(self.repr, Repr::Binary(_)) {
            self.materialize_units();
        }
        match &mut self.repr {
            Repr::Bytes { bytes: dst, chars } => {
                grow::attempt_grow_bytes(dst, bytes.len())?;
                dst.extend_from_slice(bytes);
                *chars = CharCount::Unknown;
            }
            Repr::Units(units) => {
                grow::attempt_grow_units(units, bridge::count_chars(bytes))?;
                bridge::decode_into(bytes, units);
            }
            Repr::Both { units, .. } => {
                grow::attempt_grow_units(units, bridge::count_chars(bytes))?;
                let mut units = core::mem::take(units);
                bridge::decode_into(bytes, &mut units);
                self.repr = Repr::Units(units);
            }
            Repr::Binary(_) => unreachable!(),
        }
        Ok(())
    }

    /// Appends a code-unit sequence.
    ///
    /// A live unit form is extended directly (dropping the stale byte form);
    /// a byte-form value receives the canonical encoding, and a known
    /// character count stays valid by summation.
    pub fn append_units(&mut self, units: &[char]) {
        if units.is_empty() {
            return;
        }
        if matches!(self.repr, Repr::Binary(_)) {
            self.materialize_units();
        }
        match &mut self.repr {
            Repr::Units(dst) => {
                grow::grow_units(dst, units.len());
                dst.extend_from_slice(units);
            }
            Repr::Both { units: dst, .. } => {
                grow::grow_units(dst, units.len());
                let mut dst = core::mem::take(dst);
                dst.extend_from_slice(units);
                self.repr = Repr::Units(dst);
            }
            Repr::Bytes { bytes, chars } => {
                grow::grow_bytes(bytes, bridge::encoded_len(units));
                bridge::encode_into(units, bytes);
                if let CharCount::Known(n) = chars {
                    *chars = CharCount::Known(
                        n.checked_add(units.len())
                            .unwrap_or_else(|| grow::length_overflow()),
                    );
                }
            }
            Repr::Binary(_) => unreachable!(),
        }
    }

    /// Fallible form of [`append_units`](Self::append_units).
    ///
    /// # Errors
    ///
    /// Returns the allocator's refusal when the grown buffer cannot be
    /// reserved.
    pub fn attempt_append_units(&mut self, units: &[char]) -> Result<(), TryReserveError> {
        if units.is_empty() {
            return Ok(());
        }
        if matches!(self.repr, Repr::Binary(_)) {
            self.materialize_units();
        }
        match &mut self.repr {
            Repr::Units(dst) => {
                grow::attempt_grow_units(dst, units.len())?;
                dst.extend_from_slice(units);
            }
            Repr::Both { units: dst, .. } => {
                grow::attempt_grow_units(dst, units.len())?;
                let mut dst = core::mem::take(dst);
                dst.extend_from_slice(units);
                self.repr = Repr::Units(dst);
            }
            Repr::Bytes { bytes, chars } => {
                grow::attempt_grow_bytes(bytes, bridge::encoded_len(units))?;
                bridge::encode_into(units, bytes);
                if let CharCount::Known(n) = chars {
                    *chars = CharCount::Known(
                        n.checked_add(units.len())
                            .unwrap_or_else(|| grow::length_overflow()),
                    );
                }
            }
            Repr::Binary(_) => unreachable!(),
        }
        Ok(())
    }

    /// Appends another value.
    ///
    /// Two binary values concatenate bytes directly without engaging
    /// character semantics. Otherwise the destination's live representation
    /// decides the direction, and when the destination's count and the
    /// appendee's all-single-unit count are both known the result's count is
    /// summed without a rescan.
    pub fn append_value(&mut self, other: &StringValue) {
        if other.is_empty() {
            return;
        }
        if let (Repr::Binary(dst), Repr::Binary(src)) = (&mut self.repr, &other.repr) {
            grow::grow_bytes(dst, src.len());
            dst.extend_from_slice(src);
            return;
        }
        if matches!(self.repr, Repr::Binary(_)) {
            self.materialize_units();
        }
        if matches!(self.repr, Repr::Units(_) | Repr::Both { .. }) {
            match &other.repr {
                Repr::Units(units) | Repr::Both { units, .. } => self.append_units(units),
                Repr::Bytes { bytes, .. } => {
                    let mut units = Vec::new();
                    bridge::decode_into(bytes, &mut units);
                    self.append_units(&units);
                }
                Repr::Binary(raw) => {
                    let units: Vec<char> = raw.iter().map(|&b| b as char).collect();
                    self.append_units(&units);
                }
            }
            return;
        }

        // Byte-form destination: append the other side's encoded bytes and
        // keep the count when both are known without a rescan.
        let other_single_count = match &other.repr {
            Repr::Bytes {
                bytes,
                chars: CharCount::Known(m),
            } if *m == bytes.len() => Some(*m),
            _ => None,
        };
        let mut encoded;
        let src: &[u8] = match &other.repr {
            Repr::Bytes { bytes, .. } | Repr::Both { bytes, .. } => bytes,
            Repr::Units(units) => {
                encoded = Vec::new();
                grow::grow_bytes(&mut encoded, bridge::encoded_len(units));
                bridge::encode_into(units, &mut encoded);
                &encoded
            }
            Repr::Binary(raw) => {
                let units: Vec<char> = raw.iter().map(|&b| b as char).collect();
                encoded = Vec::new();
                grow::grow_bytes(&mut encoded, bridge::encoded_len(&units));
                bridge::encode_into(&units, &mut encoded);
                &encoded
            }
        };
        let summed = match (&self.repr, other_single_count) {
            (
                Repr::Bytes {
                    chars: CharCount::Known(n),
                    ..
                },
                Some(m),
            ) => Some(
                n.checked_add(m)
                    .unwrap_or_else(|| grow::length_overflow()),
            ),
            _ => None,
        };
        if let Repr::Bytes { bytes, chars } = &mut self.repr {
            grow::grow_bytes(bytes, src.len());
            bytes.extend_from_slice(src);
            *chars = match summed {
                Some(total) => CharCount::Known(total),
                None => CharCount::Unknown,
            };
        }
    }

    /// Appends at most `limit` bytes of `bytes`, never splitting a
    /// multi-unit character: the cut point steps back from the limit
    /// boundary to the previous character boundary. When input is truncated
    /// the `ellipsis` marker (default `"..."`) is appended after it.
    pub fn append_limited(&mut self, bytes: &[u8], limit: usize, ellipsis: Option<&str>) {
        if bytes.is_empty() {
            return;
        }
        if bytes.len() <= limit {
            self.append_bytes(bytes);
            return;
        }
        let ellipsis = ellipsis.unwrap_or("...");
        let budget = (limit + 1).saturating_sub(ellipsis.len());
        let cut = bridge::prev_boundary(bytes, budget.min(bytes.len()));
        self.append_bytes(&bytes[..cut]);
        self.append_bytes(ellipsis.as_bytes());
    }
}

/// Decodes `bytes` onto the end of `units`, growing by the exact decoded
/// count first.
fn append_decoded(units: &mut Vec<char>, bytes: &[u8]) {
    grow::grow_units(units, bridge::count_chars(bytes));
    bridge::decode_into(bytes, units);
}
