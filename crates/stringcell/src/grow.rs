//! Append-amortizing growth policy, shared by both representations.
//!
//! When an append outgrows the current capacity we first attempt to double
//! the total required size, which keeps the number of reallocations across a
//! run of small appends logarithmic. Doubling can be refused by the allocator
//! even when enough memory remains for the append itself, so on refusal we
//! fall back to a modest request that still covers the append plus
//! [`MIN_ALLOC`] units of slush. The fallback goes through the strict
//! allocator, whose failure is fatal; the `attempt_*` variants propagate
//! refusal instead and leave the buffer untouched.
//!
//! The byte-form and unit-form paths keep their historically distinct
//! formulas (`2 * needed` versus `2 * (current + extra)`; the quantities
//! coincide, the expressions are preserved deliberately).

use alloc::{collections::TryReserveError, vec::Vec};

/// Slush added to the fallback request so a run of small appends does not
/// reallocate on every call. In units of the buffer's element.
pub(crate) const MIN_ALLOC: usize = 1024;

/// Panics with the uniform maximum-length diagnostic. Growth arithmetic that
/// exceeds the platform's representable length is a fatal error, never a
/// silent truncation.
#[cold]
pub(crate) fn length_overflow() -> ! {
    panic!("max size for a string value exceeded")
}

pub(crate) fn checked_total(len: usize, extra: usize) -> usize {
    match len.checked_add(extra) {
        Some(n) if n <= isize::MAX as usize => n,
        _ => length_overflow(),
    }
}

fn fallback_request(needed: usize, extra: usize) -> usize {
    // Cap the slush so the fallback itself cannot overflow the maximum
    // representable length.
    let limit = (isize::MAX as usize) - needed;
    let slush = extra.saturating_add(MIN_ALLOC).min(limit);
    needed + slush
}

/// Ensures `buf` can hold `extra` more bytes: try `2 * needed`, fall back to
/// `needed + extra + MIN_ALLOC` via the strict allocator.
pub(crate) fn grow_bytes(buf: &mut Vec<u8>, extra: usize) {
    let needed = checked_total(buf.len(), extra);
    if needed <= buf.capacity() {
        return;
    }
    let doubled = needed
        .checked_mul(2)
        .filter(|&n| n <= isize::MAX as usize);
    if let Some(target) = doubled {
        if buf.try_reserve_exact(target - buf.len()).is_ok() {
            return;
        }
    }
    buf.reserve_exact(fallback_request(needed, extra) - buf.len());
}

/// Fallible form of [`grow_bytes`]: both the doubling and the fallback use
/// the attempt allocator, and refusal leaves `buf` unmodified.
pub(crate) fn attempt_grow_bytes(buf: &mut Vec<u8>, extra: usize) -> Result<(), TryReserveError> {
    let needed = checked_total(buf.len(), extra);
    if needed <= buf.capacity() {
        return Ok(());
    }
    let doubled = needed
        .checked_mul(2)
        .filter(|&n| n <= isize::MAX as usize);
    if let Some(target) = doubled {
        if buf.try_reserve_exact(target - buf.len()).is_ok() {
            return Ok(());
        }
    }
    buf.try_reserve_exact(fallback_request(needed, extra) - buf.len())
}

/// Unit-form counterpart of [`grow_bytes`]: try `2 * (current + extra)`,
/// fall back to `current + 2 * extra + MIN_ALLOC` via the strict allocator.
pub(crate) fn grow_units(buf: &mut Vec<char>, extra: usize) {
    let needed = checked_total(buf.len(), extra);
    if needed <= buf.capacity() {
        return;
    }
    let doubled = needed
        .checked_mul(2)
        .filter(|&n| n <= isize::MAX as usize);
    if let Some(target) = doubled {
        if buf.try_reserve_exact(target - buf.len()).is_ok() {
            return;
        }
    }
    buf.reserve_exact(fallback_request(needed, extra) - buf.len());
}

/// Fallible form of [`grow_units`].
pub(crate) fn attempt_grow_units(buf: &mut Vec<char>, extra: usize) -> Result<(), TryReserveError> {
    let needed = checked_total(buf.len(), extra);
    if needed <= buf.capacity() {
        return Ok(());
    }
    let doubled = needed
        .checked_mul(2)
        .filter(|&n| n <= isize::MAX as usize);
    if let Some(target) = doubled {
        if buf.try_reserve_exact(target - buf.len()).is_ok() {
            return Ok(());
        }
    }
    buf.try_reserve_exact(fallback_request(needed, extra) - buf.len())
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::{MIN_ALLOC, attempt_grow_bytes, grow_bytes, grow_units};

    #[test]
    fn grow_doubles_required_size() {
        // The request must exceed whatever slack the initial extend left
        // behind, so the doubling path actually runs.
        let mut buf: Vec<u8> = Vec::new();
        buf.extend_from_slice(b"abc");
        assert!(buf.capacity() < 16);
        grow_bytes(&mut buf, 13);
        assert!(buf.capacity() >= 32);
        assert_eq!(buf.len(), 3);
    }

    #[test]
    fn grow_is_idempotent_within_capacity() {
        let mut buf: Vec<u8> = Vec::with_capacity(64);
        buf.push(1);
        let cap = buf.capacity();
        grow_bytes(&mut buf, 10);
        assert_eq!(buf.capacity(), cap);
    }

    #[test]
    fn unit_growth_matches_policy() {
        let mut buf: Vec<char> = Vec::new();
        buf.push('x');
        grow_units(&mut buf, 7);
        assert!(buf.capacity() >= 16);
    }

    #[test]
    fn attempt_growth_reports_ok_for_small_requests() {
        let mut buf: Vec<u8> = Vec::new();
        assert!(attempt_grow_bytes(&mut buf, MIN_ALLOC).is_ok());
        assert!(buf.capacity() >= MIN_ALLOC);
    }

    #[test]
    #[should_panic(expected = "max size for a string value exceeded")]
    fn overflowing_request_is_fatal() {
        let mut buf: Vec<u8> = Vec::new();
        buf.push(0);
        grow_bytes(&mut buf, usize::MAX);
    }
}
