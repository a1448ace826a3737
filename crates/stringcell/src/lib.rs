//! Dual-representation string values for a dynamic-language runtime: byte
//! and fixed-width character encodings of one sequence, converted lazily,
//! with amortized appends, printf-style template formatting and
//! reference-counted copy-on-write sharing.

#![no_std]
#![allow(missing_docs)]
extern crate alloc;

#[cfg(test)]
extern crate std;

mod append;
mod args;
mod bridge;
mod error;
mod float;
mod format;
mod grow;
mod shared;
mod value;

#[cfg(test)]
mod tests;

pub use args::FormatArg;
pub use error::FormatError;
pub use format::format;
pub use shared::SharedString;
pub use value::{Chars, StringValue};

#[doc(hidden)]
pub use alloc::vec;
