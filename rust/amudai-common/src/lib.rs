//! Core definitions shared by the amudai-* interval matching crates:
//! the common error type and argument verification helpers.

pub mod error;
pub mod result;

pub use result::Result;
