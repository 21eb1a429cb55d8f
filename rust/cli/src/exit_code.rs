//! Exit codes returned by [`crate::run`].

pub const SUCCESS: i32 = 0;

/// Any failure: bad input, bad configuration, I/O.
pub const ERROR: i32 = 2;
