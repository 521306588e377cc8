//! Exit codes for the lgx CLI.
//!
//! Coarse and stable for CI use: 0 success, 1 operation or validation
//! failure. Argument errors exit 2 through clap.

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
