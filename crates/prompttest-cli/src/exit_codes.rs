//! Exit codes for the prompttest binary. These are part of the public
//! contract and stay stable across releases.

pub const SUCCESS: i32 = 0;
/// At least one test failed or errored.
pub const TEST_FAILURE: i32 = 1;
/// Discovery, configuration, or usage failure before any test could run.
pub const CONFIG_ERROR: i32 = 2;
