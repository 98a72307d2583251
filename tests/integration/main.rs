//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against the mock hardware controller and a manual clock. All tests
//! run on the host with no real hardware required.

mod concurrency_tests;
mod support;
mod timing_tests;
