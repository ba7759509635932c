//! Shared utilities for the Encore server binaries and tests.

pub mod logger;
pub mod time;
