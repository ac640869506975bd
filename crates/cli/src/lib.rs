//! Command-line front-end for connection tests.

pub mod args;
pub mod report;
