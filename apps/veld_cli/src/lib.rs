//! Library surface of the `veldc` binary, exposed for integration tests.

pub mod cli;

pub use cli::{run, Cli};
