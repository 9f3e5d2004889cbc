//! Integration test crate.
//!
//! Holds no code of its own; the end-to-end suites live under `tests/` and
//! drive the public pipeline API the way the CLI does.
