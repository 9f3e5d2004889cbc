//! # veld-compile
//!
//! The veld back half: lowering the analyzed AST to typed SSA IR and
//! executing it.
//!
//! # Pipeline Position
//!
//! ```text
//! annotated AST (from veld-language)
//!       │
//!       ▼
//! ┌────────────────────────┐
//! │ 4. forward declarator  │ IR functions + globals, no bodies
//! └──────────┬─────────────┘
//!            ▼
//! ┌────────────────────────┐
//! │ 5. IR generator        │ blocks, instructions, phis, allocas
//! └──────────┬─────────────┘
//!            ▼
//! ┌────────────────────────┐
//! │    verifier            │ structural well-formedness
//! └──────────┬─────────────┘
//!            ▼
//! ┌────────────────────────┐
//! │    execution engine    │ runs `main`, returns the exit code
//! └────────────────────────┘
//! ```
//!
//! The [`driver::Driver`] strings the stages together and owns all
//! per-compilation state.

pub mod diagnostic;
pub mod driver;
pub mod engine;
pub mod ir;
pub mod irgen;

pub use driver::Driver;
pub use engine::{run_function, run_main, RtValue};
pub use ir::Module;
