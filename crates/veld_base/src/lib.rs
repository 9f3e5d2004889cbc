//! # veld-base
//!
//! Pure structural atoms for the veld compiler.
//!
//! This crate provides the foundational types shared by every stage of the
//! pipeline:
//!
//! - [`Interner`]/[`Symbol`] — string interning for O(1) name equality
//! - [`Span`] — byte-offset source locations
//!
//! # Design Principles
//!
//! This crate has **no knowledge of veld's grammar, types or IR**. It holds
//! only generic infrastructure that the higher-level crates build upon, so
//! that the language and compile crates can depend on it without cycles.
//!
//! # Example
//!
//! ```
//! use veld_base::{Interner, Span};
//!
//! let mut interner = Interner::new();
//! let name = interner.intern("main");
//! let span = Span::new(0, 4);
//!
//! assert_eq!(interner.resolve(name), "main");
//! assert_eq!(span.len(), 4);
//! ```

pub mod intern;
pub mod span;

pub use intern::{Interner, Symbol};
pub use span::Span;
