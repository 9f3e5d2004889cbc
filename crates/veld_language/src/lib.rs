//! # veld-language
//!
//! The veld front end: everything between source text and an annotated AST
//! that the IR generator can lower.
//!
//! # Pipeline Position
//!
//! ```text
//! source text
//!       │
//!       ▼
//! ┌───────────────┐
//! │  lexer        │ tokens with spans and payloads
//! └──────┬────────┘
//!        ▼
//! ┌───────────────┐
//! │  filter       │ newline smoothing
//! └──────┬────────┘
//!        ▼
//! ┌───────────────┐
//! │  parser       │ AST, implicit `main`
//! └──────┬────────┘
//!        ▼
//! ┌───────────────┐
//! │  analysis     │ env insertion → signatures → semantic analysis
//! └──────┬────────┘
//!        ▼
//!  annotated AST (consumed by veld-compile)
//! ```
//!
//! The crate also hosts the data model shared by all stages: the
//! [object-type system](types), [objects](object) and their table, the
//! [environment](env), and the [error taxonomy](diag).

pub mod analysis;
pub mod ast;
pub mod diag;
pub mod env;
pub mod filter;
pub mod lexer;
pub mod object;
pub mod parser;
pub mod printer;
pub mod token;
pub mod types;

pub use analysis::analyze;
pub use diag::{BuildInterrupt, Diag, ErrorKind, ErrorLog, PassResult};
pub use filter::filter_tokens;
pub use lexer::lex;
pub use parser::{parse, wrap_in_main};
