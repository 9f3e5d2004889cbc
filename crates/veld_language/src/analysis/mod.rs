//! Semantic passes over the AST.
//!
//! ```text
//! AST (raw)
//!     │
//!     ▼
//! ┌───────────────────────┐
//! │ 1. EnvInserter        │ bind names, build the scope tree
//! └──────────┬────────────┘
//!            ▼
//! ┌───────────────────────┐
//! │ 2. SignatureAugmentor │ resolve declared types, type the definitions
//! └──────────┬────────────┘
//!            ▼
//! ┌───────────────────────┐
//! │ 3. SemanticAnalyzer   │ access propagation, checks, object association
//! └──────────┬────────────┘
//!            ▼
//!      annotated AST
//! ```
//!
//! The split between pass 1 and pass 2 exists because forward references
//! (a call before the callee's definition) must resolve against a fully
//! typed environment, while types themselves contain names: first every
//! name gets bound, then every signature gets a type, then everything else
//! is checked.
//!
//! Each pass runs to completion or aborts on the first reported error; the
//! environment, object table and type interner are mutated by exactly one
//! pass at a time.

mod inserter;
mod sema;
mod signature;

pub use inserter::EnvInserter;
pub use sema::SemanticAnalyzer;
pub use signature::SignatureAugmentor;

use veld_base::Interner;

use crate::ast::Expr;
use crate::diag::{ErrorLog, PassResult};
use crate::env::Env;
use crate::object::ObjectTable;
use crate::types::TypeInterner;

/// Runs all three semantic passes over `root`.
pub fn analyze(
    root: &mut Expr,
    env: &mut Env,
    objects: &mut ObjectTable,
    types: &mut TypeInterner,
    names: &Interner,
    log: &mut ErrorLog,
) -> PassResult<()> {
    EnvInserter::new(env, objects, names, log).run(root)?;
    SignatureAugmentor::new(env, objects, types, names, log).run(root)?;
    SemanticAnalyzer::new(env, objects, types, names, log).run(root)
}
