//! The constant-value domain and type model shared by the evaluator and the
//! matcher: the value lattice (V), the type model (T), the expression-tree
//! contract the matcher walks, the warning/diagnostic vocabulary, the
//! `ParseContext` collaborator trait, and the configuration record threaded
//! through it.
//!
//! This crate defines the data; `semengine` defines the algorithms (fold,
//! match) that operate on it.

pub mod arena;
pub mod config;
pub mod diagnostics;
pub mod expr;
pub mod intrinsics;
pub mod parse_context;
pub mod symbol;
pub mod types;
pub mod value;

pub use config::CoreConfig;
pub use diagnostics::{Diagnostic, Note, SourceSpan, Warning};
pub use expr::{ConstevalState, Expr, ExprKind, ValueCategory};
pub use parse_context::ParseContext;
pub use types::{TypeArena, TypeId};
pub use value::Value;
