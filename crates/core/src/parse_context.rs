//! The resolver collaborator contract (§6).
//!
//! `ParseContext` is the external interface the evaluator and matcher call
//! back into: diagnostics, the resolution queue, the interpreter hooks, and
//! the rewrite constructors a successful `match_expression` needs. The
//! parser, resolver, and interpreter that implement this trait are out of
//! scope (§1); `semcore`/`semengine` only depend on the trait.

use crate::diagnostics::{Diagnostic, Note, SourceSpan};
use crate::diagnostics::Warning;
use crate::expr::{Expr, RewriteKind};
use crate::types::TypeId;
use crate::value::Value;

/// A declaration identity as seen from the resolution queue (§5): opaque to
/// the core beyond equality/hashing, since cycle detection only needs
/// membership, not structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeclId(pub u32);

/// The outcome of driving the interpreter over a user-defined function body
/// (§4.2.1's force intensities).
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOutcome {
    Returned(Value),
    /// The body diverged (hit a `compile_error`, an assertion, or otherwise
    /// could not produce a value). A diagnostic has already been reported
    /// through `report_error` by the time this is returned.
    Diverged,
}

/// The single collaborator trait the core calls back into (§6). A
/// `ParseContext` implementation owns the diagnostics sink, the resolution
/// queue, and the interpreter; the core only ever sees it through `&mut dyn
/// ParseContext`, never owns one.
pub trait ParseContext {
    /// Report a user-facing error at `diag`'s location. Only reachable from
    /// `match_expression` mode and from force-with-error evaluation (§7).
    fn report_error(&mut self, diag: Diagnostic);

    /// Report a warning, subject to the caller having already checked
    /// `diagnostics::warning_suppressed` against the expression's paren
    /// level (§7). Implementations may re-check; the core always checks
    /// first so a `ParseContext` never has to.
    fn report_warning(&mut self, kind: Warning, location: SourceSpan);

    /// Report a warning that would fire but didn't because the expression
    /// was parenthesised past its budget — used only for testing the
    /// suppression property (§8 property 9); a production `ParseContext` is
    /// free to no-op this.
    fn report_parenthesis_suppressed_warning(
        &mut self,
        paren_level: u32,
        kind: Warning,
        location: SourceSpan,
    );

    /// Push `decl` (needed at `call_site`) onto the resolution queue and
    /// drive its resolution to completion. Returns `false` if `decl` is
    /// already on the queue (a cycle): the caller must treat this as a
    /// `Failed` fold with a diagnostic naming the cycle (§5).
    fn add_to_resolve_queue(&mut self, decl: DeclId, call_site: SourceSpan) -> bool;

    fn pop_resolve_queue(&mut self, decl: DeclId);

    /// Drive the interpreter over a user-defined function body, reporting
    /// diagnostics on failure (force-with-error, §4.2.1).
    fn execute_function(&mut self, decl: DeclId, args: &[Value]) -> ExecutionOutcome;

    /// As `execute_function`, but suppresses diagnostics (force-without-error,
    /// §4.2.1) — used for speculative evaluation inside overload resolution.
    fn execute_function_without_error(&mut self, decl: DeclId, args: &[Value]) -> ExecutionOutcome;

    /// Drive the interpreter over a compound expression that is not a pure
    /// final-expression (§4.2.2).
    fn execute_compound_expression(&mut self, expr: &Expr) -> ExecutionOutcome;

    /// Build a rewrite node wrapping `inner` to cast it to `dest` (§4.3.7).
    fn make_cast_expression(&mut self, inner: Expr, dest: TypeId) -> Expr;

    /// Build a rewrite node wrapping `inner` in an `optional`-cast (§4.3.7
    /// "optional promotion").
    fn make_optional_cast_expression(&mut self, inner: Expr, dest: TypeId) -> Expr;

    fn make_copy_construction(&mut self, inner: Expr) -> Expr;

    fn make_move_construction(&mut self, inner: Expr) -> Expr;

    fn make_note(&self, message: String, location: Option<SourceSpan>) -> Note;

    /// Whether aggressive consteval is enabled (§9: global mutable state
    /// reified as a configuration record, threaded here rather than read
    /// from process-wide state).
    fn is_aggressive_consteval_enabled(&self) -> bool;

    /// Whether `decl` can be instantiated on demand (generic instantiation
    /// support for the matcher's generic-parent-to-instance path, §4.3.7).
    fn is_instantiable(&self, decl: DeclId) -> bool;
}

/// Helper used by evaluator/matcher call sites: wraps `inner` in the rewrite
/// kind appropriate for `dest`'s reference modifier, via the collaborator's
/// construction hooks, without each call site re-deriving which hook to
/// call.
pub fn apply_rewrite(
    ctx: &mut dyn ParseContext,
    kind: RewriteKind,
    inner: Expr,
    dest: TypeId,
) -> Expr {
    match kind {
        RewriteKind::TakeLvalueReference | RewriteKind::TakeMoveReference => {
            ctx.make_cast_expression(inner, dest)
        }
        RewriteKind::CopyConstruction => ctx.make_copy_construction(inner),
        RewriteKind::MoveConstruction => ctx.make_move_construction(inner),
        RewriteKind::OptionalWrap => ctx.make_optional_cast_expression(inner, dest),
        RewriteKind::ArrayToSliceDecay | RewriteKind::ArrayAggregateInit => {
            ctx.make_cast_expression(inner, dest)
        }
    }
}
