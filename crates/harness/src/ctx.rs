//! A minimal `ParseContext` (§6) for driving fixtures end to end.
//!
//! There is no parser, resolver, or interpreter behind this harness
//! (concrete syntax and code generation are out of scope, spec §1), so every
//! collaborator hook that would normally trigger on-demand resolution or
//! execute a user-defined function body instead reports that the body
//! diverged — exactly the behaviour the evaluator's own `NullCtx` test
//! double uses (`semengine::eval::fold::tests`). What this context *does*
//! do for real is collect diagnostics and apply the matcher's rewrite hooks,
//! so `match_expression` and the warning-suppression property are
//! observable from the CLI.

use semcore::config::CoreConfig;
use semcore::diagnostics::{Diagnostic, Note, SourceSpan, Warning};
use semcore::expr::{Expr, ExprKind, RewriteKind};
use semcore::parse_context::{DeclId, ExecutionOutcome, ParseContext};
use semcore::types::TypeId;
use semcore::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct ReportedWarning {
    pub kind: Warning,
    pub location: SourceSpan,
}

/// Collects everything a fixture run needs to print: errors in source
/// order, warnings in source order, and which warnings were suppressed by
/// parenthesisation (so `semharness run --show-suppressed` can demonstrate
/// property 9 from §8).
pub struct HarnessCtx {
    pub config: CoreConfig,
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<ReportedWarning>,
    pub suppressed_warnings: Vec<ReportedWarning>,
}

impl HarnessCtx {
    pub fn new(config: CoreConfig) -> Self {
        HarnessCtx {
            config,
            errors: Vec::new(),
            warnings: Vec::new(),
            suppressed_warnings: Vec::new(),
        }
    }
}

impl ParseContext for HarnessCtx {
    fn report_error(&mut self, diag: Diagnostic) {
        tracing::debug!(message = %diag.message, "error reported");
        self.errors.push(diag);
    }

    fn report_warning(&mut self, kind: Warning, location: SourceSpan) {
        tracing::debug!(warning = kind.name(), "warning reported");
        self.warnings.push(ReportedWarning { kind, location });
    }

    fn report_parenthesis_suppressed_warning(
        &mut self,
        paren_level: u32,
        kind: Warning,
        location: SourceSpan,
    ) {
        tracing::trace!(warning = kind.name(), paren_level, "warning suppressed");
        self.suppressed_warnings.push(ReportedWarning { kind, location });
    }

    fn add_to_resolve_queue(&mut self, _decl: DeclId, _call_site: SourceSpan) -> bool {
        // No resolver collaborator behind this harness; nothing is ever
        // already on a queue, so no cycle is ever observed.
        true
    }

    fn pop_resolve_queue(&mut self, _decl: DeclId) {}

    fn execute_function(&mut self, _decl: DeclId, _args: &[Value]) -> ExecutionOutcome {
        ExecutionOutcome::Diverged
    }

    fn execute_function_without_error(&mut self, _decl: DeclId, _args: &[Value]) -> ExecutionOutcome {
        ExecutionOutcome::Diverged
    }

    fn execute_compound_expression(&mut self, _expr: &Expr) -> ExecutionOutcome {
        ExecutionOutcome::Diverged
    }

    fn make_cast_expression(&mut self, inner: Expr, dest: TypeId) -> Expr {
        Expr::new(
            ExprKind::Cast(semcore::expr::CastExpr {
                dest,
                operand: Box::new(inner),
                explicit: false,
            }),
            inner_span(),
            semcore::expr::ValueCategory::Rvalue,
        )
    }

    fn make_optional_cast_expression(&mut self, inner: Expr, _dest: TypeId) -> Expr {
        wrap_rewrite(RewriteKind::OptionalWrap, inner)
    }

    fn make_copy_construction(&mut self, inner: Expr) -> Expr {
        wrap_rewrite(RewriteKind::CopyConstruction, inner)
    }

    fn make_move_construction(&mut self, inner: Expr) -> Expr {
        wrap_rewrite(RewriteKind::MoveConstruction, inner)
    }

    fn make_note(&self, message: String, location: Option<SourceSpan>) -> Note {
        match location {
            Some(loc) => Note::at(message, loc),
            None => Note::new(message),
        }
    }

    fn is_aggressive_consteval_enabled(&self) -> bool {
        self.config.is_aggressive_consteval_enabled()
    }

    fn is_instantiable(&self, _decl: DeclId) -> bool {
        false
    }
}

fn inner_span() -> SourceSpan {
    SourceSpan { begin: 0, pivot: 0, end: 1 }
}

fn wrap_rewrite(kind: RewriteKind, inner: Expr) -> Expr {
    Expr::new(
        ExprKind::Rewrite { kind, inner: Box::new(inner) },
        inner_span(),
        semcore::expr::ValueCategory::Rvalue,
    )
}
