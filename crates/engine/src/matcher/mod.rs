//! The type-directed matcher (M, §4.3): four questions — can this
//! expression match this destination type, how well, what type would
//! result, and rewrite it so that it does — answered by one decision tree
//! shared across all four modes (§4.3.1, §4.3.2).
//!
//! Every public entry point below takes the same shape: a mode, the
//! expression (by `&mut` even when only inspecting it, so the dispatcher
//! never needs two copies of the tree), the destination type, the type
//! arena, the `ParseContext` collaborator, and a cycle-detection stack for
//! type-strict descent (§9). Only [`Mode::MatchExpression`] actually
//! mutates the expression or reports diagnostics; the other three modes
//! walk the same tree purely to compute their answer.

mod base_case;
mod composite;
pub mod decompose;
mod reference;
mod score;
mod tuple;
mod type_strict;
mod variadic;

pub use score::{Comparison, Leaf, ReferenceMatchKind, Score, TypeKind};

use semcore::expr::{Expr, ExprKind};
use semcore::parse_context::ParseContext;
use semcore::types::{self, TypeArena, TypeId};

/// Which of the four questions the caller is asking (§4.3.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Can `expr` match `dest`, yes or no?
    CanMatch,
    /// How well does `expr` match `dest` (for overload resolution)?
    MatchLevel,
    /// What type would `expr` be coerced to if it matched `dest`?
    MatchedType,
    /// Rewrite `expr` in place so that it matches `dest`, reporting
    /// diagnostics on failure.
    MatchExpression,
}

/// The outcome of one matcher traversal: whether the match succeeded, its
/// score (absent only on failure), and the type the expression would carry
/// afterwards (§4.3.1).
#[derive(Debug, Clone)]
pub struct Verdict {
    pub matched: bool,
    pub score: Option<Score>,
    pub deduced_type: Option<TypeId>,
}

impl Verdict {
    pub fn failure() -> Self {
        Verdict {
            matched: false,
            score: None,
            deduced_type: None,
        }
    }
}

/// Can `expr` match `dest`? (§4.3.1, mode 1)
pub fn can_match(
    expr: &Expr,
    dest: TypeId,
    types: &mut TypeArena,
    ctx: &mut dyn ParseContext,
) -> bool {
    let mut scratch = expr.clone();
    let mut stack = Vec::new();
    run(Mode::CanMatch, &mut scratch, dest, types, ctx, &mut stack).matched
}

/// How well does `expr` match `dest`? `None` if it doesn't match at all
/// (§4.3.1, mode 2).
pub fn match_level(
    expr: &Expr,
    dest: TypeId,
    types: &mut TypeArena,
    ctx: &mut dyn ParseContext,
) -> Option<Score> {
    let mut scratch = expr.clone();
    let mut stack = Vec::new();
    let verdict = run(Mode::MatchLevel, &mut scratch, dest, types, ctx, &mut stack);
    verdict.matched.then(|| verdict.score).flatten()
}

/// What type would `expr` be coerced to in order to match `dest`? `None` if
/// it wouldn't match at all (§4.3.1, mode 3).
pub fn matched_type(
    expr: &Expr,
    dest: TypeId,
    types: &mut TypeArena,
    ctx: &mut dyn ParseContext,
) -> Option<TypeId> {
    let mut scratch = expr.clone();
    let mut stack = Vec::new();
    let verdict = run(Mode::MatchedType, &mut scratch, dest, types, ctx, &mut stack);
    verdict.matched.then(|| verdict.deduced_type).flatten()
}

/// Rewrite `expr` in place so it matches `dest`, reporting a diagnostic and
/// leaving it unchanged if it can't (§4.3.1, mode 4).
pub fn match_expression(
    expr: &mut Expr,
    dest: TypeId,
    types: &mut TypeArena,
    ctx: &mut dyn ParseContext,
) -> bool {
    let mut stack = Vec::new();
    run(Mode::MatchExpression, expr, dest, types, ctx, &mut stack).matched
}

/// The shared decision tree (§4.3.2): dispatches on `expr`'s shape and
/// `dest`'s outer modifier before falling into the scalar base case.
/// `mut` is transparent on the destination except where a submodule checks
/// it explicitly (reference binding, array-to-slice); §4.3.2 strips it once
/// here so no submodule has to special-case a bare `mut` wrapper.
pub(crate) fn run(
    mode: Mode,
    expr: &mut Expr,
    dest: TypeId,
    types: &mut TypeArena,
    ctx: &mut dyn ParseContext,
    stack: &mut Vec<(TypeId, TypeId)>,
) -> Verdict {
    // Type-strict matching (a typename expression naming a type-value,
    // §4.3.6) and composite (if/switch, §4.3.4) take priority over the
    // ordinary value path because their expression shapes aren't scalar
    // values at all.
    if matches!(&*expr.kind, ExprKind::TypenameExpr(_)) {
        return type_strict::match_type_strict(mode, expr, dest, types, ctx, stack);
    }
    if matches!(&*expr.kind, ExprKind::If { .. } | ExprKind::Switch { .. }) {
        return composite::match_composite(mode, expr, dest, types, ctx, stack);
    }
    if matches!(&*expr.kind, ExprKind::TupleLiteral(_)) {
        return tuple::match_tuple_literal(mode, expr, dest, types, ctx, stack);
    }

    let dest_no_mut = types::strip_mut(types, dest);
    let verdict = if types::is_reference(types, dest_no_mut) {
        reference::match_reference(mode, expr, dest_no_mut, types, ctx, stack)
    } else {
        base_case::match_strict(mode, expr, dest_no_mut, types, ctx, stack)
    };
    tracing::trace!(?mode, matched = verdict.matched, "match attempt");
    verdict
}

#[cfg(test)]
pub(crate) mod tests_support {
    use semcore::diagnostics::{Diagnostic, Note, SourceSpan, Warning};
    use semcore::expr::Expr;
    use semcore::parse_context::{DeclId, ExecutionOutcome, ParseContext};
    use semcore::types::TypeId;
    use semcore::value::Value;

    /// A `ParseContext` test double that records diagnostics and performs
    /// every rewrite hook as a no-op passthrough, mirroring the evaluator's
    /// own `NullCtx` (`eval::fold::tests`).
    pub struct NullCtx {
        pub errors: Vec<Diagnostic>,
        pub warnings: Vec<Warning>,
        pub aggressive_consteval: bool,
        pub instantiable: bool,
    }

    impl NullCtx {
        pub fn new() -> Self {
            NullCtx {
                errors: Vec::new(),
                warnings: Vec::new(),
                aggressive_consteval: false,
                instantiable: false,
            }
        }
    }

    impl ParseContext for NullCtx {
        fn report_error(&mut self, diag: Diagnostic) {
            self.errors.push(diag);
        }
        fn report_warning(&mut self, kind: Warning, _location: SourceSpan) {
            self.warnings.push(kind);
        }
        fn report_parenthesis_suppressed_warning(&mut self, _l: u32, _k: Warning, _loc: SourceSpan) {}
        fn add_to_resolve_queue(&mut self, _decl: DeclId, _call_site: SourceSpan) -> bool {
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
        fn make_cast_expression(&mut self, inner: Expr, _dest: TypeId) -> Expr {
            inner
        }
        fn make_optional_cast_expression(&mut self, inner: Expr, _dest: TypeId) -> Expr {
            inner
        }
        fn make_copy_construction(&mut self, inner: Expr) -> Expr {
            inner
        }
        fn make_move_construction(&mut self, inner: Expr) -> Expr {
            inner
        }
        fn make_note(&self, message: String, location: Option<SourceSpan>) -> Note {
            match location {
                Some(loc) => Note::at(message, loc),
                None => Note::new(message),
            }
        }
        fn is_aggressive_consteval_enabled(&self) -> bool {
            self.aggressive_consteval
        }
        fn is_instantiable(&self, _decl: DeclId) -> bool {
            self.instantiable
        }
    }
}

#[cfg(test)]
mod proptests {
    use super::tests_support::NullCtx;
    use super::*;
    use proptest::prelude::*;
    use semcore::diagnostics::SourceSpan;
    use semcore::expr::{Literal, ValueCategory};
    use semcore::types::{BaseTypeKind, IntWidth, Terminator};

    fn span() -> SourceSpan {
        SourceSpan { begin: 0, pivot: 0, end: 1 }
    }

    fn scalar_dest(types: &mut TypeArena, choice: u8) -> TypeId {
        let base = match choice % 6 {
            0 => BaseTypeKind::SInt(IntWidth::W8),
            1 => BaseTypeKind::SInt(IntWidth::W32),
            2 => BaseTypeKind::UInt(IntWidth::W32),
            3 => BaseTypeKind::Float32,
            4 => BaseTypeKind::Float64,
            _ => BaseTypeKind::Bool,
        };
        types.intern_terminal(Terminator::Base(base))
    }

    fn scalar_literal(choice: u8, n: i64) -> Literal {
        match choice % 4 {
            0 => Literal::Int(n),
            1 => Literal::Float64(n as f64),
            2 => Literal::Bool(n % 2 == 0),
            _ => Literal::Char(char::from_u32((n.unsigned_abs() % 128) as u32).unwrap_or('a')),
        }
    }

    proptest! {
        // §8 property 4: `can_match` agrees with `match_expression` on a
        // fresh copy of the same expression.
        #[test]
        fn p4_can_match_agrees_with_match_expression(dest_choice in 0u8..6, lit_choice in 0u8..4, n: i64) {
            let mut types = TypeArena::new();
            let dest = scalar_dest(&mut types, dest_choice);
            let lit = scalar_literal(lit_choice, n);
            let expr = Expr::new(ExprKind::Literal(lit), span(), ValueCategory::Literal);
            let mut ctx = NullCtx::new();

            let could = can_match(&expr, dest, &mut types, &mut ctx);

            let mut rewritten = expr.clone();
            let mut ctx2 = NullCtx::new();
            let did = match_expression(&mut rewritten, dest, &mut types, &mut ctx2);

            prop_assert_eq!(could, did);
        }

        // §8 property 5: `match_level` is null iff `can_match` is false.
        #[test]
        fn p5_match_level_null_iff_cannot_match(dest_choice in 0u8..6, lit_choice in 0u8..4, n: i64) {
            let mut types = TypeArena::new();
            let dest = scalar_dest(&mut types, dest_choice);
            let lit = scalar_literal(lit_choice, n);
            let expr = Expr::new(ExprKind::Literal(lit), span(), ValueCategory::Literal);
            let mut ctx = NullCtx::new();

            let could = can_match(&expr, dest, &mut types, &mut ctx);
            let mut ctx2 = NullCtx::new();
            let level = match_level(&expr, dest, &mut types, &mut ctx2);

            prop_assert_eq!(level.is_some(), could);
        }

        // §8 property 6: `matched_type` is non-null iff `can_match` is true,
        // and every returned type is complete.
        #[test]
        fn p6_matched_type_present_iff_can_match_and_complete(dest_choice in 0u8..6, lit_choice in 0u8..4, n: i64) {
            let mut types = TypeArena::new();
            let dest = scalar_dest(&mut types, dest_choice);
            let lit = scalar_literal(lit_choice, n);
            let expr = Expr::new(ExprKind::Literal(lit), span(), ValueCategory::Literal);
            let mut ctx = NullCtx::new();

            let could = can_match(&expr, dest, &mut types, &mut ctx);
            let mut ctx2 = NullCtx::new();
            let deduced = matched_type(&expr, dest, &mut types, &mut ctx2);

            prop_assert_eq!(deduced.is_some(), could);
            if let Some(t) = deduced {
                prop_assert!(semcore::types::is_complete(&types, t));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::tests_support::NullCtx;
    use super::*;
    use semcore::diagnostics::SourceSpan;
    use semcore::expr::{DeclRef, Literal, ValueCategory};
    use semcore::types::{BaseTypeKind, Terminator};

    fn span() -> SourceSpan {
        SourceSpan { begin: 0, pivot: 0, end: 1 }
    }

    #[test]
    fn can_match_reports_no_diagnostics_on_failure() {
        let mut types = TypeArena::new();
        let int32 = types.intern_terminal(Terminator::Base(BaseTypeKind::SInt(semcore::types::IntWidth::W32)));
        let b = types.intern_terminal(Terminator::Base(BaseTypeKind::Bool));
        let expr = Expr::new(
            ExprKind::Identifier(DeclRef {
                name: "x".into(),
                is_consteval: false,
                resolved_initializer: None,
                declared_type: Some(int32),
            }),
            span(),
            ValueCategory::Lvalue,
        )
        .with_type(int32);
        let mut ctx = NullCtx::new();
        assert!(!can_match(&expr, b, &mut types, &mut ctx));
        assert!(ctx.errors.is_empty());
    }

    #[test]
    fn match_expression_rewrites_literal_in_place() {
        let mut types = TypeArena::new();
        let int8 = types.intern_terminal(Terminator::Base(BaseTypeKind::SInt(semcore::types::IntWidth::W8)));
        let mut expr = Expr::new(ExprKind::Literal(Literal::Int(5)), span(), ValueCategory::Literal);
        let mut ctx = NullCtx::new();
        assert!(match_expression(&mut expr, int8, &mut types, &mut ctx));
        assert_eq!(expr.ty, Some(int8));
    }

    #[test]
    fn matched_type_on_bare_auto_strips_reference() {
        let mut types = TypeArena::new();
        let int32 = types.intern_terminal(Terminator::Base(BaseTypeKind::SInt(semcore::types::IntWidth::W32)));
        let auto_ty = types.intern_terminal(Terminator::Auto);
        let lref = types.wrap(semcore::types::Modifier::LvalueReference, int32);
        let expr = Expr::new(
            ExprKind::Identifier(DeclRef {
                name: "x".into(),
                is_consteval: false,
                resolved_initializer: None,
                declared_type: Some(lref),
            }),
            span(),
            ValueCategory::Lvalue,
        )
        .with_type(lref);
        let mut ctx = NullCtx::new();
        let deduced = matched_type(&expr, auto_ty, &mut types, &mut ctx);
        assert_eq!(deduced, Some(int32));
    }
}
