//! Reference binding (§4.3.2 point 2, §4.3.7 "Reference destinations").
//!
//! Entered once the generic descent strips `mut` from the destination and
//! finds one of the four reference modifiers outermost. Delegates the
//! referent match to [`super::base_case`] and wraps the result according to
//! which reference kind bound.

use super::base_case::match_strict;
use super::score::{Leaf, ReferenceMatchKind, Score};
use super::{Mode, Verdict};
use semcore::diagnostics::{Diagnostic, Note};
use semcore::expr::{Expr, RewriteKind, ValueCategory};
use semcore::parse_context::{self, ParseContext};
use semcore::types::{self, Modifier, TypeArena, TypeId};

fn is_rvalue_like(cat: ValueCategory) -> bool {
    matches!(cat, ValueCategory::Rvalue | ValueCategory::MovedLvalue | ValueCategory::Literal)
}

/// Whether the destination's reference layer itself carries `mut`
/// (`modifiers[1] == Mut`, per the invariant that `mut` sits immediately
/// inside a reference, §3.2).
fn dest_ref_is_mut(types: &TypeArena, dest: TypeId) -> bool {
    matches!(types.get(dest).modifiers.get(1), Some(Modifier::Mut))
}

fn source_is_mut(types: &TypeArena, expr: &Expr) -> bool {
    expr.ty.map(|t| types::is_mut(types, t)).unwrap_or(false)
}

fn source_is_reference(types: &TypeArena, expr: &Expr) -> bool {
    expr.ty.map(|t| types::is_reference(types, t)).unwrap_or(false)
}

pub fn match_reference(
    mode: Mode,
    expr: &mut Expr,
    dest: TypeId,
    types: &mut TypeArena,
    ctx: &mut dyn ParseContext,
    stack: &mut Vec<(TypeId, TypeId)>,
) -> Verdict {
    let outer = types.get(dest).modifiers[0];
    let dest_mut = dest_ref_is_mut(types, dest);
    let referent = types::remove_mut_reference(types, dest);
    let category = expr.value_category;

    let (ok, reference_kind, rewrite_kind, bound_modifier, bound_mut) = match outer {
        Modifier::LvalueReference => {
            let ok = matches!(category, ValueCategory::Lvalue) || source_is_reference(types, expr);
            (
                ok,
                ReferenceMatchKind::LvalueBinding,
                RewriteKind::TakeLvalueReference,
                Modifier::LvalueReference,
                dest_mut,
            )
        }
        Modifier::MoveReference => {
            let ok = is_rvalue_like(category) && !source_is_reference(types, expr);
            (
                ok,
                ReferenceMatchKind::RvalueBinding,
                RewriteKind::TakeMoveReference,
                Modifier::MoveReference,
                dest_mut,
            )
        }
        Modifier::AutoReference => {
            let (modifier, rewrite) = if is_rvalue_like(category) {
                (Modifier::MoveReference, RewriteKind::TakeMoveReference)
            } else {
                (Modifier::LvalueReference, RewriteKind::TakeLvalueReference)
            };
            (true, ReferenceMatchKind::AutoBinding, rewrite, modifier, false)
        }
        Modifier::AutoReferenceMut => {
            // Carries the source's mutability into the deduced type (§4.3.7)
            // rather than requiring the destination already name `mut`.
            let (modifier, rewrite) = if is_rvalue_like(category) {
                (Modifier::MoveReference, RewriteKind::TakeMoveReference)
            } else {
                (Modifier::LvalueReference, RewriteKind::TakeLvalueReference)
            };
            (
                true,
                ReferenceMatchKind::AutoBinding,
                rewrite,
                modifier,
                source_is_mut(types, expr),
            )
        }
        _ => unreachable!("match_reference called with a non-reference outer modifier"),
    };

    if !ok {
        if mode == Mode::MatchExpression {
            ctx.report_error(Diagnostic::new(
                "expression cannot be bound to the requested reference type",
                expr.span,
            ));
        }
        return Verdict::failure();
    }

    // Mutability compatibility: a `mut` destination forbids a non-`mut`
    // source; a non-`mut` destination silently accepts a `mut` source
    // (const-propagation), per §4.3.7.
    if bound_mut && !source_is_mut(types, expr) && outer != Modifier::AutoReferenceMut {
        if mode == Mode::MatchExpression {
            ctx.report_error(
                Diagnostic::new("cannot bind a non-mut value to a mut reference", expr.span)
                    .with_note(Note::new("destination requires `mut`, source does not provide it")),
            );
        }
        return Verdict::failure();
    }

    let referent_verdict = match_strict(mode, expr, referent, types, ctx, stack);
    if !referent_verdict.matched {
        return referent_verdict;
    }

    let referent_deduced = referent_verdict.deduced_type.unwrap_or(referent);
    let deduced = {
        let wrapped = if bound_mut {
            let m = types.wrap(Modifier::Mut, referent_deduced);
            types.wrap(bound_modifier, m)
        } else {
            types.wrap(bound_modifier, referent_deduced)
        };
        wrapped
    };

    if mode == Mode::MatchExpression {
        let taken = std::mem::replace(expr, Expr::new(
            semcore::expr::ExprKind::Literal(semcore::expr::Literal::Null),
            expr.span,
            expr.value_category,
        ));
        let rewritten = parse_context::apply_rewrite(ctx, rewrite_kind, taken, deduced);
        *expr = rewritten;
        expr.ty = Some(deduced);
    }

    let score = referent_verdict
        .score
        .unwrap_or_else(Score::exact)
        .add_depth(0);
    let score = match score {
        Score::Leaf(mut l) => {
            l.reference_kind = reference_kind;
            Score::Leaf(l)
        }
        composite => composite,
    };

    Verdict {
        matched: true,
        score: Some(score),
        deduced_type: Some(deduced),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use semcore::diagnostics::SourceSpan;
    use semcore::expr::{ExprKind, Literal};
    use semcore::types::{BaseTypeKind, IntWidth, Terminator};

    fn span() -> SourceSpan {
        SourceSpan { begin: 0, pivot: 0, end: 1 }
    }

    #[test]
    fn lvalue_ref_rejects_rvalue_literal() {
        let mut types = TypeArena::new();
        let int32 = types.intern_terminal(Terminator::Base(BaseTypeKind::SInt(IntWidth::W32)));
        let lref = types.wrap(Modifier::LvalueReference, int32);
        let mut expr = Expr::new(ExprKind::Literal(Literal::Int(1)), span(), ValueCategory::Literal)
            .with_type(int32);
        let mut ctx = super::super::tests_support::NullCtx::new();
        let mut stack = Vec::new();
        let verdict = match_reference(Mode::CanMatch, &mut expr, lref, &mut types, &mut ctx, &mut stack);
        assert!(!verdict.matched);
    }

    #[test]
    fn lvalue_ref_accepts_lvalue() {
        let mut types = TypeArena::new();
        let int32 = types.intern_terminal(Terminator::Base(BaseTypeKind::SInt(IntWidth::W32)));
        let lref = types.wrap(Modifier::LvalueReference, int32);
        let mut expr = Expr::new(
            ExprKind::Identifier(semcore::expr::DeclRef {
                name: "x".into(),
                is_consteval: false,
                resolved_initializer: None,
                declared_type: Some(int32),
            }),
            span(),
            ValueCategory::Lvalue,
        )
        .with_type(int32);
        let mut ctx = super::super::tests_support::NullCtx::new();
        let mut stack = Vec::new();
        let verdict = match_reference(Mode::CanMatch, &mut expr, lref, &mut types, &mut ctx, &mut stack);
        assert!(verdict.matched);
    }
}
