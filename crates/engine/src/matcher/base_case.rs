//! The value-expression base case (§4.3.7): the strict match entered once
//! the destination's `mut` has been stripped and it is confirmed *not* to
//! be a reference shape (that path is [`super::reference`]).
//!
//! Checked in the order the spec lists them: optional promotion and
//! array-to-slice conversion first (they both recurse into a *narrower*
//! destination type), then the bare-`auto` terminator, then implicit
//! literal conversion, then generic-parent-to-instance, and finally
//! equal-after-normalisation as the fallback every other case declines.

use super::score::{Leaf, ReferenceMatchKind, Score, TypeKind};
use super::{Mode, Verdict};
use semcore::diagnostics::Diagnostic;
use semcore::expr::{Expr, ExprKind, Literal, RewriteKind, ValueCategory};
use semcore::parse_context::{self, ParseContext};
use semcore::types::{self, BaseTypeKind, Modifier, Terminator, TypeArena, TypeId, TypeNode};

fn is_bare(types: &TypeArena, id: TypeId) -> bool {
    types.get(id).modifiers.is_empty()
}

fn is_bare_auto(types: &TypeArena, id: TypeId) -> bool {
    is_bare(types, id) && matches!(types.get(id).terminator, Terminator::Auto)
}

/// Strip a single leading `array(N)` modifier, if present, returning the
/// size and the element type. Mirrors [`types::remove_outer_wrapper`] for
/// the one modifier that carries a payload.
fn strip_outer_array(types: &mut TypeArena, id: TypeId) -> Option<(u64, TypeId)> {
    let node = types.get(id).clone();
    match node.modifiers.first() {
        Some(Modifier::Array(n)) => {
            let n = *n;
            let inner = types.intern(TypeNode {
                modifiers: node.modifiers[1..].to_vec(),
                terminator: node.terminator,
            });
            Some((n, inner))
        }
        _ => None,
    }
}

/// Does this type's outermost modifier represent a pointer/reference/
/// function shape that already has its own null bit-pattern, so an
/// `optional` wrapping it promotes via representation rather than an
/// explicit wrap node (§4.3.7)?
fn promotes_via_representation(types: &TypeArena, id: TypeId) -> bool {
    let node = types.get(id);
    matches!(node.modifiers.first(), Some(Modifier::Pointer))
        || node.modifiers.first().copied().map(Modifier::is_reference).unwrap_or(false)
        || (node.modifiers.is_empty() && matches!(node.terminator, Terminator::Function { .. }))
}

pub(crate) fn take_expr(expr: &mut Expr) -> Expr {
    std::mem::replace(
        expr,
        Expr::new(ExprKind::Literal(Literal::Null), expr.span, expr.value_category),
    )
}

fn try_optional_promotion(
    mode: Mode,
    expr: &mut Expr,
    dest: TypeId,
    types: &mut TypeArena,
    ctx: &mut dyn ParseContext,
    stack: &mut Vec<(TypeId, TypeId)>,
) -> Option<Verdict> {
    if !types::is_optional(types, dest) {
        return None;
    }
    let src_ty = expr.ty?;
    if types::is_optional(types, src_ty) {
        return None; // let equal-after-normalisation handle optional-to-optional.
    }
    let inner = types::remove_outer_wrapper(types, dest)?;
    let verdict = match_strict(mode, expr, inner, types, ctx, stack);
    if !verdict.matched {
        return None;
    }
    if mode == Mode::MatchExpression && !promotes_via_representation(types, inner) {
        let taken = take_expr(expr);
        let rewritten = parse_context::apply_rewrite(ctx, RewriteKind::OptionalWrap, taken, dest);
        *expr = rewritten;
        expr.ty = Some(dest);
    } else if mode == Mode::MatchExpression {
        expr.ty = Some(dest);
    }
    let score = verdict.score.unwrap_or_else(Score::exact).add_depth(1);
    Some(Verdict {
        matched: true,
        score: Some(score),
        deduced_type: Some(dest),
    })
}

fn try_array_to_slice(
    mode: Mode,
    expr: &mut Expr,
    dest: TypeId,
    types: &mut TypeArena,
) -> Option<Verdict> {
    if !matches!(types.get(dest).modifiers.first(), Some(Modifier::ArraySlice)) {
        return None;
    }
    let src_ty = expr.ty?;
    let (_count, src_elem) = strip_outer_array(types, src_ty)?;
    let dest_elem = types::remove_outer_wrapper(types, dest)?;
    let src_norm = types::remove_any_mut(types, src_elem);
    let dest_norm = types::remove_any_mut(types, dest_elem);
    if src_norm != dest_norm {
        return None;
    }
    if mode == Mode::MatchExpression {
        expr.ty = Some(dest);
    }
    Some(Verdict {
        matched: true,
        score: Some(Score::Leaf(Leaf {
            modifier_depth: 0,
            reference_kind: ReferenceMatchKind::Identity,
            type_kind: TypeKind::DirectMatch,
        })),
        deduced_type: Some(dest),
    })
}

fn match_auto(mode: Mode, expr: &mut Expr, types: &mut TypeArena) -> Verdict {
    let Some(src_ty) = expr.ty else {
        return Verdict::failure();
    };
    let deduced = types::remove_mut_reference(types, src_ty);
    if mode == Mode::MatchExpression {
        expr.ty = Some(deduced);
    }
    Verdict {
        matched: true,
        score: Some(Score::exact()),
        deduced_type: Some(deduced),
    }
}

fn literal_value_of(expr: &Expr) -> Option<i128> {
    match &*expr.kind {
        ExprKind::Literal(Literal::Int(n)) => Some(*n as i128),
        ExprKind::Literal(Literal::UInt(n)) => Some(*n as i128),
        _ => None,
    }
}

fn try_literal_conversion(
    mode: Mode,
    expr: &mut Expr,
    dest: TypeId,
    types: &mut TypeArena,
    ctx: &mut dyn ParseContext,
) -> Option<Verdict> {
    if expr.value_category != ValueCategory::Literal {
        return None;
    }
    let value = literal_value_of(expr)?;
    let (signed, width) = types::integer_kind(types, dest)?;
    let fits = if signed {
        let bits = width.bits();
        if bits == 64 {
            true
        } else {
            let min = -(1i128 << (bits - 1));
            let max = (1i128 << (bits - 1)) - 1;
            value >= min && value <= max
        }
    } else {
        value >= 0 && (value as u128) <= width.mask() as u128
    };
    if !fits {
        return None;
    }
    if mode == Mode::MatchExpression {
        let taken = take_expr(expr);
        let mut cast_expr = ctx.make_cast_expression(taken, dest);
        cast_expr.ty = Some(dest);
        *expr = cast_expr;
    }
    Some(Verdict {
        matched: true,
        score: Some(Score::Leaf(Leaf {
            modifier_depth: 0,
            reference_kind: ReferenceMatchKind::Identity,
            type_kind: TypeKind::ImplicitLiteralConversion,
        })),
        deduced_type: Some(dest),
    })
}

fn try_generic_parent(expr: &Expr, dest: TypeId, types: &TypeArena) -> Option<Verdict> {
    if !is_bare(types, dest) {
        return None;
    }
    let Terminator::Base(BaseTypeKind::GenericParent(name)) = &types.get(dest).terminator else {
        return None;
    };
    let src_ty = expr.ty?;
    if !is_bare(types, src_ty) {
        return None;
    }
    let Terminator::Base(BaseTypeKind::GenericInstance(iname, _)) = &types.get(src_ty).terminator else {
        return None;
    };
    if iname.as_str() != name.as_str() {
        return None;
    }
    Some(Verdict {
        matched: true,
        score: Some(Score::Leaf(Leaf {
            modifier_depth: 0,
            reference_kind: ReferenceMatchKind::Identity,
            type_kind: TypeKind::GenericMatch,
        })),
        deduced_type: Some(src_ty),
    })
}

/// The final fallback (§4.3.7): `remove_mut_reference(S) ==
/// remove_any_mut(D)`.
fn match_equal_after_normalisation(
    mode: Mode,
    expr: &mut Expr,
    dest: TypeId,
    types: &mut TypeArena,
    ctx: &mut dyn ParseContext,
) -> Verdict {
    let Some(src_ty) = expr.ty else {
        if mode == Mode::MatchExpression {
            ctx.report_error(Diagnostic::new(
                "expression has no type to match against its destination",
                expr.span,
            ));
        }
        return Verdict::failure();
    };
    let src_norm = types::remove_mut_reference(types, src_ty);
    let dest_norm = types::remove_any_mut(types, dest);
    if src_norm != dest_norm {
        if mode == Mode::MatchExpression {
            ctx.report_error(Diagnostic::new(
                "expression type does not match the destination type",
                expr.span,
            ));
        }
        return Verdict::failure();
    }

    if mode == Mode::MatchExpression {
        let category = expr.value_category;
        let rewrite = match category {
            ValueCategory::Lvalue if types::is_reference(types, src_ty) => {
                Some(RewriteKind::CopyConstruction)
            }
            ValueCategory::MovedLvalue | ValueCategory::RvalueReference => {
                Some(RewriteKind::MoveConstruction)
            }
            _ => None,
        };
        if let Some(kind) = rewrite {
            let taken = take_expr(expr);
            let rewritten = parse_context::apply_rewrite(ctx, kind, taken, dest);
            *expr = rewritten;
        }
        expr.ty = Some(dest);
    }

    Verdict {
        matched: true,
        score: Some(Score::exact()),
        deduced_type: Some(dest),
    }
}

/// Entry point once `mode`'s destination has had `mut` stripped and
/// confirmed not to be a reference (§4.3.2 point 2, §4.3.7).
pub fn match_strict(
    mode: Mode,
    expr: &mut Expr,
    dest: TypeId,
    types: &mut TypeArena,
    ctx: &mut dyn ParseContext,
    stack: &mut Vec<(TypeId, TypeId)>,
) -> Verdict {
    if types::is_reference(types, dest) {
        return super::reference::match_reference(mode, expr, dest, types, ctx, stack);
    }

    if let Some(v) = try_optional_promotion(mode, expr, dest, types, ctx, stack) {
        return v;
    }
    if let Some(v) = try_array_to_slice(mode, expr, dest, types) {
        return v;
    }
    if is_bare_auto(types, dest) {
        return match_auto(mode, expr, types);
    }
    if let Some(v) = try_literal_conversion(mode, expr, dest, types, ctx) {
        return v;
    }
    if let Some(v) = try_generic_parent(expr, dest, types) {
        return v;
    }
    match_equal_after_normalisation(mode, expr, dest, types, ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use semcore::diagnostics::SourceSpan;
    use semcore::expr::DeclRef;
    use semcore::types::IntWidth;

    fn span() -> SourceSpan {
        SourceSpan { begin: 0, pivot: 0, end: 1 }
    }

    #[test]
    fn equal_types_match_exactly() {
        let mut types = TypeArena::new();
        let int32 = types.intern_terminal(Terminator::Base(BaseTypeKind::SInt(IntWidth::W32)));
        let mut expr = Expr::new(
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
        let mut ctx = super::super::tests_support::NullCtx::new();
        let mut stack = Vec::new();
        let verdict = match_strict(Mode::CanMatch, &mut expr, int32, &mut types, &mut ctx, &mut stack);
        assert!(verdict.matched);
        assert_eq!(verdict.score, Some(Score::exact()));
    }

    #[test]
    fn literal_narrows_to_int8_when_it_fits() {
        let mut types = TypeArena::new();
        let int8 = types.intern_terminal(Terminator::Base(BaseTypeKind::SInt(IntWidth::W8)));
        let mut expr = Expr::new(ExprKind::Literal(Literal::Int(100)), span(), ValueCategory::Literal);
        let mut ctx = super::super::tests_support::NullCtx::new();
        let mut stack = Vec::new();
        let verdict = match_strict(Mode::CanMatch, &mut expr, int8, &mut types, &mut ctx, &mut stack);
        assert!(verdict.matched);
    }

    #[test]
    fn literal_out_of_range_for_int8_fails() {
        let mut types = TypeArena::new();
        let int8 = types.intern_terminal(Terminator::Base(BaseTypeKind::SInt(IntWidth::W8)));
        let mut expr = Expr::new(ExprKind::Literal(Literal::Int(1000)), span(), ValueCategory::Literal);
        let mut ctx = super::super::tests_support::NullCtx::new();
        let mut stack = Vec::new();
        let verdict = match_strict(Mode::CanMatch, &mut expr, int8, &mut types, &mut ctx, &mut stack);
        assert!(!verdict.matched);
    }

    #[test]
    fn mismatched_types_fail() {
        let mut types = TypeArena::new();
        let int32 = types.intern_terminal(Terminator::Base(BaseTypeKind::SInt(IntWidth::W32)));
        let b = types.intern_terminal(Terminator::Base(BaseTypeKind::Bool));
        let mut expr = Expr::new(
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
        let mut ctx = super::super::tests_support::NullCtx::new();
        let mut stack = Vec::new();
        let verdict = match_strict(Mode::CanMatch, &mut expr, b, &mut types, &mut ctx, &mut stack);
        assert!(!verdict.matched);
    }
}
