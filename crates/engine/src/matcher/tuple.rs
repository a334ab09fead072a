//! Tuple-literal matching (§4.3.5): a `[a, b, c]`-shaped expression against
//! a tuple type, an array type, or plain `auto`.

use super::base_case::take_expr;
use super::score::Score;
use super::variadic::{expand_tail, is_variadic_tail};
use super::{Mode, Verdict};
use semcore::diagnostics::{Diagnostic, Note};
use semcore::expr::{Expr, ExprKind, RewriteKind};
use semcore::parse_context::{self, ParseContext};
use semcore::types::{self, Modifier, Terminator, TypeArena, TypeId, TypeNode};

fn elems_mut(expr: &mut Expr) -> &mut Vec<Expr> {
    match &mut *expr.kind {
        ExprKind::TupleLiteral(elems) => elems,
        _ => unreachable!("match_tuple_literal called on a non-tuple-literal expression"),
    }
}

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

fn tuple_element_types(types: &TypeArena, dest: TypeId) -> Option<Vec<TypeId>> {
    match &types.get(dest).terminator {
        Terminator::Tuple(v) if types.get(dest).modifiers.is_empty() => Some(v.clone()),
        _ => None,
    }
}

fn match_against_tuple(
    mode: Mode,
    expr: &mut Expr,
    dest: TypeId,
    types: &mut TypeArena,
    ctx: &mut dyn ParseContext,
    stack: &mut Vec<(TypeId, TypeId)>,
) -> Verdict {
    let dest_elems = tuple_element_types(types, dest).expect("checked by caller");
    let has_variadic = dest_elems.last().map(|&t| is_variadic_tail(types, t)).unwrap_or(false);
    let prefix_len = if has_variadic { dest_elems.len() - 1 } else { dest_elems.len() };
    let actual = elems_mut(expr).len();

    if !has_variadic && actual != dest_elems.len() {
        if mode == Mode::MatchExpression {
            ctx.report_error(
                Diagnostic::new("tuple literal arity does not match destination type", expr.span)
                    .with_note(Note::new(format!(
                        "expected {} element(s), found {}",
                        dest_elems.len(),
                        actual
                    ))),
            );
        }
        return Verdict::failure();
    }
    if has_variadic && actual < prefix_len {
        if mode == Mode::MatchExpression {
            ctx.report_error(Diagnostic::new(
                "tuple literal has fewer elements than the destination's required prefix",
                expr.span,
            ));
        }
        return Verdict::failure();
    }

    // The destination's variadic tail is expanded in place to the actual
    // arity before per-element matching, for every mode — not just
    // `match_expression` (§4.3.5's "for match_expression" caveat only
    // concerns whether the *expression tree* gets rewritten, not whether
    // the deduced arity is computed).
    let full_dest_elems = expand_tail(types, &dest_elems, actual);

    let mut sub_scores = Vec::with_capacity(actual);
    let mut deduced_elems = Vec::with_capacity(actual);
    for (elem, &elem_dest) in elems_mut(expr).iter_mut().zip(full_dest_elems.iter()) {
        let v = super::run(mode, elem, elem_dest, types, ctx, stack);
        if !v.matched {
            return Verdict::failure();
        }
        sub_scores.push(v.score.unwrap_or_else(Score::exact));
        deduced_elems.push(v.deduced_type.unwrap_or(elem_dest));
    }

    let deduced = types.intern_terminal(Terminator::Tuple(deduced_elems));
    if mode == Mode::MatchExpression {
        expr.ty = Some(deduced);
    }
    Verdict {
        matched: true,
        score: Some(Score::Composite(sub_scores)),
        deduced_type: Some(deduced),
    }
}

fn match_against_array(
    mode: Mode,
    expr: &mut Expr,
    dest: TypeId,
    types: &mut TypeArena,
    ctx: &mut dyn ParseContext,
    stack: &mut Vec<(TypeId, TypeId)>,
) -> Verdict {
    let (size, elem_ty) = strip_outer_array(types, dest).expect("checked by caller");
    let actual = elems_mut(expr).len() as u64;
    if size != 0 && size != actual {
        if mode == Mode::MatchExpression {
            ctx.report_error(
                Diagnostic::new("array literal size does not match the destination array size", expr.span)
                    .with_note(Note::new(format!("destination expects {} element(s), found {}", size, actual))),
            );
        }
        return Verdict::failure();
    }

    let mut resolved_elem_ty = elem_ty;
    if !types::is_complete(types, elem_ty) {
        if let Some(first) = elems_mut(expr).first_mut() {
            let probe = super::run(Mode::MatchedType, first, elem_ty, types, ctx, stack);
            if let Some(t) = probe.deduced_type {
                resolved_elem_ty = t;
            }
        }
    }

    let mut sub_scores = Vec::with_capacity(actual as usize);
    for elem in elems_mut(expr).iter_mut() {
        let v = super::run(mode, elem, resolved_elem_ty, types, ctx, stack);
        if !v.matched {
            return Verdict::failure();
        }
        sub_scores.push(v.score.unwrap_or_else(Score::exact));
    }

    let deduced_count = if size == 0 { actual } else { size };
    let deduced = types.wrap(Modifier::Array(deduced_count), resolved_elem_ty);
    if mode == Mode::MatchExpression {
        let taken = take_expr(expr);
        let rewritten = parse_context::apply_rewrite(ctx, RewriteKind::ArrayAggregateInit, taken, deduced);
        *expr = rewritten;
        expr.ty = Some(deduced);
    }
    Verdict {
        matched: true,
        score: Some(Score::Composite(sub_scores)),
        deduced_type: Some(deduced),
    }
}

fn match_against_plain_auto(
    mode: Mode,
    expr: &mut Expr,
    types: &mut TypeArena,
    ctx: &mut dyn ParseContext,
    stack: &mut Vec<(TypeId, TypeId)>,
) -> Verdict {
    let auto_ty = types.intern_terminal(Terminator::Auto);
    let mut sub_scores = Vec::new();
    let mut deduced_elems = Vec::new();
    for elem in elems_mut(expr).iter_mut() {
        let v = super::run(mode, elem, auto_ty, types, ctx, stack);
        if !v.matched {
            return Verdict::failure();
        }
        deduced_elems.push(v.deduced_type.unwrap_or(auto_ty));
        sub_scores.push(v.score.unwrap_or_else(Score::exact));
    }
    let deduced = types.intern_terminal(Terminator::Tuple(deduced_elems));
    if mode == Mode::MatchExpression {
        expr.ty = Some(deduced);
    }
    Verdict {
        matched: true,
        score: Some(Score::Composite(sub_scores)),
        deduced_type: Some(deduced),
    }
}

pub fn match_tuple_literal(
    mode: Mode,
    expr: &mut Expr,
    dest: TypeId,
    types: &mut TypeArena,
    ctx: &mut dyn ParseContext,
    stack: &mut Vec<(TypeId, TypeId)>,
) -> Verdict {
    let dest = types::strip_mut(types, dest);
    if tuple_element_types(types, dest).is_some() {
        return match_against_tuple(mode, expr, dest, types, ctx, stack);
    }
    if matches!(types.get(dest).modifiers.first(), Some(Modifier::Array(_))) {
        return match_against_array(mode, expr, dest, types, ctx, stack);
    }
    if types.get(dest).modifiers.is_empty() && matches!(types.get(dest).terminator, Terminator::Auto) {
        return match_against_plain_auto(mode, expr, types, ctx, stack);
    }
    if mode == Mode::MatchExpression {
        ctx.report_error(Diagnostic::new(
            "tuple literal cannot match a non-tuple, non-array, non-auto destination",
            expr.span,
        ));
    }
    Verdict::failure()
}
