//! Composite (`if`/`switch`) expression matching (§4.3.4).
//!
//! When the destination is incomplete, each non-noreturn arm is probed with
//! `matched_type` first to see whether they agree; when they don't, a
//! second `can_match` pass looks for a single arm whose deduced type every
//! other arm's value can also match. When the destination is already
//! complete, arms are matched independently and the composite score is the
//! vector of per-arm scores.

use super::score::Score;
use super::{Mode, Verdict};
use semcore::diagnostics::{Diagnostic, Note};
use semcore::expr::{Expr, ExprKind};
use semcore::parse_context::ParseContext;
use semcore::types::{self, TypeArena, TypeId};

/// Mutable references to every non-noreturn arm's expression, in source
/// order. `if` contributes its then-branch and (if present) its
/// else-branch, skipping whichever is marked noreturn isn't modeled on the
/// tree (noreturn-ness lives on the switch arm only, per `SwitchArm`); an
/// `if` without an else-branch contributes just the then-branch.
fn arms_mut(expr: &mut Expr) -> Vec<&mut Expr> {
    match &mut *expr.kind {
        ExprKind::If { then_branch, else_branch, .. } => {
            let mut v = vec![then_branch.as_mut()];
            if let Some(e) = else_branch {
                v.push(e.as_mut());
            }
            v
        }
        ExprKind::Switch { arms, .. } => arms
            .iter_mut()
            .filter(|a| !a.is_noreturn)
            .map(|a| &mut a.body)
            .collect(),
        _ => unreachable!("match_composite called on a non-composite expression"),
    }
}

fn is_incomplete(types: &TypeArena, dest: TypeId) -> bool {
    !types::is_complete(types, dest)
}

fn deduce_from_arms(
    expr: &mut Expr,
    dest: TypeId,
    types: &mut TypeArena,
    ctx: &mut dyn ParseContext,
    _stack: &mut Vec<(TypeId, TypeId)>,
) -> Option<TypeId> {
    let mut arms = arms_mut(expr);
    let deduced: Vec<Option<TypeId>> = arms
        .iter_mut()
        .map(|a| super::matched_type(a, dest, types, ctx))
        .collect();

    if deduced.iter().any(Option::is_none) {
        return None;
    }
    let deduced: Vec<TypeId> = deduced.into_iter().map(Option::unwrap).collect();

    let first = deduced[0];
    if deduced.iter().all(|&t| t == first) {
        return Some(first);
    }

    // Disagreement: probe each candidate type against every other arm's
    // value expression with can_match; a candidate that accepts all of them
    // wins.
    let mut winner = None;
    for (i, &candidate) in deduced.iter().enumerate() {
        let accepts_all = arms
            .iter()
            .enumerate()
            .all(|(j, a)| if i == j { true } else { super::can_match(a, candidate, types, ctx) });
        if accepts_all {
            if winner.is_some() {
                winner = None;
                break;
            }
            winner = Some(candidate);
        }
    }

    if winner.is_none() {
        let mut diag = Diagnostic::new("branches of this expression deduce conflicting types", expr.span);
        for t in &deduced {
            diag = diag.with_note(Note::new(format!("branch deduces type {}", types::mangled_name(types, *t))));
        }
        ctx.report_error(diag);
    }
    winner
}

pub fn match_composite(
    mode: Mode,
    expr: &mut Expr,
    dest: TypeId,
    types: &mut TypeArena,
    ctx: &mut dyn ParseContext,
    stack: &mut Vec<(TypeId, TypeId)>,
) -> Verdict {
    if is_incomplete(types, dest) {
        let Some(deduced) = deduce_from_arms(expr, dest, types, ctx, stack) else {
            return Verdict::failure();
        };
        if mode == Mode::MatchExpression {
            let mut arms = arms_mut(expr);
            for a in arms.iter_mut() {
                if !super::match_expression(a, deduced, types, ctx) {
                    return Verdict::failure();
                }
            }
            expr.ty = Some(deduced);
        }
        return Verdict {
            matched: true,
            score: Some(Score::exact()),
            deduced_type: Some(deduced),
        };
    }

    let mut arms = arms_mut(expr);
    let mut sub_scores = Vec::with_capacity(arms.len());
    for a in arms.iter_mut() {
        let v = super::run(mode, a, dest, types, ctx, stack);
        if !v.matched {
            return Verdict::failure();
        }
        sub_scores.push(v.score.unwrap_or_else(Score::exact));
    }
    if mode == Mode::MatchExpression {
        expr.ty = Some(dest);
    }
    Verdict {
        matched: true,
        score: Some(Score::Composite(sub_scores)),
        deduced_type: Some(dest),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use semcore::diagnostics::SourceSpan;
    use semcore::expr::{Literal, SwitchArm, ValueCategory};
    use semcore::types::{BaseTypeKind, IntWidth, Terminator};

    fn span() -> SourceSpan {
        SourceSpan { begin: 0, pivot: 0, end: 1 }
    }

    fn lit(n: i64) -> Expr {
        Expr::new(ExprKind::Literal(Literal::Int(n)), span(), ValueCategory::Literal)
    }

    #[test]
    fn if_with_agreeing_arms_deduces_shared_type() {
        let mut types = TypeArena::new();
        let auto_ty = types.intern_terminal(Terminator::Auto);
        let int32 = types.intern_terminal(Terminator::Base(BaseTypeKind::SInt(IntWidth::W32)));
        let mut then_e = lit(1);
        then_e.ty = Some(int32);
        let mut else_e = lit(2);
        else_e.ty = Some(int32);
        let mut expr = Expr::new(
            ExprKind::If {
                condition: Box::new(lit(1)),
                is_consteval_if: false,
                then_branch: Box::new(then_e),
                else_branch: Some(Box::new(else_e)),
            },
            span(),
            ValueCategory::Rvalue,
        );
        let mut ctx = super::super::tests_support::NullCtx::new();
        let mut stack = Vec::new();
        let verdict = match_composite(Mode::MatchedType, &mut expr, auto_ty, &mut types, &mut ctx, &mut stack);
        assert!(verdict.matched);
        assert_eq!(verdict.deduced_type, Some(int32));
    }

    #[test]
    fn switch_skips_noreturn_arms() {
        let mut types = TypeArena::new();
        let auto_ty = types.intern_terminal(Terminator::Auto);
        let int32 = types.intern_terminal(Terminator::Base(BaseTypeKind::SInt(IntWidth::W32)));
        let mut ok_body = lit(1);
        ok_body.ty = Some(int32);
        let mut expr = Expr::new(
            ExprKind::Switch {
                scrutinee: Box::new(lit(0)),
                arms: vec![
                    SwitchArm { pattern: Some(semcore::value::Value::SInt(0)), body: ok_body, is_noreturn: false },
                    SwitchArm { pattern: None, body: lit(0), is_noreturn: true },
                ],
            },
            span(),
            ValueCategory::Rvalue,
        );
        let mut ctx = super::super::tests_support::NullCtx::new();
        let mut stack = Vec::new();
        let verdict = match_composite(Mode::MatchedType, &mut expr, auto_ty, &mut types, &mut ctx, &mut stack);
        assert!(verdict.matched);
        assert_eq!(verdict.deduced_type, Some(int32));
    }
}
