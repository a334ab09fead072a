//! Failure-diagnostic collection (§4.2.5).
//!
//! When an expression reaches state `Failed`, the evaluator walks it once
//! more to collect notes: one per innermost non-constant subexpression,
//! naming the subexpression verbatim where possible, plus a declaration-site
//! note for identifier failures. This walk only runs on demand, just before
//! a failure diagnostic is surfaced — not on every fold attempt.

use semcore::diagnostics::Note;
use semcore::expr::{ConstevalState, Expr, ExprKind};

/// A rendering hook so this module doesn't need to know source-text
/// slicing; the caller (which owns the source buffer) supplies it.
pub trait RenderSource {
    /// Render the verbatim source text spanned by `expr`, or `None` if
    /// unavailable (e.g. a synthesized expression with no source span).
    fn render(&self, expr: &Expr) -> Option<String>;
}

/// Collect one note per innermost non-constant subexpression beneath
/// `root`, in source order. "Innermost" means: if a child is itself
/// `Failed`, recurse into it instead of reporting the parent.
pub fn collect_failure_notes(root: &Expr, source: &dyn RenderSource) -> Vec<Note> {
    let mut notes = Vec::new();
    walk(root, source, &mut notes);
    notes
}

fn is_failed(expr: &Expr) -> bool {
    matches!(
        expr.consteval_state,
        ConstevalState::Failed | ConstevalState::GuaranteedFailed
    )
}

fn walk(expr: &Expr, source: &dyn RenderSource, notes: &mut Vec<Note>) {
    let children = direct_operands(expr);
    let failed_children: Vec<&Expr> = children.iter().filter(|c| is_failed(c)).copied().collect();

    if failed_children.is_empty() && is_failed(expr) {
        notes.push(make_note(expr, source));
        return;
    }
    for child in failed_children {
        walk(child, source, notes);
    }
}

fn make_note(expr: &Expr, source: &dyn RenderSource) -> Note {
    let rendered = source.render(expr);
    let message = match (&*expr.kind, rendered) {
        (ExprKind::Identifier(decl), _) => {
            format!("identifier `{}` is not a constant expression", decl.name)
        }
        (_, Some(text)) => format!("subexpression `{}` is not a constant expression", text),
        (_, None) => "subexpression is not a constant expression".to_string(),
    };
    Note::at(message, expr.span)
}

/// The immediate child expressions the fold engine recursed into, in the
/// same order `semengine::eval::fold` visits them. Kept in sync with
/// `fold_expr`'s own traversal so a failure note always matches what was
/// actually folded.
fn direct_operands(expr: &Expr) -> Vec<&Expr> {
    match &*expr.kind {
        ExprKind::Literal(_) | ExprKind::Identifier(_) | ExprKind::TypenameExpr(_) => Vec::new(),
        ExprKind::Unary { operand, .. } => vec![operand.as_ref()],
        ExprKind::Binary { lhs, rhs, .. } => vec![lhs.as_ref(), rhs.as_ref()],
        ExprKind::Call { callee, args, .. } => {
            let mut v: Vec<&Expr> = callee.as_deref().into_iter().collect();
            v.extend(args.iter());
            v
        }
        ExprKind::Subscript { base, index } => vec![base.as_ref(), index.as_ref()],
        ExprKind::Cast(c) => vec![c.operand.as_ref()],
        ExprKind::If {
            condition,
            then_branch,
            else_branch,
            ..
        } => {
            let mut v = vec![condition.as_ref(), then_branch.as_ref()];
            if let Some(e) = else_branch {
                v.push(e.as_ref());
            }
            v
        }
        ExprKind::Switch { scrutinee, arms } => {
            let mut v = vec![scrutinee.as_ref()];
            v.extend(arms.iter().map(|a| &a.body));
            v
        }
        ExprKind::Compound { final_expr, .. } => final_expr.as_deref().into_iter().collect(),
        ExprKind::MemberAccess { base, .. } => vec![base.as_ref()],
        ExprKind::TupleLiteral(elems) => elems.iter().collect(),
        ExprKind::ArrayDefaultConstruct { .. } => Vec::new(),
        ExprKind::StructInit { fields } => fields.iter().collect(),
        ExprKind::Rewrite { inner, .. } => vec![inner.as_ref()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use semcore::diagnostics::SourceSpan;
    use semcore::expr::{BinOp, DeclRef, Literal, ValueCategory};

    struct NoSource;
    impl RenderSource for NoSource {
        fn render(&self, _expr: &Expr) -> Option<String> {
            None
        }
    }

    fn span() -> SourceSpan {
        SourceSpan {
            begin: 0,
            pivot: 0,
            end: 1,
        }
    }

    #[test]
    fn identifier_failure_names_the_identifier() {
        let mut ident = Expr::new(
            ExprKind::Identifier(DeclRef {
                name: "x".into(),
                is_consteval: false,
                resolved_initializer: None,
                declared_type: None,
            }),
            span(),
            ValueCategory::Lvalue,
        );
        ident.set_consteval_state(ConstevalState::Failed);

        let one = Expr::new(ExprKind::Literal(Literal::Int(1)), span(), ValueCategory::Literal);

        let mut sum = Expr::new(
            ExprKind::Binary {
                op: BinOp::Add,
                lhs: Box::new(one),
                rhs: Box::new(ident),
            },
            span(),
            ValueCategory::Rvalue,
        );
        sum.set_consteval_state(ConstevalState::Failed);

        let notes = collect_failure_notes(&sum, &NoSource);
        assert_eq!(notes.len(), 1);
        assert!(notes[0].message.contains("identifier `x`"));
    }

    #[test]
    fn non_failed_leaves_contribute_no_notes() {
        let one = Expr::new(ExprKind::Literal(Literal::Int(1)), span(), ValueCategory::Literal);
        let notes = collect_failure_notes(&one, &NoSource);
        assert!(notes.is_empty());
    }
}
