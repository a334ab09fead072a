//! Decomposition type-inference for tuple/array destructuring (§4.4).
//!
//! Given a declaration shaped like `let (a, b, ...rest) = expr` (modelled
//! here as a tree of [`Decl`] placeholders, since the concrete declaration
//! AST is a parser concern out of scope, §1) and an initialising
//! expression, compute the full annotated type for each sub-declaration by
//! descending both sides in parallel: element-wise against a tuple-literal
//! initialiser, array-wise (one homogeneous element type) against an
//! array-typed initialiser. Outer mutability/reference-ness is propagated
//! onto every leaf.

use semcore::diagnostics::Diagnostic;
use semcore::expr::Expr;
use semcore::parse_context::ParseContext;
use semcore::types::{self, Modifier, Terminator, TypeArena, TypeId};

/// One leaf of the destructure pattern: either a binding (to be stamped
/// with its inferred type) or a trailing `...rest` that absorbs the
/// remainder.
#[derive(Debug, Clone)]
pub enum Decl {
    Binding { name: String, inferred: Option<TypeId> },
    Rest { name: String, inferred: Option<TypeId> },
}

impl Decl {
    fn set_type(&mut self, ty: TypeId) {
        match self {
            Decl::Binding { inferred, .. } => *inferred = Some(ty),
            Decl::Rest { inferred, .. } => *inferred = Some(ty),
        }
    }
}

fn has_rest(decls: &[Decl]) -> bool {
    matches!(decls.last(), Some(Decl::Rest { .. }))
}

/// Propagate `outer` mutability/reference modifiers onto `leaf`, outermost
/// first (so `outer`'s modifier stack ends up wrapping `leaf`).
fn apply_outer_wrapping(types: &mut TypeArena, leaf: TypeId, outer_modifiers: &[Modifier]) -> TypeId {
    let mut ty = leaf;
    for m in outer_modifiers.iter().rev() {
        ty = types.wrap(*m, ty);
    }
    ty
}

/// Element-wise inference against a tuple-literal initialiser whose
/// sub-expression types are already known (post-consteval/post-match).
fn infer_from_tuple_expr(
    decls: &mut [Decl],
    elem_types: &[TypeId],
    outer_modifiers: &[Modifier],
    types: &mut TypeArena,
    ctx: &mut dyn ParseContext,
    span: semcore::diagnostics::SourceSpan,
) -> bool {
    let rest = has_rest(decls);
    let prefix_len = if rest { decls.len() - 1 } else { decls.len() };

    if !rest && decls.len() != elem_types.len() {
        ctx.report_error(Diagnostic::new(
            "destructuring pattern has a different arity than the initialiser",
            span,
        ));
        return false;
    }
    if rest && elem_types.len() < prefix_len {
        ctx.report_error(Diagnostic::new(
            "destructuring pattern requires more elements than the initialiser provides",
            span,
        ));
        return false;
    }

    for (i, decl) in decls.iter_mut().enumerate() {
        let ty = if rest && i == prefix_len {
            let rest_elems = elem_types[prefix_len..].to_vec();
            types.intern_terminal(Terminator::Tuple(rest_elems))
        } else {
            elem_types[i]
        };
        let wrapped = apply_outer_wrapping(types, ty, outer_modifiers);
        decl.set_type(wrapped);
    }
    true
}

/// Array-wise inference: every binding (and the rest-binding, if any) gets
/// the same homogeneous element type.
fn infer_from_array_expr(
    decls: &mut [Decl],
    elem_ty: TypeId,
    array_len: u64,
    outer_modifiers: &[Modifier],
    types: &mut TypeArena,
    ctx: &mut dyn ParseContext,
    span: semcore::diagnostics::SourceSpan,
) -> bool {
    let rest = has_rest(decls);
    let prefix_len = if rest { decls.len() - 1 } else { decls.len() };

    if !rest && array_len != 0 && decls.len() as u64 != array_len {
        ctx.report_error(Diagnostic::new(
            "destructuring pattern has a different arity than the array initialiser",
            span,
        ));
        return false;
    }
    if rest && array_len != 0 && (prefix_len as u64) > array_len {
        ctx.report_error(Diagnostic::new(
            "destructuring pattern requires more elements than the array initialiser has",
            span,
        ));
        return false;
    }

    for (i, decl) in decls.iter_mut().enumerate() {
        let ty = if rest && i == prefix_len {
            let rest_len = if array_len == 0 { 0 } else { array_len - prefix_len as u64 };
            types.wrap(Modifier::Array(rest_len), elem_ty)
        } else {
            elem_ty
        };
        let wrapped = apply_outer_wrapping(types, ty, outer_modifiers);
        decl.set_type(wrapped);
    }
    true
}

/// Compute and stamp the destructure type for `decls` against `init`,
/// propagating `outer_modifiers` (the declaration's own `mut`/reference
/// annotations) onto every leaf. `init` must already carry a concrete type
/// (post-match); this is not itself a matcher entry point, it runs after
/// the initialiser has been matched to its own destination.
pub fn infer_decomposition(
    decls: &mut [Decl],
    init: &Expr,
    outer_modifiers: &[Modifier],
    types: &mut TypeArena,
    ctx: &mut dyn ParseContext,
) -> bool {
    let Some(init_ty) = init.ty else {
        ctx.report_error(Diagnostic::new(
            "cannot decompose an expression with no known type",
            init.span,
        ));
        return false;
    };
    let stripped = types::remove_mut_reference(types, init_ty);
    let node = types.get(stripped).clone();

    if node.modifiers.is_empty() {
        if let Terminator::Tuple(elems) = &node.terminator {
            let elems = elems.clone();
            return infer_from_tuple_expr(decls, &elems, outer_modifiers, types, ctx, init.span);
        }
    }
    if let Some(Modifier::Array(n)) = node.modifiers.first() {
        let n = *n;
        let elem_ty = types.intern(semcore::types::TypeNode {
            modifiers: node.modifiers[1..].to_vec(),
            terminator: node.terminator,
        });
        return infer_from_array_expr(decls, elem_ty, n, outer_modifiers, types, ctx, init.span);
    }

    ctx.report_error(Diagnostic::new(
        "destructuring requires a tuple or array initialiser",
        init.span,
    ));
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use semcore::diagnostics::SourceSpan;
    use semcore::expr::{ExprKind, Literal, ValueCategory};
    use semcore::types::{BaseTypeKind, IntWidth, Terminator};

    fn span() -> SourceSpan {
        SourceSpan { begin: 0, pivot: 0, end: 1 }
    }

    #[test]
    fn tuple_destructure_stamps_each_binding() {
        let mut types = TypeArena::new();
        let int32 = types.intern_terminal(Terminator::Base(BaseTypeKind::SInt(IntWidth::W32)));
        let bool_ty = types.intern_terminal(Terminator::Base(BaseTypeKind::Bool));
        let tuple_ty = types.intern_terminal(Terminator::Tuple(vec![int32, bool_ty]));
        let init = Expr::new(ExprKind::Literal(Literal::Null), span(), ValueCategory::Rvalue).with_type(tuple_ty);
        let mut decls = vec![
            Decl::Binding { name: "a".into(), inferred: None },
            Decl::Binding { name: "b".into(), inferred: None },
        ];
        let mut ctx = super::super::tests_support::NullCtx::new();
        assert!(infer_decomposition(&mut decls, &init, &[], &mut types, &mut ctx));
        match &decls[0] {
            Decl::Binding { inferred, .. } => assert_eq!(*inferred, Some(int32)),
            _ => unreachable!(),
        }
        match &decls[1] {
            Decl::Binding { inferred, .. } => assert_eq!(*inferred, Some(bool_ty)),
            _ => unreachable!(),
        }
    }

    #[test]
    fn array_destructure_with_rest_gets_homogeneous_type() {
        let mut types = TypeArena::new();
        let int32 = types.intern_terminal(Terminator::Base(BaseTypeKind::SInt(IntWidth::W32)));
        let array_ty = types.wrap(Modifier::Array(5), int32);
        let init = Expr::new(ExprKind::Literal(Literal::Null), span(), ValueCategory::Rvalue).with_type(array_ty);
        let mut decls = vec![
            Decl::Binding { name: "head".into(), inferred: None },
            Decl::Rest { name: "tail".into(), inferred: None },
        ];
        let mut ctx = super::super::tests_support::NullCtx::new();
        assert!(infer_decomposition(&mut decls, &init, &[], &mut types, &mut ctx));
        match &decls[1] {
            Decl::Rest { inferred, .. } => {
                let t = inferred.unwrap();
                assert!(matches!(types.get(t).modifiers.first(), Some(Modifier::Array(4))));
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn mismatched_tuple_arity_reports_error() {
        let mut types = TypeArena::new();
        let int32 = types.intern_terminal(Terminator::Base(BaseTypeKind::SInt(IntWidth::W32)));
        let tuple_ty = types.intern_terminal(Terminator::Tuple(vec![int32, int32]));
        let init = Expr::new(ExprKind::Literal(Literal::Null), span(), ValueCategory::Rvalue).with_type(tuple_ty);
        let mut decls = vec![Decl::Binding { name: "a".into(), inferred: None }];
        let mut ctx = super::super::tests_support::NullCtx::new();
        assert!(!infer_decomposition(&mut decls, &init, &[], &mut types, &mut ctx));
        assert_eq!(ctx.errors.len(), 1);
    }
}
