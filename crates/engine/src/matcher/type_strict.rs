//! Type-strict matching (§4.3.6): both sides are types. The destination is
//! `typename`-terminated (possibly wrapped in modifiers), the expression is
//! a compile-time type value (`ExprKind::TypenameExpr`). Descends through
//! identical modifier layers in lockstep, capturing source subtrees
//! wherever the destination names a bare `typename` (generic-parameter
//! deduction).

use super::score::{Leaf, ReferenceMatchKind, Score, TypeKind};
use super::{Mode, Verdict};
use semcore::expr::{Expr, ExprKind};
use semcore::parse_context::ParseContext;
use semcore::types::{BaseTypeKind, Modifier, Terminator, TypeArena, TypeId};

/// Deduced type arguments captured at each bare-`typename` leaf on the
/// destination side, in left-to-right encounter order.
#[derive(Debug, Default)]
struct Captures(Vec<TypeId>);

fn is_bare_typename(types: &TypeArena, id: TypeId) -> bool {
    let node = types.get(id);
    node.modifiers.is_empty() && matches!(node.terminator, Terminator::Typename)
}

/// One step of the lockstep descent. `src`/`dest` are full `TypeId`s still
/// carrying their own modifier stacks; peeled one layer at a time.
fn descend(
    types: &mut TypeArena,
    stack: &mut Vec<(TypeId, TypeId)>,
    src: TypeId,
    dest: TypeId,
    captures: &mut Captures,
) -> Option<Score> {
    if is_bare_typename(types, dest) {
        captures.0.push(src);
        return Some(Score::exact());
    }
    if stack.contains(&(src, dest)) {
        // A cycle in a recursive generic instantiation is treated as a
        // fixed point: the pair already matched once on this path (§9).
        return Some(Score::exact());
    }
    stack.push((src, dest));
    let result = descend_inner(types, stack, src, dest, captures);
    stack.pop();
    result
}

fn descend_inner(
    types: &mut TypeArena,
    stack: &mut Vec<(TypeId, TypeId)>,
    src: TypeId,
    dest: TypeId,
    captures: &mut Captures,
) -> Option<Score> {
    let src_node = types.get(src).clone();
    let dest_node = types.get(dest).clone();

    match (dest_node.modifiers.first(), src_node.modifiers.first()) {
        (Some(Modifier::Array(dn)), Some(Modifier::Array(sn))) => {
            let dn = *dn;
            let sn = *sn;
            if dn != 0 && dn != sn {
                return None;
            }
            let inner_dest = peel(types, dest);
            let inner_src = peel(types, src);
            let inner = descend(types, stack, inner_src, inner_dest, captures)?;
            let bonus = if dn == sn { TypeKind::ExactMatch } else { TypeKind::DirectMatch };
            Some(bump(inner, bonus))
        }
        (Some(d), Some(s)) if d == s => {
            let inner_dest = peel(types, dest);
            let inner_src = peel(types, src);
            descend(types, stack, inner_src, inner_dest, captures).map(|sc| sc.add_depth(1))
        }
        (None, None) => match_terminators(types, stack, &src_node.terminator, &dest_node.terminator, captures),
        _ => None,
    }
}

fn peel(types: &mut TypeArena, id: TypeId) -> TypeId {
    let node = types.get(id).clone();
    types.intern(semcore::types::TypeNode {
        modifiers: node.modifiers[1..].to_vec(),
        terminator: node.terminator,
    })
}

fn bump(score: Score, worst_leaf_kind: TypeKind) -> Score {
    match score {
        Score::Leaf(l) if l.type_kind < worst_leaf_kind => Score::Leaf(Leaf {
            type_kind: worst_leaf_kind,
            ..l
        }),
        other => other,
    }
}

fn match_tuple_types(
    types: &mut TypeArena,
    stack: &mut Vec<(TypeId, TypeId)>,
    src_elems: &[TypeId],
    dest_elems: &[TypeId],
    captures: &mut Captures,
) -> Option<Score> {
    let has_variadic = dest_elems
        .last()
        .map(|&t| super::variadic::is_variadic_tail(types, t))
        .unwrap_or(false);

    if has_variadic {
        let prefix_len = dest_elems.len() - 1;
        if src_elems.len() < prefix_len {
            return None;
        }
        let full_dest = super::variadic::expand_tail(types, dest_elems, src_elems.len());
        if full_dest.len() != src_elems.len() {
            return None;
        }
        let mut scores = Vec::with_capacity(src_elems.len());
        for (&s, &d) in src_elems.iter().zip(full_dest.iter()) {
            scores.push(descend(types, stack, s, d, captures)?);
        }
        Some(Score::Composite(scores))
    } else {
        if src_elems.len() != dest_elems.len() {
            return None;
        }
        let mut scores = Vec::with_capacity(src_elems.len());
        for (&s, &d) in src_elems.iter().zip(dest_elems.iter()) {
            scores.push(descend(types, stack, s, d, captures)?);
        }
        Some(Score::Composite(scores))
    }
}

fn match_terminators(
    types: &mut TypeArena,
    stack: &mut Vec<(TypeId, TypeId)>,
    src: &Terminator,
    dest: &Terminator,
    captures: &mut Captures,
) -> Option<Score> {
    match (src, dest) {
        (Terminator::Tuple(se), Terminator::Tuple(de)) => {
            let se = se.clone();
            let de = de.clone();
            match_tuple_types(types, stack, &se, &de, captures)
        }
        (Terminator::Base(BaseTypeKind::GenericInstance(sname, sargs)), Terminator::Base(BaseTypeKind::GenericInstance(dname, dargs))) => {
            if sname != dname || sargs.len() != dargs.len() {
                return None;
            }
            let sargs = sargs.clone();
            let dargs = dargs.clone();
            let mut scores = Vec::with_capacity(sargs.len());
            for (&s, &d) in sargs.iter().zip(dargs.iter()) {
                scores.push(descend(types, stack, s, d, captures)?);
            }
            Some(Score::Composite(scores))
        }
        _ if src == dest => Some(Score::exact()),
        _ => None,
    }
}

// Captured generic-parameter type arguments ride along on the
// `TypenameExpr` payload itself; the first capture (if any) replaces the
// source type the expression carried in.
fn apply_captures(expr: &mut Expr, captures: &Captures) {
    if let ExprKind::TypenameExpr(_) = &mut *expr.kind {
        if let Some(&first) = captures.0.first() {
            *expr.kind = Box::new(ExprKind::TypenameExpr(first));
        }
    }
}

pub fn match_type_strict(
    mode: Mode,
    expr: &mut Expr,
    dest: TypeId,
    types: &mut TypeArena,
    _ctx: &mut dyn ParseContext,
    stack: &mut Vec<(TypeId, TypeId)>,
) -> Verdict {
    let ExprKind::TypenameExpr(src) = &*expr.kind else {
        return Verdict::failure();
    };
    let src = *src;
    let mut captures = Captures::default();
    let Some(score) = descend(types, stack, src, dest, &mut captures) else {
        return Verdict::failure();
    };
    let deduced = captures.0.first().copied().unwrap_or(src);
    if mode == Mode::MatchExpression {
        apply_captures(expr, &captures);
        expr.ty = Some(dest);
    }
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
    use semcore::expr::ValueCategory;
    use semcore::types::{IntWidth, Terminator};

    fn span() -> SourceSpan {
        SourceSpan { begin: 0, pivot: 0, end: 1 }
    }

    #[test]
    fn identical_base_types_match_exactly() {
        let mut types = TypeArena::new();
        let int32 = types.intern_terminal(Terminator::Base(BaseTypeKind::SInt(IntWidth::W32)));
        let mut expr = Expr::new(ExprKind::TypenameExpr(int32), span(), ValueCategory::Literal);
        let mut ctx = super::super::tests_support::NullCtx::new();
        let mut stack = Vec::new();
        let verdict = match_type_strict(Mode::CanMatch, &mut expr, int32, &mut types, &mut ctx, &mut stack);
        assert!(verdict.matched);
    }

    #[test]
    fn bare_typename_destination_captures_source() {
        let mut types = TypeArena::new();
        let int32 = types.intern_terminal(Terminator::Base(BaseTypeKind::SInt(IntWidth::W32)));
        let typename_dest = types.intern_terminal(Terminator::Typename);
        let mut expr = Expr::new(ExprKind::TypenameExpr(int32), span(), ValueCategory::Literal);
        let mut ctx = super::super::tests_support::NullCtx::new();
        let mut stack = Vec::new();
        let verdict = match_type_strict(Mode::MatchedType, &mut expr, typename_dest, &mut types, &mut ctx, &mut stack);
        assert_eq!(verdict.deduced_type, Some(int32));
    }

    #[test]
    fn zero_size_array_destination_matches_any_size() {
        let mut types = TypeArena::new();
        let int32 = types.intern_terminal(Terminator::Base(BaseTypeKind::SInt(IntWidth::W32)));
        let dest = types.wrap(Modifier::Array(0), int32);
        let src = types.wrap(Modifier::Array(5), int32);
        let mut expr = Expr::new(ExprKind::TypenameExpr(src), span(), ValueCategory::Literal);
        let mut ctx = super::super::tests_support::NullCtx::new();
        let mut stack = Vec::new();
        let verdict = match_type_strict(Mode::CanMatch, &mut expr, dest, &mut types, &mut ctx, &mut stack);
        assert!(verdict.matched);
    }

    #[test]
    fn mismatched_array_sizes_fail() {
        let mut types = TypeArena::new();
        let int32 = types.intern_terminal(Terminator::Base(BaseTypeKind::SInt(IntWidth::W32)));
        let dest = types.wrap(Modifier::Array(3), int32);
        let src = types.wrap(Modifier::Array(5), int32);
        let mut expr = Expr::new(ExprKind::TypenameExpr(src), span(), ValueCategory::Literal);
        let mut ctx = super::super::tests_support::NullCtx::new();
        let mut stack = Vec::new();
        let verdict = match_type_strict(Mode::CanMatch, &mut expr, dest, &mut types, &mut ctx, &mut stack);
        assert!(!verdict.matched);
    }
}
