//! Variadic-tail expansion (§4.4): given a tuple-type ending in
//! `variadic(T)` and a target arity `n`, expand the tail into `n - k`
//! copies of `T`, where `k` is the count of non-variadic prefix elements.
//! No-op when `n < k`. Shared between tuple-literal matching
//! ([`super::tuple`]) and type-strict matching ([`super::type_strict`]),
//! since both need to turn a `variadic`-terminated element list into a
//! concrete-arity one before per-element matching.

use semcore::types::{Modifier, TypeArena, TypeId, TypeNode};

/// Is `id`'s outermost modifier `variadic`?
pub fn is_variadic_tail(types: &TypeArena, id: TypeId) -> bool {
    matches!(types.get(id).modifiers.first(), Some(Modifier::Variadic))
}

/// Strip the leading `variadic` modifier, exposing the repeated element
/// type.
fn variadic_inner(types: &mut TypeArena, id: TypeId) -> TypeId {
    let node = types.get(id).clone();
    debug_assert!(matches!(node.modifiers.first(), Some(Modifier::Variadic)));
    types.intern(TypeNode {
        modifiers: node.modifiers[1..].to_vec(),
        terminator: node.terminator,
    })
}

/// Expand `elements` (a tuple/parameter-list element-type sequence) to
/// `target_arity`, if its last entry is a `variadic(T)` tail. Returns the
/// prefix unchanged, followed by `target_arity - k` copies of `T`, where
/// `k` is the non-variadic prefix length. No-op (returns `elements`
/// unchanged) when `target_arity < k` or there is no variadic tail.
pub fn expand_tail(types: &mut TypeArena, elements: &[TypeId], target_arity: usize) -> Vec<TypeId> {
    let Some(&last) = elements.last() else {
        return elements.to_vec();
    };
    if !is_variadic_tail(types, last) {
        return elements.to_vec();
    }
    let prefix = &elements[..elements.len() - 1];
    let k = prefix.len();
    if target_arity < k {
        return elements.to_vec();
    }
    let tail_inner = variadic_inner(types, last);
    let mut expanded = prefix.to_vec();
    expanded.extend(std::iter::repeat(tail_inner).take(target_arity - k));
    expanded
}

#[cfg(test)]
mod tests {
    use super::*;
    use semcore::types::{BaseTypeKind, IntWidth, Terminator};

    #[test]
    fn expands_tail_to_requested_arity() {
        let mut types = TypeArena::new();
        let int32 = types.intern_terminal(Terminator::Base(BaseTypeKind::SInt(IntWidth::W32)));
        let variadic_int = types.wrap(Modifier::Variadic, int32);
        let bool_ty = types.intern_terminal(Terminator::Base(BaseTypeKind::Bool));
        let elems = vec![bool_ty, variadic_int];
        let expanded = expand_tail(&mut types, &elems, 4);
        assert_eq!(expanded.len(), 4);
        assert_eq!(expanded[0], bool_ty);
        assert_eq!(expanded[1], int32);
        assert_eq!(expanded[3], int32);
    }

    #[test]
    fn no_op_when_target_below_prefix_len() {
        let mut types = TypeArena::new();
        let int32 = types.intern_terminal(Terminator::Base(BaseTypeKind::SInt(IntWidth::W32)));
        let variadic_int = types.wrap(Modifier::Variadic, int32);
        let bool_ty = types.intern_terminal(Terminator::Base(BaseTypeKind::Bool));
        let elems = vec![bool_ty, bool_ty, variadic_int];
        let expanded = expand_tail(&mut types, &elems, 1);
        assert_eq!(expanded, elems);
    }

    #[test]
    fn no_op_without_variadic_tail() {
        let mut types = TypeArena::new();
        let int32 = types.intern_terminal(Terminator::Base(BaseTypeKind::SInt(IntWidth::W32)));
        let elems = vec![int32, int32];
        let expanded = expand_tail(&mut types, &elems, 5);
        assert_eq!(expanded, elems);
    }
}
