//! The match-level score (§4.3.3).
//!
//! A score is either a single leaf `(modifier-depth, reference-kind,
//! type-kind)` tuple or a vector of sub-scores for composite matches
//! (tuples, function signatures, if/switch branches). Ordering is the
//! product order over the leaf tuple, lifted over composites with one
//! extra rule: a per-element conflict where one side wins only through
//! `implicit_literal_conversion`-grade differences while the other wins
//! through an outright worse `type_kind` is **ambiguous**, not resolved in
//! either direction — overload resolution would rather reject a program as
//! ambiguous than silently prefer the "morally worse" candidate because one
//! dimension happened to look better.

use std::cmp::Ordering;

/// How well the matched *type* compares to the destination, ordered so that
/// *worse* matches compare as greater (§4.3.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TypeKind {
    ExactMatch,
    ImplicitLiteralConversion,
    DirectMatch,
    GenericMatch,
    ImplicitConversion,
}

/// How a value-category/reference-ness pairing bound, for the scorer's
/// tie-breaking rules only (§4.3.8's "small total function ... used only by
/// the match-level scorer", §4.4). Ordered best-first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReferenceMatchKind {
    /// No reference was involved on either side: a plain value match.
    Identity,
    /// Bound an `lvalue_reference` to an lvalue of the same type.
    LvalueBinding,
    /// Bound a `move_reference` to an rvalue/moved-lvalue.
    RvalueBinding,
    /// Bound `auto_reference`/`auto_reference_mut`, deducing the reference
    /// kind from the source's value category.
    AutoBinding,
    /// The source was copied into a non-reference destination (a reference
    /// decayed, or none was requested).
    ValueDecay,
}

/// One leaf of a match score (§4.3.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Leaf {
    pub modifier_depth: i64,
    pub reference_kind: ReferenceMatchKind,
    pub type_kind: TypeKind,
}

impl Leaf {
    pub fn exact() -> Self {
        Leaf {
            modifier_depth: 0,
            reference_kind: ReferenceMatchKind::Identity,
            type_kind: TypeKind::ExactMatch,
        }
    }
}

/// A match-level score: a leaf tuple, or a vector of sub-scores for
/// composite matches (§4.3.3).
#[derive(Debug, Clone, PartialEq)]
pub enum Score {
    Leaf(Leaf),
    Composite(Vec<Score>),
}

impl Score {
    pub fn exact() -> Self {
        Score::Leaf(Leaf::exact())
    }

    /// Add `k` to every `modifier_depth` field in the tree (§4.3.3).
    pub fn add_depth(&self, k: i64) -> Score {
        match self {
            Score::Leaf(l) => Score::Leaf(Leaf {
                modifier_depth: l.modifier_depth + k,
                ..*l
            }),
            Score::Composite(v) => Score::Composite(v.iter().map(|s| s.add_depth(k)).collect()),
        }
    }
}

/// The result of comparing two scores for overload-resolution purposes:
/// `Better`/`Worse` pick a winner, `Equal` means either candidate is fine,
/// `Ambiguous` means neither wins and the caller must report a tie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Better,
    Worse,
    Equal,
    Ambiguous,
}

impl Comparison {
    fn flip(self) -> Comparison {
        match self {
            Comparison::Better => Comparison::Worse,
            Comparison::Worse => Comparison::Better,
            other => other,
        }
    }
}

fn compare_leaf(a: &Leaf, b: &Leaf) -> Comparison {
    let dims = [
        (a.modifier_depth.cmp(&b.modifier_depth)),
        (a.reference_kind.cmp(&b.reference_kind)),
        (a.type_kind.cmp(&b.type_kind)),
    ];
    let mut saw_less = false;
    let mut saw_greater = false;
    for d in dims {
        match d {
            Ordering::Less => saw_less = true,
            Ordering::Greater => saw_greater = true,
            Ordering::Equal => {}
        }
    }
    match (saw_less, saw_greater) {
        (true, false) => Comparison::Better,
        (false, true) => Comparison::Worse,
        (false, false) => Comparison::Equal,
        // Product order: neither dominates. Two dimensions disagreeing on
        // direction is the leaf-level analogue of the composite ambiguity
        // rule below.
        (true, true) => Comparison::Ambiguous,
    }
}

/// Compare `a` to `b` from `a`'s perspective (§4.3.3).
pub fn compare_scores(a: &Score, b: &Score) -> Comparison {
    match (a, b) {
        (Score::Leaf(la), Score::Leaf(lb)) => compare_leaf(la, lb),
        (Score::Composite(va), Score::Composite(vb)) if va.len() == vb.len() => {
            let mut a_better = false;
            let mut b_better = false;
            for (sa, sb) in va.iter().zip(vb.iter()) {
                match compare_scores(sa, sb) {
                    Comparison::Better => a_better = true,
                    Comparison::Worse => b_better = true,
                    Comparison::Ambiguous => return Comparison::Ambiguous,
                    Comparison::Equal => {}
                }
            }
            match (a_better, b_better) {
                (true, false) => Comparison::Better,
                (false, true) => Comparison::Worse,
                (false, false) => Comparison::Equal,
                // One element favours `a`, another favours `b`: a real
                // per-element conflict (§4.3.3's second rule). Resolving it
                // by magnitude would silently prefer whichever side "lost
                // less"; the spec calls this ambiguous instead.
                (true, true) => Comparison::Ambiguous,
            }
        }
        // Mismatched shapes only arise when comparing scores from
        // structurally different candidates (e.g. a tuple-arity overload
        // against a scalar one); treat as incomparable rather than panic.
        _ => Comparison::Ambiguous,
    }
}

/// `compare_scores(b, a)`, handy when the caller already has `a` in hand and
/// wants `b`'s perspective without re-deriving the flip by hand.
pub fn compare_scores_rev(a: &Score, b: &Score) -> Comparison {
    compare_scores(a, b).flip()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_beats_implicit_conversion() {
        let exact = Score::exact();
        let worse = Score::Leaf(Leaf {
            modifier_depth: 0,
            reference_kind: ReferenceMatchKind::Identity,
            type_kind: TypeKind::ImplicitConversion,
        });
        assert_eq!(compare_scores(&exact, &worse), Comparison::Better);
        assert_eq!(compare_scores(&worse, &exact), Comparison::Worse);
    }

    #[test]
    fn equal_leaves_are_equal() {
        assert_eq!(compare_scores(&Score::exact(), &Score::exact()), Comparison::Equal);
    }

    #[test]
    fn mixed_dimensions_are_ambiguous() {
        let a = Score::Leaf(Leaf {
            modifier_depth: 0,
            reference_kind: ReferenceMatchKind::Identity,
            type_kind: TypeKind::DirectMatch,
        });
        let b = Score::Leaf(Leaf {
            modifier_depth: 1,
            reference_kind: ReferenceMatchKind::Identity,
            type_kind: TypeKind::ExactMatch,
        });
        assert_eq!(compare_scores(&a, &b), Comparison::Ambiguous);
    }

    #[test]
    fn composite_per_element_conflict_is_ambiguous() {
        let a = Score::Composite(vec![Score::exact(), Score::Leaf(Leaf {
            modifier_depth: 0,
            reference_kind: ReferenceMatchKind::Identity,
            type_kind: TypeKind::ImplicitConversion,
        })]);
        let b = Score::Composite(vec![
            Score::Leaf(Leaf {
                modifier_depth: 0,
                reference_kind: ReferenceMatchKind::Identity,
                type_kind: TypeKind::ImplicitLiteralConversion,
            }),
            Score::exact(),
        ]);
        assert_eq!(compare_scores(&a, &b), Comparison::Ambiguous);
    }

    #[test]
    fn composite_uniform_improvement_wins() {
        let a = Score::Composite(vec![Score::exact(), Score::exact()]);
        let b = Score::Composite(vec![
            Score::Leaf(Leaf {
                modifier_depth: 0,
                reference_kind: ReferenceMatchKind::Identity,
                type_kind: TypeKind::DirectMatch,
            }),
            Score::exact(),
        ]);
        assert_eq!(compare_scores(&a, &b), Comparison::Better);
    }

    #[test]
    fn add_depth_touches_every_leaf() {
        let composite = Score::Composite(vec![Score::exact(), Score::exact()]);
        let shifted = composite.add_depth(3);
        match shifted {
            Score::Composite(v) => {
                for s in v {
                    match s {
                        Score::Leaf(l) => assert_eq!(l.modifier_depth, 3),
                        _ => panic!("expected leaf"),
                    }
                }
            }
            _ => panic!("expected composite"),
        }
    }
}
