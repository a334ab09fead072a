//! The value arena (§3.1, §5): scratch storage for building composite
//! constants during folding.
//!
//! `Value::Array`/`Tuple`/`Aggregate`/`*Array` hold `Rc<[_]>` slices so a
//! folded composite is cheap to clone and share once built (§4.1: "trivially
//! copyable ... the heap lives in the arena owned by the translation
//! unit"). Building one, though, means accumulating an unknown number of
//! child values while descending the expression tree — exactly the
//! short-lived bump-allocation pattern `bumpalo` is for. `ValueArena` gives
//! the evaluator a per-translation-unit `Bump` to stage that accumulation
//! in before freezing the result into the `Rc` slice the `Value` variant
//! actually stores.
//!
//! Per §5, this arena is append-only and owned by the translation unit;
//! nothing here is freed before the whole arena is dropped.

use crate::value::Value;
use bumpalo::Bump;
use std::rc::Rc;

/// Owns the bump allocator backing intermediate aggregate construction for
/// one translation unit.
#[derive(Default)]
pub struct ValueArena {
    bump: Bump,
}

impl ValueArena {
    pub fn new() -> Self {
        ValueArena { bump: Bump::new() }
    }

    /// Stage `values` in the arena's bump allocator, then freeze them into
    /// the `Rc<[Value]>` a composite `Value` variant stores. The staging
    /// step matters when a caller builds the slice incrementally (pushing
    /// one folded element at a time) rather than collecting an existing
    /// `Vec` — it avoids repeated reallocation on the arena's own bump
    /// region instead of the global allocator.
    pub fn freeze_values(&self, values: bumpalo::collections::Vec<'_, Value>) -> Rc<[Value]> {
        Rc::from(values.into_iter().collect::<Vec<_>>())
    }

    /// A fresh scratch buffer in this arena for incremental construction.
    pub fn scratch_values(&self) -> bumpalo::collections::Vec<'_, Value> {
        bumpalo::collections::Vec::new_in(&self.bump)
    }

    pub fn scratch_sint(&self) -> bumpalo::collections::Vec<'_, i64> {
        bumpalo::collections::Vec::new_in(&self.bump)
    }

    pub fn scratch_uint(&self) -> bumpalo::collections::Vec<'_, u64> {
        bumpalo::collections::Vec::new_in(&self.bump)
    }

    pub fn scratch_f32(&self) -> bumpalo::collections::Vec<'_, f32> {
        bumpalo::collections::Vec::new_in(&self.bump)
    }

    pub fn scratch_f64(&self) -> bumpalo::collections::Vec<'_, f64> {
        bumpalo::collections::Vec::new_in(&self.bump)
    }

    /// Bytes currently allocated in the arena, exposed for harness
    /// diagnostics only.
    pub fn allocated_bytes(&self) -> usize {
        self.bump.allocated_bytes()
    }

    /// Drop everything staged so far. Only ever called between translation
    /// units, never mid-fold (§5: shared state mutated exclusively through
    /// the parse-context, and this arena's contents back live `Value`s for
    /// as long as the `Rc`s referencing them survive — resetting early
    /// would not invalidate those, since `freeze_values` already copies out
    /// of the bump region, but it would waste the work).
    pub fn reset(&mut self) {
        self.bump.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn freeze_round_trips_staged_values() {
        let arena = ValueArena::new();
        let mut scratch = arena.scratch_values();
        scratch.push(Value::SInt(1));
        scratch.push(Value::SInt(2));
        let frozen = arena.freeze_values(scratch);
        assert_eq!(&*frozen, &[Value::SInt(1), Value::SInt(2)]);
    }

    #[test]
    fn reset_does_not_panic_with_outstanding_frozen_values() {
        let mut arena = ValueArena::new();
        let scratch = arena.scratch_values();
        let frozen = arena.freeze_values(scratch);
        arena.reset();
        assert!(frozen.is_empty());
    }
}
