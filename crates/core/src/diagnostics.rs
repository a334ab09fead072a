//! Warnings and diagnostics (§6, §7).
//!
//! Warnings are a closed, bit-exact-named set so that `-W<name>` /
//! `-Wno-<name>` / `-Werror=<name>` on the CLI surface (out of core, but
//! named here because the set is part of the external contract) can address
//! them by stable string. Every warning carries a *paren-level budget*: the
//! number of enclosing redundant parenthesis pairs at or above which the
//! warning is suppressed (§7).

use std::fmt;

/// One entry in the closed warning set (§6). Variant names map to the
/// hyphenated wire names via [`Warning::name`]; the mapping is exhaustive and
/// adding a variant without updating `name`/`paren_level_budget` is a
/// compile error by construction (both match on every variant).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Warning {
    IntOverflow,
    IntDivideByZero,
    FloatOverflow,
    FloatDivideByZero,
    FloatNanMath,
    UnknownAttribute,
    NullPointerDereference,
    UnusedValue,
    UnclosedComment,
    MismatchedBraceIndent,
    UnusedVariable,
    GreekQuestionMark,
    BadFileExtension,
    UnknownTarget,
    InvalidUnicode,
    NanCompare,
    OutOfBoundsIndex,
    MathDomainError,
    BinaryStdout,
    IsComptimeAlwaysTrue,
    NonExhaustiveSwitch,
    UnneededElse,
    AssignInCondition,
    GetValueNull,
    EnumValueOverflow,
    SizeofReferenceExpression,
    ComptimeWarning,
}

impl Warning {
    /// The bit-exact wire name (§6).
    pub fn name(self) -> &'static str {
        match self {
            Warning::IntOverflow => "int-overflow",
            Warning::IntDivideByZero => "int-divide-by-zero",
            Warning::FloatOverflow => "float-overflow",
            Warning::FloatDivideByZero => "float-divide-by-zero",
            Warning::FloatNanMath => "float-nan-math",
            Warning::UnknownAttribute => "unknown-attribute",
            Warning::NullPointerDereference => "null-pointer-dereference",
            Warning::UnusedValue => "unused-value",
            Warning::UnclosedComment => "unclosed-comment",
            Warning::MismatchedBraceIndent => "mismatched-brace-indent",
            Warning::UnusedVariable => "unused-variable",
            Warning::GreekQuestionMark => "greek-question-mark",
            Warning::BadFileExtension => "bad-file-extension",
            Warning::UnknownTarget => "unknown-target",
            Warning::InvalidUnicode => "invalid-unicode",
            Warning::NanCompare => "nan-compare",
            Warning::OutOfBoundsIndex => "out-of-bounds-index",
            Warning::MathDomainError => "math-domain-error",
            Warning::BinaryStdout => "binary-stdout",
            Warning::IsComptimeAlwaysTrue => "is-comptime-always-true",
            Warning::NonExhaustiveSwitch => "non-exhaustive-switch",
            Warning::UnneededElse => "unneeded-else",
            Warning::AssignInCondition => "assign-in-condition",
            Warning::GetValueNull => "get-value-null",
            Warning::EnumValueOverflow => "enum-value-overflow",
            Warning::SizeofReferenceExpression => "sizeof-reference-expression",
            Warning::ComptimeWarning => "comptime-warning",
        }
    }

    /// The paren-level budget `N` from §7: the warning is suppressed once the
    /// expression is wrapped in at least `N + 1` parenthesis pairs. The
    /// evaluator and matcher only ever call this at two sites — safe
    /// arithmetic and math-domain checks use budget 2, everything else 1 —
    /// but it's a property of the warning identity, not the call site.
    pub fn paren_level_budget(self) -> u32 {
        match self {
            Warning::IntOverflow
            | Warning::IntDivideByZero
            | Warning::FloatOverflow
            | Warning::FloatDivideByZero
            | Warning::FloatNanMath
            | Warning::InvalidUnicode
            | Warning::OutOfBoundsIndex
            | Warning::MathDomainError => 2,
            _ => 1,
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A secondary annotation attached to a [`Diagnostic`] (§4.2.5, §4.3.8): one
/// note per innermost non-constant subexpression, a declaration-site note,
/// or a structural-mismatch note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub message: String,
    pub location: Option<SourceSpan>,
}

impl Note {
    pub fn new(message: impl Into<String>) -> Self {
        Note {
            message: message.into(),
            location: None,
        }
    }

    pub fn at(message: impl Into<String>, location: SourceSpan) -> Self {
        Note {
            message: message.into(),
            location: Some(location),
        }
    }
}

/// A source-location triple (§3.3): `begin`/`pivot`/`end` byte offsets into
/// the originating source file. The pivot is where a diagnostic is anchored
/// (e.g. the operator token of a binary expression); begin/end bound the
/// full expression for paren-level counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceSpan {
    pub begin: u32,
    pub pivot: u32,
    pub end: u32,
}

/// An error surfaced at the pivot of an expression, with up to the notes
/// §4.2.5/§4.3.8 describe (one structural-mismatch note, one outer-context
/// note, plus any number of per-subexpression notes for a failed fold).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub message: String,
    pub location: SourceSpan,
    pub notes: Vec<Note>,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>, location: SourceSpan) -> Self {
        Diagnostic {
            message: message.into(),
            location,
            notes: Vec::new(),
        }
    }

    pub fn with_note(mut self, note: Note) -> Self {
        self.notes.push(note);
        self
    }

    pub fn with_notes(mut self, notes: impl IntoIterator<Item = Note>) -> Self {
        self.notes.extend(notes);
        self
    }
}

/// Whether a warning fires at a given paren-level, per §7's suppression
/// rule: suppressed once wrapped in at least `budget + 1` parenthesis pairs.
pub fn warning_suppressed(kind: Warning, paren_level: u32) -> bool {
    paren_level > kind.paren_level_budget()
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    const ALL_WARNINGS: &[Warning] = &[
        Warning::IntOverflow,
        Warning::IntDivideByZero,
        Warning::FloatOverflow,
        Warning::FloatDivideByZero,
        Warning::FloatNanMath,
        Warning::UnknownAttribute,
        Warning::NullPointerDereference,
        Warning::UnusedValue,
        Warning::UnclosedComment,
        Warning::MismatchedBraceIndent,
        Warning::UnusedVariable,
        Warning::GreekQuestionMark,
        Warning::BadFileExtension,
        Warning::UnknownTarget,
        Warning::InvalidUnicode,
        Warning::NanCompare,
        Warning::OutOfBoundsIndex,
        Warning::MathDomainError,
        Warning::BinaryStdout,
        Warning::IsComptimeAlwaysTrue,
        Warning::NonExhaustiveSwitch,
        Warning::UnneededElse,
        Warning::AssignInCondition,
        Warning::GetValueNull,
        Warning::EnumValueOverflow,
        Warning::SizeofReferenceExpression,
        Warning::ComptimeWarning,
    ];

    proptest! {
        // §8 property 9: once a warning is suppressed at paren-level `L`, it
        // stays suppressed at every deeper level.
        #[test]
        fn p9_suppression_is_monotonic_in_paren_level(idx in 0usize..ALL_WARNINGS.len(), paren_level in 0u32..16) {
            let kind = ALL_WARNINGS[idx];
            if warning_suppressed(kind, paren_level) {
                prop_assert!(warning_suppressed(kind, paren_level + 1));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warning_names_are_hyphenated() {
        assert_eq!(Warning::IntOverflow.name(), "int-overflow");
        assert_eq!(Warning::IsComptimeAlwaysTrue.name(), "is-comptime-always-true");
        assert_eq!(Warning::MathDomainError.name(), "math-domain-error");
    }

    #[test]
    fn paren_level_suppression_budget_two() {
        assert!(!warning_suppressed(Warning::IntOverflow, 0));
        assert!(!warning_suppressed(Warning::IntOverflow, 2));
        assert!(warning_suppressed(Warning::IntOverflow, 3));
    }

    #[test]
    fn paren_level_suppression_budget_one() {
        assert!(!warning_suppressed(Warning::UnusedVariable, 1));
        assert!(warning_suppressed(Warning::UnusedVariable, 2));
    }

    #[test]
    fn diagnostic_builder_accumulates_notes() {
        let span = SourceSpan {
            begin: 0,
            pivot: 1,
            end: 2,
        };
        let diag = Diagnostic::new("not a constant expression", span)
            .with_note(Note::new("subexpression `x` is not a constant expression"));
        assert_eq!(diag.notes.len(), 1);
    }
}
