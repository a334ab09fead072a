//! The intrinsic-function identity table (§4.2.3).
//!
//! This is the *closed set of names* a call node can carry; the fold rule
//! for each family lives in `semengine::eval::intrinsics`, which matches
//! exhaustively over this enum. Naming every one of the ~145 identities the
//! original compiler recognises would just be a longer version of the same
//! enum, so this models one representative member per family plus the
//! handful the testable-property and end-to-end scenarios (§8) name
//! explicitly; extending a family is adding a variant and a match arm, never
//! a structural change.

/// Which evaluation family an intrinsic belongs to (§4.2.3); used by the
/// evaluator to dispatch without repeating the same family logic per name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntrinsicFamily {
    StringInspection,
    SliceOptionalPointer,
    TypePredicate,
    CompileTimeDiagnostic,
    Math,
    BitManipulation,
    DefaultConstructor,
    Operator,
}

/// One recognised intrinsic identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intrinsic {
    // String inspection: only `str_size` folds (§4.2.3).
    StrSize,
    StrBegin,
    StrEnd,

    // Slice/optional/pointer: fold only for null-producing cases.
    SliceSize,
    OptionalHasValue,
    PointerIsNull,

    // Type predicates and projections: consult the type model, fold to
    // booleans or derived types.
    IsConst,
    IsPointer,
    IsOptional,
    RemovePointer,
    TypenameAsStr,
    IsDefaultConstructible,
    IsCopyConstructible,
    IsTriviallyDestructible,

    // Compile-time diagnostics: side-effectful, per-intensity behaviour
    // (§4.2.3, §C).
    CompileError,
    CompileWarning,
    IsOptionSet,
    IsComptime,

    // Math, f32/f64 flavours collapsed onto one identity each; the
    // evaluator carries the flavour as part of the operand types.
    Exp,
    Log,
    Pow,
    Sqrt,
    Sin,
    Cos,
    Atan2,
    Tgamma,

    // Bit manipulation.
    Bitreverse,
    Popcount,
    Byteswap,
    Clz,
    Ctz,
    Fshl,
    Fshr,

    // Default constructors for primitives: fold to the zero of their
    // variant.
    DefaultSInt,
    DefaultUInt,
    DefaultFloat32,
    DefaultFloat64,
    DefaultBool,

    // Built-in binary/unary operators routed as intrinsics rather than as
    // `ExprKind::Binary`/`Unary` directly (some call-sites in the original
    // grammar desugar operators to named calls, e.g. user-overloadable
    // comparison).
    OpAdd,
    OpSub,
    OpMul,
    OpDiv,
    OpRem,
}

impl Intrinsic {
    pub fn family(self) -> IntrinsicFamily {
        use Intrinsic::*;
        match self {
            StrSize | StrBegin | StrEnd => IntrinsicFamily::StringInspection,
            SliceSize | OptionalHasValue | PointerIsNull => IntrinsicFamily::SliceOptionalPointer,
            IsConst | IsPointer | IsOptional | RemovePointer | TypenameAsStr
            | IsDefaultConstructible | IsCopyConstructible | IsTriviallyDestructible => {
                IntrinsicFamily::TypePredicate
            }
            CompileError | CompileWarning | IsOptionSet | IsComptime => {
                IntrinsicFamily::CompileTimeDiagnostic
            }
            Exp | Log | Pow | Sqrt | Sin | Cos | Atan2 | Tgamma => IntrinsicFamily::Math,
            Bitreverse | Popcount | Byteswap | Clz | Ctz | Fshl | Fshr => {
                IntrinsicFamily::BitManipulation
            }
            DefaultSInt | DefaultUInt | DefaultFloat32 | DefaultFloat64 | DefaultBool => {
                IntrinsicFamily::DefaultConstructor
            }
            OpAdd | OpSub | OpMul | OpDiv | OpRem => IntrinsicFamily::Operator,
        }
    }

    /// Only `str_size` folds among string-inspection intrinsics (§4.2.3).
    pub fn ever_folds(self) -> bool {
        !matches!(self, Intrinsic::StrBegin | Intrinsic::StrEnd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_str_size_folds_among_string_inspection() {
        assert!(Intrinsic::StrSize.ever_folds());
        assert!(!Intrinsic::StrBegin.ever_folds());
        assert!(!Intrinsic::StrEnd.ever_folds());
    }

    #[test]
    fn families_partition_the_set() {
        assert_eq!(Intrinsic::Pow.family(), IntrinsicFamily::Math);
        assert_eq!(Intrinsic::IsComptime.family(), IntrinsicFamily::CompileTimeDiagnostic);
    }
}
