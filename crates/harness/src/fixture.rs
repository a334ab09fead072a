//! The conformance-fixture format: a small, data-driven JSON description of
//! expressions and destination types that drives the evaluator and matcher
//! end to end without a parser (concrete syntax is out of scope, spec §1).
//!
//! A fixture is a list of independent [`Case`]s. Each names the operation to
//! run (a fold intensity or a matcher mode), the expression tree to build,
//! and — for matcher cases — the destination type. An optional `expect`
//! block lets `semharness run` double as a small conformance suite: a case
//! whose outcome disagrees with its expectation is reported and flips the
//! process exit code, mirroring the teacher's `seqc test` subcommand.

use serde::Deserialize;
use std::collections::HashMap;
use std::rc::Rc;

use semcore::expr::{
    BinOp, CastExpr, DeclRef, Expr, ExprKind, Literal, SwitchArm, UnOp, ValueCategory,
};
use semcore::intrinsics::Intrinsic;
use semcore::types::{
    BaseTypeKind, CallingConvention, EnumDecl, IntWidth, Modifier, Terminator, TypeArena, TypeId,
};
use semcore::value::Value;
use semcore::SourceSpan;

#[derive(Debug, Deserialize)]
pub struct Fixture {
    /// Named `consteval` declarations `ExprSpec::Ident` cases may reference.
    #[serde(default)]
    pub consteval_vars: ConstevalVars,
    #[serde(default)]
    pub cases: Vec<Case>,
}

#[derive(Debug, Deserialize)]
pub struct Case {
    pub name: String,
    pub op: Op,
    pub expr: ExprSpec,
    /// Required for every `op` except the `fold_*` family.
    #[serde(default)]
    pub dest: Option<TypeSpec>,
    #[serde(default)]
    pub expect: Expect,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Op {
    FoldGuaranteed,
    FoldForceWithError,
    FoldForceWithoutError,
    CanMatch,
    MatchLevel,
    MatchedType,
    MatchExpression,
}

#[derive(Debug, Deserialize, Default)]
pub struct Expect {
    /// Expected `display()` of the folded value (fold ops only).
    pub value: Option<String>,
    /// Expected boolean result (`can_match`/`match_expression`) or
    /// non-null-ness (`match_level`/`matched_type`).
    pub matched: Option<bool>,
    /// Warning wire-names (§6) expected to have fired, in any order.
    #[serde(default)]
    pub warnings: Vec<String>,
    /// Whether a `match_expression`/force-with-error case is expected to
    /// report a user-facing error.
    pub error: Option<bool>,
}

// ---------------------------------------------------------------------
// Type specs
// ---------------------------------------------------------------------

#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "kind")]
pub enum TypeSpec {
    #[serde(rename = "sint")]
    SInt { width: u32 },
    #[serde(rename = "uint")]
    UInt { width: u32 },
    #[serde(rename = "float32")]
    Float32,
    #[serde(rename = "float64")]
    Float64,
    #[serde(rename = "u8char")]
    U8Char,
    #[serde(rename = "bool")]
    Bool,
    #[serde(rename = "str")]
    Str,
    #[serde(rename = "null_t")]
    NullT,
    #[serde(rename = "void")]
    Void,
    #[serde(rename = "auto")]
    Auto,
    #[serde(rename = "typename")]
    Typename,
    #[serde(rename = "enum")]
    Enum { name: String, signed: bool, width: u32, values: Vec<(String, u64)> },
    #[serde(rename = "tuple")]
    Tuple { elements: Vec<TypeSpec> },
    #[serde(rename = "function")]
    Function { params: Vec<TypeSpec>, returns: Box<TypeSpec> },
    #[serde(rename = "mut")]
    Mut { inner: Box<TypeSpec> },
    #[serde(rename = "lvalue_reference")]
    LvalueReference { inner: Box<TypeSpec> },
    #[serde(rename = "move_reference")]
    MoveReference { inner: Box<TypeSpec> },
    #[serde(rename = "auto_reference")]
    AutoReference { inner: Box<TypeSpec> },
    #[serde(rename = "auto_reference_mut")]
    AutoReferenceMut { inner: Box<TypeSpec> },
    #[serde(rename = "pointer")]
    Pointer { inner: Box<TypeSpec> },
    #[serde(rename = "optional")]
    Optional { inner: Box<TypeSpec> },
    /// `size == 0` means "not yet known" (§3.2), matching `Modifier::Array`.
    #[serde(rename = "array")]
    Array { size: u64, inner: Box<TypeSpec> },
    #[serde(rename = "array_slice")]
    ArraySlice { inner: Box<TypeSpec> },
    #[serde(rename = "variadic")]
    Variadic { inner: Box<TypeSpec> },
}

pub fn build_type(spec: &TypeSpec, types: &mut TypeArena) -> TypeId {
    match spec {
        TypeSpec::SInt { width } => {
            types.intern_terminal(Terminator::Base(BaseTypeKind::SInt(int_width(*width))))
        }
        TypeSpec::UInt { width } => {
            types.intern_terminal(Terminator::Base(BaseTypeKind::UInt(int_width(*width))))
        }
        TypeSpec::Float32 => types.intern_terminal(Terminator::Base(BaseTypeKind::Float32)),
        TypeSpec::Float64 => types.intern_terminal(Terminator::Base(BaseTypeKind::Float64)),
        TypeSpec::U8Char => types.intern_terminal(Terminator::Base(BaseTypeKind::U8Char)),
        TypeSpec::Bool => types.intern_terminal(Terminator::Base(BaseTypeKind::Bool)),
        TypeSpec::Str => types.intern_terminal(Terminator::Base(BaseTypeKind::Str)),
        TypeSpec::NullT => types.intern_terminal(Terminator::Base(BaseTypeKind::NullT)),
        TypeSpec::Void => types.intern_terminal(Terminator::Void),
        TypeSpec::Auto => types.intern_terminal(Terminator::Auto),
        TypeSpec::Typename => types.intern_terminal(Terminator::Typename),
        TypeSpec::Enum { name, signed, width, values } => {
            let decl = std::rc::Rc::new(EnumDecl {
                name: name.clone(),
                underlying_signed: *signed,
                underlying_width: int_width(*width),
                named_values: values.clone(),
            });
            types.intern_terminal(Terminator::Base(BaseTypeKind::Enum(decl)))
        }
        TypeSpec::Tuple { elements } => {
            let ids = elements.iter().map(|e| build_type(e, types)).collect();
            types.intern_terminal(Terminator::Tuple(ids))
        }
        TypeSpec::Function { params, returns } => {
            let params = params.iter().map(|p| build_type(p, types)).collect();
            let return_type = build_type(returns, types);
            types.intern_terminal(Terminator::Function {
                cc: CallingConvention::Default,
                params,
                return_type,
            })
        }
        TypeSpec::Mut { inner } => wrap(spec_inner_first(inner, types), Modifier::Mut, types),
        TypeSpec::LvalueReference { inner } => {
            wrap(spec_inner_first(inner, types), Modifier::LvalueReference, types)
        }
        TypeSpec::MoveReference { inner } => {
            wrap(spec_inner_first(inner, types), Modifier::MoveReference, types)
        }
        TypeSpec::AutoReference { inner } => {
            wrap(spec_inner_first(inner, types), Modifier::AutoReference, types)
        }
        TypeSpec::AutoReferenceMut { inner } => {
            wrap(spec_inner_first(inner, types), Modifier::AutoReferenceMut, types)
        }
        TypeSpec::Pointer { inner } => wrap(spec_inner_first(inner, types), Modifier::Pointer, types),
        TypeSpec::Optional { inner } => wrap(spec_inner_first(inner, types), Modifier::Optional, types),
        TypeSpec::Array { size, inner } => {
            wrap(spec_inner_first(inner, types), Modifier::Array(*size), types)
        }
        TypeSpec::ArraySlice { inner } => {
            wrap(spec_inner_first(inner, types), Modifier::ArraySlice, types)
        }
        TypeSpec::Variadic { inner } => wrap(spec_inner_first(inner, types), Modifier::Variadic, types),
    }
}

/// Builds the inner type first so the `wrap` call below only has to attach
/// one modifier; kept as a named helper so each wrapper arm above reads as
/// "wrap(inner, modifier)" rather than repeating the two-step dance.
fn spec_inner_first(inner: &TypeSpec, types: &mut TypeArena) -> TypeId {
    build_type(inner, types)
}

fn wrap(base: TypeId, modifier: Modifier, types: &mut TypeArena) -> TypeId {
    types.wrap(modifier, base)
}

fn int_width(bits: u32) -> IntWidth {
    match bits {
        8 => IntWidth::W8,
        16 => IntWidth::W16,
        32 => IntWidth::W32,
        64 => IntWidth::W64,
        other => panic!("unsupported integer width {other} (expected 8/16/32/64)"),
    }
}

// ---------------------------------------------------------------------
// Expression specs
// ---------------------------------------------------------------------

#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "kind")]
pub enum ExprSpec {
    #[serde(rename = "int")]
    Int { value: i64 },
    #[serde(rename = "uint")]
    UInt { value: u64 },
    #[serde(rename = "float32")]
    Float32 { value: f32 },
    #[serde(rename = "float64")]
    Float64 { value: f64 },
    #[serde(rename = "bool")]
    Bool { value: bool },
    #[serde(rename = "char")]
    Char { value: char },
    #[serde(rename = "str")]
    Str { value: String },
    #[serde(rename = "null")]
    Null,
    /// Looks up `name` in the fixture's `consteval_vars` table (§4.2.2
    /// "identifiers fold only if the declaration is a consteval variable
    /// with a resolved initializer").
    #[serde(rename = "ident")]
    Ident { name: String },
    /// `result_type` sets the node's own resolved type, which is what the
    /// safe-arithmetic layer reads for signedness/width (§4.2.2); omit it
    /// for the `sint`/64-bit default.
    #[serde(rename = "unary")]
    Unary { op: UnOpSpec, operand: Box<ExprSpec>, result_type: Option<TypeSpec> },
    #[serde(rename = "binary")]
    Binary {
        op: BinOpSpec,
        lhs: Box<ExprSpec>,
        rhs: Box<ExprSpec>,
        result_type: Option<TypeSpec>,
    },
    #[serde(rename = "cast")]
    Cast { dest: TypeSpec, operand: Box<ExprSpec>, explicit: bool },
    #[serde(rename = "intrinsic")]
    Intrinsic { name: String, args: Vec<ExprSpec> },
    #[serde(rename = "subscript")]
    Subscript { base: Box<ExprSpec>, index: Box<ExprSpec> },
    #[serde(rename = "if")]
    If {
        condition: Box<ExprSpec>,
        #[serde(default)]
        is_consteval_if: bool,
        then_branch: Box<ExprSpec>,
        else_branch: Option<Box<ExprSpec>>,
    },
    #[serde(rename = "switch")]
    Switch { scrutinee: Box<ExprSpec>, arms: Vec<SwitchArmSpec> },
    #[serde(rename = "compound")]
    Compound { has_preceding_statements: bool, final_expr: Option<Box<ExprSpec>> },
    #[serde(rename = "tuple")]
    Tuple { elements: Vec<ExprSpec> },
    #[serde(rename = "typename_expr")]
    TypenameExpr { ty: TypeSpec },
}

#[derive(Debug, Deserialize, Clone)]
pub struct SwitchArmSpec {
    pub pattern: Option<ExprSpec>,
    pub body: Box<ExprSpec>,
    #[serde(default)]
    pub is_noreturn: bool,
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum UnOpSpec {
    Neg,
    Not,
    BitNot,
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum BinOpSpec {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    And,
    Or,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl From<UnOpSpec> for UnOp {
    fn from(v: UnOpSpec) -> UnOp {
        match v {
            UnOpSpec::Neg => UnOp::Neg,
            UnOpSpec::Not => UnOp::Not,
            UnOpSpec::BitNot => UnOp::BitNot,
        }
    }
}

impl From<BinOpSpec> for BinOp {
    fn from(v: BinOpSpec) -> BinOp {
        match v {
            BinOpSpec::Add => BinOp::Add,
            BinOpSpec::Sub => BinOp::Sub,
            BinOpSpec::Mul => BinOp::Mul,
            BinOpSpec::Div => BinOp::Div,
            BinOpSpec::Rem => BinOp::Rem,
            BinOpSpec::BitAnd => BinOp::BitAnd,
            BinOpSpec::BitOr => BinOp::BitOr,
            BinOpSpec::BitXor => BinOp::BitXor,
            BinOpSpec::Shl => BinOp::Shl,
            BinOpSpec::Shr => BinOp::Shr,
            BinOpSpec::And => BinOp::And,
            BinOpSpec::Or => BinOp::Or,
            BinOpSpec::Eq => BinOp::Eq,
            BinOpSpec::Ne => BinOp::Ne,
            BinOpSpec::Lt => BinOp::Lt,
            BinOpSpec::Le => BinOp::Le,
            BinOpSpec::Gt => BinOp::Gt,
            BinOpSpec::Ge => BinOp::Ge,
        }
    }
}

/// Recognised intrinsic identities addressable from a fixture by name; a
/// subset of the ~145-member table (§4.2.3), matching the representative
/// set `semcore::intrinsics` models.
fn lookup_intrinsic(name: &str) -> Option<Intrinsic> {
    use Intrinsic::*;
    Some(match name {
        "str_size" => StrSize,
        "str_begin" => StrBegin,
        "str_end" => StrEnd,
        "slice_size" => SliceSize,
        "optional_has_value" => OptionalHasValue,
        "pointer_is_null" => PointerIsNull,
        "is_const" => IsConst,
        "is_pointer" => IsPointer,
        "is_optional" => IsOptional,
        "remove_pointer" => RemovePointer,
        "typename_as_str" => TypenameAsStr,
        "is_default_constructible" => IsDefaultConstructible,
        "is_copy_constructible" => IsCopyConstructible,
        "is_trivially_destructible" => IsTriviallyDestructible,
        "compile_error" => CompileError,
        "compile_warning" => CompileWarning,
        "is_option_set" => IsOptionSet,
        "is_comptime" => IsComptime,
        "exp" => Exp,
        "log" => Log,
        "pow" => Pow,
        "sqrt" => Sqrt,
        "sin" => Sin,
        "cos" => Cos,
        "atan2" => Atan2,
        "tgamma" => Tgamma,
        "bitreverse" => Bitreverse,
        "popcount" => Popcount,
        "byteswap" => Byteswap,
        "clz" => Clz,
        "ctz" => Ctz,
        "fshl" => Fshl,
        "fshr" => Fshr,
        "default_sint" => DefaultSInt,
        "default_uint" => DefaultUInt,
        "default_float32" => DefaultFloat32,
        "default_float64" => DefaultFloat64,
        "default_bool" => DefaultBool,
        "op_add" => OpAdd,
        "op_sub" => OpSub,
        "op_mul" => OpMul,
        "op_div" => OpDiv,
        "op_rem" => OpRem,
        _ => return None,
    })
}

/// Declarations available to `ExprSpec::Ident`, keyed by name. Populated
/// from the fixture's top-level `consteval_vars` table.
pub type ConstevalVars = HashMap<String, ConstevalVarSpec>;

#[derive(Debug, Deserialize, Clone)]
pub struct ConstevalVarSpec {
    #[serde(rename = "type")]
    pub ty: TypeSpec,
    /// `None` means declared but unresolved — folding such an identifier
    /// always fails (§4.2.2).
    pub value: Option<ExprSpec>,
}

fn dummy_span() -> SourceSpan {
    SourceSpan { begin: 0, pivot: 0, end: 1 }
}

/// Builds a literal-only `Value` out of an `ExprSpec`, for use as a
/// resolved `consteval` initializer or a switch-arm pattern. Panics (a
/// fixture bug, not a core invariant) if `spec` isn't a literal shape.
fn literal_value(spec: &ExprSpec, types: &mut TypeArena) -> Value {
    match spec {
        ExprSpec::Int { value } => Value::SInt(*value),
        ExprSpec::UInt { value } => Value::UInt(*value),
        ExprSpec::Float32 { value } => Value::Float32(*value),
        ExprSpec::Float64 { value } => Value::Float64(*value),
        ExprSpec::Bool { value } => Value::Bool(*value),
        ExprSpec::Char { value } => Value::U8Char(*value),
        ExprSpec::Str { value } => Value::Str(Rc::from(value.as_str())),
        ExprSpec::Null => Value::Null,
        ExprSpec::TypenameExpr { ty } => Value::Type(build_type(ty, types)),
        other => panic!("{other:?} is not a literal-value expression spec"),
    }
}

pub fn build_expr(spec: &ExprSpec, types: &mut TypeArena, vars: &ConstevalVars) -> Expr {
    let span = dummy_span();
    match spec {
        ExprSpec::Int { value } => {
            Expr::new(ExprKind::Literal(Literal::Int(*value)), span, ValueCategory::Literal)
        }
        ExprSpec::UInt { value } => {
            Expr::new(ExprKind::Literal(Literal::UInt(*value)), span, ValueCategory::Literal)
        }
        ExprSpec::Float32 { value } => {
            Expr::new(ExprKind::Literal(Literal::Float32(*value)), span, ValueCategory::Literal)
        }
        ExprSpec::Float64 { value } => {
            Expr::new(ExprKind::Literal(Literal::Float64(*value)), span, ValueCategory::Literal)
        }
        ExprSpec::Bool { value } => {
            Expr::new(ExprKind::Literal(Literal::Bool(*value)), span, ValueCategory::Literal)
        }
        ExprSpec::Char { value } => {
            Expr::new(ExprKind::Literal(Literal::Char(*value)), span, ValueCategory::Literal)
        }
        ExprSpec::Str { value } => Expr::new(
            ExprKind::Literal(Literal::Str(Rc::from(value.as_str()))),
            span,
            ValueCategory::Literal,
        ),
        ExprSpec::Null => Expr::new(ExprKind::Literal(Literal::Null), span, ValueCategory::Literal),
        ExprSpec::Ident { name } => {
            let decl = vars.get(name).unwrap_or_else(|| panic!("unknown consteval_var `{name}`"));
            let declared_type = build_type(&decl.ty, types);
            let resolved_initializer =
                decl.value.as_ref().map(|v| literal_value(v, types));
            Expr::new(
                ExprKind::Identifier(DeclRef {
                    name: Rc::from(name.as_str()),
                    is_consteval: true,
                    resolved_initializer,
                    declared_type: Some(declared_type),
                }),
                span,
                ValueCategory::Lvalue,
            )
            .with_type(declared_type)
        }
        ExprSpec::Unary { op, operand, result_type } => {
            let e = Expr::new(
                ExprKind::Unary {
                    op: (*op).into(),
                    operand: Box::new(build_expr(operand, types, vars)),
                },
                span,
                ValueCategory::Rvalue,
            );
            match result_type {
                Some(t) => e.with_type(build_type(t, types)),
                None => e,
            }
        }
        ExprSpec::Binary { op, lhs, rhs, result_type } => {
            let e = Expr::new(
                ExprKind::Binary {
                    op: (*op).into(),
                    lhs: Box::new(build_expr(lhs, types, vars)),
                    rhs: Box::new(build_expr(rhs, types, vars)),
                },
                span,
                ValueCategory::Rvalue,
            );
            match result_type {
                Some(t) => e.with_type(build_type(t, types)),
                None => e,
            }
        }
        ExprSpec::Cast { dest, operand, explicit } => {
            let dest_id = build_type(dest, types);
            Expr::new(
                ExprKind::Cast(CastExpr {
                    dest: dest_id,
                    operand: Box::new(build_expr(operand, types, vars)),
                    explicit: *explicit,
                }),
                span,
                ValueCategory::Rvalue,
            )
            .with_type(dest_id)
        }
        ExprSpec::Intrinsic { name, args } => {
            let intrinsic = lookup_intrinsic(name)
                .unwrap_or_else(|| panic!("unknown intrinsic `{name}`"));
            Expr::new(
                ExprKind::Call {
                    intrinsic: Some(intrinsic),
                    callee: None,
                    args: args.iter().map(|a| build_expr(a, types, vars)).collect(),
                },
                span,
                ValueCategory::Rvalue,
            )
        }
        ExprSpec::Subscript { base, index } => Expr::new(
            ExprKind::Subscript {
                base: Box::new(build_expr(base, types, vars)),
                index: Box::new(build_expr(index, types, vars)),
            },
            span,
            ValueCategory::Lvalue,
        ),
        ExprSpec::If { condition, is_consteval_if, then_branch, else_branch } => Expr::new(
            ExprKind::If {
                condition: Box::new(build_expr(condition, types, vars)),
                is_consteval_if: *is_consteval_if,
                then_branch: Box::new(build_expr(then_branch, types, vars)),
                else_branch: else_branch.as_ref().map(|e| Box::new(build_expr(e, types, vars))),
            },
            span,
            ValueCategory::Rvalue,
        ),
        ExprSpec::Switch { scrutinee, arms } => Expr::new(
            ExprKind::Switch {
                scrutinee: Box::new(build_expr(scrutinee, types, vars)),
                arms: arms
                    .iter()
                    .map(|arm| SwitchArm {
                        pattern: arm.pattern.as_ref().map(|p| literal_value(p, types)),
                        body: build_expr(&arm.body, types, vars),
                        is_noreturn: arm.is_noreturn,
                    })
                    .collect(),
            },
            span,
            ValueCategory::Rvalue,
        ),
        ExprSpec::Compound { has_preceding_statements, final_expr } => Expr::new(
            ExprKind::Compound {
                has_preceding_statements: *has_preceding_statements,
                final_expr: final_expr.as_ref().map(|e| Box::new(build_expr(e, types, vars))),
            },
            span,
            ValueCategory::Rvalue,
        ),
        ExprSpec::Tuple { elements } => Expr::new(
            ExprKind::TupleLiteral(elements.iter().map(|e| build_expr(e, types, vars)).collect()),
            span,
            ValueCategory::Rvalue,
        ),
        ExprSpec::TypenameExpr { ty } => {
            let id = build_type(ty, types);
            Expr::new(ExprKind::TypenameExpr(id), span, ValueCategory::Rvalue).with_type(id)
        }
    }
}
