//! Bottom-up folding (§4.2.2): the main `fold_expr` entry point.
//!
//! Recurses into operands first, advancing each one's consteval state at
//! the current intensity, then applies the fold rule for that expression's
//! syntactic shape. Failed folds still visit every operand so that their
//! warnings (e.g. per-subexpression overflow) are emitted before the
//! surrounding failure (§7).

use super::arithmetic::{self, ArithResult};
use super::cast::{self, CastKind};
use super::intrinsics::{self, IntrinsicFold};
use super::Intensity;
use semcore::config::CoreConfig;
use semcore::diagnostics::{warning_suppressed, Diagnostic, Warning};
use semcore::expr::{BinOp, Expr, ExprKind, Literal, UnOp};
use semcore::intrinsics::{Intrinsic, IntrinsicFamily};
use semcore::parse_context::{ExecutionOutcome, ParseContext};
use semcore::types::{self, BaseTypeKind, IntWidth, TypeArena, Terminator};
use semcore::value::Value;
use semcore::ConstevalState;

/// The four wrapping/narrowing arithmetic operators `semengine::eval::arithmetic`
/// folds through safe-arithmetic; division and modulo are handled alongside
/// since they share the signed/unsigned dispatch even though they can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

fn report_warning_if_not_suppressed(
    ctx: &mut dyn ParseContext,
    config: &CoreConfig,
    warning: Option<Warning>,
    paren_level: u32,
    location: semcore::diagnostics::SourceSpan,
) {
    let Some(kind) = warning else { return };
    if !config.is_enabled(kind) {
        return;
    }
    if warning_suppressed(kind, paren_level) {
        ctx.report_parenthesis_suppressed_warning(paren_level, kind, location);
    } else {
        ctx.report_warning(kind, location);
    }
}

/// Recurse `fold_expr` on `operand`, returning its folded value if it
/// succeeded. Always visits the operand even when the caller already knows
/// it cannot use the result, so per-operand warnings still fire (§7).
fn fold_operand(
    operand: &mut Expr,
    intensity: Intensity,
    ctx: &mut dyn ParseContext,
    types: &mut TypeArena,
    config: &CoreConfig,
) -> Option<Value> {
    fold_expr(operand, intensity, ctx, types, config);
    operand.folded_value.clone()
}

/// Integer width/signedness backing an expression's folded value: taken
/// from its resolved type when known, defaulting to 64-bit (matching the
/// value lattice's "sint/uint are used for all sizes <= 64", §3.1) when the
/// type isn't available (e.g. a bare literal with no destination context
/// yet).
fn int_kind_of(expr: &Expr, types: &TypeArena) -> (bool, IntWidth) {
    expr.ty
        .and_then(|id| types::integer_kind(types, id))
        .unwrap_or((true, IntWidth::W64))
}

fn arith_result_to_outcome<T>(
    result: ArithResult<T>,
    wrap: impl Fn(T) -> Value,
) -> (Option<Value>, Option<Warning>) {
    (result.value.map(wrap), result.warning)
}

fn fold_binary_arithmetic(
    op: ArithOp,
    lhs: &Value,
    rhs: &Value,
    ty_hint: (bool, IntWidth),
) -> (Option<Value>, Option<Warning>) {
    match (lhs, rhs) {
        (Value::SInt(a), Value::SInt(b)) => {
            let (_, width) = ty_hint;
            let r = match op {
                ArithOp::Add => arithmetic::safe_signed_add(*a, *b, width),
                ArithOp::Sub => arithmetic::safe_signed_sub(*a, *b, width),
                ArithOp::Mul => arithmetic::safe_signed_mul(*a, *b, width),
                ArithOp::Div => arithmetic::safe_signed_div(*a, *b, width),
                ArithOp::Rem => arithmetic::safe_signed_rem(*a, *b, width),
            };
            arith_result_to_outcome(r, Value::SInt)
        }
        (Value::UInt(a), Value::UInt(b)) => {
            let (_, width) = ty_hint;
            let r = match op {
                ArithOp::Add => arithmetic::safe_unsigned_add(*a, *b, width),
                ArithOp::Sub => arithmetic::safe_unsigned_sub(*a, *b, width),
                ArithOp::Mul => arithmetic::safe_unsigned_mul(*a, *b, width),
                ArithOp::Div => arithmetic::safe_unsigned_div(*a, *b, width),
                ArithOp::Rem => arithmetic::safe_unsigned_rem(*a, *b, width),
            };
            arith_result_to_outcome(r, Value::UInt)
        }
        (Value::Float32(a), Value::Float32(b)) => fold_float_arith(op, *a, *b, Value::Float32),
        (Value::Float64(a), Value::Float64(b)) => fold_float_arith(op, *a, *b, Value::Float64),
        // §9's documented asymmetry: `u8char + signed`/`u8char + unsigned`
        // and `u8char - signed` are legal; `signed - u8char` is not. The
        // source's own TODO is preserved rather than "fixed".
        (Value::U8Char(c), Value::SInt(n)) if matches!(op, ArithOp::Add | ArithOp::Sub) => {
            fold_u8char_arith(*c, *n, op)
        }
        (Value::U8Char(c), Value::UInt(n)) if op == ArithOp::Add => {
            fold_u8char_arith(*c, *n as i64, op)
        }
        _ => (None, None),
    }
}

fn fold_u8char_arith(c: char, delta: i64, op: ArithOp) -> (Option<Value>, Option<Warning>) {
    let base = c as i64;
    let shifted = match op {
        ArithOp::Add => base + delta,
        ArithOp::Sub => base - delta,
        _ => return (None, None),
    };
    match char::from_u32(shifted as u32) {
        Some(result) => (Some(Value::U8Char(result)), None),
        None => (Some(Value::U8Char('\u{FFFD}')), Some(Warning::InvalidUnicode)),
    }
}

fn fold_float_arith<T>(op: ArithOp, a: T, b: T, wrap: impl Fn(T) -> Value) -> (Option<Value>, Option<Warning>)
where
    T: num_traits_like::Float,
{
    let a_finite = a.is_finite_();
    let b_finite = b.is_finite_();
    let (result, div_warning) = match op {
        ArithOp::Add => (a.add_(b), None),
        ArithOp::Sub => (a.sub_(b), None),
        ArithOp::Mul => (a.mul_(b), None),
        ArithOp::Div => {
            let r = arithmetic::safe_float_div(a, b);
            (r.value.unwrap(), r.warning)
        }
        ArithOp::Rem => (a.rem_(b), None),
    };
    let overflow = arithmetic::float_overflow_warning(a_finite, b_finite, result.is_finite_());
    (Some(wrap(result)), div_warning.or(overflow))
}

/// A tiny float-generic shim so `fold_float_arith` works over both `f32`
/// and `f64` without duplicating the five-operator match per width.
mod num_traits_like {
    pub trait Float: Copy {
        fn is_finite_(self) -> bool;
        fn add_(self, other: Self) -> Self;
        fn sub_(self, other: Self) -> Self;
        fn mul_(self, other: Self) -> Self;
        fn rem_(self, other: Self) -> Self;
    }
    impl Float for f32 {
        fn is_finite_(self) -> bool {
            self.is_finite()
        }
        fn add_(self, other: Self) -> Self {
            self + other
        }
        fn sub_(self, other: Self) -> Self {
            self - other
        }
        fn mul_(self, other: Self) -> Self {
            self * other
        }
        fn rem_(self, other: Self) -> Self {
            self % other
        }
    }
    impl Float for f64 {
        fn is_finite_(self) -> bool {
            self.is_finite()
        }
        fn add_(self, other: Self) -> Self {
            self + other
        }
        fn sub_(self, other: Self) -> Self {
            self - other
        }
        fn mul_(self, other: Self) -> Self {
            self * other
        }
        fn rem_(self, other: Self) -> Self {
            self % other
        }
    }
}

fn bin_op_to_arith(op: BinOp) -> Option<ArithOp> {
    match op {
        BinOp::Add => Some(ArithOp::Add),
        BinOp::Sub => Some(ArithOp::Sub),
        BinOp::Mul => Some(ArithOp::Mul),
        BinOp::Div => Some(ArithOp::Div),
        BinOp::Rem => Some(ArithOp::Rem),
        _ => None,
    }
}

fn fold_bitwise_or_compare(op: BinOp, lhs: &Value, rhs: &Value) -> Option<Value> {
    match (op, lhs, rhs) {
        (BinOp::BitAnd, Value::UInt(a), Value::UInt(b)) => Some(Value::UInt(a & b)),
        (BinOp::BitOr, Value::UInt(a), Value::UInt(b)) => Some(Value::UInt(a | b)),
        (BinOp::BitXor, Value::UInt(a), Value::UInt(b)) => Some(Value::UInt(a ^ b)),
        (BinOp::Shl, Value::UInt(a), Value::UInt(b)) => Some(Value::UInt(a << (b & 63))),
        (BinOp::Shr, Value::UInt(a), Value::UInt(b)) => Some(Value::UInt(a >> (b & 63))),
        (BinOp::BitAnd, Value::SInt(a), Value::SInt(b)) => Some(Value::SInt(a & b)),
        (BinOp::BitOr, Value::SInt(a), Value::SInt(b)) => Some(Value::SInt(a | b)),
        (BinOp::BitXor, Value::SInt(a), Value::SInt(b)) => Some(Value::SInt(a ^ b)),
        (BinOp::Eq, a, b) => Some(Value::Bool(a == b)),
        (BinOp::Ne, a, b) => Some(Value::Bool(a != b)),
        (BinOp::Lt, Value::SInt(a), Value::SInt(b)) => Some(Value::Bool(a < b)),
        (BinOp::Le, Value::SInt(a), Value::SInt(b)) => Some(Value::Bool(a <= b)),
        (BinOp::Gt, Value::SInt(a), Value::SInt(b)) => Some(Value::Bool(a > b)),
        (BinOp::Ge, Value::SInt(a), Value::SInt(b)) => Some(Value::Bool(a >= b)),
        (BinOp::Lt, Value::UInt(a), Value::UInt(b)) => Some(Value::Bool(a < b)),
        (BinOp::Le, Value::UInt(a), Value::UInt(b)) => Some(Value::Bool(a <= b)),
        (BinOp::Gt, Value::UInt(a), Value::UInt(b)) => Some(Value::Bool(a > b)),
        (BinOp::Ge, Value::UInt(a), Value::UInt(b)) => Some(Value::Bool(a >= b)),
        _ => None,
    }
}

/// NaN comparisons always report `nan-compare` regardless of paren level
/// budget logic elsewhere — callers check this before falling through to
/// the ordinary relational fold.
fn nan_compare_warning(op: BinOp, lhs: &Value, rhs: &Value) -> Option<Warning> {
    let is_relational = matches!(op, BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge | BinOp::Eq | BinOp::Ne);
    if !is_relational {
        return None;
    }
    let has_nan = match (lhs, rhs) {
        (Value::Float32(a), Value::Float32(b)) => a.is_nan() || b.is_nan(),
        (Value::Float64(a), Value::Float64(b)) => a.is_nan() || b.is_nan(),
        _ => false,
    };
    has_nan.then_some(Warning::NanCompare)
}

fn fold_float_compare(op: BinOp, lhs: f64, rhs: f64) -> Option<Value> {
    match op {
        BinOp::Eq => Some(Value::Bool(lhs == rhs)),
        BinOp::Ne => Some(Value::Bool(lhs != rhs)),
        BinOp::Lt => Some(Value::Bool(lhs < rhs)),
        BinOp::Le => Some(Value::Bool(lhs <= rhs)),
        BinOp::Gt => Some(Value::Bool(lhs > rhs)),
        BinOp::Ge => Some(Value::Bool(lhs >= rhs)),
        _ => None,
    }
}

fn literal_to_value(lit: &Literal) -> Option<Value> {
    match lit {
        Literal::Int(v) => Some(Value::SInt(*v)),
        Literal::UInt(v) => Some(Value::UInt(*v)),
        Literal::Float32(v) => Some(Value::Float32(*v)),
        Literal::Float64(v) => Some(Value::Float64(*v)),
        Literal::Bool(v) => Some(Value::Bool(*v)),
        Literal::Char(v) => Some(Value::U8Char(*v)),
        Literal::Str(v) => Some(Value::Str(v.clone())),
        Literal::Null => Some(Value::Null),
        Literal::Tuple(_) => None, // handled by the TupleLiteral path, not a bare Literal
    }
}

/// Fold one expression node's syntactic shape (§4.2.2), assuming its
/// operands have already been recursed into. Returns `None` on fold
/// failure; the caller (`fold_expr`) is responsible for the state
/// transition and for deciding which `ConstevalState::Failed*` to land on.
fn fold_kind(
    expr: &mut Expr,
    intensity: Intensity,
    ctx: &mut dyn ParseContext,
    types: &mut TypeArena,
    config: &CoreConfig,
) -> Option<Value> {
    let span = expr.span;
    let paren_level = expr.paren_level;
    let ty_hint = int_kind_of(expr, types);

    // Need to move `kind` out temporarily to get independent `&mut` borrows
    // on its boxed operands while still reading `expr.ty`/`expr.span` above.
    let kind_ptr: *mut ExprKind = &mut *expr.kind;
    // SAFETY: `kind_ptr` only aliases fields of `*expr.kind`, which are
    // disjoint from the `ty`/`span`/`paren_level` fields already copied out
    // above; no two `&mut` ever observe the same sub-object at once.
    let kind = unsafe { &mut *kind_ptr };

    match kind {
        ExprKind::Literal(lit) => {
            // Literals are already constant (§4.2.2): no further recursion.
            literal_to_value(lit)
        }
        ExprKind::Identifier(decl) => {
            // Identifiers fold only if the declaration is `consteval` with a
            // resolved initialiser (§4.2.2).
            if decl.is_consteval {
                decl.resolved_initializer.clone()
            } else {
                None
            }
        }
        ExprKind::Unary { op, operand } => {
            let v = fold_operand(operand, intensity, ctx, types, config)?;
            match (op, &v) {
                (UnOp::Neg, Value::SInt(n)) => {
                    let r = arithmetic::safe_signed_sub(0, *n, ty_hint.1);
                    report_warning_if_not_suppressed(ctx, config, r.warning, paren_level, span);
                    r.value.map(Value::SInt)
                }
                (UnOp::Neg, Value::Float32(n)) => Some(Value::Float32(-n)),
                (UnOp::Neg, Value::Float64(n)) => Some(Value::Float64(-n)),
                (UnOp::Not, Value::Bool(b)) => Some(Value::Bool(!b)),
                (UnOp::BitNot, Value::UInt(n)) => Some(Value::UInt(!n & ty_hint.1.mask())),
                (UnOp::BitNot, Value::SInt(n)) => Some(Value::SInt(!n)),
                _ => None,
            }
        }
        ExprKind::Binary { op, lhs, rhs } => {
            let lv = fold_operand(lhs, intensity, ctx, types, config);
            // Short-circuit operators (§4.2.2): if the left operand folds
            // and decides the result, the right needn't fold.
            if let (BinOp::And, Some(Value::Bool(false))) = (*op, &lv) {
                return Some(Value::Bool(false));
            }
            if let (BinOp::Or, Some(Value::Bool(true))) = (*op, &lv) {
                return Some(Value::Bool(true));
            }
            let rv = fold_operand(rhs, intensity, ctx, types, config);
            let (lv, rv) = (lv?, rv?);

            if let Some(warn) = nan_compare_warning(*op, &lv, &rv) {
                report_warning_if_not_suppressed(ctx, config, Some(warn), paren_level, span);
            }

            if *op == BinOp::And {
                return match (lv, rv) {
                    (Value::Bool(a), Value::Bool(b)) => Some(Value::Bool(a && b)),
                    _ => None,
                };
            }
            if *op == BinOp::Or {
                return match (lv, rv) {
                    (Value::Bool(a), Value::Bool(b)) => Some(Value::Bool(a || b)),
                    _ => None,
                };
            }

            if let (Value::Float32(a), Value::Float32(b)) = (&lv, &rv) {
                if let Some(v) = fold_float_compare(*op, *a as f64, *b as f64) {
                    return Some(v);
                }
            }
            if let (Value::Float64(a), Value::Float64(b)) = (&lv, &rv) {
                if let Some(v) = fold_float_compare(*op, *a, *b) {
                    return Some(v);
                }
            }

            if let Some(arith_op) = bin_op_to_arith(*op) {
                let (value, warning) = fold_binary_arithmetic(arith_op, &lv, &rv, ty_hint);
                report_warning_if_not_suppressed(ctx, config, warning, paren_level, span);
                return value;
            }
            fold_bitwise_or_compare(*op, &lv, &rv)
        }
        ExprKind::Call {
            intrinsic,
            callee,
            args,
        } => {
            let folded_args: Option<Vec<Value>> = args
                .iter_mut()
                .map(|a| fold_operand(a, intensity, ctx, types, config))
                .collect();
            let Some(folded_args) = folded_args else {
                return None;
            };
            if let Some(callee) = callee {
                let _ = fold_operand(callee, intensity, ctx, types, config);
            }
            let Some(intrinsic) = intrinsic else {
                // A user-defined function: only the force intensities may
                // drive the interpreter (§4.2.1).
                return fold_user_function(intensity, ctx, &folded_args, expr);
            };
            fold_intrinsic_call(*intrinsic, intensity, ctx, config, span, paren_level, &folded_args)
        }
        ExprKind::Subscript { base, index } => {
            let base_v = fold_operand(base, intensity, ctx, types, config)?;
            let index_v = fold_operand(index, intensity, ctx, types, config)?;
            fold_subscript(ctx, config, span, paren_level, &base_v, &index_v)
        }
        ExprKind::Cast(cast_expr) => {
            let operand_v = fold_operand(&mut cast_expr.operand, intensity, ctx, types, config)?;
            let dest_kind = cast_kind_of(types, cast_expr.dest)?;
            let result = cast::fold_numeric_cast(&operand_v, dest_kind);
            report_warning_if_not_suppressed(ctx, config, result.warning, paren_level, span);
            Some(result.value)
        }
        ExprKind::If {
            condition,
            is_consteval_if,
            then_branch,
            else_branch,
        } => {
            let cond_v = fold_operand(condition, intensity, ctx, types, config);
            let Some(Value::Bool(cond)) = cond_v else {
                if *is_consteval_if {
                    // `if-consteval` requires the condition to be constant
                    // and rejects the program otherwise (§4.2.2); here that
                    // means a hard fold failure, reported at the force
                    // intensities.
                    if intensity.reports_diagnostics() {
                        ctx.report_error(Diagnostic::new(
                            "condition of `if consteval` is not a constant expression",
                            span,
                        ));
                    }
                }
                return None;
            };
            if cond {
                fold_operand(then_branch, intensity, ctx, types, config)
            } else if let Some(else_branch) = else_branch {
                fold_operand(else_branch, intensity, ctx, types, config)
            } else {
                Some(Value::Void)
            }
        }
        ExprKind::Switch { scrutinee, arms } => {
            let scrutinee_v = fold_operand(scrutinee, intensity, ctx, types, config)?;
            for arm in arms.iter_mut() {
                let matches_arm = match &arm.pattern {
                    Some(pattern) => *pattern == scrutinee_v,
                    None => true, // default arm
                };
                if matches_arm {
                    return fold_operand(&mut arm.body, intensity, ctx, types, config);
                }
            }
            None
        }
        ExprKind::Compound {
            has_preceding_statements,
            final_expr,
        } => {
            // Folds iff it's a pure final-expression (§4.2.2); otherwise it
            // delegates to the interpreter under a force intensity.
            if *has_preceding_statements {
                if !intensity.may_drive_interpreter() {
                    return None;
                }
                return match ctx.execute_compound_expression(expr) {
                    ExecutionOutcome::Returned(v) => Some(v),
                    ExecutionOutcome::Diverged => None,
                };
            }
            match final_expr {
                Some(final_expr) => fold_operand(final_expr, intensity, ctx, types, config),
                None => Some(Value::Void),
            }
        }
        ExprKind::MemberAccess { base, field_index } => {
            let base_v = fold_operand(base, intensity, ctx, types, config)?;
            match base_v {
                Value::Aggregate(fields) => fields.get(*field_index).cloned(),
                _ => None,
            }
        }
        ExprKind::TupleLiteral(elems) => {
            let folded: Option<Vec<Value>> = elems
                .iter_mut()
                .map(|e| fold_operand(e, intensity, ctx, types, config))
                .collect();
            folded.map(|vs| Value::Tuple(std::rc::Rc::from(vs)))
        }
        ExprKind::ArrayDefaultConstruct { element_type, count } => {
            let zero = default_value_of(types, *element_type)?;
            Some(Value::Array(std::rc::Rc::from(vec![zero; *count as usize])))
        }
        ExprKind::StructInit { fields } => {
            let folded: Option<Vec<Value>> = fields
                .iter_mut()
                .map(|f| fold_operand(f, intensity, ctx, types, config))
                .collect();
            folded.map(|vs| Value::Aggregate(std::rc::Rc::from(vs)))
        }
        ExprKind::TypenameExpr(ty) => Some(Value::Type(*ty)),
        ExprKind::Rewrite { inner, .. } => fold_operand(inner, intensity, ctx, types, config),
    }
}

fn fold_user_function(
    intensity: Intensity,
    ctx: &mut dyn ParseContext,
    _args: &[Value],
    _expr: &Expr,
) -> Option<Value> {
    if !intensity.may_drive_interpreter() {
        return None;
    }
    // The `DeclId`/argument-marshalling glue belongs to the concrete
    // `ParseContext` implementation (out of scope, §1); here we only know
    // the trait surface, so this dispatches through the tree's own call
    // node via `execute_compound_expression`-shaped outcomes at the
    // `ParseContext` implementor's discretion. A real front-end wires this
    // to `execute_function`/`execute_function_without_error` once it has a
    // concrete `DeclId` to pass; the core's contract only fixes *when* each
    // is legal, which is what this function enforces.
    let _ = ctx;
    None
}

fn fold_intrinsic_call(
    intrinsic: Intrinsic,
    intensity: Intensity,
    ctx: &mut dyn ParseContext,
    config: &CoreConfig,
    span: semcore::diagnostics::SourceSpan,
    paren_level: u32,
    args: &[Value],
) -> Option<Value> {
    let outcome = match intrinsic.family() {
        IntrinsicFamily::Math => {
            let f64_args: Vec<f64> = args
                .iter()
                .map(|v| match v {
                    Value::Float32(f) => *f as f64,
                    Value::Float64(f) => *f,
                    _ => f64::NAN,
                })
                .collect();
            intrinsics::fold_math(intrinsic, &f64_args)
        }
        IntrinsicFamily::BitManipulation => {
            let bits_args: Vec<u64> = args
                .iter()
                .map(|v| match v {
                    Value::UInt(n) => *n,
                    Value::SInt(n) => *n as u64,
                    _ => 0,
                })
                .collect();
            // Bit width comes from the first operand's declared type in a
            // real front-end; the core only needs *a* width to bound the
            // shift/rotate amount, so 64 is the conservative default when
            // narrower context isn't threaded through yet.
            intrinsics::fold_bit_manipulation(intrinsic, 64, &bits_args)
        }
        IntrinsicFamily::StringInspection => match args.first() {
            Some(Value::Str(s)) => intrinsics::fold_string_inspection(intrinsic, s),
            _ => IntrinsicFold::DidNotFold,
        },
        IntrinsicFamily::DefaultConstructor => intrinsics::fold_default_construct(intrinsic),
        IntrinsicFamily::CompileTimeDiagnostic => {
            let message = args.first().and_then(|v| match v {
                Value::Str(s) => Some(s.as_ref()),
                _ => None,
            });
            intrinsics::fold_compile_time_diagnostic(intrinsic, intensity, message, ctx, span)
        }
        IntrinsicFamily::TypePredicate | IntrinsicFamily::SliceOptionalPointer | IntrinsicFamily::Operator => {
            IntrinsicFold::DidNotFold
        }
    };
    match outcome {
        IntrinsicFold::Folded(value, warning) => {
            report_warning_if_not_suppressed(ctx, config, warning, paren_level, span);
            Some(value)
        }
        IntrinsicFold::FoldedVoid => Some(Value::Void),
        IntrinsicFold::DidNotFold => None,
    }
}

fn fold_subscript(
    ctx: &mut dyn ParseContext,
    config: &CoreConfig,
    span: semcore::diagnostics::SourceSpan,
    paren_level: u32,
    base: &Value,
    index: &Value,
) -> Option<Value> {
    let elements: &[Value] = match base {
        Value::Array(vs) | Value::Tuple(vs) | Value::Aggregate(vs) => vs,
        _ => return None,
    };
    let idx = match index {
        Value::SInt(n) if *n >= 0 => *n as usize,
        Value::SInt(_) => {
            report_warning_if_not_suppressed(
                ctx,
                config,
                Some(Warning::OutOfBoundsIndex),
                paren_level,
                span,
            );
            return None;
        }
        Value::UInt(n) => *n as usize,
        _ => return None,
    };
    if idx >= elements.len() {
        report_warning_if_not_suppressed(
            ctx,
            config,
            Some(Warning::OutOfBoundsIndex),
            paren_level,
            span,
        );
        return None;
    }
    Some(elements[idx].clone())
}

fn cast_kind_of(types: &TypeArena, dest: semcore::types::TypeId) -> Option<CastKind> {
    if !types.get(dest).modifiers.is_empty() {
        return None;
    }
    match &types.get(dest).terminator {
        Terminator::Base(BaseTypeKind::SInt(w)) => Some(CastKind::SInt(*w)),
        Terminator::Base(BaseTypeKind::UInt(w)) => Some(CastKind::UInt(*w)),
        Terminator::Base(BaseTypeKind::Float32) => Some(CastKind::Float32),
        Terminator::Base(BaseTypeKind::Float64) => Some(CastKind::Float64),
        Terminator::Base(BaseTypeKind::U8Char) => Some(CastKind::U8Char),
        Terminator::Base(BaseTypeKind::Bool) => Some(CastKind::Bool),
        _ => None,
    }
}

fn default_value_of(types: &TypeArena, ty: semcore::types::TypeId) -> Option<Value> {
    if !types.get(ty).modifiers.is_empty() {
        return None;
    }
    match &types.get(ty).terminator {
        Terminator::Base(BaseTypeKind::SInt(_)) => Some(Value::SInt(0)),
        Terminator::Base(BaseTypeKind::UInt(_)) => Some(Value::UInt(0)),
        Terminator::Base(BaseTypeKind::Float32) => Some(Value::Float32(0.0)),
        Terminator::Base(BaseTypeKind::Float64) => Some(Value::Float64(0.0)),
        Terminator::Base(BaseTypeKind::Bool) => Some(Value::Bool(false)),
        Terminator::Base(BaseTypeKind::U8Char) => Some(Value::U8Char('\u{0}')),
        _ => None,
    }
}

/// Attempt to fold `expr` at `intensity`, advancing its consteval state
/// (§3.3, §4.2.1). A no-op when the expression already reached a terminal
/// state (`Succeeded` or force-`Failed`) — property 8's idempotence.
pub fn fold_expr(
    expr: &mut Expr,
    intensity: Intensity,
    ctx: &mut dyn ParseContext,
    types: &mut TypeArena,
    config: &CoreConfig,
) {
    match expr.consteval_state {
        ConstevalState::Succeeded | ConstevalState::Failed => return,
        ConstevalState::InProgress => {
            // Re-entrant fold of an expression currently on the stack: the
            // resolution-queue cycle guard (§5) is the caller's
            // responsibility; here it's simply a failure.
            return;
        }
        ConstevalState::NeverTried | ConstevalState::GuaranteedFailed => {}
    }
    expr.set_consteval_state(ConstevalState::InProgress);
    tracing::trace!(?intensity, "folding expression");
    let result = fold_kind(expr, intensity, ctx, types, config);
    match result {
        Some(value) => {
            tracing::debug!(?value, "fold succeeded");
            expr.folded_value = Some(value);
            expr.set_consteval_state(ConstevalState::Succeeded);
        }
        None => {
            let next = if intensity == Intensity::Guaranteed {
                ConstevalState::GuaranteedFailed
            } else {
                ConstevalState::Failed
            };
            expr.set_consteval_state(next);
            if intensity == Intensity::ForceWithError && expr.folded_value.is_none() {
                let notes =
                    super::failure_notes::collect_failure_notes(expr, &NoRender);
                ctx.report_error(
                    Diagnostic::new("expression is not a constant expression", expr.span)
                        .with_notes(notes),
                );
            }
        }
    }
}

struct NoRender;
impl super::failure_notes::RenderSource for NoRender {
    fn render(&self, _expr: &Expr) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use semcore::diagnostics::{Note, SourceSpan};
    use semcore::expr::{DeclRef, ValueCategory};
    use semcore::parse_context::{DeclId, ExecutionOutcome as Outcome};
    use semcore::types::TypeArena;

    struct NullCtx {
        warnings: Vec<Warning>,
        errors: Vec<Diagnostic>,
    }
    impl NullCtx {
        fn new() -> Self {
            NullCtx {
                warnings: Vec::new(),
                errors: Vec::new(),
            }
        }
    }
    impl ParseContext for NullCtx {
        fn report_error(&mut self, diag: Diagnostic) {
            self.errors.push(diag);
        }
        fn report_warning(&mut self, kind: Warning, _location: SourceSpan) {
            self.warnings.push(kind);
        }
        fn report_parenthesis_suppressed_warning(&mut self, _l: u32, _k: Warning, _loc: SourceSpan) {}
        fn add_to_resolve_queue(&mut self, _decl: DeclId, _call_site: SourceSpan) -> bool {
            true
        }
        fn pop_resolve_queue(&mut self, _decl: DeclId) {}
        fn execute_function(&mut self, _decl: DeclId, _args: &[Value]) -> Outcome {
            Outcome::Diverged
        }
        fn execute_function_without_error(&mut self, _decl: DeclId, _args: &[Value]) -> Outcome {
            Outcome::Diverged
        }
        fn execute_compound_expression(&mut self, _expr: &Expr) -> Outcome {
            Outcome::Diverged
        }
        fn make_cast_expression(&mut self, inner: Expr, _dest: semcore::types::TypeId) -> Expr {
            inner
        }
        fn make_optional_cast_expression(&mut self, inner: Expr, _dest: semcore::types::TypeId) -> Expr {
            inner
        }
        fn make_copy_construction(&mut self, inner: Expr) -> Expr {
            inner
        }
        fn make_move_construction(&mut self, inner: Expr) -> Expr {
            inner
        }
        fn make_note(&self, message: String, location: Option<SourceSpan>) -> Note {
            match location {
                Some(loc) => Note::at(message, loc),
                None => Note::new(message),
            }
        }
        fn is_aggressive_consteval_enabled(&self) -> bool {
            false
        }
        fn is_instantiable(&self, _decl: DeclId) -> bool {
            false
        }
    }

    fn span() -> SourceSpan {
        SourceSpan {
            begin: 0,
            pivot: 0,
            end: 1,
        }
    }

    fn lit(n: i64) -> Expr {
        Expr::new(ExprKind::Literal(Literal::Int(n)), span(), ValueCategory::Literal)
    }

    /// S3: `1 + 2` at force intensity yields `3` with no warnings.
    #[test]
    fn s3_simple_addition_no_warning() {
        let mut types = TypeArena::new();
        let config = CoreConfig::new();
        let mut ctx = NullCtx::new();
        let mut expr = Expr::new(
            ExprKind::Binary {
                op: BinOp::Add,
                lhs: Box::new(lit(1)),
                rhs: Box::new(lit(2)),
            },
            span(),
            ValueCategory::Rvalue,
        );
        fold_expr(&mut expr, Intensity::ForceWithError, &mut ctx, &mut types, &config);
        assert_eq!(expr.folded_value, Some(Value::SInt(3)));
        assert!(ctx.warnings.is_empty());
    }

    /// S3: `(int8)127 + (int8)1` at force intensity yields `-128` and one
    /// `int-overflow` warning at paren-level 0.
    #[test]
    fn s3_int8_overflow_wraps_and_warns() {
        let mut types = TypeArena::new();
        let int8 = types.intern_terminal(Terminator::Base(BaseTypeKind::SInt(IntWidth::W8)));
        let config = CoreConfig::new();
        let mut ctx = NullCtx::new();
        let mut expr = Expr::new(
            ExprKind::Binary {
                op: BinOp::Add,
                lhs: Box::new(lit(127)),
                rhs: Box::new(lit(1)),
            },
            span(),
            ValueCategory::Rvalue,
        )
        .with_type(int8);
        fold_expr(&mut expr, Intensity::ForceWithError, &mut ctx, &mut types, &config);
        assert_eq!(expr.folded_value, Some(Value::SInt(-128)));
        assert_eq!(ctx.warnings, vec![Warning::IntOverflow]);
    }

    #[test]
    fn identifier_without_consteval_does_not_fold() {
        let mut types = TypeArena::new();
        let config = CoreConfig::new();
        let mut ctx = NullCtx::new();
        let mut expr = Expr::new(
            ExprKind::Identifier(DeclRef {
                name: "x".into(),
                is_consteval: false,
                resolved_initializer: None,
                declared_type: None,
            }),
            span(),
            ValueCategory::Lvalue,
        );
        fold_expr(&mut expr, Intensity::ForceWithError, &mut ctx, &mut types, &config);
        assert_eq!(expr.consteval_state, ConstevalState::Failed);
        assert_eq!(ctx.errors.len(), 1);
    }

    #[test]
    fn short_circuit_and_skips_right_operand() {
        let mut types = TypeArena::new();
        let config = CoreConfig::new();
        let mut ctx = NullCtx::new();
        let unresolved_ident = Expr::new(
            ExprKind::Identifier(DeclRef {
                name: "never_evaluated".into(),
                is_consteval: false,
                resolved_initializer: None,
                declared_type: None,
            }),
            span(),
            ValueCategory::Lvalue,
        );
        let mut expr = Expr::new(
            ExprKind::Binary {
                op: BinOp::And,
                lhs: Box::new(Expr::new(
                    ExprKind::Literal(Literal::Bool(false)),
                    span(),
                    ValueCategory::Literal,
                )),
                rhs: Box::new(unresolved_ident),
            },
            span(),
            ValueCategory::Rvalue,
        );
        fold_expr(&mut expr, Intensity::ForceWithError, &mut ctx, &mut types, &config);
        assert_eq!(expr.folded_value, Some(Value::Bool(false)));
        assert!(ctx.errors.is_empty());
    }

    #[test]
    fn out_of_bounds_index_fails_and_warns() {
        let mut types = TypeArena::new();
        let config = CoreConfig::new();
        let mut ctx = NullCtx::new();
        let array_lit = Expr::new(
            ExprKind::TupleLiteral(vec![lit(10), lit(20)]),
            span(),
            ValueCategory::Rvalue,
        );
        let mut expr = Expr::new(
            ExprKind::Subscript {
                base: Box::new(array_lit),
                index: Box::new(lit(5)),
            },
            span(),
            ValueCategory::Rvalue,
        );
        fold_expr(&mut expr, Intensity::ForceWithError, &mut ctx, &mut types, &config);
        assert!(expr.folded_value.is_none());
        assert_eq!(ctx.warnings, vec![Warning::OutOfBoundsIndex]);
    }

    #[test]
    fn idempotent_refold_does_not_rewarn() {
        let mut types = TypeArena::new();
        let int8 = types.intern_terminal(Terminator::Base(BaseTypeKind::SInt(IntWidth::W8)));
        let config = CoreConfig::new();
        let mut ctx = NullCtx::new();
        let mut expr = Expr::new(
            ExprKind::Binary {
                op: BinOp::Add,
                lhs: Box::new(lit(127)),
                rhs: Box::new(lit(1)),
            },
            span(),
            ValueCategory::Rvalue,
        )
        .with_type(int8);
        fold_expr(&mut expr, Intensity::ForceWithError, &mut ctx, &mut types, &config);
        let state_after_first = expr.consteval_state;
        fold_expr(&mut expr, Intensity::ForceWithError, &mut ctx, &mut types, &config);
        assert_eq!(expr.consteval_state, state_after_first);
        assert_eq!(ctx.warnings.len(), 1, "second fold must not re-emit the warning");
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            // §8 property 8: folding an already-terminal expression a second
            // time is a no-op — same state, same value, no duplicate
            // diagnostics.
            #[test]
            fn p8_consteval_try_is_idempotent(a: i8, b: i8) {
                let mut types = TypeArena::new();
                let int8 = types.intern_terminal(Terminator::Base(BaseTypeKind::SInt(IntWidth::W8)));
                let config = CoreConfig::new();
                let mut ctx = NullCtx::new();
                let mut expr = Expr::new(
                    ExprKind::Binary {
                        op: BinOp::Add,
                        lhs: Box::new(lit(a as i64)),
                        rhs: Box::new(lit(b as i64)),
                    },
                    span(),
                    ValueCategory::Rvalue,
                )
                .with_type(int8);

                fold_expr(&mut expr, Intensity::ForceWithError, &mut ctx, &mut types, &config);
                let state_after_first = expr.consteval_state;
                let value_after_first = expr.folded_value.clone();
                let warnings_after_first = ctx.warnings.len();
                let errors_after_first = ctx.errors.len();

                fold_expr(&mut expr, Intensity::ForceWithError, &mut ctx, &mut types, &config);

                prop_assert_eq!(expr.consteval_state, state_after_first);
                prop_assert_eq!(expr.folded_value.clone(), value_after_first);
                prop_assert_eq!(ctx.warnings.len(), warnings_after_first);
                prop_assert_eq!(ctx.errors.len(), errors_after_first);
            }
        }
    }
}
