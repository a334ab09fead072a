//! Safe arithmetic (§4.2.2): the layer every integer/float binary operator
//! folds through. For each operator and signed/unsigned kind it detects
//! overflow or division-by-zero and, at paren-level < 2, surfaces the
//! matching warning — but the *result* is produced unconditionally for
//! every shape except integer division/modulo by zero, which the original
//! compiler's `safe_binary_divide`/`safe_binary_modulo` leave unfolded
//! (returns no value) rather than invent a wrapped quotient (see
//! `original_source/src/parse/consteval.cpp`'s `evaluate_binary_divide`,
//! which propagates an empty `constant_value` on that path while every
//! other integer operator always returns one).

use semcore::diagnostics::Warning;
use semcore::types::IntWidth;

/// Truncate `full` to `width` bits and sign-extend back to `i64` — the
/// two's-complement wrapping behaviour spec.md §4.2.2 requires for integer
/// arithmetic and §4.2.4 requires for narrowing casts.
pub fn wrap_signed(full: i128, width: IntWidth) -> i64 {
    let bits = width.bits();
    if bits == 64 {
        return full as i64;
    }
    let mask = width.mask();
    let trunc = (full as u128 as u64) & mask;
    let sign_bit = 1u64 << (bits - 1);
    if trunc & sign_bit != 0 {
        (trunc | !mask) as i64
    } else {
        trunc as i64
    }
}

pub fn wrap_unsigned(full: u128, width: IntWidth) -> u64 {
    (full as u64) & width.mask()
}

fn signed_range(width: IntWidth) -> (i128, i128) {
    let bits = width.bits();
    let min = -(1i128 << (bits - 1));
    let max = (1i128 << (bits - 1)) - 1;
    (min, max)
}

/// Result of one safe-arithmetic step: the wrapped value (when one exists)
/// plus the warning to surface, if any, gated by the caller against the
/// expression's paren level.
pub struct ArithResult<T> {
    pub value: Option<T>,
    pub warning: Option<Warning>,
}

/// Which of the three wrapping operators is being folded; division and
/// modulo go through their own functions since they can fail outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum WrappingOp {
    Add,
    Sub,
    Mul,
}

fn signed_add_sub_mul(op: WrappingOp, lhs: i64, rhs: i64, width: IntWidth) -> ArithResult<i64> {
    let (min, max) = signed_range(width);
    let full: i128 = match op {
        WrappingOp::Add => lhs as i128 + rhs as i128,
        WrappingOp::Sub => lhs as i128 - rhs as i128,
        WrappingOp::Mul => lhs as i128 * rhs as i128,
    };
    let overflowed = full < min || full > max;
    ArithResult {
        value: Some(wrap_signed(full, width)),
        warning: overflowed.then_some(Warning::IntOverflow),
    }
}

fn unsigned_add_sub_mul(op: WrappingOp, lhs: u64, rhs: u64, width: IntWidth) -> ArithResult<u64> {
    let mask = width.mask() as i128;
    let full: i128 = match op {
        WrappingOp::Add => lhs as i128 + rhs as i128,
        WrappingOp::Sub => lhs as i128 - rhs as i128,
        WrappingOp::Mul => lhs as i128 * rhs as i128,
    };
    let overflowed = full < 0 || full > mask;
    let modulus = mask + 1;
    let wrapped = wrap_unsigned(full.rem_euclid(modulus) as u128, width);
    ArithResult {
        value: Some(wrapped),
        warning: overflowed.then_some(Warning::IntOverflow),
    }
}

pub fn safe_signed_add(lhs: i64, rhs: i64, width: IntWidth) -> ArithResult<i64> {
    signed_add_sub_mul(WrappingOp::Add, lhs, rhs, width)
}
pub fn safe_signed_sub(lhs: i64, rhs: i64, width: IntWidth) -> ArithResult<i64> {
    signed_add_sub_mul(WrappingOp::Sub, lhs, rhs, width)
}
pub fn safe_signed_mul(lhs: i64, rhs: i64, width: IntWidth) -> ArithResult<i64> {
    signed_add_sub_mul(WrappingOp::Mul, lhs, rhs, width)
}
pub fn safe_unsigned_add(lhs: u64, rhs: u64, width: IntWidth) -> ArithResult<u64> {
    unsigned_add_sub_mul(WrappingOp::Add, lhs, rhs, width)
}
pub fn safe_unsigned_sub(lhs: u64, rhs: u64, width: IntWidth) -> ArithResult<u64> {
    unsigned_add_sub_mul(WrappingOp::Sub, lhs, rhs, width)
}
pub fn safe_unsigned_mul(lhs: u64, rhs: u64, width: IntWidth) -> ArithResult<u64> {
    unsigned_add_sub_mul(WrappingOp::Mul, lhs, rhs, width)
}

/// Signed division: only `MIN / -1` overflows (and wraps to `MIN`); division
/// by zero produces no value at all, matching the original's
/// `safe_binary_divide`.
pub fn safe_signed_div(lhs: i64, rhs: i64, width: IntWidth) -> ArithResult<i64> {
    if rhs == 0 {
        return ArithResult {
            value: None,
            warning: Some(Warning::IntDivideByZero),
        };
    }
    let (min, _max) = signed_range(width);
    let full = lhs as i128 / rhs as i128;
    let overflowed = full < min;
    ArithResult {
        value: Some(wrap_signed(full, width)),
        warning: overflowed.then_some(Warning::IntOverflow),
    }
}

pub fn safe_signed_rem(lhs: i64, rhs: i64, width: IntWidth) -> ArithResult<i64> {
    if rhs == 0 {
        return ArithResult {
            value: None,
            warning: Some(Warning::IntDivideByZero),
        };
    }
    let full = lhs as i128 % rhs as i128;
    ArithResult {
        value: Some(wrap_signed(full, width)),
        warning: None,
    }
}

pub fn safe_unsigned_div(lhs: u64, rhs: u64, width: IntWidth) -> ArithResult<u64> {
    if rhs == 0 {
        return ArithResult {
            value: None,
            warning: Some(Warning::IntDivideByZero),
        };
    }
    ArithResult {
        value: Some(wrap_unsigned((lhs / rhs) as u128, width)),
        warning: None,
    }
}

pub fn safe_unsigned_rem(lhs: u64, rhs: u64, width: IntWidth) -> ArithResult<u64> {
    if rhs == 0 {
        return ArithResult {
            value: None,
            warning: Some(Warning::IntDivideByZero),
        };
    }
    ArithResult {
        value: Some(wrap_unsigned((lhs % rhs) as u128, width)),
        warning: None,
    }
}

/// Float division always produces an IEEE result (§4.2.2: "the result is
/// always produced ... IEEE for floats"); division by exactly zero still
/// surfaces `float-divide-by-zero`.
pub fn safe_float_div<T>(lhs: T, rhs: T) -> ArithResult<T>
where
    T: std::ops::Div<Output = T> + PartialEq + Default + Copy,
{
    let warning = if rhs == T::default() {
        Some(Warning::FloatDivideByZero)
    } else {
        None
    };
    ArithResult {
        value: Some(lhs / rhs),
        warning,
    }
}

/// A floating binary op that can produce a non-finite result from finite
/// inputs (§4.2.3's math-domain-error family applies the same rule).
pub fn float_overflow_warning(lhs_finite: bool, rhs_finite: bool, result_finite: bool) -> Option<Warning> {
    if lhs_finite && rhs_finite && !result_finite {
        Some(Warning::FloatOverflow)
    } else {
        None
    }
}

pub fn nan_math_warning(result_is_nan: bool, inputs_were_nan: bool) -> Option<Warning> {
    if result_is_nan && !inputs_were_nan {
        Some(Warning::FloatNanMath)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_overflow_wraps_and_warns() {
        let r = safe_signed_add(127, 1, IntWidth::W8);
        assert_eq!(r.value, Some(-128));
        assert_eq!(r.warning, Some(Warning::IntOverflow));
    }

    #[test]
    fn signed_add_in_range_is_silent() {
        let r = safe_signed_add(1, 2, IntWidth::W32);
        assert_eq!(r.value, Some(3));
        assert_eq!(r.warning, None);
    }

    #[test]
    fn integer_division_by_zero_has_no_value() {
        let r = safe_signed_div(10, 0, IntWidth::W32);
        assert!(r.value.is_none());
        assert_eq!(r.warning, Some(Warning::IntDivideByZero));
    }

    #[test]
    fn unsigned_division_by_zero_has_no_value() {
        let r = safe_unsigned_div(10, 0, IntWidth::W32);
        assert!(r.value.is_none());
        assert_eq!(r.warning, Some(Warning::IntDivideByZero));
    }

    #[test]
    fn float_division_by_zero_still_has_a_value() {
        let r = safe_float_div(1.0f64, 0.0f64);
        assert_eq!(r.value, Some(f64::INFINITY));
        assert_eq!(r.warning, Some(Warning::FloatDivideByZero));
    }

    #[test]
    fn signed_min_div_neg_one_overflows() {
        let r = safe_signed_div(i64::from(i8::MIN), -1, IntWidth::W8);
        assert_eq!(r.value, Some(i64::from(i8::MIN)));
        assert_eq!(r.warning, Some(Warning::IntOverflow));
    }

    #[test]
    fn unsigned_subtraction_underflow_wraps() {
        let r = safe_unsigned_sub(0, 1, IntWidth::W8);
        assert_eq!(r.value, Some(255));
        assert_eq!(r.warning, Some(Warning::IntOverflow));
    }
}
