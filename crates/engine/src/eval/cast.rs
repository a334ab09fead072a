//! Cast semantics (§4.2.4).
//!
//! Folded casts are allowed between numeric kinds, between integer kinds
//! and `u8char` (with a Unicode-validity check on the way to `u8char`), and
//! to/from `boolean`. Narrowing integer casts wrap (two's-complement
//! truncation) and warn; the result is always produced.

use super::arithmetic::{wrap_signed, wrap_unsigned};
use semcore::diagnostics::Warning;
use semcore::types::IntWidth;
use semcore::value::Value;

/// The destination kind a fold-time cast can target (§4.2.4): identified by
/// signed/unsigned-ness and bit width, or one of the three non-integer
/// targets the table names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CastKind {
    SInt(IntWidth),
    UInt(IntWidth),
    Float32,
    Float64,
    U8Char,
    Bool,
}

/// Outcome of one cast fold: the resulting value (casts in this table never
/// fail to produce *a* value — even an out-of-range `u8char` destination
/// fails only in the sense of emitting `invalid-unicode`, per §4.2.4, which
/// names it as a warning rather than a fold failure) plus the warning to
/// surface, if any.
pub struct CastResult {
    pub value: Value,
    pub warning: Option<Warning>,
}

fn signed_fits(full: i64, width: IntWidth) -> bool {
    let bits = width.bits();
    if bits == 64 {
        return true;
    }
    let min = -(1i64 << (bits - 1));
    let max = (1i64 << (bits - 1)) - 1;
    full >= min && full <= max
}

fn unsigned_fits(full: u64, width: IntWidth) -> bool {
    full <= width.mask()
}

/// Fold a cast of a numeric/bool source `Value` to `dest`.
pub fn fold_numeric_cast(value: &Value, dest: CastKind) -> CastResult {
    let as_i64 = |v: &Value| -> i64 {
        match v {
            Value::SInt(n) => *n,
            Value::UInt(n) => *n as i64,
            Value::Float32(f) => *f as i64,
            Value::Float64(f) => *f as i64,
            Value::Bool(b) => *b as i64,
            Value::U8Char(c) => *c as i64,
            _ => unreachable!("fold_numeric_cast called with non-numeric source"),
        }
    };
    let as_u64 = |v: &Value| -> u64 {
        match v {
            Value::SInt(n) => *n as u64,
            Value::UInt(n) => *n,
            Value::Float32(f) => *f as u64,
            Value::Float64(f) => *f as u64,
            Value::Bool(b) => *b as u64,
            Value::U8Char(c) => *c as u64,
            _ => unreachable!("fold_numeric_cast called with non-numeric source"),
        }
    };
    let as_f64 = |v: &Value| -> f64 {
        match v {
            Value::SInt(n) => *n as f64,
            Value::UInt(n) => *n as f64,
            Value::Float32(f) => *f as f64,
            Value::Float64(f) => *f,
            Value::Bool(b) => *b as u8 as f64,
            Value::U8Char(c) => *c as u64 as f64,
            _ => unreachable!("fold_numeric_cast called with non-numeric source"),
        }
    };

    match dest {
        CastKind::SInt(width) => {
            let full = as_i64(value);
            let overflowed = !signed_fits(full, width);
            CastResult {
                value: Value::SInt(wrap_signed(full as i128, width)),
                warning: overflowed.then_some(Warning::IntOverflow),
            }
        }
        CastKind::UInt(width) => {
            let full = as_u64(value);
            let overflowed = !unsigned_fits(full, width);
            CastResult {
                value: Value::UInt(wrap_unsigned(full as u128, width)),
                warning: overflowed.then_some(Warning::IntOverflow),
            }
        }
        CastKind::Float32 => CastResult {
            value: Value::Float32(as_f64(value) as f32),
            warning: None,
        },
        CastKind::Float64 => CastResult {
            value: Value::Float64(as_f64(value)),
            warning: None,
        },
        CastKind::Bool => CastResult {
            value: Value::Bool(as_u64(value) != 0),
            warning: None,
        },
        CastKind::U8Char => {
            let bits = as_u64(value);
            match char::from_u32(bits as u32) {
                Some(c) => CastResult {
                    value: Value::U8Char(c),
                    warning: None,
                },
                None => CastResult {
                    // Invalid codepoints still produce a value — the
                    // replacement character — since §4.2.4 only prescribes
                    // a warning here, not a fold failure.
                    value: Value::U8Char('\u{FFFD}'),
                    warning: Some(Warning::InvalidUnicode),
                },
            }
        }
    }
}
