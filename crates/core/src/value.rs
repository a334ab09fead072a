//! The constant-value lattice (V).
//!
//! A constant value is exactly one of 19 variants (§3.1). The payload is
//! either a `Copy` scalar or a reference-counted slice/string — composite
//! values (arrays, tuples, aggregates) are views over child values that are
//! cheap to clone and share, never deep-copied on fold. Equality is
//! structural and, because `#[derive(PartialEq)]` on a Rust enum already
//! compares the discriminant first, two values of different tags compare
//! unequal without any special-casing.

use crate::types::TypeId;
use std::fmt;
use std::rc::Rc;

/// A non-owning, symbol-resolvable reference to a function body. The body
/// itself lives in the (external) AST; the core only ever needs its mangled
/// name to fold `function`-typed constants and to encode them for symbol
/// names.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionRef {
    pub symbol_name: Rc<str>,
}

/// One of the 19 value-lattice variants (§3.1).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    SInt(i64),
    UInt(u64),
    Float32(f32),
    Float64(f64),
    U8Char(char),
    Str(Rc<str>),
    Bool(bool),
    /// The null-pointer literal's value.
    Null,
    /// The value of a void-typed expression.
    Void,
    /// `(enum-declaration reference, raw 64-bit bits)`; signedness is
    /// inferred from the declaration, not stored redundantly here.
    Enum(crate::types::EnumDeclRef, u64),
    Array(Rc<[Value]>),
    SIntArray(Rc<[i64]>),
    UIntArray(Rc<[u64]>),
    Float32Array(Rc<[f32]>),
    Float64Array(Rc<[f64]>),
    Tuple(Rc<[Value]>),
    /// One element per field, in declaration order.
    Aggregate(Rc<[Value]>),
    Function(FunctionRef),
    /// A first-class compile-time type.
    Type(TypeId),
}

/// The tag letter/identity of a value, independent of its payload. Useful
/// for exhaustive `match`es that only care about shape (e.g. the intrinsic
/// dispatch table) without repeating full patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueTag {
    SInt,
    UInt,
    Float32,
    Float64,
    U8Char,
    Str,
    Bool,
    Null,
    Void,
    Enum,
    Array,
    SIntArray,
    UIntArray,
    Float32Array,
    Float64Array,
    Tuple,
    Aggregate,
    Function,
    Type,
}

impl Value {
    pub fn tag(&self) -> ValueTag {
        match self {
            Value::SInt(_) => ValueTag::SInt,
            Value::UInt(_) => ValueTag::UInt,
            Value::Float32(_) => ValueTag::Float32,
            Value::Float64(_) => ValueTag::Float64,
            Value::U8Char(_) => ValueTag::U8Char,
            Value::Str(_) => ValueTag::Str,
            Value::Bool(_) => ValueTag::Bool,
            Value::Null => ValueTag::Null,
            Value::Void => ValueTag::Void,
            Value::Enum(..) => ValueTag::Enum,
            Value::Array(_) => ValueTag::Array,
            Value::SIntArray(_) => ValueTag::SIntArray,
            Value::UIntArray(_) => ValueTag::UIntArray,
            Value::Float32Array(_) => ValueTag::Float32Array,
            Value::Float64Array(_) => ValueTag::Float64Array,
            Value::Tuple(_) => ValueTag::Tuple,
            Value::Aggregate(_) => ValueTag::Aggregate,
            Value::Function(_) => ValueTag::Function,
            Value::Type(_) => ValueTag::Type,
        }
    }
}

/// Escape a single character the way string/char literals re-escape for
/// display: control characters and the quote/backslash get a `\x` form,
/// everything else passes through.
fn escape_char_into(c: char, out: &mut String) {
    match c {
        '\\' => out.push_str("\\\\"),
        '\'' => out.push_str("\\'"),
        '"' => out.push_str("\\\""),
        '\n' => out.push_str("\\n"),
        '\r' => out.push_str("\\r"),
        '\t' => out.push_str("\\t"),
        '\0' => out.push_str("\\0"),
        c if (c as u32) < 0x20 => out.push_str(&format!("\\x{:02x}", c as u32)),
        c => out.push(c),
    }
}

fn escape_str(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        escape_char_into(c, &mut out);
    }
    out
}

fn display_aggregate_like(
    f: &mut fmt::Formatter<'_>,
    arena: &crate::types::TypeArena,
    values: &[Value],
) -> fmt::Result {
    if values.is_empty() {
        return write!(f, "[]");
    }
    write!(f, "[ ")?;
    for (i, v) in values.iter().enumerate() {
        if i != 0 {
            write!(f, ", ")?;
        }
        display_value(f, arena, v)?;
    }
    write!(f, " ]")
}

fn display_primitive_array<T: fmt::Display>(f: &mut fmt::Formatter<'_>, values: &[T]) -> fmt::Result {
    if values.is_empty() {
        return write!(f, "[]");
    }
    write!(f, "[ ")?;
    for (i, v) in values.iter().enumerate() {
        if i != 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", v)?;
    }
    write!(f, " ]")
}

/// Render `value` the way the language would print a constant (§4.1
/// "Display"). Needs the type arena only to format `Value::Type` payloads.
pub fn display_value(
    f: &mut fmt::Formatter<'_>,
    arena: &crate::types::TypeArena,
    value: &Value,
) -> fmt::Result {
    match value {
        Value::SInt(v) => write!(f, "{}", v),
        Value::UInt(v) => write!(f, "{}", v),
        Value::Float32(v) => write!(f, "{}", v),
        Value::Float64(v) => write!(f, "{}", v),
        Value::U8Char(c) => {
            let mut s = String::new();
            escape_char_into(*c, &mut s);
            write!(f, "'{}'", s)
        }
        Value::Str(s) => write!(f, "\"{}\"", escape_str(s)),
        Value::Bool(b) => write!(f, "{}", b),
        Value::Null => write!(f, "null"),
        Value::Void => write!(f, "void()"),
        Value::Enum(decl, bits) => {
            if let Some(name) = decl.value_name(*bits) {
                write!(f, "{}.{}", decl.name, name)
            } else if decl.underlying_signed {
                write!(f, "{}({})", decl.name, *bits as i64)
            } else {
                write!(f, "{}({})", decl.name, bits)
            }
        }
        Value::Array(vs) => display_aggregate_like(f, arena, vs),
        Value::SIntArray(vs) => display_primitive_array(f, vs),
        Value::UIntArray(vs) => display_primitive_array(f, vs),
        Value::Float32Array(vs) => display_primitive_array(f, vs),
        Value::Float64Array(vs) => display_primitive_array(f, vs),
        Value::Tuple(vs) => display_aggregate_like(f, arena, vs),
        Value::Aggregate(vs) => display_aggregate_like(f, arena, vs),
        // Function values have no source-level printable form; codegen is
        // the only consumer that cares what the constant "is".
        Value::Function(_) => write!(f, ""),
        Value::Type(id) => crate::types::display_type(arena, f, *id),
    }
}

/// A borrowing wrapper pairing a `Value` with the arena needed to display
/// it, so callers can `write!("{}", WithArena(&arena, &value))`.
pub struct WithArena<'a>(pub &'a crate::types::TypeArena, pub &'a Value);

impl fmt::Display for WithArena<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        display_value(f, self.0, self.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeArena;

    #[test]
    fn cross_tag_equality_is_always_false() {
        assert_ne!(Value::SInt(1), Value::UInt(1));
        assert_ne!(Value::Null, Value::Void);
    }

    #[test]
    fn same_tag_structural_equality() {
        assert_eq!(Value::SInt(-1), Value::SInt(-1));
        assert_eq!(
            Value::Array(Rc::from(vec![Value::SInt(1), Value::SInt(2)])),
            Value::Array(Rc::from(vec![Value::SInt(1), Value::SInt(2)]))
        );
    }

    #[test]
    fn empty_aggregate_has_no_interior_spaces() {
        let arena = TypeArena::new();
        let v = Value::Array(Rc::from(Vec::new()));
        let s = format!("{}", WithArena(&arena, &v));
        assert_eq!(s, "[]");
    }

    #[test]
    fn nonempty_aggregate_spacing() {
        let arena = TypeArena::new();
        let v = Value::Tuple(Rc::from(vec![Value::SInt(1), Value::SInt(2), Value::SInt(3)]));
        let s = format!("{}", WithArena(&arena, &v));
        assert_eq!(s, "[ 1, 2, 3 ]");
    }

    #[test]
    fn enum_falls_back_to_parenthesised_integer() {
        let decl = crate::types::EnumDeclRef::new(crate::types::EnumDecl {
            name: "Color".to_string(),
            underlying_signed: false,
            underlying_width: crate::types::IntWidth::W32,
            named_values: vec![("Red".to_string(), 0)],
        });
        let arena = TypeArena::new();
        let named = Value::Enum(decl.clone(), 0);
        assert_eq!(format!("{}", WithArena(&arena, &named)), "Color.Red");
        let unnamed = Value::Enum(decl, 7);
        assert_eq!(format!("{}", WithArena(&arena, &unnamed)), "Color(7)");
    }
}
