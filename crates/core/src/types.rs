//! The type model (T).
//!
//! A type is a `(modifier-sequence, terminator)` pair: modifiers are stacked
//! outside-in, the terminator is the underlying shape. Types are interned
//! into a [`TypeArena`] and referenced everywhere else by the cheap, `Copy`
//! [`TypeId`] handle — the arena owns the nodes, cross-references are
//! indices rather than owning links, so cyclic shapes (a struct whose method
//! returns a pointer to itself) can't produce a borrow-check or drop problem.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Handle into a [`TypeArena`]. Cheap to copy, stable for the lifetime of the
/// arena that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub u32);

/// Integer bit width for the sized integer base types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntWidth {
    W8,
    W16,
    W32,
    W64,
}

impl IntWidth {
    pub fn bits(self) -> u32 {
        match self {
            IntWidth::W8 => 8,
            IntWidth::W16 => 16,
            IntWidth::W32 => 32,
            IntWidth::W64 => 64,
        }
    }

    /// The bit mask selecting the low `bits()` bits of a 64-bit word.
    pub fn mask(self) -> u64 {
        if self.bits() == 64 {
            u64::MAX
        } else {
            (1u64 << self.bits()) - 1
        }
    }
}

/// A field of a struct declaration, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StructDecl {
    pub name: String,
    pub fields: Vec<(String, TypeId)>,
}

pub type StructDeclRef = Rc<StructDecl>;

/// An enum declaration: underlying integer representation plus the table of
/// named values consulted by display and symbol-name encoding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumDecl {
    pub name: String,
    pub underlying_signed: bool,
    pub underlying_width: IntWidth,
    /// Declared (name, raw-bits) pairs, in declaration order.
    pub named_values: Vec<(String, u64)>,
}

pub type EnumDeclRef = Rc<EnumDecl>;

impl EnumDecl {
    pub fn value_name(&self, bits: u64) -> Option<&str> {
        self.named_values
            .iter()
            .find(|(_, v)| *v == bits)
            .map(|(name, _)| name.as_str())
    }
}

/// The terminator's "base" shape: the primitive and user/generic declaration
/// kinds that sit under a modifier stack when the terminator is `base_type`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BaseTypeKind {
    SInt(IntWidth),
    UInt(IntWidth),
    Float32,
    Float64,
    U8Char,
    Bool,
    Str,
    /// The type of the null-pointer literal.
    NullT,
    Struct(StructDeclRef),
    Enum(EnumDeclRef),
    /// An uninstantiated generic struct/type declaration, named by identity.
    GenericParent(String),
    /// A specific instantiation of a generic declaration.
    GenericInstance(String, Vec<TypeId>),
}

/// Calling convention carried on function terminators. Codegen (out of
/// scope) picks the concrete ABI; the core only needs to compare and
/// propagate it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallingConvention {
    Default,
    C,
}

/// The terminating shape of a type, beneath all modifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Terminator {
    Base(BaseTypeKind),
    Tuple(Vec<TypeId>),
    Function {
        cc: CallingConvention,
        params: Vec<TypeId>,
        return_type: TypeId,
    },
    /// Placeholder awaiting deduction.
    Auto,
    /// "Types as values" — the expression is itself a compile-time type.
    Typename,
    Void,
}

/// A single modifier layer. The modifier *sequence* on a [`TypeNode`] is
/// ordered outside-in: `modifiers[0]` is the outermost wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    Mut,
    Const,
    Consteval,
    LvalueReference,
    MoveReference,
    AutoReference,
    AutoReferenceMut,
    Pointer,
    Optional,
    /// `array(size)`; size 0 means "not yet known" (inferred from an
    /// initializer or destination-side deduction).
    Array(u64),
    ArraySlice,
    Variadic,
}

impl Modifier {
    pub fn is_reference(self) -> bool {
        matches!(
            self,
            Modifier::LvalueReference
                | Modifier::MoveReference
                | Modifier::AutoReference
                | Modifier::AutoReferenceMut
        )
    }
}

/// One interned type: a modifier stack plus a terminator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeNode {
    pub modifiers: Vec<Modifier>,
    pub terminator: Terminator,
}

impl TypeNode {
    pub fn new(modifiers: Vec<Modifier>, terminator: Terminator) -> Self {
        TypeNode {
            modifiers,
            terminator,
        }
    }

    pub fn terminal(terminator: Terminator) -> Self {
        TypeNode {
            modifiers: Vec::new(),
            terminator,
        }
    }
}

/// Append-only, deduplicating store of [`TypeNode`]s for one translation
/// unit. Mutation (interning a new node) only happens during resolution;
/// once a [`TypeId`] has been handed out as a value payload it is never
/// invalidated.
#[derive(Debug, Default)]
pub struct TypeArena {
    nodes: Vec<TypeNode>,
    dedup: HashMap<TypeNode, TypeId>,
}

impl TypeArena {
    pub fn new() -> Self {
        TypeArena {
            nodes: Vec::new(),
            dedup: HashMap::new(),
        }
    }

    pub fn intern(&mut self, node: TypeNode) -> TypeId {
        if let Some(&id) = self.dedup.get(&node) {
            return id;
        }
        let id = TypeId(self.nodes.len() as u32);
        self.dedup.insert(node.clone(), id);
        self.nodes.push(node);
        id
    }

    pub fn get(&self, id: TypeId) -> &TypeNode {
        &self.nodes[id.0 as usize]
    }

    /// Intern a bare terminator with no modifiers.
    pub fn intern_terminal(&mut self, terminator: Terminator) -> TypeId {
        self.intern(TypeNode::terminal(terminator))
    }

    /// Intern `base` wrapped in one additional outer modifier.
    pub fn wrap(&mut self, modifier: Modifier, base: TypeId) -> TypeId {
        let mut node = self.get(base).clone();
        node.modifiers.insert(0, modifier);
        self.intern(node)
    }
}

// ---------------------------------------------------------------------
// Predicates (§3.2)
// ---------------------------------------------------------------------

/// A type is complete when no `auto`, `auto_reference`, `auto_reference_mut`,
/// `typename`, or generic-parent base remains anywhere in it.
pub fn is_complete(arena: &TypeArena, id: TypeId) -> bool {
    let node = arena.get(id);
    match &node.terminator {
        Terminator::Auto | Terminator::Typename => false,
        Terminator::Base(BaseTypeKind::GenericParent(_)) => false,
        Terminator::Base(BaseTypeKind::GenericInstance(_, args)) => {
            args.iter().all(|&a| is_complete(arena, a))
        }
        Terminator::Tuple(elems) => elems.iter().all(|&e| is_complete(arena, e)),
        Terminator::Function {
            params,
            return_type,
            ..
        } => params.iter().all(|&p| is_complete(arena, p)) && is_complete(arena, *return_type),
        Terminator::Void | Terminator::Base(_) => true,
    }
}

/// Does the outermost modifier make this a reference shape?
pub fn is_reference(arena: &TypeArena, id: TypeId) -> bool {
    arena
        .get(id)
        .modifiers
        .first()
        .copied()
        .map(Modifier::is_reference)
        .unwrap_or(false)
}

pub fn is_pointer(arena: &TypeArena, id: TypeId) -> bool {
    matches!(arena.get(id).modifiers.first(), Some(Modifier::Pointer))
}

pub fn is_optional(arena: &TypeArena, id: TypeId) -> bool {
    matches!(arena.get(id).modifiers.first(), Some(Modifier::Optional))
}

pub fn is_mut(arena: &TypeArena, id: TypeId) -> bool {
    matches!(arena.get(id).modifiers.first(), Some(Modifier::Mut))
}

/// Strip a single leading `mut`, if present.
pub fn strip_mut(arena: &mut TypeArena, id: TypeId) -> TypeId {
    let node = arena.get(id).clone();
    if let Some(Modifier::Mut) = node.modifiers.first() {
        arena.intern(TypeNode {
            modifiers: node.modifiers[1..].to_vec(),
            terminator: node.terminator,
        })
    } else {
        id
    }
}

/// `remove_any_mut`: strip `mut` wherever it appears in the modifier
/// sequence (not just the outermost layer).
pub fn remove_any_mut(arena: &mut TypeArena, id: TypeId) -> TypeId {
    let node = arena.get(id).clone();
    let filtered: Vec<Modifier> = node
        .modifiers
        .into_iter()
        .filter(|m| !matches!(m, Modifier::Mut))
        .collect();
    arena.intern(TypeNode {
        modifiers: filtered,
        terminator: node.terminator,
    })
}

/// `remove_mut_reference`: strip one leading reference modifier (and any
/// `mut` immediately inside or outside it), exposing the referenced type.
pub fn remove_mut_reference(arena: &mut TypeArena, id: TypeId) -> TypeId {
    let node = arena.get(id).clone();
    let mut modifiers = node.modifiers;
    if matches!(modifiers.first(), Some(Modifier::Mut)) {
        modifiers.remove(0);
    }
    if modifiers
        .first()
        .copied()
        .map(Modifier::is_reference)
        .unwrap_or(false)
    {
        modifiers.remove(0);
    }
    if matches!(modifiers.first(), Some(Modifier::Mut)) {
        modifiers.remove(0);
    }
    arena.intern(TypeNode {
        modifiers,
        terminator: node.terminator,
    })
}

/// Strip a single leading pointer/optional/slice modifier, returning the
/// pointee/contained type. Returns `None` if the outermost modifier isn't
/// one of those three.
pub fn remove_outer_wrapper(arena: &mut TypeArena, id: TypeId) -> Option<TypeId> {
    let node = arena.get(id).clone();
    match node.modifiers.first() {
        Some(Modifier::Pointer) | Some(Modifier::Optional) | Some(Modifier::ArraySlice) => {
            Some(arena.intern(TypeNode {
                modifiers: node.modifiers[1..].to_vec(),
                terminator: node.terminator,
            }))
        }
        _ => None,
    }
}

pub fn is_numeric(arena: &TypeArena, id: TypeId) -> bool {
    if !arena.get(id).modifiers.is_empty() {
        return false;
    }
    matches!(
        arena.get(id).terminator,
        Terminator::Base(BaseTypeKind::SInt(_))
            | Terminator::Base(BaseTypeKind::UInt(_))
            | Terminator::Base(BaseTypeKind::Float32)
            | Terminator::Base(BaseTypeKind::Float64)
    )
}

pub fn is_integer(arena: &TypeArena, id: TypeId) -> bool {
    if !arena.get(id).modifiers.is_empty() {
        return false;
    }
    matches!(
        arena.get(id).terminator,
        Terminator::Base(BaseTypeKind::SInt(_)) | Terminator::Base(BaseTypeKind::UInt(_))
    )
}

/// Signedness and width of an integer base type, if `id` is a bare (no
/// modifiers) integer terminator.
pub fn integer_kind(arena: &TypeArena, id: TypeId) -> Option<(bool, IntWidth)> {
    if !arena.get(id).modifiers.is_empty() {
        return None;
    }
    match arena.get(id).terminator {
        Terminator::Base(BaseTypeKind::SInt(w)) => Some((true, w)),
        Terminator::Base(BaseTypeKind::UInt(w)) => Some((false, w)),
        _ => None,
    }
}

// ---------------------------------------------------------------------
// Display / mangled names
// ---------------------------------------------------------------------

fn display_terminator(arena: &TypeArena, f: &mut fmt::Formatter<'_>, t: &Terminator) -> fmt::Result {
    match t {
        Terminator::Base(BaseTypeKind::SInt(w)) => write!(f, "int{}", w.bits()),
        Terminator::Base(BaseTypeKind::UInt(w)) => write!(f, "uint{}", w.bits()),
        Terminator::Base(BaseTypeKind::Float32) => write!(f, "float32"),
        Terminator::Base(BaseTypeKind::Float64) => write!(f, "float64"),
        Terminator::Base(BaseTypeKind::U8Char) => write!(f, "char"),
        Terminator::Base(BaseTypeKind::Bool) => write!(f, "bool"),
        Terminator::Base(BaseTypeKind::Str) => write!(f, "str"),
        Terminator::Base(BaseTypeKind::NullT) => write!(f, "__null_t"),
        Terminator::Base(BaseTypeKind::Struct(s)) => write!(f, "{}", s.name),
        Terminator::Base(BaseTypeKind::Enum(e)) => write!(f, "{}", e.name),
        Terminator::Base(BaseTypeKind::GenericParent(name)) => write!(f, "{}", name),
        Terminator::Base(BaseTypeKind::GenericInstance(name, args)) => {
            write!(f, "{}<", name)?;
            for (i, a) in args.iter().enumerate() {
                if i != 0 {
                    write!(f, ", ")?;
                }
                display_type(arena, f, *a)?;
            }
            write!(f, ">")
        }
        Terminator::Tuple(elems) => {
            write!(f, "[")?;
            for (i, e) in elems.iter().enumerate() {
                if i != 0 {
                    write!(f, ", ")?;
                }
                display_type(arena, f, *e)?;
            }
            write!(f, "]")
        }
        Terminator::Function {
            params,
            return_type,
            ..
        } => {
            write!(f, "(")?;
            for (i, p) in params.iter().enumerate() {
                if i != 0 {
                    write!(f, ", ")?;
                }
                display_type(arena, f, *p)?;
            }
            write!(f, ") -> ")?;
            display_type(arena, f, *return_type)
        }
        Terminator::Auto => write!(f, "auto"),
        Terminator::Typename => write!(f, "typename"),
        Terminator::Void => write!(f, "void"),
    }
}

fn display_modifier(m: Modifier, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match m {
        Modifier::Mut => write!(f, "mut "),
        Modifier::Const => write!(f, "const "),
        Modifier::Consteval => write!(f, "consteval "),
        Modifier::LvalueReference => write!(f, "&"),
        Modifier::MoveReference => write!(f, "&&"),
        Modifier::AutoReference => write!(f, "#"),
        Modifier::AutoReferenceMut => write!(f, "#mut"),
        Modifier::Pointer => write!(f, "*"),
        Modifier::Optional => write!(f, "?"),
        Modifier::Array(0) => write!(f, "[:]"),
        Modifier::Array(n) => write!(f, "[{}:]", n),
        Modifier::ArraySlice => write!(f, "[:]&"),
        Modifier::Variadic => write!(f, "..."),
    }
}

/// Render `id` in the modifier-outside-in, terminator-last order the type
/// model's invariants are defined in.
pub fn display_type(arena: &TypeArena, f: &mut fmt::Formatter<'_>, id: TypeId) -> fmt::Result {
    let node = arena.get(id);
    for m in &node.modifiers {
        display_modifier(*m, f)?;
    }
    display_terminator(arena, f, &node.terminator)
}

/// A deterministic, injective textual mangling of a type, used only to
/// produce the `<symbol>` payload of the value lattice's `t<len>.<symbol>`
/// encoding (§4.1). The concrete alphabet isn't prescribed by the
/// specification (mangled name formats are an LLVM-IR/codegen concern, out
/// of scope); this scheme only needs to be stable and round-trip-free of
/// collisions within one arena.
pub fn mangled_name(arena: &TypeArena, id: TypeId) -> String {
    struct Wrap<'a>(&'a TypeArena, TypeId);
    impl fmt::Display for Wrap<'_> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            display_type(self.0, f, self.1)
        }
    }
    format!("{}", Wrap(arena, id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_deduplicates() {
        let mut arena = TypeArena::new();
        let a = arena.intern_terminal(Terminator::Base(BaseTypeKind::SInt(IntWidth::W32)));
        let b = arena.intern_terminal(Terminator::Base(BaseTypeKind::SInt(IntWidth::W32)));
        assert_eq!(a, b);
    }

    #[test]
    fn reference_and_mut_stripping() {
        let mut arena = TypeArena::new();
        let int32 = arena.intern_terminal(Terminator::Base(BaseTypeKind::SInt(IntWidth::W32)));
        let mut_int32 = arena.wrap(Modifier::Mut, int32);
        let ref_mut_int32 = arena.wrap(Modifier::LvalueReference, mut_int32);
        assert!(is_reference(&arena, ref_mut_int32));
        assert!(!is_mut(&arena, ref_mut_int32));
        let stripped = remove_mut_reference(&mut arena, ref_mut_int32);
        assert_eq!(stripped, int32);
    }

    #[test]
    fn completeness() {
        let mut arena = TypeArena::new();
        let auto_ty = arena.intern_terminal(Terminator::Auto);
        assert!(!is_complete(&arena, auto_ty));
        let int32 = arena.intern_terminal(Terminator::Base(BaseTypeKind::SInt(IntWidth::W32)));
        assert!(is_complete(&arena, int32));
        let tuple = arena.intern_terminal(Terminator::Tuple(vec![int32, auto_ty]));
        assert!(!is_complete(&arena, tuple));
    }

    #[test]
    fn array_of_zero_size_matches_any_on_display() {
        let mut arena = TypeArena::new();
        let int32 = arena.intern_terminal(Terminator::Base(BaseTypeKind::SInt(IntWidth::W32)));
        let arr = arena.wrap(Modifier::Array(0), int32);
        assert_eq!(format!("{}", mangled_name(&arena, arr)), "[:]int32");
    }
}
