//! Internal representation of C types, as consumed by the symbol table and
//! the passes behind it.
//!
//! A [`Type`] is a cheap handle to a shared, mostly-immutable node. The one
//! piece of information C allows later declarations to complete in place is
//! the storage size of an array whose length arrives in a redeclaration;
//! that size is interior-mutable. Binding a `struct`/`union`/`enum` tag or
//! typedef name to a type instead produces a [`tagged`](Type::tagged) copy,
//! so the spelling never leaks into other handles of the same definition.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use lark_utils::Name;

/// Classification of a type node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Void,
    Signed,
    Unsigned,
    Real,
    Pointer,
    Function,
    Array,
    Struct,
    Union,
}

/// Function parameter, or struct/union field.
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    pub name: Option<Name>,
    pub ty: Type,
}

impl Member {
    pub fn new(name: Option<Name>, ty: Type) -> Self {
        Self { name, ty }
    }
}

#[derive(Debug)]
struct TypeNode {
    kind: TypeKind,
    /// Total storage size in bytes. Zero means incomplete.
    size: Cell<usize>,
    /// Function return value, pointer target, or array element.
    next: Option<Type>,
    /// Function parameters, or struct/union fields.
    members: Vec<Member>,
    /// Function takes variable arguments.
    variadic: bool,
    /// Array whose length is only known at runtime.
    vla: bool,
    /// Tag spelling, taken from the symbol table when a tag or typedef is
    /// bound, so that references can be printed as `struct foo`. Only ever
    /// set on a node created by [`Type::tagged`].
    tag: Option<String>,
}

/// Handle to a type.
#[derive(Debug, Clone)]
pub struct Type(Rc<TypeNode>);

impl Type {
    fn node(kind: TypeKind, size: usize, next: Option<Type>, members: Vec<Member>) -> Self {
        Type(Rc::new(TypeNode {
            kind,
            size: Cell::new(size),
            next,
            members,
            variadic: false,
            vla: false,
            tag: None,
        }))
    }

    pub fn void() -> Self {
        Self::node(TypeKind::Void, 0, None, Vec::new())
    }

    /// Signed integer of the given width in bytes.
    pub fn signed(width: usize) -> Self {
        Self::node(TypeKind::Signed, width, None, Vec::new())
    }

    /// Unsigned integer of the given width in bytes.
    pub fn unsigned(width: usize) -> Self {
        Self::node(TypeKind::Unsigned, width, None, Vec::new())
    }

    pub fn char_type() -> Self {
        Self::signed(1)
    }

    pub fn int_type() -> Self {
        Self::signed(4)
    }

    pub fn long_type() -> Self {
        Self::signed(8)
    }

    pub fn float_type() -> Self {
        Self::node(TypeKind::Real, 4, None, Vec::new())
    }

    pub fn double_type() -> Self {
        Self::node(TypeKind::Real, 8, None, Vec::new())
    }

    /// Enumerations are represented as plain int; the tag slot carries the
    /// spelling once the tag symbol is bound.
    pub fn enum_type() -> Self {
        Self::signed(4)
    }

    pub fn pointer(to: Type) -> Self {
        Self::node(TypeKind::Pointer, 8, Some(to), Vec::new())
    }

    /// Array of known length.
    pub fn array(of: Type, len: usize) -> Self {
        let size = len * of.size_of();
        Self::node(TypeKind::Array, size, Some(of), Vec::new())
    }

    /// Array of unknown length, e.g. `int a[];`.
    pub fn incomplete_array(of: Type) -> Self {
        Self::node(TypeKind::Array, 0, Some(of), Vec::new())
    }

    /// Variable-length array. Incomplete at compile time; the address of the
    /// runtime length lives on the declaring symbol.
    pub fn vla(of: Type) -> Self {
        Type(Rc::new(TypeNode {
            kind: TypeKind::Array,
            size: Cell::new(0),
            next: Some(of),
            members: Vec::new(),
            variadic: false,
            vla: true,
            tag: None,
        }))
    }

    pub fn function(ret: Type, params: Vec<Member>, variadic: bool) -> Self {
        Type(Rc::new(TypeNode {
            kind: TypeKind::Function,
            size: Cell::new(0),
            next: Some(ret),
            members: params,
            variadic,
            vla: false,
            tag: None,
        }))
    }

    pub fn struct_type(fields: Vec<Member>) -> Self {
        let size = fields.iter().map(|m| m.ty.size_of()).sum();
        Self::node(TypeKind::Struct, size, None, fields)
    }

    pub fn union_type(fields: Vec<Member>) -> Self {
        let size = fields.iter().map(|m| m.ty.size_of()).max().unwrap_or(0);
        Self::node(TypeKind::Union, size, None, fields)
    }

    pub fn kind(&self) -> TypeKind {
        self.0.kind
    }

    /// Total storage size in bytes, as returned for `sizeof`. Zero for
    /// incomplete types and functions.
    pub fn size_of(&self) -> usize {
        self.0.size.get()
    }

    /// Element type of arrays and pointers, return type of functions.
    pub fn next(&self) -> Option<&Type> {
        self.0.next.as_ref()
    }

    /// Number of function parameters or struct/union fields.
    pub fn nmembers(&self) -> usize {
        self.0.members.len()
    }

    pub fn members(&self) -> &[Member] {
        &self.0.members
    }

    pub fn is_variadic(&self) -> bool {
        self.0.variadic
    }

    pub fn is_void(&self) -> bool {
        self.0.kind == TypeKind::Void
    }

    pub fn is_signed(&self) -> bool {
        self.0.kind == TypeKind::Signed
    }

    pub fn is_unsigned(&self) -> bool {
        self.0.kind == TypeKind::Unsigned
    }

    pub fn is_integer(&self) -> bool {
        self.is_signed() || self.is_unsigned()
    }

    /// Floating point of any width.
    pub fn is_real(&self) -> bool {
        self.0.kind == TypeKind::Real
    }

    pub fn is_float(&self) -> bool {
        self.is_real() && self.size_of() == 4
    }

    pub fn is_double(&self) -> bool {
        self.is_real() && self.size_of() == 8
    }

    pub fn is_arithmetic(&self) -> bool {
        self.is_integer() || self.is_real()
    }

    pub fn is_pointer(&self) -> bool {
        self.0.kind == TypeKind::Pointer
    }

    pub fn is_scalar(&self) -> bool {
        self.is_arithmetic() || self.is_pointer()
    }

    pub fn is_function(&self) -> bool {
        self.0.kind == TypeKind::Function
    }

    pub fn is_array(&self) -> bool {
        self.0.kind == TypeKind::Array
    }

    pub fn is_struct(&self) -> bool {
        self.0.kind == TypeKind::Struct
    }

    pub fn is_union(&self) -> bool {
        self.0.kind == TypeKind::Union
    }

    pub fn is_struct_or_union(&self) -> bool {
        self.is_struct() || self.is_union()
    }

    /// Everything that is not a function, in the sense of the standard.
    pub fn is_object(&self) -> bool {
        !self.is_function()
    }

    pub fn is_vla(&self) -> bool {
        self.0.vla
    }

    /// Number of elements of an array type; zero when unknown.
    pub fn array_len(&self) -> usize {
        debug_assert!(self.is_array());
        match self.next() {
            Some(elem) if elem.size_of() > 0 => self.size_of() / elem.size_of(),
            _ => 0,
        }
    }

    /// Completes an array type whose length was previously unknown.
    pub fn set_array_length(&self, len: usize) {
        debug_assert!(self.is_array());
        let elem = self.next().map(|t| t.size_of()).unwrap_or(0);
        self.0.size.set(len * elem);
    }

    /// Returns a copy of this type carrying the tag spelling used when
    /// printing references, e.g. `struct foo`. The definition itself and
    /// every other handle to it stay untouched, so binding further names to
    /// the same definition cannot rename earlier ones.
    pub fn tagged(&self, tag: &str) -> Type {
        Type(Rc::new(TypeNode {
            kind: self.0.kind,
            size: Cell::new(self.0.size.get()),
            next: self.0.next.clone(),
            members: self.0.members.clone(),
            variadic: self.0.variadic,
            vla: self.0.vla,
            tag: Some(tag.to_owned()),
        }))
    }

    pub fn tag(&self) -> Option<&str> {
        self.0.tag.as_deref()
    }
}

/// Structural equality: two types are equal when they have the same shape,
/// regardless of which declaration produced them.
impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        if Rc::ptr_eq(&self.0, &other.0) {
            return true;
        }

        self.kind() == other.kind()
            && self.size_of() == other.size_of()
            && self.is_variadic() == other.is_variadic()
            && self.0.next == other.0.next
            && self.0.members.len() == other.0.members.len()
            && self
                .0
                .members
                .iter()
                .zip(other.0.members.iter())
                .all(|(a, b)| a.ty == b.ty)
    }
}

impl Eq for Type {}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            TypeKind::Void => write!(f, "void"),
            TypeKind::Signed => match (self.tag(), self.size_of()) {
                (Some(tag), _) => write!(f, "enum {}", tag),
                (None, 1) => write!(f, "char"),
                (None, 2) => write!(f, "short"),
                (None, 4) => write!(f, "int"),
                _ => write!(f, "long"),
            },
            TypeKind::Unsigned => match self.size_of() {
                1 => write!(f, "unsigned char"),
                2 => write!(f, "unsigned short"),
                4 => write!(f, "unsigned int"),
                _ => write!(f, "unsigned long"),
            },
            TypeKind::Real => match self.size_of() {
                4 => write!(f, "float"),
                8 => write!(f, "double"),
                _ => write!(f, "long double"),
            },
            TypeKind::Pointer => {
                write!(f, "* ")?;
                match self.next() {
                    Some(next) => write!(f, "{}", next),
                    None => write!(f, "void"),
                }
            }
            TypeKind::Array => {
                if self.is_vla() {
                    write!(f, "[*] ")?;
                } else if self.size_of() > 0 {
                    write!(f, "[{}] ", self.array_len())?;
                } else {
                    write!(f, "[] ")?;
                }
                match self.next() {
                    Some(next) => write!(f, "{}", next),
                    None => Ok(()),
                }
            }
            TypeKind::Function => {
                write!(f, "(")?;
                for (i, member) in self.members().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", member.ty)?;
                }
                if self.is_variadic() {
                    if !self.members().is_empty() {
                        write!(f, ", ")?;
                    }
                    write!(f, "...")?;
                }
                write!(f, ") -> ")?;
                match self.next() {
                    Some(ret) => write!(f, "{}", ret),
                    None => write!(f, "void"),
                }
            }
            TypeKind::Struct | TypeKind::Union => {
                let word = if self.is_struct() { "struct" } else { "union" };
                match self.tag() {
                    Some(tag) => write!(f, "{} {}", word, tag),
                    None => write!(f, "{} {{{} members}}", word, self.nmembers()),
                }
            }
        }
    }
}
