use std::fmt;

use derive_more::Display;
use lark_types::Type;
use lark_utils::Name;

/// Name prefixes assigned to compiler generated symbols. None of them can
/// collide with a user identifier, which never starts with a period.
pub const PREFIX_TEMPORARY: &str = ".t";
pub const PREFIX_UNNAMED: &str = ".u";
pub const PREFIX_CONSTANT: &str = ".C";
pub const PREFIX_STRING: &str = ".LC";
pub const PREFIX_LABEL: &str = ".L";

/// Handle to a symbol stored in a [`SymbolTable`](crate::table::SymbolTable).
///
/// Slots are never moved or dropped while the table lives, so a handle stays
/// valid for the whole translation unit. Handles of discarded temporaries are
/// reused for symbols created later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SymbolId(u32);

impl SymbolId {
    pub(crate) fn new(index: usize) -> Self {
        SymbolId(u32::try_from(index).expect("symbol arena overflow"))
    }

    pub fn as_usize(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

/// What a symbol stands for.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymType {
    /// Declared, not yet seen defined in this translation unit.
    #[display("declaration")]
    Declaration,
    /// File scope object without initializer, or a goto target not yet seen
    /// defined. Becomes a zero initialized definition if nothing completes it.
    #[display("tentative")]
    Tentative,
    #[display("definition")]
    Definition,
    #[display("typedef")]
    Typedef,
    /// Struct, union or enum tag.
    #[display("tag")]
    Tag,
    /// Compiler generated jump target.
    #[display("label")]
    Label,
    /// Numeric constant backed by storage, e.g. a floating point literal.
    #[display("number")]
    Constant,
    /// String literal, as if declared `static char .LC[] = "..."`.
    #[display("string")]
    StringValue,
}

/// Visibility of a name outside and inside the translation unit.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Linkage {
    #[display("extern")]
    Extern,
    #[display("intern")]
    Intern,
    #[display("none")]
    None,
}

/// Bits of a numeric constant, interpreted according to the symbol's type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConstantValue {
    Int(i64),
    UInt(u64),
    Float(f32),
    Double(f64),
}

/// Variant payload of a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SymbolValue {
    #[default]
    None,
    Constant(ConstantValue),
    /// Interned bytes of a string literal.
    String(Name),
    /// For variably modified arrays, the symbol holding the runtime length.
    VlaAddress(SymbolId),
}

/// Everything the front-end knows about one named entity.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: Name,
    /// Disambiguation number. Zero for ordinary symbols whose name already
    /// identifies them; nonzero for synthetics and block scope statics.
    pub n: u32,
    pub ty: Type,
    pub symtype: SymType,
    pub linkage: Linkage,
    /// Scope depth this symbol was introduced at; 0 is file scope. Lowered
    /// when a function first declared in a block is redeclared further out.
    pub depth: usize,
    /// Set once a lookup has returned this symbol.
    pub referenced: bool,
    pub value: SymbolValue,
    /// Byte offset assigned during stack allocation; untouched here.
    pub stack_offset: i32,
}
