use std::collections::HashMap;

use log::debug;

use lark_types::Type;
use lark_utils::{Errors, Name, StrInterner};

use crate::error::SymtabError;
use crate::namespace::{Namespace, NamespaceId};
use crate::symbol::{
    ConstantValue, Linkage, SymType, Symbol, SymbolId, SymbolValue, PREFIX_CONSTANT, PREFIX_LABEL,
    PREFIX_STRING, PREFIX_TEMPORARY, PREFIX_UNNAMED,
};

/// Seed capacity of the cross-scope function registry.
const FUNCTIONS_CAPACITY: usize = 1024;

/// Outcome of reconciling an existing symbol's type with a redeclaration.
enum Coercion {
    Keep,
    Adopt,
    CompleteArray(usize),
    Conflict,
}

/// All symbol state of one translation unit.
///
/// Owns the three namespaces (ordinary identifiers, goto labels, and
/// struct/union/enum tags), the arena every [`Symbol`] lives in, the pool of
/// records recycled between function bodies, the registry unifying function
/// declarations across scopes, and the interner handing out [`Name`] keys.
#[derive(Debug)]
pub struct SymbolTable {
    pub(crate) interner: StrInterner,
    /// Arena of every symbol ever created. Slots are stable; recycling
    /// overwrites a slot in place.
    pub(crate) symbols: Vec<Symbol>,
    /// Discarded temporaries and labels, reused before growing the arena.
    pool: Vec<SymbolId>,
    pub(crate) namespaces: [Namespace; 3],
    /// Every function declaration in the translation unit, so that forward
    /// declarations made in inner scope resolve to the same symbol as the
    /// definition:
    ///
    /// ```c
    /// int foo(void) {
    ///     int bar(int);
    ///     return bar(42);
    /// }
    ///
    /// int bar(int a) {
    ///     return a * a;
    /// }
    /// ```
    functions: HashMap<Name, SymbolId>,
    /// First symbol spelled `memcpy`, kept for emitting structure copies.
    decl_memcpy: Option<SymbolId>,
    memcpy_name: Name,
    prefix_temporary: Name,
    prefix_unnamed: Name,
    prefix_constant: Name,
    prefix_string: Name,
    prefix_label: Name,
    temporary_count: u32,
    unnamed_count: u32,
    constant_count: u32,
    string_count: u32,
    label_count: u32,
    static_count: u32,
}

impl SymbolTable {
    pub fn new() -> Self {
        let mut interner = StrInterner::new();
        let prefix_temporary = interner.intern(PREFIX_TEMPORARY);
        let prefix_unnamed = interner.intern(PREFIX_UNNAMED);
        let prefix_constant = interner.intern(PREFIX_CONSTANT);
        let prefix_string = interner.intern(PREFIX_STRING);
        let prefix_label = interner.intern(PREFIX_LABEL);
        let memcpy_name = interner.intern("memcpy");

        SymbolTable {
            interner,
            symbols: Vec::new(),
            pool: Vec::new(),
            namespaces: [
                Namespace::new("identifiers"),
                Namespace::new("labels"),
                Namespace::new("tags"),
            ],
            functions: HashMap::with_capacity(FUNCTIONS_CAPACITY),
            decl_memcpy: None,
            memcpy_name,
            prefix_temporary,
            prefix_unnamed,
            prefix_constant,
            prefix_string,
            prefix_label,
            temporary_count: 0,
            unnamed_count: 0,
            constant_count: 0,
            string_count: 0,
            label_count: 0,
            static_count: 0,
        }
    }

    pub fn intern(&mut self, spelling: &str) -> Name {
        self.interner.intern(spelling)
    }

    pub fn spelling(&self, name: Name) -> &str {
        &self.interner[name]
    }

    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.as_usize()]
    }

    pub fn symbol_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id.as_usize()]
    }

    pub fn decl_memcpy(&self) -> Option<SymbolId> {
        self.decl_memcpy
    }

    pub fn current_depth(&self, ns: NamespaceId) -> usize {
        self.namespaces[ns as usize].depth()
    }

    pub fn push_scope(&mut self, ns: NamespaceId) {
        self.namespaces[ns as usize].push();
    }

    /// Leaves the innermost scope. Popping the outermost scope tears the
    /// namespace down; for the label namespace, which is per function, every
    /// label still tentative at that point is reported as undefined.
    pub fn pop_scope(&mut self, ns: NamespaceId) -> Result<(), Errors<SymtabError>> {
        let active = self.namespaces[ns as usize].active;
        debug_assert!(active > 0, "unbalanced scope pop");

        if active > 1 {
            self.namespaces[ns as usize].active -= 1;
            return Ok(());
        }

        let mut errors = Errors::new();
        if ns == NamespaceId::Labels {
            let namespace = &self.namespaces[ns as usize];
            for &id in &namespace.list {
                let sym = &self.symbols[id.as_usize()];
                if sym.symtype == SymType::Tentative {
                    errors.push(SymtabError::UndefinedLabel {
                        name: self.render_name(sym),
                    });
                }
            }
        }

        self.namespaces[ns as usize].teardown();

        // Recycled records are freed only once, when the identifier
        // namespace goes away at end of translation unit. Same for the
        // function registry.
        if ns == NamespaceId::Identifiers {
            self.pool.clear();
            self.functions.clear();
        }

        if errors.has_errors() {
            return Err(errors);
        }

        Ok(())
    }

    /// Retrieves the symbol a name resolves to from the current scope, or
    /// nothing if it is not visible. A hit marks the symbol referenced.
    pub fn lookup(&mut self, ns: NamespaceId, name: Name) -> Option<SymbolId> {
        let id = self.namespaces[ns as usize].lookup(name)?;
        self.symbols[id.as_usize()].referenced = true;
        Some(id)
    }

    /// Registers a declaration in the current scope, or resolves to and
    /// completes an existing symbol when the name occurs repeatedly.
    ///
    /// Labels go through [`create_label`](Self::create_label) instead, and
    /// tags only exist in the tag namespace.
    pub fn add(
        &mut self,
        ns: NamespaceId,
        name: Name,
        ty: Type,
        symtype: SymType,
        linkage: Linkage,
    ) -> Result<SymbolId, SymtabError> {
        debug_assert!(symtype != SymType::Label);
        debug_assert!(symtype != SymType::Tag || ns == NamespaceId::Tags);

        let mut existing = None;
        if symtype != SymType::StringValue {
            existing = self.lookup(ns, name);

            // All function declarations must agree, regardless of scope.
            if existing.is_none() && ty.is_function() && ns == NamespaceId::Identifiers {
                if let Some(id) = self.functions.get(&name).copied() {
                    self.apply_type(id, &ty)?;
                    self.namespaces[ns as usize].make_visible(name, id);
                    let depth = self.namespaces[ns as usize].depth();
                    let sym = &mut self.symbols[id.as_usize()];
                    if depth < sym.depth {
                        sym.depth = depth;
                    }
                    return Ok(id);
                }
            }
        }

        // Try to complete an existing declaration.
        if let Some(id) = existing {
            let depth = self.namespaces[ns as usize].depth();
            let prior = &self.symbols[id.as_usize()];
            let (prior_symtype, prior_linkage, prior_depth) =
                (prior.symtype, prior.linkage, prior.depth);

            if linkage == Linkage::Extern
                && symtype == SymType::Declaration
                && matches!(
                    prior_symtype,
                    SymType::Declaration | SymType::Tentative | SymType::Definition
                )
            {
                self.apply_type(id, &ty)?;
                return Ok(id);
            }

            if prior_depth == depth && depth == 0 {
                if prior_linkage == linkage
                    && ((symtype == SymType::Definition
                        && matches!(prior_symtype, SymType::Tentative | SymType::Declaration))
                        || (prior_symtype == SymType::Definition
                            && symtype == SymType::Tentative))
                {
                    self.apply_type(id, &ty)?;
                    self.symbols[id.as_usize()].symtype = SymType::Definition;
                } else if prior_linkage == linkage
                    && prior_symtype == SymType::Declaration
                    && symtype == SymType::Tentative
                {
                    self.apply_type(id, &ty)?;
                    self.symbols[id.as_usize()].symtype = SymType::Tentative;
                } else if prior_linkage == linkage
                    && prior_symtype == SymType::Definition
                    && symtype == SymType::Declaration
                {
                    if self.symbols[id.as_usize()].ty != ty {
                        return Err(SymtabError::ConflictingTypes {
                            name: self.interner[name].to_owned(),
                        });
                    }
                } else if prior_symtype != symtype || prior_linkage != linkage {
                    return Err(SymtabError::DeclarationMismatch {
                        name: self.interner[name].to_owned(),
                    });
                } else {
                    self.apply_type(id, &ty)?;
                }
                return Ok(id);
            } else if prior_depth == depth {
                return Err(SymtabError::DuplicateDefinition {
                    name: self.interner[name].to_owned(),
                });
            }
            // Different depth: the new declaration shadows the old one.
        }

        // Create a new symbol.
        let depth = self.namespaces[ns as usize].depth();

        // Scoped statics get unique names in order to not collide with
        // other external declarations.
        let n = if linkage == Linkage::Intern && depth > 0 {
            self.static_count += 1;
            self.static_count
        } else {
            0
        };

        let id = self.alloc(Symbol {
            name,
            n,
            ty: ty.clone(),
            symtype,
            linkage,
            depth,
            referenced: false,
            value: SymbolValue::None,
            stack_offset: 0,
        });

        if self.decl_memcpy.is_none() && name == self.memcpy_name {
            self.decl_memcpy = Some(id);
        }

        // Tags always name their type; typedefs only when they name an
        // aggregate, so that plain `typedef int t` keeps printing as int.
        // The symbol stores a tagged copy; the definition and every other
        // handle to it keep their own spelling.
        if symtype == SymType::Tag || (symtype == SymType::Typedef && ty.is_struct_or_union()) {
            self.symbols[id.as_usize()].ty = ty.tagged(&self.interner[name]);
        }

        self.namespaces[ns as usize].list.push(id);
        self.namespaces[ns as usize].make_visible(name, id);
        if ty.is_function() {
            self.functions.insert(name, id);
        }

        debug!(
            "\t[type: {}, link: {}]\n\t{} :: {}",
            symtype,
            linkage,
            self.emitted_name(id),
            self.symbols[id.as_usize()].ty
        );

        Ok(id)
    }

    /// Reconciles an existing symbol's type with a redeclaration.
    ///
    /// Symbols can be declared multiple times, with incomplete or complete
    /// types; only functions and arrays can exist as incomplete. Anything
    /// else must carry an identical type each time. For functions, the last
    /// parameter list applies for as long as the symbol is still tentative.
    fn apply_type(&mut self, id: SymbolId, ty: &Type) -> Result<(), SymtabError> {
        let action = {
            let sym = &self.symbols[id.as_usize()];

            if sym.ty == *ty && !(sym.ty.is_function() && sym.symtype != SymType::Definition) {
                Coercion::Keep
            } else if sym.ty.is_function() {
                let both_prototyped = sym.ty.nmembers() > 0 && ty.nmembers() > 0;
                if ty.is_function()
                    && sym.ty.next() == ty.next()
                    && (!both_prototyped || sym.ty.nmembers() == ty.nmembers())
                {
                    Coercion::Adopt
                } else {
                    Coercion::Conflict
                }
            } else if sym.ty.is_array()
                && ty.is_array()
                && sym.ty.next() == ty.next()
            {
                if sym.ty.size_of() == 0 {
                    debug_assert!(ty.size_of() > 0);
                    Coercion::CompleteArray(ty.array_len())
                } else if ty.size_of() == 0 {
                    Coercion::Keep
                } else {
                    Coercion::Conflict
                }
            } else {
                Coercion::Conflict
            }
        };

        match action {
            Coercion::Keep => {}
            Coercion::Adopt => self.symbols[id.as_usize()].ty = ty.clone(),
            Coercion::CompleteArray(len) => self.symbols[id.as_usize()].ty.set_array_length(len),
            Coercion::Conflict => {
                let sym = &self.symbols[id.as_usize()];
                return Err(SymtabError::IncompatibleDeclaration {
                    name: self.interner[sym.name].to_owned(),
                    existing: sym.ty.to_string(),
                    applied: ty.to_string(),
                });
            }
        }

        Ok(())
    }

    /// Allocates a symbol record, preferring the recycling pool over the
    /// arena.
    fn alloc(&mut self, sym: Symbol) -> SymbolId {
        match self.pool.pop() {
            Some(id) => {
                self.symbols[id.as_usize()] = sym;
                id
            }
            None => {
                let id = SymbolId::new(self.symbols.len());
                self.symbols.push(sym);
                id
            }
        }
    }

    /// Creates a symbol holding an intermediate value during expression
    /// evaluation. Not attached to any scope; give it back with
    /// [`discard`](Self::discard) when the value dies.
    pub fn create_temporary(&mut self, ty: Type) -> SymbolId {
        self.temporary_count += 1;
        self.alloc(Symbol {
            name: self.prefix_temporary,
            n: self.temporary_count,
            ty,
            symtype: SymType::Definition,
            linkage: Linkage::None,
            depth: 0,
            referenced: false,
            value: SymbolValue::None,
            stack_offset: 0,
        })
    }

    /// Creates a symbol for an anonymous aggregate, e.g. a compound literal
    /// or an unnamed struct object.
    pub fn create_unnamed(&mut self, ty: Type) -> SymbolId {
        let linkage = if self.current_depth(NamespaceId::Identifiers) == 0 {
            Linkage::Intern
        } else {
            Linkage::None
        };

        self.unnamed_count += 1;
        self.alloc(Symbol {
            name: self.prefix_unnamed,
            n: self.unnamed_count,
            ty,
            symtype: SymType::Definition,
            linkage,
            depth: 0,
            referenced: false,
            value: SymbolValue::None,
            stack_offset: 0,
        })
    }

    /// Creates a symbol backing a numeric constant, and registers it for
    /// emission. The back-end inlines integer constants and only ever emits
    /// storage for the floating point ones.
    pub fn create_constant(&mut self, ty: Type, value: ConstantValue) -> SymbolId {
        self.constant_count += 1;
        let id = self.alloc(Symbol {
            name: self.prefix_constant,
            n: self.constant_count,
            ty,
            symtype: SymType::Constant,
            linkage: Linkage::Intern,
            depth: 0,
            referenced: false,
            value: SymbolValue::Constant(value),
            stack_offset: 0,
        });
        self.namespaces[NamespaceId::Identifiers as usize].list.push(id);
        id
    }

    /// Creates a symbol holding a string literal, as if declared
    /// `static char .LC[] = "..."`, and registers it for emission.
    pub fn create_string(&mut self, text: &str) -> SymbolId {
        let value = self.interner.intern(text);
        let ty = Type::array(Type::char_type(), text.len() + 1);

        self.string_count += 1;
        let id = self.alloc(Symbol {
            name: self.prefix_string,
            n: self.string_count,
            ty,
            symtype: SymType::StringValue,
            linkage: Linkage::Intern,
            depth: 0,
            referenced: false,
            value: SymbolValue::String(value),
            stack_offset: 0,
        });
        self.namespaces[NamespaceId::Identifiers as usize].list.push(id);
        id
    }

    /// Creates a compiler internal jump target.
    pub fn create_label(&mut self) -> SymbolId {
        self.label_count += 1;
        self.alloc(Symbol {
            name: self.prefix_label,
            n: self.label_count,
            ty: Type::void(),
            symtype: SymType::Label,
            linkage: Linkage::Intern,
            depth: 0,
            referenced: false,
            value: SymbolValue::None,
            stack_offset: 0,
        })
    }

    /// Returns a temporary or label to the recycling pool. The record is
    /// reused by the next allocation; the handle must not be used again.
    pub fn discard(&mut self, id: SymbolId) {
        self.pool.push(id);
    }

    pub fn is_temporary(&self, id: SymbolId) -> bool {
        self.symbols[id.as_usize()].name == self.prefix_temporary
    }

    /// The spelling used by the back-end for this symbol.
    pub fn emitted_name(&self, id: SymbolId) -> String {
        self.render_name(&self.symbols[id.as_usize()])
    }

    /// Temporaries and string literals are named `.t` and `.LC`; for those,
    /// the numeral is appended with nothing in between. Disambiguated
    /// statics get a period between the spelling and the number.
    pub(crate) fn render_name(&self, sym: &Symbol) -> String {
        let raw = &self.interner[sym.name];
        if sym.n == 0 {
            raw.to_owned()
        } else if raw.starts_with('.') {
            format!("{}{}", raw, sym.n)
        } else {
            format!("{}.{}", raw, sym.n)
        }
    }

    /// Advances the namespace's cursor to the next symbol the back-end
    /// should emit storage for, or nothing once the list is drained.
    pub fn yield_declaration(&mut self, ns: NamespaceId) -> Option<SymbolId> {
        let namespace = &mut self.namespaces[ns as usize];

        while namespace.cursor < namespace.list.len() {
            let id = namespace.list[namespace.cursor];
            namespace.cursor += 1;

            let sym = &self.symbols[id.as_usize()];
            let emit = match sym.symtype {
                SymType::Tentative | SymType::StringValue | SymType::Definition => true,
                SymType::Constant => sym.ty.is_real(),
                SymType::Declaration => {
                    sym.linkage == Linkage::Extern
                        && (sym.referenced || Some(id) == self.decl_memcpy)
                }
                _ => false,
            };

            if emit {
                return Some(id);
            }
        }

        None
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lark_types::Member;

    use NamespaceId::{Identifiers, Labels, Tags};

    fn fn_type(ret: Type, params: &[Type]) -> Type {
        Type::function(
            ret,
            params.iter().cloned().map(|ty| Member::new(None, ty)).collect(),
            false,
        )
    }

    #[test]
    fn tentative_definition_merging() {
        let mut table = SymbolTable::new();
        table.push_scope(Identifiers);

        let x = table.intern("x");
        let a = table
            .add(Identifiers, x, Type::int_type(), SymType::Declaration, Linkage::Extern)
            .unwrap();
        let b = table
            .add(Identifiers, x, Type::int_type(), SymType::Tentative, Linkage::Extern)
            .unwrap();
        let c = table
            .add(Identifiers, x, Type::int_type(), SymType::Definition, Linkage::Extern)
            .unwrap();

        assert_eq!(a, b);
        assert_eq!(b, c);

        let sym = table.symbol(c);
        assert_eq!(sym.symtype, SymType::Definition);
        assert_eq!(sym.linkage, Linkage::Extern);
        assert_eq!(sym.depth, 0);
        assert_eq!(sym.n, 0);

        table.pop_scope(Identifiers).unwrap();
    }

    #[test]
    fn extern_redeclaration_is_idempotent() {
        let mut table = SymbolTable::new();
        table.push_scope(Identifiers);

        let f = table.intern("f");
        let ty = fn_type(Type::int_type(), &[Type::int_type()]);
        let a = table
            .add(Identifiers, f, ty.clone(), SymType::Declaration, Linkage::Extern)
            .unwrap();
        let b = table
            .add(Identifiers, f, ty, SymType::Declaration, Linkage::Extern)
            .unwrap();

        assert_eq!(a, b);
        assert_eq!(table.symbol(a).symtype, SymType::Declaration);
    }

    #[test]
    fn initializer_completes_tentative_definition() {
        let mut table = SymbolTable::new();
        table.push_scope(Identifiers);

        let a = table.intern("a");
        let first = table
            .add(Identifiers, a, Type::int_type(), SymType::Tentative, Linkage::Extern)
            .unwrap();
        let second = table
            .add(Identifiers, a, Type::int_type(), SymType::Definition, Linkage::Extern)
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(table.symbol(first).symtype, SymType::Definition);
    }

    #[test]
    fn inner_function_declaration_unifies_with_outer() {
        let mut table = SymbolTable::new();
        table.push_scope(Identifiers);

        let f = table.intern("f");
        let ty = fn_type(Type::int_type(), &[Type::int_type()]);

        let outer = table
            .add(Identifiers, f, ty.clone(), SymType::Declaration, Linkage::Extern)
            .unwrap();

        table.push_scope(Identifiers);
        let inner = table
            .add(Identifiers, f, ty.clone(), SymType::Declaration, Linkage::Extern)
            .unwrap();
        assert_eq!(inner, outer);
        table.pop_scope(Identifiers).unwrap();

        let def = table
            .add(Identifiers, f, ty, SymType::Definition, Linkage::Extern)
            .unwrap();
        assert_eq!(def, outer);
        assert_eq!(table.symbol(def).symtype, SymType::Definition);
        assert_eq!(table.symbol(def).depth, 0);

        table.pop_scope(Identifiers).unwrap();
    }

    #[test]
    fn registry_resolves_declaration_that_went_out_of_scope() {
        let mut table = SymbolTable::new();
        table.push_scope(Identifiers);
        table.push_scope(Identifiers);

        let bar = table.intern("bar");
        let ty = fn_type(Type::int_type(), &[Type::int_type()]);
        let inner = table
            .add(Identifiers, bar, ty.clone(), SymType::Declaration, Linkage::Extern)
            .unwrap();
        assert_eq!(table.symbol(inner).depth, 1);

        table.pop_scope(Identifiers).unwrap();
        assert_eq!(table.lookup(Identifiers, bar), None);

        // The definition still resolves to the same symbol, through the
        // registry, and pulls its depth out to file scope.
        let def = table
            .add(Identifiers, bar, ty, SymType::Definition, Linkage::Extern)
            .unwrap();
        assert_eq!(def, inner);
        assert_eq!(table.symbol(def).depth, 0);
        assert_eq!(table.lookup(Identifiers, bar), Some(def));

        // The registry path leaves the kind untouched; the parser upgrades
        // it once it has seen the body.
        assert_eq!(table.symbol(def).symtype, SymType::Declaration);
        table.symbol_mut(def).symtype = SymType::Definition;
    }

    #[test]
    fn registry_visibility_ends_with_the_scope() {
        let mut table = SymbolTable::new();
        table.push_scope(Identifiers);
        table.push_scope(Identifiers);

        let g = table.intern("g");
        let ty = fn_type(Type::void(), &[]);
        let first = table
            .add(Identifiers, g, ty.clone(), SymType::Declaration, Linkage::Extern)
            .unwrap();

        table.pop_scope(Identifiers).unwrap();
        table.push_scope(Identifiers);

        // The frame at this depth is reused; its stale entries must not be
        // visible.
        assert_eq!(table.lookup(Identifiers, g), None);

        let again = table
            .add(Identifiers, g, ty, SymType::Declaration, Linkage::Extern)
            .unwrap();
        assert_eq!(again, first);
        assert_eq!(table.symbol(again).depth, 1);
    }

    #[test]
    fn duplicate_definition_in_block_is_fatal() {
        let mut table = SymbolTable::new();
        table.push_scope(Identifiers);
        table.push_scope(Identifiers);

        let x = table.intern("x");
        table
            .add(Identifiers, x, Type::int_type(), SymType::Definition, Linkage::Intern)
            .unwrap();
        let err = table
            .add(Identifiers, x, Type::int_type(), SymType::Definition, Linkage::Intern)
            .unwrap_err();

        assert!(matches!(err, SymtabError::DuplicateDefinition { name } if name == "x"));
    }

    #[test]
    fn incompatible_file_scope_redefinition_is_fatal() {
        let mut table = SymbolTable::new();
        table.push_scope(Identifiers);

        let x = table.intern("x");
        table
            .add(Identifiers, x, Type::int_type(), SymType::Definition, Linkage::Extern)
            .unwrap();
        let err = table
            .add(Identifiers, x, Type::float_type(), SymType::Definition, Linkage::Extern)
            .unwrap_err();

        assert!(matches!(err, SymtabError::IncompatibleDeclaration { .. }));
    }

    #[test]
    fn mismatched_kind_is_fatal() {
        let mut table = SymbolTable::new();
        table.push_scope(Identifiers);

        let t = table.intern("t");
        table
            .add(Identifiers, t, Type::int_type(), SymType::Typedef, Linkage::None)
            .unwrap();
        let err = table
            .add(Identifiers, t, Type::int_type(), SymType::Tentative, Linkage::Extern)
            .unwrap_err();

        assert!(matches!(err, SymtabError::DeclarationMismatch { name } if name == "t"));
    }

    #[test]
    fn temporaries_recycle_through_the_pool() {
        let mut table = SymbolTable::new();

        let first: Vec<_> = (0..1000)
            .map(|_| table.create_temporary(Type::int_type()))
            .collect();
        for &id in &first {
            table.discard(id);
        }

        let second: Vec<_> = (0..1000)
            .map(|_| table.create_temporary(Type::long_type()))
            .collect();

        // The pool is a stack, so slots come back in reverse order and no
        // new records are allocated.
        let mut expected = first.clone();
        expected.reverse();
        assert_eq!(second, expected);

        // Numbering keeps counting up; recycled records were reset.
        assert_eq!(table.symbol(second[0]).n, 1001);
        assert_eq!(table.symbol(second[0]).ty, Type::long_type());
    }

    #[test]
    fn pool_is_drained_at_teardown() {
        let mut table = SymbolTable::new();
        table.push_scope(Identifiers);

        let t = table.create_temporary(Type::int_type());
        table.discard(t);
        table.pop_scope(Identifiers).unwrap();

        // Nothing to recycle anymore; a fresh record is allocated.
        let after = table.create_temporary(Type::int_type());
        assert_ne!(after, t);
    }

    #[test]
    fn yield_declaration_selects_emittable_symbols() {
        let mut table = SymbolTable::new();
        table.push_scope(Identifiers);

        let unused = table.intern("unused");
        table
            .add(Identifiers, unused, Type::int_type(), SymType::Declaration, Linkage::Extern)
            .unwrap();

        let used = table.intern("used");
        let used_id = table
            .add(Identifiers, used, Type::int_type(), SymType::Declaration, Linkage::Extern)
            .unwrap();
        assert_eq!(table.lookup(Identifiers, used), Some(used_id));

        let k = table.create_constant(Type::double_type(), ConstantValue::Double(3.14));
        table.create_constant(Type::int_type(), ConstantValue::Int(42));

        assert_eq!(table.yield_declaration(Identifiers), Some(used_id));
        assert_eq!(table.yield_declaration(Identifiers), Some(k));
        assert_eq!(table.yield_declaration(Identifiers), None);
    }

    #[test]
    fn block_scope_statics_get_distinct_suffixes() {
        let mut table = SymbolTable::new();
        table.push_scope(Identifiers);

        let x = table.intern("x");

        table.push_scope(Identifiers);
        let a = table
            .add(Identifiers, x, Type::int_type(), SymType::Definition, Linkage::Intern)
            .unwrap();
        table.pop_scope(Identifiers).unwrap();

        table.push_scope(Identifiers);
        let b = table
            .add(Identifiers, x, Type::int_type(), SymType::Definition, Linkage::Intern)
            .unwrap();
        table.pop_scope(Identifiers).unwrap();

        assert_ne!(a, b);
        let (na, nb) = (table.symbol(a).n, table.symbol(b).n);
        assert!(na > 0 && nb > 0 && na != nb);
        assert_eq!(table.emitted_name(a), format!("x.{}", na));
        assert_eq!(table.emitted_name(b), format!("x.{}", nb));

        // Both are definitions, both get emitted.
        assert_eq!(table.yield_declaration(Identifiers), Some(a));
        assert_eq!(table.yield_declaration(Identifiers), Some(b));
        assert_eq!(table.yield_declaration(Identifiers), None);
    }

    #[test]
    fn undefined_label_reported_on_function_exit() {
        let mut table = SymbolTable::new();
        table.push_scope(Labels);

        let l = table.intern("L");
        table
            .add(Labels, l, Type::void(), SymType::Tentative, Linkage::Intern)
            .unwrap();

        let errors = table.pop_scope(Labels).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors
            .iter()
            .all(|e| matches!(e, SymtabError::UndefinedLabel { name } if name == "L")));
    }

    #[test]
    fn defined_label_passes_function_exit() {
        let mut table = SymbolTable::new();
        table.push_scope(Labels);

        let l = table.intern("L");
        let id = table
            .add(Labels, l, Type::void(), SymType::Tentative, Linkage::Intern)
            .unwrap();
        table.symbol_mut(id).symtype = SymType::Definition;

        table.pop_scope(Labels).unwrap();
    }

    #[test]
    fn string_literal_symbol() {
        let mut table = SymbolTable::new();

        let s = table.create_string("abc");
        let sym = table.symbol(s);

        assert_eq!(sym.symtype, SymType::StringValue);
        assert_eq!(sym.linkage, Linkage::Intern);
        assert!(sym.ty.is_array());
        assert_eq!(sym.ty.size_of(), 4);
        assert!(sym.n > 0);

        match sym.value {
            SymbolValue::String(name) => assert_eq!(table.spelling(name), "abc"),
            ref other => panic!("unexpected payload {:?}", other),
        }
        assert_eq!(table.emitted_name(s), ".LC1");
    }

    #[test]
    fn synthetic_names_concatenate_without_separator() {
        let mut table = SymbolTable::new();
        table.push_scope(Identifiers);

        let t = table.create_temporary(Type::int_type());
        assert_eq!(table.emitted_name(t), ".t1");
        assert!(table.is_temporary(t));

        let u = table.create_unnamed(Type::struct_type(Vec::new()));
        assert_eq!(table.emitted_name(u), ".u1");
        assert_eq!(table.symbol(u).linkage, Linkage::Intern);

        let l = table.create_label();
        assert_eq!(table.emitted_name(l), ".L1");
        assert_eq!(table.symbol(l).symtype, SymType::Label);
        assert_eq!(table.symbol(l).ty, Type::void());

        table.push_scope(Identifiers);
        let inner = table.create_unnamed(Type::struct_type(Vec::new()));
        assert_eq!(table.symbol(inner).linkage, Linkage::None);
        assert_eq!(table.emitted_name(inner), ".u2");
    }

    #[test]
    fn shadowing_creates_a_new_symbol_per_depth() {
        let mut table = SymbolTable::new();
        table.push_scope(Identifiers);

        let x = table.intern("x");
        let outer = table
            .add(Identifiers, x, Type::int_type(), SymType::Tentative, Linkage::Extern)
            .unwrap();

        table.push_scope(Identifiers);
        let inner = table
            .add(Identifiers, x, Type::char_type(), SymType::Definition, Linkage::None)
            .unwrap();

        assert_ne!(outer, inner);
        assert_eq!(table.symbol(inner).depth, 1);
        assert_eq!(table.lookup(Identifiers, x), Some(inner));

        table.pop_scope(Identifiers).unwrap();
        assert_eq!(table.lookup(Identifiers, x), Some(outer));
    }

    #[test]
    fn function_prototype_refines_while_tentative() {
        let mut table = SymbolTable::new();
        table.push_scope(Identifiers);

        let f = table.intern("f");
        let unprototyped = fn_type(Type::int_type(), &[]);
        let prototyped = fn_type(Type::int_type(), &[Type::int_type()]);

        let a = table
            .add(Identifiers, f, unprototyped, SymType::Declaration, Linkage::Extern)
            .unwrap();
        let b = table
            .add(Identifiers, f, prototyped.clone(), SymType::Declaration, Linkage::Extern)
            .unwrap();

        assert_eq!(a, b);
        assert_eq!(table.symbol(a).ty, prototyped);
    }

    #[test]
    fn disagreeing_prototypes_are_fatal() {
        let mut table = SymbolTable::new();
        table.push_scope(Identifiers);

        let f = table.intern("f");
        table
            .add(
                Identifiers,
                f,
                fn_type(Type::int_type(), &[Type::int_type()]),
                SymType::Declaration,
                Linkage::Extern,
            )
            .unwrap();
        let err = table
            .add(
                Identifiers,
                f,
                fn_type(Type::int_type(), &[Type::int_type(), Type::int_type()]),
                SymType::Declaration,
                Linkage::Extern,
            )
            .unwrap_err();

        assert!(matches!(err, SymtabError::IncompatibleDeclaration { .. }));
    }

    #[test]
    fn mismatched_return_type_is_fatal() {
        let mut table = SymbolTable::new();
        table.push_scope(Identifiers);

        let f = table.intern("f");
        table
            .add(Identifiers, f, fn_type(Type::int_type(), &[]), SymType::Declaration, Linkage::Extern)
            .unwrap();
        let err = table
            .add(Identifiers, f, fn_type(Type::float_type(), &[]), SymType::Declaration, Linkage::Extern)
            .unwrap_err();

        assert!(matches!(err, SymtabError::IncompatibleDeclaration { .. }));
    }

    #[test]
    fn array_length_completed_by_redeclaration() {
        let mut table = SymbolTable::new();
        table.push_scope(Identifiers);

        let a = table.intern("a");
        let first = table
            .add(
                Identifiers,
                a,
                Type::incomplete_array(Type::int_type()),
                SymType::Tentative,
                Linkage::Extern,
            )
            .unwrap();
        let second = table
            .add(
                Identifiers,
                a,
                Type::array(Type::int_type(), 3),
                SymType::Tentative,
                Linkage::Extern,
            )
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(table.symbol(first).ty.array_len(), 3);
        assert_eq!(table.symbol(first).ty.size_of(), 12);
    }

    #[test]
    fn disagreeing_array_lengths_are_fatal() {
        let mut table = SymbolTable::new();
        table.push_scope(Identifiers);

        let a = table.intern("a");
        table
            .add(
                Identifiers,
                a,
                Type::array(Type::int_type(), 3),
                SymType::Tentative,
                Linkage::Extern,
            )
            .unwrap();
        let err = table
            .add(
                Identifiers,
                a,
                Type::array(Type::int_type(), 5),
                SymType::Tentative,
                Linkage::Extern,
            )
            .unwrap_err();

        assert!(matches!(err, SymtabError::IncompatibleDeclaration { .. }));
    }

    #[test]
    fn memcpy_is_cached_and_emitted_without_references() {
        let mut table = SymbolTable::new();
        table.push_scope(Identifiers);

        let memcpy = table.intern("memcpy");
        let ty = fn_type(
            Type::pointer(Type::void()),
            &[
                Type::pointer(Type::void()),
                Type::pointer(Type::void()),
                Type::unsigned(8),
            ],
        );
        let id = table
            .add(Identifiers, memcpy, ty, SymType::Declaration, Linkage::Extern)
            .unwrap();

        assert_eq!(table.decl_memcpy(), Some(id));
        assert_eq!(table.yield_declaration(Identifiers), Some(id));
    }

    #[test]
    fn tags_live_in_their_own_namespace() {
        let mut table = SymbolTable::new();
        table.push_scope(Identifiers);
        table.push_scope(Tags);

        let point = table.intern("point");
        let ty = Type::struct_type(vec![
            Member::new(None, Type::int_type()),
            Member::new(None, Type::int_type()),
        ]);
        let tag = table
            .add(Tags, point, ty.clone(), SymType::Tag, Linkage::None)
            .unwrap();

        // Binding the tag names the symbol's copy of the type for printing;
        // the definition handle itself stays anonymous.
        assert_eq!(table.symbol(tag).ty.to_string(), "struct point");
        assert_eq!(ty.to_string(), "struct {2 members}");

        // The identifier namespace is unaffected.
        assert_eq!(table.lookup(Identifiers, point), None);
        assert_eq!(table.lookup(Tags, point), Some(tag));
    }

    #[test]
    fn typedef_of_tagged_struct_does_not_rename_the_tag() {
        let mut table = SymbolTable::new();
        table.push_scope(Identifiers);
        table.push_scope(Tags);

        let foo = table.intern("foo");
        let def = Type::struct_type(vec![Member::new(None, Type::int_type())]);
        let tag = table
            .add(Tags, foo, def, SymType::Tag, Linkage::None)
            .unwrap();

        // typedef struct foo Bar; reuses the tag symbol's type handle.
        let bar = table.intern("Bar");
        let reused = table.symbol(tag).ty.clone();
        let alias = table
            .add(Identifiers, bar, reused, SymType::Typedef, Linkage::None)
            .unwrap();

        assert_eq!(table.symbol(alias).ty.to_string(), "struct Bar");
        assert_eq!(table.symbol(tag).ty.to_string(), "struct foo");
    }

    #[test]
    fn vla_length_symbol_is_reachable_from_payload() {
        let mut table = SymbolTable::new();
        table.push_scope(Identifiers);
        table.push_scope(Identifiers);

        let len = table.create_temporary(Type::unsigned(8));
        let a = table.intern("a");
        let arr = table
            .add(
                Identifiers,
                a,
                Type::vla(Type::int_type()),
                SymType::Definition,
                Linkage::None,
            )
            .unwrap();
        table.symbol_mut(arr).value = SymbolValue::VlaAddress(len);

        match table.symbol(arr).value {
            SymbolValue::VlaAddress(id) => assert!(table.is_temporary(id)),
            ref other => panic!("unexpected payload {:?}", other),
        }
    }
}
