use miette::Diagnostic;
use thiserror::Error;

/// Fatal semantic errors raised by the symbol table. None of them are
/// recoverable; the driver reports the diagnostic and gives up on the
/// translation unit.
#[derive(Debug, Clone, Error, Diagnostic, PartialEq)]
pub enum SymtabError {
    /// Redeclaration whose type cannot be reconciled with what is already
    /// known about the symbol.
    #[error("Incompatible declaration of {name} :: {existing}, cannot apply type '{applied}'.")]
    #[diagnostic(code(lark::symtab::incompatible_declaration))]
    IncompatibleDeclaration {
        name: String,
        existing: String,
        applied: String,
    },

    /// Declaration following a definition with a different type.
    #[error("Conflicting types for {name}.")]
    #[diagnostic(code(lark::symtab::conflicting_types))]
    ConflictingTypes { name: String },

    /// Same name at file scope with incompatible linkage or kind.
    #[error("Declaration of '{name}' does not match prior declaration.")]
    #[diagnostic(code(lark::symtab::declaration_mismatch))]
    DeclarationMismatch { name: String },

    /// Same name defined twice in the same block scope.
    #[error("Duplicate definition of symbol '{name}'.")]
    #[diagnostic(code(lark::symtab::duplicate_definition))]
    DuplicateDefinition { name: String },

    /// A label was the target of a goto but never defined before its
    /// function ended.
    #[error("Undefined label '{name}'.")]
    #[diagnostic(code(lark::symtab::undefined_label))]
    UndefinedLabel { name: String },
}
