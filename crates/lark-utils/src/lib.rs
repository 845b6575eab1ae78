//! Shared infrastructure for the lark front-end: the string interner that
//! hands out [`Name`] keys for identifier spellings, and the [`Errors`]
//! container used to surface several diagnostics from one operation.

pub mod errors;
pub mod interner;

pub use errors::Errors;
pub use interner::{Name, StrInterner};
