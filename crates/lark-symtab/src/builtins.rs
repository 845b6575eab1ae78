use lark_types::{Member, Type};

use crate::error::SymtabError;
use crate::namespace::NamespaceId;
use crate::symbol::{Linkage, SymType};
use crate::table::SymbolTable;

/// Registers compiler internal symbols that standard library headers assume
/// to exist, so they resolve during parsing.
///
/// `__builtin_va_list` is defined as described in the System V ABI; the
/// va_arg machinery gets dummy function types just to reserve the names.
pub fn register_builtins(table: &mut SymbolTable) -> Result<(), SymtabError> {
    let va_list = {
        let gp_offset = table.intern("gp_offset");
        let fp_offset = table.intern("fp_offset");
        let overflow_arg_area = table.intern("overflow_arg_area");
        let reg_save_area = table.intern("reg_save_area");

        Type::struct_type(vec![
            Member::new(Some(gp_offset), Type::unsigned(4)),
            Member::new(Some(fp_offset), Type::unsigned(4)),
            Member::new(Some(overflow_arg_area), Type::pointer(Type::void())),
            Member::new(Some(reg_save_area), Type::pointer(Type::void())),
        ])
    };

    let name = table.intern("__builtin_va_list");
    table.add(
        NamespaceId::Identifiers,
        name,
        va_list,
        SymType::Typedef,
        Linkage::None,
    )?;

    for spelling in ["__builtin_va_start", "__builtin_va_arg"] {
        let name = table.intern(spelling);
        let ty = Type::function(Type::void(), Vec::new(), true);
        table.add(
            NamespaceId::Identifiers,
            name,
            ty,
            SymType::Declaration,
            Linkage::None,
        )?;
    }

    Ok(())
}
