use std::io::{self, Write};

use crate::namespace::NamespaceId;
use crate::symbol::{ConstantValue, Linkage, SymType, Symbol, SymbolValue};
use crate::table::SymbolTable;

impl SymbolTable {
    /// Writes a textual dump of one namespace, one symbol per line in
    /// creation order, indented by scope depth. The format is informational
    /// only.
    pub fn write_symbols<W: Write>(&self, ns: NamespaceId, out: &mut W) -> io::Result<()> {
        let namespace = &self.namespaces[ns as usize];

        for (i, &id) in namespace.list.iter().enumerate() {
            if i == 0 {
                writeln!(out, "namespace {}:", namespace.name)?;
            }

            self.write_symbol(out, &self.symbols[id.as_usize()])?;
            writeln!(out)?;
        }

        Ok(())
    }

    fn write_symbol<W: Write>(&self, out: &mut W, sym: &Symbol) -> io::Result<()> {
        write!(out, "{:1$}", "", sym.depth * 2)?;

        if sym.linkage != Linkage::None {
            let storage = if sym.linkage == Linkage::Intern {
                "static"
            } else {
                "global"
            };
            write!(out, "{} ", storage)?;
        }

        let kind = match sym.symtype {
            SymType::Tentative => "tentative",
            SymType::Definition => "definition",
            SymType::Declaration => "declaration",
            SymType::Typedef => "typedef",
            SymType::Tag => {
                if sym.ty.is_struct() {
                    "struct"
                } else if sym.ty.is_union() {
                    "union"
                } else {
                    "enum"
                }
            }
            SymType::Constant => "number",
            SymType::StringValue => "string",
            SymType::Label => "label",
        };
        write!(out, "{} ", kind)?;

        write!(out, "{} :: {}", self.render_name(sym), sym.ty)?;
        if sym.ty.size_of() != 0 {
            write!(out, ", size={}", sym.ty.size_of())?;
        }

        if sym.stack_offset != 0 {
            write!(out, ", (stack_offset: {})", sym.stack_offset)?;
        }

        if sym.ty.is_vla() {
            if let SymbolValue::VlaAddress(id) = sym.value {
                write!(out, ", (vla_address: {})", self.emitted_name(id))?;
            }
        }

        if sym.symtype == SymType::Constant {
            if let SymbolValue::Constant(value) = sym.value {
                match value {
                    ConstantValue::Int(v) => write!(out, ", value={}", v)?,
                    ConstantValue::UInt(v) => write!(out, ", value={}", v)?,
                    ConstantValue::Float(v) => write!(out, ", value={}f", v)?,
                    ConstantValue::Double(v) => write!(out, ", value={}", v)?,
                }
            }
        }

        Ok(())
    }
}
