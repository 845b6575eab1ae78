use lark_utils::Name;

use crate::scope::{Scope, ScopeState};
use crate::symbol::SymbolId;

/// Selects one of the three namespaces C partitions names into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamespaceId {
    /// Ordinary identifiers: objects, functions, typedef names.
    Identifiers = 0,
    /// Goto targets. Scoped per function body.
    Labels = 1,
    /// Struct, union and enum tags.
    Tags = 2,
}

/// One namespace: a stack of scope frames plus the append-only list of
/// symbols created in it, in creation order.
#[derive(Debug)]
pub(crate) struct Namespace {
    /// Display name used by the debug dump.
    pub(crate) name: &'static str,
    /// Frames up to the deepest depth ever reached (the watermark). Only the
    /// first `active` of them belong to live scopes; the rest are retained
    /// for reuse.
    scopes: Vec<Scope>,
    pub(crate) active: usize,
    /// Every symbol registered in this namespace, never reordered. Cursor
    /// iteration and the debug dump walk this.
    pub(crate) list: Vec<SymbolId>,
    pub(crate) cursor: usize,
}

impl Namespace {
    pub fn new(name: &'static str) -> Self {
        Namespace {
            name,
            scopes: Vec::new(),
            active: 0,
            list: Vec::new(),
            cursor: 0,
        }
    }

    /// Depth of the innermost live scope; 0 is file scope.
    pub fn depth(&self) -> usize {
        debug_assert!(self.active > 0, "no scope pushed");
        self.active - 1
    }

    pub fn push(&mut self) {
        if self.active < self.scopes.len() {
            let scope = &mut self.scopes[self.active];
            if scope.state == ScopeState::Initialized {
                scope.state = ScopeState::Dirty;
            }
        } else {
            self.scopes.push(Scope::new());
        }

        self.active += 1;
    }

    /// Drops every frame and forgets every symbol. Used when the outermost
    /// scope is popped.
    pub fn teardown(&mut self) {
        self.scopes.clear();
        self.active = 0;
        self.list.clear();
        self.cursor = 0;
    }

    /// Scans frames from deepest to shallowest, skipping frames whose table
    /// is not live.
    pub fn lookup(&self, name: Name) -> Option<SymbolId> {
        self.scopes[..self.active]
            .iter()
            .rev()
            .filter(|scope| scope.state == ScopeState::Initialized)
            .find_map(|scope| scope.get(name))
    }

    /// Makes a symbol visible in the innermost live scope.
    pub fn make_visible(&mut self, name: Name, id: SymbolId) {
        let depth = self.depth();
        self.scopes[depth].insert(depth, name, id);
    }
}
