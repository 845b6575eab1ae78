use std::collections::HashMap;

use lark_utils::Name;

use crate::symbol::SymbolId;

/// Lifecycle of a scope frame.
///
/// Frames are retained below the watermark when their scope is popped, so
/// that function bodies pushing and popping the same depths over and over
/// reuse the table capacity instead of reallocating it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScopeState {
    /// Freshly allocated, no lookup table built yet.
    Created,
    /// Table exists but holds stale entries from a previous scope at this
    /// depth. Invisible to lookup until cleared by the first insert.
    Dirty,
    /// Table is live.
    Initialized,
}

/// Lookup index for one lexical block.
#[derive(Debug)]
pub(crate) struct Scope {
    pub(crate) state: ScopeState,
    table: HashMap<Name, SymbolId>,
}

impl Scope {
    pub fn new() -> Self {
        Scope {
            state: ScopeState::Created,
            table: HashMap::new(),
        }
    }

    /// Initial table capacity by depth, reflecting where declarations
    /// cluster in C code. Depth 1 holds function parameters and is assumed
    /// to stay small.
    fn capacity_seed(depth: usize) -> usize {
        const SEEDS: [usize; 6] = [256, 16, 128, 64, 32, 16];
        SEEDS.get(depth).copied().unwrap_or(8)
    }

    /// Makes a symbol visible in this frame, building or clearing the table
    /// first when required by the frame's state.
    pub fn insert(&mut self, depth: usize, name: Name, id: SymbolId) {
        match self.state {
            ScopeState::Created => {
                self.table = HashMap::with_capacity(Self::capacity_seed(depth));
            }
            ScopeState::Dirty => self.table.clear(),
            ScopeState::Initialized => {}
        }

        self.table.insert(name, id);
        self.state = ScopeState::Initialized;
    }

    /// Looks up a name in this frame. Only meaningful for initialized
    /// frames; dirty and created frames hold nothing visible.
    pub fn get(&self, name: Name) -> Option<SymbolId> {
        debug_assert!(self.state == ScopeState::Initialized);
        self.table.get(&name).copied()
    }
}
