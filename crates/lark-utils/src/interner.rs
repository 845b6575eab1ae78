use std::collections::HashMap;
use std::fmt;
use std::ops::Index;

use serde::{Deserialize, Serialize};

/// Key for an interned spelling.
///
/// Cheap to copy, and two keys compare equal exactly when the spellings they
/// were produced from are equal. The numeric value is an index into the
/// interner that produced it and has no meaning across interners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Name(u32);

impl Name {
    pub fn as_usize(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'n{}", self.0)
    }
}

/// Stores each unique spelling exactly once and hands out [`Name`] keys.
///
/// Lookups work on borrowed `&str` without allocating; interning allocates
/// only when the spelling has not been seen before.
#[derive(Debug, Default)]
pub struct StrInterner {
    /// Owned storage for every unique spelling, in interning order.
    values: Vec<String>,
    /// Spelling to key, borrowing from `values`.
    map: HashMap<&'static str, u32>,
}

impl StrInterner {
    /// Creates a new empty interner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new empty interner with the given capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
            map: HashMap::with_capacity(capacity),
        }
    }

    /// Interns a spelling, returning its key.
    ///
    /// If the spelling is already interned, returns the existing key.
    pub fn intern(&mut self, value: &str) -> Name {
        if let Some(&idx) = self.map.get(value) {
            return Name(idx);
        }

        let idx = u32::try_from(self.values.len()).expect("interner overflow");
        self.values.push(value.to_owned());

        // SAFETY: the reference points into the String's heap buffer, which
        // stays put for the life of the interner. `values` is append-only and
        // never shrunk, and the map never outlives `self`.
        let stored: &'static str =
            unsafe { std::mem::transmute::<&str, &'static str>(self.values[idx as usize].as_str()) };
        self.map.insert(stored, idx);

        Name(idx)
    }

    /// Gets the spelling for a key.
    ///
    /// Returns `None` if the key came from a different interner.
    pub fn get(&self, name: Name) -> Option<&str> {
        self.values.get(name.as_usize()).map(|s| s.as_str())
    }

    /// Looks up a spelling without interning it.
    pub fn lookup(&self, value: &str) -> Option<Name> {
        self.map.get(value).copied().map(Name)
    }

    /// Returns the number of unique spellings.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if nothing has been interned yet.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns an iterator over all spellings in interning order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|s| s.as_str())
    }
}

impl Index<Name> for StrInterner {
    type Output = str;

    fn index(&self, name: Name) -> &Self::Output {
        &self.values[name.as_usize()]
    }
}
