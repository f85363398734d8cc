//! Display names for local variable slots.

use rustc_hash::FxHashMap;

/// Human-readable names for local variable slots, produced by the naming
/// pass and consumed read-only by everyone else.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct VariableNameCache {
    names: FxHashMap<u16, String>,
}

impl VariableNameCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name `slot`. Returns the previous name if the slot was already
    /// named, so the naming pass can detect collisions.
    pub fn insert(&mut self, slot: u16, name: String) -> Option<String> {
        self.names.insert(slot, name)
    }

    pub fn name_of(&self, slot: u16) -> Option<&str> {
        self.names.get(&slot).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
