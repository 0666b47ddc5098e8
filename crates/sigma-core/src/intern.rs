//! Variable name interning.
//!
//! Every variable name is stored once and addressed by a [`SymbolId`].
//! Deviation symbols share the id space but live outside the name lookup, so
//! a variable called `sigma_x` never aliases the deviation of `x`.

use hashbrown::HashMap;

use crate::handle::SymbolId;

/// Two-way mapping between variable names and symbol ids.
#[derive(Debug, Default, Clone)]
pub struct SymbolTable {
    /// Maps names to their ids.
    ids: HashMap<String, SymbolId>,
    /// Names by id, for reverse lookup.
    names: Vec<String>,
    /// Deviation symbol of each variable that has one.
    deviations: HashMap<SymbolId, SymbolId>,
}

impl SymbolTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns a name, returning its id.
    ///
    /// Interning a name twice returns the same id.
    ///
    /// # Panics
    ///
    /// Panics if more than `u32::MAX` names are interned.
    pub fn intern(&mut self, name: &str) -> SymbolId {
        if let Some(&id) = self.ids.get(name) {
            return id;
        }
        let id = self.push(name.to_owned());
        self.ids.insert(name.to_owned(), id);
        id
    }

    /// Returns the deviation symbol `sigma_<name>` of `variable`, creating it
    /// on first use.
    ///
    /// The deviation symbol cannot be found by [`lookup`](Self::lookup) and
    /// is distinct from any interned name. Returns `None` if `variable` is
    /// not in the table.
    ///
    /// # Panics
    ///
    /// Panics if more than `u32::MAX` names are interned.
    pub fn deviation(&mut self, variable: SymbolId) -> Option<SymbolId> {
        if let Some(&id) = self.deviations.get(&variable) {
            return Some(id);
        }
        let name = format!("sigma_{}", self.name(variable)?);
        let id = self.push(name);
        self.deviations.insert(variable, id);
        Some(id)
    }

    /// The deviation symbol of `variable`, if one was created.
    #[must_use]
    pub fn find_deviation(&self, variable: SymbolId) -> Option<SymbolId> {
        self.deviations.get(&variable).copied()
    }

    fn push(&mut self, name: String) -> SymbolId {
        let index = self.names.len();
        assert!(index < u32::MAX as usize, "Symbol table capacity exceeded");

        #[allow(clippy::cast_possible_truncation)]
        let id = SymbolId::new(index as u32);
        self.names.push(name);
        id
    }

    /// Looks up a name without interning it.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<SymbolId> {
        self.ids.get(name).copied()
    }

    /// Returns the name behind an id.
    #[must_use]
    pub fn name(&self, id: SymbolId) -> Option<&str> {
        self.names.get(id.index() as usize).map(String::as_str)
    }

    /// Returns the number of interned names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns true if nothing has been interned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
