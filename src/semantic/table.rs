//! Symbol table
//!
//! An append-only list of [`Symbol`]s with an index on `(name, scope)`.
//! Routine parameters are not entries of their own: they live on the
//! routine's symbol and are reached through the scope that routine owns.

use std::fmt;

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::semantic::symbol::{ScopeId, Symbol, SymbolKind, GLOBAL_SCOPE};

/// Handle to a symbol stored in a [`SymbolTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolId {
    Entry(usize),
    Parameter { routine: usize, index: usize },
}

/// Where the conflicting earlier definition lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Place {
    Globally,
    Locally,
}

impl fmt::Display for Place {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Place::Globally => "globally",
            Place::Locally => "locally",
        })
    }
}

/// A rejected insertion. The table is unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} '{name}' is already defined {place}")]
pub struct DuplicateSymbol {
    pub name: String,
    pub kind: SymbolKind,
    pub place: Place,
    pub line: usize,
}

impl DuplicateSymbol {
    fn of(symbol: &Symbol, place: Place) -> Self {
        Self {
            name: symbol.name.clone(),
            kind: symbol.kind,
            place,
            line: symbol.line,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    entries: Vec<Symbol>,
    index: FxHashMap<(String, ScopeId), usize>,
    owners: FxHashMap<ScopeId, usize>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `symbol` unless it clashes with an existing definition.
    ///
    /// A variable outside the global scope clashes with a global variable of
    /// the same name and with a parameter of the routine owning its scope.
    /// Any symbol clashes with one of the same name in the same scope.
    pub fn add_symbol(
        &mut self,
        symbol: Symbol,
    ) -> Result<SymbolId, DuplicateSymbol> {
        let local_variable =
            symbol.kind == SymbolKind::Variable && symbol.scope != GLOBAL_SCOPE;

        if local_variable
            && self
                .lookup(&symbol.name, GLOBAL_SCOPE)
                .is_some_and(|s| s.kind == SymbolKind::Variable)
        {
            return Err(DuplicateSymbol::of(&symbol, Place::Globally));
        }
        if self.lookup(&symbol.name, symbol.scope).is_some() {
            return Err(DuplicateSymbol::of(&symbol, Place::Locally));
        }
        if local_variable && self.parameter(&symbol.name, symbol.scope).is_some() {
            return Err(DuplicateSymbol::of(&symbol, Place::Locally));
        }

        let id = self.entries.len();
        self.index.insert((symbol.name.clone(), symbol.scope), id);
        self.entries.push(symbol);
        Ok(SymbolId::Entry(id))
    }

    /// Record that `scope` is the body of the routine at `routine`.
    pub fn bind_scope(&mut self, scope: ScopeId, routine: SymbolId) {
        if let SymbolId::Entry(index) = routine {
            self.owners.insert(scope, index);
        }
    }

    /// Append a parameter to a routine's list. Names must be unique within
    /// the list.
    pub fn add_parameter(
        &mut self,
        routine: SymbolId,
        parameter: Symbol,
    ) -> Result<SymbolId, DuplicateSymbol> {
        let SymbolId::Entry(owner) = routine else {
            return Err(DuplicateSymbol::of(&parameter, Place::Locally));
        };
        let Some(entry) = self.entries.get_mut(owner) else {
            return Err(DuplicateSymbol::of(&parameter, Place::Locally));
        };
        if entry.parameters.iter().any(|p| p.name == parameter.name) {
            return Err(DuplicateSymbol::of(&parameter, Place::Locally));
        }
        entry.parameters.push(parameter);
        Ok(SymbolId::Parameter {
            routine: owner,
            index: entry.parameters.len() - 1,
        })
    }

    /// Exact `(name, scope)` match among table entries.
    pub fn lookup(&self, name: &str, scope: ScopeId) -> Option<&Symbol> {
        self.lookup_id(name, scope).map(|id| self.get(id))
    }

    pub fn lookup_id(&self, name: &str, scope: ScopeId) -> Option<SymbolId> {
        self.index
            .get(&(name.to_string(), scope))
            .map(|&i| SymbolId::Entry(i))
    }

    /// Resolve a name used inside `scope`: local entries first, then the
    /// owning routine's parameters, then globals.
    pub fn resolve(&self, name: &str, scope: ScopeId) -> Option<SymbolId> {
        self.lookup_id(name, scope)
            .or_else(|| self.parameter(name, scope))
            .or_else(|| self.lookup_id(name, GLOBAL_SCOPE))
    }

    fn parameter(&self, name: &str, scope: ScopeId) -> Option<SymbolId> {
        let &routine = self.owners.get(&scope)?;
        let index = self.entries[routine]
            .parameters
            .iter()
            .position(|p| p.name == name)?;
        Some(SymbolId::Parameter { routine, index })
    }

    /// The symbol behind a handle issued by this table.
    pub fn get(&self, id: SymbolId) -> &Symbol {
        match id {
            SymbolId::Entry(i) => &self.entries[i],
            SymbolId::Parameter { routine, index } => {
                &self.entries[routine].parameters[index]
            }
        }
    }

    /// The routine whose body is `scope`.
    pub fn owner(&self, scope: ScopeId) -> Option<&Symbol> {
        self.owners.get(&scope).map(|&i| &self.entries[i])
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic::symbol::DataType;

    #[test]
    fn test_duplicate_in_same_scope_leaves_table_unchanged() {
        let mut table = SymbolTable::new();
        table
            .add_symbol(Symbol::variable("x", DataType::Int, 1, 2))
            .unwrap();
        let err = table
            .add_symbol(Symbol::variable("x", DataType::Char, 1, 3))
            .unwrap_err();
        assert_eq!(err.place, Place::Locally);
        assert_eq!(err.line, 3);
        assert_eq!(table.len(), 1);
        assert_eq!(table.lookup("x", 1).unwrap().data_type, Some(DataType::Int));
    }

    #[test]
    fn test_local_variable_cannot_shadow_global() {
        let mut table = SymbolTable::new();
        table
            .add_symbol(Symbol::variable("count", DataType::Int, 0, 1))
            .unwrap();
        let err = table
            .add_symbol(Symbol::variable("count", DataType::Int, 2, 7))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "variable 'count' is already defined globally"
        );
    }

    #[test]
    fn test_local_variable_cannot_shadow_parameter() {
        let mut table = SymbolTable::new();
        let routine = table
            .add_symbol(Symbol::procedure("show", 0, 1))
            .unwrap();
        table.bind_scope(1, routine);
        table
            .add_parameter(routine, Symbol::variable("n", DataType::Int, 1, 1))
            .unwrap();

        let err = table
            .add_symbol(Symbol::variable("n", DataType::Int, 1, 2))
            .unwrap_err();
        assert_eq!(err.place, Place::Locally);
        assert!(table
            .add_symbol(Symbol::variable("n", DataType::Int, 2, 9))
            .is_ok());
    }

    #[test]
    fn test_duplicate_parameter() {
        let mut table = SymbolTable::new();
        let routine = table
            .add_symbol(Symbol::function("pair", DataType::Int, 0, 1))
            .unwrap();
        table
            .add_parameter(routine, Symbol::variable("a", DataType::Int, 1, 1))
            .unwrap();
        assert!(table
            .add_parameter(routine, Symbol::variable("a", DataType::Char, 1, 1))
            .is_err());
        assert_eq!(table.get(routine).parameters.len(), 1);
    }

    #[test]
    fn test_resolve_order() {
        let mut table = SymbolTable::new();
        table
            .add_symbol(Symbol::variable("g", DataType::Int, 0, 1))
            .unwrap();
        let routine = table
            .add_symbol(Symbol::function("f", DataType::Int, 0, 2))
            .unwrap();
        table.bind_scope(1, routine);
        let param = table
            .add_parameter(routine, Symbol::variable("p", DataType::Bool, 1, 2))
            .unwrap();
        let local = table
            .add_symbol(Symbol::variable("l", DataType::Char, 1, 3))
            .unwrap();

        assert_eq!(table.resolve("l", 1), Some(local));
        assert_eq!(table.resolve("p", 1), Some(param));
        assert_eq!(table.resolve("g", 1), table.lookup_id("g", 0));
        assert_eq!(table.resolve("f", 1), Some(routine));
        assert_eq!(table.resolve("p", 2), None);
        assert_eq!(table.owner(1).map(|s| s.name.as_str()), Some("f"));
    }
}
