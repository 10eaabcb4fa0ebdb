//! Symbol definitions

use std::fmt;

use crate::parser::lexer::TokenKind;

/// Integer naming one routine's local namespace.
pub type ScopeId = usize;

/// The single global scope.
pub const GLOBAL_SCOPE: ScopeId = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Variable,
    Function,
    Procedure,
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SymbolKind::Variable => "variable",
            SymbolKind::Function => "function",
            SymbolKind::Procedure => "procedure",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Int,
    Char,
    Bool,
}

impl DataType {
    /// The data type named by a type keyword.
    pub fn from_token(kind: TokenKind) -> Option<Self> {
        match kind {
            TokenKind::Int => Some(DataType::Int),
            TokenKind::Char => Some(DataType::Char),
            TokenKind::Bool => Some(DataType::Bool),
            _ => None,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DataType::Int => "int",
            DataType::Char => "char",
            DataType::Bool => "bool",
        })
    }
}

/// A declared name.
///
/// `parameters` is only populated for functions and procedures; each entry
/// is a variable scoped to the routine's own scope, in declaration order.
/// Procedures have no data type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub data_type: Option<DataType>,
    pub scope: ScopeId,
    pub is_array: bool,
    pub array_size: usize,
    pub line: usize,
    pub parameters: Vec<Symbol>,
}

impl Symbol {
    pub fn variable(
        name: impl Into<String>,
        data_type: DataType,
        scope: ScopeId,
        line: usize,
    ) -> Self {
        Self {
            name: name.into(),
            kind: SymbolKind::Variable,
            data_type: Some(data_type),
            scope,
            is_array: false,
            array_size: 0,
            line,
            parameters: Vec::new(),
        }
    }

    pub fn array(
        name: impl Into<String>,
        data_type: DataType,
        size: usize,
        scope: ScopeId,
        line: usize,
    ) -> Self {
        Self {
            is_array: true,
            array_size: size,
            ..Self::variable(name, data_type, scope, line)
        }
    }

    pub fn function(
        name: impl Into<String>,
        return_type: DataType,
        scope: ScopeId,
        line: usize,
    ) -> Self {
        Self {
            kind: SymbolKind::Function,
            ..Self::variable(name, return_type, scope, line)
        }
    }

    pub fn procedure(name: impl Into<String>, scope: ScopeId, line: usize) -> Self {
        Self {
            name: name.into(),
            kind: SymbolKind::Procedure,
            data_type: None,
            scope,
            is_array: false,
            array_size: 0,
            line,
            parameters: Vec::new(),
        }
    }
}
