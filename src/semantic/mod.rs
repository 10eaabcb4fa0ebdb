//! Name resolution
//!
//! - [`symbol`]: symbol, scope and data type definitions
//! - [`table`]: the symbol table and its lookup rules
//! - [`resolver`]: the CST walk that fills the table

pub mod resolver;
pub mod symbol;
pub mod table;

pub use resolver::{resolve, Resolution};
pub use symbol::{DataType, ScopeId, Symbol, SymbolKind, GLOBAL_SCOPE};
pub use table::{DuplicateSymbol, SymbolId, SymbolTable};
