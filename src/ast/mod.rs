//! Abstract syntax tree
//!
//! - [`node`]: AST labels, items and the tree wrapper
//! - [`postfix`]: numeric and boolean shunting-yard reducers
//! - [`builder`]: construction from the terminal projection and symbol table

pub mod builder;
pub mod node;
pub mod postfix;

pub use builder::{build, AstBuild, AstError};
pub use node::{Ast, AstItem, AstLabel};
