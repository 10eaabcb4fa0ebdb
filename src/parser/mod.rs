//! Source text to concrete syntax tree
//!
//! This module turns program text into a [`cst::Cst`]:
//! - [`lexer`]: Tokenization (source text → tokens)
//! - [`stream`]: Token stream with lookahead for the parser
//! - [`parse`]: Recursive descent parsing (tokens → CST)
//! - [`cst`]: CST node labels and the tree itself
//! - [`projection`]: Terminals-only re-threading of the CST by source line
//!
//! # Language
//!
//! A small C-like procedural language:
//! - Types: `int`, `char`, `bool`, one-dimensional arrays with literal sizes
//! - Routines: `function <type> name (...)`, `procedure name (...)` and a
//!   mandatory `procedure main (void)`
//! - Statements: declarations, assignments, `if`/`else`, `while`, `for`,
//!   `printf`, `return`, procedure calls, nested blocks
//! - Expressions: arithmetic, relational and boolean operators, calls,
//!   `getchar(void)`, `sizeof(name)`, quoted literals
//!
//! # Parser Implementation
//!
//! Hand-written recursive descent with no error recovery. No external parser
//! generator dependencies.

pub mod cst;
mod declarations;
mod expressions;
pub mod lexer;
pub mod parse;
pub mod projection;
mod statements;
pub mod stream;
