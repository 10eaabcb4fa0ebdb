//! # Introduction
//!
//! procc is the front end of a compiler for a small C-like procedural
//! language. It turns source text into a concrete syntax tree, a
//! scope-annotated symbol table, and an abstract syntax tree whose
//! expressions are in postfix order with names bound to symbols.
//!
//! ## Pipeline
//!
//! ```text
//! Source → Comments stripped → Lexer → Parser → CST
//! CST → Resolver → Symbol table (+ scope ids on routine declarations)
//! CST projection + Symbol table → AST builder → AST
//! ```
//!
//! 1. [`preprocess`]: blanks out comments, keeping line numbers.
//! 2. [`parser`]: tokenises the source and builds the CST.
//! 3. [`semantic`]: resolves declarations into a [`semantic::SymbolTable`].
//! 4. [`ast`]: rebuilds statements from the CST's terminals and reduces
//!    expressions to postfix.
//! 5. [`printer`]: text dumps of every intermediate artifact.
//!
//! [`compile`] runs all of it.

pub mod ast;
pub mod config;
pub mod error;
pub mod parser;
pub mod preprocess;
pub mod printer;
pub mod semantic;
pub mod tree;

use std::borrow::Cow;

use crate::ast::{Ast, AstBuild};
use crate::config::Config;
use crate::error::{Diagnostic, FrontendError};
use crate::parser::cst::Cst;
use crate::parser::lexer::{Lexer, Token};
use crate::parser::parse::Parser;
use crate::parser::projection::TerminalProjection;
use crate::semantic::SymbolTable;

/// Everything the pipeline produced for one source file.
#[derive(Debug, Clone)]
pub struct Compilation {
    pub tokens: Vec<Token>,
    pub cst: Cst,
    pub projection: TerminalProjection,
    pub table: SymbolTable,
    pub ast: Ast,
    /// Non-fatal findings from resolution and AST construction.
    pub diagnostics: Vec<Diagnostic>,
}

impl Compilation {
    pub fn had_error(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

/// Run every stage over `source`.
pub fn compile(source: &str, config: &Config) -> Result<Compilation, FrontendError> {
    let source = if config.strip_comments {
        Cow::Owned(preprocess::strip_comments(source)?)
    } else {
        Cow::Borrowed(source)
    };

    let tokens = Lexer::new(&source).tokenize()?;
    let mut cst = Parser::from_tokens(tokens.clone()).parse()?;
    let resolution = semantic::resolve(&mut cst);
    let projection = cst.project();
    let AstBuild { ast, diagnostics } = ast::build(&projection, &resolution.table)?;

    let mut all = resolution.diagnostics;
    all.extend(diagnostics);
    log::info!(
        "compiled {} tokens into {} symbols with {} diagnostics",
        tokens.len(),
        resolution.table.len(),
        all.len()
    );

    Ok(Compilation {
        tokens,
        cst,
        projection,
        table: resolution.table,
        ast,
        diagnostics: all,
    })
}
