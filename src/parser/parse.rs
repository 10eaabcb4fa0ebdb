//! Main parser coordinator
//!
//! This module provides the [`Parser`] struct and core parsing infrastructure,
//! including error types, helper methods, and the program-level productions.
//!
//! # Parser Architecture
//!
//! The Parser uses a recursive descent approach with one method per grammar
//! nonterminal, organized as follows:
//! - This module: Parser struct, helper methods, `Program` / `ProgramTail`
//! - `declarations`: routines, parameter lists, variable declarations
//! - `statements`: statements (if, while, for, printf, assignments, calls)
//! - `expressions`: numerical and boolean expressions and their operands
//!
//! # Grammar
//!
//! ```text
//! Program     ::= MainProcedure [ProgramTail]
//!               | (FunctionDeclaration | ProcedureDeclaration
//!                  | DeclarationStatement) Program
//! ProgramTail ::= { FunctionDeclaration | ProcedureDeclaration
//!                   | DeclarationStatement }
//! ```
//!
//! # Implementation
//!
//! Parser methods are split across multiple files using `impl Parser` blocks.
//! Every production parses its children left to right and then synthesizes
//! its grammar node over them with [`Parser::build`]. There is no error
//! recovery: the first mismatch is returned as a [`ParseError`].

use std::fmt;

use thiserror::Error;

use crate::parser::cst::{Cst, Rule};
use crate::parser::lexer::{LexError, Token, TokenKind};
use crate::parser::stream::TokenStream;
use crate::tree::{NodeId, TreeError};

/// How a misused reserved word was about to be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameRole {
    Variable,
    Function,
}

impl fmt::Display for NameRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NameRole::Variable => "variable",
            NameRole::Function => "function",
        })
    }
}

/// Parser error type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("Syntax error on line {line}: expected {expected}, but got {found}")]
    Unexpected {
        expected: String,
        found: String,
        line: usize,
    },

    #[error(
        "Syntax error on line {line}: reserved word \"{word}\" cannot be used \
         for the name of a {role}."
    )]
    ReservedWord {
        word: String,
        role: NameRole,
        line: usize,
    },

    #[error(
        "Syntax error on line {line}: array declaration size must be a \
         positive integer."
    )]
    ArraySize { line: usize },

    #[error("Syntax error on line {line}: {message}")]
    Syntax { message: String, line: usize },

    #[error("Internal error on line {line} while building {rule}: {source}")]
    Tree {
        rule: Rule,
        line: usize,
        #[source]
        source: TreeError,
    },
}

impl ParseError {
    pub fn line(&self) -> usize {
        match self {
            ParseError::Lex(err) => err.line,
            ParseError::Unexpected { line, .. }
            | ParseError::ReservedWord { line, .. }
            | ParseError::ArraySize { line }
            | ParseError::Syntax { line, .. }
            | ParseError::Tree { line, .. } => *line,
        }
    }
}

/// Recursive descent parser producing a [`Cst`]
pub struct Parser {
    pub(crate) stream: TokenStream,
    pub(crate) cst: Cst,
}

impl Parser {
    pub fn new(source: &str) -> Result<Self, ParseError> {
        Ok(Self {
            stream: TokenStream::from_source(source)?,
            cst: Cst::new(),
        })
    }

    pub fn from_tokens(tokens: Vec<Token>) -> Self {
        Self {
            stream: TokenStream::new(tokens),
            cst: Cst::new(),
        }
    }

    /// Parse a whole program. All input must be consumed.
    pub fn parse(mut self) -> Result<Cst, ParseError> {
        let root = self.parse_program()?;
        if !self.stream.is_at_end() {
            return Err(self.syntax_error(format!(
                "unexpected {} after the main procedure",
                self.current()
            )));
        }
        self.cst.set_root(root);
        log::debug!("parsed {} CST nodes", self.cst.tree().len());
        Ok(self.cst)
    }

    /// `Program` is right recursive; the chain is parsed iteratively and
    /// folded from the innermost `Program` outwards.
    pub(crate) fn parse_program(&mut self) -> Result<NodeId, ParseError> {
        let mut leading = Vec::new();

        let innermost = loop {
            match self.current().kind {
                TokenKind::Procedure if self.at_main_procedure() => {
                    let main = self.parse_main_procedure()?;
                    let mut children = vec![main];
                    if let Some(tail) = self.parse_program_tail()? {
                        children.push(tail);
                    }
                    break self.build(Rule::Program, &children)?;
                }
                TokenKind::Procedure => {
                    leading.push(self.parse_procedure_declaration()?);
                }
                TokenKind::Function => {
                    leading.push(self.parse_function_declaration()?);
                }
                kind if kind.is_datatype() => {
                    leading.push(self.parse_declaration_statement()?);
                }
                _ => {
                    return Err(self.syntax_error(format!(
                        "unexpected {}. Expected function, procedure, \
                         declaration, or main procedure.",
                        self.current()
                    )));
                }
            }
        };

        let mut program = innermost;
        for declaration in leading.into_iter().rev() {
            program = self.build(Rule::Program, &[declaration, program])?;
        }
        Ok(program)
    }

    /// Declarations following the main procedure; `None` when there are none.
    pub(crate) fn parse_program_tail(
        &mut self,
    ) -> Result<Option<NodeId>, ParseError> {
        let mut children = Vec::new();
        loop {
            match self.current().kind {
                TokenKind::Function => {
                    children.push(self.parse_function_declaration()?);
                }
                TokenKind::Procedure if !self.at_main_procedure() => {
                    children.push(self.parse_procedure_declaration()?);
                }
                kind if kind.is_datatype() => {
                    children.push(self.parse_declaration_statement()?);
                }
                _ => break,
            }
        }

        if children.is_empty() {
            return Ok(None);
        }
        Ok(Some(self.build(Rule::ProgramTail, &children)?))
    }

    pub(crate) fn at_main_procedure(&self) -> bool {
        self.check(TokenKind::Procedure)
            && self.check_ahead(1, TokenKind::Identifier)
            && self.peek(1).text == "main"
    }

    // ===== Helper methods =====

    pub(crate) fn current(&self) -> &Token {
        self.stream.current()
    }

    pub(crate) fn peek(&self, offset: usize) -> &Token {
        self.stream.peek(offset)
    }

    pub(crate) fn check(&self, kind: TokenKind) -> bool {
        self.current().is(kind)
    }

    pub(crate) fn check_any(&self, kinds: &[TokenKind]) -> bool {
        kinds.contains(&self.current().kind)
    }

    pub(crate) fn check_ahead(&self, offset: usize, kind: TokenKind) -> bool {
        self.peek(offset).is(kind)
    }

    /// Turn the current token into a terminal node, whatever it is.
    pub(crate) fn consume(&mut self) -> NodeId {
        let token = self.stream.advance();
        self.cst.terminal(token)
    }

    /// Consume a token of `kind` or fail naming what was found instead.
    pub(crate) fn expect_token(
        &mut self,
        kind: TokenKind,
    ) -> Result<NodeId, ParseError> {
        if self.check(kind) {
            Ok(self.consume())
        } else {
            Err(self.unexpected(&format!("token of type {kind}")))
        }
    }

    /// Synthesize a grammar node over already parsed `children`.
    pub(crate) fn build(
        &mut self,
        rule: Rule,
        children: &[NodeId],
    ) -> Result<NodeId, ParseError> {
        let line = self.current().line;
        self.cst
            .grammar(rule, children, line)
            .map_err(|source| ParseError::Tree { rule, line, source })
    }

    pub(crate) fn unexpected(&self, expected: &str) -> ParseError {
        ParseError::Unexpected {
            expected: expected.to_string(),
            found: self.current().to_string(),
            line: self.current().line,
        }
    }

    pub(crate) fn syntax_error(&self, message: impl Into<String>) -> ParseError {
        ParseError::Syntax {
            message: message.into(),
            line: self.current().line,
        }
    }
}
