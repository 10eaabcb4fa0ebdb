//! Statement parsing
//!
//! # Grammar
//!
//! ```text
//! Statement ::= DeclarationStatement | ReturnStatement | PrintfStatement
//!             | SelectionStatement | IterationStatement | BlockStatement
//!             | UserDefinedProcedureCallStatement | AssignmentStatement
//! ```
//!
//! A statement starting with an identifier is a procedure call when the next
//! token is `(` and an assignment when it is `=` or `[`.

use crate::parser::cst::Rule;
use crate::parser::lexer::TokenKind;
use crate::parser::parse::{ParseError, Parser};
use crate::tree::NodeId;

impl Parser {
    pub(crate) fn starts_statement(&self) -> bool {
        matches!(
            self.current().kind,
            TokenKind::If
                | TokenKind::While
                | TokenKind::For
                | TokenKind::Return
                | TokenKind::Printf
                | TokenKind::Identifier
                | TokenKind::Char
                | TokenKind::Int
                | TokenKind::Bool
                | TokenKind::LBrace
        )
    }

    pub(crate) fn parse_statement(&mut self) -> Result<NodeId, ParseError> {
        match self.current().kind {
            kind if kind.is_datatype() => self.parse_declaration_statement(),
            TokenKind::Return => self.parse_return_statement(),
            TokenKind::Printf => self.parse_printf_statement(),
            TokenKind::If => self.parse_selection_statement(),
            TokenKind::While | TokenKind::For => self.parse_iteration_statement(),
            TokenKind::LBrace => self.parse_block_statement(),
            TokenKind::Identifier => {
                if self.check_ahead(1, TokenKind::LParen) {
                    self.parse_procedure_call_statement()
                } else if self.check_ahead(1, TokenKind::Assign)
                    || self.check_ahead(1, TokenKind::LBracket)
                {
                    self.parse_assignment_statement()
                } else {
                    Err(self.syntax_error(format!(
                        "unrecognized statement starting with identifier '{}'",
                        self.current().text
                    )))
                }
            }
            _ => Err(self.syntax_error(format!(
                "unexpected {} in statement",
                self.current()
            ))),
        }
    }

    /// Zero or more statements.
    pub(crate) fn parse_compound_statement(
        &mut self,
    ) -> Result<NodeId, ParseError> {
        let mut children = Vec::new();
        while self.starts_statement() {
            children.push(self.parse_statement()?);
        }
        self.build(Rule::CompoundStatement, &children)
    }

    pub(crate) fn parse_block_statement(&mut self) -> Result<NodeId, ParseError> {
        let children = [
            self.expect_token(TokenKind::LBrace)?,
            self.parse_compound_statement()?,
            self.expect_token(TokenKind::RBrace)?,
        ];
        self.build(Rule::BlockStatement, &children)
    }

    /// Body of `if`, `else`, `while` and `for`.
    fn parse_branch(&mut self) -> Result<NodeId, ParseError> {
        if self.check(TokenKind::LBrace) {
            self.parse_block_statement()
        } else {
            self.parse_statement()
        }
    }

    pub(crate) fn parse_selection_statement(
        &mut self,
    ) -> Result<NodeId, ParseError> {
        let mut children = vec![
            self.expect_token(TokenKind::If)?,
            self.expect_token(TokenKind::LParen)?,
            self.parse_boolean_expression()?,
            self.expect_token(TokenKind::RParen)?,
            self.parse_branch()?,
        ];
        if self.check(TokenKind::Else) {
            children.push(self.consume());
            children.push(self.parse_branch()?);
        }
        self.build(Rule::SelectionStatement, &children)
    }

    pub(crate) fn parse_iteration_statement(
        &mut self,
    ) -> Result<NodeId, ParseError> {
        let children = match self.current().kind {
            TokenKind::For => vec![
                self.consume(),
                self.expect_token(TokenKind::LParen)?,
                self.parse_initialization_expression()?,
                self.expect_token(TokenKind::Semicolon)?,
                self.parse_boolean_expression()?,
                self.expect_token(TokenKind::Semicolon)?,
                self.parse_iteration_assignment()?,
                self.expect_token(TokenKind::RParen)?,
                self.parse_branch()?,
            ],
            TokenKind::While => vec![
                self.consume(),
                self.expect_token(TokenKind::LParen)?,
                self.parse_boolean_expression()?,
                self.expect_token(TokenKind::RParen)?,
                self.parse_branch()?,
            ],
            _ => return Err(self.unexpected("'for' or 'while'")),
        };
        self.build(Rule::IterationStatement, &children)
    }

    pub(crate) fn parse_printf_statement(
        &mut self,
    ) -> Result<NodeId, ParseError> {
        let mut children = vec![
            self.expect_token(TokenKind::Printf)?,
            self.expect_token(TokenKind::LParen)?,
        ];
        match self.current().kind {
            TokenKind::DoubleQuote => {
                children.push(self.parse_double_quoted_string()?)
            }
            TokenKind::SingleQuote => {
                children.push(self.parse_single_quoted_string()?)
            }
            _ => return Err(self.unexpected("quoted format string in printf")),
        }
        if self.check(TokenKind::Comma) {
            children.push(self.consume());
            children.push(self.parse_identifier_and_identifier_array_parameter_list()?);
        }
        children.push(self.expect_token(TokenKind::RParen)?);
        children.push(self.expect_token(TokenKind::Semicolon)?);
        self.build(Rule::PrintfStatement, &children)
    }

    pub(crate) fn parse_return_statement(
        &mut self,
    ) -> Result<NodeId, ParseError> {
        let children = [
            self.expect_token(TokenKind::Return)?,
            self.parse_assigned_value()?,
            self.expect_token(TokenKind::Semicolon)?,
        ];
        self.build(Rule::ReturnStatement, &children)
    }

    pub(crate) fn parse_assignment_statement(
        &mut self,
    ) -> Result<NodeId, ParseError> {
        if !self.check_ahead(1, TokenKind::LBracket) {
            let children = [
                self.parse_initialization_expression()?,
                self.expect_token(TokenKind::Semicolon)?,
            ];
            return self.build(Rule::AssignmentStatement, &children);
        }

        let target = [
            self.parse_identifier()?,
            self.expect_token(TokenKind::LBracket)?,
            self.parse_numerical_expression()?,
            self.expect_token(TokenKind::RBracket)?,
        ];
        let access = self.build(Rule::ArrayAccess, &target)?;
        let children = [
            access,
            self.expect_token(TokenKind::Assign)?,
            self.parse_assigned_value()?,
            self.expect_token(TokenKind::Semicolon)?,
        ];
        self.build(Rule::AssignmentStatement, &children)
    }

    pub(crate) fn parse_initialization_expression(
        &mut self,
    ) -> Result<NodeId, ParseError> {
        let children = [
            self.parse_identifier()?,
            self.expect_token(TokenKind::Assign)?,
            self.parse_assigned_value()?,
        ];
        self.build(Rule::InitializationExpression, &children)
    }

    pub(crate) fn parse_iteration_assignment(
        &mut self,
    ) -> Result<NodeId, ParseError> {
        let children = [
            self.parse_identifier()?,
            self.expect_token(TokenKind::Assign)?,
            self.parse_assigned_value()?,
        ];
        self.build(Rule::IterationAssignment, &children)
    }

    /// `SingleQuotedString | DoubleQuotedString | Expression`
    fn parse_assigned_value(&mut self) -> Result<NodeId, ParseError> {
        match self.current().kind {
            TokenKind::SingleQuote => self.parse_single_quoted_string(),
            TokenKind::DoubleQuote => self.parse_double_quoted_string(),
            _ => self.parse_expression(),
        }
    }

    pub(crate) fn parse_procedure_call_statement(
        &mut self,
    ) -> Result<NodeId, ParseError> {
        let mut children = self.parse_call()?;
        children.push(self.expect_token(TokenKind::Semicolon)?);
        self.build(Rule::UserDefinedProcedureCallStatement, &children)
    }
}
