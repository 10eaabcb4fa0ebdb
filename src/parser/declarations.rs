//! Declaration parsing
//!
//! Routines (functions, procedures, the main procedure), their parameter
//! lists, and variable declarations with identifier / array lists.
//!
//! # Grammar
//!
//! ```text
//! FunctionDeclaration  ::= function DATATYPE IDENT ( void | ParameterList )
//!                          { CompoundStatement }
//! ProcedureDeclaration ::= procedure IDENT ( void | ParameterList )
//!                          { CompoundStatement }
//! MainProcedure        ::= procedure main ( void ) BlockStatement
//! ParameterList        ::= DATATYPE ( IDENT
//!                          | IdentifierAndIdentifierArrayParameterListDeclaration )
//!                          [ , ParameterList ]
//! DeclarationStatement ::= DATATYPE ( IDENT
//!                          | IdentifierAndIdentifierArrayList ) ;
//! IdentifierAndIdentifierArrayList ::= ( IdentifierList | IdentifierArrayList )
//!                          [ , IdentifierAndIdentifierArrayList ]
//! IdentifierList       ::= IDENT { , IDENT }
//! IdentifierArrayList  ::= IDENT [ INTEGER ] [ , IdentifierArrayList ]
//! ```

use crate::parser::cst::Rule;
use crate::parser::lexer::TokenKind;
use crate::parser::parse::{NameRole, ParseError, Parser};
use crate::tree::NodeId;

impl Parser {
    pub(crate) fn parse_function_declaration(
        &mut self,
    ) -> Result<NodeId, ParseError> {
        let mut children = vec![self.expect_token(TokenKind::Function)?];
        children.push(self.parse_datatype_specifier()?);
        children.push(self.parse_identifier()?);
        children.extend(self.parse_routine_signature_and_body()?);
        self.build(Rule::FunctionDeclaration, &children)
    }

    pub(crate) fn parse_procedure_declaration(
        &mut self,
    ) -> Result<NodeId, ParseError> {
        let mut children = vec![self.expect_token(TokenKind::Procedure)?];
        children.push(self.parse_identifier()?);
        children.extend(self.parse_routine_signature_and_body()?);
        self.build(Rule::ProcedureDeclaration, &children)
    }

    /// `( void | ParameterList ) { CompoundStatement }`
    fn parse_routine_signature_and_body(
        &mut self,
    ) -> Result<Vec<NodeId>, ParseError> {
        let mut children = vec![self.expect_token(TokenKind::LParen)?];
        if self.check(TokenKind::Void) {
            children.push(self.consume());
        } else {
            children.push(self.parse_parameter_list()?);
        }
        children.push(self.expect_token(TokenKind::RParen)?);
        children.push(self.expect_token(TokenKind::LBrace)?);
        children.push(self.parse_compound_statement()?);
        children.push(self.expect_token(TokenKind::RBrace)?);
        Ok(children)
    }

    pub(crate) fn parse_main_procedure(&mut self) -> Result<NodeId, ParseError> {
        let mut children = vec![self.expect_token(TokenKind::Procedure)?];
        if !(self.check(TokenKind::Identifier) && self.current().text == "main")
        {
            return Err(self.unexpected("'main' after 'procedure'"));
        }
        children.push(self.consume());
        children.push(self.expect_token(TokenKind::LParen)?);
        children.push(self.expect_token(TokenKind::Void)?);
        children.push(self.expect_token(TokenKind::RParen)?);
        children.push(self.parse_block_statement()?);
        self.build(Rule::MainProcedure, &children)
    }

    pub(crate) fn parse_parameter_list(&mut self) -> Result<NodeId, ParseError> {
        let mut children = vec![self.parse_datatype_specifier()?];

        // The current token is the parameter name
        let plain = if self.check_ahead(1, TokenKind::Comma) {
            self.peek(2).kind.is_datatype()
        } else {
            !self.check_ahead(1, TokenKind::LBracket)
        };
        if plain {
            children.push(self.parse_identifier()?);
        } else {
            children.push(self.parse_parameter_list_declaration()?);
        }

        if self.check(TokenKind::Comma) {
            children.push(self.consume());
            children.push(self.parse_parameter_list()?);
        }
        self.build(Rule::ParameterList, &children)
    }

    /// `IDENT [ "[" INTEGER "]" ] [ , ParameterList ]`
    fn parse_parameter_list_declaration(
        &mut self,
    ) -> Result<NodeId, ParseError> {
        let mut children = vec![self.parse_identifier()?];
        if self.check(TokenKind::LBracket) {
            children.push(self.consume());
            if !self.check(TokenKind::Integer) {
                return Err(self.unexpected("whole number in array declaration"));
            }
            children.push(self.consume());
            children.push(self.expect_token(TokenKind::RBracket)?);
        }
        if self.check(TokenKind::Comma) {
            children.push(self.consume());
            children.push(self.parse_parameter_list()?);
        }
        self.build(
            Rule::IdentifierAndIdentifierArrayParameterListDeclaration,
            &children,
        )
    }

    pub(crate) fn parse_declaration_statement(
        &mut self,
    ) -> Result<NodeId, ParseError> {
        let mut children = vec![self.parse_datatype_specifier()?];
        if self.check_ahead(1, TokenKind::Semicolon) {
            children.push(self.parse_identifier()?);
        } else {
            children.push(self.parse_identifier_and_identifier_array_list()?);
        }
        children.push(self.expect_token(TokenKind::Semicolon)?);
        self.build(Rule::DeclarationStatement, &children)
    }

    pub(crate) fn parse_datatype_specifier(
        &mut self,
    ) -> Result<NodeId, ParseError> {
        if self.current().kind.is_datatype() {
            Ok(self.consume())
        } else {
            Err(self.unexpected("datatype specifier (char, bool, int)"))
        }
    }

    /// A name being declared or used. Reserved words are rejected with the
    /// role they were about to play.
    pub(crate) fn parse_identifier(&mut self) -> Result<NodeId, ParseError> {
        let token = self.current();
        if token.kind.is_keyword() {
            let role = if self.check_ahead(1, TokenKind::LParen) {
                NameRole::Function
            } else {
                NameRole::Variable
            };
            return Err(ParseError::ReservedWord {
                word: token.text.clone(),
                role,
                line: token.line,
            });
        }
        if !token.is(TokenKind::Identifier) {
            return Err(self.unexpected("identifier"));
        }
        Ok(self.consume())
    }

    fn parse_identifier_and_identifier_array_list(
        &mut self,
    ) -> Result<NodeId, ParseError> {
        let mut children = Vec::new();
        if self.check_ahead(1, TokenKind::LBracket) {
            children.push(self.parse_identifier_array_list()?);
        } else {
            children.push(self.parse_identifier_list()?);
        }
        if self.check(TokenKind::Comma) {
            children.push(self.consume());
            children.push(self.parse_identifier_and_identifier_array_list()?);
        }
        self.build(Rule::IdentifierAndIdentifierArrayList, &children)
    }

    /// Plain names. Stops before a `, name [` so the array element is left
    /// for the enclosing list.
    pub(crate) fn parse_identifier_list(&mut self) -> Result<NodeId, ParseError> {
        let mut children = vec![self.parse_identifier()?];
        while self.check(TokenKind::Comma)
            && !self.check_ahead(2, TokenKind::LBracket)
        {
            children.push(self.consume());
            children.push(self.parse_identifier()?);
        }
        self.build(Rule::IdentifierList, &children)
    }

    pub(crate) fn parse_identifier_array_list(
        &mut self,
    ) -> Result<NodeId, ParseError> {
        let mut children = vec![self.parse_identifier()?];
        children.push(self.expect_token(TokenKind::LBracket)?);
        if !self.check(TokenKind::Integer) {
            return Err(self.unexpected("whole number inside array brackets"));
        }
        if !is_positive_literal(&self.current().text) {
            return Err(ParseError::ArraySize {
                line: self.current().line,
            });
        }
        children.push(self.consume());
        children.push(self.expect_token(TokenKind::RBracket)?);

        if self.check(TokenKind::Comma)
            && self.check_ahead(1, TokenKind::Identifier)
            && self.check_ahead(2, TokenKind::LBracket)
        {
            children.push(self.consume());
            children.push(self.parse_identifier_array_list()?);
        }
        self.build(Rule::IdentifierArrayList, &children)
    }
}

/// Integer literal text denoting a value above zero.
fn is_positive_literal(text: &str) -> bool {
    !text.starts_with('-') && text.bytes().any(|b| b != b'0')
}

#[cfg(test)]
mod tests {
    use crate::parser::cst::{Cst, Rule};
    use crate::parser::parse::{NameRole, ParseError, Parser};

    fn parse(source: &str) -> Result<Cst, ParseError> {
        Parser::new(source)?.parse()
    }

    fn count_rule(cst: &Cst, rule: Rule) -> usize {
        (0..cst.tree().len())
            .filter(|&id| cst.rule(id) == Some(rule))
            .count()
    }

    #[test]
    fn test_mixed_identifier_and_array_lists() {
        let cst = parse(
            "int a, b[5], c, d, e[2], f[3];\nprocedure main (void) { }",
        )
        .expect("Parsing failed");
        assert_eq!(count_rule(&cst, Rule::IdentifierList), 2);
        assert_eq!(count_rule(&cst, Rule::IdentifierArrayList), 3);
    }

    #[test]
    fn test_array_size_must_be_positive() {
        let err = parse("int a[0];\nprocedure main (void) { }").unwrap_err();
        assert_eq!(err, ParseError::ArraySize { line: 1 });

        let err = parse("int a[-3];\nprocedure main (void) { }").unwrap_err();
        assert!(matches!(err, ParseError::ArraySize { .. }));
    }

    #[test]
    fn test_array_size_must_be_integer() {
        let err = parse("int a[n];\nprocedure main (void) { }").unwrap_err();
        assert!(matches!(err, ParseError::Unexpected { .. }));
    }

    #[test]
    fn test_reserved_word_as_variable() {
        let err = parse("int return;\nprocedure main (void) { }").unwrap_err();
        assert_eq!(
            err,
            ParseError::ReservedWord {
                word: "return".to_string(),
                role: NameRole::Variable,
                line: 1,
            }
        );
        assert_eq!(
            err.to_string(),
            "Syntax error on line 1: reserved word \"return\" cannot be used \
             for the name of a variable."
        );
    }

    #[test]
    fn test_reserved_word_as_function() {
        let err = parse("function int printf (void) { return 1; }")
            .unwrap_err();
        assert!(matches!(
            err,
            ParseError::ReservedWord {
                role: NameRole::Function,
                ..
            }
        ));
    }

    #[test]
    fn test_parameter_lists() {
        let cst = parse(
            "procedure fill (int values[10], int count, char mark) { }\n\
             procedure main (void) { }",
        )
        .expect("Parsing failed");
        assert_eq!(count_rule(&cst, Rule::ParameterList), 3);
        assert_eq!(
            count_rule(
                &cst,
                Rule::IdentifierAndIdentifierArrayParameterListDeclaration
            ),
            1
        );
    }

    #[test]
    fn test_parameter_needs_its_own_type() {
        assert!(parse(
            "procedure pair (int a, b) { }\nprocedure main (void) { }"
        )
        .is_err());
    }

    #[test]
    fn test_main_requires_void() {
        let err = parse("procedure main (int x) { }").unwrap_err();
        assert!(matches!(err, ParseError::Unexpected { .. }));
    }
}
