//! Expression parsing
//!
//! Numerical and boolean expressions, their operands, calls to user-defined
//! functions, `getchar` / `sizeof`, and quoted literals.
//!
//! # Grammar
//!
//! ```text
//! Expression          ::= BooleanExpression | NumericalExpression
//! NumericalExpression ::= NUMOP NumericalExpression
//!                       | ( NumericalOperand == INTEGER )
//!                       | ( NumericalOperand [NUMOP NumericalExpression] )
//!                         [NUMOP NumericalExpression]
//!                       | NumericalOperand [NUMOP ( ( NumericalExpression )
//!                         [NUMOP NumericalExpression] | NumericalExpression )]
//! BooleanExpression   ::= (TRUE | FALSE) [BOOLOP BooleanExpression]
//!                       | ! NumericalExpression [BOOLOP BooleanExpression]
//!                       | ( IDENT BOOLOP BooleanExpression ) [BOOLOP ...]
//!                       | ( ! NumericalOperand ) [BOOLOP ...]
//!                       | ( NumericalOperand RELOP NumericalOperand ) [BOOLOP ...]
//!                       | NumericalExpression [RELOP NumericalExpression]
//!                         [BOOLOP BooleanExpression]
//! NumericalOperand    ::= INTEGER | TRUE | FALSE | IDENT [ NumericalExpression ]
//!                       | UserDefinedFunction | IDENT | GetcharFunction
//!                       | SizeofFunction | SingleQuotedString
//!                       | DoubleQuotedString
//! ```
//!
//! `Expression` picks its alternative with [`Parser::is_boolean_expression`],
//! a forward scan over the pending tokens.

use crate::parser::cst::Rule;
use crate::parser::lexer::TokenKind;
use crate::parser::parse::{ParseError, Parser};
use crate::tree::NodeId;

impl Parser {
    pub(crate) fn parse_expression(&mut self) -> Result<NodeId, ParseError> {
        let child = if self.is_boolean_expression() {
            self.parse_boolean_expression()?
        } else {
            self.parse_numerical_expression()?
        };
        self.build(Rule::Expression, &[child])
    }

    /// Scan ahead for a boolean or relational operator or a boolean literal,
    /// stopping at the first `;`, `,`, `)`, `]` or `}` not matched inside the
    /// expression.
    pub(crate) fn is_boolean_expression(&self) -> bool {
        let mut parens = 0usize;
        let mut brackets = 0usize;
        for token in self.stream.remaining() {
            match token.kind {
                TokenKind::LParen => parens += 1,
                TokenKind::LBracket => brackets += 1,
                TokenKind::RParen if parens == 0 => return false,
                TokenKind::RParen => parens -= 1,
                TokenKind::RBracket if brackets == 0 => return false,
                TokenKind::RBracket => brackets -= 1,
                TokenKind::Semicolon | TokenKind::Comma | TokenKind::RBrace
                    if parens == 0 =>
                {
                    return false
                }
                TokenKind::Eof => return false,
                kind if kind.is_boolean_operator()
                    || kind.is_relational()
                    || matches!(
                        kind,
                        TokenKind::BoolNot
                            | TokenKind::BoolTrue
                            | TokenKind::BoolFalse
                    ) =>
                {
                    return true
                }
                _ => {}
            }
        }
        false
    }

    pub(crate) fn parse_numerical_expression(
        &mut self,
    ) -> Result<NodeId, ParseError> {
        // Unary form
        if self.current().kind.is_numerical_operator() {
            let children = [self.consume(), self.parse_numerical_expression()?];
            return self.build(Rule::NumericalExpression, &children);
        }

        if self.check(TokenKind::LParen) {
            let mut children = vec![self.consume(), self.parse_numerical_operand()?];

            // ( operand == INTEGER )
            if self.check(TokenKind::BoolEqual) {
                children.push(self.consume());
                children.push(self.expect_token(TokenKind::Integer)?);
                children.push(self.expect_token(TokenKind::RParen)?);
                return self.build(Rule::NumericalExpression, &children);
            }

            if !self.check(TokenKind::RParen) {
                children.push(self.parse_numerical_operator()?);
                children.push(self.parse_numerical_expression()?);
            }
            children.push(self.expect_token(TokenKind::RParen)?);
            if self.current().kind.is_numerical_operator() {
                children.push(self.consume());
                children.push(self.parse_numerical_expression()?);
            }
            return self.build(Rule::NumericalExpression, &children);
        }

        let mut children = vec![self.parse_numerical_operand()?];
        if self.current().kind.is_numerical_operator() {
            children.push(self.consume());
            if self.check(TokenKind::LParen) {
                let group = [
                    self.consume(),
                    self.parse_numerical_expression()?,
                    self.expect_token(TokenKind::RParen)?,
                ];
                children.push(self.build(Rule::NumericalExpression, &group)?);
                if self.current().kind.is_numerical_operator() {
                    children.push(self.consume());
                    children.push(self.parse_numerical_expression()?);
                }
            } else {
                children.push(self.parse_numerical_expression()?);
            }
        }
        self.build(Rule::NumericalExpression, &children)
    }

    pub(crate) fn parse_boolean_expression(
        &mut self,
    ) -> Result<NodeId, ParseError> {
        let mut children = Vec::new();

        match self.current().kind {
            TokenKind::BoolTrue | TokenKind::BoolFalse => {
                children.push(self.consume());
            }
            TokenKind::BoolNot => {
                children.push(self.consume());
                children.push(self.parse_numerical_expression()?);
            }
            // ( IDENT && ... )
            TokenKind::LParen
                if self.check_ahead(1, TokenKind::Identifier)
                    && self.peek(2).kind.is_boolean_operator() =>
            {
                children.push(self.consume());
                children.push(self.parse_identifier()?);
                children.push(self.parse_boolean_operator()?);
                children.push(self.parse_boolean_expression()?);
                children.push(self.expect_token(TokenKind::RParen)?);
            }
            // ( ! operand )
            TokenKind::LParen if self.check_ahead(1, TokenKind::BoolNot) => {
                children.push(self.consume());
                children.push(self.consume());
                children.push(self.parse_numerical_operand()?);
                children.push(self.expect_token(TokenKind::RParen)?);
            }
            // ( operand RELOP operand )
            TokenKind::LParen if !self.paren_group_is_numeric_operand() => {
                children.push(self.consume());
                children.push(self.parse_numerical_operand()?);
                children.push(self.parse_relational_operator()?);
                children.push(self.parse_numerical_operand()?);
                children.push(self.expect_token(TokenKind::RParen)?);
            }
            _ => {
                children.push(self.parse_numerical_expression()?);
                if self.current().kind.is_relational() {
                    children.push(self.consume());
                    children.push(self.parse_numerical_expression()?);
                }
            }
        }

        if self.current().kind.is_boolean_operator() {
            children.push(self.consume());
            children.push(self.parse_boolean_expression()?);
        }
        self.build(Rule::BooleanExpression, &children)
    }

    /// Whether the parenthesized group starting at the current `(` is
    /// followed by a relational or numerical operator, making it an operand
    /// of a comparison rather than a boolean sub-expression.
    fn paren_group_is_numeric_operand(&self) -> bool {
        let mut depth = 0usize;
        for (offset, token) in self.stream.remaining().enumerate() {
            match token.kind {
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        let next = self.peek(offset + 1).kind;
                        return next.is_relational()
                            || next.is_numerical_operator();
                    }
                }
                TokenKind::Semicolon
                | TokenKind::LBrace
                | TokenKind::RBrace
                | TokenKind::Eof => return false,
                _ => {}
            }
        }
        false
    }

    pub(crate) fn parse_numerical_operand(
        &mut self,
    ) -> Result<NodeId, ParseError> {
        let children = match self.current().kind {
            TokenKind::Integer | TokenKind::BoolTrue | TokenKind::BoolFalse => {
                vec![self.consume()]
            }
            TokenKind::Identifier
                if self.check_ahead(1, TokenKind::LBracket) =>
            {
                vec![
                    self.parse_identifier()?,
                    self.consume(),
                    self.parse_numerical_expression()?,
                    self.expect_token(TokenKind::RBracket)?,
                ]
            }
            TokenKind::Identifier if self.check_ahead(1, TokenKind::LParen) => {
                vec![self.parse_user_defined_function()?]
            }
            TokenKind::Identifier => vec![self.parse_identifier()?],
            TokenKind::Getchar => vec![self.parse_getchar_function()?],
            TokenKind::Sizeof => vec![self.parse_sizeof_function()?],
            TokenKind::SingleQuote => vec![self.parse_single_quoted_string()?],
            TokenKind::DoubleQuote => vec![self.parse_double_quoted_string()?],
            _ => return Err(self.unexpected("numerical operand")),
        };
        self.build(Rule::NumericalOperand, &children)
    }

    pub(crate) fn parse_numerical_operator(
        &mut self,
    ) -> Result<NodeId, ParseError> {
        if self.current().kind.is_numerical_operator() {
            Ok(self.consume())
        } else {
            Err(self.unexpected("numerical operator (+, -, *, /, %)"))
        }
    }

    pub(crate) fn parse_relational_operator(
        &mut self,
    ) -> Result<NodeId, ParseError> {
        if self.current().kind.is_relational() {
            Ok(self.consume())
        } else {
            Err(self.unexpected("relational operator (<, <=, >, >=, ==, !=)"))
        }
    }

    pub(crate) fn parse_boolean_operator(&mut self) -> Result<NodeId, ParseError> {
        if self.current().kind.is_boolean_operator() {
            Ok(self.consume())
        } else {
            Err(self.unexpected("boolean operator (&& or ||)"))
        }
    }

    pub(crate) fn parse_user_defined_function(
        &mut self,
    ) -> Result<NodeId, ParseError> {
        let children = self.parse_call()?;
        self.build(Rule::UserDefinedFunction, &children)
    }

    /// `IDENT ( [arguments] )`, shared by function calls in expressions and
    /// procedure call statements.
    pub(crate) fn parse_call(&mut self) -> Result<Vec<NodeId>, ParseError> {
        let mut children = vec![
            self.parse_identifier()?,
            self.expect_token(TokenKind::LParen)?,
        ];

        if !self.check(TokenKind::RParen) {
            let expression_argument = self.is_boolean_expression()
                || self.check_any(&[
                    TokenKind::Integer,
                    TokenKind::LParen,
                    TokenKind::SingleQuote,
                    TokenKind::DoubleQuote,
                    TokenKind::Getchar,
                    TokenKind::Sizeof,
                    TokenKind::Plus,
                    TokenKind::Minus,
                ])
                || (self.check(TokenKind::Identifier)
                    && !matches!(
                        self.peek(1).kind,
                        TokenKind::Comma | TokenKind::RParen | TokenKind::LBracket
                    ));
            if expression_argument {
                children.push(self.parse_expression()?);
            } else {
                children.push(
                    self.parse_identifier_and_identifier_array_parameter_list()?,
                );
            }
        }

        children.push(self.expect_token(TokenKind::RParen)?);
        Ok(children)
    }

    /// `IDENT [ "[" (IDENT | NumericalExpression) "]" ] [ , ... ]`
    pub(crate) fn parse_identifier_and_identifier_array_parameter_list(
        &mut self,
    ) -> Result<NodeId, ParseError> {
        let mut children = vec![self.parse_identifier()?];
        if self.check(TokenKind::LBracket) {
            children.push(self.consume());
            if self.check(TokenKind::Identifier)
                && self.check_ahead(1, TokenKind::RBracket)
            {
                children.push(self.parse_identifier()?);
            } else {
                children.push(self.parse_numerical_expression()?);
            }
            children.push(self.expect_token(TokenKind::RBracket)?);
        }
        if self.check(TokenKind::Comma) {
            children.push(self.consume());
            children.push(self.parse_identifier_and_identifier_array_parameter_list()?);
        }
        self.build(Rule::IdentifierAndIdentifierArrayParameterList, &children)
    }

    pub(crate) fn parse_getchar_function(&mut self) -> Result<NodeId, ParseError> {
        let children = [
            self.expect_token(TokenKind::Getchar)?,
            self.expect_token(TokenKind::LParen)?,
            self.expect_token(TokenKind::Void)?,
            self.expect_token(TokenKind::RParen)?,
        ];
        self.build(Rule::GetcharFunction, &children)
    }

    pub(crate) fn parse_sizeof_function(&mut self) -> Result<NodeId, ParseError> {
        let children = [
            self.expect_token(TokenKind::Sizeof)?,
            self.expect_token(TokenKind::LParen)?,
            self.parse_identifier()?,
            self.expect_token(TokenKind::RParen)?,
        ];
        self.build(Rule::SizeofFunction, &children)
    }

    pub(crate) fn parse_double_quoted_string(
        &mut self,
    ) -> Result<NodeId, ParseError> {
        let children = [
            self.expect_token(TokenKind::DoubleQuote)?,
            self.expect_token(TokenKind::StringLiteral)?,
            self.expect_token(TokenKind::DoubleQuote)?,
        ];
        self.build(Rule::DoubleQuotedString, &children)
    }

    pub(crate) fn parse_single_quoted_string(
        &mut self,
    ) -> Result<NodeId, ParseError> {
        let children = [
            self.expect_token(TokenKind::SingleQuote)?,
            self.expect_token(TokenKind::StringLiteral)?,
            self.expect_token(TokenKind::SingleQuote)?,
        ];
        self.build(Rule::SingleQuotedString, &children)
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::cst::{Cst, Rule};
    use crate::parser::lexer::Lexer;
    use crate::parser::parse::{ParseError, Parser};
    use crate::tree::NodeId;

    fn parser(source: &str) -> Parser {
        Parser::from_tokens(Lexer::new(source).tokenize().unwrap())
    }

    fn parse_main(body: &str) -> Result<Cst, ParseError> {
        let source = format!("procedure main (void) {{\n{body}\n}}");
        Parser::new(&source)?.parse()
    }

    fn texts(cst: &Cst, id: NodeId) -> Vec<String> {
        cst.terminals(id)
            .into_iter()
            .filter_map(|t| cst.token(t).map(|tok| tok.text.clone()))
            .collect()
    }

    #[test]
    fn test_boolean_scan() {
        assert!(parser("a == b;").is_boolean_expression());
        assert!(parser("(a + 1) < b)").is_boolean_expression());
        assert!(parser("!done;").is_boolean_expression());
        assert!(parser("TRUE;").is_boolean_expression());
        assert!(parser("values[i] != 0;").is_boolean_expression());
        assert!(!parser("a + b * c;").is_boolean_expression());
        assert!(!parser("a), b == c").is_boolean_expression());
        assert!(!parser("a, b == c").is_boolean_expression());
    }

    #[test]
    fn test_numerical_expression_forms() {
        for source in [
            "a + b * c;",
            "-x;",
            "(a + b) * c;",
            "a * (b + c) - d;",
            "(flag == 1);",
            "values[i + 1] % 2;",
            "twice(n) + getchar(void) + sizeof(values);",
            "'a' + 1;",
        ] {
            let mut p = parser(source);
            let expr = p.parse_numerical_expression().expect(source);
            assert!(
                p.check(crate::parser::lexer::TokenKind::Semicolon),
                "{source} stopped early"
            );
            assert_eq!(p.cst.rule(expr), Some(Rule::NumericalExpression));
        }
    }

    #[test]
    fn test_boolean_expression_forms() {
        for source in [
            "a == b && c != d;",
            "TRUE;",
            "!found || done;",
            "(a && b == c);",
            "(!ready);",
            "(a < b) && (c >= d);",
            "(a + b) > c;",
            "values[i] == -1;",
            "check(x) || x > 10;",
            "x;",
        ] {
            let mut p = parser(source);
            let expr = p.parse_boolean_expression().expect(source);
            assert!(
                p.check(crate::parser::lexer::TokenKind::Semicolon),
                "{source} stopped early"
            );
            assert_eq!(p.cst.rule(expr), Some(Rule::BooleanExpression));
        }
    }

    #[test]
    fn test_expression_keeps_every_token() {
        let mut p = parser("a * (b + c) - d;");
        let expr = p.parse_expression().unwrap();
        assert_eq!(
            texts(&p.cst, expr),
            vec!["a", "*", "(", "b", "+", "c", ")", "-", "d"]
        );
    }

    #[test]
    fn test_call_arguments() {
        let cst = parse_main(
            "show(a, b[2], c);\nshow(a + 1);\nshow();\nx = sum(values, n);",
        )
        .expect("Parsing failed");
        let calls = (0..cst.tree().len())
            .filter(|&id| {
                matches!(
                    cst.rule(id),
                    Some(Rule::UserDefinedProcedureCallStatement)
                        | Some(Rule::UserDefinedFunction)
                )
            })
            .count();
        assert_eq!(calls, 4);
    }

    #[test]
    fn test_relational_without_right_operand_fails() {
        let mut p = parser("(a b);");
        assert!(p.parse_boolean_expression().is_err());
    }

    #[test]
    fn test_getchar_requires_void() {
        let mut p = parser("getchar(x)");
        assert!(p.parse_numerical_operand().is_err());
    }
}
