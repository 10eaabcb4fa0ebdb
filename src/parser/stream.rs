//! Token stream with arbitrary lookahead
//!
//! [`TokenStream`] owns the lexer output and hands tokens to the parser front
//! to back. Peeking past the end, or advancing past it, yields the
//! end-of-file token instead of failing.

use std::collections::VecDeque;

use crate::parser::lexer::{LexError, Lexer, Token, TokenKind};

#[derive(Debug, Clone)]
pub struct TokenStream {
    tokens: VecDeque<Token>,
    eof: Token,
}

impl TokenStream {
    /// Wrap an already lexed sequence. A missing trailing end-of-file token
    /// is supplied.
    pub fn new(tokens: Vec<Token>) -> Self {
        let mut tokens: VecDeque<Token> = tokens.into();
        let eof = match tokens.back() {
            Some(last) if last.is(TokenKind::Eof) => last.clone(),
            Some(last) => Token::eof(last.line),
            None => Token::eof(1),
        };
        if !tokens.back().is_some_and(|t| t.is(TokenKind::Eof)) {
            tokens.push_back(eof.clone());
        }
        Self { tokens, eof }
    }

    /// Lex `source` completely.
    pub fn from_source(source: &str) -> Result<Self, LexError> {
        Ok(Self::new(Lexer::new(source).tokenize()?))
    }

    /// The token the parser is looking at.
    pub fn current(&self) -> &Token {
        self.peek(0)
    }

    /// The token `offset` positions past the current one.
    pub fn peek(&self, offset: usize) -> &Token {
        self.tokens.get(offset).unwrap_or(&self.eof)
    }

    /// Consume and return the current token.
    pub fn advance(&mut self) -> Token {
        if self.tokens.len() > 1 {
            self.tokens.pop_front().unwrap_or_else(|| self.eof.clone())
        } else {
            self.eof.clone()
        }
    }

    pub fn is_at_end(&self) -> bool {
        self.current().is(TokenKind::Eof)
    }

    /// Tokens not yet consumed, current token first.
    pub fn remaining(&self) -> impl Iterator<Item = &Token> {
        self.tokens.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peek_does_not_consume() {
        let stream = TokenStream::from_source("a = 1;").unwrap();
        assert_eq!(stream.peek(2).text, "1");
        assert_eq!(stream.current().text, "a");
    }

    #[test]
    fn test_peek_past_end_is_eof() {
        let stream = TokenStream::from_source("a").unwrap();
        assert!(stream.peek(1).is(TokenKind::Eof));
        assert!(stream.peek(50).is(TokenKind::Eof));
    }

    #[test]
    fn test_advance_past_end_keeps_eof() {
        let mut stream = TokenStream::from_source("a b").unwrap();
        assert_eq!(stream.advance().text, "a");
        assert_eq!(stream.advance().text, "b");
        assert!(stream.is_at_end());
        assert!(stream.advance().is(TokenKind::Eof));
        assert!(stream.advance().is(TokenKind::Eof));
        assert!(stream.is_at_end());
    }

    #[test]
    fn test_missing_eof_is_supplied() {
        let stream = TokenStream::new(vec![Token::new(
            TokenKind::Identifier,
            "x",
            3,
        )]);
        assert!(stream.peek(1).is(TokenKind::Eof));
        assert_eq!(stream.peek(1).line, 3);
    }
}
