//! Terminals-only projection of the CST
//!
//! The leaves of the CST regrouped by source line: each line's terminals form
//! one sibling chain, and the last terminal of a line takes the first
//! terminal of the next line as its left child. Walking the result with
//! "right sibling, else left child" visits every token in source order,
//! which is how the AST builder reads it through a [`Cursor`].

use std::collections::BTreeMap;

use crate::parser::lexer::{Token, TokenKind};
use crate::semantic::symbol::ScopeId;
use crate::tree::{NodeId, Tree};

/// A projected token. `scope` is set on the keyword that opens a routine
/// declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Terminal {
    pub token: Token,
    pub scope: Option<ScopeId>,
}

impl From<Token> for Terminal {
    fn from(token: Token) -> Self {
        Self { token, scope: None }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TerminalProjection {
    tree: Tree<Terminal>,
}

impl TerminalProjection {
    /// Thread `terminals` (in document order) into per-line chains.
    pub fn from_terminals(terminals: Vec<Terminal>) -> Self {
        let mut lines: BTreeMap<usize, Vec<Terminal>> = BTreeMap::new();
        for terminal in terminals {
            lines.entry(terminal.token.line).or_default().push(terminal);
        }

        let mut tree = Tree::new();
        let mut tail: Option<NodeId> = None;
        for (_, chain) in lines {
            let items = chain.into_iter().map(|t| {
                let line = t.token.line;
                (t, line)
            });
            let Some(head) = tree.push_chain(tail, items) else {
                continue;
            };
            if tail.is_none() {
                tree.set_root(head);
            }
            tail = Some(tree.last_sibling(head));
        }

        Self { tree }
    }

    /// Project a raw token sequence; end-of-file tokens are left out.
    pub fn from_tokens<I>(tokens: I) -> Self
    where
        I: IntoIterator<Item = Token>,
    {
        Self::from_terminals(
            tokens
                .into_iter()
                .filter(|t| !t.is(TokenKind::Eof))
                .map(Terminal::from)
                .collect(),
        )
    }

    pub fn tree(&self) -> &Tree<Terminal> {
        &self.tree
    }

    pub fn root(&self) -> Option<NodeId> {
        self.tree.root()
    }

    /// Every terminal in walk order.
    pub fn terminals(&self) -> impl Iterator<Item = &Terminal> {
        self.tree.walk().map(|id| self.tree.value(id))
    }

    /// Every token in walk order.
    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.terminals().map(|t| &t.token)
    }

    /// Heads of the per-line chains, first line first.
    pub fn line_heads(&self) -> Vec<NodeId> {
        let mut heads = Vec::new();
        let mut next = self.root();
        while let Some(head) = next {
            heads.push(head);
            next = self.tree.left_child(self.tree.last_sibling(head));
        }
        heads
    }

    pub fn cursor(&self) -> Cursor<'_> {
        Cursor {
            tree: &self.tree,
            current: self.root(),
        }
    }
}

/// Read position inside a [`TerminalProjection`].
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    tree: &'a Tree<Terminal>,
    current: Option<NodeId>,
}

impl<'a> Cursor<'a> {
    pub fn terminal(&self) -> Option<&'a Terminal> {
        self.current.map(|id| self.tree.value(id))
    }

    pub fn token(&self) -> Option<&'a Token> {
        self.terminal().map(|t| &t.token)
    }

    /// Token `offset` steps ahead; `peek(0)` is the current token.
    pub fn peek(&self, offset: usize) -> Option<&'a Token> {
        let mut id = self.current?;
        for _ in 0..offset {
            id = self.tree.next_in_walk(id)?;
        }
        Some(&self.tree.value(id).token)
    }

    pub fn check(&self, kind: TokenKind) -> bool {
        self.token().is_some_and(|t| t.is(kind))
    }

    pub fn check_ahead(&self, offset: usize, kind: TokenKind) -> bool {
        self.peek(offset).is_some_and(|t| t.is(kind))
    }

    /// Line of the current token, if any.
    pub fn line(&self) -> Option<usize> {
        self.token().map(|t| t.line)
    }

    /// Return the current terminal and move past it.
    pub fn advance(&mut self) -> Option<&'a Terminal> {
        let id = self.current?;
        self.current = self.tree.next_in_walk(id);
        Some(self.tree.value(id))
    }

    /// Advance until the current token is of `kind` (or input ends).
    pub fn skip_to(&mut self, kind: TokenKind) {
        while self.token().is_some_and(|t| !t.is(kind)) {
            self.advance();
        }
    }

    /// Consume the current token if it is of `kind`.
    pub fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::lexer::Lexer;

    fn project(source: &str) -> TerminalProjection {
        TerminalProjection::from_tokens(Lexer::new(source).tokenize().unwrap())
    }

    #[test]
    fn test_lines_become_chains() {
        let projection = project("int x;\nx = 1;\n\ny = 2;");
        let tree = projection.tree();
        let heads = projection.line_heads();
        assert_eq!(heads.len(), 3);

        let first: Vec<_> = tree
            .siblings(heads[0])
            .map(|id| tree.value(id).token.text.clone())
            .collect();
        assert_eq!(first, vec!["int", "x", ";"]);
        assert_eq!(tree.value(heads[2]).token.line, 4);
    }

    #[test]
    fn test_walk_reproduces_token_order() {
        let source = "procedure main (void)\n{\n  printf(\"hi\");\n}";
        let tokens = Lexer::new(source).tokenize().unwrap();
        let projection = project(source);
        let walked: Vec<_> = projection.tokens().cloned().collect();
        assert_eq!(walked, tokens[..tokens.len() - 1].to_vec());
    }

    #[test]
    fn test_cursor_peeks_across_lines() {
        let projection = project("a\n(\nb");
        let mut cursor = projection.cursor();
        assert_eq!(cursor.peek(2).map(|t| t.text.as_str()), Some("b"));
        assert!(cursor.check_ahead(1, TokenKind::LParen));
        cursor.skip_to(TokenKind::Identifier);
        assert_eq!(cursor.advance().map(|t| t.token.text.as_str()), Some("a"));
        cursor.skip_to(TokenKind::Identifier);
        assert_eq!(cursor.line(), Some(3));
        cursor.advance();
        assert!(cursor.token().is_none());
        assert_eq!(cursor.peek(0), None);
    }
}
