//! AST node definitions
//!
//! The AST reuses the LCRS arena: each statement is a sibling chain headed
//! by a statement marker ([`AstLabel::Assignment`], [`AstLabel::If`], ...)
//! and followed by its operands in postfix order. Statement chains are
//! linked through left children, so a flat walk visits statements in source
//! order.

use std::fmt;

use crate::parser::lexer::Token;
use crate::semantic::table::SymbolId;
use crate::tree::{NodeId, Siblings, Tree};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AstLabel {
    Declaration,
    Assignment,
    BeginBlock,
    EndBlock,
    If,
    Else,
    While,
    ForInit,
    ForCondition,
    ForUpdate,
    Return,
    Printf,
    Call,
    /// A token carried over from the source.
    Term(Token),
}

impl fmt::Display for AstLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            AstLabel::Declaration => "DECLARATION",
            AstLabel::Assignment => "ASSIGNMENT",
            AstLabel::BeginBlock => "BEGIN BLOCK",
            AstLabel::EndBlock => "END BLOCK",
            AstLabel::If => "IF",
            AstLabel::Else => "ELSE",
            AstLabel::While => "WHILE",
            AstLabel::ForInit => "FOR EXPRESSION 1",
            AstLabel::ForCondition => "FOR EXPRESSION 2",
            AstLabel::ForUpdate => "FOR EXPRESSION 3",
            AstLabel::Return => "RETURN",
            AstLabel::Printf => "PRINTF",
            AstLabel::Call => "CALL",
            AstLabel::Term(token) => token.text.as_str(),
        };
        f.write_str(text)
    }
}

/// Payload of an AST node. `symbol` is set on declarations and on names
/// that resolved to a table entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AstItem {
    pub label: AstLabel,
    pub symbol: Option<SymbolId>,
}

impl AstItem {
    pub fn new(label: AstLabel) -> Self {
        Self {
            label,
            symbol: None,
        }
    }

    pub fn bound(label: AstLabel, symbol: Option<SymbolId>) -> Self {
        Self { label, symbol }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Ast {
    pub(crate) tree: Tree<AstItem>,
}

impl Ast {
    pub fn root(&self) -> Option<NodeId> {
        self.tree.root()
    }

    pub fn tree(&self) -> &Tree<AstItem> {
        &self.tree
    }

    pub fn item(&self, id: NodeId) -> &AstItem {
        self.tree.value(id)
    }

    pub fn label(&self, id: NodeId) -> &AstLabel {
        &self.tree.value(id).label
    }

    pub fn line(&self, id: NodeId) -> usize {
        self.tree.line(id)
    }

    /// Chain starting at `id`.
    pub fn chain(&self, id: NodeId) -> Siblings<'_, AstItem> {
        self.tree.siblings(id)
    }

    /// Heads of every chain, in walk order: the statement chains and the
    /// nested `for` groups.
    pub fn chain_heads(&self) -> Vec<NodeId> {
        let mut heads = Vec::new();
        let mut pending: Vec<NodeId> = self.root().into_iter().collect();
        while let Some(head) = pending.pop() {
            heads.push(head);
            let nested: Vec<NodeId> = self
                .chain(head)
                .filter_map(|id| self.tree.left_child(id))
                .collect();
            pending.extend(nested.into_iter().rev());
        }
        heads
    }
}
