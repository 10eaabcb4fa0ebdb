//! Concrete syntax tree
//!
//! One grammar node per production instance, with the consumed tokens as
//! terminal leaves, stored in a left-child/right-sibling [`Tree`].
//!
//! A grammar node's children are attached as a single sibling chain when the
//! production finishes, so "children of X" means X's left child and that
//! child's right siblings. Routine declaration nodes receive a scope
//! annotation during symbol resolution, which [`Cst::project`] carries onto
//! the routine keyword of the terminals-only projection.

use std::fmt;

use crate::parser::lexer::Token;
use crate::parser::projection::{Terminal, TerminalProjection};
use crate::semantic::symbol::ScopeId;
use crate::tree::{NodeId, Siblings, Tree, TreeError};

/// Grammar nonterminals, one per parsing function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    Program,
    ProgramTail,
    MainProcedure,
    FunctionDeclaration,
    ProcedureDeclaration,
    ParameterList,
    DeclarationStatement,
    IdentifierList,
    IdentifierArrayList,
    IdentifierAndIdentifierArrayList,
    IdentifierAndIdentifierArrayParameterList,
    IdentifierAndIdentifierArrayParameterListDeclaration,
    CompoundStatement,
    BlockStatement,
    SelectionStatement,
    IterationStatement,
    AssignmentStatement,
    ArrayAccess,
    InitializationExpression,
    IterationAssignment,
    ReturnStatement,
    PrintfStatement,
    UserDefinedProcedureCallStatement,
    UserDefinedFunction,
    Expression,
    NumericalExpression,
    BooleanExpression,
    NumericalOperand,
    GetcharFunction,
    SizeofFunction,
    DoubleQuotedString,
    SingleQuotedString,
}

impl Rule {
    pub fn name(self) -> &'static str {
        match self {
            Rule::Program => "Program",
            Rule::ProgramTail => "ProgramTail",
            Rule::MainProcedure => "MainProcedure",
            Rule::FunctionDeclaration => "FunctionDeclaration",
            Rule::ProcedureDeclaration => "ProcedureDeclaration",
            Rule::ParameterList => "ParameterList",
            Rule::DeclarationStatement => "DeclarationStatement",
            Rule::IdentifierList => "IdentifierList",
            Rule::IdentifierArrayList => "IdentifierArrayList",
            Rule::IdentifierAndIdentifierArrayList => {
                "IdentifierAndIdentifierArrayList"
            }
            Rule::IdentifierAndIdentifierArrayParameterList => {
                "IdentifierAndIdentifierArrayParameterList"
            }
            Rule::IdentifierAndIdentifierArrayParameterListDeclaration => {
                "IdentifierAndIdentifierArrayParameterListDeclaration"
            }
            Rule::CompoundStatement => "CompoundStatement",
            Rule::BlockStatement => "BlockStatement",
            Rule::SelectionStatement => "SelectionStatement",
            Rule::IterationStatement => "IterationStatement",
            Rule::AssignmentStatement => "AssignmentStatement",
            Rule::ArrayAccess => "ArrayAccess",
            Rule::InitializationExpression => "InitializationExpression",
            Rule::IterationAssignment => "IterationAssignment",
            Rule::ReturnStatement => "ReturnStatement",
            Rule::PrintfStatement => "PrintfStatement",
            Rule::UserDefinedProcedureCallStatement => {
                "UserDefinedProcedureCallStatement"
            }
            Rule::UserDefinedFunction => "UserDefinedFunction",
            Rule::Expression => "Expression",
            Rule::NumericalExpression => "NumericalExpression",
            Rule::BooleanExpression => "BooleanExpression",
            Rule::NumericalOperand => "NumericalOperand",
            Rule::GetcharFunction => "GetcharFunction",
            Rule::SizeofFunction => "SizeofFunction",
            Rule::DoubleQuotedString => "DoubleQuotedString",
            Rule::SingleQuotedString => "SingleQuotedString",
        }
    }

    /// Declarations that open a new scope.
    pub fn is_routine(self) -> bool {
        matches!(
            self,
            Rule::FunctionDeclaration
                | Rule::ProcedureDeclaration
                | Rule::MainProcedure
        )
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Label {
    Rule(Rule),
    Terminal(Token),
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Rule(rule) => write!(f, "{rule}"),
            Label::Terminal(token) => f.write_str(&token.text),
        }
    }
}

/// Payload of a CST node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Syntax {
    pub label: Label,
    pub scope: Option<ScopeId>,
}

#[derive(Debug, Clone, Default)]
pub struct Cst {
    tree: Tree<Syntax>,
}

impl Cst {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn terminal(&mut self, token: Token) -> NodeId {
        let line = token.line;
        self.tree.push(
            Syntax {
                label: Label::Terminal(token),
                scope: None,
            },
            line,
        )
    }

    /// Synthesize a grammar node over `children`. Its line is the first
    /// child's, or `fallback_line` when there are none.
    pub(crate) fn grammar(
        &mut self,
        rule: Rule,
        children: &[NodeId],
        fallback_line: usize,
    ) -> Result<NodeId, TreeError> {
        let line = match children.first() {
            Some(&first) if first < self.tree.len() => self.tree.line(first),
            _ => fallback_line,
        };
        let id = self.tree.push(
            Syntax {
                label: Label::Rule(rule),
                scope: None,
            },
            line,
        );
        self.tree.attach_children(id, children)?;
        Ok(id)
    }

    pub(crate) fn set_root(&mut self, id: NodeId) {
        self.tree.set_root(id);
    }

    pub fn root(&self) -> Option<NodeId> {
        self.tree.root()
    }

    pub fn tree(&self) -> &Tree<Syntax> {
        &self.tree
    }

    pub fn label(&self, id: NodeId) -> &Label {
        &self.tree.value(id).label
    }

    pub fn line(&self, id: NodeId) -> usize {
        self.tree.line(id)
    }

    pub fn rule(&self, id: NodeId) -> Option<Rule> {
        match self.label(id) {
            Label::Rule(rule) => Some(*rule),
            Label::Terminal(_) => None,
        }
    }

    pub fn token(&self, id: NodeId) -> Option<&Token> {
        match self.label(id) {
            Label::Terminal(token) => Some(token),
            Label::Rule(_) => None,
        }
    }

    pub fn children(&self, id: NodeId) -> Siblings<'_, Syntax> {
        self.tree.children(id)
    }

    pub fn scope(&self, id: NodeId) -> Option<ScopeId> {
        self.tree.value(id).scope
    }

    pub fn annotate_scope(&mut self, id: NodeId, scope: ScopeId) {
        self.tree.value_mut(id).scope = Some(scope);
    }

    /// Terminal nodes under `id` (inclusive), in document order.
    pub fn terminals(&self, id: NodeId) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if self.token(current).is_some() {
                found.push(current);
            }
            let children: Vec<NodeId> = self.children(current).collect();
            stack.extend(children.into_iter().rev());
        }
        found
    }

    /// Line-ordered, terminals-only re-threading of the whole tree.
    pub fn project(&self) -> TerminalProjection {
        let Some(root) = self.root() else {
            return TerminalProjection::default();
        };

        let mut terminals = Vec::new();
        let mut pending_scope = None;
        let mut stack = vec![root];
        while let Some(current) = stack.pop() {
            let syntax = self.tree.value(current);
            match &syntax.label {
                Label::Terminal(token) => terminals.push(Terminal {
                    token: token.clone(),
                    scope: pending_scope.take(),
                }),
                Label::Rule(_) => {
                    if syntax.scope.is_some() {
                        pending_scope = syntax.scope;
                    }
                }
            }
            let children: Vec<NodeId> = self.children(current).collect();
            stack.extend(children.into_iter().rev());
        }

        TerminalProjection::from_terminals(terminals)
    }
}
