//! Run configuration

use std::fmt;

/// Pipeline artifacts that can be printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    Tokens,
    Cst,
    Terminals,
    Symbols,
    Ast,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Tokens,
        Stage::Cst,
        Stage::Terminals,
        Stage::Symbols,
        Stage::Ast,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Stage::Tokens => "TOKENS",
            Stage::Cst => "CONCRETE SYNTAX TREE",
            Stage::Terminals => "TERMINAL PROJECTION",
            Stage::Symbols => "SYMBOL TABLE",
            Stage::Ast => "ABSTRACT SYNTAX TREE",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Blank out comments before lexing.
    pub strip_comments: bool,
    /// Artifacts to print; always shown in pipeline order.
    pub emit: Vec<Stage>,
    pub color: bool,
}

impl Config {
    pub fn emits(&self, stage: Stage) -> bool {
        self.emit.contains(&stage)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            strip_comments: true,
            emit: vec![Stage::Symbols, Stage::Ast],
            color: true,
        }
    }
}
