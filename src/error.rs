//! Error and diagnostic types shared by the pipeline stages
//!
//! Fatal failures are returned as [`FrontendError`]; each stage's own error
//! converts into it with `?`. Findings that do not stop the run (duplicate
//! definitions, unresolved names) are collected as [`Diagnostic`]s.

use std::fmt;

use thiserror::Error;

use crate::ast::builder::AstError;
use crate::parser::lexer::LexError;
use crate::parser::parse::ParseError;
use crate::preprocess::CommentError;

/// A fatal error from any stage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrontendError {
    #[error(transparent)]
    Comment(#[from] CommentError),

    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Ast(#[from] AstError),
}

impl FrontendError {
    /// Source line the error refers to.
    pub fn line(&self) -> usize {
        match self {
            FrontendError::Comment(err) => err.line(),
            FrontendError::Lex(err) => err.line,
            FrontendError::Parse(err) => err.line(),
            FrontendError::Ast(err) => err.line(),
        }
    }
}

/// Syntax errors are fatal ([`FrontendError`]), so only semantic findings
/// are collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Semantic,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Category::Semantic => "Semantic",
        })
    }
}

/// A non-fatal finding, rendered as `<Category> error on line N: message`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub category: Category,
    pub line: usize,
    pub message: String,
}

impl Diagnostic {
    pub fn semantic(line: usize, message: impl Into<String>) -> Self {
        Self {
            category: Category::Semantic,
            line,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} error on line {}: {}",
            self.category, self.line, self.message
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_format() {
        let diagnostic =
            Diagnostic::semantic(4, "variable 'x' is already defined locally");
        assert_eq!(
            diagnostic.to_string(),
            "Semantic error on line 4: variable 'x' is already defined locally"
        );
    }

    #[test]
    fn test_unterminated_comment_keeps_its_line() {
        let err = FrontendError::from(CommentError::Unterminated { line: 7 });
        assert_eq!(err.line(), 7);
        assert!(err.to_string().starts_with("Syntax error on line 7"));
    }
}
