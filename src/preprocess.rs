//! Comment removal
//!
//! A character-level state machine that blanks out `//` and `/* */`
//! comments before lexing. Comment characters become spaces and newlines are
//! kept, so every token stays on its original line. Double-quoted strings
//! are copied verbatim, escapes included.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommentError {
    /// A block comment still open at end of input, or a `*/` with no
    /// comment to close.
    #[error("Syntax error on line {line}: program contains C-style, unterminated comment")]
    Unterminated { line: usize },
}

impl CommentError {
    pub fn line(&self) -> usize {
        match self {
            CommentError::Unterminated { line } => *line,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Normal,
    /// Saw `/` outside a comment.
    Slash,
    Line,
    Block,
    /// Saw `*` inside a block comment.
    BlockStar,
    Str,
    /// Saw `\` inside a string.
    Escape,
}

/// Replace comments in `source` with whitespace.
pub fn strip_comments(source: &str) -> Result<String, CommentError> {
    let mut output = String::with_capacity(source.len());
    let mut state = State::Normal;
    let mut line = 1;
    let mut block_start = 0;
    let mut chars = source.chars().peekable();

    while let Some(c) = chars.next() {
        state = match state {
            State::Normal | State::Slash => {
                let mut next = State::Normal;
                if state == State::Slash {
                    match c {
                        '/' => {
                            output.push_str("  ");
                            next = State::Line;
                        }
                        '*' => {
                            output.push_str("  ");
                            block_start = line;
                            next = State::Block;
                        }
                        _ => output.push('/'),
                    }
                }
                if next == State::Normal {
                    next = match c {
                        '"' => {
                            output.push(c);
                            State::Str
                        }
                        '/' => State::Slash,
                        '*' if chars.peek() == Some(&'/') => {
                            return Err(CommentError::Unterminated { line });
                        }
                        _ => {
                            output.push(c);
                            State::Normal
                        }
                    };
                }
                next
            }
            State::Line if c == '\n' => {
                output.push(c);
                State::Normal
            }
            State::Line => {
                output.push(' ');
                State::Line
            }
            State::Block | State::BlockStar => {
                match c {
                    '\n' => output.push(c),
                    _ => output.push(' '),
                }
                match (state, c) {
                    (_, '*') => State::BlockStar,
                    (State::BlockStar, '/') => State::Normal,
                    _ => State::Block,
                }
            }
            State::Str => {
                output.push(c);
                match c {
                    '\\' => State::Escape,
                    '"' => State::Normal,
                    _ => State::Str,
                }
            }
            State::Escape => {
                output.push(c);
                State::Str
            }
        };
        if c == '\n' {
            line += 1;
        }
    }

    match state {
        State::Slash => output.push('/'),
        State::Block | State::BlockStar => {
            return Err(CommentError::Unterminated { line: block_start });
        }
        _ => {}
    }
    log::debug!("stripped comments from {line} lines");
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_comment_becomes_spaces() {
        let stripped = strip_comments("x = 1; // set x\ny = 2;").unwrap();
        assert_eq!(stripped, "x = 1;         \ny = 2;");
    }

    #[test]
    fn test_block_comment_keeps_newlines() {
        let stripped = strip_comments("a /* one\ntwo */ b").unwrap();
        assert_eq!(stripped, "a       \n       b");
        assert_eq!(stripped.lines().count(), 2);
    }

    #[test]
    fn test_strings_are_untouched() {
        let source = "printf(\"// not a comment \\\" /* either */\");";
        assert_eq!(strip_comments(source).unwrap(), source);
    }

    #[test]
    fn test_lone_slash_survives() {
        assert_eq!(strip_comments("a / b").unwrap(), "a / b");
        assert_eq!(strip_comments("a /").unwrap(), "a /");
    }

    #[test]
    fn test_star_runs_close_block() {
        assert_eq!(strip_comments("/***/x").unwrap(), "     x");
    }

    #[test]
    fn test_unterminated_block_reports_opening_line() {
        let err = strip_comments("int x;\n/* open\n\nint y;").unwrap_err();
        assert_eq!(err, CommentError::Unterminated { line: 2 });
    }

    #[test]
    fn test_stray_close_is_an_error() {
        let err = strip_comments("x = 1;\ny = 2; */").unwrap_err();
        assert_eq!(err.line(), 2);
    }
}
