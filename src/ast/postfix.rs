//! Infix to postfix reduction
//!
//! Shunting-yard over the tokens under a [`Cursor`]. Two operator tables
//! exist: [`Numeric`] for assignments and `for` updates, [`Boolean`] for
//! conditions and return values. Reduction stops in front of the
//! [`Terminator`] without consuming it.
//!
//! | operator               | numeric | boolean |
//! |------------------------|---------|---------|
//! | `!`                    | -       | 3       |
//! | `*` `/` `%`            | 3       | 3       |
//! | `+` `-`                | 2       | 2       |
//! | relational, `==`, `!=` | -       | 2       |
//! | `=`                    | 1       | 1       |
//! | `&&` `\|\|`            | -       | 1       |

use crate::parser::lexer::{Token, TokenKind};
use crate::parser::projection::Cursor;

/// Where a reduction ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminator {
    /// `;` at any depth.
    Semicolon,
    /// A `)` with no matching `(` inside the expression.
    CloseParen,
    /// A `]` with no matching `[` inside the expression.
    CloseBracket,
}

pub trait OperatorTable {
    /// Binding strength of an operator; `None` for non-operators.
    fn precedence(&self, kind: TokenKind) -> Option<u8>;

    /// Whether a non-operator token is copied to the output.
    fn is_operand(&self, kind: TokenKind) -> bool;
}

/// Arithmetic and assignment.
#[derive(Debug, Clone, Copy, Default)]
pub struct Numeric;

/// Boolean, relational, and arithmetic through the numeric table.
#[derive(Debug, Clone, Copy, Default)]
pub struct Boolean;

fn numeric_precedence(kind: TokenKind) -> Option<u8> {
    match kind {
        TokenKind::Asterisk | TokenKind::Divide | TokenKind::Modulo => Some(3),
        TokenKind::Plus | TokenKind::Minus => Some(2),
        TokenKind::Assign => Some(1),
        _ => None,
    }
}

fn is_value(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Identifier
            | TokenKind::Integer
            | TokenKind::StringLiteral
            | TokenKind::SingleQuote
            | TokenKind::DoubleQuote
    ) || kind.is_keyword()
}

impl OperatorTable for Numeric {
    fn precedence(&self, kind: TokenKind) -> Option<u8> {
        numeric_precedence(kind)
    }

    fn is_operand(&self, kind: TokenKind) -> bool {
        is_value(kind)
    }
}

impl OperatorTable for Boolean {
    fn precedence(&self, kind: TokenKind) -> Option<u8> {
        match kind {
            TokenKind::BoolNot => Some(3),
            kind if kind.is_relational() => Some(2),
            kind if kind.is_boolean_operator() => Some(1),
            kind => numeric_precedence(kind),
        }
    }

    fn is_operand(&self, kind: TokenKind) -> bool {
        is_value(kind) || matches!(kind, TokenKind::LBracket | TokenKind::RBracket)
    }
}

enum Pending {
    Marker,
    Operator(Token, u8),
}

/// Reduce the expression under `cursor` to postfix order.
pub fn reduce<T: OperatorTable>(
    cursor: &mut Cursor<'_>,
    table: &T,
    stop: Terminator,
) -> Vec<Token> {
    let mut output = Vec::new();
    let mut stack: Vec<Pending> = Vec::new();
    let mut parens = 0usize;
    let mut brackets = 0usize;

    while let Some(token) = cursor.token() {
        let done = match (stop, token.kind) {
            (Terminator::Semicolon, TokenKind::Semicolon) => true,
            (Terminator::CloseParen, TokenKind::RParen) => parens == 0,
            (Terminator::CloseBracket, TokenKind::RBracket) => brackets == 0,
            _ => false,
        };
        if done {
            break;
        }

        match token.kind {
            TokenKind::Identifier | TokenKind::Getchar | TokenKind::Sizeof
                if cursor.check_ahead(1, TokenKind::LParen) =>
            {
                copy_call(cursor, &mut output);
                continue;
            }
            TokenKind::LParen => {
                parens += 1;
                stack.push(Pending::Marker);
            }
            TokenKind::RParen => {
                parens = parens.saturating_sub(1);
                while let Some(Pending::Operator(op, _)) = stack.pop() {
                    output.push(op);
                }
            }
            kind => {
                if kind == TokenKind::LBracket {
                    brackets += 1;
                } else if kind == TokenKind::RBracket {
                    brackets = brackets.saturating_sub(1);
                }

                if let Some(precedence) = table.precedence(kind) {
                    while let Some(Pending::Operator(_, top)) = stack.last() {
                        if *top < precedence {
                            break;
                        }
                        if let Some(Pending::Operator(op, _)) = stack.pop() {
                            output.push(op);
                        }
                    }
                    stack.push(Pending::Operator(token.clone(), precedence));
                } else if table.is_operand(kind) {
                    output.push(token.clone());
                }
            }
        }
        cursor.advance();
    }

    while let Some(pending) = stack.pop() {
        if let Pending::Operator(op, _) = pending {
            output.push(op);
        }
    }
    output
}

/// Copy `name ( args )` through unchanged except for argument commas.
fn copy_call(cursor: &mut Cursor<'_>, output: &mut Vec<Token>) {
    let mut depth = 0usize;
    while let Some(terminal) = cursor.advance() {
        let token = &terminal.token;
        match token.kind {
            TokenKind::Comma => continue,
            TokenKind::LParen => depth += 1,
            TokenKind::RParen => depth = depth.saturating_sub(1),
            _ => {}
        }
        output.push(token.clone());
        if depth == 0 && token.is(TokenKind::RParen) {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::lexer::Lexer;
    use crate::parser::projection::TerminalProjection;

    fn postfix<T: OperatorTable>(source: &str, table: T, stop: Terminator) -> String {
        let projection =
            TerminalProjection::from_tokens(Lexer::new(source).tokenize().unwrap());
        let mut cursor = projection.cursor();
        let tokens = reduce(&mut cursor, &table, stop);
        tokens
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn test_numeric_precedence() {
        assert_eq!(postfix("a + b * c;", Numeric, Terminator::Semicolon), "a b c * +");
        assert_eq!(postfix("(a + b) * c;", Numeric, Terminator::Semicolon), "a b + c *");
        assert_eq!(postfix("a - b - c;", Numeric, Terminator::Semicolon), "a b - c -");
        assert_eq!(postfix("a % 2 + 1;", Numeric, Terminator::Semicolon), "a 2 % 1 +");
        assert_eq!(postfix("i = i + 1)", Numeric, Terminator::CloseParen), "i i 1 + =");
    }

    #[test]
    fn test_negative_literal_is_operand() {
        assert_eq!(postfix("x * -1;", Numeric, Terminator::Semicolon), "x -1 *");
    }

    #[test]
    fn test_boolean_precedence() {
        assert_eq!(
            postfix("a == b && c != d)", Boolean, Terminator::CloseParen),
            "a b == c d != &&"
        );
        assert_eq!(
            postfix("!done || (x < 3 && y > 4))", Boolean, Terminator::CloseParen),
            "done ! x 3 < y 4 > && ||"
        );
    }

    #[test]
    fn test_stops_in_front_of_terminator() {
        let projection = TerminalProjection::from_tokens(
            Lexer::new("(a + b) > c) x").tokenize().unwrap(),
        );
        let mut cursor = projection.cursor();
        let tokens = reduce(&mut cursor, &Boolean, Terminator::CloseParen);
        assert_eq!(tokens.len(), 5);
        assert!(cursor.check(TokenKind::RParen));
        assert!(cursor.check_ahead(1, TokenKind::Identifier));
    }

    #[test]
    fn test_embedded_call_is_copied() {
        assert_eq!(
            postfix("sum(values, n) + 1;", Numeric, Terminator::Semicolon),
            "sum ( values n ) 1 +"
        );
        assert_eq!(
            postfix("check(x) && y)", Boolean, Terminator::CloseParen),
            "check ( x ) y &&"
        );
    }

    #[test]
    fn test_builtin_calls_are_copied() {
        assert_eq!(
            postfix("getchar(void) + 1;", Numeric, Terminator::Semicolon),
            "getchar ( void ) 1 +"
        );
        assert_eq!(
            postfix("sizeof(a) * 2;", Numeric, Terminator::Semicolon),
            "sizeof ( a ) 2 *"
        );
        assert_eq!(
            postfix("getchar(void) != 'x')", Boolean, Terminator::CloseParen),
            "getchar ( void ) ' x ' !="
        );
    }

    #[test]
    fn test_unknown_tokens() {
        assert_eq!(postfix("a[i] + 1;", Numeric, Terminator::Semicolon), "a i 1 +");
        assert_eq!(postfix("a && b;", Numeric, Terminator::Semicolon), "a b");
        assert_eq!(
            postfix("a[i] == 'x')", Boolean, Terminator::CloseParen),
            "a [ i ] ' x ' =="
        );
    }

    #[test]
    fn test_index_stops_at_bracket() {
        assert_eq!(postfix("i + 1] = 4;", Numeric, Terminator::CloseBracket), "i 1 +");
    }

    #[test]
    fn test_stray_markers_dropped() {
        assert_eq!(postfix("((a + b;", Numeric, Terminator::Semicolon), "a b +");
    }
}
