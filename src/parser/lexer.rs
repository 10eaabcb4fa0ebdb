//! Lexer (tokenizer) for procc source text
//!
//! Converts comment-free source text into a flat [`Token`] sequence consumed
//! by the parser. Quoted literals are split into three tokens (opening
//! delimiter, content, closing delimiter). Lexical problems are produced as
//! error-kind tokens; [`Lexer::tokenize`] stops at the first one and reports
//! it as a [`LexError`].

use std::collections::VecDeque;
use std::fmt;
use thiserror::Error;

/// Every kind of token the lexer can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Names and literals
    Identifier,
    Integer,
    /// Content between a pair of quote delimiters (string or character)
    StringLiteral,
    DoubleQuote,
    SingleQuote,

    // Punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Semicolon,
    Comma,

    // Operators
    Assign,       // =
    Plus,         // +
    Minus,        // -
    Asterisk,     // *
    Divide,       // /
    Modulo,       // %
    Lt,           // <
    Gt,           // >
    LtEqual,      // <=
    GtEqual,      // >=
    BoolEqual,    // ==
    BoolNotEqual, // !=
    BoolAnd,      // &&
    BoolOr,       // ||
    BoolNot,      // !

    // Keywords
    BoolTrue,
    BoolFalse,
    Return,
    Char,
    Bool,
    Int,
    If,
    Else,
    While,
    For,
    Printf,
    Function,
    Procedure,
    Getchar,
    Void,
    Sizeof,

    // Errors
    InvalidInteger,
    InvalidIdentifier,
    UnclosedString,
    UnclosedChar,
    InvalidCharacter,
    InvalidOperator,

    Eof,
}

impl TokenKind {
    /// Looks up the keyword spelled by `word`.
    pub fn keyword(word: &str) -> Option<TokenKind> {
        let kind = match word {
            "return" => TokenKind::Return,
            "TRUE" => TokenKind::BoolTrue,
            "FALSE" => TokenKind::BoolFalse,
            "char" => TokenKind::Char,
            "bool" => TokenKind::Bool,
            "int" => TokenKind::Int,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "while" => TokenKind::While,
            "for" => TokenKind::For,
            "printf" => TokenKind::Printf,
            "function" => TokenKind::Function,
            "procedure" => TokenKind::Procedure,
            "getchar" => TokenKind::Getchar,
            "void" => TokenKind::Void,
            "sizeof" => TokenKind::Sizeof,
            _ => return None,
        };
        Some(kind)
    }

    /// Upper-case kind name used in token listings and grammar errors.
    pub fn name(self) -> &'static str {
        match self {
            TokenKind::Identifier => "IDENTIFIER",
            TokenKind::Integer => "INTEGER",
            TokenKind::StringLiteral => "STRING",
            TokenKind::DoubleQuote => "DOUBLE_QUOTE",
            TokenKind::SingleQuote => "SINGLE_QUOTE",
            TokenKind::LParen => "L_PAREN",
            TokenKind::RParen => "R_PAREN",
            TokenKind::LBrace => "L_BRACE",
            TokenKind::RBrace => "R_BRACE",
            TokenKind::LBracket => "L_BRACKET",
            TokenKind::RBracket => "R_BRACKET",
            TokenKind::Semicolon => "SEMICOLON",
            TokenKind::Comma => "COMMA",
            TokenKind::Assign => "ASSIGNMENT_OPERATOR",
            TokenKind::Plus => "PLUS",
            TokenKind::Minus => "MINUS",
            TokenKind::Asterisk => "ASTERISK",
            TokenKind::Divide => "DIVIDE",
            TokenKind::Modulo => "MODULO",
            TokenKind::Lt => "LT",
            TokenKind::Gt => "GT",
            TokenKind::LtEqual => "LT_EQUAL",
            TokenKind::GtEqual => "GT_EQUAL",
            TokenKind::BoolEqual => "BOOLEAN_EQUAL",
            TokenKind::BoolNotEqual => "BOOLEAN_NOT_EQUAL",
            TokenKind::BoolAnd => "BOOLEAN_AND",
            TokenKind::BoolOr => "BOOLEAN_OR",
            TokenKind::BoolNot => "BOOLEAN_NOT",
            TokenKind::BoolTrue => "BOOLEAN_TRUE",
            TokenKind::BoolFalse => "BOOLEAN_FALSE",
            TokenKind::Return => "RETURN",
            TokenKind::Char => "CHAR",
            TokenKind::Bool => "BOOL",
            TokenKind::Int => "INT",
            TokenKind::If => "IF",
            TokenKind::Else => "ELSE",
            TokenKind::While => "WHILE",
            TokenKind::For => "FOR",
            TokenKind::Printf => "PRINTF",
            TokenKind::Function => "FUNCTION",
            TokenKind::Procedure => "PROCEDURE",
            TokenKind::Getchar => "GETCHAR",
            TokenKind::Void => "VOID",
            TokenKind::Sizeof => "SIZEOF",
            TokenKind::InvalidInteger => "ERROR_INVALID_INT",
            TokenKind::InvalidIdentifier => "ERROR_INVALID_IDENTIFIER",
            TokenKind::UnclosedString => "ERROR_UNCLOSED_STRING",
            TokenKind::UnclosedChar => "ERROR_UNCLOSED_CHAR",
            TokenKind::InvalidCharacter => "ERROR_INVALID_CHAR",
            TokenKind::InvalidOperator => "ERROR_INVALID_OPERATOR",
            TokenKind::Eof => "END_OF_FILE",
        }
    }

    /// Human-readable description of an error kind; `None` for valid kinds.
    pub fn error_description(self) -> Option<&'static str> {
        match self {
            TokenKind::InvalidInteger => Some("invalid integer"),
            TokenKind::InvalidIdentifier => Some("invalid identifier"),
            TokenKind::UnclosedString => Some("unterminated string quote"),
            TokenKind::UnclosedChar => Some("unclosed character literal"),
            TokenKind::InvalidCharacter => Some("invalid character"),
            TokenKind::InvalidOperator => Some("invalid operator"),
            _ => None,
        }
    }

    pub fn is_error(self) -> bool {
        self.error_description().is_some()
    }

    /// Words that can never name a variable or routine.
    pub fn is_keyword(self) -> bool {
        matches!(
            self,
            TokenKind::BoolTrue
                | TokenKind::BoolFalse
                | TokenKind::Return
                | TokenKind::Char
                | TokenKind::Bool
                | TokenKind::Int
                | TokenKind::If
                | TokenKind::Else
                | TokenKind::While
                | TokenKind::For
                | TokenKind::Printf
                | TokenKind::Function
                | TokenKind::Procedure
                | TokenKind::Getchar
                | TokenKind::Void
                | TokenKind::Sizeof
        )
    }

    pub fn is_datatype(self) -> bool {
        matches!(self, TokenKind::Char | TokenKind::Bool | TokenKind::Int)
    }

    /// `+ - * / %`
    pub fn is_numerical_operator(self) -> bool {
        matches!(
            self,
            TokenKind::Plus
                | TokenKind::Minus
                | TokenKind::Asterisk
                | TokenKind::Divide
                | TokenKind::Modulo
        )
    }

    /// `< <= > >= == !=`
    pub fn is_relational(self) -> bool {
        matches!(
            self,
            TokenKind::Lt
                | TokenKind::LtEqual
                | TokenKind::Gt
                | TokenKind::GtEqual
                | TokenKind::BoolEqual
                | TokenKind::BoolNotEqual
        )
    }

    /// `&& ||`
    pub fn is_boolean_operator(self) -> bool {
        matches!(self, TokenKind::BoolAnd | TokenKind::BoolOr)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single lexeme with its kind and the line it was read on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: usize,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, line: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            line,
        }
    }

    pub fn eof(line: usize) -> Self {
        Self::new(TokenKind::Eof, "", line)
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Identifier => write!(f, "identifier '{}'", self.text),
            TokenKind::Integer => write!(f, "integer literal {}", self.text),
            TokenKind::StringLiteral => {
                write!(f, "string literal \"{}\"", self.text)
            }
            TokenKind::Eof => write!(f, "end of file"),
            _ => write!(f, "'{}'", self.text),
        }
    }
}

/// The first error token met while tokenizing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "Syntax error on line {line}: {}",
    .kind.error_description().unwrap_or("unexpected token")
)]
pub struct LexError {
    pub kind: TokenKind,
    pub text: String,
    pub line: usize,
}

/// Lexer over a source string
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    /// Content and closing delimiter of a quoted literal, drained first
    pending: VecDeque<Token>,
}

impl Lexer {
    /// Create a new lexer for the given source string.
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            pending: VecDeque::new(),
        }
    }

    /// Tokenize the entire input, ending with a single [`TokenKind::Eof`].
    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token();
            if token.kind.is_error() {
                return Err(LexError {
                    kind: token.kind,
                    text: token.text,
                    line: token.line,
                });
            }
            let done = token.is(TokenKind::Eof);
            tokens.push(token);
            if done {
                break;
            }
        }

        log::debug!("lexed {} tokens", tokens.len());
        Ok(tokens)
    }

    /// Produce the next token. Never fails: problems become error tokens and
    /// an exhausted input keeps yielding end-of-file.
    pub fn next_token(&mut self) -> Token {
        if let Some(token) = self.pending.pop_front() {
            return token;
        }

        self.skip_whitespace();

        let Some(ch) = self.peek() else {
            return Token::eof(self.line);
        };

        if ch.is_ascii_alphabetic() || ch == '_' {
            self.identifier()
        } else if ch.is_ascii_digit() {
            self.number(String::new())
        } else if ch == '"' || ch == '\'' {
            self.quoted(ch)
        } else if ch.is_ascii_punctuation() {
            self.operator()
        } else {
            self.advance();
            Token::new(TokenKind::InvalidCharacter, ch.to_string(), self.line)
        }
    }

    fn identifier(&mut self) -> Token {
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }

        // Letters outside ASCII cannot be part of a name
        if self.peek().is_some_and(|c| c.is_alphabetic()) {
            while let Some(c) = self.peek() {
                if c.is_alphanumeric() || c == '_' {
                    text.push(c);
                    self.advance();
                } else {
                    break;
                }
            }
            return Token::new(TokenKind::InvalidIdentifier, text, self.line);
        }

        let kind = TokenKind::keyword(&text).unwrap_or(TokenKind::Identifier);
        Token::new(kind, text, self.line)
    }

    /// Scan digits onto `text`. A letter inside the number makes the whole
    /// lexeme (letter included) an invalid integer.
    fn number(&mut self, mut text: String) -> Token {
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                text.push(c);
                self.advance();
            } else if c.is_ascii_alphabetic() {
                text.push(c);
                self.advance();
                return Token::new(TokenKind::InvalidInteger, text, self.line);
            } else {
                break;
            }
        }
        Token::new(TokenKind::Integer, text, self.line)
    }

    fn quoted(&mut self, delimiter: char) -> Token {
        let (open_kind, unclosed_kind) = if delimiter == '"' {
            (TokenKind::DoubleQuote, TokenKind::UnclosedString)
        } else {
            (TokenKind::SingleQuote, TokenKind::UnclosedChar)
        };

        self.advance();
        let open = Token::new(open_kind, delimiter.to_string(), self.line);

        let mut content = String::new();
        loop {
            match self.peek() {
                // The newline stays in the input so it is still counted
                None | Some('\n') => {
                    self.pending.push_back(Token::new(
                        unclosed_kind,
                        content,
                        self.line,
                    ));
                    break;
                }
                Some('\\') => {
                    self.advance();
                    content.push('\\');
                    if let Some(escaped) = self.advance() {
                        content.push(escaped);
                    }
                }
                Some(c) if c == delimiter => {
                    self.advance();
                    self.pending.push_back(Token::new(
                        TokenKind::StringLiteral,
                        content,
                        self.line,
                    ));
                    self.pending.push_back(Token::new(
                        open_kind,
                        delimiter.to_string(),
                        self.line,
                    ));
                    break;
                }
                Some(c) => {
                    self.advance();
                    content.push(c);
                }
            }
        }

        open
    }

    fn operator(&mut self) -> Token {
        let line = self.line;
        let Some(first) = self.advance() else {
            return Token::eof(line);
        };

        if let Some(second) = self.peek() {
            let double = match (first, second) {
                ('=', '=') => Some(TokenKind::BoolEqual),
                ('!', '=') => Some(TokenKind::BoolNotEqual),
                ('<', '=') => Some(TokenKind::LtEqual),
                ('>', '=') => Some(TokenKind::GtEqual),
                ('&', '&') => Some(TokenKind::BoolAnd),
                ('|', '|') => Some(TokenKind::BoolOr),
                _ => None,
            };
            if let Some(kind) = double {
                self.advance();
                return Token::new(kind, format!("{first}{second}"), line);
            }
            if first == '-' && second.is_ascii_digit() {
                return self.number(String::from('-'));
            }
        }

        let kind = match first {
            '=' => TokenKind::Assign,
            '!' => TokenKind::BoolNot,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Asterisk,
            '/' => TokenKind::Divide,
            '%' => TokenKind::Modulo,
            '<' => TokenKind::Lt,
            '>' => TokenKind::Gt,
            ';' => TokenKind::Semicolon,
            ',' => TokenKind::Comma,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            _ => TokenKind::InvalidOperator,
        };
        Token::new(kind, first.to_string(), line)
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_ascii_whitespace() || c == '\x0b' {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.position += 1;
        if ch == '\n' {
            self.line += 1;
        }
        Some(ch)
    }
}
