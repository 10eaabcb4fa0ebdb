//! AST construction from the terminal projection
//!
//! The builder reads the projected tokens front to back and dispatches on
//! the token that starts each statement. Every statement becomes one sibling
//! chain, and each chain hangs off the deepest last node of the previous one.
//!
//! Scope tracking: the routine keyword carries the scope id the resolver
//! allocated for that routine. The builder remembers it and switches to it
//! when the routine's outermost `{` is entered, returning to the global
//! scope at the matching `}`.

use thiserror::Error;

use crate::ast::node::{Ast, AstItem, AstLabel};
use crate::ast::postfix::{self, Boolean, Numeric, Terminator};
use crate::error::Diagnostic;
use crate::parser::lexer::{Token, TokenKind};
use crate::parser::projection::{Cursor, TerminalProjection};
use crate::semantic::symbol::{ScopeId, GLOBAL_SCOPE};
use crate::semantic::table::{SymbolId, SymbolTable};
use crate::tree::{NodeId, TreeError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AstError {
    #[error("Syntax error on line {line}: unhandled {found} at the start of a statement")]
    Unhandled { found: String, line: usize },

    #[error("Internal error on line {line} while linking the AST: {source}")]
    Tree {
        line: usize,
        #[source]
        source: TreeError,
    },
}

impl AstError {
    pub fn line(&self) -> usize {
        match self {
            AstError::Unhandled { line, .. } | AstError::Tree { line, .. } => *line,
        }
    }
}

/// Output of [`build`].
#[derive(Debug, Clone, Default)]
pub struct AstBuild {
    pub ast: Ast,
    pub diagnostics: Vec<Diagnostic>,
}

/// Build the AST for `projection`, binding names against `table`.
pub fn build(
    projection: &TerminalProjection,
    table: &SymbolTable,
) -> Result<AstBuild, AstError> {
    let mut builder = AstBuilder {
        cursor: projection.cursor(),
        table,
        ast: Ast::default(),
        tail: None,
        brace_depth: 0,
        scope: GLOBAL_SCOPE,
        pending_scope: None,
        diagnostics: Vec::new(),
    };
    builder.run()?;
    log::debug!("built {} AST nodes", builder.ast.tree.len());
    Ok(AstBuild {
        ast: builder.ast,
        diagnostics: builder.diagnostics,
    })
}

type Chain = Vec<(AstItem, usize)>;

struct AstBuilder<'a> {
    cursor: Cursor<'a>,
    table: &'a SymbolTable,
    ast: Ast,
    tail: Option<NodeId>,
    brace_depth: usize,
    scope: ScopeId,
    pending_scope: Option<ScopeId>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> AstBuilder<'a> {
    fn run(&mut self) -> Result<(), AstError> {
        while let Some(terminal) = self.cursor.terminal() {
            let token = &terminal.token;
            log::trace!("line {}: statement at {}", token.line, token);
            match token.kind {
                TokenKind::Function | TokenKind::Procedure => {
                    if terminal.scope.is_some() {
                        self.pending_scope = terminal.scope;
                    }
                    self.routine_declaration(token)?;
                }
                kind if kind.is_datatype() => self.variable_declarations(token)?,
                TokenKind::LBrace => self.begin_block(token)?,
                TokenKind::RBrace => self.end_block(token)?,
                TokenKind::Identifier if self.cursor.check_ahead(1, TokenKind::LParen) => {
                    self.call(token)?
                }
                TokenKind::Identifier => {
                    if let Some(chain) = self.assignment(token) {
                        self.append(chain)?;
                    }
                }
                TokenKind::For => self.for_loop(token)?,
                TokenKind::While => self.condition(token, AstLabel::While)?,
                TokenKind::If => self.condition(token, AstLabel::If)?,
                TokenKind::Else => {
                    self.cursor.advance();
                    self.append(vec![marker(AstLabel::Else, token)])?;
                }
                TokenKind::Return => self.return_statement(token)?,
                TokenKind::Printf => self.printf(token)?,
                _ => {
                    return Err(AstError::Unhandled {
                        found: token.to_string(),
                        line: token.line,
                    })
                }
            }
        }
        Ok(())
    }

    // ===== Statements =====

    fn routine_declaration(&mut self, keyword: &Token) -> Result<(), AstError> {
        let offset = if keyword.is(TokenKind::Function) { 2 } else { 1 };
        let name = self.cursor.peek(offset).cloned();
        self.cursor.skip_to(TokenKind::LBrace);

        let Some(name) = name else {
            return Ok(());
        };
        match self.resolve(&name) {
            Some(symbol) => self.append(vec![(
                AstItem::bound(AstLabel::Declaration, Some(symbol)),
                keyword.line,
            )]),
            None => {
                self.undefined(&name);
                Ok(())
            }
        }
    }

    fn variable_declarations(&mut self, keyword: &Token) -> Result<(), AstError> {
        self.cursor.advance();
        while let Some(token) = self.cursor.token() {
            if token.is(TokenKind::Semicolon) {
                break;
            }
            if token.is(TokenKind::Identifier) {
                match self.table.lookup_id(&token.text, self.scope) {
                    Some(symbol) => self.append(vec![(
                        AstItem::bound(AstLabel::Declaration, Some(symbol)),
                        keyword.line,
                    )])?,
                    None => self.undefined(token),
                }
                // Skip an array size
                if self.cursor.check_ahead(1, TokenKind::LBracket) {
                    self.cursor.skip_to(TokenKind::RBracket);
                }
            }
            self.cursor.advance();
        }
        self.cursor.eat(TokenKind::Semicolon);
        Ok(())
    }

    fn begin_block(&mut self, brace: &Token) -> Result<(), AstError> {
        self.brace_depth += 1;
        if self.brace_depth == 1 {
            if let Some(scope) = self.pending_scope.take() {
                self.scope = scope;
            }
        }
        self.cursor.advance();
        self.append(vec![marker(AstLabel::BeginBlock, brace)])
    }

    fn end_block(&mut self, brace: &Token) -> Result<(), AstError> {
        self.brace_depth = self.brace_depth.saturating_sub(1);
        if self.brace_depth == 0 {
            self.scope = GLOBAL_SCOPE;
        }
        self.cursor.advance();
        self.append(vec![marker(AstLabel::EndBlock, brace)])
    }

    fn call(&mut self, name: &Token) -> Result<(), AstError> {
        let Some(callee) = self.resolve(name) else {
            self.undefined(name);
            self.skip_statement();
            return Ok(());
        };
        let mut chain = vec![marker(AstLabel::Call, name)];
        chain.extend(self.call_operands(callee));
        self.cursor.eat(TokenKind::Semicolon);
        self.append(chain)
    }

    /// `name [ "[" index "]" ] = value ;` as `ASSIGNMENT name ... value =`.
    /// `None` when the target or a called function is not defined.
    fn assignment(&mut self, name: &Token) -> Option<Chain> {
        let Some(target) = self.resolve(name) else {
            self.undefined(name);
            self.skip_statement();
            return None;
        };
        self.cursor.advance();
        let mut chain = vec![
            marker(AstLabel::Assignment, name),
            (AstItem::bound(AstLabel::Term(name.clone()), Some(target)), name.line),
        ];

        if self.cursor.check(TokenKind::LBracket) {
            chain.extend(self.take_term());
            let index = postfix::reduce(&mut self.cursor, &Numeric, Terminator::CloseBracket);
            chain.extend(self.terms(index));
            if self.cursor.check(TokenKind::RBracket) {
                chain.extend(self.take_term());
            }
        }
        let assign = self
            .cursor
            .token()
            .filter(|t| t.is(TokenKind::Assign))
            .cloned()
            .unwrap_or_else(|| Token::new(TokenKind::Assign, "=", name.line));
        self.cursor.eat(TokenKind::Assign);

        if self.cursor.check(TokenKind::SingleQuote) {
            for _ in 0..3 {
                chain.extend(self.take_term());
            }
        } else if self.whole_call_ahead() {
            let callee = self.cursor.token().cloned()?;
            let Some(symbol) = self.resolve(&callee) else {
                self.undefined(&callee);
                self.skip_statement();
                return None;
            };
            chain.extend(self.call_operands(symbol));
        } else {
            let value = postfix::reduce(&mut self.cursor, &Numeric, Terminator::Semicolon);
            chain.extend(self.terms(value));
        }

        chain.push((AstItem::new(AstLabel::Term(assign)), name.line));
        self.cursor.eat(TokenKind::Semicolon);
        Some(chain)
    }

    fn for_loop(&mut self, keyword: &Token) -> Result<(), AstError> {
        self.cursor.skip_to(TokenKind::LParen);
        self.cursor.eat(TokenKind::LParen);

        let init_line = self.current_line(keyword.line);
        let init = match self.cursor.token().cloned() {
            Some(name) if name.is(TokenKind::Identifier) => self.assignment(&name),
            _ => None,
        };

        let condition_line = self.current_line(keyword.line);
        let condition = postfix::reduce(&mut self.cursor, &Boolean, Terminator::Semicolon);
        self.cursor.eat(TokenKind::Semicolon);

        let update_line = self.current_line(keyword.line);
        let update = postfix::reduce(&mut self.cursor, &Numeric, Terminator::CloseParen);
        self.cursor.eat(TokenKind::RParen);

        let Some(init) = init else {
            return Ok(());
        };
        let mut first = vec![(AstItem::new(AstLabel::ForInit), init_line)];
        first.extend(init.into_iter().skip(1));
        let mut second = vec![(AstItem::new(AstLabel::ForCondition), condition_line)];
        second.extend(self.terms(condition));
        let mut third = vec![(AstItem::new(AstLabel::ForUpdate), update_line)];
        third.extend(self.terms(update));

        let tree = &mut self.ast.tree;
        let (Some(first), Some(second), Some(third)) = (
            tree.push_chain(None, first),
            tree.push_chain(None, second),
            tree.push_chain(None, third),
        ) else {
            return Ok(());
        };
        let link = |source| AstError::Tree {
            line: keyword.line,
            source,
        };
        let last = tree.last_sibling(first);
        tree.set_left_child(last, second).map_err(link)?;
        let last = tree.last_sibling(second);
        tree.set_left_child(last, third).map_err(link)?;
        self.link(first, keyword.line)
    }

    /// `if` and `while`: the parenthesized condition in boolean postfix.
    fn condition(&mut self, keyword: &Token, label: AstLabel) -> Result<(), AstError> {
        self.cursor.skip_to(TokenKind::LParen);
        self.cursor.eat(TokenKind::LParen);
        let condition = postfix::reduce(&mut self.cursor, &Boolean, Terminator::CloseParen);
        self.cursor.eat(TokenKind::RParen);

        let mut chain = vec![marker(label, keyword)];
        chain.extend(self.terms(condition));
        self.append(chain)
    }

    fn return_statement(&mut self, keyword: &Token) -> Result<(), AstError> {
        self.cursor.advance();
        let value = postfix::reduce(&mut self.cursor, &Boolean, Terminator::Semicolon);
        self.cursor.eat(TokenKind::Semicolon);

        let mut chain = vec![marker(AstLabel::Return, keyword)];
        chain.extend(self.terms(value));
        self.append(chain)
    }

    /// Arguments after the format string, without punctuation.
    fn printf(&mut self, keyword: &Token) -> Result<(), AstError> {
        self.cursor.advance();
        self.cursor.eat(TokenKind::LParen);
        if let Some(quote @ (TokenKind::DoubleQuote | TokenKind::SingleQuote)) =
            self.cursor.token().map(|t| t.kind)
        {
            self.cursor.advance();
            self.cursor.eat(TokenKind::StringLiteral);
            self.cursor.eat(quote);
        }

        let mut chain = vec![marker(AstLabel::Printf, keyword)];
        let mut depth = 0usize;
        while let Some(token) = self.cursor.token() {
            match token.kind {
                TokenKind::RParen if depth == 0 => break,
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => depth -= 1,
                TokenKind::Comma | TokenKind::DoubleQuote | TokenKind::SingleQuote => {}
                _ => chain.push(self.term(token)),
            }
            self.cursor.advance();
        }
        self.cursor.eat(TokenKind::RParen);
        self.cursor.eat(TokenKind::Semicolon);
        self.append(chain)
    }

    // ===== Helpers =====

    /// `name ( args )` with the callee bound and commas dropped. The cursor
    /// is on the callee and ends past the closing parenthesis.
    fn call_operands(&mut self, callee: SymbolId) -> Chain {
        let mut chain = Vec::new();
        if let Some(name) = self.cursor.advance() {
            let token = &name.token;
            chain.push((AstItem::bound(AstLabel::Term(token.clone()), Some(callee)), token.line));
        }
        let mut depth = 0usize;
        while let Some(token) = self.cursor.token() {
            match token.kind {
                TokenKind::Comma => {}
                TokenKind::LParen => {
                    depth += 1;
                    chain.push(self.term(token));
                }
                TokenKind::RParen => {
                    depth = depth.saturating_sub(1);
                    chain.push(self.term(token));
                    if depth == 0 {
                        self.cursor.advance();
                        break;
                    }
                }
                _ => chain.push(self.term(token)),
            }
            self.cursor.advance();
        }
        chain
    }

    /// Whether the cursor is on `name ( ... )` directly followed by `;`.
    fn whole_call_ahead(&self) -> bool {
        if !(self.cursor.check(TokenKind::Identifier)
            && self.cursor.check_ahead(1, TokenKind::LParen))
        {
            return false;
        }
        let mut depth = 0usize;
        let mut offset = 1;
        while let Some(token) = self.cursor.peek(offset) {
            match token.kind {
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        return self.cursor.check_ahead(offset + 1, TokenKind::Semicolon);
                    }
                }
                TokenKind::Semicolon => return false,
                _ => {}
            }
            offset += 1;
        }
        false
    }

    fn resolve(&self, token: &Token) -> Option<SymbolId> {
        self.table.resolve(&token.text, self.scope)
    }

    /// A source token, bound when it names a symbol.
    fn term(&self, token: &Token) -> (AstItem, usize) {
        let symbol = if token.is(TokenKind::Identifier) {
            self.resolve(token)
        } else {
            None
        };
        (AstItem::bound(AstLabel::Term(token.clone()), symbol), token.line)
    }

    fn terms(&self, tokens: Vec<Token>) -> Chain {
        tokens.iter().map(|t| self.term(t)).collect()
    }

    /// The current token as a term, consuming it.
    fn take_term(&mut self) -> Option<(AstItem, usize)> {
        let terminal = self.cursor.advance()?;
        Some(self.term(&terminal.token))
    }

    fn current_line(&self, fallback: usize) -> usize {
        self.cursor.line().unwrap_or(fallback)
    }

    fn skip_statement(&mut self) {
        self.cursor.skip_to(TokenKind::Semicolon);
        self.cursor.eat(TokenKind::Semicolon);
    }

    fn undefined(&mut self, name: &Token) {
        let diagnostic = Diagnostic::semantic(
            name.line,
            format!("'{}' is not defined in scope {}", name.text, self.scope),
        );
        log::warn!("{diagnostic}");
        self.diagnostics.push(diagnostic);
    }

    // ===== Linking =====

    fn append(&mut self, chain: Chain) -> Result<(), AstError> {
        let line = chain.first().map(|(_, line)| *line).unwrap_or_default();
        match self.ast.tree.push_chain(None, chain) {
            Some(head) => self.link(head, line),
            None => Ok(()),
        }
    }

    /// Hang the chain at `head` below the previous statement.
    fn link(&mut self, head: NodeId, line: usize) -> Result<(), AstError> {
        let tree = &mut self.ast.tree;
        match self.tail {
            None => tree.set_root(head),
            Some(tail) => tree
                .set_left_child(tail, head)
                .map_err(|source| AstError::Tree { line, source })?,
        }
        self.tail = Some(tree.deepest_last(head));
        Ok(())
    }
}

fn marker(label: AstLabel, at: &Token) -> (AstItem, usize) {
    (AstItem::new(label), at.line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse::Parser;
    use crate::semantic::resolve;

    fn build_source(source: &str) -> (AstBuild, SymbolTable) {
        let mut cst = Parser::new(source)
            .unwrap()
            .parse()
            .expect("Parsing failed");
        let resolution = resolve(&mut cst);
        let built = build(&cst.project(), &resolution.table).expect("AST build failed");
        (built, resolution.table)
    }

    fn lines(ast: &Ast) -> Vec<String> {
        ast.chain_heads()
            .into_iter()
            .map(|head| {
                ast.chain(head)
                    .map(|id| ast.label(id).to_string())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect()
    }

    #[test]
    fn test_array_declaration_and_element_assignment() {
        let (built, table) = build_source(
            "procedure main (void) {\n  int x[5];\n  x[2] = 7;\n}",
        );
        assert!(built.diagnostics.is_empty());
        assert_eq!(
            lines(&built.ast),
            vec![
                "DECLARATION",
                "BEGIN BLOCK",
                "DECLARATION",
                "ASSIGNMENT x [ 2 ] 7 =",
                "END BLOCK",
            ]
        );

        let heads = built.ast.chain_heads();
        let declared = built.ast.item(heads[2]).symbol.expect("Expected binding");
        let symbol = table.get(declared);
        assert_eq!(symbol.name, "x");
        assert!(symbol.is_array);
        assert_eq!(symbol.array_size, 5);
        assert_eq!(built.ast.line(heads[3]), 3);
    }

    #[test]
    fn test_names_bind_in_routine_scope() {
        let (built, table) = build_source(
            "int g;\n\
             function int f (int n) {\n\
               int l;\n\
               l = n + g;\n\
               return l;\n\
             }\n\
             procedure main (void) {\n\
               int m;\n\
               m = f(1);\n\
             }",
        );
        assert_eq!(
            lines(&built.ast),
            vec![
                "DECLARATION",
                "DECLARATION",
                "BEGIN BLOCK",
                "DECLARATION",
                "ASSIGNMENT l n g + =",
                "RETURN l",
                "END BLOCK",
                "DECLARATION",
                "BEGIN BLOCK",
                "DECLARATION",
                "ASSIGNMENT m f ( 1 ) =",
                "END BLOCK",
            ]
        );

        let heads = built.ast.chain_heads();
        let bindings: Vec<_> = built
            .ast
            .chain(heads[4])
            .filter_map(|id| built.ast.item(id).symbol)
            .collect();
        assert_eq!(
            bindings,
            vec![
                table.lookup_id("l", 1).unwrap(),
                table.resolve("n", 1).unwrap(),
                table.lookup_id("g", 0).unwrap(),
            ]
        );
        assert!(matches!(bindings[1], SymbolId::Parameter { .. }));

        let call: Vec<_> = built
            .ast
            .chain(heads[10])
            .filter_map(|id| built.ast.item(id).symbol)
            .collect();
        assert_eq!(
            call,
            vec![
                table.lookup_id("m", 2).unwrap(),
                table.lookup_id("f", 0).unwrap(),
            ]
        );
    }

    #[test]
    fn test_for_loop_groups() {
        let (built, _) = build_source(
            "procedure main (void) {\n\
               int i, total;\n\
               for (i = 0; i < 10; i = i + 1) {\n\
                 total = total + i;\n\
               }\n\
             }",
        );
        assert_eq!(
            lines(&built.ast),
            vec![
                "DECLARATION",
                "BEGIN BLOCK",
                "DECLARATION",
                "DECLARATION",
                "FOR EXPRESSION 1 i 0 =",
                "FOR EXPRESSION 2 i 10 <",
                "FOR EXPRESSION 3 i i 1 + =",
                "BEGIN BLOCK",
                "ASSIGNMENT total total i + =",
                "END BLOCK",
                "END BLOCK",
            ]
        );
    }

    #[test]
    fn test_control_flow_and_io() {
        let (built, _) = build_source(
            "procedure show (int v) { printf(\"%d\\n\", v); }\n\
             procedure main (void) {\n\
               int a, b[3];\n\
               char c;\n\
               c = 'z';\n\
               while (a < 3 && b[0] != a) a = a + 1;\n\
               if (a == 3) show(a); else printf(\"%d %d\\n\", a, b[1]);\n\
             }",
        );
        let lines = lines(&built.ast);
        assert!(lines.contains(&"PRINTF v".to_string()));
        assert!(lines.contains(&"ASSIGNMENT c ' z ' =".to_string()));
        assert!(lines.contains(&"WHILE a 3 < b [ 0 ] a != &&".to_string()));
        assert!(lines.contains(&"IF a 3 ==".to_string()));
        assert!(lines.contains(&"CALL show ( a )".to_string()));
        assert!(lines.contains(&"ELSE".to_string()));
        assert!(lines.contains(&"PRINTF a b [ 1 ]".to_string()));
    }

    #[test]
    fn test_builtin_calls_keep_their_parentheses() {
        let (built, _) = build_source(
            "procedure main (void) {\n\
               char c;\n\
               int a[4], n;\n\
               while (getchar(void) != 'x') c = 'y';\n\
               c = getchar(void) + 1;\n\
               n = sizeof(a) + 1;\n\
             }",
        );
        assert!(built.diagnostics.is_empty());
        let lines = lines(&built.ast);
        assert!(lines.contains(&"WHILE getchar ( void ) ' x ' !=".to_string()));
        assert!(lines.contains(&"ASSIGNMENT c getchar ( void ) 1 + =".to_string()));
        assert!(lines.contains(&"ASSIGNMENT n sizeof ( a ) 1 + =".to_string()));
    }

    #[test]
    fn test_undefined_name_is_omitted() {
        let (built, _) = build_source(
            "procedure main (void) {\n  int a;\n  b = 2;\n  a = 1;\n}",
        );
        assert_eq!(built.diagnostics.len(), 1);
        assert_eq!(
            built.diagnostics[0].to_string(),
            "Semantic error on line 3: 'b' is not defined in scope 1"
        );
        assert_eq!(
            lines(&built.ast),
            vec![
                "DECLARATION",
                "BEGIN BLOCK",
                "DECLARATION",
                "ASSIGNMENT a 1 =",
                "END BLOCK",
            ]
        );
    }

    #[test]
    fn test_unhandled_leading_token() {
        let projection = TerminalProjection::from_tokens(vec![Token::new(
            TokenKind::Semicolon,
            ";",
            4,
        )]);
        let err = build(&projection, &SymbolTable::new()).unwrap_err();
        assert_eq!(err.line(), 4);
        assert!(matches!(err, AstError::Unhandled { .. }));
    }
}
