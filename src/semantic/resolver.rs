//! Symbol resolution over the CST
//!
//! A single pre-order walk that allocates scope ids to routine declarations,
//! records every declared name in a [`SymbolTable`], and annotates each
//! routine's CST node with the scope id of its body. Conflicting definitions
//! are reported as diagnostics; the walk always runs to the end.

use crate::error::Diagnostic;
use crate::parser::cst::{Cst, Rule};
use crate::parser::lexer::{Token, TokenKind};
use crate::semantic::symbol::{DataType, ScopeId, Symbol, GLOBAL_SCOPE};
use crate::semantic::table::{SymbolId, SymbolTable};
use crate::tree::NodeId;

/// Output of [`resolve`].
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub table: SymbolTable,
    pub diagnostics: Vec<Diagnostic>,
}

impl Resolution {
    pub fn had_error(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

/// Build the symbol table for `cst` and annotate its routine declarations.
pub fn resolve(cst: &mut Cst) -> Resolution {
    let mut resolver = Resolver {
        cst,
        table: SymbolTable::new(),
        diagnostics: Vec::new(),
        next_scope: GLOBAL_SCOPE + 1,
    };
    if let Some(root) = resolver.cst.root() {
        resolver.visit(root, GLOBAL_SCOPE);
    }
    log::debug!(
        "resolved {} symbols in {} scopes",
        resolver.table.len(),
        resolver.next_scope
    );
    Resolution {
        table: resolver.table,
        diagnostics: resolver.diagnostics,
    }
}

struct Resolver<'a> {
    cst: &'a mut Cst,
    table: SymbolTable,
    diagnostics: Vec<Diagnostic>,
    next_scope: ScopeId,
}

impl Resolver<'_> {
    fn visit(&mut self, id: NodeId, scope: ScopeId) {
        match self.cst.rule(id) {
            Some(Rule::DeclarationStatement) => self.declare_variables(id, scope),
            Some(rule) if rule.is_routine() => self.declare_routine(id, rule, scope),
            Some(_) => {
                let children: Vec<NodeId> = self.cst.children(id).collect();
                for child in children {
                    self.visit(child, scope);
                }
            }
            None => {}
        }
    }

    fn declare_variables(&mut self, id: NodeId, scope: ScopeId) {
        let tokens = self.tokens_under(id);
        let Some(data_type) = tokens.first().and_then(|t| DataType::from_token(t.kind))
        else {
            return;
        };
        for symbol in flatten_names(&tokens[1..], data_type, scope) {
            if let Err(duplicate) = self.table.add_symbol(symbol) {
                self.report(duplicate.line, duplicate.to_string());
            }
        }
    }

    fn declare_routine(&mut self, id: NodeId, rule: Rule, parent: ScopeId) {
        let scope = self.next_scope;
        self.next_scope += 1;
        self.cst.annotate_scope(id, scope);

        let children: Vec<NodeId> = self.cst.children(id).collect();
        let name = children
            .iter()
            .filter_map(|&c| self.cst.token(c))
            .find(|t| t.is(TokenKind::Identifier))
            .cloned();
        let Some(name) = name else {
            return;
        };

        let symbol = match rule {
            Rule::FunctionDeclaration => {
                let return_type = children
                    .iter()
                    .filter_map(|&c| self.cst.token(c))
                    .find_map(|t| DataType::from_token(t.kind));
                match return_type {
                    Some(data_type) => {
                        Symbol::function(&name.text, data_type, parent, name.line)
                    }
                    None => return,
                }
            }
            _ => Symbol::procedure(&name.text, parent, name.line),
        };
        log::trace!("{} '{}' opens scope {scope}", symbol.kind, symbol.name);

        let routine = match self.table.add_symbol(symbol) {
            Ok(routine) => {
                self.table.bind_scope(scope, routine);
                Some(routine)
            }
            Err(duplicate) => {
                self.report(duplicate.line, duplicate.to_string());
                None
            }
        };

        for &child in &children {
            match self.cst.rule(child) {
                Some(Rule::ParameterList) => {
                    if let Some(routine) = routine {
                        self.declare_parameters(child, routine, scope);
                    }
                }
                Some(_) => self.visit(child, scope),
                None => {}
            }
        }
    }

    fn declare_parameters(&mut self, list: NodeId, routine: SymbolId, scope: ScopeId) {
        let tokens = self.tokens_under(list);
        let mut data_type = None;
        let mut i = 0;
        while i < tokens.len() {
            if let Some(declared) = DataType::from_token(tokens[i].kind) {
                data_type = Some(declared);
                i += 1;
                continue;
            }
            if let (Some(data_type), true) =
                (data_type, tokens[i].is(TokenKind::Identifier))
            {
                let (parameter, used) = name_at(&tokens[i..], data_type, scope);
                i += used;
                if let Err(duplicate) = self.table.add_parameter(routine, parameter)
                {
                    self.report(duplicate.line, duplicate.to_string());
                }
                continue;
            }
            i += 1;
        }
    }

    fn tokens_under(&self, id: NodeId) -> Vec<Token> {
        self.cst
            .terminals(id)
            .into_iter()
            .filter_map(|t| self.cst.token(t).cloned())
            .collect()
    }

    fn report(&mut self, line: usize, message: String) {
        let diagnostic = Diagnostic::semantic(line, message);
        log::warn!("{diagnostic}");
        self.diagnostics.push(diagnostic);
    }
}

/// Variables named in a declaration list (`a, b[4], c`).
fn flatten_names(tokens: &[Token], data_type: DataType, scope: ScopeId) -> Vec<Symbol> {
    let mut symbols = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        if tokens[i].is(TokenKind::Identifier) {
            let (symbol, used) = name_at(&tokens[i..], data_type, scope);
            symbols.push(symbol);
            i += used;
        } else {
            i += 1;
        }
    }
    symbols
}

/// The variable declared by the identifier at the front of `tokens`, and how
/// many tokens its declarator spans.
fn name_at(tokens: &[Token], data_type: DataType, scope: ScopeId) -> (Symbol, usize) {
    let name = &tokens[0];
    let size = match tokens {
        [_, open, size, close, ..]
            if open.is(TokenKind::LBracket)
                && size.is(TokenKind::Integer)
                && close.is(TokenKind::RBracket) =>
        {
            size.text.parse::<usize>().ok()
        }
        _ => None,
    };
    match size {
        Some(size) => (
            Symbol::array(&name.text, data_type, size, scope, name.line),
            4,
        ),
        None => (Symbol::variable(&name.text, data_type, scope, name.line), 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse::Parser;
    use crate::semantic::symbol::SymbolKind;

    fn resolve_source(source: &str) -> (Cst, Resolution) {
        let mut cst = Parser::new(source)
            .unwrap()
            .parse()
            .expect("Parsing failed");
        let resolution = resolve(&mut cst);
        (cst, resolution)
    }

    #[test]
    fn test_scopes_follow_declaration_order() {
        let (cst, resolution) = resolve_source(
            "function int twice (int n) { return n * 2; }\n\
             procedure show (int value) { printf(\"%d\", value); }\n\
             procedure main (void) { int x; x = twice(2); show(x); }",
        );
        assert!(!resolution.had_error());

        let scopes: Vec<_> = (0..cst.tree().len())
            .filter_map(|id| cst.scope(id))
            .collect();
        assert_eq!(scopes, vec![1, 2, 3]);

        let table = &resolution.table;
        assert_eq!(table.lookup("twice", 0).unwrap().kind, SymbolKind::Function);
        assert_eq!(table.lookup("main", 0).unwrap().data_type, None);
        assert_eq!(table.lookup("x", 3).unwrap().data_type, Some(DataType::Int));
        assert_eq!(table.owner(2).unwrap().name, "show");
        assert_eq!(table.lookup("show", 0).unwrap().parameters[0].scope, 2);
    }

    #[test]
    fn test_mixed_declaration_list() {
        let (_, resolution) = resolve_source(
            "char a, b[5], c;\nprocedure main (void) { }",
        );
        let table = &resolution.table;
        assert!(!table.lookup("a", 0).unwrap().is_array);
        let b = table.lookup("b", 0).unwrap();
        assert!(b.is_array);
        assert_eq!(b.array_size, 5);
        assert_eq!(b.data_type, Some(DataType::Char));
        assert!(table.lookup("c", 0).is_some());
    }

    #[test]
    fn test_parameters_with_arrays() {
        let (_, resolution) = resolve_source(
            "procedure fill (int values[10], int count, bool flag) { }\n\
             procedure main (void) { }",
        );
        let fill = resolution.table.lookup("fill", 0).unwrap();
        let names: Vec<_> = fill.parameters.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["values", "count", "flag"]);
        assert_eq!(fill.parameters[0].array_size, 10);
        assert_eq!(fill.parameters[2].data_type, Some(DataType::Bool));
    }

    #[test]
    fn test_duplicates_are_reported_and_walk_continues() {
        let (_, resolution) = resolve_source(
            "int total;\n\
             procedure add (int a, int a) { int total; }\n\
             procedure main (void) { int y; int y; int z; }",
        );
        let messages: Vec<_> = resolution
            .diagnostics
            .iter()
            .map(|d| d.to_string())
            .collect();
        assert_eq!(
            messages,
            vec![
                "Semantic error on line 2: variable 'a' is already defined locally",
                "Semantic error on line 2: variable 'total' is already defined globally",
                "Semantic error on line 3: variable 'y' is already defined locally",
            ]
        );
        assert!(resolution.table.lookup("z", 2).is_some());
    }

    #[test]
    fn test_local_cannot_reuse_parameter_name() {
        let (_, resolution) = resolve_source(
            "function int f (int n) { int n; return n; }\n\
             procedure main (void) { }",
        );
        assert!(resolution.had_error());
        assert_eq!(resolution.diagnostics[0].line, 1);
    }

    #[test]
    fn test_duplicate_routine() {
        let (_, resolution) = resolve_source(
            "procedure f (void) { }\nprocedure f (void) { }\n\
             procedure main (void) { }",
        );
        assert_eq!(
            resolution.diagnostics[0].message,
            "procedure 'f' is already defined locally"
        );
    }
}
