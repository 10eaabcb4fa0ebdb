//! Plain-text renderings of the pipeline artifacts
//!
//! Every function returns a `String` so the binary decides where and how
//! (colour, headers) it is shown.

use std::fmt::{self, Write};

use crate::ast::node::Ast;
use crate::parser::cst::Cst;
use crate::parser::lexer::{Token, TokenKind};
use crate::parser::projection::TerminalProjection;
use crate::semantic::symbol::{Symbol, SymbolKind};
use crate::semantic::table::SymbolTable;
use crate::tree::NodeId;

/// Run a writer against a fresh buffer.
fn render(write: impl FnOnce(&mut String) -> fmt::Result) -> String {
    let mut out = String::new();
    // Writing into a `String` never fails.
    match write(&mut out) {
        Ok(()) => out,
        Err(_) => String::new(),
    }
}

/// One `Token type / Token text / Line` block per token.
pub fn render_tokens(tokens: &[Token]) -> String {
    tokens
        .iter()
        .filter(|t| !t.is(TokenKind::Eof))
        .map(|token| {
            format!(
                "Token type: {}\nToken text: {}\nLine:       {}\n\n",
                token.kind, token.text, token.line
            )
        })
        .collect()
}

/// Indented tree with `(line)` suffixes.
pub fn render_cst(cst: &Cst) -> String {
    render(|out| match cst.root() {
        Some(root) => write_cst_node(cst, root, "", true, out),
        None => Ok(()),
    })
}

fn write_cst_node(
    cst: &Cst,
    id: NodeId,
    prefix: &str,
    last: bool,
    out: &mut String,
) -> fmt::Result {
    let branch = if last { "+-- " } else { "|-- " };
    writeln!(out, "{prefix}{branch}{} ({})", cst.label(id), cst.line(id))?;

    let child_prefix = format!("{prefix}{}", if last { "    " } else { "|   " });
    let children: Vec<NodeId> = cst.children(id).collect();
    for (i, &child) in children.iter().enumerate() {
        write_cst_node(cst, child, &child_prefix, i + 1 == children.len(), out)?;
    }
    Ok(())
}

/// One ` -> `-joined chain per source line.
pub fn render_terminals(projection: &TerminalProjection) -> String {
    let tree = projection.tree();
    projection
        .line_heads()
        .into_iter()
        .map(|head| {
            let texts: Vec<&str> = tree
                .siblings(head)
                .map(|id| tree.value(id).token.text.as_str())
                .collect();
            format!("{}\n", texts.join(" -> "))
        })
        .collect()
}

/// Every entry, then the parameter list of each routine that has one.
pub fn render_symbols(table: &SymbolTable) -> String {
    render(|out| write_symbols(table, out))
}

fn write_symbols(table: &SymbolTable, out: &mut String) -> fmt::Result {
    for symbol in table.iter() {
        let kind = match symbol.kind {
            SymbolKind::Variable => "datatype".to_string(),
            kind => kind.to_string(),
        };
        writeln!(out, "IDENTIFIER_NAME: {}", symbol.name)?;
        writeln!(out, "IDENTIFIER_TYPE: {kind}")?;
        write_symbol_details(symbol, out)?;
    }
    for routine in table.iter().filter(|s| !s.parameters.is_empty()) {
        writeln!(out, "PARAMETER LIST FOR: {}", routine.name)?;
        for parameter in &routine.parameters {
            writeln!(out, "IDENTIFIER_NAME: {}", parameter.name)?;
            write_symbol_details(parameter, out)?;
        }
    }
    Ok(())
}

fn write_symbol_details(symbol: &Symbol, out: &mut String) -> fmt::Result {
    let data_type = symbol
        .data_type
        .map_or_else(|| "NOT APPLICABLE".to_string(), |t| t.to_string());
    writeln!(out, "DATATYPE: {data_type}")?;
    writeln!(
        out,
        "DATATYPE_IS_ARRAY: {}",
        if symbol.is_array { "yes" } else { "no" }
    )?;
    writeln!(out, "DATATYPE_ARRAY_SIZE: {}", symbol.array_size)?;
    writeln!(out, "SCOPE: {}\n", symbol.scope)
}

/// One ` -> `-joined line per chain; bound nodes name their symbol.
pub fn render_ast(ast: &Ast, table: &SymbolTable) -> String {
    ast.chain_heads()
        .into_iter()
        .map(|head| {
            let parts: Vec<String> = ast
                .chain(head)
                .map(|id| {
                    let item = ast.item(id);
                    match item.symbol {
                        Some(symbol) => {
                            format!("{} ({})", item.label, table.get(symbol).name)
                        }
                        None => item.label.to_string(),
                    }
                })
                .collect();
            format!("{}\n", parts.join(" -> "))
        })
        .collect()
}
