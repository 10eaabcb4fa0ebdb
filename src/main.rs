// procc: front end for a small C-like procedural language

mod theme;

use std::fs;
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use crossterm::style::Stylize;
use log::{debug, info};

use procc::config::{Config, Stage};
use procc::printer;
use procc::Compilation;
use theme::DEFAULT_THEME;

/// Parse a program, resolve its symbols, and build its abstract syntax tree
#[derive(Parser, Debug)]
#[command(name = "procc")]
#[command(version)]
#[command(about = "Front end for a small C-like procedural language", long_about = None)]
struct Cli {
    /// Source file to compile
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Artifacts to print (comma-separated)
    #[arg(long, value_delimiter = ',', num_args = 1.., default_values = ["symbols", "ast"])]
    emit: Vec<EmitArg>,

    /// Lex the file as is, comments included
    #[arg(long)]
    keep_comments: bool,

    /// Disable coloured output
    #[arg(long)]
    no_color: bool,

    /// Verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Quiet mode (suppress warnings)
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum EmitArg {
    /// Token listing
    Tokens,
    /// Concrete syntax tree
    Cst,
    /// Terminals grouped by source line
    Terminals,
    /// Symbol table
    Symbols,
    /// Abstract syntax tree
    Ast,
}

impl From<EmitArg> for Stage {
    fn from(arg: EmitArg) -> Self {
        match arg {
            EmitArg::Tokens => Stage::Tokens,
            EmitArg::Cst => Stage::Cst,
            EmitArg::Terminals => Stage::Terminals,
            EmitArg::Symbols => Stage::Symbols,
            EmitArg::Ast => Stage::Ast,
        }
    }
}

fn build_config(cli: &Cli) -> Config {
    Config {
        strip_comments: !cli.keep_comments,
        emit: cli.emit.iter().copied().map(Stage::from).collect(),
        color: !cli.no_color,
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.quiet {
        log::LevelFilter::Error
    } else {
        match cli.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    };
    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();

    let config = build_config(&cli);
    debug!("config: {config:?}");

    let source = fs::read_to_string(&cli.input)
        .with_context(|| format!("Failed to read input file: {:?}", cli.input))?;

    info!("Compiling {}...", cli.input.display());
    let compilation = match procc::compile(&source, &config) {
        Ok(compilation) => compilation,
        Err(e) => {
            report_error(&e.to_string(), &config);
            process::exit(1);
        }
    };

    for diagnostic in &compilation.diagnostics {
        report_error(&diagnostic.to_string(), &config);
    }
    emit(&compilation, &config);

    if compilation.had_error() {
        process::exit(1);
    }
    info!("Done: {} AST nodes", compilation.ast.tree().len());
    Ok(())
}

fn emit(compilation: &Compilation, config: &Config) {
    for stage in Stage::ALL.into_iter().filter(|&s| config.emits(s)) {
        let body = match stage {
            Stage::Tokens => printer::render_tokens(&compilation.tokens),
            Stage::Cst => printer::render_cst(&compilation.cst),
            Stage::Terminals => printer::render_terminals(&compilation.projection),
            // A table with conflicting definitions is not shown
            Stage::Symbols if compilation.had_error() => continue,
            Stage::Symbols => printer::render_symbols(&compilation.table),
            Stage::Ast => printer::render_ast(&compilation.ast, &compilation.table),
        };
        print_header(stage, config);
        println!("{body}");
    }
}

fn print_header(stage: Stage, config: &Config) {
    let rule = "=".repeat(stage.title().len());
    if config.color {
        println!("{}", rule.as_str().with(DEFAULT_THEME.comment));
        println!("{}", stage.title().with(DEFAULT_THEME.primary).bold());
        println!("{}", rule.as_str().with(DEFAULT_THEME.comment));
    } else {
        println!("{rule}\n{}\n{rule}", stage.title());
    }
}

fn report_error(message: &str, config: &Config) {
    if config.color {
        eprintln!("{}", message.with(DEFAULT_THEME.error));
    } else {
        eprintln!("{message}");
    }
}
