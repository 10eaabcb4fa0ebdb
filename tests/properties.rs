// Property tests over generated programs

use quickcheck::{Arbitrary, Gen, QuickCheck};

use procc::ast::AstLabel;
use procc::config::Config;
use procc::parser::lexer::TokenKind;
use procc::{compile, Compilation};

#[derive(Debug, Clone)]
struct Routine {
    function: bool,
    parameters: usize,
    locals: usize,
    /// Right-hand sides as (operand, operator) picks.
    assignments: Vec<Vec<(u8, u8)>>,
}

#[derive(Debug, Clone)]
struct Program {
    globals: usize,
    routines: Vec<Routine>,
    main: Routine,
}

fn below(g: &mut Gen, bound: usize) -> usize {
    usize::arbitrary(g) % bound
}

impl Arbitrary for Routine {
    fn arbitrary(g: &mut Gen) -> Self {
        let assignments = (0..below(g, 4))
            .map(|_| {
                (0..1 + below(g, 4))
                    .map(|_| (u8::arbitrary(g), u8::arbitrary(g)))
                    .collect()
            })
            .collect();
        Routine {
            function: bool::arbitrary(g),
            parameters: below(g, 3),
            locals: 1 + below(g, 3),
            assignments,
        }
    }
}

impl Arbitrary for Program {
    fn arbitrary(g: &mut Gen) -> Self {
        let routines = (0..below(g, 6)).map(|_| Routine::arbitrary(g)).collect();
        let main = Routine {
            function: false,
            parameters: 0,
            ..Routine::arbitrary(g)
        };
        Program {
            globals: below(g, 3),
            routines,
            main,
        }
    }
}

impl Program {
    fn routine_names(&self) -> Vec<String> {
        (0..self.routines.len())
            .map(|i| format!("r{i}"))
            .chain(std::iter::once("main".to_string()))
            .collect()
    }

    fn assignment_count(&self) -> usize {
        self.routines
            .iter()
            .chain(std::iter::once(&self.main))
            .map(|r| r.assignments.len())
            .sum()
    }

    fn render(&self) -> String {
        let mut source = String::new();
        if self.globals > 0 {
            let names: Vec<_> = (0..self.globals).map(|i| format!("g{i}")).collect();
            source.push_str(&format!("int {};\n", names.join(", ")));
        }
        let names = self.routine_names();
        for (routine, name) in self.routines.iter().chain([&self.main]).zip(&names) {
            source.push_str(&self.render_routine(routine, name));
        }
        source
    }

    fn render_routine(&self, routine: &Routine, name: &str) -> String {
        let header = if routine.function {
            format!("function int {name}")
        } else {
            format!("procedure {name}")
        };
        let parameters = if routine.parameters == 0 {
            "void".to_string()
        } else {
            (0..routine.parameters)
                .map(|i| format!("int p{i}"))
                .collect::<Vec<_>>()
                .join(", ")
        };
        let locals: Vec<_> = (0..routine.locals).map(|i| format!("v{i}")).collect();

        let mut operands: Vec<String> = locals.clone();
        operands.extend((0..routine.parameters).map(|i| format!("p{i}")));
        operands.extend((0..self.globals).map(|i| format!("g{i}")));
        operands.push("7".to_string());

        let mut body = format!("{header} ({parameters})\n{{\n  int {};\n", locals.join(", "));
        for (n, picks) in routine.assignments.iter().enumerate() {
            let mut rhs = String::new();
            for (i, &(operand, operator)) in picks.iter().enumerate() {
                if i > 0 {
                    rhs.push_str([" + ", " - ", " * "][operator as usize % 3]);
                }
                rhs.push_str(&operands[operand as usize % operands.len()]);
            }
            body.push_str(&format!("  {} = {rhs};\n", locals[n % locals.len()]));
        }
        if routine.function {
            body.push_str("  return v0;\n");
        }
        body.push_str("}\n");
        body
    }
}

fn compile_program(program: &Program) -> Option<Compilation> {
    compile(&program.render(), &Config::default()).ok()
}

#[test]
fn prop_projection_walk_matches_tokens() {
    fn prop(program: Program) -> bool {
        let Some(compilation) = compile_program(&program) else {
            return false;
        };
        let walked: Vec<_> = compilation.projection.tokens().collect();
        let lexed: Vec<_> = compilation
            .tokens
            .iter()
            .filter(|t| !t.is(TokenKind::Eof))
            .collect();
        walked == lexed
    }
    QuickCheck::new()
        .tests(200)
        .quickcheck(prop as fn(Program) -> bool);
}

#[test]
fn prop_routines_get_consecutive_scopes() {
    fn prop(program: Program) -> bool {
        let Some(compilation) = compile_program(&program) else {
            return false;
        };
        program
            .routine_names()
            .iter()
            .enumerate()
            .all(|(i, name)| {
                compilation
                    .table
                    .owner(i + 1)
                    .is_some_and(|routine| &routine.name == name)
            })
            && compilation.table.owner(program.routines.len() + 2).is_none()
    }
    QuickCheck::new()
        .tests(200)
        .quickcheck(prop as fn(Program) -> bool);
}

#[test]
fn prop_generated_programs_resolve_cleanly() {
    fn prop(program: Program) -> bool {
        let Some(compilation) = compile_program(&program) else {
            return false;
        };
        let assignments = compilation
            .ast
            .chain_heads()
            .into_iter()
            .filter(|&head| *compilation.ast.label(head) == AstLabel::Assignment)
            .count();
        !compilation.had_error() && assignments == program.assignment_count()
    }
    QuickCheck::new()
        .tests(200)
        .quickcheck(prop as fn(Program) -> bool);
}
