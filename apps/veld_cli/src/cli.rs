//! Argument parsing and command dispatch for `veldc`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use veld_compile::diagnostic;
use veld_compile::Driver;

/// Compile and run a veld program.
#[derive(Debug, Parser)]
#[command(name = "veldc", version, about)]
pub struct Cli {
    /// Source file to compile.
    pub file: PathBuf,

    /// Stop after the given stage and print its output instead of running.
    #[arg(long, value_enum, default_value_t = Emit::Run)]
    pub emit: Emit,

    /// How diagnostics are printed to stderr.
    #[arg(long, value_enum, default_value_t = ErrorFormat::Text)]
    pub error_format: ErrorFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Emit {
    /// Execute `main`; its return value becomes the exit code.
    Run,
    /// Print the filtered token stream.
    Tokens,
    /// Print the parsed AST in canonical notation.
    Ast,
    /// Print the generated IR module.
    Ir,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ErrorFormat {
    Text,
    Json,
}

/// Runs the chosen command; the return value is the process exit code.
pub fn run(cli: &Cli) -> i32 {
    let mut driver = match Driver::from_file(&cli.file) {
        Ok(driver) => driver,
        Err(error) => {
            eprintln!("veldc: cannot read {}: {error}", cli.file.display());
            return 1;
        }
    };

    let outcome = match cli.emit {
        Emit::Run => driver.jit_exec_main(),
        Emit::Tokens => emit_tokens(&mut driver),
        Emit::Ast => emit_ast(&mut driver),
        Emit::Ir => driver.compile().map(|module| {
            print!("{module}");
            0
        }),
    };

    match outcome {
        Ok(code) => code,
        Err(interrupt) => {
            if driver.diags().is_empty() {
                // internal errors have no diagnostics to print
                eprintln!("veldc: {interrupt}");
            } else {
                let rendered = match cli.error_format {
                    ErrorFormat::Text => diagnostic::render_text(
                        driver.diags(),
                        driver.source(),
                        driver.file_name(),
                    ),
                    ErrorFormat::Json => {
                        diagnostic::render_json(driver.diags(), driver.source())
                    }
                };
                eprint!("{rendered}");
                if matches!(cli.error_format, ErrorFormat::Json) {
                    eprintln!();
                }
            }
            1
        }
    }
}

fn emit_tokens(driver: &mut Driver) -> veld_language::PassResult<i32> {
    let source = driver.source().to_string();
    let mut interner = veld_base::Interner::new();
    let tokens = veld_language::lex(&source, &mut interner, driver.log_mut())?;
    for token in veld_language::filter_tokens(tokens) {
        println!("{:?} @ {}..{}", token.kind, token.span.start, token.span.end);
    }
    Ok(0)
}

fn emit_ast(driver: &mut Driver) -> veld_language::PassResult<i32> {
    let source = driver.source().to_string();
    let mut interner = veld_base::Interner::new();
    let tokens = veld_language::lex(&source, &mut interner, driver.log_mut())?;
    let tokens = veld_language::filter_tokens(tokens);
    let ast = veld_language::parse(&tokens, driver.log_mut())?;
    println!("{}", veld_language::printer::canonical(&ast, &interner));
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn the_source_file_is_the_one_positional_argument() {
        let cli = Cli::try_parse_from(["veldc", "prog.veld"]).expect("parses");
        assert_eq!(cli.file, PathBuf::from("prog.veld"));
        assert_eq!(cli.emit, Emit::Run);
        assert_eq!(cli.error_format, ErrorFormat::Text);
    }

    #[test]
    fn missing_file_argument_is_rejected() {
        assert!(Cli::try_parse_from(["veldc"]).is_err());
    }

    #[test]
    fn emit_and_error_format_parse() {
        let cli =
            Cli::try_parse_from(["veldc", "p.veld", "--emit", "ir", "--error-format", "json"])
                .expect("parses");
        assert_eq!(cli.emit, Emit::Ir);
        assert_eq!(cli.error_format, ErrorFormat::Json);
    }
}
