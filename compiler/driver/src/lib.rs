//! The driver: sequences the pipeline and short-circuits on stage errors.

use cli::{Arguments, ColorMode};
use colored::Colorize;
use diagnostics::{
    error::{ErasedReportedError, Result},
    Diagnostic, Reporter,
};
use lexer::ErrorExt;
use span::{SourceFileIndex, SourceMap};
use std::{
    path::Path,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, RwLock,
    },
};

mod cli;

pub fn main() -> Result {
    set_panic_hook();

    let arguments = cli::arguments();

    match arguments.color {
        ColorMode::Always => colored::control::set_override(true),
        ColorMode::Never => colored::control::set_override(false),
        ColorMode::Auto => {}
    }

    let map: Arc<RwLock<SourceMap>> = Arc::default();
    let reported_any_errors: Arc<AtomicBool> = Arc::default();
    let reporter = Reporter::buffered_stderr(reported_any_errors.clone()).with_map(map.clone());

    let result = compile(&arguments, &map, &reporter);

    // Flush the buffered diagnostics.
    drop(reporter);

    let reported_any_errors = reported_any_errors.load(Ordering::SeqCst);

    if let Err(error) = result {
        debug_assert!(reported_any_errors, "an error occurred but nothing was reported");
        return Err(error);
    }

    if reported_any_errors {
        return Err(ErasedReportedError::new_unchecked());
    }

    Ok(())
}

fn compile(arguments: &Arguments, map: &Arc<RwLock<SourceMap>>, reporter: &Reporter) -> Result {
    if !arguments.quiet {
        let label = "Compiling".green().bold();
        println!("   {label} {}", arguments.path.display());
    }

    let file = load(&arguments.path, map, reporter)?;

    let tokens = {
        let map = map.read().unwrap();
        lexer::lex(&map[file])
    };

    if !tokens.errors.is_empty() {
        let mut error = ErasedReportedError::new_unchecked();
        for lexical_error in tokens.errors {
            error = lexical_error.diagnostic().report(reporter);
        }
        return Err(error);
    }

    let program = Result::from(parser::parse(tokens.tokens, reporter))?;

    if arguments.print_ast {
        print!("{}", ast::render(&program));
    }

    let table = typer::check(&program, reporter)?;

    if arguments.print_symbols {
        print!("{}", table.render());
    }

    let name = arguments
        .path
        .file_stem()
        .and_then(std::ffi::OsStr::to_str)
        .unwrap_or("program");
    let module = codegen::compile(&program, &table, name, reporter)?;

    if arguments.print_ir {
        print!("{module}");
    }

    if arguments.execute {
        let value = interpreter::execute(&module, reporter)?;
        println!("Execution Result: {value}");
        return Ok(());
    }

    std::fs::write(&arguments.output, module.to_string()).map_err(|error| {
        Diagnostic::error()
            .message(format!(
                "could not write the output file ‘{}’",
                arguments.output.display(),
            ))
            .note(error.to_string())
            .report(reporter)
    })
}

fn load(path: &Path, map: &Arc<RwLock<SourceMap>>, reporter: &Reporter) -> Result<SourceFileIndex> {
    map.write().unwrap().load(path.to_owned()).map_err(|error| {
        Diagnostic::error()
            .message(format!("could not load the source file ‘{}’", path.display()))
            .path(path.to_owned())
            .note(error.to_string())
            .report(reporter)
    })
}

fn set_panic_hook() {
    std::panic::set_hook(Box::new(|information| {
        let payload = information.payload();
        let message = payload
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
            .unwrap_or("unknown cause");

        let location = information
            .location()
            .map(|location| format!(" at {location}"))
            .unwrap_or_default();

        eprintln!(
            "{}: {message}{location}",
            "internal compiler error".bright_red().bold(),
        );
        eprintln!("note: the compiler unexpectedly panicked; this is a bug");
    }));
}
