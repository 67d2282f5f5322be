//! The command-line interface.

use clap::{builder::ValueParser, Arg, ArgAction};
use std::path::PathBuf;

mod argument {
    pub(super) const PATH: &str = "PATH";
}

mod option {
    pub(super) const OUTPUT: &str = "output";
    pub(super) const EXECUTE: &str = "execute";
    pub(super) const PRINT_AST: &str = "print-ast";
    pub(super) const PRINT_SYMBOLS: &str = "print-sp";
    pub(super) const PRINT_IR: &str = "print-ir";
    pub(super) const QUIET: &str = "quiet";
    pub(super) const COLOR: &str = "color";
}

pub(crate) struct Arguments {
    pub(crate) path: PathBuf,
    pub(crate) output: PathBuf,
    pub(crate) execute: bool,
    pub(crate) print_ast: bool,
    pub(crate) print_symbols: bool,
    pub(crate) print_ir: bool,
    pub(crate) quiet: bool,
    pub(crate) color: ColorMode,
}

#[derive(Clone, Copy)]
pub(crate) enum ColorMode {
    Always,
    Never,
    Auto,
}

pub(crate) fn arguments() -> Arguments {
    let matches = clap::Command::new("lyra")
        .bin_name("lyra")
        .version(env!("CARGO_PKG_VERSION"))
        .about("The reference compiler of the Lyra programming language")
        .args([
            Arg::new(argument::PATH)
                .required(true)
                .value_parser(ValueParser::path_buf())
                .help("The path to a source file"),
            Arg::new(option::OUTPUT)
                .long("output")
                .short('o')
                .value_name("PATH")
                .value_parser(ValueParser::path_buf())
                .help("Set the output path for the emitted IR"),
            Arg::new(option::EXECUTE)
                .long("execute")
                .short('e')
                .action(ArgAction::SetTrue)
                .help("Run the program in-process instead of emitting IR"),
            Arg::new(option::PRINT_AST)
                .long("print-ast")
                .action(ArgAction::SetTrue)
                .help("Print the syntax tree"),
            Arg::new(option::PRINT_SYMBOLS)
                .long("print-sp")
                .action(ArgAction::SetTrue)
                .help("Print the global symbols"),
            Arg::new(option::PRINT_IR)
                .long("print-ir")
                .action(ArgAction::SetTrue)
                .help("Print the emitted IR"),
            Arg::new(option::QUIET)
                .long("quiet")
                .short('q')
                .action(ArgAction::SetTrue)
                .help("Suppress status output from being printed to stdout"),
            Arg::new(option::COLOR)
                .long("color")
                .value_name("WHEN")
                .value_parser(["always", "never", "auto"])
                .default_value("auto")
                .help("Control when to use color"),
        ])
        .get_matches();

    Arguments {
        path: matches.get_one::<PathBuf>(argument::PATH).unwrap().clone(),
        output: matches
            .get_one::<PathBuf>(option::OUTPUT)
            .cloned()
            .unwrap_or_else(|| PathBuf::from("output.ll")),
        execute: matches.get_flag(option::EXECUTE),
        print_ast: matches.get_flag(option::PRINT_AST),
        print_symbols: matches.get_flag(option::PRINT_SYMBOLS),
        print_ir: matches.get_flag(option::PRINT_IR),
        quiet: matches.get_flag(option::QUIET),
        color: match matches.get_one::<String>(option::COLOR).unwrap().as_str() {
            "always" => ColorMode::Always,
            "never" => ColorMode::Never,
            _ => ColorMode::Auto,
        },
    }
}
