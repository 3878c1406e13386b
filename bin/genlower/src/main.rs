//! Demo CLI: drives [`genlower::generator::CodeGenerator`] from a tiny line-oriented recording
//! script and prints the rendered function body.
//!
//! Not a parser for any real source language — this only exists to exercise the library end to
//! end outside of its unit/integration tests, the same way a demo binary crate sits alongside a
//! workspace's `lib`.
mod script;

use std::fmt;
use std::fs;
use std::process::ExitCode;

use clap::{value_parser, Arg, Command};
use genlower::output::FunctionKind;
use genlower::render::render_function;
use genlower::text_range::TextRange;

/// The opaque pass-through node type this CLI uses for source fragments: just literal text.
#[derive(Debug, Clone)]
pub struct Frag(pub String);

impl fmt::Display for Frag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn command() -> Command {
    Command::new("genlower")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Lowers a recording script into a generator/async switch state machine")
        .arg(
            Arg::new("script")
                .help("Path to a recording script")
                .required(true)
                .value_parser(value_parser!(std::path::PathBuf)),
        )
        .arg(
            Arg::new("async")
                .long("async")
                .help("Build an async function instead of a generator")
                .action(clap::ArgAction::SetTrue),
        )
}

fn main() -> ExitCode {
    env_logger::init();
    let matches = command().get_matches();
    let path = matches.get_one::<std::path::PathBuf>("script").unwrap();
    let is_async = matches.get_flag("async");

    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            eprintln!("could not read {}: {}", path.display(), err);
            return ExitCode::FAILURE;
        }
    };

    let mut generator = genlower::create_code_generator::<Frag>();
    if let Err(err) = script::run(&text, &mut generator) {
        eprintln!("script error: {}", err);
        return ExitCode::FAILURE;
    }

    let result = if is_async {
        generator.build_async_function(
            FunctionKind::Expression,
            None,
            "Promise".to_string(),
            TextRange::default(),
        )
    } else {
        generator.build_generator_function(FunctionKind::Expression, None, TextRange::default())
    };

    match result.and_then(|function| render_function(&function)) {
        Ok(text) => {
            print!("{}", text);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{:?}", err);
            ExitCode::FAILURE
        }
    }
}
