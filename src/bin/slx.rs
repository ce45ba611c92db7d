//! Command-line interface for slx
//!
//! Usage:
//!   slx parse `<path>` [--format `<format>`]          - Parse a descriptor and print its AST
//!   slx build `<path>` --target `<name>` [-o `<path>`]  - Emit the Makefile fragment for a target
//!   slx trim `<path>` [--features `<a,b,...>`]        - Run the feature-flag preprocessor

use clap::{Arg, Command};
use std::collections::HashSet;
use std::path::PathBuf;
use std::process::ExitCode;

use slx::analysis;
use slx::diagnostics::Diagnostic;
use slx::recipe;
use slx::trim;

fn main() -> ExitCode {
    let matches = Command::new("slx")
        .version(env!("CARGO_PKG_VERSION"))
        .about("A tool for compiling slx build descriptors")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("parse")
                .about("Parse a descriptor and print its AST")
                .arg(
                    Arg::new("path")
                        .help("Path to the descriptor file")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("format")
                        .long("format")
                        .short('f')
                        .help("Output format ('text' or 'json')")
                        .default_value("text"),
                ),
        )
        .subcommand(
            Command::new("build")
                .about("Emit the Makefile fragment for a declared target")
                .arg(
                    Arg::new("path")
                        .help("Path to the descriptor file")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("target")
                        .long("target")
                        .short('t')
                        .help("Name of the declared target to emit")
                        .required(true),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .help("Write the fragment to this file instead of stdout"),
                ),
        )
        .subcommand(
            Command::new("trim")
                .about("Trim rendered text down to the enabled features")
                .arg(
                    Arg::new("path")
                        .help("Path to the text file to trim")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("features")
                        .long("features")
                        .help("Comma-separated feature names to enable")
                        .default_value(""),
                ),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("parse", sub)) => {
            let path = sub.get_one::<String>("path").expect("path is required");
            let format = sub.get_one::<String>("format").expect("format has a default");
            handle_parse_command(path, format)
        }
        Some(("build", sub)) => {
            let path = sub.get_one::<String>("path").expect("path is required");
            let target = sub.get_one::<String>("target").expect("target is required");
            let output = sub.get_one::<String>("output");
            handle_build_command(path, target, output)
        }
        Some(("trim", sub)) => {
            let path = sub.get_one::<String>("path").expect("path is required");
            let features = sub.get_one::<String>("features").expect("features has a default");
            handle_trim_command(path, features)
        }
        _ => unreachable!(),
    }
}

fn read_source(path: &str) -> Result<String, ExitCode> {
    std::fs::read_to_string(PathBuf::from(path)).map_err(|err| {
        eprintln!("Error: cannot read '{}': {}", path, err);
        ExitCode::from(1)
    })
}

fn report(diag: &Diagnostic, source: &str) -> ExitCode {
    eprint!("{}", diag.render(source));
    ExitCode::from(2)
}

fn handle_parse_command(path: &str, format: &str) -> ExitCode {
    let source = match read_source(path) {
        Ok(source) => source,
        Err(code) => return code,
    };
    let root = match slx::parse(&source) {
        Ok(root) => root,
        Err(diag) => return report(&diag, &source),
    };
    match format {
        "text" => println!("{}", root.data),
        "json" => match serde_json::to_string_pretty(&root) {
            Ok(json) => println!("{}", json),
            Err(err) => {
                eprintln!("Error: cannot serialize the AST: {}", err);
                return ExitCode::from(1);
            }
        },
        other => {
            eprintln!("Error: unknown format '{}', expected 'text' or 'json'", other);
            return ExitCode::from(1);
        }
    }
    ExitCode::SUCCESS
}

fn handle_build_command(path: &str, target: &str, output: Option<&String>) -> ExitCode {
    let source = match read_source(path) {
        Ok(source) => source,
        Err(code) => return code,
    };
    let plans = match slx::parse(&source).and_then(|root| analysis::analyze(&root)) {
        Ok(plans) => plans,
        Err(diag) => return report(&diag, &source),
    };
    let plan = match plans.iter().find(|p| p.name == *target) {
        Some(plan) => plan,
        None => {
            eprintln!("Error: '{}' is not a declared target of '{}'", target, path);
            return ExitCode::from(1);
        }
    };
    let fragment = recipe::emit_makefile(plan);
    match output {
        None => print!("{}", fragment),
        Some(dest) => {
            if let Err(err) = std::fs::write(dest, fragment) {
                eprintln!("Error: cannot write '{}': {}", dest, err);
                return ExitCode::from(1);
            }
        }
    }
    ExitCode::SUCCESS
}

fn handle_trim_command(path: &str, features: &str) -> ExitCode {
    let source = match read_source(path) {
        Ok(source) => source,
        Err(code) => return code,
    };
    let enabled: HashSet<String> = features
        .split(',')
        .filter(|f| !f.is_empty())
        .map(|f| f.trim().to_string())
        .collect();
    match trim::trim(&source, &enabled) {
        Ok(trimmed) => {
            print!("{}", trimmed);
            ExitCode::SUCCESS
        }
        Err(diag) => report(&diag, &source),
    }
}
