//! Command-line interface for asmlex
//! This binary tokenizes compiler / assembler output and prints the token stream, mostly for
//! checking language definitions by eye.
//!
//! Usage:
//!   asmlex tokenize `<path|->` [--language `<name>`] [--definition `<file>`] [--format `<format>`]
//!   asmlex languages                                   - List built-in languages
//!   asmlex check `<definition>`                          - Validate a language definition file

use anyhow::{bail, Context, Result};
use asmlex::formats::FormatRegistry;
use asmlex::loader::DefinitionLoader;
use asmlex::{Document, LanguageRegistry, Tokenizer};
use clap::{Arg, ArgAction, ArgMatches, Command};
use log::LevelFilter;
use std::io::{Read, Write};

fn main() -> Result<()> {
    let matches = Command::new("asmlex")
        .version(env!("CARGO_PKG_VERSION"))
        .about("A rule-table driven tokenizer for compiler and assembler output")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Increase log output (repeatable)")
                .action(ArgAction::Count)
                .global(true),
        )
        .subcommand(
            Command::new("tokenize")
                .about("Tokenize a file and print its tokens")
                .arg(
                    Arg::new("path")
                        .help("Path to the file to tokenize, or '-' for stdin")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("language")
                        .long("language")
                        .short('l')
                        .help("Built-in language to use")
                        .default_value("asm"),
                )
                .arg(
                    Arg::new("definition")
                        .long("definition")
                        .short('d')
                        .help("Language definition file (.yaml, .yml, .json) to use instead")
                        .conflicts_with("language"),
                )
                .arg(
                    Arg::new("format")
                        .long("format")
                        .short('f')
                        .help("Output format (e.g., 'tagged', 'json')")
                        .default_value("tagged"),
                ),
        )
        .subcommand(Command::new("languages").about("List built-in languages"))
        .subcommand(
            Command::new("check")
                .about("Validate a language definition file")
                .arg(
                    Arg::new("definition")
                        .help("Path to the definition file")
                        .required(true)
                        .index(1),
                ),
        )
        .get_matches();

    init_logging(matches.get_count("verbose"));

    match matches.subcommand() {
        Some(("tokenize", tokenize_matches)) => handle_tokenize_command(tokenize_matches),
        Some(("languages", _)) => handle_languages_command(),
        Some(("check", check_matches)) => {
            let path = required(check_matches, "definition")?;
            handle_check_command(path)
        }
        _ => unreachable!(),
    }
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .format(|buf, record| writeln!(buf, "{}: {}", record.level(), record.args()))
        .filter_level(level)
        .parse_default_env()
        .target(env_logger::fmt::Target::Stderr)
        .init();
}

fn required<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a str> {
    matches
        .get_one::<String>(name)
        .map(String::as_str)
        .with_context(|| format!("missing argument '{name}'"))
}

/// Handle the tokenize command
fn handle_tokenize_command(matches: &ArgMatches) -> Result<()> {
    let path = required(matches, "path")?;
    let format = required(matches, "format")?;

    let formats = FormatRegistry::with_defaults();
    if !formats.has(format) {
        bail!(
            "unknown format '{format}' (available: {})",
            formats.list_formats().join(", ")
        );
    }

    let tokenizer = match matches.get_one::<String>("definition") {
        Some(definition) => DefinitionLoader::from_path(definition)
            .and_then(|loader| loader.tokenizer())
            .with_context(|| format!("cannot use definition {definition}"))?,
        None => builtin_tokenizer(required(matches, "language")?)?,
    };

    let source = read_source(path)?;
    let document = Document::from_text(&source);
    let tokens = tokenizer.tokenize_document(&document);
    let output = formats.serialize(format, &document, &tokens, tokenizer.table().language())?;
    print!("{output}");
    Ok(())
}

fn builtin_tokenizer(language: &str) -> Result<Tokenizer> {
    let registry = LanguageRegistry::with_defaults()?;
    match registry.tokenizer(language) {
        Some(tokenizer) => Ok(tokenizer),
        None => bail!(
            "unknown language '{language}' (available: {})",
            registry.list_languages().join(", ")
        ),
    }
}

fn read_source(path: &str) -> Result<String> {
    if path == "-" {
        let mut source = String::new();
        std::io::stdin()
            .read_to_string(&mut source)
            .context("cannot read stdin")?;
        Ok(source)
    } else {
        std::fs::read_to_string(path).with_context(|| format!("cannot read {path}"))
    }
}

/// Handle the languages command
fn handle_languages_command() -> Result<()> {
    let registry = LanguageRegistry::with_defaults()?;
    println!("Available languages:\n");
    for name in registry.list_languages() {
        if let Some(table) = registry.get(&name) {
            println!("  {name}");
            println!(
                "    {} modes, base mode '{}'",
                table.modes().len(),
                table.mode_name(table.base_mode())
            );
        }
    }
    Ok(())
}

/// Handle the check command
fn handle_check_command(path: &str) -> Result<()> {
    let table = DefinitionLoader::from_path(path)
        .and_then(|loader| loader.table())
        .with_context(|| format!("{path} is not a valid language definition"))?;
    println!(
        "{path}: ok ('{}', {} modes, {} rules)",
        table.language(),
        table.modes().len(),
        table.modes().iter().map(|m| m.rules().len()).sum::<usize>()
    );
    Ok(())
}
