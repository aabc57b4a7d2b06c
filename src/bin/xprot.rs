//! Command-line interface for xprot
//! This binary inspects XProtocol exports and pulls individual parameters out of them.
//!
//! Usage:
//!   xprot inspect `<path>` [--format `<format>`] [--config `<file>`]  - Render a file in one of the processing formats
//!   xprot find `<path>` `<name>` [--all]                           - Print params with the given name
//!   xprot get `<path>` `<dotted.path>` [--tag `<tag>`]              - Print the values (or one attribute) of a param
//!   xprot list-formats                                           - List all available processing formats
//!
//! Logging goes to stderr and is controlled by `RUST_LOG` (default `warn`).

use clap::{Arg, ArgAction, ArgMatches, Command};
use std::path::Path;
use std::process;
use tracing_subscriber::EnvFilter;

use xprot::xprot::config::{Loader, XprotConfig};
use xprot::xprot::parsing::parse_with;
use xprot::xprot::processor::{process_file, ProcessingError, ProcessingSpec};
use xprot::{tokenize, Document, Param, Tag};

fn main() {
    init_tracing();

    let matches = Command::new("xprot")
        .version(env!("CARGO_PKG_VERSION"))
        .about("A tool for inspecting XProtocol scanner protocol files")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .help("TOML file layered over the built-in defaults"),
        )
        .subcommand(
            Command::new("inspect")
                .about("Render a file in one of the processing formats")
                .arg(
                    Arg::new("path")
                        .help("Path to the XProtocol file")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("format")
                        .long("format")
                        .short('f')
                        .help("Output format (e.g., 'ast-json', 'ast-treeviz'); defaults to output.format"),
                ),
        )
        .subcommand(
            Command::new("find")
                .about("Print params with the given name")
                .arg(
                    Arg::new("path")
                        .help("Path to the XProtocol file")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("name")
                        .help("Param name, e.g. 'lBaseResolution'")
                        .required(true)
                        .index(2),
                )
                .arg(
                    Arg::new("all")
                        .long("all")
                        .short('a')
                        .action(ArgAction::SetTrue)
                        .help("Print every match instead of the first"),
                ),
        )
        .subcommand(
            Command::new("get")
                .about("Print the values of a param, or one of its attributes")
                .arg(
                    Arg::new("path")
                        .help("Path to the XProtocol file")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("param")
                        .help("Dotted param path, e.g. 'sKSpace.lBaseResolution'")
                        .required(true)
                        .index(2),
                )
                .arg(
                    Arg::new("tag")
                        .long("tag")
                        .short('t')
                        .help("Print this attribute instead of the values (e.g. 'Default', 'Unit')"),
                ),
        )
        .subcommand(Command::new("list-formats").about("List available processing formats"))
        .get_matches();

    let config = load_config(&matches);

    let result = match matches.subcommand() {
        Some(("inspect", inspect_matches)) => handle_inspect_command(inspect_matches, &config),
        Some(("find", find_matches)) => handle_find_command(find_matches, &config),
        Some(("get", get_matches)) => handle_get_command(get_matches, &config),
        Some(("list-formats", _)) => {
            handle_list_formats_command(&config);
            Ok(())
        }
        _ => unreachable!(),
    };

    if let Err(message) = result {
        eprintln!("Error: {}", message);
        process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(matches: &ArgMatches) -> XprotConfig {
    let mut loader = Loader::new();
    if let Some(path) = matches.get_one::<String>("config") {
        loader = loader.with_file(path);
    }
    loader.build().unwrap_or_else(|e| {
        eprintln!("Error loading config: {}", e);
        process::exit(1);
    })
}

/// Handle the inspect command
fn handle_inspect_command(matches: &ArgMatches, config: &XprotConfig) -> Result<(), String> {
    let path = required(matches, "path")?;
    let format = matches
        .get_one::<String>("format")
        .unwrap_or(&config.output.format);

    let spec = ProcessingSpec::from_string(format).map_err(|e| e.to_string())?;
    let output = process_file(path, &spec, config).map_err(|e| e.to_string())?;
    print!("{}", output);
    Ok(())
}

/// Handle the find command
fn handle_find_command(matches: &ArgMatches, config: &XprotConfig) -> Result<(), String> {
    let doc = load_document(required(matches, "path")?, config)?;
    let name = required(matches, "name")?;

    let found = if matches.get_flag("all") {
        doc.find_params(name)
    } else {
        doc.find_param(name).into_iter().collect()
    };

    if found.is_empty() {
        return Err(format!("no param named '{}'", name));
    }
    for param in found {
        println!("{}", describe_param(param));
    }
    Ok(())
}

/// Handle the get command
fn handle_get_command(matches: &ArgMatches, config: &XprotConfig) -> Result<(), String> {
    let doc = load_document(required(matches, "path")?, config)?;
    let path = required(matches, "param")?;
    let param = doc
        .find_path(path)
        .ok_or_else(|| format!("no param at path '{}'", path))?;

    match matches.get_one::<String>("tag") {
        Some(keyword) => {
            let tag = Tag::from_keyword(keyword).ok_or_else(|| {
                let known: Vec<&str> = Tag::ALL.iter().map(Tag::keyword).collect();
                format!("unknown tag '{}' (expected one of: {})", keyword, known.join(", "))
            })?;
            let value = param
                .attribute(tag)
                .ok_or_else(|| format!("param '{}' has no <{}> attribute", path, tag))?;
            println!("{}", value);
        }
        None => {
            for value in param.value_strings() {
                println!("{}", value);
            }
        }
    }
    Ok(())
}

/// Handle the list-formats command
fn handle_list_formats_command(config: &XprotConfig) {
    println!("Available processing formats:\n");
    for spec in ProcessingSpec::available_specs() {
        let spec = spec.to_string();
        if spec == config.output.format {
            println!("  {} (default)", spec);
        } else {
            println!("  {}", spec);
        }
    }
}

fn required<'a>(matches: &'a ArgMatches, id: &str) -> Result<&'a String, String> {
    matches
        .get_one::<String>(id)
        .ok_or_else(|| format!("missing argument '{}'", id))
}

fn load_document(path: &str, config: &XprotConfig) -> Result<Document, String> {
    let source = std::fs::read_to_string(Path::new(path)).map_err(|source| {
        ProcessingError::Io {
            path: path.into(),
            source,
        }
        .to_string()
    })?;
    parse_with(&tokenize(&source), &config.parser).map_err(|e| format!("{}: {}", path, e))
}

fn describe_param(param: &Param) -> String {
    let mut line = format!("{}:{} {}", param.line, param.kind, param.name);
    let values = param.value_strings();
    if !values.is_empty() {
        line.push_str(&format!(" = {}", values.join(" ")));
    }
    line
}
