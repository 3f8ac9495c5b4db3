use jpath_core::Query;
use serde_json::{Value, json};
use std::env;
use std::fs;
use std::io::{self, Read};
use std::process::ExitCode;
use tracing::debug;

const VERSION: &str = env!("CARGO_PKG_VERSION");

const USAGE: &str = "Usage: jpath [OPTIONS] <QUERY> [FILE]\n\nFor more information, try '--help'";

fn print_help() {
    println!(
        "jpath {VERSION} - JSONPath query tool (RFC 9535)

Usage: jpath [OPTIONS] <QUERY> [FILE]

Arguments:
  <QUERY>    JSONPath query (RFC 9535 format)
  [FILE]     Input JSON file (reads from stdin if omitted)

Options:
  -l, --located  Print each result with its normalized path
  -p, --pointer  Print the JSON Pointer of each result
  -c, --compact  Print compact JSON
  -h, --help     Show this help message
  -V, --version  Show version

Environment:
  RUST_LOG       Log filter for diagnostics on stderr (default: warn)"
    );
}

fn print_version() {
    println!("jpath {VERSION}");
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum OutputMode {
    #[default]
    Values,
    Located,
    Pointers,
}

#[derive(Debug, PartialEq, Eq)]
enum ParsedArgs {
    Help,
    Version,
    Query {
        query: String,
        file: Option<String>,
        mode: OutputMode,
        compact: bool,
    },
}

fn parse_args(args: Vec<String>) -> Result<ParsedArgs, String> {
    let mut positional = Vec::new();
    let mut mode = OutputMode::Values;
    let mut compact = false;

    for arg in args {
        match arg.as_str() {
            "-h" | "--help" => return Ok(ParsedArgs::Help),
            "-V" | "--version" => return Ok(ParsedArgs::Version),
            "-l" | "--located" => mode = OutputMode::Located,
            "-p" | "--pointer" => mode = OutputMode::Pointers,
            "-c" | "--compact" => compact = true,
            // "-" alone names stdin
            s if s.starts_with('-') && s != "-" => {
                return Err(format!("unknown option: {s}\n\n{USAGE}"));
            }
            _ => positional.push(arg),
        }
    }

    let mut positional = positional.into_iter();
    match (positional.next(), positional.next(), positional.next()) {
        (None, _, _) => Err(format!("missing required argument: <QUERY>\n\n{USAGE}")),
        (Some(query), file, None) => Ok(ParsedArgs::Query {
            query,
            file: file.filter(|f| f != "-"),
            mode,
            compact,
        }),
        _ => Err(format!("too many arguments\n\n{USAGE}")),
    }
}

fn read_input(file: Option<&str>) -> Result<String, String> {
    match file {
        Some(path) => fs::read_to_string(path)
            .map_err(|e| format!("error reading file '{path}': {e}")),
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|e| format!("error reading stdin: {e}"))?;
            Ok(buffer)
        }
    }
}

/// Build the JSON document printed for `query` against `json`
fn render(query: &Query, json: &Value, mode: OutputMode) -> Value {
    match mode {
        OutputMode::Values => Value::Array(query.select(json).into_iter().cloned().collect()),
        OutputMode::Located => query
            .select_located(json)
            .into_iter()
            .map(|node| json!({"path": node.path.to_string(), "value": node.value}))
            .collect(),
        OutputMode::Pointers => query
            .select_located(json)
            .into_iter()
            .map(|node| Value::String(node.path.to_pointer()))
            .collect(),
    }
}

fn init_logging() {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .init();
}

fn run() -> Result<(), String> {
    let args = parse_args(env::args().skip(1).collect())?;

    match args {
        ParsedArgs::Help => {
            print_help();
            Ok(())
        }
        ParsedArgs::Version => {
            print_version();
            Ok(())
        }
        ParsedArgs::Query {
            query,
            file,
            mode,
            compact,
        } => {
            let path = Query::parse(&query)
                .map_err(|e| format!("error parsing JSONPath query: {e}"))?;

            let input = read_input(file.as_deref())?;
            let json: Value = serde_json::from_str(&input)
                .map_err(|e| format!("error parsing JSON: {e}"))?;

            let results = render(&path, &json, mode);
            debug!(query = %path, ?mode, "rendered results");

            let output = if compact {
                serde_json::to_string(&results)
            } else {
                serde_json::to_string_pretty(&results)
            }
            .map_err(|e| format!("error serializing output: {e}"))?;

            println!("{output}");
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    init_logging();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("jpath: {e}");
            ExitCode::FAILURE
        }
    }
}
