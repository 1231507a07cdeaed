mod report;

use popderive::{Language, Options, derive_text};
use report::ReportStyle;
use std::io::{self, IsTerminal, Read};

fn main() {
    let config = match parse_args() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };

    let text = match read_input(config.input.as_deref()) {
        Ok(text) => text,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    let derivations = match derive_text(&text, &config.options) {
        Ok(derivations) => derivations,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    };

    if config.tuples {
        derivations.iter().for_each(report::print_tuples);
        return;
    }

    let source = config.input.as_deref().unwrap_or("<stdin>");
    report::print_header(source, &config.options, derivations.len(), &config.style);
    for derivation in &derivations {
        report::print_derivation(derivation, &config.style);
    }
    println!();
}

struct CliConfig {
    input: Option<String>,
    options: Options,
    tuples: bool,
    style: ReportStyle,
}

fn parse_args() -> Result<CliConfig, String> {
    let mut input: Option<String> = None;
    let mut options = Options::default();
    let mut tuples = false;
    let mut features = false;
    let mut color = io::stdout().is_terminal();
    let mut args = std::env::args().skip(1);

    while let Some(arg) = args.next() {
        let (flag, inline) = match arg.split_once('=') {
            Some((flag, value)) if flag.starts_with("--") => (flag.to_string(), Some(value.to_string())),
            _ => (arg.clone(), None),
        };
        let mut value = |name: &str| -> Result<String, String> {
            match inline.clone() {
                Some(value) => Ok(value),
                None => args.next().ok_or_else(|| format!("error: {name} expects a value")),
            }
        };

        match flag.as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-V" | "--version" => {
                println!("popderive {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--color" => color = true,
            "--no-color" => color = false,
            "--tuples" => tuples = true,
            "--features" => features = true,
            "--language" => {
                let name = value("--language")?;
                options.language = Language::from_name(&name)
                    .ok_or_else(|| format!("error: unknown language '{name}' (expected english or japanese)"))?;
            }
            "--start" => options.start = Some(parse_number("--start", &value("--start")?)?),
            "--finish" => options.finish = Some(parse_number("--finish", &value("--finish")?)?),
            "-i" | "--input" => {
                let path = value("--input")?;
                set_input(&mut input, path)?;
            }
            _ if flag.starts_with('-') && flag != "-" => {
                return Err(format!("error: unknown option '{arg}'"));
            }
            _ => set_input(&mut input, arg)?,
        }
    }

    if let (Some(start), Some(finish)) = (options.start, options.finish) {
        if start > finish {
            return Err(format!("error: --start {start} is after --finish {finish}"));
        }
    }

    Ok(CliConfig { input, options, tuples, style: ReportStyle { color, features } })
}

fn set_input(input: &mut Option<String>, path: String) -> Result<(), String> {
    if input.is_some() {
        return Err("error: input provided multiple times".to_string());
    }
    *input = Some(path);
    Ok(())
}

fn parse_number(flag: &str, value: &str) -> Result<u32, String> {
    value.parse().map_err(|_| format!("error: invalid {flag} '{value}' (expected a sentence number)"))
}

fn read_input(path: Option<&str>) -> Result<String, String> {
    match path {
        Some(path) if path != "-" => {
            std::fs::read_to_string(path).map_err(|err| format!("error: failed to read '{path}': {err}"))
        }
        _ => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer).map_err(|err| format!("error: failed to read stdin: {err}"))?;
            Ok(buffer)
        }
    }
}

fn print_help() {
    println!("{}", help_text());
}

fn help_text() -> String {
    format!(
        "popderive {version}

Run Problems-of-Projection derivations from an example file.

Usage:
  popderive [OPTIONS] [FILE]
  popderive [OPTIONS] --input <FILE>

Example lines look like:
  1 John saw Mary ['v*', 'n', 'v', 'n']
A line containing Japanese/English switches the language.

Options:
  -i, --input <FILE>         Example file. '-' or no file reads stdin.
  --language <name>          Starting language: english (default) or japanese.
  --start <N>                First sentence number to run (inclusive).
  --finish <N>               Last sentence number to run (inclusive).
  --tuples                   Print raw ('tag', 'payload') records.
  --features                 Show leaf features in trees.
  --color                    Force ANSI color output.
  --no-color                 Disable ANSI color output.
  -h, --help                 Show this help message.
  -V, --version              Print version information.

Environment:
  POP_DEBUG_DERIVE           Print engine traces to stderr.

Exit codes:
  0  Success.
  1  Input could not be read or parsed.
  2  Invalid arguments.
",
        version = env!("CARGO_PKG_VERSION")
    )
}
