//! tplus CLI
//!
//! Usage:
//!   tplus [OPTIONS] [TEMPLATE]
//!
//! Options:
//!   -d, --data <FILE>       Data file (JSON or TOML)
//!   -t, --templates <DIR>   Directory for extended and included templates
//!   -c, --config <FILE>     Engine configuration (TOML format)
//!   -l, --lint              Report directive problems instead of rendering
//!   -g, --grammar           Show directive reference
//!   -h, --help              Print help

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tplus::{lint, DirectorySource, Engine, EngineConfig, Value};

#[derive(Parser)]
#[command(name = "tplus")]
#[command(about = "Render text templates with inheritance, includes and macros")]
struct Cli {
    /// Template file (reads from stdin if not provided)
    input: Option<PathBuf>,

    /// Data file bound to the template (JSON or TOML)
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Directory for extended and included templates
    #[arg(short, long)]
    templates: Option<PathBuf>,

    /// Engine configuration file (TOML format)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Report directive problems instead of rendering
    #[arg(short, long)]
    lint: bool,

    /// Show directive reference
    #[arg(short, long)]
    grammar: bool,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if cli.grammar {
        print_grammar();
        return;
    }

    // Load configuration
    let mut config = match &cli.config {
        Some(path) => match EngineConfig::from_file(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => EngineConfig::default(),
    };

    // Read input
    let (source, filename) = match &cli.input {
        Some(path) => match fs::read_to_string(path) {
            Ok(content) => (content, path.display().to_string()),
            Err(e) => {
                eprintln!("Error reading file '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => {
            let mut buffer = String::new();
            match io::stdin().read_to_string(&mut buffer) {
                Ok(_) => (buffer, "<stdin>".to_string()),
                Err(e) => {
                    eprintln!("Error reading from stdin: {}", e);
                    std::process::exit(1);
                }
            }
        }
    };

    if cli.lint {
        let warnings = lint::check(&source);
        for warning in &warnings {
            eprint!("{}", warning.format(&source, &filename));
        }
        if !warnings.is_empty() {
            std::process::exit(1);
        }
        return;
    }

    let data = match &cli.data {
        Some(path) => match Value::from_file(path) {
            Ok(v) => v,
            Err(e) => {
                eprintln!("Error loading data '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => Value::Null,
    };

    // Template directory: flag, then config, then the template's own directory
    let dir = cli
        .templates
        .clone()
        .or_else(|| config.templates.dir.clone())
        .or_else(|| {
            cli.input
                .as_ref()
                .and_then(|p| p.parent())
                .filter(|p| !p.as_os_str().is_empty())
                .map(PathBuf::from)
        })
        .unwrap_or_else(|| PathBuf::from("."));
    config.templates.dir = Some(dir);

    let templates = DirectorySource::from_config(&config.templates);
    let engine = Engine::with_source(templates).with_config(config);

    match engine.render_source(&source, data).await {
        Ok(output) => {
            print!("{}", output);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn print_grammar() {
    println!(
        r#"tplus directive reference
=========================

VALUES
  {{{{=key}}}}                 Insert a value
  {{{{%key}}}}                 Insert a value, HTML-escaped
  Keys are dotted paths: {{{{=user.address.city}}}}, {{{{=list.0}}}}, {{{{=list.length}}}}

BLOCKS
  {{{{key}}}}..{{{{/key}}}}          Render when key is truthy
  {{{{key}}}}..{{{{:key}}}}..{{{{/key}}}}  ..with an else branch
  {{{{!key}}}}..{{{{/key}}}}         Render when key is falsy
  {{{{@key}}}}..{{{{/key}}}}         Repeat per element (i, n, val) or entry (key, val)
  {{{{>key}}}}..{{{{/key}}}}         Render with key as the current context
  {{{{/}}}}                    Closes the innermost open directive

TEMPLATES
  {{{{^name}}}}                Extend a parent; must be the first directive
  {{{{#name}}}}..{{{{/name}}}}       Section a child may override
  {{{{+name}}}}                Include another template

MACROS
  {{{{name(a, 'b')}}}}         Call a macro with keys or quoted strings
  {{{{name(a)}}}}..{{{{/name}}}}     ..rendering the body if the macro fails

Falsy values: missing keys, null, false, 0, NaN, empty strings."#
    );
}
