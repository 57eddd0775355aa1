//! remarshal CLI - split text with named groups and bind it onto schema records

use std::collections::BTreeMap;
use std::io::{self, BufRead};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use regex::Regex;

use remarshal::{
    resolve_fields, split, unmarshal, FixSuggestion, Record, RecordSchema, RemarshalError, Worker,
    ANNOTATION,
};

#[derive(Parser)]
#[command(name = "remarshal")]
#[command(about = "Bind regex groups onto typed record fields")]
#[command(version)]
struct Cli {
    /// Log binding decisions (same as RUST_LOG=remarshal=debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the named groups of each input as JSON
    Split {
        /// Pattern with named groups, e.g. '(?P<host>[^:]+):(?P<port>\d+)'
        #[arg(short, long)]
        pattern: String,

        /// Inputs (one per argument); stdin lines when omitted
        text: Vec<String>,
    },

    /// Bind each input onto a record described by a schema file
    Bind {
        /// Path to the record schema (YAML)
        #[arg(short, long)]
        schema: String,

        /// Override the schema's pattern
        #[arg(short, long)]
        pattern: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        /// Inputs (one per argument); stdin lines when omitted
        text: Vec<String>,
    },

    /// Show how one input resolves against a schema
    Explain {
        /// Path to the record schema (YAML)
        #[arg(short, long)]
        schema: String,

        /// Override the schema's pattern
        #[arg(short, long)]
        pattern: Option<String>,

        text: String,
    },

    /// Validate a schema file (and its pattern, if any)
    Validate {
        /// Path to the record schema (YAML)
        schema: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

fn main() {
    let cli = Cli::parse();

    // Initialize tracing (stderr, so stdout stays parseable)
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(io::stderr)
        .init();

    let result = match cli.command {
        Commands::Split { pattern, text } => split_inputs(&pattern, text),
        Commands::Bind {
            schema,
            pattern,
            format,
            text,
        } => bind_inputs(&schema, pattern.as_deref(), format, text),
        Commands::Explain {
            schema,
            pattern,
            text,
        } => explain(&schema, pattern.as_deref(), &text),
        Commands::Validate { schema } => validate_schema(&schema),
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            if let Some(suggestion) = e
                .downcast_ref::<RemarshalError>()
                .and_then(|err| err.fix_suggestion())
            {
                eprintln!("  {} {}", "Fix:".yellow(), suggestion);
            }
            std::process::exit(1);
        }
    }
}

/// Arguments, or stdin lines when there are none
fn inputs(text: Vec<String>) -> anyhow::Result<Vec<String>> {
    if !text.is_empty() {
        return Ok(text);
    }
    io::stdin()
        .lock()
        .lines()
        .collect::<Result<Vec<_>, _>>()
        .context("reading stdin")
}

fn load_schema(path: &str, pattern: Option<&str>) -> anyhow::Result<(RecordSchema, Regex)> {
    let schema = RecordSchema::load(path).with_context(|| format!("loading schema '{}'", path))?;
    let re = schema.compile_pattern(pattern)?;
    Ok((schema, re))
}

/// Returns `Ok(false)` when at least one input failed
fn split_inputs(pattern: &str, text: Vec<String>) -> anyhow::Result<bool> {
    let re = Regex::new(pattern).map_err(RemarshalError::from)?;
    let mut ok = true;

    for line in inputs(text)? {
        match split(&line, &re) {
            Ok(values) => {
                let sorted: BTreeMap<_, _> = values.into_iter().collect();
                println!("{}", serde_json::to_string(&sorted)?);
            }
            Err(e) => {
                ok = false;
                eprintln!("{} {}: {}", "Error:".red().bold(), line, e);
            }
        }
    }
    Ok(ok)
}

fn bind_inputs(
    path: &str,
    pattern: Option<&str>,
    format: OutputFormat,
    text: Vec<String>,
) -> anyhow::Result<bool> {
    let (schema, re) = load_schema(path, pattern)?;
    let mut ok = true;

    for line in inputs(text)? {
        let mut record = schema.to_record();
        match unmarshal(&line, &mut record, &re) {
            Ok(()) => {}
            Err(RemarshalError::Bind(errors)) => {
                ok = false;
                for error in &errors {
                    eprintln!("{} {}", "Warning:".yellow().bold(), error);
                }
            }
            Err(e) => {
                // Fatal for this input: nothing was bound, skip its output
                ok = false;
                eprintln!("{} {}: {}", "Error:".red().bold(), line, e);
                if let Some(suggestion) = e.fix_suggestion() {
                    eprintln!("  {} {}", "Fix:".yellow(), suggestion);
                }
                continue;
            }
        }

        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string(&record.to_json())?),
            OutputFormat::Text => {
                let pairs: Vec<String> = record
                    .iter()
                    .map(|(name, value)| match value {
                        Some(v) => format!("{}={}", name, v),
                        None => format!("{}=", name),
                    })
                    .collect();
                println!("{}", pairs.join(" "));
            }
        }
    }
    Ok(ok)
}

fn explain(path: &str, pattern: Option<&str>, text: &str) -> anyhow::Result<bool> {
    let (schema, re) = load_schema(path, pattern)?;
    let mut record = schema.to_record();

    let worker = Worker::new(text, &record, &re)?;
    print!("{}", worker);

    match worker.apply(&mut record) {
        Ok(()) => {
            println!("\n{} {}", "✓".green(), record.to_json());
            Ok(true)
        }
        Err(errors) => {
            println!("\n* Errors:");
            for error in &errors {
                println!("\t{}", error);
            }
            Ok(false)
        }
    }
}

fn validate_schema(path: &str) -> anyhow::Result<bool> {
    let schema = RecordSchema::load(path).with_context(|| format!("loading schema '{}'", path))?;
    let record = schema.to_record();
    let fields = resolve_fields(&record.fields())?;

    println!("{} Schema '{}' is valid", "✓".green(), path);
    println!("  Fields: {} ({} bindable)", schema.fields.len(), fields.len());

    let Some(pattern) = schema.pattern.as_deref() else {
        println!("  Pattern: (none, pass --pattern when binding)");
        return Ok(true);
    };

    let re = Regex::new(pattern).map_err(RemarshalError::from)?;
    let groups: Vec<&str> = re.capture_names().flatten().collect();
    println!("  Pattern groups: {}", groups.join(", "));

    // Annotated keys the pattern can never produce fail on every input
    let mut ok = true;
    for field in fields.iter().filter(|f| f.key_explicit) {
        if !groups.contains(&field.key.as_str()) {
            ok = false;
            eprintln!(
                "{} field '{}' has {} '{}' but the pattern has no such group",
                "Warning:".yellow().bold(),
                field.name,
                ANNOTATION,
                field.key
            );
        }
    }
    Ok(ok)
}
