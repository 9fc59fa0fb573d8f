//! Loads a dictionary and prints its resolved structure.
//!
//! Usage:
//!   dictforge orders.xml
//!   dictforge --format yaml --no-aggregate --namespace fix orders.dict
//!   RUST_LOG=dictforge_dictionary=trace dictforge schema.xsd --json

use std::{io, path::PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use dictforge::dictionary::{DictionaryLoader, DictionaryStructure, FieldStructure, Format};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatArg {
    Xml,
    Json,
    Yaml,
    Xsd,
}

impl From<FormatArg> for Format {
    fn from(format: FormatArg) -> Format {
        match format {
            FormatArg::Xml => Format::Xml,
            FormatArg::Json => Format::Json,
            FormatArg::Yaml => Format::Yaml,
            FormatArg::Xsd => Format::Xsd,
        }
    }
}

/// Resolve a protocol dictionary and print its structure
#[derive(Debug, Parser)]
#[command(name = "dictforge", version)]
struct Args {
    /// Dictionary file (.xml, .json, .yaml, .yml or .xsd)
    path: PathBuf,

    /// Input format, picked by the file extension when omitted
    #[arg(long, short = 'f', value_enum)]
    format: Option<FormatArg>,

    /// Do not merge attributes, values and fields along references
    #[arg(long)]
    no_aggregate: bool,

    /// Namespace of the resolved structures
    #[arg(long, short = 'n')]
    namespace: Option<String>,

    /// Print the resolved dictionary as JSON
    #[arg(long)]
    json: bool,

    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(long, short = 'v')]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .init();
    debug!(?args, "starting");

    let mut loader = DictionaryLoader::new().with_aggregation(!args.no_aggregate);
    if let Some(namespace) = args.namespace {
        loader = loader.with_namespace(namespace);
    }

    let dictionary = match args.format {
        Some(format) => loader.load_format(&args.path, format.into()),
        None => loader.load(&args.path),
    }
    .with_context(|| format!("Failed to load dictionary {}", args.path.display()))?;

    if args.json {
        let json = serde_json::to_string_pretty(&dictionary)
            .context("Failed to serialize dictionary")?;
        println!("{json}");
    } else {
        print_tree(&dictionary);
    }

    Ok(())
}

fn print_tree(dictionary: &DictionaryStructure) {
    println!("{}", dictionary.namespace());
    if let Some(description) = dictionary.description() {
        println!("  {description}");
    }
    for attribute in dictionary.attributes().values() {
        println!("  @{} = {}", attribute.name(), attribute.value().unwrap_or(""));
    }

    println!("fields ({})", dictionary.fields().len());
    for field in dictionary.fields().values() {
        println!("  {}", describe(field));
    }

    println!("messages ({})", dictionary.messages().len());
    for message in dictionary.messages().values() {
        match message.reference_name() {
            Some(parent) => println!("  {} : {parent}", message.name()),
            None => println!("  {}", message.name()),
        }
        for field in message.fields().values() {
            println!("    {}", describe(field));
        }
    }
}

fn describe(field: &FieldStructure) -> String {
    let kind = match (field.message_name(), field.scalar_type()) {
        (Some(message), _) => format!("<{message}>"),
        (None, Some(scalar_type)) => scalar_type.to_string(),
        (None, None) => "?".to_owned(),
    };

    let mut flags = Vec::new();
    if field.is_required() {
        flags.push("required".to_owned());
    }
    if field.is_collection() {
        flags.push("collection".to_owned());
    }
    if field.is_enum() {
        flags.push(format!("{} values", field.values().len()));
    }
    if let Some(default_value) = field.default_value() {
        flags.push(format!("default {default_value:?}"));
    }

    if flags.is_empty() {
        format!("{} {kind}", field.name())
    } else {
        format!("{} {kind} [{}]", field.name(), flags.join(", "))
    }
}
