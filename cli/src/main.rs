use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use tidewire::{decode_xml, encode_xml, json, BindError};
use tidewire_compiler::{compile_file, parser, tokenizer, verifier, CompilerError};

#[derive(Parser)]
#[command(name = "twire")]
#[command(about = "Compile Tidewire schemas and bind XML documents to them", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that a `.twl` schema file parses and verifies
    Check {
        /// Input `.twl` file
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Export the parsed form of a `.twl` schema as JSON (printed to stdout)
    Export {
        /// Input `.twl` file
        #[arg(short, long)]
        input: PathBuf,

        /// Output `.json` file (if omitted, prints to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Decode an XML document into JSON against a schema
    Decode {
        /// Schema `.twl` file
        #[arg(short, long)]
        schema: PathBuf,

        /// Message type the document's root conforms to
        #[arg(short, long)]
        message: String,

        /// Input XML file
        #[arg(short, long)]
        input: PathBuf,

        /// Output `.json` file (if omitted, prints to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Encode a JSON document into XML against a schema
    Encode {
        /// Schema `.twl` file
        #[arg(short, long)]
        schema: PathBuf,

        /// Message type to encode, also the root element name
        #[arg(short, long)]
        message: String,

        /// Input JSON file
        #[arg(short, long)]
        input: PathBuf,

        /// Output `.xml` file (if omitted, prints to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Compiler(#[from] CompilerError),

    #[error(transparent)]
    Bind(#[from] BindError),

    #[error(transparent)]
    Bridge(#[from] json::JsonError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("schema has no message named {0:?}")]
    UnknownMessage(String),
}

fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Check { input } => {
            let compiled = compile_file(input)?;
            println!(
                "OK: {} ({} message types, namespace {:?})",
                input.display(),
                compiled.names().len(),
                compiled.namespace()
            );
            Ok(())
        }

        Commands::Export { input, output } => {
            let text = fs::read_to_string(input)?;
            let file = parser::parse(&tokenizer::tokenize(&text)?)?;
            verifier::verify(&file)?;
            let rendered = serde_json::to_string_pretty(&file)?;
            emit(output, &rendered)
        }

        Commands::Decode {
            schema,
            message,
            input,
            output,
        } => {
            let compiled = compile_file(schema)?;
            let root = compiled
                .get(message)
                .ok_or_else(|| CliError::UnknownMessage(message.clone()))?;
            let text = fs::read_to_string(input)?;
            let instance = decode_xml(root, compiled.registry(), &text)?;
            let rendered = serde_json::to_string_pretty(&json::instance_to_json(&instance))?;
            emit(output, &rendered)
        }

        Commands::Encode {
            schema,
            message,
            input,
            output,
        } => {
            let compiled = compile_file(schema)?;
            let root = compiled
                .get(message)
                .ok_or_else(|| CliError::UnknownMessage(message.clone()))?;
            let text = fs::read_to_string(input)?;
            let value: serde_json::Value = serde_json::from_str(&text)?;
            let instance = json::instance_from_json(root, &value)?;
            let rendered = encode_xml(&instance, compiled.namespace(), message)?;
            emit(output, &rendered)
        }
    }
}

fn emit(output: &Option<PathBuf>, rendered: &str) -> Result<(), CliError> {
    if let Some(path) = output {
        fs::write(path, rendered)?;
        println!("Written to {}", path.display());
    } else {
        println!("{}", rendered);
    }
    Ok(())
}
