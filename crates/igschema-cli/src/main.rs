//! # igschema
//!
//! Command-line front end for `igschema-models`: reads a captured API
//! payload (file or stdin), adapts it as the selected entity and prints the
//! storage document. A top-level JSON array is treated as a batch.

mod config;

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use igschema_models::adapter::adapt_batch;
use igschema_models::{
    Comment, Document, DocumentMode, Highlight, Location, Media, Post, Story, User, ValidationError,
};

use crate::config::CliConfig;

#[derive(Parser)]
#[command(name = "igschema")]
#[command(about = "Normalize captured social-media API payloads into storage documents")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Abort on the first invalid item instead of skipping it.
    #[arg(long, global = true)]
    strict: bool,

    /// Keep absent fields as explicit nulls.
    #[arg(long, global = true)]
    full: bool,

    /// Print single-line JSON.
    #[arg(long, global = true)]
    compact: bool,
}

#[derive(Args)]
struct Input {
    /// JSON payload to read; stdin when omitted or `-`.
    path: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    User(Input),
    Post(Input),
    Comment {
        #[command(flatten)]
        input: Input,
        /// Shortcode of the post the comments belong to.
        #[arg(long)]
        post_code: String,
    },
    Story {
        #[command(flatten)]
        input: Input,
        /// JSON array of story items; defaults to the payload's `items`.
        #[arg(long)]
        items: Option<PathBuf>,
    },
    Highlight {
        #[command(flatten)]
        input: Input,
        /// JSON array of story items; defaults to the payload's `items`.
        #[arg(long)]
        items: Option<PathBuf>,
    },
    Location(Input),
    Media(Input),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,igschema=debug")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = CliConfig::from_env();
    config.strict |= cli.strict;
    config.sparse &= !cli.full;
    config.pretty &= !cli.compact;
    debug!(?config, "Loaded configuration");

    let output = run(cli.command, &config)?;
    let rendered = if config.pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };
    println!("{rendered}");
    Ok(())
}

fn run(command: Command, config: &CliConfig) -> Result<Value> {
    let batch = config.batch_mode();

    match command {
        Command::User(input) => {
            convert(&read_json(input.path.as_deref())?, config, User::from_api_response)
        }
        Command::Post(input) => {
            convert(&read_json(input.path.as_deref())?, config, Post::from_api_response)
        }
        Command::Comment { input, post_code } => {
            convert(&read_json(input.path.as_deref())?, config, |v| {
                Comment::from_api_response(v, &post_code)
            })
        }
        Command::Story { input, items } => {
            let explicit = read_items(items.as_deref())?;
            convert(&read_json(input.path.as_deref())?, config, |v| {
                Story::from_api_response(v, items_for(v, explicit.as_deref()), batch)
            })
        }
        Command::Highlight { input, items } => {
            let explicit = read_items(items.as_deref())?;
            convert(&read_json(input.path.as_deref())?, config, |v| {
                Highlight::from_api_response(v, items_for(v, explicit.as_deref()), batch)
            })
        }
        Command::Location(input) => {
            convert(&read_json(input.path.as_deref())?, config, Location::from_api_response)
        }
        Command::Media(input) => {
            convert(&read_json(input.path.as_deref())?, config, Media::from_api_response)
        }
    }
}

/// Adapt one payload, or every element of an array, and render the
/// storage documents.
fn convert<T: Document>(
    payload: &Value,
    config: &CliConfig,
    adapt: impl Fn(&Value) -> Result<T, ValidationError>,
) -> Result<Value> {
    let mode = config.document_mode();
    match payload {
        Value::Array(items) => {
            let entities = adapt_batch(T::KIND, items, config.batch_mode(), adapt)?;
            info!(
                kind = T::KIND,
                total = items.len(),
                kept = entities.len(),
                "Adapted batch"
            );
            let docs = entities
                .iter()
                .map(|entity| render(entity, mode))
                .collect::<Result<Vec<_>>>()?;
            Ok(Value::Array(docs))
        }
        single => render(&adapt(single)?, mode),
    }
}

fn render<T: Document>(entity: &T, mode: DocumentMode) -> Result<Value> {
    let doc = entity
        .to_document(mode)
        .with_context(|| format!("Failed to serialize {}", T::KIND))?;
    Ok(Value::Object(doc))
}

fn read_json(path: Option<&Path>) -> Result<Value> {
    let raw = match path {
        None => read_stdin()?,
        Some(p) if p.as_os_str() == "-" => read_stdin()?,
        Some(p) => fs::read_to_string(p)
            .with_context(|| format!("Failed to read '{}'", p.display()))?,
    };
    serde_json::from_str(&raw).context("Input is not valid JSON")
}

fn read_stdin() -> Result<String> {
    let mut raw = String::new();
    io::stdin()
        .read_to_string(&mut raw)
        .context("Failed to read stdin")?;
    Ok(raw)
}

fn read_items(path: Option<&Path>) -> Result<Option<Vec<Value>>> {
    let Some(path) = path else {
        return Ok(None);
    };
    match read_json(Some(path))? {
        Value::Array(items) => Ok(Some(items)),
        _ => bail!("'{}' must contain a JSON array of story items", path.display()),
    }
}

/// Explicit items win; otherwise the container's own `items` array, if any.
fn items_for<'a>(payload: &'a Value, explicit: Option<&'a [Value]>) -> &'a [Value] {
    explicit
        .or_else(|| payload.get("items").and_then(Value::as_array).map(Vec::as_slice))
        .unwrap_or_default()
}
