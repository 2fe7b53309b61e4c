//! Command line utilities.

use std::{
    io::{Read, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
pub use clap::Parser;
use clap::{Args, Subcommand};
use tracing::info;

use crate::{AnyDocument, Config, Document, Entry};

/// Command line usage description.
#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Subcommand.
    #[command(subcommand)]
    pub command: Command,

    /// Command line options.
    #[command(flatten)]
    pub opts: Opts,
}

/// List of commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check that a document is valid
    Check {
        /// Input file, or `-` for the standard input
        input: PathBuf,
    },

    /// Parse a document and write it back
    Format {
        /// Input file, or `-` for the standard input
        input: PathBuf,
    },

    /// Add categories to an entry
    Tag {
        /// Input file, or `-` for the standard input
        input: PathBuf,

        /// Tags separated by the configured delimiter
        tags: String,
    },

    /// Mark an entry as a draft
    Draft {
        /// Input file, or `-` for the standard input
        input: PathBuf,

        /// Publish the entry instead
        #[arg(long)]
        off: bool,
    },
}

/// Command line options.
#[derive(Debug, Args, Clone)]
pub struct Opts {
    /// Configuration file [default: "atom-tools.toml"]
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Base URI of the input document
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Print debug messages
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Run a command, writing its result to `output`.
pub fn run(command: &Command, opts: &Opts, output: &mut impl Write) -> Result<()> {
    let config = Config::from_opts(opts).context("loading configuration")?;

    match command {
        Command::Check { input } => check(&config, input, output),
        Command::Format { input } => format(&config, input, output),
        Command::Tag { input, tags } => tag(&config, input, tags, output),
        Command::Draft { input, off } => draft(&config, input, !off, output),
    }
}

/// Run the `check` command.
///
/// Invalid documents are reported, only unreadable ones are errors.
pub fn check(config: &Config, input: &Path, output: &mut impl Write) -> Result<()> {
    let document = read_document(config, input)?;

    match document.validate() {
        Ok(()) => writeln!(output, "{}: valid", document.kind())?,
        Err(error) => {
            info!(kind = document.kind(), %error, "invalid document");
            writeln!(output, "{}: {}", document.kind(), error)?;
        },
    }

    Ok(())
}

/// Run the `format` command.
pub fn format(config: &Config, input: &Path, output: &mut impl Write) -> Result<()> {
    let document = read_document(config, input)?;
    writeln!(output, "{}", document.to_xml(config.xml_declaration))?;
    Ok(())
}

/// Run the `tag` command.
pub fn tag(config: &Config, input: &Path, tags: &str, output: &mut impl Write) -> Result<()> {
    let mut entry = read_entry(config, input)?;
    entry.tag_with(tags, &config.default_tags_delimiter);
    writeln!(output, "{}", entry.to_xml(config.xml_declaration))?;
    Ok(())
}

/// Run the `draft` command.
pub fn draft(config: &Config, input: &Path, draft: bool, output: &mut impl Write) -> Result<()> {
    let mut entry = read_entry(config, input)?;
    entry.set_draft(draft);
    writeln!(output, "{}", entry.to_xml(config.xml_declaration))?;
    Ok(())
}

fn read_document(config: &Config, input: &Path) -> Result<AnyDocument> {
    let content = read_input(input)?;
    AnyDocument::parse(content, config.base_url.as_deref())
        .with_context(|| format!("parsing {}", input.display()))
}

fn read_entry(config: &Config, input: &Path) -> Result<Entry> {
    let content = read_input(input)?;
    Entry::parse(content, config.base_url.as_deref())
        .with_context(|| format!("parsing {}", input.display()))
}

fn read_input(input: &Path) -> Result<Vec<u8>> {
    if input == Path::new("-") {
        let mut content = Vec::new();
        std::io::stdin()
            .read_to_end(&mut content)
            .context("reading standard input")?;
        Ok(content)
    } else {
        std::fs::read(input).with_context(|| format!("reading {}", input.display()))
    }
}
