use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use colored::*;

use tei_rdfa::{extract, OutputFormat, RdfSerializer};

#[derive(Parser)]
#[command(
    name = "tei_rdfa",
    about = "Extract RDFa triples from TEI-XML documents into an RDF graph",
    long_about = None,
    version
)]
struct Cli {
    /// TEI-XML source: a local path or URL ending in .xml or .tei
    source: String,

    /// XPath expression selecting the elements to scan (default: document root)
    #[arg(short, long)]
    xpath: Option<String>,

    /// Write the serialized graph to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Serialization format for the extracted graph
    #[arg(short, long, value_enum, default_value = "turtle")]
    format: OutputFormatArg,

    /// Suppress progress output
    #[arg(short, long)]
    quiet: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(clap::ValueEnum, Clone)]
enum OutputFormatArg {
    Turtle,
    NTriples,
    Json,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(format: OutputFormatArg) -> Self {
        match format {
            OutputFormatArg::Turtle => Self::Turtle,
            OutputFormatArg::NTriples => Self::NTriples,
            OutputFormatArg::Json => Self::Json,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.debug {
        tracing::Level::DEBUG
    } else if cli.quiet {
        tracing::Level::WARN
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    if !cli.quiet {
        println!("{}", "Starting RDFa extraction...".bright_blue().bold());
        println!(" Source: {}", cli.source.bright_green());
        if let Some(xpath) = &cli.xpath {
            println!(" XPath: {}", xpath);
        }
    }

    let graph = extract(&cli.source, cli.xpath.as_deref(), !cli.quiet)?;

    if !cli.quiet {
        println!(" Extracted {} triple(s)", graph.len());
    }

    let serialized = RdfSerializer::new().serialize(&graph, cli.format.into())?;

    match cli.output {
        Some(path) => {
            fs::write(&path, serialized)?;
            if !cli.quiet {
                println!(" Graph written to {}", path.display().to_string().bright_green());
            }
        }
        None => print!("{}", serialized),
    }

    Ok(())
}
