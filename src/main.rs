use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use templet::engine::{self, ValueResolver};

#[derive(Parser)]
#[command(name = "templet", version, about = "Refillable templates for Word documents")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan a document for named fields and write a template copy
    Create {
        /// Source document containing named content controls
        template: PathBuf,
        /// Path of the template copy to create
        output: PathBuf,
    },
    /// Fill a template's fields with values read from the console
    Update {
        /// Template document to fill in place
        document: PathBuf,
    },
    /// Print the parameter mapping stored in a document
    Show {
        /// Document to inspect
        document: PathBuf,
    },
}

/// Resolves parameter values by prompting on the console.
struct ConsoleResolver;

impl ValueResolver for ConsoleResolver {
    fn resolve(&mut self, name: &str) -> Option<String> {
        print!("  Set '{}': ", name);
        std::io::stdout().flush().ok()?;
        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line).ok()?;
        Some(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Create { template, output } => engine::create_from_template(&template, &output)?,
        Command::Update { document } => engine::process(&document, &mut ConsoleResolver)?,
        Command::Show { document } => engine::show_mapping(&document)?,
    }
    Ok(())
}
