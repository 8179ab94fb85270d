//! pep10 CLI entry point.

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::Colorize;

use pep10_assembler::assemble;

/// Assemble Pep/10 source into object code and a program listing.
#[derive(Parser)]
#[command(name = "pep10")]
#[command(about = "Assembler for the Pep/10 educational machine", long_about = None)]
struct Cli {
    /// Source file to assemble
    input_file: PathBuf,

    /// Write the raw object bytes to this path
    #[arg(short, long)]
    object: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        eprintln!("{} {:#}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let source = fs::read_to_string(&cli.input_file)
        .with_context(|| format!("failed to read {}", cli.input_file.display()))?;

    match assemble(&source) {
        Ok(assembly) => {
            for line in &assembly.listing {
                println!("{}", line);
            }
            if let Some(path) = &cli.object {
                fs::write(path, &assembly.object_code)
                    .with_context(|| format!("failed to write {}", path.display()))?;
            }
            Ok(())
        }
        Err(error) => {
            // The listing is produced even for failed units; diagnostics go
            // to the error stream.
            for line in error.listing() {
                println!("{}", line);
            }
            for message in error.messages() {
                eprintln!("{}", message.red());
            }
            bail!("{}", error);
        }
    }
}
