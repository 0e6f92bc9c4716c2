//! rdbpipe CLI
//!
//! Command-line interface for inserting scraped items into document tables

use clap::{Parser, Subcommand};
use rdbpipe_core::logging_facility::{init, Profile};

mod commands;
mod settings;

#[derive(Debug, Parser)]
#[command(name = "rdbpipe")]
#[command(about = "rdbpipe - Insert scraped items into document tables", long_about = None)]
struct Cli {
    /// Emit JSON logs on stderr
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run JSON-lines items through the insert pipeline
    Ingest(commands::ingest::IngestArgs),
    /// Table administration
    Tables(commands::tables::TablesArgs),
}

fn main() {
    let cli = Cli::parse();

    init(if cli.log_json {
        Profile::Production
    } else {
        Profile::Development
    });

    let result = match cli.command {
        Commands::Ingest(args) => commands::ingest::execute(args),
        Commands::Tables(args) => commands::tables::execute(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
