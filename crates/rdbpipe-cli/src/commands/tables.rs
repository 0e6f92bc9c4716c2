//! Table administration command
//!
//! Usage: rdbpipe tables <list|create NAME|drop NAME> --config <FILE>

use crate::settings::{self, ConfigArgs};
use clap::{Args, Subcommand};
use rdbpipe_core::{log_op_end, log_op_error, log_op_start, ConnectionFactory};
use rdbpipe_store::{SqliteConnection, SqliteConnector};
use std::time::Instant;

#[derive(Debug, Args)]
pub struct TablesArgs {
    #[command(subcommand)]
    pub command: TablesCommand,
}

#[derive(Debug, Subcommand)]
pub enum TablesCommand {
    /// List tables, one per line
    List(ConfigArgs),
    /// Create a document table
    Create(TableNameArgs),
    /// Drop a document table
    Drop(TableNameArgs),
}

#[derive(Debug, Args)]
pub struct TableNameArgs {
    /// Table name
    pub name: String,

    #[command(flatten)]
    pub config: ConfigArgs,
}

/// Execute tables command
pub fn execute(args: TablesArgs) -> Result<(), Box<dyn std::error::Error>> {
    match args.command {
        TablesCommand::List(config) => {
            let conn = connect(&config)?;
            for name in conn.list_tables()? {
                println!("{}", name);
            }
            Ok(())
        }
        TablesCommand::Create(args) => {
            let conn = connect(&args.config)?;
            run_admin("create_table", &args.name, || conn.create_table(&args.name))?;
            println!("Created table {}", args.name);
            Ok(())
        }
        TablesCommand::Drop(args) => {
            let conn = connect(&args.config)?;
            run_admin("drop_table", &args.name, || conn.drop_table(&args.name))?;
            println!("Dropped table {}", args.name);
            Ok(())
        }
    }
}

fn connect(config: &ConfigArgs) -> Result<SqliteConnection, Box<dyn std::error::Error>> {
    let loaded = settings::load(&config.config)?;
    let connection = settings::connection_settings(&loaded)?;
    Ok(SqliteConnector.connect(&connection)?)
}

fn run_admin<F>(op: &'static str, table: &str, action: F) -> rdbpipe_core::Result<()>
where
    F: FnOnce() -> rdbpipe_core::Result<()>,
{
    let start = Instant::now();
    log_op_start!(op, table = table);

    let result = action();
    let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
    match &result {
        Ok(()) => {
            log_op_end!(op, duration_ms = duration_ms, table = table);
        }
        Err(e) => {
            log_op_error!(op, e.clone(), duration_ms = duration_ms, table = table);
        }
    }
    result
}
