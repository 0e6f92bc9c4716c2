//! Ingest command
//!
//! Usage: rdbpipe ingest --config <FILE> [--input <JSONL>] [--source <NAME>] [--fail-fast]
//!
//! Every input line is one scraped value: objects become items, anything
//! else passes through. Returned values are echoed on stdout as JSON lines.

use crate::settings::{self, ConfigArgs};
use clap::Args;
use rdbpipe_core::{
    log_op_end, log_op_error, log_op_start, CrawlContext, InsertPipeline, Item, RdbError,
    RdbErrorKind, Scraped,
};
use rdbpipe_store::SqliteConnector;
use serde_json::Value;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Debug, Args)]
pub struct IngestArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// JSON-lines input file (stdin when omitted)
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Name of the producing stage, attached to log events
    #[arg(long, default_value = "rdbpipe")]
    pub source: String,

    /// Item kind assigned to object lines
    #[arg(long, default_value = "item")]
    pub kind: String,

    /// Abort on the first item that fails instead of dropping it
    #[arg(long)]
    pub fail_fast: bool,
}

#[derive(Debug, Default)]
struct IngestStats {
    lines: u64,
    emitted: u64,
    failed: u64,
}

/// Execute ingest command
pub fn execute(args: IngestArgs) -> Result<(), Box<dyn std::error::Error>> {
    let start = Instant::now();
    log_op_start!("ingest", source = args.source.as_str());

    let settings = settings::load(&args.config.config)?;
    let pipeline = match InsertPipeline::from_settings(&settings, SqliteConnector) {
        Ok(pipeline) => Some(pipeline),
        Err(e) if e.is_not_configured() => {
            tracing::warn!(
                component = module_path!(),
                op = "ingest",
                err_code = e.code(),
                "Insert pipeline disabled, passing items through: {}",
                e.message()
            );
            None
        }
        Err(e) => {
            log_op_error!("ingest", e.clone(), duration_ms = elapsed_ms(start));
            return Err(e.into());
        }
    };

    let reader: Box<dyn BufRead> = match &args.input {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(BufReader::new(io::stdin())),
    };
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut stats = IngestStats::default();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        stats.lines += 1;
        let line_no = index + 1;
        let item_start = Instant::now();

        let result = parse_line(&line, &args.kind).and_then(|scraped| match &pipeline {
            Some(pipeline) => pipeline.process_item(scraped, &CrawlContext::new(&args.source)),
            None => Ok(scraped),
        });

        match result {
            Ok(scraped) => {
                writeln!(out, "{}", scraped.to_value())?;
                stats.emitted += 1;
            }
            Err(e) => {
                log_op_error!(
                    "process_item",
                    e.clone(),
                    duration_ms = elapsed_ms(item_start),
                    line = line_no
                );
                if args.fail_fast {
                    return Err(e.into());
                }
                stats.failed += 1;
            }
        }
    }
    out.flush()?;

    log_op_end!(
        "ingest",
        duration_ms = elapsed_ms(start),
        lines = stats.lines,
        emitted = stats.emitted,
        failed = stats.failed
    );
    Ok(())
}

/// Objects become items of `kind`; other JSON values pass through as-is
fn parse_line(line: &str, kind: &str) -> rdbpipe_core::Result<Scraped> {
    let value: Value = serde_json::from_str(line).map_err(|e| {
        RdbError::new(RdbErrorKind::Serialization)
            .with_op("parse_line")
            .with_message(e.to_string())
    })?;

    Ok(match value {
        Value::Object(values) => Scraped::Item(Item::with_values(kind, values)),
        other => Scraped::Other(other),
    })
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_object_line_is_item() {
        let scraped = parse_line(r#"{"id": 1, "title": "x"}"#, "book").unwrap();
        let item = scraped.as_item().unwrap();
        assert_eq!(item.kind(), "book");
        assert_eq!(item.get("title"), Some(&json!("x")));
    }

    #[test]
    fn test_parse_non_object_line_passes_through() {
        for line in ["42", r#""text""#, "[1, 2]", "null"] {
            assert!(!parse_line(line, "item").unwrap().is_item());
        }
    }

    #[test]
    fn test_parse_invalid_json_is_serialization_error() {
        let err = parse_line("{not json", "item").unwrap_err();
        assert_eq!(err.kind(), RdbErrorKind::Serialization);
    }
}
