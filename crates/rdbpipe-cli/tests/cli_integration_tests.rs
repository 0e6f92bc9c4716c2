//! CLI integration tests
//!
//! Run the `rdbpipe` binary against a scratch SQLite database.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use rusqlite::Connection;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

struct Workspace {
    dir: TempDir,
    db_path: PathBuf,
    config_path: PathBuf,
}

impl Workspace {
    fn new(config_body: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("items.db");
        let config_path = dir.path().join("rdbpipe.toml");
        let config = format!(
            "{}\n[connection]\npath = \"{}\"\n",
            config_body,
            db_path.display()
        );
        fs::write(&config_path, config).unwrap();
        Self {
            dir,
            db_path,
            config_path,
        }
    }

    fn write_input(&self, lines: &[&str]) -> PathBuf {
        let path = self.dir.path().join("input.jsonl");
        fs::write(&path, lines.join("\n")).unwrap();
        path
    }

    fn run(&self, args: &[&str]) -> Output {
        self.run_with_env(args, &[])
    }

    fn run_with_env(&self, args: &[&str], env: &[(&str, &str)]) -> Output {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_rdbpipe"));
        cmd.current_dir(self.dir.path())
            .args(args)
            .arg("--config")
            .arg(&self.config_path)
            .env("RUST_LOG", "rdbpipe=info");
        for (key, value) in env {
            cmd.env(key, value);
        }
        cmd.output().expect("Failed to execute CLI")
    }

    fn create_table(&self, name: &str) {
        let output = self.run(&["tables", "create", name]);
        assert_success(&output);
    }

    fn stored(&self, table: &str) -> Vec<Value> {
        stored_documents(&self.db_path, table)
    }
}

fn stored_documents(db_path: &Path, table: &str) -> Vec<Value> {
    let conn = Connection::open(db_path).unwrap();
    let mut stmt = conn
        .prepare(&format!("SELECT doc FROM \"{}\" ORDER BY id", table))
        .unwrap();
    stmt.query_map([], |row| row.get::<_, String>(0))
        .unwrap()
        .map(|doc| serde_json::from_str(&doc.unwrap()).unwrap())
        .collect()
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "CLI command should succeed. Stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

fn stdout_values(output: &Output) -> Vec<Value> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[test]
fn test_tables_create_list_drop() {
    let ws = Workspace::new("");
    ws.create_table("posts");
    ws.create_table("authors");

    let listed = ws.run(&["tables", "list"]);
    assert_success(&listed);
    assert_eq!(String::from_utf8_lossy(&listed.stdout), "authors\nposts\n");

    assert_success(&ws.run(&["tables", "drop", "posts"]));
    let listed = ws.run(&["tables", "list"]);
    assert_eq!(String::from_utf8_lossy(&listed.stdout), "authors\n");
}

#[test]
fn test_tables_create_duplicate_fails() {
    let ws = Workspace::new("");
    ws.create_table("posts");

    let output = ws.run(&["tables", "create", "posts"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("already exists"));
}

#[test]
fn test_ingest_inserts_items_and_echoes_values() {
    let ws = Workspace::new("table = \"items\"\n[insert_options]\nconflict = \"update\"");
    ws.create_table("items");
    let input = ws.write_input(&[
        r#"{"id": "a", "title": "first"}"#,
        r#""just a string""#,
        r#"{"id": "b", "title": "second"}"#,
        r#"{"id": "a", "pages": 10}"#,
    ]);

    let output = ws.run(&["ingest", "--input", input.to_str().unwrap()]);
    assert_success(&output);

    let echoed = stdout_values(&output);
    assert_eq!(echoed.len(), 4);
    assert_eq!(echoed[1], json!("just a string"));

    assert_eq!(
        ws.stored("items"),
        vec![
            json!({"id": "a", "title": "first", "pages": 10}),
            json!({"id": "b", "title": "second"}),
        ]
    );
}

#[test]
fn test_ingest_without_table_passes_items_through() {
    let ws = Workspace::new("");
    ws.create_table("items");
    let input = ws.write_input(&[r#"{"id": 1}"#, "2"]);

    let output = ws.run(&["ingest", "--input", input.to_str().unwrap()]);
    assert_success(&output);

    assert_eq!(stdout_values(&output), vec![json!({"id": 1}), json!(2)]);
    assert!(ws.stored("items").is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("disabled"));
}

#[test]
fn test_ingest_missing_table_is_fatal() {
    let ws = Workspace::new("table = \"items\"");
    let input = ws.write_input(&[r#"{"id": 1}"#]);

    let output = ws.run(&["ingest", "--input", input.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Table with name <items> not found."));
}

#[test]
fn test_ingest_drops_bad_lines_unless_fail_fast() {
    let ws = Workspace::new("table = \"items\"");
    ws.create_table("items");
    let input = ws.write_input(&[r#"{"id": 1}"#, "{broken", r#"{"id": 2}"#]);
    let input = input.to_str().unwrap();

    let output = ws.run(&["ingest", "--input", input]);
    assert_success(&output);
    assert_eq!(stdout_values(&output).len(), 2);
    assert_eq!(ws.stored("items").len(), 2);

    let output = ws.run(&["ingest", "--input", input, "--fail-fast"]);
    assert!(!output.status.success());
}

#[test]
fn test_environment_overrides_table() {
    let ws = Workspace::new("table = \"items\"");
    ws.create_table("items");
    ws.create_table("archive");
    let input = ws.write_input(&[r#"{"id": 1}"#]);

    let output = ws.run_with_env(
        &["ingest", "--input", input.to_str().unwrap()],
        &[("RDBPIPE_TABLE", "archive")],
    );
    assert_success(&output);

    assert!(ws.stored("items").is_empty());
    assert_eq!(ws.stored("archive"), vec![json!({"id": 1})]);
}

#[test]
fn test_unknown_connection_key_is_rejected() {
    let ws = Workspace::new("table = \"items\"");
    let output = ws.run_with_env(&["tables", "list"], &[("RDBPIPE_CONNECTION__HOST", "db1")]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("host"));
}
