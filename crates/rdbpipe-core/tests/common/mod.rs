use rdbpipe_core::{
    Connection, ConnectionFactory, ConnectionSettings, RdbError, RdbErrorKind, Result, Statement,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Shared state behind a stub backend: the table list it reports and every
/// call it received.
#[derive(Default)]
pub struct StubState {
    pub tables: Mutex<Vec<String>>,
    pub executed: Mutex<Vec<Statement>>,
    pub seen_settings: Mutex<Vec<ConnectionSettings>>,
    pub connects: AtomicUsize,
    pub failing_connects: AtomicUsize,
    pub insert_error: Mutex<Option<RdbError>>,
}

/// In-memory backend recording everything the driver asks of it
#[derive(Clone, Default)]
pub struct StubFactory {
    pub state: Arc<StubState>,
}

#[allow(dead_code)]
impl StubFactory {
    pub fn with_tables(tables: &[&str]) -> Self {
        let factory = Self::default();
        *factory.state.tables.lock().unwrap() = tables.iter().map(|t| t.to_string()).collect();
        factory
    }

    /// Make the next `n` connection attempts fail
    pub fn fail_next_connects(self, n: usize) -> Self {
        self.state.failing_connects.store(n, Ordering::SeqCst);
        self
    }

    pub fn fail_inserts_with(self, err: RdbError) -> Self {
        *self.state.insert_error.lock().unwrap() = Some(err);
        self
    }

    pub fn connects(&self) -> usize {
        self.state.connects.load(Ordering::SeqCst)
    }

    pub fn executed(&self) -> Vec<Statement> {
        self.state.executed.lock().unwrap().clone()
    }

    pub fn inserts(&self) -> Vec<Statement> {
        self.executed()
            .into_iter()
            .filter(|s| matches!(s, Statement::Insert { .. }))
            .collect()
    }

    pub fn table_list_queries(&self) -> usize {
        self.executed()
            .iter()
            .filter(|s| **s == Statement::TableList)
            .count()
    }

    pub fn drop_table(&self, name: &str) {
        self.state.tables.lock().unwrap().retain(|t| t != name);
    }
}

pub struct StubConnection {
    state: Arc<StubState>,
}

impl ConnectionFactory for StubFactory {
    type Connection = StubConnection;

    fn connect(&self, settings: &ConnectionSettings) -> Result<StubConnection> {
        self.state.connects.fetch_add(1, Ordering::SeqCst);
        self.state
            .seen_settings
            .lock()
            .unwrap()
            .push(settings.clone());

        let remaining = self.state.failing_connects.load(Ordering::SeqCst);
        if remaining > 0 {
            self.state
                .failing_connects
                .store(remaining - 1, Ordering::SeqCst);
            return Err(RdbError::new(RdbErrorKind::Connection)
                .with_op("connect")
                .with_message("connection refused"));
        }

        Ok(StubConnection {
            state: Arc::clone(&self.state),
        })
    }
}

impl Connection for StubConnection {
    fn run(&self, statement: &Statement) -> Result<Value> {
        self.state
            .executed
            .lock()
            .unwrap()
            .push(statement.clone());

        match statement {
            Statement::TableList => {
                let tables = self.state.tables.lock().unwrap().clone();
                Ok(json!(tables))
            }
            Statement::Insert { table, .. } => {
                if let Some(err) = self.state.insert_error.lock().unwrap().clone() {
                    return Err(err);
                }
                if !self.state.tables.lock().unwrap().contains(table) {
                    return Err(RdbError::new(RdbErrorKind::Execution)
                        .with_op("insert")
                        .with_table(table.clone())
                        .with_message(format!("Table `{}` does not exist.", table)));
                }
                Ok(json!({"inserted": 1, "errors": 0}))
            }
        }
    }
}
