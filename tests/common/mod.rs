//! Shared test doubles: an in-memory warehouse and object store

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;
use std::rc::Rc;

use async_trait::async_trait;
use oecd_loader::database::{
    Connector, DatabaseError, DatabaseResult, QueryResult, WarehouseSession,
};
use oecd_loader::staging::{ObjectPublisher, StagingError, StagingResult};

/// Everything the fake warehouse has observed and applied
#[derive(Debug, Default)]
pub struct WarehouseState {
    /// Every call, in order: `BEGIN`, `COMMIT`, `ROLLBACK`, `EXEC <sql>`,
    /// `QUERY <table>`, `CLOSE`
    pub log: Vec<String>,
    pub connects: usize,
    /// Statements applied by committed transactions (or outside one)
    pub committed: Vec<String>,
    /// Statements rolled back
    pub rolled_back: Vec<String>,
    /// Objects created by committed DDL
    pub objects: BTreeSet<String>,
    /// Tables whose COPY committed, in commit order
    pub loaded: Vec<String>,
    pending: Option<Vec<String>>,
}

impl WarehouseState {
    pub fn executed(&self) -> Vec<&str> {
        self.log
            .iter()
            .filter_map(|entry| entry.strip_prefix("EXEC "))
            .collect()
    }

    pub fn diagnosed(&self) -> Vec<&str> {
        self.log
            .iter()
            .filter_map(|entry| entry.strip_prefix("QUERY "))
            .collect()
    }

    fn apply(&mut self, sql: &str) {
        if let Some(object) = created_object(sql) {
            self.objects.insert(object);
        }
        if let Some(table) = copied_table(sql) {
            self.loaded.push(table);
        }
        self.committed.push(sql.to_string());
    }
}

/// `oecd.countries` for `CREATE TABLE IF NOT EXISTS oecd.countries (...`
fn created_object(sql: &str) -> Option<String> {
    let rest = sql.trim().split("IF NOT EXISTS ").nth(1)?;
    rest.split(|c: char| c.is_whitespace() || c == '(')
        .next()
        .map(str::to_string)
}

/// `economies` for `COPY "oecd"."economies" ...`
fn copied_table(sql: &str) -> Option<String> {
    let rest = sql.strip_prefix("COPY \"oecd\".\"")?;
    rest.split('"').next().map(str::to_string)
}

#[derive(Default)]
struct Behaviour {
    fail_connect: bool,
    fail_diagnostics: bool,
    fail_rollback: bool,
    /// Statements containing any of these fail
    failing: Vec<String>,
    /// Load-error rows by table name, with the backend pid that wrote them;
    /// `None` means the session that queries
    load_errors: HashMap<String, (Option<u32>, serde_json::Value)>,
}

struct Shared {
    behaviour: Behaviour,
    state: RefCell<WarehouseState>,
}

/// Connector for an in-memory warehouse
#[derive(Clone)]
pub struct FakeWarehouse {
    shared: Rc<Shared>,
}

/// Builder for `FakeWarehouse`
#[derive(Default)]
pub struct FakeWarehouseBuilder {
    behaviour: Behaviour,
}

impl FakeWarehouseBuilder {
    pub fn fail_connect(mut self) -> Self {
        self.behaviour.fail_connect = true;
        self
    }

    pub fn fail_diagnostics(mut self) -> Self {
        self.behaviour.fail_diagnostics = true;
        self
    }

    pub fn fail_rollback(mut self) -> Self {
        self.behaviour.fail_rollback = true;
        self
    }

    /// COPY into `table` fails
    pub fn fail_table(mut self, table: &str) -> Self {
        self.behaviour
            .failing
            .push(format!("COPY \"oecd\".\"{}\"", table));
        self
    }

    /// Any statement containing `fragment` fails
    pub fn fail_statement(mut self, fragment: &str) -> Self {
        self.behaviour.failing.push(fragment.to_string());
        self
    }

    /// Record a load-error row for `table`, written by the loading session
    pub fn load_error(mut self, table: &str, row: serde_json::Value) -> Self {
        self.behaviour
            .load_errors
            .insert(table.to_string(), (None, row));
        self
    }

    /// Record a load-error row for `table` left behind by another session
    pub fn stale_load_error(mut self, table: &str, pid: u32, row: serde_json::Value) -> Self {
        self.behaviour
            .load_errors
            .insert(table.to_string(), (Some(pid), row));
        self
    }

    pub fn build(self) -> FakeWarehouse {
        FakeWarehouse {
            shared: Rc::new(Shared {
                behaviour: self.behaviour,
                state: RefCell::new(WarehouseState::default()),
            }),
        }
    }
}

impl FakeWarehouse {
    pub fn builder() -> FakeWarehouseBuilder {
        FakeWarehouseBuilder::default()
    }

    pub fn healthy() -> Self {
        Self::builder().build()
    }

    pub fn state(&self) -> std::cell::Ref<'_, WarehouseState> {
        self.shared.state.borrow()
    }
}

#[async_trait(?Send)]
impl Connector for FakeWarehouse {
    type Session = FakeSession;

    async fn connect(&self) -> DatabaseResult<FakeSession> {
        if self.shared.behaviour.fail_connect {
            return Err(DatabaseError::ConnectionFailed(
                "could not connect to server: Connection refused".to_string(),
            ));
        }
        let mut state = self.shared.state.borrow_mut();
        state.connects += 1;
        Ok(FakeSession {
            shared: Rc::clone(&self.shared),
            pid: 40_000 + state.connects as u32,
        })
    }
}

pub struct FakeSession {
    shared: Rc<Shared>,
    /// Backend process id, as `pg_backend_pid()` would report it
    pid: u32,
}

#[async_trait(?Send)]
impl WarehouseSession for FakeSession {
    async fn execute(&self, sql: &str) -> DatabaseResult<()> {
        let mut state = self.shared.state.borrow_mut();
        state.log.push(format!("EXEC {}", sql));

        if let Some(fragment) = self
            .shared
            .behaviour
            .failing
            .iter()
            .find(|fragment| sql.contains(fragment.as_str()))
        {
            return Err(match copied_table(sql) {
                Some(table) => DatabaseError::QueryFailed(format!(
                    "Load into table '{}' failed. Check 'stl_load_errors' system table for details.",
                    table
                )),
                None => DatabaseError::QueryFailed(format!("statement rejected: {}", fragment)),
            });
        }

        match state.pending.as_mut() {
            Some(pending) => pending.push(sql.to_string()),
            None => state.apply(sql),
        }
        Ok(())
    }

    async fn begin(&self) -> DatabaseResult<()> {
        let mut state = self.shared.state.borrow_mut();
        state.log.push("BEGIN".to_string());
        if state.pending.is_some() {
            return Err(DatabaseError::TransactionFailed(
                "transaction already open".to_string(),
            ));
        }
        state.pending = Some(Vec::new());
        Ok(())
    }

    async fn commit(&self) -> DatabaseResult<()> {
        let mut state = self.shared.state.borrow_mut();
        state.log.push("COMMIT".to_string());
        let pending = state.pending.take().ok_or_else(|| {
            DatabaseError::TransactionFailed("no transaction in progress".to_string())
        })?;
        for sql in pending {
            state.apply(&sql);
        }
        Ok(())
    }

    async fn rollback(&self) -> DatabaseResult<()> {
        let mut state = self.shared.state.borrow_mut();
        state.log.push("ROLLBACK".to_string());
        if let Some(pending) = state.pending.take() {
            state.rolled_back.extend(pending);
        }
        if self.shared.behaviour.fail_rollback {
            return Err(DatabaseError::TransactionFailed(
                "server closed the connection unexpectedly".to_string(),
            ));
        }
        Ok(())
    }

    async fn query(&self, sql: &str, params: &[serde_json::Value]) -> DatabaseResult<QueryResult> {
        let table = params
            .first()
            .and_then(|p| p.as_str())
            .unwrap_or_default()
            .to_string();
        self.shared
            .state
            .borrow_mut()
            .log
            .push(format!("QUERY {}", table));

        if self.shared.behaviour.fail_diagnostics {
            return Err(DatabaseError::QueryFailed(
                "permission denied for relation stl_load_errors".to_string(),
            ));
        }

        let own_session_only = sql.contains("session = pg_backend_pid()");
        let rows = self
            .shared
            .behaviour
            .load_errors
            .get(&table)
            .filter(|(pid, _)| !own_session_only || pid.is_none_or(|pid| pid == self.pid))
            .map(|(_, row)| row.clone())
            .into_iter()
            .collect();
        Ok(QueryResult::new(Vec::new(), rows))
    }

    async fn close(&self) -> DatabaseResult<()> {
        self.shared.state.borrow_mut().log.push("CLOSE".to_string());
        Ok(())
    }

    fn backend_type(&self) -> &'static str {
        "fake"
    }
}

/// Object store double recording every upload
#[derive(Default)]
pub struct FakePublisher {
    failing: HashSet<String>,
    pub uploads: RefCell<Vec<(String, String)>>,
}

impl FakePublisher {
    pub fn failing(files: &[&str]) -> Self {
        Self {
            failing: files.iter().map(|f| f.to_string()).collect(),
            uploads: RefCell::new(Vec::new()),
        }
    }

    pub fn keys(&self) -> Vec<String> {
        self.uploads.borrow().iter().map(|(_, key)| key.clone()).collect()
    }
}

#[async_trait(?Send)]
impl ObjectPublisher for FakePublisher {
    async fn publish(&self, local_path: &Path, bucket: &str, key: &str) -> StagingResult<()> {
        let file_name = local_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        if self.failing.contains(&file_name) {
            return Err(StagingError::Upload {
                uri: format!("s3://{}/{}", bucket, key),
                message: "AccessDenied".to_string(),
            });
        }
        self.uploads
            .borrow_mut()
            .push((bucket.to_string(), key.to_string()));
        Ok(())
    }
}
