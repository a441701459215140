#![allow(dead_code)]

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use mysql_middleware::{
    ConnectionConfig, Connector, DriverConnection, DriverError, DriverOutcome, DriverPhase,
    DriverStatement, ResultSet, RowValues,
};

/// A statement as the driver received it.
#[derive(Debug, Clone, PartialEq)]
pub struct Executed {
    pub sql: String,
    pub params: Vec<RowValues>,
    pub fetch: bool,
}

#[derive(Default)]
struct FakeState {
    executed: Vec<Executed>,
    failures: Vec<(String, DriverError)>,
    responses: Vec<(String, Option<RowValues>, ResultSet)>,
    connects: Vec<ConnectionConfig>,
    refuse_connect: bool,
    delay: Option<Duration>,
    next_insert_id: u64,
}

/// In-memory stand-in for a MySQL server. Responses and failures are chosen by
/// the first rule whose needle occurs in the statement text (and, for
/// [`FakeDb::respond_to_param`], whose value is among the bound parameters).
#[derive(Clone, Default)]
pub struct FakeDb {
    state: Arc<Mutex<FakeState>>,
}

impl FakeDb {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn connector(&self) -> Arc<dyn Connector> {
        Arc::new(FakeConnector { db: self.clone() })
    }

    pub fn respond(&self, needle: &str, columns: &[&str], rows: Vec<Vec<RowValues>>) {
        self.push_response(needle, None, columns, rows);
    }

    pub fn respond_to_param(
        &self,
        needle: &str,
        param: RowValues,
        columns: &[&str],
        rows: Vec<Vec<RowValues>>,
    ) {
        self.push_response(needle, Some(param), columns, rows);
    }

    fn push_response(
        &self,
        needle: &str,
        param: Option<RowValues>,
        columns: &[&str],
        rows: Vec<Vec<RowValues>>,
    ) {
        let mut set = ResultSet::with_capacity(rows.len());
        set.set_column_names(Arc::new(columns.iter().map(|c| c.to_string()).collect()));
        for row in rows {
            set.add_row_values(row);
        }
        self.lock().responses.push((needle.to_string(), param, set));
    }

    pub fn fail_on(&self, needle: &str, phase: DriverPhase, code: &str, message: &str) {
        self.lock().failures.push((
            needle.to_string(),
            DriverError::new(phase, Some(code.to_string()), message),
        ));
    }

    pub fn refuse_connections(&self) {
        self.lock().refuse_connect = true;
    }

    pub fn delay(&self, delay: Duration) {
        self.lock().delay = Some(delay);
    }

    pub fn executed(&self) -> Vec<Executed> {
        self.lock().executed.clone()
    }

    pub fn executed_sql(&self) -> Vec<String> {
        self.lock().executed.iter().map(|e| e.sql.clone()).collect()
    }

    pub fn connects(&self) -> Vec<ConnectionConfig> {
        self.lock().connects.clone()
    }
}

struct FakeConnector {
    db: FakeDb,
}

#[async_trait]
impl Connector for FakeConnector {
    async fn connect(
        &self,
        config: &ConnectionConfig,
    ) -> Result<Box<dyn DriverConnection>, DriverError> {
        let mut state = self.db.lock();
        if state.refuse_connect {
            return Err(DriverError::new(
                DriverPhase::Connect,
                Some("2003".to_string()),
                "Can't connect to MySQL server",
            ));
        }
        state.connects.push(config.clone());
        Ok(Box::new(FakeConnection {
            db: self.db.clone(),
        }))
    }
}

struct FakeConnection {
    db: FakeDb,
}

#[async_trait]
impl DriverConnection for FakeConnection {
    async fn run(&mut self, statement: DriverStatement<'_>) -> Result<DriverOutcome, DriverError> {
        let delay = self.db.lock().delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.db.lock();
        state.executed.push(Executed {
            sql: statement.sql.to_string(),
            params: statement.params.to_vec(),
            fetch: statement.fetch,
        });
        if let Some((_, err)) = state
            .failures
            .iter()
            .find(|(needle, _)| statement.sql.contains(needle.as_str()))
        {
            return Err(err.clone());
        }

        if statement.fetch {
            let result_set = state
                .responses
                .iter()
                .find(|(needle, param, _)| {
                    statement.sql.contains(needle.as_str())
                        && param.as_ref().is_none_or(|p| statement.params.contains(p))
                })
                .map(|(_, _, set)| set.clone())
                .unwrap_or_default();
            return Ok(DriverOutcome {
                rows_affected: result_set.len() as u64,
                result_set: Some(result_set),
                last_insert_id: None,
            });
        }

        let is_insert = statement.sql.trim_start().to_ascii_uppercase().starts_with("INSERT");
        let last_insert_id = if is_insert {
            state.next_insert_id += 1;
            Some(state.next_insert_id)
        } else {
            Some(0)
        };
        Ok(DriverOutcome {
            result_set: None,
            rows_affected: 1,
            last_insert_id,
        })
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        Ok(())
    }
}

pub fn config() -> mysql_middleware::EngineConfig {
    mysql_middleware::EngineConfig::builder()
        .host("db.test")
        .user("app")
        .password("secret")
        .database("site")
        .build()
        .unwrap()
}
