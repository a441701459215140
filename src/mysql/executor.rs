use async_trait::async_trait;
use sqlx::mysql::{MySqlConnection, MySqlDatabaseError, MySqlQueryResult};
use sqlx::{Connection, Executor, Statement};
use tracing::trace;

use crate::connection::{
    DriverConnection, DriverError, DriverOutcome, DriverPhase, DriverStatement,
};

use super::params::bind_all;
use super::query::build_result_set;

/// A live MySQL session.
#[derive(Debug)]
pub struct MySqlDriverConnection {
    conn: Option<MySqlConnection>,
}

impl MySqlDriverConnection {
    #[must_use]
    pub fn new(conn: MySqlConnection) -> Self {
        Self { conn: Some(conn) }
    }
}

/// Convert a sqlx error, keeping the MySQL error number when there is one.
pub(crate) fn driver_error(phase: DriverPhase, err: sqlx::Error) -> DriverError {
    match err {
        sqlx::Error::Database(db_err) => {
            let code = db_err
                .try_downcast_ref::<MySqlDatabaseError>()
                .map(|e| e.number().to_string())
                .or_else(|| db_err.code().map(|c| c.into_owned()));
            DriverError::new(phase, code, db_err.message())
        }
        sqlx::Error::Encode(e) => DriverError::new(DriverPhase::Bind, None, e.to_string()),
        err @ (sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_)) => {
            DriverError::new(DriverPhase::Fetch, None, err.to_string())
        }
        other => DriverError::new(phase, None, other.to_string()),
    }
}

fn write_outcome(done: &MySqlQueryResult) -> DriverOutcome {
    DriverOutcome {
        result_set: None,
        rows_affected: done.rows_affected(),
        last_insert_id: Some(done.last_insert_id()),
    }
}

#[async_trait]
impl DriverConnection for MySqlDriverConnection {
    async fn run(&mut self, statement: DriverStatement<'_>) -> Result<DriverOutcome, DriverError> {
        let conn = self.conn.as_mut().ok_or_else(|| {
            DriverError::new(DriverPhase::Connect, None, "connection is closed")
        })?;
        let execute_err = |e: sqlx::Error| driver_error(DriverPhase::Execute, e);

        // Statements without parameters go over the text protocol: several DDL and
        // session statements cannot be prepared on every server version.
        if statement.params.is_empty() {
            trace!("text protocol");
            if statement.fetch {
                let rows = (&mut *conn)
                    .fetch_all(sqlx::raw_sql(statement.sql))
                    .await
                    .map_err(execute_err)?;
                return Ok(DriverOutcome {
                    rows_affected: rows.len() as u64,
                    result_set: Some(build_result_set(&rows)?),
                    last_insert_id: None,
                });
            }
            let done = (&mut *conn)
                .execute(sqlx::raw_sql(statement.sql))
                .await
                .map_err(execute_err)?;
            return Ok(write_outcome(&done));
        }

        let prepared = (&mut *conn)
            .prepare(statement.sql)
            .await
            .map_err(|e| driver_error(DriverPhase::Prepare, e))?;
        let query = bind_all(prepared.query(), statement.params);

        if statement.fetch {
            let rows = query.fetch_all(&mut *conn).await.map_err(execute_err)?;
            Ok(DriverOutcome {
                rows_affected: rows.len() as u64,
                result_set: Some(build_result_set(&rows)?),
                last_insert_id: None,
            })
        } else {
            let done = query.execute(&mut *conn).await.map_err(execute_err)?;
            Ok(write_outcome(&done))
        }
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        match self.conn.take() {
            Some(conn) => conn
                .close()
                .await
                .map_err(|e| driver_error(DriverPhase::Connect, e)),
            None => Ok(()),
        }
    }
}
