mod common;

use std::sync::Arc;

use common::{FakeDb, config};
use mysql_middleware::prelude::*;

type TestResult = Result<(), Box<dyn std::error::Error>>;

#[tokio::test]
async fn pooled_engines_share_diagnostics() -> TestResult {
    let db = FakeDb::new();
    let manager = EngineManager::new(config(), db.connector());
    let diagnostics = Arc::clone(manager.diagnostics());
    let pool = manager.into_pool(4)?;

    let mut handles = Vec::new();
    for i in 0..4_i64 {
        let pool = pool.clone();
        handles.push(tokio::spawn(async move {
            let mut engine = pool.get().await.map_err(|e| e.to_string())?;
            engine
                .query(
                    "SELECT * FROM tbl_users WHERE id = :id",
                    FetchMode::Assoc,
                    &Fields::new().with("id", i),
                )
                .await
                .map_err(|e| e.to_string())?;
            Ok::<(), String>(())
        }));
    }
    for handle in handles {
        handle.await??;
    }

    assert_eq!(diagnostics.query_count(), 4);
    assert_eq!(db.executed().len(), 4);
    assert!(db.connects().len() <= 4);
    Ok(())
}

#[tokio::test]
async fn recycled_engines_start_without_a_result() -> TestResult {
    let db = FakeDb::new();
    let pool = EngineManager::new(config(), db.connector()).into_pool(1)?;

    {
        let mut engine = pool.get().await?;
        engine
            .query("SELECT 1", FetchMode::Assoc, &Fields::new())
            .await?;
        assert!(engine.last_result().is_some());
    }

    let engine = pool.get().await?;
    assert!(engine.last_result().is_none());
    assert!(engine.is_connected());
    assert_eq!(db.connects().len(), 1);
    Ok(())
}

#[tokio::test]
async fn pool_creation_reports_connection_errors() {
    let db = FakeDb::new();
    db.refuse_connections();
    let pool = EngineManager::new(config(), db.connector())
        .into_pool(1)
        .expect("pool builds lazily");
    assert!(pool.get().await.is_err());
}
