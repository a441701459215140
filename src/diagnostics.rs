//! Query log, statistics and observer hooks.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, error, warn};

use crate::config::DEFAULT_SLOW_QUERY_THRESHOLD;

/// Stable identifier for a statement's text.
#[must_use]
pub fn query_hash(query: &str) -> String {
    let mut hasher = DefaultHasher::new();
    query.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogKind {
    Query,
    Error {
        code: Option<String>,
        message: String,
    },
}

/// One executed statement. Never changed after it is appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub query: String,
    pub query_hash: String,
    pub duration: Duration,
    pub timestamp: DateTime<Utc>,
    pub kind: LogKind,
}

impl LogEntry {
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self.kind, LogKind::Error { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFilter {
    #[default]
    All,
    Queries,
    Errors,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statistics {
    /// Successful executions since the diagnostics were created.
    pub queries: u64,
    pub total_query_time: Duration,
    pub slow_queries: Vec<LogEntry>,
}

/// Shared log and counter. One instance may serve many engines.
#[derive(Debug)]
pub struct Diagnostics {
    query_count: AtomicU64,
    log: Mutex<Vec<LogEntry>>,
    slow_query_threshold: Duration,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new(DEFAULT_SLOW_QUERY_THRESHOLD)
    }
}

impl Diagnostics {
    #[must_use]
    pub fn new(slow_query_threshold: Duration) -> Self {
        Self {
            query_count: AtomicU64::new(0),
            log: Mutex::new(Vec::new()),
            slow_query_threshold,
        }
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, Vec<LogEntry>> {
        match self.log.lock() {
            Ok(guard) => guard,
            // A panic while holding the lock cannot leave a half-written entry.
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub(crate) fn record_success(&self, query: &str, query_hash: &str, duration: Duration) {
        self.query_count.fetch_add(1, Ordering::Relaxed);
        if duration > self.slow_query_threshold {
            warn!(query_hash, ?duration, query, "slow query");
        } else {
            debug!(query_hash, ?duration, query, "query executed");
        }
        self.entries().push(LogEntry {
            query: query.to_string(),
            query_hash: query_hash.to_string(),
            duration,
            timestamp: Utc::now(),
            kind: LogKind::Query,
        });
    }

    pub(crate) fn record_failure(
        &self,
        query: &str,
        query_hash: &str,
        duration: Duration,
        code: Option<&str>,
        message: &str,
    ) {
        error!(query_hash, ?duration, code, message, query, "query failed");
        self.entries().push(LogEntry {
            query: query.to_string(),
            query_hash: query_hash.to_string(),
            duration,
            timestamp: Utc::now(),
            kind: LogKind::Error {
                code: code.map(str::to_string),
                message: message.to_string(),
            },
        });
    }

    /// Clear the log. The query counter is left as is.
    pub fn flush_log(&self) {
        self.entries().clear();
    }

    #[must_use]
    pub fn query_count(&self) -> u64 {
        self.query_count.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn slow_query_threshold(&self) -> Duration {
        self.slow_query_threshold
    }

    #[must_use]
    pub fn debug(&self, filter: LogFilter) -> Vec<LogEntry> {
        self.entries()
            .iter()
            .filter(|entry| match filter {
                LogFilter::All => true,
                LogFilter::Queries => !entry.is_error(),
                LogFilter::Errors => entry.is_error(),
            })
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn statistics(&self) -> Statistics {
        let entries = self.entries();
        let total_query_time = entries.iter().map(|entry| entry.duration).sum();
        let slow_queries = entries
            .iter()
            .filter(|entry| entry.duration > self.slow_query_threshold)
            .cloned()
            .collect();
        Statistics {
            queries: self.query_count(),
            total_query_time,
            slow_queries,
        }
    }
}

/// Payload for a successful execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryExecuted {
    pub query: String,
    pub query_hash: String,
    pub duration: Duration,
}

/// Payload for a failed execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryFailed {
    pub query: String,
    pub query_hash: String,
    pub code: Option<String>,
    pub message: String,
}

/// Listener notified after every execution. Both hooks default to no-ops.
pub trait QueryObserver: Send + Sync {
    fn on_query_executed(&self, _event: &QueryExecuted) {}

    fn on_query_error(&self, _event: &QueryFailed) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_depends_only_on_text() {
        assert_eq!(query_hash("SELECT 1"), query_hash("SELECT 1"));
        assert_ne!(query_hash("SELECT 1"), query_hash("SELECT 2"));
        assert_eq!(query_hash("SELECT 1").len(), 16);
    }

    #[test]
    fn failures_are_logged_but_not_counted() {
        let diag = Diagnostics::default();
        diag.record_success("SELECT 1", &query_hash("SELECT 1"), Duration::from_millis(2));
        diag.record_failure(
            "SELEC 1",
            &query_hash("SELEC 1"),
            Duration::from_millis(1),
            Some("1064"),
            "syntax",
        );

        assert_eq!(diag.query_count(), 1);
        assert_eq!(diag.debug(LogFilter::All).len(), 2);
        assert_eq!(diag.debug(LogFilter::Queries).len(), 1);
        let errors = diag.debug(LogFilter::Errors);
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].kind,
            LogKind::Error {
                code: Some("1064".into()),
                message: "syntax".into()
            }
        );
    }

    #[test]
    fn statistics_split_out_slow_queries() {
        let diag = Diagnostics::new(Duration::from_millis(100));
        diag.record_success("fast", "a", Duration::from_millis(40));
        diag.record_success("slow", "b", Duration::from_millis(250));

        let stats = diag.statistics();
        assert_eq!(stats.queries, 2);
        assert_eq!(stats.total_query_time, Duration::from_millis(290));
        assert_eq!(stats.slow_queries.len(), 1);
        assert_eq!(stats.slow_queries[0].query, "slow");
    }

    #[test]
    fn flush_clears_log_but_keeps_count() {
        let diag = Diagnostics::default();
        diag.record_success("SELECT 1", "h", Duration::ZERO);
        diag.flush_log();
        assert!(diag.debug(LogFilter::All).is_empty());
        assert_eq!(diag.query_count(), 1);
    }
}
