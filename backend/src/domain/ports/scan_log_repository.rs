//! Port for the append-only scan event log.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::access::ListScope;
use crate::domain::scan::{NewScanLogRecord, ScanAction, ScanLogEntry};

/// Errors raised by scan log repository adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScanLogRepositoryError {
    /// Repository connection could not be established.
    #[error("scan log repository connection failed: {message}")]
    Connection { message: String },
    /// Query or insert failed during execution.
    #[error("scan log repository query failed: {message}")]
    Query { message: String },
}

impl ScanLogRepositoryError {
    /// Create a connection error with the given message.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create a query error with the given message.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Filters for scan log listings; entries come back newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanLogFilter {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub action: Option<ScanAction>,
    /// Row cap; adapters apply their own default when absent.
    pub limit: Option<i64>,
}

/// Port for scan log appends and reads. There are no updates or deletes;
/// rows disappear only when their parent item is removed.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ScanLogRepository: Send + Sync {
    /// Append one scan log entry.
    async fn record(
        &self,
        record: &NewScanLogRecord,
    ) -> Result<ScanLogEntry, ScanLogRepositoryError>;

    /// Scan log entries visible under the scope, newest first.
    async fn list(
        &self,
        scope: &ListScope,
        filter: &ScanLogFilter,
    ) -> Result<Vec<ScanLogEntry>, ScanLogRepositoryError>;
}

/// Fixture implementation for tests that do not inspect scan logging.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureScanLogRepository;

#[async_trait]
impl ScanLogRepository for FixtureScanLogRepository {
    async fn record(
        &self,
        record: &NewScanLogRecord,
    ) -> Result<ScanLogEntry, ScanLogRepositoryError> {
        Ok(ScanLogEntry {
            id: 0,
            item_id: record.item_id,
            article: record.article.clone(),
            scan_type: record.scan_type,
            scan_data: record.scan_data.clone(),
            action: record.action,
            result: record.result.clone(),
            scanned_by: record.scanned_by.clone(),
            created_at: Utc::now(),
        })
    }

    async fn list(
        &self,
        _scope: &ListScope,
        _filter: &ScanLogFilter,
    ) -> Result<Vec<ScanLogEntry>, ScanLogRepositoryError> {
        Ok(Vec::new())
    }
}
