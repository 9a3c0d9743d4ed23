//! Append-only scan event log entries.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::item::ItemId;

/// How the payload reached the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanType {
    Qr,
    Barcode,
    Manual,
}

impl ScanType {
    /// Stable string form stored in the database.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Qr => "qr",
            Self::Barcode => "barcode",
            Self::Manual => "manual",
        }
    }
}

impl fmt::Display for ScanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the scan was used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanAction {
    Search,
    Update,
    CheckIn,
    CheckOut,
}

impl ScanAction {
    /// Stable string form stored in the database.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Update => "update",
            Self::CheckIn => "check_in",
            Self::CheckOut => "check_out",
        }
    }
}

impl fmt::Display for ScanAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error raised when parsing an unrecognised scan enum string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown scan field value: {value}")]
pub struct UnknownScanValue {
    /// The rejected input.
    pub value: String,
}

impl FromStr for ScanType {
    type Err = UnknownScanValue;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "qr" => Ok(Self::Qr),
            "barcode" => Ok(Self::Barcode),
            "manual" => Ok(Self::Manual),
            other => Err(UnknownScanValue {
                value: other.to_owned(),
            }),
        }
    }
}

impl FromStr for ScanAction {
    type Err = UnknownScanValue;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "search" => Ok(Self::Search),
            "update" => Ok(Self::Update),
            "check_in" => Ok(Self::CheckIn),
            "check_out" => Ok(Self::CheckOut),
            other => Err(UnknownScanValue {
                value: other.to_owned(),
            }),
        }
    }
}

/// One immutable scan log record.
///
/// `article` is a snapshot of the item's name at scan time; the row is only
/// removed when its parent item is deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanLogEntry {
    pub id: i64,
    pub item_id: ItemId,
    pub article: String,
    pub scan_type: ScanType,
    pub scan_data: String,
    pub action: ScanAction,
    pub result: String,
    pub scanned_by: String,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a new scan log row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewScanLogRecord {
    pub item_id: ItemId,
    pub article: String,
    pub scan_type: ScanType,
    pub scan_data: String,
    pub action: ScanAction,
    pub result: String,
    pub scanned_by: String,
}
