//! Category entity used to scope item visibility and writes.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable category identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(i64);

impl CategoryId {
    /// Wrap a raw database id.
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// The raw id value.
    pub const fn as_i64(self) -> i64 {
        self.0
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validation errors for category input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CategoryValidationError {
    /// The name is empty after trimming.
    #[error("category name must not be empty")]
    EmptyName,
}

/// Input payload for creating or renaming a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDraft {
    pub name: String,
    pub description: Option<String>,
}

impl CategoryDraft {
    /// Trim and validate the draft.
    pub fn validated(mut self) -> Result<Self, CategoryValidationError> {
        self.name = self.name.trim().to_owned();
        if self.name.is_empty() {
            return Err(CategoryValidationError::EmptyName);
        }
        Ok(self)
    }
}

/// A persisted category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    id: CategoryId,
    name: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Category {
    /// Validate and construct a category from stored parts.
    pub fn new(
        id: CategoryId,
        draft: CategoryDraft,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<Self, CategoryValidationError> {
        let draft = draft.validated()?;
        Ok(Self {
            id,
            name: draft.name,
            description: draft.description,
            created_at,
            updated_at,
        })
    }

    pub fn id(&self) -> CategoryId {
        self.id
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
