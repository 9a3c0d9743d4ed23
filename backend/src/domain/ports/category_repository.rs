//! Port for category persistence.

use async_trait::async_trait;

use crate::domain::category::{Category, CategoryDraft, CategoryId};

/// Errors raised by category repository adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CategoryRepositoryError {
    /// Repository connection could not be established.
    #[error("category repository connection failed: {message}")]
    Connection { message: String },
    /// Query or mutation failed during execution.
    #[error("category repository query failed: {message}")]
    Query { message: String },
    /// The category name is already taken.
    #[error("category name already exists: {name}")]
    DuplicateName { name: String },
}

impl CategoryRepositoryError {
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

    /// Create a duplicate-name error for the given name.
    pub fn duplicate_name(name: impl Into<String>) -> Self {
        Self::DuplicateName { name: name.into() }
    }
}

/// Outcome of a category deletion attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryDeleteOutcome {
    /// The category was removed.
    Deleted,
    /// No category with the given id exists.
    NotFound,
    /// Items or users still reference the category; nothing was removed.
    Referenced { items: i64, users: i64 },
}

/// Port for category rows.
///
/// Deletion is refused while any item or user references the category; the
/// adapter counts references and deletes within one transaction.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// Persist a new category.
    async fn insert(&self, draft: &CategoryDraft) -> Result<Category, CategoryRepositoryError>;

    /// Rename or re-describe a category.
    async fn update(
        &self,
        category_id: CategoryId,
        draft: &CategoryDraft,
    ) -> Result<Option<Category>, CategoryRepositoryError>;

    /// Find a category by id.
    async fn find_by_id(
        &self,
        category_id: CategoryId,
    ) -> Result<Option<Category>, CategoryRepositoryError>;

    /// All categories, ordered by name.
    async fn list(&self) -> Result<Vec<Category>, CategoryRepositoryError>;

    /// Delete a category unless it is still referenced.
    async fn delete(
        &self,
        category_id: CategoryId,
    ) -> Result<CategoryDeleteOutcome, CategoryRepositoryError>;
}

/// Fixture implementation for tests that do not exercise categories.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureCategoryRepository;

#[async_trait]
impl CategoryRepository for FixtureCategoryRepository {
    async fn insert(&self, draft: &CategoryDraft) -> Result<Category, CategoryRepositoryError> {
        Err(CategoryRepositoryError::query(format!(
            "fixture cannot insert category {}",
            draft.name
        )))
    }

    async fn update(
        &self,
        _category_id: CategoryId,
        _draft: &CategoryDraft,
    ) -> Result<Option<Category>, CategoryRepositoryError> {
        Ok(None)
    }

    async fn find_by_id(
        &self,
        _category_id: CategoryId,
    ) -> Result<Option<Category>, CategoryRepositoryError> {
        Ok(None)
    }

    async fn list(&self) -> Result<Vec<Category>, CategoryRepositoryError> {
        Ok(Vec::new())
    }

    async fn delete(
        &self,
        _category_id: CategoryId,
    ) -> Result<CategoryDeleteOutcome, CategoryRepositoryError> {
        Ok(CategoryDeleteOutcome::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[tokio::test]
    async fn fixture_lookups_return_nothing() {
        let repo = FixtureCategoryRepository;
        let found = repo
            .find_by_id(CategoryId::new(1))
            .await
            .expect("fixture lookup succeeds");
        assert!(found.is_none());
        let listed = repo.list().await.expect("fixture list succeeds");
        assert!(listed.is_empty());
    }

    #[rstest]
    fn duplicate_name_error_carries_the_name() {
        let err = CategoryRepositoryError::duplicate_name("Fasteners");
        assert_eq!(err.to_string(), "category name already exists: Fasteners");
    }
}
