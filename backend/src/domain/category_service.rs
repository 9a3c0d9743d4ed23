//! Category lifecycle service.

use std::sync::Arc;

use tracing::debug;

use crate::domain::category::{Category, CategoryDraft, CategoryId};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::identity::IdentityContext;
use crate::domain::ports::{
    CategoryDeleteOutcome, CategoryRepository, CategoryRepositoryError,
};

fn map_category_error(error: CategoryRepositoryError) -> DomainError {
    match error {
        CategoryRepositoryError::Connection { message } => {
            DomainError::unavailable(format!("category repository unavailable: {message}"))
        }
        CategoryRepositoryError::Query { message } => {
            DomainError::internal(format!("category repository error: {message}"))
        }
        CategoryRepositoryError::DuplicateName { name } => {
            DomainError::conflict(format!("category name already exists: {name}"))
        }
    }
}

fn category_not_found(category_id: CategoryId) -> DomainError {
    DomainError::not_found(format!("category {category_id} not found"))
}

/// Service owning the category lifecycle. Management is admin-only;
/// listing is open to any identity since categories carry no stock data.
#[derive(Clone)]
pub struct CategoryService<C> {
    categories: Arc<C>,
}

impl<C> CategoryService<C> {
    /// Create a new service over the category repository.
    pub fn new(categories: Arc<C>) -> Self {
        Self { categories }
    }
}

impl<C> CategoryService<C>
where
    C: CategoryRepository,
{
    /// Create a category.
    pub async fn create(
        &self,
        identity: &IdentityContext,
        draft: CategoryDraft,
    ) -> DomainResult<Category> {
        if !identity.is_admin() {
            return Err(DomainError::permission_denied(
                "only admin may manage categories",
            ));
        }
        let draft = draft
            .validated()
            .map_err(|err| DomainError::validation(err.to_string()))?;
        let category = self
            .categories
            .insert(&draft)
            .await
            .map_err(map_category_error)?;
        debug!(category_id = %category.id(), name = category.name(), "category created");
        Ok(category)
    }

    /// Rename or re-describe a category.
    pub async fn update(
        &self,
        identity: &IdentityContext,
        category_id: CategoryId,
        draft: CategoryDraft,
    ) -> DomainResult<Category> {
        if !identity.is_admin() {
            return Err(DomainError::permission_denied(
                "only admin may manage categories",
            ));
        }
        let draft = draft
            .validated()
            .map_err(|err| DomainError::validation(err.to_string()))?;
        self.categories
            .update(category_id, &draft)
            .await
            .map_err(map_category_error)?
            .ok_or_else(|| category_not_found(category_id))
    }

    /// All categories, ordered by name.
    pub async fn list(&self, _identity: &IdentityContext) -> DomainResult<Vec<Category>> {
        self.categories.list().await.map_err(map_category_error)
    }

    /// Delete a category. Refused with a conflict while any item or user
    /// still references it.
    pub async fn delete(
        &self,
        identity: &IdentityContext,
        category_id: CategoryId,
    ) -> DomainResult<()> {
        if !identity.is_admin() {
            return Err(DomainError::permission_denied(
                "only admin may manage categories",
            ));
        }
        match self
            .categories
            .delete(category_id)
            .await
            .map_err(map_category_error)?
        {
            CategoryDeleteOutcome::Deleted => {
                debug!(category_id = %category_id, "category deleted");
                Ok(())
            }
            CategoryDeleteOutcome::NotFound => Err(category_not_found(category_id)),
            CategoryDeleteOutcome::Referenced { items, users } => {
                Err(DomainError::conflict(format!(
                    "category {category_id} is still referenced by {items} items and {users} users"
                )))
            }
        }
    }
}

#[cfg(test)]
#[path = "category_service_tests.rs"]
mod tests;
