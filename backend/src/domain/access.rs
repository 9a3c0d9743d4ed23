//! Role- and category-based access policy.
//!
//! Pure predicates with no storage access, consulted by every item-touching
//! service before mutation. Read denial across a category boundary is
//! reported as `NotFound` by callers so existence never leaks; list and
//! search operations never fail on scope, they narrow instead.

use crate::domain::category::CategoryId;
use crate::domain::identity::{IdentityContext, Role};

/// Category restriction applied to list and search queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListScope {
    /// No category filter.
    Unrestricted,
    /// Only records in the given category are visible.
    Category(CategoryId),
}

/// Whether the identity may see an item in the given category.
///
/// Admins and identities without a category scope read everything;
/// everyone else reads only their own category (an uncategorised item
/// counts as matching an uncategorised identity).
pub fn can_read(identity: &IdentityContext, item_category: Option<CategoryId>) -> bool {
    identity.is_admin()
        || identity.category_id.is_none()
        || identity.category_id == item_category
}

/// Whether the identity may create or modify item fields in the given
/// category. Operators never hold field-write access; their reach is limited
/// to quantity changes via [`can_change_qty`].
pub fn can_write(identity: &IdentityContext, record_category: Option<CategoryId>) -> bool {
    match identity.role {
        Role::Admin => true,
        Role::Staff => identity.category_id == record_category,
        Role::Operator => false,
    }
}

/// Whether the identity may change stock quantities for an item in the
/// given category. Unlike reads, a scope-less non-admin only matches
/// uncategorised items here.
pub fn can_change_qty(identity: &IdentityContext, item_category: Option<CategoryId>) -> bool {
    identity.is_admin() || identity.category_id == item_category
}

/// Whether the identity may create items at all.
pub fn can_create_items(identity: &IdentityContext) -> bool {
    matches!(identity.role, Role::Admin | Role::Staff)
}

/// Derive the category filter for list and search queries.
pub fn list_scope(identity: &IdentityContext) -> ListScope {
    if identity.is_admin() {
        return ListScope::Unrestricted;
    }
    match identity.category_id {
        Some(category) => ListScope::Category(category),
        None => ListScope::Unrestricted,
    }
}
