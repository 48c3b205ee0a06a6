#![allow(async_fn_in_trait)]

use uuid::Uuid;

use vitrin_domain::user::UserRole;

use crate::domain::types::{CartItem, CartRepair, NewCartItem};
use crate::error::StoreServiceError;

/// Read-only port to the profiles store. The gate resolves the
/// authoritative role from here on every non-bypassed request.
pub trait ProfileRepository: Send + Sync {
    /// Role of the given user, or `None` when the profile row is missing
    /// (deleted account, or a role value this build does not know).
    async fn find_role(&self, user_id: Uuid) -> Result<Option<UserRole>, StoreServiceError>;
}

/// Repository for cart line items. Every method is scoped by `user_id` —
/// cross-user access must never be expressible through this trait.
pub trait CartItemRepository: Send + Sync {
    /// All rows for the user, newest-first (`updated_at` desc, `id` desc).
    async fn list(&self, user_id: Uuid) -> Result<Vec<CartItem>, StoreServiceError>;

    /// Insert a new row. Returns [`StoreServiceError::Conflict`] when the
    /// store rejects it for an existing `(user_id, product_id, variant)`.
    async fn insert(&self, item: &NewCartItem) -> Result<CartItem, StoreServiceError>;

    /// Latest row for the logical key, if any.
    async fn find_by_key(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        variant: &str,
    ) -> Result<Option<CartItem>, StoreServiceError>;

    /// Conflict-fallback write: set `quantity`, refresh the price snapshot
    /// (and image when supplied) and `updated_at`. Returns `None` when the
    /// row vanished between the conflicting insert and this update.
    async fn update_for_add(
        &self,
        id: Uuid,
        user_id: Uuid,
        quantity: i32,
        product_price_cents: i64,
        product_image: Option<&str>,
    ) -> Result<Option<CartItem>, StoreServiceError>;

    /// Set the quantity of an owned row. Returns the number of rows
    /// affected; 0 means no row matched `(id, user_id)`.
    async fn set_quantity(
        &self,
        id: Uuid,
        user_id: Uuid,
        quantity: i32,
    ) -> Result<u64, StoreServiceError>;

    /// Delete an owned row. Returns the number of rows affected.
    async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<u64, StoreServiceError>;

    /// Delete every row for the user. Returns the number of rows affected.
    async fn clear(&self, user_id: Uuid) -> Result<u64, StoreServiceError>;

    /// Persist one duplicate-group repair atomically: delete the stale rows
    /// and correct the survivor's quantity when it changed.
    async fn apply_repair(
        &self,
        user_id: Uuid,
        repair: &CartRepair,
    ) -> Result<(), StoreServiceError>;
}
