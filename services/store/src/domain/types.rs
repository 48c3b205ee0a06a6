use chrono::{DateTime, Utc};
use uuid::Uuid;

/// One product+variant line item in a user's cart.
///
/// The `product_*` fields are a denormalized catalog snapshot taken at add
/// time; they are not re-synced at read time. `product_id` is `None` only on
/// orphaned/legacy rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartItem {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_id: Option<Uuid>,
    pub variant: String,
    pub quantity: i32,
    pub product_name: String,
    pub product_price_cents: i64,
    pub product_image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Logical key distinguishing cart line items: same product, same variant.
pub type CartItemKey = (Option<Uuid>, String);

impl CartItem {
    pub fn key(&self) -> CartItemKey {
        (self.product_id, self.variant.clone())
    }
}

/// Insert payload for a new cart row. `id` and timestamps are assigned by
/// the repository.
#[derive(Debug, Clone)]
pub struct NewCartItem {
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub variant: String,
    pub quantity: i32,
    pub product_name: String,
    pub product_price_cents: i64,
    pub product_image: Option<String>,
}

/// A pending fix for one duplicated cart key, computed on read.
///
/// `quantity` is `Some` only when the survivor's stored quantity differs
/// from the group sum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartRepair {
    pub survivor_id: Uuid,
    pub quantity: Option<i32>,
    pub stale_ids: Vec<Uuid>,
}
