use std::collections::HashMap;

use uuid::Uuid;

use crate::domain::repository::CartItemRepository;
use crate::domain::types::{CartItem, CartItemKey, CartRepair, NewCartItem};
use crate::error::StoreServiceError;

/// Attempts for the insert-first/update-fallback add protocol. Each attempt
/// is one optimistic insert plus, on conflict, one read-modify-write.
const ADD_ATTEMPTS: usize = 2;

// ── Merge ────────────────────────────────────────────────────────────────────

/// Collapse duplicate rows sharing a `(product_id, variant)` key.
///
/// The survivor of a duplicate group is the row with the greatest
/// `updated_at` (id as tie-break); its quantity becomes the sum of the whole
/// group, so no quantity a user added is ever dropped. Group order follows
/// the input (newest-first from the repository), which keeps the output
/// stable across calls absent mutation.
///
/// Returns the merged view plus the repairs needed to make the store match
/// it. Callers persist the repairs out of band; the view never depends on
/// them.
pub fn merge_cart(rows: Vec<CartItem>) -> (Vec<CartItem>, Vec<CartRepair>) {
    let mut order: Vec<CartItemKey> = Vec::new();
    let mut groups: HashMap<CartItemKey, Vec<CartItem>> = HashMap::new();
    for row in rows {
        let key = row.key();
        if !groups.contains_key(&key) {
            order.push(key.clone());
        }
        groups.entry(key).or_default().push(row);
    }

    let mut items = Vec::with_capacity(order.len());
    let mut repairs = Vec::new();
    for key in order {
        let Some(group) = groups.remove(&key) else {
            continue;
        };
        let total = group
            .iter()
            .fold(0i32, |acc, item| acc.saturating_add(item.quantity));
        let survivor_idx = group
            .iter()
            .enumerate()
            .max_by_key(|(_, item)| (item.updated_at, item.id))
            .map(|(idx, _)| idx)
            .unwrap_or(0);

        let mut group = group;
        let mut survivor = group.remove(survivor_idx);
        if !group.is_empty() {
            repairs.push(CartRepair {
                survivor_id: survivor.id,
                quantity: (total != survivor.quantity).then_some(total),
                stale_ids: group.iter().map(|item| item.id).collect(),
            });
        }
        survivor.quantity = total;
        items.push(survivor);
    }
    (items, repairs)
}

/// Persist repairs computed by [`merge_cart`]. Best-effort: failures are
/// logged and swallowed, each group independently.
pub async fn repair_cart<R: CartItemRepository>(repo: &R, user_id: Uuid, repairs: Vec<CartRepair>) {
    for repair in &repairs {
        if let Err(e) = repo.apply_repair(user_id, repair).await {
            tracing::warn!(
                error = %e,
                %user_id,
                survivor_id = %repair.survivor_id,
                "cart duplicate repair failed"
            );
        }
    }
}

// ── ListCart ─────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct ListCartOutput {
    /// De-duplicated cart view, one item per logical key.
    pub items: Vec<CartItem>,
    /// Repairs the caller should fire off after responding. Empty when the
    /// store already matched the logical view.
    pub repairs: Vec<CartRepair>,
}

pub struct ListCartUseCase<R: CartItemRepository> {
    pub repo: R,
}

impl<R: CartItemRepository> ListCartUseCase<R> {
    pub async fn execute(&self, user_id: Uuid) -> Result<ListCartOutput, StoreServiceError> {
        let rows = self.repo.list(user_id).await?;
        let (items, repairs) = merge_cart(rows);
        Ok(ListCartOutput { items, repairs })
    }
}

// ── AddItem ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct AddItemInput {
    pub product_id: Uuid,
    pub variant: String,
    pub quantity: i32,
    pub product_name: String,
    pub product_price_cents: i64,
    pub product_image: Option<String>,
}

pub struct AddItemUseCase<R: CartItemRepository> {
    pub repo: R,
}

impl<R: CartItemRepository> AddItemUseCase<R> {
    /// Insert-first, update-on-conflict. The insert is optimistic — correct
    /// whenever no row for the key exists yet. On a uniqueness conflict the
    /// fallback adds the requested quantity onto the existing row; if that
    /// row vanished in between (concurrent remove), the insert is retried.
    /// Bounded: after [`ADD_ATTEMPTS`] rounds the conflict is surfaced.
    pub async fn execute(
        &self,
        user_id: Uuid,
        input: AddItemInput,
    ) -> Result<CartItem, StoreServiceError> {
        if input.quantity < 1 {
            return Err(StoreServiceError::InvalidQuantity);
        }

        let new_item = NewCartItem {
            user_id,
            product_id: input.product_id,
            variant: input.variant.clone(),
            quantity: input.quantity,
            product_name: input.product_name.clone(),
            product_price_cents: input.product_price_cents,
            product_image: input.product_image.clone(),
        };

        for _ in 0..ADD_ATTEMPTS {
            match self.repo.insert(&new_item).await {
                Ok(item) => return Ok(item),
                Err(StoreServiceError::Conflict) => {}
                Err(e) => return Err(e),
            }

            let existing = self
                .repo
                .find_by_key(user_id, input.product_id, &input.variant)
                .await?;
            let Some(existing) = existing else {
                // The conflicting row was removed between the failed insert
                // and this read; take another round.
                continue;
            };

            let updated = self
                .repo
                .update_for_add(
                    existing.id,
                    user_id,
                    existing.quantity.saturating_add(input.quantity),
                    input.product_price_cents,
                    input.product_image.as_deref(),
                )
                .await?;
            match updated {
                Some(item) => return Ok(item),
                None => continue,
            }
        }

        Err(StoreServiceError::Conflict)
    }
}

// ── UpdateItem ───────────────────────────────────────────────────────────────

pub struct UpdateItemUseCase<R: CartItemRepository> {
    pub repo: R,
}

impl<R: CartItemRepository> UpdateItemUseCase<R> {
    /// Set an owned item's quantity. A row owned by another user (or no row
    /// at all) affects nothing and still succeeds — existence is never
    /// leaked across users.
    pub async fn execute(
        &self,
        user_id: Uuid,
        item_id: Uuid,
        quantity: i32,
    ) -> Result<(), StoreServiceError> {
        if quantity < 1 {
            return Err(StoreServiceError::InvalidQuantity);
        }
        self.repo.set_quantity(item_id, user_id, quantity).await?;
        Ok(())
    }
}

// ── RemoveItem ───────────────────────────────────────────────────────────────

pub struct RemoveItemUseCase<R: CartItemRepository> {
    pub repo: R,
}

impl<R: CartItemRepository> RemoveItemUseCase<R> {
    /// Idempotent: deleting an already-absent item succeeds silently.
    pub async fn execute(&self, user_id: Uuid, item_id: Uuid) -> Result<(), StoreServiceError> {
        self.repo.delete(item_id, user_id).await?;
        Ok(())
    }
}

// ── ClearCart ────────────────────────────────────────────────────────────────

pub struct ClearCartUseCase<R: CartItemRepository> {
    pub repo: R,
}

impl<R: CartItemRepository> ClearCartUseCase<R> {
    pub async fn execute(&self, user_id: Uuid) -> Result<(), StoreServiceError> {
        self.repo.clear(user_id).await?;
        Ok(())
    }
}
