use anyhow::Context as _;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, SqlErr, TransactionTrait, sea_query::Expr,
};
use uuid::Uuid;

use vitrin_domain::user::UserRole;
use vitrin_store_schema::{cart_items, profiles};

use crate::domain::repository::{CartItemRepository, ProfileRepository};
use crate::domain::types::{CartItem, CartRepair, NewCartItem};
use crate::error::StoreServiceError;

// ── Profile repository ───────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbProfileRepository {
    pub db: DatabaseConnection,
}

impl ProfileRepository for DbProfileRepository {
    async fn find_role(&self, user_id: Uuid) -> Result<Option<UserRole>, StoreServiceError> {
        let model = profiles::Entity::find_by_id(user_id)
            .one(&self.db)
            .await
            .context("find profile by id")?;
        Ok(model.and_then(|m| u8::try_from(m.role).ok().and_then(UserRole::from_u8)))
    }
}

// ── Cart item repository ─────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbCartItemRepository {
    pub db: DatabaseConnection,
}

impl CartItemRepository for DbCartItemRepository {
    async fn list(&self, user_id: Uuid) -> Result<Vec<CartItem>, StoreServiceError> {
        let models = cart_items::Entity::find()
            .filter(cart_items::Column::UserId.eq(user_id))
            .order_by_desc(cart_items::Column::UpdatedAt)
            .order_by_desc(cart_items::Column::Id)
            .all(&self.db)
            .await
            .context("list cart items")?;
        Ok(models.into_iter().map(cart_item_from_model).collect())
    }

    async fn insert(&self, item: &NewCartItem) -> Result<CartItem, StoreServiceError> {
        let now = Utc::now();
        let model = cart_items::ActiveModel {
            id: Set(Uuid::now_v7()),
            user_id: Set(item.user_id),
            product_id: Set(Some(item.product_id)),
            variant: Set(item.variant.clone()),
            quantity: Set(item.quantity),
            product_name: Set(item.product_name.clone()),
            product_price_cents: Set(item.product_price_cents),
            product_image: Set(item.product_image.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        };
        match model.insert(&self.db).await {
            Ok(model) => Ok(cart_item_from_model(model)),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Err(StoreServiceError::Conflict)
            }
            Err(e) => Err(anyhow::Error::from(e).context("insert cart item").into()),
        }
    }

    async fn find_by_key(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        variant: &str,
    ) -> Result<Option<CartItem>, StoreServiceError> {
        // Duplicate-tolerant: when more than one row matches, take the one
        // the merge would pick as survivor.
        let model = cart_items::Entity::find()
            .filter(cart_items::Column::UserId.eq(user_id))
            .filter(cart_items::Column::ProductId.eq(product_id))
            .filter(cart_items::Column::Variant.eq(variant))
            .order_by_desc(cart_items::Column::UpdatedAt)
            .order_by_desc(cart_items::Column::Id)
            .one(&self.db)
            .await
            .context("find cart item by key")?;
        Ok(model.map(cart_item_from_model))
    }

    async fn update_for_add(
        &self,
        id: Uuid,
        user_id: Uuid,
        quantity: i32,
        product_price_cents: i64,
        product_image: Option<&str>,
    ) -> Result<Option<CartItem>, StoreServiceError> {
        let mut update = cart_items::Entity::update_many()
            .col_expr(cart_items::Column::Quantity, Expr::value(quantity))
            .col_expr(
                cart_items::Column::ProductPriceCents,
                Expr::value(product_price_cents),
            )
            .col_expr(cart_items::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(cart_items::Column::Id.eq(id))
            .filter(cart_items::Column::UserId.eq(user_id));
        if let Some(image) = product_image {
            update = update.col_expr(cart_items::Column::ProductImage, Expr::value(image));
        }
        let result = update
            .exec(&self.db)
            .await
            .context("update cart item quantity for add")?;
        if result.rows_affected == 0 {
            return Ok(None);
        }

        let model = cart_items::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("reload cart item after add")?;
        Ok(model.map(cart_item_from_model))
    }

    async fn set_quantity(
        &self,
        id: Uuid,
        user_id: Uuid,
        quantity: i32,
    ) -> Result<u64, StoreServiceError> {
        let result = cart_items::Entity::update_many()
            .col_expr(cart_items::Column::Quantity, Expr::value(quantity))
            .col_expr(cart_items::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(cart_items::Column::Id.eq(id))
            .filter(cart_items::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await
            .context("set cart item quantity")?;
        Ok(result.rows_affected)
    }

    async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<u64, StoreServiceError> {
        let result = cart_items::Entity::delete_many()
            .filter(cart_items::Column::Id.eq(id))
            .filter(cart_items::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await
            .context("delete cart item")?;
        Ok(result.rows_affected)
    }

    async fn clear(&self, user_id: Uuid) -> Result<u64, StoreServiceError> {
        let result = cart_items::Entity::delete_many()
            .filter(cart_items::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await
            .context("clear cart")?;
        Ok(result.rows_affected)
    }

    async fn apply_repair(
        &self,
        user_id: Uuid,
        repair: &CartRepair,
    ) -> Result<(), StoreServiceError> {
        let txn = self.db.begin().await.context("begin cart repair")?;
        if !repair.stale_ids.is_empty() {
            cart_items::Entity::delete_many()
                .filter(cart_items::Column::UserId.eq(user_id))
                .filter(cart_items::Column::Id.is_in(repair.stale_ids.iter().copied()))
                .exec(&txn)
                .await
                .context("delete duplicate cart rows")?;
        }
        if let Some(quantity) = repair.quantity {
            cart_items::Entity::update_many()
                .col_expr(cart_items::Column::Quantity, Expr::value(quantity))
                .col_expr(cart_items::Column::UpdatedAt, Expr::value(Utc::now()))
                .filter(cart_items::Column::Id.eq(repair.survivor_id))
                .filter(cart_items::Column::UserId.eq(user_id))
                .exec(&txn)
                .await
                .context("correct survivor quantity")?;
        }
        txn.commit().await.context("commit cart repair")?;
        Ok(())
    }
}

fn cart_item_from_model(model: cart_items::Model) -> CartItem {
    CartItem {
        id: model.id,
        user_id: model.user_id,
        product_id: model.product_id,
        variant: model.variant,
        quantity: model.quantity,
        product_name: model.product_name,
        product_price_cents: model.product_price_cents,
        product_image: model.product_image,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}
