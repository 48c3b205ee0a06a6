use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use vitrin_session_types::context::{RequestContext, SessionUser};

use crate::domain::types::CartItem;
use crate::error::StoreServiceError;
use crate::state::AppState;
use crate::usecase::cart::{
    AddItemInput, AddItemUseCase, ClearCartUseCase, ListCartUseCase, RemoveItemUseCase,
    UpdateItemUseCase, repair_cart,
};

// ── Response types ───────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct CartItemResponse {
    pub id: Uuid,
    pub product_id: Option<Uuid>,
    pub variant: String,
    pub quantity: i32,
    pub product_name: String,
    pub product_price_cents: i64,
    pub product_image: Option<String>,
    #[serde(serialize_with = "vitrin_core::serde::to_rfc3339_ms")]
    pub created_at: chrono::DateTime<chrono::Utc>,
    #[serde(serialize_with = "vitrin_core::serde::to_rfc3339_ms")]
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<CartItem> for CartItemResponse {
    fn from(item: CartItem) -> Self {
        CartItemResponse {
            id: item.id,
            product_id: item.product_id,
            variant: item.variant,
            quantity: item.quantity,
            product_name: item.product_name,
            product_price_cents: item.product_price_cents,
            product_image: item.product_image,
            created_at: item.created_at,
            updated_at: item.updated_at,
        }
    }
}

fn require_user(ctx: RequestContext) -> Result<SessionUser, StoreServiceError> {
    ctx.user.ok_or(StoreServiceError::NotAuthenticated)
}

// ── GET /cart ────────────────────────────────────────────────────────────────

pub async fn list_cart(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> Result<Json<Vec<CartItemResponse>>, StoreServiceError> {
    let user = require_user(ctx)?;

    let uc = ListCartUseCase {
        repo: state.cart_repo(),
    };
    let out = uc.execute(user.user_id).await?;

    // Heal duplicates after responding. The merged view above is already
    // correct; whether this write lands does not change what the caller sees.
    if !out.repairs.is_empty() {
        let repo = state.cart_repo();
        let user_id = user.user_id;
        let repairs = out.repairs;
        tokio::spawn(async move { repair_cart(&repo, user_id, repairs).await });
    }

    Ok(Json(out.items.into_iter().map(Into::into).collect()))
}

// ── POST /cart ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct AddItemRequest {
    pub product_id: Uuid,
    pub variant: String,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
    pub product_name: String,
    pub product_price_cents: i64,
    pub product_image: Option<String>,
}

fn default_quantity() -> i32 {
    1
}

pub async fn add_item(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(body): Json<AddItemRequest>,
) -> Result<(StatusCode, Json<CartItemResponse>), StoreServiceError> {
    let user = require_user(ctx)?;

    let uc = AddItemUseCase {
        repo: state.cart_repo(),
    };
    let item = uc
        .execute(
            user.user_id,
            AddItemInput {
                product_id: body.product_id,
                variant: body.variant,
                quantity: body.quantity,
                product_name: body.product_name,
                product_price_cents: body.product_price_cents,
                product_image: body.product_image,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(item.into())))
}

// ── PATCH /cart/items/{id} ───────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: i32,
}

pub async fn update_item(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateItemRequest>,
) -> Result<StatusCode, StoreServiceError> {
    let user = require_user(ctx)?;

    let uc = UpdateItemUseCase {
        repo: state.cart_repo(),
    };
    uc.execute(user.user_id, id, body.quantity).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── DELETE /cart/items/{id} ──────────────────────────────────────────────────

pub async fn remove_item(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, StoreServiceError> {
    let user = require_user(ctx)?;

    let uc = RemoveItemUseCase {
        repo: state.cart_repo(),
    };
    uc.execute(user.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── DELETE /cart ─────────────────────────────────────────────────────────────

pub async fn clear_cart(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> Result<StatusCode, StoreServiceError> {
    let user = require_user(ctx)?;

    let uc = ClearCartUseCase {
        repo: state.cart_repo(),
    };
    uc.execute(user.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
