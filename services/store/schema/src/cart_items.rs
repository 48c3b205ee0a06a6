use sea_orm::entity::prelude::*;

/// One product+variant line in a user's cart.
///
/// `product_id` is nullable to tolerate orphaned/legacy rows. The catalog
/// fields are a denormalized snapshot taken at add time. Intended invariant:
/// one row per `(user_id, product_id, variant)` — enforced by a unique index
/// for non-NULL product ids, healed by the reconciler otherwise.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "cart_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_id: Option<Uuid>,
    pub variant: String,
    pub quantity: i32,
    pub product_name: String,
    pub product_price_cents: i64,
    pub product_image: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::profiles::Entity",
        from = "Column::UserId",
        to = "super::profiles::Column::Id"
    )]
    Profile,
}

impl Related<super::profiles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Profile.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
