use sea_orm::DatabaseConnection;

use crate::infra::db::{DbCartItemRepository, DbProfileRepository};

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub jwt_secret: String,
    pub cookie_domain: String,
}

impl AppState {
    pub fn cart_repo(&self) -> DbCartItemRepository {
        DbCartItemRepository {
            db: self.db.clone(),
        }
    }

    pub fn profile_repo(&self) -> DbProfileRepository {
        DbProfileRepository {
            db: self.db.clone(),
        }
    }
}
