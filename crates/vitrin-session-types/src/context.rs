//! Gate-injected request context extractor.

use axum::extract::FromRequestParts;
use http::StatusCode;
use http::request::Parts;
use uuid::Uuid;

use vitrin_domain::user::UserRole;

/// Identity resolved by the session gate for the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub user_id: Uuid,
    pub role: UserRole,
}

/// Per-request context inserted by the session gate as a request extension.
///
/// Downstream handlers extract this instead of re-parsing cookies or
/// re-deriving the path. `user` is `None` for anonymous callers on paths
/// the gate allows through unauthenticated.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Request path as the gate resolved it (no query string).
    pub path: String,
    pub user: Option<SessionUser>,
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    // axum-core 0.5 defines this as `fn -> impl Future + Send` (not `async fn`).
    // In Rust 1.82+ precise capturing, `async fn` captures lifetimes differently,
    // causing E0195. Fix: extract values synchronously, return a 'static async move block.
    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let context = parts.extensions.get::<RequestContext>().cloned();

        async move {
            // Absent only when a route was mounted outside the gate — a wiring
            // bug, not a client error.
            context.ok_or(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
