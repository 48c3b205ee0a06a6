//! Session gate: per-request identity resolution and path-based access
//! control, applied as router-wide middleware before any handler runs.

pub mod policy;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;

use vitrin_session_types::context::{RequestContext, SessionUser};
use vitrin_session_types::cookie::{
    VITRIN_ACCESS_TOKEN, VITRIN_REFRESH_TOKEN, set_access_token_cookie, set_refresh_token_cookie,
};
use vitrin_session_types::token::validate_access_token;

use crate::domain::repository::ProfileRepository;
use crate::gate::policy::Decision;
use crate::usecase::session::{RefreshSessionOutput, RefreshSessionUseCase};

/// State for the gate middleware, separate from [`crate::state::AppState`]
/// so tests can drive the gate with a mock profile store.
#[derive(Clone)]
pub struct GateState<P> {
    pub profiles: P,
    pub jwt_secret: String,
    pub cookie_domain: String,
}

/// Identity resolution result for one request.
pub struct ResolvedSession {
    pub user: Option<SessionUser>,
    /// Present when an expiring session was transparently renewed; the new
    /// cookies must be propagated on the outgoing response.
    pub refreshed: Option<RefreshSessionOutput>,
}

impl ResolvedSession {
    fn anonymous() -> Self {
        Self {
            user: None,
            refreshed: None,
        }
    }
}

/// Resolve the caller's identity from the session cookies.
///
/// The access token yields the user id; the authoritative role comes from
/// the profiles store on every call, so role changes do not wait for token
/// expiry. A missing/expired/malformed access token falls back to the
/// refresh-token path. Every failure mode — bad token, missing profile,
/// store error — degrades to anonymous; untrusted input never errors.
pub async fn resolve_session<P>(jar: &CookieJar, profiles: &P, jwt_secret: &str) -> ResolvedSession
where
    P: ProfileRepository + Clone,
{
    if let Some(cookie) = jar.get(VITRIN_ACCESS_TOKEN) {
        if let Ok(info) = validate_access_token(cookie.value(), jwt_secret) {
            return match profiles.find_role(info.user_id).await {
                Ok(Some(role)) => ResolvedSession {
                    user: Some(SessionUser {
                        user_id: info.user_id,
                        role,
                    }),
                    refreshed: None,
                },
                Ok(None) => ResolvedSession::anonymous(),
                Err(e) => {
                    tracing::warn!(error = %e, user_id = %info.user_id, "role lookup failed, treating request as anonymous");
                    ResolvedSession::anonymous()
                }
            };
        }
    }

    let Some(refresh) = jar.get(VITRIN_REFRESH_TOKEN) else {
        return ResolvedSession::anonymous();
    };

    let usecase = RefreshSessionUseCase {
        profiles: profiles.clone(),
        jwt_secret: jwt_secret.to_owned(),
    };
    match usecase.execute(refresh.value()).await {
        Ok(out) => ResolvedSession {
            user: Some(SessionUser {
                user_id: out.user_id,
                role: out.role,
            }),
            refreshed: Some(out),
        },
        Err(e) => {
            tracing::debug!(error = %e, "session refresh failed, treating request as anonymous");
            ResolvedSession::anonymous()
        }
    }
}

/// Router-wide middleware. Apply with
/// `axum::middleware::from_fn_with_state(gate_state, session_gate::<P>)`.
pub async fn session_gate<P>(
    State(gate): State<GateState<P>>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response
where
    P: ProfileRepository + Clone + Send + Sync + 'static,
{
    let path = req.uri().path().to_owned();
    if policy::is_bypassed(&path) {
        return next.run(req).await;
    }

    let resolved = resolve_session(&jar, &gate.profiles, &gate.jwt_secret).await;

    let original = match req.uri().query() {
        Some(query) => format!("{path}?{query}"),
        None => path.clone(),
    };
    let decision = policy::authorize(&path, resolved.user.as_ref(), &original);

    // Renewed cookies ride on redirects too — whatever the client requests
    // next must carry the fresh session.
    let mut jar = jar;
    if let Some(ref refreshed) = resolved.refreshed {
        jar = set_access_token_cookie(
            jar,
            refreshed.access_token.clone(),
            gate.cookie_domain.clone(),
        );
        jar = set_refresh_token_cookie(
            jar,
            refreshed.refresh_token.clone(),
            gate.cookie_domain.clone(),
        );
    }

    match decision {
        Decision::Redirect(location) => (jar, Redirect::temporary(&location)).into_response(),
        Decision::Allow => {
            req.extensions_mut().insert(RequestContext {
                path,
                user: resolved.user,
            });
            let response = next.run(req).await;
            (jar, response).into_response()
        }
    }
}
