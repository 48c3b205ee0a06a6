use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use vitrin_domain::user::UserRole;
use vitrin_session_types::cookie::{ACCESS_TOKEN_EXP, REFRESH_TOKEN_EXP};

use crate::domain::repository::ProfileRepository;
use crate::error::StoreServiceError;

/// JWT claims for both access and refresh tokens.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub role: u8,
    pub exp: u64,
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before UNIX epoch")
        .as_secs()
}

pub fn issue_access_token(
    user_id: Uuid,
    role: UserRole,
    secret: &str,
) -> Result<(String, u64), StoreServiceError> {
    let exp = now_secs() + ACCESS_TOKEN_EXP;
    let claims = TokenClaims {
        sub: user_id.to_string(),
        role: role.as_u8(),
        exp,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| StoreServiceError::Internal(e.into()))?;
    Ok((token, exp))
}

pub fn issue_refresh_token(
    user_id: Uuid,
    role: UserRole,
    secret: &str,
) -> Result<String, StoreServiceError> {
    let exp = now_secs() + REFRESH_TOKEN_EXP;
    let claims = TokenClaims {
        sub: user_id.to_string(),
        role: role.as_u8(),
        exp,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| StoreServiceError::Internal(e.into()))
}

/// Validate a token and return its claims. Used for the refresh flow.
pub fn validate_token(token: &str, secret: &str) -> Result<TokenClaims, StoreServiceError> {
    let mut validation = Validation::new(jsonwebtoken::Algorithm::HS256);
    validation.validate_exp = true;
    validation.required_spec_claims.clear();
    validation.set_required_spec_claims(&["exp", "sub"]);

    let data = decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|_| StoreServiceError::InvalidSession)?;

    Ok(data.claims)
}

// ── RefreshSession ───────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct RefreshSessionOutput {
    pub user_id: Uuid,
    pub role: UserRole,
    pub access_token: String,
    pub access_token_exp: u64,
    pub refresh_token: String,
}

/// Exchange a valid refresh token for a fresh access+refresh pair.
///
/// The role on the new tokens comes from the profiles store, not from the
/// old claims — a role change takes effect at the next refresh at the
/// latest. A missing profile (deleted account) invalidates the session.
pub struct RefreshSessionUseCase<P: ProfileRepository> {
    pub profiles: P,
    pub jwt_secret: String,
}

impl<P: ProfileRepository> RefreshSessionUseCase<P> {
    pub async fn execute(
        &self,
        refresh_token_value: &str,
    ) -> Result<RefreshSessionOutput, StoreServiceError> {
        // Validate refresh token (sig + exp); an expired access token is
        // irrelevant here.
        let claims = validate_token(refresh_token_value, &self.jwt_secret)?;

        let user_id = claims
            .sub
            .parse::<Uuid>()
            .map_err(|_| StoreServiceError::InvalidSession)?;

        let role = self
            .profiles
            .find_role(user_id)
            .await?
            .ok_or(StoreServiceError::InvalidSession)?;

        let (access_token, access_token_exp) =
            issue_access_token(user_id, role, &self.jwt_secret)?;
        let refresh_token = issue_refresh_token(user_id, role, &self.jwt_secret)?;

        Ok(RefreshSessionOutput {
            user_id,
            role,
            access_token,
            access_token_exp,
            refresh_token,
        })
    }
}
