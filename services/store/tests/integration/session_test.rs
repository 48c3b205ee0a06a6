use uuid::Uuid;

use vitrin_domain::user::UserRole;
use vitrin_store::error::StoreServiceError;
use vitrin_store::usecase::session::{
    RefreshSessionUseCase, issue_access_token, issue_refresh_token, validate_token,
};

use crate::helpers::{MockProfileRepo, TEST_JWT_SECRET};

// ── issue / validate ─────────────────────────────────────────────────────────

#[tokio::test]
async fn should_issue_access_token_that_validates_successfully() {
    let user_id = Uuid::new_v4();
    let (token, exp) = issue_access_token(user_id, UserRole::Customer, TEST_JWT_SECRET).unwrap();

    assert!(!token.is_empty());
    assert!(exp > 0);

    let claims = validate_token(&token, TEST_JWT_SECRET).unwrap();
    assert_eq!(claims.sub, user_id.to_string());
    assert_eq!(claims.role, UserRole::Customer.as_u8());
    assert_eq!(claims.exp, exp);
}

#[tokio::test]
async fn should_reject_token_signed_with_wrong_secret() {
    let user_id = Uuid::new_v4();
    let (token, _) = issue_access_token(user_id, UserRole::Customer, TEST_JWT_SECRET).unwrap();

    let result = validate_token(&token, "wrong-secret");
    assert!(
        matches!(result, Err(StoreServiceError::InvalidSession)),
        "expected InvalidSession, got {result:?}"
    );
}

#[tokio::test]
async fn should_reject_invalid_token_string() {
    let result = validate_token("not-a-jwt", TEST_JWT_SECRET);
    assert!(
        matches!(result, Err(StoreServiceError::InvalidSession)),
        "expected InvalidSession, got {result:?}"
    );
}

#[tokio::test]
async fn should_issue_refresh_token_that_validates_successfully() {
    let user_id = Uuid::new_v4();
    let token = issue_refresh_token(user_id, UserRole::Admin, TEST_JWT_SECRET).unwrap();

    assert!(!token.is_empty());

    let claims = validate_token(&token, TEST_JWT_SECRET).unwrap();
    assert_eq!(claims.sub, user_id.to_string());
    assert_eq!(claims.role, UserRole::Admin.as_u8());
}

// ── RefreshSessionUseCase ────────────────────────────────────────────────────

#[tokio::test]
async fn should_issue_fresh_pair_for_valid_refresh_token() {
    let user_id = Uuid::new_v4();
    let refresh = issue_refresh_token(user_id, UserRole::Customer, TEST_JWT_SECRET).unwrap();

    let usecase = RefreshSessionUseCase {
        profiles: MockProfileRepo::new(vec![(user_id, UserRole::Customer)]),
        jwt_secret: TEST_JWT_SECRET.to_owned(),
    };
    let out = usecase.execute(&refresh).await.unwrap();

    assert_eq!(out.user_id, user_id);
    assert_eq!(out.role, UserRole::Customer);
    assert!(!out.access_token.is_empty());
    assert!(!out.refresh_token.is_empty());

    let claims = validate_token(&out.access_token, TEST_JWT_SECRET).unwrap();
    assert_eq!(claims.sub, user_id.to_string());
}

#[tokio::test]
async fn should_take_role_from_profile_store_not_old_claims() {
    let user_id = Uuid::new_v4();
    // Token minted while the user was a customer; the profile row has been
    // promoted since.
    let refresh = issue_refresh_token(user_id, UserRole::Customer, TEST_JWT_SECRET).unwrap();

    let usecase = RefreshSessionUseCase {
        profiles: MockProfileRepo::new(vec![(user_id, UserRole::Admin)]),
        jwt_secret: TEST_JWT_SECRET.to_owned(),
    };
    let out = usecase.execute(&refresh).await.unwrap();

    assert_eq!(out.role, UserRole::Admin);
    let claims = validate_token(&out.access_token, TEST_JWT_SECRET).unwrap();
    assert_eq!(claims.role, UserRole::Admin.as_u8());
}

#[tokio::test]
async fn should_invalidate_session_when_profile_is_gone() {
    let user_id = Uuid::new_v4();
    let refresh = issue_refresh_token(user_id, UserRole::Customer, TEST_JWT_SECRET).unwrap();

    let usecase = RefreshSessionUseCase {
        profiles: MockProfileRepo::empty(),
        jwt_secret: TEST_JWT_SECRET.to_owned(),
    };
    let result = usecase.execute(&refresh).await;

    assert!(matches!(result, Err(StoreServiceError::InvalidSession)));
}

#[tokio::test]
async fn should_reject_refresh_with_malformed_token() {
    let usecase = RefreshSessionUseCase {
        profiles: MockProfileRepo::empty(),
        jwt_secret: TEST_JWT_SECRET.to_owned(),
    };
    let result = usecase.execute("not-a-jwt").await;

    assert!(matches!(result, Err(StoreServiceError::InvalidSession)));
}
