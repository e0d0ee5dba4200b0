use axum::{
    extract::{FromRef, State},
    routing::{get, post},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, PublicUser, RegisterRequest},
        extractors::AuthUser,
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        repo_types::User,
    },
    error::{ApiError, ApiResult},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn validate_registration(username: &str, email: &str, password: &str) -> ApiResult<()> {
    let len = username.chars().count();
    if !(3..=30).contains(&len) {
        return Err(ApiError::Validation(
            "Username must be between 3 and 30 characters".into(),
        ));
    }
    if !is_valid_email(email) {
        return Err(ApiError::Validation("Invalid email".into()));
    }
    if password.chars().count() < 6 {
        return Err(ApiError::Validation(
            "Password must be at least 6 characters".into(),
        ));
    }
    Ok(())
}

fn public(user: &User) -> PublicUser {
    PublicUser {
        id: user.id,
        username: user.username.clone(),
        email: user.email.clone(),
    }
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> ApiResult<Json<AuthResponse>> {
    payload.username = payload.username.trim().to_string();
    payload.email = payload.email.trim().to_lowercase();

    if let Err(e) = validate_registration(&payload.username, &payload.email, &payload.password) {
        warn!(email = %payload.email, "registration rejected: {e}");
        return Err(e);
    }

    // Pre-checks give a friendly message; the unique constraints remain the
    // backstop for concurrent registrations.
    if User::find_by_username(&state.db, &payload.username)
        .await
        .map_err(ApiError::from)?
        .is_some()
    {
        return Err(ApiError::Duplicate("Username already taken".into()));
    }
    if User::find_by_email(&state.db, &payload.email)
        .await
        .map_err(ApiError::from)?
        .is_some()
    {
        return Err(ApiError::Duplicate("Email already registered".into()));
    }

    let hash = hash_password(&payload.password)?;

    let user = User::create(&state.db, &payload.username, &payload.email, &hash)
        .await
        .map_err(|e| match ApiError::from(e) {
            ApiError::Duplicate(_) => {
                ApiError::Duplicate("Username or email already registered".into())
            }
            other => other,
        })?;

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(user.id)?;

    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok(Json(AuthResponse {
        token,
        user: public(&user),
    }))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    payload.email = payload.email.trim().to_lowercase();

    // Unknown email and wrong password produce the same response so the
    // endpoint cannot be used to enumerate accounts.
    let user = match User::find_by_email(&state.db, &payload.email)
        .await
        .map_err(ApiError::from)?
    {
        Some(u) => u,
        None => {
            warn!(email = %payload.email, "login unknown email");
            return Err(ApiError::Auth("Invalid credentials".into()));
        }
    };

    let ok = verify_password(&payload.password, &user.password_hash)?;
    if !ok {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::Auth("Invalid credentials".into()));
    }

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(user.id)?;

    info!(user_id = %user.id, "user logged in");
    Ok(Json(AuthResponse {
        token,
        user: public(&user),
    }))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Json<PublicUser>> {
    let user = User::find_by_id(&state.db, user_id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::Auth("User not found".into()))?;

    Ok(Json(public(&user)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shape_validation() {
        assert!(is_valid_email("alice@x.com"));
        assert!(is_valid_email("a.b+c@sub.example.org"));
        assert!(!is_valid_email("alice"));
        assert!(!is_valid_email("alice@"));
        assert!(!is_valid_email("@x.com"));
        assert!(!is_valid_email("a b@x.com"));
        assert!(!is_valid_email("alice@x"));
    }

    #[test]
    fn registration_shape_checks() {
        validate_registration("alice", "alice@x.com", "secret1").expect("valid registration");

        assert!(matches!(
            validate_registration("al", "alice@x.com", "secret1"),
            Err(ApiError::Validation(_))
        ));
        assert!(matches!(
            validate_registration("alice", "not-an-email", "secret1"),
            Err(ApiError::Validation(_))
        ));
        assert!(matches!(
            validate_registration("alice", "alice@x.com", "short"),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn password_length_counts_characters_not_bytes() {
        // Six bytes but only three characters
        assert!(matches!(
            validate_registration("alice", "alice@x.com", "ééé"),
            Err(ApiError::Validation(_))
        ));
        // Six multibyte characters are enough
        validate_registration("alice", "alice@x.com", "éééééé").expect("six chars is enough");
    }

    #[test]
    fn public_user_never_carries_the_hash() {
        let user = User {
            id: uuid::Uuid::new_v4(),
            username: "alice".into(),
            email: "alice@x.com".into(),
            password_hash: "$argon2id$notarealhash".into(),
            created_at: time::OffsetDateTime::now_utc(),
        };
        let json = serde_json::to_string(&public(&user)).unwrap();
        assert!(json.contains("alice@x.com"));
        assert!(!json.contains("argon2"));
    }

    #[test]
    fn user_row_serialization_skips_the_hash() {
        let user = User {
            id: uuid::Uuid::new_v4(),
            username: "bob".into(),
            email: "bob@x.com".into(),
            password_hash: "$argon2id$notarealhash".into(),
            created_at: time::OffsetDateTime::now_utc(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("argon2"));
    }
}
