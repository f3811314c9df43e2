use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use marquee_booking::is_email;
use marquee_shared::{UserAccount, UserProfile};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::AppError,
    middleware::auth::{AdminClaims, CustomerClaims, ADMIN_ROLE, CUSTOMER_ROLE},
    password::{hash_password, verify_password},
    state::AppState,
};

#[derive(Debug, Serialize)]
struct AuthResponse {
    token: String,
    user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<UserProfile>,
}

#[derive(Debug, Deserialize)]
struct AdminLoginRequest {
    api_key: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/guest", post(login_guest))
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/admin", post(login_admin))
}

fn validate_registration(req: &RegisterRequest) -> Result<(), AppError> {
    let invalid = |msg: &str| Err(AppError::ValidationError(msg.to_string()));

    let username = req.username.trim().chars().count();
    if !(3..=50).contains(&username) {
        return invalid("Username must be between 3 and 50 characters");
    }
    if !is_email(&req.email) || req.email.len() > 80 {
        return invalid("Email is not valid");
    }
    if !(6..=120).contains(&req.password.chars().count()) {
        return invalid("Password must be between 6 and 120 characters");
    }
    let too_long = |name: &Option<String>| name.as_deref().is_some_and(|n| n.chars().count() > 50);
    if too_long(&req.first_name) || too_long(&req.last_name) {
        return invalid("Names must be at most 50 characters");
    }
    Ok(())
}

fn account_token(state: &AppState, account: &UserAccount) -> Result<AuthResponse, AppError> {
    let claims = CustomerClaims {
        sub: account.id.clone(),
        email: Some(account.email.clone()),
        role: CUSTOMER_ROLE.to_owned(),
        exp: expires_at(state),
    };

    Ok(AuthResponse {
        token: sign(state, &claims)?,
        user_id: claims.sub,
        user: Some(UserProfile::from(account)),
    })
}

fn expires_at(state: &AppState) -> usize {
    (Utc::now() + Duration::seconds(state.auth.expiration as i64)).timestamp() as usize
}

fn sign<T: Serialize>(state: &AppState, claims: &T) -> Result<String, AppError> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(state.auth.secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(format!("Token encoding failed: {}", e)))
}

async fn login_guest(State(state): State<AppState>) -> Result<Json<AuthResponse>, AppError> {
    let claims = CustomerClaims {
        sub: format!("guest-{}", Uuid::new_v4()),
        email: None,
        role: CUSTOMER_ROLE.to_owned(),
        exp: expires_at(&state),
    };

    let token = sign(&state, &claims)?;
    tracing::debug!(user_id = %claims.sub, "Issued guest token");
    Ok(Json(AuthResponse {
        token,
        user_id: claims.sub,
        user: None,
    }))
}

/// POST /v1/auth/register
async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    validate_registration(&req)?;

    let account = UserAccount {
        id: format!("user-{}", Uuid::new_v4()),
        username: req.username.trim().to_string(),
        email: req.email.trim().to_string(),
        first_name: req.first_name,
        last_name: req.last_name,
        password_hash: hash_password(&req.password)?,
        created_at: Utc::now(),
    };
    state.users.create(&account).await?;

    Ok((StatusCode::CREATED, Json(account_token(&state, &account)?)))
}

/// POST /v1/auth/login
async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let account = state.users.find_by_username(req.username.trim()).await?;

    match account {
        Some(account) if verify_password(&req.password, &account.password_hash) => {
            tracing::debug!(user_id = %account.id, "User logged in");
            Ok(Json(account_token(&state, &account)?))
        }
        _ => {
            tracing::warn!(username = %req.username, "Rejected login");
            Err(AppError::AuthenticationError("Invalid credentials".to_string()))
        }
    }
}

async fn login_admin(
    State(state): State<AppState>,
    Json(req): Json<AdminLoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    if req.api_key != state.auth.admin_api_key {
        tracing::warn!("Rejected admin login with a wrong API key");
        return Err(AppError::AuthenticationError("Invalid admin API key".to_string()));
    }

    let claims = AdminClaims {
        sub: "admin".to_owned(),
        role: ADMIN_ROLE.to_owned(),
        exp: expires_at(&state),
    };

    let token = sign(&state, &claims)?;
    Ok(Json(AuthResponse {
        token,
        user_id: claims.sub,
        user: None,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> RegisterRequest {
        RegisterRequest {
            username: "ana".to_string(),
            email: "ana@example.com".to_string(),
            password: "popcorn".to_string(),
            first_name: Some("Ana".to_string()),
            last_name: None,
        }
    }

    #[test]
    fn test_registration_rules() {
        assert!(validate_registration(&request()).is_ok());

        let mut short = request();
        short.username = " ab ".to_string();
        assert!(validate_registration(&short).is_err());

        let mut email = request();
        email.email = "ana.example.com".to_string();
        assert!(validate_registration(&email).is_err());

        let mut password = request();
        password.password = "12345".to_string();
        assert!(validate_registration(&password).is_err());

        let mut name = request();
        name.last_name = Some("x".repeat(51));
        assert!(validate_registration(&name).is_err());
    }
}
