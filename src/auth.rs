use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Duration;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::{
    self, GUEST_SENTINEL, MAX_HANDLE_LENGTH, MIN_HANDLE_LENGTH, MIN_PASSWORD_LENGTH,
};
use crate::core::db::Db;
use crate::core::errors::ApiError;
use crate::core::helpers::{
    bearer_token, hash_password, now, sanitize_text, valid_email, verify_password,
};
use crate::models::models::{Principal, Profile, User};

const WELCOME_BIO: &str = "Welcome to Ripple!";

/// Payload carried in a signed bearer token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub handle: String,
    pub iat: i64,
    pub exp: i64,
}

pub fn issue_token(user: &User) -> Result<String, ApiError> {
    let issued = now();
    let claims = Claims {
        sub: user.id,
        handle: user.handle.clone(),
        iat: issued.timestamp(),
        exp: (issued + Duration::hours(config::token_expiration_hours())).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config::jwt_secret().as_bytes()),
    )
    .map_err(|e| ApiError::Internal(format!("failed to sign token: {}", e)))
}

fn verify_token(token: &str) -> Result<Claims, ApiError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config::jwt_secret().as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| ApiError::InvalidToken)
}

/// Resolve a bearer credential to the acting principal.
///
/// Missing credential or the guest sentinel yields the fixed guest principal
/// without touching storage; callers are downgraded, never rejected. A signed
/// token is verified and its subject looked up; a valid token whose user no
/// longer exists fails as unauthenticated.
pub fn resolve(db: &Db, credential: Option<&str>) -> Result<Principal, ApiError> {
    let token = match credential {
        None => return Ok(Principal::guest()),
        Some(t) if t == GUEST_SENTINEL => return Ok(Principal::guest()),
        Some(t) => t,
    };

    let claims = verify_token(token)?;
    let state = db.read();
    let user = state.users.get(&claims.sub).ok_or(ApiError::Unauthenticated)?;
    Ok(Principal::from(user))
}

/// Resolve the principal for an incoming request from its Authorization
/// header. Every handler goes through here before doing anything else.
pub fn authenticate(db: &Db, req: &HttpRequest) -> Result<Principal, ApiError> {
    resolve(db, bearer_token(req).as_deref())
}

/// Outcome of the login-or-provision policy, tagged for observability.
/// Both branches produce the same HTTP response shape.
#[derive(Debug)]
pub enum LoginOutcome {
    Authenticated(User),
    Created(User),
}

/// Login with an unknown handle never fails with "not found": it provisions
/// a fresh user (plus empty profile) from the submitted credentials. A known
/// handle must still match its password.
pub fn login_or_create(db: &Db, handle: &str, password: &str) -> Result<LoginOutcome, ApiError> {
    let mut state = db.write();

    if let Some(user) = state.user_by_handle(handle) {
        if verify_password(password, &user.password) {
            return Ok(LoginOutcome::Authenticated(user.clone()));
        }
        return Err(ApiError::Unauthenticated);
    }

    // Derive an email when the handle isn't one already.
    let email = if handle.contains('@') {
        handle.to_string()
    } else {
        format!("{}@example.com", handle)
    };
    let first_name = handle.split('@').next().unwrap_or(handle).to_string();

    let id = state.alloc_user_id();
    let user = User {
        id,
        handle: handle.to_string(),
        email,
        password: hash_password(password)?,
        first_name,
        last_name: String::new(),
        created_at: now(),
    };
    state.users.insert(id, user.clone());
    state.profiles.insert(
        id,
        Profile {
            bio: Some(WELCOME_BIO.to_string()),
            avatar: None,
        },
    );

    Ok(LoginOutcome::Created(user))
}

// === HTTP handlers ===

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub handle: String,
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub handle: String,
    pub password: String,
}

pub async fn register(
    db: web::Data<Db>,
    body: web::Json<RegisterRequest>,
) -> Result<HttpResponse, ApiError> {
    let handle = sanitize_text(body.handle.trim());
    if handle.len() < MIN_HANDLE_LENGTH || handle.len() > MAX_HANDLE_LENGTH {
        return Err(ApiError::Validation(
            "Handle must be 3-50 characters".to_string(),
        ));
    }
    if !valid_email(&body.email) {
        return Err(ApiError::Validation(
            "Please provide a valid email".to_string(),
        ));
    }
    if body.password.len() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::Validation(
            "Password must be at least 6 characters".to_string(),
        ));
    }

    let mut state = db.write();
    if state
        .users
        .values()
        .any(|u| u.handle == handle || u.email == body.email)
    {
        return Err(ApiError::Conflict(
            "Handle or email already exists".to_string(),
        ));
    }

    let id = state.alloc_user_id();
    let user = User {
        id,
        handle,
        email: body.email.clone(),
        password: hash_password(&body.password)?,
        first_name: body.first_name.clone().unwrap_or_default(),
        last_name: body.last_name.clone().unwrap_or_default(),
        created_at: now(),
    };
    state.users.insert(id, user);
    state.profiles.insert(
        id,
        Profile {
            bio: Some(WELCOME_BIO.to_string()),
            avatar: None,
        },
    );

    tracing::info!(user_id = id, "registered user");
    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "User created successfully",
        "user_id": id,
    })))
}

pub async fn login(
    db: web::Data<Db>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    if body.handle.trim().is_empty() {
        return Err(ApiError::Validation("Handle is required".to_string()));
    }
    if body.password.is_empty() {
        return Err(ApiError::Validation("Password is required".to_string()));
    }

    let outcome = login_or_create(&db, body.handle.trim(), &body.password)?;
    let user = match &outcome {
        LoginOutcome::Authenticated(user) => {
            tracing::info!(user_id = user.id, "login");
            user
        }
        LoginOutcome::Created(user) => {
            tracing::info!(user_id = user.id, "login auto-provisioned user");
            user
        }
    };

    let token = issue_token(user)?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Login successful",
        "token": token,
        "user": user,
    })))
}
