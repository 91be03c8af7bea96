// Validation limits
pub const MIN_HANDLE_LENGTH: usize = 3;
pub const MAX_HANDLE_LENGTH: usize = 50;
pub const MIN_PASSWORD_LENGTH: usize = 6;
pub const MAX_POST_LENGTH: usize = 5000;
pub const MAX_BIO_LENGTH: usize = 500;

// Reserved principal id for unauthenticated callers. The user id sequence
// starts above it, so no registered user can ever collide with the guest.
pub const GUEST_USER_ID: i64 = 1;

// Literal bearer value that resolves to the guest principal.
pub const GUEST_SENTINEL: &str = "guest-token";

pub fn token_expiration_hours() -> i64 {
    std::env::var("RIPPLE_TOKEN_EXPIRATION_HOURS")
        .ok()
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(24)
}

pub fn jwt_secret() -> String {
    std::env::var("RIPPLE_JWT_SECRET")
        .unwrap_or_else(|_| "ripple-dev-secret-change-in-production".to_string())
}

pub fn bind_address() -> String {
    std::env::var("RIPPLE_BIND").unwrap_or_else(|_| "0.0.0.0:8000".to_string())
}
