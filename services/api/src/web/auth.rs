//! services/api/src/web/auth.rs
//!
//! Authentication endpoints: signup, email verification, signin, logout,
//! and the password-reset pair. Handlers validate input, delegate to the
//! core auth flow, and manage the session cookie.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::error::ApiError;
use crate::web::response::SuccessBody;
use crate::web::state::AppState;
use crate::web::token::{create_token, COOKIE_MAX_AGE_SECONDS};
use notes_core::domain::User;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, Validate, ToSchema)]
pub struct SignupRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(custom(function = "validate_password_strength"))]
    pub password: String,
}

#[derive(Deserialize, Validate, ToSchema)]
pub struct VerifyEmailRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(custom(function = "validate_otp"))]
    pub otp: String,
}

#[derive(Deserialize, Validate, ToSchema)]
pub struct SigninRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Deserialize, Validate, ToSchema)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
}

#[derive(Deserialize, Validate, ToSchema)]
pub struct ResetPasswordRequest {
    #[validate(custom(function = "validate_password_strength"))]
    pub new_password: String,
    #[validate(custom(function = "validate_password_strength"))]
    pub confirm_new_password: String,
}

#[derive(Serialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub is_verified: bool,
    #[schema(value_type = Option<String>)]
    pub last_login: Option<chrono::DateTime<chrono::Utc>>,
    #[schema(value_type = String)]
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            is_verified: u.is_verified,
            last_login: u.last_login,
            created_at: u.created_at,
        }
    }
}

/// Returned by verify-email and signin alongside the session cookie.
#[derive(Serialize, ToSchema)]
pub struct SessionResponse {
    pub user: UserResponse,
    pub token: String,
}

//=========================================================================================
// Validation helpers
//=========================================================================================

const PASSWORD_SPECIALS: &str = "@$!%*?&";

fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    let long_enough = password.len() >= 8;
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password.chars().any(|c| PASSWORD_SPECIALS.contains(c));

    if long_enough && has_lower && has_upper && has_digit && has_special {
        Ok(())
    } else {
        let mut err = ValidationError::new("password_strength");
        err.message = Some(Cow::Borrowed(
            "Password must be at least 8 characters and contain at least one uppercase letter, \
             one lowercase letter, one number, and one special character",
        ));
        Err(err)
    }
}

fn validate_otp(otp: &str) -> Result<(), ValidationError> {
    if otp.len() == 6 && otp.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("otp");
        err.message = Some(Cow::Borrowed("OTP must be 6 digits"));
        Err(err)
    }
}

//=========================================================================================
// Cookie helpers
//=========================================================================================

fn session_cookie(token: &str) -> String {
    format!(
        "token={}; HttpOnly; Secure; SameSite=Strict; Path=/; Max-Age={}",
        token, COOKIE_MAX_AGE_SECONDS
    )
}

fn clear_session_cookie() -> String {
    "token=; HttpOnly; Secure; SameSite=Strict; Path=/; Max-Age=0".to_string()
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /api/v1/auth/signup - Register a new, unverified account
#[utoipa::path(
    post,
    path = "/api/v1/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User created successfully", body = UserResponse),
        (status = 400, description = "Invalid input or duplicate email"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()?;
    let user = state.auth.signup(&req.email, &req.password).await?;
    Ok((
        StatusCode::CREATED,
        Json(SuccessBody::new(
            "User created successfully",
            UserResponse::from(user),
        )),
    ))
}

/// POST /api/v1/auth/verify-email - Redeem the one-time verification code
#[utoipa::path(
    post,
    path = "/api/v1/auth/verify-email",
    request_body = VerifyEmailRequest,
    responses(
        (status = 200, description = "User verified successfully", body = SessionResponse),
        (status = 400, description = "Invalid, expired, or already used code"),
        (status = 404, description = "Unknown email")
    )
)]
pub async fn verify_email_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<VerifyEmailRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()?;
    let user = state.auth.verify_email(&req.email, &req.otp).await?;
    let token = create_token(user.id, &state.config.jwt_secret)?;
    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, session_cookie(&token))],
        Json(SuccessBody::new(
            "User verified successfully",
            SessionResponse {
                user: user.into(),
                token,
            },
        )),
    ))
}

/// POST /api/v1/auth/signin - Login with an existing account
#[utoipa::path(
    post,
    path = "/api/v1/auth/signin",
    request_body = SigninRequest,
    responses(
        (status = 200, description = "Login successful", body = SessionResponse),
        (status = 400, description = "Invalid credentials")
    )
)]
pub async fn signin_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SigninRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()?;
    let user = state.auth.login(&req.email, &req.password).await?;
    let token = create_token(user.id, &state.config.jwt_secret)?;
    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, session_cookie(&token))],
        Json(SuccessBody::new(
            "User logged in successfully",
            SessionResponse {
                user: user.into(),
                token,
            },
        )),
    ))
}

/// POST /api/v1/auth/logout - Clear the session cookie
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    responses(
        (status = 200, description = "Logout successful")
    )
)]
pub async fn logout_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::SET_COOKIE, clear_session_cookie())],
        Json(SuccessBody::new(
            "User logged out successfully",
            serde_json::json!({}),
        )),
    )
}

/// POST /api/v1/auth/forgot-password - Issue a reset token and mail the link
#[utoipa::path(
    post,
    path = "/api/v1/auth/forgot-password",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Reset link sent"),
        (status = 404, description = "Unknown email")
    )
)]
pub async fn forgot_password_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ForgotPasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()?;
    state.auth.forgot_password(&req.email).await?;
    Ok((
        StatusCode::OK,
        Json(SuccessBody::new(
            "Reset Password link has been sent to your email",
            serde_json::json!({}),
        )),
    ))
}

/// POST /api/v1/auth/reset-password/{reset_token} - Redeem a reset token
#[utoipa::path(
    post,
    path = "/api/v1/auth/reset-password/{reset_token}",
    request_body = ResetPasswordRequest,
    params(
        ("reset_token" = String, Path, description = "The reset token from the emailed link.")
    ),
    responses(
        (status = 200, description = "Password reset successfully"),
        (status = 400, description = "Mismatched passwords or invalid/expired token")
    )
)]
pub async fn reset_password_handler(
    State(state): State<Arc<AppState>>,
    Path(reset_token): Path<String>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()?;
    state
        .auth
        .reset_password(&reset_token, &req.new_password, &req.confirm_new_password)
        .await?;
    Ok((
        StatusCode::OK,
        Json(SuccessBody::new(
            "Password reset successfully",
            serde_json::json!({}),
        )),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strong_password_passes() {
        assert!(validate_password_strength("Aa1!aaaa").is_ok());
    }

    #[test]
    fn weak_passwords_fail() {
        for pw in ["short1!", "alllower1!", "ALLUPPER1!", "NoDigits!!", "NoSpecial11"] {
            assert!(validate_password_strength(pw).is_err(), "{} passed", pw);
        }
    }

    #[test]
    fn otp_shape_is_enforced() {
        assert!(validate_otp("123456").is_ok());
        assert!(validate_otp("12345").is_err());
        assert!(validate_otp("12345a").is_err());
    }

    #[test]
    fn invalid_email_yields_a_field_message() {
        let req = SignupRequest {
            email: "not-an-email".to_string(),
            password: "Aa1!aaaa".to_string(),
        };
        let errors = req.validate().unwrap_err();
        let api_err: crate::error::ApiError = errors.into();
        match api_err {
            ApiError::Validation(messages) => {
                assert!(messages.iter().any(|m| m == "Invalid email address"));
            }
            other => panic!("expected Validation, got {:?}", other),
        }
    }
}
