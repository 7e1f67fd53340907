use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::services::auth_service::LoginRequest;
use crate::services::verification_service::SignupRequest;
use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use serde::Deserialize;
use serde_json::json;

#[derive(Deserialize)]
pub struct SignupBody {
    pub email: Option<String>,
    pub password: Option<String>,
    pub full_name: Option<String>,
}

#[derive(Deserialize)]
pub struct VerifyOtpBody {
    pub email: Option<String>,
    pub code: Option<String>,
}

#[derive(Deserialize)]
pub struct ResendOtpBody {
    pub email: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginBody {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// POST /api/auth/signup - Start registration and email a verification code
pub async fn signup_handler(
    State(state): State<AppState>,
    Json(body): Json<SignupBody>,
) -> Result<impl IntoResponse, AppError> {
    let request = SignupRequest {
        email: body.email.unwrap_or_default(),
        password: body.password.unwrap_or_default(),
        full_name: body.full_name.unwrap_or_default(),
    };

    let user = state.verification_service.request_signup(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Verification code sent to your email",
            "user": user.public(),
        })),
    ))
}

/// POST /api/auth/verify-otp - Confirm the emailed code and log the user in
pub async fn verify_otp_handler(
    State(state): State<AppState>,
    Json(body): Json<VerifyOtpBody>,
) -> Result<impl IntoResponse, AppError> {
    let email = body.email.unwrap_or_default();
    let code = body.code.unwrap_or_default();

    if email.trim().is_empty() || code.trim().is_empty() {
        return Err(AppError::Validation(
            "Email and verification code are required".to_string(),
        ));
    }

    let (token, user) = state.verification_service.verify_otp(&email, &code).await?;

    Ok(Json(json!({
        "message": "Email verified successfully",
        "token": token,
        "user": user.public(),
    })))
}

/// POST /api/auth/resend-otp - Send a fresh code to a pending account
pub async fn resend_otp_handler(
    State(state): State<AppState>,
    Json(body): Json<ResendOtpBody>,
) -> Result<impl IntoResponse, AppError> {
    let email = body.email.unwrap_or_default();

    if email.trim().is_empty() {
        return Err(AppError::Validation("Email is required".to_string()));
    }

    state.verification_service.resend_otp(&email).await?;

    Ok(Json(json!({
        "message": "A new verification code has been sent to your email",
    })))
}

/// POST /api/auth/login - Exchange credentials for a session token
pub async fn login_handler(
    State(state): State<AppState>,
    Json(body): Json<LoginBody>,
) -> Result<impl IntoResponse, AppError> {
    let email = body.email.unwrap_or_default();
    let password = body.password.unwrap_or_default();

    if email.trim().is_empty() || password.is_empty() {
        return Err(AppError::Validation(
            "Email and password are required".to_string(),
        ));
    }

    let (token, user) = state
        .auth_service
        .login(LoginRequest { email, password })
        .await?;

    Ok(Json(json!({
        "message": "Login successful",
        "token": token,
        "user": user.public(),
    })))
}

/// GET /api/auth/me - Profile of the token's owner
pub async fn me_handler(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .user_service
        .find_user_by_id(auth_user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(json!({ "user": user.public() })))
}
