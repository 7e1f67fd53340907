use crate::{error::AppError, AppState};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    typed_header::{TypedHeader, TypedHeaderRejection},
};

/// Identity of the authenticated caller, attached to request extensions
/// by [`require_auth`] for handlers to read.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i64,
    pub email: String,
}

/// Bearer-token authentication middleware for protected API routes.
///
/// Verifies the `Authorization: Bearer <token>` header against the token
/// signing secret and attaches an [`AuthUser`] to the request. A missing
/// header and a malformed one are both reported as a missing token; a
/// well-formed token that fails verification is reported as invalid.
pub async fn require_auth(
    State(state): State<AppState>,
    bearer: Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let TypedHeader(Authorization(bearer)) = bearer.map_err(|_| AppError::MissingToken)?;

    let claims = state
        .token_service
        .verify(bearer.token())
        .map_err(|_| AppError::InvalidToken)?;

    request.extensions_mut().insert(AuthUser {
        user_id: claims.user_id,
        email: claims.email,
    });

    Ok(next.run(request).await)
}
