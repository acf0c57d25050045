use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
    Extension, Json,
};
use common::types::ApiResponse;
use tracing::{debug, warn};

use service::auth::domain::{AccountView, AuthSession, LoginInput, RefreshTokenInput, RegisterInput};
use service::auth::token::TokenClaims;
use service::auth::AuthService;

use crate::errors::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
}

type ApiResult<T> = Result<(StatusCode, Json<ApiResponse<T>>), ApiError>;

fn ok<T>(status: StatusCode, message: &str, data: Option<T>) -> ApiResult<T> {
    Ok((status, Json(ApiResponse::success(message, data))))
}

#[utoipa::path(post, path = "/api/v1/auth/register", tag = "auth", request_body = crate::openapi::RegisterRequest,
    responses((status = 201, description = "Registered", body = crate::openapi::SessionEnvelope), (status = 400, description = "Bad Request"), (status = 409, description = "Conflict")))]
pub async fn register(State(state): State<AppState>, payload: Result<Json<RegisterInput>, JsonRejection>) -> ApiResult<AuthSession> {
    let Json(input) = payload?;
    let session = state.auth.register(input).await?;
    ok(StatusCode::CREATED, "User registered successfully", Some(session))
}

#[utoipa::path(post, path = "/api/v1/auth/login", tag = "auth", request_body = crate::openapi::LoginRequest,
    responses((status = 200, description = "Logged in", body = crate::openapi::SessionEnvelope), (status = 401, description = "Unauthorized")))]
pub async fn login(State(state): State<AppState>, payload: Result<Json<LoginInput>, JsonRejection>) -> ApiResult<AuthSession> {
    let Json(input) = payload?;
    let session = state.auth.login(input).await?;
    ok(StatusCode::OK, "Login successful", Some(session))
}

#[utoipa::path(post, path = "/api/v1/auth/refresh", tag = "auth", request_body = crate::openapi::RefreshRequest,
    responses((status = 200, description = "Rotated", body = crate::openapi::SessionEnvelope), (status = 401, description = "Unauthorized")))]
pub async fn refresh(State(state): State<AppState>, payload: Result<Json<RefreshTokenInput>, JsonRejection>) -> ApiResult<AuthSession> {
    let Json(input) = payload?;
    let session = state.auth.refresh_token(&input.refresh_token).await?;
    ok(StatusCode::OK, "Token refreshed successfully", Some(session))
}

#[utoipa::path(post, path = "/api/v1/auth/logout", tag = "auth", request_body = crate::openapi::RefreshRequest,
    responses((status = 200, description = "Logged out")))]
pub async fn logout(State(state): State<AppState>, payload: Result<Json<RefreshTokenInput>, JsonRejection>) -> ApiResult<()> {
    let Json(input) = payload?;
    state.auth.logout(&input.refresh_token).await?;
    ok(StatusCode::OK, "Logout successful", None)
}

#[utoipa::path(get, path = "/api/v1/users/profile", tag = "users", security(("bearer" = [])),
    responses((status = 200, description = "Current account", body = crate::openapi::ProfileEnvelope), (status = 401, description = "Unauthorized"), (status = 404, description = "Not Found")))]
pub async fn profile(State(state): State<AppState>, Extension(claims): Extension<TokenClaims>) -> ApiResult<AccountView> {
    let view = state.auth.profile(claims.sub).await?;
    ok(StatusCode::OK, "Profile retrieved", Some(view))
}

/// Checks `Authorization: Bearer <access token>` and hands the claims to the
/// handler as a request extension.
pub async fn require_access_token(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let path = req.uri().path().to_owned();
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_owned);

    let Some(token) = token else {
        warn!(path = %path, "missing or malformed Authorization header");
        return Err(ApiError::unauthorized("missing bearer token"));
    };

    let claims = state.auth.authenticate(&token)?;
    debug!(path = %path, account_id = %claims.sub, "bearer accepted");
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
