use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{Extension, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use moka::sync::Cache;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::{FromRow, PgPool};
use tracing::error;

use crate::api::auth::Claims;
use crate::config::Config;
use crate::utils::api_response::ApiResponse;

/// Account-access cache keyed by employee id, using `moka` with a TTL so role
/// changes and lockouts take effect within minutes without a per-request
/// database hit.
pub type AccessCache = Arc<Cache<String, UserAccess>>;

pub fn create_access_cache() -> AccessCache {
    Arc::new(
        Cache::builder()
            .time_to_live(Duration::from_secs(600))
            .build(),
    )
}

/// **JWT Middleware** (Handles Token Authentication)
pub async fn jwt_middleware(mut req: Request<Body>, next: Next) -> Result<Response, Response> {
    // Local development backdoor; AUTH_DISABLED must never be set in prod.
    if Config::auth_disabled() {
        req.extensions_mut().insert(Claims {
            sub: "0".to_string(),
            username: "dev".to_string(),
            role: "admin".to_string(),
            exp: usize::MAX,
        });
        return Ok(next.run(req).await);
    }

    let auth_header = req.headers().get("Authorization").ok_or_else(|| {
        tracing::error!("Missing Authorization header");
        ApiResponse::<()>::error(StatusCode::UNAUTHORIZED, "Missing Authorization header", None)
            .into_response()
    })?;

    let token_str = auth_header.to_str().map_err(|_| {
        tracing::error!("Invalid Authorization header format");
        ApiResponse::<()>::error(
            StatusCode::BAD_REQUEST,
            "Invalid Authorization header format",
            None,
        )
        .into_response()
    })?;

    let token = token_str.strip_prefix("Bearer ").ok_or_else(|| {
        tracing::error!("Invalid token format (missing 'Bearer ' prefix)");
        ApiResponse::<()>::error(
            StatusCode::BAD_REQUEST,
            "Invalid token format (missing 'Bearer ' prefix)",
            None,
        )
        .into_response()
    })?;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(Config::get().jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        tracing::error!("JWT decoding failed: {:?}", e);
        ApiResponse::<()>::error(
            StatusCode::UNAUTHORIZED,
            "Invalid token",
            Some(json!({ "error": e.to_string() })),
        )
        .into_response()
    })?;

    req.extensions_mut().insert(token_data.claims);
    Ok(next.run(req).await)
}

/// What the access middleware needs to know about an account per request.
#[derive(Debug, Serialize, Deserialize, Clone, FromRow)]
pub struct UserAccess {
    pub user_id: i32,
    pub role: String,
    pub account_locked: bool,
}

/// **Access middleware**: resolves the authenticated user's current role and
/// locked flag (cached), rejecting locked accounts even while their token is
/// still valid.
pub async fn access_middleware(
    State(pool): State<PgPool>,
    Extension(access_cache): Extension<AccessCache>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, Response> {
    let claims = req.extensions().get::<Claims>().cloned().ok_or_else(|| {
        error!("Missing JWT claims in request");
        ApiResponse::<()>::error(StatusCode::UNAUTHORIZED, "Missing JWT claims in request", None)
            .into_response()
    })?;

    if Config::auth_disabled() {
        req.extensions_mut().insert(UserAccess {
            user_id: 0,
            role: claims.role,
            account_locked: false,
        });
        return Ok(next.run(req).await);
    }

    if let Some(access) = access_cache.get(&claims.username) {
        return finish_with_access(access, req, next).await;
    }

    let access = sqlx::query_as::<_, UserAccess>(
        "SELECT id AS user_id, role, account_locked FROM users WHERE username = $1",
    )
    .bind(&claims.username)
    .fetch_optional(&pool)
    .await
    .map_err(|e| {
        error!("Database query failed: {:?}", e);
        ApiResponse::<()>::error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to load user access",
            Some(json!({ "error": e.to_string() })),
        )
        .into_response()
    })?
    .ok_or_else(|| {
        ApiResponse::<()>::error(StatusCode::UNAUTHORIZED, "Unknown user", None).into_response()
    })?;

    access_cache.insert(claims.username.clone(), access.clone());
    finish_with_access(access, req, next).await
}

async fn finish_with_access(
    access: UserAccess,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, Response> {
    if access.account_locked {
        return Err(ApiResponse::<()>::error(
            StatusCode::FORBIDDEN,
            "Account is locked. Contact your administrator.",
            None,
        )
        .into_response());
    }
    req.extensions_mut().insert(access);
    Ok(next.run(req).await)
}
