use shared::{
    domain::ADMIN_ROLE,
    error::{ApiError, ErrorCode},
    protocol::{
        ControlAck, LoginRequest, LoginResponse, MeResponse, RegisterRequest, RegisterResponse,
        StatusResponse,
    },
};
use storage::Storage;
use tracing::{info, warn};

pub mod jwt;
pub mod workers;

use jwt::{mint_access_token, verify_access_token, AccessClaims, JwtConfig};
use workers::WorkerPool;

const TOKEN_TYPE: &str = "Bearer";

#[derive(Clone)]
pub struct ApiContext {
    pub storage: Storage,
    pub jwt: JwtConfig,
    pub workers: WorkerPool,
}

pub async fn login(ctx: &ApiContext, req: &LoginRequest) -> Result<LoginResponse, ApiError> {
    if req.username.trim().is_empty() || req.password.is_empty() {
        return Err(ApiError::new(
            ErrorCode::Validation,
            "username & password required",
        ));
    }

    let user = ctx
        .storage
        .verify_credentials(&req.username, &req.password)
        .await
        .map_err(internal)?
        .ok_or_else(|| {
            warn!(username = %req.username, "login rejected");
            ApiError::unauthorized("bad username or password")
        })?;

    let access_token = mint_access_token(&ctx.jwt, &user)
        .map_err(|e| ApiError::new(ErrorCode::Internal, e.to_string()))?;
    info!(user_id = user.user_id.0, role = %user.role, "issued access token");

    Ok(LoginResponse {
        access_token,
        token_type: TOKEN_TYPE.to_string(),
        expires_in: ctx.jwt.ttl_minutes * 60,
    })
}

/// Creates an account; the role defaults to admin when the request omits it.
pub async fn register(
    ctx: &ApiContext,
    req: &RegisterRequest,
) -> Result<RegisterResponse, ApiError> {
    let username = req.username.trim();
    if username.is_empty() || req.password.is_empty() {
        return Err(ApiError::new(
            ErrorCode::Validation,
            "username & password required",
        ));
    }
    let role = req
        .role
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or(ADMIN_ROLE);

    if ctx
        .storage
        .find_user_by_username(username)
        .await
        .map_err(internal)?
        .is_some()
    {
        return Err(ApiError::new(ErrorCode::Validation, "user already exists"));
    }

    let id = ctx
        .storage
        .create_user(username, &req.password, role)
        .await
        .map_err(internal)?;
    info!(user_id = id.0, %role, "registered user");

    Ok(RegisterResponse {
        id,
        username: username.to_string(),
        role: role.to_string(),
    })
}

/// Identity of the caller as the verified token states it.
pub fn me(claims: &AccessClaims) -> Result<MeResponse, ApiError> {
    let id = claims
        .user_id()
        .ok_or_else(|| ApiError::unauthorized("token subject is not a user id"))?;
    Ok(MeResponse {
        id,
        role: claims.role.clone(),
    })
}

/// Resolves the `Authorization` header value into verified claims.
pub fn authenticate(
    ctx: &ApiContext,
    authorization: Option<&str>,
) -> Result<AccessClaims, ApiError> {
    let Some(header) = authorization else {
        return Err(ApiError::unauthorized("missing bearer token"));
    };
    let token = header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::unauthorized("malformed authorization header"))?;

    verify_access_token(&ctx.jwt, token)
        .map_err(|e| ApiError::unauthorized(format!("invalid token: {e}")))
}

pub async fn system_status(ctx: &ApiContext, _claims: &AccessClaims) -> StatusResponse {
    StatusResponse {
        running: ctx.workers.is_running().await,
    }
}

pub async fn start_system(
    ctx: &ApiContext,
    claims: &AccessClaims,
) -> Result<ControlAck, ApiError> {
    ensure_admin(claims)?;
    if !ctx.workers.start().await {
        info!(user = %claims.name, "start requested while already running");
    }
    if !ctx.workers.is_running().await {
        warn!(user = %claims.name, "start requested but no worker is alive");
        return Err(ApiError::new(
            ErrorCode::Internal,
            "system workers failed to start",
        ));
    }
    Ok(ControlAck { running: true })
}

pub async fn stop_system(
    ctx: &ApiContext,
    claims: &AccessClaims,
) -> Result<ControlAck, ApiError> {
    ensure_admin(claims)?;
    if !ctx.workers.stop().await {
        info!(user = %claims.name, "stop requested while already stopped");
    }
    Ok(ControlAck {
        running: ctx.workers.is_running().await,
    })
}

fn ensure_admin(claims: &AccessClaims) -> Result<(), ApiError> {
    if claims.is_admin() {
        Ok(())
    } else {
        warn!(user = %claims.name, role = %claims.role, "control request denied");
        Err(ApiError::forbidden("admin role required"))
    }
}

fn internal(err: anyhow::Error) -> ApiError {
    ApiError::new(ErrorCode::Internal, err.to_string())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
