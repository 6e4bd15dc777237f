use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use server_api::{
    authenticate, jwt::AccessClaims, login, me, register, start_system, stop_system,
    system_status, workers::WorkerPool, ApiContext,
};
use shared::{
    error::{ApiError, ErrorCode},
    protocol::{
        login_route, me_route, register_route, system_start_route, system_status_route,
        system_stop_route, ControlAck, LoginRequest, LoginResponse, MeResponse, RegisterRequest,
        RegisterResponse, StatusResponse,
    },
};
use storage::Storage;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod app_state;
mod config;

use app_state::AppState;
use config::{load_settings, prepare_database_url, DEFAULT_JWT_SECRET};

const MAX_REQUEST_BYTES: usize = 64 * 1024;

type HttpResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = load_settings();
    if settings.jwt_secret == DEFAULT_JWT_SECRET {
        warn!("APP__JWT_SECRET not set; using the development signing secret");
    }

    let database_url = prepare_database_url(&settings.database_url)?;
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;

    let api = ApiContext {
        storage,
        jwt: settings.jwt(),
        workers: WorkerPool::new(settings.worker_pool()),
    };
    let workers = api.workers.clone();
    let app = build_router(Arc::new(AppState { api }));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "control server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    workers.stop().await;
    info!("control server shut down");
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route(login_route(), post(http_login))
        .route(register_route(), post(http_register))
        .route(me_route(), get(http_me))
        .route(system_status_route(), get(http_status))
        .route(system_start_route(), post(http_start))
        .route(system_stop_route(), post(http_stop))
        .layer(RequestBodyLimitLayer::new(MAX_REQUEST_BYTES))
        .with_state(state)
}

async fn healthz(State(state): State<Arc<AppState>>) -> (StatusCode, &'static str) {
    match state.api.storage.health_check().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(error) => {
            error!(%error, "health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
    }
}

async fn http_login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> HttpResult<LoginResponse> {
    login(&state.api, &req).await.map(Json).map_err(reject)
}

async fn http_register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), (StatusCode, Json<ApiError>)> {
    let created = register(&state.api, &req).await.map_err(reject)?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn http_me(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> HttpResult<MeResponse> {
    let claims = claims_from_headers(&state, &headers)?;
    me(&claims).map(Json).map_err(reject)
}

async fn http_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> HttpResult<StatusResponse> {
    let claims = claims_from_headers(&state, &headers)?;
    Ok(Json(system_status(&state.api, &claims).await))
}

async fn http_start(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> HttpResult<ControlAck> {
    let claims = claims_from_headers(&state, &headers)?;
    start_system(&state.api, &claims)
        .await
        .map(Json)
        .map_err(reject)
}

async fn http_stop(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> HttpResult<ControlAck> {
    let claims = claims_from_headers(&state, &headers)?;
    stop_system(&state.api, &claims)
        .await
        .map(Json)
        .map_err(reject)
}

fn claims_from_headers(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<AccessClaims, (StatusCode, Json<ApiError>)> {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    authenticate(&state.api, authorization).map_err(reject)
}

fn reject(err: ApiError) -> (StatusCode, Json<ApiError>) {
    (status_for(err.code), Json(err))
}

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::Forbidden => StatusCode::FORBIDDEN,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
