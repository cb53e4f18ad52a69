use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

use anyhow::Context;
use axum::{
    extract::{Path, State},
    http::{self, HeaderMap, HeaderName, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use platform_authz::Collection;
use platform_db::{Actor, GuardedStore, StoreError};
use serde::Serialize;
use serde_json::Value;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;
use uuid::Uuid;

use crate::{config::AppConfig, mail::Mailer, notify};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<GuardedStore>,
    pub config: Arc<AppConfig>,
    pub mailer: Option<Mailer>,
}

#[derive(Clone, Debug)]
pub struct ServeConfig {
    addr: SocketAddr,
}

impl ServeConfig {
    pub fn new(host: IpAddr, port: u16) -> Self {
        Self {
            addr: SocketAddr::from((host, port)),
        }
    }
}

pub async fn serve(config: ServeConfig, state: AppState) -> anyhow::Result<()> {
    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;

    info!(%config.addr, "concierge server listening");
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;
    Ok(())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed = origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect::<Vec<_>>();
    let allow_origin = if allowed.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(allowed)
    };
    CorsLayer::new()
        .allow_headers([http::header::CONTENT_TYPE, http::header::AUTHORIZATION])
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_origin(allow_origin)
}

pub fn build_router(state: AppState) -> Router {
    let request_id = MakeRequestUuid;
    let header_name = HeaderName::from_static("x-request-id");
    Router::new()
        .route("/health", get(health_handler))
        .route("/v1/me", get(me_handler))
        .route(
            "/v1/{collection}",
            get(list_handler).post(create_handler),
        )
        .route(
            "/v1/{collection}/{id}",
            get(get_handler).patch(update_handler).delete(delete_handler),
        )
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(header_name.clone(), request_id))
                .layer(PropagateRequestIdLayer::new(header_name))
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&state.config.cors_allowed_origins)),
        )
        .with_state(state)
}

async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        ok: true,
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    version: &'static str,
}

async fn me_handler(State(state): State<AppState>, headers: HeaderMap) -> HttpResult<Json<Value>> {
    let uid = require_uid(&state, &headers)?;
    let doc = state
        .store
        .get(&Actor::user(&uid), Collection::Users, &uid)
        .map_err(store_error)?;
    Ok(Json(doc))
}

async fn get_handler(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
    headers: HeaderMap,
) -> HttpResult<Json<Value>> {
    let uid = require_uid(&state, &headers)?;
    let collection = parse_collection(&collection)?;
    let doc = state
        .store
        .get(&Actor::user(uid), collection, &id)
        .map_err(store_error)?;
    Ok(Json(doc))
}

async fn list_handler(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    headers: HeaderMap,
) -> HttpResult<Json<Vec<Value>>> {
    let uid = require_uid(&state, &headers)?;
    let collection = parse_collection(&collection)?;
    let docs = state
        .store
        .list(&Actor::user(uid), collection)
        .map_err(store_error)?;
    Ok(Json(docs))
}

async fn create_handler(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    headers: HeaderMap,
    Json(doc): Json<Value>,
) -> HttpResult<(StatusCode, Json<Value>)> {
    let uid = require_uid(&state, &headers)?;
    let collection = parse_collection(&collection)?;
    let id = match doc.get("id").and_then(Value::as_str) {
        Some(id) => id.to_string(),
        None => Uuid::new_v4().simple().to_string(),
    };
    let created = state
        .store
        .create(&Actor::user(uid), collection, &id, doc)
        .map_err(store_error)?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_handler(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(patch): Json<Value>,
) -> HttpResult<Json<Value>> {
    let uid = require_uid(&state, &headers)?;
    let collection = parse_collection(&collection)?;
    let previous_status = if collection == Collection::Applications {
        state
            .store
            .get(&Actor::Service, collection, &id)
            .ok()
            .and_then(|doc| doc.get("status").and_then(Value::as_str).map(String::from))
    } else {
        None
    };
    let updated = state
        .store
        .update(&Actor::user(uid), collection, &id, patch)
        .map_err(store_error)?;

    if collection == Collection::Applications {
        let new_status = updated.get("status").and_then(Value::as_str);
        if new_status.is_some() && new_status.map(String::from) != previous_status {
            notify::application_status_changed(&state.store, state.mailer.as_ref(), &updated)
                .await;
        }
    }
    Ok(Json(updated))
}

async fn delete_handler(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
    headers: HeaderMap,
) -> HttpResult<StatusCode> {
    let uid = require_uid(&state, &headers)?;
    let collection = parse_collection(&collection)?;
    state
        .store
        .delete(&Actor::user(uid), collection, &id)
        .map_err(store_error)?;
    Ok(StatusCode::NO_CONTENT)
}

type HttpResult<T> = Result<T, HttpError>;

fn require_uid(state: &AppState, headers: &HeaderMap) -> HttpResult<String> {
    let header = headers
        .get(http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| HttpError::new(StatusCode::UNAUTHORIZED, "missing bearer token"))?;
    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| HttpError::new(StatusCode::UNAUTHORIZED, "missing bearer token"))?;
    platform_authn::verify_token(token, &state.config.auth)
        .map_err(|_| HttpError::new(StatusCode::UNAUTHORIZED, "invalid or expired token"))
}

fn parse_collection(name: &str) -> HttpResult<Collection> {
    Collection::from_name(name)
        .ok_or_else(|| HttpError::new(StatusCode::NOT_FOUND, "unknown collection"))
}

/// Store failures surface as terminal HTTP errors; the body stays generic so
/// nothing about protected documents leaks to the caller.
fn store_error(err: StoreError) -> HttpError {
    let status = match err {
        StoreError::PermissionDenied => StatusCode::FORBIDDEN,
        StoreError::NotFound => StatusCode::NOT_FOUND,
        StoreError::Malformed(_) => StatusCode::UNPROCESSABLE_ENTITY,
        StoreError::AlreadyExists(_) => StatusCode::CONFLICT,
    };
    HttpError::new(status, &err.to_string())
}

#[derive(Debug)]
struct HttpError {
    status: StatusCode,
    message: String,
}

impl HttpError {
    fn new(status: StatusCode, msg: &str) -> Self {
        Self {
            status,
            message: msg.to_string(),
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        (self.status, self.message).into_response()
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install CTRL+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        signal(SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    ctrl_c.await;

    #[cfg(unix)]
    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    };
}
