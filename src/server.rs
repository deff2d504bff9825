//! HTTP serving of a compiled route table.
//!
//! Every distinct route path gets one handler. A handler answers with the
//! first route on its path whose method matches the request; routes are
//! immutable and shared, so requests need no locking.

use crate::error::{CompilerError, Result};
use crate::types::{Route, RouteTable};
use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::net::TcpListener;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3000;

/// Where the server listens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

/// A route with its response parts validated up front
#[derive(Debug)]
struct PreparedRoute {
    route: Route,
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl PreparedRoute {
    fn new(route: Route) -> Result<Self> {
        let status = u16::try_from(route.status())
            .ok()
            .and_then(|code| StatusCode::from_u16(code).ok())
            .ok_or_else(|| {
                CompilerError::server(format!(
                    "route {} {} has invalid status {}",
                    route.method(),
                    route.path(),
                    route.status()
                ))
            })?;

        let mut headers = HeaderMap::new();
        for (name, value) in route.headers() {
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                CompilerError::server(format!("route {} has invalid header name {:?}: {}", route.path(), name, e))
            })?;
            let header_value = HeaderValue::from_str(value).map_err(|e| {
                CompilerError::server(format!("route {} has invalid value for header {}: {}", route.path(), name, e))
            })?;
            headers.insert(header_name, header_value);
        }

        let body = Bytes::copy_from_slice(route.body().as_bytes());
        Ok(Self {
            route,
            status,
            headers,
            body,
        })
    }

    fn response(&self) -> Response {
        (self.status, self.headers.clone(), Body::from(self.body.clone())).into_response()
    }
}

/// Routes registered for one path, in declaration order
#[derive(Debug, Default)]
struct PathHandler {
    routes: Vec<PreparedRoute>,
}

impl PathHandler {
    fn find(&self, method: &str) -> Option<&PreparedRoute> {
        self.routes.iter().find(|prepared| prepared.route.accepts(method))
    }

    fn allowed_methods(&self) -> Vec<&str> {
        let mut methods: Vec<&str> = Vec::new();
        for prepared in &self.routes {
            if !methods.contains(&prepared.route.method()) {
                methods.push(prepared.route.method());
            }
        }
        methods
    }
}

/// Outcome of looking up a request
#[derive(Debug)]
pub enum Lookup<'a> {
    Found(&'a Route),
    MethodNotAllowed(Vec<&'a str>),
    NotFound,
}

/// Exact-match dispatcher built from a frozen route table
#[derive(Debug, Default)]
pub struct RouteDispatcher {
    handlers: HashMap<String, PathHandler>,
}

impl RouteDispatcher {
    /// Register one handler per distinct path. Fails if a route carries a
    /// status or header that cannot go on the wire.
    pub fn new(table: RouteTable) -> Result<Self> {
        let mut handlers: HashMap<String, PathHandler> = HashMap::new();
        for route in table.into_routes() {
            if !route.path().starts_with('/') {
                log::warn!("Route path {:?} does not start with '/' and can never match", route.path());
            }
            let prepared = PreparedRoute::new(route)?;
            handlers
                .entry(prepared.route.path().to_string())
                .or_default()
                .routes
                .push(prepared);
        }
        Ok(Self { handlers })
    }

    pub fn path_count(&self) -> usize {
        self.handlers.len()
    }

    pub fn lookup(&self, path: &str, method: &str) -> Lookup<'_> {
        match self.handlers.get(path) {
            Some(handler) => match handler.find(method) {
                Some(prepared) => Lookup::Found(&prepared.route),
                None => Lookup::MethodNotAllowed(handler.allowed_methods()),
            },
            None => Lookup::NotFound,
        }
    }

    fn respond(&self, path: &str, method: &str) -> Response {
        let Some(handler) = self.handlers.get(path) else {
            log::warn!("Route not found for {} {}", method, path);
            return StatusCode::NOT_FOUND.into_response();
        };

        match handler.find(method) {
            Some(prepared) => {
                log::info!("{} {} {}", path, method, prepared.status.as_u16());
                prepared.response()
            }
            None => {
                let allowed = handler.allowed_methods().join(", ");
                log::warn!("{} {} not allowed (allowed: {})", path, method, allowed);
                match HeaderValue::from_str(&allowed) {
                    Ok(value) => (StatusCode::METHOD_NOT_ALLOWED, [(header::ALLOW, value)]).into_response(),
                    Err(e) => {
                        log::error!("Failed to build Allow header for {}: {}", path, e);
                        StatusCode::METHOD_NOT_ALLOWED.into_response()
                    }
                }
            }
        }
    }
}

/// Application state injected into the dispatch handler
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<RouteDispatcher>,
}

async fn dispatch(State(state): State<AppState>, method: Method, uri: Uri) -> Response {
    state.dispatcher.respond(uri.path(), method.as_str())
}

/// Build the axum router serving `dispatcher`
pub fn router(dispatcher: RouteDispatcher) -> Router {
    Router::new().fallback(dispatch).with_state(AppState {
        dispatcher: Arc::new(dispatcher),
    })
}

/// Serve `table` until Ctrl-C
pub async fn serve(table: RouteTable, config: &ServerConfig) -> Result<()> {
    let route_count = table.len();
    let dispatcher = RouteDispatcher::new(table)?;
    let path_count = dispatcher.path_count();

    let listener = TcpListener::bind((config.host.as_str(), config.port))
        .await
        .map_err(|e| CompilerError::server(format!("failed to bind {}:{}: {}", config.host, config.port, e)))?;
    let local_addr = listener
        .local_addr()
        .map_err(|e| CompilerError::server(e.to_string()))?;

    log::info!(
        "Tera server running on http://{} ({} routes on {} paths)",
        local_addr,
        route_count,
        path_count
    );

    axum::serve(listener, router(dispatcher))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| CompilerError::server(e.to_string()))?;

    log::info!("Tera server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    log::info!("Shutdown signal received");
}
