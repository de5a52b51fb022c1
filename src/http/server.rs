//! HTTP host for the route table.
//!
//! # Responsibilities
//! - Create the Axum app with a single fallback that feeds every path to the table
//! - Fire the resolved callback through the handler and alias registries
//! - Wire up middleware (tracing, timeout, request ID)
//! - Swap in rebuilt tables when the config changes
//!
//! HTTP methods are not part of routing; every method resolves by path alone.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::{
    extract::State,
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::RouterConfig;
use crate::http::handlers::builtin_handlers;
use crate::lifecycle::startup::{alias_registry, build_table};
use crate::observability::metrics;
use crate::routing::{AliasRegistry, HandlerRegistry, RouteError, RouteResult, RouteTable};

/// A table together with the aliases its callbacks may reference.
#[derive(Debug)]
pub struct Routing {
    pub table: RouteTable,
    pub aliases: AliasRegistry,
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub routing: Arc<ArcSwap<Routing>>,
    pub handlers: Arc<HandlerRegistry<Response>>,
}

/// HTTP server dispatching through the route table.
pub struct HttpServer {
    config: RouterConfig,
    state: AppState,
}

impl HttpServer {
    /// Compile the table from `config` and build the server.
    ///
    /// The cache file is rewritten but never read here: it may predate
    /// `config`. Callers that know the cache is fresh build the table
    /// themselves and use [`HttpServer::with_table`].
    pub fn new(config: RouterConfig) -> RouteResult<Self> {
        let built = build_table(&config, false)?;
        Ok(Self::with_table(config, built.table))
    }

    /// Serve an already built table.
    pub fn with_table(config: RouterConfig, table: RouteTable) -> Self {
        let routing = Arc::new(ArcSwap::from_pointee(Routing {
            table,
            aliases: alias_registry(&config),
        }));
        let state = AppState {
            handlers: Arc::new(builtin_handlers(routing.clone())),
            routing,
        };
        Self { config, state }
    }

    /// Replace the handler set (embedders register their own callbacks here).
    pub fn with_handlers(mut self, handlers: HandlerRegistry<Response>) -> Self {
        self.state.handlers = Arc::new(handlers);
        self
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Shared handle to the live table; reloads swap its contents.
    pub fn routing(&self) -> Arc<ArcSwap<Routing>> {
        self.state.routing.clone()
    }

    #[allow(deprecated)]
    fn build_router(&self) -> Router {
        Router::new()
            .fallback(dispatch)
            .with_state(self.state.clone())
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(TimeoutLayer::new(Duration::from_secs(
                        self.config.timeouts.request_secs,
                    ))),
            )
    }

    /// Run until `shutdown` fires, applying config updates as they arrive.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<RouterConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let routing = self.state.routing.clone();
        tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                match build_table(&config, false) {
                    Ok(built) => {
                        let routes = built.table.len();
                        routing.store(Arc::new(Routing {
                            table: built.table,
                            aliases: alias_registry(&config),
                        }));
                        tracing::info!(routes, "Route table swapped");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Rejected reloaded routes, keeping current table");
                    }
                }
            }
        });

        let app = self.build_router();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Resolve the request path and fire the route's callback.
async fn dispatch(State(state): State<AppState>, uri: Uri) -> Response {
    let raw = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    let routing = state.routing.load();

    let result = routing
        .table
        .resolve(raw)
        .and_then(|m| m.fire_callback(&state.handlers, &routing.aliases));

    match result {
        Ok(response) => response,
        Err(e) => {
            let kind = match &e {
                RouteError::UnresolvedAlias(_) => "unresolved_alias",
                RouteError::UnresolvedHandler(_) => "unresolved_handler",
                RouteError::Configuration(_) => "configuration",
                _ => "other",
            };
            tracing::error!(path = %uri.path(), error = %e, "Failed to dispatch request");
            metrics::record_dispatch_error(kind);
            (StatusCode::INTERNAL_SERVER_ERROR, "Route dispatch failed").into_response()
        }
    }
}
