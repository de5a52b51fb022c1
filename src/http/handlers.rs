//! Built-in route handlers.
//!
//! Config files reference these by name:
//! - `home`: plain-text banner for the root path
//! - `echo`: JSON description of the match and its parameters
//! - `not_found`: JSON error using the route's `status` parameter
//! - `Health::check`: liveness probe
//! - `Routes::cache`: full cache blob of the live table

use std::sync::Arc;

use arc_swap::ArcSwap;
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Map, Value};

use crate::http::server::Routing;
use crate::routing::{HandlerRegistry, RouteMatch, NOT_FOUND_STATUS};

/// Registry with every built-in handler.
///
/// `routing` is the live table handle; `Routes::cache` exports whatever it
/// holds at request time, so reloads show up without re-registering.
pub fn builtin_handlers(routing: Arc<ArcSwap<Routing>>) -> HandlerRegistry<Response> {
    HandlerRegistry::new()
        .function("home", home)
        .function("echo", echo)
        .function("not_found", not_found)
        .method("Health", "check", health)
        .method("Routes", "cache", cache_dump(routing))
}

fn params_json(m: &RouteMatch<'_>) -> Value {
    let params: Map<String, Value> = m
        .params()
        .iter()
        .map(|(k, v)| (k.clone(), Value::from(v.as_str())))
        .collect();
    Value::Object(params)
}

fn home(_: &RouteMatch<'_>) -> Response {
    (StatusCode::OK, concat!("segment-router ", env!("CARGO_PKG_VERSION"))).into_response()
}

fn echo(m: &RouteMatch<'_>) -> Response {
    Json(json!({
        "route": m.entry().template(),
        "base": m.entry().base(),
        "outcome": m.outcome().as_str(),
        "params": params_json(m),
    }))
    .into_response()
}

fn not_found(m: &RouteMatch<'_>) -> Response {
    let status = m
        .status()
        .and_then(|s| StatusCode::from_u16(s).ok())
        .unwrap_or(StatusCode::NOT_FOUND);
    let code = m.status().unwrap_or(NOT_FOUND_STATUS);
    (status, Json(json!({ "error": "no route matched", "status": code }))).into_response()
}

fn health(_: &RouteMatch<'_>) -> Response {
    (StatusCode::OK, "ok").into_response()
}

fn cache_dump(
    routing: Arc<ArcSwap<Routing>>,
) -> impl Fn(&RouteMatch<'_>) -> Response + Send + Sync + 'static {
    move |_: &RouteMatch<'_>| match routing.load().table.export_full_cache() {
        Ok(blob) => ([(header::CONTENT_TYPE, "application/json")], blob).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to export route cache");
            (StatusCode::INTERNAL_SERVER_ERROR, "Route cache unavailable").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::{AliasRegistry, Callback, RouteTable, TableOptions};

    fn handlers() -> HandlerRegistry<Response> {
        builtin_handlers(Arc::new(ArcSwap::from_pointee(Routing {
            table: table(),
            aliases: AliasRegistry::new(),
        })))
    }

    fn table() -> RouteTable {
        let mut t = RouteTable::new(TableOptions::default());
        t.set_home_route(Callback::direct("home")).unwrap();
        t.set_error_route(Callback::direct("not_found")).unwrap();
        t.add_route("user/$id:int", Callback::direct("echo")).unwrap();
        t.add_route("health", Callback::static_method("Health", "check")).unwrap();
        t.add_route("routes/cache", Callback::static_method("Routes", "cache")).unwrap();
        t
    }

    #[test]
    fn test_builtin_statuses() {
        let t = table();
        let handlers = handlers();
        let aliases = AliasRegistry::new();

        let fire = |path: &str| {
            t.resolve(path)
                .unwrap()
                .fire_callback(&handlers, &aliases)
                .unwrap()
                .status()
        };

        assert_eq!(fire("/"), StatusCode::OK);
        assert_eq!(fire("/user/1"), StatusCode::OK);
        assert_eq!(fire("/health"), StatusCode::OK);
        assert_eq!(fire("/user/x"), StatusCode::NOT_FOUND);
        assert_eq!(fire("/routes/cache"), StatusCode::OK);
    }

    #[test]
    fn test_params_json() {
        let t = table();
        let m = t.resolve("/user/12").unwrap();
        assert_eq!(params_json(&m), json!({ "id": "12" }));
    }
}
