//! End-to-end tests of the HTTP host.

use std::time::Duration;

use axum::http::StatusCode;
use segment_router::config::RouteConfig;
use segment_router::lifecycle::build_table;
use segment_router::routing::{Outcome, RouteTable};
use serde_json::Value;

mod common;

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_dispatch_through_table() {
    let (addr, shutdown, _updates) = common::start_server(common::sample_config()).await;
    let client = client();

    let res = client
        .get(format!("http://{}/user/42/profile/?tab=1", addr))
        .send()
        .await
        .expect("server unreachable");
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key("x-request-id"));
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["params"]["id"], "42");
    assert_eq!(body["route"], "user/$id:int/profile");

    let res = client
        .post(format!("http://{}/blog/2024/launch", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["params"]["slug"], "launch");

    let res = client.get(format!("http://{}/", addr)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.text().await.unwrap().starts_with("segment-router"));

    let res = client.get(format!("http://{}/health", addr)).send().await.unwrap();
    assert_eq!(res.text().await.unwrap(), "ok");

    shutdown.trigger();
}

#[tokio::test]
async fn test_unmatched_path_uses_error_route() {
    let (addr, shutdown, _updates) = common::start_server(common::sample_config()).await;

    let res = client()
        .get(format!("http://{}/user/abc/profile", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], 404);

    shutdown.trigger();
}

#[tokio::test]
async fn test_unresolved_alias_is_server_error() {
    let mut config = common::sample_config();
    config.routes.push(RouteConfig::new("ghost", "@nobody"));
    let (addr, shutdown, _updates) = common::start_server(config).await;

    let res = client()
        .get(format!("http://{}/ghost", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);

    shutdown.trigger();
}

#[tokio::test]
async fn test_reload_swaps_table() {
    let (addr, shutdown, updates) = common::start_server(common::sample_config()).await;
    let client = client();

    let url = format!("http://{}/shop/17", addr);
    assert_eq!(client.get(&url).send().await.unwrap().status(), StatusCode::NOT_FOUND);

    let mut config = common::sample_config();
    config.routes.push(RouteConfig::new("shop/$item:int", "echo"));
    updates.send(config).unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    let res = client.get(&url).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["params"]["item"], "17");

    shutdown.trigger();
}

#[tokio::test]
async fn test_cache_route_exports_live_table() {
    let mut config = common::sample_config();
    config.routes.push(RouteConfig::new("routes/cache", "Routes::cache"));
    let options = config.router.table_options();
    let (addr, shutdown, _updates) = common::start_server(config).await;

    let res = client()
        .get(format!("http://{}/routes/cache", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let blob = res.text().await.unwrap();

    let restored = RouteTable::from_cache(&blob, options).unwrap();
    assert_eq!(restored.len(), 7);
    let m = restored.resolve("/user/42/profile").unwrap();
    assert_eq!(m.outcome(), Outcome::Matched);
    assert_eq!(m.get_param("id"), Some("42"));

    shutdown.trigger();
}

#[tokio::test]
async fn test_server_ignores_cache_from_older_config() {
    let path = common::temp_path("server-stale.json");
    let _ = std::fs::remove_file(&path);

    let mut old = common::sample_config();
    old.router.cache_path = Some(path.to_string_lossy().into_owned());
    build_table(&old, true).unwrap();

    let mut config = old.clone();
    config.routes.push(RouteConfig::new("shop/$item:int", "echo"));
    let (addr, shutdown, _updates) = common::start_server(config).await;

    let res = client()
        .get(format!("http://{}/shop/17", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["params"]["item"], "17");

    shutdown.trigger();
    let _ = std::fs::remove_file(&path);
}
