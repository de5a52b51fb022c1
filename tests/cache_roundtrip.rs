//! Warm-start behaviour: a table restored from its cache resolves identically.

use std::fs;

use segment_router::lifecycle::startup::{build_table, compile_table, TableSource};
use segment_router::routing::cache::{decode, read_cache_file};
use segment_router::routing::{Callback, RouteEntry, RouteError, RouteTable, SegmentCompiler};

mod common;

#[test]
fn test_restart_reproduces_resolution() {
    let config = common::sample_config();
    let fresh = compile_table(&config.router, &config.routes).unwrap();
    let blob = fresh.export_full_cache().unwrap();

    // New "process": only the blob survives.
    let restored = RouteTable::from_cache(&blob, config.router.table_options()).unwrap();

    for path in common::SAMPLE_PATHS {
        let a = fresh.resolve(path).unwrap();
        let b = restored.resolve(path).unwrap();
        assert_eq!(a.outcome(), b.outcome(), "{}", path);
        assert_eq!(a.entry().callback(), b.entry().callback(), "{}", path);
        assert_eq!(a.params(), b.params(), "{}", path);
    }
}

#[test]
fn test_per_entry_blobs_rebuild_table() {
    let config = common::sample_config();
    let fresh = compile_table(&config.router, &config.routes).unwrap();
    let document = decode(&fresh.export_full_cache().unwrap()).unwrap();

    let mut rebuilt = RouteTable::new(config.router.table_options());
    rebuilt.set_home_route(Callback::parse(&config.router.home)).unwrap();
    rebuilt.set_error_route(Callback::parse(&config.router.error)).unwrap();
    for route in &document.routes {
        rebuilt.add_cached_route(route).unwrap();
    }

    assert_eq!(rebuilt.len(), fresh.len());
    for path in common::SAMPLE_PATHS {
        assert_eq!(
            fresh.resolve(path).unwrap().params(),
            rebuilt.resolve(path).unwrap().params(),
            "{}",
            path
        );
    }
}

#[test]
fn test_entry_roundtrip_keeps_callback_and_matching() {
    let compiler = SegmentCompiler::default();
    let callbacks = [
        Callback::direct("echo"),
        Callback::static_method("Users", "show"),
        Callback::alias("profile"),
    ];

    for callback in callbacks {
        let entry = RouteEntry::compile("user/$id:int/$tab", callback.clone(), &compiler).unwrap();
        let restored = RouteEntry::import(entry.export()).unwrap();

        assert_eq!(restored.callback(), &callback);
        assert_eq!(restored.matcher().as_str(), entry.matcher().as_str());
        for path in ["/user/1/a", "/user/x/a", "/user/1", "/user/1/a/"] {
            assert_eq!(
                entry.verify(path).map(|m| m.params().to_vec()),
                restored.verify(path).map(|m| m.params().to_vec()),
                "{}",
                path
            );
        }
    }
}

#[test]
fn test_truncated_cache_is_rejected() {
    let config = common::sample_config();
    let blob = compile_table(&config.router, &config.routes)
        .unwrap()
        .export_full_cache()
        .unwrap();

    let truncated = &blob[..blob.len() / 2];
    assert!(matches!(
        RouteTable::from_cache(truncated, config.router.table_options()),
        Err(RouteError::CacheFormat(_))
    ));
}

#[test]
fn test_build_table_writes_and_reuses_cache() {
    let path = common::temp_path("build.json");
    let _ = fs::remove_file(&path);

    let mut config = common::sample_config();
    config.router.cache_path = Some(path.to_string_lossy().into_owned());

    assert_eq!(build_table(&config, true).unwrap().source, TableSource::Compiled);
    assert!(read_cache_file(&path).unwrap().is_some());
    assert_eq!(build_table(&config, true).unwrap().source, TableSource::Cache);
    assert_eq!(build_table(&config, false).unwrap().source, TableSource::Compiled);

    let _ = fs::remove_file(&path);
}
