//! segment-router: a path routing engine with precompiled, cacheable route tables.
//!
//! Route templates such as `user/$id:int/profile` are compiled into anchored
//! matchers, bucketed by their first literal segment and resolved against
//! request paths. Compiled tables can be exported to a versioned cache blob
//! and restored in a later process without recompiling.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::schema::RouterConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::{Callback, RouteMatch, RouteTable};
