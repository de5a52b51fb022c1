//! HTTP host subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum, request ID, tracing, timeout)
//!     → RouteTable::resolve(path + query)
//!     → RouteMatch::fire_callback(handlers, aliases)
//!     → handlers.rs (built-in responses)
//! ```

pub mod handlers;
pub mod server;

pub use handlers::builtin_handlers;
pub use server::{AppState, HttpServer, Routing};
