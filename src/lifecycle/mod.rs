//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Build table (cache or compile) → Start listener
//!
//! Shutdown (shutdown.rs):
//!     Signal received → broadcast → Stop accepting → Drain → Exit
//! ```

pub mod shutdown;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{build_table, BuiltTable, TableSource};
