pub mod error;
pub mod models;
pub mod prelude;
pub mod traits;

/// Used by the engine to report which adapter contract it was built against
pub static LIB_VERSION: &str = env!("CARGO_PKG_VERSION");
