//! HTTP surface of the path race: headless races and algorithm comparisons
//! over road data supplied by the client.

pub mod config;
pub mod error;
pub mod routes;

pub use config::ServerConfig;
pub use error::ApiError;
pub use routes::router;

/// Log filter used when `RUST_LOG` is not set
pub const DEFAULT_LOG_FILTER: &str = "info,pathrace_server=debug,tower_http=debug";
