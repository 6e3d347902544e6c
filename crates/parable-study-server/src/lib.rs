//! Parable Study server: parables, verse text, and topics over HTTP.

pub mod config;
pub mod transport;
pub mod types;

pub use config::{ConfigOverrides, ServerConfig};
pub use transport::{router, AppState, HttpTransport};
pub use types::{ServerError, ServerResult};
