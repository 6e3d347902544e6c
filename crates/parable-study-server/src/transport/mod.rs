//! Transport layer for serving the parable API.

pub mod http;

pub use http::{router, AppState, HttpTransport};
