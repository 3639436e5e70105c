//! Client for the panel's JSON API: bearer-token auth with transparent
//! refresh-on-401, persisted session tokens, and per-integration endpoint
//! methods.

pub mod client;
mod endpoints;
pub mod error;
pub mod tokens;
pub mod transport;
pub mod types;

pub use client::ApiClient;
pub use error::ApiError;
pub use tokens::{MemoryTokenStore, SqliteTokenStore, TokenStore};
pub use transport::{HttpTransport, ReqwestTransport};
