//! Offline shell-cache worker.
//!
//! Keeps the panel's static shell available without a live network
//! connection: one generation-named cache store, network-first serving for
//! HTML, cache-first for everything else, plus background-sync and
//! push-notification plumbing. Modeled as an explicit state machine driven by
//! host-dispatched events.

pub mod event;
pub mod fetch;
pub mod offline;
pub mod store;

pub use event::{ClientAction, ClientMessage, ClientWindow, EventOutcome, WorkerEvent, WorkerState};
pub use fetch::{Fetch, FetchRequest, FetchResponse, HttpFetcher};
pub use offline::OfflineCacheWorker;
pub use store::{CacheStore, CachedResponse, MemoryCacheStore, SqliteCacheStore};

use serde::Deserialize;

/// Worker configuration, passed at startup. Defaults match the stock panel.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
  /// Cache generation name. Bumping it invalidates the previous snapshot on
  /// the next activation.
  pub generation: String,
  /// Shell assets warmed during install, resolved against the panel origin.
  pub shell_assets: Vec<String>,
  /// Document served for HTML requests with no exact cached match.
  pub fallback_document: String,
  /// Background-sync tag this worker responds to.
  pub sync_tag: String,
  /// Endpoint fetched on background sync.
  pub sync_endpoint: String,
  pub notification_title: String,
  pub notification_icon: String,
  pub notification_badge: String,
  pub notification_tag: String,
}

impl Default for WorkerConfig {
  fn default() -> Self {
    Self {
      generation: "seedbox-v1".to_string(),
      shell_assets: vec![
        "./".to_string(),
        "./index.html".to_string(),
        "./manifest.json".to_string(),
        "https://cdn.jsdelivr.net/npm/@tailwindcss/browser@4".to_string(),
        "https://cdn.jsdelivr.net/npm/chart.js".to_string(),
        "https://cdnjs.cloudflare.com/ajax/libs/font-awesome/6.4.0/css/all.min.css".to_string(),
        "https://fonts.googleapis.com/css2?family=Inter:wght@300;400;500;600;700&display=swap"
          .to_string(),
      ],
      fallback_document: "./index.html".to_string(),
      sync_tag: "sync-apps".to_string(),
      sync_endpoint: "/api/apps".to_string(),
      notification_title: "SeedBox Control Panel".to_string(),
      notification_icon: "data:image/svg+xml,<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 192 192\"><rect fill=\"%230f3460\" width=\"192\" height=\"192\"/><rect fill=\"%233B82F6\" x=\"40\" y=\"40\" width=\"112\" height=\"112\" rx=\"8\"/><text x=\"96\" y=\"120\" font-size=\"80\" fill=\"%23ffffff\" font-family=\"Arial\" text-anchor=\"middle\" font-weight=\"bold\">SB</text></svg>".to_string(),
      notification_badge: "data:image/svg+xml,<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 96 96\"><rect fill=\"%233B82F6\" width=\"96\" height=\"96\"/><text x=\"48\" y=\"65\" font-size=\"48\" fill=\"%23ffffff\" font-family=\"Arial\" text-anchor=\"middle\" font-weight=\"bold\">SB</text></svg>".to_string(),
      notification_tag: "seedbox-notification".to_string(),
    }
  }
}
