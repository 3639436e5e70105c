//! The offline cache worker state machine.

use futures::future::join_all;
use reqwest::Method;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

use super::event::{
  ClientAction, ClientMessage, ClientWindow, EventOutcome, Notification, WorkerEvent, WorkerState,
};
use super::fetch::{Fetch, FetchRequest, FetchResponse};
use super::store::{CacheStore, CachedResponse};
use super::WorkerConfig;

/// Body used when a push event carries no payload.
const DEFAULT_PUSH_BODY: &str = "SeedBox notification";

/// Generation-versioned offline cache for the panel shell.
///
/// Driven by host-dispatched [`WorkerEvent`]s; every handler resolves to an
/// [`EventOutcome`] the host acts on. Network and storage failures never
/// escape this type, they degrade to cached or synthetic responses.
pub struct OfflineCacheWorker<S: CacheStore, F: Fetch> {
  origin: Url,
  config: WorkerConfig,
  store: Arc<S>,
  fetcher: F,
  state: WorkerState,
}

impl<S: CacheStore, F: Fetch> OfflineCacheWorker<S, F> {
  /// Create a fresh worker instance; the host drives it through
  /// install/activate before it serves fetches.
  pub fn new(origin: Url, config: WorkerConfig, store: Arc<S>, fetcher: F) -> Self {
    Self {
      origin,
      config,
      store,
      fetcher,
      state: WorkerState::Parsed,
    }
  }

  /// Resume an already-activated worker (the host platform persists the
  /// registration across restarts; install/activate ran in a previous
  /// instance).
  pub fn activated(origin: Url, config: WorkerConfig, store: Arc<S>, fetcher: F) -> Self {
    Self {
      state: WorkerState::Activated,
      ..Self::new(origin, config, store, fetcher)
    }
  }

  pub fn state(&self) -> WorkerState {
    self.state
  }

  /// Dispatch one lifecycle event.
  pub async fn handle_event(&mut self, event: WorkerEvent) -> EventOutcome {
    match event {
      WorkerEvent::Install if self.state == WorkerState::Parsed => self.install().await,
      WorkerEvent::Activate
        if matches!(self.state, WorkerState::Parsed | WorkerState::Installed) =>
      {
        self.activate()
      }
      WorkerEvent::Fetch(request) if self.state.can_serve() => self.handle_fetch(&request).await,
      WorkerEvent::Sync { tag } if self.state.can_serve() => self.sync(&tag).await,
      WorkerEvent::Push { payload } if self.state.can_serve() => self.push(payload),
      WorkerEvent::NotificationClick { windows } if self.state.can_serve() => {
        self.notification_click(&windows)
      }
      WorkerEvent::Message(ClientMessage::SkipWaiting)
        if self.state == WorkerState::Installed =>
      {
        info!("Skip-waiting requested, promoting immediately");
        EventOutcome::SkipWaiting
      }
      event => {
        debug!("Ignoring {:?} in state {}", event, self.state);
        EventOutcome::Ignored
      }
    }
  }

  /// Warm the shell cache. Best-effort per asset: a failed fetch is logged
  /// and skipped, and installation always completes.
  async fn install(&mut self) -> EventOutcome {
    self.state = WorkerState::Installing;
    info!(generation = %self.config.generation, "Caching app shell");

    let urls: Vec<Url> = self
      .config
      .shell_assets
      .iter()
      .filter_map(|asset| match self.resolve(asset) {
        Ok(url) => Some(url),
        Err(e) => {
          warn!("Skipping unresolvable shell asset {}: {}", asset, e);
          None
        }
      })
      .collect();

    let fetcher = &self.fetcher;
    let fetches = urls.iter().map(|url| {
      let request = FetchRequest::get(url.clone());
      async move { fetcher.fetch(&request).await }
    });
    let results = join_all(fetches).await;

    let mut assets_cached = 0;
    for (url, result) in urls.iter().zip(results) {
      match result {
        Ok(response) if response.is_success() => {
          if self.cache_put(url, &response) {
            assets_cached += 1;
          }
        }
        Ok(response) => {
          warn!("Shell asset {} returned HTTP {}, skipping", url, response.status);
        }
        Err(e) => {
          warn!("Failed to warm shell asset {}: {}", url, e);
        }
      }
    }

    self.state = WorkerState::Installed;
    EventOutcome::Installed { assets_cached }
  }

  /// Evict every generation other than the current one, then have the host
  /// claim all open pages.
  fn activate(&mut self) -> EventOutcome {
    self.state = WorkerState::Activating;

    match self.store.generations() {
      Ok(names) => {
        for name in names {
          if name != self.config.generation {
            info!("Deleting old cache generation: {}", name);
            if let Err(e) = self.store.delete_generation(&name) {
              warn!("Failed to delete generation {}: {}", name, e);
            }
          }
        }
      }
      Err(e) => warn!("Failed to enumerate cache generations: {}", e),
    }

    self.state = WorkerState::Activated;
    EventOutcome::Activated {
      claim_clients: true,
    }
  }

  /// Serve one intercepted request through the strategy matching its
  /// content negotiation. Cross-origin requests pass through untouched.
  async fn handle_fetch(&self, request: &FetchRequest) -> EventOutcome {
    if request.url.origin() != self.origin.origin() {
      return EventOutcome::PassThrough;
    }

    let response = if request.accepts_html() {
      self.network_first(request).await
    } else {
      self.cache_first(request).await
    };

    EventOutcome::Response(response)
  }

  /// Network-first: live response wins (and a GET that returned 200
  /// refreshes the cache); offline falls back to the exact cached match,
  /// then the fallback document.
  async fn network_first(&self, request: &FetchRequest) -> FetchResponse {
    match self.fetcher.fetch(request).await {
      Ok(response) => {
        if response.is_success() && request.method == Method::GET {
          self.cache_put(&request.url, &response);
        }
        response
      }
      Err(e) => {
        debug!("Network unavailable for {}: {}", request.url, e);

        if let Some(cached) = self.cache_get(&request.url) {
          debug!("Serving copy cached at {}", cached.cached_at);
          return cached.into();
        }

        if let Ok(fallback) = self.resolve(&self.config.fallback_document) {
          if let Some(cached) = self.cache_get(&fallback) {
            return cached.into();
          }
        }

        FetchResponse::offline_unavailable()
      }
    }
  }

  /// Cache-first: a hit is served without touching the network; a miss is
  /// fetched and cached when it was a plain GET that succeeded.
  async fn cache_first(&self, request: &FetchRequest) -> FetchResponse {
    if let Some(cached) = self.cache_get(&request.url) {
      return cached.into();
    }

    match self.fetcher.fetch(request).await {
      Ok(response) => {
        if response.is_success() && request.method == Method::GET {
          self.cache_put(&request.url, &response);
        }
        response
      }
      Err(e) => {
        debug!("Network unavailable for {}: {}", request.url, e);
        FetchResponse::offline_unavailable()
      }
    }
  }

  /// Best-effort refresh of app state; retry scheduling belongs to the
  /// host's sync machinery.
  async fn sync(&self, tag: &str) -> EventOutcome {
    if tag != self.config.sync_tag {
      debug!("Ignoring sync event with tag {}", tag);
      return EventOutcome::Ignored;
    }

    let url = match self.resolve(&self.config.sync_endpoint) {
      Ok(url) => url,
      Err(e) => {
        warn!("Invalid sync endpoint {}: {}", self.config.sync_endpoint, e);
        return EventOutcome::Synced { ok: false };
      }
    };

    match self.fetcher.fetch(&FetchRequest::get(url)).await {
      Ok(_) => EventOutcome::Synced { ok: true },
      Err(e) => {
        warn!("Background sync failed: {}", e);
        EventOutcome::Synced { ok: false }
      }
    }
  }

  /// Build the notification for a push payload.
  fn push(&self, payload: Option<String>) -> EventOutcome {
    EventOutcome::ShowNotification(Notification {
      title: self.config.notification_title.clone(),
      body: payload.unwrap_or_else(|| DEFAULT_PUSH_BODY.to_string()),
      icon: self.config.notification_icon.clone(),
      badge: self.config.notification_badge.clone(),
      tag: self.config.notification_tag.clone(),
      require_interaction: false,
    })
  }

  /// Focus an open window showing the app root, else open a new one.
  fn notification_click(&self, windows: &[ClientWindow]) -> EventOutcome {
    let root = self.origin.to_string();

    for window in windows {
      if window.url == root && window.focusable {
        return EventOutcome::NotificationAction(ClientAction::Focus(window.id));
      }
    }

    EventOutcome::NotificationAction(ClientAction::OpenWindow(root))
  }

  /// Resolve a possibly-relative asset path against the panel origin.
  fn resolve(&self, asset: &str) -> Result<Url, url::ParseError> {
    match Url::parse(asset) {
      Ok(url) => Ok(url),
      Err(url::ParseError::RelativeUrlWithoutBase) => self.origin.join(asset),
      Err(e) => Err(e),
    }
  }

  /// Cache write that absorbs storage failures.
  fn cache_put(&self, url: &Url, response: &FetchResponse) -> bool {
    match self
      .store
      .put(&self.config.generation, url, &CachedResponse::snapshot(response))
    {
      Ok(()) => true,
      Err(e) => {
        warn!("Failed to cache {}: {}", url, e);
        false
      }
    }
  }

  /// Cache read that absorbs storage failures (treated as a miss).
  fn cache_get(&self, url: &Url) -> Option<CachedResponse> {
    match self.store.get(&self.config.generation, url) {
      Ok(hit) => hit,
      Err(e) => {
        warn!("Cache lookup failed for {}: {}", url, e);
        None
      }
    }
  }
}
