//! Lifecycle events, handler outcomes and worker states.

use serde::Deserialize;

use super::fetch::{FetchRequest, FetchResponse};

/// Worker lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
  /// Constructed, nothing dispatched yet.
  Parsed,
  /// Install in progress (warming the shell cache).
  Installing,
  /// Installed, waiting to activate.
  Installed,
  /// Activate in progress (evicting stale generations).
  Activating,
  /// Active and serving fetches.
  Activated,
  /// Replaced or shut down.
  #[allow(dead_code)]
  Redundant,
}

impl WorkerState {
  /// Whether fetch/sync/push/notification events are serviced in this state.
  pub fn can_serve(&self) -> bool {
    matches!(self, WorkerState::Activated)
  }
}

impl std::fmt::Display for WorkerState {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let name = match self {
      WorkerState::Parsed => "parsed",
      WorkerState::Installing => "installing",
      WorkerState::Installed => "installed",
      WorkerState::Activating => "activating",
      WorkerState::Activated => "activated",
      WorkerState::Redundant => "redundant",
    };
    write!(f, "{}", name)
  }
}

/// A snapshot of an open client window, supplied by the host on
/// notification-click events.
#[derive(Debug, Clone)]
pub struct ClientWindow {
  pub id: u64,
  pub url: String,
  pub focusable: bool,
}

/// Control messages a page can send to the worker.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
  /// Promote a waiting update immediately instead of waiting for all tabs
  /// to close.
  #[serde(rename = "SKIP_WAITING")]
  SkipWaiting,
}

impl ClientMessage {
  /// Parse a raw client message. Unrecognized messages yield `None`.
  #[allow(dead_code)]
  pub fn parse(raw: &str) -> Option<Self> {
    serde_json::from_str(raw).ok()
  }
}

/// Events dispatched to the worker by its host.
#[derive(Debug, Clone)]
pub enum WorkerEvent {
  Install,
  Activate,
  Fetch(FetchRequest),
  Sync { tag: String },
  Push { payload: Option<String> },
  NotificationClick { windows: Vec<ClientWindow> },
  Message(ClientMessage),
}

/// A notification to display, fully assembled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
  pub title: String,
  pub body: String,
  pub icon: String,
  pub badge: String,
  pub tag: String,
  pub require_interaction: bool,
}

/// What the host should do after a notification click.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientAction {
  /// Focus an already-open window.
  Focus(u64),
  /// Open a new window at the given URL.
  OpenWindow(String),
}

/// Result of handling one event; the host acts on it.
#[derive(Debug, Clone)]
pub enum EventOutcome {
  /// Install finished; the worker always proceeds to skip-waiting.
  Installed { assets_cached: usize },
  /// Activation finished; the host should claim all open pages.
  Activated { claim_clients: bool },
  /// A response to serve for an intercepted request.
  Response(FetchResponse),
  /// Cross-origin request; the host lets it through untouched.
  PassThrough,
  /// Background sync finished (best-effort).
  Synced { ok: bool },
  /// Display this notification.
  ShowNotification(Notification),
  /// Close the notification and perform this client action.
  NotificationAction(ClientAction),
  /// A page requested immediate activation; the host should dispatch
  /// `Activate` next.
  SkipWaiting,
  /// Event not serviceable in the current state (or unrecognized tag).
  Ignored,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_skip_waiting_message_parses() {
    assert_eq!(
      ClientMessage::parse(r#"{"type": "SKIP_WAITING"}"#),
      Some(ClientMessage::SkipWaiting)
    );
  }

  #[test]
  fn test_unknown_messages_are_none() {
    assert_eq!(ClientMessage::parse(r#"{"type": "REFRESH"}"#), None);
    assert_eq!(ClientMessage::parse("not json"), None);
  }

  #[test]
  fn test_only_activated_serves() {
    assert!(WorkerState::Activated.can_serve());
    for state in [
      WorkerState::Parsed,
      WorkerState::Installing,
      WorkerState::Installed,
      WorkerState::Activating,
      WorkerState::Redundant,
    ] {
      assert!(!state.can_serve(), "{} should not serve", state);
    }
  }
}
