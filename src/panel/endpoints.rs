//! Derived endpoint methods, grouped by integration.
//!
//! These are pure verb+path+body mappings over the generic request helpers;
//! responses are passed through as raw JSON.

use serde_json::Value;

use super::client::ApiClient;
use super::error::Result;
use super::tokens::TokenStore;
use super::transport::HttpTransport;

impl<T: HttpTransport, S: TokenStore> ApiClient<T, S> {
  // ==========================================================================
  // System
  // ==========================================================================

  pub async fn system_stats(&self) -> Result<Value> {
    self.get("/system/stats").await
  }

  pub async fn system_history(&self, hours: u32) -> Result<Value> {
    self.get(&format!("/system/history?hours={}", hours)).await
  }

  // ==========================================================================
  // Docker
  // ==========================================================================

  pub async fn docker_status(&self) -> Result<Value> {
    self.get("/docker/status").await
  }

  pub async fn containers(&self) -> Result<Value> {
    self.get("/docker/containers").await
  }

  pub async fn container(&self, id: &str) -> Result<Value> {
    self.get(&format!("/docker/containers/{}", id)).await
  }

  pub async fn start_container(&self, id: &str) -> Result<Value> {
    self
      .post(&format!("/docker/containers/{}/start", id), Value::Object(Default::default()))
      .await
  }

  pub async fn stop_container(&self, id: &str) -> Result<Value> {
    self
      .post(&format!("/docker/containers/{}/stop", id), Value::Object(Default::default()))
      .await
  }

  pub async fn restart_container(&self, id: &str) -> Result<Value> {
    self
      .post(&format!("/docker/containers/{}/restart", id), Value::Object(Default::default()))
      .await
  }

  pub async fn container_logs(&self, id: &str, tail: u32) -> Result<Value> {
    self
      .get(&format!("/docker/containers/{}/logs?tail={}", id, tail))
      .await
  }

  // ==========================================================================
  // Radarr
  // ==========================================================================

  pub async fn radarr_health(&self) -> Result<Value> {
    self.get("/radarr/health").await
  }

  pub async fn radarr_movies(&self) -> Result<Value> {
    self.get("/radarr/movies").await
  }

  pub async fn radarr_stats(&self) -> Result<Value> {
    self.get("/radarr/stats").await
  }

  pub async fn radarr_queue(&self) -> Result<Value> {
    self.get("/radarr/queue").await
  }

  // ==========================================================================
  // Sonarr
  // ==========================================================================

  pub async fn sonarr_health(&self) -> Result<Value> {
    self.get("/sonarr/health").await
  }

  pub async fn sonarr_series(&self) -> Result<Value> {
    self.get("/sonarr/series").await
  }

  pub async fn sonarr_stats(&self) -> Result<Value> {
    self.get("/sonarr/stats").await
  }

  pub async fn sonarr_queue(&self) -> Result<Value> {
    self.get("/sonarr/queue").await
  }

  // ==========================================================================
  // Overseerr
  // ==========================================================================

  pub async fn overseerr_health(&self) -> Result<Value> {
    self.get("/overseerr/health").await
  }

  pub async fn overseerr_requests(&self, status: &str) -> Result<Value> {
    self.get(&format!("/overseerr/requests?status={}", status)).await
  }

  pub async fn approve_request(&self, request_id: u64) -> Result<Value> {
    self
      .post(
        &format!("/overseerr/requests/{}/approve", request_id),
        Value::Object(Default::default()),
      )
      .await
  }

  pub async fn decline_request(&self, request_id: u64) -> Result<Value> {
    self
      .post(
        &format!("/overseerr/requests/{}/decline", request_id),
        Value::Object(Default::default()),
      )
      .await
  }

  // ==========================================================================
  // Plex
  // ==========================================================================

  pub async fn plex_health(&self) -> Result<Value> {
    self.get("/plex/health").await
  }

  pub async fn plex_status(&self) -> Result<Value> {
    self.get("/plex/status").await
  }

  pub async fn plex_libraries(&self) -> Result<Value> {
    self.get("/plex/libraries").await
  }

  pub async fn plex_sessions(&self) -> Result<Value> {
    self.get("/plex/sessions").await
  }

  pub async fn plex_streams(&self, count: u32) -> Result<Value> {
    self.get(&format!("/plex/streams?count={}", count)).await
  }

  pub async fn restart_plex(&self) -> Result<Value> {
    self.post("/plex/restart", Value::Object(Default::default())).await
  }

  pub async fn optimize_plex_database(&self) -> Result<Value> {
    self.post("/plex/optimize", Value::Object(Default::default())).await
  }

  pub async fn scan_plex_library(&self, library_key: &str) -> Result<Value> {
    self
      .post(
        &format!("/plex/libraries/{}/scan", library_key),
        Value::Object(Default::default()),
      )
      .await
  }

  // ==========================================================================
  // Tautulli
  // ==========================================================================

  pub async fn tautulli_health(&self) -> Result<Value> {
    self.get("/tautulli/health").await
  }

  pub async fn tautulli_status(&self) -> Result<Value> {
    self.get("/tautulli/status").await
  }

  pub async fn tautulli_activity(&self) -> Result<Value> {
    self.get("/tautulli/activity").await
  }

  pub async fn tautulli_stats(&self) -> Result<Value> {
    self.get("/tautulli/stats").await
  }

  pub async fn tautulli_users(&self) -> Result<Value> {
    self.get("/tautulli/users").await
  }

  pub async fn tautulli_libraries(&self) -> Result<Value> {
    self.get("/tautulli/libraries").await
  }

  pub async fn tautulli_history(&self, count: u32) -> Result<Value> {
    self.get(&format!("/tautulli/history?count={}", count)).await
  }

  pub async fn tautulli_server_info(&self) -> Result<Value> {
    self.get("/tautulli/server-info").await
  }

  pub async fn restart_tautulli(&self) -> Result<Value> {
    self.post("/tautulli/restart", Value::Object(Default::default())).await
  }

  // ==========================================================================
  // uTorrent
  // ==========================================================================

  pub async fn utorrent_health(&self) -> Result<Value> {
    self.get("/utorrent/health").await
  }

  pub async fn utorrent_status(&self) -> Result<Value> {
    self.get("/utorrent/status").await
  }

  pub async fn utorrent_torrents(&self) -> Result<Value> {
    self.get("/utorrent/torrents").await
  }

  pub async fn utorrent_stats(&self) -> Result<Value> {
    self.get("/utorrent/stats").await
  }

  pub async fn utorrent_bandwidth(&self) -> Result<Value> {
    self.get("/utorrent/bandwidth").await
  }

  pub async fn start_utorrent(&self, hash: &str) -> Result<Value> {
    self
      .post(&format!("/utorrent/torrents/{}/start", hash), Value::Object(Default::default()))
      .await
  }

  pub async fn stop_utorrent(&self, hash: &str) -> Result<Value> {
    self
      .post(&format!("/utorrent/torrents/{}/stop", hash), Value::Object(Default::default()))
      .await
  }

  pub async fn pause_utorrent(&self, hash: &str) -> Result<Value> {
    self
      .post(&format!("/utorrent/torrents/{}/pause", hash), Value::Object(Default::default()))
      .await
  }

  pub async fn resume_utorrent(&self, hash: &str) -> Result<Value> {
    self
      .post(&format!("/utorrent/torrents/{}/resume", hash), Value::Object(Default::default()))
      .await
  }

  pub async fn remove_utorrent(&self, hash: &str, delete_files: bool) -> Result<Value> {
    self
      .post(
        &format!("/utorrent/torrents/{}/remove", hash),
        serde_json::json!({ "delete_files": delete_files }),
      )
      .await
  }

  pub async fn add_utorrent_url(&self, url: &str) -> Result<Value> {
    self
      .post("/utorrent/torrents/add-url", serde_json::json!({ "url": url }))
      .await
  }

  // ==========================================================================
  // ruTorrent
  // ==========================================================================

  pub async fn rutorrent_health(&self) -> Result<Value> {
    self.get("/rutorrent/health").await
  }

  pub async fn rutorrent_status(&self) -> Result<Value> {
    self.get("/rutorrent/status").await
  }

  pub async fn rutorrent_torrents(&self) -> Result<Value> {
    self.get("/rutorrent/torrents").await
  }

  pub async fn rutorrent_stats(&self) -> Result<Value> {
    self.get("/rutorrent/stats").await
  }

  pub async fn rutorrent_bandwidth(&self) -> Result<Value> {
    self.get("/rutorrent/bandwidth").await
  }

  pub async fn start_rutorrent(&self, hash: &str) -> Result<Value> {
    self
      .post(&format!("/rutorrent/torrents/{}/start", hash), Value::Object(Default::default()))
      .await
  }

  pub async fn stop_rutorrent(&self, hash: &str) -> Result<Value> {
    self
      .post(&format!("/rutorrent/torrents/{}/stop", hash), Value::Object(Default::default()))
      .await
  }

  pub async fn pause_rutorrent(&self, hash: &str) -> Result<Value> {
    self
      .post(&format!("/rutorrent/torrents/{}/pause", hash), Value::Object(Default::default()))
      .await
  }

  pub async fn resume_rutorrent(&self, hash: &str) -> Result<Value> {
    self
      .post(&format!("/rutorrent/torrents/{}/resume", hash), Value::Object(Default::default()))
      .await
  }

  pub async fn remove_rutorrent(&self, hash: &str, delete_files: bool) -> Result<Value> {
    self
      .post(
        &format!("/rutorrent/torrents/{}/remove", hash),
        serde_json::json!({ "delete_files": delete_files }),
      )
      .await
  }

  pub async fn restart_rutorrent(&self) -> Result<Value> {
    self.post("/rutorrent/restart", Value::Object(Default::default())).await
  }
}
