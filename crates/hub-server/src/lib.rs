//! Configuration and router assembly for the Event Hub server binary.

use std::path::{Path, PathBuf};

use axum::Router;
use chrono::FixedOffset;
use hub_api::{ApiSettings, ApiState, HubStore, api_router};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and `HUB_*`
/// environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                     String,
  #[serde(default = "default_port")]
  pub port:                     u16,
  pub store_path:               PathBuf,
  /// Offset from UTC, in minutes, used to group the audit log by day.
  #[serde(default)]
  pub audit_utc_offset_minutes: i32,
  #[serde(default = "default_page_size")]
  pub audit_page_size:          u32,
}

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 8080 }

fn default_page_size() -> u32 { 20 }

impl ServerConfig {
  /// Audit presentation settings, validated.
  pub fn api_settings(&self) -> anyhow::Result<ApiSettings> {
    let audit_offset = FixedOffset::east_opt(self.audit_utc_offset_minutes * 60)
      .ok_or_else(|| {
        anyhow::anyhow!(
          "audit_utc_offset_minutes out of range: {}",
          self.audit_utc_offset_minutes
        )
      })?;
    if self.audit_page_size == 0 {
      anyhow::bail!("audit_page_size must be positive");
    }
    Ok(ApiSettings { audit_offset, audit_page_size: self.audit_page_size })
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The API mounted under `/api`, with request tracing.
pub fn app<S: HubStore>(state: ApiState<S>) -> Router {
  Router::new()
    .nest("/api", api_router(state))
    .layer(TraceLayer::new_for_http())
}
