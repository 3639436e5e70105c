use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::worker::WorkerConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub panel: PanelConfig,
  /// Offline shell-cache settings (defaults match the stock panel)
  #[serde(default)]
  pub worker: WorkerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PanelConfig {
  /// Base URL of the control panel, e.g. "https://seedbox.example.com"
  pub url: String,
  /// Path prefix for the JSON API
  #[serde(default = "default_api_root")]
  pub api_root: String,
}

fn default_api_root() -> String {
  "/api".to_string()
}

impl PanelConfig {
  /// Full API root URL ("<url><api_root>").
  pub fn api_base(&self) -> String {
    format!("{}{}", self.url.trim_end_matches('/'), self.api_root)
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./sbx.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/sbx/config.yaml
  /// 4. ~/.config/sbx/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(eyre!(
        "No configuration file found. Create one at ~/.config/sbx/config.yaml\n\
                 See config.example.yaml for the format."
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("sbx.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("sbx").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }

  /// Get the panel password from environment variables.
  ///
  /// Checks SBX_PASSWORD.
  pub fn get_password() -> Result<String> {
    std::env::var("SBX_PASSWORD")
      .map_err(|_| eyre!("Panel password not found. Set SBX_PASSWORD environment variable."))
  }

  /// Get the default data directory for token and cache databases.
  pub fn data_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("sbx"))
  }
}
