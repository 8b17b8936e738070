use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;
use url::Url;

use crate::auth::PublicKey;
use crate::error::ConfigError;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_OAUTH_REDIRECT_URL: &str = "http://localhost:3000/auth/callback";

const API_URL_VARS: &[&str] = &["DATASCRAP_API_URL", "NEXT_PUBLIC_API_URL"];
const IDENTITY_URL_VARS: &[&str] = &["DATASCRAP_IDENTITY_URL", "NEXT_PUBLIC_SUPABASE_URL"];
const IDENTITY_KEY_VARS: &[&str] = &[
    "DATASCRAP_IDENTITY_ANON_KEY",
    "NEXT_PUBLIC_SUPABASE_ANON_KEY",
];
const OAUTH_REDIRECT_VARS: &[&str] = &["DATASCRAP_OAUTH_REDIRECT_URL", "NEXT_PUBLIC_SITE_URL"];

/// Endpoints and credentials needed to talk to the backend and identity service.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: Url,
    pub identity_url: Url,
    pub identity_key: PublicKey,
    /// Where the identity service sends the browser after an OAuth sign-in.
    pub oauth_redirect_url: Url,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source. The API URL falls back to the local
    /// default; the identity URL and key are required.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let first = |names: &[&str]| {
            names
                .iter()
                .filter_map(|name| lookup(name))
                .map(|v| v.trim().to_owned())
                .find(|v| !v.is_empty())
        };

        let api_url = first(API_URL_VARS).unwrap_or_else(|| DEFAULT_API_URL.to_owned());
        let api_url = Url::parse(&api_url).map_err(|source| ConfigError::InvalidUrl {
            name: API_URL_VARS[0],
            source,
        })?;

        let identity_url = first(IDENTITY_URL_VARS).ok_or(ConfigError::Missing(IDENTITY_URL_VARS[0]))?;
        let identity_url = Url::parse(&identity_url).map_err(|source| ConfigError::InvalidUrl {
            name: IDENTITY_URL_VARS[0],
            source,
        })?;

        let identity_key = first(IDENTITY_KEY_VARS).ok_or(ConfigError::Missing(IDENTITY_KEY_VARS[0]))?;

        let oauth_redirect_url = match first(&OAUTH_REDIRECT_VARS[..1]) {
            Some(url) => url,
            None => first(&OAUTH_REDIRECT_VARS[1..])
                .map(|site| format!("{}/auth/callback", site.trim_end_matches('/')))
                .unwrap_or_else(|| DEFAULT_OAUTH_REDIRECT_URL.to_owned()),
        };
        let oauth_redirect_url =
            Url::parse(&oauth_redirect_url).map_err(|source| ConfigError::InvalidUrl {
                name: OAUTH_REDIRECT_VARS[0],
                source,
            })?;

        Ok(Self {
            api_url,
            identity_url,
            identity_key: PublicKey::new(identity_key),
            oauth_redirect_url,
        })
    }
}

/// Local dashboard preferences, persisted as `config.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub theme: ThemeConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeConfig {
    pub background_color: [u8; 3],
    pub panel_color: [u8; 3],
    pub accent_color: [u8; 3],
    pub text_color: [u8; 3],
    pub secondary_text_color: [u8; 3],
    pub success_color: [u8; 3],
    pub warning_color: [u8; 3],
    pub error_color: [u8; 3],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    pub font_size: f32,
    pub sidebar_width: f32,
    /// Items requested per list page.
    pub page_size: u32,
    pub show_summaries: bool,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            // slate palette
            background_color: [15, 23, 42],
            panel_color: [30, 41, 59],
            accent_color: [79, 70, 229],
            text_color: [241, 245, 249],
            secondary_text_color: [148, 163, 184],
            success_color: [74, 222, 128],
            warning_color: [250, 204, 21],
            error_color: [248, 113, 113],
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            font_size: 14.0,
            sidebar_width: 220.0,
            page_size: 50,
            show_summaries: true,
        }
    }
}

impl AppConfig {
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        let dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(dir.join("datascrap"))
    }

    /// Load from `dir/config.json`, writing defaults when the file is absent or unreadable.
    pub fn load_from_dir(dir: impl AsRef<Path>) -> Self {
        let path = dir.as_ref().join("config.json");
        match Self::read(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, path = %path.display(), "could not load config, using defaults");
                let config = Self::default();
                if let Err(save_err) = config.save_to(&path) {
                    warn!(error = %save_err, "could not save default config");
                }
                config
            }
        }
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Page size clamped to what list endpoints accept.
    pub fn page_size(&self) -> u32 {
        self.ui.page_size.clamp(1, 100)
    }
}

fn rgb([r, g, b]: [u8; 3]) -> egui::Color32 {
    egui::Color32::from_rgb(r, g, b)
}

impl ThemeConfig {
    pub fn background_color32(&self) -> egui::Color32 {
        rgb(self.background_color)
    }

    pub fn panel_color32(&self) -> egui::Color32 {
        rgb(self.panel_color)
    }

    pub fn accent_color32(&self) -> egui::Color32 {
        rgb(self.accent_color)
    }

    pub fn text_color32(&self) -> egui::Color32 {
        rgb(self.text_color)
    }

    pub fn secondary_text_color32(&self) -> egui::Color32 {
        rgb(self.secondary_text_color)
    }

    pub fn success_color32(&self) -> egui::Color32 {
        rgb(self.success_color)
    }

    pub fn warning_color32(&self) -> egui::Color32 {
        rgb(self.warning_color)
    }

    pub fn error_color32(&self) -> egui::Color32 {
        rgb(self.error_color)
    }
}
