use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_QUICK_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_QUICK_QUERY: &str = "Solve the problem shown in this screenshot";
pub const PROVIDER_GEMINI: &str = "gemini";
pub const PROVIDER_DRYRUN: &str = "dryrun";

/// Process-wide configuration. Loaded once at startup, then only read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub gemini_api_key: String,
    pub api_base: String,
    /// Directory scanned by the quick query.
    pub images_directory: Option<PathBuf>,
    /// Prompt sent with the latest screenshot.
    pub quick_query: String,
    pub default_query: Option<String>,
    /// Model for balanced and deep queries.
    pub model: String,
    pub quick_model: String,
    pub provider: String,
    pub request_timeout_s: f64,
    pub rate_limit_ms: u64,
    pub events_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            gemini_api_key: String::new(),
            api_base: DEFAULT_API_BASE.to_string(),
            images_directory: dirs::desktop_dir(),
            quick_query: DEFAULT_QUICK_QUERY.to_string(),
            default_query: None,
            model: DEFAULT_MODEL.to_string(),
            quick_model: DEFAULT_QUICK_MODEL.to_string(),
            provider: PROVIDER_GEMINI.to_string(),
            request_timeout_s: 120.0,
            rate_limit_ms: crate::limits::DEFAULT_MINIMUM_INTERVAL_MS,
            events_path: None,
        }
    }
}

impl Settings {
    /// [`Settings::resolve`] followed by validation.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let settings = Self::resolve(config_path)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Defaults, then the JSON file, then environment overrides. Not validated.
    ///
    /// An explicit `config_path` must exist; the default location is optional.
    pub fn resolve(config_path: Option<&Path>) -> Result<Self> {
        let mut settings = match config_path {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path().filter(|path| path.is_file()) {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };
        settings.apply_env_with(non_empty_env);
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("GEMINI_API_KEY").or_else(|| lookup("GOOGLE_API_KEY")) {
            self.gemini_api_key = key;
        }
        if let Some(base) = lookup("GEMINI_API_BASE") {
            self.api_base = base.trim_end_matches('/').to_string();
        }
        if let Some(dir) = lookup("ASKGEM_IMAGES_DIR") {
            self.images_directory = Some(PathBuf::from(dir));
        }
        if let Some(query) = lookup("ASKGEM_QUICK_QUERY") {
            self.quick_query = query;
        }
        if let Some(model) = lookup("ASKGEM_MODEL") {
            self.model = model;
        }
        if let Some(provider) = lookup("ASKGEM_PROVIDER") {
            self.provider = provider.to_ascii_lowercase();
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !matches!(self.provider.as_str(), PROVIDER_GEMINI | PROVIDER_DRYRUN) {
            bail!(
                "unknown provider '{}' (expected {PROVIDER_GEMINI} or {PROVIDER_DRYRUN})",
                self.provider
            );
        }
        if self.provider == PROVIDER_GEMINI && self.gemini_api_key.trim().is_empty() {
            bail!("Gemini API key is required (set GEMINI_API_KEY or gemini_api_key)");
        }
        if self.quick_query.trim().is_empty() {
            bail!("quick_query must not be empty");
        }
        if self.api_base.trim().is_empty() {
            bail!("api_base must not be empty");
        }
        Ok(())
    }

    pub fn is_dryrun(&self) -> bool {
        self.provider == PROVIDER_DRYRUN
    }

    pub fn request_timeout_s(&self) -> f64 {
        if self.request_timeout_s.is_finite() {
            self.request_timeout_s.clamp(5.0, 600.0)
        } else {
            120.0
        }
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("askgem").join("config.json"))
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
