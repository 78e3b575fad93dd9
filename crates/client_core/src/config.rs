use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{anyhow, bail, Context};
use serde::Deserialize;
use url::Url;

pub const DEFAULT_CONFIG_FILE: &str = "designsphere.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_base_url: String,
    pub request_timeout: Duration,
    pub credential_path: Option<PathBuf>,
    pub booking_redirect_delay: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8000".into(),
            request_timeout: Duration::from_millis(10_000),
            credential_path: None,
            booking_redirect_delay: Duration::from_millis(2_000),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_base_url: Option<String>,
    request_timeout_ms: Option<u64>,
    credential_path: Option<PathBuf>,
    booking_redirect_delay_ms: Option<u64>,
}

impl Settings {
    /// Base URL normalized with a trailing slash so relative endpoint paths
    /// join underneath it.
    pub fn base_url(&self) -> anyhow::Result<Url> {
        let raw = self.api_base_url.trim();
        if raw.is_empty() {
            bail!("api base url is empty");
        }
        let mut url =
            Url::parse(raw).with_context(|| format!("invalid api base url '{raw}'"))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("api base url must use http or https, got '{}'", url.scheme());
        }
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }

    /// Location of the credential file, defaulting to the per-user data dir.
    pub fn resolved_credential_path(&self) -> anyhow::Result<PathBuf> {
        if let Some(path) = &self.credential_path {
            return Ok(path.clone());
        }
        let base = dirs::data_local_dir()
            .ok_or_else(|| anyhow!("unable to resolve local app data dir"))?;
        Ok(base.join("designsphere").join("credentials.json"))
    }
}

/// Defaults, then the config file (when present), then the environment.
pub fn load_settings(config_path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let path = config_path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
    match fs::read_to_string(path) {
        Ok(raw) => apply_file(&mut settings, &raw)
            .with_context(|| format!("failed to parse config file '{}'", path.display()))?,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound && config_path.is_none() => {}
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read config file '{}'", path.display()))
        }
    }

    apply_env(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

fn apply_file(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file_cfg: FileSettings = toml::from_str(raw)?;
    if let Some(v) = file_cfg.api_base_url {
        settings.api_base_url = v;
    }
    if let Some(v) = file_cfg.request_timeout_ms {
        settings.request_timeout = Duration::from_millis(v);
    }
    if let Some(v) = file_cfg.credential_path {
        settings.credential_path = Some(v);
    }
    if let Some(v) = file_cfg.booking_redirect_delay_ms {
        settings.booking_redirect_delay = Duration::from_millis(v);
    }
    Ok(())
}

fn apply_env(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("DESIGNSPHERE_API_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = lookup("APP__API_BASE_URL") {
        settings.api_base_url = v;
    }

    if let Some(v) = lookup("APP__REQUEST_TIMEOUT_MS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.request_timeout = Duration::from_millis(parsed);
        }
    }

    if let Some(v) = lookup("APP__CREDENTIAL_PATH") {
        settings.credential_path = Some(PathBuf::from(v));
    }

    if let Some(v) = lookup("APP__BOOKING_REDIRECT_DELAY_MS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.booking_redirect_delay = Duration::from_millis(parsed);
        }
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
