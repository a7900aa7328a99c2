//! Configuration for a delivery stack.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Default API version path segment.
pub const DEFAULT_API_VERSION: &str = "v3";

/// Default live preview host.
pub const DEFAULT_PREVIEW_HOST: &str = "rest-preview.contentstack.com";

/// Hosting region of a stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Region {
    /// North America (AWS).
    #[default]
    Us,
    /// Europe (AWS).
    Eu,
    /// North America (Azure).
    AzureNa,
    /// Europe (Azure).
    AzureEu,
    /// North America (GCP).
    GcpNa,
}

impl Region {
    /// Returns the delivery host for this region.
    pub fn host(&self) -> &'static str {
        match self {
            Region::Us => "cdn.contentstack.io",
            Region::Eu => "eu-cdn.contentstack.com",
            Region::AzureNa => "azure-na-cdn.contentstack.com",
            Region::AzureEu => "azure-eu-cdn.contentstack.com",
            Region::GcpNa => "gcp-na-cdn.contentstack.com",
        }
    }

    /// Returns the short name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Us => "us",
            Region::Eu => "eu",
            Region::AzureNa => "azure-na",
            Region::AzureEu => "azure-eu",
            Region::GcpNa => "gcp-na",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Region {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "us" | "na" => Ok(Region::Us),
            "eu" => Ok(Region::Eu),
            "azure-na" => Ok(Region::AzureNa),
            "azure-eu" => Ok(Region::AzureEu),
            "gcp-na" => Ok(Region::GcpNa),
            other => Err(Error::Config(format!("unknown region: {}", other))),
        }
    }
}

/// Live preview settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LivePreviewConfig {
    /// Whether drafts are fetched and merged.
    #[serde(default)]
    pub enable: bool,
    /// Preview token (for the preview host).
    #[serde(default)]
    pub preview_token: Option<String>,
    /// Management token (sent as `authorization`).
    #[serde(default)]
    pub management_token: Option<String>,
    /// Host that serves drafts.
    #[serde(default = "default_preview_host")]
    pub host: String,
}

impl LivePreviewConfig {
    /// Creates an enabled live preview configuration using a preview token.
    pub fn with_preview_token(token: impl Into<String>) -> Self {
        Self {
            enable: true,
            preview_token: Some(token.into()),
            management_token: None,
            host: default_preview_host(),
        }
    }

    /// Creates an enabled live preview configuration using a management token.
    pub fn with_management_token(token: impl Into<String>) -> Self {
        Self {
            enable: true,
            preview_token: None,
            management_token: Some(token.into()),
            host: default_preview_host(),
        }
    }

    /// Sets the preview host.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Returns the header that authorizes draft requests.
    pub fn auth_header(&self) -> Option<(&'static str, &str)> {
        if let Some(token) = &self.preview_token {
            Some(("preview_token", token.as_str()))
        } else {
            self.management_token
                .as_deref()
                .map(|token| ("authorization", token))
        }
    }

    fn validate(&self) -> Result<()> {
        if !self.enable {
            return Ok(());
        }
        let tokens = [&self.preview_token, &self.management_token]
            .iter()
            .filter(|t| t.as_deref().is_some_and(|t| !t.is_empty()))
            .count();
        if tokens != 1 {
            return Err(Error::Config(
                "live preview needs exactly one of preview_token or management_token".into(),
            ));
        }
        if self.host.trim().is_empty() {
            return Err(Error::Config("live preview host is empty".into()));
        }
        Ok(())
    }
}

/// Configuration for a stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackConfig {
    /// Stack API key.
    pub api_key: String,
    /// Delivery token.
    pub delivery_token: String,
    /// Publishing environment.
    pub environment: String,
    /// Hosting region.
    #[serde(default)]
    pub region: Region,
    /// Host override; takes precedence over the region.
    #[serde(default)]
    pub host: Option<String>,
    /// API version path segment.
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Branch.
    #[serde(default)]
    pub branch: Option<String>,
    /// Early access features.
    #[serde(default)]
    pub early_access: Vec<String>,
    /// Request timeout, stored in milliseconds.
    #[serde(default = "default_timeout", rename = "timeout_ms", with = "millis")]
    pub timeout: Duration,
    /// Upper bound on pages fetched by one sync.
    #[serde(default = "default_max_sync_pages")]
    pub max_sync_pages: usize,
    /// Live preview settings.
    #[serde(default)]
    pub live_preview: Option<LivePreviewConfig>,
}

impl StackConfig {
    /// Creates a new stack configuration.
    pub fn new(
        api_key: impl Into<String>,
        delivery_token: impl Into<String>,
        environment: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            delivery_token: delivery_token.into(),
            environment: environment.into(),
            region: Region::Us,
            host: None,
            api_version: default_api_version(),
            branch: None,
            early_access: Vec::new(),
            timeout: default_timeout(),
            max_sync_pages: default_max_sync_pages(),
            live_preview: None,
        }
    }

    /// Loads a configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        serde_json::from_str(&data)
            .map_err(|e| Error::Config(format!("cannot parse {}: {}", path.display(), e)))
    }

    /// Sets the region.
    pub fn with_region(mut self, region: Region) -> Self {
        self.region = region;
        self
    }

    /// Overrides the delivery host.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Sets the API version.
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Sets the branch.
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    /// Sets the early access features.
    pub fn with_early_access<I, S>(mut self, features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.early_access = features.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the sync page bound.
    pub fn with_max_sync_pages(mut self, pages: usize) -> Self {
        self.max_sync_pages = pages;
        self
    }

    /// Enables live preview.
    pub fn with_live_preview(mut self, live_preview: LivePreviewConfig) -> Self {
        self.live_preview = Some(live_preview);
        self
    }

    /// Returns the delivery host.
    pub fn host(&self) -> &str {
        self.host.as_deref().unwrap_or(self.region.host())
    }

    /// Returns the delivery base URL, e.g. `https://cdn.contentstack.io/v3`.
    pub fn base_url(&self) -> String {
        format!("https://{}/{}", self.host(), self.api_version)
    }

    /// Returns the live preview settings if live preview is switched on.
    pub fn active_live_preview(&self) -> Option<&LivePreviewConfig> {
        self.live_preview.as_ref().filter(|lp| lp.enable)
    }

    /// Returns the preview base URL if live preview is switched on.
    pub fn preview_base_url(&self) -> Option<String> {
        self.active_live_preview()
            .map(|lp| format!("https://{}/{}", lp.host, self.api_version))
    }

    /// Checks that the configuration can be used.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("api_key", &self.api_key),
            ("delivery_token", &self.delivery_token),
            ("environment", &self.environment),
            ("api_version", &self.api_version),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(Error::Config(format!("{} is empty", name)));
            }
        }
        if self.host.as_deref().is_some_and(|h| h.trim().is_empty()) {
            return Err(Error::Config("host override is empty".into()));
        }
        if self.max_sync_pages == 0 {
            return Err(Error::Config("max_sync_pages must be positive".into()));
        }
        if self.timeout.is_zero() {
            return Err(Error::Config("timeout must be positive".into()));
        }
        if let Some(live_preview) = &self.live_preview {
            live_preview.validate()?;
        }
        Ok(())
    }
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

fn default_preview_host() -> String {
    DEFAULT_PREVIEW_HOST.to_string()
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_max_sync_pages() -> usize {
    1000
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let millis = u64::try_from(value.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
