use std::path::Path;
use std::time::Duration;

use log::debug;
use serde::Deserialize;

use crate::vr::VrProps;
use crate::{PingRegistry, PingSink, Result, ViewtrackError, DEFAULT_PING_DELAY_MS};

/// Session configuration for the player integration.
///
/// Replaces the loosely-typed page globals the integration used to probe
/// for: every recognized option is an explicit field with a default, decoded
/// from the page's JSON payload (camelCase keys).
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlayerOptions {
    /// Whether the page hosts a VR-tagged video
    pub is_vr: bool,
    /// Premium sessions do not send view-count pings
    pub is_premium: bool,
    /// Whether adaptive streaming is enabled for this session
    pub adaptive: bool,
    /// Playback time before the view-count ping fires
    pub ping_delay_ms: u64,
    /// Session-default view-count endpoint
    pub vc_server_url: Option<String>,
    /// Videos present on the page
    pub videos: Vec<VideoEntry>,
}

impl Default for PlayerOptions {
    fn default() -> Self {
        Self {
            is_vr: false,
            is_premium: false,
            adaptive: false,
            ping_delay_ms: DEFAULT_PING_DELAY_MS,
            vc_server_url: None,
            videos: Vec::new(),
        }
    }
}

/// Per-video configuration bundle (the page's "flashvars")
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoEntry {
    pub id: String,
    /// View-count endpoint override for this video
    #[serde(default)]
    pub vc_server_url: Option<String>,
    /// Fallback URL the resolved VR format gets upserted into
    #[serde(default)]
    pub cors_fallback_url: Option<String>,
    /// Stereo layout, present only for VR videos
    #[serde(default)]
    pub vr: Option<VrProps>,
}

impl PlayerOptions {
    /// Decode options from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load options from a JSON file
    pub fn from_path(path: &Path) -> Result<Self> {
        debug!("loading player options from {}", path.display());
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Validate decoded options
    pub fn validate(&self) -> Result<()> {
        if self.ping_delay_ms == 0 {
            return Err(ViewtrackError::InvalidConfig(
                "pingDelayMs must be greater than 0".to_string(),
            ));
        }

        if let Some(url) = &self.vc_server_url {
            if url.is_empty() {
                return Err(ViewtrackError::InvalidConfig(
                    "vcServerUrl must not be empty".to_string(),
                ));
            }
        }

        let mut seen = std::collections::HashSet::new();
        for video in &self.videos {
            if video.id.is_empty() {
                return Err(ViewtrackError::InvalidConfig(
                    "video id must not be empty".to_string(),
                ));
            }
            if !seen.insert(video.id.as_str()) {
                return Err(ViewtrackError::InvalidConfig(format!(
                    "duplicate video id: {}",
                    video.id
                )));
            }
            if let Some(url) = &video.vc_server_url {
                if url.is_empty() {
                    return Err(ViewtrackError::InvalidConfig(format!(
                        "vcServerUrl for {} must not be empty",
                        video.id
                    )));
                }
            }
        }

        Ok(())
    }

    /// The configured ping delay as a [`Duration`]
    pub fn ping_delay(&self) -> Duration {
        Duration::from_millis(self.ping_delay_ms)
    }

    /// Build the session ping registry: default endpoint plus per-video
    /// overrides, wired to the given transport.
    pub fn registry(&self, sink: Box<dyn PingSink>) -> PingRegistry {
        let mut registry = PingRegistry::new(sink);
        if let Some(url) = &self.vc_server_url {
            registry.set_endpoint(url.clone(), None);
        }
        for video in &self.videos {
            if let Some(url) = &video.vc_server_url {
                registry.set_endpoint(url.clone(), Some(&video.id));
            }
        }
        registry
    }
}
