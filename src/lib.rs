//! Viewtrack - playback view-count tracking for embedded video players
//!
//! This crate provides the page-integration core of a video player widget:
//! pause/resume-accurate ping timers, a per-session ping registry with
//! deduplication, a stereoscopic VR format resolver, and the URL
//! query-parameter utilities used to propagate the resolved format into
//! fallback URLs.

pub mod cli;
pub mod config;
pub mod ping;
pub mod timer;
pub mod tracker;
pub mod vr;

pub use cli::Cli;
pub use config::{PlayerOptions, VideoEntry};
pub use ping::{HttpPingSink, LogPingSink, PingRegistry, PingSink};
pub use timer::ResumableTimer;
pub use tracker::ViewTracker;
pub use vr::{
    query_param, resolve_format, upsert_query_param, vr_attributes, StereoType, VrAttributes,
    VrFormat, VrProps,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Package name
pub const PACKAGE_NAME: &str = env!("CARGO_PKG_NAME");

/// Package description
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Delay of actual playback time before a view counts, in milliseconds
pub const DEFAULT_PING_DELAY_MS: u64 = 10_000;

/// Query parameter carrying the VR format in fallback URLs
pub const FORMAT_QUERY_KEY: &str = "format";

/// Query parameter used as the ping deduplication key
pub const DEDUP_QUERY_KEY: &str = "svalue";

/// Error types used throughout the application
#[derive(thiserror::Error, Debug)]
pub enum ViewtrackError {
    #[error("view-count endpoint not set")]
    EndpointNotSet,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

/// Result type alias for this crate
pub type Result<T> = std::result::Result<T, ViewtrackError>;

/// Utility functions
pub mod utils {
    /// Format seconds the way the video time slider shows them: zero-padded
    /// `MM:SS`, with an hours segment only when there is at least one hour.
    pub fn pretty_time(seconds: f64) -> String {
        let total_seconds = seconds.max(0.0) as u64;
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let secs = total_seconds % 60;

        if hours > 0 {
            format!("{:02}:{:02}:{:02}", hours, minutes, secs)
        } else {
            format!("{:02}:{:02}", minutes, secs)
        }
    }
}

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        query_param, resolve_format, upsert_query_param, utils::*, vr_attributes, Cli,
        HttpPingSink, LogPingSink, PingRegistry, PingSink, PlayerOptions, ResumableTimer, Result,
        StereoType, VideoEntry, ViewTracker, ViewtrackError, VrAttributes, VrFormat, VrProps,
    };
}
