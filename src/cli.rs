use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::PlayerOptions;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the player options JSON file
    #[arg(required = true)]
    pub config_path: PathBuf,

    /// Show resolved formats and endpoints only (don't ping)
    #[arg(long)]
    pub info_only: bool,

    /// Run the view-count cycle for each configured video
    #[arg(short, long)]
    pub ping: bool,

    /// Log pings instead of sending HTTP requests
    #[arg(short, long)]
    pub dry_run: bool,

    /// Override the configured ping delay (milliseconds)
    #[arg(long, value_name = "MILLIS")]
    pub ping_delay_ms: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Validate command line arguments
    pub fn validate(&self) -> Result<(), String> {
        // Check if the options file exists
        if !self.config_path.exists() {
            return Err(format!(
                "Options file does not exist: {}",
                self.config_path.display()
            ));
        }

        if self.info_only && self.ping {
            return Err("--info-only and --ping are mutually exclusive".to_string());
        }

        if let Some(delay) = self.ping_delay_ms {
            if delay == 0 {
                return Err("Ping delay must be greater than 0".to_string());
            }
        }

        Ok(())
    }

    /// The ping delay to use: CLI override, else the configured value
    pub fn effective_ping_delay(&self, options: &PlayerOptions) -> Duration {
        self.ping_delay_ms
            .map(Duration::from_millis)
            .unwrap_or_else(|| options.ping_delay())
    }

    /// Whether pings should go over the wire
    pub fn use_http(&self) -> bool {
        !self.dry_run
    }
}
