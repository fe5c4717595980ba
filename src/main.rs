use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use log::{debug, error, info};
use tokio::time::sleep;

use viewtrack::{
    vr_attributes, Cli, HttpPingSink, LogPingSink, PingSink, PlayerOptions, ViewTracker,
};

/// Extra wait beyond the ping delay so fire-and-forget sends get off the ground
const PING_GRACE: Duration = Duration::from_millis(250);

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Parse command line arguments
    let cli = Cli::parse();

    // Validate CLI arguments
    if let Err(e) = cli.validate() {
        error!("Invalid arguments: {}", e);
        std::process::exit(1);
    }

    // Set up logging level
    if cli.verbose {
        log::set_max_level(log::LevelFilter::Debug);
    }

    info!("Starting viewtrack v{}", env!("CARGO_PKG_VERSION"));
    info!("Options: {}", cli.config_path.display());

    // Load and validate the session options
    let options = PlayerOptions::from_path(&cli.config_path)?;
    options.validate()?;

    let ping_delay = cli.effective_ping_delay(&options);
    debug!(
        "session: {} video(s), VR {}, premium {}, ping delay {}ms",
        options.videos.len(),
        options.is_vr,
        options.is_premium,
        ping_delay.as_millis()
    );

    report_session(&options);

    if cli.info_only {
        return Ok(());
    }

    if !cli.ping {
        info!("No --ping requested, nothing to do");
        return Ok(());
    }

    if options.is_premium {
        info!("Premium session: view-count pings are disabled");
        return Ok(());
    }

    // Run one view-count cycle for every configured video
    let sink: Box<dyn PingSink> = if cli.use_http() {
        Box::new(HttpPingSink::new())
    } else {
        info!("Dry run: pings will be logged, not sent");
        Box::new(LogPingSink)
    };

    let registry = options.registry(sink);
    let mut tracker = ViewTracker::new(registry, ping_delay);

    for video in &options.videos {
        tracker.on_playing(&video.id);
    }
    info!(
        "Started {} view-count timer(s), waiting {}ms",
        options.videos.len(),
        ping_delay.as_millis()
    );

    sleep(ping_delay + PING_GRACE).await;

    if tracker.has_pinged() {
        info!("View-count cycle complete, pings sent");
    } else {
        info!("View-count cycle complete, no pings sent (no endpoints configured?)");
    }

    Ok(())
}

/// Print the resolved per-video tracking and VR attributes
fn report_session(options: &PlayerOptions) {
    println!("Session:");
    println!("  VR: {}", options.is_vr);
    println!("  Premium: {}", options.is_premium);
    println!("  Adaptive: {}", options.adaptive);
    println!("  Ping delay: {} ms", options.ping_delay_ms);
    if let Some(url) = &options.vc_server_url {
        println!("  Default endpoint: {}", url);
    }

    for video in &options.videos {
        println!("Video {}:", video.id);
        if let Some(url) = &video.vc_server_url {
            println!("  Endpoint: {}", url);
        }
        match (&video.vr, options.is_vr) {
            (Some(props), true) => {
                let fallback = video.cors_fallback_url.as_deref().unwrap_or("");
                let attrs = vr_attributes(props, fallback);
                println!("  Format: {}", attrs.format);
                if !fallback.is_empty() {
                    println!("  Fallback URL: {}", attrs.cors_fallback_url);
                }
            }
            (Some(_), false) => {
                println!("  Format: (VR props present but session is not VR)");
            }
            _ => {}
        }
    }
}
