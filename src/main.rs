use anyhow::Result;
use clap::Parser;
use interview_live::Config;
use tracing::info;

#[derive(Parser)]
#[command(name = "interview-live", about = "Live voice interview session core")]
struct Args {
    /// Path to the configuration file (without extension)
    #[arg(long, default_value = "config/interview-live")]
    config: String,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("{} v0.1.0", cfg.service.name);
    info!("Interview channel: {}", cfg.channel.url);
    info!(
        "Audio: {}Hz capture / {}Hz playback, {}-sample frames",
        cfg.audio.capture_sample_rate, cfg.audio.playback_sample_rate, cfg.audio.frame_samples
    );
    info!(
        "Inactivity watchdog: {}s",
        cfg.session.watchdog_timeout_secs
    );

    Ok(())
}
