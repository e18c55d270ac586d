//! Contains [Args], which are parsed command-line flags.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use media::config::{ConfigError, FeedConfig};
use media::handoff::HandoffStrategy;

/// Parsed command line arguments.
#[derive(Parser, Debug, Clone, PartialEq, Eq, Hash)]
#[command(about = "Presents a bitmap snapshot that another process keeps rewriting.")]
pub struct Args {
    /// The bitmap file to poll.
    #[arg(long)]
    pub source: Option<PathBuf>,

    /// How many times per second to poll the source.
    #[arg(long)]
    pub fps: Option<u32>,

    /// How decoded frames are handed to the renderer.
    #[arg(long, value_enum)]
    pub handoff: Option<Handoff>,

    /// A JSON file to read the feed settings from. Flags given on the command
    /// line take precedence over it.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// How many times per second to present the newest frame.
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u32).range(1..))]
    pub render_fps: u32,
}

impl Args {
    /// The feed settings: the config file (or the defaults) with any flags
    /// applied on top.
    pub fn feed_config(&self) -> Result<FeedConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => FeedConfig::from_json_file(path)?,
            None => FeedConfig::default(),
        };

        if let Some(source) = &self.source {
            config.source = source.clone();
        }
        if let Some(fps) = self.fps {
            config.fps = fps;
        }
        if let Some(handoff) = self.handoff {
            config.handoff = handoff.into();
        }

        Ok(config)
    }

    /// The time between presentations.
    pub fn render_period(&self) -> Duration {
        Duration::from_secs(1) / self.render_fps
    }
}

/// The command line spelling of [HandoffStrategy].
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handoff {
    /// Move frames to the renderer without copying their pixels.
    Swap,
    /// Copy each new frame into the renderer's own buffer.
    Copy,
}

impl From<Handoff> for HandoffStrategy {
    fn from(handoff: Handoff) -> Self {
        match handoff {
            Handoff::Swap => HandoffStrategy::Swap,
            Handoff::Copy => HandoffStrategy::Copy,
        }
    }
}
