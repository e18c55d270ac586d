//! Declares [FeedConfig], everything needed to start a
//! [Feed](crate::feed::Feed).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::handoff::HandoffStrategy;

/// The polling rate used when none is configured.
pub const DEFAULT_FPS: u32 = 60;

/// The snapshot path used when none is configured.
pub const DEFAULT_SOURCE: &str = "screen.bmp";

/// Where to poll for frames, how often, and how to hand them to the consumer.
///
/// Every field is optional in the JSON form:
///
/// ```
/// # use media::config::FeedConfig;
/// # use media::handoff::HandoffStrategy;
/// let config = FeedConfig::from_json_str(r#"{ "source": "/tmp/screen.bmp", "handoff": "copy" }"#).unwrap();
///
/// assert_eq!(config.fps, 60);
/// assert_eq!(config.handoff, HandoffStrategy::Copy);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeedConfig {
    /// The bitmap file the capture process keeps rewriting.
    pub source: PathBuf,
    /// How many times per second to poll `source`.
    pub fps: u32,
    pub handoff: HandoffStrategy,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::from(DEFAULT_SOURCE),
            fps: DEFAULT_FPS,
            handoff: HandoffStrategy::default(),
        }
    }
}

impl FeedConfig {
    /// Parse a config from JSON. The result isn't validated, see
    /// [Self::period].
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;

        Self::from_json_str(&json)
    }

    /// The time between polls. Fails if `fps` is 0.
    pub fn period(&self) -> Result<Duration, ConfigError> {
        if self.fps == 0 {
            return Err(ConfigError::ZeroFps);
        }

        Ok(Duration::from_secs(1) / self.fps)
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("The polling rate must be at least 1 frame per second.")]
    ZeroFps,
    #[error("Failed to read config file `{}`: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_is_the_default() {
        assert_eq!(FeedConfig::from_json_str("{}").unwrap(), FeedConfig::default());
    }

    #[test]
    fn period_comes_from_fps() {
        let config = FeedConfig {
            fps: 50,
            ..FeedConfig::default()
        };
        assert_eq!(config.period().unwrap(), Duration::from_millis(20));

        let config = FeedConfig {
            fps: 0,
            ..FeedConfig::default()
        };
        assert!(matches!(config.period(), Err(ConfigError::ZeroFps)));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(matches!(
            FeedConfig::from_json_str(r#"{ "fsp": 30 }"#),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            FeedConfig::from_json_str(r#"{ "handoff": "mirror" }"#),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let path = crate::test_bitmaps::temp_path("missing-config.json");

        assert!(matches!(
            FeedConfig::from_json_file(&path),
            Err(ConfigError::Read { path: p, .. }) if p == path
        ));
    }

    #[test]
    fn config_files_are_read() {
        let path = crate::test_bitmaps::temp_path("config.json");
        fs::write(&path, r#"{ "fps": 30, "source": "snap.bmp" }"#).unwrap();

        let config = FeedConfig::from_json_file(&path).unwrap();
        _ = fs::remove_file(&path);

        assert_eq!(config.fps, 30);
        assert_eq!(config.source, PathBuf::from("snap.bmp"));
        assert_eq!(config.handoff, HandoffStrategy::Swap);
    }
}
