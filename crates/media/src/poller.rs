//! Declares [FramePoller], the loop that turns a bitmap snapshot on disk into
//! published frames.
//!
//! Every tick the poller maps the snapshot file, decodes it into a recycled
//! buffer, and publishes the result through a [FrameHandoff]. A missing file
//! isn't an error (the capture process might not have written its first
//! snapshot yet), anything else that goes wrong stops the poller for good.

use std::fs::File;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use memmap2::Mmap;
use thiserror::Error;

use util::cancel::CancelToken;

use crate::bitmap::{self, DecodeError};
use crate::config::{ConfigError, FeedConfig};
use crate::frame::{DecodedFrame, Dimensions};
use crate::handoff::FrameHandoff;
use crate::latency::LatencyTracker;

/// Polls a bitmap file at a fixed rate and publishes every decoded frame.
#[derive(Debug)]
pub struct FramePoller {
    source: PathBuf,
    period: Duration,
    handoff: Arc<dyn FrameHandoff>,
    reusable: Option<DecodedFrame>,
    next_sequence: u64,
    last_dimensions: Option<Dimensions>,
    source_missing: bool,
    state: PollerState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PollerState {
    Running,
    Stopped,
}

/// What a successful [FramePoller::tick] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TickOutcome {
    /// A frame was decoded and published.
    Published { dimensions: Dimensions, sequence: u64 },
    /// The source file doesn't exist (yet). Nothing was published.
    SourceMissing,
}

/// Why [FramePoller::run] returned without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PollerExit {
    Cancelled,
}

impl FramePoller {
    /// Create a poller that reads `source` every `period` and publishes into
    /// `handoff`.
    ///
    /// Panics if `period` is zero.
    pub fn new(source: impl Into<PathBuf>, period: Duration, handoff: Arc<dyn FrameHandoff>) -> Self {
        assert!(!period.is_zero(), "The polling period can't be zero.");

        Self {
            source: source.into(),
            period,
            handoff,
            reusable: None,
            next_sequence: 0,
            last_dimensions: None,
            source_missing: false,
            state: PollerState::Running,
        }
    }

    /// Create a poller for `config`'s source and rate.
    pub fn from_config(config: &FeedConfig, handoff: Arc<dyn FrameHandoff>) -> Result<Self, ConfigError> {
        Ok(Self::new(&config.source, config.period()?, handoff))
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Whether a fatal error stopped the poller.
    pub fn is_stopped(&self) -> bool {
        self.state == PollerState::Stopped
    }

    /// Poll the source once.
    ///
    /// Any error is fatal: once one is returned every later call returns
    /// [PollError::Stopped].
    pub fn tick(&mut self) -> Result<TickOutcome, PollError> {
        if self.is_stopped() {
            return Err(PollError::Stopped);
        }

        let outcome = self.poll_source();
        if outcome.is_err() {
            self.state = PollerState::Stopped;
        }

        outcome
    }

    /// Tick once per period until `cancel` fires or a tick fails. Each tick is
    /// timed with `latency`.
    ///
    /// The first tick happens right away. Ticks that are missed because a tick
    /// ran long are skipped rather than run back to back.
    pub fn run(&mut self, cancel: &CancelToken, latency: &mut LatencyTracker) -> Result<PollerExit, PollError> {
        let mut deadline = Instant::now();

        loop {
            if cancel.wait_until(deadline) {
                log::debug!("Stopped polling `{}`.", self.source.display());
                return Ok(PollerExit::Cancelled);
            }

            latency.track(|| self.tick())?;

            deadline += self.period;
            let now = Instant::now();
            if deadline < now {
                let missed = ticks_missed(now - deadline, self.period);
                log::trace!("Polling fell {missed} tick(s) behind.");

                // Too far behind to count, start over from now.
                deadline = match deadline.checked_add(self.period.saturating_mul(missed)) {
                    Some(next) if missed < u32::MAX => next,
                    _ => now + self.period,
                };
            }
        }
    }

    fn poll_source(&mut self) -> Result<TickOutcome, PollError> {
        let file = match File::open(&self.source) {
            Ok(file) => file,

            Err(e) if e.kind() == ErrorKind::NotFound => {
                if !self.source_missing {
                    log::info!("Waiting for `{}` to appear.", self.source.display());
                    self.source_missing = true;
                }
                return Ok(TickOutcome::SourceMissing);
            }

            Err(source) => {
                return Err(PollError::Open {
                    path: self.source.clone(),
                    source,
                });
            }
        };
        self.source_missing = false;

        // SAFETY: The capture process replaces the snapshot by renaming a new
        // file over it, so the file this handle refers to is never written to
        // while it's mapped.
        let map = unsafe { Mmap::map(&file) }.map_err(|source| PollError::Map {
            path: self.source.clone(),
            source,
        })?;

        let sequence = self.next_sequence;
        let frame = bitmap::decode_frame(&map, self.reusable.take(), sequence).map_err(|source| {
            PollError::Decode {
                path: self.source.clone(),
                source,
            }
        })?;

        // The map and the file are released before the frame is published.
        drop(map);
        drop(file);

        let dimensions = frame.dimensions();
        if self.last_dimensions != Some(dimensions) {
            log::info!("Polling `{}` ({dimensions}).", self.source.display());
            self.last_dimensions = Some(dimensions);
        }

        self.next_sequence += 1;
        self.reusable = self.handoff.publish(frame);

        Ok(TickOutcome::Published {
            dimensions,
            sequence,
        })
    }
}

/// A fatal polling error.
#[derive(Error, Debug)]
pub enum PollError {
    #[error("Failed to open `{}`: {source}", path.display())]
    Open { path: PathBuf, source: io::Error },
    #[error("Failed to map `{}` into memory: {source}", path.display())]
    Map { path: PathBuf, source: io::Error },
    #[error("Failed to decode `{}`: {source}", path.display())]
    Decode { path: PathBuf, source: DecodeError },
    #[error("The poller was stopped by an earlier error.")]
    Stopped,
}

/// How many whole periods to skip to get past a deadline that was missed by
/// `behind`. Saturates at [u32::MAX].
fn ticks_missed(behind: Duration, period: Duration) -> u32 {
    let whole_periods = behind.as_nanos() / period.as_nanos();
    u32::try_from(whole_periods).unwrap_or(u32::MAX).saturating_add(1)
}
