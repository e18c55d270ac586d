//! Declares [Feed], which runs a [FramePoller] on its own thread and gives the
//! rest of the program a handle to present frames from, stop it, and find out
//! if it died.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use util::cancel::CancelToken;
use util::channels::ChannelError;
use util::channels::message_channel::{self, Inbox};
use util::drop_join_thread::{self, DropJoinHandle};

use crate::config::{ConfigError, FeedConfig};
use crate::handoff::{self, FrameHandoff, Presenter};
use crate::latency::LatencyTracker;
use crate::poller::{FramePoller, PollError};

/// The name of the thread the poller runs on.
pub const POLLER_THREAD_NAME: &str = "frame-poller";

/// A running frame feed.
///
/// Dropping the feed cancels the poller and waits for its thread to finish.
#[derive(Debug)]
pub struct Feed {
    handoff: Arc<dyn FrameHandoff>,
    cancel: CancelToken,
    errors: Inbox<PollError>,
    // Declared last so it's joined after everything above is dropped.
    poller: DropJoinHandle<()>,
}

impl Feed {
    /// Validate `config` and start polling on a new thread.
    pub fn start(config: &FeedConfig) -> Result<Self, FeedError> {
        let handoff = handoff::new(config.handoff);
        let mut poller = FramePoller::from_config(config, handoff.clone())?;

        let cancel = CancelToken::new();
        let (errors, fatal_errors) = message_channel::bounded(1);

        let poller = drop_join_thread::spawn_named(POLLER_THREAD_NAME, {
            let cancel = cancel.clone();

            move || {
                let mut latency = LatencyTracker::new("decode");

                if let Err(e) = poller.run(&cancel, &mut latency) {
                    log::error!("{e}");

                    // Only the first fatal error is kept.
                    if let Err(e) = fatal_errors.send(e) {
                        log::debug!("Dropped a fatal error ({}).", e.reason);
                    }
                }
            }
        })
        .map_err(FeedError::Spawn)?;

        log::info!(
            "Started polling `{}` at {} fps ({:?} handoff).",
            config.source.display(),
            config.fps,
            config.handoff
        );

        Ok(Self {
            handoff,
            cancel,
            errors,
            poller,
        })
    }

    /// A new consumer handle. Only one presenter should be used at a time.
    pub fn presenter(&self) -> Presenter {
        Presenter::new(self.handoff.clone())
    }

    /// The handoff frames are published into.
    pub fn handoff(&self) -> &Arc<dyn FrameHandoff> {
        &self.handoff
    }

    /// A token that stops the poller when cancelled.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Ask the poller to stop. It stops before its next tick.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Whether the poller thread is still running.
    pub fn is_running(&self) -> bool {
        !self.poller.is_finished()
    }

    /// The error that stopped the poller, if one has.
    ///
    /// The error can only be taken once.
    pub fn fatal_error(&self) -> Option<PollError> {
        self.errors.check().ok().flatten()
    }

    /// Wait up to `timeout` for the poller to fail.
    ///
    /// Returns [None] if it didn't (including if it stopped without an error).
    pub fn wait_fatal_error(&self, timeout: Duration) -> Option<PollError> {
        match self.errors.wait_timeout(timeout) {
            Ok(e) => Some(e),
            Err(ChannelError::ConnectionDropped) => {
                // The poller is gone. Don't turn a render tick into a busy loop.
                std::thread::sleep(timeout);
                None
            }
            Err(_) => None,
        }
    }
}

impl Drop for Feed {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[derive(Error, Debug)]
pub enum FeedError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Failed to spawn the poller thread: {0}")]
    Spawn(std::io::Error),
}
