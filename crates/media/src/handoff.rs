//! The single-slot channel decoded frames travel through on their way from the
//! poller thread to whoever presents them.
//!
//! There's only ever room for one frame. Publishing a frame replaces whatever
//! frame hasn't been presented yet (newest frame wins), so a slow consumer just
//! skips frames instead of building up a backlog.
//!
//! Two backends implement [FrameHandoff]:
//!
//! - [SwapSlot] moves frames between threads by swapping ownership, so no
//!   pixels are ever copied.
//! - [CopySlot] has the consumer copy the shared frame into its own buffer
//!   while it holds the lock, but only when something new was published.
//!
//! Pick one with [HandoffStrategy] and build it with [new].

mod copy_slot;
mod swap_slot;

pub use copy_slot::CopySlot;
pub use swap_slot::SwapSlot;

use std::fmt::Debug;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::frame::{DecodedFrame, FrameView};
use crate::latency::LatencyTracker;

const THREAD_PANIC_MSG: &str = "The other side of the handoff panicked while holding the slot.";

/// One side publishes, the other side presents.
///
/// Neither side can make the other wait for anything longer than a short
/// critical section: the producer never waits for a frame to be presented and
/// the consumer never waits for a frame to be decoded.
pub trait FrameHandoff: Send + Sync + Debug {
    /// Make `frame` the newest frame, replacing any frame that hasn't been
    /// presented yet.
    ///
    /// Returns a frame the producer is done with, if one is available. Its
    /// buffer can be decoded into again (see [DecodedFrame::reuse_or_allocate]).
    fn publish(&self, frame: DecodedFrame) -> Option<DecodedFrame>;

    /// If a frame was published since the last call, call `present` with a view
    /// of the newest one and return `true`. Otherwise `present` isn't called
    /// and `false` is returned.
    ///
    /// The view can't outlive `present`.
    fn acquire(&self, present: &mut dyn FnMut(FrameView<'_>)) -> bool;

    /// Whether a published frame is waiting to be presented. Use this to decide
    /// whether a redraw is worth scheduling.
    fn has_pending(&self) -> bool;
}

/// Which [FrameHandoff] backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandoffStrategy {
    /// [SwapSlot].
    #[default]
    Swap,
    /// [CopySlot].
    Copy,
}

/// Build the [FrameHandoff] backend `strategy` names.
pub fn new(strategy: HandoffStrategy) -> Arc<dyn FrameHandoff> {
    match strategy {
        HandoffStrategy::Swap => Arc::new(SwapSlot::new()),
        HandoffStrategy::Copy => Arc::new(CopySlot::new()),
    }
}

/// The consumer's end of a [FrameHandoff]. Wraps [FrameHandoff::acquire] so
/// every presented frame gets timed.
#[derive(Debug)]
pub struct Presenter {
    handoff: Arc<dyn FrameHandoff>,
    latency: LatencyTracker,
}

impl Presenter {
    /// Present frames from `handoff`, starting with no latency samples.
    pub fn new(handoff: Arc<dyn FrameHandoff>) -> Self {
        Self {
            handoff,
            latency: LatencyTracker::new("presentation"),
        }
    }

    /// Present the newest frame with `present` if there's a new one. Returns
    /// whether a frame was presented.
    ///
    /// Only presentations that actually happen are timed.
    pub fn acquire<F: FnMut(FrameView<'_>)>(&mut self, mut present: F) -> bool {
        let start = std::time::Instant::now();
        let presented = self.handoff.acquire(&mut present);

        if presented {
            self.latency.record(start.elapsed());
        }

        presented
    }

    /// See [FrameHandoff::has_pending].
    pub fn has_pending(&self) -> bool {
        self.handoff.has_pending()
    }

    /// The presentation timings recorded so far.
    pub fn latency(&self) -> &LatencyTracker {
        &self.latency
    }
}
