//! Declares [CopySlot].

use std::sync::Mutex;

use super::{FrameHandoff, THREAD_PANIC_MSG};
use crate::frame::{DecodedFrame, FrameView};

/// A [FrameHandoff] where the consumer presents from a private copy of the
/// newest frame.
///
/// The producer swaps each new frame into a shared slot and marks it dirty. On
/// acquire the consumer copies the shared pixels into its own destination
/// buffer (only if the slot is dirty), clears the flag, lets go of the lock,
/// and then presents from the destination. Presenting never holds the shared
/// lock, so a slow presentation can't hold up the producer.
#[derive(Debug, Default)]
pub struct CopySlot {
    shared: Mutex<Shared>,
    destination: Mutex<Option<DecodedFrame>>,
}

#[derive(Debug, Default)]
struct Shared {
    frame: Option<DecodedFrame>,
    dirty: bool,
}

impl CopySlot {
    /// An empty slot with no private copy yet.
    pub fn new() -> Self {
        Self::default()
    }
}

impl FrameHandoff for CopySlot {
    fn publish(&self, frame: DecodedFrame) -> Option<DecodedFrame> {
        let mut shared = self.shared.lock().expect(THREAD_PANIC_MSG);
        shared.dirty = true;
        shared.frame.replace(frame)
    }

    fn acquire(&self, present: &mut dyn FnMut(FrameView<'_>)) -> bool {
        let mut destination = self.destination.lock().expect(THREAD_PANIC_MSG);

        {
            let mut shared = self.shared.lock().expect(THREAD_PANIC_MSG);
            let Some(source) = shared.frame.as_ref().filter(|_| shared.dirty) else {
                return false;
            };

            let mut pixels = DecodedFrame::reuse_or_allocate(
                destination.take(),
                source.dimensions(),
                source.stride(),
            );
            pixels.as_bytes_mut().copy_from_slice(source.pixels());

            *destination = Some(
                DecodedFrame::new(source.dimensions(), source.stride(), pixels, source.sequence())
                    .expect("The copy should have the same layout as its source."),
            );
            shared.dirty = false;
        }

        match destination.as_ref() {
            Some(frame) => {
                present(frame.view());
                true
            }
            None => false,
        }
    }

    fn has_pending(&self) -> bool {
        self.shared.lock().expect(THREAD_PANIC_MSG).dirty
    }
}
