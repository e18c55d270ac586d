//! Declares [SwapSlot].

use std::sync::Mutex;

use super::{FrameHandoff, THREAD_PANIC_MSG};
use crate::frame::{DecodedFrame, FrameView};

/// A [FrameHandoff] that moves whole frames between threads instead of copying
/// their pixels.
///
/// Publishing puts the frame in the slot (handing back any frame it displaced).
/// Acquiring takes the frame out of the slot, presents it, and then returns it
/// to the producer so its buffer can be decoded into again.
/// In the steady state two buffers trade places and nothing is allocated.
#[derive(Debug, Default)]
pub struct SwapSlot {
    pending: Mutex<Option<DecodedFrame>>,
    recycled: Mutex<Option<DecodedFrame>>,
}

impl SwapSlot {
    /// An empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the newest frame out of the slot, leaving it empty.
    ///
    /// Use this instead of [FrameHandoff::acquire] to keep the frame around
    /// for longer than a callback. Hand it back with [Self::recycle] once
    /// you're done with it.
    pub fn take(&self) -> Option<DecodedFrame> {
        self.pending.lock().expect(THREAD_PANIC_MSG).take()
    }

    /// Give a presented frame back to the producer. It will be returned by the
    /// next [FrameHandoff::publish] that doesn't displace a frame.
    pub fn recycle(&self, frame: DecodedFrame) {
        *self.recycled.lock().expect(THREAD_PANIC_MSG) = Some(frame);
    }
}

impl FrameHandoff for SwapSlot {
    fn publish(&self, frame: DecodedFrame) -> Option<DecodedFrame> {
        let displaced = self
            .pending
            .lock()
            .expect(THREAD_PANIC_MSG)
            .replace(frame);

        displaced.or_else(|| self.recycled.lock().expect(THREAD_PANIC_MSG).take())
    }

    fn acquire(&self, present: &mut dyn FnMut(FrameView<'_>)) -> bool {
        let Some(frame) = self.take() else {
            return false;
        };

        present(frame.view());
        self.recycle(frame);
        true
    }

    fn has_pending(&self) -> bool {
        self.pending.lock().expect(THREAD_PANIC_MSG).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{Dimensions, PixelBuffer};

    fn frame(buffer: PixelBuffer, sequence: u64) -> DecodedFrame {
        DecodedFrame::packed(Dimensions::new(1, 1).unwrap(), buffer, sequence).unwrap()
    }

    #[test]
    fn publishing_over_a_frame_returns_its_buffer() {
        let slot = SwapSlot::new();
        let first = PixelBuffer::zeroed(4);
        let first_ptr = first.as_ptr();

        assert_eq!(slot.publish(frame(first, 0)), None);

        let returned = slot.publish(frame(PixelBuffer::zeroed(4), 1)).unwrap();
        assert_eq!(returned.sequence(), 0);
        assert_eq!(returned.pixels().as_ptr(), first_ptr);
        assert_eq!(slot.take().map(|f| f.sequence()), Some(1));
        assert_eq!(slot.take(), None);
    }

    #[test]
    fn presented_buffers_go_back_to_the_producer() {
        let slot = SwapSlot::new();
        let a = PixelBuffer::zeroed(4);
        let b = PixelBuffer::zeroed(4);
        let (a_ptr, b_ptr) = (a.as_ptr(), b.as_ptr());

        assert_eq!(slot.publish(frame(a, 0)), None);
        assert!(slot.acquire(&mut |view| assert_eq!(view.sequence(), 0)));

        // `a` was presented, so the producer gets it back for the next decode.
        let reused = slot.publish(frame(b, 1)).unwrap();
        assert_eq!(reused.pixels().as_ptr(), a_ptr);

        assert!(slot.acquire(&mut |_| {}));
        let reused = slot.publish(frame(reused.into_pixels(), 2)).unwrap();
        assert_eq!(reused.pixels().as_ptr(), b_ptr);
    }

    #[test]
    fn acquire_on_an_empty_slot_does_nothing() {
        let slot = SwapSlot::new();
        let mut calls = 0;

        assert!(!slot.acquire(&mut |_| calls += 1));
        assert_eq!(calls, 0);
        assert!(!slot.has_pending());
    }

    #[test]
    fn taken_frames_can_outlive_the_slot_borrow() {
        let slot = SwapSlot::new();
        slot.publish(frame(PixelBuffer::from(vec![1, 2, 3, 4]), 7));

        let kept = slot.take().unwrap();
        assert!(!slot.has_pending());
        assert_eq!(kept.pixels(), [1, 2, 3, 4]);

        slot.recycle(kept);
        assert!(slot.publish(frame(PixelBuffer::zeroed(4), 8)).is_some());
    }
}
