//! This module exports everything that has to do with decoded frames: the
//! [Dimensions] of a frame, the [PixelBuffer] its pixels live in, the
//! [DecodedFrame] that gets passed from the producer to the consumer, and the
//! [FrameView] a consumer is allowed to look at.
//!
//! Every frame uses the same pixel layout: 4 bytes per pixel in blue, green,
//! red, alpha order (see [BYTES_PER_PIXEL]). Alpha is carried along but not
//! meaningful, consumers should ignore it.

mod decoded_frame;
mod dimensions;
mod pixel_buffer;

pub use decoded_frame::*;
pub use dimensions::*;
pub use pixel_buffer::*;

/// The number of bytes every decoded pixel takes up (blue, green, red, alpha).
pub const BYTES_PER_PIXEL: usize = 4;

/// The byte offset of each channel inside a decoded pixel.
pub mod channel {
    /// Offset of the blue channel.
    pub const BLUE: usize = 0;
    /// Offset of the green channel.
    pub const GREEN: usize = 1;
    /// Offset of the red channel.
    pub const RED: usize = 2;
    /// Offset of the (ignored) alpha channel.
    pub const ALPHA: usize = 3;
}
