//! Declares [DecodedFrame] and [FrameView].

use thiserror::Error;

use super::{BYTES_PER_PIXEL, Dimensions, PixelBuffer};

/// A fully decoded frame: its dimensions, its stride, the [PixelBuffer] that
/// holds its BGRA pixels, and a sequence number.
///
/// A [DecodedFrame] can't be mutated after it's constructed. The only way to
/// get write access to its pixels again is to give the frame up with
/// [Self::into_pixels], which is how buffers get recycled.
///
/// Sequence numbers are assigned by whoever produces the frames and increase
/// by one per produced frame, so a consumer can tell how many frames it
/// skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    dimensions: Dimensions,
    stride: usize,
    pixels: PixelBuffer,
    sequence: u64,
}

impl DecodedFrame {
    /// Create a frame from its parts.
    ///
    /// An error is returned if the stride can't hold a row of `dimensions`
    /// pixels or if `pixels` isn't exactly `height * stride` bytes.
    pub fn new(
        dimensions: Dimensions,
        stride: usize,
        pixels: PixelBuffer,
        sequence: u64,
    ) -> Result<Self, FrameLayoutError> {
        if stride < dimensions.packed_stride() {
            return Err(FrameLayoutError::StrideTooSmall {
                stride,
                minimum: dimensions.packed_stride(),
            });
        }

        let expected = dimensions.height() * stride;
        if pixels.len() != expected {
            return Err(FrameLayoutError::LenMismatch {
                expected,
                actual: pixels.len(),
            });
        }

        Ok(Self {
            dimensions,
            stride,
            pixels,
            sequence,
        })
    }

    /// Create a tightly packed frame (stride is exactly `width * 4`).
    pub fn packed(
        dimensions: Dimensions,
        pixels: PixelBuffer,
        sequence: u64,
    ) -> Result<Self, FrameLayoutError> {
        Self::new(dimensions, dimensions.packed_stride(), pixels, sequence)
    }

    /// The frame's dimensions.
    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// The number of bytes per row (including any padding).
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// The frame's sequence number.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// The frame's raw BGRA bytes (`height * stride` of them).
    pub fn pixels(&self) -> &[u8] {
        self.pixels.as_bytes()
    }

    /// Borrow the frame as a [FrameView].
    pub fn view(&self) -> FrameView<'_> {
        FrameView {
            pixels: self.pixels.as_bytes(),
            dimensions: self.dimensions,
            stride: self.stride,
            sequence: self.sequence,
        }
    }

    /// Give up the frame, keeping its buffer so it can be written to again.
    pub fn into_pixels(self) -> PixelBuffer {
        self.pixels
    }

    /// A buffer for a new frame with `dimensions` and `stride`.
    ///
    /// That's `previous`'s buffer if `previous` had exactly the same dimensions
    /// and stride, otherwise a freshly allocated zeroed one. A reused buffer
    /// still holds the old frame's pixels, callers are expected to overwrite
    /// all of them.
    pub fn reuse_or_allocate(
        previous: Option<Self>,
        dimensions: Dimensions,
        stride: usize,
    ) -> PixelBuffer {
        match previous {
            Some(frame) if frame.dimensions == dimensions && frame.stride == stride => {
                frame.pixels
            }
            _ => PixelBuffer::zeroed(dimensions.height() * stride),
        }
    }
}

/// A read-only, borrowed look at a frame's pixels. This is what consumers are
/// handed when a frame is presented.
///
/// The borrow ends when the presenting callback returns. Copy the pixels out
/// if you need them any longer than that.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameView<'a> {
    pixels: &'a [u8],
    dimensions: Dimensions,
    stride: usize,
    sequence: u64,
}

impl<'a> FrameView<'a> {
    /// The frame's dimensions.
    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// The frame's width in pixels.
    pub fn width(&self) -> usize {
        self.dimensions.width()
    }

    /// The frame's height in pixels.
    pub fn height(&self) -> usize {
        self.dimensions.height()
    }

    /// The number of bytes per row (including any padding).
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// The frame's sequence number.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// The frame's raw BGRA bytes (`height * stride` of them).
    pub fn pixels(&self) -> &'a [u8] {
        self.pixels
    }

    /// The BGRA bytes of row `y` (without padding), top row first.
    ///
    /// Panics if `y` is out of bounds.
    pub fn row(&self, y: usize) -> &'a [u8] {
        assert!(y < self.height(), "Row {y} is out of bounds.");
        let start = y * self.stride;
        &self.pixels[start..start + self.dimensions.packed_stride()]
    }

    /// The BGRA pixel at column `x` of row `y`.
    ///
    /// Panics if `x` or `y` is out of bounds.
    pub fn pixel(&self, x: usize, y: usize) -> [u8; BYTES_PER_PIXEL] {
        assert!(x < self.width(), "Column {x} is out of bounds.");
        let offset = x * BYTES_PER_PIXEL;
        let mut pixel = [0; BYTES_PER_PIXEL];
        pixel.copy_from_slice(&self.row(y)[offset..offset + BYTES_PER_PIXEL]);
        pixel
    }
}

/// Indicates that a frame's parts don't fit together.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameLayoutError {
    #[error("A stride of {stride} bytes can't hold a row (needs at least {minimum}).")]
    StrideTooSmall { stride: usize, minimum: usize },
    #[error("Expected a pixel buffer of {expected} bytes but got {actual}.")]
    LenMismatch { expected: usize, actual: usize },
}
