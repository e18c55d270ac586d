//! Declares [Dimensions].

use std::fmt::{self, Display, Formatter};
use std::num::NonZeroUsize;

use super::BYTES_PER_PIXEL;

/// The width and height of a frame in pixels. Neither side can be 0.
///
/// Converting from a `(usize, usize)` tuple panics on a 0 side, so keep that
/// for literals:
///
/// ```
/// use media::frame::Dimensions;
///
/// let d: Dimensions = (1920, 1080).into();
/// assert_eq!(d.width(), 1920);
/// assert_eq!(d.height(), 1080);
/// assert_eq!(d.to_string(), "1920x1080");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dimensions {
    width: NonZeroUsize,
    height: NonZeroUsize,
}

impl Dimensions {
    /// [None] if either side is 0.
    pub const fn new(width: usize, height: usize) -> Option<Self> {
        match (NonZeroUsize::new(width), NonZeroUsize::new(height)) {
            (Some(width), Some(height)) => Some(Self::from_non_zero(width, height)),
            _ => None,
        }
    }

    pub const fn from_non_zero(width: NonZeroUsize, height: NonZeroUsize) -> Self {
        Self { width, height }
    }

    /// Width in pixels (never 0).
    pub const fn width(&self) -> usize {
        self.width.get()
    }

    /// Height in pixels (never 0).
    pub const fn height(&self) -> usize {
        self.height.get()
    }

    /// The number of pixels in a frame with these dimensions.
    pub const fn area(&self) -> usize {
        self.width.get() * self.height.get()
    }

    /// The stride (bytes per row) of a decoded frame with these dimensions.
    ///
    /// Decoded rows are never padded: 4 bytes per pixel already keeps every
    /// row 4-byte aligned.
    ///
    /// ```
    /// use media::frame::Dimensions;
    ///
    /// let d: Dimensions = (3, 2).into();
    /// assert_eq!(d.packed_stride(), 12);
    /// assert_eq!(d.packed_len(), 24);
    /// ```
    pub const fn packed_stride(&self) -> usize {
        self.width.get() * BYTES_PER_PIXEL
    }

    /// The number of bytes a decoded frame with these dimensions takes up
    /// (`height * stride`).
    pub const fn packed_len(&self) -> usize {
        self.height.get() * self.packed_stride()
    }

    /// [Self::packed_len], or [None] if it doesn't fit in a [usize].
    pub fn checked_packed_len(&self) -> Option<usize> {
        self.width
            .get()
            .checked_mul(BYTES_PER_PIXEL)?
            .checked_mul(self.height.get())
    }
}

/// Displayed as `WxH` (e.g. `1920x1080`).
impl Display for Dimensions {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Panics if either side is 0.
impl From<(usize, usize)> for Dimensions {
    fn from(dimensions: (usize, usize)) -> Self {
        Self::new(dimensions.0, dimensions.1).expect("Both sides must be non-zero.")
    }
}

impl From<Dimensions> for (usize, usize) {
    fn from(dimensions: Dimensions) -> Self {
        (dimensions.width(), dimensions.height())
    }
}
