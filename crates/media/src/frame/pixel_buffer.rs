//! Declares [PixelBuffer], the heap allocation a decoded frame's pixels live
//! in.

use std::fmt::{self, Debug, Formatter};

/// An owned block of BGRA pixel bytes.
///
/// The buffer's length is fixed when it's created (it's a boxed slice, not a
/// [Vec]), so writing into a reused buffer can never reallocate behind your
/// back. Buffers are meant to be passed around and reused: the decoder writes
/// into the buffer of the previous frame if the dimensions match (see
/// [DecodedFrame::reuse_or_allocate](super::DecodedFrame::reuse_or_allocate))
/// and only allocates when they don't.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct PixelBuffer(Box<[u8]>);

impl PixelBuffer {
    /// Allocate a buffer of `len` zeroed bytes.
    pub fn zeroed(len: usize) -> Self {
        Self(vec![0; len].into_boxed_slice())
    }

    /// The number of bytes in the buffer.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the buffer holds no bytes at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// The raw bytes, mutably.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.0
    }

    /// A pointer to the start of the allocation. Two buffers with the same
    /// pointer are the same allocation.
    pub fn as_ptr(&self) -> *const u8 {
        self.0.as_ptr()
    }
}

impl From<Vec<u8>> for PixelBuffer {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes.into_boxed_slice())
    }
}

impl From<Box<[u8]>> for PixelBuffer {
    fn from(bytes: Box<[u8]>) -> Self {
        Self(bytes)
    }
}

// Printing megabytes of pixels isn't useful.
impl Debug for PixelBuffer {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("len", &self.len())
            .field("ptr", &self.as_ptr())
            .finish()
    }
}
