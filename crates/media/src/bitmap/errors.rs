//! The errors [super::decode] can fail with.

use thiserror::Error;

/// Why a bitmap couldn't be decoded.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecodeError {
    #[error("Malformed bitmap: {0}")]
    Format(#[from] FormatError),
    #[error("Unsupported bitmap: {0}")]
    Unsupported(#[from] UnsupportedFormatError),
}

/// The input isn't a well-formed bitmap (or it was only partially written).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatError {
    #[error("The `BM` signature is missing.")]
    BadSignature,
    #[error("The headers need {needed} bytes but only {actual} are present.")]
    TruncatedHeader { needed: usize, actual: usize },
    #[error("{0} isn't a known info header size.")]
    UnknownInfoHeaderSize(u32),
    #[error("The width must be positive (got {0}).")]
    InvalidWidth(i32),
    #[error("The height can't be 0.")]
    ZeroHeight,
    #[error("Expected 1 color plane but got {0}.")]
    InvalidPlanes(u16),
    #[error("The image is too large to address.")]
    DimensionsOverflow,
    #[error("Pixel data can't start at byte {offset}, inside the headers.")]
    PixelOffsetInsideHeader { offset: usize },
    #[error("The pixel array needs {expected} bytes but only {actual} are present.")]
    TruncatedPixelData { expected: usize, actual: usize },
}

/// The input is a well-formed bitmap, just not one this decoder handles.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnsupportedFormatError {
    #[error("Only 24 and 32 bits per pixel are supported (got {0}).")]
    BitDepth(u16),
    #[error("Compression method {0} is not supported.")]
    Compression(u32),
    #[error("Bit field masks are only supported for 32 bits per pixel (got {0}).")]
    BitFieldsDepth(u16),
    #[error(
        "Channel masks must each cover one whole byte \
        (red {red:#010x}, green {green:#010x}, blue {blue:#010x}, alpha {alpha:#010x})."
    )]
    ChannelMasks {
        red: u32,
        green: u32,
        blue: u32,
        alpha: u32,
    },
}
