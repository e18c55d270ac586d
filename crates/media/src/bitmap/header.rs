//! Parsing for the headers at the front of a bitmap file: the 14-byte file
//! header followed by an info header (`BITMAPINFOHEADER` or one of its
//! larger descendants).

use crate::frame::Dimensions;

use super::{FormatError, UnsupportedFormatError};

/// The two bytes every bitmap file starts with.
pub const SIGNATURE: [u8; 2] = *b"BM";

/// The size of the file header that comes before the info header.
pub const FILE_HEADER_LEN: usize = 14;

/// Info header sizes this parser understands: `BITMAPINFOHEADER`, the V2 and
/// V3 info headers (which add the channel masks), `BITMAPV4HEADER`, and
/// `BITMAPV5HEADER`.
pub const KNOWN_INFO_HEADER_LENS: [u32; 5] = [40, 52, 56, 108, 124];

const BI_RGB: u32 = 0;
const BI_BITFIELDS: u32 = 3;
const BI_ALPHABITFIELDS: u32 = 6;

/// Where the red mask starts. The green, blue, and alpha masks follow it.
const MASKS_OFFSET: usize = FILE_HEADER_LEN + 40;

/// The order the rows of the pixel array are stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowOrder {
    /// The first stored row is the bottom of the image (a positive height).
    /// This is what most writers produce.
    BottomUp,
    /// The first stored row is the top of the image (a negative height).
    TopDown,
}

/// How the pixel array is encoded. Everything here is uncompressed, the bit
/// field variants just describe which byte holds which channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Compression {
    /// `BI_RGB`.
    Rgb,
    /// `BI_BITFIELDS`, red/green/blue masks.
    BitFields,
    /// `BI_ALPHABITFIELDS`, red/green/blue/alpha masks.
    AlphaBitFields,
}

/// The byte offset of each channel inside a single source pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelLayout {
    pub blue: usize,
    pub green: usize,
    pub red: usize,
    /// [None] if the source has no alpha channel (decoded alpha becomes
    /// `0xFF`).
    pub alpha: Option<usize>,
}

impl ChannelLayout {
    /// 24-bit `BI_RGB`: blue, green, red.
    pub const BGR: Self = Self {
        blue: 0,
        green: 1,
        red: 2,
        alpha: None,
    };

    /// 32-bit `BI_RGB`: blue, green, red, and a fourth byte that's carried
    /// through untouched.
    pub const BGRA: Self = Self {
        blue: 0,
        green: 1,
        red: 2,
        alpha: Some(3),
    };

    /// Build a layout out of 32-bit channel masks. Every present mask has to
    /// select exactly one whole byte, red/green/blue have to be present, and no
    /// two channels can share a byte.
    fn from_masks(red: u32, green: u32, blue: u32, alpha: u32) -> Result<Self, UnsupportedFormatError> {
        let unsupported = UnsupportedFormatError::ChannelMasks {
            red,
            green,
            blue,
            alpha,
        };

        let (Some(Some(red_i)), Some(Some(green_i)), Some(Some(blue_i)), Some(alpha_i)) = (
            mask_byte(red),
            mask_byte(green),
            mask_byte(blue),
            mask_byte(alpha),
        ) else {
            return Err(unsupported);
        };

        let distinct = red_i != green_i
            && red_i != blue_i
            && green_i != blue_i
            && alpha_i.is_none_or(|a| a != red_i && a != green_i && a != blue_i);

        if !distinct {
            return Err(unsupported);
        }

        Ok(Self {
            blue: blue_i,
            green: green_i,
            red: red_i,
            alpha: alpha_i,
        })
    }

    /// Whether a 4-byte source pixel is already in the decoded BGRA order.
    pub fn is_bgra(&self) -> bool {
        *self == Self::BGRA
    }
}

/// The byte a mask selects: `Some(None)` for an empty mask, `Some(Some(i))` for
/// a mask of exactly byte `i`, [None] for anything else.
fn mask_byte(mask: u32) -> Option<Option<usize>> {
    if mask == 0 {
        return Some(None);
    }

    (0..4)
        .find(|&i| mask == 0xFF << (8 * i))
        .map(|i| Some(i as usize))
}

/// Everything [super::decode] needs to know about a bitmap, parsed from its
/// headers.
///
/// A successfully parsed header guarantees that the whole pixel array it
/// describes is present in the bytes it was parsed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RasterHeader {
    dimensions: Dimensions,
    stride: usize,
    bits_per_pixel: u16,
    compression: Compression,
    pixel_offset: usize,
    row_order: RowOrder,
    layout: ChannelLayout,
}

impl RasterHeader {
    /// Parse and validate the headers at the front of `raw`.
    ///
    /// [FormatError]s mean `raw` isn't a (complete) bitmap at all,
    /// [UnsupportedFormatError]s mean it is one, just not a 24/32-bit
    /// uncompressed one.
    pub fn parse(raw: &[u8]) -> Result<Self, super::DecodeError> {
        ensure_len(raw, FILE_HEADER_LEN + 4)?;

        if raw[..2] != SIGNATURE {
            return Err(FormatError::BadSignature.into());
        }

        let pixel_offset = read_u32(raw, 10) as usize;
        let info_len = read_u32(raw, FILE_HEADER_LEN);

        if !KNOWN_INFO_HEADER_LENS.contains(&info_len) {
            return Err(FormatError::UnknownInfoHeaderSize(info_len).into());
        }

        let mut headers_end = FILE_HEADER_LEN + info_len as usize;
        ensure_len(raw, headers_end)?;

        let width = read_i32(raw, 18);
        let height = read_i32(raw, 22);
        let planes = read_u16(raw, 26);
        let bits_per_pixel = read_u16(raw, 28);
        let compression = read_u32(raw, 30);

        if width <= 0 {
            return Err(FormatError::InvalidWidth(width).into());
        }
        if height == 0 {
            return Err(FormatError::ZeroHeight.into());
        }
        if planes != 1 {
            return Err(FormatError::InvalidPlanes(planes).into());
        }

        let row_order = if height < 0 {
            RowOrder::TopDown
        } else {
            RowOrder::BottomUp
        };

        let dimensions = Dimensions::new(width as usize, height.unsigned_abs() as usize)
            .filter(|d| d.checked_packed_len().is_some())
            .ok_or(FormatError::DimensionsOverflow)?;

        if bits_per_pixel != 24 && bits_per_pixel != 32 {
            return Err(UnsupportedFormatError::BitDepth(bits_per_pixel).into());
        }

        let (compression, layout) = match compression {
            BI_RGB if bits_per_pixel == 24 => (Compression::Rgb, ChannelLayout::BGR),
            BI_RGB => (Compression::Rgb, ChannelLayout::BGRA),

            BI_BITFIELDS | BI_ALPHABITFIELDS => {
                if bits_per_pixel != 32 {
                    return Err(UnsupportedFormatError::BitFieldsDepth(bits_per_pixel).into());
                }

                let with_alpha = compression == BI_ALPHABITFIELDS || info_len >= 56;
                let masks_len = if with_alpha { 16 } else { 12 };

                // Masks that don't fit inside the info header follow it. That's
                // all of them for a plain `BITMAPINFOHEADER` and just the alpha
                // mask for a V2 header.
                let masks_end = MASKS_OFFSET + masks_len;
                if masks_end > headers_end {
                    headers_end = masks_end;
                }
                ensure_len(raw, headers_end)?;

                let alpha = if with_alpha {
                    read_u32(raw, MASKS_OFFSET + 12)
                } else {
                    0
                };

                let layout = ChannelLayout::from_masks(
                    read_u32(raw, MASKS_OFFSET),
                    read_u32(raw, MASKS_OFFSET + 4),
                    read_u32(raw, MASKS_OFFSET + 8),
                    alpha,
                )?;

                let compression = if compression == BI_BITFIELDS {
                    Compression::BitFields
                } else {
                    Compression::AlphaBitFields
                };

                (compression, layout)
            }

            other => return Err(UnsupportedFormatError::Compression(other).into()),
        };

        if pixel_offset < headers_end {
            return Err(FormatError::PixelOffsetInsideHeader {
                offset: pixel_offset,
            }
            .into());
        }

        let stride = source_stride(dimensions.width(), bits_per_pixel)
            .ok_or(FormatError::DimensionsOverflow)?;

        let pixel_data_end = stride
            .checked_mul(dimensions.height())
            .and_then(|len| len.checked_add(pixel_offset))
            .ok_or(FormatError::DimensionsOverflow)?;

        if raw.len() < pixel_data_end {
            return Err(FormatError::TruncatedPixelData {
                expected: pixel_data_end - pixel_offset,
                actual: raw.len().saturating_sub(pixel_offset),
            }
            .into());
        }

        Ok(Self {
            dimensions,
            stride,
            bits_per_pixel,
            compression,
            pixel_offset,
            row_order,
            layout,
        })
    }

    /// The image's dimensions.
    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// The number of bytes per stored row, padding included.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// 24 or 32.
    pub fn bits_per_pixel(&self) -> u16 {
        self.bits_per_pixel
    }

    /// 3 or 4.
    pub fn bytes_per_pixel(&self) -> usize {
        usize::from(self.bits_per_pixel / 8)
    }

    /// How the pixel array is encoded.
    pub fn compression(&self) -> Compression {
        self.compression
    }

    /// The byte offset of the pixel array from the start of the file.
    pub fn pixel_offset(&self) -> usize {
        self.pixel_offset
    }

    /// The order rows are stored in.
    pub fn row_order(&self) -> RowOrder {
        self.row_order
    }

    /// Which byte of a source pixel holds which channel.
    pub fn layout(&self) -> ChannelLayout {
        self.layout
    }

    /// The size of the pixel array in bytes (`height * stride`).
    pub fn pixel_data_len(&self) -> usize {
        self.stride * self.dimensions.height()
    }
}

/// The stride of a stored row: `width * bits_per_pixel` bits, rounded up to a
/// multiple of 4 bytes. [None] on overflow.
pub fn source_stride(width: usize, bits_per_pixel: u16) -> Option<usize> {
    let row_bits = width.checked_mul(usize::from(bits_per_pixel))?;
    Some(row_bits.checked_add(31)? / 32 * 4)
}

fn ensure_len(raw: &[u8], needed: usize) -> Result<(), FormatError> {
    if raw.len() < needed {
        Err(FormatError::TruncatedHeader {
            needed,
            actual: raw.len(),
        })
    } else {
        Ok(())
    }
}

// The readers below assume the caller already checked the length.

fn read_u16(raw: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([raw[offset], raw[offset + 1]])
}

fn read_u32(raw: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([raw[offset], raw[offset + 1], raw[offset + 2], raw[offset + 3]])
}

fn read_i32(raw: &[u8], offset: usize) -> i32 {
    i32::from_le_bytes([raw[offset], raw[offset + 1], raw[offset + 2], raw[offset + 3]])
}
