//! A decoder for uncompressed 24 and 32-bit bitmap (BMP) files that writes
//! into reusable [PixelBuffer]s.
//!
//! Decoded pixels always come out top row first, tightly packed, in BGRA order
//! (see [crate::frame]). Whatever the source does differently (bottom-up rows,
//! 3-byte pixels, a different channel order described by bit field masks) is
//! corrected while copying.
//!
//! The decoder is a pure function of its inputs. The only thing it touches is
//! the buffer it writes into, and it only allocates when it's not handed a
//! previous frame with the same dimensions.

mod errors;
mod header;

pub use errors::*;
pub use header::*;

use crate::frame::{BYTES_PER_PIXEL, DecodedFrame, PixelBuffer, channel};

/// Decode the bitmap in `raw`, writing its pixels into `previous`'s buffer if
/// `previous` has the same dimensions and into a newly allocated buffer
/// otherwise.
///
/// Nothing is written (and `previous` is dropped) if the headers are invalid.
pub fn decode(
    raw: &[u8],
    previous: Option<DecodedFrame>,
) -> Result<(RasterHeader, PixelBuffer), DecodeError> {
    let header = RasterHeader::parse(raw)?;

    let dimensions = header.dimensions();
    let mut buffer =
        DecodedFrame::reuse_or_allocate(previous, dimensions, dimensions.packed_stride());
    write_pixels(&header, raw, buffer.as_bytes_mut());

    Ok((header, buffer))
}

/// The same as [decode], but the result is packaged up as a [DecodedFrame]
/// with the given `sequence` number.
pub fn decode_frame(
    raw: &[u8],
    previous: Option<DecodedFrame>,
    sequence: u64,
) -> Result<DecodedFrame, DecodeError> {
    let (header, buffer) = decode(raw, previous)?;

    Ok(DecodedFrame::packed(header.dimensions(), buffer, sequence)
        .expect("The decoder should size the buffer for the header's dimensions."))
}

/// Copy every row of the pixel array into `out`, flipping the row order and
/// reordering channels as needed.
///
/// `header` must have been parsed from `raw` (so the pixel array is known to be
/// in bounds) and `out` must be `header.dimensions().packed_len()` bytes.
fn write_pixels(header: &RasterHeader, raw: &[u8], out: &mut [u8]) {
    let dimensions = header.dimensions();
    let src_stride = header.stride();
    let src_pixel_len = header.bytes_per_pixel();
    let src_row_len = dimensions.width() * src_pixel_len;
    let pixel_data = &raw[header.pixel_offset()..header.pixel_offset() + header.pixel_data_len()];
    let layout = header.layout();

    for (y, out_row) in out.chunks_exact_mut(dimensions.packed_stride()).enumerate() {
        let stored_row = match header.row_order() {
            RowOrder::TopDown => y,
            RowOrder::BottomUp => dimensions.height() - 1 - y,
        };

        let src_start = stored_row * src_stride;
        let src_row = &pixel_data[src_start..src_start + src_row_len];

        if layout.is_bgra() {
            out_row.copy_from_slice(src_row);
            continue;
        }

        for (out_pixel, src_pixel) in out_row
            .chunks_exact_mut(BYTES_PER_PIXEL)
            .zip(src_row.chunks_exact(src_pixel_len))
        {
            out_pixel[channel::BLUE] = src_pixel[layout.blue];
            out_pixel[channel::GREEN] = src_pixel[layout.green];
            out_pixel[channel::RED] = src_pixel[layout.red];
            out_pixel[channel::ALPHA] = layout.alpha.map_or(0xFF, |a| src_pixel[a]);
        }
    }
}
