//! Helpers for building bitmap files in tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::bitmap::source_stride;

/// Describes a bitmap file to [encode](BitmapSpec::encode).
#[derive(Debug, Clone, Copy)]
pub(crate) struct BitmapSpec {
    width: usize,
    height: usize,
    bits_per_pixel: u16,
    top_down: bool,
    masks: Option<[u32; 4]>,
    force_alpha_bit_fields: bool,
    info_len: u32,
}

impl BitmapSpec {
    /// A bottom-up `BI_RGB` bitmap with a 40-byte info header.
    pub(crate) fn new(width: usize, height: usize, bits_per_pixel: u16) -> Self {
        Self {
            width,
            height,
            bits_per_pixel,
            top_down: false,
            masks: None,
            force_alpha_bit_fields: false,
            info_len: 40,
        }
    }

    pub(crate) fn top_down(mut self) -> Self {
        self.top_down = true;
        self
    }

    /// Use bit field masks for red, green, blue, and alpha (in that order).
    /// Bumps the info header to the 56-byte V3 header unless [Self::info_len]
    /// is called afterwards.
    ///
    /// Compression is `BI_ALPHABITFIELDS` if there's an alpha mask the info
    /// header has no room for, `BI_BITFIELDS` otherwise.
    pub(crate) fn bit_fields(mut self, masks: [u32; 4]) -> Self {
        self.masks = Some(masks);
        if self.info_len == 40 {
            self.info_len = 56;
        }
        self
    }

    /// [Self::bit_fields], but always with `BI_ALPHABITFIELDS`.
    pub(crate) fn alpha_bit_fields(mut self, masks: [u32; 4]) -> Self {
        self.force_alpha_bit_fields = true;
        self.bit_fields(masks)
    }

    pub(crate) fn info_len(mut self, info_len: u32) -> Self {
        self.info_len = info_len;
        self
    }

    /// Encode the bitmap. `pixel(x, y)` returns the BGRA pixel that should end
    /// up at column `x` of row `y`, counting rows from the top of the image.
    pub(crate) fn encode(&self, mut pixel: impl FnMut(usize, usize) -> [u8; 4]) -> Vec<u8> {
        let bytes_per_pixel = usize::from(self.bits_per_pixel / 8);
        let stride = source_stride(self.width, self.bits_per_pixel).unwrap();

        let info_len = self.info_len as usize;

        // The masks start 40 bytes into the info header and spill past its end
        // when it's too small to hold them.
        let (compression, mask_count) = match self.masks {
            None => (0u32, 0usize),
            Some(masks) if self.force_alpha_bit_fields || (masks[3] != 0 && info_len < 56) => (6, 4),
            Some(_) if info_len >= 56 => (3, 4),
            Some(_) => (3, 3),
        };
        let trailing_masks = (40 + mask_count * 4).saturating_sub(info_len);

        let pixel_offset = 14 + info_len + trailing_masks;
        let file_len = pixel_offset + stride * self.height;

        let mut raw = vec![0u8; pixel_offset];
        raw[0..2].copy_from_slice(b"BM");
        raw[2..6].copy_from_slice(&(file_len as u32).to_le_bytes());
        raw[10..14].copy_from_slice(&(pixel_offset as u32).to_le_bytes());

        let height = if self.top_down {
            -(self.height as i32)
        } else {
            self.height as i32
        };

        raw[14..18].copy_from_slice(&self.info_len.to_le_bytes());
        raw[18..22].copy_from_slice(&(self.width as i32).to_le_bytes());
        raw[22..26].copy_from_slice(&height.to_le_bytes());
        raw[26..28].copy_from_slice(&1u16.to_le_bytes());
        raw[28..30].copy_from_slice(&self.bits_per_pixel.to_le_bytes());
        raw[30..34].copy_from_slice(&compression.to_le_bytes());
        raw[34..38].copy_from_slice(&((stride * self.height) as u32).to_le_bytes());
        raw[38..42].copy_from_slice(&2835u32.to_le_bytes());
        raw[42..46].copy_from_slice(&2835u32.to_le_bytes());

        if let Some(masks) = self.masks {
            for (i, mask) in masks.iter().take(mask_count).enumerate() {
                let at = 54 + i * 4;
                raw[at..at + 4].copy_from_slice(&mask.to_le_bytes());
            }
        }

        // Logical BGRA channel index for every source byte.
        let source_channels: Vec<Option<usize>> = match self.masks {
            None => (0..bytes_per_pixel).map(Some).collect(),
            Some([red, green, blue, alpha]) => (0..4)
                .map(|byte| {
                    let select = 0xFFu32 << (8 * byte);
                    [(blue, 0), (green, 1), (red, 2), (alpha, 3)]
                        .into_iter()
                        .find(|&(mask, _)| mask == select)
                        .map(|(_, channel)| channel)
                })
                .collect(),
        };

        for stored_row in 0..self.height {
            let y = if self.top_down {
                stored_row
            } else {
                self.height - 1 - stored_row
            };

            let mut row = Vec::with_capacity(stride);
            for x in 0..self.width {
                let bgra = pixel(x, y);
                row.extend(source_channels.iter().map(|c| c.map_or(0, |c| bgra[c])));
            }
            row.resize(stride, 0);
            raw.extend_from_slice(&row);
        }

        assert_eq!(raw.len(), file_len);
        raw
    }
}

/// Every pixel is `bgra`.
pub(crate) fn solid(bgra: [u8; 4]) -> impl FnMut(usize, usize) -> [u8; 4] {
    move |_, _| bgra
}

/// A pixel that encodes its own position.
pub(crate) fn coords(x: usize, y: usize) -> [u8; 4] {
    [x as u8, y as u8, (x * 16 + y) as u8, 0xFF]
}

/// A path inside the system temp directory that no other test uses.
pub(crate) fn temp_path(name: &str) -> PathBuf {
    static COUNTER: AtomicUsize = AtomicUsize::new(0);

    let unique = COUNTER.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!(
        "media-test-{}-{unique}-{name}",
        std::process::id()
    ))
}

/// Write `bytes` to a sibling file, then rename it over `path`. This is how the
/// capture process publishes snapshots.
pub(crate) fn write_atomically(path: &Path, bytes: &[u8]) {
    let partial = path.with_extension("partial");
    fs::write(&partial, bytes).unwrap();
    fs::rename(&partial, path).unwrap();
}
