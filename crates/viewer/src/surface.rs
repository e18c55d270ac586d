//! Contains [StatsSurface], a rendering surface that doesn't draw anything. It
//! just keeps track of what it was asked to present.

use std::fmt::{self, Display, Formatter};

use media::frame::{Dimensions, FrameView};

/// Counts presented frames and the frames that were skipped between them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsSurface {
    presented: u64,
    skipped: u64,
    last_sequence: Option<u64>,
    dimensions: Option<Dimensions>,
    checksum: u32,
}

impl StatsSurface {
    pub fn present(&mut self, view: FrameView<'_>) {
        if let Some(last) = self.last_sequence {
            self.skipped += view.sequence().saturating_sub(last + 1);
        }
        self.last_sequence = Some(view.sequence());
        self.presented += 1;

        if self.dimensions != Some(view.dimensions()) {
            log::info!("Presenting {} frames.", view.dimensions());
            self.dimensions = Some(view.dimensions());
        }

        self.checksum = (0..view.height())
            .flat_map(|y| view.row(y).iter())
            .fold(0u32, |sum, &b| sum.wrapping_mul(31).wrapping_add(u32::from(b)));

        log::trace!("Presented frame {} ({:08x}).", view.sequence(), self.checksum);
    }

    pub fn presented(&self) -> u64 {
        self.presented
    }

    /// Frames that were published but replaced before they could be presented.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}

impl Display for StatsSurface {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} frame(s) presented, {} skipped", self.presented, self.skipped)?;

        if let Some(dimensions) = self.dimensions {
            write!(f, ", last at {dimensions}")?;
        }

        Ok(())
    }
}
