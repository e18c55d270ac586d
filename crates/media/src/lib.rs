//! This library contains the frame-acquisition pipeline: it polls a bitmap
//! snapshot that some capture process keeps overwriting, decodes it into a
//! reusable BGRA buffer, and hands the newest complete frame to a renderer.
//!
//! The pieces, leaves first:
//!
//! - [frame]: [Dimensions](frame::Dimensions), [PixelBuffer](frame::PixelBuffer),
//!   [DecodedFrame](frame::DecodedFrame), and the borrowed
//!   [FrameView](frame::FrameView) consumers get to look at.
//! - [bitmap]: the BMP header parser and decoder.
//! - [handoff]: the single-slot channel between the producer and the consumer,
//!   with a swap-ownership and a copy-on-present backend.
//! - [latency]: rolling-window timing instrumentation.
//! - [poller]: the fixed-period loop that drives the decoder.
//! - [config]: [FeedConfig](config::FeedConfig), loadable from JSON.
//! - [feed]: wires everything together on a worker thread.

pub mod bitmap;
pub mod config;
pub mod feed;
pub mod frame;
pub mod handoff;
pub mod latency;
pub mod poller;

#[cfg(test)]
pub(crate) mod test_bitmaps;
