//! End-to-end tests: a file on disk, a running [Feed], and a consumer.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use media::bitmap::{DecodeError, FormatError};
use media::config::FeedConfig;
use media::feed::Feed;
use media::handoff::HandoffStrategy;
use media::poller::PollError;

const PATIENCE: Duration = Duration::from_secs(5);

fn temp_path(name: &str) -> PathBuf {
    static COUNTER: AtomicUsize = AtomicUsize::new(0);

    let unique = COUNTER.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!(
        "media-feed-test-{}-{unique}-{name}",
        std::process::id()
    ))
}

/// A top-down 32-bit bitmap where every pixel is `bgra`.
fn bitmap(width: u32, height: u32, bgra: [u8; 4]) -> Vec<u8> {
    let pixel_bytes = width * height * 4;
    let mut raw = Vec::with_capacity(54 + pixel_bytes as usize);

    raw.extend_from_slice(b"BM");
    raw.extend_from_slice(&(54 + pixel_bytes).to_le_bytes());
    raw.extend_from_slice(&[0; 4]);
    raw.extend_from_slice(&54u32.to_le_bytes());

    raw.extend_from_slice(&40u32.to_le_bytes());
    raw.extend_from_slice(&(width as i32).to_le_bytes());
    raw.extend_from_slice(&(-(height as i32)).to_le_bytes());
    raw.extend_from_slice(&1u16.to_le_bytes());
    raw.extend_from_slice(&32u16.to_le_bytes());
    raw.extend_from_slice(&0u32.to_le_bytes());
    raw.extend_from_slice(&pixel_bytes.to_le_bytes());
    raw.extend_from_slice(&[0; 16]);

    for _ in 0..width * height {
        raw.extend_from_slice(&bgra);
    }

    raw
}

fn publish(path: &Path, bytes: &[u8]) {
    let partial = path.with_extension("partial");
    fs::write(&partial, bytes).unwrap();
    fs::rename(&partial, path).unwrap();
}

fn config(source: &Path, handoff: HandoffStrategy) -> FeedConfig {
    FeedConfig {
        source: source.to_owned(),
        fps: 250,
        handoff,
    }
}

#[test]
fn snapshots_are_presented_as_they_change() {
    for strategy in [HandoffStrategy::Swap, HandoffStrategy::Copy] {
        let path = temp_path("changing.bmp");
        let feed = Feed::start(&config(&path, strategy)).unwrap();
        let mut presenter = feed.presenter();

        for fill in [0x10, 0x20, 0x30] {
            publish(&path, &bitmap(4, 4, [fill, fill, fill, 0xFF]));

            let start = Instant::now();
            let mut seen = None;
            while seen != Some(fill) && start.elapsed() < PATIENCE {
                presenter.acquire(|view| {
                    assert_eq!((view.width(), view.height(), view.stride()), (4, 4, 16));
                    seen = Some(view.pixel(3, 3)[0]);
                });
                thread::sleep(Duration::from_millis(1));
            }

            assert_eq!(seen, Some(fill), "{strategy:?}");
        }

        assert!(feed.fatal_error().is_none());
        drop(feed);
        _ = fs::remove_file(&path);
    }
}

#[test]
fn a_bad_signature_is_reported_exactly_once() {
    let path = temp_path("bad.bmp");
    let mut raw = bitmap(4, 4, [0; 4]);
    raw[..2].copy_from_slice(b"XX");
    publish(&path, &raw);

    let feed = Feed::start(&config(&path, HandoffStrategy::Swap)).unwrap();

    let error = feed.wait_fatal_error(PATIENCE);
    assert!(matches!(
        error,
        Some(PollError::Decode {
            source: DecodeError::Format(FormatError::BadSignature),
            ..
        })
    ));

    let start = Instant::now();
    while feed.is_running() && start.elapsed() < PATIENCE {
        thread::sleep(Duration::from_millis(1));
    }
    assert!(!feed.is_running());
    assert!(feed.fatal_error().is_none());
    assert!(!feed.presenter().has_pending());

    drop(feed);
    _ = fs::remove_file(&path);
}

#[test]
fn a_missing_source_is_not_an_error() {
    let path = temp_path("late.bmp");
    let feed = Feed::start(&config(&path, HandoffStrategy::Swap)).unwrap();
    let mut presenter = feed.presenter();

    assert!(feed.wait_fatal_error(Duration::from_millis(30)).is_none());
    assert!(feed.is_running());
    assert!(!presenter.acquire(|_| panic!("Nothing exists to present.")));

    publish(&path, &bitmap(2, 2, [1, 2, 3, 4]));

    let start = Instant::now();
    let mut presented = false;
    while !presented && start.elapsed() < PATIENCE {
        presented = presenter.acquire(|view| assert_eq!(view.pixel(0, 0), [1, 2, 3, 4]));
        thread::sleep(Duration::from_millis(1));
    }
    assert!(presented);

    feed.stop();
    drop(feed);
    _ = fs::remove_file(&path);
}

#[test]
fn stopping_is_prompt() {
    let path = temp_path("slow.bmp");
    let feed = Feed::start(&FeedConfig {
        source: path,
        fps: 1,
        handoff: HandoffStrategy::Copy,
    })
    .unwrap();

    // Let the first tick happen so the poller is asleep waiting for the next.
    thread::sleep(Duration::from_millis(20));

    let start = Instant::now();
    feed.stop();
    drop(feed);
    assert!(start.elapsed() < Duration::from_millis(900));
}
