//! # Camera Acquisition
//!
//! A [`CameraSession`] owns a [`FrameSource`] inside a tokio task that polls
//! it at a fixed interval and scans each frame for a code. The task ends on
//! the first decoded code, on a device error, or on cancellation.
//!
//! Capturing a frame may block on the device, and scanning a full frame is
//! CPU-bound, so each poll runs on the blocking pool through
//! [`tokio::task::spawn_blocking`]. The device moves into the blocking call
//! and back out again; a cancellation that arrives mid-capture takes effect
//! once that capture returns.
//!
//! The device is held by a guard that calls [`FrameSource::release`] when
//! it is dropped, so the device is released exactly once on every exit
//! path: decode, error, cancel, panic, or the session being dropped without
//! being awaited.

use std::sync::Arc;
use std::time::Duration;

use image::GrayImage;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use vault_transfer::scan;

/// Default delay between frame captures, roughly one display frame.
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Shortest accepted delay between frame captures.
pub const MIN_FRAME_INTERVAL: Duration = Duration::from_millis(1);

/// Errors from a capture device.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// The device could not be opened or went away.
    #[error("capture device unavailable: {0}")]
    Unavailable(String),

    /// A frame could not be read.
    #[error("frame capture failed: {0}")]
    Frame(String),

    /// The scanning task ended abnormally.
    #[error("scan task aborted: {0}")]
    TaskAborted(String),
}

/// A capture device producing greyscale frames.
///
/// Both methods are called off the async workers and may block.
pub trait FrameSource: Send + 'static {
    /// Grab the next frame. `Ok(None)` means no frame is ready yet.
    fn capture(&mut self) -> Result<Option<GrayImage>, CaptureError>;

    /// Stop the device and free it for other users.
    fn release(&mut self);
}

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// A frame contained a code with this text.
    Decoded(String),
    /// The session was cancelled before a code was found.
    Cancelled,
    /// The device failed.
    DeviceError(CaptureError),
}

struct DeviceGuard<S: FrameSource> {
    source: S,
}

impl<S: FrameSource> Drop for DeviceGuard<S> {
    fn drop(&mut self) {
        self.source.release();
        tracing::debug!("capture device released");
    }
}

/// Stops a running session. Clones share the same signal.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    signal: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    /// Ask the session to stop. Idempotent.
    pub fn cancel(&self) {
        self.signal.send_replace(true);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        *self.signal.borrow()
    }
}

/// A running camera scan.
#[derive(Debug)]
pub struct CameraSession {
    cancel: CancelHandle,
    task: JoinHandle<ScanOutcome>,
}

impl CameraSession {
    /// Start polling `source` every `interval`. Must be called from within
    /// a tokio runtime.
    ///
    /// Intervals shorter than [`MIN_FRAME_INTERVAL`] are raised to it.
    pub fn start<S: FrameSource>(source: S, interval: Duration) -> Self {
        let interval = interval.max(MIN_FRAME_INTERVAL);
        let (tx, rx) = watch::channel(false);
        let task = tokio::spawn(scan_loop(DeviceGuard { source }, interval, rx));
        tracing::debug!(interval_ms = interval.as_millis() as u64, "camera session started");
        Self {
            cancel: CancelHandle {
                signal: Arc::new(tx),
            },
            task,
        }
    }

    /// A handle that can stop this session from elsewhere.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Wait for the session to end on its own or through a handle.
    pub async fn finish(self) -> ScanOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(e) => ScanOutcome::DeviceError(CaptureError::TaskAborted(e.to_string())),
        }
    }

    /// Cancel and wait until the loop has stopped and the device is
    /// released.
    pub async fn cancel(self) -> ScanOutcome {
        self.cancel.cancel();
        self.finish().await
    }
}

async fn scan_loop<S: FrameSource>(
    mut device: DeviceGuard<S>,
    interval: Duration,
    mut cancelled: watch::Receiver<bool>,
) -> ScanOutcome {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut polls: u64 = 0;

    loop {
        if *cancelled.borrow_and_update() {
            break;
        }
        tokio::select! {
            biased;
            changed = cancelled.changed() => {
                // All handles gone means nobody can observe a result.
                if changed.is_err() {
                    break;
                }
                continue;
            }
            _ = ticker.tick() => {}
        }

        polls += 1;
        let step = tokio::task::spawn_blocking(move || {
            let result = poll_frame(&mut device.source);
            (device, result)
        });
        let result = match step.await {
            Ok((returned, result)) => {
                device = returned;
                result
            }
            // The guard was dropped with the failed blocking call.
            Err(e) => return ScanOutcome::DeviceError(CaptureError::TaskAborted(e.to_string())),
        };

        match result {
            Ok(Some(raw)) => {
                tracing::debug!(polls, "code found in camera frame");
                return ScanOutcome::Decoded(raw);
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(error = %e, polls, "capture device failed");
                return ScanOutcome::DeviceError(e);
            }
        }
    }

    tracing::debug!(polls, "camera session cancelled");
    ScanOutcome::Cancelled
}

/// Capture one frame and scan it. Runs on the blocking pool.
fn poll_frame<S: FrameSource>(source: &mut S) -> Result<Option<String>, CaptureError> {
    Ok(source.capture()?.and_then(|frame| scan(&frame).ok()))
}
