//! # vault-state: Verifier State Machine
//!
//! Drives one verification attempt from acquisition to a terminal result:
//!
//! ```text
//! Idle -> Acquiring -> Decoding -> StructuralCheck -> RevocationCheck -> SignatureCheck -> Verified
//!             |            |              |                  |                 |
//!             +------------+--------------+------------------+-----------------+---> Failed
//! ```
//!
//! Every failure is a value ([`VerificationFailure`]) carrying a
//! [`FailureKind`] and a human-readable reason. Failures are terminal for
//! the attempt and never retried; a new acquisition starts over from `Idle`.
//!
//! - [`verifier`]: the state machine and the check pipeline.
//! - [`camera`]: continuous frame acquisition as a cancellable task that
//!   owns the capture device and releases it however the task ends.

pub mod camera;
pub mod verifier;

pub use camera::{
    CameraSession, CancelHandle, CaptureError, FrameSource, ScanOutcome, DEFAULT_FRAME_INTERVAL,
    MIN_FRAME_INTERVAL,
};
pub use verifier::{
    AcquisitionMode, FailureKind, Outcome, Transition, VerificationFailure, VerifiedDisclosure,
    Verifier, VerifierError, VerifierState,
};
