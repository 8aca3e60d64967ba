//! # Verifier State Machine
//!
//! One [`Verifier`] runs one attempt at a time. An attempt starts with
//! [`Verifier::acquire`] and walks the checks in a fixed order:
//!
//! 1. `Decoding`: the scanned text must parse as a JSON object.
//! 2. `StructuralCheck`: `signature`, `sharedBy` and `fields` present, and
//!    the object is exactly one of the two disclosure shapes.
//! 3. `RevocationCheck`: no referenced credential is revoked.
//! 4. `SignatureCheck`: the signature recomputes over the payload.
//!
//! The revocation check runs before the signature check, so a revoked
//! disclosure reports `Revoked` even when its signature is also bad.
//!
//! File acquisition is single-shot: no code in the image fails the
//! attempt with `NoCodeFound`. Camera acquisition is continuous: a frame
//! without a code leaves the verifier in `Acquiring` for the next frame.

use std::sync::Arc;

use image::GrayImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use vault_transfer::{decode, scan, scan_bytes, TransferError};
use vault_vc::{DisclosurePayload, Field, RevocationLookup, SignedEnvelope};

use crate::camera::{CameraSession, CaptureError, ScanOutcome};

// ── Verifier State ───────────────────────────────────────────────────

/// Verifier phases. `Verified` and `Failed` are terminal for an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VerifierState {
    /// No attempt in progress.
    Idle,
    /// Waiting for an image or camera frame that contains a code.
    Acquiring,
    /// Parsing the scanned text.
    Decoding,
    /// Checking required fields and the payload shape.
    StructuralCheck,
    /// Consulting the revocation registry.
    RevocationCheck,
    /// Recomputing the signature.
    SignatureCheck,
    /// The disclosure checked out. Terminal.
    Verified,
    /// The attempt failed. Terminal.
    Failed,
}

impl VerifierState {
    /// Whether the attempt has ended.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Verified | Self::Failed)
    }

    /// The canonical string name of this state.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::Acquiring => "ACQUIRING",
            Self::Decoding => "DECODING",
            Self::StructuralCheck => "STRUCTURAL_CHECK",
            Self::RevocationCheck => "REVOCATION_CHECK",
            Self::SignatureCheck => "SIGNATURE_CHECK",
            Self::Verified => "VERIFIED",
            Self::Failed => "FAILED",
        }
    }

    /// The next check on the success path, if any.
    ///
    /// No wildcard: a new variant must be placed here explicitly.
    fn next_check(&self) -> Option<VerifierState> {
        match self {
            Self::Acquiring => Some(Self::Decoding),
            Self::Decoding => Some(Self::StructuralCheck),
            Self::StructuralCheck => Some(Self::RevocationCheck),
            Self::RevocationCheck => Some(Self::SignatureCheck),
            Self::SignatureCheck => Some(Self::Verified),
            Self::Idle | Self::Verified | Self::Failed => None,
        }
    }

    /// Whether `self -> to` is an edge of the machine.
    pub fn can_transition_to(&self, to: VerifierState) -> bool {
        match (self, to) {
            (Self::Idle, Self::Acquiring) => true,
            // Cancelling an acquisition, or clearing a finished attempt.
            (Self::Acquiring, Self::Idle) => true,
            (Self::Verified | Self::Failed, Self::Idle) => true,
            (from, Self::Failed) => !from.is_terminal() && *from != Self::Idle,
            (from, to) => from.next_check() == Some(to),
        }
    }
}

impl std::fmt::Display for VerifierState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where frames come from for the current attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AcquisitionMode {
    /// A single uploaded image or payload text.
    File,
    /// A stream of camera frames.
    Camera,
}

// ── Failures ─────────────────────────────────────────────────────────

/// Why an attempt failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureKind {
    /// A file image contained no readable code.
    NoCodeFound,
    /// The scanned text is not a JSON object.
    MalformedPayload,
    /// A required field is missing or the shape is wrong.
    InvalidSchema,
    /// A referenced credential has been revoked.
    Revoked,
    /// The signature does not match the payload.
    TamperedOrForged,
}

impl FailureKind {
    /// The canonical string name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoCodeFound => "NO_CODE_FOUND",
            Self::MalformedPayload => "MALFORMED_PAYLOAD",
            Self::InvalidSchema => "INVALID_SCHEMA",
            Self::Revoked => "REVOKED",
            Self::TamperedOrForged => "TAMPERED_OR_FORGED",
        }
    }

    /// The message shown to the verifying user.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::NoCodeFound => "No QR code found in the image. Please try another image.",
            Self::MalformedPayload => {
                "Failed to parse QR code data. It may not be a valid credential."
            }
            Self::InvalidSchema => {
                "Invalid QR code format. Required signature or fields are missing."
            }
            Self::Revoked => {
                "Verification failed: this credential (or one in the bundle) has been revoked by the issuer."
            }
            Self::TamperedOrForged => "Tampering detected: the signature is invalid.",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A failed attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationFailure {
    /// What went wrong.
    pub kind: FailureKind,
    /// Human-readable message for the verifying user.
    pub reason: String,
    /// Technical detail from the failing check, if any.
    pub detail: Option<String>,
}

impl VerificationFailure {
    fn new(kind: FailureKind, detail: Option<String>) -> Self {
        Self {
            kind,
            reason: kind.reason().to_string(),
            detail,
        }
    }
}

impl std::fmt::Display for VerificationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "{} ({detail})", self.reason),
            None => f.write_str(&self.reason),
        }
    }
}

/// A disclosure that passed every check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedDisclosure {
    /// The verified envelope.
    pub envelope: SignedEnvelope,
}

impl VerifiedDisclosure {
    /// The verified payload.
    pub fn payload(&self) -> &DisclosurePayload {
        &self.envelope.payload
    }

    /// Disclosed key/value pairs in payload order. Bundle fields lose their
    /// credential attribution here; use [`payload`](Self::payload) for it.
    pub fn fields(&self) -> Vec<Field> {
        match self.payload() {
            DisclosurePayload::Single(d) => d.fields.clone(),
            DisclosurePayload::Bundle(d) => d
                .fields
                .iter()
                .map(|f| Field::new(f.key.clone(), f.value.clone()))
                .collect(),
        }
    }
}

/// The result of a completed attempt.
pub type Outcome = Result<VerifiedDisclosure, VerificationFailure>;

// ── Errors ───────────────────────────────────────────────────────────

/// Misuse of the verifier, as opposed to a failed verification.
#[derive(Error, Debug)]
pub enum VerifierError {
    /// The requested step is not an edge from the current state.
    #[error("invalid verifier transition from {from} to {to}: {reason}")]
    InvalidTransition {
        /// Current state.
        from: VerifierState,
        /// Attempted target state.
        to: VerifierState,
        /// Human-readable reason for the rejection.
        reason: String,
    },

    /// The camera stopped delivering frames.
    #[error("camera acquisition failed: {0}")]
    Capture(#[from] CaptureError),
}

// ── Verifier ─────────────────────────────────────────────────────────

/// One recorded state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    /// State left.
    pub from: VerifierState,
    /// State entered.
    pub to: VerifierState,
}

/// The verifier. Holds the revocation view it checks against; it never
/// reaches for shared global state.
pub struct Verifier {
    revocations: Arc<dyn RevocationLookup>,
    state: VerifierState,
    mode: Option<AcquisitionMode>,
    history: Vec<Transition>,
    outcome: Option<Outcome>,
}

impl std::fmt::Debug for Verifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Verifier")
            .field("state", &self.state)
            .field("mode", &self.mode)
            .field("history", &self.history.len())
            .finish_non_exhaustive()
    }
}

impl Verifier {
    /// An idle verifier checking revocation against `revocations`.
    pub fn new(revocations: Arc<dyn RevocationLookup>) -> Self {
        Self {
            revocations,
            state: VerifierState::Idle,
            mode: None,
            history: Vec::new(),
            outcome: None,
        }
    }

    /// Current state.
    pub fn state(&self) -> VerifierState {
        self.state
    }

    /// Acquisition mode of the current or last attempt.
    pub fn mode(&self) -> Option<AcquisitionMode> {
        self.mode
    }

    /// Every transition of the current or last attempt, in order.
    pub fn history(&self) -> &[Transition] {
        &self.history
    }

    /// Whether the current or last attempt passed through `state`.
    pub fn visited(&self, state: VerifierState) -> bool {
        self.history.iter().any(|t| t.to == state)
    }

    /// The result of the last completed attempt.
    pub fn last_outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }

    fn transition(&mut self, to: VerifierState) -> Result<(), VerifierError> {
        let from = self.state;
        if !from.can_transition_to(to) {
            return Err(VerifierError::InvalidTransition {
                from,
                to,
                reason: format!("no edge {from} -> {to}"),
            });
        }
        tracing::debug!(%from, %to, "verifier transition");
        self.history.push(Transition { from, to });
        self.state = to;
        Ok(())
    }

    /// Start an attempt. A finished attempt is cleared first; an attempt
    /// still in progress is an error.
    pub fn acquire(&mut self, mode: AcquisitionMode) -> Result<(), VerifierError> {
        if self.state.is_terminal() {
            self.transition(VerifierState::Idle)?;
        }
        if self.state != VerifierState::Idle {
            return Err(VerifierError::InvalidTransition {
                from: self.state,
                to: VerifierState::Acquiring,
                reason: "an attempt is already in progress".to_string(),
            });
        }
        self.history.clear();
        self.outcome = None;
        self.mode = Some(mode);
        self.transition(VerifierState::Acquiring)
    }

    /// Abandon an acquisition and return to `Idle`.
    pub fn cancel(&mut self) -> Result<(), VerifierError> {
        if self.state != VerifierState::Acquiring {
            return Err(VerifierError::InvalidTransition {
                from: self.state,
                to: VerifierState::Idle,
                reason: "only an acquisition can be cancelled".to_string(),
            });
        }
        self.transition(VerifierState::Idle)?;
        tracing::info!("verification cancelled");
        Ok(())
    }

    /// Offer one frame to the current acquisition.
    ///
    /// Returns `None` when a camera frame carries no code; the verifier
    /// stays in `Acquiring`. In file mode the same case fails the attempt.
    pub fn offer_frame(&mut self, frame: &GrayImage) -> Result<Option<Outcome>, VerifierError> {
        self.require_acquiring()?;
        match scan(frame) {
            Ok(raw) => self.run_checks(&raw).map(Some),
            Err(e) if self.mode == Some(AcquisitionMode::Camera) => {
                tracing::trace!(error = %e, "no code in frame");
                Ok(None)
            }
            Err(e) => self.fail(FailureKind::NoCodeFound, Some(e.to_string())).map(Some),
        }
    }

    /// Verify a single decoded image.
    pub fn verify_image(&mut self, image: &GrayImage) -> Result<Outcome, VerifierError> {
        self.acquire(AcquisitionMode::File)?;
        match self.offer_frame(image)? {
            Some(outcome) => Ok(outcome),
            None => self.fail(FailureKind::NoCodeFound, None),
        }
    }

    /// Verify an image file (PNG or JPEG bytes). Bytes that are not an
    /// image carry no code.
    pub fn verify_image_bytes(&mut self, bytes: &[u8]) -> Result<Outcome, VerifierError> {
        self.acquire(AcquisitionMode::File)?;
        match scan_bytes(bytes) {
            Ok(raw) => self.run_checks(&raw),
            Err(e @ (TransferError::NotFound | TransferError::Image(_))) => {
                self.fail(FailureKind::NoCodeFound, Some(e.to_string()))
            }
            Err(e) => self.fail(FailureKind::MalformedPayload, Some(e.to_string())),
        }
    }

    /// Verify transport text obtained without a scan, e.g. pasted or read
    /// from a file.
    pub fn verify_text(&mut self, raw: &str) -> Result<Outcome, VerifierError> {
        self.acquire(AcquisitionMode::File)?;
        self.run_checks(raw)
    }

    /// Run a camera session to completion.
    ///
    /// Returns `None` if the session was cancelled, leaving the verifier in
    /// `Idle`. A device failure also returns the verifier to `Idle` and is
    /// reported as [`VerifierError::Capture`]. The device is released in
    /// every case before this returns.
    pub async fn verify_camera(
        &mut self,
        session: CameraSession,
    ) -> Result<Option<Outcome>, VerifierError> {
        self.acquire(AcquisitionMode::Camera)?;
        match session.finish().await {
            ScanOutcome::Decoded(raw) => self.run_checks(&raw).map(Some),
            ScanOutcome::Cancelled => {
                self.cancel()?;
                Ok(None)
            }
            ScanOutcome::DeviceError(e) => {
                self.transition(VerifierState::Idle)?;
                tracing::warn!(error = %e, "camera acquisition stopped");
                Err(VerifierError::Capture(e))
            }
        }
    }

    fn require_acquiring(&self) -> Result<(), VerifierError> {
        if self.state != VerifierState::Acquiring {
            return Err(VerifierError::InvalidTransition {
                from: self.state,
                to: VerifierState::Decoding,
                reason: "frames are only accepted while acquiring".to_string(),
            });
        }
        Ok(())
    }

    /// Decoding through signature check, from `Acquiring`.
    fn run_checks(&mut self, raw: &str) -> Result<Outcome, VerifierError> {
        self.transition(VerifierState::Decoding)?;
        let candidate = match decode(raw) {
            Ok(candidate) => candidate,
            Err(e) => return self.fail(FailureKind::MalformedPayload, Some(e.to_string())),
        };

        self.transition(VerifierState::StructuralCheck)?;
        let envelope = match SignedEnvelope::from_json_object(candidate) {
            Ok(envelope) => envelope,
            Err(e) => return self.fail(FailureKind::InvalidSchema, Some(e.to_string())),
        };

        self.transition(VerifierState::RevocationCheck)?;
        if self.revocations.is_any_revoked(&envelope.payload.credential_ids()) {
            return self.fail(FailureKind::Revoked, None);
        }

        self.transition(VerifierState::SignatureCheck)?;
        if !envelope.verify_signature() {
            return self.fail(FailureKind::TamperedOrForged, None);
        }

        self.transition(VerifierState::Verified)?;
        tracing::info!(
            kind = %envelope.payload.kind(),
            title = envelope.payload.title(),
            fields = envelope.payload.field_count(),
            shared_by = %envelope.payload.shared_by().redacted(),
            "disclosure verified"
        );
        let outcome: Outcome = Ok(VerifiedDisclosure { envelope });
        self.outcome = Some(outcome.clone());
        Ok(outcome)
    }

    fn fail(&mut self, kind: FailureKind, detail: Option<String>) -> Result<Outcome, VerifierError> {
        let at = self.state;
        self.transition(VerifierState::Failed)?;
        tracing::warn!(%kind, state = %at, detail = detail.as_deref().unwrap_or(""), "verification failed");
        let outcome: Outcome = Err(VerificationFailure::new(kind, detail));
        self.outcome = Some(outcome.clone());
        Ok(outcome)
    }
}
