//! # End-to-End Disclosure and Verification
//!
//! Holder builds a disclosure, it travels as a QR code, the verifier checks
//! it against the issuer's revocation registry.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use image::{GrayImage, Luma};
use vault_core::{ActorId, CredentialId, Timestamp};
use vault_state::{
    CameraSession, CaptureError, FailureKind, FrameSource, ScanOutcome, Verifier, VerifierState,
};
use vault_store::{FileStore, Vault};
use vault_transfer::{encode, render, render_png, scan, QrSettings, TransferError};
use vault_vc::{
    build_bundle_disclosure, build_credential_disclosure, issue_credential, Bundle, Credential,
    DisclosureError, DisclosureKind, DisclosurePayload, DocumentAnalyzer, Field, FieldSelection,
    MockAnalyzer, RevocationRegistry, SignedEnvelope, DEFAULT_ISSUER,
};

fn cid(s: &str) -> CredentialId {
    CredentialId::new(s).unwrap()
}

fn actor() -> ActorId {
    ActorId::new("did:x:1").unwrap()
}

fn passport() -> Credential {
    Credential {
        id: cid("c1"),
        document_type: "Passport".to_string(),
        issuer: DEFAULT_ISSUER.to_string(),
        issuance_date: Timestamp::from_epoch_secs(1_700_000_000).unwrap(),
        ipfs_hash: "ipfs://placeholder".to_string(),
        file_data_url: String::new(),
        fields: vec![Field::new("Name", "Alice"), Field::new("DOB", "2000-01-01")],
    }
}

fn visa() -> Credential {
    Credential {
        id: cid("c2"),
        document_type: "Visa".to_string(),
        fields: vec![Field::new("Visa No", "V-778"), Field::new("Country", "NZ")],
        ..passport()
    }
}

fn share_name() -> SignedEnvelope {
    build_credential_disclosure(&passport(), &BTreeSet::from(["Name".to_string()]), &actor())
        .unwrap()
}

/// Holder side through QR render and verifier-side scan.
fn over_the_air(envelope: &SignedEnvelope) -> String {
    let image = render(envelope, &QrSettings::default()).unwrap();
    scan(&image).unwrap()
}

fn verifier(registry: &Arc<RevocationRegistry>) -> Verifier {
    Verifier::new(registry.clone())
}

// ── Scenarios ────────────────────────────────────────────────────────

#[test]
fn valid_disclosure_verifies_through_qr() {
    let registry = Arc::new(RevocationRegistry::new());
    let raw = over_the_air(&share_name());

    let mut v = verifier(&registry);
    let verified = v.verify_text(&raw).unwrap().unwrap();

    assert_eq!(verified.fields(), vec![Field::new("Name", "Alice")]);
    assert_eq!(verified.payload().kind(), DisclosureKind::Single);
    assert_eq!(verified.payload().title(), "Passport");
    assert_eq!(v.state(), VerifierState::Verified);
}

#[test]
fn valid_disclosure_verifies_from_png_file() {
    let registry = Arc::new(RevocationRegistry::new());
    let png = render_png(&share_name(), &QrSettings::default()).unwrap();
    let mut v = verifier(&registry);
    assert!(v.verify_image_bytes(&png).unwrap().is_ok());
}

#[test]
fn altered_value_is_tampered_or_forged() {
    let registry = Arc::new(RevocationRegistry::new());
    let raw = over_the_air(&share_name()).replace("\"Alice\"", "\"Bob\"");
    assert!(raw.contains("Bob"));

    let mut v = verifier(&registry);
    let failure = v.verify_text(&raw).unwrap().unwrap_err();
    assert_eq!(failure.kind, FailureKind::TamperedOrForged);
    assert!(v.visited(VerifierState::SignatureCheck));
}

#[test]
fn revoked_credential_fails_before_signature_check() {
    let registry = Arc::new(RevocationRegistry::new());
    let raw = over_the_air(&share_name());
    registry.revoke(&cid("c1"));

    let mut v = verifier(&registry);
    let failure = v.verify_text(&raw).unwrap().unwrap_err();
    assert_eq!(failure.kind, FailureKind::Revoked);
    assert!(v.visited(VerifierState::RevocationCheck));
    assert!(!v.visited(VerifierState::SignatureCheck));
}

#[test]
fn reinstated_credential_verifies_again() {
    let registry = Arc::new(RevocationRegistry::new());
    let raw = encode(&share_name()).unwrap();
    registry.revoke(&cid("c1"));
    let mut v = verifier(&registry);
    assert!(v.verify_text(&raw).unwrap().is_err());

    registry.reinstate(&cid("c1"));
    assert!(v.verify_text(&raw).unwrap().is_ok());
}

#[test]
fn bundle_fails_when_any_source_is_revoked() {
    let registry = Arc::new(RevocationRegistry::new());
    let bundle = Bundle::assemble(
        "Travel",
        &[
            FieldSelection::new(cid("c1"), "Name"),
            FieldSelection::new(cid("c2"), "Visa No"),
        ],
        &[passport(), visa()],
    )
    .unwrap();
    let raw = over_the_air(&build_bundle_disclosure(&bundle, &actor()).unwrap());

    let mut v = verifier(&registry);
    let verified = v.verify_text(&raw).unwrap().unwrap();
    assert_eq!(
        verified.fields(),
        vec![Field::new("Name", "Alice"), Field::new("Visa No", "V-778")]
    );

    registry.revoke(&cid("c2"));
    let failure = v.verify_text(&raw).unwrap().unwrap_err();
    assert_eq!(failure.kind, FailureKind::Revoked);
}

#[test]
fn empty_selection_is_rejected() {
    let err = build_credential_disclosure(&passport(), &BTreeSet::new(), &actor()).unwrap_err();
    assert!(matches!(err, DisclosureError::EmptySelection));

    let unmatched = BTreeSet::from(["Height".to_string()]);
    let err = build_credential_disclosure(&passport(), &unmatched, &actor()).unwrap_err();
    assert!(matches!(err, DisclosureError::EmptySelection));
}

#[test]
fn image_without_code_is_no_code_found() {
    let registry = Arc::new(RevocationRegistry::new());
    let mut v = verifier(&registry);
    let blank = GrayImage::from_pixel(200, 200, Luma([255]));
    let failure = v.verify_image(&blank).unwrap().unwrap_err();
    assert_eq!(failure.kind, FailureKind::NoCodeFound);
    assert!(!v.visited(VerifierState::Decoding));
}

#[test]
fn foreign_qr_code_is_malformed() {
    let registry = Arc::new(RevocationRegistry::new());
    let image = vault_transfer::render_text("https://example.com/menu", &QrSettings::default())
        .unwrap();
    let mut v = verifier(&registry);
    let failure = v.verify_image(&image).unwrap().unwrap_err();
    assert_eq!(failure.kind, FailureKind::MalformedPayload);
}

#[test]
fn json_without_signature_is_invalid_schema() {
    let registry = Arc::new(RevocationRegistry::new());
    let mut value = serde_json::to_value(share_name()).unwrap();
    value.as_object_mut().unwrap().remove("signature");
    let mut v = verifier(&registry);
    let failure = v.verify_text(&value.to_string()).unwrap().unwrap_err();
    assert_eq!(failure.kind, FailureKind::InvalidSchema);
}

#[test]
fn reattributed_disclosure_is_tampered() {
    let registry = Arc::new(RevocationRegistry::new());
    let raw = encode(&share_name()).unwrap().replace("did:x:1", "did:x:2");
    let mut v = verifier(&registry);
    assert_eq!(
        v.verify_text(&raw).unwrap().unwrap_err().kind,
        FailureKind::TamperedOrForged
    );
}

/// Anyone who learns the holder's actor id can mint disclosures that
/// verify. The check proves consistency with the claimed id, not authorship.
#[test]
fn shared_secret_holder_can_mint_valid_disclosures() {
    let registry = Arc::new(RevocationRegistry::new());
    let forged_credential = Credential {
        fields: vec![Field::new("Name", "Mallory")],
        ..passport()
    };
    let forged = build_credential_disclosure(
        &forged_credential,
        &BTreeSet::from(["Name".to_string()]),
        &actor(),
    )
    .unwrap();
    let mut v = verifier(&registry);
    let verified = v.verify_text(&encode(&forged).unwrap()).unwrap().unwrap();
    assert_eq!(verified.fields(), vec![Field::new("Name", "Mallory")]);
}

#[test]
fn oversized_bundle_does_not_fit_a_code() {
    let many: Vec<Field> = (0..200)
        .map(|i| Field::new(format!("Field {i}"), "x".repeat(20)))
        .collect();
    let credential = Credential {
        fields: many,
        ..passport()
    };
    let keys: BTreeSet<String> = credential.keys().map(str::to_string).collect();
    let envelope = build_credential_disclosure(&credential, &keys, &actor()).unwrap();
    assert!(matches!(
        render(&envelope, &QrSettings::default()),
        Err(TransferError::PayloadTooLarge { max_version: 40, .. })
    ));
}

// ── Holder vault on disk ─────────────────────────────────────────────

#[test]
fn holder_flow_over_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let vault = Vault::new(FileStore::new(dir.path()));
    let holder = ActorId::generate();
    vault.unlock(&holder).unwrap();

    let image = b"\x89PNG passport scan";
    let analyzed = MockAnalyzer.analyze(image, "image/png").unwrap();
    let credential = issue_credential(analyzed, image, "image/png", DEFAULT_ISSUER);
    vault.add_credential(credential.clone()).unwrap();

    // Reopen from disk, as a later session would.
    let vault = Vault::new(FileStore::new(dir.path()));
    let stored = vault.credential(&credential.id).unwrap().unwrap();
    let envelope = build_credential_disclosure(
        &stored,
        &BTreeSet::from(["Full Name".to_string(), "Document ID".to_string()]),
        &vault.require_actor().unwrap(),
    )
    .unwrap();
    let png = render_png(&envelope, &QrSettings::default()).unwrap();

    let registry = Arc::new(vault.revocation_registry().unwrap());
    let mut v = Verifier::new(registry.clone());
    let verified = v.verify_image_bytes(&png).unwrap().unwrap();
    let keys: Vec<String> = verified.fields().into_iter().map(|f| f.key).collect();
    assert_eq!(keys, vec!["Full Name", "Document ID"]);
    match verified.payload() {
        DisclosurePayload::Single(d) => assert_eq!(d.credential_id, credential.id),
        DisclosurePayload::Bundle(_) => panic!("expected a single-credential disclosure"),
    }

    registry.revoke(&credential.id);
    vault.save_revocations(&registry).unwrap();
    let reloaded = Arc::new(vault.revocation_registry().unwrap());
    let mut v = Verifier::new(reloaded);
    assert_eq!(
        v.verify_image_bytes(&png).unwrap().unwrap_err().kind,
        FailureKind::Revoked
    );
}

// ── Camera acquisition ───────────────────────────────────────────────

struct Feed {
    frames: Vec<GrayImage>,
    captures: Arc<AtomicUsize>,
    releases: Arc<AtomicUsize>,
}

impl Feed {
    fn new(frames: Vec<GrayImage>) -> (Self, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let captures = Arc::new(AtomicUsize::new(0));
        let releases = Arc::new(AtomicUsize::new(0));
        let feed = Self {
            frames,
            captures: captures.clone(),
            releases: releases.clone(),
        };
        (feed, captures, releases)
    }
}

impl FrameSource for Feed {
    fn capture(&mut self) -> Result<Option<GrayImage>, CaptureError> {
        self.captures.fetch_add(1, Ordering::SeqCst);
        Ok(Some(
            self.frames
                .pop()
                .unwrap_or_else(|| GrayImage::from_pixel(64, 64, Luma([255]))),
        ))
    }

    fn release(&mut self) {
        self.releases.fetch_add(1, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn camera_scan_verifies_after_empty_frames() {
    let registry = Arc::new(RevocationRegistry::new());
    let code = render(&share_name(), &QrSettings::default()).unwrap();
    let blank = GrayImage::from_pixel(64, 64, Luma([255]));
    let (feed, captures, releases) = Feed::new(vec![code, blank.clone(), blank]);

    let session = CameraSession::start(feed, Duration::from_millis(1));
    let mut v = verifier(&registry);
    let outcome = v.verify_camera(session).await.unwrap().unwrap();

    assert!(outcome.is_ok());
    assert_eq!(captures.load(Ordering::SeqCst), 3);
    assert_eq!(releases.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn camera_cancel_stops_loop_and_releases_device() {
    let registry = Arc::new(RevocationRegistry::new());
    let (feed, captures, releases) = Feed::new(Vec::new());
    let session = CameraSession::start(feed, Duration::from_millis(1));
    let handle = session.cancel_handle();

    tokio::time::sleep(Duration::from_millis(15)).await;
    handle.cancel();
    let mut v = verifier(&registry);
    assert!(v.verify_camera(session).await.unwrap().is_none());
    assert_eq!(v.state(), VerifierState::Idle);
    assert_eq!(releases.load(Ordering::SeqCst), 1);

    let stopped_at = captures.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(15)).await;
    assert_eq!(captures.load(Ordering::SeqCst), stopped_at);
}

#[tokio::test]
async fn session_cancel_reports_cancelled() {
    let (feed, _, releases) = Feed::new(Vec::new());
    let session = CameraSession::start(feed, Duration::from_millis(1));
    assert_eq!(session.cancel().await, ScanOutcome::Cancelled);
    assert_eq!(releases.load(Ordering::SeqCst), 1);
}
