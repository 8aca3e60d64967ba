//! # Verify Subcommand
//!
//! Runs the verifier against a QR image, a raw payload file, or a directory
//! of recorded camera frames. Exit code `0` means verified, `1` means the
//! disclosure failed a check or the scan was cancelled.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ArgGroup, Args};
use image::GrayImage;
use vault_state::{
    CameraSession, CaptureError, FrameSource, Outcome, VerifiedDisclosure, Verifier,
};
use vault_vc::DisclosurePayload;

use crate::config::VaultConfig;
use crate::open_vault;

/// Arguments for `vault verify`.
#[derive(Args, Debug)]
#[command(group(ArgGroup::new("source").required(true).args(["image", "payload", "frames"])))]
pub struct VerifyArgs {
    /// QR code image (PNG or JPEG).
    #[arg(long)]
    pub image: Option<PathBuf>,

    /// File containing the raw transport payload.
    #[arg(long)]
    pub payload: Option<PathBuf>,

    /// Directory of camera frames, scanned in file-name order until one
    /// holds a code. Ctrl-C cancels.
    #[arg(long)]
    pub frames: Option<PathBuf>,
}

/// Execute the verify subcommand.
pub fn run_verify(args: &VerifyArgs, config: &VaultConfig) -> Result<u8> {
    let registry = open_vault(config)
        .revocation_registry()
        .context("failed to load revocation list")?;
    let mut verifier = Verifier::new(Arc::new(registry));

    let outcome = if let Some(path) = &args.image {
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read image: {}", path.display()))?;
        verifier.verify_image_bytes(&bytes)?
    } else if let Some(path) = &args.payload {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read payload: {}", path.display()))?;
        verifier.verify_text(raw.trim())?
    } else if let Some(dir) = &args.frames {
        match scan_frames(&mut verifier, dir, config)? {
            Some(outcome) => outcome,
            None => {
                println!("CANCELLED: scan stopped before a code was found");
                return Ok(1);
            }
        }
    } else {
        anyhow::bail!("one of --image, --payload or --frames is required");
    };

    Ok(report(&outcome))
}

/// Print an outcome and return its exit code.
pub fn report(outcome: &Outcome) -> u8 {
    match outcome {
        Ok(verified) => {
            print_verified(verified);
            0
        }
        Err(failure) => {
            println!("FAILED ({}): {}", failure.kind, failure.reason);
            if let Some(detail) = &failure.detail {
                tracing::info!(%detail, "verification failure detail");
            }
            1
        }
    }
}

fn print_verified(verified: &VerifiedDisclosure) {
    let payload = verified.payload();
    println!(
        "VERIFIED: {} \"{}\" shared by {} at {}",
        payload.kind(),
        payload.title(),
        payload.shared_by().redacted(),
        payload.timestamp()
    );
    match payload {
        DisclosurePayload::Single(d) => {
            println!("  Credential: {}", d.credential_id);
            for f in &d.fields {
                println!("  {}: {}", f.key, f.value);
            }
        }
        DisclosurePayload::Bundle(d) => {
            for f in &d.fields {
                println!("  [{} {}] {}: {}", f.credential_type, f.credential_id, f.key, f.value);
            }
        }
    }
}

fn scan_frames(
    verifier: &mut Verifier,
    dir: &Path,
    config: &VaultConfig,
) -> Result<Option<Outcome>> {
    let camera = DirectoryCamera::open(dir)?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    let outcome = runtime.block_on(async {
        let session = CameraSession::start(camera, config.camera.frame_interval());
        let cancel = session.cancel_handle();
        let interrupt = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });
        let result = verifier.verify_camera(session).await;
        interrupt.abort();
        result
    })?;
    Ok(outcome)
}

/// Replays image files from a directory as camera frames.
#[derive(Debug)]
pub struct DirectoryCamera {
    dir: PathBuf,
    frames: VecDeque<PathBuf>,
}

impl DirectoryCamera {
    /// Collect the regular files in `dir`, sorted by name.
    pub fn open(dir: &Path) -> Result<Self> {
        let entries = std::fs::read_dir(dir)
            .with_context(|| format!("failed to open frame directory: {}", dir.display()))?;
        let mut frames = Vec::new();
        for entry in entries {
            let path = entry
                .with_context(|| format!("failed to list {}", dir.display()))?
                .path();
            if path.is_file() {
                frames.push(path);
            }
        }
        frames.sort();
        tracing::debug!(frames = frames.len(), dir = %dir.display(), "frame directory opened");
        Ok(Self {
            dir: dir.to_path_buf(),
            frames: frames.into(),
        })
    }
}

impl FrameSource for DirectoryCamera {
    fn capture(&mut self) -> Result<Option<GrayImage>, CaptureError> {
        let Some(path) = self.frames.pop_front() else {
            return Err(CaptureError::Unavailable(format!(
                "no more frames in {}",
                self.dir.display()
            )));
        };
        match image::open(&path) {
            Ok(img) => Ok(Some(img.to_luma8())),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "skipping unreadable frame");
                Ok(None)
            }
        }
    }

    fn release(&mut self) {
        self.frames.clear();
    }
}
