//! # QR Rendering and Scanning
//!
//! Rendering uses `qrcode` at a fixed error-correction level with a version
//! ceiling. The smallest version that fits is chosen; a payload that needs
//! more than the ceiling fails with `PayloadTooLarge` rather than being
//! truncated. At the default (`M`, version 40) the ceiling is 2331 bytes,
//! room for a bundle of a few dozen short fields.
//!
//! Scanning uses `rqrr` over an 8-bit greyscale image. An image with no
//! readable code yields `NotFound`, which a camera loop treats as "try the
//! next frame".

use std::io::Cursor;

use image::{GrayImage, ImageFormat, Luma};
use qrcode::types::QrError;
use qrcode::{EcLevel, QrCode, Version};
use serde::{Deserialize, Serialize};
use vault_vc::SignedEnvelope;

use crate::codec::encode;
use crate::error::TransferError;

/// QR error-correction level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ErrorCorrection {
    /// ~7% recovery.
    L,
    /// ~15% recovery.
    #[default]
    M,
    /// ~25% recovery.
    Q,
    /// ~30% recovery.
    H,
}

impl From<ErrorCorrection> for EcLevel {
    fn from(level: ErrorCorrection) -> Self {
        match level {
            ErrorCorrection::L => EcLevel::L,
            ErrorCorrection::M => EcLevel::M,
            ErrorCorrection::Q => EcLevel::Q,
            ErrorCorrection::H => EcLevel::H,
        }
    }
}

/// Capacity class and bitmap geometry for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QrSettings {
    /// Error-correction level.
    pub error_correction: ErrorCorrection,
    /// Largest QR version (1..=40) a payload may occupy.
    pub max_version: i16,
    /// Pixels per module side.
    pub module_px: u32,
}

impl Default for QrSettings {
    fn default() -> Self {
        Self {
            error_correction: ErrorCorrection::M,
            max_version: 40,
            module_px: 8,
        }
    }
}

/// Render an envelope as a QR bitmap.
pub fn render(envelope: &SignedEnvelope, settings: &QrSettings) -> Result<GrayImage, TransferError> {
    render_text(&encode(envelope)?, settings)
}

/// Render an envelope as PNG bytes.
pub fn render_png(envelope: &SignedEnvelope, settings: &QrSettings) -> Result<Vec<u8>, TransferError> {
    let img = render(envelope, settings)?;
    let mut buffer: Vec<u8> = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .map_err(|e| TransferError::Image(format!("failed to encode PNG: {e}")))?;
    Ok(buffer)
}

/// Render an arbitrary transport string as a QR bitmap.
pub fn render_text(text: &str, settings: &QrSettings) -> Result<GrayImage, TransferError> {
    let too_large = || TransferError::PayloadTooLarge {
        size: text.len(),
        max_version: settings.max_version,
    };

    let code = QrCode::with_error_correction_level(text.as_bytes(), settings.error_correction.into())
        .map_err(|e| match e {
            QrError::DataTooLong => too_large(),
            other => TransferError::Image(format!("failed to create QR code: {other}")),
        })?;

    match code.version() {
        Version::Normal(v) if v <= settings.max_version => {}
        Version::Normal(_) => return Err(too_large()),
        Version::Micro(_) => {}
    }

    let px = settings.module_px.max(1);
    Ok(code
        .render::<Luma<u8>>()
        .quiet_zone(true)
        .module_dimensions(px, px)
        .build())
}

/// Read the first decodable QR code in a greyscale image.
pub fn scan(image: &GrayImage) -> Result<String, TransferError> {
    let (w, h) = image.dimensions();
    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(w as usize, h as usize, |x, y| {
        image.get_pixel(x as u32, y as u32).0[0]
    });

    let grids = prepared.detect_grids();
    for grid in &grids {
        match grid.decode() {
            Ok((_meta, content)) => return Ok(content),
            Err(e) => tracing::debug!(error = ?e, "QR grid detected but not decodable"),
        }
    }
    Err(TransferError::NotFound)
}

/// Decode an image file (PNG or JPEG) and scan it.
pub fn scan_bytes(bytes: &[u8]) -> Result<String, TransferError> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| TransferError::Image(format!("failed to decode image: {e}")))?;
    scan(&img.to_luma8())
}
