//! # Document Analyzer Boundary
//!
//! Field extraction from document images is an external capability. This
//! module defines the boundary ([`DocumentAnalyzer`]), a deterministic
//! placeholder ([`MockAnalyzer`]), and a wrapper that degrades to a fallback
//! result instead of failing ([`FallbackAnalyzer`]).
//!
//! Whatever the analyzer returns, degraded or not, becomes an ordinary
//! [`Credential`] via [`issue_credential()`]. Nothing downstream can tell
//! the difference.

use base64ct::{Base64, Encoding};
use thiserror::Error;
use vault_core::{sha256_bytes, CredentialId, Timestamp};

use crate::credential::{Credential, Field};

/// Default display name of the issuing party for ingested documents.
pub const DEFAULT_ISSUER: &str = "Vault Issuer";

/// Result of analyzing one document image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzedDocument {
    /// Recognized document type.
    pub document_type: String,
    /// Extracted fields, in document order.
    pub fields: Vec<Field>,
}

/// Errors from a document analyzer.
#[derive(Error, Debug)]
pub enum AnalyzerError {
    /// No image bytes were supplied.
    #[error("document image is empty")]
    EmptyImage,

    /// The MIME type is not an image type.
    #[error("unsupported document type {0:?}; expected image/*")]
    UnsupportedMimeType(String),

    /// The extraction backend failed.
    #[error("analyzer backend failed: {0}")]
    Backend(String),
}

/// Extracts a document type and fields from an image.
pub trait DocumentAnalyzer {
    /// Analyze `image` of the given MIME type.
    fn analyze(&self, image: &[u8], mime_type: &str) -> Result<AnalyzedDocument, AnalyzerError>;
}

fn check_input(image: &[u8], mime_type: &str) -> Result<(), AnalyzerError> {
    if image.is_empty() {
        return Err(AnalyzerError::EmptyImage);
    }
    if !mime_type.starts_with("image/") {
        return Err(AnalyzerError::UnsupportedMimeType(mime_type.to_string()));
    }
    Ok(())
}

/// Short document number derived from the image digest.
fn document_number(image: &[u8]) -> u32 {
    let digest = sha256_bytes(image);
    let b = digest.as_bytes();
    u32::from_be_bytes([b[0], b[1], b[2], b[3]]) % 1_000_000
}

/// Placeholder analyzer returning a fixed identity card.
///
/// The document id is derived from the image digest, so the same image
/// always yields the same credential fields.
#[derive(Debug, Default, Clone, Copy)]
pub struct MockAnalyzer;

impl DocumentAnalyzer for MockAnalyzer {
    fn analyze(&self, image: &[u8], mime_type: &str) -> Result<AnalyzedDocument, AnalyzerError> {
        check_input(image, mime_type)?;
        Ok(AnalyzedDocument {
            document_type: "Mock Identity Card".to_string(),
            fields: vec![
                Field::new("Full Name", "Jane Doe"),
                Field::new("Document ID", format!("DOC-{:06}", document_number(image))),
                Field::new("Date of Issue", "2023-10-27"),
                Field::new("Expiry Date", "2028-10-26"),
                Field::new("Issuing Authority", "Govt. of Simulation"),
            ],
        })
    }
}

/// Wraps an analyzer so that failures yield a degraded result instead.
#[derive(Debug, Clone)]
pub struct FallbackAnalyzer<A> {
    inner: A,
}

impl<A: DocumentAnalyzer> FallbackAnalyzer<A> {
    /// Wrap `inner`.
    pub fn new(inner: A) -> Self {
        Self { inner }
    }

    /// The degraded result returned when the inner analyzer fails.
    pub fn fallback(image: &[u8]) -> AnalyzedDocument {
        AnalyzedDocument {
            document_type: "Fallback Document".to_string(),
            fields: vec![
                Field::new("Full Name", "Jane Doe (Fallback)"),
                Field::new("Document ID", format!("ERR-{:06}", document_number(image))),
                Field::new("Date of Issue", "2023-10-27"),
            ],
        }
    }
}

impl<A: DocumentAnalyzer> DocumentAnalyzer for FallbackAnalyzer<A> {
    fn analyze(&self, image: &[u8], mime_type: &str) -> Result<AnalyzedDocument, AnalyzerError> {
        match self.inner.analyze(image, mime_type) {
            Ok(doc) => Ok(doc),
            Err(e) => {
                tracing::warn!(error = %e, "document analysis failed; using fallback result");
                Ok(Self::fallback(image))
            }
        }
    }
}

/// Turn an analysis result into a vault credential.
///
/// `ipfs_hash` is a content pointer over the image digest and
/// `file_data_url` embeds the image itself.
pub fn issue_credential(
    analyzed: AnalyzedDocument,
    image: &[u8],
    mime_type: &str,
    issuer: &str,
) -> Credential {
    let credential = Credential {
        id: CredentialId::generate(),
        document_type: analyzed.document_type,
        issuer: issuer.to_string(),
        issuance_date: Timestamp::now(),
        ipfs_hash: format!("ipfs://{}", sha256_bytes(image).to_hex()),
        file_data_url: format!("data:{mime_type};base64,{}", Base64::encode_string(image)),
        fields: analyzed.fields,
    };
    tracing::info!(
        credential_id = %credential.id,
        document_type = %credential.document_type,
        "credential issued"
    );
    credential
}
