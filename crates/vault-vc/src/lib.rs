//! # vault-vc: Credentials and Selective Disclosure
//!
//! The holder-side data model and the protocol objects that leave the vault:
//!
//! - [`Credential`] / [`Field`]: document-derived records owned by the holder.
//! - [`Bundle`] / [`BundleField`]: named cross-credential field selections,
//!   copied out of their source credentials at creation time.
//! - [`DisclosurePayload`]: the tagged union `Single | Bundle` that is
//!   signed and transferred. The variant is decided once, when the envelope
//!   is built or decoded, and every consumer matches on it.
//! - [`SignedEnvelope`]: payload plus signature, the unit on the wire.
//! - [`RevocationRegistry`]: issuer-side revocation set, passed explicitly to
//!   whoever needs it.
//! - [`DocumentAnalyzer`]: the boundary to the external field extractor.
//!
//! ## Wire Format
//!
//! ```text
//! single: { credentialId, documentType, sharedBy, timestamp, fields: [{key,value}], signature }
//! bundle: { bundleName, sharedBy, timestamp, fields: [{credentialId,credentialType,key,value}], signature }
//! ```
//!
//! The signature covers the JCS form of the payload with `signature` removed.

pub mod analyzer;
pub mod bundle;
pub mod credential;
pub mod disclosure;
pub mod revocation;
pub mod schema;

pub use analyzer::{
    issue_credential, AnalyzedDocument, AnalyzerError, DocumentAnalyzer, FallbackAnalyzer,
    MockAnalyzer, DEFAULT_ISSUER,
};
pub use bundle::{Bundle, BundleError, BundleField, FieldSelection};
pub use credential::{Credential, Field};
pub use disclosure::{
    build_bundle_disclosure, build_bundle_disclosure_at, build_credential_disclosure,
    build_credential_disclosure_at, BundleDisclosure, DisclosureError, DisclosureKind,
    DisclosurePayload, SignedEnvelope, SingleDisclosure,
};
pub use revocation::{RevocationEntry, RevocationLookup, RevocationRegistry};
pub use schema::SchemaError;
