//! # Identity Newtypes
//!
//! Newtype wrappers for the identifiers that flow through disclosure and
//! verification. You cannot pass a `BundleId` where a `CredentialId` is
//! expected, and you cannot log an `ActorId` by accident.
//!
//! All identifiers wrap an opaque, non-blank string. Freshly minted ids are
//! UUID v4, but any non-blank string read back from storage or from a
//! scanned payload is accepted as-is.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::VaultError;

/// DID method used when minting a fresh actor identifier.
pub const ACTOR_DID_METHOD: &str = "vault";

fn non_blank(kind: &str, s: String) -> Result<String, VaultError> {
    if s.trim().is_empty() {
        return Err(VaultError::InvalidIdentifier(format!("{kind} must not be blank")));
    }
    Ok(s)
}

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Wrap an existing identifier. Rejects blank input.
            pub fn new(id: impl Into<String>) -> Result<Self, VaultError> {
                non_blank($kind, id.into()).map(Self)
            }

            /// Mint a fresh random identifier.
            pub fn generate() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            /// Access the identifier text.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = VaultError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                Self::new(s)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> String {
                id.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = VaultError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }
    };
}

opaque_id!(
    /// Identifier of a credential held in the vault. Also the key the
    /// revocation registry is indexed by.
    CredentialId,
    "credential id"
);

opaque_id!(
    /// Identifier of a user-curated bundle.
    BundleId,
    "bundle id"
);

/// The holder's self-issued identity string.
///
/// ## Security Invariant
///
/// This value is both the public `sharedBy` claim in every disclosure and the
/// secret the disclosure is signed with. Anyone who learns it can produce
/// signatures that verify as this holder. `Debug` therefore shows only the
/// DID method prefix, and `Display` is not implemented: call
/// [`ActorId::expose()`] where the full value is actually needed.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ActorId(String);

impl ActorId {
    /// Wrap an existing actor identifier such as `did:x:1`. Rejects blank input.
    pub fn new(id: impl Into<String>) -> Result<Self, VaultError> {
        non_blank("actor id", id.into()).map(Self)
    }

    /// Mint a fresh `did:vault:<uuid>` identifier.
    pub fn generate() -> Self {
        Self(format!("did:{ACTOR_DID_METHOD}:{}", Uuid::new_v4()))
    }

    /// The full identifier text. Treat the result as a secret.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Bytes appended to a message when signing.
    pub fn secret_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// The non-secret `did:<method>` prefix, or `"actor"` if the identifier
    /// is not a DID.
    pub fn redacted(&self) -> String {
        let mut parts = self.0.splitn(3, ':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some("did"), Some(method), Some(_)) => format!("did:{method}:…"),
            _ => "actor:…".to_string(),
        }
    }
}

impl std::fmt::Debug for ActorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ActorId({})", self.redacted())
    }
}

impl TryFrom<String> for ActorId {
    type Error = VaultError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<ActorId> for String {
    fn from(id: ActorId) -> String {
        id.0
    }
}

impl std::str::FromStr for ActorId {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}
