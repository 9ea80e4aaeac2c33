//! Strong type definitions for EDE.
//!
//! All identifiers are newtypes to prevent misuse at compile time. Ids are
//! derived deterministically from the inputs that define the entity, so the
//! same registration always yields the same id on every node.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unix milliseconds. Caller-supplied; the core never reads the wall clock.
pub type Timestamp = i64;

/// Derive a 16-hex-char tag from a domain and a list of parts.
fn derive_tag(domain: &str, parts: &[&[u8]]) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(domain.as_bytes());
    for part in parts {
        hasher.update(&(part.len() as u64).to_be_bytes());
        hasher.update(part);
    }
    hex::encode(&hasher.finalize().as_bytes()[..8])
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Prefix every derived id of this kind carries.
            pub const PREFIX: &'static str = $prefix;

            /// Wrap an existing id string.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the id as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

string_id!(
    /// Identity of a registered substrate (`did:ede:…`).
    SubstrateId,
    "did:ede:"
);

string_id!(
    /// Identity of a bilateral channel (`ch_…`).
    ChannelId,
    "ch_"
);

string_id!(
    /// Identity of a session (`ss_…`).
    SessionId,
    "ss_"
);

string_id!(
    /// Identity of a single flux (`fx_…`).
    FluxId,
    "fx_"
);

impl SubstrateId {
    /// Derive a substrate id from its primary public key.
    pub fn derive(primary_public_key: &str) -> Self {
        Self(format!(
            "{}{}",
            Self::PREFIX,
            derive_tag("ede-substrate-v0:", &[primary_public_key.as_bytes()])
        ))
    }
}

impl ChannelId {
    /// Derive a channel id from its endpoints and authorization time.
    pub fn derive(from: &SubstrateId, to: &SubstrateId, authorized_at: Timestamp) -> Self {
        Self(format!(
            "{}{}",
            Self::PREFIX,
            derive_tag(
                "ede-channel-v0:",
                &[
                    from.as_str().as_bytes(),
                    to.as_str().as_bytes(),
                    &authorized_at.to_be_bytes(),
                ],
            )
        ))
    }
}

impl SessionId {
    /// Derive a session id from its creator, domain label and creation time.
    pub fn derive(creator: &SubstrateId, domain: Option<&str>, created_at: Timestamp) -> Self {
        Self(format!(
            "{}{}",
            Self::PREFIX,
            derive_tag(
                "ede-session-v0:",
                &[
                    creator.as_str().as_bytes(),
                    domain.unwrap_or("").as_bytes(),
                    &created_at.to_be_bytes(),
                ],
            )
        ))
    }
}

impl FluxId {
    /// Derive a flux id from its channel, timestamp and the ledger head it
    /// was built against.
    pub fn derive(channel: &ChannelId, timestamp: Timestamp, prev_hash: &[u8]) -> Self {
        Self(format!(
            "{}{}",
            Self::PREFIX,
            derive_tag(
                "ede-flux-v0:",
                &[channel.as_str().as_bytes(), &timestamp.to_be_bytes(), prev_hash],
            )
        ))
    }
}
