//! Cryptographic primitives for EDE.
//!
//! - [`Digest`]: Blake3 over canonical bytes, the `hash(value)` of the system.
//! - [`SuiteId`]: a signature suite identifier. [`is_pq_suite`] classifies it
//!   by prefix, and that classification drives every compliance rule.
//! - [`Keypair`] / [`sign`]: deterministic signing for development. Ed25519 is
//!   real; PQ and hybrid suites use a keyed-Blake3 stand-in that is NOT a
//!   signature scheme (anyone holding the public key can forge). It only
//!   honours the contract: deterministic, bound to data, key and suite.
//! - [`VerifierTable`]: the suite -> verifier capability table. It is always
//!   passed in explicitly, so strict and permissive policies can coexist.

use ed25519_dalek::{Signature as DalekSignature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::types::Timestamp;

/// A 32-byte Blake3 digest.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Digest(pub [u8; 32]);

impl Digest {
    /// Compute the Blake3 hash of the given data.
    pub fn hash(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to `0x`-prefixed hex string.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Parse from hex string, with or without the `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s)?;
        if bytes.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// The genesis head derived from a seed string.
    pub fn genesis(seed: &str) -> Self {
        Self::hash(seed.as_bytes())
    }

    /// The zero digest (sentinel value).
    pub const ZERO: Self = Self([0u8; 32]);
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", &self.to_hex()[..18])
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.to_hex()[..18])
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for Digest {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Digest::from_hex(&s).map_err(de::Error::custom)
    }
}

/// Hash suite tag carried by hash-chain and inclusion evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HashSuite {
    Sha3_256,
    Sha3_512,
    Blake3,
    Sha256,
}

/// A signature suite identifier.
///
/// Known suites are associated constants; `CUSTOM_*` extensions are
/// constructed with [`SuiteId::new`].
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SuiteId(Cow<'static, str>);

impl SuiteId {
    pub const PQ_DILITHIUM_3: Self = Self(Cow::Borrowed("PQ_DILITHIUM_3"));
    pub const PQ_DILITHIUM_5: Self = Self(Cow::Borrowed("PQ_DILITHIUM_5"));
    pub const PQ_FALCON_512: Self = Self(Cow::Borrowed("PQ_FALCON_512"));
    pub const PQ_FALCON_1024: Self = Self(Cow::Borrowed("PQ_FALCON_1024"));
    pub const PQ_SPHINCS_SHA2_256: Self = Self(Cow::Borrowed("PQ_SPHINCS_SHA2_256"));
    pub const HYBRID_ED25519_DILITHIUM_3: Self =
        Self(Cow::Borrowed("HYBRID_ED25519_DILITHIUM_3"));
    pub const HYBRID_ECDSA_FALCON_512: Self = Self(Cow::Borrowed("HYBRID_ECDSA_FALCON_512"));
    pub const CLASSICAL_ED25519: Self = Self(Cow::Borrowed("CLASSICAL_ED25519"));
    pub const CLASSICAL_ECDSA_SECP256K1: Self = Self(Cow::Borrowed("CLASSICAL_ECDSA_SECP256K1"));

    /// Every PQ and hybrid suite this crate knows by name.
    pub const KNOWN_PQ: [Self; 7] = [
        Self::PQ_DILITHIUM_3,
        Self::PQ_DILITHIUM_5,
        Self::PQ_FALCON_512,
        Self::PQ_FALCON_1024,
        Self::PQ_SPHINCS_SHA2_256,
        Self::HYBRID_ED25519_DILITHIUM_3,
        Self::HYBRID_ECDSA_FALCON_512,
    ];

    /// Create a suite id from any identifier string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(Cow::Owned(id.into()))
    }

    /// Get the identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Post-quantum or hybrid grade.
    pub fn is_pq(&self) -> bool {
        is_pq_suite(self)
    }
}

impl fmt::Debug for SuiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SuiteId({})", self.0)
    }
}

impl fmt::Display for SuiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Classify a suite as post-quantum/hybrid (true) or classical (false).
pub fn is_pq_suite(suite: &SuiteId) -> bool {
    suite.as_str().starts_with("PQ_") || suite.as_str().starts_with("HYBRID_")
}

/// A signature blob.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    /// The suite this signature was produced with.
    pub suite: SuiteId,
    /// Hex public key of the signer under `suite`.
    pub public_key: String,
    /// Hex signature bytes.
    pub signature: String,
    /// Signer-claimed signing time. Not covered by the signature.
    pub timestamp: Timestamp,
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = self.signature.get(..16).unwrap_or(&self.signature);
        write!(f, "Signature({}, {}...)", self.suite, prefix)
    }
}

const PLACEHOLDER_PK_CONTEXT: &str = "ede 2025 placeholder public key v0";

/// Public key of the placeholder scheme for `seed` under `suite`.
fn placeholder_public_key(seed: &[u8; 32], suite: &SuiteId) -> [u8; 32] {
    let mut material = Vec::with_capacity(32 + suite.as_str().len());
    material.extend_from_slice(seed);
    material.extend_from_slice(suite.as_str().as_bytes());
    blake3::derive_key(PLACEHOLDER_PK_CONTEXT, &material)
}

/// Signature of the placeholder scheme: keyed by the public key itself.
fn placeholder_signature(public_key: &[u8; 32], suite: &SuiteId, data: &[u8]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new_keyed(public_key);
    hasher.update(suite.as_str().as_bytes());
    hasher.update(&[0]);
    hasher.update(data);
    *hasher.finalize().as_bytes()
}

/// A development keypair able to sign under any suite.
///
/// One 32-byte seed backs every suite: Ed25519 for `CLASSICAL_ED25519`, the
/// placeholder scheme for everything else.
#[derive(Clone)]
pub struct Keypair {
    seed: [u8; 32],
}

impl Keypair {
    /// Generate a new random keypair.
    pub fn generate() -> Self {
        Self {
            seed: rand::random(),
        }
    }

    /// Create from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self { seed: *seed }
    }

    /// Hex public key under `suite`.
    pub fn public_key(&self, suite: &SuiteId) -> String {
        if *suite == SuiteId::CLASSICAL_ED25519 {
            let signing_key = SigningKey::from_bytes(&self.seed);
            hex::encode(signing_key.verifying_key().to_bytes())
        } else {
            hex::encode(placeholder_public_key(&self.seed, suite))
        }
    }

    /// Sign `data` under `suite`.
    pub fn sign(&self, suite: &SuiteId, data: &[u8], timestamp: Timestamp) -> Signature {
        let signature = if *suite == SuiteId::CLASSICAL_ED25519 {
            let signing_key = SigningKey::from_bytes(&self.seed);
            hex::encode(signing_key.sign(data).to_bytes())
        } else {
            let pk = placeholder_public_key(&self.seed, suite);
            hex::encode(placeholder_signature(&pk, suite, data))
        };

        Signature {
            suite: suite.clone(),
            public_key: self.public_key(suite),
            signature,
            timestamp,
        }
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Keypair({})", &self.public_key(&SuiteId::CLASSICAL_ED25519)[..16])
    }
}

/// Sign `data` under `suite` with `keypair`. Deterministic given identical inputs.
pub fn sign(data: &[u8], suite: &SuiteId, keypair: &Keypair, timestamp: Timestamp) -> Signature {
    keypair.sign(suite, data, timestamp)
}

/// Verifies signatures for one or more suites.
///
/// Implementations must never panic: malformed keys or signatures are `false`.
pub trait SuiteVerifier: Send + Sync {
    /// Check `signature` over `data` under the hex `public_key`.
    fn verify(&self, data: &[u8], signature: &Signature, public_key: &str) -> bool;
}

/// Ed25519 verifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Verifier;

impl SuiteVerifier for Ed25519Verifier {
    fn verify(&self, data: &[u8], signature: &Signature, public_key: &str) -> bool {
        let Some(pk) = decode_fixed::<32>(public_key) else {
            return false;
        };
        let Some(sig) = decode_fixed::<64>(&signature.signature) else {
            return false;
        };
        let Ok(verifying_key) = VerifyingKey::from_bytes(&pk) else {
            return false;
        };
        verifying_key
            .verify(data, &DalekSignature::from_bytes(&sig))
            .is_ok()
    }
}

/// Verifier for the keyed-Blake3 development stand-in.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderVerifier;

impl SuiteVerifier for PlaceholderVerifier {
    fn verify(&self, data: &[u8], signature: &Signature, public_key: &str) -> bool {
        let Some(pk) = decode_fixed::<32>(public_key) else {
            return false;
        };
        let Some(sig) = decode_fixed::<32>(&signature.signature) else {
            return false;
        };
        placeholder_signature(&pk, &signature.suite, data) == sig
    }
}

/// Structural check only: key matches and the signature is non-empty.
///
/// Accepts anything well-formed. Use as a fallback in permissive test policies.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralVerifier;

impl SuiteVerifier for StructuralVerifier {
    fn verify(&self, _data: &[u8], signature: &Signature, public_key: &str) -> bool {
        signature.public_key == public_key && !signature.signature.is_empty()
    }
}

fn decode_fixed<const N: usize>(s: &str) -> Option<[u8; N]> {
    let bytes = hex::decode(s).ok()?;
    bytes.try_into().ok()
}

/// The suite -> verifier capability table.
#[derive(Clone, Default)]
pub struct VerifierTable {
    verifiers: BTreeMap<SuiteId, Arc<dyn SuiteVerifier>>,
    fallback: Option<Arc<dyn SuiteVerifier>>,
}

impl VerifierTable {
    /// A table that verifies nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Placeholder verifier for every known PQ/hybrid suite, Ed25519 for
    /// `CLASSICAL_ED25519`.
    pub fn development() -> Self {
        let placeholder: Arc<dyn SuiteVerifier> = Arc::new(PlaceholderVerifier);
        let mut table = Self::empty().with(SuiteId::CLASSICAL_ED25519, Arc::new(Ed25519Verifier));
        for suite in SuiteId::KNOWN_PQ {
            table = table.with(suite, Arc::clone(&placeholder));
        }
        table
    }

    /// Register (or replace) the verifier for `suite`.
    pub fn with(mut self, suite: SuiteId, verifier: Arc<dyn SuiteVerifier>) -> Self {
        self.verifiers.insert(suite, verifier);
        self
    }

    /// Verifier used for suites with no entry.
    pub fn with_fallback(mut self, verifier: Arc<dyn SuiteVerifier>) -> Self {
        self.fallback = Some(verifier);
        self
    }

    /// Check whether `suite` can be verified under this table.
    pub fn supports(&self, suite: &SuiteId) -> bool {
        self.verifiers.contains_key(suite) || self.fallback.is_some()
    }

    /// Verify `signature` over `data` under `public_key`.
    ///
    /// False when the suite is unsupported or the signature names another key.
    pub fn verify_signature(&self, data: &[u8], signature: &Signature, public_key: &str) -> bool {
        if signature.public_key != public_key {
            return false;
        }
        match self
            .verifiers
            .get(&signature.suite)
            .or(self.fallback.as_ref())
        {
            Some(verifier) => verifier.verify(data, signature, public_key),
            None => false,
        }
    }
}

impl fmt::Debug for VerifierTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerifierTable")
            .field("suites", &self.verifiers.keys().collect::<Vec<_>>())
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}

/// Verify `signature` over `data` under the suite's registered verifier.
pub fn verify_signature(
    table: &VerifierTable,
    data: &[u8],
    signature: &Signature,
    public_key: &str,
) -> bool {
    table.verify_signature(data, signature, public_key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_pq_suite() {
        assert!(is_pq_suite(&SuiteId::PQ_DILITHIUM_3));
        assert!(is_pq_suite(&SuiteId::HYBRID_ECDSA_FALCON_512));
        assert!(!is_pq_suite(&SuiteId::CLASSICAL_ED25519));
        assert!(!is_pq_suite(&SuiteId::new("CUSTOM_LATTICE")));
        assert!(is_pq_suite(&SuiteId::new("PQ_CUSTOM_ML_DSA_65")));
    }

    #[test]
    fn test_sign_deterministic() {
        let keypair = Keypair::from_seed(&[0x42; 32]);
        for suite in [SuiteId::PQ_DILITHIUM_3, SuiteId::CLASSICAL_ED25519] {
            let s1 = sign(b"claim", &suite, &keypair, 1000);
            let s2 = sign(b"claim", &suite, &keypair, 1000);
            assert_eq!(s1, s2);
        }
    }

    #[test]
    fn test_generated_keypairs_are_independent() {
        let table = VerifierTable::development();
        let a = Keypair::generate();
        let b = Keypair::generate();
        for suite in [SuiteId::PQ_FALCON_512, SuiteId::CLASSICAL_ED25519] {
            assert_ne!(a.public_key(&suite), b.public_key(&suite));
            let sig = a.sign(&suite, b"claim", 7);
            assert!(table.verify_signature(b"claim", &sig, &a.public_key(&suite)));
            assert!(!table.verify_signature(b"claim", &sig, &b.public_key(&suite)));
        }
    }

    #[test]
    fn test_development_table_verifies_both_schemes() {
        let table = VerifierTable::development();
        let keypair = Keypair::from_seed(&[0x07; 32]);

        for suite in [SuiteId::PQ_FALCON_512, SuiteId::CLASSICAL_ED25519] {
            let pk = keypair.public_key(&suite);
            let sig = keypair.sign(&suite, b"hello", 0);
            assert!(verify_signature(&table, b"hello", &sig, &pk));
            assert!(!verify_signature(&table, b"hellO", &sig, &pk));
        }
    }

    #[test]
    fn test_wrong_key_fails() {
        let table = VerifierTable::development();
        let alice = Keypair::from_seed(&[0x01; 32]);
        let bob = Keypair::from_seed(&[0x02; 32]);

        let sig = alice.sign(&SuiteId::PQ_DILITHIUM_3, b"data", 0);
        let bob_pk = bob.public_key(&SuiteId::PQ_DILITHIUM_3);
        assert!(!table.verify_signature(b"data", &sig, &bob_pk));
    }

    #[test]
    fn test_unsupported_suite_fails_without_fallback() {
        let keypair = Keypair::from_seed(&[0x03; 32]);
        let suite = SuiteId::new("CUSTOM_EXPERIMENTAL");
        let pk = keypair.public_key(&suite);
        let sig = keypair.sign(&suite, b"data", 0);

        assert!(!VerifierTable::development().verify_signature(b"data", &sig, &pk));

        let permissive = VerifierTable::development().with_fallback(Arc::new(StructuralVerifier));
        assert!(permissive.verify_signature(b"data", &sig, &pk));
    }

    #[test]
    fn test_malformed_signature_is_false_not_panic() {
        let table = VerifierTable::development();
        let keypair = Keypair::from_seed(&[0x04; 32]);
        let pk = keypair.public_key(&SuiteId::CLASSICAL_ED25519);
        let mut sig = keypair.sign(&SuiteId::CLASSICAL_ED25519, b"data", 0);
        sig.signature = "zz".into();
        assert!(!table.verify_signature(b"data", &sig, &pk));
    }

    #[test]
    fn test_digest_hex_roundtrip() {
        let digest = Digest::hash(b"ede");
        let hex = digest.to_hex();
        assert!(hex.starts_with("0x"));
        assert_eq!(Digest::from_hex(&hex).unwrap(), digest);
        assert_eq!(Digest::from_hex(&hex[2..]).unwrap(), digest);
    }
}
