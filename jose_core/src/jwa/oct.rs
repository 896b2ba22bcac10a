//! Symmetric (octet sequence) JSON Web Algorithm implementations
//!
//! A single shared secret serves HMAC signing, AES key wrapping, and direct
//! use as a content encryption key.

use std::{convert::TryFrom, fmt};

use base64::{engine::general_purpose::STANDARD, Engine};
use jose_base64::Base64Url;
use openssl::aes::{self, AesKey};
use ring::rand::SecureRandom;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{error, jwe, jwk, jws};

/// The smallest accepted secret, in octets
pub const MIN_SECRET_BYTES: usize = 1;

/// Symmetric secret
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
#[must_use]
pub struct Oct {
    #[serde(rename = "k")]
    secret: Base64Url,
}

impl fmt::Debug for Oct {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("Oct { secret }")
    }
}

/// Text encodings available when exporting a symmetric secret
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum OctEncoding {
    /// Standard, padded base64
    Base64,
    /// Unpadded base64url, as used in JWKs
    Base64Url,
    /// Lowercase hexadecimal
    Hex,
}

impl Oct {
    /// Uses the provided secret
    ///
    /// # Errors
    ///
    /// The secret is shorter than [`MIN_SECRET_BYTES`].
    pub fn new(secret: impl Into<Base64Url>) -> Result<Self, error::InvalidJwk> {
        let secret = secret.into();
        if secret.len() < MIN_SECRET_BYTES {
            return Err(error::invalid_parameter("k"));
        }

        Ok(Self { secret })
    }

    pub(crate) fn from_params(params: &Map<String, Value>) -> Result<Self, error::Error> {
        Ok(Self::new(jwk::required_param(params, "k")?)?)
    }

    /// Generates a new random secret of `size` octets
    ///
    /// # Errors
    ///
    /// `size` is zero, or the random source failed.
    pub fn generate(size: usize) -> Result<Self, error::Error> {
        Self::generate_with_rng(size, &ring::rand::SystemRandom::new())
    }

    /// Generates a new random secret using the provided source of randomness
    ///
    /// # Errors
    ///
    /// `size` is zero, or the provided RNG failed.
    pub fn generate_with_rng(size: usize, rng: &dyn SecureRandom) -> Result<Self, error::Error> {
        if size < MIN_SECRET_BYTES {
            return Err(error::invalid_argument("a secret needs at least one octet").into());
        }

        let mut secret = Base64Url::from_raw(vec![0; size]);
        rng.fill(secret.as_mut_slice())
            .map_err(|_| error::unexpected("random number generator failure"))?;

        Ok(Self { secret })
    }

    /// The length of the secret in octets
    #[must_use]
    pub fn len(&self) -> usize {
        self.secret.len()
    }

    /// Whether the secret is empty (never true for a constructed key)
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.secret.is_empty()
    }

    /// Exports the raw secret
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        self.secret.as_slice().to_vec()
    }

    /// Exports the secret as text
    #[must_use]
    pub fn export(&self, encoding: OctEncoding) -> String {
        match encoding {
            OctEncoding::Base64 => STANDARD.encode(self.secret.as_slice()),
            OctEncoding::Base64Url => self.secret.encode(),
            OctEncoding::Hex => hex::encode(self.secret.as_slice()),
        }
    }

    fn wrap(&self, alg: KeyManagementAlgorithm, cek: &[u8]) -> Result<Vec<u8>, error::Unexpected> {
        let key = AesKey::new_encrypt(self.secret.as_slice())
            .map_err(|_| error::unexpected(format!("AES key rejected for {}", alg)))?;

        let mut out = vec![0; cek.len() + 8];
        let len = aes::wrap_key(&key, None, &mut out, cek)
            .map_err(|_| error::unexpected("AES key wrap failed"))?;
        out.truncate(len);

        Ok(out)
    }

    fn unwrap(&self, encrypted_key: &[u8]) -> Result<Vec<u8>, error::InvalidJwe> {
        if encrypted_key.len() < 24 || encrypted_key.len() % 8 != 0 {
            return Err(error::invalid_jwe());
        }

        let key = AesKey::new_decrypt(self.secret.as_slice()).map_err(|_| error::invalid_jwe())?;

        let mut out = vec![0; encrypted_key.len() - 8];
        let len = aes::unwrap_key(&key, None, &mut out, encrypted_key)
            .map_err(|_| error::invalid_jwe())?;
        out.truncate(len);

        Ok(out)
    }
}

impl TryFrom<Map<String, Value>> for Oct {
    type Error = error::Error;

    fn try_from(params: Map<String, Value>) -> Result<Self, Self::Error> {
        Self::from_params(&params)
    }
}

/// HMAC signing algorithms
///
/// This list may be expanded in the future.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[allow(clippy::upper_case_acronyms)]
#[non_exhaustive]
pub enum SigningAlgorithm {
    /// HMAC using SHA-256
    HS256,
    /// HMAC using SHA-384
    HS384,
    /// HMAC using SHA-512
    HS512,
}

impl SigningAlgorithm {
    /// The registered name of the algorithm
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::HS256 => "HS256",
            Self::HS384 => "HS384",
            Self::HS512 => "HS512",
        }
    }

    /// The smallest secret, in bytes, accepted for this algorithm
    ///
    /// This is the size of the hash output.
    #[must_use]
    pub fn min_key_size(self) -> usize {
        self.signature_size()
    }

    /// The size in bytes of an HMAC signature
    #[must_use]
    pub fn signature_size(self) -> usize {
        match self {
            Self::HS256 => 256 / 8,
            Self::HS384 => 384 / 8,
            Self::HS512 => 512 / 8,
        }
    }

    fn into_ring_algorithm(self) -> ring::hmac::Algorithm {
        match self {
            SigningAlgorithm::HS256 => ring::hmac::HMAC_SHA256,
            SigningAlgorithm::HS384 => ring::hmac::HMAC_SHA384,
            SigningAlgorithm::HS512 => ring::hmac::HMAC_SHA512,
        }
    }
}

impl From<SigningAlgorithm> for jws::Algorithm {
    fn from(alg: SigningAlgorithm) -> Self {
        Self::Hmac(alg)
    }
}

impl TryFrom<jws::Algorithm> for SigningAlgorithm {
    type Error = error::IncompatibleAlgorithm;

    fn try_from(alg: jws::Algorithm) -> Result<Self, Self::Error> {
        match alg {
            jws::Algorithm::Hmac(alg) => Ok(alg),
            _ => Err(error::incompatible_algorithm(alg)),
        }
    }
}

impl fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl jws::Signer for Oct {
    type Algorithm = SigningAlgorithm;
    type Error = error::Error;

    fn can_sign(&self, alg: Self::Algorithm) -> bool {
        self.secret.len() >= alg.min_key_size()
    }

    fn sign(&self, alg: Self::Algorithm, data: &[u8]) -> Result<Vec<u8>, Self::Error> {
        if !self.can_sign(alg) {
            return Err(error::incompatible_algorithm(alg).into());
        }

        let key = ring::hmac::Key::new(alg.into_ring_algorithm(), self.secret.as_slice());
        let digest = ring::hmac::sign(&key, data);
        Ok(digest.as_ref().to_owned())
    }
}

impl jws::Verifier for Oct {
    type Algorithm = SigningAlgorithm;
    type Error = error::Error;

    fn can_verify(&self, alg: Self::Algorithm) -> bool {
        self.secret.len() >= alg.min_key_size()
    }

    fn verify(
        &self,
        alg: Self::Algorithm,
        data: &[u8],
        signature: &[u8],
    ) -> Result<(), Self::Error> {
        if !self.can_verify(alg) {
            return Err(error::incompatible_algorithm(alg).into());
        }

        let key = ring::hmac::Key::new(alg.into_ring_algorithm(), self.secret.as_slice());
        ring::hmac::verify(&key, data, signature)
            .map_err(|_| error::Error::from(error::signature_mismatch()))
    }
}

/// Symmetric key management algorithms
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::upper_case_acronyms)]
#[non_exhaustive]
pub enum KeyManagementAlgorithm {
    /// AES key wrap with a 128-bit key
    A128KW,
    /// AES key wrap with a 192-bit key
    A192KW,
    /// AES key wrap with a 256-bit key
    A256KW,
    /// The shared secret is the content encryption key
    #[serde(rename = "dir")]
    Direct,
}

impl KeyManagementAlgorithm {
    /// The registered name of the algorithm
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::A128KW => "A128KW",
            Self::A192KW => "A192KW",
            Self::A256KW => "A256KW",
            Self::Direct => "dir",
        }
    }

    /// The required wrapping key size in bytes, if fixed by the algorithm
    #[must_use]
    pub fn key_size(self) -> Option<usize> {
        match self {
            Self::A128KW => Some(16),
            Self::A192KW => Some(24),
            Self::A256KW => Some(32),
            Self::Direct => None,
        }
    }
}

impl fmt::Display for KeyManagementAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<KeyManagementAlgorithm> for jwe::Algorithm {
    fn from(alg: KeyManagementAlgorithm) -> Self {
        Self::Oct(alg)
    }
}

impl TryFrom<jwe::Algorithm> for KeyManagementAlgorithm {
    type Error = error::IncompatibleAlgorithm;

    fn try_from(alg: jwe::Algorithm) -> Result<Self, Self::Error> {
        match alg {
            jwe::Algorithm::Oct(alg) => Ok(alg),
            _ => Err(error::incompatible_algorithm(alg)),
        }
    }
}

impl Oct {
    /// Whether the secret fits `alg` for content encrypted with `enc`
    fn fits(&self, alg: KeyManagementAlgorithm, enc: jwe::ContentEncryptionAlgorithm) -> bool {
        let required = alg.key_size().unwrap_or_else(|| enc.key_size());
        self.secret.len() == required
    }
}

impl jwe::KeyWrapper for Oct {
    type Algorithm = KeyManagementAlgorithm;
    type Error = error::Error;

    fn can_wrap(&self, alg: Self::Algorithm) -> bool {
        alg.key_size().map_or(true, |size| self.secret.len() == size)
    }

    fn wrap_key(
        &self,
        alg: Self::Algorithm,
        enc: jwe::ContentEncryptionAlgorithm,
    ) -> Result<jwe::WrappedKey, Self::Error> {
        if !self.fits(alg, enc) {
            return Err(error::incompatible_algorithm(alg).into());
        }

        if alg == KeyManagementAlgorithm::Direct {
            let cek = jwe::ContentKey::from(self.to_bytes());
            return Ok(jwe::WrappedKey::new(cek, Vec::new()));
        }

        let cek = jwe::ContentKey::generate(enc)?;
        let encrypted_key = self.wrap(alg, cek.as_slice())?;

        Ok(jwe::WrappedKey::new(cek, encrypted_key))
    }
}

impl jwe::KeyUnwrapper for Oct {
    type Algorithm = KeyManagementAlgorithm;
    type Error = error::Error;

    fn can_unwrap(&self, alg: Self::Algorithm) -> bool {
        alg.key_size().map_or(true, |size| self.secret.len() == size)
    }

    fn unwrap_key(
        &self,
        alg: Self::Algorithm,
        enc: jwe::ContentEncryptionAlgorithm,
        encrypted_key: &[u8],
    ) -> Result<jwe::ContentKey, Self::Error> {
        if !self.fits(alg, enc) {
            return Err(error::incompatible_algorithm(alg).into());
        }

        if alg == KeyManagementAlgorithm::Direct {
            if !encrypted_key.is_empty() {
                return Err(error::invalid_jwe().into());
            }
            return Ok(jwe::ContentKey::from(self.to_bytes()));
        }

        let cek = self.unwrap(encrypted_key)?;
        if cek.len() != enc.key_size() {
            return Err(error::invalid_jwe().into());
        }

        Ok(jwe::ContentKey::from(cek))
    }
}
