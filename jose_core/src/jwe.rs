//! Implementations of the JSON Web Encryption (JWE) standard
//!
//! The specifications for this standard can be found in [RFC7516][].
//!
//! A JWE encrypts its payload under a one-time content encryption key (CEK).
//! The CEK is in turn protected by a key management algorithm, which the
//! [`KeyWrapper`] and [`KeyUnwrapper`] traits abstract over. Only the compact
//! serialization is supported.
//!
//! [RFC7516]: https://tools.ietf.org/html/rfc7516

use std::{convert::TryFrom, fmt, str::FromStr};

use jose_base64::Base64Url;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{
    error, jwa,
    jwk::{KeyId, KeyIdRef, KeyType},
};

mod enc;

pub use enc::{ContentEncryptionAlgorithm, ContentKey, EncryptedContent};

/// JSON Web Encryption key management algorithms
///
/// This list may be expanded in the future.
#[derive(Debug, Clone, Copy, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum Algorithm {
    /// RSA key encryption
    Rsa(jwa::rsa::KeyManagementAlgorithm),

    /// AES key wrap or direct use of a shared secret
    Oct(jwa::oct::KeyManagementAlgorithm),
}

impl Algorithm {
    /// The RSA1_5 key management algorithm
    pub const RSA1_5: Algorithm = Self::Rsa(jwa::rsa::KeyManagementAlgorithm::RSA1_5);
    /// The RSA-OAEP key management algorithm
    pub const RSA_OAEP: Algorithm = Self::Rsa(jwa::rsa::KeyManagementAlgorithm::RSA_OAEP);
    /// The RSA-OAEP-256 key management algorithm
    pub const RSA_OAEP_256: Algorithm = Self::Rsa(jwa::rsa::KeyManagementAlgorithm::RSA_OAEP_256);
    /// The RSA-OAEP-384 key management algorithm
    pub const RSA_OAEP_384: Algorithm = Self::Rsa(jwa::rsa::KeyManagementAlgorithm::RSA_OAEP_384);
    /// The RSA-OAEP-512 key management algorithm
    pub const RSA_OAEP_512: Algorithm = Self::Rsa(jwa::rsa::KeyManagementAlgorithm::RSA_OAEP_512);

    /// The A128KW key management algorithm
    pub const A128KW: Algorithm = Self::Oct(jwa::oct::KeyManagementAlgorithm::A128KW);
    /// The A192KW key management algorithm
    pub const A192KW: Algorithm = Self::Oct(jwa::oct::KeyManagementAlgorithm::A192KW);
    /// The A256KW key management algorithm
    pub const A256KW: Algorithm = Self::Oct(jwa::oct::KeyManagementAlgorithm::A256KW);

    /// Direct use of a shared symmetric key as the content encryption key
    pub const DIRECT: Algorithm = Self::Oct(jwa::oct::KeyManagementAlgorithm::Direct);

    const ALL: [Algorithm; 9] = [
        Self::RSA1_5,
        Self::RSA_OAEP,
        Self::RSA_OAEP_256,
        Self::RSA_OAEP_384,
        Self::RSA_OAEP_512,
        Self::A128KW,
        Self::A192KW,
        Self::A256KW,
        Self::DIRECT,
    ];

    /// The registered name of the algorithm
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Rsa(alg) => alg.name(),
            Self::Oct(alg) => alg.name(),
        }
    }

    /// The type of key that manages content keys with this algorithm
    pub fn key_type(self) -> KeyType {
        match self {
            Self::Rsa(_) => KeyType::Rsa,
            Self::Oct(_) => KeyType::Oct,
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = error::UnsupportedAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|alg| alg.name() == s)
            .ok_or_else(|| error::unsupported_algorithm(s))
    }
}

impl TryFrom<&'_ str> for Algorithm {
    type Error = error::UnsupportedAlgorithm;

    fn try_from(value: &'_ str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl Serialize for Algorithm {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Algorithm {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

/// A content encryption key together with its protected form
#[derive(Debug, Clone)]
pub struct WrappedKey {
    cek: ContentKey,
    encrypted_key: Vec<u8>,
}

impl WrappedKey {
    /// Pairs a content key with its encrypted form
    ///
    /// Direct key agreement produces an empty `encrypted_key`.
    #[must_use]
    pub fn new(cek: ContentKey, encrypted_key: Vec<u8>) -> Self {
        Self { cek, encrypted_key }
    }

    /// The content encryption key
    #[must_use]
    pub fn content_key(&self) -> &ContentKey {
        &self.cek
    }

    /// The encrypted key, as carried in the JWE
    #[must_use]
    pub fn encrypted_key(&self) -> &[u8] {
        &self.encrypted_key
    }

    /// Splits into the content key and the encrypted key
    #[must_use]
    pub fn into_parts(self) -> (ContentKey, Vec<u8>) {
        (self.cek, self.encrypted_key)
    }
}

/// Produces and protects content encryption keys
pub trait KeyWrapper {
    /// The usable key management algorithms
    type Algorithm;

    /// The error returned on failure to wrap
    type Error: fmt::Debug + fmt::Display + Sync + Send + 'static;

    /// Whether the specific algorithm provided is compatible
    /// with this wrapper
    fn can_wrap(&self, alg: Self::Algorithm) -> bool;

    /// Generates a content key for `enc` and protects it using `alg`
    fn wrap_key(
        &self,
        alg: Self::Algorithm,
        enc: ContentEncryptionAlgorithm,
    ) -> Result<WrappedKey, Self::Error>;
}

/// Recovers protected content encryption keys
pub trait KeyUnwrapper {
    /// The usable key management algorithms
    type Algorithm;

    /// The error returned on failure to unwrap
    type Error: fmt::Debug + fmt::Display + Sync + Send + 'static;

    /// Whether the specific algorithm provided is compatible
    /// with this unwrapper
    fn can_unwrap(&self, alg: Self::Algorithm) -> bool;

    /// Recovers the content key for `enc` from `encrypted_key` using `alg`
    fn unwrap_key(
        &self,
        alg: Self::Algorithm,
        enc: ContentEncryptionAlgorithm,
        encrypted_key: &[u8],
    ) -> Result<ContentKey, Self::Error>;
}

/// The protected header of a JWE
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[must_use]
pub struct Header {
    alg: Algorithm,
    enc: ContentEncryptionAlgorithm,

    #[serde(skip_serializing_if = "Option::is_none")]
    kid: Option<KeyId>,

    #[serde(skip_serializing_if = "Option::is_none")]
    typ: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    cty: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    zip: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    crit: Option<Vec<String>>,
}

impl Header {
    /// A header for the given key management and content encryption algorithms
    pub fn new(alg: impl Into<Algorithm>, enc: ContentEncryptionAlgorithm) -> Self {
        Self {
            alg: alg.into(),
            enc,
            kid: None,
            typ: None,
            cty: None,
            zip: None,
            crit: None,
        }
    }

    /// Adds a key ID hint
    pub fn with_key_id(self, kid: impl Into<KeyId>) -> Self {
        Self {
            kid: Some(kid.into()),
            ..self
        }
    }

    /// Adds a media type for the complete JWE
    pub fn with_type(self, typ: impl Into<String>) -> Self {
        Self {
            typ: Some(typ.into()),
            ..self
        }
    }

    /// Adds a media type for the plaintext
    pub fn with_content_type(self, cty: impl Into<String>) -> Self {
        Self {
            cty: Some(cty.into()),
            ..self
        }
    }

    /// Requests compression of the plaintext
    ///
    /// Compression is not supported, so [`encrypt`] refuses such a header.
    pub fn with_compression(self, zip: impl Into<String>) -> Self {
        Self {
            zip: Some(zip.into()),
            ..self
        }
    }

    /// The key management algorithm
    pub fn alg(&self) -> Algorithm {
        self.alg
    }

    /// The content encryption algorithm
    pub fn enc(&self) -> ContentEncryptionAlgorithm {
        self.enc
    }

    /// The key ID hint
    #[must_use]
    pub fn key_id(&self) -> Option<&KeyIdRef> {
        self.kid.as_deref()
    }

    /// The media type of the complete JWE
    #[must_use]
    pub fn typ(&self) -> Option<&str> {
        self.typ.as_deref()
    }

    /// The media type of the plaintext
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.cty.as_deref()
    }
}

/// Encrypts `plaintext` into a compact JWE
///
/// # Errors
///
/// The header requests compression (`InvalidArgument`), or the wrapper
/// refused the algorithm or failed to protect the content key.
pub fn encrypt<W>(header: &Header, plaintext: &[u8], wrapper: &W) -> Result<String, error::Error>
where
    W: KeyWrapper + ?Sized,
    W::Algorithm: From<Algorithm>,
    error::Error: From<W::Error>,
{
    if header.zip.is_some() {
        return Err(error::invalid_argument("JWE compression is not supported").into());
    }

    let wrapped = wrapper.wrap_key(header.alg.into(), header.enc)?;

    let header_json = serde_json::to_vec(header).map_err(error::unexpected)?;
    let protected = Base64Url::from_raw(header_json).encode();
    let sealed = header
        .enc
        .encrypt(wrapped.content_key(), protected.as_bytes(), plaintext)?;

    let segments = [
        protected,
        Base64Url::from_raw(wrapped.encrypted_key()).encode(),
        Base64Url::from_raw(sealed.iv()).encode(),
        Base64Url::from_raw(sealed.ciphertext()).encode(),
        Base64Url::from_raw(sealed.tag()).encode(),
    ];

    Ok(segments.join("."))
}

/// Decrypts a compact JWE and returns its header and plaintext
///
/// # Errors
///
/// A malformed token or any cryptographic failure is reported as an opaque
/// `InvalidJwe`. Errors about the key itself, such as a usage mismatch or a
/// missing private key, are passed through.
pub fn decrypt<U>(token: &str, unwrapper: &U) -> Result<(Header, Vec<u8>), error::Error>
where
    U: KeyUnwrapper + ?Sized,
    U::Algorithm: From<Algorithm>,
    error::Error: From<U::Error>,
{
    let result = decrypt_inner(token, unwrapper);

    #[cfg(feature = "tracing")]
    let result = result.map_err(|err| {
        if err.is_invalid_jwe() {
            tracing::warn!("JWE rejected");
        }
        err
    });

    result
}

fn decrypt_inner<U>(token: &str, unwrapper: &U) -> Result<(Header, Vec<u8>), error::Error>
where
    U: KeyUnwrapper + ?Sized,
    U::Algorithm: From<Algorithm>,
    error::Error: From<U::Error>,
{
    let segments: Vec<&str> = token.split('.').collect();
    let (protected, encrypted_key, iv, ciphertext, tag) = match segments.as_slice() {
        [protected, encrypted_key, iv, ciphertext, tag] => {
            (*protected, *encrypted_key, *iv, *ciphertext, *tag)
        }
        _ => return Err(error::invalid_jwe().into()),
    };

    let decode = |segment: &str| Base64Url::from_encoded(segment).map_err(|_| error::invalid_jwe());

    let header_json = decode(protected)?;
    let header: Header =
        serde_json::from_slice(header_json.as_slice()).map_err(|_| error::invalid_jwe())?;

    if header.zip.is_some() || header.crit.is_some() {
        return Err(error::invalid_jwe().into());
    }

    let encrypted_key = decode(encrypted_key)?;
    let iv = decode(iv)?;
    let ciphertext = decode(ciphertext)?;
    let tag = decode(tag)?;

    let cek = unwrapper.unwrap_key(header.alg.into(), header.enc, encrypted_key.as_slice())?;
    let plaintext = header.enc.decrypt(
        &cek,
        protected.as_bytes(),
        iv.as_slice(),
        ciphertext.as_slice(),
        tag.as_slice(),
    )?;

    Ok((header, plaintext))
}
