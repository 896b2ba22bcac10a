//! Common errors
//!
//! Every failure is represented by a small dedicated type so that callers can
//! match on exactly the condition they care about. All of them convert into
//! the crate-wide [`Error`], which is the root to catch when any JOSE failure
//! should be handled the same way.
//!
//! Messages name the offending parameter where possible, but never include
//! key material.

#![allow(missing_copy_implementations)]

use std::{borrow::Cow, error::Error as StdError};

use thiserror::Error;

/// The JSON Web Key parameters are malformed or inconsistent
#[derive(Clone, Debug, PartialEq, Eq, Hash, Error)]
#[error("invalid JSON Web Key: {reason}")]
pub struct InvalidJwk {
    reason: Cow<'static, str>,
}

impl InvalidJwk {
    /// A description of what was wrong with the key
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

#[inline]
pub(crate) fn invalid_jwk(reason: impl Into<Cow<'static, str>>) -> InvalidJwk {
    InvalidJwk {
        reason: reason.into(),
    }
}

pub(crate) fn invalid_parameter(name: &str) -> InvalidJwk {
    invalid_jwk(format!("invalid key parameter \"{}\"", name))
}

/// The JSON Web Key Set is malformed or its key identifiers are missing
/// or not unique
#[derive(Debug, Error)]
#[error("invalid JSON Web Key Set: {reason}")]
pub struct InvalidJwks {
    reason: Cow<'static, str>,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

impl InvalidJwks {
    /// A description of what was wrong with the key set
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

pub(crate) fn invalid_jwks(reason: impl Into<Cow<'static, str>>) -> InvalidJwks {
    InvalidJwks {
        reason: reason.into(),
        source: None,
    }
}

pub(crate) fn invalid_jwks_caused_by(
    reason: impl Into<Cow<'static, str>>,
    source: impl Into<Box<dyn StdError + Send + Sync + 'static>>,
) -> InvalidJwks {
    InvalidJwks {
        reason: reason.into(),
        source: Some(source.into()),
    }
}

/// The named algorithm or key type is not supported
#[derive(Clone, Debug, PartialEq, Eq, Hash, Error)]
#[error("unsupported {kind} '{name}'")]
pub struct UnsupportedAlgorithm {
    kind: &'static str,
    name: String,
}

impl UnsupportedAlgorithm {
    /// The rejected name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

#[inline]
pub(crate) fn unsupported_algorithm(name: impl Into<String>) -> UnsupportedAlgorithm {
    UnsupportedAlgorithm {
        kind: "algorithm",
        name: name.into(),
    }
}

#[inline]
pub(crate) fn unsupported_key_type(name: impl Into<String>) -> UnsupportedAlgorithm {
    UnsupportedAlgorithm {
        kind: "key type",
        name: name.into(),
    }
}

/// The named elliptic curve is not supported
#[derive(Clone, Debug, PartialEq, Eq, Hash, Error)]
#[error("unsupported elliptic curve '{crv}'")]
pub struct UnsupportedCurve {
    crv: String,
}

impl UnsupportedCurve {
    /// The rejected curve name
    #[must_use]
    pub fn curve(&self) -> &str {
        &self.crv
    }
}

#[inline]
pub(crate) fn unsupported_curve(crv: impl Into<String>) -> UnsupportedCurve {
    UnsupportedCurve { crv: crv.into() }
}

/// No key in the set matched the lookup criteria
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Error)]
#[error("no JSON Web Key matches the criteria")]
pub struct JwkNotFound {
    _p: (),
}

pub(crate) const fn jwk_not_found() -> JwkNotFound {
    JwkNotFound { _p: () }
}

/// The call-site options are invalid
///
/// Unlike the other errors in this module, this one indicates a programming
/// mistake (for example, asking for a public key in a private-only format)
/// rather than malformed input.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Error)]
#[error("invalid argument: {reason}")]
pub struct InvalidArgument {
    reason: Cow<'static, str>,
}

impl InvalidArgument {
    /// A description of the misuse
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

pub(crate) fn invalid_argument(reason: impl Into<Cow<'static, str>>) -> InvalidArgument {
    InvalidArgument {
        reason: reason.into(),
    }
}

/// The JWK cannot be used with the requested algorithm
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Error)]
#[error("key incompatible with algorithm '{alg}'")]
pub struct IncompatibleAlgorithm {
    alg: crate::jwa::Algorithm,
}

impl IncompatibleAlgorithm {
    /// The algorithm that was requested
    #[must_use]
    pub fn algorithm(&self) -> crate::jwa::Algorithm {
        self.alg
    }
}

#[inline]
pub(crate) fn incompatible_algorithm(
    alg: impl Into<crate::jwa::Algorithm>,
) -> IncompatibleAlgorithm {
    IncompatibleAlgorithm { alg: alg.into() }
}

/// The JWK has a specific usage or set of operations that disallows this use
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Error)]
#[error("JWK cannot be used in this way")]
pub struct JwkUsageMismatch {
    _p: (),
}

pub(crate) const fn jwk_usage_mismatch() -> JwkUsageMismatch {
    JwkUsageMismatch { _p: () }
}

/// Missing private key
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Error)]
#[error("operation requires a private key")]
pub struct MissingPrivateKey {
    _p: (),
}

pub(crate) const fn missing_private_key() -> MissingPrivateKey {
    MissingPrivateKey { _p: () }
}

/// The signature did not match
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Error)]
#[error("signature mismatch")]
pub struct SignatureMismatch {
    _p: (),
}

pub(crate) const fn signature_mismatch() -> SignatureMismatch {
    SignatureMismatch { _p: () }
}

/// The JWS is malformed
#[derive(Clone, Debug, PartialEq, Eq, Hash, Error)]
#[error("malformed JWS: {reason}")]
pub struct InvalidJws {
    reason: Cow<'static, str>,
}

pub(crate) fn invalid_jws(reason: impl Into<Cow<'static, str>>) -> InvalidJws {
    InvalidJws {
        reason: reason.into(),
    }
}

/// The JWE could not be decrypted
///
/// This error is deliberately opaque: it is the same whether the token was
/// malformed, the key was wrong, or the ciphertext was tampered with.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Error)]
#[error("invalid JWE")]
pub struct InvalidJwe {
    _p: (),
}

pub(crate) const fn invalid_jwe() -> InvalidJwe {
    InvalidJwe { _p: () }
}

/// Unexpected error (possibly a bug)
#[derive(Debug, Error)]
#[error("unexpected error")]
pub struct Unexpected {
    #[from]
    source: Box<dyn StdError + Send + Sync + 'static>,
}

pub(crate) fn unexpected(
    source: impl Into<Box<dyn StdError + Send + Sync + 'static>>,
) -> Unexpected {
    Unexpected {
        source: source.into(),
    }
}

/// Any error raised by this crate
#[derive(Debug, Error)]
pub enum Error {
    /// The JWK parameters are malformed or inconsistent
    #[error(transparent)]
    InvalidJwk(#[from] InvalidJwk),

    /// The JWK set is malformed
    #[error(transparent)]
    InvalidJwks(#[from] InvalidJwks),

    /// The algorithm or key type is not supported
    #[error(transparent)]
    UnsupportedAlgorithm(#[from] UnsupportedAlgorithm),

    /// The elliptic curve is not supported
    #[error(transparent)]
    UnsupportedCurve(#[from] UnsupportedCurve),

    /// No key matched the lookup
    #[error(transparent)]
    JwkNotFound(#[from] JwkNotFound),

    /// The call-site options are invalid
    #[error(transparent)]
    InvalidArgument(#[from] InvalidArgument),

    /// The key cannot be used with the algorithm
    #[error(transparent)]
    IncompatibleAlgorithm(#[from] IncompatibleAlgorithm),

    /// The key's declared usage disallows the operation
    #[error(transparent)]
    JwkUsageMismatch(#[from] JwkUsageMismatch),

    /// The operation needs a private key
    #[error(transparent)]
    MissingPrivateKey(#[from] MissingPrivateKey),

    /// The signature is invalid
    #[error(transparent)]
    SignatureMismatch(#[from] SignatureMismatch),

    /// The JWS is malformed
    #[error(transparent)]
    InvalidJws(#[from] InvalidJws),

    /// The JWE could not be decrypted
    #[error(transparent)]
    InvalidJwe(#[from] InvalidJwe),

    /// An unexpected error
    #[error(transparent)]
    Unexpected(#[from] Unexpected),
}

impl Error {
    /// Whether the error is due to malformed key parameters
    #[must_use]
    pub fn is_invalid_jwk(&self) -> bool {
        matches!(self, Self::InvalidJwk(_))
    }

    /// Whether the error is due to a malformed key set
    #[must_use]
    pub fn is_invalid_jwks(&self) -> bool {
        matches!(self, Self::InvalidJwks(_))
    }

    /// Whether the error is due to an unsupported algorithm or key type
    #[must_use]
    pub fn is_unsupported_alg(&self) -> bool {
        matches!(self, Self::UnsupportedAlgorithm(_))
    }

    /// Whether the error is due to an unsupported elliptic curve
    #[must_use]
    pub fn is_unsupported_curve(&self) -> bool {
        matches!(self, Self::UnsupportedCurve(_))
    }

    /// Whether the error is due to invalid call-site options
    #[must_use]
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }

    /// Whether the error is due to an incompatible algorithm
    #[must_use]
    pub fn is_incompatible_alg(&self) -> bool {
        matches!(self, Self::IncompatibleAlgorithm(_))
    }

    /// Whether the error is due to a usage mismatch
    #[must_use]
    pub fn is_usage_mismatch(&self) -> bool {
        matches!(self, Self::JwkUsageMismatch(_))
    }

    /// Whether the error is due to a missing private key
    #[must_use]
    pub fn is_missing_private_key(&self) -> bool {
        matches!(self, Self::MissingPrivateKey(_))
    }

    /// Whether the error is due to a signature mismatch
    #[must_use]
    pub fn is_signature_mismatch(&self) -> bool {
        matches!(self, Self::SignatureMismatch(_))
    }

    /// Whether the error is due to an undecryptable JWE
    #[must_use]
    pub fn is_invalid_jwe(&self) -> bool {
        matches!(self, Self::InvalidJwe(_))
    }
}

impl From<std::convert::Infallible> for Error {
    fn from(_: std::convert::Infallible) -> Self {
        unreachable!("infallible result")
    }
}
