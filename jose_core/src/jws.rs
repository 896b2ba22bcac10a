//! Implementations of the JSON Web Signature (JWS) standard
//!
//! The specifications for this standard can be found in [RFC7515][].
//!
//! Only the compact serialization is supported. Signing and verification go
//! through the [`Signer`] and [`Verifier`] traits, so a [`Jwk`][crate::Jwk]
//! applies its usage and algorithm restrictions before any signature is
//! produced or checked.
//!
//! [RFC7515]: https://tools.ietf.org/html/rfc7515

use std::{convert::TryFrom, error::Error as StdError, fmt, str::FromStr};

use jose_base64::Base64Url;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{error, jwa, jwk::KeyId, jwk::KeyIdRef, jwk::KeyType};

/// JSON Web Signature signing algorithms
///
/// This list may be expanded in the future.
#[derive(Debug, Clone, Copy, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum Algorithm {
    /// HMAC symmetric
    Hmac(jwa::oct::SigningAlgorithm),

    /// RSA public/private key pair
    Rsa(jwa::rsa::SigningAlgorithm),

    /// Elliptic curve cryptography
    EllipticCurve(jwa::ec::SigningAlgorithm),
}

impl Algorithm {
    /// The HS256 signing algorithm
    pub const HS256: Algorithm = Self::Hmac(jwa::oct::SigningAlgorithm::HS256);
    /// The HS384 signing algorithm
    pub const HS384: Algorithm = Self::Hmac(jwa::oct::SigningAlgorithm::HS384);
    /// The HS512 signing algorithm
    pub const HS512: Algorithm = Self::Hmac(jwa::oct::SigningAlgorithm::HS512);

    /// The RS256 signing algorithm
    pub const RS256: Algorithm = Self::Rsa(jwa::rsa::SigningAlgorithm::RS256);
    /// The RS384 signing algorithm
    pub const RS384: Algorithm = Self::Rsa(jwa::rsa::SigningAlgorithm::RS384);
    /// The RS512 signing algorithm
    pub const RS512: Algorithm = Self::Rsa(jwa::rsa::SigningAlgorithm::RS512);
    /// The PS256 signing algorithm
    pub const PS256: Algorithm = Self::Rsa(jwa::rsa::SigningAlgorithm::PS256);
    /// The PS384 signing algorithm
    pub const PS384: Algorithm = Self::Rsa(jwa::rsa::SigningAlgorithm::PS384);
    /// The PS512 signing algorithm
    pub const PS512: Algorithm = Self::Rsa(jwa::rsa::SigningAlgorithm::PS512);

    /// The ES256 signing algorithm
    pub const ES256: Algorithm = Self::EllipticCurve(jwa::ec::SigningAlgorithm::ES256);
    /// The ES384 signing algorithm
    pub const ES384: Algorithm = Self::EllipticCurve(jwa::ec::SigningAlgorithm::ES384);
    /// The ES512 signing algorithm
    pub const ES512: Algorithm = Self::EllipticCurve(jwa::ec::SigningAlgorithm::ES512);

    const ALL: [Algorithm; 12] = [
        Self::HS256,
        Self::HS384,
        Self::HS512,
        Self::RS256,
        Self::RS384,
        Self::RS512,
        Self::PS256,
        Self::PS384,
        Self::PS512,
        Self::ES256,
        Self::ES384,
        Self::ES512,
    ];

    /// The registered name of the algorithm
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Hmac(alg) => alg.name(),
            Self::Rsa(alg) => alg.name(),
            Self::EllipticCurve(alg) => alg.name(),
        }
    }

    /// The type of key that produces signatures with this algorithm
    pub fn key_type(self) -> KeyType {
        match self {
            Self::Hmac(_) => KeyType::Oct,
            Self::Rsa(_) => KeyType::Rsa,
            Self::EllipticCurve(_) => KeyType::Ec,
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

/// A JWS signer
pub trait Signer {
    /// The usable signature algorithms
    type Algorithm;

    /// The error returned on failure to sign
    type Error: fmt::Debug + fmt::Display + Sync + Send + 'static;

    /// Whether the specific algorithm provided is compatible
    /// with this signer
    fn can_sign(&self, alg: Self::Algorithm) -> bool;

    /// Attempts to sign the data provided using the specified algorithm
    fn sign(&self, alg: Self::Algorithm, data: &[u8]) -> Result<Vec<u8>, Self::Error>;
}

/// A JWS verifier
pub trait Verifier {
    /// The verifiable signature algorithms
    type Algorithm;

    /// The error returned on a failure to verify
    type Error: StdError + Send + Sync + 'static;

    /// Whether the specific algorithm provided is compatible
    /// with this verifier
    fn can_verify(&self, alg: Self::Algorithm) -> bool;

    /// Attempts to verify the data against the signature using the
    /// specified algorithm
    fn verify(
        &self,
        alg: Self::Algorithm,
        data: &[u8],
        signature: &[u8],
    ) -> Result<(), Self::Error>;
}

/// The protected header of a JWS
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[must_use]
pub struct Header {
    alg: Algorithm,

    #[serde(skip_serializing_if = "Option::is_none")]
    kid: Option<KeyId>,

    #[serde(skip_serializing_if = "Option::is_none")]
    typ: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    cty: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    crit: Option<Vec<String>>,
}

impl Header {
    /// A header for the given algorithm
    pub fn new(alg: impl Into<Algorithm>) -> Self {
        Self {
            alg: alg.into(),
            kid: None,
            typ: None,
            cty: None,
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

    /// Adds a media type for the complete JWS
    pub fn with_type(self, typ: impl Into<String>) -> Self {
        Self {
            typ: Some(typ.into()),
            ..self
        }
    }

    /// Adds a media type for the payload
    pub fn with_content_type(self, cty: impl Into<String>) -> Self {
        Self {
            cty: Some(cty.into()),
            ..self
        }
    }

    /// The signing algorithm
    pub fn alg(&self) -> Algorithm {
        self.alg
    }

    /// The key ID hint
    #[must_use]
    pub fn key_id(&self) -> Option<&KeyIdRef> {
        self.kid.as_deref()
    }

    /// The media type of the complete JWS
    #[must_use]
    pub fn typ(&self) -> Option<&str> {
        self.typ.as_deref()
    }

    /// The media type of the payload
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.cty.as_deref()
    }
}

/// Produces a compact JWS over `payload`
///
/// # Errors
///
/// The signer refused the algorithm or failed to sign.
pub fn sign<S>(header: &Header, payload: &[u8], signer: &S) -> Result<String, error::Error>
where
    S: Signer + ?Sized,
    S::Algorithm: From<Algorithm>,
    error::Error: From<S::Error>,
{
    let header_json = serde_json::to_vec(header).map_err(error::unexpected)?;

    let mut token = Base64Url::from_raw(header_json).encode();
    token.push('.');
    token.push_str(&Base64Url::from_raw(payload).encode());

    let signature = signer.sign(header.alg.into(), token.as_bytes())?;
    token.push('.');
    token.push_str(&Base64Url::from_raw(signature).encode());

    Ok(token)
}

/// Verifies a compact JWS and returns its header and payload
///
/// # Errors
///
/// The token is malformed (`InvalidJws`), the verifier refused the
/// algorithm, or the signature does not match.
pub fn verify<V>(token: &str, verifier: &V) -> Result<(Header, Vec<u8>), error::Error>
where
    V: Verifier + ?Sized,
    V::Algorithm: From<Algorithm>,
    error::Error: From<V::Error>,
{
    let mut parts = token.split('.');
    let (header_b64, payload_b64, signature_b64) =
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(h), Some(p), Some(s), None) => (h, p, s),
            _ => return Err(error::invalid_jws("expected three segments").into()),
        };

    let decode = |segment: &str, name: &'static str| {
        Base64Url::from_encoded(segment)
            .map_err(|_| error::invalid_jws(format!("{} is not valid base64url", name)))
    };

    let header_json = decode(header_b64, "header")?;
    let header: Header = serde_json::from_slice(header_json.as_slice())
        .map_err(|e| error::invalid_jws(format!("bad header: {}", e)))?;

    if header.crit.is_some() {
        return Err(error::invalid_jws("critical header extensions are not supported").into());
    }

    let payload = decode(payload_b64, "payload")?;
    let signature = decode(signature_b64, "signature")?;

    let signing_input_len = header_b64.len() + 1 + payload_b64.len();
    let signing_input = &token.as_bytes()[..signing_input_len];

    if let Err(err) = verifier.verify(header.alg.into(), signing_input, signature.as_slice()) {
        #[cfg(feature = "tracing")]
        tracing::debug!(alg = %header.alg, "JWS signature rejected");
        return Err(err.into());
    }

    Ok((header, payload.into_inner()))
}

impl TryFrom<&'_ str> for Algorithm {
    type Error = error::UnsupportedAlgorithm;

    fn try_from(value: &'_ str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use color_eyre::Result;
    #[cfg(feature = "tracing")]
    use tracing_test::traced_test;

    use super::*;
    use crate::{test, Jwk};

    const PAYLOAD: &[u8] = br#"{"iss":"https://issuer.example","sub":"alice"}"#;

    #[test]
    fn algorithm_names_round_trip() {
        for alg in Algorithm::ALL.iter() {
            assert_eq!(alg.name().parse::<Algorithm>().unwrap(), *alg);
        }
        assert!("none".parse::<Algorithm>().is_err());
        assert!("A128KW".parse::<Algorithm>().is_err());
    }

    #[test]
    #[cfg_attr(feature = "tracing", traced_test)]
    fn verifies_reference_tokens() -> Result<()> {
        let rsa = Jwk::from_json(test::rsa::JWK_PUBLIC)?;
        let ec = Jwk::from_json(test::ec::JWK_P256_PUBLIC)?;
        let hmac = Jwk::from_json(test::oct::JWK)?;

        let (header, payload) = verify(test::jws::RS256.trim(), &rsa)?;
        assert_eq!(payload, PAYLOAD);
        assert_eq!(header.alg(), Algorithm::RS256);
        assert_eq!(header.key_id().map(|k| k.as_str()), Some("rsa-2048"));

        let (_, payload) = verify(test::jws::ES256.trim(), &ec)?;
        assert_eq!(payload, PAYLOAD);

        let (header, payload) = verify(test::jws::HS256.trim(), &hmac)?;
        assert_eq!(header.key_id().map(|k| k.as_str()), Some("hmac-1"));
        assert_eq!(payload, PAYLOAD);

        Ok(())
    }

    #[test]
    #[cfg_attr(feature = "tracing", traced_test)]
    fn verifies_pss_token_with_unrestricted_key() -> Result<()> {
        let rsa = Jwk::from_json(test::rsa::JWK_MIN)?;
        let (header, payload) = verify(test::jws::PS384.trim(), &rsa)?;
        assert_eq!(header.alg(), Algorithm::PS384);
        assert_eq!(payload, PAYLOAD);
        Ok(())
    }

    #[test]
    #[cfg_attr(feature = "tracing", traced_test)]
    fn sign_then_verify() -> Result<()> {
        let key = Jwk::from_json(test::rsa::JWK_PRIVATE)?;
        let header = Header::new(Algorithm::PS256)
            .with_key_id(KeyId::from_static("rsa-2048"))
            .with_type("JWT");

        let token = sign(&header, PAYLOAD, &key)?;
        let (verified_header, payload) = verify(&token, &key)?;
        assert_eq!(verified_header, header);
        assert_eq!(payload, PAYLOAD);
        Ok(())
    }

    #[test]
    #[cfg_attr(feature = "tracing", traced_test)]
    fn tampered_payload_is_rejected() -> Result<()> {
        let key = Jwk::from_json(test::oct::JWK)?;
        let token = test::jws::HS256.trim();

        let forged = Base64Url::from_raw(&b"{\"sub\":\"mallory\"}"[..]).encode();
        let mut parts: Vec<&str> = token.split('.').collect();
        parts[1] = &forged;

        let err = verify(&parts.join("."), &key).unwrap_err();
        assert!(err.is_signature_mismatch());
        Ok(())
    }

    #[test]
    fn malformed_tokens_are_rejected() -> Result<()> {
        let key = Jwk::from_json(test::oct::JWK)?;

        for token in ["a.b", "a.b.c.d", "!!!.e30.AA", "e30.e30.AA"].iter() {
            let err = verify(token, &key).unwrap_err();
            assert!(matches!(err, error::Error::InvalidJws(_)), "{}: {:?}", token, err);
        }

        Ok(())
    }

    #[test]
    fn unsecured_tokens_are_rejected() -> Result<()> {
        let key = Jwk::from_json(test::oct::JWK)?;
        let header = Base64Url::from_raw(&b"{\"alg\":\"none\"}"[..]).encode();
        let token = format!("{}.e30.", header);

        let err = verify(&token, &key).unwrap_err();
        assert!(matches!(err, error::Error::InvalidJws(_)));
        Ok(())
    }

    #[test]
    fn critical_headers_are_rejected() -> Result<()> {
        let key = Jwk::from_json(test::oct::JWK)?;
        let header = Base64Url::from_raw(&br#"{"alg":"HS256","crit":["exp"],"exp":1}"#[..]).encode();
        let token = format!("{}.e30.AAAA", header);

        let err = verify(&token, &key).unwrap_err();
        assert!(matches!(err, error::Error::InvalidJws(_)));
        Ok(())
    }

    #[test]
    fn wrong_key_type_is_incompatible() -> Result<()> {
        let key = Jwk::from_json(test::oct::JWK)?;
        let err = verify(test::jws::RS256.trim(), &key).unwrap_err();
        assert!(err.is_incompatible_alg());
        Ok(())
    }
}
