//! Implementations of the JSON Web Keys (JWK) standard
//!
//! The specifications for JSON Web Keys can be found in [RFC7517][].
//!
//! A [`Jwk`] is only ever constructed through a validating pipeline, so a
//! key in hand always has consistent `use`, `key_ops` and `alg` metadata and
//! a usable cryptographic handle for its key material.
//!
//! [RFC7517]: https://tools.ietf.org/html/rfc7517

use std::{
    collections::BTreeMap,
    convert::{TryFrom, TryInto},
    fmt,
    str::FromStr,
};

use aliri_braid::braid;
use jose_base64::Base64Url;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::{
    error, jwa,
    jwe::{self, KeyUnwrapper, KeyWrapper},
    jws::{self, Signer, Verifier},
};

/// An identifier for a JWK
#[braid(serde, ref_doc = "A borrowed reference to a JWK identifier ([`KeyId`])")]
pub struct KeyId;

/// The family of a JSON Web Key
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyType {
    /// Elliptic curve
    #[serde(rename = "EC")]
    Ec,

    /// RSA
    #[serde(rename = "RSA")]
    Rsa,

    /// Octet sequence, a symmetric secret
    #[serde(rename = "oct")]
    Oct,
}

impl KeyType {
    /// The registered `kty` value
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ec => "EC",
            Self::Rsa => "RSA",
            Self::Oct => "oct",
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyType {
    type Err = error::UnsupportedAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "EC" => Ok(Self::Ec),
            "RSA" => Ok(Self::Rsa),
            "oct" => Ok(Self::Oct),
            _ => Err(error::unsupported_key_type(s)),
        }
    }
}

/// Reads a required Base64URL member of a JWK
pub(crate) fn required_param(
    params: &Map<String, Value>,
    name: &str,
) -> Result<Base64Url, error::InvalidJwk> {
    optional_param(params, name)?.ok_or_else(|| error::invalid_parameter(name))
}

/// Reads an optional Base64URL member of a JWK
pub(crate) fn optional_param(
    params: &Map<String, Value>,
    name: &str,
) -> Result<Option<Base64Url>, error::InvalidJwk> {
    match params.get(name) {
        None => Ok(None),
        Some(Value::String(s)) => Base64Url::from_encoded(s)
            .map(Some)
            .map_err(|_| error::invalid_parameter(name)),
        Some(_) => Err(error::invalid_parameter(name)),
    }
}

fn optional_str<'a>(
    params: &'a Map<String, Value>,
    name: &str,
) -> Result<Option<&'a str>, error::InvalidJwk> {
    match params.get(name) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(error::invalid_parameter(name)),
    }
}

const CERTIFICATE_PARAMS: [&str; 4] = ["x5u", "x5c", "x5t", "x5t#S256"];

/// An identified JSON Web Key
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
#[must_use]
pub struct Jwk {
    key_id: Option<KeyId>,
    usage: Option<jwa::Usage>,
    key_ops: Option<jwa::KeyOperations>,
    algorithm: Option<jwa::Algorithm>,
    key: Key,
}

impl Jwk {
    /// Parses and validates a JWK from JSON text
    ///
    /// # Errors
    ///
    /// The text is not a JSON object, or the key fails validation.
    pub fn from_json(json: &str) -> Result<Self, error::Error> {
        let value: Value =
            serde_json::from_str(json).map_err(|_| error::invalid_jwk("malformed JSON"))?;
        Self::from_value(value)
    }

    /// Validates a JWK from a parsed JSON value
    ///
    /// # Errors
    ///
    /// The value is not a JSON object, or the key fails validation.
    pub fn from_value(value: Value) -> Result<Self, error::Error> {
        match value {
            Value::Object(params) => Self::try_from(params),
            _ => Err(error::invalid_jwk("a JSON Web Key must be a JSON object").into()),
        }
    }

    /// The key ID
    #[must_use]
    pub fn key_id(&self) -> Option<&KeyIdRef> {
        self.key_id.as_deref()
    }

    /// The intended usage of the key
    #[must_use]
    pub fn usage(&self) -> Option<jwa::Usage> {
        self.usage
    }

    /// The operations the key is intended for
    #[must_use]
    pub fn key_ops(&self) -> Option<&jwa::KeyOperations> {
        self.key_ops.as_ref()
    }

    /// The algorithm to be used with this JWK
    #[must_use]
    pub fn algorithm(&self) -> Option<jwa::Algorithm> {
        self.algorithm
    }

    /// The family of the key material
    #[must_use]
    pub fn key_type(&self) -> KeyType {
        self.key.key_type()
    }

    /// The key material
    #[must_use]
    pub fn key(&self) -> &Key {
        &self.key
    }

    /// Whether the key holds private material
    ///
    /// Symmetric keys are always private.
    #[must_use]
    pub fn is_private(&self) -> bool {
        self.key.is_private()
    }

    /// Whether the key could be used with the given algorithm
    #[must_use]
    pub fn is_compatible(&self, alg: jwa::Algorithm) -> bool {
        self.key.is_compatible(alg)
    }

    /// Sets the key ID
    pub fn with_key_id(self, kid: impl Into<KeyId>) -> Self {
        Self {
            key_id: Some(kid.into()),
            ..self
        }
    }

    /// Sets the key's usage
    ///
    /// # Errors
    ///
    /// The usage conflicts with the key's operations or algorithm.
    pub fn with_usage(self, usage: jwa::Usage) -> Result<Self, error::InvalidJwk> {
        let jwk = Self {
            usage: Some(usage),
            ..self
        };
        jwk.check_metadata()?;
        Ok(jwk)
    }

    /// Sets the operations the key is intended for
    ///
    /// # Errors
    ///
    /// The operations conflict with the key's usage or algorithm.
    pub fn with_key_ops(self, key_ops: jwa::KeyOperations) -> Result<Self, error::InvalidJwk> {
        let jwk = Self {
            key_ops: Some(key_ops),
            ..self
        };
        jwk.check_metadata()?;
        Ok(jwk)
    }

    /// Restricts the key to a single algorithm
    ///
    /// # Errors
    ///
    /// The algorithm cannot be used with this key material, or conflicts
    /// with the key's usage or operations.
    pub fn with_algorithm(self, alg: impl Into<jwa::Algorithm>) -> Result<Self, error::InvalidJwk> {
        let jwk = Self {
            algorithm: Some(alg.into()),
            ..self
        };
        jwk.check_metadata()?;
        Ok(jwk)
    }

    /// Strips any private key components
    ///
    /// Symmetric keys have no public half and are returned unchanged.
    pub fn public_only(self) -> Self {
        Self {
            key: self.key.public_only(),
            ..self
        }
    }

    /// Exports asymmetric key material to DER or PEM
    ///
    /// # Errors
    ///
    /// The key is symmetric (`InvalidArgument`; see [`jwa::Oct::export`]),
    /// or the concrete codec rejected the options.
    pub fn export(&self, options: &jwa::ExportOptions) -> Result<jwa::ExportedKey, error::Error> {
        match &self.key {
            Key::EllipticCurve(k) => k.export(options),
            Key::Rsa(k) => k.export(options),
            Key::Oct(_) => Err(error::invalid_argument(
                "symmetric keys are exported with an octet encoding, not DER or PEM",
            )
            .into()),
        }
    }

    /// The RFC 7638 SHA-256 thumbprint of the key
    ///
    /// Only the required public members take part, so a private key and its
    /// public half share a thumbprint.
    ///
    /// # Errors
    ///
    /// Serializing the key members failed.
    pub fn thumbprint(&self) -> Result<Base64Url, error::Unexpected> {
        let required: &[&str] = match self.key_type() {
            KeyType::Ec => &["crv", "x", "y"],
            KeyType::Rsa => &["e", "n"],
            KeyType::Oct => &["k"],
        };

        let params = match serde_json::to_value(&self.key).map_err(error::unexpected)? {
            Value::Object(params) => params,
            _ => return Err(error::unexpected("key parameters did not serialize to an object")),
        };

        let mut members = BTreeMap::new();
        members.insert("kty", Value::String(self.key_type().as_str().to_owned()));
        for &name in required {
            if let Some(value) = params.get(name) {
                members.insert(name, value.clone());
            }
        }

        let canonical = serde_json::to_vec(&members).map_err(error::unexpected)?;
        let digest = ring::digest::digest(&ring::digest::SHA256, &canonical);

        Ok(Base64Url::from_raw(digest.as_ref()))
    }

    /// Cross-checks `use`, `key_ops` and `alg` against each other and the key
    fn check_metadata(&self) -> Result<(), error::InvalidJwk> {
        if let (Some(usage), Some(ops)) = (self.usage, &self.key_ops) {
            if !ops.is_compatible_with(usage) {
                return Err(error::invalid_jwk(r#""key_ops" conflicts with "use""#));
            }
        }

        if let Some(alg) = self.algorithm {
            if alg.key_type() != self.key_type() {
                return Err(error::invalid_jwk(format!(
                    r#""alg" {} cannot be used with a {} key"#,
                    alg,
                    self.key_type()
                )));
            }

            if !self.key.is_compatible(alg) {
                return Err(error::invalid_jwk(format!(
                    r#""alg" {} is not compatible with this key"#,
                    alg
                )));
            }

            if matches!(self.usage, Some(usage) if usage != alg.to_usage()) {
                return Err(error::invalid_jwk(r#""alg" conflicts with "use""#));
            }

            if matches!(&self.key_ops, Some(ops) if !ops.is_compatible_with(alg.to_usage())) {
                return Err(error::invalid_jwk(r#""alg" conflicts with "key_ops""#));
            }
        }

        Ok(())
    }

    /// Checks that the key's own restrictions admit `op` with `alg`
    fn check_use(&self, alg: jwa::Algorithm, op: jwa::KeyOperation) -> Result<(), error::Error> {
        if let Some(usage) = self.usage {
            if !usage.allows(op) {
                return Err(error::jwk_usage_mismatch().into());
            }
        }

        if let Some(ops) = &self.key_ops {
            if !ops.contains(op) {
                return Err(error::jwk_usage_mismatch().into());
            }
        }

        match self.algorithm {
            Some(key_alg) if key_alg != alg => Err(error::incompatible_algorithm(alg).into()),
            _ if alg.key_type() != self.key_type() => {
                Err(error::incompatible_algorithm(alg).into())
            }
            _ => Ok(()),
        }
    }
}

impl TryFrom<Map<String, Value>> for Jwk {
    type Error = error::Error;

    fn try_from(params: Map<String, Value>) -> Result<Self, Self::Error> {
        let usage = optional_str(&params, "use")?
            .map(jwa::Usage::from_str)
            .transpose()?;

        let key_ops = params
            .get("key_ops")
            .map(|ops| {
                jwa::KeyOperations::deserialize(ops).map_err(|_| error::invalid_parameter("key_ops"))
            })
            .transpose()?;

        if let (Some(usage), Some(ops)) = (usage, &key_ops) {
            if !ops.is_compatible_with(usage) {
                return Err(error::invalid_jwk(r#""key_ops" conflicts with "use""#).into());
            }
        }

        let algorithm = optional_str(&params, "alg")?
            .map(jwa::Algorithm::from_str)
            .transpose()?;

        let key_id = optional_str(&params, "kid")?.map(|kid| KeyId::new(kid.to_owned()));

        if let Some(name) = CERTIFICATE_PARAMS.iter().find(|&&name| params.contains_key(name)) {
            return Err(error::invalid_jwk(format!(
                r#"certificate parameter "{}" is not supported"#,
                name
            ))
            .into());
        }

        let kty: KeyType = optional_str(&params, "kty")?
            .ok_or_else(|| error::invalid_jwk(r#"missing key parameter "kty""#))?
            .parse()?;

        let key = match kty {
            KeyType::Ec => Key::EllipticCurve(jwa::EllipticCurve::from_params(&params)?),
            KeyType::Rsa => Key::Rsa(jwa::Rsa::from_params(&params)?),
            KeyType::Oct => Key::Oct(jwa::Oct::from_params(&params)?),
        };

        let jwk = Self {
            key_id,
            usage,
            key_ops,
            algorithm,
            key,
        };
        jwk.check_metadata()?;

        Ok(jwk)
    }
}

#[derive(Serialize)]
struct JwkDtoRef<'a> {
    kty: KeyType,

    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    usage: Option<jwa::Usage>,

    #[serde(skip_serializing_if = "Option::is_none")]
    key_ops: Option<&'a jwa::KeyOperations>,

    #[serde(rename = "alg", skip_serializing_if = "Option::is_none")]
    algorithm: Option<jwa::Algorithm>,

    #[serde(rename = "kid", skip_serializing_if = "Option::is_none")]
    key_id: Option<&'a KeyIdRef>,

    #[serde(flatten)]
    key: &'a Key,
}

impl Serialize for Jwk {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let dto = JwkDtoRef {
            kty: self.key_type(),
            usage: self.usage,
            key_ops: self.key_ops.as_ref(),
            algorithm: self.algorithm,
            key_id: self.key_id(),
            key: &self.key,
        };

        dto.serialize(serializer)
    }
}

impl From<jwa::EllipticCurve> for Jwk {
    fn from(key: jwa::EllipticCurve) -> Self {
        Self::from(Key::EllipticCurve(key))
    }
}

impl From<jwa::Rsa> for Jwk {
    fn from(key: jwa::Rsa) -> Self {
        Self::from(Key::Rsa(key))
    }
}

impl From<jwa::Oct> for Jwk {
    fn from(key: jwa::Oct) -> Self {
        Self::from(Key::Oct(key))
    }
}

impl From<Key> for Jwk {
    fn from(key: Key) -> Self {
        Self {
            key_id: None,
            usage: None,
            key_ops: None,
            algorithm: None,
            key,
        }
    }
}

impl Verifier for Jwk {
    type Algorithm = jwa::Algorithm;
    type Error = error::Error;

    fn can_verify(&self, alg: Self::Algorithm) -> bool {
        self.check_use(alg, jwa::KeyOperation::Verify).is_ok() && self.key.is_compatible(alg)
    }

    fn verify(
        &self,
        alg: Self::Algorithm,
        data: &[u8],
        signature: &[u8],
    ) -> Result<(), Self::Error> {
        let sig_alg: jws::Algorithm = alg
            .try_into()
            .map_err(|_| error::Error::from(error::jwk_usage_mismatch()))?;
        self.check_use(alg, jwa::KeyOperation::Verify)?;

        self.key.verify(sig_alg, data, signature)
    }
}

impl Signer for Jwk {
    type Algorithm = jwa::Algorithm;
    type Error = error::Error;

    fn can_sign(&self, alg: Self::Algorithm) -> bool {
        self.check_use(alg, jwa::KeyOperation::Sign).is_ok()
            && self.key.is_private()
            && self.key.is_compatible(alg)
    }

    fn sign(&self, alg: Self::Algorithm, data: &[u8]) -> Result<Vec<u8>, Self::Error> {
        let sig_alg: jws::Algorithm = alg
            .try_into()
            .map_err(|_| error::Error::from(error::jwk_usage_mismatch()))?;
        self.check_use(alg, jwa::KeyOperation::Sign)?;

        if !self.key.is_private() {
            return Err(error::missing_private_key().into());
        }

        self.key.sign(sig_alg, data)
    }
}

/// The operation a key performs for a key management algorithm
///
/// Direct agreement uses the key itself to encrypt content, so it is
/// governed by `encrypt`/`decrypt` rather than `wrapKey`/`unwrapKey`.
fn key_management_op(alg: jwe::Algorithm, wrap: bool) -> jwa::KeyOperation {
    match (alg == jwe::Algorithm::DIRECT, wrap) {
        (true, true) => jwa::KeyOperation::Encrypt,
        (true, false) => jwa::KeyOperation::Decrypt,
        (false, true) => jwa::KeyOperation::WrapKey,
        (false, false) => jwa::KeyOperation::UnwrapKey,
    }
}

impl KeyWrapper for Jwk {
    type Algorithm = jwa::Algorithm;
    type Error = error::Error;

    fn can_wrap(&self, alg: Self::Algorithm) -> bool {
        match jwe::Algorithm::try_from(alg) {
            Ok(km_alg) => {
                self.check_use(alg, key_management_op(km_alg, true)).is_ok()
                    && self.key.is_compatible(alg)
            }
            Err(_) => false,
        }
    }

    fn wrap_key(
        &self,
        alg: Self::Algorithm,
        enc: jwe::ContentEncryptionAlgorithm,
    ) -> Result<jwe::WrappedKey, Self::Error> {
        let km_alg: jwe::Algorithm = alg
            .try_into()
            .map_err(|_| error::Error::from(error::jwk_usage_mismatch()))?;
        self.check_use(alg, key_management_op(km_alg, true))?;

        self.key.wrap_key(km_alg, enc)
    }
}

impl KeyUnwrapper for Jwk {
    type Algorithm = jwa::Algorithm;
    type Error = error::Error;

    fn can_unwrap(&self, alg: Self::Algorithm) -> bool {
        match jwe::Algorithm::try_from(alg) {
            Ok(km_alg) => {
                self.check_use(alg, key_management_op(km_alg, false)).is_ok()
                    && self.key.is_private()
                    && self.key.is_compatible(alg)
            }
            Err(_) => false,
        }
    }

    fn unwrap_key(
        &self,
        alg: Self::Algorithm,
        enc: jwe::ContentEncryptionAlgorithm,
        encrypted_key: &[u8],
    ) -> Result<jwe::ContentKey, Self::Error> {
        let km_alg: jwe::Algorithm = alg
            .try_into()
            .map_err(|_| error::Error::from(error::jwk_usage_mismatch()))?;
        self.check_use(alg, key_management_op(km_alg, false))?;

        if !self.key.is_private() {
            return Err(error::missing_private_key().into());
        }

        self.key.unwrap_key(km_alg, enc, encrypted_key)
    }
}

/// The key material of a JSON Web Key
#[derive(Debug, Clone, Eq, PartialEq)]
#[non_exhaustive]
pub enum Key {
    /// Elliptic curve cryptography
    EllipticCurve(jwa::EllipticCurve),

    /// RSA
    Rsa(jwa::Rsa),

    /// Symmetric secret
    Oct(jwa::Oct),
}

impl Key {
    /// The family of the key material
    #[must_use]
    pub fn key_type(&self) -> KeyType {
        match self {
            Self::EllipticCurve(_) => KeyType::Ec,
            Self::Rsa(_) => KeyType::Rsa,
            Self::Oct(_) => KeyType::Oct,
        }
    }

    /// Whether the key holds private material
    #[must_use]
    pub fn is_private(&self) -> bool {
        match self {
            Self::EllipticCurve(k) => k.is_private(),
            Self::Rsa(k) => k.is_private(),
            Self::Oct(_) => true,
        }
    }

    fn is_compatible(&self, alg: jwa::Algorithm) -> bool {
        use jwa::Algorithm::{KeyManagement, Signing};

        match (self, alg) {
            (Self::EllipticCurve(k), Signing(jws::Algorithm::EllipticCurve(alg))) => {
                k.can_verify(alg)
            }
            (Self::Rsa(k), Signing(jws::Algorithm::Rsa(alg))) => k.can_verify(alg),
            (Self::Oct(k), Signing(jws::Algorithm::Hmac(alg))) => k.can_verify(alg),
            (Self::Rsa(k), KeyManagement(jwe::Algorithm::Rsa(alg))) => k.can_wrap(alg),
            (Self::Oct(k), KeyManagement(jwe::Algorithm::Oct(alg))) => k.can_wrap(alg),
            _ => false,
        }
    }

    fn public_only(self) -> Self {
        match self {
            Self::EllipticCurve(k) => Self::EllipticCurve(k.public_only()),
            Self::Rsa(k) => Self::Rsa(k.public_only()),
            Self::Oct(_) => self,
        }
    }

    fn verify(
        &self,
        alg: jws::Algorithm,
        data: &[u8],
        signature: &[u8],
    ) -> Result<(), error::Error> {
        match (self, alg) {
            (Self::EllipticCurve(k), jws::Algorithm::EllipticCurve(a)) => {
                k.verify(a, data, signature)
            }
            (Self::Rsa(k), jws::Algorithm::Rsa(a)) => k.verify(a, data, signature),
            (Self::Oct(k), jws::Algorithm::Hmac(a)) => k.verify(a, data, signature),
            _ => Err(error::incompatible_algorithm(alg).into()),
        }
    }

    fn sign(&self, alg: jws::Algorithm, data: &[u8]) -> Result<Vec<u8>, error::Error> {
        match (self, alg) {
            (Self::EllipticCurve(k), jws::Algorithm::EllipticCurve(a)) => k.sign(a, data),
            (Self::Rsa(k), jws::Algorithm::Rsa(a)) => k.sign(a, data),
            (Self::Oct(k), jws::Algorithm::Hmac(a)) => k.sign(a, data),
            _ => Err(error::incompatible_algorithm(alg).into()),
        }
    }

    fn wrap_key(
        &self,
        alg: jwe::Algorithm,
        enc: jwe::ContentEncryptionAlgorithm,
    ) -> Result<jwe::WrappedKey, error::Error> {
        match (self, alg) {
            (Self::Rsa(k), jwe::Algorithm::Rsa(a)) => k.wrap_key(a, enc),
            (Self::Oct(k), jwe::Algorithm::Oct(a)) => k.wrap_key(a, enc),
            _ => Err(error::incompatible_algorithm(alg).into()),
        }
    }

    fn unwrap_key(
        &self,
        alg: jwe::Algorithm,
        enc: jwe::ContentEncryptionAlgorithm,
        encrypted_key: &[u8],
    ) -> Result<jwe::ContentKey, error::Error> {
        match (self, alg) {
            (Self::Rsa(k), jwe::Algorithm::Rsa(a)) => k.unwrap_key(a, enc, encrypted_key),
            (Self::Oct(k), jwe::Algorithm::Oct(a)) => k.unwrap_key(a, enc, encrypted_key),
            _ => Err(error::incompatible_algorithm(alg).into()),
        }
    }
}

impl Serialize for Key {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::EllipticCurve(k) => k.serialize(serializer),
            Self::Rsa(k) => k.serialize(serializer),
            Self::Oct(k) => k.serialize(serializer),
        }
    }
}

#[cfg(test)]
mod tests {
    use color_eyre::Result;
    #[cfg(feature = "tracing")]
    use tracing_test::traced_test;

    use super::*;
    use crate::test;

    fn with(base: &str, extra: Value) -> Result<Value> {
        let mut value: Value = serde_json::from_str(base)?;
        if let (Value::Object(map), Value::Object(extra)) = (&mut value, extra) {
            map.extend(extra);
        }
        Ok(value)
    }

    mod pipeline {
        use super::*;

        #[test]
        fn loads_every_fixture() -> Result<()> {
            let fixtures = [
                (test::ec::JWK_P256_PUBLIC, KeyType::Ec, false),
                (test::ec::JWK_P256_PRIVATE, KeyType::Ec, true),
                (test::ec::JWK_P384_PRIVATE, KeyType::Ec, true),
                (test::ec::JWK_P521_PRIVATE, KeyType::Ec, true),
                (test::rsa::JWK_PUBLIC, KeyType::Rsa, false),
                (test::rsa::JWK_PRIVATE, KeyType::Rsa, true),
                (test::oct::JWK, KeyType::Oct, true),
            ];

            for (json, kty, private) in fixtures.iter() {
                let jwk = Jwk::from_json(json)?;
                assert_eq!(jwk.key_type(), *kty);
                assert_eq!(jwk.is_private(), *private);
            }

            Ok(())
        }

        #[test]
        fn sig_usage_admits_sign_and_verify() -> Result<()> {
            let value = with(test::ec::JWK_P256_PUBLIC, serde_json::json!({
                "use": "sig",
                "key_ops": ["sign", "verify"]
            }))?;

            let jwk = Jwk::from_value(value)?;
            assert_eq!(jwk.usage(), Some(jwa::Usage::Signing));
            assert!(jwk.key_ops().unwrap().contains(jwa::KeyOperation::Verify));
            Ok(())
        }

        #[test]
        fn empty_key_ops_loads_but_permits_nothing() -> Result<()> {
            let value = with(test::ec::JWK_P256_PRIVATE, serde_json::json!({ "key_ops": [] }))?;

            let jwk = Jwk::from_value(value)?;
            assert_eq!(jwk.key_ops().map(|ops| ops.as_slice().len()), Some(0));
            assert_eq!(serde_json::to_value(&jwk)?["key_ops"], serde_json::json!([]));

            let err = jwk.sign(jwa::Algorithm::ES256, b"data").unwrap_err();
            assert!(err.is_usage_mismatch());
            Ok(())
        }

        #[test]
        fn sig_usage_rejects_encrypt_operation() -> Result<()> {
            let value = with(test::ec::JWK_P256_PUBLIC, serde_json::json!({
                "use": "sig",
                "key_ops": ["encrypt"]
            }))?;

            let err = Jwk::from_value(value).unwrap_err();
            assert!(err.is_invalid_jwk());
            Ok(())
        }

        #[test]
        fn rejects_unknown_usage_and_duplicate_operations() -> Result<()> {
            let err = Jwk::from_value(with(test::oct::JWK, serde_json::json!({ "use": "wrap" }))?)
                .unwrap_err();
            assert_eq!(err.to_string(), r#"invalid JSON Web Key: invalid key parameter "use""#);

            let err = Jwk::from_value(with(
                test::ec::JWK_P256_PUBLIC,
                serde_json::json!({ "key_ops": ["verify", "verify"] }),
            )?)
            .unwrap_err();
            assert_eq!(
                err.to_string(),
                r#"invalid JSON Web Key: invalid key parameter "key_ops""#
            );

            Ok(())
        }

        #[test]
        fn rejects_non_string_kid() -> Result<()> {
            let err = Jwk::from_value(with(test::oct::JWK, serde_json::json!({ "kid": 7 }))?)
                .unwrap_err();
            assert!(err.is_invalid_jwk());
            Ok(())
        }

        #[test]
        fn rejects_certificate_parameters() -> Result<()> {
            for name in CERTIFICATE_PARAMS.iter() {
                let mut extra = Map::new();
                extra.insert((*name).to_owned(), Value::String("AAAA".into()));

                let err = Jwk::from_value(with(test::ec::JWK_P256_PUBLIC, Value::Object(extra))?)
                    .unwrap_err();
                assert!(err.is_invalid_jwk(), "{}", name);
            }
            Ok(())
        }

        #[test]
        fn key_type_is_required_and_known() -> Result<()> {
            let err = Jwk::from_json(r#"{"k":"AAAA"}"#).unwrap_err();
            assert!(err.is_invalid_jwk());

            let err = Jwk::from_json(r#"{"kty":"OKP","crv":"Ed25519","x":"AAAA"}"#).unwrap_err();
            assert!(err.is_unsupported_alg());

            let err = Jwk::from_json("[1, 2, 3]").unwrap_err();
            assert!(err.is_invalid_jwk());
            Ok(())
        }

        #[test]
        fn algorithm_must_be_known() -> Result<()> {
            let err = Jwk::from_value(with(test::oct::JWK, serde_json::json!({ "alg": "HS1" }))?)
                .unwrap_err();
            assert!(err.is_unsupported_alg());
            Ok(())
        }

        #[test]
        fn algorithm_must_fit_the_key() -> Result<()> {
            let err = Jwk::from_value(with(
                test::ec::JWK_P256_PUBLIC,
                serde_json::json!({ "alg": "RS256" }),
            )?)
            .unwrap_err();
            assert!(err.is_invalid_jwk());

            let err = Jwk::from_value(with(
                test::ec::JWK_P256_PUBLIC,
                serde_json::json!({ "alg": "ES384" }),
            )?)
            .unwrap_err();
            assert!(err.is_invalid_jwk());

            let err = Jwk::from_value(with(test::oct::JWK, serde_json::json!({ "alg": "A128KW" }))?)
                .unwrap_err();
            assert!(err.is_invalid_jwk());
            Ok(())
        }

        #[test]
        fn algorithm_must_fit_the_usage() -> Result<()> {
            let err = Jwk::from_value(with(
                test::rsa::JWK_MIN,
                serde_json::json!({ "use": "enc", "alg": "PS256" }),
            )?)
            .unwrap_err();
            assert!(err.is_invalid_jwk());
            Ok(())
        }

        #[test]
        fn deserialize_runs_the_pipeline() -> Result<()> {
            let jwk: Jwk = serde_json::from_str(test::rsa::JWK_PUBLIC)?;
            assert_eq!(jwk.algorithm(), Some(jwa::Algorithm::RS256));
            assert_eq!(jwk.key_id().map(KeyIdRef::as_str), Some("rsa-2048"));

            assert!(serde_json::from_str::<Jwk>(test::rsa::JWK_1024).is_err());
            Ok(())
        }
    }

    mod serialization {
        use super::*;

        #[test]
        fn members_are_emitted_in_order() -> Result<()> {
            let jwk = Jwk::from_json(test::oct::JWK)?;
            let json = serde_json::to_string(&jwk)?;
            assert_eq!(
                json,
                r#"{"kty":"oct","use":"sig","alg":"HS256","kid":"hmac-1","k":"27TISigZgxOocLBJPBrI80zsiTh2ftLNMZpv9accEtM"}"#
            );
            Ok(())
        }

        #[test]
        fn round_trips_through_json() -> Result<()> {
            for json in [test::ec::JWK_P521_PRIVATE, test::rsa::JWK_PRIVATE].iter() {
                let jwk = Jwk::from_json(json)?;
                let again: Jwk = serde_json::from_value(serde_json::to_value(&jwk)?)?;
                assert_eq!(jwk, again);
            }
            Ok(())
        }

        #[test]
        fn public_only_drops_private_members() -> Result<()> {
            let jwk = Jwk::from_json(test::rsa::JWK_PRIVATE)?.public_only();
            assert!(!jwk.is_private());

            let value = serde_json::to_value(&jwk)?;
            for name in ["d", "p", "q", "dp", "dq", "qi"].iter() {
                assert!(value.get(name).is_none(), "{}", name);
            }
            assert_eq!(value["kid"], "rsa-2048");
            Ok(())
        }

        #[test]
        fn key_ops_are_emitted() -> Result<()> {
            let jwk = Jwk::from_json(test::ec::JWK_P256_PUBLIC)?
                .with_key_ops(jwa::KeyOperations::new(vec![jwa::KeyOperation::Verify])?)?;
            let value = serde_json::to_value(&jwk)?;
            assert_eq!(value["key_ops"], serde_json::json!(["verify"]));
            Ok(())
        }
    }

    mod thumbprint {
        use super::*;

        /// RFC 7638 section 3.1
        #[test]
        fn matches_published_example() -> Result<()> {
            let jwk = Jwk::from_json(
                r#"{
                    "kty": "RSA",
                    "n": "0vx7agoebGcQSuuPiLJXZptN9nndrQmbXEps2aiAFbWhM78LhWx4cbbfAAtVT86zwu1RK7aPFFxuhDR1L6tSoc_BJECPebWKRXjBZCiFV4n3oknjhMstn64tZ_2W-5JsGY4Hc5n9yBXArwl93lqt7_RN5w6Cf0h4QyQ5v-65YGjQR0_FDW2QvzqY368QQMicAtaSqzs8KJZgnYb9c7d0zgdAZHzu6qMQvRL5hajrn1n91CbOpbISD08qNLyrdkt-bFTWhAI4vMQFh6WeZu0fM4lFd2NcRwr3XPksINHaQ-G_xBniIqbw0Ls1jF44-csFCur-kEgU8awapJzKnqDKgw",
                    "e": "AQAB",
                    "alg": "RS256",
                    "kid": "2011-04-29"
                }"#,
            )?;

            assert_eq!(
                jwk.thumbprint()?.encode(),
                "NzbLsXh8uDCcd-6MNwXF4W_7noWXFZAfHkxZsRGC9Xs"
            );
            Ok(())
        }

        #[test]
        fn ignores_private_and_optional_members() -> Result<()> {
            let private = Jwk::from_json(test::ec::JWK_P256_PRIVATE)?;
            let public = Jwk::from_json(test::ec::JWK_P256_PUBLIC)?;
            assert_eq!(private.thumbprint()?, public.thumbprint()?);
            Ok(())
        }
    }

    mod operations {
        use super::*;

        #[test]
        #[cfg_attr(feature = "tracing", traced_test)]
        fn signs_and_verifies_with_each_family() -> Result<()> {
            let keys = [
                (test::ec::JWK_P256_PRIVATE, jwa::Algorithm::ES256),
                (test::ec::JWK_P384_PRIVATE, jwa::Algorithm::ES384),
                (test::ec::JWK_P521_PRIVATE, jwa::Algorithm::ES512),
                (test::rsa::JWK_PRIVATE, jwa::Algorithm::RS384),
                (test::oct::JWK, jwa::Algorithm::HS256),
            ];

            for (json, alg) in keys.iter() {
                let jwk = Jwk::from_json(json)?;
                assert!(jwk.can_sign(*alg));

                let signature = jwk.sign(*alg, b"message")?;
                jwk.verify(*alg, b"message", &signature)?;

                let err = jwk.verify(*alg, b"massage", &signature).unwrap_err();
                assert!(err.is_signature_mismatch(), "{}: {:?}", alg, err);
            }

            Ok(())
        }

        #[test]
        fn declared_usage_is_enforced() -> Result<()> {
            let enc_only = Jwk::from_json(test::rsa::JWK_PRIVATE)?.with_usage(jwa::Usage::Encryption)?;
            let err = enc_only.sign(jwa::Algorithm::RS256, b"data").unwrap_err();
            assert!(err.is_usage_mismatch());

            let verify_only = Jwk::from_json(test::rsa::JWK_PRIVATE)?
                .with_key_ops(jwa::KeyOperations::new(vec![jwa::KeyOperation::Verify])?)?;
            let err = verify_only.sign(jwa::Algorithm::RS256, b"data").unwrap_err();
            assert!(err.is_usage_mismatch());

            let err = Jwk::from_json(test::rsa::JWK_PRIVATE)?
                .sign(jwa::Algorithm::RSA_OAEP, b"data")
                .unwrap_err();
            assert!(err.is_usage_mismatch());
            Ok(())
        }

        #[test]
        fn declared_algorithm_is_enforced() -> Result<()> {
            let jwk = Jwk::from_json(test::rsa::JWK_PUBLIC)?;
            let err = jwk.verify(jwa::Algorithm::PS256, b"data", &[0; 256]).unwrap_err();
            assert!(err.is_incompatible_alg());

            let hmac = Jwk::from_json(test::oct::JWK)?;
            let err = hmac.sign(jwa::Algorithm::ES256, b"data").unwrap_err();
            assert!(err.is_incompatible_alg());
            Ok(())
        }

        #[test]
        fn public_keys_cannot_sign_or_unwrap() -> Result<()> {
            let jwk = Jwk::from_json(test::ec::JWK_P256_PUBLIC)?;
            assert!(!jwk.can_sign(jwa::Algorithm::ES256));
            let err = jwk.sign(jwa::Algorithm::ES256, b"data").unwrap_err();
            assert!(err.is_missing_private_key());

            let rsa = Jwk::from_json(test::rsa::JWK_MIN)?;
            let err = rsa
                .unwrap_key(
                    jwa::Algorithm::RSA_OAEP,
                    jwe::ContentEncryptionAlgorithm::A128GCM,
                    &[0; 256],
                )
                .unwrap_err();
            assert!(err.is_missing_private_key());
            Ok(())
        }

        #[test]
        fn wraps_and_unwraps_content_keys() -> Result<()> {
            let rsa = Jwk::from_json(test::rsa::JWK_PRIVATE)?.with_usage(jwa::Usage::Encryption)?;
            let enc = jwe::ContentEncryptionAlgorithm::A256CBC_HS512;

            let wrapped = rsa.clone().public_only().wrap_key(jwa::Algorithm::RSA_OAEP_512, enc)?;
            let cek = rsa.unwrap_key(jwa::Algorithm::RSA_OAEP_512, enc, wrapped.encrypted_key())?;
            assert_eq!(&cek, wrapped.content_key());
            Ok(())
        }

        #[test]
        fn direct_agreement_is_governed_by_encrypt_operations() -> Result<()> {
            let jwk = Jwk::from(jwa::Oct::generate(16)?)
                .with_key_ops(jwa::KeyOperations::new(vec![jwa::KeyOperation::WrapKey])?)?;
            let enc = jwe::ContentEncryptionAlgorithm::A128GCM;

            let err = jwk.wrap_key(jwa::Algorithm::DIRECT, enc).unwrap_err();
            assert!(err.is_usage_mismatch());

            let jwk = jwk.with_key_ops(jwa::KeyOperations::new(vec![
                jwa::KeyOperation::Encrypt,
                jwa::KeyOperation::Decrypt,
            ])?)?;
            let wrapped = jwk.wrap_key(jwa::Algorithm::DIRECT, enc)?;
            assert!(wrapped.encrypted_key().is_empty());
            Ok(())
        }

        #[test]
        fn elliptic_curve_keys_do_not_manage_content_keys() -> Result<()> {
            let jwk = Jwk::from_json(test::ec::JWK_P256_PRIVATE)?;
            assert!(!jwk.can_wrap(jwa::Algorithm::RSA_OAEP));
            let err = jwk
                .wrap_key(jwa::Algorithm::A128KW, jwe::ContentEncryptionAlgorithm::A128GCM)
                .unwrap_err();
            assert!(err.is_incompatible_alg());
            Ok(())
        }
    }

    mod export {
        use super::*;

        #[test]
        fn dispatches_to_the_codec() -> Result<()> {
            let jwk = Jwk::from_json(test::ec::JWK_P256_PRIVATE)?;
            let pem = jwk
                .export(&jwa::ExportOptions::pem(jwa::KeyFormat::Spki, jwa::KeyVisibility::Public))?
                .into_pem()
                .unwrap();
            assert!(pem.starts_with("-----BEGIN PUBLIC KEY-----\n"));
            Ok(())
        }

        #[test]
        fn symmetric_keys_are_refused() -> Result<()> {
            let jwk = Jwk::from_json(test::oct::JWK)?;
            let err = jwk
                .export(&jwa::ExportOptions::der(jwa::KeyFormat::Pkcs8, jwa::KeyVisibility::Private))
                .unwrap_err();
            assert!(err.is_invalid_argument());
            Ok(())
        }
    }
}
