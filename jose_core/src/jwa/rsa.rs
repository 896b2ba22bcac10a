//! RSA JSON Web Algorithm implementations
//!
//! Integers are held in their minimal big-endian form, and the modulus must
//! be at least [`MIN_MODULUS_BYTES`] octets long.

use std::{convert::TryFrom, fmt};

use jose_base64::Base64Url;
use openssl::{error::ErrorStack, hash::MessageDigest, pkey::PKey, rsa::Padding};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::{
    error,
    jwa::export::{self, ExportOptions, ExportedKey, KeyFormat, KeyVisibility},
    jwe,
    jwk::{self, KeyType},
    jws::{self, Signer, Verifier},
};

mod private;
mod public;

pub use private::{PrivateComponents, PrivateKey};
pub use public::PublicKey;

/// The smallest accepted modulus, in octets (2048 bits)
pub const MIN_MODULUS_BYTES: usize = 256;

/// The public exponent used when generating keys without an explicit one
pub const DEFAULT_PUBLIC_EXPONENT: u32 = 65537;

/// RSA key
#[derive(Debug, Clone, Eq, PartialEq, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
#[must_use]
pub struct Rsa {
    key: MaybePrivate,
}

#[derive(Debug, Clone, Eq, PartialEq)]
enum MaybePrivate {
    PublicAndPrivate(PrivateKey),
    PublicOnly(PublicKey),
}

impl Rsa {
    /// Generates a newly minted RSA public/private key pair
    ///
    /// The public exponent defaults to [`DEFAULT_PUBLIC_EXPONENT`].
    ///
    /// # Errors
    ///
    /// `modulus_bits` is below 2048 or the exponent is not an odd number
    /// greater than one (`InvalidArgument`), or key generation failed.
    pub fn generate(modulus_bits: u32, public_exponent: Option<u32>) -> Result<Self, error::Error> {
        let private_key = PrivateKey::generate(modulus_bits, public_exponent)?;

        #[cfg(feature = "tracing")]
        tracing::debug!(modulus_bits, "generated RSA key");

        Ok(Self::from(private_key))
    }

    /// Constructs a public key from the modulus and exponent
    ///
    /// # Errors
    ///
    /// The modulus is shorter than 2048 bits or the exponent is not valid.
    pub fn from_public_components(modulus: &[u8], exponent: &[u8]) -> Result<Self, error::Error> {
        let public_key = PublicKey::from_components(modulus, exponent)?;

        Ok(Self::from(public_key))
    }

    /// Constructs a key pair from the public and private components
    ///
    /// # Errors
    ///
    /// The public components are invalid, a private component is empty, or
    /// the components are not mutually consistent.
    pub fn from_private_components(
        modulus: &[u8],
        exponent: &[u8],
        private: &PrivateComponents,
    ) -> Result<Self, error::Error> {
        let public_key = PublicKey::from_components(modulus, exponent)?;
        let private_key = PrivateKey::from_components(public_key, private)?;

        Ok(Self::from(private_key))
    }

    pub(crate) fn from_params(params: &Map<String, Value>) -> Result<Self, error::Error> {
        let n = jwk::required_param(params, "n")?;
        let e = jwk::required_param(params, "e")?;

        const PRIVATE: [&str; 6] = ["d", "p", "q", "dp", "dq", "qi"];
        let mut present = Vec::with_capacity(PRIVATE.len());
        for name in PRIVATE.iter().copied() {
            present.push(jwk::optional_param(params, name)?);
        }

        if present.iter().all(Option::is_none) {
            return Self::from_public_components(n.as_slice(), e.as_slice());
        }

        if let Some(idx) = present.iter().position(Option::is_none) {
            return Err(error::invalid_parameter(PRIVATE[idx]).into());
        }

        let mut values = present.into_iter().flatten();
        let mut next = || values.next().unwrap_or_default();
        let private = PrivateComponents {
            d: next(),
            p: next(),
            q: next(),
            dp: next(),
            dq: next(),
            qi: next(),
        };

        Self::from_private_components(n.as_slice(), e.as_slice(), &private)
    }

    /// Imports a key from a DER container
    ///
    /// Private keys are accepted as PKCS #1 or PKCS #8; public keys as
    /// PKCS #1 or SubjectPublicKeyInfo.
    ///
    /// # Errors
    ///
    /// The format cannot carry the requested half of an RSA key, the DER is
    /// malformed, or the key does not meet the modulus size floor.
    pub fn from_der(
        der: &[u8],
        format: KeyFormat,
        visibility: KeyVisibility,
    ) -> Result<Self, error::Error> {
        export::ensure_supported(KeyType::Rsa, format, visibility)?;

        let malformed = |_: ErrorStack| error::invalid_jwk("malformed RSA key container");

        let key = match (visibility, format) {
            (KeyVisibility::Public, KeyFormat::Pkcs1) => {
                let rsa = openssl::rsa::Rsa::public_key_from_der_pkcs1(der).map_err(malformed)?;
                Self::from(PublicKey::from_openssl(&rsa)?)
            }
            (KeyVisibility::Public, _) => {
                let rsa = openssl::rsa::Rsa::public_key_from_der(der).map_err(malformed)?;
                Self::from(PublicKey::from_openssl(&rsa)?)
            }
            (KeyVisibility::Private, KeyFormat::Pkcs1) => {
                let rsa = openssl::rsa::Rsa::private_key_from_der(der).map_err(malformed)?;
                Self::from(PrivateKey::from_openssl(&rsa)?)
            }
            (KeyVisibility::Private, _) => {
                let rsa = PKey::private_key_from_pkcs8(der)
                    .map_err(malformed)?
                    .rsa()
                    .map_err(|_| error::invalid_jwk("PKCS #8 container does not hold an RSA key"))?;
                Self::from(PrivateKey::from_openssl(&rsa)?)
            }
        };

        Ok(key)
    }

    /// Imports a key from a PEM container
    ///
    /// The PEM label must match the requested container.
    ///
    /// # Errors
    ///
    /// See [`from_der()`][Self::from_der()]; additionally, the PEM armor is
    /// missing or carries the wrong label.
    pub fn from_pem(
        pem: &str,
        format: KeyFormat,
        visibility: KeyVisibility,
    ) -> Result<Self, error::Error> {
        let der = export::decode_pem(KeyType::Rsa, pem, format, visibility)?;
        Self::from_der(&der, format, visibility)
    }

    /// Exports the key in the requested container and encoding
    ///
    /// # Errors
    ///
    /// The format cannot carry the requested half of an RSA key
    /// (`InvalidArgument`), or private output was requested from a public key
    /// (`MissingPrivateKey`).
    pub fn export(&self, options: &ExportOptions) -> Result<ExportedKey, error::Error> {
        export::ensure_supported(KeyType::Rsa, options.format, options.visibility)?;

        let der = match (options.visibility, options.format) {
            (KeyVisibility::Public, KeyFormat::Pkcs1) => self.public_key().to_pkcs1_der(),
            (KeyVisibility::Public, _) => self.public_key().to_spki_der(),
            (KeyVisibility::Private, format) => {
                let private = self.private_key().ok_or_else(error::missing_private_key)?;
                if format == KeyFormat::Pkcs1 {
                    private.to_pkcs1_der()
                } else {
                    private.to_pkcs8_der()
                }
            }
        };

        Ok(export::encode(KeyType::Rsa, options, der))
    }

    /// Exports the key as DER
    ///
    /// # Errors
    ///
    /// See [`export()`][Self::export()].
    pub fn to_der(
        &self,
        format: KeyFormat,
        visibility: KeyVisibility,
    ) -> Result<Vec<u8>, error::Error> {
        Ok(self.export(&ExportOptions::der(format, visibility))?.into_der().unwrap_or_default())
    }

    /// Exports the key as PEM
    ///
    /// # Errors
    ///
    /// See [`export()`][Self::export()].
    pub fn to_pem(
        &self,
        format: KeyFormat,
        visibility: KeyVisibility,
    ) -> Result<String, error::Error> {
        Ok(self.export(&ExportOptions::pem(format, visibility))?.into_pem().unwrap_or_default())
    }

    /// Whether the key holds private material
    #[must_use]
    pub fn is_private(&self) -> bool {
        self.private_key().is_some()
    }

    /// Provides access to the private key, if present
    #[must_use]
    pub fn private_key(&self) -> Option<&PrivateKey> {
        match &self.key {
            MaybePrivate::PublicAndPrivate(p) => Some(p),
            MaybePrivate::PublicOnly(_) => None,
        }
    }

    /// Provides access to the public key
    pub fn public_key(&self) -> &PublicKey {
        match &self.key {
            MaybePrivate::PublicAndPrivate(p) => p.public_key(),
            MaybePrivate::PublicOnly(p) => p,
        }
    }

    /// Removes the private key components, if any
    pub fn public_only(self) -> Self {
        match self.key {
            MaybePrivate::PublicAndPrivate(p) => Self::from(p.into_public_key()),
            MaybePrivate::PublicOnly(_) => self,
        }
    }
}

#[derive(Serialize)]
struct RsaParams<'a> {
    n: &'a Base64Url,
    e: &'a Base64Url,
    #[serde(flatten)]
    private: Option<&'a PrivateComponents>,
}

impl Serialize for Rsa {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let public = self.public_key();
        RsaParams {
            n: public.modulus(),
            e: public.exponent(),
            private: self.private_key().map(PrivateKey::components),
        }
        .serialize(serializer)
    }
}

impl TryFrom<Map<String, Value>> for Rsa {
    type Error = error::Error;

    fn try_from(params: Map<String, Value>) -> Result<Self, Self::Error> {
        Self::from_params(&params)
    }
}

/// RSA public/private key signing algorithms
///
/// This list may be expanded in the future.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[allow(clippy::upper_case_acronyms)]
#[non_exhaustive]
pub enum SigningAlgorithm {
    /// RSASSA-PKCS1-v1_5 using SHA-256
    RS256,
    /// RSASSA-PKCS1-v1_5 using SHA-384
    RS384,
    /// RSASSA-PKCS1-v1_5 using SHA-512
    RS512,
    /// RSASSA-PSS using SHA-256 and MGF1 with SHA-256
    PS256,
    /// RSASSA-PSS using SHA-384 and MGF1 with SHA-384
    PS384,
    /// RSASSA-PSS using SHA-512 and MGF1 with SHA-512
    PS512,
}

impl SigningAlgorithm {
    /// The registered name of the algorithm
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::RS256 => "RS256",
            Self::RS384 => "RS384",
            Self::RS512 => "RS512",
            Self::PS256 => "PS256",
            Self::PS384 => "PS384",
            Self::PS512 => "PS512",
        }
    }

    fn into_verification_params(self) -> &'static ring::signature::RsaParameters {
        match self {
            SigningAlgorithm::RS256 => &ring::signature::RSA_PKCS1_2048_8192_SHA256,
            SigningAlgorithm::RS384 => &ring::signature::RSA_PKCS1_2048_8192_SHA384,
            SigningAlgorithm::RS512 => &ring::signature::RSA_PKCS1_2048_8192_SHA512,
            SigningAlgorithm::PS256 => &ring::signature::RSA_PSS_2048_8192_SHA256,
            SigningAlgorithm::PS384 => &ring::signature::RSA_PSS_2048_8192_SHA384,
            SigningAlgorithm::PS512 => &ring::signature::RSA_PSS_2048_8192_SHA512,
        }
    }

    fn into_signing_params(self) -> &'static dyn ring::signature::RsaEncoding {
        match self {
            SigningAlgorithm::RS256 => &ring::signature::RSA_PKCS1_SHA256,
            SigningAlgorithm::RS384 => &ring::signature::RSA_PKCS1_SHA384,
            SigningAlgorithm::RS512 => &ring::signature::RSA_PKCS1_SHA512,
            SigningAlgorithm::PS256 => &ring::signature::RSA_PSS_SHA256,
            SigningAlgorithm::PS384 => &ring::signature::RSA_PSS_SHA384,
            SigningAlgorithm::PS512 => &ring::signature::RSA_PSS_SHA512,
        }
    }
}

impl fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<SigningAlgorithm> for jws::Algorithm {
    fn from(alg: SigningAlgorithm) -> Self {
        Self::Rsa(alg)
    }
}

impl TryFrom<jws::Algorithm> for SigningAlgorithm {
    type Error = error::IncompatibleAlgorithm;

    fn try_from(alg: jws::Algorithm) -> Result<Self, Self::Error> {
        match alg {
            jws::Algorithm::Rsa(alg) => Ok(alg),
            _ => Err(error::incompatible_algorithm(alg)),
        }
    }
}

/// RSA key management algorithms for wrapping a content encryption key
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[allow(non_camel_case_types)]
#[non_exhaustive]
pub enum KeyManagementAlgorithm {
    /// RSAES-PKCS1-v1_5
    #[serde(rename = "RSA1_5")]
    RSA1_5,
    /// RSAES OAEP using SHA-1 and MGF1 with SHA-1
    #[serde(rename = "RSA-OAEP")]
    RSA_OAEP,
    /// RSAES OAEP using SHA-256 and MGF1 with SHA-256
    #[serde(rename = "RSA-OAEP-256")]
    RSA_OAEP_256,
    /// RSAES OAEP using SHA-384 and MGF1 with SHA-384
    #[serde(rename = "RSA-OAEP-384")]
    RSA_OAEP_384,
    /// RSAES OAEP using SHA-512 and MGF1 with SHA-512
    #[serde(rename = "RSA-OAEP-512")]
    RSA_OAEP_512,
}

impl KeyManagementAlgorithm {
    /// The registered name of the algorithm
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::RSA1_5 => "RSA1_5",
            Self::RSA_OAEP => "RSA-OAEP",
            Self::RSA_OAEP_256 => "RSA-OAEP-256",
            Self::RSA_OAEP_384 => "RSA-OAEP-384",
            Self::RSA_OAEP_512 => "RSA-OAEP-512",
        }
    }

    fn padding(self) -> Padding {
        match self {
            Self::RSA1_5 => Padding::PKCS1,
            _ => Padding::PKCS1_OAEP,
        }
    }

    /// The OAEP and MGF1 digest, if OAEP padding is used
    fn oaep_digest(self) -> Option<MessageDigest> {
        match self {
            Self::RSA1_5 => None,
            Self::RSA_OAEP => Some(MessageDigest::sha1()),
            Self::RSA_OAEP_256 => Some(MessageDigest::sha256()),
            Self::RSA_OAEP_384 => Some(MessageDigest::sha384()),
            Self::RSA_OAEP_512 => Some(MessageDigest::sha512()),
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
        Self::Rsa(alg)
    }
}

impl TryFrom<jwe::Algorithm> for KeyManagementAlgorithm {
    type Error = error::IncompatibleAlgorithm;

    fn try_from(alg: jwe::Algorithm) -> Result<Self, Self::Error> {
        match alg {
            jwe::Algorithm::Rsa(alg) => Ok(alg),
            _ => Err(error::incompatible_algorithm(alg)),
        }
    }
}

impl Verifier for Rsa {
    type Algorithm = SigningAlgorithm;
    type Error = error::Error;

    fn can_verify(&self, _alg: Self::Algorithm) -> bool {
        true
    }

    fn verify(
        &self,
        alg: Self::Algorithm,
        data: &[u8],
        signature: &[u8],
    ) -> Result<(), Self::Error> {
        Ok(self.public_key().verify(alg, data, signature)?)
    }
}

impl Signer for Rsa {
    type Algorithm = SigningAlgorithm;
    type Error = error::Error;

    fn can_sign(&self, _alg: Self::Algorithm) -> bool {
        self.is_private()
    }

    fn sign(&self, alg: Self::Algorithm, data: &[u8]) -> Result<Vec<u8>, Self::Error> {
        if let Some(p) = self.private_key() {
            Ok(p.sign(alg, data)?)
        } else {
            Err(error::missing_private_key().into())
        }
    }
}

impl jwe::KeyWrapper for Rsa {
    type Algorithm = KeyManagementAlgorithm;
    type Error = error::Error;

    fn can_wrap(&self, _alg: Self::Algorithm) -> bool {
        true
    }

    fn wrap_key(
        &self,
        alg: Self::Algorithm,
        enc: jwe::ContentEncryptionAlgorithm,
    ) -> Result<jwe::WrappedKey, Self::Error> {
        let cek = jwe::ContentKey::generate(enc)?;
        let encrypted_key = self.public_key().encrypt(alg, cek.as_slice())?;

        Ok(jwe::WrappedKey::new(cek, encrypted_key))
    }
}

impl jwe::KeyUnwrapper for Rsa {
    type Algorithm = KeyManagementAlgorithm;
    type Error = error::Error;

    fn can_unwrap(&self, _alg: Self::Algorithm) -> bool {
        self.is_private()
    }

    fn unwrap_key(
        &self,
        alg: Self::Algorithm,
        enc: jwe::ContentEncryptionAlgorithm,
        encrypted_key: &[u8],
    ) -> Result<jwe::ContentKey, Self::Error> {
        let private = self.private_key().ok_or_else(error::missing_private_key)?;

        match private.decrypt(alg, encrypted_key) {
            Ok(cek) if cek.len() == enc.key_size() => Ok(jwe::ContentKey::from(cek)),

            // A random key lets the content decryption fail in the same way
            // as a tampered ciphertext would, hiding padding failures.
            _ if alg == KeyManagementAlgorithm::RSA1_5 => Ok(jwe::ContentKey::generate(enc)?),

            _ => Err(error::invalid_jwe().into()),
        }
    }
}

impl From<PublicKey> for Rsa {
    fn from(key: PublicKey) -> Self {
        Self {
            key: MaybePrivate::PublicOnly(key),
        }
    }
}

impl From<PrivateKey> for Rsa {
    fn from(key: PrivateKey) -> Self {
        Self {
            key: MaybePrivate::PublicAndPrivate(key),
        }
    }
}

#[cfg(test)]
mod tests {
    use color_eyre::Result;
    #[cfg(feature = "tracing")]
    use tracing_test::traced_test;

    use super::*;
    use crate::{
        jwe::{ContentEncryptionAlgorithm, KeyUnwrapper, KeyWrapper},
        test,
    };

    fn private_key() -> Result<Rsa> {
        Ok(serde_json::from_str(test::rsa::JWK_PRIVATE)?)
    }

    #[test]
    #[cfg_attr(feature = "tracing", traced_test)]
    fn pkcs1_export_matches_reference_encoding() -> Result<()> {
        let key = private_key()?;
        let der = key.to_der(KeyFormat::Pkcs1, KeyVisibility::Private)?;
        assert_eq!(der, test::rsa::PKCS1_PRIVATE_DER);
        Ok(())
    }

    #[test]
    #[cfg_attr(feature = "tracing", traced_test)]
    fn pem_exports_match_reference_encodings() -> Result<()> {
        let key = private_key()?;

        assert_eq!(
            key.to_pem(KeyFormat::Pkcs1, KeyVisibility::Private)?,
            test::rsa::PKCS1_PRIVATE_PEM
        );
        assert_eq!(
            key.to_pem(KeyFormat::Pkcs8, KeyVisibility::Private)?,
            test::rsa::PKCS8_PRIVATE_PEM
        );
        assert_eq!(
            key.to_pem(KeyFormat::Spki, KeyVisibility::Public)?,
            test::rsa::SPKI_PEM
        );
        assert_eq!(
            key.to_pem(KeyFormat::Pkcs1, KeyVisibility::Public)?,
            test::rsa::PKCS1_PUBLIC_PEM
        );

        Ok(())
    }

    #[test]
    #[cfg_attr(feature = "tracing", traced_test)]
    fn imports_every_container() -> Result<()> {
        let key = private_key()?;
        let public = key.clone().public_only();

        let imported = [
            Rsa::from_pem(test::rsa::PKCS1_PRIVATE_PEM, KeyFormat::Pkcs1, KeyVisibility::Private)?,
            Rsa::from_pem(test::rsa::PKCS8_PRIVATE_PEM, KeyFormat::Pkcs8, KeyVisibility::Private)?,
            Rsa::from_der(test::rsa::PKCS1_PRIVATE_DER, KeyFormat::Pkcs1, KeyVisibility::Private)?,
        ];
        for k in imported.iter() {
            assert_eq!(*k, key);
        }

        let spki = Rsa::from_pem(test::rsa::SPKI_PEM, KeyFormat::Spki, KeyVisibility::Public)?;
        let pkcs1 = Rsa::from_pem(test::rsa::PKCS1_PUBLIC_PEM, KeyFormat::Pkcs1, KeyVisibility::Public)?;
        assert_eq!(spki, public);
        assert_eq!(pkcs1, public);

        Ok(())
    }

    #[test]
    #[cfg_attr(feature = "tracing", traced_test)]
    fn format_gating() -> Result<()> {
        let key = private_key()?;

        let err = key.to_der(KeyFormat::Spki, KeyVisibility::Private).unwrap_err();
        assert!(err.is_invalid_argument());
        let err = key.to_der(KeyFormat::Sec1, KeyVisibility::Private).unwrap_err();
        assert!(err.is_invalid_argument());

        let err = key
            .public_only()
            .to_der(KeyFormat::Pkcs8, KeyVisibility::Private)
            .unwrap_err();
        assert!(err.is_missing_private_key());

        Ok(())
    }

    #[test]
    #[cfg_attr(feature = "tracing", traced_test)]
    fn rejects_short_modulus() -> Result<()> {
        let err = serde_json::from_str::<Rsa>(test::rsa::JWK_1024).unwrap_err();
        assert!(err.to_string().contains(r#""n""#));
        Ok(())
    }

    #[test]
    #[cfg_attr(feature = "tracing", traced_test)]
    fn partial_private_key_names_missing_parameter() -> Result<()> {
        let params: Map<String, Value> = serde_json::from_str(test::rsa::JWK_PRIVATE_PARTIAL)?;
        let err = Rsa::from_params(&params).unwrap_err();
        assert!(err.is_invalid_jwk());
        assert_eq!(
            err.to_string(),
            r#"invalid JSON Web Key: invalid key parameter "qi""#
        );
        Ok(())
    }

    #[test]
    #[cfg_attr(feature = "tracing", traced_test)]
    fn inconsistent_private_key_is_rejected() -> Result<()> {
        let mut params: Map<String, Value> = serde_json::from_str(test::rsa::JWK_PRIVATE)?;
        let q = params.get("q").cloned();
        let p = params.get("p").cloned();
        if let (Some(p), Some(q)) = (p, q) {
            params.insert("p".into(), q);
            params.insert("q".into(), p);
        }

        let err = Rsa::from_params(&params).unwrap_err();
        assert!(err.is_invalid_jwk());
        Ok(())
    }

    #[test]
    #[cfg_attr(feature = "tracing", traced_test)]
    fn generate_rejects_weak_parameters() {
        assert!(Rsa::generate(1024, None).unwrap_err().is_invalid_argument());
        assert!(Rsa::generate(2048, Some(4)).unwrap_err().is_invalid_argument());
        assert!(Rsa::generate(2048, Some(1)).unwrap_err().is_invalid_argument());
    }

    #[test]
    #[cfg_attr(feature = "tracing", traced_test)]
    fn generated_key_round_trips_through_jwk() -> Result<()> {
        let key = Rsa::generate(2048, Some(3))?;
        assert_eq!(key.public_key().exponent().as_slice(), [3]);
        assert_eq!(key.public_key().modulus().len(), MIN_MODULUS_BYTES);

        let json = serde_json::to_string(&key)?;
        let parsed: Rsa = serde_json::from_str(&json)?;
        assert_eq!(parsed, key);
        Ok(())
    }

    #[test]
    #[cfg_attr(feature = "tracing", traced_test)]
    fn sign_and_verify() -> Result<()> {
        let key = private_key()?;
        let data = b"the data to sign";

        for alg in [SigningAlgorithm::RS256, SigningAlgorithm::PS512].iter().copied() {
            let signature = key.sign(alg, data)?;
            assert_eq!(signature.len(), MIN_MODULUS_BYTES);
            key.clone().public_only().verify(alg, data, &signature)?;

            let err = key.verify(alg, b"tampered", &signature).unwrap_err();
            assert!(err.is_signature_mismatch());
        }

        Ok(())
    }

    #[test]
    #[cfg_attr(feature = "tracing", traced_test)]
    fn public_key_cannot_sign_or_unwrap() -> Result<()> {
        let key = private_key()?.public_only();
        assert!(key.sign(SigningAlgorithm::RS256, b"x").unwrap_err().is_missing_private_key());
        assert!(key
            .unwrap_key(KeyManagementAlgorithm::RSA_OAEP, ContentEncryptionAlgorithm::A128GCM, &[0; 256])
            .unwrap_err()
            .is_missing_private_key());
        Ok(())
    }

    #[test]
    #[cfg_attr(feature = "tracing", traced_test)]
    fn wraps_and_unwraps_with_every_padding() -> Result<()> {
        let key = private_key()?;
        let enc = ContentEncryptionAlgorithm::A256GCM;

        for alg in [
            KeyManagementAlgorithm::RSA1_5,
            KeyManagementAlgorithm::RSA_OAEP,
            KeyManagementAlgorithm::RSA_OAEP_256,
            KeyManagementAlgorithm::RSA_OAEP_384,
            KeyManagementAlgorithm::RSA_OAEP_512,
        ]
        .iter()
        .copied()
        {
            let wrapped = key.wrap_key(alg, enc)?;
            assert_eq!(wrapped.encrypted_key().len(), MIN_MODULUS_BYTES);
            let cek = key.unwrap_key(alg, enc, wrapped.encrypted_key())?;
            assert_eq!(cek, *wrapped.content_key());
        }

        Ok(())
    }

    #[test]
    #[cfg_attr(feature = "tracing", traced_test)]
    fn corrupt_oaep_key_is_opaque() -> Result<()> {
        let key = private_key()?;
        let enc = ContentEncryptionAlgorithm::A128GCM;
        let wrapped = key.wrap_key(KeyManagementAlgorithm::RSA_OAEP_256, enc)?;

        let mut corrupt = wrapped.encrypted_key().to_vec();
        corrupt[10] ^= 0xff;
        let err = key
            .unwrap_key(KeyManagementAlgorithm::RSA_OAEP_256, enc, &corrupt)
            .unwrap_err();
        assert!(err.is_invalid_jwe());
        Ok(())
    }

    #[test]
    #[cfg_attr(feature = "tracing", traced_test)]
    fn corrupt_pkcs1_key_yields_random_cek() -> Result<()> {
        let key = private_key()?;
        let enc = ContentEncryptionAlgorithm::A128GCM;
        let wrapped = key.wrap_key(KeyManagementAlgorithm::RSA1_5, enc)?;

        let mut corrupt = wrapped.encrypted_key().to_vec();
        corrupt[10] ^= 0xff;
        let cek = key.unwrap_key(KeyManagementAlgorithm::RSA1_5, enc, &corrupt)?;
        assert_eq!(cek.as_slice().len(), enc.key_size());
        assert_ne!(cek, *wrapped.content_key());
        Ok(())
    }
}
