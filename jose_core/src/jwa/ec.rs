//! ECC JSON Web Algorithm implementations
//!
//! Coordinates and private scalars are always held zero-padded to the curve's
//! coordinate size (32, 48 or 66 octets), so a key parsed from an unpadded
//! JWK serializes back in canonical form.

use std::{convert::TryFrom, fmt, str::FromStr};

use jose_base64::Base64Url;
use once_cell::sync::Lazy;
use openssl::{
    ec::{EcGroup, EcGroupRef, EcKey},
    error::ErrorStack,
    nid::Nid,
    pkey::PKey,
};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::{
    der, error,
    jwa::export::{self, ExportOptions, ExportedKey, KeyFormat, KeyVisibility},
    jwk::{self, KeyType},
    jws::{self, Signer, Verifier},
};

mod private;
mod public;

pub use private::PrivateKey;
pub use public::PublicKey;

static P256: Lazy<Result<EcGroup, ErrorStack>> =
    Lazy::new(|| EcGroup::from_curve_name(Nid::X9_62_PRIME256V1));
static P384: Lazy<Result<EcGroup, ErrorStack>> =
    Lazy::new(|| EcGroup::from_curve_name(Nid::SECP384R1));
static P521: Lazy<Result<EcGroup, ErrorStack>> =
    Lazy::new(|| EcGroup::from_curve_name(Nid::SECP521R1));

/// A named ECC curve
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Curve {
    /// The P-256 curve (prime256v1/secp256r1)
    #[serde(rename = "P-256")]
    P256,

    /// The P-384 curve (secp384r1)
    #[serde(rename = "P-384")]
    P384,

    /// The P-521 curve (secp521r1)
    #[serde(rename = "P-521")]
    P521,
}

impl Curve {
    /// The size in octets of a coordinate or private scalar on this curve
    #[must_use]
    pub fn coordinate_size(self) -> usize {
        match self {
            Self::P256 => 32,
            Self::P384 => 48,
            Self::P521 => 66,
        }
    }

    /// The registered name of the curve
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::P256 => "P-256",
            Self::P384 => "P-384",
            Self::P521 => "P-521",
        }
    }

    pub(crate) fn oid(self) -> &'static [u8] {
        match self {
            Self::P256 => der::oid::PRIME256V1,
            Self::P384 => der::oid::SECP384R1,
            Self::P521 => der::oid::SECP521R1,
        }
    }

    fn nid(self) -> Nid {
        match self {
            Self::P256 => Nid::X9_62_PRIME256V1,
            Self::P384 => Nid::SECP384R1,
            Self::P521 => Nid::SECP521R1,
        }
    }

    pub(crate) fn to_group(self) -> Result<&'static EcGroupRef, error::Unexpected> {
        let group = match self {
            Self::P256 => &*P256,
            Self::P384 => &*P384,
            Self::P521 => &*P521,
        };

        group.as_deref().map_err(|e| error::unexpected(e.clone()))
    }

    pub(crate) fn from_group(group: &EcGroupRef) -> Result<Self, error::UnsupportedCurve> {
        let nid = group
            .curve_name()
            .ok_or_else(|| error::unsupported_curve("unnamed"))?;

        [Self::P256, Self::P384, Self::P521]
            .iter()
            .copied()
            .find(|crv| crv.nid() == nid)
            .ok_or_else(|| error::unsupported_curve(nid.short_name().unwrap_or("unknown")))
    }
}

impl fmt::Display for Curve {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Curve {
    type Err = error::UnsupportedCurve;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "P-256" => Ok(Self::P256),
            "P-384" => Ok(Self::P384),
            "P-521" => Ok(Self::P521),
            _ => Err(error::unsupported_curve(s)),
        }
    }
}

/// Elliptic curve cryptography key
#[derive(Debug, Clone, Eq, PartialEq, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct EllipticCurve {
    key: MaybePrivate,
}

#[derive(Debug, Clone, Eq, PartialEq)]
enum MaybePrivate {
    PublicAndPrivate(PrivateKey),
    PublicOnly(PublicKey),
}

impl EllipticCurve {
    /// Generates a newly minted key pair using the specified curve
    ///
    /// # Errors
    ///
    /// The underlying random source or key generation failed.
    pub fn generate(curve: Curve) -> Result<Self, error::Unexpected> {
        let private_key = PrivateKey::generate(curve)?;

        #[cfg(feature = "tracing")]
        tracing::debug!(%curve, "generated elliptic curve key");

        Ok(Self::from(private_key))
    }

    /// Constructs a key from its JWK components
    ///
    /// Coordinates shorter than the curve's coordinate size are left-padded
    /// with zeros; longer ones are rejected.
    ///
    /// # Errors
    ///
    /// A component is too wide, the point is not on the curve, or `d` does
    /// not correspond to the point.
    pub fn from_components(
        curve: Curve,
        x: &[u8],
        y: &[u8],
        d: Option<&[u8]>,
    ) -> Result<Self, error::Error> {
        Ok(match d {
            Some(d) => PrivateKey::from_components(curve, x, y, d)?.into(),
            None => PublicKey::from_coordinates(curve, x, y)?.into(),
        })
    }

    pub(crate) fn from_params(params: &Map<String, Value>) -> Result<Self, error::Error> {
        let curve = match params.get("crv") {
            Some(Value::String(crv)) => crv.parse::<Curve>()?,
            _ => return Err(error::invalid_parameter("crv").into()),
        };

        let x = jwk::required_param(params, "x")?;
        let y = jwk::required_param(params, "y")?;
        let d = jwk::optional_param(params, "d")?;

        Self::from_components(
            curve,
            x.as_slice(),
            y.as_slice(),
            d.as_ref().map(Base64Url::as_slice),
        )
    }

    /// Imports a key from a DER container
    ///
    /// Private keys are accepted as SEC 1 or PKCS #8; public keys only as
    /// SubjectPublicKeyInfo.
    ///
    /// # Errors
    ///
    /// The format cannot carry the requested half of an EC key, the DER is
    /// malformed, or the key is on an unsupported curve.
    pub fn from_der(
        der: &[u8],
        format: KeyFormat,
        visibility: KeyVisibility,
    ) -> Result<Self, error::Error> {
        export::ensure_supported(KeyType::Ec, format, visibility)?;

        let malformed = |_: ErrorStack| error::invalid_jwk("malformed EC key container");

        let key = match format {
            KeyFormat::Spki => {
                let key = EcKey::public_key_from_der(der).map_err(malformed)?;
                Self::from(PublicKey::from_openssl(&key)?)
            }
            KeyFormat::Sec1 => {
                let key = EcKey::private_key_from_der(der).map_err(malformed)?;
                Self::from(PrivateKey::from_openssl(&key)?)
            }
            _ => {
                let key = PKey::private_key_from_pkcs8(der)
                    .map_err(malformed)?
                    .ec_key()
                    .map_err(|_| error::invalid_jwk("PKCS #8 container does not hold an EC key"))?;
                Self::from(PrivateKey::from_openssl(&key)?)
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
        let der = export::decode_pem(KeyType::Ec, pem, format, visibility)?;
        Self::from_der(&der, format, visibility)
    }

    /// Exports the key in the requested container and encoding
    ///
    /// # Errors
    ///
    /// The format cannot carry the requested half of an EC key
    /// (`InvalidArgument`), or private output was requested from a public key
    /// (`MissingPrivateKey`).
    pub fn export(&self, options: &ExportOptions) -> Result<ExportedKey, error::Error> {
        export::ensure_supported(KeyType::Ec, options.format, options.visibility)?;

        let der = match options.visibility {
            KeyVisibility::Public => self.public_key().to_spki_der(),
            KeyVisibility::Private => {
                let private = self.private_key().ok_or_else(error::missing_private_key)?;
                if options.format == KeyFormat::Sec1 {
                    private.to_sec1_der()
                } else {
                    private.to_pkcs8_der()
                }
            }
        };

        Ok(export::encode(KeyType::Ec, options, der))
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

    /// The curve the key is on
    pub fn curve(&self) -> Curve {
        self.public_key().curve()
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

    /// Removes the private key components
    pub fn public_only(self) -> Self {
        match self.key {
            MaybePrivate::PublicAndPrivate(p) => Self::from(p.into_public_key()),
            MaybePrivate::PublicOnly(_) => self,
        }
    }
}

#[derive(Serialize)]
struct EcParams<'a> {
    crv: Curve,
    x: &'a Base64Url,
    y: &'a Base64Url,
    #[serde(skip_serializing_if = "Option::is_none")]
    d: Option<&'a Base64Url>,
}

impl Serialize for EllipticCurve {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let public = self.public_key();
        EcParams {
            crv: public.curve(),
            x: public.x(),
            y: public.y(),
            d: self.private_key().map(PrivateKey::d),
        }
        .serialize(serializer)
    }
}

impl TryFrom<Map<String, Value>> for EllipticCurve {
    type Error = error::Error;

    fn try_from(params: Map<String, Value>) -> Result<Self, Self::Error> {
        Self::from_params(&params)
    }
}

/// Elliptic curve cryptography signing algorithms
///
/// This list may be expanded in the future.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[non_exhaustive]
pub enum SigningAlgorithm {
    /// Elliptic curve cryptography using the P-256 curve and SHA-256
    ES256,
    /// Elliptic curve cryptography using the P-384 curve and SHA-384
    ES384,
    /// Elliptic curve cryptography using the P-521 curve and SHA-512
    ES512,
}

impl From<SigningAlgorithm> for jws::Algorithm {
    fn from(alg: SigningAlgorithm) -> Self {
        Self::EllipticCurve(alg)
    }
}

impl TryFrom<jws::Algorithm> for SigningAlgorithm {
    type Error = error::IncompatibleAlgorithm;

    fn try_from(alg: jws::Algorithm) -> Result<Self, Self::Error> {
        match alg {
            jws::Algorithm::EllipticCurve(alg) => Ok(alg),
            _ => Err(error::incompatible_algorithm(alg)),
        }
    }
}

impl SigningAlgorithm {
    /// The registered name of the algorithm
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::ES256 => "ES256",
            Self::ES384 => "ES384",
            Self::ES512 => "ES512",
        }
    }

    /// `None` where ring lacks the curve and OpenSSL is used instead
    fn verification_algorithm(
        self,
    ) -> Option<&'static ring::signature::EcdsaVerificationAlgorithm> {
        match self {
            Self::ES256 => Some(&ring::signature::ECDSA_P256_SHA256_FIXED),
            Self::ES384 => Some(&ring::signature::ECDSA_P384_SHA384_FIXED),
            Self::ES512 => None,
        }
    }

    fn signing_algorithm(self) -> Option<&'static ring::signature::EcdsaSigningAlgorithm> {
        match self {
            Self::ES256 => Some(&ring::signature::ECDSA_P256_SHA256_FIXED_SIGNING),
            Self::ES384 => Some(&ring::signature::ECDSA_P384_SHA384_FIXED_SIGNING),
            Self::ES512 => None,
        }
    }

    /// Size in bytes of an ECDSA signature
    #[must_use]
    pub fn signature_size(self) -> usize {
        Curve::from(self).coordinate_size() * 2
    }
}

impl From<SigningAlgorithm> for Curve {
    fn from(alg: SigningAlgorithm) -> Self {
        match alg {
            SigningAlgorithm::ES256 => Self::P256,
            SigningAlgorithm::ES384 => Self::P384,
            SigningAlgorithm::ES512 => Self::P521,
        }
    }
}

impl From<Curve> for SigningAlgorithm {
    fn from(crv: Curve) -> Self {
        match crv {
            Curve::P256 => Self::ES256,
            Curve::P384 => Self::ES384,
            Curve::P521 => Self::ES512,
        }
    }
}

impl Verifier for EllipticCurve {
    type Algorithm = SigningAlgorithm;
    type Error = error::Error;

    fn can_verify(&self, alg: Self::Algorithm) -> bool {
        self.public_key().can_verify(alg)
    }

    fn verify(
        &self,
        alg: Self::Algorithm,
        data: &[u8],
        signature: &[u8],
    ) -> Result<(), Self::Error> {
        self.public_key().verify(alg, data, signature)
    }
}

impl Signer for EllipticCurve {
    type Algorithm = SigningAlgorithm;
    type Error = error::Error;

    fn can_sign(&self, alg: Self::Algorithm) -> bool {
        if let Some(p) = self.private_key() {
            p.can_sign(alg)
        } else {
            false
        }
    }

    fn sign(&self, alg: Self::Algorithm, data: &[u8]) -> Result<Vec<u8>, Self::Error> {
        if let Some(p) = self.private_key() {
            p.sign(alg, data)
        } else {
            Err(error::missing_private_key().into())
        }
    }
}

impl fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<PublicKey> for EllipticCurve {
    fn from(key: PublicKey) -> Self {
        Self {
            key: MaybePrivate::PublicOnly(key),
        }
    }
}

impl From<PrivateKey> for EllipticCurve {
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
    use crate::test;

    const SCENARIO_X: &str = "4c_cS6IT6jaVQeobt_6BDCTmzBaBOTmmiSCpjd5a6Og";
    const SCENARIO_Y: &str = "mnrPnCFTDkGdEwilabaqM7DzwlAFgetZTmP9ycHPxF8";
    const SCENARIO_D: &str = "bwVX6Vx-TOfGKYOPAcu2xhaj3JUzs-McsC-suaHnFBo";

    fn scenario_key() -> Result<EllipticCurve> {
        Ok(EllipticCurve::from_components(
            Curve::P256,
            Base64Url::from_encoded(SCENARIO_X)?.as_slice(),
            Base64Url::from_encoded(SCENARIO_Y)?.as_slice(),
            Some(Base64Url::from_encoded(SCENARIO_D)?.as_slice()),
        )?)
    }

    #[test]
    #[cfg_attr(feature = "tracing", traced_test)]
    fn exports_known_sec1_and_spki() -> Result<()> {
        let key = scenario_key()?;

        let sec1 = key.to_der(KeyFormat::Sec1, KeyVisibility::Private)?;
        assert_eq!(sec1, test::ec::GOLDEN_SEC1_P256);
        assert_eq!(sec1.len(), 121);

        let spki = key.to_der(KeyFormat::Spki, KeyVisibility::Public)?;
        assert_eq!(spki, test::ec::GOLDEN_SPKI_P256);
        assert_eq!(&spki[..2], [0x30, 0x59]);

        Ok(())
    }

    #[test]
    #[cfg_attr(feature = "tracing", traced_test)]
    fn pkcs8_embeds_curve_parameters() -> Result<()> {
        let key = scenario_key()?;
        let sec1 = key.to_der(KeyFormat::Sec1, KeyVisibility::Private)?;
        let pkcs8 = key.to_der(KeyFormat::Pkcs8, KeyVisibility::Private)?;

        assert!(pkcs8.ends_with(&sec1));
        let reimported = EllipticCurve::from_der(&pkcs8, KeyFormat::Pkcs8, KeyVisibility::Private)?;
        assert_eq!(reimported, key);

        Ok(())
    }

    #[test]
    #[cfg_attr(feature = "tracing", traced_test)]
    fn format_gating() -> Result<()> {
        let key = scenario_key()?;

        let err = key
            .to_der(KeyFormat::Pkcs1, KeyVisibility::Public)
            .unwrap_err();
        assert!(err.is_invalid_argument());

        let err = key
            .to_der(KeyFormat::Spki, KeyVisibility::Private)
            .unwrap_err();
        assert!(err.is_invalid_argument());

        let public = key.public_only();
        let err = public
            .to_der(KeyFormat::Sec1, KeyVisibility::Private)
            .unwrap_err();
        assert!(err.is_missing_private_key());

        Ok(())
    }

    #[test]
    #[cfg_attr(feature = "tracing", traced_test)]
    fn pem_round_trip_for_every_curve() -> Result<()> {
        for (crv, sec1_pem, pkcs8_pem, spki_pem) in test::ec::PEMS {
            let from_sec1 = EllipticCurve::from_pem(sec1_pem, KeyFormat::Sec1, KeyVisibility::Private)?;
            let from_pkcs8 =
                EllipticCurve::from_pem(pkcs8_pem, KeyFormat::Pkcs8, KeyVisibility::Private)?;
            let from_spki = EllipticCurve::from_pem(spki_pem, KeyFormat::Spki, KeyVisibility::Public)?;

            assert_eq!(from_sec1.curve(), *crv);
            assert_eq!(from_sec1, from_pkcs8);
            assert_eq!(from_sec1.clone().public_only(), from_spki);

            let exported = from_sec1.to_pem(KeyFormat::Sec1, KeyVisibility::Private)?;
            assert_eq!(exported, *sec1_pem);
            assert_eq!(
                from_spki.to_pem(KeyFormat::Spki, KeyVisibility::Public)?,
                *spki_pem
            );
        }

        Ok(())
    }

    #[test]
    #[cfg_attr(feature = "tracing", traced_test)]
    fn pem_label_must_match_format() -> Result<()> {
        let (_, sec1_pem, _, _) = test::ec::PEMS[0];
        let err =
            EllipticCurve::from_pem(sec1_pem, KeyFormat::Pkcs8, KeyVisibility::Private).unwrap_err();
        assert!(err.is_invalid_jwk());
        Ok(())
    }

    #[test]
    #[cfg_attr(feature = "tracing", traced_test)]
    fn unpadded_components_are_normalized() -> Result<()> {
        let padded: EllipticCurve = serde_json::from_str(test::ec::JWK_P256_LEADING_ZERO)?;
        let unpadded: EllipticCurve = serde_json::from_str(test::ec::JWK_P256_UNPADDED)?;

        assert_eq!(padded, unpadded);
        assert_eq!(unpadded.public_key().x().len(), 32);
        assert_eq!(unpadded.private_key().map(|p| p.d().len()), Some(32));

        let sec1 = unpadded.to_der(KeyFormat::Sec1, KeyVisibility::Private)?;
        assert_eq!(sec1, test::ec::SEC1_P256_LEADING_ZERO);

        Ok(())
    }

    #[test]
    #[cfg_attr(feature = "tracing", traced_test)]
    fn point_off_curve_is_rejected() -> Result<()> {
        let mut y = Base64Url::from_encoded(SCENARIO_Y)?.into_inner();
        y[31] ^= 1;
        let err = EllipticCurve::from_components(
            Curve::P256,
            Base64Url::from_encoded(SCENARIO_X)?.as_slice(),
            &y,
            None,
        )
        .unwrap_err();
        assert!(err.is_invalid_jwk());
        Ok(())
    }

    #[test]
    #[cfg_attr(feature = "tracing", traced_test)]
    fn oversized_coordinate_is_rejected() -> Result<()> {
        let x = [1u8; 33];
        let err = EllipticCurve::from_components(
            Curve::P256,
            &x,
            Base64Url::from_encoded(SCENARIO_Y)?.as_slice(),
            None,
        )
        .unwrap_err();
        assert!(err.is_invalid_jwk());
        Ok(())
    }

    #[test]
    #[cfg_attr(feature = "tracing", traced_test)]
    fn mismatched_private_scalar_is_rejected() -> Result<()> {
        let mut d = Base64Url::from_encoded(SCENARIO_D)?.into_inner();
        d[0] ^= 0x40;
        let err = EllipticCurve::from_components(
            Curve::P256,
            Base64Url::from_encoded(SCENARIO_X)?.as_slice(),
            Base64Url::from_encoded(SCENARIO_Y)?.as_slice(),
            Some(&d),
        )
        .unwrap_err();
        assert!(err.is_invalid_jwk());
        Ok(())
    }

    #[test]
    fn unknown_curve_is_unsupported() {
        let err = "secp256k1".parse::<Curve>().unwrap_err();
        assert_eq!(err.curve(), "secp256k1");
    }

    #[test]
    #[cfg_attr(feature = "tracing", traced_test)]
    fn sign_and_verify_on_every_curve() -> Result<()> {
        for curve in [Curve::P256, Curve::P384, Curve::P521].iter().copied() {
            let key = EllipticCurve::generate(curve)?;
            let alg = SigningAlgorithm::from(curve);
            let data = b"payload to sign";

            let signature = key.sign(alg, data)?;
            assert_eq!(signature.len(), alg.signature_size());
            key.verify(alg, data, &signature)?;

            let err = key.verify(alg, b"other payload", &signature).unwrap_err();
            assert!(err.is_signature_mismatch());
        }

        Ok(())
    }

    #[test]
    #[cfg_attr(feature = "tracing", traced_test)]
    fn wrong_curve_for_algorithm_is_incompatible() -> Result<()> {
        let key = scenario_key()?;
        assert!(!key.can_sign(SigningAlgorithm::ES384));

        let err = key.sign(SigningAlgorithm::ES384, b"data").unwrap_err();
        assert!(err.is_incompatible_alg());
        Ok(())
    }

    #[test]
    #[cfg_attr(feature = "tracing", traced_test)]
    fn public_key_cannot_sign() -> Result<()> {
        let key = scenario_key()?.public_only();
        assert!(!key.is_private());

        let err = key.sign(SigningAlgorithm::ES256, b"data").unwrap_err();
        assert!(err.is_missing_private_key());
        Ok(())
    }

    #[test]
    fn private_key_debug_is_redacted() -> Result<()> {
        let key = scenario_key()?;
        let debug = format!("{:?}", key);
        assert!(!debug.contains(SCENARIO_D));
        assert!(debug.contains("<redacted>"));
        Ok(())
    }

    const GENERATED_PER_CURVE: usize = 64;

    #[test]
    #[cfg_attr(feature = "tracing", traced_test)]
    fn generated_keys_are_padded_to_curve_width() -> Result<()> {
        for crv in [Curve::P256, Curve::P384, Curve::P521].iter().copied() {
            let width = crv.coordinate_size();

            for _ in 0..GENERATED_PER_CURVE {
                let key = EllipticCurve::generate(crv)?;
                assert_eq!(key.public_key().x().len(), width);
                assert_eq!(key.public_key().y().len(), width);
                assert_eq!(key.private_key().map(|p| p.d().len()), Some(width));

                let json = serde_json::to_value(&key)?;
                for member in ["x", "y", "d"].iter() {
                    let encoded = json[*member].as_str().unwrap_or_default();
                    assert_eq!(Base64Url::from_encoded(encoded)?.len(), width);
                }
            }
        }

        Ok(())
    }

    #[test]
    #[cfg_attr(feature = "tracing", traced_test)]
    fn generated_keys_reexport_identically() -> Result<()> {
        let formats = [
            (KeyFormat::Sec1, KeyVisibility::Private),
            (KeyFormat::Pkcs8, KeyVisibility::Private),
            (KeyFormat::Spki, KeyVisibility::Public),
        ];

        for crv in [Curve::P256, Curve::P384, Curve::P521].iter().copied() {
            for _ in 0..GENERATED_PER_CURVE {
                let key = EllipticCurve::generate(crv)?;

                for (format, visibility) in formats.iter().copied() {
                    let der = key.to_der(format, visibility)?;
                    let imported = EllipticCurve::from_der(&der, format, visibility)?;
                    assert_eq!(imported.to_der(format, visibility)?, der);

                    let pem = key.to_pem(format, visibility)?;
                    let imported = EllipticCurve::from_pem(&pem, format, visibility)?;
                    assert_eq!(imported.to_pem(format, visibility)?, pem);
                }

                let sec1 = key.to_der(KeyFormat::Sec1, KeyVisibility::Private)?;
                assert_eq!(
                    EllipticCurve::from_der(&sec1, KeyFormat::Sec1, KeyVisibility::Private)?,
                    key
                );
            }
        }

        Ok(())
    }
}
