use std::{fmt, sync::Arc};

use jose_base64::Base64Url;
use once_cell::sync::OnceCell;
use openssl::{
    bn::BigNum,
    ec::{EcKey, EcKeyRef},
    ecdsa::EcdsaSig,
    pkey::Private,
};
use ring::signature::EcdsaKeyPair;

use super::{Curve, PublicKey, SigningAlgorithm};
use crate::{der, error, jws};

/// ECC private key parameters
#[derive(Clone)]
#[must_use]
pub struct PrivateKey {
    public_key: PublicKey,
    d: Base64Url,
    handle: EcKey<Private>,
    ring_cache: OnceCell<Arc<EcdsaKeyPair>>,
}

impl PartialEq for PrivateKey {
    fn eq(&self, other: &Self) -> bool {
        self.public_key == other.public_key && self.d == other.d
    }
}

impl Eq for PrivateKey {}

impl PrivateKey {
    /// Generates a new ECC key pair using the specified curve
    ///
    /// # Errors
    ///
    /// Unable to generate a private key.
    pub fn generate(curve: Curve) -> Result<Self, error::Unexpected> {
        let key = EcKey::generate(curve.to_group()?).map_err(error::unexpected)?;

        Self::from_openssl(&key).map_err(error::unexpected)
    }

    /// Constructs a key pair from its affine coordinates and private scalar
    ///
    /// # Errors
    ///
    /// A component is too wide, the point is not on the curve, or `d` is not
    /// the private scalar for the point.
    pub fn from_components(curve: Curve, x: &[u8], y: &[u8], d: &[u8]) -> Result<Self, error::Error> {
        let public_key = PublicKey::from_coordinates(curve, x, y)?;

        let d = Base64Url::from_uint_padded(d, curve.coordinate_size())
            .map_err(|_| error::invalid_parameter("d"))?;
        let scalar = BigNum::from_slice(d.as_slice()).map_err(error::unexpected)?;

        let handle = EcKey::from_private_components(
            curve.to_group()?,
            &scalar,
            public_key.handle().public_key(),
        )
        .map_err(|_| error::invalid_parameter("d"))?;

        handle
            .check_key()
            .map_err(|_| error::invalid_jwk("private key does not match public key"))?;

        Ok(Self {
            public_key,
            d,
            handle,
            ring_cache: OnceCell::new(),
        })
    }

    pub(crate) fn from_openssl(key: &EcKeyRef<Private>) -> Result<Self, error::Error> {
        let public_key = PublicKey::from_openssl(key)?;

        Self::from_components(
            public_key.curve(),
            public_key.x().as_slice(),
            public_key.y().as_slice(),
            &key.private_key().to_vec(),
        )
    }

    /// Provides access to the public key parameters
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Extracts the public key
    pub fn into_public_key(self) -> PublicKey {
        self.public_key
    }

    pub(crate) fn d(&self) -> &Base64Url {
        &self.d
    }

    /// Encodes the key as a SEC 1 `ECPrivateKey`, including the curve
    /// parameters and public key
    #[must_use]
    pub fn to_sec1_der(&self) -> Vec<u8> {
        let curve = self.public_key.curve();

        der::sequence(&[
            &der::integer(&[1]),
            &der::octet_string(self.d.as_slice()),
            &der::explicit(0, &der::object_identifier(curve.oid())),
            &der::explicit(1, &der::bit_string(&self.public_key.point())),
        ])
    }

    /// Encodes the key as a PKCS #8 `PrivateKeyInfo` wrapping the SEC 1
    /// encoding
    #[must_use]
    pub fn to_pkcs8_der(&self) -> Vec<u8> {
        let algorithm = der::sequence(&[
            &der::object_identifier(der::oid::EC_PUBLIC_KEY),
            &der::object_identifier(self.public_key.curve().oid()),
        ]);

        der::sequence(&[
            &der::integer(&[0]),
            &algorithm,
            &der::octet_string(&self.to_sec1_der()),
        ])
    }

    fn ring_key_pair(
        &self,
        alg: &'static ring::signature::EcdsaSigningAlgorithm,
    ) -> Result<&EcdsaKeyPair, error::Unexpected> {
        let pair = self.ring_cache.get_or_try_init(|| {
            EcdsaKeyPair::from_private_key_and_public_key(
                alg,
                self.d.as_slice(),
                &self.public_key.point(),
                &ring::rand::SystemRandom::new(),
            )
            .map(Arc::new)
            .map_err(|e| error::unexpected(e.to_string()))
        })?;

        Ok(pair)
    }

    fn sign_with_openssl(&self, data: &[u8]) -> Result<Vec<u8>, error::Unexpected> {
        let size = self.public_key.curve().coordinate_size();
        let digest = openssl::sha::sha512(data);
        let sig = EcdsaSig::sign(&digest, &self.handle).map_err(error::unexpected)?;

        let mut signature = Base64Url::from_uint_padded(&sig.r().to_vec(), size)
            .map_err(error::unexpected)?
            .into_inner();
        signature.extend(
            Base64Url::from_uint_padded(&sig.s().to_vec(), size)
                .map_err(error::unexpected)?
                .into_inner(),
        );

        Ok(signature)
    }
}

impl jws::Signer for PrivateKey {
    type Algorithm = SigningAlgorithm;
    type Error = error::Error;

    fn can_sign(&self, alg: Self::Algorithm) -> bool {
        self.public_key.curve() == Curve::from(alg)
    }

    fn sign(&self, alg: Self::Algorithm, data: &[u8]) -> Result<Vec<u8>, Self::Error> {
        if !self.can_sign(alg) {
            return Err(error::incompatible_algorithm(alg).into());
        }

        let signature = match alg.signing_algorithm() {
            Some(ring_alg) => self
                .ring_key_pair(ring_alg)?
                .sign(&ring::rand::SystemRandom::new(), data)
                .map_err(|e| error::unexpected(e.to_string()))?
                .as_ref()
                .to_owned(),
            None => self.sign_with_openssl(data)?,
        };

        Ok(signature)
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("public_key", &self.public_key)
            .field("private_key", &"<redacted>")
            .finish()
    }
}
