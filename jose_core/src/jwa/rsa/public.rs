use std::fmt;

use jose_base64::Base64Url;
use openssl::{
    bn::BigNum,
    encrypt::Encrypter,
    pkey::{HasPublic, PKey, Public},
    rsa::{Rsa, RsaRef},
};

use super::{KeyManagementAlgorithm, SigningAlgorithm, MIN_MODULUS_BYTES};
use crate::{der, error, jws};

/// RSA public key components
#[derive(Clone)]
#[must_use]
pub struct PublicKey {
    modulus: Base64Url,
    exponent: Base64Url,
    handle: PKey<Public>,
}

impl PublicKey {
    /// The public key's modulus
    pub fn modulus(&self) -> &Base64Url {
        &self.modulus
    }

    /// The public key's exponent
    pub fn exponent(&self) -> &Base64Url {
        &self.exponent
    }

    /// Constructs a public key from the modulus and exponent
    ///
    /// Both integers are normalized to their minimal encoding.
    ///
    /// # Errors
    ///
    /// The modulus is shorter than 2048 bits, or the exponent is not an odd
    /// number greater than one.
    pub fn from_components(modulus: &[u8], exponent: &[u8]) -> Result<Self, error::Error> {
        let modulus = Base64Url::from_uint(modulus);
        if modulus.uint_len() < MIN_MODULUS_BYTES {
            return Err(error::invalid_jwk(format!(
                "invalid key parameter \"n\": modulus must be at least {} bits",
                MIN_MODULUS_BYTES * 8
            ))
            .into());
        }

        let exponent = Base64Url::from_uint(exponent);
        let odd = exponent.as_slice().last().map_or(false, |b| b & 1 == 1);
        if !odd || exponent.as_slice() == [1] {
            return Err(error::invalid_parameter("e").into());
        }

        let rsa = Rsa::from_public_components(
            BigNum::from_slice(modulus.as_slice()).map_err(error::unexpected)?,
            BigNum::from_slice(exponent.as_slice()).map_err(error::unexpected)?,
        )
        .map_err(error::unexpected)?;
        let handle = PKey::from_rsa(rsa).map_err(error::unexpected)?;

        Ok(Self {
            modulus,
            exponent,
            handle,
        })
    }

    pub(crate) fn from_openssl<T: HasPublic>(rsa: &RsaRef<T>) -> Result<Self, error::Error> {
        Self::from_components(&rsa.n().to_vec(), &rsa.e().to_vec())
    }

    /// Encodes the key as a PKCS #1 `RSAPublicKey`
    #[must_use]
    pub fn to_pkcs1_der(&self) -> Vec<u8> {
        der::sequence(&[
            &der::integer(self.modulus.as_slice()),
            &der::integer(self.exponent.as_slice()),
        ])
    }

    /// Encodes the key as an X.509 SubjectPublicKeyInfo
    #[must_use]
    pub fn to_spki_der(&self) -> Vec<u8> {
        let algorithm = der::sequence(&[
            &der::object_identifier(der::oid::RSA_ENCRYPTION),
            &der::null(),
        ]);

        der::sequence(&[&algorithm, &der::bit_string(&self.to_pkcs1_der())])
    }

    pub(crate) fn encrypt(
        &self,
        alg: KeyManagementAlgorithm,
        data: &[u8],
    ) -> Result<Vec<u8>, error::Unexpected> {
        let mut encrypter = Encrypter::new(&self.handle).map_err(error::unexpected)?;
        encrypter
            .set_rsa_padding(alg.padding())
            .map_err(error::unexpected)?;
        if let Some(md) = alg.oaep_digest() {
            encrypter.set_rsa_oaep_md(md).map_err(error::unexpected)?;
            encrypter.set_rsa_mgf1_md(md).map_err(error::unexpected)?;
        }

        let mut out = vec![0; encrypter.encrypt_len(data).map_err(error::unexpected)?];
        let len = encrypter
            .encrypt(data, &mut out)
            .map_err(error::unexpected)?;
        out.truncate(len);

        Ok(out)
    }
}

impl jws::Verifier for PublicKey {
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
        let pk = ring::signature::RsaPublicKeyComponents {
            n: self.modulus.as_slice(),
            e: self.exponent.as_slice(),
        };

        pk.verify(alg.into_verification_params(), data, signature)
            .map_err(|_| error::Error::from(error::signature_mismatch()))
    }
}

impl PartialEq for PublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.modulus == other.modulus && self.exponent == other.exponent
    }
}

impl Eq for PublicKey {}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("PublicKey")
            .field("modulus", &self.modulus)
            .field("exponent", &self.exponent)
            .finish()
    }
}
