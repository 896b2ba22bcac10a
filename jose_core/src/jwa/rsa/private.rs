use std::{fmt, sync::Arc};

use jose_base64::Base64Url;
use once_cell::sync::OnceCell;
use openssl::{
    bn::BigNum,
    encrypt::Decrypter,
    pkey::{PKey, Private},
    rsa::{Rsa, RsaPrivateKeyBuilder, RsaRef},
};
use ring::signature::RsaKeyPair;
use serde::Serialize;

use super::{KeyManagementAlgorithm, PublicKey, SigningAlgorithm, DEFAULT_PUBLIC_EXPONENT};
use crate::{der, error, jws};

/// The private parameters of an RSA key, as carried in a JWK
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct PrivateComponents {
    /// The private exponent
    pub d: Base64Url,
    /// The first prime factor
    pub p: Base64Url,
    /// The second prime factor
    pub q: Base64Url,
    /// The first factor CRT exponent
    pub dp: Base64Url,
    /// The second factor CRT exponent
    pub dq: Base64Url,
    /// The first CRT coefficient
    pub qi: Base64Url,
}

impl PrivateComponents {
    fn iter(&self) -> impl Iterator<Item = (&'static str, &Base64Url)> {
        vec![
            ("d", &self.d),
            ("p", &self.p),
            ("q", &self.q),
            ("dp", &self.dp),
            ("dq", &self.dq),
            ("qi", &self.qi),
        ]
        .into_iter()
    }

    fn normalized(&self) -> Self {
        Self {
            d: Base64Url::from_uint(self.d.as_slice()),
            p: Base64Url::from_uint(self.p.as_slice()),
            q: Base64Url::from_uint(self.q.as_slice()),
            dp: Base64Url::from_uint(self.dp.as_slice()),
            dq: Base64Url::from_uint(self.dq.as_slice()),
            qi: Base64Url::from_uint(self.qi.as_slice()),
        }
    }
}

impl fmt::Debug for PrivateComponents {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("PrivateComponents { <redacted> }")
    }
}

/// RSA private key components
#[derive(Clone)]
#[must_use]
pub struct PrivateKey {
    public_key: PublicKey,
    components: PrivateComponents,
    handle: PKey<Private>,
    ring_cache: OnceCell<Arc<RsaKeyPair>>,
}

impl PartialEq for PrivateKey {
    fn eq(&self, other: &Self) -> bool {
        self.public_key == other.public_key && self.components == other.components
    }
}

impl Eq for PrivateKey {}

impl PrivateKey {
    /// Generates a new RSA key pair
    ///
    /// # Errors
    ///
    /// The modulus is smaller than 2048 bits or the exponent is not an odd
    /// number greater than one, or key generation failed.
    pub fn generate(modulus_bits: u32, public_exponent: Option<u32>) -> Result<Self, error::Error> {
        let min_bits = super::MIN_MODULUS_BYTES as u32 * 8;
        if modulus_bits < min_bits {
            return Err(error::invalid_argument(format!(
                "modulus must be at least {} bits",
                min_bits
            ))
            .into());
        }

        let exponent = public_exponent.unwrap_or(DEFAULT_PUBLIC_EXPONENT);
        if exponent < 3 || exponent % 2 == 0 {
            return Err(error::invalid_argument("public exponent must be an odd number greater than one").into());
        }

        let e = BigNum::from_u32(exponent).map_err(error::unexpected)?;
        let rsa = Rsa::generate_with_e(modulus_bits, &e).map_err(error::unexpected)?;

        Self::from_openssl(&rsa)
    }

    /// Constructs a key pair from the public key and its private components
    ///
    /// # Errors
    ///
    /// A component is empty, or the components do not form a valid key.
    pub fn from_components(
        public_key: PublicKey,
        components: &PrivateComponents,
    ) -> Result<Self, error::Error> {
        let components = components.normalized();
        for (name, value) in components.iter() {
            if value.uint_len() == 0 {
                return Err(error::invalid_parameter(name).into());
            }
        }

        let bn = |v: &Base64Url| BigNum::from_slice(v.as_slice()).map_err(error::unexpected);
        let inconsistent = || error::invalid_jwk("RSA private key parameters are inconsistent");

        let rsa = RsaPrivateKeyBuilder::new(
            bn(public_key.modulus())?,
            bn(public_key.exponent())?,
            bn(&components.d)?,
        )
        .map_err(error::unexpected)?
        .set_factors(bn(&components.p)?, bn(&components.q)?)
        .map_err(error::unexpected)?
        .set_crt_params(bn(&components.dp)?, bn(&components.dq)?, bn(&components.qi)?)
        .map_err(error::unexpected)?
        .build();

        if !rsa.check_key().map_err(|_| inconsistent())? {
            return Err(inconsistent().into());
        }

        let handle = PKey::from_rsa(rsa).map_err(error::unexpected)?;

        Ok(Self {
            public_key,
            components,
            handle,
            ring_cache: OnceCell::new(),
        })
    }

    pub(crate) fn from_openssl(rsa: &RsaRef<Private>) -> Result<Self, error::Error> {
        let missing = || error::invalid_jwk("RSA private key lacks CRT parameters");
        let uint = |v: Option<&openssl::bn::BigNumRef>| {
            v.map(|v| Base64Url::from_uint(&v.to_vec())).ok_or_else(missing)
        };

        let public_key = PublicKey::from_openssl(rsa)?;
        let components = PrivateComponents {
            d: Base64Url::from_uint(&rsa.d().to_vec()),
            p: uint(rsa.p())?,
            q: uint(rsa.q())?,
            dp: uint(rsa.dmp1())?,
            dq: uint(rsa.dmq1())?,
            qi: uint(rsa.iqmp())?,
        };

        Self::from_components(public_key, &components)
    }

    /// Provides access to the public key parameters
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Extracts the public key
    pub fn into_public_key(self) -> PublicKey {
        self.public_key
    }

    pub(crate) fn components(&self) -> &PrivateComponents {
        &self.components
    }

    /// Encodes the key as a PKCS #1 `RSAPrivateKey`
    #[must_use]
    pub fn to_pkcs1_der(&self) -> Vec<u8> {
        let c = &self.components;
        der::sequence(&[
            &der::integer(&[0]),
            &der::integer(self.public_key.modulus().as_slice()),
            &der::integer(self.public_key.exponent().as_slice()),
            &der::integer(c.d.as_slice()),
            &der::integer(c.p.as_slice()),
            &der::integer(c.q.as_slice()),
            &der::integer(c.dp.as_slice()),
            &der::integer(c.dq.as_slice()),
            &der::integer(c.qi.as_slice()),
        ])
    }

    /// Encodes the key as a PKCS #8 `PrivateKeyInfo` wrapping the PKCS #1
    /// encoding
    #[must_use]
    pub fn to_pkcs8_der(&self) -> Vec<u8> {
        let algorithm = der::sequence(&[
            &der::object_identifier(der::oid::RSA_ENCRYPTION),
            &der::null(),
        ]);

        der::sequence(&[
            &der::integer(&[0]),
            &algorithm,
            &der::octet_string(&self.to_pkcs1_der()),
        ])
    }

    fn ring_key_pair(&self) -> Result<&RsaKeyPair, error::Unexpected> {
        let pair = self.ring_cache.get_or_try_init(|| {
            RsaKeyPair::from_der(&self.to_pkcs1_der())
                .map(Arc::new)
                .map_err(|e| error::unexpected(e.to_string()))
        })?;

        Ok(pair)
    }

    pub(crate) fn decrypt(
        &self,
        alg: KeyManagementAlgorithm,
        data: &[u8],
    ) -> Result<Vec<u8>, error::Unexpected> {
        let mut decrypter = Decrypter::new(&self.handle).map_err(error::unexpected)?;
        decrypter
            .set_rsa_padding(alg.padding())
            .map_err(error::unexpected)?;
        if let Some(md) = alg.oaep_digest() {
            decrypter.set_rsa_oaep_md(md).map_err(error::unexpected)?;
            decrypter.set_rsa_mgf1_md(md).map_err(error::unexpected)?;
        }

        let mut out = vec![0; decrypter.decrypt_len(data).map_err(error::unexpected)?];
        let len = decrypter
            .decrypt(data, &mut out)
            .map_err(error::unexpected)?;
        out.truncate(len);

        Ok(out)
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

impl jws::Signer for PrivateKey {
    type Algorithm = SigningAlgorithm;
    type Error = error::Unexpected;

    fn can_sign(&self, _alg: Self::Algorithm) -> bool {
        true
    }

    fn sign(&self, alg: Self::Algorithm, data: &[u8]) -> Result<Vec<u8>, Self::Error> {
        let key_pair = self.ring_key_pair()?;
        let mut buf = vec![0; key_pair.public().modulus_len()];
        key_pair
            .sign(
                alg.into_signing_params(),
                &ring::rand::SystemRandom::new(),
                data,
                &mut buf,
            )
            .map_err(|e| error::unexpected(e.to_string()))?;
        Ok(buf)
    }
}
