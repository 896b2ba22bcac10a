use std::fmt;

use jose_base64::Base64Url;
use openssl::{
    bn::{BigNum, BigNumContext},
    ec::{EcKey, EcKeyRef},
    ecdsa::EcdsaSig,
    pkey::{HasPublic, Public},
};

use super::{Curve, SigningAlgorithm};
use crate::{der, error, jws};

/// ECC public key
///
/// Holds the affine coordinates of a point validated to lie on its curve.
#[derive(Clone)]
#[must_use]
pub struct PublicKey {
    curve: Curve,
    x: Base64Url,
    y: Base64Url,
    handle: EcKey<Public>,
}

impl PublicKey {
    /// Constructs a public key from its affine coordinates
    ///
    /// # Errors
    ///
    /// A coordinate is wider than the curve allows, or the point is not on
    /// the curve.
    pub fn from_coordinates(curve: Curve, x: &[u8], y: &[u8]) -> Result<Self, error::Error> {
        let size = curve.coordinate_size();
        let x = Base64Url::from_uint_padded(x, size).map_err(|_| error::invalid_parameter("x"))?;
        let y = Base64Url::from_uint_padded(y, size).map_err(|_| error::invalid_parameter("y"))?;

        let bx = BigNum::from_slice(x.as_slice()).map_err(error::unexpected)?;
        let by = BigNum::from_slice(y.as_slice()).map_err(error::unexpected)?;

        let handle = EcKey::from_public_key_affine_coordinates(curve.to_group()?, &bx, &by)
            .map_err(|_| {
                error::invalid_jwk(format!("point is not on curve \"{}\"", curve))
            })?;

        Ok(Self {
            curve,
            x,
            y,
            handle,
        })
    }

    pub(crate) fn from_openssl<T: HasPublic>(key: &EcKeyRef<T>) -> Result<Self, error::Error> {
        let curve = Curve::from_group(key.group())?;

        let ctx = &mut BigNumContext::new().map_err(error::unexpected)?;
        let mut x = BigNum::new().map_err(error::unexpected)?;
        let mut y = BigNum::new().map_err(error::unexpected)?;
        key.public_key()
            .affine_coordinates_gfp(key.group(), &mut x, &mut y, ctx)
            .map_err(|_| error::invalid_jwk("point at infinity"))?;

        Self::from_coordinates(curve, &x.to_vec(), &y.to_vec())
    }

    /// The curve of the key
    pub fn curve(&self) -> Curve {
        self.curve
    }

    /// The x coordinate, padded to the curve's coordinate size
    pub fn x(&self) -> &Base64Url {
        &self.x
    }

    /// The y coordinate, padded to the curve's coordinate size
    pub fn y(&self) -> &Base64Url {
        &self.y
    }

    pub(crate) fn handle(&self) -> &EcKeyRef<Public> {
        &self.handle
    }

    /// The uncompressed SEC 1 point encoding (`0x04 || x || y`)
    pub(crate) fn point(&self) -> Vec<u8> {
        let mut point = Vec::with_capacity(1 + self.x.len() + self.y.len());
        point.push(0x04);
        point.extend_from_slice(self.x.as_slice());
        point.extend_from_slice(self.y.as_slice());
        point
    }

    /// Encodes the key as an X.509 SubjectPublicKeyInfo
    #[must_use]
    pub fn to_spki_der(&self) -> Vec<u8> {
        let algorithm = der::sequence(&[
            &der::object_identifier(der::oid::EC_PUBLIC_KEY),
            &der::object_identifier(self.curve.oid()),
        ]);

        der::sequence(&[&algorithm, &der::bit_string(&self.point())])
    }

    fn verify_with_openssl(&self, data: &[u8], signature: &[u8]) -> Result<(), error::Error> {
        let size = self.curve.coordinate_size();
        if signature.len() != size * 2 {
            return Err(error::signature_mismatch().into());
        }

        let r = BigNum::from_slice(&signature[..size]).map_err(error::unexpected)?;
        let s = BigNum::from_slice(&signature[size..]).map_err(error::unexpected)?;
        let sig = EcdsaSig::from_private_components(r, s).map_err(error::unexpected)?;

        let digest = openssl::sha::sha512(data);
        if sig.verify(&digest, &self.handle).map_err(error::unexpected)? {
            Ok(())
        } else {
            Err(error::signature_mismatch().into())
        }
    }
}

impl jws::Verifier for PublicKey {
    type Algorithm = SigningAlgorithm;
    type Error = error::Error;

    fn can_verify(&self, alg: Self::Algorithm) -> bool {
        self.curve == Curve::from(alg)
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

        match alg.verification_algorithm() {
            Some(ring_alg) => {
                let public_key = ring::signature::UnparsedPublicKey::new(ring_alg, self.point());
                public_key
                    .verify(data, signature)
                    .map_err(|_| error::Error::from(error::signature_mismatch()))
            }
            None => self.verify_with_openssl(data, signature),
        }
    }
}

impl PartialEq for PublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.curve == other.curve && self.x == other.x && self.y == other.y
    }
}

impl Eq for PublicKey {}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("PublicKey")
            .field("curve", &self.curve)
            .field("x", &self.x)
            .field("y", &self.y)
            .finish()
    }
}
