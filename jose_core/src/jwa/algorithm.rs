use std::{convert::TryFrom, fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{error, jwa, jwe, jwk::KeyType, jws};

/// An algorithm
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
#[non_exhaustive]
pub enum Algorithm {
    /// A signing/verification algorithm
    Signing(jws::Algorithm),

    /// A key management algorithm
    KeyManagement(jwe::Algorithm),
}

impl Algorithm {
    /// Gets the usage related to this algorithm
    pub fn to_usage(self) -> jwa::Usage {
        match self {
            Self::Signing(_) => jwa::Usage::Signing,
            Self::KeyManagement(_) => jwa::Usage::Encryption,
        }
    }

    /// The type of key this algorithm operates with
    pub fn key_type(self) -> KeyType {
        match self {
            Self::Signing(alg) => alg.key_type(),
            Self::KeyManagement(alg) => alg.key_type(),
        }
    }

    /// The registered name of the algorithm
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Signing(alg) => alg.name(),
            Self::KeyManagement(alg) => alg.name(),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Algorithm {
    /// The HS256 signing algorithm
    pub const HS256: Algorithm = Self::Signing(jws::Algorithm::HS256);
    /// The HS384 signing algorithm
    pub const HS384: Algorithm = Self::Signing(jws::Algorithm::HS384);
    /// The HS512 signing algorithm
    pub const HS512: Algorithm = Self::Signing(jws::Algorithm::HS512);

    /// The RS256 signing algorithm
    pub const RS256: Algorithm = Self::Signing(jws::Algorithm::RS256);
    /// The RS384 signing algorithm
    pub const RS384: Algorithm = Self::Signing(jws::Algorithm::RS384);
    /// The RS512 signing algorithm
    pub const RS512: Algorithm = Self::Signing(jws::Algorithm::RS512);
    /// The PS256 signing algorithm
    pub const PS256: Algorithm = Self::Signing(jws::Algorithm::PS256);
    /// The PS384 signing algorithm
    pub const PS384: Algorithm = Self::Signing(jws::Algorithm::PS384);
    /// The PS512 signing algorithm
    pub const PS512: Algorithm = Self::Signing(jws::Algorithm::PS512);

    /// The ES256 signing algorithm
    pub const ES256: Algorithm = Self::Signing(jws::Algorithm::ES256);
    /// The ES384 signing algorithm
    pub const ES384: Algorithm = Self::Signing(jws::Algorithm::ES384);
    /// The ES512 signing algorithm
    pub const ES512: Algorithm = Self::Signing(jws::Algorithm::ES512);

    /// The RSA1_5 key management algorithm
    pub const RSA1_5: Algorithm = Self::KeyManagement(jwe::Algorithm::RSA1_5);
    /// The RSA-OAEP key management algorithm
    pub const RSA_OAEP: Algorithm = Self::KeyManagement(jwe::Algorithm::RSA_OAEP);
    /// The RSA-OAEP-256 key management algorithm
    pub const RSA_OAEP_256: Algorithm = Self::KeyManagement(jwe::Algorithm::RSA_OAEP_256);
    /// The RSA-OAEP-384 key management algorithm
    pub const RSA_OAEP_384: Algorithm = Self::KeyManagement(jwe::Algorithm::RSA_OAEP_384);
    /// The RSA-OAEP-512 key management algorithm
    pub const RSA_OAEP_512: Algorithm = Self::KeyManagement(jwe::Algorithm::RSA_OAEP_512);

    /// The A128KW key management algorithm
    pub const A128KW: Algorithm = Self::KeyManagement(jwe::Algorithm::A128KW);
    /// The A192KW key management algorithm
    pub const A192KW: Algorithm = Self::KeyManagement(jwe::Algorithm::A192KW);
    /// The A256KW key management algorithm
    pub const A256KW: Algorithm = Self::KeyManagement(jwe::Algorithm::A256KW);

    /// Direct use of a shared symmetric key as the content encryption key
    pub const DIRECT: Algorithm = Self::KeyManagement(jwe::Algorithm::DIRECT);
}

impl TryFrom<&'_ str> for Algorithm {
    type Error = error::UnsupportedAlgorithm;

    #[inline]
    fn try_from(value: &'_ str) -> Result<Self, Self::Error> {
        if let Ok(alg) = value.parse::<jws::Algorithm>() {
            return Ok(Self::Signing(alg));
        }

        value.parse::<jwe::Algorithm>().map(Self::KeyManagement)
    }
}

impl TryFrom<String> for Algorithm {
    type Error = error::UnsupportedAlgorithm;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = error::UnsupportedAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s)
    }
}

impl Serialize for Algorithm {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Algorithm {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = <std::borrow::Cow<'de, str>>::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

impl From<jws::Algorithm> for Algorithm {
    #[inline]
    fn from(alg: jws::Algorithm) -> Self {
        Self::Signing(alg)
    }
}

impl From<jwe::Algorithm> for Algorithm {
    #[inline]
    fn from(alg: jwe::Algorithm) -> Self {
        Self::KeyManagement(alg)
    }
}

impl From<jwa::ec::SigningAlgorithm> for Algorithm {
    #[inline]
    fn from(alg: jwa::ec::SigningAlgorithm) -> Self {
        Self::Signing(alg.into())
    }
}

impl From<jwa::rsa::SigningAlgorithm> for Algorithm {
    #[inline]
    fn from(alg: jwa::rsa::SigningAlgorithm) -> Self {
        Self::Signing(alg.into())
    }
}

impl From<jwa::oct::SigningAlgorithm> for Algorithm {
    #[inline]
    fn from(alg: jwa::oct::SigningAlgorithm) -> Self {
        Self::Signing(alg.into())
    }
}

impl From<jwa::rsa::KeyManagementAlgorithm> for Algorithm {
    #[inline]
    fn from(alg: jwa::rsa::KeyManagementAlgorithm) -> Self {
        Self::KeyManagement(alg.into())
    }
}

impl From<jwa::oct::KeyManagementAlgorithm> for Algorithm {
    #[inline]
    fn from(alg: jwa::oct::KeyManagementAlgorithm) -> Self {
        Self::KeyManagement(alg.into())
    }
}

impl TryFrom<Algorithm> for jws::Algorithm {
    type Error = error::IncompatibleAlgorithm;

    #[inline]
    fn try_from(alg: Algorithm) -> Result<Self, Self::Error> {
        match alg {
            Algorithm::Signing(alg) => Ok(alg),
            Algorithm::KeyManagement(_) => Err(error::incompatible_algorithm(alg)),
        }
    }
}

impl TryFrom<Algorithm> for jwe::Algorithm {
    type Error = error::IncompatibleAlgorithm;

    #[inline]
    fn try_from(alg: Algorithm) -> Result<Self, Self::Error> {
        match alg {
            Algorithm::KeyManagement(alg) => Ok(alg),
            Algorithm::Signing(_) => Err(error::incompatible_algorithm(alg)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_family() {
        assert_eq!("PS384".parse::<Algorithm>().unwrap(), Algorithm::PS384);
        assert_eq!(
            "RSA-OAEP-256".parse::<Algorithm>().unwrap(),
            Algorithm::RSA_OAEP_256
        );
        assert_eq!("dir".parse::<Algorithm>().unwrap(), Algorithm::DIRECT);
        assert_eq!("A192KW".parse::<Algorithm>().unwrap(), Algorithm::A192KW);
    }

    #[test]
    fn rejects_unknown_names() {
        let err = "none".parse::<Algorithm>().unwrap_err();
        assert_eq!(err.name(), "none");
        assert!("ECDH-ES".parse::<Algorithm>().is_err());
        assert!("rs256".parse::<Algorithm>().is_err());
    }

    #[test]
    fn usage_and_key_type_follow_family() {
        assert_eq!(Algorithm::ES512.to_usage(), jwa::Usage::Signing);
        assert_eq!(Algorithm::ES512.key_type(), KeyType::Ec);
        assert_eq!(Algorithm::RSA1_5.to_usage(), jwa::Usage::Encryption);
        assert_eq!(Algorithm::RSA1_5.key_type(), KeyType::Rsa);
        assert_eq!(Algorithm::DIRECT.key_type(), KeyType::Oct);
    }

    #[test]
    fn serializes_as_registered_name() {
        assert_eq!(
            serde_json::to_string(&Algorithm::RSA_OAEP).unwrap(),
            r#""RSA-OAEP""#
        );
        let alg: Algorithm = serde_json::from_str(r#""HS384""#).unwrap();
        assert_eq!(alg, Algorithm::HS384);
    }
}
