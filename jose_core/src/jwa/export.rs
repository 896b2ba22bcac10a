use std::fmt;

use crate::{der, error, jwk::KeyType};

/// The outer encoding of an exported key
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum KeyEncoding {
    /// Binary DER
    Der,
    /// Base64-armored DER with a label naming the container
    Pem,
}

/// The container format of an exported key
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum KeyFormat {
    /// `ECPrivateKey` from SEC 1 (EC private keys only)
    Sec1,
    /// `RSAPrivateKey` or `RSAPublicKey` from PKCS #1 (RSA only)
    Pkcs1,
    /// `PrivateKeyInfo` from PKCS #8 (private keys only)
    Pkcs8,
    /// `SubjectPublicKeyInfo` from X.509 (public keys only)
    Spki,
}

impl fmt::Display for KeyFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::Sec1 => "sec1",
            Self::Pkcs1 => "pkcs1",
            Self::Pkcs8 => "pkcs8",
            Self::Spki => "spki",
        })
    }
}

/// Whether the private or public half of a key is encoded
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum KeyVisibility {
    /// The private key, including its public components
    Private,
    /// The public key only
    Public,
}

impl fmt::Display for KeyVisibility {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::Private => "private",
            Self::Public => "public",
        })
    }
}

/// Options controlling an asymmetric key export
///
/// ```
/// use jose_core::jwa::{ExportOptions, KeyEncoding, KeyFormat, KeyVisibility};
///
/// let opts = ExportOptions::pem(KeyFormat::Spki, KeyVisibility::Public);
/// assert_eq!(opts.encoding, KeyEncoding::Pem);
/// ```
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct ExportOptions {
    /// The outer encoding
    pub encoding: KeyEncoding,
    /// The container format
    pub format: KeyFormat,
    /// Which half of the key to encode
    pub visibility: KeyVisibility,
}

impl ExportOptions {
    /// DER-encoded output
    pub const fn der(format: KeyFormat, visibility: KeyVisibility) -> Self {
        Self {
            encoding: KeyEncoding::Der,
            format,
            visibility,
        }
    }

    /// PEM-encoded output
    pub const fn pem(format: KeyFormat, visibility: KeyVisibility) -> Self {
        Self {
            encoding: KeyEncoding::Pem,
            format,
            visibility,
        }
    }
}

/// An exported asymmetric key
#[derive(Clone, PartialEq, Eq)]
pub enum ExportedKey {
    /// DER bytes
    Der(Vec<u8>),
    /// PEM text
    Pem(String),
}

impl ExportedKey {
    /// The DER bytes, if DER was requested
    #[must_use]
    pub fn into_der(self) -> Option<Vec<u8>> {
        match self {
            Self::Der(der) => Some(der),
            Self::Pem(_) => None,
        }
    }

    /// The PEM text, if PEM was requested
    #[must_use]
    pub fn into_pem(self) -> Option<String> {
        match self {
            Self::Pem(pem) => Some(pem),
            Self::Der(_) => None,
        }
    }

    /// The exported bytes, whichever encoding was requested
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Der(der) => der,
            Self::Pem(pem) => pem.as_bytes(),
        }
    }
}

impl fmt::Debug for ExportedKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Der(der) => write!(f, "Der({} bytes)", der.len()),
            Self::Pem(_) => f.write_str("Pem(..)"),
        }
    }
}

/// Checks that `format` can carry the requested half of a key of type `kty`
pub(crate) fn ensure_supported(
    kty: KeyType,
    format: KeyFormat,
    visibility: KeyVisibility,
) -> Result<(), error::InvalidArgument> {
    use KeyFormat::*;
    use KeyVisibility::*;

    let supported = match (kty, visibility) {
        (KeyType::Ec, Private) => matches!(format, Sec1 | Pkcs8),
        (KeyType::Ec, Public) => matches!(format, Spki),
        (KeyType::Rsa, Private) => matches!(format, Pkcs1 | Pkcs8),
        (KeyType::Rsa, Public) => matches!(format, Pkcs1 | Spki),
        (KeyType::Oct, _) => false,
    };

    if supported {
        Ok(())
    } else {
        Err(error::invalid_argument(format!(
            "{} {} keys cannot be encoded as {}",
            kty, visibility, format
        )))
    }
}

/// The PEM label for a supported container
pub(crate) fn pem_label(kty: KeyType, format: KeyFormat, visibility: KeyVisibility) -> &'static str {
    match (kty, format, visibility) {
        (KeyType::Ec, KeyFormat::Sec1, _) => "EC PRIVATE KEY",
        (KeyType::Rsa, KeyFormat::Pkcs1, KeyVisibility::Private) => "RSA PRIVATE KEY",
        (KeyType::Rsa, KeyFormat::Pkcs1, KeyVisibility::Public) => "RSA PUBLIC KEY",
        (_, KeyFormat::Pkcs8, _) => "PRIVATE KEY",
        _ => "PUBLIC KEY",
    }
}

/// Applies the requested outer encoding to a DER container
pub(crate) fn encode(kty: KeyType, options: &ExportOptions, der: Vec<u8>) -> ExportedKey {
    match options.encoding {
        KeyEncoding::Der => ExportedKey::Der(der),
        KeyEncoding::Pem => ExportedKey::Pem(der::to_pem(
            pem_label(kty, options.format, options.visibility),
            &der,
        )),
    }
}

/// Strips the PEM armor matching a supported container
pub(crate) fn decode_pem(
    kty: KeyType,
    pem: &str,
    format: KeyFormat,
    visibility: KeyVisibility,
) -> Result<Vec<u8>, error::Error> {
    ensure_supported(kty, format, visibility)?;
    Ok(der::from_pem(pem_label(kty, format, visibility), pem)?)
}
