use std::fmt;

use openssl::symm::{self, Cipher};
use ring::{hmac, rand::SecureRandom};
use serde::{Deserialize, Serialize};

use crate::error;

/// JSON Web Encryption content encryption algorithms
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ContentEncryptionAlgorithm {
    /// AES-GCM with a 128-bit key
    A128GCM,
    /// AES-GCM with a 192-bit key
    A192GCM,
    /// AES-GCM with a 256-bit key
    A256GCM,
    /// AES-128-CBC authenticated with HMAC SHA-256
    #[serde(rename = "A128CBC-HS256")]
    A128CBC_HS256,
    /// AES-192-CBC authenticated with HMAC SHA-384
    #[serde(rename = "A192CBC-HS384")]
    A192CBC_HS384,
    /// AES-256-CBC authenticated with HMAC SHA-512
    #[serde(rename = "A256CBC-HS512")]
    A256CBC_HS512,
}

impl ContentEncryptionAlgorithm {
    /// The registered name of the algorithm
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::A128GCM => "A128GCM",
            Self::A192GCM => "A192GCM",
            Self::A256GCM => "A256GCM",
            Self::A128CBC_HS256 => "A128CBC-HS256",
            Self::A192CBC_HS384 => "A192CBC-HS384",
            Self::A256CBC_HS512 => "A256CBC-HS512",
        }
    }

    /// Size of the content encryption key, in bytes
    ///
    /// The CBC-HMAC composites take a MAC key and an encryption key of equal
    /// size, concatenated.
    #[must_use]
    pub fn key_size(self) -> usize {
        match self {
            Self::A128GCM => 16,
            Self::A192GCM => 24,
            Self::A256GCM => 32,
            Self::A128CBC_HS256 => 32,
            Self::A192CBC_HS384 => 48,
            Self::A256CBC_HS512 => 64,
        }
    }

    /// Size of the initialization vector, in bytes
    #[must_use]
    pub fn iv_size(self) -> usize {
        match self {
            Self::A128GCM | Self::A192GCM | Self::A256GCM => 12,
            _ => 16,
        }
    }

    /// Size of the authentication tag, in bytes
    #[must_use]
    pub fn tag_size(self) -> usize {
        match self {
            Self::A128GCM | Self::A192GCM | Self::A256GCM => 16,
            _ => self.key_size() / 2,
        }
    }

    fn cipher(self) -> Cipher {
        match self {
            Self::A128GCM => Cipher::aes_128_gcm(),
            Self::A192GCM => Cipher::aes_192_gcm(),
            Self::A256GCM => Cipher::aes_256_gcm(),
            Self::A128CBC_HS256 => Cipher::aes_128_cbc(),
            Self::A192CBC_HS384 => Cipher::aes_192_cbc(),
            Self::A256CBC_HS512 => Cipher::aes_256_cbc(),
        }
    }

    fn mac_algorithm(self) -> Option<hmac::Algorithm> {
        match self {
            Self::A128CBC_HS256 => Some(hmac::HMAC_SHA256),
            Self::A192CBC_HS384 => Some(hmac::HMAC_SHA384),
            Self::A256CBC_HS512 => Some(hmac::HMAC_SHA512),
            _ => None,
        }
    }

    /// Encrypts `plaintext` under `cek`, authenticating `aad` alongside it
    ///
    /// A fresh initialization vector is drawn for every call.
    ///
    /// # Errors
    ///
    /// The key is not [`key_size()`][Self::key_size] bytes long
    /// (`InvalidArgument`), or the cipher failed.
    pub fn encrypt(
        self,
        cek: &ContentKey,
        aad: &[u8],
        plaintext: &[u8],
    ) -> Result<EncryptedContent, error::Error> {
        if cek.len() != self.key_size() {
            return Err(error::invalid_argument(format!(
                "{} requires a {}-byte content encryption key",
                self,
                self.key_size()
            ))
            .into());
        }

        let mut iv = vec![0; self.iv_size()];
        ring::rand::SystemRandom::new()
            .fill(&mut iv)
            .map_err(|_| error::unexpected("random number generator failure"))?;

        let (ciphertext, tag) = match self.mac_algorithm() {
            None => {
                let mut tag = vec![0; self.tag_size()];
                let ciphertext = symm::encrypt_aead(
                    self.cipher(),
                    cek.as_slice(),
                    Some(iv.as_slice()),
                    aad,
                    plaintext,
                    &mut tag,
                )
                .map_err(error::unexpected)?;
                (ciphertext, tag)
            }
            Some(mac) => {
                let (mac_key, enc_key) = cek.as_slice().split_at(self.key_size() / 2);
                let ciphertext =
                    symm::encrypt(self.cipher(), enc_key, Some(iv.as_slice()), plaintext)
                        .map_err(error::unexpected)?;
                let tag = self.cbc_tag(mac, mac_key, aad, &iv, &ciphertext);
                (ciphertext, tag)
            }
        };

        Ok(EncryptedContent {
            iv,
            ciphertext,
            tag,
        })
    }

    /// Decrypts and authenticates content produced by [`encrypt`][Self::encrypt]
    ///
    /// # Errors
    ///
    /// Any failure, including a wrong key, a bad tag or bad padding, is
    /// reported as the same opaque `InvalidJwe`.
    pub fn decrypt(
        self,
        cek: &ContentKey,
        aad: &[u8],
        iv: &[u8],
        ciphertext: &[u8],
        tag: &[u8],
    ) -> Result<Vec<u8>, error::InvalidJwe> {
        if cek.len() != self.key_size() || iv.len() != self.iv_size() || tag.len() != self.tag_size()
        {
            return Err(error::invalid_jwe());
        }

        match self.mac_algorithm() {
            None => symm::decrypt_aead(self.cipher(), cek.as_slice(), Some(iv), aad, ciphertext, tag)
                .map_err(|_| error::invalid_jwe()),
            Some(mac) => {
                let (mac_key, enc_key) = cek.as_slice().split_at(self.key_size() / 2);
                let expected = self.cbc_tag(mac, mac_key, aad, iv, ciphertext);
                if !openssl::memcmp::eq(&expected, tag) {
                    return Err(error::invalid_jwe());
                }

                symm::decrypt(self.cipher(), enc_key, Some(iv), ciphertext)
                    .map_err(|_| error::invalid_jwe())
            }
        }
    }

    /// HMAC over `AAD || IV || ciphertext || AL`, truncated to the first half
    fn cbc_tag(
        self,
        mac: hmac::Algorithm,
        mac_key: &[u8],
        aad: &[u8],
        iv: &[u8],
        ciphertext: &[u8],
    ) -> Vec<u8> {
        let aad_bits = (aad.len() as u64) * 8;

        let key = hmac::Key::new(mac, mac_key);
        let mut ctx = hmac::Context::with_key(&key);
        ctx.update(aad);
        ctx.update(iv);
        ctx.update(ciphertext);
        ctx.update(&aad_bits.to_be_bytes());

        let full = ctx.sign();
        full.as_ref()[..self.tag_size()].to_vec()
    }
}

impl fmt::Display for ContentEncryptionAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Output of a content encryption
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct EncryptedContent {
    iv: Vec<u8>,
    ciphertext: Vec<u8>,
    tag: Vec<u8>,
}

impl EncryptedContent {
    /// The initialization vector
    #[must_use]
    pub fn iv(&self) -> &[u8] {
        &self.iv
    }

    /// The encrypted content
    #[must_use]
    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    /// The authentication tag
    #[must_use]
    pub fn tag(&self) -> &[u8] {
        &self.tag
    }
}

/// A content encryption key (CEK)
#[derive(Clone, PartialEq, Eq)]
pub struct ContentKey(Vec<u8>);

impl ContentKey {
    /// Generates a random key sized for `enc`
    ///
    /// # Errors
    ///
    /// The system random source failed.
    pub fn generate(enc: ContentEncryptionAlgorithm) -> Result<Self, error::Unexpected> {
        let mut key = vec![0; enc.key_size()];
        ring::rand::SystemRandom::new()
            .fill(&mut key)
            .map_err(|_| error::unexpected("random number generator failure"))?;
        Ok(Self(key))
    }

    /// The raw key
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Length of the key, in bytes
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the key is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for ContentKey {
    fn from(key: Vec<u8>) -> Self {
        Self(key)
    }
}

impl fmt::Debug for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("ContentKey(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use color_eyre::Result;

    use super::*;

    const ALL: [ContentEncryptionAlgorithm; 6] = [
        ContentEncryptionAlgorithm::A128GCM,
        ContentEncryptionAlgorithm::A192GCM,
        ContentEncryptionAlgorithm::A256GCM,
        ContentEncryptionAlgorithm::A128CBC_HS256,
        ContentEncryptionAlgorithm::A192CBC_HS384,
        ContentEncryptionAlgorithm::A256CBC_HS512,
    ];

    #[test]
    fn every_algorithm_seals_and_opens() -> Result<()> {
        let aad = b"eyJhbGciOiJkaXIifQ";
        let plaintext = b"Live long and prosper.";

        for &enc in ALL.iter() {
            let cek = ContentKey::generate(enc)?;
            let sealed = enc.encrypt(&cek, aad, plaintext)?;

            assert_eq!(sealed.iv().len(), enc.iv_size());
            assert_eq!(sealed.tag().len(), enc.tag_size());

            let opened = enc.decrypt(&cek, aad, sealed.iv(), sealed.ciphertext(), sealed.tag())?;
            assert_eq!(opened, plaintext);
        }

        Ok(())
    }

    /// RFC 7516 Appendix B
    #[test]
    fn cbc_hmac_matches_published_vector() -> Result<()> {
        let cek = ContentKey::from(vec![
            4, 211, 31, 197, 84, 157, 252, 254, 11, 100, 157, 250, 63, 170, 106, 206, 107, 124,
            212, 45, 111, 107, 9, 219, 200, 177, 0, 240, 143, 156, 44, 207,
        ]);
        let iv = [
            3, 22, 60, 12, 43, 67, 104, 105, 108, 108, 105, 99, 111, 116, 104, 101,
        ];
        let aad = b"eyJhbGciOiJBMTI4S1ciLCJlbmMiOiJBMTI4Q0JDLUhTMjU2In0";
        let ciphertext = [
            40, 57, 83, 181, 119, 33, 133, 148, 198, 185, 243, 24, 152, 230, 6, 75, 129, 223, 127,
            19, 210, 82, 183, 230, 168, 33, 215, 104, 143, 112, 56, 102,
        ];
        let tag = [
            83, 73, 191, 98, 104, 205, 211, 128, 201, 189, 199, 133, 32, 38, 194, 85,
        ];

        let enc = ContentEncryptionAlgorithm::A128CBC_HS256;
        let opened = enc.decrypt(&cek, aad, &iv, &ciphertext, &tag)?;
        assert_eq!(opened, b"Live long and prosper.");

        Ok(())
    }

    #[test]
    fn tampering_is_opaque() -> Result<()> {
        for &enc in ALL.iter() {
            let cek = ContentKey::generate(enc)?;
            let sealed = enc.encrypt(&cek, b"aad", b"payload")?;

            let mut tag = sealed.tag().to_vec();
            tag[0] ^= 1;
            assert!(enc
                .decrypt(&cek, b"aad", sealed.iv(), sealed.ciphertext(), &tag)
                .is_err());

            assert!(enc
                .decrypt(&cek, b"other", sealed.iv(), sealed.ciphertext(), sealed.tag())
                .is_err());

            let other = ContentKey::generate(enc)?;
            assert!(enc
                .decrypt(&other, b"aad", sealed.iv(), sealed.ciphertext(), sealed.tag())
                .is_err());
        }

        Ok(())
    }

    #[test]
    fn wrong_key_size_is_rejected() {
        let cek = ContentKey::from(vec![0; 16]);
        let err = ContentEncryptionAlgorithm::A256GCM
            .encrypt(&cek, b"", b"")
            .unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn names_and_sizes() {
        assert_eq!(
            serde_json::to_string(&ContentEncryptionAlgorithm::A192CBC_HS384).unwrap(),
            r#""A192CBC-HS384""#
        );
        assert_eq!(ContentEncryptionAlgorithm::A256CBC_HS512.key_size(), 64);
        assert_eq!(ContentEncryptionAlgorithm::A256CBC_HS512.tag_size(), 32);
        assert_eq!(ContentEncryptionAlgorithm::A192GCM.iv_size(), 12);
    }

    #[test]
    fn content_key_debug_is_redacted() {
        let cek = ContentKey::from(vec![0xAB; 16]);
        assert_eq!(format!("{:?}", cek), "ContentKey(<redacted>)");
    }
}
