//! Byte buffers that serialize as URL-safe base64
//!
//! JSON Web Keys carry every binary parameter (moduli, exponents, curve
//! coordinates, private scalars and symmetric secrets) as an unpadded
//! URL-safe base64 string. [`Base64Url`] keeps the underlying data in its raw
//! form and only pays the cost of encoding when the value is displayed or
//! serialized.
//!
//! Most of those parameters are big-endian unsigned integers, and the JOSE
//! standards are picky about how wide they are: RSA parameters use the minimal
//! number of octets, while elliptic curve coordinates and scalars are always
//! the full width of the curve field. The `*_uint*` helpers on [`Base64Url`]
//! convert between those two shapes.
//!
//! # Example
//!
//! ```
//! use jose_base64::Base64Url;
//!
//! let data = Base64Url::from_raw("hello, world!".as_bytes());
//! assert_eq!(data.to_string(), "aGVsbG8sIHdvcmxkIQ");
//! assert_eq!(format!("{:?}", data), "`aGVsbG8sIHdvcmxkIQ`");
//! ```
//!
//! Fixed-width integers:
//!
//! ```
//! use jose_base64::Base64Url;
//!
//! let minimal = Base64Url::from_uint(&[0, 0, 1, 0]);
//! assert_eq!(minimal.as_slice(), &[1, 0]);
//!
//! let padded = minimal.to_uint_padded(4).unwrap();
//! assert_eq!(padded, vec![0, 0, 1, 0]);
//! ```
//!
//! # Serde
//!
//! With the `serde` feature enabled, [`Base64Url`] serializes as a base64url
//! string and refuses to deserialize anything that is not canonical unpadded
//! base64url.

#![warn(
    missing_docs,
    unused_import_braces,
    unused_imports,
    unused_qualifications
)]
#![deny(
    missing_debug_implementations,
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unused_must_use
)]
#![cfg_attr(docsrs, feature(doc_cfg))]

use std::{error::Error, fmt};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

/// An error while decoding a value which is not properly formatted
/// base64url data
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InvalidBase64Data {
    source: base64::DecodeError,
}

impl From<base64::DecodeError> for InvalidBase64Data {
    fn from(err: base64::DecodeError) -> Self {
        Self { source: err }
    }
}

impl fmt::Display for InvalidBase64Data {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("invalid base64url data")
    }
}

impl Error for InvalidBase64Data {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}

/// An unsigned integer is wider than the fixed width it must fit into
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct IntegerTooWide {
    len: usize,
    width: usize,
}

impl IntegerTooWide {
    /// The number of significant octets in the rejected integer
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// The width the integer was required to fit into
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }
}

impl fmt::Display for IntegerTooWide {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "integer of {} octets does not fit into {} octets",
            self.len, self.width
        )
    }
}

impl Error for IntegerTooWide {}

/// Owned data to be encoded as URL-safe base64 (no padding)
///
/// Encoding alphabet: `A`–`Z`, `a`–`z`, `0`–`9`, `-`, `_`
///
/// Data is held in memory in its raw form. Costs of serialization
/// are only incurred when serializing or displaying the value in
/// its base64 representation.
#[derive(Clone, Default, Eq, PartialEq, Hash)]
#[must_use]
pub struct Base64Url(Vec<u8>);

impl Base64Url {
    /// Creates an empty buffer
    #[inline]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Creates a new buffer from an owned value
    ///
    /// To decode a base64url-encoded buffer, use [`from_encoded()`][Self::from_encoded()].
    #[inline]
    pub fn from_raw<T: Into<Vec<u8>>>(raw: T) -> Self {
        Self(raw.into())
    }

    /// Decodes a base64url-encoded value into a new owned buffer
    ///
    /// Padding characters and non-canonical trailing bits are rejected.
    ///
    /// # Errors
    ///
    /// The input is not canonical unpadded base64url.
    pub fn from_encoded<T: AsRef<[u8]>>(enc: T) -> Result<Self, InvalidBase64Data> {
        let data = URL_SAFE_NO_PAD.decode(enc)?;
        Ok(Self(data))
    }

    /// Wraps a big-endian unsigned integer using its minimal encoding
    ///
    /// Leading zero octets are stripped, but at least one octet is always kept
    /// so that zero remains representable.
    pub fn from_uint(be: &[u8]) -> Self {
        Self(strip_leading_zeros(be).to_vec())
    }

    /// Wraps a big-endian unsigned integer left-padded to exactly `width` octets
    ///
    /// # Errors
    ///
    /// The integer has more than `width` significant octets.
    pub fn from_uint_padded(be: &[u8], width: usize) -> Result<Self, IntegerTooWide> {
        left_pad(be, width).map(Self)
    }

    /// Interprets the buffer as a big-endian unsigned integer and left-pads it
    /// to exactly `width` octets
    ///
    /// # Errors
    ///
    /// The integer has more than `width` significant octets.
    pub fn to_uint_padded(&self, width: usize) -> Result<Vec<u8>, IntegerTooWide> {
        left_pad(&self.0, width)
    }

    /// The number of significant octets when the buffer is read as a
    /// big-endian unsigned integer
    #[must_use]
    pub fn uint_len(&self) -> usize {
        let stripped = strip_leading_zeros(&self.0);
        if stripped == [0] {
            0
        } else {
            stripped.len()
        }
    }

    /// Provides access to the underlying slice
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Provides mutable access to the underlying slice
    #[inline]
    #[must_use]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.0
    }

    /// Unwraps the underlying buffer
    #[inline]
    #[must_use]
    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }

    /// The number of raw octets held
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the buffer is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Encodes the buffer as an unpadded base64url string
    #[must_use]
    pub fn encode(&self) -> String {
        URL_SAFE_NO_PAD.encode(&self.0)
    }

    /// Calculates the expected length of the base64url encoding for a buffer of size `len`
    #[inline]
    #[must_use]
    pub const fn calc_encoded_len(len: usize) -> usize {
        let d = len / 3 * 4;
        let m = len % 3;
        if m > 0 {
            d + m + 1
        } else {
            d
        }
    }
}

fn strip_leading_zeros(be: &[u8]) -> &[u8] {
    match be.iter().position(|&b| b != 0) {
        Some(idx) => &be[idx..],
        None if be.is_empty() => &[0],
        None => &be[be.len() - 1..],
    }
}

fn left_pad(be: &[u8], width: usize) -> Result<Vec<u8>, IntegerTooWide> {
    let significant: &[u8] = match be.iter().position(|&b| b != 0) {
        Some(idx) => &be[idx..],
        None => &[],
    };

    if significant.len() > width {
        return Err(IntegerTooWide {
            len: significant.len(),
            width,
        });
    }

    let mut out = vec![0; width - significant.len()];
    out.extend_from_slice(significant);
    Ok(out)
}

impl From<Vec<u8>> for Base64Url {
    #[inline]
    fn from(buf: Vec<u8>) -> Self {
        Self(buf)
    }
}

impl From<&'_ [u8]> for Base64Url {
    #[inline]
    fn from(slice: &[u8]) -> Self {
        Self::from_raw(slice)
    }
}

impl From<Base64Url> for Vec<u8> {
    #[inline]
    fn from(val: Base64Url) -> Self {
        val.0
    }
}

impl AsRef<[u8]> for Base64Url {
    #[inline]
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Base64Url {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl fmt::Debug for Base64Url {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "`{}`", self.encode())
    }
}

/// Serialize the underlying byte array as a base64url string
#[cfg(any(feature = "serde", docsrs))]
#[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
impl serde::Serialize for Base64Url {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encode())
    }
}

/// Deserialize a base64url string and decode it into a byte array
#[cfg(any(feature = "serde", docsrs))]
#[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
impl<'de> serde::Deserialize<'de> for Base64Url {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct Visitor;

        impl<'de> serde::de::Visitor<'de> for Visitor {
            type Value = Base64Url;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an unpadded base64url string")
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Base64Url::from_encoded(v).map_err(E::custom)
            }
        }

        deserializer.deserialize_str(Visitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_padding() {
        assert!(Base64Url::from_encoded("AQ==").is_err());
        assert_eq!(Base64Url::from_encoded("AQ").unwrap().as_slice(), &[1]);
    }

    #[test]
    fn rejects_standard_alphabet() {
        assert!(Base64Url::from_encoded("8J+RiyBo").is_err());
    }

    #[test]
    fn rejects_non_canonical_trailing_bits() {
        // "AR" decodes to 0x01 with stray low bits set
        assert!(Base64Url::from_encoded("AR").is_err());
    }

    #[test]
    fn minimal_uint_keeps_a_single_zero() {
        assert_eq!(Base64Url::from_uint(&[0, 0, 0]).as_slice(), &[0]);
        assert_eq!(Base64Url::from_uint(&[]).as_slice(), &[0]);
        assert_eq!(Base64Url::from_uint(&[0, 0x80, 1]).as_slice(), &[0x80, 1]);
    }

    #[test]
    fn pads_short_integers() {
        let value = Base64Url::from_raw(vec![0xab, 0xcd]);
        assert_eq!(value.to_uint_padded(4).unwrap(), vec![0, 0, 0xab, 0xcd]);
        assert_eq!(
            Base64Url::from_uint_padded(&[0, 0, 0, 0, 7], 2)
                .unwrap()
                .as_slice(),
            &[0, 7]
        );
    }

    #[test]
    fn refuses_to_truncate_wide_integers() {
        let err = Base64Url::from_raw(vec![1, 0, 0]).to_uint_padded(2).unwrap_err();
        assert_eq!(err.len(), 3);
        assert_eq!(err.width(), 2);
    }

    #[test]
    fn counts_significant_octets() {
        assert_eq!(Base64Url::from_raw(vec![0, 0, 3, 4]).uint_len(), 2);
        assert_eq!(Base64Url::from_raw(vec![0, 0]).uint_len(), 0);
    }

    #[test]
    fn encoded_len_matches_encoding() {
        for len in 0..10 {
            let data = Base64Url::from_raw(vec![0xff; len]);
            assert_eq!(data.encode().len(), Base64Url::calc_encoded_len(len));
        }
    }

    #[cfg(feature = "serde")]
    #[test]
    fn round_trips_through_serde() {
        #[derive(Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
        struct Params {
            k: Base64Url,
        }

        let params = Params {
            k: Base64Url::from_raw(b"secret".to_vec()),
        };
        let json = serde_json::to_string(&params).unwrap();
        assert_eq!(json, r#"{"k":"c2VjcmV0"}"#);
        let back: Params = serde_json::from_str(&json).unwrap();
        assert_eq!(back, params);
        assert!(serde_json::from_str::<Params>(r#"{"k":"c2VjcmV0=="}"#).is_err());
    }
}
