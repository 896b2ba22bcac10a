//! Minimal DER writer and PEM armor
//!
//! Only the handful of ASN.1 shapes needed for SEC1, PKCS#1, PKCS#8 and
//! SubjectPublicKeyInfo key containers are supported. Every builder returns a
//! complete TLV so that containers can be assembled by concatenation.

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::error;

const TAG_INTEGER: u8 = 0x02;
const TAG_BIT_STRING: u8 = 0x03;
const TAG_OCTET_STRING: u8 = 0x04;
const TAG_NULL: u8 = 0x05;
const TAG_OID: u8 = 0x06;
const TAG_SEQUENCE: u8 = 0x30;
const TAG_CONTEXT_CONSTRUCTED: u8 = 0xa0;

const PEM_LINE_WIDTH: usize = 64;

/// Object identifier contents (without tag and length)
pub(crate) mod oid {
    /// 1.2.840.10045.2.1
    pub(crate) const EC_PUBLIC_KEY: &[u8] = &[0x2a, 0x86, 0x48, 0xce, 0x3d, 0x02, 0x01];
    /// 1.2.840.113549.1.1.1
    pub(crate) const RSA_ENCRYPTION: &[u8] =
        &[0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x01, 0x01];
    /// 1.2.840.10045.3.1.7
    pub(crate) const PRIME256V1: &[u8] = &[0x2a, 0x86, 0x48, 0xce, 0x3d, 0x03, 0x01, 0x07];
    /// 1.3.132.0.34
    pub(crate) const SECP384R1: &[u8] = &[0x2b, 0x81, 0x04, 0x00, 0x22];
    /// 1.3.132.0.35
    pub(crate) const SECP521R1: &[u8] = &[0x2b, 0x81, 0x04, 0x00, 0x23];
}

fn tlv(tag: u8, contents: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(contents.len() + 6);
    out.push(tag);
    push_length(&mut out, contents.len());
    out.extend_from_slice(contents);
    out
}

fn push_length(out: &mut Vec<u8>, len: usize) {
    if len < 0x80 {
        out.push(len as u8);
        return;
    }

    let bytes = len.to_be_bytes();
    let skip = bytes.iter().take_while(|&&b| b == 0).count();
    let significant = &bytes[skip..];
    out.push(0x80 | significant.len() as u8);
    out.extend_from_slice(significant);
}

/// An unsigned INTEGER from big-endian magnitude octets
///
/// Redundant leading zeros are removed and a single zero is prepended when the
/// high bit is set, so the result is always the minimal positive encoding.
pub(crate) fn integer(be: &[u8]) -> Vec<u8> {
    let skip = be.iter().take_while(|&&b| b == 0).count();
    let magnitude = &be[skip..];

    let mut contents = Vec::with_capacity(magnitude.len() + 1);
    match magnitude.first() {
        None => contents.push(0),
        Some(&b) if b & 0x80 != 0 => {
            contents.push(0);
            contents.extend_from_slice(magnitude);
        }
        Some(_) => contents.extend_from_slice(magnitude),
    }

    tlv(TAG_INTEGER, &contents)
}

pub(crate) fn sequence(parts: &[&[u8]]) -> Vec<u8> {
    tlv(TAG_SEQUENCE, &parts.concat())
}

pub(crate) fn octet_string(contents: &[u8]) -> Vec<u8> {
    tlv(TAG_OCTET_STRING, contents)
}

/// A BIT STRING with no unused bits
pub(crate) fn bit_string(contents: &[u8]) -> Vec<u8> {
    let mut padded = Vec::with_capacity(contents.len() + 1);
    padded.push(0);
    padded.extend_from_slice(contents);
    tlv(TAG_BIT_STRING, &padded)
}

pub(crate) fn object_identifier(oid: &[u8]) -> Vec<u8> {
    tlv(TAG_OID, oid)
}

pub(crate) fn null() -> Vec<u8> {
    tlv(TAG_NULL, &[])
}

/// An explicitly tagged, context-specific value (`[n]`)
pub(crate) fn explicit(tag_number: u8, inner: &[u8]) -> Vec<u8> {
    tlv(TAG_CONTEXT_CONSTRUCTED | tag_number, inner)
}

/// Armors DER in a PEM block with 64-column standard base64 lines
pub(crate) fn to_pem(label: &str, der: &[u8]) -> String {
    let body = STANDARD.encode(der);

    let mut pem = String::with_capacity(body.len() + body.len() / PEM_LINE_WIDTH + 2 * label.len() + 40);
    pem.push_str("-----BEGIN ");
    pem.push_str(label);
    pem.push_str("-----\n");
    for line in body.as_bytes().chunks(PEM_LINE_WIDTH) {
        // base64 output is ASCII
        pem.push_str(&String::from_utf8_lossy(line));
        pem.push('\n');
    }
    pem.push_str("-----END ");
    pem.push_str(label);
    pem.push_str("-----\n");
    pem
}

/// Removes PEM armor, requiring the block to carry `label`
pub(crate) fn from_pem(label: &str, pem: &str) -> Result<Vec<u8>, error::InvalidJwk> {
    let begin = format!("-----BEGIN {}-----", label);
    let end = format!("-----END {}-----", label);

    let body = pem
        .trim()
        .strip_prefix(begin.as_str())
        .and_then(|rest| rest.strip_suffix(end.as_str()))
        .ok_or_else(|| {
            error::invalid_jwk(format!("expected a PEM block labelled \"{}\"", label))
        })?;

    let compact: String = body.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD
        .decode(compact)
        .map_err(|_| error::invalid_jwk("malformed PEM body"))
}
