//! This crate implements the codec core of the Javascript/JSON Object Signing
//! and Encryption (JOSE) standards:
//!
//! * JSON Web Key (JWK) and key sets: [RFC7517][], with thumbprints per [RFC7638][]
//! * JSON Web Algorithms (JWA): [RFC7518][], for EC, RSA and octet keys
//! * JSON Web Signature (JWS): [RFC7515][], compact serialization
//! * JSON Web Encryption (JWE): [RFC7516][], compact serialization
//!
//! Asymmetric keys can also be moved in and out of DER and PEM containers
//! (SEC1, PKCS#1, PKCS#8 and SubjectPublicKeyInfo).
//!
//! [RFC7515]: https://tools.ietf.org/html/rfc7515
//! [RFC7516]: https://tools.ietf.org/html/rfc7516
//! [RFC7517]: https://tools.ietf.org/html/rfc7517
//! [RFC7518]: https://tools.ietf.org/html/rfc7518
//! [RFC7638]: https://tools.ietf.org/html/rfc7638
//!
//! # Example
//!
//! ```
//! use jose_core::{jwa, jwk::KeyId, jwks::KeyCriteria, jws, Jwk, Jwks};
//!
//! let secret = jwa::Oct::new(&b"a secret that is 32 bytes long!!"[..]).unwrap();
//! let key = Jwk::from(secret)
//!     .with_key_id(KeyId::from_static("hmac"))
//!     .with_algorithm(jwa::Algorithm::HS256)
//!     .unwrap();
//!
//! let header = jws::Header::new(jws::Algorithm::HS256).with_key_id(KeyId::from_static("hmac"));
//! let token = jws::sign(&header, br#"{"sub":"alice"}"#, &key).unwrap();
//!
//! let keys = Jwks::new(vec![key]).unwrap();
//! let kid = KeyId::from_static("hmac");
//! let key = keys
//!     .get_key_or_err(&KeyCriteria::new().with_key_id(&kid))
//!     .unwrap();
//!
//! let (header, payload) = jws::verify(&token, key).unwrap();
//! assert_eq!(header.key_id().map(|k| k.as_str()), Some("hmac"));
//! assert_eq!(payload, br#"{"sub":"alice"}"#);
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
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

mod der;
pub mod error;
pub mod jwa;
pub mod jwe;
pub mod jwk;
pub mod jwks;
pub mod jws;


#[doc(inline)]
pub use jwk::Jwk;
#[doc(inline)]
pub use jwks::Jwks;
