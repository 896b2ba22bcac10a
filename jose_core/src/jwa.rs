//! Implementations of the JSON Web Algorithms (JWA) standard
//!
//! The specifications for this standard can be found in [RFC7518][].
//!
//! Each key family lives in its own module and implements the [`jws`] and
//! [`jwe`] traits for the algorithms it supports:
//!
//! * [`ec`]: ES256, ES384 and ES512 on the P-256, P-384 and P-521 curves
//! * [`rsa`]: RS\*, PS\* and the RSA1_5 / RSA-OAEP key management family
//! * [`oct`]: HS\*, AES key wrap and direct key agreement
//!
//! Asymmetric keys additionally import from and export to DER and PEM
//! containers using [`ExportOptions`].
//!
//! [RFC7518]: https://tools.ietf.org/html/rfc7518
//! [`jws`]: crate::jws
//! [`jwe`]: crate::jwe

mod algorithm;
pub mod ec;
mod export;
pub mod oct;
pub mod rsa;
mod usage;

pub use algorithm::Algorithm;
#[doc(no_inline)]
pub use ec::EllipticCurve;
pub use export::{ExportOptions, ExportedKey, KeyEncoding, KeyFormat, KeyVisibility};
#[doc(no_inline)]
pub use oct::Oct;
#[doc(no_inline)]
pub use rsa::Rsa;
pub use usage::{KeyOperation, KeyOperations, Usage};
