//! JSON Web Key Sets
//!
//! A [`Jwks`] is a non-empty collection of [`Jwk`]s, each carrying a unique
//! key ID. Keys are selected with [`KeyCriteria`].

use std::{collections::HashSet, convert::TryFrom};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    error, jwa,
    jwk::{KeyIdRef, KeyType},
    Jwk,
};

/// A JSON Web Key Set (JWKS)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Value")]
pub struct Jwks {
    keys: Vec<Jwk>,
}

impl Jwks {
    /// Builds a key set
    ///
    /// # Errors
    ///
    /// `keys` is empty (`InvalidArgument`), or a key lacks a key ID or
    /// shares one with another key (`InvalidJwks`).
    pub fn new(keys: Vec<Jwk>) -> Result<Self, error::Error> {
        if keys.is_empty() {
            return Err(error::invalid_argument("a key set needs at least one key").into());
        }

        let mut seen = HashSet::with_capacity(keys.len());
        for (idx, key) in keys.iter().enumerate() {
            let kid = key
                .key_id()
                .ok_or_else(|| error::invalid_jwks(format!(r#"key {} has no "kid""#, idx)))?;

            if !seen.insert(kid) {
                return Err(error::invalid_jwks(format!(r#"duplicate "kid" "{}""#, kid)).into());
            }
        }

        Ok(Self { keys })
    }

    /// Builds a key set from a parsed `{"keys": [...]}` document
    ///
    /// Each entry is validated as a JWK; errors from an entry are returned
    /// as they are.
    ///
    /// # Errors
    ///
    /// The document has no `keys` array (`InvalidArgument`), an entry is not
    /// a valid JWK, or the keys do not form a valid set (see [`Jwks::new`]).
    pub fn load(value: &Value) -> Result<Self, error::Error> {
        let entries = value
            .get("keys")
            .and_then(Value::as_array)
            .ok_or_else(|| error::invalid_argument(r#"expected an object with a "keys" array"#))?;

        let mut keys = Vec::with_capacity(entries.len());
        for (idx, entry) in entries.iter().enumerate() {
            let key = match entry {
                Value::Object(params) => Jwk::try_from(params.clone()),
                _ => Err(error::invalid_jwks(format!("key {} is not a JSON object", idx)).into()),
            };

            match key {
                Ok(key) => keys.push(key),
                Err(err) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(index = idx, "rejected key set entry");
                    return Err(err);
                }
            }
        }

        let jwks = Self::new(keys)?;

        #[cfg(feature = "tracing")]
        tracing::debug!(keys = jwks.len(), "loaded key set");

        Ok(jwks)
    }

    /// Parses a key set from untrusted JSON text
    ///
    /// # Errors
    ///
    /// Any failure is reported as `InvalidJwks`, with the underlying
    /// JOSE error as its source.
    pub fn parse(json: &str) -> Result<Self, error::InvalidJwks> {
        let value: Value =
            serde_json::from_str(json).map_err(|_| error::invalid_jwks("malformed JSON"))?;

        Self::load(&value).map_err(|err| match err {
            error::Error::InvalidJwks(err) => err,
            err => error::invalid_jwks_caused_by("key set contains an invalid key", err),
        })
    }

    /// A view of the keys in this set
    #[must_use]
    pub fn keys(&self) -> &[Jwk] {
        &self.keys
    }

    /// The number of keys in the set
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the set is empty
    ///
    /// Always `false` for a constructed set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Iterates over the keys in the set
    pub fn iter(&self) -> std::slice::Iter<'_, Jwk> {
        self.keys.iter()
    }

    /// The first key matching every populated field of `criteria`
    #[must_use]
    pub fn get_key(&self, criteria: &KeyCriteria) -> Option<&Jwk> {
        self.keys.iter().find(|k| criteria.matches(k))
    }

    /// The first key matching every populated field of `criteria`
    ///
    /// # Errors
    ///
    /// No key matches.
    pub fn get_key_or_err(&self, criteria: &KeyCriteria) -> Result<&Jwk, error::JwkNotFound> {
        self.get_key(criteria).ok_or_else(error::jwk_not_found)
    }

    /// Strips private material from every key, for publication
    #[must_use]
    pub fn public_only(self) -> Self {
        Self {
            keys: self.keys.into_iter().map(Jwk::public_only).collect(),
        }
    }
}

impl TryFrom<Value> for Jwks {
    type Error = error::Error;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::load(&value)
    }
}

impl<'a> IntoIterator for &'a Jwks {
    type Item = &'a Jwk;
    type IntoIter = std::slice::Iter<'a, Jwk>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys.iter()
    }
}

impl IntoIterator for Jwks {
    type Item = Jwk;
    type IntoIter = std::vec::IntoIter<Jwk>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys.into_iter()
    }
}

/// Criteria for selecting a key from a [`Jwks`]
///
/// Every populated field must equal the corresponding member of the key.
/// A key that does not declare a member never matches a criterion on it.
///
/// ```
/// use jose_core::{jwa, jwks::KeyCriteria};
///
/// let criteria = KeyCriteria::new()
///     .with_algorithm(jwa::Algorithm::ES256)
///     .with_usage(jwa::Usage::Signing);
/// # let _ = criteria;
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[must_use]
pub struct KeyCriteria<'a> {
    key_id: Option<&'a KeyIdRef>,
    key_type: Option<KeyType>,
    algorithm: Option<jwa::Algorithm>,
    usage: Option<jwa::Usage>,
}

impl<'a> KeyCriteria<'a> {
    /// Criteria matching any key
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires the key ID
    pub fn with_key_id(self, kid: &'a KeyIdRef) -> Self {
        Self {
            key_id: Some(kid),
            ..self
        }
    }

    /// Requires the key type
    pub fn with_key_type(self, kty: KeyType) -> Self {
        Self {
            key_type: Some(kty),
            ..self
        }
    }

    /// Requires the declared algorithm
    pub fn with_algorithm(self, alg: impl Into<jwa::Algorithm>) -> Self {
        Self {
            algorithm: Some(alg.into()),
            ..self
        }
    }

    /// Requires the declared usage
    pub fn with_usage(self, usage: jwa::Usage) -> Self {
        Self {
            usage: Some(usage),
            ..self
        }
    }

    /// Whether `key` satisfies the criteria
    #[must_use]
    pub fn matches(&self, key: &Jwk) -> bool {
        fn check<T: PartialEq>(wanted: Option<T>, actual: Option<T>) -> bool {
            wanted.map_or(true, |w| actual == Some(w))
        }

        check(self.key_id, key.key_id())
            && check(self.key_type, Some(key.key_type()))
            && check(self.algorithm, key.algorithm())
            && check(self.usage, key.usage())
    }
}
