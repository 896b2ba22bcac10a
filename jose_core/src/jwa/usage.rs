use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error;

/// The intended use for a JWA
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[must_use]
pub enum Usage {
    /// The JWA is intended signing and verification
    #[serde(rename = "sig")]
    Signing,

    /// The JWA is intended for encryption
    #[serde(rename = "enc")]
    Encryption,
}

impl Usage {
    /// Whether a key declared for this usage may perform `op`
    #[must_use]
    pub fn allows(self, op: KeyOperation) -> bool {
        use KeyOperation::*;

        match self {
            Self::Signing => matches!(op, Sign | Verify),
            Self::Encryption => matches!(
                op,
                Encrypt | Decrypt | WrapKey | UnwrapKey | DeriveKey | DeriveBits
            ),
        }
    }

    /// The name of the usage as it appears in a JWK
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Signing => "sig",
            Self::Encryption => "enc",
        }
    }
}

impl fmt::Display for Usage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Usage {
    type Err = error::InvalidJwk;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sig" => Ok(Self::Signing),
            "enc" => Ok(Self::Encryption),
            _ => Err(error::invalid_parameter("use")),
        }
    }
}

/// An operation that a key may be used for
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[must_use]
pub enum KeyOperation {
    /// Compute a digital signature or MAC
    Sign,
    /// Verify a digital signature or MAC
    Verify,
    /// Encrypt content
    Encrypt,
    /// Decrypt content and validate decryption
    Decrypt,
    /// Encrypt a key
    WrapKey,
    /// Decrypt a key and validate decryption
    UnwrapKey,
    /// Derive a key
    DeriveKey,
    /// Derive bits not to be used as a key
    DeriveBits,
}

impl KeyOperation {
    /// The name of the operation as it appears in a JWK
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sign => "sign",
            Self::Verify => "verify",
            Self::Encrypt => "encrypt",
            Self::Decrypt => "decrypt",
            Self::WrapKey => "wrapKey",
            Self::UnwrapKey => "unwrapKey",
            Self::DeriveKey => "deriveKey",
            Self::DeriveBits => "deriveBits",
        }
    }
}

impl fmt::Display for KeyOperation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyOperation {
    type Err = error::InvalidJwk;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "sign" => Self::Sign,
            "verify" => Self::Verify,
            "encrypt" => Self::Encrypt,
            "decrypt" => Self::Decrypt,
            "wrapKey" => Self::WrapKey,
            "unwrapKey" => Self::UnwrapKey,
            "deriveKey" => Self::DeriveKey,
            "deriveBits" => Self::DeriveBits,
            _ => return Err(error::invalid_parameter("key_ops")),
        })
    }
}

/// A set of distinct key operations, in declaration order
///
/// An empty set is valid and permits no operation.
#[derive(Debug, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<KeyOperation>", into = "Vec<KeyOperation>")]
#[must_use]
pub struct KeyOperations(Vec<KeyOperation>);

impl KeyOperations {
    /// Builds the set, rejecting duplicates
    ///
    /// # Errors
    ///
    /// `ops` names the same operation twice.
    pub fn new(ops: impl IntoIterator<Item = KeyOperation>) -> Result<Self, error::InvalidJwk> {
        let mut seen = Vec::new();
        for op in ops {
            if seen.contains(&op) {
                return Err(error::invalid_parameter("key_ops"));
            }
            seen.push(op);
        }

        Ok(Self(seen))
    }

    /// Whether the set includes `op`
    #[must_use]
    pub fn contains(&self, op: KeyOperation) -> bool {
        self.0.contains(&op)
    }

    /// Whether every operation is permitted under `usage`
    #[must_use]
    pub fn is_compatible_with(&self, usage: Usage) -> bool {
        self.0.iter().all(|&op| usage.allows(op))
    }

    /// Iterates over the operations
    pub fn iter(&self) -> impl Iterator<Item = KeyOperation> + '_ {
        self.0.iter().copied()
    }

    /// The operations as a slice
    #[must_use]
    pub fn as_slice(&self) -> &[KeyOperation] {
        &self.0
    }
}

impl std::convert::TryFrom<Vec<KeyOperation>> for KeyOperations {
    type Error = error::InvalidJwk;

    fn try_from(ops: Vec<KeyOperation>) -> Result<Self, Self::Error> {
        Self::new(ops)
    }
}

impl From<KeyOperations> for Vec<KeyOperation> {
    fn from(ops: KeyOperations) -> Self {
        ops.0
    }
}
