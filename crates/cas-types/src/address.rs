use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Content-derived key of a stored object.
///
/// An `Address` is the lowercase hex digest of a payload, prefixed by its
/// first `shard_width` hex characters as a path segment:
/// `{digest[:N]}/{digest}`. The prefix bounds the number of objects that
/// share a prefix in the backing bucket. This key form is a storage format:
/// objects written earlier are only found again if it is preserved exactly.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address {
    key: String,
    shard_width: usize,
}

impl Address {
    /// Build an address from a hex digest and a sharding prefix width.
    pub fn from_digest(digest: &str, shard_width: usize) -> Result<Self, TypeError> {
        validate_digest(digest)?;
        if shard_width == 0 || shard_width > digest.len() {
            return Err(TypeError::InvalidAddress {
                key: digest.to_string(),
                reason: format!(
                    "shard width {shard_width} outside 1..={}",
                    digest.len()
                ),
            });
        }
        Ok(Self {
            key: format!("{}/{}", &digest[..shard_width], digest),
            shard_width,
        })
    }

    /// Parse the physical key form `{prefix}/{digest}`.
    pub fn parse(key: &str) -> Result<Self, TypeError> {
        let invalid = |reason: &str| TypeError::InvalidAddress {
            key: key.to_string(),
            reason: reason.to_string(),
        };
        let (prefix, digest) = key
            .split_once('/')
            .ok_or_else(|| invalid("missing '/' separator"))?;
        if prefix.is_empty() {
            return Err(invalid("empty shard prefix"));
        }
        validate_digest(digest).map_err(|e| invalid(&e.to_string()))?;
        if !digest.starts_with(prefix) {
            return Err(invalid("shard prefix does not match digest"));
        }
        Ok(Self {
            key: key.to_string(),
            shard_width: prefix.len(),
        })
    }

    /// The full physical key, `{prefix}/{digest}`.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The lowercase hex digest.
    pub fn digest(&self) -> &str {
        &self.key[self.shard_width + 1..]
    }

    /// The sharding prefix (leading hex characters of the digest).
    pub fn prefix(&self) -> &str {
        &self.key[..self.shard_width]
    }

    /// Number of hex characters in the sharding prefix.
    pub fn shard_width(&self) -> usize {
        self.shard_width
    }

    /// Raw digest bytes.
    pub fn digest_bytes(&self) -> Vec<u8> {
        // Validated as hex on construction.
        hex::decode(self.digest()).unwrap_or_default()
    }

    /// Short hex representation (first 8 characters of the digest).
    pub fn short_hex(&self) -> &str {
        let digest = self.digest();
        &digest[..digest.len().min(8)]
    }
}

fn validate_digest(digest: &str) -> Result<(), TypeError> {
    if digest.is_empty() {
        return Err(TypeError::InvalidHex("empty digest".into()));
    }
    if digest.bytes().any(|b| b.is_ascii_uppercase()) {
        return Err(TypeError::InvalidHex(format!(
            "digest must be lowercase: {digest}"
        )));
    }
    hex::decode(digest).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
    Ok(())
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.short_hex())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

impl FromStr for Address {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = TypeError;

    fn try_from(key: String) -> Result<Self, Self::Error> {
        Self::parse(&key)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.key
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const BLOB1_SHA1: &str = "749914fd3452fc10d36ed33cbbd8be1ab72b71a6";

    #[test]
    fn from_digest_builds_sharded_key() {
        let addr = Address::from_digest(BLOB1_SHA1, 2).unwrap();
        assert_eq!(addr.prefix(), "74");
        assert_eq!(addr.digest(), BLOB1_SHA1);
        assert_eq!(addr.key(), format!("74/{BLOB1_SHA1}"));
        assert_eq!(addr.shard_width(), 2);
    }

    #[test]
    fn parse_roundtrips_key() {
        let key = format!("749/{BLOB1_SHA1}");
        let addr = Address::parse(&key).unwrap();
        assert_eq!(addr.key(), key);
        assert_eq!(addr.shard_width(), 3);
        assert_eq!(addr, Address::from_digest(BLOB1_SHA1, 3).unwrap());
    }

    #[test]
    fn parse_rejects_missing_separator() {
        let err = Address::parse(BLOB1_SHA1).unwrap_err();
        assert!(matches!(err, TypeError::InvalidAddress { .. }));
    }

    #[test]
    fn parse_rejects_mismatched_prefix() {
        let err = Address::parse(&format!("ab/{BLOB1_SHA1}")).unwrap_err();
        assert!(matches!(err, TypeError::InvalidAddress { .. }));
    }

    #[test]
    fn parse_rejects_empty_prefix() {
        assert!(Address::parse(&format!("/{BLOB1_SHA1}")).is_err());
    }

    #[test]
    fn uppercase_digest_is_rejected() {
        let upper = BLOB1_SHA1.to_uppercase();
        assert!(matches!(
            Address::from_digest(&upper, 2),
            Err(TypeError::InvalidHex(_))
        ));
    }

    #[test]
    fn non_hex_digest_is_rejected() {
        assert!(Address::from_digest("zz11", 2).is_err());
        assert_eq!(
            Address::from_digest("", 2),
            Err(TypeError::InvalidHex("empty digest".into()))
        );
    }

    #[test]
    fn shard_width_bounds() {
        assert!(Address::from_digest(BLOB1_SHA1, 0).is_err());
        assert!(Address::from_digest(BLOB1_SHA1, 41).is_err());
        assert!(Address::from_digest(BLOB1_SHA1, 40).is_ok());
    }

    #[test]
    fn display_is_key_and_debug_is_short() {
        let addr = Address::from_digest(BLOB1_SHA1, 2).unwrap();
        assert_eq!(format!("{addr}"), addr.key());
        assert_eq!(format!("{addr:?}"), "Address(749914fd)");
    }

    #[test]
    fn serde_uses_key_string() {
        let addr = Address::from_digest(BLOB1_SHA1, 2).unwrap();
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"74/{BLOB1_SHA1}\""));
        let parsed: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, addr);
    }

    #[test]
    fn serde_rejects_malformed_key() {
        let result: Result<Address, _> = serde_json::from_str("\"not-an-address\"");
        assert!(result.is_err());
    }

    #[test]
    fn digest_bytes_decodes_hex() {
        let addr = Address::from_digest("00ff", 1).unwrap();
        assert_eq!(addr.digest_bytes(), vec![0x00, 0xff]);
    }

    proptest! {
        #[test]
        fn parse_accepts_every_built_key(bytes in proptest::collection::vec(any::<u8>(), 20..=32), width in 1usize..=8) {
            let digest = hex::encode(&bytes);
            let addr = Address::from_digest(&digest, width).unwrap();
            let parsed = Address::parse(addr.key()).unwrap();
            prop_assert_eq!(parsed.digest(), digest.as_str());
            prop_assert_eq!(parsed, addr);
        }
    }
}
