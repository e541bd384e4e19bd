use cas_types::{Address, HashAlgorithm};
use sha1::{Digest, Sha1};
use sha2::Sha256;

/// Default number of hex characters used as the sharding prefix.
pub const DEFAULT_SHARD_WIDTH: usize = 2;

/// Derives sharded addresses from payload bytes.
///
/// Pure and deterministic: the same payload always yields the same
/// [`Address`] for a given algorithm and shard width. Both are fixed at
/// construction; there is no way to change them on a live addresser.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContentAddresser {
    algorithm: HashAlgorithm,
    shard_width: usize,
}

impl ContentAddresser {
    /// Create an addresser, rejecting a shard width of zero or one wider
    /// than the algorithm's hex digest.
    pub fn new(algorithm: HashAlgorithm, shard_width: usize) -> Result<Self, AddresserError> {
        if shard_width == 0 || shard_width > algorithm.hex_len() {
            return Err(AddresserError::InvalidShardWidth {
                width: shard_width,
                max: algorithm.hex_len(),
            });
        }
        Ok(Self {
            algorithm,
            shard_width,
        })
    }

    /// The hash algorithm in use.
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// The sharding prefix width in hex characters.
    pub fn shard_width(&self) -> usize {
        self.shard_width
    }

    /// Raw digest bytes of a payload.
    pub fn digest(&self, payload: &[u8]) -> Vec<u8> {
        match self.algorithm {
            HashAlgorithm::Sha1 => Sha1::digest(payload).to_vec(),
            HashAlgorithm::Sha256 => Sha256::digest(payload).to_vec(),
            HashAlgorithm::Blake3 => blake3::hash(payload).as_bytes().to_vec(),
        }
    }

    /// Lowercase hex digest of a payload.
    pub fn hex_digest(&self, payload: &[u8]) -> String {
        hex::encode(self.digest(payload))
    }

    /// Compute the sharded address of a payload.
    pub fn address(&self, payload: &[u8]) -> Address {
        let digest = self.hex_digest(payload);
        let prefix = &digest[..self.shard_width];
        // The digest is lowercase hex of the algorithm's length and the width
        // was bounded in `new`, so the key is always well formed.
        Address::parse(&format!("{prefix}/{digest}"))
            .unwrap_or_else(|e| unreachable!("addresser produced invalid key: {e}"))
    }

    /// Verify that a payload hashes to the given address.
    ///
    /// Addresses with a different shard width still verify if the digests
    /// match.
    pub fn verify(&self, payload: &[u8], address: &Address) -> bool {
        address.digest().len() == self.algorithm.hex_len()
            && self.hex_digest(payload) == address.digest()
    }
}

impl Default for ContentAddresser {
    fn default() -> Self {
        Self {
            algorithm: HashAlgorithm::default(),
            shard_width: DEFAULT_SHARD_WIDTH,
        }
    }
}

/// Errors from addresser construction.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AddresserError {
    #[error("shard width {width} must be between 1 and {max}")]
    InvalidShardWidth { width: usize, max: usize },
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const BLOB1_SHA1: &str = "749914fd3452fc10d36ed33cbbd8be1ab72b71a6";
    const BLOB1_SHA256: &str = "8ba0d06bc5a88966b1f681d9cab28709781ad7c450802d0e477132d8919e0cbf";
    const EMPTY_SHA1: &str = "da39a3ee5e6b4b0d3255bfef95601890afd80709";

    #[test]
    fn default_is_sha1_width_two() {
        let addresser = ContentAddresser::default();
        assert_eq!(addresser.algorithm(), HashAlgorithm::Sha1);
        assert_eq!(addresser.shard_width(), 2);
    }

    #[test]
    fn sha1_address_matches_known_digest() {
        let addr = ContentAddresser::default().address(b"blob1");
        assert_eq!(addr.digest(), BLOB1_SHA1);
        assert_eq!(addr.key(), format!("74/{BLOB1_SHA1}"));
    }

    #[test]
    fn sha256_address_matches_known_digest() {
        let addresser = ContentAddresser::new(HashAlgorithm::Sha256, 3).unwrap();
        let addr = addresser.address(b"blob1");
        assert_eq!(addr.digest(), BLOB1_SHA256);
        assert_eq!(addr.prefix(), "8ba");
    }

    #[test]
    fn blake3_digest_has_expected_length() {
        let addresser = ContentAddresser::new(HashAlgorithm::Blake3, 2).unwrap();
        let addr = addresser.address(b"blob1");
        assert_eq!(addr.digest().len(), 64);
        assert_eq!(addr.digest(), blake3::hash(b"blob1").to_hex().as_str());
    }

    #[test]
    fn empty_payload_is_addressable() {
        let addr = ContentAddresser::default().address(b"");
        assert_eq!(addr.digest(), EMPTY_SHA1);
    }

    #[test]
    fn different_payloads_produce_different_addresses() {
        let addresser = ContentAddresser::default();
        assert_ne!(addresser.address(b"blob1"), addresser.address(b"blob2"));
    }

    #[test]
    fn rejects_zero_shard_width() {
        assert_eq!(
            ContentAddresser::new(HashAlgorithm::Sha1, 0),
            Err(AddresserError::InvalidShardWidth { width: 0, max: 40 })
        );
    }

    #[test]
    fn rejects_shard_width_wider_than_digest() {
        assert!(ContentAddresser::new(HashAlgorithm::Sha1, 41).is_err());
        assert!(ContentAddresser::new(HashAlgorithm::Sha256, 64).is_ok());
    }

    #[test]
    fn verify_correct_and_tampered() {
        let addresser = ContentAddresser::default();
        let addr = addresser.address(b"original");
        assert!(addresser.verify(b"original", &addr));
        assert!(!addresser.verify(b"tampered", &addr));
    }

    #[test]
    fn verify_ignores_shard_width() {
        let narrow = ContentAddresser::new(HashAlgorithm::Sha1, 1).unwrap();
        let wide = ContentAddresser::new(HashAlgorithm::Sha1, 4).unwrap();
        let addr = narrow.address(b"payload");
        assert!(wide.verify(b"payload", &addr));
    }

    #[test]
    fn verify_rejects_other_algorithm() {
        let sha1 = ContentAddresser::default();
        let sha256 = ContentAddresser::new(HashAlgorithm::Sha256, 2).unwrap();
        let addr = sha256.address(b"payload");
        assert!(!sha1.verify(b"payload", &addr));
    }

    proptest! {
        #[test]
        fn address_is_deterministic(payload in proptest::collection::vec(any::<u8>(), 0..512)) {
            let addresser = ContentAddresser::default();
            let a = addresser.address(&payload);
            let b = addresser.address(&payload);
            prop_assert_eq!(&a, &b);
            prop_assert_eq!(a.prefix(), &a.digest()[..2]);
            prop_assert!(addresser.verify(&payload, &a));
        }
    }
}
