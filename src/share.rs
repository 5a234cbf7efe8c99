//! The [`Share`] value type produced by [`crate::sss::split`], and the
//! pipe-separated metadata encoding it round-trips through.
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use rs_merkle::{algorithms::Sha256, Hasher};

use crate::error::SSSError;

/// Metadata common to every share produced by one [`crate::sss::split`] call.
///
/// Unlike [`crate::shard::ShardMetadata`], the timestamp is allowed to be
/// stamped independently per share (two shares from the same split are free
/// to be re-serialized at different times); what must agree across a usable
/// set is `threshold`, `total_shares`, `secret_size`, `secret_hash` and
/// `share_set_id`.
#[derive(Debug, Clone, PartialEq)]
pub struct ShareMetadata {
    pub threshold: u8,
    pub total_shares: u8,
    pub secret_size: usize,
    /// `SHA-256(secret)`, checked after [`crate::sss::combine`] reconstructs
    /// a candidate secret.
    pub secret_hash: [u8; 32],
    pub timestamp: DateTime<Utc>,
    /// random identifier shared by every share from the same split, so a
    /// [`crate::sss::combine`] call can reject shares drawn from unrelated
    /// splits even when their sizes happen to coincide.
    pub share_set_id: String,
}

impl ShareMetadata {
    pub fn new(
        secret: &[u8],
        threshold: u8,
        total_shares: u8,
        share_set_id: String,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let mut secret_hash = [0u8; 32];
        secret_hash.copy_from_slice(&Sha256::hash(secret));
        ShareMetadata {
            threshold,
            total_shares,
            secret_size: secret.len(),
            secret_hash,
            timestamp,
            share_set_id,
        }
    }

    /// Whether `self` and `other` could plausibly come from the same
    /// [`crate::sss::split`] call: same `threshold`, `total_shares`,
    /// `secret_size`, `secret_hash` and `share_set_id`. Unlike `==`, this
    /// ignores `timestamp`, which is allowed to differ per share.
    pub fn same_share_set(&self, other: &Self) -> bool {
        self.threshold == other.threshold
            && self.total_shares == other.total_shares
            && self.secret_size == other.secret_size
            && self.secret_hash == other.secret_hash
            && self.share_set_id == other.share_set_id
    }

    /// Encodes this metadata as base64 of the six pipe-separated fields
    /// `threshold | total_shares | secret_size | base64(secret_hash) |
    /// epoch_millis | share_set_id`.
    pub fn to_encoded(&self) -> String {
        let inner = format!(
            "{}|{}|{}|{}|{}|{}",
            self.threshold,
            self.total_shares,
            self.secret_size,
            BASE64.encode(self.secret_hash),
            self.timestamp.timestamp_millis(),
            self.share_set_id,
        );
        BASE64.encode(inner)
    }

    /// Inverse of [`ShareMetadata::to_encoded`]. Rejects anything that does
    /// not decode to exactly six pipe-separated fields, or whose hash field
    /// is not 32 bytes.
    pub fn from_encoded(encoded: &str) -> Result<Self, SSSError> {
        let inner_bytes = BASE64
            .decode(encoded)
            .map_err(|e| SSSError::InvalidShare(format!("metadata is not valid base64: {e}")))?;
        let inner = String::from_utf8(inner_bytes)
            .map_err(|_| SSSError::InvalidShare("metadata is not valid utf-8".to_string()))?;

        let fields: Vec<&str> = inner.split('|').collect();
        let [threshold, total_shares, secret_size, hash_field, millis, share_set_id] =
            <[&str; 6]>::try_from(fields).map_err(|fields| {
                SSSError::InvalidShare(format!(
                    "expected 6 metadata fields, got {}",
                    fields.len()
                ))
            })?;

        let threshold: u8 = threshold
            .parse()
            .map_err(|_| SSSError::InvalidShare("threshold is not a valid u8".to_string()))?;
        let total_shares: u8 = total_shares
            .parse()
            .map_err(|_| SSSError::InvalidShare("total_shares is not a valid u8".to_string()))?;
        let secret_size: usize = secret_size
            .parse()
            .map_err(|_| SSSError::InvalidShare("secret_size is not a valid usize".to_string()))?;
        let millis: i64 = millis
            .parse()
            .map_err(|_| SSSError::InvalidShare("timestamp is not a valid i64".to_string()))?;

        let hash_bytes = BASE64
            .decode(hash_field)
            .map_err(|e| SSSError::InvalidShare(format!("secret_hash is not valid base64: {e}")))?;
        let secret_hash: [u8; 32] = hash_bytes.try_into().map_err(|bytes: Vec<u8>| {
            SSSError::InvalidShare(format!("secret_hash must be 32 bytes, got {}", bytes.len()))
        })?;

        let timestamp = Utc
            .timestamp_millis_opt(millis)
            .single()
            .ok_or_else(|| SSSError::InvalidShare("invalid timestamp".to_string()))?;

        Ok(ShareMetadata {
            threshold,
            total_shares,
            secret_size,
            secret_hash,
            timestamp,
            share_set_id: share_set_id.to_string(),
        })
    }
}

/// One `(x, y)` point on the degree-`(k-1)` secret-sharing polynomial, `y`
/// holding one byte per secret byte (`y[b]` is the value of the byte-`b`
/// polynomial evaluated at `x`).
#[derive(Debug, Clone, PartialEq)]
pub struct Share {
    pub x: u8,
    pub y: Vec<u8>,
    pub metadata: ShareMetadata,
}
