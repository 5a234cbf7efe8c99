//! The [`Shard`] value type and its metadata, plus the binary record layout
//! shards round-trip through.
use chrono::{DateTime, TimeZone, Utc};
use rs_merkle::{algorithms::Sha256, Hasher};

use crate::config::EncodingConfig;
use crate::error::ReconstructionError;

/// Metadata shared by every shard produced from a single [`crate::rs::encode`]
/// call. Used only by the decoder, to validate that a set of shards all come
/// from the same encoding and to re-trim padding after reconstruction.
#[derive(Debug, Clone, PartialEq)]
pub struct ShardMetadata {
    pub original_size: u64,
    pub config: EncodingConfig,
    /// lowercase hex encoding of `SHA-256(original)`.
    pub checksum: String,
    pub timestamp: DateTime<Utc>,
    pub chunk_index: Option<u32>,
}

impl ShardMetadata {
    pub fn new(original: &[u8], config: EncodingConfig, timestamp: DateTime<Utc>) -> Self {
        ShardMetadata {
            original_size: original.len() as u64,
            config,
            checksum: hex::encode(Sha256::hash(original)),
            timestamp,
            chunk_index: None,
        }
    }
}

/// One of the `k + m` shards produced from a chunk of the original data,
/// either a *data shard* (a verbatim slice of the payload) or a *parity
/// shard* (a linear combination over GF(2⁸)).
#[derive(Debug, Clone, PartialEq)]
pub struct Shard {
    /// the global index across all chunks:
    /// `chunk_index * total_shards + within_chunk_index`.
    pub index: u32,
    pub data: Vec<u8>,
    pub metadata: ShardMetadata,
}

impl Shard {
    /// `true` iff this shard is one of the `k` data shards (as opposed to
    /// one of the `m` parity shards) of its chunk.
    pub fn is_data_shard(&self) -> bool {
        let total = self.metadata.config.total_shards() as u32;
        (self.index % total) < self.metadata.config.data_shards() as u32
    }

    /// Serializes this shard to its binary record layout:
    /// `index (u32 BE) | shard_size (u32 BE) | data | original_size (u64 BE)
    /// | data_shards (u32 BE) | parity_shards (u32 BE) | configured_shard_size
    /// (u32 BE) | chunk_index_present (u8) | chunk_index (u32 BE, if present)
    /// | checksum_len (u16 BE) | checksum bytes | timestamp_millis (i64 BE)`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.data.len() + 64);
        out.extend_from_slice(&self.index.to_be_bytes());
        out.extend_from_slice(&(self.data.len() as u32).to_be_bytes());
        out.extend_from_slice(&self.data);

        out.extend_from_slice(&self.metadata.original_size.to_be_bytes());
        out.extend_from_slice(&(self.metadata.config.data_shards() as u32).to_be_bytes());
        out.extend_from_slice(&(self.metadata.config.parity_shards() as u32).to_be_bytes());
        out.extend_from_slice(&(self.metadata.config.shard_size() as u32).to_be_bytes());

        match self.metadata.chunk_index {
            Some(chunk) => {
                out.push(1);
                out.extend_from_slice(&chunk.to_be_bytes());
            }
            None => out.push(0),
        }

        let checksum_bytes = self.metadata.checksum.as_bytes();
        out.extend_from_slice(&(checksum_bytes.len() as u16).to_be_bytes());
        out.extend_from_slice(checksum_bytes);

        out.extend_from_slice(&self.metadata.timestamp.timestamp_millis().to_be_bytes());

        out
    }

    /// Inverse of [`Shard::to_bytes`]. Any truncated or malformed trailer is
    /// reported as [`ReconstructionError::InvalidConfiguration`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Shard, ReconstructionError> {
        let mut cursor = Cursor::new(bytes);

        let index = cursor.take_u32()?;
        let shard_size = cursor.take_u32()? as usize;
        let data = cursor.take_bytes(shard_size)?.to_vec();

        let original_size = cursor.take_u64()?;
        let data_shards = cursor.take_u32()? as u8;
        let parity_shards = cursor.take_u32()? as u8;
        let configured_shard_size = cursor.take_u32()? as usize;
        let config = EncodingConfig::new(data_shards, parity_shards, configured_shard_size)?
            .with_shard_size(configured_shard_size);

        let chunk_present = cursor.take_u8()?;
        let chunk_index = if chunk_present == 1 {
            Some(cursor.take_u32()?)
        } else {
            None
        };

        let checksum_len = cursor.take_u16()? as usize;
        let checksum = String::from_utf8(cursor.take_bytes(checksum_len)?.to_vec()).map_err(|_| {
            ReconstructionError::InvalidConfiguration("checksum is not valid utf-8".to_string())
        })?;

        let timestamp_millis = cursor.take_i64()?;
        let timestamp = Utc
            .timestamp_millis_opt(timestamp_millis)
            .single()
            .ok_or_else(|| {
                ReconstructionError::InvalidConfiguration("invalid timestamp".to_string())
            })?;

        Ok(Shard {
            index,
            data,
            metadata: ShardMetadata {
                original_size,
                config,
                checksum,
                timestamp,
                chunk_index,
            },
        })
    }
}

/// A tiny big-endian cursor over a byte slice, used only by
/// [`Shard::from_bytes`] to keep the field-by-field parsing linear and
/// bounds-checked.
struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Cursor { bytes, pos: 0 }
    }

    fn take_bytes(&mut self, n: usize) -> Result<&'a [u8], ReconstructionError> {
        let end = self.pos.checked_add(n).ok_or_else(too_short)?;
        let slice = self.bytes.get(self.pos..end).ok_or_else(too_short)?;
        self.pos = end;
        Ok(slice)
    }

    fn take_u8(&mut self) -> Result<u8, ReconstructionError> {
        Ok(self.take_bytes(1)?[0])
    }

    fn take_u16(&mut self) -> Result<u16, ReconstructionError> {
        let b = self.take_bytes(2)?;
        Ok(u16::from_be_bytes(b.try_into().unwrap()))
    }

    fn take_u32(&mut self) -> Result<u32, ReconstructionError> {
        let b = self.take_bytes(4)?;
        Ok(u32::from_be_bytes(b.try_into().unwrap()))
    }

    fn take_u64(&mut self) -> Result<u64, ReconstructionError> {
        let b = self.take_bytes(8)?;
        Ok(u64::from_be_bytes(b.try_into().unwrap()))
    }

    fn take_i64(&mut self) -> Result<i64, ReconstructionError> {
        let b = self.take_bytes(8)?;
        Ok(i64::from_be_bytes(b.try_into().unwrap()))
    }
}

fn too_short() -> ReconstructionError {
    ReconstructionError::InvalidConfiguration("shard record is truncated".to_string())
}

/// The outcome of a [`crate::rs::decode`] call.
#[derive(Debug, Clone, PartialEq)]
pub enum ReconstructionResult {
    Success(Vec<u8>),
    Failure(ReconstructionError),
    /// a partial reconstruction: some chunks succeeded, the overall result
    /// did not. `recovered` holds what could be pieced together and `total`
    /// is the original size that was being targeted.
    Partial { recovered: Vec<u8>, total: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EncodingConfig {
        EncodingConfig::new(4, 2, 8).unwrap()
    }

    #[test]
    fn shard_round_trips_through_bytes() {
        let metadata = ShardMetadata::new(b"hello world!", config(), Utc::now());
        let shard = Shard {
            index: 3,
            data: vec![1, 2, 3, 4, 5, 6, 7, 8],
            metadata,
        };

        let bytes = shard.to_bytes();
        let back = Shard::from_bytes(&bytes).unwrap();
        assert_eq!(shard, back);
    }

    #[test]
    fn from_bytes_rejects_truncated_input() {
        let metadata = ShardMetadata::new(b"hi", config(), Utc::now());
        let shard = Shard {
            index: 0,
            data: vec![1, 2, 3, 4, 5, 6, 7, 8],
            metadata,
        };
        let mut bytes = shard.to_bytes();
        bytes.truncate(bytes.len() - 5);
        assert!(Shard::from_bytes(&bytes).is_err());
    }

    #[test]
    fn is_data_shard_respects_position() {
        let metadata = ShardMetadata::new(b"abc", config(), Utc::now());
        let data_shard = Shard {
            index: 2,
            data: vec![0; 8],
            metadata: metadata.clone(),
        };
        let parity_shard = Shard {
            index: 4,
            data: vec![0; 8],
            metadata,
        };
        assert!(data_shard.is_data_shard());
        assert!(!parity_shard.is_data_shard());
    }
}
