//! The Reed-Solomon erasure-coding engine: turns a byte slice into `k + m`
//! shards per chunk, any `k` of which reconstruct the chunk.
//!
//! Encoding is systematic: data shards are verbatim slices of the payload,
//! and each column's `m` parity bytes come from dividing the column
//! (shifted into the high `k` coefficient positions of a length-`(k+m)`
//! buffer) by the generator polynomial and keeping the remainder — the
//! classic CD/QR-code construction. That makes the transmitted symbols the
//! *coefficients* of a degree-`<(k+m)` codeword polynomial divisible by the
//! generator, not evaluations of a degree-`<k` message polynomial at `k+m`
//! points. The decoder's erasure-correction step is built to match: it
//! solves the generator's root relations (`codeword(a^t) = 0` for
//! `t = 0..m`) for the missing coefficients directly, rather than inverting
//! a Vandermonde minor indexed by data-shard position. The two must use the
//! same codeword convention to agree; see `DESIGN.md` for the reasoning.
use std::collections::BTreeMap;

use chrono::Utc;
use rs_merkle::{algorithms::Sha256, Hasher};
use tracing::{debug, info, warn};

use crate::config::EncodingConfig;
use crate::error::ReconstructionError;
use crate::gf256::Gf256;
use crate::linalg::Matrix;
use crate::poly;
use crate::shard::{ReconstructionResult, Shard, ShardMetadata};

/// Maps a codeword coefficient position (`0..k+m`, low-to-high) to the
/// `within_chunk_index` used by [`Shard::index`]: the low `m` positions are
/// parity (`within = k + pos`), the high `k` positions are data, shifted
/// down by `m` (`within = pos - m`).
fn codeword_pos_to_within(pos: usize, k: usize, m: usize) -> usize {
    if pos < m {
        k + pos
    } else {
        pos - m
    }
}

/// Inverse of [`codeword_pos_to_within`].
#[cfg(test)]
fn within_to_codeword_pos(within: usize, k: usize, m: usize) -> usize {
    if within < k {
        m + within
    } else {
        within - k
    }
}

/// `parity[p]` for `p in 0..m`: divides `column` (in the high `k`
/// coefficient positions of a length-`(k+m)` buffer) by `generator` and
/// returns the remainder, zero-padded to exactly `m` coefficients.
fn systematic_parity(
    column: &[Gf256],
    generator: &[Gf256],
) -> Result<Vec<Gf256>, ReconstructionError> {
    let m = generator.len() - 1;
    let k = column.len();
    let mut buffer = vec![Gf256::ZERO; m + k];
    buffer[m..].copy_from_slice(column);

    let (_, remainder) = poly::divmod(&buffer, generator)?;
    let mut parity = vec![Gf256::ZERO; m];
    parity[..remainder.len().min(m)].copy_from_slice(&remainder[..remainder.len().min(m)]);
    Ok(parity)
}

/// Splits `data` into `k + m` shards per chunk, per `config`. `data` is
/// zero-padded up to a multiple of `k * shard_size` before chunking; the
/// padding is dropped again on decode, via the recorded original length.
pub fn encode(data: &[u8], config: EncodingConfig) -> Result<Vec<Shard>, ReconstructionError> {
    if data.is_empty() {
        return Err(ReconstructionError::InvalidConfiguration(
            "cannot encode empty data".to_string(),
        ));
    }

    let k = config.data_shards() as usize;
    let m = config.parity_shards() as usize;
    let s = config.shard_size();
    let chunk_len = k * s;

    let metadata = ShardMetadata::new(data, config, Utc::now());

    let num_chunks = (data.len() + chunk_len - 1) / chunk_len;
    let mut padded = data.to_vec();
    padded.resize(num_chunks * chunk_len, 0);

    let generator = poly::generator(m);
    let mut shards = Vec::with_capacity(num_chunks * (k + m));

    for c in 0..num_chunks {
        let chunk = &padded[c * chunk_len..(c + 1) * chunk_len];

        let mut parity = vec![vec![0u8; s]; m];
        for b in 0..s {
            let column: Vec<Gf256> = (0..k)
                .map(|j| Gf256::new(chunk[j * s + b]))
                .collect();
            let parity_column = systematic_parity(&column, &generator)?;
            for p in 0..m {
                parity[p][b] = parity_column[p].0;
            }
        }

        for j in 0..k {
            shards.push(Shard {
                index: (c * (k + m) + j) as u32,
                data: chunk[j * s..(j + 1) * s].to_vec(),
                metadata: metadata.clone(),
            });
        }
        for (p, parity_data) in parity.into_iter().enumerate() {
            shards.push(Shard {
                index: (c * (k + m) + k + p) as u32,
                data: parity_data,
                metadata: metadata.clone(),
            });
        }

        debug!(chunk = c, shards = k + m, "encoded chunk");
    }

    info!(
        bytes = data.len(),
        shards = shards.len(),
        chunks = num_chunks,
        "reed-solomon encode complete"
    );
    Ok(shards)
}

/// Like [`encode`], but shrinks `config`'s shard size down to
/// `ceil(data.len() / k)` first, so a payload smaller than `k * shard_size`
/// produces exactly one chunk instead of padding out to the configured
/// shard size, at the cost of that chunk's shard size no longer matching
/// `config`.
pub fn encode_compact(data: &[u8], config: EncodingConfig) -> Result<Vec<Shard>, ReconstructionError> {
    if data.is_empty() {
        return Err(ReconstructionError::InvalidConfiguration(
            "cannot encode empty data".to_string(),
        ));
    }
    let k = config.data_shards() as usize;
    let shard_size = (data.len() + k - 1) / k;
    encode(data, config.with_shard_size(shard_size.max(1)))
}

/// `true` iff `shards` contains, for every chunk implied by the shared
/// metadata's `original_size`. Deliberately the same cheap, approximate
/// check the external interface specifies (`|shards| >= k`) rather than a
/// full per-chunk validation — [`decode`] is the authority on whether a
/// given shard set actually reconstructs.
pub fn can_reconstruct(shards: &[Shard], config: &EncodingConfig) -> bool {
    shards.len() >= config.data_shards() as usize
}

/// Recovers one chunk's `k * shard_size` bytes from `present`, keyed by
/// within-chunk index. Requires at least `k` entries.
fn reconstruct_chunk(
    present: &BTreeMap<usize, &Shard>,
    k: usize,
    m: usize,
    shard_size: usize,
    chunk: u64,
) -> Result<Vec<u8>, ReconstructionError> {
    if present.len() < k {
        return Err(ReconstructionError::InsufficientShards {
            got: present.len(),
            needed: k,
            chunk: chunk as usize,
        });
    }

    if (0..k).all(|j| present.contains_key(&j)) {
        let mut out = Vec::with_capacity(k * shard_size);
        for j in 0..k {
            out.extend_from_slice(&present[&j].data);
        }
        return Ok(out);
    }

    let n = k + m;
    let erasures: Vec<usize> = (0..n)
        .filter(|&pos| !present.contains_key(&codeword_pos_to_within(pos, k, m)))
        .collect();
    let known_positions: Vec<usize> = (0..n).filter(|pos| !erasures.contains(pos)).collect();

    let erasure_points: Vec<Gf256> = erasures.iter().map(|&pos| Gf256::exp_of(pos as u32)).collect();
    let w_inv = Matrix::vandermonde_from_points(&erasure_points, erasures.len()).invert()?;

    let mut out = vec![0u8; k * shard_size];
    for b in 0..shard_size {
        let mut codeword = vec![Gf256::ZERO; n];
        for &pos in &known_positions {
            let within = codeword_pos_to_within(pos, k, m);
            codeword[pos] = Gf256::new(present[&within].data[b]);
        }

        let mut rhs = vec![Gf256::ZERO; erasures.len()];
        for &pos in &known_positions {
            let point = Gf256::exp_of(pos as u32);
            let mut power = Gf256::ONE;
            for slot in rhs.iter_mut() {
                *slot += codeword[pos].mul(power);
                power = power.mul(point);
            }
        }
        let recovered = w_inv.mul_vec(&rhs)?;
        for (idx, &pos) in erasures.iter().enumerate() {
            codeword[pos] = recovered[idx];
        }

        for j in 0..k {
            out[j * shard_size + b] = codeword[m + j].0;
        }
    }

    Ok(out)
}

/// Reconstructs the original payload from `shards`. All shards must carry
/// identical metadata (they must come from the same [`encode`] call). A
/// chunk short of `k` surviving shards fails the whole decode outright
/// ([`ReconstructionResult::Failure`]) regardless of how many earlier chunks
/// already reconstructed; other per-chunk failures still yield
/// [`ReconstructionResult::Partial`] when a non-empty prefix was recovered.
pub fn decode(shards: Vec<Shard>) -> ReconstructionResult {
    let Some(first) = shards.first() else {
        return ReconstructionResult::Failure(ReconstructionError::InsufficientShards {
            got: 0,
            needed: 1,
            chunk: 0,
        });
    };
    let metadata = first.metadata.clone();
    if shards.iter().any(|s| s.metadata != metadata) {
        warn!("shard set metadata disagrees, refusing to decode");
        return ReconstructionResult::Failure(ReconstructionError::InvalidConfiguration(
            "shard metadata disagrees across the provided set".to_string(),
        ));
    }

    let k = metadata.config.data_shards() as usize;
    let m = metadata.config.parity_shards() as usize;
    let total = (k + m) as u32;
    let shard_size = metadata.config.shard_size();

    let mut by_chunk: BTreeMap<u32, BTreeMap<usize, &Shard>> = BTreeMap::new();
    for s in &shards {
        by_chunk
            .entry(s.index / total)
            .or_default()
            .insert((s.index % total) as usize, s);
    }

    let chunk_bytes = (k * shard_size) as u64;
    let num_chunks = ((metadata.original_size + chunk_bytes - 1) / chunk_bytes).max(1);

    let empty = BTreeMap::new();
    let mut recovered = Vec::with_capacity((num_chunks * chunk_bytes) as usize);
    let mut failure = None;

    for c in 0..num_chunks {
        let present = by_chunk.get(&(c as u32)).unwrap_or(&empty);
        match reconstruct_chunk(present, k, m, shard_size, c) {
            Ok(bytes) => recovered.extend(bytes),
            Err(err) => {
                warn!(chunk = c, %err, "chunk failed to reconstruct");
                failure = Some(err);
                break;
            }
        }
    }

    match failure {
        Some(err @ ReconstructionError::InsufficientShards { .. }) => {
            ReconstructionResult::Failure(err)
        }
        Some(err) => {
            if recovered.is_empty() {
                ReconstructionResult::Failure(err)
            } else {
                ReconstructionResult::Partial {
                    recovered,
                    total: metadata.original_size,
                }
            }
        }
        None => {
            recovered.truncate(metadata.original_size as usize);
            let checksum = hex::encode(Sha256::hash(&recovered));
            if checksum == metadata.checksum {
                info!(bytes = recovered.len(), "reed-solomon decode succeeded");
                ReconstructionResult::Success(recovered)
            } else {
                ReconstructionResult::Failure(ReconstructionError::CorruptedShards)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EncodingConfig {
        EncodingConfig::new(4, 2, 16).unwrap()
    }

    #[test]
    fn round_trips_with_no_losses() {
        let data = b"the quick brown fox jumps over the lazy dog, repeatedly".to_vec();
        let shards = encode(&data, config()).unwrap();
        assert_eq!(shards.len(), 6);
        match decode(shards) {
            ReconstructionResult::Success(out) => assert_eq!(out, data),
            other => panic!("expected success, got {other:?}"),
        }
    }

    #[test]
    fn tolerates_m_erasures_including_data_shards() {
        let data = b"erasure-tolerant systematic reed-solomon codes".to_vec();
        let mut shards = encode(&data, config()).unwrap();
        // drop one data shard and one parity shard: still exactly k = 4 left.
        shards.retain(|s| s.index != 1 && s.index != 5);
        assert_eq!(shards.len(), 4);
        match decode(shards) {
            ReconstructionResult::Success(out) => assert_eq!(out, data),
            other => panic!("expected success, got {other:?}"),
        }
    }

    #[test]
    fn too_many_losses_fail_cleanly() {
        let data = b"not enough shards survive this one".to_vec();
        let mut shards = encode(&data, config()).unwrap();
        shards.retain(|s| ![0, 1, 2].contains(&s.index));
        assert!(matches!(
            decode(shards),
            ReconstructionResult::Failure(ReconstructionError::InsufficientShards { .. })
        ));
    }

    #[test]
    fn tampered_data_is_caught_by_checksum() {
        let data = b"integrity matters even when all shards are present".to_vec();
        let mut shards = encode(&data, config()).unwrap();
        shards[0].data[0] ^= 0xFF;
        assert!(matches!(
            decode(shards),
            ReconstructionResult::Failure(ReconstructionError::CorruptedShards)
        ));
    }

    #[test]
    fn multi_chunk_round_trip() {
        let data: Vec<u8> = (0..500u32).map(|i| (i % 251) as u8).collect();
        let cfg = EncodingConfig::new(4, 2, 16).unwrap();
        let shards = encode(&data, cfg).unwrap();
        assert!(shards.len() > 6);
        match decode(shards) {
            ReconstructionResult::Success(out) => assert_eq!(out, data),
            other => panic!("expected success, got {other:?}"),
        }
    }

    #[test]
    fn later_chunk_insufficiency_fails_whole_decode() {
        let data: Vec<u8> = (0..500u32).map(|i| (i % 251) as u8).collect();
        let cfg = EncodingConfig::new(4, 2, 16).unwrap();
        let mut shards = encode(&data, cfg).unwrap();
        assert!(shards.len() > 12, "need at least two full chunks");
        // second chunk (indices 6..12) loses three of its six shards.
        shards.retain(|s| !(6..9).contains(&s.index));
        assert!(matches!(
            decode(shards),
            ReconstructionResult::Failure(ReconstructionError::InsufficientShards { .. })
        ));
    }

    #[test]
    fn encode_compact_shrinks_to_one_chunk() {
        let data = b"tiny".to_vec();
        let cfg = EncodingConfig::new(4, 2, 8192).unwrap();
        let shards = encode_compact(&data, cfg).unwrap();
        assert_eq!(shards.len(), 6);
        assert_eq!(shards[0].metadata.config.shard_size(), 1);
        match decode(shards) {
            ReconstructionResult::Success(out) => assert_eq!(out, data),
            other => panic!("expected success, got {other:?}"),
        }
    }

    #[test]
    fn can_reconstruct_checks_shard_count_against_k() {
        let cfg = EncodingConfig::new(4, 2, 16).unwrap();
        let data = b"whatever, it's a count check".to_vec();
        let shards = encode(&data, cfg).unwrap();
        assert!(can_reconstruct(&shards, &cfg));
        assert!(!can_reconstruct(&shards[..3], &cfg));
    }

    #[test]
    fn within_and_codeword_position_are_inverses() {
        let (k, m) = (4, 2);
        for within in 0..(k + m) {
            let pos = within_to_codeword_pos(within, k, m);
            assert_eq!(codeword_pos_to_within(pos, k, m), within);
        }
    }
}
