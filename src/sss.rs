//! Shamir secret sharing over GF(2⁸): splits a secret into `n` shares, any
//! `k` of which reconstruct it, while any fewer reveal nothing about it.
//!
//! Each secret byte gets its own independent degree-`(k-1)` polynomial with
//! that byte as the constant term; a share's `y[b]` is that polynomial
//! evaluated at the share's `x`. Reconstruction is Lagrange interpolation at
//! `x = 0`, done per byte via [`poly::interpolate_at_zero`].
use chrono::Utc;
use rand::{Rng, RngCore};
use rs_merkle::{algorithms::Sha256, Hasher};

use crate::config::SSSConfig;
use crate::error::SSSError;
use crate::gf256::Gf256;
use crate::poly;
use crate::share::{Share, ShareMetadata};

/// Splits `secret` into `config.total_shares()` shares, any
/// `config.threshold()` of which reconstruct it via [`combine`].
///
/// `rng` supplies the per-byte polynomial coefficients; callers that need a
/// deterministic split (e.g. for tests) can pass a seeded `ChaCha20Rng`,
/// while production use should pass `OsRng` or another CSPRNG.
pub fn split(
    secret: &[u8],
    config: SSSConfig,
    rng: &mut impl RngCore,
) -> Result<Vec<Share>, SSSError> {
    if secret.is_empty() {
        return Err(SSSError::InvalidSecret(
            "secret must not be empty".to_string(),
        ));
    }
    if secret.len() > config.secret_max_size() {
        return Err(SSSError::InvalidSecret(format!(
            "secret is {} bytes, exceeds the configured maximum of {} bytes",
            secret.len(),
            config.secret_max_size()
        )));
    }

    let k = config.threshold() as usize;
    let n = config.total_shares();

    let mut set_id_bytes = [0u8; 16];
    rng.fill_bytes(&mut set_id_bytes);
    let share_set_id = hex::encode(set_id_bytes);
    let metadata = ShareMetadata::new(secret, config.threshold(), n, share_set_id, Utc::now());

    let mut columns: Vec<Vec<u8>> = vec![Vec::with_capacity(secret.len()); n as usize];
    for &secret_byte in secret {
        let mut coeffs = vec![Gf256::ZERO; k];
        coeffs[0] = Gf256::new(secret_byte);
        loop {
            for c in coeffs[1..].iter_mut() {
                *c = Gf256::new(rng.gen());
            }
            // a zero leading coefficient would silently drop the
            // polynomial's degree; regenerate until it's a genuine
            // degree-(k-1) polynomial.
            if k <= 1 || !coeffs[k - 1].is_zero() {
                break;
            }
        }

        for x in 1..=n {
            let y = poly::eval(&coeffs, Gf256::new(x));
            columns[(x - 1) as usize].push(y.0);
        }
    }

    Ok((1..=n)
        .map(|x| Share {
            x,
            y: columns[(x - 1) as usize].clone(),
            metadata: metadata.clone(),
        })
        .collect())
}

/// Reconstructs the secret from `shares`. Requires at least `threshold`
/// shares sharing identical metadata and distinct, non-zero `x` values; if
/// more than `threshold` are given, the `threshold` with the smallest `x`
/// are used and the rest are ignored.
pub fn combine(shares: Vec<Share>) -> Result<Vec<u8>, SSSError> {
    let Some(first) = shares.first() else {
        return Err(SSSError::InsufficientShares { got: 0, needed: 1 });
    };
    let metadata = first.metadata.clone();
    if shares.iter().any(|s| !s.metadata.same_share_set(&metadata)) {
        return Err(SSSError::InvalidShare(
            "share metadata disagrees across the provided set".to_string(),
        ));
    }

    let k = metadata.threshold as usize;
    if shares.len() < k {
        return Err(SSSError::InsufficientShares {
            got: shares.len(),
            needed: k,
        });
    }

    if shares.iter().any(|s| s.x == 0) {
        return Err(SSSError::InvalidShare(
            "x = 0 is reserved for the secret itself".to_string(),
        ));
    }
    let mut distinct: Vec<u8> = shares.iter().map(|s| s.x).collect();
    distinct.sort_unstable();
    distinct.dedup();
    if distinct.len() != shares.len() {
        return Err(SSSError::InvalidShare(
            "duplicate x-coordinates among shares".to_string(),
        ));
    }
    if shares.iter().any(|s| s.y.len() != metadata.secret_size) {
        return Err(SSSError::InvalidShare(
            "share payload length disagrees with metadata".to_string(),
        ));
    }

    let mut sorted = shares;
    sorted.sort_by_key(|s| s.x);
    let chosen = &sorted[..k];

    let mut secret = Vec::with_capacity(metadata.secret_size);
    for b in 0..metadata.secret_size {
        let points: Vec<(Gf256, Gf256)> = chosen
            .iter()
            .map(|s| (Gf256::new(s.x), Gf256::new(s.y[b])))
            .collect();
        let byte = poly::interpolate_at_zero(&points).map_err(|e| SSSError::MathError(e.to_string()))?;
        secret.push(byte.0);
    }

    if Sha256::hash(&secret) == metadata.secret_hash {
        Ok(secret)
    } else {
        Err(SSSError::CorruptedShare)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn rng() -> ChaCha20Rng {
        ChaCha20Rng::seed_from_u64(42)
    }

    #[test]
    fn round_trips_with_exactly_threshold_shares() {
        let config = SSSConfig::new(3, 5, false, 4096).unwrap();
        let secret = b"a secret worth splitting five ways".to_vec();
        let shares = split(&secret, config, &mut rng()).unwrap();
        assert_eq!(shares.len(), 5);

        let combined = combine(shares[1..4].to_vec()).unwrap();
        assert_eq!(combined, secret);
    }

    #[test]
    fn any_threshold_subset_reconstructs() {
        let config = SSSConfig::new(2, 4, false, 4096).unwrap();
        let secret = b"any two of four".to_vec();
        let shares = split(&secret, config, &mut rng()).unwrap();

        for (i, j) in [(0, 1), (0, 3), (1, 2), (2, 3)] {
            let subset = vec![shares[i].clone(), shares[j].clone()];
            assert_eq!(combine(subset).unwrap(), secret);
        }
    }

    #[test]
    fn fewer_than_threshold_shares_rejected() {
        let config = SSSConfig::new(3, 5, false, 4096).unwrap();
        let shares = split(b"too few shares given back", config, &mut rng()).unwrap();
        assert!(matches!(
            combine(shares[..2].to_vec()),
            Err(SSSError::InsufficientShares { .. })
        ));
    }

    #[test]
    fn mismatched_share_sets_rejected() {
        let config = SSSConfig::new(2, 3, false, 4096).unwrap();
        let a = split(b"first secret", config, &mut rng()).unwrap();
        let b = split(b"second secret", config, &mut rng()).unwrap();
        let mixed = vec![a[0].clone(), b[0].clone()];
        assert!(matches!(combine(mixed), Err(SSSError::InvalidShare(_))));
    }

    #[test]
    fn differing_timestamps_are_tolerated() {
        let config = SSSConfig::new(2, 3, false, 4096).unwrap();
        let secret = b"same split, restamped shares".to_vec();
        let mut shares = split(&secret, config, &mut rng()).unwrap();
        shares[0].metadata.timestamp = shares[0].metadata.timestamp + chrono::Duration::days(1);
        assert_eq!(combine(shares[..2].to_vec()).unwrap(), secret);
    }

    #[test]
    fn duplicate_x_rejected() {
        let config = SSSConfig::new(2, 3, false, 4096).unwrap();
        let shares = split(b"duplicate x coordinates", config, &mut rng()).unwrap();
        let dup = vec![shares[0].clone(), shares[0].clone()];
        assert!(matches!(combine(dup), Err(SSSError::InvalidShare(_))));
    }

    #[test]
    fn tampered_share_caught_by_hash() {
        let config = SSSConfig::new(2, 3, false, 4096).unwrap();
        let shares = split(b"tampering is detected", config, &mut rng()).unwrap();
        let mut tampered = shares[..2].to_vec();
        tampered[0].y[0] ^= 0xFF;
        assert!(matches!(combine(tampered), Err(SSSError::CorruptedShare)));
    }

    #[test]
    fn threshold_one_shares_are_the_secret_itself() {
        let config = SSSConfig::new(1, 3, false, 4096).unwrap();
        let secret = b"trivial case".to_vec();
        let shares = split(&secret, config, &mut rng()).unwrap();
        assert!(shares.iter().all(|s| s.y == secret));
        assert_eq!(combine(vec![shares[2].clone()]).unwrap(), secret);
    }

    #[test]
    fn oversized_secret_rejected() {
        let config = SSSConfig::new(2, 3, false, 4).unwrap();
        assert!(matches!(
            split(b"way too long for this config", config, &mut rng()),
            Err(SSSError::InvalidSecret(_))
        ));
    }
}
