//! Polynomial arithmetic over GF(2⁸).
//!
//! Coefficients are stored lowest-degree first: `p[0]` is the constant term,
//! `p[i]` is the coefficient of `x^i`. This is the convention used
//! throughout this module; the systematic encoding step in [`crate::rs`] uses
//! a different, locally-documented buffer layout and is not affected by it.
use crate::error::ReconstructionError;
use crate::gf256::Gf256;

/// `p + q`, pointwise XOR, padded with zeros to the longer operand's length.
pub fn add(p: &[Gf256], q: &[Gf256]) -> Vec<Gf256> {
    let len = p.len().max(q.len());
    (0..len)
        .map(|i| {
            let a = p.get(i).copied().unwrap_or(Gf256::ZERO);
            let b = q.get(i).copied().unwrap_or(Gf256::ZERO);
            a + b
        })
        .collect()
}

/// Schoolbook convolution: `deg(p*q) = deg(p) + deg(q)`.
pub fn mul(p: &[Gf256], q: &[Gf256]) -> Vec<Gf256> {
    if p.is_empty() || q.is_empty() {
        return vec![];
    }
    let mut out = vec![Gf256::ZERO; p.len() + q.len() - 1];
    for (i, &a) in p.iter().enumerate() {
        if a.is_zero() {
            continue;
        }
        for (j, &b) in q.iter().enumerate() {
            out[i + j] += a.mul(b);
        }
    }
    out
}

/// Evaluates `p` at `x` using Horner's method.
pub fn eval(p: &[Gf256], x: Gf256) -> Gf256 {
    let mut result = Gf256::ZERO;
    let mut power = Gf256::ONE;
    for &coeff in p {
        result += coeff.mul(power);
        power = power.mul(x);
    }
    result
}

/// Trims high-degree zero coefficients, collapsing an all-zero polynomial to
/// the single coefficient `[0]`.
fn trim(mut p: Vec<Gf256>) -> Vec<Gf256> {
    while p.len() > 1 && p.last() == Some(&Gf256::ZERO) {
        p.pop();
    }
    if p.is_empty() {
        p.push(Gf256::ZERO);
    }
    p
}

/// Synthetic division: `dividend = divisor * quotient + remainder`, with
/// `deg(remainder) < deg(divisor)`.
///
/// The divisor's leading (highest-degree) coefficient must be non-zero.
pub fn divmod(
    dividend: &[Gf256],
    divisor: &[Gf256],
) -> Result<(Vec<Gf256>, Vec<Gf256>), ReconstructionError> {
    let divisor_degree = divisor.len().saturating_sub(1);
    let leading = *divisor.last().ok_or_else(|| {
        ReconstructionError::MathError("divmod: empty divisor".to_string())
    })?;
    if leading.is_zero() {
        return Err(ReconstructionError::MathError(
            "divmod: divisor has a zero leading coefficient".to_string(),
        ));
    }

    let mut remainder = dividend.to_vec();
    if remainder.len() < divisor.len() {
        return Ok((vec![Gf256::ZERO], trim(remainder)));
    }

    let quotient_len = remainder.len() - divisor_degree;
    let mut quotient = vec![Gf256::ZERO; quotient_len];

    for i in (0..quotient_len).rev() {
        let coeff = remainder[i + divisor_degree].try_div(leading)?;
        quotient[i] = coeff;
        if coeff.is_zero() {
            continue;
        }
        for (j, &d) in divisor.iter().enumerate() {
            remainder[i + j] += coeff.mul(d);
        }
    }

    remainder.truncate(divisor_degree.max(1));
    Ok((trim(quotient), trim(remainder)))
}

/// The Reed-Solomon generator polynomial `g(x) = prod_{i=0}^{m-1} (x - a^i)`,
/// where `a = 2` is the field's primitive element. Returned lowest-degree
/// first, with `m + 1` coefficients.
pub fn generator(m: usize) -> Vec<Gf256> {
    let mut g = vec![Gf256::ONE];
    for i in 0..m {
        // multiply g by the monomial (x - a^i) = (x + a^i), since
        // subtraction is XOR in GF(2^8).
        let root = Gf256::exp_of(i as u32);
        g = mul(&g, &[root, Gf256::ONE]);
    }
    g
}

/// Lagrange interpolation: given distinct `x`-coordinates and matching
/// `y`-coordinates, returns the coefficients (lowest-degree first) of the
/// unique polynomial of degree `< points.len()` passing through them.
pub fn interpolate(points: &[(Gf256, Gf256)]) -> Result<Vec<Gf256>, ReconstructionError> {
    let mut result = vec![Gf256::ZERO; points.len()];

    for (i, &(xi, yi)) in points.iter().enumerate() {
        // build the i-th Lagrange basis polynomial, scaled by yi:
        // li(x) = yi * prod_{j != i} (x - xj) / (xi - xj)
        let mut basis = vec![Gf256::ONE];
        let mut denom = Gf256::ONE;
        for (j, &(xj, _)) in points.iter().enumerate() {
            if i == j {
                continue;
            }
            basis = mul(&basis, &[xj, Gf256::ONE]);
            denom = denom.mul(xi + xj);
        }
        let scale = yi.try_div(denom)?;
        result = add(&result, &basis.iter().map(|&c| c.mul(scale)).collect::<Vec<_>>());
    }

    Ok(result)
}

/// Evaluates a degree-`0` Lagrange interpolation directly at `x = 0` without
/// building the full polynomial; this is what [`crate::sss::combine`] uses,
/// since it only ever needs the constant term (the secret byte).
pub fn interpolate_at_zero(points: &[(Gf256, Gf256)]) -> Result<Gf256, ReconstructionError> {
    let mut secret = Gf256::ZERO;
    for (i, &(xi, yi)) in points.iter().enumerate() {
        let mut li = Gf256::ONE;
        for (j, &(xj, _)) in points.iter().enumerate() {
            if i == j {
                continue;
            }
            // term for root contribution at x=0: xj / (xj - xi) = xj / (xj xor xi)
            li = li.mul(xj.try_div(xj + xi)?);
        }
        secret += li.mul(yi);
    }
    Ok(secret)
}
