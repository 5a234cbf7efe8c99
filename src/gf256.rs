//! Arithmetic over the finite field GF(2⁸).
//!
//! The field is built from the irreducible polynomial `x⁸ + x⁴ + x³ + x² + 1`
//! (`0x11D`), the same construction used by Reed-Solomon codes such as
//! AES's MixColumns step. Addition and subtraction are bitwise XOR;
//! multiplication, division, inversion and exponentiation go through a pair
//! of precomputed exp/log tables so that every non-additive operation is a
//! couple of array lookups.
use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, MulAssign, Sub, SubAssign};
use std::sync::OnceLock;

use crate::error::ReconstructionError;

/// The modulus polynomial `x⁸ + x⁴ + x³ + x² + 1`, as a bit pattern.
const MODULUS: u16 = 0x11D;

/// `exp[i] = 2^i` in GF(2⁸), doubled to length 512 so that
/// `exp[log(a) + log(b)]` never needs a modulo reduction.
struct Tables {
    exp: [u8; 512],
    log: [u8; 256],
}

static TABLES: OnceLock<Tables> = OnceLock::new();

fn tables() -> &'static Tables {
    TABLES.get_or_init(|| {
        let mut exp = [0u8; 512];
        let mut log = [0u8; 256];

        let mut x: u16 = 1;
        for i in 0..255usize {
            exp[i] = x as u8;
            log[x as usize] = i as u8;

            x <<= 1;
            if x & 0x100 != 0 {
                x ^= MODULUS;
            }
        }
        for i in 255..512 {
            exp[i] = exp[i - 255];
        }

        Tables { exp, log }
    })
}

/// A single element of GF(2⁸).
///
/// Every `u8` value is a valid element; there are no reserved bit patterns.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Gf256(pub u8);

impl Gf256 {
    pub const ZERO: Gf256 = Gf256(0);
    pub const ONE: Gf256 = Gf256(1);

    pub fn new(value: u8) -> Self {
        Gf256(value)
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// `exp[e mod 255]`.
    pub fn exp_of(e: u32) -> Self {
        let t = tables();
        Gf256(t.exp[(e % 255) as usize])
    }

    fn log(self) -> u32 {
        debug_assert!(!self.is_zero(), "log(0) is undefined");
        tables().log[self.0 as usize] as u32
    }

    /// `a * b`, `0` if either operand is `0`.
    pub fn mul(self, other: Self) -> Self {
        if self.is_zero() || other.is_zero() {
            return Gf256::ZERO;
        }
        let t = tables();
        Gf256(t.exp[(self.log() + other.log()) as usize])
    }

    /// `a / b`. Fails with [`ReconstructionError::MathError`] when `b` is zero.
    pub fn try_div(self, other: Self) -> Result<Self, ReconstructionError> {
        if other.is_zero() {
            return Err(ReconstructionError::MathError(
                "division by zero in GF(2^8)".to_string(),
            ));
        }
        if self.is_zero() {
            return Ok(Gf256::ZERO);
        }
        let t = tables();
        Ok(Gf256(
            t.exp[(self.log() + 255 - other.log()) as usize],
        ))
    }

    /// `base^exponent`. `1` if `exponent == 0`, `0` if `base == 0` (and
    /// `exponent != 0`).
    pub fn pow(self, exponent: u32) -> Self {
        if exponent == 0 {
            return Gf256::ONE;
        }
        if self.is_zero() {
            return Gf256::ZERO;
        }
        Gf256::exp_of(self.log() * exponent)
    }

    /// Multiplicative inverse. Fails with [`ReconstructionError::MathError`]
    /// when called on zero.
    pub fn try_inv(self) -> Result<Self, ReconstructionError> {
        if self.is_zero() {
            return Err(ReconstructionError::MathError(
                "inverse of zero in GF(2^8)".to_string(),
            ));
        }
        let t = tables();
        Ok(Gf256(t.exp[(255 - self.log()) as usize]))
    }
}

impl fmt::Display for Gf256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#04x}", self.0)
    }
}

impl From<u8> for Gf256 {
    fn from(value: u8) -> Self {
        Gf256(value)
    }
}

impl From<Gf256> for u8 {
    fn from(value: Gf256) -> Self {
        value.0
    }
}

impl Add for Gf256 {
    type Output = Gf256;
    fn add(self, rhs: Self) -> Self::Output {
        Gf256(self.0 ^ rhs.0)
    }
}

impl Sub for Gf256 {
    type Output = Gf256;
    fn sub(self, rhs: Self) -> Self::Output {
        Gf256(self.0 ^ rhs.0)
    }
}

impl AddAssign for Gf256 {
    fn add_assign(&mut self, rhs: Self) {
        self.0 ^= rhs.0;
    }
}

impl SubAssign for Gf256 {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 ^= rhs.0;
    }
}

impl Mul for Gf256 {
    type Output = Gf256;
    fn mul(self, rhs: Self) -> Self::Output {
        Gf256::mul(self, rhs)
    }
}

impl MulAssign for Gf256 {
    fn mul_assign(&mut self, rhs: Self) {
        *self = Gf256::mul(*self, rhs);
    }
}

/// Total division, for call sites that have already ruled out a zero divisor
/// (e.g. the matrix layer, which only ever divides by a pivot it just
/// checked). Panics on a zero divisor rather than threading a `Result`
/// through every arithmetic expression.
impl Div for Gf256 {
    type Output = Gf256;
    fn div(self, rhs: Self) -> Self::Output {
        self.try_div(rhs)
            .expect("division by zero in GF(2^8) (Div::div)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aes_test_vector() {
        // standard test vector for this exact primitive polynomial.
        assert_eq!(Gf256::new(0x53).mul(Gf256::new(0xCA)), Gf256::new(0x01));
        assert_eq!(Gf256::new(0x53).try_inv().unwrap(), Gf256::new(0xCA));
    }

    #[test]
    fn add_is_involution() {
        for a in 0..=255u8 {
            let a = Gf256::new(a);
            assert_eq!(a + a, Gf256::ZERO);
            assert_eq!(a + Gf256::ZERO, a);
        }
    }

    #[test]
    fn add_commutative_associative() {
        let (a, b, c) = (Gf256::new(0x12), Gf256::new(0x34), Gf256::new(0x56));
        assert_eq!(a + b, b + a);
        assert_eq!((a + b) + c, a + (b + c));
    }

    #[test]
    fn mul_identity_and_commutative() {
        for x in 0..=255u8 {
            let x = Gf256::new(x);
            assert_eq!(x.mul(Gf256::ONE), x);
        }
        let (a, b) = (Gf256::new(0x7a), Gf256::new(0x3c));
        assert_eq!(a.mul(b), b.mul(a));
    }

    #[test]
    fn mul_associative() {
        let (a, b, c) = (Gf256::new(0x11), Gf256::new(0x22), Gf256::new(0x33));
        assert_eq!(a.mul(b).mul(c), a.mul(b.mul(c)));
    }

    #[test]
    fn distributivity() {
        let (a, b, c) = (Gf256::new(0x9), Gf256::new(0x51), Gf256::new(0xf0));
        assert_eq!(a.mul(b + c), a.mul(b) + a.mul(c));
    }

    #[test]
    fn mul_by_inverse_is_one() {
        for x in 1..=255u8 {
            let x = Gf256::new(x);
            assert_eq!(x.mul(x.try_inv().unwrap()), Gf256::ONE);
        }
    }

    #[test]
    fn pow_255_is_one_for_nonzero() {
        for x in 1..=255u8 {
            let x = Gf256::new(x);
            assert_eq!(x.pow(255), Gf256::ONE);
        }
    }

    #[test]
    fn pow_zero_is_one() {
        assert_eq!(Gf256::new(0x42).pow(0), Gf256::ONE);
        assert_eq!(Gf256::ZERO.pow(0), Gf256::ONE);
    }

    #[test]
    fn pow_of_zero_base_is_zero() {
        assert_eq!(Gf256::ZERO.pow(5), Gf256::ZERO);
    }

    #[test]
    fn div_by_zero_is_math_error() {
        assert!(Gf256::new(3).try_div(Gf256::ZERO).is_err());
    }

    #[test]
    fn zero_div_anything_is_zero() {
        assert_eq!(Gf256::ZERO.try_div(Gf256::new(7)).unwrap(), Gf256::ZERO);
    }

    #[test]
    fn exp_of_wraps_mod_255() {
        assert_eq!(Gf256::exp_of(0), Gf256::exp_of(255));
        assert_eq!(Gf256::exp_of(1), Gf256::exp_of(256));
    }

    #[test]
    fn inv_of_zero_is_math_error() {
        assert!(Gf256::ZERO.try_inv().is_err());
    }
}
