//! Matrices over GF(2⁸), used by the Reed-Solomon decoder to invert the
//! Vandermonde minor built from the surviving shards.
//!
//! The shape of this module — a flat row-major buffer plus row-reduction
//! helpers — mirrors a conventional `Matrix<T: Field>` layout; the main
//! departure is that [`Matrix::invert`] here performs partial pivoting
//! (searching for a non-zero pivot and swapping rows into place), since,
//! unlike an elliptic-curve scalar field, a GF(2⁸) Vandermonde minor can have
//! a zero sitting on the diagonal after row selection.
use crate::error::ReconstructionError;
use crate::gf256::Gf256;

/// A matrix over GF(2⁸), stored row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct Matrix {
    elements: Vec<Gf256>,
    pub height: usize,
    pub width: usize,
}

impl Matrix {
    pub fn from_rows(rows: Vec<Vec<Gf256>>) -> Self {
        let height = rows.len();
        let width = rows.first().map(|r| r.len()).unwrap_or(0);
        debug_assert!(rows.iter().all(|r| r.len() == width));
        Matrix {
            elements: rows.into_iter().flatten().collect(),
            height,
            width,
        }
    }

    fn identity(size: usize) -> Self {
        let mut elements = vec![Gf256::ZERO; size * size];
        for i in 0..size {
            elements[i * size + i] = Gf256::ONE;
        }
        Matrix {
            elements,
            height: size,
            width: size,
        }
    }

    fn get(&self, i: usize, j: usize) -> Gf256 {
        self.elements[i * self.width + j]
    }

    fn set(&mut self, i: usize, j: usize, value: Gf256) {
        self.elements[i * self.width + j] = value;
    }

    fn swap_rows(&mut self, i: usize, j: usize) {
        for k in 0..self.width {
            self.elements.swap(i * self.width + k, j * self.width + k);
        }
    }

    fn divide_row_by(&mut self, row: usize, value: Gf256) -> Result<(), ReconstructionError> {
        for j in 0..self.width {
            let v = self.get(row, j).try_div(value)?;
            self.set(row, j, v);
        }
        Ok(())
    }

    fn eliminate_row(&mut self, source: usize, factor: Gf256, destination: usize) {
        for j in 0..self.width {
            let v = self.get(destination, j) + self.get(source, j).mul(factor);
            self.set(destination, j, v);
        }
    }

    /// Builds the `(k+m) x k` Vandermonde-style matrix used by the RS
    /// systematic code, where `V[i][j] = (a^i)^j` and `a = 2` is the field's
    /// primitive element.
    pub fn vandermonde(height: usize, width: usize) -> Self {
        let mut elements = vec![Gf256::ZERO; height * width];
        for i in 0..height {
            let point = Gf256::exp_of(i as u32);
            let mut power = Gf256::ONE;
            for j in 0..width {
                elements[i * width + j] = power;
                power = power.mul(point);
            }
        }
        Matrix {
            elements,
            height,
            width,
        }
    }

    /// Builds the `height x points.len()` matrix `W[t][c] = points[c]^t`,
    /// used by the erasure-correction step to turn the generator
    /// polynomial's root relations into a square linear system over exactly
    /// the erased positions, rather than over a fixed `0..k` column range.
    pub fn vandermonde_from_points(points: &[Gf256], height: usize) -> Self {
        let width = points.len();
        let mut elements = vec![Gf256::ZERO; height * width];
        let mut powers = vec![Gf256::ONE; width];
        for t in 0..height {
            elements[t * width..(t + 1) * width].copy_from_slice(&powers);
            for (c, p) in points.iter().enumerate() {
                powers[c] = powers[c].mul(*p);
            }
        }
        Matrix {
            elements,
            height,
            width,
        }
    }

    /// Inverts a square matrix via Gauss-Jordan elimination with partial
    /// pivoting: for each column, a non-zero pivot row is located by linear
    /// scan and swapped into place before the column is cleared from every
    /// other row.
    pub fn invert(&self) -> Result<Self, ReconstructionError> {
        if self.height != self.width {
            return Err(ReconstructionError::MathError(format!(
                "cannot invert a non-square matrix ({} x {})",
                self.height, self.width
            )));
        }

        let mut inverse = Self::identity(self.height);
        let mut matrix = self.clone();

        for i in 0..matrix.height {
            if matrix.get(i, i).is_zero() {
                let pivot_row = (i + 1..matrix.height).find(|&k| !matrix.get(k, i).is_zero());
                match pivot_row {
                    Some(row) => {
                        matrix.swap_rows(i, row);
                        inverse.swap_rows(i, row);
                    }
                    None => {
                        return Err(ReconstructionError::MathError(format!(
                            "no non-zero pivot available in column {i}"
                        )))
                    }
                }
            }

            let pivot = matrix.get(i, i);
            matrix.divide_row_by(i, pivot)?;
            inverse.divide_row_by(i, pivot)?;

            for k in 0..matrix.height {
                if k == i {
                    continue;
                }
                let factor = matrix.get(k, i);
                if factor.is_zero() {
                    continue;
                }
                matrix.eliminate_row(i, factor, k);
                inverse.eliminate_row(i, factor, k);
            }
        }

        Ok(inverse)
    }

    /// Matrix-vector product `self * rhs`.
    pub fn mul_vec(&self, rhs: &[Gf256]) -> Result<Vec<Gf256>, ReconstructionError> {
        if self.width != rhs.len() {
            return Err(ReconstructionError::MathError(format!(
                "incompatible shapes: matrix width {}, vector length {}",
                self.width,
                rhs.len()
            )));
        }
        Ok((0..self.height)
            .map(|i| {
                (0..self.width)
                    .map(|j| self.get(i, j).mul(rhs[j]))
                    .fold(Gf256::ZERO, |acc, x| acc + x)
            })
            .collect())
    }

    /// Extracts a subset of rows, in the order given.
    pub fn select_rows(&self, rows: &[usize]) -> Self {
        let elements = rows
            .iter()
            .flat_map(|&i| (0..self.width).map(move |j| self.get(i, j)))
            .collect();
        Matrix {
            elements,
            height: rows.len(),
            width: self.width,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vandermonde_first_row_is_ones() {
        let v = Matrix::vandermonde(4, 3);
        for j in 0..3 {
            assert_eq!(v.get(0, j), Gf256::ONE);
        }
    }

    #[test]
    fn invert_round_trips_identity() {
        let m = Matrix::vandermonde(3, 3);
        let inv = m.invert().unwrap();

        // M^-1 * (M * e_j) should be e_j for every standard basis vector.
        for j in 0..3 {
            let mut e = vec![Gf256::ZERO; 3];
            e[j] = Gf256::ONE;
            let col = inv.mul_vec(&m.mul_vec(&e).unwrap()).unwrap();
            assert_eq!(col, e);
        }
    }

    #[test]
    fn vandermonde_from_points_matches_direct_powers() {
        let points = [Gf256::new(3), Gf256::new(9), Gf256::new(1)];
        let w = Matrix::vandermonde_from_points(&points, 3);
        for (c, &p) in points.iter().enumerate() {
            let mut power = Gf256::ONE;
            for t in 0..3 {
                assert_eq!(w.get(t, c), power);
                power = power.mul(p);
            }
        }
    }

    #[test]
    fn invert_rejects_non_square() {
        let m = Matrix::from_rows(vec![vec![Gf256::ONE, Gf256::ZERO]]);
        assert!(m.invert().is_err());
    }

    #[test]
    fn invert_handles_zero_on_diagonal_via_swap() {
        let rows = vec![
            vec![Gf256::ZERO, Gf256::ONE],
            vec![Gf256::ONE, Gf256::ZERO],
        ];
        let m = Matrix::from_rows(rows);
        let inv = m.invert().unwrap();
        for j in 0..2 {
            let mut e = vec![Gf256::ZERO; 2];
            e[j] = Gf256::ONE;
            let col = inv.mul_vec(&m.mul_vec(&e).unwrap()).unwrap();
            assert_eq!(col, e);
        }
    }
}
