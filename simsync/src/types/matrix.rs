use std::ops::{Mul, Index, IndexMut};

use super::Vector3D;

/// A 3x3 matrix type, stored in row major order. Cell matrices store one cell
/// vector per row.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
pub struct Matrix3([[f64; 3]; 3]);

impl Matrix3 {
    /// Create a new `Matrix3` from its rows
    pub const fn new(data: [[f64; 3]; 3]) -> Matrix3 {
        Matrix3(data)
    }

    /// Create a matrix full of zeros
    pub const fn zero() -> Matrix3 {
        Matrix3([[0.0; 3]; 3])
    }

    /// Get the transposed matrix
    pub fn transposed(&self) -> Matrix3 {
        let m = &self.0;
        Matrix3([
            [m[0][0], m[1][0], m[2][0]],
            [m[0][1], m[1][1], m[2][1]],
            [m[0][2], m[1][2], m[2][2]],
        ])
    }

    /// Get the determinant of this matrix
    pub fn determinant(&self) -> f64 {
        let m = &self.0;
        m[0][0] * (m[1][1] * m[2][2] - m[2][1] * m[1][2])
            - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
            + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
    }

    /// Get the inverse of this matrix, or `None` if the matrix is singular.
    ///
    /// The determinant is compared to the product of the norms of the rows,
    /// so the result does not depend on the unit of the matrix elements.
    pub fn inverse(&self) -> Option<Matrix3> {
        let determinant = self.determinant();
        let scale: f64 = self.0.iter().map(|&row| Vector3D::from(row).norm()).product();
        if !(determinant.abs() > f64::EPSILON * scale) {
            return None;
        }

        let m = &self.0;
        let inv = 1.0 / determinant;
        Some(Matrix3([
            [
                (m[1][1] * m[2][2] - m[2][1] * m[1][2]) * inv,
                (m[0][2] * m[2][1] - m[0][1] * m[2][2]) * inv,
                (m[0][1] * m[1][2] - m[0][2] * m[1][1]) * inv,
            ],
            [
                (m[1][2] * m[2][0] - m[1][0] * m[2][2]) * inv,
                (m[0][0] * m[2][2] - m[0][2] * m[2][0]) * inv,
                (m[1][0] * m[0][2] - m[0][0] * m[1][2]) * inv,
            ],
            [
                (m[1][0] * m[2][1] - m[2][0] * m[1][1]) * inv,
                (m[2][0] * m[0][1] - m[0][0] * m[2][1]) * inv,
                (m[0][0] * m[1][1] - m[1][0] * m[0][1]) * inv,
            ],
        ]))
    }
}

impl From<[[f64; 3]; 3]> for Matrix3 {
    fn from(data: [[f64; 3]; 3]) -> Matrix3 {
        Matrix3(data)
    }
}

impl Index<usize> for Matrix3 {
    type Output = [f64; 3];
    #[inline]
    fn index(&self, index: usize) -> &[f64; 3] {
        &self.0[index]
    }
}

impl IndexMut<usize> for Matrix3 {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut [f64; 3] {
        &mut self.0[index]
    }
}

impl_arithmetic!(
    Matrix3, Vector3D, Mul, mul, Vector3D, self, vector,
    Vector3D::new(
        self[0][0] * vector[0] + self[0][1] * vector[1] + self[0][2] * vector[2],
        self[1][0] * vector[0] + self[1][1] * vector[1] + self[1][2] * vector[2],
        self[2][0] * vector[0] + self[2][1] * vector[1] + self[2][2] * vector[2],
    )
);

impl_arithmetic!(
    Matrix3, Matrix3, Mul, mul, Matrix3, self, other,
    {
        let mut result = Matrix3::zero();
        for i in 0..3 {
            for j in 0..3 {
                for k in 0..3 {
                    result[i][j] += self[i][k] * other[k][j];
                }
            }
        }
        result
    }
);

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_relative_eq, assert_ulps_eq};

    #[test]
    fn transpose_and_determinant() {
        let matrix = Matrix3::new([
            [10.0, 0.0, 0.0],
            [2.0, 8.0, 0.0],
            [1.0, 3.0, 6.0],
        ]);
        assert_eq!(matrix.transposed()[0], [10.0, 2.0, 1.0]);
        assert_eq!(matrix.determinant(), 480.0);
        assert_eq!(matrix.transposed().transposed(), matrix);
    }

    #[test]
    fn inverse() {
        let matrix = Matrix3::new([
            [10.0, 0.0, 0.0],
            [2.0, 8.0, 0.0],
            [1.0, 3.0, 6.0],
        ]);
        let product = matrix * matrix.inverse().unwrap();
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_ulps_eq!(product[i][j], expected, epsilon = 1e-15);
            }
        }
    }

    #[test]
    fn singular() {
        assert_eq!(Matrix3::zero().inverse(), None);

        let flat = Matrix3::new([
            [1.0, 2.0, 3.0],
            [2.0, 4.0, 6.0],
            [0.0, 0.0, 1.0],
        ]);
        assert_eq!(flat.inverse(), None);
    }

    #[test]
    fn small_inverse() {
        // a nanometer sized cell, in meters
        let matrix = Matrix3::new([
            [2e-9, 0.0, 0.0],
            [0.0, 2e-9, 0.0],
            [0.0, 0.0, 2e-9],
        ]);
        let inverse = matrix.inverse().unwrap();
        assert_relative_eq!(inverse[0][0], 5e8, max_relative = 1e-12);
        assert_relative_eq!(inverse[2][2], 5e8, max_relative = 1e-12);
        assert_eq!(inverse[0][1], 0.0);
    }

    #[test]
    fn vector_product() {
        let matrix = Matrix3::new([
            [1.0, 2.0, 3.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 2.0],
        ]);
        let vector = Vector3D::new(1.0, 1.0, 1.0);
        assert_eq!(matrix * vector, Vector3D::new(6.0, 1.0, 2.0));
    }
}
