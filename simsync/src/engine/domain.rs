//! The `Domain` type represents the periodic box enclosing a simulation, and
//! implements the coordinate unwrapping and minimum image convention.
use crate::{Error, Matrix3, Vector3D};

/// The simulation box of an engine, in the restricted triclinic form used by
/// most molecular dynamics codes: the first cell vector `a` is along x, the
/// second one `b` is in the xy plane, and the third one `c` is arbitrary.
///
/// ```text
/// a = (xprd,  0,     0   )
/// b = (xy,    yprd,  0   )
/// c = (xz,    yz,    zprd)
/// ```
///
/// where `xprd = boxhi.x - boxlo.x` and so on. An orthogonal box has all tilt
/// factors set to zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Domain {
    boxlo: Vector3D,
    boxhi: Vector3D,
    /// tilt factors, in `xy, xz, yz` order
    tilt: [f64; 3],
    periodic: [bool; 3],
    /// Transpose of the cell matrix, cached
    transpose: Matrix3,
    /// Inverse of the transpose of the cell matrix, cached
    inverse: Matrix3,
}

impl Domain {
    /// Create a new orthogonal box between `boxlo` and `boxhi`, periodic in
    /// all directions.
    pub fn orthogonal(boxlo: Vector3D, boxhi: Vector3D) -> Result<Domain, Error> {
        Domain::triclinic(boxlo, boxhi, [0.0, 0.0, 0.0])
    }

    /// Create a new triclinic box between `boxlo` and `boxhi`, with the given
    /// `xy, xz, yz` tilt factors, periodic in all directions.
    pub fn triclinic(boxlo: Vector3D, boxhi: Vector3D, tilt: [f64; 3]) -> Result<Domain, Error> {
        for axis in 0..3 {
            if !boxlo[axis].is_finite() || !boxhi[axis].is_finite() {
                return Err(Error::InvalidParameter("box bounds must be finite".into()));
            }

            if !(boxhi[axis] > boxlo[axis]) {
                return Err(Error::InvalidParameter(format!(
                    "box bounds must verify lo < hi, got {} and {} along axis {}",
                    boxlo[axis], boxhi[axis], axis
                )));
            }
        }

        if tilt.iter().any(|t| !t.is_finite()) {
            return Err(Error::InvalidParameter("box tilt factors must be finite".into()));
        }

        let mut domain = Domain {
            boxlo,
            boxhi,
            tilt,
            periodic: [true, true, true],
            transpose: Matrix3::zero(),
            inverse: Matrix3::zero(),
        };
        domain.transpose = domain.matrix().transposed();
        domain.inverse = domain.transpose.inverse().ok_or_else(|| Error::InvalidParameter(
            "the box is too small to be represented with double precision".into()
        ))?;

        return Ok(domain);
    }

    /// Set the periodicity of this box along each axis
    #[must_use]
    pub fn with_periodicity(mut self, periodic: [bool; 3]) -> Domain {
        self.periodic = periodic;
        self
    }

    /// Get the periodicity of this box along each axis
    pub fn periodicity(&self) -> [bool; 3] {
        self.periodic
    }

    /// Get the lower corner of the box
    pub fn boxlo(&self) -> Vector3D {
        self.boxlo
    }

    /// Get the upper bounds of the box, before tilting
    pub fn boxhi(&self) -> Vector3D {
        self.boxhi
    }

    /// Get the `xy, xz, yz` tilt factors
    pub fn tilt(&self) -> [f64; 3] {
        self.tilt
    }

    /// Get the orthogonal lengths of the box, `(xprd, yprd, zprd)`
    pub fn lengths(&self) -> Vector3D {
        self.boxhi - self.boxlo
    }

    /// Get the cell matrix, with one cell vector per row
    pub fn matrix(&self) -> Matrix3 {
        let lengths = self.lengths();
        let [xy, xz, yz] = self.tilt;
        Matrix3::new([
            [lengths[0], 0.0, 0.0],
            [xy, lengths[1], 0.0],
            [xz, yz, lengths[2]],
        ])
    }

    /// Get the 8 corners of the box. The bits of the corner index select
    /// which cell vectors are added to the origin: bit 0 for `a`, bit 1 for
    /// `b` and bit 2 for `c`. Corner 0 is the origin, corners 1, 2 and 4 are
    /// the ends of the three edges starting at the origin.
    pub fn corners(&self) -> [Vector3D; 8] {
        let mut corners = [Vector3D::zero(); 8];
        for (index, corner) in corners.iter_mut().enumerate() {
            let fractional = Vector3D::new(
                (index & 1) as f64,
                ((index >> 1) & 1) as f64,
                ((index >> 2) & 1) as f64,
            );
            *corner = self.cartesian(fractional);
        }
        return corners;
    }

    /// Get the fractional representation of the `position` in this box, with
    /// the origin of the box at 0 and the opposite corner at 1.
    pub fn fractional(&self, position: Vector3D) -> Vector3D {
        return self.inverse * (position - self.boxlo);
    }

    /// Get the Cartesian representation of the `fractional` position in this
    /// box
    pub fn cartesian(&self, fractional: Vector3D) -> Vector3D {
        return self.transpose * fractional + self.boxlo;
    }
}

/// Periodic boundary conditions
impl Domain {
    /// Get the unwrapped position corresponding to the wrapped `position` with
    /// the given `image` flags, by adding `image[k]` times the `k`-th cell
    /// vector to the position.
    #[inline]
    pub fn unmap(&self, position: Vector3D, image: [i32; 3]) -> Vector3D {
        let image = Vector3D::new(image[0] as f64, image[1] as f64, image[2] as f64);
        return position + self.transpose * image;
    }

    /// Get the minimum image of the displacement `delta`, with each periodic
    /// component in `[-L/2, L/2)`.
    ///
    /// Axes are processed from z to x: removing a `c` vector also changes the
    /// y and x components (through `yz` and `xz`), and removing a `b` vector
    /// changes the x component (through `xy`).
    pub fn minimum_image(&self, mut delta: Vector3D) -> Vector3D {
        let lengths = self.lengths();
        let [xy, xz, yz] = self.tilt;

        if self.periodic[2] {
            let shift = f64::floor(delta[2] / lengths[2] + 0.5);
            if shift != 0.0 {
                delta[2] -= shift * lengths[2];
                delta[1] -= shift * yz;
                delta[0] -= shift * xz;
            }
        }

        if self.periodic[1] {
            let shift = f64::floor(delta[1] / lengths[1] + 0.5);
            if shift != 0.0 {
                delta[1] -= shift * lengths[1];
                delta[0] -= shift * xy;
            }
        }

        if self.periodic[0] {
            let shift = f64::floor(delta[0] / lengths[0] + 0.5);
            if shift != 0.0 {
                delta[0] -= shift * lengths[0];
            }
        }

        return delta;
    }

    /// Wrap `position` back inside the box along the periodic axes, updating
    /// the `image` flags accordingly. The unwrapped position is unchanged.
    pub fn remap(&self, position: Vector3D, image: &mut [i32; 3]) -> Vector3D {
        let mut fractional = self.fractional(position);
        let mut changed = false;
        for axis in 0..3 {
            if !self.periodic[axis] {
                continue;
            }

            let shift = f64::floor(fractional[axis]);
            if shift != 0.0 {
                fractional[axis] -= shift;
                // image flags only store the crossings modulo their packed range
                let shift = shift.clamp(i32::MIN as f64, i32::MAX as f64) as i32;
                image[axis] = image[axis].wrapping_add(shift);
                changed = true;
            }
        }

        if changed {
            return self.cartesian(fractional);
        } else {
            return position;
        }
    }

    /// Check if the `position` is inside the box along all the non-periodic
    /// axes
    pub fn contains(&self, position: Vector3D) -> bool {
        let fractional = self.fractional(position);
        (0..3).all(|axis| self.periodic[axis] || (0.0..=1.0).contains(&fractional[axis]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_relative_eq, assert_ulps_eq};

    fn cube(length: f64) -> Domain {
        Domain::orthogonal(Vector3D::zero(), Vector3D::new(length, length, length)).unwrap()
    }

    fn assert_vector_eq(actual: Vector3D, expected: Vector3D) {
        for axis in 0..3 {
            assert_relative_eq!(actual[axis], expected[axis], epsilon = 1e-12);
        }
    }

    #[test]
    fn invalid_bounds() {
        let result = Domain::orthogonal(Vector3D::zero(), Vector3D::new(1.0, 0.0, 1.0));
        assert!(matches!(result, Err(Error::InvalidParameter(_))));

        let result = Domain::triclinic(Vector3D::zero(), Vector3D::new(1.0, 1.0, 1.0), [f64::NAN, 0.0, 0.0]);
        assert!(result.is_err());

        let result = Domain::orthogonal(Vector3D::zero(), Vector3D::new(1.0, f64::INFINITY, 1.0));
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn small_box() {
        let domain = cube(2e-9);
        assert_eq!(domain.lengths(), Vector3D::new(2e-9, 2e-9, 2e-9));

        let mut image = [0, 0, 0];
        let position = domain.remap(Vector3D::new(3e-9, 1e-9, -1e-9), &mut image);
        assert_eq!(image, [1, 0, -1]);
        assert_vector_eq(position * 1e9, Vector3D::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn geometry() {
        let domain = Domain::triclinic(
            Vector3D::new(-1.0, 0.0, 2.0),
            Vector3D::new(9.0, 8.0, 8.0),
            [2.0, 1.0, 3.0],
        ).unwrap();

        assert_eq!(domain.lengths(), Vector3D::new(10.0, 8.0, 6.0));
        assert_eq!(domain.matrix(), Matrix3::new([
            [10.0, 0.0, 0.0],
            [2.0, 8.0, 0.0],
            [1.0, 3.0, 6.0],
        ]));

        let corners = domain.corners();
        assert_eq!(corners[0], Vector3D::new(-1.0, 0.0, 2.0));
        assert_vector_eq(corners[1], Vector3D::new(9.0, 0.0, 2.0));
        assert_vector_eq(corners[2], Vector3D::new(1.0, 8.0, 2.0));
        assert_vector_eq(corners[4], Vector3D::new(0.0, 3.0, 8.0));
        assert_vector_eq(corners[7], Vector3D::new(12.0, 11.0, 8.0));
    }

    #[test]
    fn fractional_cartesian() {
        let domain = Domain::triclinic(
            Vector3D::new(-1.0, 0.0, 2.0),
            Vector3D::new(9.0, 8.0, 8.0),
            [2.0, 1.0, 3.0],
        ).unwrap();

        let position = Vector3D::new(3.2, -4.0, 7.5);
        assert_vector_eq(domain.cartesian(domain.fractional(position)), position);
        assert_vector_eq(domain.fractional(domain.boxlo()), Vector3D::zero());
    }

    #[test]
    fn unmap() {
        let domain = cube(10.0);
        let position = Vector3D::new(1.0, 2.0, 3.0);
        assert_eq!(domain.unmap(position, [0, 0, 0]), position);
        assert_eq!(domain.unmap(position, [1, -2, 3]), Vector3D::new(11.0, -18.0, 33.0));

        let domain = Domain::triclinic(
            Vector3D::zero(),
            Vector3D::new(10.0, 8.0, 6.0),
            [2.0, 1.0, 3.0],
        ).unwrap();
        assert_eq!(domain.unmap(position, [0, 0, 0]), position);
        // one b vector and one c vector: (2 + 1, 8 + 3, 6)
        assert_eq!(domain.unmap(position, [0, 1, 1]), Vector3D::new(4.0, 13.0, 9.0));
    }

    #[test]
    fn minimum_image_orthogonal() {
        let domain = cube(10.0);
        let delta = domain.minimum_image(Vector3D::new(9.0, -6.0, 4.0));
        assert_eq!(delta, Vector3D::new(-1.0, 4.0, 4.0));

        let delta = domain.minimum_image(Vector3D::new(25.0, -35.0, 0.5));
        assert_eq!(delta, Vector3D::new(-5.0, -5.0, 0.5));

        // half a box length folds to the negative side
        let delta = domain.minimum_image(Vector3D::new(5.0, -5.0, 0.0));
        assert_eq!(delta, Vector3D::new(-5.0, -5.0, 0.0));

        let domain = cube(10.0).with_periodicity([true, false, true]);
        let delta = domain.minimum_image(Vector3D::new(9.0, 9.0, 9.0));
        assert_eq!(delta, Vector3D::new(-1.0, 9.0, -1.0));
    }

    #[test]
    fn minimum_image_triclinic() {
        let domain = Domain::triclinic(
            Vector3D::zero(),
            Vector3D::new(10.0, 10.0, 10.0),
            [4.0, 3.0, 2.0],
        ).unwrap();

        // exactly one c vector away from zero
        let c = Vector3D::new(3.0, 2.0, 10.0);
        assert_vector_eq(domain.minimum_image(c), Vector3D::zero());

        // a small displacement plus arbitrary lattice vectors
        let small = Vector3D::new(0.5, -0.3, 0.2);
        let matrix = domain.matrix();
        let a = Vector3D::from(matrix[0]);
        let b = Vector3D::from(matrix[1]);
        let lattice = 2.0 * a - 3.0 * b + c;
        assert_vector_eq(domain.minimum_image(small + lattice), small);

        // processing x before y would give (-8, 0, 0) here
        let delta = domain.minimum_image(Vector3D::new(6.0, 10.0, 0.0));
        assert_vector_eq(delta, Vector3D::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn minimum_image_bounds() {
        let domain = Domain::triclinic(
            Vector3D::zero(),
            Vector3D::new(6.0, 7.0, 8.0),
            [3.0, -2.5, 3.5],
        ).unwrap();
        let lengths = domain.lengths();

        for i in -10..10 {
            let raw = Vector3D::new(1.7 * i as f64, -2.3 * i as f64, 3.1 * i as f64);
            let delta = domain.minimum_image(raw);
            for axis in 0..3 {
                assert!(delta[axis] >= -lengths[axis] / 2.0 - 1e-12);
                assert!(delta[axis] < lengths[axis] / 2.0 + 1e-12);
            }
        }
    }

    #[test]
    fn remap() {
        let domain = cube(10.0);
        let mut image = [0, 0, 0];
        let position = domain.remap(Vector3D::new(12.0, -3.0, 5.0), &mut image);
        assert_vector_eq(position, Vector3D::new(2.0, 7.0, 5.0));
        assert_eq!(image, [1, -1, 0]);
        assert_vector_eq(domain.unmap(position, image), Vector3D::new(12.0, -3.0, 5.0));

        let domain = Domain::triclinic(
            Vector3D::new(-2.0, -2.0, -2.0),
            Vector3D::new(2.0, 2.0, 2.0),
            [1.0, 0.5, -0.5],
        ).unwrap();
        let unwrapped = Vector3D::new(5.3, -7.1, 4.4);
        let mut image = [0, 0, 0];
        let position = domain.remap(unwrapped, &mut image);
        let fractional = domain.fractional(position);
        for axis in 0..3 {
            assert!(fractional[axis] > -1e-12 && fractional[axis] < 1.0 + 1e-12);
        }
        let back = domain.unmap(position, image);
        for axis in 0..3 {
            assert_ulps_eq!(back[axis], unwrapped[axis], epsilon = 1e-12);
        }
    }

    #[test]
    fn remap_far_away() {
        let domain = cube(10.0);
        let mut image = [0, 0, 0];
        let position = domain.remap(Vector3D::new(1e12 + 3.0, 1.0, 1.0), &mut image);
        assert_relative_eq!(position[0], 3.0, epsilon = 1e-3);
        // the number of crossings does not fit in an i32
        assert_eq!(image, [i32::MAX, 0, 0]);

        let mut image = [i32::MAX, 0, 0];
        let _ = domain.remap(Vector3D::new(1e30, 1.0, 1.0), &mut image);
        assert_eq!(image[0], i32::MAX.wrapping_add(i32::MAX));
    }

    #[test]
    fn contains() {
        let domain = cube(10.0).with_periodicity([true, true, false]);
        assert!(domain.contains(Vector3D::new(-5.0, 15.0, 5.0)));
        assert!(!domain.contains(Vector3D::new(5.0, 5.0, 11.0)));
    }
}
