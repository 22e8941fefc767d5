use crate::{BufferView, Engine, Matrix3, Vector3D};

use super::BoxBuffers;

/// Geometry of the simulation box
#[derive(Debug, Clone, Copy)]
pub struct BoxSnapshot<'a> {
    /// Cell vectors, one per row, as 3 elements of 3 `f64`
    pub matrix: BufferView<'a>,
    /// Lower corner of the box, as 3 `f64`
    pub origin: BufferView<'a>,
    /// Orthogonal lengths of the box, as 3 `f64`
    pub lengths: BufferView<'a>,
    /// Generation at which this snapshot was created, or 0 if it was not
    /// created by a running `SimulationHandle`
    pub generation: u64,
}

/// Owned copy of a `BoxSnapshot`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxData {
    /// Cell vectors, one per row
    pub matrix: Matrix3,
    /// Lower corner of the box
    pub origin: Vector3D,
    /// Orthogonal lengths of the box along x, y and z
    pub lengths: Vector3D,
}

impl<'a> BoxSnapshot<'a> {
    /// Copy the data in this snapshot to owned memory
    pub fn to_owned(&self) -> BoxData {
        let mut data = BoxData {
            matrix: Matrix3::zero(),
            origin: Vector3D::zero(),
            lengths: Vector3D::zero(),
        };

        if let Some(matrix) = self.matrix.as_f64() {
            for (i, row) in matrix.chunks_exact(3).enumerate() {
                data.matrix[i].copy_from_slice(row);
            }
        }

        if let Some(&[x, y, z]) = self.origin.as_f64() {
            data.origin = Vector3D::new(x, y, z);
        }

        if let Some(&[x, y, z]) = self.lengths.as_f64() {
            data.lengths = Vector3D::new(x, y, z);
        }

        return data;
    }
}

/// Build a snapshot of the simulation box of `engine`, writing the data to
/// the `scratch` buffers.
///
/// The rows of the matrix are the edges going from the origin of the box to
/// the corners 1 (`a`), 2 (`b`) and 4 (`c`). Without an engine, or if the
/// engine does not define a box yet, all values are zero.
#[time_graph::instrument(name = "snapshot::build_box")]
pub fn build_box<'a>(engine: Option<&'a dyn Engine>, scratch: &'a mut BoxBuffers) -> BoxSnapshot<'a> {
    scratch.clear();

    if let Some(domain) = engine.and_then(|engine| engine.domain()) {
        let corners = domain.corners();
        let origin = corners[0];
        for (row, &corner) in [1, 2, 4].iter().enumerate() {
            let edge = corners[corner] - origin;
            scratch.matrix[3 * row..3 * row + 3].copy_from_slice(edge.as_array());
        }

        scratch.origin = origin.into();
        scratch.lengths = domain.lengths().into();
    }

    let scratch = &*scratch;
    return BoxSnapshot {
        matrix: BufferView::new(&scratch.matrix, 3),
        origin: BufferView::new(&scratch.origin, 3),
        lengths: BufferView::new(&scratch.lengths, 3),
        generation: 0,
    };
}
