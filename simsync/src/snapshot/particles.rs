use ndarray::Array2;

use crate::{BufferView, Engine};
use crate::engine::AtomIds;

/// Positions, tags and types of all atoms in the simulation.
///
/// `positions` contains 3 `f32` per atom and lives in the scratch memory,
/// while `ids` and `types` directly alias the engine memory.
#[derive(Debug, Clone, Copy)]
pub struct ParticleSnapshot<'a> {
    /// Positions of the atoms, 3 values per atom
    pub positions: BufferView<'a>,
    /// Tags of the atoms, as `i32` or `i64` depending on the engine
    pub ids: BufferView<'a>,
    /// Types of the atoms, as `i32`
    pub types: BufferView<'a>,
    /// Number of atoms
    pub count: usize,
    /// Generation at which this snapshot was created, or 0 if it was not
    /// created by a running `SimulationHandle`
    pub generation: u64,
}

/// Owned copy of a `ParticleSnapshot`
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleData {
    /// Positions of the atoms, with shape `(count, 3)`
    pub positions: Array2<f32>,
    /// Tags of the atoms, converted to `i64`
    pub ids: Vec<i64>,
    /// Types of the atoms
    pub types: Vec<i32>,
}

impl<'a> ParticleSnapshot<'a> {
    /// Get an empty snapshot, with zero atoms
    pub fn empty() -> ParticleSnapshot<'a> {
        ParticleSnapshot {
            positions: BufferView::empty::<f32>(3),
            ids: BufferView::empty::<i32>(1),
            types: BufferView::empty::<i32>(1),
            count: 0,
            generation: 0,
        }
    }

    /// Is this snapshot empty?
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Copy the data in this snapshot to owned memory
    pub fn to_owned(&self) -> ParticleData {
        let ids = if let Some(ids) = self.ids.as_i32() {
            ids.iter().map(|&id| id as i64).collect()
        } else {
            self.ids.as_i64().map(|ids| ids.to_vec()).unwrap_or_default()
        };

        ParticleData {
            positions: self.positions.to_array().unwrap_or_else(|| Array2::zeros((0, 3))),
            ids: ids,
            types: self.types.as_i32().map(|types| types.to_vec()).unwrap_or_default(),
        }
    }
}

/// Build a snapshot of all the atoms in `engine`, writing the positions to
/// the `positions` scratch buffer.
///
/// If `wrapped` is false and the engine has a simulation box, positions are
/// unwrapped using the image flags of each atom.
#[time_graph::instrument(name = "snapshot::build_particles")]
pub fn build_particles<'a>(
    engine: Option<&'a dyn Engine>,
    wrapped: bool,
    positions: &'a mut Vec<f32>,
) -> ParticleSnapshot<'a> {
    positions.clear();

    let engine = match engine {
        Some(engine) if engine.natoms() > 0 => engine,
        _ => return ParticleSnapshot::empty(),
    };

    let natoms = engine.natoms();
    let domain = if wrapped { None } else { engine.domain() };

    positions.reserve(3 * natoms);
    for (&position, image) in engine.positions().iter().zip(engine.images()) {
        let position = match domain {
            Some(domain) => domain.unmap(position, image.unpack()),
            None => position,
        };

        positions.push(position[0] as f32);
        positions.push(position[1] as f32);
        positions.push(position[2] as f32);
    }
    debug_assert_eq!(positions.len(), 3 * natoms);

    let ids = match engine.ids() {
        AtomIds::Int32(ids) => BufferView::new(ids, 1),
        AtomIds::Int64(ids) => BufferView::new(ids, 1),
    };

    return ParticleSnapshot {
        positions: BufferView::new(positions, 3),
        ids: ids,
        types: BufferView::new(engine.types(), 1),
        count: natoms,
        generation: 0,
    };
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use crate::{ScalarKind, SimpleEngine};
    use crate::engine::test_utils::{test_engine, unwrapped_positions};
    use super::*;

    #[test]
    fn no_engine() {
        let mut positions = vec![1.0, 2.0, 3.0];
        let snapshot = build_particles(None, false, &mut positions);
        assert!(snapshot.is_empty());
        assert!(snapshot.positions.as_ptr().is_null());
        assert_eq!(snapshot.positions.element_count(), 0);
        assert_eq!(snapshot.ids.element_count(), 0);

        assert!(positions.is_empty());
    }

    #[test]
    fn no_atoms() {
        let engine = test_engine("empty");
        let mut positions = Vec::new();
        let snapshot = build_particles(Some(&engine), false, &mut positions);
        assert_eq!(snapshot.count, 0);
        assert!(snapshot.positions.is_empty());
        assert!(snapshot.types.is_empty());
    }

    #[test]
    fn unwrapped() {
        let engine = test_engine("chain");
        let expected = unwrapped_positions(&engine);

        let mut positions = Vec::new();
        let snapshot = build_particles(Some(&engine), false, &mut positions);
        assert_eq!(snapshot.count, 6);
        assert_eq!(snapshot.positions.element_count(), 18);
        assert_eq!(snapshot.positions.components(), 3);
        assert_eq!(snapshot.positions.scalar_kind(), ScalarKind::Float32);

        let data = snapshot.positions.as_f32().unwrap();
        for (atom, position) in expected.iter().enumerate() {
            for axis in 0..3 {
                assert_relative_eq!(data[3 * atom + axis], position[axis] as f32, epsilon = 1e-5);
            }
        }

        // the chain goes straight through the periodic boundaries
        assert_relative_eq!(data[3 * 5], 7.5, epsilon = 1e-5);
        assert_relative_eq!(data[3 * 5 + 2], -4.0, epsilon = 1e-5);
    }

    #[test]
    fn wrapped() {
        let engine = test_engine("chain");
        let mut positions = Vec::new();
        let snapshot = build_particles(Some(&engine), true, &mut positions);

        let data = snapshot.positions.as_f32().unwrap();
        for (atom, position) in engine.positions().iter().enumerate() {
            for axis in 0..3 {
                assert_eq!(data[3 * atom + axis], position[axis] as f32);
            }
        }
    }

    #[test]
    fn ids_and_types() {
        let engine = test_engine("water");
        let mut positions = Vec::new();
        let snapshot = build_particles(Some(&engine), false, &mut positions);

        assert_eq!(snapshot.ids.scalar_kind(), ScalarKind::Int32);
        assert_eq!(snapshot.ids.as_i32().unwrap(), [1, 2, 3]);
        assert_eq!(snapshot.types.as_i32().unwrap(), [-42, 1, 1]);
        assert_eq!(snapshot.types.as_ptr(), engine.types().as_ptr().cast());

        let mut engine = SimpleEngine::new();
        engine.commands_string("
            atom_modify tag_width 64
            create_box 0 5 0 5 0 5
            create_atom 1 1 1 1 5000000000
        ").unwrap();
        let snapshot = build_particles(Some(&engine), false, &mut positions);
        assert_eq!(snapshot.ids.scalar_kind(), ScalarKind::Int64);
        assert_eq!(snapshot.ids.as_i64().unwrap(), [5000000000]);
    }

    #[test]
    fn owned() {
        let engine = test_engine("water");
        let mut positions = Vec::new();
        let data = build_particles(Some(&engine), true, &mut positions).to_owned();

        assert_eq!(data.positions.shape(), [3, 3]);
        assert_eq!(data.ids, [1, 2, 3]);
        assert_eq!(data.types, [-42, 1, 1]);

        let empty = ParticleSnapshot::empty().to_owned();
        assert_eq!(empty.positions.shape(), [0, 3]);
        assert!(empty.ids.is_empty());
    }
}
