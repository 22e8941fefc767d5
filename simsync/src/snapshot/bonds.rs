use log::debug;
use ndarray::Array2;

use crate::{BufferView, Engine, Vector3D};

use super::{BondBuffers, BondStorage};

/// Positions of the two ends of all bonds in the simulation. Each bond
/// appears exactly once.
#[derive(Debug, Clone, Copy)]
pub struct BondSnapshot<'a> {
    /// Position of the first atom of each bond, 3 values per bond
    pub first: BufferView<'a>,
    /// Position of the second atom of each bond, 3 values per bond
    pub second: BufferView<'a>,
    /// Number of bonds
    pub count: usize,
    /// Generation at which this snapshot was created, or 0 if it was not
    /// created by a running `SimulationHandle`
    pub generation: u64,
}

/// Owned copy of a `BondSnapshot`
#[derive(Debug, Clone, PartialEq)]
pub struct BondData {
    /// Position of the first atom of each bond, with shape `(count, 3)`
    pub first: Array2<f32>,
    /// Position of the second atom of each bond, with shape `(count, 3)`
    pub second: Array2<f32>,
}

impl<'a> BondSnapshot<'a> {
    /// Get an empty snapshot, without bonds
    pub fn empty() -> BondSnapshot<'a> {
        BondSnapshot {
            first: BufferView::empty::<f32>(3),
            second: BufferView::empty::<f32>(3),
            count: 0,
            generation: 0,
        }
    }

    /// Is this snapshot empty?
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Copy the data in this snapshot to owned memory
    pub fn to_owned(&self) -> BondData {
        BondData {
            first: self.first.to_array().unwrap_or_else(|| Array2::zeros((0, 3))),
            second: self.second.to_array().unwrap_or_else(|| Array2::zeros((0, 3))),
        }
    }
}

fn push_position(buffer: &mut Vec<f32>, position: Vector3D) {
    buffer.push(position[0] as f32);
    buffer.push(position[1] as f32);
    buffer.push(position[2] as f32);
}

/// Build a snapshot of all bonds in `engine`, writing the positions of both
/// ends to the `scratch` buffers.
///
/// With `BondStorage::Mirrored`, a bond between atoms `i` and `j` is found on
/// both atoms, and only emitted from the atom with the smallest local index.
/// Bonds pointing to atoms that can not be found are skipped.
///
/// If `wrapped` is false and the engine has a simulation box, the first end
/// of each bond is the unwrapped position of the first atom, and the second
/// end is placed at the minimum image of the second atom relative to the
/// first one.
#[time_graph::instrument(name = "snapshot::build_bonds")]
pub fn build_bonds<'a>(
    engine: Option<&'a dyn Engine>,
    storage: BondStorage,
    wrapped: bool,
    scratch: &'a mut BondBuffers,
) -> BondSnapshot<'a> {
    scratch.clear();

    let engine = match engine {
        Some(engine) => engine,
        None => return BondSnapshot::empty(),
    };

    let natoms = engine.natoms();
    let positions = engine.positions();
    let images = engine.images();
    let domain = if wrapped { None } else { engine.domain() };

    let BondBuffers { first, second } = scratch;

    let mut dropped = 0;
    for i in 0..natoms {
        let partners = engine.bond_partners(i);
        if partners.is_empty() {
            continue;
        }

        let start = match domain {
            Some(domain) => domain.unmap(positions[i], images[i].unpack()),
            None => positions[i],
        };

        for &partner in partners {
            let j = match engine.map(partner) {
                Some(j) if j < natoms => j,
                _ => {
                    dropped += 1;
                    continue;
                }
            };

            if storage == BondStorage::Mirrored && i >= j {
                continue;
            }

            let end = match domain {
                Some(domain) => {
                    let other = domain.unmap(positions[j], images[j].unpack());
                    start + domain.minimum_image(other - start)
                }
                None => positions[j],
            };

            push_position(first, start);
            push_position(second, end);
        }
    }

    if dropped != 0 {
        debug!("skipped {} bonds pointing to unknown atoms", dropped);
    }

    let count = first.len() / 3;
    return BondSnapshot {
        first: BufferView::new(first, 3),
        second: BufferView::new(second, 3),
        count: count,
        generation: 0,
    };
}
