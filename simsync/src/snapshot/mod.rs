//! Snapshot builders, reading the current state of an [`Engine`] and
//! exposing it as [`BufferView`]s.
//!
//! Builders refresh a scratch buffer owned by the caller (usually the
//! `SimulationHandle`), and return views over this buffer and over the
//! engine's own memory. These views stay valid until the next call to the same
//! builder, or until the engine changes.
//!
//! [`Engine`]: crate::Engine
//! [`BufferView`]: crate::BufferView

use crate::Error;

mod particles;
pub use self::particles::{build_particles, ParticleSnapshot, ParticleData};

mod bonds;
pub use self::bonds::{build_bonds, BondSnapshot, BondData};

mod cell;
pub use self::cell::{build_box, BoxSnapshot, BoxData};

/// Options for particles and bonds snapshot requests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[derive(serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
#[serde(deny_unknown_fields, default)]
pub struct SnapshotOptions {
    /// Use the positions as stored by the engine, wrapped inside the box,
    /// instead of unwrapping them with the image flags
    pub wrapped: bool,
    /// Return owned copies of the data instead of views aliasing the
    /// simulation memory
    pub copy: bool,
}

impl SnapshotOptions {
    /// Parse options from a JSON string. An empty string gives the default
    /// options.
    pub fn from_json(json: &str) -> Result<SnapshotOptions, Error> {
        if json.trim().is_empty() {
            return Ok(SnapshotOptions::default());
        }
        return Ok(serde_json::from_str(json)?);
    }
}

/// Options for box snapshot requests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[derive(serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
#[serde(deny_unknown_fields, default)]
pub struct BoxOptions {
    /// Return owned copies of the data instead of views aliasing the
    /// simulation memory
    pub copy: bool,
}

impl BoxOptions {
    /// Parse options from a JSON string. An empty string gives the default
    /// options.
    pub fn from_json(json: &str) -> Result<BoxOptions, Error> {
        if json.trim().is_empty() {
            return Ok(BoxOptions::default());
        }
        return Ok(serde_json::from_str(json)?);
    }
}

/// How bonds are stored by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BondStorage {
    /// Each bond is stored once, on one of the two atoms
    Unique,
    /// Each bond is stored on both atoms
    Mirrored,
}

impl BondStorage {
    /// Get the storage mode corresponding to the engine's Newton's third law
    /// flag for bonds
    pub fn from_newton_bond(newton_bond: bool) -> BondStorage {
        if newton_bond {
            BondStorage::Unique
        } else {
            BondStorage::Mirrored
        }
    }
}

/// Scratch memory for the two ends of the bonds
#[derive(Debug, Clone, Default)]
pub struct BondBuffers {
    /// Position of the first atom of each bond, 3 values per bond
    pub first: Vec<f32>,
    /// Position of the second atom of each bond, 3 values per bond
    pub second: Vec<f32>,
}

impl BondBuffers {
    pub fn clear(&mut self) {
        self.first.clear();
        self.second.clear();
    }
}

/// Scratch memory for the box geometry
#[derive(Debug, Clone, Default)]
pub struct BoxBuffers {
    /// Cell vectors, one per row
    pub matrix: [f64; 9],
    pub origin: [f64; 3],
    pub lengths: [f64; 3],
}

impl BoxBuffers {
    pub fn clear(&mut self) {
        self.matrix = [0.0; 9];
        self.origin = [0.0; 3];
        self.lengths = [0.0; 3];
    }
}

/// All the scratch memory used by the snapshot builders
#[derive(Debug, Clone, Default)]
pub struct ScratchBuffers {
    pub positions: Vec<f32>,
    pub bonds: BondBuffers,
    pub cell: BoxBuffers,
}

impl ScratchBuffers {
    /// Reset all buffers to empty/zero
    pub fn clear(&mut self) {
        self.positions.clear();
        self.bonds.clear();
        self.cell.clear();
    }
}
