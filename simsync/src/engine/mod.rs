use std::path::Path;

use crate::{Error, Vector3D};

mod image;
pub use self::image::PackedImage;

mod domain;
pub use self::domain::Domain;

mod commands;

mod simple_engine;
pub use self::simple_engine::{SimpleEngine, TagWidth};

#[cfg(test)]
pub(crate) mod test_utils;

/// Atom identifiers (tags) stored by an engine. Engines use either 32-bit or
/// 64-bit integers for tags, and snapshots must report the right width to
/// their consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtomIds<'a> {
    /// 32-bit tags
    Int32(&'a [i32]),
    /// 64-bit tags
    Int64(&'a [i64]),
}

impl<'a> AtomIds<'a> {
    /// Get the number of tags
    pub fn len(&self) -> usize {
        match self {
            AtomIds::Int32(ids) => ids.len(),
            AtomIds::Int64(ids) => ids.len(),
        }
    }

    /// Check if there are no tags
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the tag of the atom at index `atom`, if any
    pub fn get(&self, atom: usize) -> Option<i64> {
        match self {
            AtomIds::Int32(ids) => ids.get(atom).map(|&id| id as i64),
            AtomIds::Int64(ids) => ids.get(atom).copied(),
        }
    }
}

/// An `Engine` is a running molecular dynamics simulation, as seen from
/// `simsync`. The engine owns all atomic data and mutates it in place when
/// executing commands; everything in this trait is read-only except for the
/// command submission functions.
///
/// All per-atom slices (`positions`, `ids`, `types`, `images`) must contain
/// exactly `natoms()` entries, indexed by the local atom index. Slices
/// returned by an engine stay valid until the next call to one of the `&mut
/// self` functions.
pub trait Engine: std::panic::RefUnwindSafe {
    /// Get the number of atoms in the simulation
    fn natoms(&self) -> usize;

    /// Get the positions of all atoms, wrapped inside the box
    fn positions(&self) -> &[Vector3D];

    /// Get the tags of all atoms
    fn ids(&self) -> AtomIds<'_>;

    /// Get the atomic types of all atoms
    fn types(&self) -> &[i32];

    /// Get the packed image flags of all atoms
    fn images(&self) -> &[PackedImage];

    /// Get the total number of bonds in the simulation, as reported by the
    /// engine
    fn nbonds(&self) -> usize;

    /// Get the tags of the bond partners stored on the atom at index `atom`.
    ///
    /// Depending on `newton_bond`, a bond between two atoms is either stored
    /// only once on one of the atoms, or on both of them.
    fn bond_partners(&self, atom: usize) -> &[i64];

    /// Get the local index of the atom with the given `tag`, if it exists
    fn map(&self, tag: i64) -> Option<usize>;

    /// Get the Newton's third law flag for bonds. When this is `true`, each
    /// bond is stored only once; when it is `false`, each bond is stored on
    /// both atoms.
    fn newton_bond(&self) -> bool;

    /// Get the simulation box, or `None` if the box was not defined yet
    fn domain(&self) -> Option<&Domain>;

    /// Get the current timestep counter
    fn current_step(&self) -> i64;

    /// Get the size of a single timestep
    fn timestep(&self) -> f64;

    /// Is the engine currently executing a `run`?
    fn is_running(&self) -> bool;

    /// Execute all the commands in `script`, one per line
    fn commands_string(&mut self, script: &str) -> Result<(), Error>;

    /// Execute all the commands in the file at `path`
    fn file(&mut self, path: &Path) -> Result<(), Error>;
}

/// An `EngineLauncher` creates new engine instances, each time a
/// `SimulationHandle` is started.
pub trait EngineLauncher: std::panic::RefUnwindSafe {
    /// Create a new engine instance, or fail with `Error::EngineInit`
    fn open(&self) -> Result<Box<dyn Engine>, Error>;
}

impl<F> EngineLauncher for F where F: Fn() -> Result<Box<dyn Engine>, Error> + std::panic::RefUnwindSafe {
    fn open(&self) -> Result<Box<dyn Engine>, Error> {
        self()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atom_ids() {
        let small = [3, 1, 2];
        let ids = AtomIds::Int32(&small);
        assert_eq!(ids.len(), 3);
        assert_eq!(ids.get(1), Some(1));
        assert_eq!(ids.get(3), None);

        let big = [1_i64 << 40];
        let ids = AtomIds::Int64(&big);
        assert_eq!(ids.get(0), Some(1 << 40));
        assert!(AtomIds::Int64(&[]).is_empty());
    }

    #[test]
    fn closure_launcher() {
        let launcher = || -> Result<Box<dyn Engine>, Error> {
            Ok(Box::new(SimpleEngine::new()))
        };
        let engine = launcher.open().unwrap();
        assert_eq!(engine.natoms(), 0);

        let failing = || -> Result<Box<dyn Engine>, Error> {
            Err(Error::EngineInit("no license".into()))
        };
        assert!(matches!(failing.open(), Err(Error::EngineInit(_))));
    }
}
