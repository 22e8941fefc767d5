use std::path::Path;

use log::{debug, info, warn};

use crate::{Engine, EngineLauncher, Error, SimpleEngine};
use crate::snapshot::{BondStorage, ScratchBuffers};
use crate::snapshot::{build_particles, build_bonds, build_box};
use crate::snapshot::{ParticleSnapshot, BondSnapshot, BoxSnapshot};

/// State of a `SimulationHandle`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleState {
    /// There is no engine
    Stopped,
    /// The handle owns a live engine
    Running,
}

/// Which snapshot builder produced a view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewSource {
    Particles = 0,
    Bonds = 1,
    Box = 2,
}

/// Track which views are still valid. Every issued view and every change to
/// the engine gets a new, strictly increasing generation number.
#[derive(Debug, Clone, Default)]
struct Generations {
    counter: u64,
    /// generation of the last change to the engine
    invalidated: u64,
    /// generation of the last view issued by each builder
    issued: [u64; 3],
}

impl Generations {
    fn invalidate(&mut self) {
        self.counter += 1;
        self.invalidated = self.counter;
    }

    fn issue(&mut self, source: ViewSource) -> u64 {
        self.counter += 1;
        self.issued[source as usize] = self.counter;
        return self.counter;
    }

    fn is_current(&self, source: ViewSource, generation: u64) -> bool {
        generation != 0
            && generation == self.issued[source as usize]
            && generation > self.invalidated
    }
}

/// A `SimulationHandle` owns the lifetime of at most one simulation engine,
/// and is the only way to get snapshots of the engine state.
///
/// Snapshots borrow the handle: they alias memory owned either by the engine
/// or by the handle's scratch buffers, and the borrow checker prevents using
/// them after the next call which could change this memory. Raw views (e.g.
/// in the C API) can use [`SimulationHandle::is_current`] to check the same
/// thing at runtime.
///
/// All operations are no-ops (returning empty/zero values) when the handle is
/// stopped.
pub struct SimulationHandle {
    launcher: Box<dyn EngineLauncher>,
    engine: Option<Box<dyn Engine>>,
    scratch: ScratchBuffers,
    generations: Generations,
}

impl std::fmt::Debug for SimulationHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationHandle")
            .field("state", &self.state())
            .field("generations", &self.generations)
            .finish_non_exhaustive()
    }
}

impl Default for SimulationHandle {
    fn default() -> SimulationHandle {
        SimulationHandle::new(|| -> Result<Box<dyn Engine>, Error> {
            Ok(Box::new(SimpleEngine::new()))
        })
    }
}

impl SimulationHandle {
    /// Create a new stopped handle, which will use `launcher` to create
    /// engines when started.
    pub fn new(launcher: impl EngineLauncher + 'static) -> SimulationHandle {
        SimulationHandle {
            launcher: Box::new(launcher),
            engine: None,
            scratch: ScratchBuffers::default(),
            generations: Generations::default(),
        }
    }

    /// Start a new engine, stopping the existing one if needed.
    ///
    /// If the engine can not be created, this returns `Error::EngineInit` and
    /// the handle stays stopped.
    pub fn start(&mut self) -> Result<(), Error> {
        self.stop();

        match self.launcher.open() {
            Ok(engine) => {
                info!("opened a new simulation engine");
                self.engine = Some(engine);
                self.generations.invalidate();
                Ok(())
            }
            Err(error) => {
                warn!("failed to start the simulation engine: {}", error);
                match error {
                    Error::EngineInit(_) => Err(error),
                    error => Err(Error::EngineInit(error.to_string())),
                }
            }
        }
    }

    /// Release the engine and clear all scratch buffers. This does nothing if
    /// the handle is already stopped.
    pub fn stop(&mut self) {
        if self.engine.take().is_some() {
            info!("closed the simulation engine");
            self.scratch.clear();
            self.generations.invalidate();
        }
    }

    /// Get the current state of this handle
    pub fn state(&self) -> HandleState {
        if self.engine.is_some() {
            HandleState::Running
        } else {
            HandleState::Stopped
        }
    }

    /// Get the engine, if the handle is running
    pub fn engine(&self) -> Option<&dyn Engine> {
        self.engine.as_deref()
    }

    /// Run the simulation for `steps` steps. `apply_pre` and `apply_post`
    /// control whether the engine does its full setup before the run and its
    /// full cleanup after. This does nothing if the handle is stopped or
    /// `steps` is not positive.
    #[time_graph::instrument(name = "SimulationHandle::advance")]
    pub fn advance(&mut self, steps: i64, apply_pre: bool, apply_post: bool) -> Result<(), Error> {
        if steps <= 0 {
            return Ok(());
        }

        let engine = match &mut self.engine {
            Some(engine) => engine,
            None => return Ok(()),
        };

        debug!("advancing the simulation by {} steps", steps);
        let command = format!(
            "run {} pre {} post {}\n",
            steps,
            if apply_pre { "yes" } else { "no" },
            if apply_post { "yes" } else { "no" },
        );

        self.generations.invalidate();
        return engine.commands_string(&command);
    }

    /// Execute a single command. A trailing newline is added if needed. This
    /// does nothing if the handle is stopped or `command` is empty.
    pub fn run_command(&mut self, command: &str) -> Result<(), Error> {
        if command.is_empty() {
            return Ok(());
        }

        if command.ends_with('\n') {
            self.execute_script(command)
        } else {
            self.execute_script(&format!("{}\n", command))
        }
    }

    /// Execute a multi-line script, after converting all line endings to
    /// `\n`. This does nothing if the handle is stopped or `script` is empty.
    pub fn run_script(&mut self, script: &str) -> Result<(), Error> {
        if script.is_empty() {
            return Ok(());
        }

        let script = script.replace("\r\n", "\n").replace('\r', "\n");
        self.execute_script(&script)
    }

    /// Execute all the commands in the file at `path`. This does nothing if
    /// the handle is stopped or `path` is empty.
    pub fn run_file(&mut self, path: impl AsRef<Path>) -> Result<(), Error> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Ok(());
        }

        if let Some(engine) = &mut self.engine {
            self.generations.invalidate();
            engine.file(path)?;
        }

        Ok(())
    }

    fn execute_script(&mut self, script: &str) -> Result<(), Error> {
        if let Some(engine) = &mut self.engine {
            self.generations.invalidate();
            engine.commands_string(script)?;
        }

        Ok(())
    }
}

/// Queries
impl SimulationHandle {
    /// Does this handle own an engine?
    pub fn is_ready(&self) -> bool {
        self.engine.is_some()
    }

    /// Is the engine currently executing a run?
    pub fn is_running(&self) -> bool {
        self.engine.as_ref().map_or(false, |engine| engine.is_running())
    }

    /// Get the current timestep counter, or 0 when stopped
    pub fn current_step(&self) -> i64 {
        self.engine.as_ref().map_or(0, |engine| engine.current_step())
    }

    /// Get the size of a timestep, or 0 when stopped
    pub fn timestep_size(&self) -> f64 {
        self.engine.as_ref().map_or(0.0, |engine| engine.timestep())
    }

    /// Get the number of atoms, or 0 when stopped
    pub fn num_atoms(&self) -> usize {
        self.engine.as_ref().map_or(0, |engine| engine.natoms())
    }

    /// Get the number of bonds reported by the engine, or 0 when stopped
    pub fn num_bonds(&self) -> usize {
        self.engine.as_ref().map_or(0, |engine| engine.nbonds())
    }
}

/// Snapshots
impl SimulationHandle {
    fn issue(&mut self, source: ViewSource) -> u64 {
        if self.engine.is_some() {
            self.generations.issue(source)
        } else {
            0
        }
    }

    /// Get a snapshot of all atoms. If `wrapped` is false, positions are
    /// unwrapped with the image flags of the atoms.
    pub fn particles(&mut self, wrapped: bool) -> ParticleSnapshot<'_> {
        let generation = self.issue(ViewSource::Particles);
        let mut snapshot = build_particles(self.engine.as_deref(), wrapped, &mut self.scratch.positions);
        snapshot.generation = generation;
        return snapshot;
    }

    /// Get a snapshot of all bonds, each bond appearing once. If `wrapped` is
    /// false, bonds are unwrapped and use the minimum image convention.
    pub fn bonds(&mut self, wrapped: bool) -> BondSnapshot<'_> {
        let generation = self.issue(ViewSource::Bonds);
        let engine = self.engine.as_deref();
        let storage = BondStorage::from_newton_bond(engine.map_or(true, |engine| engine.newton_bond()));
        let mut snapshot = build_bonds(engine, storage, wrapped, &mut self.scratch.bonds);
        snapshot.generation = generation;
        return snapshot;
    }

    /// Get a snapshot of the simulation box
    pub fn simulation_box(&mut self) -> BoxSnapshot<'_> {
        let generation = self.issue(ViewSource::Box);
        let mut snapshot = build_box(self.engine.as_deref(), &mut self.scratch.cell);
        snapshot.generation = generation;
        return snapshot;
    }

    /// Check if a view with the given `generation`, produced by `source`, is
    /// still valid. Views are invalidated by the next call to the same
    /// builder, and by any call which can change the engine (start, stop,
    /// advance, commands and files).
    pub fn is_current(&self, source: ViewSource, generation: u64) -> bool {
        self.engine.is_some() && self.generations.is_current(source, generation)
    }
}
