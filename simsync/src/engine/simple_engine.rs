use std::collections::HashMap;
use std::path::Path;

use log::info;

use crate::{Error, Vector3D};

use super::{Engine, AtomIds, Domain, PackedImage};
use super::commands::{self, Command, Group, BoxBounds};

/// Maximal depth of nested `include` commands
const MAX_INCLUDE_DEPTH: usize = 16;
/// Atoms are wrapped back inside the box every `REMAP_EVERY` steps during a
/// run
const REMAP_EVERY: i64 = 10;

/// Width of the integers used to store atom tags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagWidth {
    /// Tags are stored as `i32`
    Int32,
    /// Tags are stored as `i64`
    Int64,
}

#[derive(Debug, Clone)]
enum Tags {
    Int32(Vec<i32>),
    Int64(Vec<i64>),
}

impl Tags {
    fn new(width: TagWidth) -> Tags {
        match width {
            TagWidth::Int32 => Tags::Int32(Vec::new()),
            TagWidth::Int64 => Tags::Int64(Vec::new()),
        }
    }

    fn width(&self) -> TagWidth {
        match self {
            Tags::Int32(_) => TagWidth::Int32,
            Tags::Int64(_) => TagWidth::Int64,
        }
    }

    fn get(&self, atom: usize) -> i64 {
        match self {
            Tags::Int32(tags) => tags[atom] as i64,
            Tags::Int64(tags) => tags[atom],
        }
    }

    fn push(&mut self, tag: i64) -> Result<(), Error> {
        match self {
            Tags::Int32(tags) => {
                let tag = i32::try_from(tag).map_err(|_| Error::Engine(format!(
                    "atom tag {} does not fit in 32-bit, use 'atom_modify tag_width 64'", tag
                )))?;
                tags.push(tag);
            }
            Tags::Int64(tags) => tags.push(tag),
        }
        Ok(())
    }

    fn swap_remove(&mut self, atom: usize) {
        match self {
            Tags::Int32(tags) => { tags.swap_remove(atom); },
            Tags::Int64(tags) => { tags.swap_remove(atom); },
        }
    }
}

/// A simple in-process implementation of `Engine`, to use when no other is
/// available.
///
/// This engine keeps all atoms in memory and understands a small set of
/// input commands (`create_box`, `create_atom`, `create_bond`, `run`, ...).
/// Running the simulation only moves atoms along their velocities, wrapping
/// them back inside the box from time to time: there are no forces.
#[derive(Debug, Clone)]
pub struct SimpleEngine {
    domain: Option<Domain>,
    periodicity: [bool; 3],
    tags: Tags,
    types: Vec<i32>,
    positions: Vec<Vector3D>,
    velocities: Vec<Vector3D>,
    images: Vec<PackedImage>,
    /// all bonds, in creation order
    bonds: Vec<(i64, i64)>,
    /// partners of each atom, laid out according to `newton_bond`
    bond_atoms: Vec<Vec<i64>>,
    newton_bond: bool,
    /// tag => local index
    map: HashMap<i64, usize>,
    next_tag: i64,
    timestep: f64,
    step: i64,
    running: bool,
    include_depth: usize,
}

impl Default for SimpleEngine {
    fn default() -> SimpleEngine {
        SimpleEngine::new()
    }
}

impl SimpleEngine {
    /// Create a new empty engine, without any simulation box
    pub fn new() -> SimpleEngine {
        SimpleEngine {
            domain: None,
            periodicity: [true, true, true],
            tags: Tags::new(TagWidth::Int32),
            types: Vec::new(),
            positions: Vec::new(),
            velocities: Vec::new(),
            images: Vec::new(),
            bonds: Vec::new(),
            bond_atoms: Vec::new(),
            newton_bond: true,
            map: HashMap::new(),
            next_tag: 1,
            timestep: 0.005,
            step: 0,
            running: false,
            include_depth: 0,
        }
    }

    /// Set the width of the integers used to store atom tags. This is only
    /// possible before any atom is created.
    pub fn set_tag_width(&mut self, width: TagWidth) -> Result<(), Error> {
        if width == self.tags.width() {
            return Ok(());
        }

        if !self.types.is_empty() {
            return Err(Error::Engine(
                "can not change the tag width after atoms have been created".into()
            ));
        }

        self.tags = Tags::new(width);
        Ok(())
    }

    /// Set the periodicity of the simulation box along each axis
    pub fn set_periodicity(&mut self, periodic: [bool; 3]) {
        self.periodicity = periodic;
        if let Some(domain) = self.domain {
            self.domain = Some(domain.with_periodicity(periodic));
        }
    }

    /// Set the simulation box, replacing any existing one. Existing atoms are
    /// wrapped back inside the new box, and the periodicity of the engine
    /// overrides the one of `domain`.
    pub fn set_domain(&mut self, domain: Domain) {
        self.domain = Some(domain.with_periodicity(self.periodicity));
        self.remap_all();
    }

    /// Set the bond storage mode. With `newton_bond`, each bond is stored on
    /// the first atom only; otherwise it is stored on both atoms.
    pub fn set_newton_bond(&mut self, newton_bond: bool) {
        if self.newton_bond != newton_bond {
            self.newton_bond = newton_bond;
            self.layout_bonds();
        }
    }

    /// Add an atom with the given type and position, returning its tag. If
    /// `tag` is `None`, a new tag is assigned automatically.
    pub fn add_atom(&mut self, atom_type: i32, position: Vector3D, tag: Option<i64>) -> Result<i64, Error> {
        let domain = self.domain.ok_or_else(|| Error::Engine(
            "can not create atoms before the simulation box".into()
        ))?;

        let tag = tag.unwrap_or(self.next_tag);
        if tag <= 0 {
            return Err(Error::Engine(format!("atom tags must be positive, got {}", tag)));
        }

        if self.map.contains_key(&tag) {
            return Err(Error::Engine(format!("there is already an atom with tag {}", tag)));
        }

        let next_tag = tag.checked_add(1).ok_or_else(|| Error::Engine(format!(
            "atom tag {} is too large", tag
        )))?;

        if !is_finite(position) {
            return Err(Error::Engine("atom positions must be finite".into()));
        }

        if !domain.contains(position) {
            return Err(Error::Engine(format!(
                "atom at [{}, {}, {}] is outside of the non-periodic box", position[0], position[1], position[2]
            )));
        }

        let mut image = [0, 0, 0];
        let position = domain.remap(position, &mut image);
        let image = PackedImage::new(image);

        // this is the only push which can fail, all per-atom arrays are
        // updated together after it
        self.tags.push(tag)?;

        self.map.insert(tag, self.types.len());
        self.types.push(atom_type);
        self.positions.push(position);
        self.velocities.push(Vector3D::zero());
        self.images.push(image);
        self.bond_atoms.push(Vec::new());
        self.next_tag = i64::max(self.next_tag, next_tag);

        return Ok(tag);
    }

    /// Remove the atom with the given `tag`. The last atom takes the local
    /// index of the removed one. Bonds involving the removed atom are
    /// forgotten, but the other atom may still store the now dangling tag.
    pub fn delete_atom(&mut self, tag: i64) -> Result<(), Error> {
        let atom = self.map.remove(&tag).ok_or_else(|| unknown_tag(tag))?;

        self.tags.swap_remove(atom);
        self.types.swap_remove(atom);
        self.positions.swap_remove(atom);
        self.velocities.swap_remove(atom);
        self.images.swap_remove(atom);
        self.bond_atoms.swap_remove(atom);

        if atom < self.types.len() {
            self.map.insert(self.tags.get(atom), atom);
        }

        self.bonds.retain(|&(first, second)| first != tag && second != tag);

        Ok(())
    }

    /// Add a bond between the atoms with tags `first` and `second`
    pub fn add_bond(&mut self, first: i64, second: i64) -> Result<(), Error> {
        if first == second {
            return Err(Error::Engine(format!("can not bond atom {} to itself", first)));
        }

        let i = self.map.get(&first).copied().ok_or_else(|| unknown_tag(first))?;
        let j = self.map.get(&second).copied().ok_or_else(|| unknown_tag(second))?;

        self.bonds.push((first, second));
        self.bond_atoms[i].push(second);
        if !self.newton_bond {
            self.bond_atoms[j].push(first);
        }

        Ok(())
    }

    fn layout_bonds(&mut self) {
        for partners in &mut self.bond_atoms {
            partners.clear();
        }

        for &(first, second) in &self.bonds {
            let (i, j) = match (self.map.get(&first), self.map.get(&second)) {
                (Some(&i), Some(&j)) => (i, j),
                _ => continue,
            };

            self.bond_atoms[i].push(second);
            if !self.newton_bond {
                self.bond_atoms[j].push(first);
            }
        }
    }

    fn group_atoms(&self, group: Group) -> Result<Vec<usize>, Error> {
        match group {
            Group::All => Ok((0..self.types.len()).collect()),
            Group::Tag(tag) => {
                let atom = self.map.get(&tag).copied().ok_or_else(|| unknown_tag(tag))?;
                Ok(vec![atom])
            }
        }
    }

    fn remap_all(&mut self) {
        if let Some(domain) = self.domain {
            for (position, image) in self.positions.iter_mut().zip(&mut self.images) {
                let mut flags = image.unpack();
                *position = domain.remap(*position, &mut flags);
                *image = PackedImage::new(flags);
            }
        }
    }

    fn clear(&mut self) {
        let width = self.tags.width();
        *self = SimpleEngine {
            tags: Tags::new(width),
            include_depth: self.include_depth,
            ..SimpleEngine::new()
        };
    }

    fn run(&mut self, steps: i64, pre: bool, post: bool) -> Result<(), Error> {
        if self.domain.is_none() {
            return Err(Error::Engine("can not run before the simulation box is defined".into()));
        }

        self.running = true;
        if pre {
            self.remap_all();
        }

        for _ in 0..steps {
            for (position, velocity) in self.positions.iter_mut().zip(&self.velocities) {
                *position += self.timestep * velocity;
            }

            self.step += 1;
            if self.step % REMAP_EVERY == 0 {
                self.remap_all();
            }
        }

        if post {
            self.remap_all();
            info!(
                "ran {} steps with {} atoms, now at step {}",
                steps, self.types.len(), self.step
            );
        }
        self.running = false;

        Ok(())
    }

    fn execute(&mut self, command: Command) -> Result<(), Error> {
        match command {
            Command::Clear => self.clear(),
            Command::Boundary(periodic) => self.set_periodicity(periodic),
            Command::TagWidth(width) => self.set_tag_width(width)?,
            Command::NewtonBond(newton_bond) => self.set_newton_bond(newton_bond),
            Command::CreateBox(bounds) => {
                if self.domain.is_some() {
                    return Err(Error::Engine("the simulation box is already defined".into()));
                }
                self.set_domain(domain_from_bounds(bounds)?);
            }
            Command::ChangeBox(bounds) => {
                if self.domain.is_none() {
                    return Err(Error::Engine("change_box used before the simulation box is defined".into()));
                }
                self.set_domain(domain_from_bounds(bounds)?);
            }
            Command::CreateAtom { atom_type, position, tag } => {
                self.add_atom(atom_type, position, tag)?;
            }
            Command::DeleteAtom(tag) => self.delete_atom(tag)?,
            Command::CreateBond(first, second) => self.add_bond(first, second)?,
            Command::Velocity(group, velocity) => {
                for atom in self.group_atoms(group)? {
                    self.velocities[atom] = velocity;
                }
            }
            Command::Displace(group, displacement) => {
                if !is_finite(displacement) {
                    return Err(Error::Engine("displacements must be finite".into()));
                }

                let atoms = self.group_atoms(group)?;
                for &atom in &atoms {
                    self.positions[atom] += displacement;
                }

                if let Some(domain) = self.domain {
                    for atom in atoms {
                        let mut flags = self.images[atom].unpack();
                        self.positions[atom] = domain.remap(self.positions[atom], &mut flags);
                        self.images[atom] = PackedImage::new(flags);
                    }
                }
            }
            Command::Timestep(timestep) => self.timestep = timestep,
            Command::ResetTimestep(step) => self.step = step,
            Command::Run { steps, pre, post } => self.run(steps, pre, post)?,
            Command::Include(path) => self.file(&path)?,
        }

        Ok(())
    }
}

fn domain_from_bounds(bounds: BoxBounds) -> Result<Domain, Error> {
    Domain::triclinic(bounds.lo, bounds.hi, bounds.tilt).map_err(|error| match error {
        Error::InvalidParameter(message) => Error::Engine(message),
        error => error,
    })
}

fn is_finite(vector: Vector3D) -> bool {
    vector.as_array().iter().all(|value| value.is_finite())
}

fn unknown_tag(tag: i64) -> Error {
    Error::Engine(format!("there is no atom with tag {}", tag))
}

impl Engine for SimpleEngine {
    fn natoms(&self) -> usize {
        self.types.len()
    }

    fn positions(&self) -> &[Vector3D] {
        &self.positions
    }

    fn ids(&self) -> AtomIds<'_> {
        match &self.tags {
            Tags::Int32(tags) => AtomIds::Int32(tags),
            Tags::Int64(tags) => AtomIds::Int64(tags),
        }
    }

    fn types(&self) -> &[i32] {
        &self.types
    }

    fn images(&self) -> &[PackedImage] {
        &self.images
    }

    fn nbonds(&self) -> usize {
        self.bonds.len()
    }

    fn bond_partners(&self, atom: usize) -> &[i64] {
        &self.bond_atoms[atom]
    }

    fn map(&self, tag: i64) -> Option<usize> {
        self.map.get(&tag).copied()
    }

    fn newton_bond(&self) -> bool {
        self.newton_bond
    }

    fn domain(&self) -> Option<&Domain> {
        self.domain.as_ref()
    }

    fn current_step(&self) -> i64 {
        self.step
    }

    fn timestep(&self) -> f64 {
        self.timestep
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn commands_string(&mut self, script: &str) -> Result<(), Error> {
        for (line_number, line) in script.lines().enumerate() {
            let command = commands::parse(line).map_err(|error| at_line(error, line_number))?;
            if let Some(command) = command {
                self.execute(command).map_err(|error| at_line(error, line_number))?;
            }
        }
        Ok(())
    }

    fn file(&mut self, path: &Path) -> Result<(), Error> {
        if self.include_depth >= MAX_INCLUDE_DEPTH {
            return Err(Error::Engine(format!(
                "too many nested includes while reading '{}'", path.display()
            )));
        }

        let script = std::fs::read_to_string(path).map_err(|error| Error::Engine(format!(
            "can not read '{}': {}", path.display(), error
        )))?;

        self.include_depth += 1;
        let result = self.commands_string(&script);
        self.include_depth -= 1;

        return result;
    }
}

fn at_line(error: Error, line_number: usize) -> Error {
    match error {
        Error::Engine(message) => Error::Engine(format!("{} (line {})", message, line_number + 1)),
        error => error,
    }
}
