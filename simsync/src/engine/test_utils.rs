use crate::Vector3D;
use super::{Domain, SimpleEngine, Engine};

pub fn test_engine(name: &str) -> SimpleEngine {
    match name {
        "empty" => get_empty(),
        "dimer" => get_dimer(),
        "water" => get_water(),
        "chain" => get_chain(),
        "triclinic" => get_triclinic(),
        _ => panic!("unknown test engine {}", name)
    }
}

/// Box without atoms
fn get_empty() -> SimpleEngine {
    let mut engine = SimpleEngine::new();
    engine.set_domain(cube(10.0));
    return engine;
}

/// Two bonded atoms, on both sides of the periodic boundary along x
fn get_dimer() -> SimpleEngine {
    let mut engine = SimpleEngine::new();
    engine.set_domain(cube(10.0));
    engine.add_atom(1, Vector3D::new(9.5, 5.0, 5.0), None).unwrap();
    engine.add_atom(1, Vector3D::new(0.5, 5.0, 5.0), None).unwrap();
    engine.add_bond(1, 2).unwrap();
    return engine;
}

fn get_water() -> SimpleEngine {
    let mut engine = SimpleEngine::new();
    engine.set_domain(cube(10.0));
    // types do not have to be atomic numbers
    engine.add_atom(-42, Vector3D::new(0.0, 0.0, 0.0), None).unwrap();
    engine.add_atom(1, Vector3D::new(0.0, 0.75545, -0.58895), None).unwrap();
    engine.add_atom(1, Vector3D::new(0.0, -0.75545, -0.58895), None).unwrap();
    engine.add_bond(1, 2).unwrap();
    engine.add_bond(1, 3).unwrap();
    return engine;
}

/// Linear chain of 6 atoms wrapping around the box several times, with
/// non-trivial image flags
fn get_chain() -> SimpleEngine {
    let mut engine = SimpleEngine::new();
    engine.set_domain(cube(4.0));
    for i in 0..6 {
        let position = Vector3D::new(1.5 * i as f64, 1.0, -0.8 * i as f64);
        engine.add_atom(2, position, None).unwrap();
    }
    for tag in 1..6 {
        engine.add_bond(tag, tag + 1).unwrap();
    }
    return engine;
}

/// Triclinic box with a bond crossing the tilted boundary
fn get_triclinic() -> SimpleEngine {
    let mut engine = SimpleEngine::new();
    let domain = Domain::triclinic(
        Vector3D::new(-1.0, 0.0, 2.0),
        Vector3D::new(9.0, 8.0, 8.0),
        [2.0, 1.0, 3.0],
    ).unwrap();
    engine.set_domain(domain);
    engine.add_atom(1, Vector3D::new(1.0, 7.5, 3.0), None).unwrap();
    engine.add_atom(2, Vector3D::new(3.0, 8.5, 3.0), None).unwrap();
    engine.add_atom(3, Vector3D::new(4.0, 7.0, 4.0), None).unwrap();
    engine.add_bond(1, 2).unwrap();
    engine.add_bond(2, 3).unwrap();
    return engine;
}

fn cube(length: f64) -> Domain {
    Domain::orthogonal(Vector3D::zero(), Vector3D::new(length, length, length)).unwrap()
}

/// Get the unwrapped positions of all atoms in `engine`
pub fn unwrapped_positions(engine: &dyn Engine) -> Vec<Vector3D> {
    let domain = engine.domain().expect("missing domain");
    engine.positions().iter()
        .zip(engine.images())
        .map(|(&position, image)| domain.unmap(position, image.unpack()))
        .collect()
}
