#![allow(dead_code)]

use simsync::{SimulationHandle, Vector3D, BondSnapshot};

/// Path of an input script in the test data directory
pub fn script_path(name: &str) -> String {
    format!("tests/data/{}", name)
}

/// Create a running handle, and execute the given input script in it
pub fn started_handle(name: &str) -> SimulationHandle {
    let mut handle = SimulationHandle::default();
    handle.start().expect("failed to start the engine");
    handle.run_file(script_path(name)).expect("failed to run input script");
    return handle;
}

/// Extract the pairs of positions from a bond snapshot
pub fn bond_pairs(snapshot: &BondSnapshot<'_>) -> Vec<(Vector3D, Vector3D)> {
    let first = snapshot.first.as_f32().expect("bonds should be f32");
    let second = snapshot.second.as_f32().expect("bonds should be f32");

    first.chunks_exact(3).zip(second.chunks_exact(3))
        .map(|(a, b)| (to_vector(a), to_vector(b)))
        .collect()
}

/// Extract the positions from a flat buffer of `f32`
pub fn positions(data: &[f32]) -> Vec<Vector3D> {
    data.chunks_exact(3).map(to_vector).collect()
}

fn to_vector(data: &[f32]) -> Vector3D {
    Vector3D::new(data[0] as f64, data[1] as f64, data[2] as f64)
}
