use simsync::{SimulationHandle, HandleState, ViewSource, Engine, Error};

mod data;

#[test]
fn stop_clears_snapshots() {
    let mut handle = data::started_handle("water-box.in");
    assert_eq!(handle.particles(false).count, 9);
    assert_eq!(handle.bonds(false).count, 6);

    handle.stop();
    assert_eq!(handle.state(), HandleState::Stopped);

    let particles = handle.particles(false);
    assert_eq!(particles.count, 0);
    assert!(particles.positions.is_empty());
    assert!(particles.ids.is_empty());

    let bonds = handle.bonds(false);
    assert_eq!(bonds.count, 0);
    assert!(bonds.first.as_ptr().is_null());

    let cell = handle.simulation_box();
    assert_eq!(cell.matrix.as_f64().unwrap(), [0.0; 9]);
    assert_eq!(cell.origin.as_f64().unwrap(), [0.0; 3]);
    assert_eq!(cell.lengths.as_f64().unwrap(), [0.0; 3]);

    assert_eq!(handle.current_step(), 0);
    assert_eq!(handle.timestep_size(), 0.0);
    assert_eq!(handle.num_atoms(), 0);

    // a new engine starts from scratch
    handle.start().unwrap();
    assert_eq!(handle.particles(false).count, 0);
    handle.run_file(data::script_path("water-box.in")).unwrap();
    assert_eq!(handle.particles(false).count, 9);
}

#[test]
fn advance_and_queries() {
    let mut handle = data::started_handle("moving-polymer.in");
    assert!(handle.is_ready());
    assert!(!handle.is_running());
    assert_eq!(handle.timestep_size(), 0.5);

    handle.advance(100, true, true).unwrap();
    assert_eq!(handle.current_step(), 100);

    handle.run_command("reset_timestep 7").unwrap();
    assert_eq!(handle.current_step(), 7);
}

#[test]
fn engine_errors() {
    let mut handle = data::started_handle("polymer.in");

    let error = handle.run_command("create_bond 1 100").unwrap_err();
    assert_eq!(
        error.to_string(),
        "simulation engine error: there is no atom with tag 100 (line 1)"
    );

    let error = handle.run_file("tests/data/missing.in").unwrap_err();
    assert!(matches!(error, Error::Engine(_)));

    // errors do not stop the handle
    assert_eq!(handle.state(), HandleState::Running);
    assert_eq!(handle.num_atoms(), 12);
}

#[test]
fn custom_launcher() {
    let mut handle = SimulationHandle::new(|| -> Result<Box<dyn Engine>, Error> {
        let mut engine = simsync::SimpleEngine::new();
        engine.commands_string("create_box 0 4 0 4 0 4\ncreate_atom 1 1 1 1\n")?;
        Ok(Box::new(engine))
    });

    assert_eq!(handle.num_atoms(), 0);
    handle.start().unwrap();
    assert_eq!(handle.num_atoms(), 1);

    let failing = || -> Result<Box<dyn Engine>, Error> {
        Err(Error::EngineInit("missing license file".into()))
    };
    let mut handle = SimulationHandle::new(failing);
    let error = handle.start().unwrap_err();
    assert_eq!(error.to_string(), "failed to start the simulation engine: missing license file");
    assert!(!handle.is_ready());
}

#[test]
fn view_generations() {
    let mut handle = data::started_handle("water-box.in");

    let generation = handle.particles(false).generation;
    assert!(handle.is_current(ViewSource::Particles, generation));

    handle.advance(1, true, true).unwrap();
    assert!(!handle.is_current(ViewSource::Particles, generation));

    let generation = handle.bonds(false).generation;
    handle.start().unwrap();
    assert!(!handle.is_current(ViewSource::Bonds, generation));
}

#[test]
fn failed_commands_keep_snapshots_usable() {
    let mut handle = data::started_handle("water-box.in");

    assert!(handle.run_command("create_atom 1 nan 0 0").is_err());
    assert!(handle.run_command("create_atom 1 1 1 1 1").is_err());
    assert!(handle.run_command("create_box 0 1 0 1 0 1").is_err());
    assert_eq!(handle.num_atoms(), 9);

    handle.run_command("create_atom 1 1e12 1 1").unwrap();
    handle.run_command("create_bond 1 10").unwrap();
    assert_eq!(handle.num_atoms(), 10);

    let particles = handle.particles(false);
    assert_eq!(particles.count, 10);
    assert_eq!(particles.positions.element_count(), 30);
    assert_eq!(particles.ids.element_count(), 10);

    let bonds = handle.bonds(false);
    assert_eq!(bonds.count, 7);
    assert_eq!(bonds.second.element_count(), 21);
}

#[test]
fn tiny_boxes() {
    let mut handle = SimulationHandle::default();
    handle.start().unwrap();
    handle.run_script("
        create_box 0 2e-9 0 2e-9 0 2e-9
        create_atom 1 1e-9 1e-9 1e-9
        create_atom 1 3e-9 1e-9 1e-9
    ").unwrap();

    assert_eq!(handle.num_atoms(), 2);
    let cell = handle.simulation_box().to_owned();
    assert_eq!(cell.lengths, simsync::Vector3D::new(2e-9, 2e-9, 2e-9));

    let error = handle.run_command("change_box 0 1 0 1e-300 0 1e-300").unwrap_err();
    assert!(matches!(error, Error::Engine(_)));
}
