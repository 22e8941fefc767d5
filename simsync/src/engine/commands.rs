//! Parsing of the input commands understood by `SimpleEngine`.
use std::path::PathBuf;
use std::str::FromStr;

use crate::{Error, Vector3D};

use super::TagWidth;

/// Set of atoms targeted by a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Group {
    /// All the atoms in the simulation
    All,
    /// A single atom, identified by its tag
    Tag(i64),
}

/// Box geometry, as given to `create_box` and `change_box`
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct BoxBounds {
    pub lo: Vector3D,
    pub hi: Vector3D,
    pub tilt: [f64; 3],
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Command {
    Clear,
    Boundary([bool; 3]),
    TagWidth(TagWidth),
    NewtonBond(bool),
    CreateBox(BoxBounds),
    ChangeBox(BoxBounds),
    CreateAtom {
        atom_type: i32,
        position: Vector3D,
        tag: Option<i64>,
    },
    DeleteAtom(i64),
    CreateBond(i64, i64),
    Velocity(Group, Vector3D),
    Displace(Group, Vector3D),
    Timestep(f64),
    ResetTimestep(i64),
    Run {
        steps: i64,
        pre: bool,
        post: bool,
    },
    Include(PathBuf),
}

/// Parse a single line of input. Comments start with `#` and extend to the
/// end of the line; lines containing only whitespace and comments give
/// `Ok(None)`.
pub(crate) fn parse(line: &str) -> Result<Option<Command>, Error> {
    let line = match line.find('#') {
        Some(start) => &line[..start],
        None => line,
    };

    let words = line.split_whitespace().collect::<Vec<_>>();
    let (name, args) = match words.split_first() {
        Some((name, args)) => (*name, args),
        None => return Ok(None),
    };

    let command = match name {
        "clear" => {
            expect_count(name, args, 0)?;
            Command::Clear
        }
        "boundary" => {
            expect_count(name, args, 3)?;
            let mut periodic = [true; 3];
            for (axis, &arg) in args.iter().enumerate() {
                periodic[axis] = match arg {
                    "p" => true,
                    "f" => false,
                    _ => return Err(invalid(name, format!("unknown boundary style '{}', expected 'p' or 'f'", arg))),
                };
            }
            Command::Boundary(periodic)
        }
        "atom_modify" => {
            expect_count(name, args, 2)?;
            if args[0] != "tag_width" {
                return Err(invalid(name, format!("unknown keyword '{}'", args[0])));
            }
            match args[1] {
                "32" => Command::TagWidth(TagWidth::Int32),
                "64" => Command::TagWidth(TagWidth::Int64),
                _ => return Err(invalid(name, format!("tag width must be 32 or 64, got '{}'", args[1]))),
            }
        }
        "newton_bond" => {
            expect_count(name, args, 1)?;
            Command::NewtonBond(parse_switch(name, args[0], "on", "off")?)
        }
        "create_box" => Command::CreateBox(parse_box(name, args)?),
        "change_box" => Command::ChangeBox(parse_box(name, args)?),
        "create_atom" => {
            if args.len() != 4 && args.len() != 5 {
                return Err(invalid(name, format!("expected 4 or 5 arguments, got {}", args.len())));
            }
            Command::CreateAtom {
                atom_type: parse_value(name, args[0])?,
                position: parse_vector(name, &args[1..4])?,
                tag: args.get(4).map(|tag| parse_value(name, tag)).transpose()?,
            }
        }
        "delete_atom" => {
            expect_count(name, args, 1)?;
            Command::DeleteAtom(parse_value(name, args[0])?)
        }
        "create_bond" => {
            expect_count(name, args, 2)?;
            Command::CreateBond(parse_value(name, args[0])?, parse_value(name, args[1])?)
        }
        "velocity" => {
            expect_count(name, args, 4)?;
            Command::Velocity(parse_group(name, args[0])?, parse_vector(name, &args[1..])?)
        }
        "displace_atoms" => {
            expect_count(name, args, 4)?;
            Command::Displace(parse_group(name, args[0])?, parse_vector(name, &args[1..])?)
        }
        "timestep" => {
            expect_count(name, args, 1)?;
            let timestep: f64 = parse_value(name, args[0])?;
            if !(timestep.is_finite() && timestep > 0.0) {
                return Err(invalid(name, format!("timestep must be positive, got {}", timestep)));
            }
            Command::Timestep(timestep)
        }
        "reset_timestep" => {
            expect_count(name, args, 1)?;
            let step: i64 = parse_value(name, args[0])?;
            if step < 0 {
                return Err(invalid(name, format!("timestep counter must be positive, got {}", step)));
            }
            Command::ResetTimestep(step)
        }
        "run" => parse_run(args)?,
        "include" => {
            expect_count(name, args, 1)?;
            Command::Include(PathBuf::from(args[0]))
        }
        _ => return Err(Error::Engine(format!("unknown command '{}'", name))),
    };

    return Ok(Some(command));
}

fn parse_run(args: &[&str]) -> Result<Command, Error> {
    let name = "run";
    if args.is_empty() {
        return Err(invalid(name, "missing number of steps".into()));
    }

    let steps: i64 = parse_value(name, args[0])?;
    if steps < 0 {
        return Err(invalid(name, format!("number of steps must be positive, got {}", steps)));
    }

    let mut pre = true;
    let mut post = true;
    let mut keywords = args[1..].chunks(2);
    for chunk in &mut keywords {
        let (keyword, value) = match chunk {
            [keyword, value] => (*keyword, *value),
            _ => return Err(invalid(name, format!("missing value for '{}'", chunk[0]))),
        };

        match keyword {
            "pre" => pre = parse_switch(name, value, "yes", "no")?,
            "post" => post = parse_switch(name, value, "yes", "no")?,
            _ => return Err(invalid(name, format!("unknown keyword '{}'", keyword))),
        }
    }

    return Ok(Command::Run { steps, pre, post });
}

fn parse_box(name: &str, args: &[&str]) -> Result<BoxBounds, Error> {
    if args.len() != 6 && args.len() != 9 {
        return Err(invalid(name, format!("expected 6 or 9 arguments, got {}", args.len())));
    }

    let values = args.iter()
        .map(|arg| parse_value::<f64>(name, arg))
        .collect::<Result<Vec<_>, _>>()?;

    let mut tilt = [0.0; 3];
    if values.len() == 9 {
        tilt.copy_from_slice(&values[6..]);
    }

    return Ok(BoxBounds {
        lo: Vector3D::new(values[0], values[2], values[4]),
        hi: Vector3D::new(values[1], values[3], values[5]),
        tilt,
    });
}

fn parse_group(name: &str, arg: &str) -> Result<Group, Error> {
    if arg == "all" {
        Ok(Group::All)
    } else {
        Ok(Group::Tag(parse_value(name, arg)?))
    }
}

fn parse_vector(name: &str, args: &[&str]) -> Result<Vector3D, Error> {
    debug_assert_eq!(args.len(), 3);
    let x = parse_value(name, args[0])?;
    let y = parse_value(name, args[1])?;
    let z = parse_value(name, args[2])?;
    return Ok(Vector3D::new(x, y, z));
}

fn parse_switch(name: &str, arg: &str, on: &str, off: &str) -> Result<bool, Error> {
    if arg == on {
        Ok(true)
    } else if arg == off {
        Ok(false)
    } else {
        Err(invalid(name, format!("expected '{}' or '{}', got '{}'", on, off, arg)))
    }
}

fn parse_value<T: FromStr>(name: &str, arg: &str) -> Result<T, Error> {
    arg.parse().map_err(|_| invalid(name, format!("invalid value '{}'", arg)))
}

fn expect_count(name: &str, args: &[&str], count: usize) -> Result<(), Error> {
    if args.len() == count {
        Ok(())
    } else {
        Err(invalid(name, format!("expected {} arguments, got {}", count, args.len())))
    }
}

fn invalid(name: &str, message: String) -> Error {
    Error::Engine(format!("invalid '{}' command: {}", name, message))
}
