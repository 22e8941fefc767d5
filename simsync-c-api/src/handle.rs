use std::os::raw::{c_char, c_void};
use std::ffi::CStr;
use std::ops::{Deref, DerefMut};

use simsync::{SimulationHandle, BufferView, ScalarKind, ViewSource};
use simsync::{SnapshotOptions, BoxOptions, Error};

use super::{catch_unwind, simsync_status_t};

/// The buffer contains 32-bit floating point values
pub const SIMSYNC_SCALAR_FLOAT32: i32 = 1;
/// The buffer contains 64-bit floating point values
pub const SIMSYNC_SCALAR_FLOAT64: i32 = 2;
/// The buffer contains 32-bit signed integers
pub const SIMSYNC_SCALAR_INT32: i32 = 3;
/// The buffer contains 64-bit signed integers
pub const SIMSYNC_SCALAR_INT64: i32 = 4;

/// The buffer was created by `simsync_handle_particles`
pub const SIMSYNC_SOURCE_PARTICLES: i32 = 0;
/// The buffer was created by `simsync_handle_bonds`
pub const SIMSYNC_SOURCE_BONDS: i32 = 1;
/// The buffer was created by `simsync_handle_box`
pub const SIMSYNC_SOURCE_BOX: i32 = 2;

/// Opaque type representing a `SimulationHandle`
#[allow(non_camel_case_types)]
pub struct simsync_handle_t(SimulationHandle);

impl Deref for simsync_handle_t {
    type Target = SimulationHandle;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for simsync_handle_t {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

/// A typed, read-only view on contiguous memory.
///
/// If `owned` is false, `data` aliases memory owned by the simulation handle
/// or by the engine, and is only valid until the next call to the same
/// snapshot function or to any function which can modify the simulation. Use
/// `simsync_handle_buffer_is_valid` to check this. If `owned` is true, `data`
/// is a copy which must be released with `simsync_buffer_free`.
#[repr(C)]
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy)]
pub struct simsync_buffer_t {
    /// Pointer to the first element, or `NULL` if the buffer is empty
    pub data: *const c_void,
    /// Total number of scalar elements in the buffer
    pub element_count: usize,
    /// Number of consecutive elements making up a single entry
    pub components: usize,
    /// Type of the scalars, one of the `SIMSYNC_SCALAR_*` constants
    pub scalar: i32,
    /// Which function created this buffer, one of the `SIMSYNC_SOURCE_*`
    /// constants
    pub source: i32,
    /// Generation of the handle when this buffer was created
    pub generation: u64,
    /// Is this buffer an owned copy of the data?
    pub owned: bool,
}

/// Snapshot of the atoms in a simulation
#[repr(C)]
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy)]
pub struct simsync_particles_t {
    /// Positions of the atoms, 3 `float` per atom
    pub positions: simsync_buffer_t,
    /// Tags of the atoms, as `int32_t` or `int64_t` depending on the engine
    pub ids: simsync_buffer_t,
    /// Types of the atoms, as `int32_t`
    pub types: simsync_buffer_t,
    /// Number of atoms
    pub count: usize,
}

/// Snapshot of the bonds in a simulation
#[repr(C)]
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy)]
pub struct simsync_bonds_t {
    /// Position of the first atom of each bond, 3 `float` per bond
    pub first: simsync_buffer_t,
    /// Position of the second atom of each bond, 3 `float` per bond
    pub second: simsync_buffer_t,
    /// Number of bonds
    pub count: usize,
}

/// Snapshot of the simulation box
#[repr(C)]
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy)]
pub struct simsync_box_t {
    /// Cell vectors, one per row, as 9 `double`
    pub matrix: simsync_buffer_t,
    /// Lower corner of the box, as 3 `double`
    pub origin: simsync_buffer_t,
    /// Orthogonal lengths of the box, as 3 `double`
    pub lengths: simsync_buffer_t,
}

fn scalar_code(kind: ScalarKind) -> i32 {
    match kind {
        ScalarKind::Float32 => SIMSYNC_SCALAR_FLOAT32,
        ScalarKind::Float64 => SIMSYNC_SCALAR_FLOAT64,
        ScalarKind::Int32 => SIMSYNC_SCALAR_INT32,
        ScalarKind::Int64 => SIMSYNC_SCALAR_INT64,
    }
}

fn view_source(source: i32) -> Result<ViewSource, Error> {
    match source {
        SIMSYNC_SOURCE_PARTICLES => Ok(ViewSource::Particles),
        SIMSYNC_SOURCE_BONDS => Ok(ViewSource::Bonds),
        SIMSYNC_SOURCE_BOX => Ok(ViewSource::Box),
        _ => Err(Error::InvalidParameter(format!("invalid buffer source: {}", source))),
    }
}

fn copy_slice<T: Copy>(data: &[T]) -> *const c_void {
    if data.is_empty() {
        return std::ptr::null();
    }
    let boxed = data.to_vec().into_boxed_slice();
    return Box::into_raw(boxed).cast::<c_void>().cast_const();
}

unsafe fn free_slice<T>(data: *const c_void, len: usize) {
    let slice = std::ptr::slice_from_raw_parts_mut(data.cast::<T>().cast_mut(), len);
    std::mem::drop(Box::from_raw(slice));
}

impl simsync_buffer_t {
    fn new(view: BufferView<'_>, source: ViewSource, generation: u64, copy: bool) -> simsync_buffer_t {
        let data = if copy {
            match view.scalar_kind() {
                ScalarKind::Float32 => copy_slice(view.as_f32().unwrap_or_default()),
                ScalarKind::Float64 => copy_slice(view.as_f64().unwrap_or_default()),
                ScalarKind::Int32 => copy_slice(view.as_i32().unwrap_or_default()),
                ScalarKind::Int64 => copy_slice(view.as_i64().unwrap_or_default()),
            }
        } else {
            view.as_ptr()
        };

        simsync_buffer_t {
            data: data,
            element_count: view.element_count(),
            components: view.components(),
            scalar: scalar_code(view.scalar_kind()),
            source: source as i32,
            generation: generation,
            owned: copy,
        }
    }
}

fn parse_options<T, F>(options: *const c_char, parse: F) -> Result<T, Error>
    where F: FnOnce(&str) -> Result<T, Error>
{
    if options.is_null() {
        return parse("");
    }
    let options = unsafe { CStr::from_ptr(options) }.to_str()?;
    return parse(options);
}

/// Create a new simulation handle, using the built-in simple engine. The
/// handle starts in the stopped state, use `simsync_handle_start` to create
/// the engine.
///
/// All memory allocated by this function can be released using
/// `simsync_handle_free`.
///
/// @returns A pointer to the newly allocated handle, or a `NULL` pointer in
///          case of error. In case of error, you can use `simsync_last_error()`
///          to get the error message.
#[no_mangle]
#[allow(clippy::module_name_repetitions)]
pub unsafe extern fn simsync_handle() -> *mut simsync_handle_t {
    let mut raw = std::ptr::null_mut();
    let unwind_wrapper = std::panic::AssertUnwindSafe(&mut raw);
    let status = catch_unwind(move || {
        let unwind_wrapper = unwind_wrapper;

        let boxed = Box::new(simsync_handle_t(SimulationHandle::default()));
        *unwind_wrapper.0 = Box::into_raw(boxed);
        Ok(())
    });

    if !status.is_success() {
        return std::ptr::null_mut();
    }

    return raw;
}

/// Free the memory associated with a `handle` previously created with
/// `simsync_handle`, stopping the engine if needed.
///
/// If `handle` is `NULL`, this function does nothing.
///
/// @param handle pointer to an existing handle, or `NULL`
///
/// @returns The status code of this operation. If the status is not
///          `SIMSYNC_SUCCESS`, you can use `simsync_last_error()` to get the
///          full error message.
#[no_mangle]
pub unsafe extern fn simsync_handle_free(handle: *mut simsync_handle_t) -> simsync_status_t {
    catch_unwind(|| {
        if !handle.is_null() {
            let boxed = Box::from_raw(handle);
            std::mem::drop(boxed);
        }

        Ok(())
    })
}

/// Start a new engine in this `handle`, stopping the current one if needed.
///
/// @param handle pointer to an existing handle
///
/// @returns The status code of this operation. If the engine could not be
///          created, this returns `SIMSYNC_ENGINE_INIT_ERROR` and the handle
///          stays stopped.
#[no_mangle]
pub unsafe extern fn simsync_handle_start(handle: *mut simsync_handle_t) -> simsync_status_t {
    catch_unwind(|| {
        check_pointers!(handle);
        (*handle).start()
    })
}

/// Stop the engine in this `handle`. All views created from this handle are
/// invalidated. This does nothing if the handle is already stopped.
///
/// @param handle pointer to an existing handle
///
/// @returns The status code of this operation. If the status is not
///          `SIMSYNC_SUCCESS`, you can use `simsync_last_error()` to get the
///          full error message.
#[no_mangle]
pub unsafe extern fn simsync_handle_stop(handle: *mut simsync_handle_t) -> simsync_status_t {
    catch_unwind(|| {
        check_pointers!(handle);
        (*handle).stop();
        Ok(())
    })
}

/// Run the simulation for `steps` steps. This does nothing if the handle is
/// stopped or if `steps` is not positive.
///
/// @param handle pointer to an existing handle
/// @param steps number of steps to run
/// @param pre should the engine do its full setup before running
/// @param post should the engine do its full cleanup after running
///
/// @returns The status code of this operation. If the status is not
///          `SIMSYNC_SUCCESS`, you can use `simsync_last_error()` to get the
///          full error message.
#[no_mangle]
pub unsafe extern fn simsync_handle_advance(
    handle: *mut simsync_handle_t,
    steps: i64,
    pre: bool,
    post: bool,
) -> simsync_status_t {
    catch_unwind(|| {
        check_pointers!(handle);
        (*handle).advance(steps, pre, post)
    })
}

/// Execute a single engine command.
///
/// @param handle pointer to an existing handle
/// @param command the command, as a NULL-terminated string
///
/// @returns The status code of this operation. If the status is not
///          `SIMSYNC_SUCCESS`, you can use `simsync_last_error()` to get the
///          full error message.
#[no_mangle]
pub unsafe extern fn simsync_handle_run_command(
    handle: *mut simsync_handle_t,
    command: *const c_char,
) -> simsync_status_t {
    catch_unwind(|| {
        check_pointers!(handle, command);
        let command = CStr::from_ptr(command).to_str()?;
        (*handle).run_command(command)
    })
}

/// Execute a script containing multiple engine commands, one per line.
///
/// @param handle pointer to an existing handle
/// @param script the script, as a NULL-terminated string
///
/// @returns The status code of this operation. If the status is not
///          `SIMSYNC_SUCCESS`, you can use `simsync_last_error()` to get the
///          full error message.
#[no_mangle]
pub unsafe extern fn simsync_handle_run_script(
    handle: *mut simsync_handle_t,
    script: *const c_char,
) -> simsync_status_t {
    catch_unwind(|| {
        check_pointers!(handle, script);
        let script = CStr::from_ptr(script).to_str()?;
        (*handle).run_script(script)
    })
}

/// Execute all the engine commands in the file at `path`.
///
/// @param handle pointer to an existing handle
/// @param path path to the file, as a NULL-terminated string
///
/// @returns The status code of this operation. If the status is not
///          `SIMSYNC_SUCCESS`, you can use `simsync_last_error()` to get the
///          full error message.
#[no_mangle]
pub unsafe extern fn simsync_handle_run_file(
    handle: *mut simsync_handle_t,
    path: *const c_char,
) -> simsync_status_t {
    catch_unwind(|| {
        check_pointers!(handle, path);
        let path = CStr::from_ptr(path).to_str()?;
        (*handle).run_file(path)
    })
}

/// Check if this `handle` currently owns an engine, storing the result in
/// `ready`.
///
/// @returns The status code of this operation. If the status is not
///          `SIMSYNC_SUCCESS`, you can use `simsync_last_error()` to get the
///          full error message.
#[no_mangle]
pub unsafe extern fn simsync_handle_is_ready(
    handle: *const simsync_handle_t,
    ready: *mut bool,
) -> simsync_status_t {
    catch_unwind(|| {
        check_pointers!(handle, ready);
        *ready = (*handle).is_ready();
        Ok(())
    })
}

/// Check if the engine in this `handle` is currently executing a run, storing
/// the result in `running`.
///
/// @returns The status code of this operation. If the status is not
///          `SIMSYNC_SUCCESS`, you can use `simsync_last_error()` to get the
///          full error message.
#[no_mangle]
pub unsafe extern fn simsync_handle_is_running(
    handle: *const simsync_handle_t,
    running: *mut bool,
) -> simsync_status_t {
    catch_unwind(|| {
        check_pointers!(handle, running);
        *running = (*handle).is_running();
        Ok(())
    })
}

/// Get the current timestep counter of the engine, or 0 if the handle is
/// stopped.
///
/// @returns The status code of this operation. If the status is not
///          `SIMSYNC_SUCCESS`, you can use `simsync_last_error()` to get the
///          full error message.
#[no_mangle]
pub unsafe extern fn simsync_handle_current_step(
    handle: *const simsync_handle_t,
    step: *mut i64,
) -> simsync_status_t {
    catch_unwind(|| {
        check_pointers!(handle, step);
        *step = (*handle).current_step();
        Ok(())
    })
}

/// Get the size of a single timestep, or 0 if the handle is stopped.
///
/// @returns The status code of this operation. If the status is not
///          `SIMSYNC_SUCCESS`, you can use `simsync_last_error()` to get the
///          full error message.
#[no_mangle]
pub unsafe extern fn simsync_handle_timestep_size(
    handle: *const simsync_handle_t,
    size: *mut f64,
) -> simsync_status_t {
    catch_unwind(|| {
        check_pointers!(handle, size);
        *size = (*handle).timestep_size();
        Ok(())
    })
}

/// Get the number of atoms in the simulation, or 0 if the handle is stopped.
///
/// @returns The status code of this operation. If the status is not
///          `SIMSYNC_SUCCESS`, you can use `simsync_last_error()` to get the
///          full error message.
#[no_mangle]
pub unsafe extern fn simsync_handle_num_atoms(
    handle: *const simsync_handle_t,
    count: *mut usize,
) -> simsync_status_t {
    catch_unwind(|| {
        check_pointers!(handle, count);
        *count = (*handle).num_atoms();
        Ok(())
    })
}

/// Get the number of bonds reported by the engine, or 0 if the handle is
/// stopped.
///
/// @returns The status code of this operation. If the status is not
///          `SIMSYNC_SUCCESS`, you can use `simsync_last_error()` to get the
///          full error message.
#[no_mangle]
pub unsafe extern fn simsync_handle_num_bonds(
    handle: *const simsync_handle_t,
    count: *mut usize,
) -> simsync_status_t {
    catch_unwind(|| {
        check_pointers!(handle, count);
        *count = (*handle).num_bonds();
        Ok(())
    })
}

/// Get a snapshot of all the atoms in the simulation.
///
/// The `options` are JSON-formatted, with two optional boolean fields:
/// `"wrapped"` to get the positions as stored by the engine instead of the
/// unwrapped ones, and `"copy"` to get owned copies of the data instead of
/// views. `NULL` or an empty string use the default options.
///
/// @param handle pointer to an existing handle
/// @param options JSON-formatted options, as a NULL-terminated string, or
///                `NULL`
/// @param particles pointer where the snapshot will be stored
///
/// @returns The status code of this operation. If the status is not
///          `SIMSYNC_SUCCESS`, you can use `simsync_last_error()` to get the
///          full error message.
#[no_mangle]
pub unsafe extern fn simsync_handle_particles(
    handle: *mut simsync_handle_t,
    options: *const c_char,
    particles: *mut simsync_particles_t,
) -> simsync_status_t {
    catch_unwind(|| {
        check_pointers!(handle, particles);
        let options = parse_options(options, SnapshotOptions::from_json)?;

        let snapshot = (*handle).particles(options.wrapped);
        let source = ViewSource::Particles;
        *particles = simsync_particles_t {
            positions: simsync_buffer_t::new(snapshot.positions, source, snapshot.generation, options.copy),
            ids: simsync_buffer_t::new(snapshot.ids, source, snapshot.generation, options.copy),
            types: simsync_buffer_t::new(snapshot.types, source, snapshot.generation, options.copy),
            count: snapshot.count,
        };

        Ok(())
    })
}

/// Get a snapshot of all the bonds in the simulation, with each bond
/// appearing exactly once.
///
/// The `options` are the same as for `simsync_handle_particles`. Unwrapped
/// bonds use the minimum image convention to place the second atom.
///
/// @param handle pointer to an existing handle
/// @param options JSON-formatted options, as a NULL-terminated string, or
///                `NULL`
/// @param bonds pointer where the snapshot will be stored
///
/// @returns The status code of this operation. If the status is not
///          `SIMSYNC_SUCCESS`, you can use `simsync_last_error()` to get the
///          full error message.
#[no_mangle]
pub unsafe extern fn simsync_handle_bonds(
    handle: *mut simsync_handle_t,
    options: *const c_char,
    bonds: *mut simsync_bonds_t,
) -> simsync_status_t {
    catch_unwind(|| {
        check_pointers!(handle, bonds);
        let options = parse_options(options, SnapshotOptions::from_json)?;

        let snapshot = (*handle).bonds(options.wrapped);
        let source = ViewSource::Bonds;
        *bonds = simsync_bonds_t {
            first: simsync_buffer_t::new(snapshot.first, source, snapshot.generation, options.copy),
            second: simsync_buffer_t::new(snapshot.second, source, snapshot.generation, options.copy),
            count: snapshot.count,
        };

        Ok(())
    })
}

/// Get a snapshot of the simulation box.
///
/// The `options` are JSON-formatted, with a single optional boolean field
/// `"copy"`. `NULL` or an empty string use the default options.
///
/// @param handle pointer to an existing handle
/// @param options JSON-formatted options, as a NULL-terminated string, or
///                `NULL`
/// @param cell pointer where the snapshot will be stored
///
/// @returns The status code of this operation. If the status is not
///          `SIMSYNC_SUCCESS`, you can use `simsync_last_error()` to get the
///          full error message.
#[no_mangle]
pub unsafe extern fn simsync_handle_box(
    handle: *mut simsync_handle_t,
    options: *const c_char,
    cell: *mut simsync_box_t,
) -> simsync_status_t {
    catch_unwind(|| {
        check_pointers!(handle, cell);
        let options = parse_options(options, BoxOptions::from_json)?;

        let snapshot = (*handle).simulation_box();
        let source = ViewSource::Box;
        *cell = simsync_box_t {
            matrix: simsync_buffer_t::new(snapshot.matrix, source, snapshot.generation, options.copy),
            origin: simsync_buffer_t::new(snapshot.origin, source, snapshot.generation, options.copy),
            lengths: simsync_buffer_t::new(snapshot.lengths, source, snapshot.generation, options.copy),
        };

        Ok(())
    })
}

/// Check if the data in `buffer` can still be used, storing the result in
/// `valid`. Owned buffers are always valid until they are freed; views are
/// valid until the next call to the snapshot function which created them, or
/// to any function modifying the simulation.
///
/// @param handle pointer to the handle which created this buffer
/// @param buffer pointer to the buffer to check
/// @param valid pointer where the result will be stored
///
/// @returns The status code of this operation. If the status is not
///          `SIMSYNC_SUCCESS`, you can use `simsync_last_error()` to get the
///          full error message.
#[no_mangle]
pub unsafe extern fn simsync_handle_buffer_is_valid(
    handle: *const simsync_handle_t,
    buffer: *const simsync_buffer_t,
    valid: *mut bool,
) -> simsync_status_t {
    catch_unwind(|| {
        check_pointers!(handle, buffer, valid);
        let buffer = &*buffer;
        if buffer.owned {
            *valid = true;
        } else {
            let source = view_source(buffer.source)?;
            *valid = (*handle).is_current(source, buffer.generation);
        }
        Ok(())
    })
}

/// Release the memory of an owned `buffer`, and reset it to an empty buffer.
/// This does nothing for views over the simulation memory.
///
/// @param buffer pointer to a buffer created with the `"copy"` option, or
///               `NULL`
///
/// @returns The status code of this operation. If the status is not
///          `SIMSYNC_SUCCESS`, you can use `simsync_last_error()` to get the
///          full error message.
#[no_mangle]
pub unsafe extern fn simsync_buffer_free(buffer: *mut simsync_buffer_t) -> simsync_status_t {
    catch_unwind(|| {
        if buffer.is_null() {
            return Ok(());
        }

        let buffer = &mut *buffer;
        if !buffer.owned {
            return Ok(());
        }

        if !buffer.data.is_null() {
            match buffer.scalar {
                SIMSYNC_SCALAR_FLOAT32 => free_slice::<f32>(buffer.data, buffer.element_count),
                SIMSYNC_SCALAR_FLOAT64 => free_slice::<f64>(buffer.data, buffer.element_count),
                SIMSYNC_SCALAR_INT32 => free_slice::<i32>(buffer.data, buffer.element_count),
                SIMSYNC_SCALAR_INT64 => free_slice::<i64>(buffer.data, buffer.element_count),
                scalar => return Err(Error::InvalidParameter(format!(
                    "invalid scalar type in simsync_buffer_free: {}", scalar
                ))),
            }
        }

        buffer.data = std::ptr::null();
        buffer.element_count = 0;
        buffer.owned = false;
        Ok(())
    })
}
