#![warn(clippy::all, clippy::pedantic)]

// disable some style lints
#![allow(clippy::needless_return, clippy::redundant_field_names, clippy::upper_case_acronyms)]
#![allow(clippy::missing_errors_doc, clippy::missing_safety_doc, clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]

// Tests lints
#![cfg_attr(test, allow(clippy::float_cmp))]

//! C bindings to `simsync`, exposing simulation handles and the snapshot
//! buffers to renderers written in other languages.

#[macro_use]
mod status;
pub use self::status::{catch_unwind, simsync_status_t, simsync_last_error};
pub use self::status::{SIMSYNC_SUCCESS, SIMSYNC_INVALID_PARAMETER_ERROR, SIMSYNC_JSON_ERROR};
pub use self::status::{SIMSYNC_UTF8_ERROR, SIMSYNC_ENGINE_INIT_ERROR, SIMSYNC_ENGINE_ERROR};
pub use self::status::{SIMSYNC_BUFFER_SIZE_ERROR, SIMSYNC_INTERNAL_ERROR};

mod utils;

pub mod logging;
pub mod profiling;
pub mod handle;
