#![warn(clippy::all, clippy::pedantic)]

// disable some style lints
#![allow(clippy::needless_return, clippy::must_use_candidate, clippy::comparison_chain)]
#![allow(clippy::redundant_field_names, clippy::redundant_closure_for_method_calls)]
#![allow(clippy::unreadable_literal, clippy::option_if_let_else, clippy::range_plus_one)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc, clippy::module_name_repetitions)]

#![allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_wrap, clippy::cast_lossless, clippy::cast_sign_loss)]
#![allow(clippy::default_trait_access)]

// Tests lints
#![cfg_attr(test, allow(clippy::float_cmp))]

//! `simsync` reads the live state of a running molecular-dynamics engine
//! (positions, image flags, bonds and box geometry) and exposes it as typed
//! buffer views, for renderers and analysis clients which must not copy or
//! touch the engine's own memory.
//!
//! The entry point is [`SimulationHandle`], which owns one [`engine::Engine`]
//! and hands out [`ParticleSnapshot`], [`BondSnapshot`] and [`BoxSnapshot`].

pub mod types;
pub use types::*;

mod errors;
pub use self::errors::Error;

pub mod engine;
pub use engine::{Engine, EngineLauncher, SimpleEngine};

mod view;
pub use self::view::{BufferView, ScalarKind, ViewScalar};

pub mod snapshot;
pub use snapshot::{ParticleSnapshot, BondSnapshot, BoxSnapshot};
pub use snapshot::{ParticleData, BondData, BoxData};
pub use snapshot::{SnapshotOptions, BoxOptions};

mod handle;
pub use self::handle::{SimulationHandle, HandleState, ViewSource};
