//! Verlet Guts - pooled rope giblets for a 2D action game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (rope solver, spawner, pool, paint canvas)
//! - `settings`: Data-driven tuning persisted as JSON
//! - `error`: Errors for the few fallible surfaces (settings I/O)

pub mod error;
pub mod settings;
pub mod sim;

pub use error::SettingsError;
pub use settings::{QualityPreset, Settings};

use glam::Vec2;

/// Simulation configuration constants
pub mod consts {
    /// Fixed simulation timestep (120 Hz keeps short chains within 1% of rest length)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest frame delta fed to the accumulator (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Upper bound on particles per rope (backing buffer size)
    pub const ROPE_CAPACITY: usize = 256;
    /// A rope always has at least one segment
    pub const MIN_SEGMENTS: usize = 2;

    /// Constraint pairs shorter than this are skipped
    pub const CONSTRAINT_EPSILON: f32 = 1e-6;
    /// Squared speed (units/s) below which a detached rope may go to sleep
    pub const SLEEP_SPEED_SQ: f32 = 0.25;
    /// Largest relative segment error a rope may sleep with
    pub const SLEEP_STRETCH_TOLERANCE: f32 = 0.005;
    /// Direction vectors shorter than this (squared) fall back to +X
    pub const DEGENERATE_DIR_SQ: f32 = 1e-6;

    /// Radius (pixels) of the blood stamp left by a rope tail each step
    pub const TRAIL_PAINT_RADIUS: i32 = 1;
    /// Gravity magnitude used when a radial batch has no gravity configured
    pub const DEFAULT_GRAVITY: f32 = 9.81;
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}
