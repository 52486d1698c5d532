//! Deterministic simulation module
//!
//! All rope logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by pool slot)
//! - No rendering or platform dependencies

pub mod anchor;
pub mod paint;
pub mod pool;
pub mod rope;
pub mod spawner;
pub mod state;
pub mod tick;

pub use anchor::{AnchorId, AnchorSource, Anchors};
pub use paint::{CanvasConfig, NullSurface, PaintCanvas, PaintSurface, Rgba};
pub use pool::{Pool, PoolKey, RopeHandle, RopePool};
pub use rope::{RopeParams, RopeSolver, TrailPaint};
pub use spawner::{
    AbilityTrigger, BatchConfig, DamageProvider, DamageTarget, EndDamageConfig, GravityMode,
    NoTargets, ReleaseMode, RopeSpawner, SpawnReport, SpawnRequest, SpawnTrigger, SpawnedRope,
    SpawnerConfig,
};
pub use state::RopeWorld;
pub use tick::{FixedStepper, TickInput, tick, tick_with_targets};
