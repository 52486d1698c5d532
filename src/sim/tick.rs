//! Fixed timestep simulation tick
//!
//! The application drives the world explicitly: spawn events are queued in a
//! [`TickInput`], then every live rope is stepped once per fixed tick.

use super::spawner::{DamageProvider, NoTargets, SpawnRequest};
use super::state::RopeWorld;
use crate::consts::*;

/// Events for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Batches to spawn before stepping
    pub spawns: Vec<SpawnRequest>,
    /// Detach and return every tracked rope to the pool
    pub release_all: bool,
}

/// Advance the world by one fixed timestep
pub fn tick(world: &mut RopeWorld, input: &TickInput, dt: f32) {
    tick_with_targets(world, input, dt, &mut NoTargets);
}

/// Advance the world by one fixed timestep, letting the spawner's end damage
/// query `targets`
pub fn tick_with_targets(
    world: &mut RopeWorld,
    input: &TickInput,
    dt: f32,
    targets: &mut impl DamageProvider,
) {
    if input.release_all {
        let released = world.spawner.release_all(&mut world.pool);
        log::debug!("Released all {} ropes", released);
    }

    for request in &input.spawns {
        world.spawner.spawn(&mut world.pool, &world.anchors, request);
    }

    world.time_ticks += 1;

    // Ropes are independent; slot order keeps runs reproducible
    for rope in world.pool.live_mut() {
        rope.step(dt, &world.anchors, &mut world.canvas);
    }

    world.spawner.update(dt, &mut world.pool);
    world
        .spawner
        .tick_end_damage(dt, targets, &mut world.canvas);
}

/// Accumulates frame time and hands out fixed steps
#[derive(Debug, Clone)]
pub struct FixedStepper {
    pub dt: f32,
    pub max_substeps: u32,
    accumulator: f32,
}

impl Default for FixedStepper {
    fn default() -> Self {
        Self::new(SIM_DT)
    }
}

impl FixedStepper {
    pub fn new(dt: f32) -> Self {
        Self {
            dt,
            max_substeps: MAX_SUBSTEPS,
            accumulator: 0.0,
        }
    }

    /// Feed one frame's elapsed time and run `step` for each whole fixed
    /// step. Returns the number of steps run.
    pub fn advance(&mut self, frame_dt: f32, mut step: impl FnMut(f32)) -> u32 {
        if !frame_dt.is_finite() || frame_dt <= 0.0 {
            return 0;
        }
        self.accumulator += frame_dt.min(MAX_FRAME_DT);

        let mut substeps = 0;
        while self.accumulator >= self.dt && substeps < self.max_substeps {
            step(self.dt);
            self.accumulator -= self.dt;
            substeps += 1;
        }

        // Drop backlog we can't catch up on
        if substeps == self.max_substeps {
            self.accumulator = self.accumulator.min(self.dt);
        }
        substeps
    }

    /// Leftover time as a fraction of a step (for render interpolation)
    pub fn alpha(&self) -> f32 {
        self.accumulator / self.dt
    }
}
