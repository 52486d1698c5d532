//! World state owned by the application
//!
//! Everything a tick touches lives here and is passed explicitly; there is no
//! global registry to look the pool or canvas up from.

use super::anchor::Anchors;
use super::paint::PaintCanvas;
use super::pool::{PoolKey, RopePool};
use super::rope::RopeSolver;
use super::spawner::RopeSpawner;
use crate::Settings;
use crate::consts::ROPE_CAPACITY;

/// Complete simulation state
#[derive(Debug, Clone)]
pub struct RopeWorld {
    /// Run seed for reproducibility
    pub seed: u64,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub anchors: Anchors,
    pub pool: RopePool,
    pub spawner: RopeSpawner,
    pub canvas: PaintCanvas,
}

impl RopeWorld {
    pub fn new(settings: &Settings) -> Self {
        let mut spawner_config = settings.spawner.clone();
        spawner_config.batch.paint_trail &= settings.effective_trails();

        let max_ropes = settings.max_ropes();
        let mut pool = RopePool::new(PoolKey::Rope, ROPE_CAPACITY, max_ropes);
        // Prewarm a quarter so the first deaths don't allocate
        pool.prewarm(max_ropes / 4);

        log::info!(
            "Rope world: {:?} quality, {} ropes max, {}x{} canvas",
            settings.quality,
            max_ropes,
            settings.canvas.pixels_width,
            settings.canvas.pixels_height
        );

        Self {
            seed: settings.seed,
            time_ticks: 0,
            anchors: Anchors::new(),
            pool,
            spawner: RopeSpawner::new(spawner_config, settings.seed),
            canvas: PaintCanvas::new(settings.canvas),
        }
    }

    /// Every rope currently checked out of the pool
    pub fn live_ropes(&self) -> impl Iterator<Item = &RopeSolver> + '_ {
        self.pool.live()
    }

    /// Live ropes that have gone to sleep
    pub fn quiescent_count(&self) -> usize {
        self.pool.live().filter(|r| r.is_quiescent()).count()
    }

    /// Live ropes still pinned to an anchor
    pub fn attached_count(&self) -> usize {
        self.pool.live().filter(|r| r.is_attached()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::pool::Pool;
    use crate::sim::spawner::SpawnRequest;
    use glam::Vec2;

    #[test]
    fn test_world_from_settings() {
        let settings = Settings::from_preset(crate::QualityPreset::Low);
        let world = RopeWorld::new(&settings);
        assert_eq!(world.pool.max_instances(), 32);
        assert_eq!(world.pool.available_count(), 32);
        assert_eq!(world.live_ropes().count(), 0);
        assert_eq!(world.canvas.width(), settings.canvas.pixels_width);
    }

    #[test]
    fn test_reduced_gore_turns_off_trails() {
        let settings = Settings {
            reduced_gore: true,
            ..Default::default()
        };
        let mut world = RopeWorld::new(&settings);
        let report = world.spawner.spawn(
            &mut world.pool,
            &world.anchors,
            &SpawnRequest::new(Vec2::ZERO, 2),
        );
        for spawned in &report.spawned {
            assert!(!world.pool.get(spawned.handle).unwrap().paint.enabled);
        }
    }
}
