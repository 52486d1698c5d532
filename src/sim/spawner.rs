//! Giblet spawner
//!
//! On a death or ability event the spawner pulls a batch of ropes from the
//! pool, fans them out radially around the origin, kicks them and schedules
//! each one for automatic release. It can also poll for targets near its
//! origin and damage them while ropes are out.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::anchor::{AnchorId, AnchorSource};
use super::paint::{PaintSurface, Rgba};
use super::pool::{Pool, PoolKey, RopeHandle};
use super::rope::{RopeParams, TrailPaint};
use crate::consts::*;
use crate::polar_to_cartesian;

/// How batch gravity is aimed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GravityMode {
    /// Every rope falls along the configured gravity vector
    #[default]
    Uniform,
    /// Each rope falls away from the origin along its spawn direction
    Radial,
}

/// What happens when a rope's lifetime runs out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReleaseMode {
    /// Return the rope to the pool
    #[default]
    Release,
    /// Leave it in the world to settle and sleep
    Inert,
}

/// Per-batch rope tuning. Physical parameters are shared by the whole batch;
/// segment count, lifetime and kick are randomized per rope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub pool_key: PoolKey,
    /// Inclusive particle count range
    pub segment_count_range: (usize, usize),
    pub segment_length: f32,
    pub solver_iterations: u32,
    pub slack: f32,
    pub damping: f32,
    pub break_stretch: f32,
    pub gravity: Vec2,
    pub gravity_mode: GravityMode,
    /// Constant wind added on top of gravity
    pub wind: Vec2,
    pub impulse: f32,
    pub impulse_variance: f32,
    /// Radius of the random offset added to the kick direction
    pub jitter: f32,
    /// Seconds, `(min, max)`
    pub lifetime_range: (f32, f32),
    pub detach_on_expire: bool,
    pub paint_trail: bool,
    pub trail_color: Rgba,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            pool_key: PoolKey::Rope,
            segment_count_range: (12, 22),
            segment_length: 0.08,
            solver_iterations: 4,
            slack: 0.05,
            damping: 0.985,
            break_stretch: 10.0,
            gravity: Vec2::new(0.0, -DEFAULT_GRAVITY),
            gravity_mode: GravityMode::Uniform,
            wind: Vec2::ZERO,
            impulse: 0.25,
            impulse_variance: 0.15,
            jitter: 0.125,
            lifetime_range: (2.5, 5.0),
            detach_on_expire: true,
            paint_trail: true,
            trail_color: Rgba::BLOOD,
        }
    }
}

/// Periodic damage around the spawner while its ropes are out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndDamageConfig {
    pub enabled: bool,
    pub damage: i32,
    /// Seconds between polls
    pub cooldown: f32,
    /// Added (twice) to the spawner scale to get the query radius
    pub extra_radius: f32,
    pub hit_color: Rgba,
    pub hit_paint_radius: i32,
}

impl Default for EndDamageConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            damage: 10,
            cooldown: 0.5,
            extra_radius: 0.25,
            hit_color: Rgba::HIT_VIOLET,
            hit_paint_radius: 4,
        }
    }
}

/// Ability events the spawner reacts to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbilityTrigger {
    pub enabled: bool,
    /// Only abilities raised with this key spawn a batch
    pub listen_key: String,
}

impl Default for AbilityTrigger {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_key: "speed_proc".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnerConfig {
    pub batch: BatchConfig,
    pub release: ReleaseMode,
    /// Probability that a hit spawns a batch
    pub spawn_chance: f32,
    pub ability: AbilityTrigger,
    pub end_damage: EndDamageConfig,
}

impl Default for SpawnerConfig {
    fn default() -> Self {
        Self {
            batch: BatchConfig::default(),
            release: ReleaseMode::Release,
            spawn_chance: 0.1,
            ability: AbilityTrigger::default(),
            end_damage: EndDamageConfig::default(),
        }
    }
}

/// What raised a spawn request
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SpawnTrigger {
    /// Always spawns
    #[default]
    Direct,
    /// A killing hit; spawns with `spawn_chance`
    Hit,
    /// An ability event; spawns if it matches the ability trigger
    Ability(String),
}

/// One spawn event
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnRequest {
    pub origin: Vec2,
    /// Anchor to pin every rope's head to
    pub anchor: Option<AnchorId>,
    pub count: usize,
    /// Surface normal of the killing hit; ropes fly against it
    pub hit_normal: Option<Vec2>,
    pub trigger: SpawnTrigger,
}

impl SpawnRequest {
    pub fn new(origin: Vec2, count: usize) -> Self {
        Self {
            origin,
            anchor: None,
            count,
            hit_normal: None,
            trigger: SpawnTrigger::Direct,
        }
    }

    pub fn anchored(mut self, anchor: AnchorId) -> Self {
        self.anchor = Some(anchor);
        self
    }

    pub fn with_hit_normal(mut self, normal: Vec2) -> Self {
        self.hit_normal = Some(normal);
        self
    }

    /// Raised by a hit: subject to the spawn chance roll
    pub fn from_hit(mut self) -> Self {
        self.trigger = SpawnTrigger::Hit;
        self
    }

    /// Raised by an ability with `key`
    pub fn from_ability(mut self, key: impl Into<String>) -> Self {
        self.trigger = SpawnTrigger::Ability(key.into());
        self
    }
}

/// A rope handed out by a batch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnedRope {
    pub handle: RopeHandle,
    /// Fan angle before jitter (radians, decreasing = clockwise)
    pub angle: f32,
    pub outward: Vec2,
    pub lifetime: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpawnReport {
    pub spawned: Vec<SpawnedRope>,
    /// Instances skipped because the pool had nothing to give
    pub skipped: usize,
}

/// A target returned by a proximity query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageTarget {
    pub id: u32,
    pub position: Vec2,
}

/// Combat layer hooks used by end damage
pub trait DamageProvider {
    /// Append every damageable target within `radius` of `center` to `out`
    fn query_targets(&self, center: Vec2, radius: f32, out: &mut Vec<DamageTarget>);
    fn apply_damage(&mut self, target: u32, amount: i32, direction: Vec2);
}

/// Provider with nothing to hit
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTargets;

impl DamageProvider for NoTargets {
    fn query_targets(&self, _center: Vec2, _radius: f32, _out: &mut Vec<DamageTarget>) {}
    fn apply_damage(&mut self, _target: u32, _amount: i32, _direction: Vec2) {}
}

#[derive(Debug, Clone, Copy)]
struct LiveRope {
    handle: RopeHandle,
    /// Seconds left; `None` once expired in inert mode
    remaining: Option<f32>,
    detach_on_expire: bool,
}

/// Spawns, tracks and retires rope batches
#[derive(Debug, Clone)]
pub struct RopeSpawner {
    pub config: SpawnerConfig,
    rng: Pcg32,
    live: Vec<LiveRope>,
    origin: Vec2,
    scale: f32,
    damage_cooldown: f32,
    targets: Vec<DamageTarget>,
}

impl RopeSpawner {
    pub fn new(config: SpawnerConfig, seed: u64) -> Self {
        Self {
            config,
            rng: Pcg32::seed_from_u64(seed),
            live: Vec::new(),
            origin: Vec2::ZERO,
            scale: 0.0,
            damage_cooldown: 0.0,
            targets: Vec::new(),
        }
    }

    /// Spawn with the configured batch settings, if the request's trigger
    /// passes. A rejected trigger returns an empty report.
    pub fn spawn(
        &mut self,
        pool: &mut impl Pool,
        anchors: &impl AnchorSource,
        request: &SpawnRequest,
    ) -> SpawnReport {
        if !self.accepts(&request.trigger) {
            return SpawnReport::default();
        }
        let batch = self.config.batch.clone();
        self.spawn_batch(pool, anchors, request, &batch)
    }

    /// Hits roll the spawn chance before any other draw; abilities must match
    /// the listen key
    fn accepts(&mut self, trigger: &SpawnTrigger) -> bool {
        match trigger {
            SpawnTrigger::Direct => true,
            SpawnTrigger::Hit => {
                let roll: f32 = self.rng.random();
                let hit = roll < self.config.spawn_chance;
                if !hit {
                    log::debug!("Hit rolled {:.3}, no spawn", roll);
                }
                hit
            }
            SpawnTrigger::Ability(key) => {
                let ability = &self.config.ability;
                ability.enabled && *key == ability.listen_key
            }
        }
    }

    /// Fan `request.count` ropes around the origin. Never fails: instances
    /// the pool cannot supply are counted as skipped.
    pub fn spawn_batch(
        &mut self,
        pool: &mut impl Pool,
        anchors: &impl AnchorSource,
        request: &SpawnRequest,
        batch: &BatchConfig,
    ) -> SpawnReport {
        let mut report = SpawnReport::default();
        if request.count == 0 {
            return report;
        }
        self.origin = request.origin;

        let step = std::f32::consts::TAU / request.count as f32;
        let base_gravity = if batch.gravity.length_squared() > 0.0 {
            batch.gravity.length()
        } else {
            DEFAULT_GRAVITY
        };
        let head = request
            .anchor
            .and_then(|id| anchors.anchor_position(id))
            .unwrap_or(request.origin);
        let hit_dir = request
            .hit_normal
            .filter(|n| n.is_finite() && n.length_squared() > DEGENERATE_DIR_SQ)
            .map(|n| -n.normalize());

        // Bigger spawners grow longer guts
        let segment_length = batch.segment_length * (1.0 + self.scale);
        let (lo, hi) = batch.segment_count_range;
        let seg_lo = lo.min(hi).max(MIN_SEGMENTS);
        let seg_hi = lo.max(hi).max(seg_lo);

        for i in 0..request.count {
            let Some(handle) = pool.acquire(batch.pool_key) else {
                log::debug!("No rope available for batch member {}", i);
                report.skipped += 1;
                continue;
            };

            let angle = -(i as f32) * step;
            let outward = polar_to_cartesian(1.0, angle);

            // Fixed draw order keeps batches reproducible per seed
            let segments = self.rng.random_range(seg_lo..=seg_hi);
            let jitter = random_in_disc(&mut self.rng) * batch.jitter;
            let kick = uniform(&mut self.rng, -batch.impulse_variance, batch.impulse_variance);
            let lifetime = uniform(&mut self.rng, batch.lifetime_range.0, batch.lifetime_range.1);

            let Some(rope) = pool.get_mut(handle) else {
                pool.release(handle);
                report.skipped += 1;
                continue;
            };

            rope.initialize(Some(head), outward, segments, segment_length);
            rope.params = RopeParams {
                segment_length,
                solver_iterations: batch.solver_iterations.max(1),
                slack: batch.slack,
                damping: batch.damping,
                gravity: Vec2::ZERO,
                break_stretch: batch.break_stretch,
                ..rope.params
            };
            if let Some(id) = request.anchor {
                rope.attach(id, anchors);
            }

            let dir = hit_dir.unwrap_or(outward);
            let dir = (dir + jitter).try_normalize().unwrap_or(dir);
            let magnitude = (batch.impulse + kick).max(0.0);
            rope.nudge(dir * magnitude);

            let gravity = match batch.gravity_mode {
                GravityMode::Radial => outward * base_gravity,
                GravityMode::Uniform => batch.gravity,
            };
            rope.params.gravity = gravity + batch.wind;
            rope.paint = TrailPaint {
                enabled: batch.paint_trail,
                color: batch.trail_color,
                radius_px: TRAIL_PAINT_RADIUS,
            };

            self.live.push(LiveRope {
                handle,
                remaining: Some(lifetime),
                detach_on_expire: batch.detach_on_expire,
            });
            report.spawned.push(SpawnedRope {
                handle,
                angle,
                outward,
                lifetime,
            });
        }

        log::info!(
            "Spawned {} ropes at ({:.2}, {:.2}), {} skipped",
            report.spawned.len(),
            request.origin.x,
            request.origin.y,
            report.skipped
        );
        report
    }

    /// Advance lifetime timers. Returns how many ropes were released to the pool.
    pub fn update(&mut self, dt: f32, pool: &mut impl Pool) -> usize {
        let release = self.config.release;
        let mut released = 0;

        self.live.retain_mut(|live| {
            let Some(remaining) = live.remaining.as_mut() else {
                // Inert leftovers stay tracked until the pool forgets them
                return pool.get(live.handle).is_some();
            };
            *remaining -= dt;
            if *remaining > 0.0 {
                return true;
            }

            live.remaining = None;
            if live.detach_on_expire {
                if let Some(rope) = pool.get_mut(live.handle) {
                    rope.detach();
                }
            }
            match release {
                ReleaseMode::Release => {
                    pool.release(live.handle);
                    released += 1;
                    false
                }
                ReleaseMode::Inert => true,
            }
        });

        if released > 0 {
            log::debug!("Released {} expired ropes", released);
        }
        released
    }

    /// Release one rope early. Returns false if this spawner doesn't own it.
    pub fn release(&mut self, handle: RopeHandle, pool: &mut impl Pool) -> bool {
        let Some(index) = self.live.iter().position(|l| l.handle == handle) else {
            return false;
        };
        self.live.remove(index);
        if let Some(rope) = pool.get_mut(handle) {
            rope.detach();
        }
        pool.release(handle);
        true
    }

    /// Detach and release every tracked rope
    pub fn release_all(&mut self, pool: &mut impl Pool) -> usize {
        let count = self.live.len();
        for live in self.live.drain(..) {
            if let Some(rope) = pool.get_mut(live.handle) {
                rope.detach();
            }
            pool.release(live.handle);
        }
        count
    }

    /// Poll for targets around the origin and damage them on cooldown.
    /// Returns the number of targets hit this call.
    pub fn tick_end_damage(
        &mut self,
        dt: f32,
        provider: &mut impl DamageProvider,
        surface: &mut impl PaintSurface,
    ) -> usize {
        let cfg = &self.config.end_damage;
        if !cfg.enabled || self.live.is_empty() {
            return 0;
        }

        self.damage_cooldown -= dt;
        if self.damage_cooldown > 0.0 {
            return 0;
        }
        self.damage_cooldown = cfg.cooldown;

        let radius = self.scale + cfg.extra_radius * 2.0;
        self.targets.clear();
        provider.query_targets(self.origin, radius, &mut self.targets);

        let paint_radius = cfg.hit_paint_radius.saturating_add(radius.floor() as i32);
        for target in &self.targets {
            let dir = target.position - self.origin;
            provider.apply_damage(target.id, cfg.damage, dir);
            surface.paint_disc(target.position, paint_radius, cfg.hit_color);
        }
        self.targets.len()
    }

    pub fn live_handles(&self) -> impl Iterator<Item = RopeHandle> + '_ {
        self.live.iter().map(|l| l.handle)
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    /// Follow a moving owner
    pub fn set_origin(&mut self, origin: Vec2) {
        self.origin = origin;
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Owner scale. Feeds the end-damage radius and the segment length.
    pub fn set_scale(&mut self, scale: f32) {
        if scale.is_finite() {
            self.scale = scale.max(0.0);
        }
    }
}

/// Uniform sample in `[lo, hi)`, or `lo` for an empty range
fn uniform(rng: &mut Pcg32, lo: f32, hi: f32) -> f32 {
    if hi > lo { rng.random_range(lo..hi) } else { lo }
}

/// Uniform point inside the unit disc
fn random_in_disc(rng: &mut Pcg32) -> Vec2 {
    let theta = rng.random_range(0.0..std::f32::consts::TAU);
    let r = rng.random::<f32>().sqrt();
    polar_to_cartesian(r, theta)
}
