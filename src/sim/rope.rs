//! Verlet rope solver
//!
//! A fixed-capacity particle chain advanced with damped Verlet integration and
//! sequential (Gauss-Seidel) distance constraints. The head particle can be
//! pinned to an anchor; over-stretching any segment tears it free. Detached
//! ropes that stop moving go to sleep until nudged or re-initialized. A rope
//! still under gravity is accelerating, so it never sleeps.
//!
//! Step order is integrate → paint tail → relax constraints → tear check →
//! sleep check. The tail stamp uses the unconstrained position so painting
//! stays a single call per step.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::anchor::{AnchorId, AnchorSource};
use super::paint::{PaintSurface, Rgba};
use crate::consts::*;

/// Physical tuning for a rope instance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RopeParams {
    /// Rest spacing between adjacent particles (world units)
    pub segment_length: f32,
    /// Constraint relaxation passes per step (at least 1)
    pub solver_iterations: u32,
    /// Extra target length as a fraction of `segment_length`
    pub slack: f32,
    /// Fraction of implied velocity kept each step
    pub damping: f32,
    /// Acceleration applied to every free particle
    pub gravity: Vec2,
    /// A segment longer than `break_stretch * segment_length` tears the head free
    pub break_stretch: f32,
    /// Squared head/tail speed (units/s) under which a detached rope sleeps.
    /// Zero disables sleeping.
    pub sleep_speed_sq: f32,
}

impl Default for RopeParams {
    fn default() -> Self {
        Self {
            segment_length: 0.08,
            solver_iterations: 4,
            slack: 0.0,
            damping: 0.985,
            gravity: Vec2::new(0.0, -DEFAULT_GRAVITY),
            break_stretch: 1.8,
            sleep_speed_sq: SLEEP_SPEED_SQ,
        }
    }
}

/// Blood stamped by the tail particle every step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrailPaint {
    pub enabled: bool,
    pub color: Rgba,
    pub radius_px: i32,
}

impl Default for TrailPaint {
    fn default() -> Self {
        Self {
            enabled: true,
            color: Rgba::BLOOD,
            radius_px: TRAIL_PAINT_RADIUS,
        }
    }
}

/// One simulated chain of particles
#[derive(Debug, Clone)]
pub struct RopeSolver {
    /// Current positions (full capacity; only `..segment_count` is live)
    pos: Vec<Vec2>,
    /// Previous positions (Verlet state)
    prev: Vec<Vec2>,
    segment_count: usize,
    pub params: RopeParams,
    pub paint: TrailPaint,
    anchor: Option<AnchorId>,
    attached: bool,
    quiescent: bool,
}

impl RopeSolver {
    /// Allocate a rope with room for `capacity` particles. The buffers are
    /// never resized afterwards.
    pub fn new(capacity: usize) -> Self {
        let clamped = capacity.clamp(MIN_SEGMENTS, ROPE_CAPACITY);
        if clamped != capacity {
            log::warn!(
                "Rope capacity {} out of range, using {}",
                capacity,
                clamped
            );
        }
        Self {
            pos: vec![Vec2::ZERO; clamped],
            prev: vec![Vec2::ZERO; clamped],
            segment_count: clamped,
            params: RopeParams::default(),
            paint: TrailPaint::default(),
            anchor: None,
            attached: false,
            quiescent: false,
        }
    }

    pub fn with_params(capacity: usize, params: RopeParams) -> Self {
        let mut rope = Self::new(capacity);
        rope.params = params;
        rope
    }

    /// Lay the chain out straight from `head` along `direction` with zero
    /// velocity. Without a head position the rope restarts from its current
    /// head. Clears attachment and sleep.
    pub fn initialize(
        &mut self,
        head: Option<Vec2>,
        direction: Vec2,
        segment_count: usize,
        rest_length: f32,
    ) {
        let head = head.filter(|p| p.is_finite()).unwrap_or(self.pos[0]);
        let dir = if direction.is_finite() && direction.length_squared() >= DEGENERATE_DIR_SQ {
            direction.normalize()
        } else {
            Vec2::X
        };
        if rest_length.is_finite() {
            self.params.segment_length = rest_length.max(0.0);
        }

        let spacing = self.params.segment_length;
        // Lay out the whole buffer so growing later reveals a sane pose
        for (i, (p, q)) in self.pos.iter_mut().zip(self.prev.iter_mut()).enumerate() {
            *p = head + dir * (spacing * i as f32);
            *q = *p;
        }

        self.set_segment_count(segment_count);
        self.anchor = None;
        self.attached = false;
        self.quiescent = false;
    }

    /// Return to the freshly allocated state (used by the pool on release)
    pub fn reset(&mut self) {
        self.params = RopeParams::default();
        self.paint = TrailPaint::default();
        let capacity = self.capacity();
        self.initialize(Some(Vec2::ZERO), Vec2::X, capacity, self.params.segment_length);
    }

    /// Pin the head to an anchor. The head snaps to the anchor immediately so
    /// there is no visible pop. An anchor that cannot be resolved leaves the
    /// rope detached.
    pub fn attach(&mut self, anchor: AnchorId, anchors: &impl AnchorSource) {
        match anchors.anchor_position(anchor).filter(|p| p.is_finite()) {
            Some(p) => {
                self.pos[0] = p;
                self.prev[0] = p;
                self.anchor = Some(anchor);
                self.attached = true;
                self.quiescent = false;
            }
            None => {
                log::debug!("Cannot attach rope to missing anchor {:?}", anchor);
                self.anchor = None;
                self.attached = false;
            }
        }
    }

    /// Release the head. Also zeroes gravity so the loose rope goes limp
    /// instead of falling away. Positions are untouched.
    pub fn detach(&mut self) {
        self.attached = false;
        self.anchor = None;
        self.params.gravity = Vec2::ZERO;
    }

    /// Add `impulse` worth of velocity to every particle except the head
    pub fn nudge(&mut self, impulse: Vec2) {
        if !impulse.is_finite() {
            log::warn!("Ignoring non-finite rope impulse {:?}", impulse);
            return;
        }
        for q in &mut self.prev[1..self.segment_count] {
            *q -= impulse;
        }
        self.quiescent = false;
    }

    /// Shrink or grow the simulated window without reallocating
    pub fn set_segment_count(&mut self, count: usize) {
        self.segment_count = count.clamp(MIN_SEGMENTS, self.capacity());
    }

    /// Advance one fixed timestep
    pub fn step(&mut self, dt: f32, anchors: &impl AnchorSource, surface: &mut impl PaintSurface) {
        if self.quiescent {
            return;
        }
        if !dt.is_finite() || dt <= 0.0 {
            log::warn!("Skipping rope step with invalid dt {}", dt);
            return;
        }

        let n = self.segment_count;
        let pin = self.resolve_pin(anchors);

        // 1) Integrate (Verlet)
        let damping = self.params.damping;
        let accel = self.params.gravity * (dt * dt);
        for i in 0..n {
            if i == 0 {
                if let Some(p) = pin {
                    // Zero velocity at the pin
                    self.pos[0] = p;
                    self.prev[0] = p;
                    continue;
                }
            }
            let p0 = self.pos[i];
            let v = (p0 - self.prev[i]) * damping;
            self.prev[i] = p0;
            self.pos[i] = p0 + v + accel;
        }

        // 2) Tail trail, before constraints
        if self.paint.enabled {
            surface.paint_disc(self.pos[n - 1], self.paint.radius_px, self.paint.color);
        }

        // 3) Satisfy distance constraints
        let target = self.params.segment_length * (1.0 + self.params.slack);
        let pinned = pin.is_some();
        for _ in 0..self.params.solver_iterations.max(1) {
            for i in 1..n {
                self.satisfy(i - 1, i, target, pinned);
            }
        }

        if self.pos[..n].iter().any(|p| !p.is_finite()) {
            // Roll back to the last good pose rather than propagate NaNs
            log::warn!("Rejecting non-finite rope step");
            self.pos[..n].copy_from_slice(&self.prev[..n]);
            return;
        }

        // 4) Tear check (first breach wins)
        if self.attached {
            let limit = self.params.break_stretch * self.params.segment_length;
            let torn = (1..n).find(|&i| self.pos[i].distance(self.pos[i - 1]) > limit);
            if let Some(i) = torn {
                log::debug!("Rope tore at segment {}", i);
                self.detach();
            }
        }

        // 5) Sleep once head and tail stop moving and the chain has settled
        if self.can_sleep(dt, target) {
            self.quiescent = true;
        }
    }

    fn can_sleep(&self, dt: f32, target: f32) -> bool {
        if self.attached || self.params.gravity != Vec2::ZERO {
            return false;
        }
        let n = self.segment_count;
        let eps = self.params.sleep_speed_sq * dt * dt;
        let head_v = self.pos[0] - self.prev[0];
        let tail_v = self.pos[n - 1] - self.prev[n - 1];
        if head_v.length_squared() >= eps || tail_v.length_squared() >= eps {
            return false;
        }
        if target <= CONSTRAINT_EPSILON {
            return true;
        }
        let tolerance = target * SLEEP_STRETCH_TOLERANCE;
        self.pos[..n]
            .windows(2)
            .all(|w| (w[0].distance(w[1]) - target).abs() < tolerance)
    }

    /// Anchor position to pin to this step. Detaches if the anchor is gone.
    fn resolve_pin(&mut self, anchors: &impl AnchorSource) -> Option<Vec2> {
        if !self.attached {
            return None;
        }
        let pos = self
            .anchor
            .and_then(|id| anchors.anchor_position(id))
            .filter(|p| p.is_finite());
        if pos.is_none() {
            log::debug!("Rope anchor {:?} lost, detaching", self.anchor);
            self.detach();
        }
        pos
    }

    #[inline]
    fn satisfy(&mut self, a: usize, b: usize, rest: f32, pinned: bool) {
        let d = self.pos[b] - self.pos[a];
        let m = d.length();
        if m < CONSTRAINT_EPSILON {
            return;
        }

        let diff = (m - rest) / m;
        // Pinned head takes none of the correction
        let wa = if a == 0 && pinned { 0.0 } else { 0.5 };
        let wb = 1.0 - wa;

        let corr = d * diff;
        self.pos[a] += corr * wa;
        self.pos[b] -= corr * wb;
    }

    /// Live particle positions
    pub fn particles(&self) -> &[Vec2] {
        &self.pos[..self.segment_count]
    }

    /// Live previous positions
    pub fn previous(&self) -> &[Vec2] {
        &self.prev[..self.segment_count]
    }

    /// Implied per-step velocity of particle `i`
    pub fn velocity(&self, i: usize) -> Option<Vec2> {
        (i < self.segment_count).then(|| self.pos[i] - self.prev[i])
    }

    pub fn head(&self) -> Vec2 {
        self.pos[0]
    }

    /// Rope end (tail particle) position
    pub fn tail(&self) -> Vec2 {
        self.pos[self.segment_count - 1]
    }

    pub fn segment_count(&self) -> usize {
        self.segment_count
    }

    pub fn capacity(&self) -> usize {
        self.pos.len()
    }

    pub fn anchor(&self) -> Option<AnchorId> {
        self.anchor
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn is_quiescent(&self) -> bool {
        self.quiescent
    }
}
