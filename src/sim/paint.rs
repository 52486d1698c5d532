//! Pixel paint surface for blood trails and hit splats
//!
//! Ropes only see the [`PaintSurface`] trait. [`PaintCanvas`] is the concrete
//! CPU bitmap: a fixed RGBA8 grid covering a world-space rectangle, written
//! with solid disc stamps. Stamps overwrite; order between stamps is irrelevant.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// 8-bit RGBA color, laid out for direct upload as texture bytes
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);
    /// Dark arterial red, 75% opacity
    pub const BLOOD: Rgba = Rgba::new(89, 0, 0, 191);
    pub const INTESTINE: Rgba = Rgba::new(204, 26, 26, 255);
    pub const HIT_VIOLET: Rgba = Rgba::new(138, 43, 226, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Build from normalized channels (clamped to 0..=1)
    pub fn from_f32(r: f32, g: f32, b: f32, a: f32) -> Self {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self::new(q(r), q(g), q(b), q(a))
    }
}

/// Something ropes and the spawner can stamp color onto
pub trait PaintSurface {
    /// Stamp a solid disc at a world position. Must silently ignore positions
    /// that fall outside the surface.
    fn paint_disc(&mut self, world: Vec2, radius_px: i32, color: Rgba);
}

/// Surface that discards every stamp (headless runs, painting disabled)
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSurface;

impl PaintSurface for NullSurface {
    fn paint_disc(&mut self, _world: Vec2, _radius_px: i32, _color: Rgba) {}
}

/// Canvas dimensions and placement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub pixels_width: u32,
    pub pixels_height: u32,
    /// World units covered horizontally
    pub world_width: f32,
    /// World units covered vertically
    pub world_height: f32,
    /// World position of the canvas center
    pub center: Vec2,
    pub clear_color: Rgba,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            pixels_width: 2048,
            pixels_height: 2048,
            world_width: 32.0,
            world_height: 32.0,
            center: Vec2::ZERO,
            clear_color: Rgba::TRANSPARENT,
        }
    }
}

/// CPU-side paintable bitmap. Row 0 is the bottom edge (world +Y is up).
#[derive(Debug, Clone)]
pub struct PaintCanvas {
    config: CanvasConfig,
    pixels: Vec<Rgba>,
    width: i32,
    height: i32,
    px_per_unit: Vec2,
    stamps: u64,
}

impl PaintCanvas {
    pub fn new(config: CanvasConfig) -> Self {
        let width = config.pixels_width.clamp(1, i32::MAX as u32) as i32;
        let height = config.pixels_height.clamp(1, i32::MAX as u32) as i32;
        let world = Vec2::new(config.world_width, config.world_height).max(Vec2::splat(f32::EPSILON));
        Self {
            config,
            pixels: vec![config.clear_color; width as usize * height as usize],
            width,
            height,
            px_per_unit: Vec2::new(width as f32, height as f32) / world,
            stamps: 0,
        }
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    pub fn width(&self) -> u32 {
        self.width as u32
    }

    pub fn height(&self) -> u32 {
        self.height as u32
    }

    /// Number of disc stamps that landed on the canvas
    pub fn stamp_count(&self) -> u64 {
        self.stamps
    }

    /// World → pixel coordinates, or `None` if outside the canvas
    pub fn world_to_pixel(&self, world: Vec2) -> Option<(i32, i32)> {
        if !world.is_finite() {
            return None;
        }
        let half = Vec2::new(self.config.world_width, self.config.world_height) * 0.5;
        let local = (world - self.config.center + half) * self.px_per_unit;
        let (px, py) = (local.x.floor(), local.y.floor());
        if px < 0.0 || py < 0.0 || px >= self.width as f32 || py >= self.height as f32 {
            return None;
        }
        Some((px as i32, py as i32))
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<Rgba> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    pub fn pixels(&self) -> &[Rgba] {
        &self.pixels
    }

    /// Raw RGBA8 bytes, bottom row first
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    /// Pixels that differ from the clear color
    pub fn painted_pixel_count(&self) -> usize {
        let clear = self.config.clear_color;
        self.pixels.iter().filter(|&&p| p != clear).count()
    }

    /// Reset every pixel to `color` (or the configured clear color)
    pub fn clear(&mut self, color: Option<Rgba>) {
        let color = color.unwrap_or(self.config.clear_color);
        self.pixels.fill(color);
    }

    /// Paint transparent pixels over a disc
    pub fn erase_disc(&mut self, world: Vec2, radius_px: i32) {
        self.paint_disc(world, radius_px, Rgba::TRANSPARENT);
    }

    /// Bresenham line with a disc stamp at every step. No-op if either end is
    /// off the canvas.
    pub fn paint_line(&mut self, from: Vec2, to: Vec2, radius_px: i32, color: Rgba) {
        let (Some((mut x0, mut y0)), Some((x1, y1))) =
            (self.world_to_pixel(from), self.world_to_pixel(to))
        else {
            return;
        };

        let dx = (x1 - x0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let dy = -(y1 - y0).abs();
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;

        loop {
            self.stamp(x0, y0, radius_px, color);
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }

    fn stamp(&mut self, cx: i32, cy: i32, radius: i32, color: Rgba) {
        // Anything past width + height already covers the whole canvas
        let r = i64::from(radius.clamp(0, self.width.saturating_add(self.height)));
        let (cx, cy) = (i64::from(cx), i64::from(cy));
        let r2 = r * r;
        let min_x = (cx - r).max(0);
        let max_x = (cx + r).min(i64::from(self.width) - 1);
        let min_y = (cy - r).max(0);
        let max_y = (cy + r).min(i64::from(self.height) - 1);

        let width = self.width as usize;
        for y in min_y..=max_y {
            let dy = y - cy;
            let dy2 = dy * dy;
            let row = y as usize * width;
            for x in min_x..=max_x {
                let dx = x - cx;
                if dx * dx + dy2 <= r2 {
                    self.pixels[row + x as usize] = color;
                }
            }
        }
        self.stamps += 1;
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return None;
        }
        Some((y * self.width + x) as usize)
    }
}

impl PaintSurface for PaintCanvas {
    fn paint_disc(&mut self, world: Vec2, radius_px: i32, color: Rgba) {
        if let Some((cx, cy)) = self.world_to_pixel(world) {
            self.stamp(cx, cy, radius_px, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_canvas() -> PaintCanvas {
        // 10 world units across 100 pixels: 10 px per unit, centered on origin
        PaintCanvas::new(CanvasConfig {
            pixels_width: 100,
            pixels_height: 100,
            world_width: 10.0,
            world_height: 10.0,
            ..Default::default()
        })
    }

    #[test]
    fn test_world_to_pixel_mapping() {
        let canvas = small_canvas();
        assert_eq!(canvas.world_to_pixel(Vec2::ZERO), Some((50, 50)));
        assert_eq!(canvas.world_to_pixel(Vec2::new(-5.0, -5.0)), Some((0, 0)));
        assert_eq!(canvas.world_to_pixel(Vec2::new(4.95, 4.95)), Some((99, 99)));
        assert_eq!(canvas.world_to_pixel(Vec2::new(5.0, 0.0)), None);
        assert_eq!(canvas.world_to_pixel(Vec2::new(0.0, -5.01)), None);
        assert_eq!(canvas.world_to_pixel(Vec2::new(f32::NAN, 0.0)), None);
    }

    #[test]
    fn test_offset_center() {
        let canvas = PaintCanvas::new(CanvasConfig {
            pixels_width: 100,
            pixels_height: 100,
            world_width: 10.0,
            world_height: 10.0,
            center: Vec2::new(100.0, 0.0),
            ..Default::default()
        });
        assert_eq!(canvas.world_to_pixel(Vec2::new(100.0, 0.0)), Some((50, 50)));
        assert_eq!(canvas.world_to_pixel(Vec2::ZERO), None);
    }

    #[test]
    fn test_paint_disc_shape() {
        let mut canvas = small_canvas();
        canvas.paint_disc(Vec2::ZERO, 1, Rgba::BLOOD);
        // Radius 1 disc is a plus sign
        assert_eq!(canvas.painted_pixel_count(), 5);
        assert_eq!(canvas.pixel(50, 50), Some(Rgba::BLOOD));
        assert_eq!(canvas.pixel(51, 50), Some(Rgba::BLOOD));
        assert_eq!(canvas.pixel(50, 49), Some(Rgba::BLOOD));
        assert_eq!(canvas.pixel(51, 51), Some(Rgba::TRANSPARENT));
        assert_eq!(canvas.stamp_count(), 1);
    }

    #[test]
    fn test_paint_disc_clips_at_edges() {
        let mut canvas = small_canvas();
        canvas.paint_disc(Vec2::new(-5.0, -5.0), 2, Rgba::BLOOD);
        // Quarter of a radius-2 disc: (0,0),(1,0),(2,0),(0,1),(1,1),(0,2)
        assert_eq!(canvas.painted_pixel_count(), 6);
    }

    #[test]
    fn test_out_of_bounds_is_noop() {
        let mut canvas = small_canvas();
        canvas.paint_disc(Vec2::new(50.0, 50.0), 3, Rgba::BLOOD);
        canvas.paint_disc(Vec2::new(f32::INFINITY, 0.0), 3, Rgba::BLOOD);
        assert_eq!(canvas.painted_pixel_count(), 0);
        assert_eq!(canvas.stamp_count(), 0);
    }

    #[test]
    fn test_negative_radius_paints_single_pixel() {
        let mut canvas = small_canvas();
        canvas.paint_disc(Vec2::ZERO, -4, Rgba::BLOOD);
        assert_eq!(canvas.painted_pixel_count(), 1);
    }

    #[test]
    fn test_huge_radius_fills_canvas() {
        let mut canvas = PaintCanvas::new(CanvasConfig {
            pixels_width: 64,
            pixels_height: 64,
            ..Default::default()
        });
        canvas.paint_disc(Vec2::ZERO, 50_000, Rgba::BLOOD);
        assert_eq!(canvas.painted_pixel_count(), 64 * 64);

        // Even from a corner, the largest radius reaches every pixel
        canvas.clear(None);
        canvas.paint_disc(Vec2::new(-15.9, -15.9), i32::MAX, Rgba::INTESTINE);
        assert_eq!(canvas.painted_pixel_count(), 64 * 64);
        assert_eq!(canvas.pixel(63, 63), Some(Rgba::INTESTINE));
    }

    #[test]
    fn test_paint_line_connects_endpoints() {
        let mut canvas = small_canvas();
        canvas.paint_line(Vec2::new(-2.0, 0.0), Vec2::new(2.0, 0.0), 0, Rgba::BLOOD);
        // 30..=70 on row 50
        assert_eq!(canvas.painted_pixel_count(), 41);
        for x in 30..=70 {
            assert_eq!(canvas.pixel(x, 50), Some(Rgba::BLOOD));
        }

        // Off-canvas endpoint paints nothing
        canvas.clear(None);
        canvas.paint_line(Vec2::ZERO, Vec2::new(20.0, 0.0), 1, Rgba::BLOOD);
        assert_eq!(canvas.painted_pixel_count(), 0);
    }

    #[test]
    fn test_erase_and_clear() {
        let mut canvas = small_canvas();
        canvas.paint_disc(Vec2::ZERO, 3, Rgba::BLOOD);
        let painted = canvas.painted_pixel_count();
        assert!(painted > 0);

        canvas.erase_disc(Vec2::ZERO, 1);
        assert_eq!(canvas.painted_pixel_count(), painted - 5);

        canvas.clear(None);
        assert_eq!(canvas.painted_pixel_count(), 0);
    }

    #[test]
    fn test_byte_view() {
        let mut canvas = small_canvas();
        canvas.paint_disc(Vec2::new(-5.0, -5.0), 0, Rgba::new(1, 2, 3, 4));
        let bytes = canvas.as_bytes();
        assert_eq!(bytes.len(), 100 * 100 * 4);
        assert_eq!(&bytes[..4], &[1, 2, 3, 4]);
    }

    #[test]
    fn test_rgba_from_f32() {
        assert_eq!(Rgba::from_f32(0.35, 0.0, 0.0, 0.75), Rgba::BLOOD);
        assert_eq!(Rgba::from_f32(2.0, -1.0, 1.0, 1.0), Rgba::new(255, 0, 255, 255));
    }
}
