//! Verlet Guts headless demo
//!
//! Runs a scripted scene: a zombie wanders, dies and spills its guts, the
//! corpse despawns out from under the ropes, and a second hit may spray loose
//! giblets if it wins the spawn chance roll. Prints a JSON summary and
//! optionally dumps the blood canvas.
//!
//! Usage: `verlet-guts [settings.json] [canvas.pam]`

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use std::io::Write;
    use std::path::{Path, PathBuf};

    use glam::Vec2;
    use serde::Serialize;

    use verlet_guts::Settings;
    use verlet_guts::sim::{FixedStepper, PaintCanvas, RopeWorld, SpawnRequest, TickInput, tick};

    /// Simulated display rate
    const FRAME_DT: f32 = 1.0 / 60.0;
    const FRAMES: u32 = 60 * 8;
    const DEATH_FRAME: u32 = 60;
    const CORPSE_GONE_FRAME: u32 = 150;
    const SECOND_HIT_FRAME: u32 = 200;

    #[derive(Debug, Serialize)]
    struct RunSummary {
        seed: u64,
        ticks: u64,
        live_ropes: usize,
        attached_ropes: usize,
        quiescent_ropes: usize,
        pool_available: usize,
        canvas_stamps: u64,
        painted_pixels: usize,
    }

    pub fn run() {
        let args: Vec<String> = std::env::args().collect();
        let settings_path = args.get(1).map(PathBuf::from);
        let canvas_path = args.get(2).map(PathBuf::from);

        let settings = Settings::load_or_default(settings_path.as_deref());
        let mut world = RopeWorld::new(&settings);
        let mut stepper = FixedStepper::default();

        let zombie = world.anchors.insert(Vec2::new(-3.0, 0.0));
        let mut input = TickInput::default();

        for frame in 0..FRAMES {
            let t = frame as f32 * FRAME_DT;

            // Zombie shambles in a slow circle until the corpse is removed
            let zombie_pos = Vec2::new(-3.0 + t.cos() * 0.5, (t * 1.3).sin() * 0.5);
            world.anchors.set_position(zombie, zombie_pos);

            match frame {
                DEATH_FRAME => {
                    log::info!("Zombie died at ({:.2}, {:.2})", zombie_pos.x, zombie_pos.y);
                    input
                        .spawns
                        .push(SpawnRequest::new(zombie_pos, 5).anchored(zombie));
                }
                CORPSE_GONE_FRAME => {
                    world.anchors.remove(zombie);
                    log::info!("Corpse despawned; attached ropes fall loose");
                }
                SECOND_HIT_FRAME => {
                    input.spawns.push(
                        SpawnRequest::new(Vec2::new(2.0, 1.0), 4)
                            .with_hit_normal(Vec2::new(-1.0, 0.2))
                            .from_hit(),
                    );
                }
                _ => {}
            }

            stepper.advance(FRAME_DT, |dt| {
                tick(&mut world, &input, dt);
                // One-shot events only apply to the first substep
                input.spawns.clear();
                input.release_all = false;
            });
        }

        let summary = RunSummary {
            seed: world.seed,
            ticks: world.time_ticks,
            live_ropes: world.live_ropes().count(),
            attached_ropes: world.attached_count(),
            quiescent_ropes: world.quiescent_count(),
            pool_available: world.pool.available_count(),
            canvas_stamps: world.canvas.stamp_count(),
            painted_pixels: world.canvas.painted_pixel_count(),
        };
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{}", json),
            Err(e) => log::error!("Failed to serialize summary: {}", e),
        }

        if let Some(path) = canvas_path {
            match write_pam(&world.canvas, &path) {
                Ok(()) => log::info!("Canvas written to {}", path.display()),
                Err(e) => log::error!("Failed to write canvas: {}", e),
            }
        }
    }

    /// Write the canvas as a PAM (P7 RGB_ALPHA) image, top row first
    fn write_pam(canvas: &PaintCanvas, path: &Path) -> std::io::Result<()> {
        let mut file = std::io::BufWriter::new(std::fs::File::create(path)?);
        write!(
            file,
            "P7\nWIDTH {}\nHEIGHT {}\nDEPTH 4\nMAXVAL 255\nTUPLTYPE RGB_ALPHA\nENDHDR\n",
            canvas.width(),
            canvas.height()
        )?;
        let row_bytes = canvas.width() as usize * 4;
        for row in canvas.as_bytes().chunks_exact(row_bytes).rev() {
            file.write_all(row)?;
        }
        file.flush()
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Verlet Guts (native) starting...");
    demo::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Library-only on the web; the host game drives the simulation
}
