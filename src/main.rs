//! Glory Particles entry point
//!
//! On the web this mounts the particle field on `#canvas`. Natively it runs a
//! headless session against the embedded font and prints a summary.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    if let Err(e) = glory_particles::platform::web::run().await {
        log::error!("Failed to start: {:?}", e);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Glory particles (native, headless) starting...");

    // Optional quality preset, e.g. `glory-particles low`
    let mut settings = glory_particles::Settings::load();
    if let Some(quality) = std::env::args().nth(1) {
        settings.apply_quality(&quality);
    }

    let summary = headless::run(&settings, headless::FRAMES);
    match serde_json::to_string_pretty(&summary) {
        Ok(json) => println!("{}", json),
        Err(e) => log::error!("Failed to encode summary: {}", e),
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use glam::Vec2;
    use serde::Serialize;

    use glory_particles::Settings;
    use glory_particles::platform::{Controller, FrameHandle, Host, InputEvent, Phase};
    use glory_particles::sim::{
        EmbeddedFont, InputMode, Scene, StepStats, Viewport, spawn_success_rate,
    };

    pub const FRAMES: u32 = 240;
    const FRAME_MS: f64 = 1000.0 / 60.0;
    const SEED: u64 = 0x6c6f7279;

    /// Schedules nothing; frames are driven by the loop below
    #[derive(Default)]
    struct Headless {
        next: i32,
        listeners_attached: bool,
    }

    impl Host for Headless {
        fn request_frame(&mut self) -> Option<FrameHandle> {
            self.next += 1;
            Some(FrameHandle(self.next))
        }

        fn cancel_frame(&mut self, handle: FrameHandle) {
            log::debug!("Cancelled frame {}", handle.0);
        }

        fn detach_listeners(&mut self) {
            self.listeners_attached = false;
        }
    }

    #[derive(Debug, Serialize)]
    pub struct Summary {
        pub frames: u64,
        pub viewport: Viewport,
        pub particles: usize,
        pub target: usize,
        /// Mean pool size a fresh seed reaches on this mask
        pub expected_seed: f64,
        pub last_step: StepStats,
        pub fps: u32,
    }

    /// Mount at 1920x1080, sweep the pointer across the text, then resize
    /// to a phone viewport and tear down.
    pub fn run(settings: &Settings, frames: u32) -> Summary {
        let scene = Scene::from_settings(SEED, settings);
        let mut controller = Controller::new(scene, EmbeddedFont::new(), InputMode::Pointer);
        let mut host = Headless {
            listeners_attached: true,
            ..Default::default()
        };

        let desktop = Viewport::new(1920, 1080);
        if controller.mount(desktop, &mut host) != Phase::Running {
            log::warn!("Headless mount did not start the loop");
        }

        let mut time = 0.0;
        for i in 0..frames {
            let t = i as f32 / frames.max(1) as f32;
            let x = desktop.width as f32 * t;
            controller.handle_event(
                InputEvent::PointerMove(Vec2::new(x, desktop.center().y)),
                &mut host,
            );
            if let Some(stats) = controller.on_frame(time, &mut host) {
                log::trace!("{:?}", stats);
            }
            time += FRAME_MS;
        }
        controller.handle_event(InputEvent::PointerLeave, &mut host);

        controller.handle_event(InputEvent::Resize(Viewport::new(375, 667)), &mut host);
        for _ in 0..frames / 4 {
            controller.on_frame(time, &mut host);
            time += FRAME_MS;
        }

        controller.teardown(&mut host);
        debug_assert!(!host.listeners_attached);

        let scene = controller.scene();
        Summary {
            frames: controller.frames(),
            viewport: scene.viewport(),
            particles: scene.pool().len(),
            target: scene.target(),
            expected_seed: scene.target() as f64 * spawn_success_rate(scene.mask()),
            last_step: controller.last_stats(),
            fps: controller.fps(),
        }
    }
}
