//! Mount, frame loop and teardown
//!
//! The controller is platform agnostic: the browser glue implements `Host`
//! and forwards frames and events, tests drive it with a fake host.

use crate::sim::{InputMode, MaskSource, PointerState, Rebuild, Scene, StepStats, Viewport};

use super::input::{self, InputEvent};

/// Frames averaged by the FPS counter
const FPS_WINDOW: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No usable surface yet
    Uninitialized,
    /// Mask built and pool seeded, no frame scheduled
    Ready,
    /// A frame is scheduled and every frame schedules the next
    Running,
    /// Listeners detached, frames withdrawn; terminal
    TornDown,
}

/// Token for a scheduled frame, used to withdraw it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHandle(pub i32);

/// What the controller needs from the page
pub trait Host {
    /// Schedule the next frame. `None` if the host refused.
    fn request_frame(&mut self) -> Option<FrameHandle>;
    fn cancel_frame(&mut self, handle: FrameHandle);
    /// Remove every event subscription made for this surface
    fn detach_listeners(&mut self);
    /// Remove page elements created alongside the surface
    fn remove_overlay(&mut self) {}
}

/// Rolling frame rate over the last 60 frame timestamps
#[derive(Debug, Clone)]
pub struct FpsCounter {
    times: [f64; FPS_WINDOW],
    index: usize,
    fps: u32,
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self {
            times: [0.0; FPS_WINDOW],
            index: 0,
            fps: 0,
        }
    }
}

impl FpsCounter {
    /// Record a frame timestamp in milliseconds
    pub fn record(&mut self, time_ms: f64) {
        self.times[self.index] = time_ms;
        self.index = (self.index + 1) % FPS_WINDOW;

        // Slot after the newest is the oldest once the window is full
        let oldest = self.times[self.index];
        if oldest > 0.0 {
            let elapsed = time_ms - oldest;
            if elapsed > 0.0 {
                self.fps = ((FPS_WINDOW - 1) as f64 * 1000.0 / elapsed).round() as u32;
            }
        }
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }
}

/// Owns the scene for one surface and sequences its lifecycle
pub struct Controller<M: MaskSource> {
    phase: Phase,
    scene: Scene,
    source: M,
    pointer: PointerState,
    pending: Option<FrameHandle>,
    fps: FpsCounter,
    frames: u64,
    last_stats: StepStats,
}

impl<M: MaskSource> Controller<M> {
    pub fn new(scene: Scene, source: M, mode: InputMode) -> Self {
        Self {
            phase: Phase::Uninitialized,
            scene,
            source,
            pointer: PointerState::new(mode),
            pending: None,
            fps: FpsCounter::default(),
            frames: 0,
            last_stats: StepStats::default(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn pointer(&self) -> &PointerState {
        &self.pointer
    }

    pub fn fps(&self) -> u32 {
        self.fps.fps()
    }

    /// Frames stepped since mount
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn last_stats(&self) -> StepStats {
        self.last_stats
    }

    /// Build the mask, seed the pool and start the loop.
    ///
    /// Does nothing unless uninitialized. A surface without area leaves the
    /// controller uninitialized; the next resize retries.
    pub fn mount(&mut self, viewport: Viewport, host: &mut dyn Host) -> Phase {
        if self.phase != Phase::Uninitialized {
            return self.phase;
        }
        if !viewport.is_renderable() {
            log::warn!(
                "Deferring mount, surface is {}x{}",
                viewport.width,
                viewport.height
            );
            return self.phase;
        }

        match self.scene.rebuild(viewport, &mut self.source) {
            Rebuild::Skipped => return self.phase,
            Rebuild::Degraded => log::warn!("Mounted without a text mask"),
            Rebuild::Seeded { .. } => {}
        }
        self.phase = Phase::Ready;
        self.start(host);
        self.phase
    }

    /// Schedule the first frame. Returns true if the loop is now running.
    pub fn start(&mut self, host: &mut dyn Host) -> bool {
        if self.phase != Phase::Ready {
            return self.phase == Phase::Running;
        }
        match host.request_frame() {
            Some(handle) => {
                self.pending = Some(handle);
                self.phase = Phase::Running;
                log::info!("Particle field running");
                true
            }
            None => {
                log::warn!("Host refused to schedule a frame");
                false
            }
        }
    }

    pub fn handle_event(&mut self, event: InputEvent, host: &mut dyn Host) {
        if self.phase == Phase::TornDown {
            return;
        }
        match event {
            InputEvent::Resize(viewport) => self.resize(viewport, host),
            _ => {
                input::apply(&mut self.pointer, &event);
            }
        }
    }

    /// Rebuild for a new viewport.
    ///
    /// The pool is discarded and reseeded; a running loop is not interrupted
    /// and a stalled one is restarted.
    pub fn resize(&mut self, viewport: Viewport, host: &mut dyn Host) {
        match self.phase {
            Phase::TornDown => {}
            Phase::Uninitialized => {
                self.mount(viewport, host);
            }
            Phase::Ready | Phase::Running => {
                log::info!("Resize to {}x{}", viewport.width, viewport.height);
                self.scene.rebuild(viewport, &mut self.source);
                // A stalled loop gets another chance to schedule
                self.start(host);
            }
        }
    }

    /// Advance one frame and schedule the next.
    ///
    /// Returns the step stats, or `None` if the loop is not running (a frame
    /// that fires after teardown is ignored).
    pub fn on_frame(&mut self, time_ms: f64, host: &mut dyn Host) -> Option<StepStats> {
        if self.phase != Phase::Running {
            return None;
        }
        self.pending = None;

        let stats = self.scene.step(&self.pointer);
        self.last_stats = stats;
        self.frames += 1;
        self.fps.record(time_ms);
        log::trace!("Frame {}: {:?}", self.frames, stats);
        if self.frames % 600 == 0 {
            log::debug!(
                "{} fps, {} particles, {} displaced",
                self.fps.fps(),
                self.scene.pool().len(),
                stats.displaced
            );
        }

        self.pending = host.request_frame();
        if self.pending.is_none() {
            log::warn!("Frame loop stalled, host refused next frame");
            self.phase = Phase::Ready;
        }
        Some(stats)
    }

    /// Withdraw the pending frame and detach listeners.
    ///
    /// Idempotent; returns true only on the call that tore down.
    pub fn teardown(&mut self, host: &mut dyn Host) -> bool {
        if self.phase == Phase::TornDown {
            return false;
        }
        if let Some(handle) = self.pending.take() {
            host.cancel_frame(handle);
        }
        host.detach_listeners();
        host.remove_overlay();
        self.phase = Phase::TornDown;
        log::info!("Particle field torn down after {} frames", self.frames);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{EmbeddedFont, MaskError, SceneParams, TextLayout};
    use glam::Vec2;

    #[derive(Default)]
    struct FakeHost {
        next: i32,
        scheduled: Vec<FrameHandle>,
        cancelled: Vec<FrameHandle>,
        detached: u32,
        overlays_removed: u32,
        refuse: bool,
    }

    impl Host for FakeHost {
        fn request_frame(&mut self) -> Option<FrameHandle> {
            if self.refuse {
                return None;
            }
            self.next += 1;
            let handle = FrameHandle(self.next);
            self.scheduled.push(handle);
            Some(handle)
        }

        fn cancel_frame(&mut self, handle: FrameHandle) {
            self.cancelled.push(handle);
        }

        fn detach_listeners(&mut self) {
            self.detached += 1;
        }

        fn remove_overlay(&mut self) {
            self.overlays_removed += 1;
        }
    }

    struct Unreadable;

    impl MaskSource for Unreadable {
        fn rasterize(
            &mut self,
            _viewport: Viewport,
            _text: &str,
            _layout: &TextLayout,
        ) -> Result<Vec<u8>, MaskError> {
            Err(MaskError::ContextUnavailable)
        }
    }

    fn controller() -> Controller<EmbeddedFont> {
        let scene = Scene::new(7, "Glory", SceneParams::default());
        Controller::new(scene, EmbeddedFont::new(), InputMode::Pointer)
    }

    #[test]
    fn test_mount_starts_loop() {
        let mut host = FakeHost::default();
        let mut c = controller();
        assert_eq!(c.mount(Viewport::new(800, 600), &mut host), Phase::Running);
        assert_eq!(host.scheduled.len(), 1);
        assert!(!c.scene().pool().is_empty());

        // Second mount is ignored
        c.mount(Viewport::new(400, 300), &mut host);
        assert_eq!(c.scene().viewport(), Viewport::new(800, 600));
        assert_eq!(host.scheduled.len(), 1);
    }

    #[test]
    fn test_zero_size_defers_until_resize() {
        let mut host = FakeHost::default();
        let mut c = controller();
        assert_eq!(c.mount(Viewport::new(0, 600), &mut host), Phase::Uninitialized);
        assert!(host.scheduled.is_empty());
        assert_eq!(c.on_frame(16.0, &mut host), None);

        c.handle_event(InputEvent::Resize(Viewport::new(800, 600)), &mut host);
        assert_eq!(c.phase(), Phase::Running);
    }

    #[test]
    fn test_each_frame_schedules_next() {
        let mut host = FakeHost::default();
        let mut c = controller();
        c.mount(Viewport::new(800, 600), &mut host);
        for i in 0..5 {
            assert!(c.on_frame(16.0 * i as f64, &mut host).is_some());
        }
        assert_eq!(host.scheduled.len(), 6);
        assert_eq!(c.frames(), 5);
    }

    #[test]
    fn test_pointer_displaces_particles() {
        let mut host = FakeHost::default();
        let mut c = controller();
        c.mount(Viewport::new(800, 600), &mut host);
        c.handle_event(InputEvent::PointerMove(Vec2::new(400.0, 300.0)), &mut host);
        let stats = c.on_frame(0.0, &mut host).unwrap_or_default();
        assert!(stats.displaced > 0);

        c.handle_event(InputEvent::PointerLeave, &mut host);
        let stats = c.on_frame(16.0, &mut host).unwrap_or_default();
        assert_eq!(stats.displaced, 0);
    }

    #[test]
    fn test_resize_reseeds_without_restarting() {
        let mut host = FakeHost::default();
        let mut c = controller();
        c.mount(Viewport::new(800, 600), &mut host);
        c.on_frame(0.0, &mut host);

        c.handle_event(InputEvent::Resize(Viewport::new(375, 667)), &mut host);
        assert_eq!(c.phase(), Phase::Running);
        assert_eq!(c.scene().viewport(), Viewport::new(375, 667));
        assert_eq!(c.scene().target(), 3473);
        // No extra frame scheduled by the resize itself
        assert_eq!(host.scheduled.len(), 2);

        // Zero-area resize keeps the old field
        c.resize(Viewport::new(375, 0), &mut host);
        assert_eq!(c.scene().viewport(), Viewport::new(375, 667));
    }

    #[test]
    fn test_teardown_is_idempotent() {
        let mut host = FakeHost::default();
        let mut c = controller();
        c.mount(Viewport::new(800, 600), &mut host);
        c.on_frame(0.0, &mut host);

        assert!(c.teardown(&mut host));
        assert!(!c.teardown(&mut host));
        assert_eq!(host.cancelled, vec![FrameHandle(2)]);
        assert_eq!(host.detached, 1);
        assert_eq!(host.overlays_removed, 1);
        assert_eq!(c.phase(), Phase::TornDown);

        // A frame already in flight does nothing
        assert_eq!(c.on_frame(32.0, &mut host), None);
        assert_eq!(host.scheduled.len(), 2);

        // Neither do events or resizes
        c.handle_event(InputEvent::Resize(Viewport::new(100, 100)), &mut host);
        assert_eq!(c.scene().viewport(), Viewport::new(800, 600));
    }

    #[test]
    fn test_teardown_before_mount() {
        let mut host = FakeHost::default();
        let mut c = controller();
        assert!(c.teardown(&mut host));
        assert!(host.cancelled.is_empty());
        assert_eq!(c.mount(Viewport::new(800, 600), &mut host), Phase::TornDown);
    }

    #[test]
    fn test_unreadable_mask_still_runs() {
        let mut host = FakeHost::default();
        let scene = Scene::new(7, "Glory", SceneParams::default());
        let mut c = Controller::new(scene, Unreadable, InputMode::Pointer);
        assert_eq!(c.mount(Viewport::new(800, 600), &mut host), Phase::Running);
        assert!(c.scene().pool().is_empty());

        let stats = c.on_frame(0.0, &mut host).unwrap_or_default();
        assert_eq!(stats.spawned, 0);
        assert_eq!(c.phase(), Phase::Running);
    }

    #[test]
    fn test_refused_frame_stays_ready() {
        let mut host = FakeHost {
            refuse: true,
            ..Default::default()
        };
        let mut c = controller();
        assert_eq!(c.mount(Viewport::new(800, 600), &mut host), Phase::Ready);

        host.refuse = false;
        assert!(c.start(&mut host));
        assert_eq!(c.phase(), Phase::Running);
    }

    #[test]
    fn test_resize_restarts_stalled_loop() {
        let mut host = FakeHost::default();
        let mut c = controller();
        c.mount(Viewport::new(800, 600), &mut host);

        host.refuse = true;
        assert!(c.on_frame(0.0, &mut host).is_some());
        assert_eq!(c.phase(), Phase::Ready);
        assert_eq!(c.on_frame(16.0, &mut host), None);

        // Still refused: stays ready without panicking
        c.handle_event(InputEvent::Resize(Viewport::new(640, 480)), &mut host);
        assert_eq!(c.phase(), Phase::Ready);

        host.refuse = false;
        c.handle_event(InputEvent::Resize(Viewport::new(800, 600)), &mut host);
        assert_eq!(c.phase(), Phase::Running);
        assert!(c.on_frame(32.0, &mut host).is_some());

        // Teardown withdraws the frame scheduled by the restart
        let last = host.scheduled.last().copied();
        c.teardown(&mut host);
        assert_eq!(host.cancelled.last().copied(), last);
    }

    #[test]
    fn test_fps_counter() {
        let mut fps = FpsCounter::default();
        for i in 1..=120 {
            fps.record(i as f64 * 1000.0 / 60.0);
        }
        assert_eq!(fps.fps(), 60);
    }
}
