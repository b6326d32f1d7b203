//! Scene state
//!
//! Owns the active mask, the particle pool and the per-frame motion buffer.
//! Everything mutable about the field lives here and is only touched from
//! the frame callback or a resize.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::field::{FieldParams, PointerState};
use super::mask::{MaskError, MaskSource, TextMask, Viewport};
use super::pool::{Particle, ParticlePool, target_count};
use super::step::{Motion, StepContext, StepStats, step};
use crate::consts::RELAX_FACTOR;
use crate::settings::Settings;

/// Result of rebuilding the scene for a viewport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rebuild {
    /// Mask built and pool reseeded
    Seeded { particles: usize, target: usize },
    /// Mask could not be read; field continues with no particles
    Degraded,
    /// Surface had no area; previous mask and pool kept
    Skipped,
}

/// Simulation tunables derived from settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SceneParams {
    pub field: FieldParams,
    pub relax: f32,
    /// Particle count at the reference resolution
    pub reference: usize,
}

impl SceneParams {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            field: FieldParams::default(),
            relax: RELAX_FACTOR,
            reference: settings.reference_particles(),
        }
    }
}

impl Default for SceneParams {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

/// The particle field for one mounted surface
#[derive(Debug, Clone)]
pub struct Scene {
    text: String,
    params: SceneParams,
    mask: TextMask,
    pool: ParticlePool,
    motion: Vec<Motion>,
    target: usize,
    rng: Pcg32,
}

impl Scene {
    /// Create an empty scene; nothing is sampled until `rebuild`
    pub fn new(seed: u64, text: impl Into<String>, params: SceneParams) -> Self {
        Self {
            text: text.into(),
            params,
            mask: TextMask::default(),
            pool: ParticlePool::new(),
            motion: Vec::new(),
            target: 0,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn from_settings(seed: u64, settings: &Settings) -> Self {
        Self::new(seed, settings.text.clone(), SceneParams::from_settings(settings))
    }

    pub fn viewport(&self) -> Viewport {
        self.mask.viewport()
    }

    pub fn mask(&self) -> &TextMask {
        &self.mask
    }

    pub fn pool(&self) -> &ParticlePool {
        &self.pool
    }

    pub fn target(&self) -> usize {
        self.target
    }

    pub fn params(&self) -> &SceneParams {
        &self.params
    }

    /// Particles paired with how they moved in the last step, in draw order
    pub fn drawn(&self) -> impl Iterator<Item = (&Particle, Motion)> + '_ {
        self.pool
            .iter()
            .enumerate()
            .map(|(i, p)| (p, self.motion.get(i).copied().unwrap_or_default()))
    }

    /// Rebuild the mask for `viewport` and reseed the whole pool.
    ///
    /// A surface without area is skipped and the previous state kept. A mask
    /// read failure degrades to an empty mask, which drops every particle.
    pub fn rebuild(&mut self, viewport: Viewport, source: &mut dyn MaskSource) -> Rebuild {
        let mask = match TextMask::build(source, viewport, &self.text) {
            Ok(mask) => mask,
            Err(MaskError::EmptySurface { width, height }) => {
                log::warn!("Skipping rebuild for empty surface {}x{}", width, height);
                return Rebuild::Skipped;
            }
            Err(e) => {
                log::warn!("Text mask unavailable, continuing without particles: {}", e);
                self.mask = TextMask::empty(viewport);
                self.pool.clear();
                self.motion.clear();
                self.target = 0;
                return Rebuild::Degraded;
            }
        };

        self.mask = mask;
        self.target = target_count(viewport, self.params.reference);
        self.pool = ParticlePool::with_capacity(self.target);
        self.motion.clear();
        let particles = self.pool.seed(&self.mask, self.target, &mut self.rng);

        log::info!(
            "Seeded {}/{} particles for {}x{}",
            particles,
            self.target,
            viewport.width,
            viewport.height
        );
        Rebuild::Seeded {
            particles,
            target: self.target,
        }
    }

    /// Advance one frame
    pub fn step(&mut self, pointer: &PointerState) -> StepStats {
        let ctx = StepContext {
            mask: &self.mask,
            pointer,
            field: &self.params.field,
            relax: self.params.relax,
            target: self.target,
        };
        step(&mut self.pool, &mut self.motion, &ctx, &mut self.rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::DISPLAY_TEXT;
    use crate::sim::font::EmbeddedFont;
    use crate::sim::mask::TextLayout;
    use crate::sim::pool::spawn_success_rate;
    use glam::Vec2;

    /// Fills a centered band covering a third of the height
    struct Band;

    impl MaskSource for Band {
        fn rasterize(
            &mut self,
            viewport: Viewport,
            _text: &str,
            _layout: &TextLayout,
        ) -> Result<Vec<u8>, MaskError> {
            let (w, h) = (viewport.width as usize, viewport.height as usize);
            let mut alpha = vec![0u8; w * h];
            for y in h / 3..2 * h / 3 {
                alpha[y * w..(y + 1) * w].fill(255);
            }
            Ok(alpha)
        }
    }

    struct Tainted;

    impl MaskSource for Tainted {
        fn rasterize(
            &mut self,
            _viewport: Viewport,
            _text: &str,
            _layout: &TextLayout,
        ) -> Result<Vec<u8>, MaskError> {
            Err(MaskError::ReadRejected("SecurityError".into()))
        }
    }

    #[test]
    fn test_seed_at_reference_resolution() {
        // Text covering ~15% of the screen: 100 attempts practically never miss
        let mut scene = Scene::new(7, DISPLAY_TEXT, SceneParams::default());
        let outcome = scene.rebuild(Viewport::new(1920, 1080), &mut Band);
        let Rebuild::Seeded { particles, target } = outcome else {
            panic!("expected seeded, got {:?}", outcome);
        };
        assert_eq!(target, 10_000);
        assert!((9_900..=10_000).contains(&particles));
    }

    #[test]
    fn test_embedded_font_seeds_at_mask_density() {
        for seed in [1, 7, 42] {
            let mut scene = Scene::new(seed, DISPLAY_TEXT, SceneParams::default());
            let outcome = scene.rebuild(Viewport::new(1920, 1080), &mut EmbeddedFont::new());
            let Rebuild::Seeded { particles, target } = outcome else {
                panic!("expected seeded, got {:?}", outcome);
            };
            assert_eq!(target, 10_000);

            // Binomial spread is ~20 particles at these rates
            let expected = target as f64 * spawn_success_rate(scene.mask());
            assert!(
                (particles as f64 - expected).abs() < 150.0,
                "seed {}: {} particles, expected ~{:.0}",
                seed,
                particles,
                expected
            );
            assert!(particles > 9_000);
            assert!(scene.pool().iter().all(|p| scene.mask().contains_point(p.anchor)));
        }
    }

    #[test]
    fn test_embedded_font_pool_recovers_toward_target() {
        let mut scene = Scene::new(5, DISPLAY_TEXT, SceneParams::default());
        scene.rebuild(Viewport::new(1920, 1080), &mut EmbeddedFont::new());
        let seeded = scene.pool().len();
        for _ in 0..20 {
            scene.step(&PointerState::default());
        }
        assert!(scene.pool().len() >= seeded);
        assert!(scene.pool().len() <= scene.target());
    }

    #[test]
    fn test_resize_discards_old_pool() {
        let mut scene = Scene::new(11, "Glory's Project Combo", SceneParams::default());
        scene.rebuild(Viewport::new(1920, 1080), &mut Band);
        let pointer = PointerState {
            position: Some(Vec2::new(960.0, 540.0)),
            ..Default::default()
        };
        for _ in 0..5 {
            scene.step(&pointer);
        }

        let small = Viewport::new(375, 667);
        let outcome = scene.rebuild(small, &mut Band);
        assert!(matches!(outcome, Rebuild::Seeded { target: 3473, .. }));
        assert!(scene.pool().len() <= 3473);
        assert!(scene.pool().iter().all(|p| small.contains(p.anchor)));
        assert!(scene.pool().iter().all(|p| scene.mask().contains_point(p.anchor)));
    }

    #[test]
    fn test_empty_surface_keeps_last_pool() {
        let mut scene = Scene::new(3, "Glory", SceneParams::default());
        scene.rebuild(Viewport::new(800, 600), &mut Band);
        let before = scene.pool().len();
        assert!(before > 0);

        assert_eq!(scene.rebuild(Viewport::new(0, 600), &mut Band), Rebuild::Skipped);
        assert_eq!(scene.pool().len(), before);
        assert_eq!(scene.viewport(), Viewport::new(800, 600));
    }

    #[test]
    fn test_read_failure_degrades_to_empty() {
        let mut scene = Scene::new(3, "Glory", SceneParams::default());
        scene.rebuild(Viewport::new(800, 600), &mut Band);
        assert_eq!(scene.rebuild(Viewport::new(800, 600), &mut Tainted), Rebuild::Degraded);
        assert!(scene.pool().is_empty());

        // Frames keep running with nothing to draw
        let stats = scene.step(&PointerState::default());
        assert_eq!(stats, StepStats::default());
        assert_eq!(scene.drawn().count(), 0);
    }

    #[test]
    fn test_same_seed_same_field() {
        let mut a = Scene::new(99, "Glory", SceneParams::default());
        let mut b = Scene::new(99, "Glory", SceneParams::default());
        a.rebuild(Viewport::new(640, 480), &mut Band);
        b.rebuild(Viewport::new(640, 480), &mut Band);
        let pointer = PointerState {
            position: Some(Vec2::new(320.0, 240.0)),
            ..Default::default()
        };
        for _ in 0..60 {
            assert_eq!(a.step(&pointer), b.step(&pointer));
        }
        assert_eq!(a.pool().as_slice(), b.pool().as_slice());
    }
}
