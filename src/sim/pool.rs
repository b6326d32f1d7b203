//! Particle pool
//!
//! Dense particle storage. Expired particles are overwritten in place with a
//! freshly sampled particle, or swap-removed when the mask yields nothing.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::mask::{TextMask, Viewport};
use crate::consts::*;

/// A single text particle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    /// Current drawn location
    pub position: Vec2,
    /// Home location sampled from the mask, never reassigned
    pub anchor: Vec2,
    /// Square edge length in pixels
    pub size: f32,
    /// Frames remaining before the particle is replaced
    pub life: f32,
}

impl Particle {
    /// A particle resting on its anchor
    pub fn new(anchor: Vec2, size: f32, life: f32) -> Self {
        Self {
            position: anchor,
            anchor,
            size,
            life,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.life <= 0.0
    }
}

/// What happened to an expired particle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    /// Slot overwritten with a new particle
    Replaced,
    /// Slot removed; the last particle moved into it
    Removed,
}

/// Sample one particle from the mask interior.
///
/// Tries up to `SPAWN_ATTEMPTS` uniform pixel candidates and returns `None`
/// if none lands inside a glyph.
pub fn spawn_one<R: Rng + ?Sized>(mask: &TextMask, rng: &mut R) -> Option<Particle> {
    if mask.is_empty() {
        return None;
    }
    let Viewport { width, height } = mask.viewport();

    for _ in 0..SPAWN_ATTEMPTS {
        let x = rng.random_range(0..width);
        let y = rng.random_range(0..height);
        if mask.contains(x, y) {
            let size = rng.random_range(PARTICLE_SIZE_MIN..PARTICLE_SIZE_MAX);
            let life = rng.random_range(PARTICLE_LIFE_MIN..PARTICLE_LIFE_MAX);
            return Some(Particle::new(Vec2::new(x as f32, y as f32), size, life));
        }
    }

    None
}

/// Probability that `spawn_one` finds an interior pixel.
///
/// Seeding `target` particles yields `target` times this on average.
pub fn spawn_success_rate(mask: &TextMask) -> f64 {
    let area = mask.viewport().area() as f64;
    if mask.is_empty() || area <= 0.0 {
        return 0.0;
    }
    let miss = 1.0 - mask.interior_count() as f64 / area;
    1.0 - miss.powi(SPAWN_ATTEMPTS as i32)
}

/// Particle count that keeps density roughly constant across screen sizes
pub fn target_count(viewport: Viewport, reference: usize) -> usize {
    if !viewport.is_renderable() {
        return 0;
    }
    let ratio = viewport.area() / (REFERENCE_WIDTH * REFERENCE_HEIGHT);
    (reference as f64 * (ratio as f64).sqrt()).floor() as usize
}

/// The set of live particles
#[derive(Debug, Clone, Default)]
pub struct ParticlePool {
    particles: Vec<Particle>,
}

impl ParticlePool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            particles: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Particle> {
        self.particles.iter()
    }

    pub fn as_slice(&self) -> &[Particle] {
        &self.particles
    }

    pub fn get(&self, index: usize) -> Option<&Particle> {
        self.particles.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Particle> {
        self.particles.get_mut(index)
    }

    pub fn push(&mut self, particle: Particle) {
        self.particles.push(particle);
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }

    /// Fill an empty pool with up to `target` particles.
    ///
    /// Makes `target` spawn attempts and keeps every success, so the pool
    /// ends at `min(target, what the mask density allows)`. Returns the
    /// number of particles added.
    pub fn seed<R: Rng + ?Sized>(&mut self, mask: &TextMask, target: usize, rng: &mut R) -> usize {
        if mask.is_empty() {
            return 0;
        }
        let before = self.particles.len();
        self.particles.reserve(target.saturating_sub(before));
        for _ in before..target {
            if let Some(particle) = spawn_one(mask, rng) {
                self.particles.push(particle);
            }
        }
        self.particles.len() - before
    }

    /// Top the pool back up toward `target`.
    ///
    /// Stops at the first failed spawn; the shortfall is retried next frame.
    /// Does nothing once the pool is at or above target.
    pub fn maintain<R: Rng + ?Sized>(
        &mut self,
        mask: &TextMask,
        target: usize,
        rng: &mut R,
    ) -> usize {
        let mut spawned = 0;
        while self.particles.len() < target {
            match spawn_one(mask, rng) {
                Some(particle) => {
                    self.particles.push(particle);
                    spawned += 1;
                }
                None => break,
            }
        }
        spawned
    }

    /// Replace the particle at `index` with a fresh sample, or swap-remove it.
    ///
    /// After `Removed`, `index` holds what was the last particle (or is past
    /// the end), so callers iterating by index must revisit it.
    pub fn expire_at<R: Rng + ?Sized>(
        &mut self,
        index: usize,
        mask: &TextMask,
        rng: &mut R,
    ) -> Expiry {
        match spawn_one(mask, rng) {
            Some(particle) => {
                self.particles[index] = particle;
                Expiry::Replaced
            }
            None => {
                self.particles.swap_remove(index);
                Expiry::Removed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn full_mask(width: u32, height: u32) -> TextMask {
        let viewport = Viewport::new(width, height);
        TextMask::from_alpha(viewport, vec![255; (width * height) as usize], 1.0).unwrap()
    }

    /// Horizontal band of interior pixels spanning the full width
    fn band_mask(width: u32, height: u32, band: std::ops::Range<u32>) -> TextMask {
        let viewport = Viewport::new(width, height);
        let mut alpha = vec![0u8; (width * height) as usize];
        for y in band {
            for x in 0..width {
                alpha[(y * width + x) as usize] = 255;
            }
        }
        TextMask::from_alpha(viewport, alpha, 1.0).unwrap()
    }

    #[test]
    fn test_target_count_scaling() {
        assert_eq!(target_count(Viewport::new(1920, 1080), 10_000), 10_000);
        // sqrt(375*667 / (1920*1080)) ~= 0.3473
        assert_eq!(target_count(Viewport::new(375, 667), 10_000), 3473);
        assert_eq!(target_count(Viewport::new(0, 1080), 10_000), 0);
    }

    #[test]
    fn test_spawn_lands_inside() {
        let mask = band_mask(200, 100, 40..45);
        let mut rng = Pcg32::seed_from_u64(7);
        for _ in 0..200 {
            if let Some(p) = spawn_one(&mask, &mut rng) {
                assert!(mask.contains_point(p.anchor));
                assert_eq!(p.position, p.anchor);
                assert!(p.size >= PARTICLE_SIZE_MIN && p.size < PARTICLE_SIZE_MAX);
                assert!(p.life >= PARTICLE_LIFE_MIN && p.life < PARTICLE_LIFE_MAX);
            }
        }
    }

    #[test]
    fn test_spawn_on_empty_mask() {
        let mut rng = Pcg32::seed_from_u64(7);
        assert!(spawn_one(&TextMask::empty(Viewport::new(100, 100)), &mut rng).is_none());
        let blank = TextMask::from_alpha(Viewport::new(10, 10), vec![0; 100], 1.0).unwrap();
        assert!(spawn_one(&blank, &mut rng).is_none());
    }

    #[test]
    fn test_seed_full_mask_reaches_target() {
        let mask = full_mask(320, 240);
        let mut rng = Pcg32::seed_from_u64(1);
        let mut pool = ParticlePool::new();
        assert_eq!(pool.seed(&mask, 500, &mut rng), 500);
        assert_eq!(pool.len(), 500);
    }

    #[test]
    fn test_seed_reference_resolution() {
        // Band covers ~14.8% of the screen, so 100 attempts essentially never miss
        let mask = band_mask(1920, 1080, 460..620);
        let mut rng = Pcg32::seed_from_u64(42);
        let target = target_count(mask.viewport(), REFERENCE_PARTICLES);
        assert_eq!(target, 10_000);

        let mut pool = ParticlePool::with_capacity(target);
        pool.seed(&mask, target, &mut rng);
        assert!((9_900..=10_000).contains(&pool.len()));
        assert!(pool.iter().all(|p| mask.contains_point(p.anchor)));
    }

    #[test]
    fn test_spawn_success_rate() {
        assert_eq!(spawn_success_rate(&full_mask(10, 10)), 1.0);
        assert_eq!(spawn_success_rate(&TextMask::empty(Viewport::new(10, 10))), 0.0);

        // 1% coverage: 1 - 0.99^100
        let mask = band_mask(100, 100, 0..1);
        assert!((spawn_success_rate(&mask) - 0.633_968).abs() < 1e-5);
    }

    #[test]
    fn test_maintain_is_idempotent_at_target() {
        let mask = full_mask(100, 100);
        let mut rng = Pcg32::seed_from_u64(3);
        let mut pool = ParticlePool::new();
        pool.seed(&mask, 50, &mut rng);
        let snapshot = pool.as_slice().to_vec();

        for _ in 0..5 {
            assert_eq!(pool.maintain(&mask, 50, &mut rng), 0);
        }
        assert_eq!(pool.as_slice(), snapshot.as_slice());
    }

    #[test]
    fn test_maintain_tops_up() {
        let mask = full_mask(100, 100);
        let mut rng = Pcg32::seed_from_u64(3);
        let mut pool = ParticlePool::new();
        pool.seed(&mask, 10, &mut rng);
        assert_eq!(pool.maintain(&mask, 25, &mut rng), 15);
        assert_eq!(pool.len(), 25);
    }

    #[test]
    fn test_maintain_gives_up_on_empty_mask() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut pool = ParticlePool::new();
        let empty = TextMask::empty(Viewport::new(100, 100));
        assert_eq!(pool.maintain(&empty, 1_000, &mut rng), 0);
        assert!(pool.is_empty());
    }

    #[test]
    fn test_expire_replaces_in_place() {
        let mask = full_mask(64, 64);
        let mut rng = Pcg32::seed_from_u64(9);
        let mut pool = ParticlePool::new();
        pool.seed(&mask, 3, &mut rng);
        let old = pool.as_slice().to_vec();

        assert_eq!(pool.expire_at(1, &mask, &mut rng), Expiry::Replaced);
        assert_eq!(pool.len(), 3);
        assert_eq!(pool.get(0), Some(&old[0]));
        assert_eq!(pool.get(2), Some(&old[2]));
    }

    #[test]
    fn test_expire_swap_removes_without_mask() {
        let mask = full_mask(64, 64);
        let mut rng = Pcg32::seed_from_u64(9);
        let mut pool = ParticlePool::new();
        pool.seed(&mask, 3, &mut rng);
        let old = pool.as_slice().to_vec();

        let empty = TextMask::empty(mask.viewport());
        assert_eq!(pool.expire_at(0, &empty, &mut rng), Expiry::Removed);
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.get(0), Some(&old[2]));
        assert_eq!(pool.get(1), Some(&old[1]));
    }
}
