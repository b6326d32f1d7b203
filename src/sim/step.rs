//! Per-frame simulation step
//!
//! Each particle is either displaced by the pointer or relaxing toward its
//! anchor. Which one is recomputed every frame from the field; nothing about
//! the previous frame's choice is remembered.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::field::{FieldParams, PointerState, force_at};
use super::mask::TextMask;
use super::pool::{Expiry, Particle, ParticlePool};

/// How a particle moved this frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Motion {
    /// Pushed off its anchor by the pointer
    Displaced,
    /// Easing back toward its anchor
    #[default]
    Relaxing,
}

/// Counters for one step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StepStats {
    pub displaced: usize,
    pub expired: usize,
    pub replaced: usize,
    pub removed: usize,
    pub spawned: usize,
}

/// Inputs shared by every particle in a step
#[derive(Debug, Clone, Copy)]
pub struct StepContext<'a> {
    pub mask: &'a TextMask,
    pub pointer: &'a PointerState,
    pub field: &'a FieldParams,
    /// Fraction of the remaining distance closed per relaxing frame
    pub relax: f32,
    pub target: usize,
}

/// Move `position` toward `anchor` by `factor` of the remaining distance
#[inline]
pub fn relax(position: Vec2, anchor: Vec2, factor: f32) -> Vec2 {
    position + (anchor - position) * factor
}

/// Apply the field to one particle and report which state it is in
pub fn apply_field(particle: &mut Particle, ctx: &StepContext<'_>) -> Motion {
    match force_at(particle.anchor, ctx.pointer, ctx.field) {
        Some(displacement) => {
            particle.position = particle.anchor - displacement;
            Motion::Displaced
        }
        None => {
            particle.position = relax(particle.position, particle.anchor, ctx.relax);
            Motion::Relaxing
        }
    }
}

/// Advance the pool one frame.
///
/// `motion` is rebuilt to run parallel to the pool. Expired particles are
/// replaced or removed before they are drawn, and the pool is topped back up
/// toward `ctx.target` afterward.
pub fn step<R: Rng + ?Sized>(
    pool: &mut ParticlePool,
    motion: &mut Vec<Motion>,
    ctx: &StepContext<'_>,
    rng: &mut R,
) -> StepStats {
    let mut stats = StepStats::default();
    motion.clear();
    motion.reserve(pool.len());

    let mut i = 0;
    while i < pool.len() {
        let Some(particle) = pool.get_mut(i) else {
            break;
        };
        let mut state = apply_field(particle, ctx);
        particle.life -= 1.0;

        if particle.is_expired() {
            stats.expired += 1;
            match pool.expire_at(i, ctx.mask, rng) {
                Expiry::Replaced => {
                    stats.replaced += 1;
                    if let Some(fresh) = pool.get_mut(i) {
                        state = apply_field(fresh, ctx);
                    }
                }
                Expiry::Removed => {
                    // Slot now holds the unprocessed tail particle
                    stats.removed += 1;
                    continue;
                }
            }
        }

        motion.push(state);
        i += 1;
    }

    let settled = pool.len();
    stats.spawned = pool.maintain(ctx.mask, ctx.target, rng);
    for index in settled..pool.len() {
        if let Some(fresh) = pool.get_mut(index) {
            motion.push(apply_field(fresh, ctx));
        }
    }

    stats.displaced = motion.iter().filter(|&&m| m == Motion::Displaced).count();
    log::trace!("step: {:?}", stats);
    stats
}
