//! Shape generation for the particle field
//!
//! Everything is emitted as triangle lists in viewport pixels, top-left origin.

use glam::Vec2;

use super::vertex::{Vertex, colors};
use crate::consts::GLOW_SPREAD;
use crate::sim::{Motion, Particle, Scene, Viewport};

/// Vertices per quad (two triangles)
pub const QUAD_VERTICES: usize = 6;

/// Push an axis-aligned quad with per-corner colors (tl, tr, bl, br)
pub fn quad(out: &mut Vec<Vertex>, min: Vec2, max: Vec2, corners: [[f32; 4]; 4]) {
    let [tl, tr, bl, br] = corners;
    out.push(Vertex::new(min.x, min.y, tl));
    out.push(Vertex::new(max.x, min.y, tr));
    out.push(Vertex::new(min.x, max.y, bl));

    out.push(Vertex::new(min.x, max.y, bl));
    out.push(Vertex::new(max.x, min.y, tr));
    out.push(Vertex::new(max.x, max.y, br));
}

/// Position along the diagonal gradient from (0, 0) to (w, h).
///
/// Projection onto the diagonal, matching a canvas linear gradient; it is
/// linear in x and y so per-vertex interpolation reproduces it exactly.
pub fn gradient_t(p: Vec2, viewport: Viewport) -> f32 {
    let diagonal = Vec2::new(viewport.width as f32, viewport.height as f32);
    let len_sq = diagonal.length_squared();
    if len_sq <= 0.0 {
        return 0.0;
    }
    (p.dot(diagonal) / len_sq).clamp(0.0, 1.0)
}

/// Full-viewport background quad
pub fn background(out: &mut Vec<Vertex>, viewport: Viewport) {
    let max = Vec2::new(viewport.width as f32, viewport.height as f32);
    let color = |p: Vec2| {
        colors::mix(
            colors::BACKGROUND_START,
            colors::BACKGROUND_END,
            gradient_t(p, viewport),
        )
    };
    quad(
        out,
        Vec2::ZERO,
        max,
        [
            color(Vec2::ZERO),
            color(Vec2::new(max.x, 0.0)),
            color(Vec2::new(0.0, max.y)),
            color(max),
        ],
    );
}

/// One particle, with a glow halo underneath while displaced
pub fn particle(out: &mut Vec<Vertex>, particle: &Particle, motion: Motion, glow: bool) {
    let min = particle.position;
    let max = min + Vec2::splat(particle.size);

    let color = match motion {
        Motion::Displaced => {
            if glow {
                let spread = Vec2::splat(GLOW_SPREAD);
                quad(out, min - spread, max + spread, [colors::GLOW; 4]);
            }
            let mut c = colors::PARTICLE;
            c[3] *= colors::DISPLACED_ALPHA;
            c
        }
        Motion::Relaxing => colors::PARTICLE,
    };
    quad(out, min, max, [color; 4]);
}

/// Build the whole frame: background first, then particles in pool order
pub fn build_frame(out: &mut Vec<Vertex>, scene: &Scene, glow: bool) {
    out.clear();
    out.reserve((scene.pool().len() + 1) * QUAD_VERTICES);
    background(out, scene.viewport());
    for (p, motion) in scene.drawn() {
        particle(out, p, motion, glow);
    }
}
