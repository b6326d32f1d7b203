//! Glory Particles - interactive particle text field
//!
//! Core modules:
//! - `sim`: Deterministic particle simulation (mask sampling, pool, repulsion)
//! - `renderer`: WebGPU rendering pipeline
//! - `platform`: Input reduction, lifecycle controller, browser glue
//! - `nav`: Navigation targets shown under the field

pub mod nav;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use nav::Destination;
pub use settings::{QualityPreset, Settings};

use glam::Vec2;

/// Field configuration constants
pub mod consts {
    /// Text rendered into the mask
    pub const DISPLAY_TEXT: &str = "Glory's Project Combo";

    /// Viewports narrower than this use the small font tier
    pub const NARROW_BREAKPOINT: f32 = 768.0;
    /// Font size as a fraction of viewport width (narrow / normal)
    pub const NARROW_FONT_RATIO: f32 = 0.2;
    pub const NORMAL_FONT_RATIO: f32 = 0.25;
    /// Font size caps in logical pixels (narrow / normal)
    pub const NARROW_FONT_MAX: f32 = 40.0;
    pub const NORMAL_FONT_MAX: f32 = 140.0;
    /// Text is shrunk until it fits inside this fraction of the width
    pub const TEXT_MAX_WIDTH_RATIO: f32 = 0.9;

    /// Alpha above which a mask pixel counts as inside a glyph
    pub const ALPHA_THRESHOLD: u8 = 128;
    /// Random candidates tried per spawn before giving up
    pub const SPAWN_ATTEMPTS: u32 = 100;

    /// Particle count at the reference resolution
    pub const REFERENCE_PARTICLES: usize = 10_000;
    pub const REFERENCE_WIDTH: f32 = 1920.0;
    pub const REFERENCE_HEIGHT: f32 = 1080.0;

    /// Particle size range (edge length in pixels)
    pub const PARTICLE_SIZE_MIN: f32 = 0.5;
    pub const PARTICLE_SIZE_MAX: f32 = 2.5;
    /// Particle lifetime range (frames)
    pub const PARTICLE_LIFE_MIN: f32 = 50.0;
    pub const PARTICLE_LIFE_MAX: f32 = 150.0;

    /// Pointer influence cutoff (pixels)
    pub const INTERACTION_RADIUS: f32 = 240.0;
    /// Displacement at zero distance (pixels)
    pub const REPULSION_STRENGTH: f32 = 60.0;
    /// Fraction of the remaining distance closed per frame while relaxing
    pub const RELAX_FACTOR: f32 = 0.1;

    /// Glow halo spread around displaced particles (pixels)
    pub const GLOW_SPREAD: f32 = 5.0;
}

/// Euclidean distance between two points
#[inline]
pub fn distance(a: Vec2, b: Vec2) -> f32 {
    (b - a).length()
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}
