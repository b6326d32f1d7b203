//! Text mask rasterization
//!
//! The display text is drawn into an invisible alpha buffer the size of the
//! viewport. Particles may only anchor on pixels whose alpha clears
//! `ALPHA_THRESHOLD`.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

/// Drawing surface size in logical pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Build from signed client dimensions (negative collapses to zero)
    pub fn from_client(width: i32, height: i32) -> Self {
        Self::new(width.max(0) as u32, height.max(0) as u32)
    }

    /// True if the surface has positive area
    pub fn is_renderable(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    pub fn area(&self) -> f32 {
        self.width as f32 * self.height as f32
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width as f32 / 2.0, self.height as f32 / 2.0)
    }

    /// True if the point lies inside [0, width) x [0, height)
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= 0.0 && p.y >= 0.0 && p.x < self.width as f32 && p.y < self.height as f32
    }
}

/// Errors raised while building a mask
#[derive(Debug, Error)]
pub enum MaskError {
    #[error("surface has no area ({width}x{height})")]
    EmptySurface { width: u32, height: u32 },
    #[error("no 2d drawing context available")]
    ContextUnavailable,
    #[error("embedded font could not be parsed")]
    FontUnavailable,
    #[error("pixel read rejected: {0}")]
    ReadRejected(String),
    #[error("alpha buffer holds {actual} pixels, expected {expected}")]
    BufferSize { expected: usize, actual: usize },
}

/// Font size and placement for the display text
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextLayout {
    /// Font size in pixels
    pub font_size: f32,
    /// Center of the text block
    pub center: Vec2,
    /// Widest the text may be drawn
    pub max_width: f32,
}

impl TextLayout {
    /// Pick the font tier for a viewport: small on narrow screens, large otherwise
    pub fn for_viewport(viewport: Viewport) -> Self {
        let width = viewport.width as f32;
        let font_size = if width < NARROW_BREAKPOINT {
            (width * NARROW_FONT_RATIO).min(NARROW_FONT_MAX)
        } else {
            (width * NORMAL_FONT_RATIO).min(NORMAL_FONT_MAX)
        };
        Self {
            font_size,
            center: viewport.center(),
            max_width: width * TEXT_MAX_WIDTH_RATIO,
        }
    }

    /// Scale factor relative to a 100px font
    pub fn scale(&self) -> f32 {
        self.font_size / 100.0
    }
}

/// Anything that can draw text into an alpha buffer
pub trait MaskSource {
    /// Rasterize `text` and return one alpha byte per pixel, row-major,
    /// `viewport.width * viewport.height` long.
    fn rasterize(
        &mut self,
        viewport: Viewport,
        text: &str,
        layout: &TextLayout,
    ) -> Result<Vec<u8>, MaskError>;
}

/// Immutable inside/outside classification for one viewport
#[derive(Debug, Clone, Default)]
pub struct TextMask {
    viewport: Viewport,
    alpha: Vec<u8>,
    interior: usize,
    scale: f32,
}

impl TextMask {
    /// Mask with no interior pixels
    pub fn empty(viewport: Viewport) -> Self {
        Self {
            viewport,
            alpha: Vec::new(),
            interior: 0,
            scale: 0.0,
        }
    }

    /// Wrap a raw alpha buffer
    pub fn from_alpha(viewport: Viewport, alpha: Vec<u8>, scale: f32) -> Result<Self, MaskError> {
        let expected = viewport.width as usize * viewport.height as usize;
        if alpha.len() != expected {
            return Err(MaskError::BufferSize {
                expected,
                actual: alpha.len(),
            });
        }
        let interior = alpha.iter().filter(|&&a| a > ALPHA_THRESHOLD).count();
        Ok(Self {
            viewport,
            alpha,
            interior,
            scale,
        })
    }

    /// Rasterize `text` for `viewport` through `source`
    pub fn build(
        source: &mut dyn MaskSource,
        viewport: Viewport,
        text: &str,
    ) -> Result<Self, MaskError> {
        if !viewport.is_renderable() {
            return Err(MaskError::EmptySurface {
                width: viewport.width,
                height: viewport.height,
            });
        }
        let layout = TextLayout::for_viewport(viewport);
        let alpha = source.rasterize(viewport, text, &layout)?;
        let mask = Self::from_alpha(viewport, alpha, layout.scale())?;
        log::debug!(
            "Mask {}x{} font {:.1}px, {} interior pixels",
            viewport.width,
            viewport.height,
            layout.font_size,
            mask.interior
        );
        Ok(mask)
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Scale factor of the font the mask was drawn with
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Number of pixels classified inside
    pub fn interior_count(&self) -> usize {
        self.interior
    }

    pub fn is_empty(&self) -> bool {
        self.interior == 0
    }

    /// Is pixel (x, y) inside a glyph? Out of bounds is outside.
    #[inline]
    pub fn contains(&self, x: u32, y: u32) -> bool {
        if x >= self.viewport.width || y >= self.viewport.height {
            return false;
        }
        let index = y as usize * self.viewport.width as usize + x as usize;
        self.alpha
            .get(index)
            .is_some_and(|&a| a > ALPHA_THRESHOLD)
    }

    /// Membership of the pixel containing `p`
    pub fn contains_point(&self, p: Vec2) -> bool {
        if p.x < 0.0 || p.y < 0.0 {
            return false;
        }
        self.contains(p.x as u32, p.y as u32)
    }
}
