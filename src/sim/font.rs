//! Embedded TrueType mask source
//!
//! Native builds and tests have no browser canvas, so the display text is
//! rasterized from an embedded bold serif face. Layout follows the canvas
//! path: one em is `font_size` pixels, the ascent/descent band is centered
//! on the layout center, and over-wide text is squeezed horizontally.

use std::sync::OnceLock;

use rusttype::{Font, Scale, point};

use super::mask::{MaskError, MaskSource, TextLayout, Viewport};

/// DejaVu Serif Bold (see assets/fonts/LICENSE-DejaVu.txt)
const FONT_DATA: &[u8] = include_bytes!("../../assets/fonts/DejaVuSerif-Bold.ttf");

/// Parsed once, shared by every rasterization
fn embedded_font() -> Option<&'static Font<'static>> {
    static FONT: OnceLock<Option<Font<'static>>> = OnceLock::new();
    FONT.get_or_init(|| Font::try_from_bytes(FONT_DATA)).as_ref()
}

/// Rasterizes text with the embedded font, coverage written as alpha
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedFont;

impl EmbeddedFont {
    pub fn new() -> Self {
        Self
    }
}

/// Scale at which one em spans `font_size` pixels, like a CSS font size.
///
/// rusttype scales by the ascent-to-descent height, not the em.
fn em_scale(font: &Font<'_>, font_size: f32) -> Scale {
    let units = f32::from(font.units_per_em().max(1));
    let v = font.v_metrics_unscaled();
    Scale::uniform(font_size * (v.ascent - v.descent) / units)
}

/// Pen advance of the laid out text
fn text_width(font: &Font<'_>, text: &str, scale: Scale) -> f32 {
    font.layout(text, scale, point(0.0, 0.0))
        .last()
        .map_or(0.0, |g| g.position().x + g.unpositioned().h_metrics().advance_width)
}

impl MaskSource for EmbeddedFont {
    fn rasterize(
        &mut self,
        viewport: Viewport,
        text: &str,
        layout: &TextLayout,
    ) -> Result<Vec<u8>, MaskError> {
        let font = embedded_font().ok_or(MaskError::FontUnavailable)?;
        let width = viewport.width as usize;
        let height = viewport.height as usize;
        let mut alpha = vec![0u8; width * height];
        if layout.font_size <= 0.0 {
            return Ok(alpha);
        }

        let mut scale = em_scale(font, layout.font_size);
        let mut drawn_width = text_width(font, text, scale);
        if drawn_width > layout.max_width && drawn_width > 0.0 {
            scale.x *= layout.max_width / drawn_width;
            drawn_width = layout.max_width;
        }

        // Middle baseline: ascent and descent sit equally above and below center
        let v = font.v_metrics(scale);
        let origin = point(
            layout.center.x - drawn_width / 2.0,
            layout.center.y + (v.ascent + v.descent) / 2.0,
        );

        for glyph in font.layout(text, scale, origin) {
            let Some(bb) = glyph.pixel_bounding_box() else {
                continue;
            };
            glyph.draw(|gx, gy, coverage| {
                let x = bb.min.x + gx as i32;
                let y = bb.min.y + gy as i32;
                if x < 0 || y < 0 || x as usize >= width || y as usize >= height {
                    return;
                }
                let idx = y as usize * width + x as usize;
                let value = (coverage.clamp(0.0, 1.0) * 255.0).round() as u8;
                alpha[idx] = alpha[idx].max(value);
            });
        }

        Ok(alpha)
    }
}
