pub mod bitmap_font;

use cosmic_text::{
    fontdb, Attrs, Buffer, Color as CosmicColor, Family, FontSystem, Metrics as TextMetrics,
    Shaping, SwashCache, Wrap,
};
use image::{Rgb, RgbImage};
use parking_lot::Mutex;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::core::config::RenderingConfig;
use crate::core::errors::{RenderingError, RenderingResult};
use crate::core::types::BoundingBox;
use crate::utils::Metrics;

/// Translations are drawn in black
pub const TEXT_COLOR: Rgb<u8> = Rgb([0, 0, 0]);

/// Which font a region ended up drawn with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPath {
    Scalable,
    Bitmap,
    /// Nothing visible to draw
    Blank,
}

/// The provisioned font, loaded once into its own font system
struct ScalableFont {
    font_system: Mutex<FontSystem>,
    swash_cache: Mutex<SwashCache>,
    family: String,
}

impl ScalableFont {
    fn from_data(data: Vec<u8>, origin: &str) -> RenderingResult<Self> {
        // Empty database: only the provisioned font, no system scan
        let mut db = fontdb::Database::new();
        db.load_font_data(data);

        let family = db
            .faces()
            .find_map(|face| face.families.first().map(|(name, _)| name.clone()))
            .ok_or_else(|| RenderingError::FontLoadFailed {
                path: origin.to_string(),
                reason: "no usable font face".to_string(),
            })?;

        Ok(Self {
            font_system: Mutex::new(FontSystem::new_with_locale_and_db("en-US".to_string(), db)),
            swash_cache: Mutex::new(SwashCache::new()),
            family,
        })
    }

    /// Shapes and draws one line of text with its top-left at `(x, y)`
    fn draw(
        &self,
        canvas: &mut RgbImage,
        text: &str,
        font_size: f32,
        x: i32,
        y: i32,
        color: Rgb<u8>,
    ) -> RenderingResult<()> {
        let mut font_system = self.font_system.lock();

        let metrics = TextMetrics::new(font_size, (font_size * 1.2).ceil());
        let mut buffer = Buffer::new(&mut font_system, metrics);
        // No wrapping: the text runs past the box like a single label
        buffer.set_size(&mut font_system, None, None);
        buffer.set_wrap(&mut font_system, Wrap::None);

        let attrs = Attrs::new().family(Family::Name(&self.family));
        buffer.set_text(&mut font_system, text, &attrs, Shaping::Advanced);
        buffer.shape_until_scroll(&mut font_system, false);

        // Glyph 0 is .notdef: the font has no coverage for that character
        let drawable = buffer
            .layout_runs()
            .flat_map(|run| run.glyphs.iter())
            .filter(|glyph| glyph.glyph_id != 0)
            .count();
        if drawable == 0 {
            return Err(RenderingError::NoGlyphs { font_size });
        }

        let cosmic_color = CosmicColor::rgba(color[0], color[1], color[2], 255);
        let (width, height) = (canvas.width() as i32, canvas.height() as i32);
        let mut swash_cache = self.swash_cache.lock();

        buffer.draw(&mut font_system, &mut swash_cache, cosmic_color, |px_x, px_y, w, h, pixel_color| {
            let alpha = pixel_color.a() as f32 / 255.0;
            if alpha <= 0.0 {
                return;
            }
            let inv_alpha = 1.0 - alpha;

            for dy in 0..h as i32 {
                for dx in 0..w as i32 {
                    let img_x = x + px_x + dx;
                    let img_y = y + px_y + dy;
                    if img_x < 0 || img_y < 0 || img_x >= width || img_y >= height {
                        continue;
                    }

                    let existing = canvas.get_pixel(img_x as u32, img_y as u32);
                    let blended = Rgb([
                        ((pixel_color.r() as f32 * alpha) + (existing[0] as f32 * inv_alpha)) as u8,
                        ((pixel_color.g() as f32 * alpha) + (existing[1] as f32 * inv_alpha)) as u8,
                        ((pixel_color.b() as f32 * alpha) + (existing[2] as f32 * inv_alpha)) as u8,
                    ]);
                    canvas.put_pixel(img_x as u32, img_y as u32, blended);
                }
            }
        });

        Ok(())
    }
}

/// Draws translated text into erased regions.
///
/// The scalable font is optional: when it is missing or fails for a region,
/// that region is drawn with the built-in bitmap font at the same anchor.
pub struct OverlayRenderer {
    scalable: Option<ScalableFont>,
    min_font_size: f32,
    font_height_ratio: f32,
    metrics: Metrics,
}

impl OverlayRenderer {
    /// Loads the font at `config.font_path`; a missing or unreadable font
    /// leaves the renderer on the bitmap font.
    pub fn new(config: &RenderingConfig, metrics: Metrics) -> Self {
        let scalable = match Self::load_font(&config.font_path) {
            Ok(font) => {
                info!("Renderer using font '{}' from {}", font.family, config.font_path.display());
                Some(font)
            }
            Err(e) => {
                warn!("{}; rendering with the built-in bitmap font", e);
                None
            }
        };

        Self {
            scalable,
            min_font_size: config.min_font_size,
            font_height_ratio: config.font_height_ratio,
            metrics,
        }
    }

    /// Renderer over in-memory font data
    pub fn from_font_data(
        data: Vec<u8>,
        config: &RenderingConfig,
        metrics: Metrics,
    ) -> RenderingResult<Self> {
        Ok(Self {
            scalable: Some(ScalableFont::from_data(data, "<memory>")?),
            min_font_size: config.min_font_size,
            font_height_ratio: config.font_height_ratio,
            metrics,
        })
    }

    pub fn bitmap_only(config: &RenderingConfig, metrics: Metrics) -> Self {
        Self {
            scalable: None,
            min_font_size: config.min_font_size,
            font_height_ratio: config.font_height_ratio,
            metrics,
        }
    }

    fn load_font(path: &Path) -> RenderingResult<ScalableFont> {
        if !path.exists() {
            return Err(RenderingError::FontUnavailable(path.display().to_string()));
        }
        let data = std::fs::read(path).map_err(|e| RenderingError::FontLoadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        ScalableFont::from_data(data, &path.display().to_string())
    }

    pub fn has_scalable_font(&self) -> bool {
        self.scalable.is_some()
    }

    /// `max(min_font_size, round(ratio * box height))`
    pub fn font_size_for(&self, bbox: &BoundingBox) -> f32 {
        (self.font_height_ratio * bbox.height() as f32)
            .round()
            .max(self.min_font_size)
    }

    /// Draws `text` anchored at the top-left of `bbox`. Never fails: rendering
    /// problems fall back to the bitmap font.
    pub fn draw(&self, canvas: &mut RgbImage, bbox: &BoundingBox, text: &str) -> RenderPath {
        if text.trim().is_empty() {
            return RenderPath::Blank;
        }

        let (x, y) = (bbox.x_min as i32, bbox.y_min as i32);
        let font_size = self.font_size_for(bbox);

        if let Some(font) = &self.scalable {
            match font.draw(canvas, text, font_size, x, y, TEXT_COLOR) {
                Ok(()) => {
                    debug!("Drew {:?} at ({}, {}) size {}", text, x, y, font_size);
                    return RenderPath::Scalable;
                }
                Err(e) => warn!("Scalable font failed for {:?}: {}", text, e),
            }
        }

        self.metrics.record_font_fallback();
        bitmap_font::draw_text(canvas, text, x, y, TEXT_COLOR);
        debug!("Drew {:?} at ({}, {}) with bitmap font", text, x, y);
        RenderPath::Bitmap
    }
}
