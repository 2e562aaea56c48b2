use std::path::Path;

use ab_glyph::{FontArc, PxScale};
use image::{GrayImage, Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use tracing::{debug, instrument};

use crate::plate_pipeline::common::error::{AnalysisError, Result};
use crate::plate_pipeline::common::{BoundingBox, PixelPos};

pub const ANNOTATED_FILE_NAME: &str = "assembled_colors.jpeg";

/// One box (and optionally outline and caption) to draw on the plate.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub bbox: BoundingBox,
    pub color: Rgb<u8>,
    pub outline: Vec<PixelPos>,
    pub caption: Option<String>,
}

impl Annotation {
    pub fn boxed(bbox: BoundingBox, color: Rgb<u8>) -> Self {
        Self {
            bbox,
            color,
            outline: Vec::new(),
            caption: None,
        }
    }
}

/// Draws annotations over a gray plate. Captions need a font; without one
/// only boxes and outlines are drawn.
#[derive(Clone)]
pub struct Annotator {
    font: Option<FontArc>,
    scale: f32,
}

impl Default for Annotator {
    fn default() -> Self {
        Self::new()
    }
}

impl Annotator {
    pub fn new() -> Self {
        Self {
            font: None,
            scale: 18.0,
        }
    }

    /// Loads a TrueType/OpenType font for captions.
    pub fn with_font_file(mut self, path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let font = FontArc::try_from_vec(bytes).map_err(|e| {
            AnalysisError::DecodeError(format!("font {}: {e}", path.display()))
        })?;
        self.font = Some(font);
        Ok(self)
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    #[instrument(skip_all, fields(annotations = annotations.len()))]
    pub fn render(&self, plate: &GrayImage, annotations: &[Annotation]) -> RgbImage {
        let mut canvas = RgbImage::from_fn(plate.width(), plate.height(), |x, y| {
            let v = plate.get_pixel(x, y)[0];
            Rgb([v, v, v])
        });
        for a in annotations {
            for &(x, y) in &a.outline {
                if x < canvas.width() && y < canvas.height() {
                    canvas.put_pixel(x, y, a.color);
                }
            }
            draw_hollow_rect_mut(&mut canvas, a.bbox.to_rect(), a.color);
            if let (Some(font), Some(text)) = (&self.font, &a.caption) {
                let y = a.bbox.y as i32 - self.scale.ceil() as i32;
                draw_text_mut(
                    &mut canvas,
                    a.color,
                    a.bbox.x as i32,
                    y.max(0),
                    PxScale::from(self.scale),
                    font,
                    text,
                );
            }
        }
        debug!("rendered annotated plate");
        canvas
    }

    pub fn save(&self, image: &RgbImage, path: &Path) -> Result<()> {
        image
            .save(path)
            .map_err(|e| AnalysisError::EncodeError(format!("{}: {e}", path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_edges_are_colored_and_inside_kept_gray() {
        let plate = GrayImage::from_pixel(40, 30, image::Luma([120]));
        let red = Rgb([255, 0, 0]);
        let mut a = Annotation::boxed(BoundingBox::new(5, 5, 10, 8), red);
        a.outline = vec![(8, 8)];
        a.caption = Some("ignored without font".into());

        let out = Annotator::new().render(&plate, &[a]);
        assert_eq!(out.dimensions(), (40, 30));
        assert_eq!(*out.get_pixel(5, 5), red);
        assert_eq!(*out.get_pixel(14, 12), red);
        assert_eq!(*out.get_pixel(8, 8), red);
        assert_eq!(*out.get_pixel(10, 10), Rgb([120, 120, 120]));
        assert_eq!(*out.get_pixel(0, 0), Rgb([120, 120, 120]));
    }

    #[test]
    fn unreadable_font_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("font.ttf");
        std::fs::write(&path, b"not a font").unwrap();
        assert!(Annotator::new().with_font_file(&path).is_err());
    }
}
