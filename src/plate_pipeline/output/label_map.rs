use std::io::{Cursor, Write};

use image::Luma;
use imageproc::definitions::Image;
use tiff::encoder::compression::DeflateLevel;
use tiff::encoder::{Compression, TiffEncoder, colortype};
use tiff::tags::Predictor;
use tracing::{debug, warn};

use crate::plate_pipeline::common::error::{AnalysisError, Result};

pub const LABEL_MAP_FILE_NAME: &str = "labels.tiff";

/// TIFF compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TiffCompression {
    #[default]
    None,
    Lzw,
    DeflateFast,
    DeflateBalanced,
    DeflateBest,
}

impl TiffCompression {
    fn to_tiff(self) -> Compression {
        match self {
            TiffCompression::None => Compression::Uncompressed,
            TiffCompression::Lzw => Compression::Lzw,
            TiffCompression::DeflateFast => Compression::Deflate(DeflateLevel::Fast),
            TiffCompression::DeflateBalanced => Compression::Deflate(DeflateLevel::Balanced),
            TiffCompression::DeflateBest => Compression::Deflate(DeflateLevel::Best),
        }
    }
}

/// Sink for a plate's dense label map (0 = background, blob labels 1..).
pub trait LabelMapWriter {
    fn write_label_map(&self, labels: &Image<Luma<u32>>, output: &mut dyn Write) -> Result<()>;
}

/// 16-bit grayscale TIFF. Labels above `u16::MAX` are clamped.
#[derive(Debug, Clone, Copy, Default)]
pub struct TiffLabelMapWriter {
    pub compression: TiffCompression,
    /// Horizontal differencing before compression.
    pub predictor: bool,
}

impl TiffLabelMapWriter {
    pub fn new(compression: TiffCompression, predictor: bool) -> Self {
        Self {
            compression,
            predictor,
        }
    }
}

impl LabelMapWriter for TiffLabelMapWriter {
    fn write_label_map(&self, labels: &Image<Luma<u32>>, output: &mut dyn Write) -> Result<()> {
        let (width, height) = labels.dimensions();
        debug!(width, height, compression = ?self.compression, "encoding label map");

        let max = labels.pixels().map(|p| p[0]).max().unwrap_or(0);
        if max > u16::MAX as u32 {
            warn!(max, "labels exceed 16 bits and are clamped");
        }
        let data: Vec<u16> = labels
            .pixels()
            .map(|p| p[0].min(u16::MAX as u32) as u16)
            .collect();

        let mut buffer = Vec::new();
        let mut encoder = TiffEncoder::new(Cursor::new(&mut buffer))
            .map_err(|e| AnalysisError::EncodeError(e.to_string()))?
            .with_compression(self.compression.to_tiff());
        if self.predictor {
            encoder = encoder.with_predictor(Predictor::Horizontal);
        }
        encoder
            .write_image::<colortype::Gray16>(width, height, &data)
            .map_err(|e| AnalysisError::EncodeError(e.to_string()))?;

        output.write_all(&buffer)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> Image<Luma<u32>> {
        Image::from_fn(12, 7, |x, y| Luma([if x > 3 && y > 2 { (x + y) % 4 } else { 0 }]))
    }

    fn decode(bytes: &[u8]) -> image::ImageBuffer<Luma<u16>, Vec<u16>> {
        image::load_from_memory(bytes).unwrap().into_luma16()
    }

    #[test]
    fn uncompressed_label_map_decodes_to_same_labels() {
        let mut out = Vec::new();
        TiffLabelMapWriter::default()
            .write_label_map(&labels(), &mut out)
            .unwrap();
        assert_eq!(&out[..2], b"II");
        let decoded = decode(&out);
        assert_eq!(decoded.dimensions(), (12, 7));
        for (a, b) in decoded.pixels().zip(labels().pixels()) {
            assert_eq!(a[0] as u32, b[0]);
        }
    }

    #[test]
    fn lzw_with_predictor_round_trips() {
        let mut out = Vec::new();
        TiffLabelMapWriter::new(TiffCompression::Lzw, true)
            .write_label_map(&labels(), &mut out)
            .unwrap();
        let decoded = decode(&out);
        assert_eq!(decoded.get_pixel(5, 4)[0], 1);
    }

    #[test]
    fn oversized_labels_are_clamped() {
        let map: Image<Luma<u32>> = Image::from_pixel(2, 2, Luma([70_000]));
        let mut out = Vec::new();
        TiffLabelMapWriter::default()
            .write_label_map(&map, &mut out)
            .unwrap();
        assert_eq!(decode(&out).get_pixel(0, 0)[0], u16::MAX);
    }
}
