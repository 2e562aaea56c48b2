//! Analysis configuration and its builder.

use std::path::PathBuf;

use imageproc::region_labelling::Connectivity;

use crate::plate_pipeline::classify::FeatureSet;
use crate::plate_pipeline::diameter::{Checkpoint, DiameterParams};
use crate::plate_pipeline::labeling::LabelingStrategy;
use crate::plate_pipeline::mask::ScreeningParams;
use crate::plate_pipeline::morphometry::MorphometryParams;
use crate::plate_pipeline::output::TiffCompression;
use crate::plate_pipeline::segment::SegmentationMethod;
use crate::plate_pipeline::tiles::TileLayout;

/// Where region labels come from.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum MaskSource {
    /// The whole plate is one region.
    #[default]
    WholePlate,
    /// A mask image shared by every plate. Regions are the bright side of
    /// its Otsu threshold unless `foreground_dark` is set.
    File {
        path: PathBuf,
        foreground_dark: bool,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputParams {
    /// Write `assembled_colors.jpeg`.
    pub annotate: bool,
    /// Font for box captions; no captions without one.
    pub font: Option<PathBuf>,
    /// Write `labels.tiff`.
    pub label_map: bool,
    pub compression: TiffCompression,
    pub predictor: bool,
}

impl Default for OutputParams {
    fn default() -> Self {
        Self {
            annotate: true,
            font: None,
            label_map: false,
            compression: TiffCompression::DeflateBalanced,
            predictor: true,
        }
    }
}

/// Configuration for one analysis run
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub layout: TileLayout,
    /// Used when a plate log has no `MicronsPerStep`.
    pub default_microns_per_step: f64,
    pub segmentation: SegmentationMethod,
    pub connectivity: Connectivity,
    pub clear_border: bool,
    pub labeling: LabelingStrategy,
    pub screening: ScreeningParams,
    pub mask: MaskSource,
    pub morphometry: MorphometryParams,
    pub diameter: DiameterParams,
    pub feature_set: FeatureSet,
    pub output: OutputParams,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            layout: TileLayout::default(),
            default_microns_per_step: 1.0,
            segmentation: SegmentationMethod::default(),
            connectivity: Connectivity::Eight,
            clear_border: true,
            labeling: LabelingStrategy::default(),
            screening: ScreeningParams::default(),
            mask: MaskSource::default(),
            morphometry: MorphometryParams::default(),
            diameter: DiameterParams::default(),
            feature_set: FeatureSet::default(),
            output: OutputParams::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder::default()
    }
}

/// Builder for AnalysisConfig
#[derive(Default)]
pub struct AnalysisConfigBuilder {
    layout: Option<TileLayout>,
    tile_size: Option<(u32, u32)>,
    tile_extension: Option<String>,
    cache_assembled: Option<bool>,
    default_microns_per_step: Option<f64>,
    segmentation: Option<SegmentationMethod>,
    connectivity: Option<Connectivity>,
    clear_border: Option<bool>,
    labeling: Option<LabelingStrategy>,
    screening: Option<ScreeningParams>,
    worm_size: Option<(u32, u32)>,
    mask: Option<MaskSource>,
    morphometry: Option<MorphometryParams>,
    parallel_blobs: Option<bool>,
    diameter: Option<DiameterParams>,
    checkpoint: Option<Checkpoint>,
    feature_set: Option<FeatureSet>,
    output: Option<OutputParams>,
    annotate: Option<bool>,
    font: Option<Option<PathBuf>>,
    label_map: Option<bool>,
}

impl AnalysisConfigBuilder {
    pub fn layout(mut self, layout: TileLayout) -> Self {
        self.layout = Some(layout);
        self
    }

    pub fn tile_size(mut self, width: u32, height: u32) -> Self {
        self.tile_size = Some((width, height));
        self
    }

    pub fn tile_extension(mut self, extension: impl Into<String>) -> Self {
        self.tile_extension = Some(extension.into());
        self
    }

    pub fn cache_assembled(mut self, enable: bool) -> Self {
        self.cache_assembled = Some(enable);
        self
    }

    pub fn default_microns_per_step(mut self, microns: f64) -> Self {
        self.default_microns_per_step = Some(microns);
        self
    }

    pub fn segmentation(mut self, method: SegmentationMethod) -> Self {
        self.segmentation = Some(method);
        self
    }

    pub fn connectivity(mut self, connectivity: Connectivity) -> Self {
        self.connectivity = Some(connectivity);
        self
    }

    pub fn clear_border(mut self, enable: bool) -> Self {
        self.clear_border = Some(enable);
        self
    }

    pub fn labeling(mut self, strategy: LabelingStrategy) -> Self {
        self.labeling = Some(strategy);
        self
    }

    pub fn screening(mut self, params: ScreeningParams) -> Self {
        self.screening = Some(params);
        self
    }

    /// Shortcut for the screening size window, in pixels.
    pub fn worm_size(mut self, min: u32, max: u32) -> Self {
        self.worm_size = Some((min, max));
        self
    }

    pub fn mask(mut self, source: MaskSource) -> Self {
        self.mask = Some(source);
        self
    }

    pub fn morphometry(mut self, params: MorphometryParams) -> Self {
        self.morphometry = Some(params);
        self
    }

    pub fn parallel_blobs(mut self, enable: bool) -> Self {
        self.parallel_blobs = Some(enable);
        self
    }

    pub fn diameter(mut self, params: DiameterParams) -> Self {
        self.diameter = Some(params);
        self
    }

    pub fn checkpoint(mut self, checkpoint: Checkpoint) -> Self {
        self.checkpoint = Some(checkpoint);
        self
    }

    pub fn feature_set(mut self, set: FeatureSet) -> Self {
        self.feature_set = Some(set);
        self
    }

    pub fn output(mut self, params: OutputParams) -> Self {
        self.output = Some(params);
        self
    }

    pub fn annotate(mut self, enable: bool) -> Self {
        self.annotate = Some(enable);
        self
    }

    pub fn font(mut self, path: Option<PathBuf>) -> Self {
        self.font = Some(path);
        self
    }

    pub fn label_map(mut self, enable: bool) -> Self {
        self.label_map = Some(enable);
        self
    }

    /// Whole-struct settings are applied first, single-field shortcuts on
    /// top of them.
    pub fn build(self) -> AnalysisConfig {
        let default = AnalysisConfig::default();

        let mut layout = self.layout.unwrap_or(default.layout);
        if let Some((w, h)) = self.tile_size {
            layout.tile_width = w;
            layout.tile_height = h;
        }
        if let Some(ext) = self.tile_extension {
            layout.extension = ext;
        }
        if let Some(cache) = self.cache_assembled {
            layout.cache_assembled = cache;
        }

        let mut screening = self.screening.unwrap_or(default.screening);
        if let Some((min, max)) = self.worm_size {
            screening.min_worm_size = min;
            screening.max_worm_size = max;
        }

        let mut morphometry = self.morphometry.unwrap_or(default.morphometry);
        if let Some(parallel) = self.parallel_blobs {
            morphometry.parallel = parallel;
        }

        let mut diameter = self.diameter.unwrap_or(default.diameter);
        if let Some(checkpoint) = self.checkpoint {
            diameter.checkpoint = checkpoint;
        }

        let mut output = self.output.unwrap_or(default.output);
        if let Some(annotate) = self.annotate {
            output.annotate = annotate;
        }
        if let Some(font) = self.font {
            output.font = font;
        }
        if let Some(label_map) = self.label_map {
            output.label_map = label_map;
        }

        AnalysisConfig {
            layout,
            default_microns_per_step: self
                .default_microns_per_step
                .unwrap_or(default.default_microns_per_step),
            segmentation: self.segmentation.unwrap_or(default.segmentation),
            connectivity: self.connectivity.unwrap_or(default.connectivity),
            clear_border: self.clear_border.unwrap_or(default.clear_border),
            labeling: self.labeling.unwrap_or(default.labeling),
            screening,
            mask: self.mask.unwrap_or(default.mask),
            morphometry,
            diameter,
            feature_set: self.feature_set.unwrap_or(default.feature_set),
            output,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plate_pipeline::segment::AdaptiveParams;

    #[test]
    fn defaults_match_scanner_layout() {
        let config = AnalysisConfig::default();
        assert_eq!(config.layout.tile_width, 640);
        assert_eq!(config.layout.tile_height, 480);
        assert_eq!(config.screening.min_worm_size, 50);
        assert_eq!(config.screening.max_worm_size, 6000);
        assert_eq!(config.mask, MaskSource::WholePlate);
        assert!(matches!(config.segmentation, SegmentationMethod::Global));
    }

    #[test]
    fn builder_shortcuts_override_struct_settings() {
        let config = AnalysisConfig::builder()
            .tile_size(320, 240)
            .tile_extension("png")
            .segmentation(SegmentationMethod::Adaptive(AdaptiveParams::default()))
            .worm_size(80, 4000)
            .parallel_blobs(false)
            .checkpoint(Checkpoint::Microns(120.0))
            .feature_set(FeatureSet::Diameters)
            .label_map(true)
            .build();

        assert_eq!((config.layout.tile_width, config.layout.tile_height), (320, 240));
        assert_eq!(config.layout.extension, "png");
        assert!(config.layout.cache_assembled);
        assert_eq!(config.screening.min_worm_size, 80);
        assert_eq!(config.screening.edge_radius_fraction, 0.75);
        assert!(!config.morphometry.parallel);
        assert_eq!(config.diameter.checkpoint, Checkpoint::Microns(120.0));
        assert_eq!(config.feature_set, FeatureSet::Diameters);
        assert!(config.output.label_map);
        assert!(config.output.annotate);
    }
}
