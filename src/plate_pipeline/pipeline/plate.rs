use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use tracing::{debug, info, info_span, instrument, warn};

use crate::plate_pipeline::classify::{ClassifierModel, Measurements, WormClass};
use crate::plate_pipeline::common::error::Result;
use crate::plate_pipeline::common::{PipelineTimings, Timer};
use crate::plate_pipeline::config::{AnalysisConfig, MaskSource};
use crate::plate_pipeline::counting::WormCountEstimator;
use crate::plate_pipeline::diameter::DiameterProfiler;
use crate::plate_pipeline::labeling::{Component, ComponentLabeler, ordinal_label_map};
use crate::plate_pipeline::mask::{MaskMatcher, MatchedBlob, RegionMask};
use crate::plate_pipeline::morphometry::{MorphometricExtractor, Morphometrics};
use crate::plate_pipeline::output::{
    ANNOTATED_FILE_NAME, Annotation, Annotator, LABEL_MAP_FILE_NAME, LabelMapWriter,
    TiffLabelMapWriter, class_color,
};
use crate::plate_pipeline::pipeline::batch::{BatchReport, CancelToken, PlateDirs, run_batch};
use crate::plate_pipeline::pipeline::types::{Blob, PlateDetection, PlateReport, Variant};
use crate::plate_pipeline::results::{
    CountRecord, CountResults, GenderRecord, GenderResults, InspectionStatus, ResultsFile,
};
use crate::plate_pipeline::segment::Segmenter;
use crate::plate_pipeline::tiles::{
    ImageTileReader, LOG_FILE_NAME, PlateLog, TileAssembler, TileReader,
};

pub struct PlatePipeline<R: TileReader, W: LabelMapWriter> {
    reader: R,
    writer: W,
    config: AnalysisConfig,
    file_mask: Option<RegionMask>,
    annotator: Annotator,
}

impl PlatePipeline<ImageTileReader, TiffLabelMapWriter> {
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        let writer = TiffLabelMapWriter::new(config.output.compression, config.output.predictor);
        Self::with_custom(ImageTileReader, writer, config)
    }
}

impl<R: TileReader, W: LabelMapWriter> PlatePipeline<R, W> {
    /// Loads the configured mask and caption font up front so every plate
    /// of a batch shares them.
    pub fn with_custom(reader: R, writer: W, config: AnalysisConfig) -> Result<Self> {
        let file_mask = match &config.mask {
            MaskSource::WholePlate => None,
            MaskSource::File {
                path,
                foreground_dark,
            } => Some(RegionMask::open(path, *foreground_dark)?),
        };
        let mut annotator = Annotator::new();
        if let Some(font) = &config.output.font {
            annotator = annotator.with_font_file(font)?;
        }
        Ok(Self {
            reader,
            writer,
            config,
            file_mask,
            annotator,
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Assembles, segments, labels and screens one plate directory.
    pub fn detect(&self, dir: &Path) -> Result<PlateDetection> {
        let mut timings = PipelineTimings::new();
        self.detect_timed(dir, &mut timings)
    }

    fn detect_timed(&self, dir: &Path, timings: &mut PipelineTimings) -> Result<PlateDetection> {
        let cfg = &self.config;

        let log = timings.time("read_log", || {
            PlateLog::read(&dir.join(LOG_FILE_NAME), cfg.default_microns_per_step)
        })?;

        let timer = Timer::start("assemble");
        let plate = TileAssembler::new(&self.reader, &cfg.layout).assemble(dir, &log.grid)?;
        let (name, duration) = timer.stop();
        timings.add_step(name, duration);

        let segmenter = Segmenter::new(cfg.segmentation, cfg.connectivity, cfg.clear_border);
        let binary = timings.time("segment", || segmenter.segment(&plate));

        let labeler = ComponentLabeler::new(cfg.labeling, cfg.connectivity);
        let components = timings.time("label", || labeler.label(&binary));
        let total = components.len();

        let (width, height) = plate.dimensions();
        let whole;
        let mask = match &self.file_mask {
            Some(mask) => {
                if mask.dimensions() != (width, height) {
                    warn!(
                        mask = ?mask.dimensions(),
                        plate = ?(width, height),
                        "mask and plate sizes differ"
                    );
                }
                mask
            }
            None => {
                whole = RegionMask::whole_plate(width, height);
                &whole
            }
        };
        let matcher = MaskMatcher::new(mask, cfg.screening);
        let (blobs, stats) =
            timings.time("match", || matcher.match_components(components, width, height));

        info!(
            dir = %dir.display(),
            components = total,
            kept = blobs.len(),
            clusters = stats.clusters,
            "detected blobs"
        );
        Ok(PlateDetection {
            dir: dir.to_path_buf(),
            calibration: log.calibration,
            plate,
            components: total,
            blobs,
            stats,
        })
    }

    /// Count variant: worms per blob from the plate's single-worm area.
    #[instrument(skip(self), fields(dir = %dir.display()))]
    pub fn count_plate(&self, dir: &Path) -> Result<PlateReport> {
        let mut timings = PipelineTimings::new();
        let detection = self.detect_timed(dir, &mut timings)?;

        let estimator = WormCountEstimator::from_blobs(&detection.blobs);
        let records: Vec<CountRecord> = detection
            .blobs
            .iter()
            .map(|b| CountRecord {
                bbox: b.component.bbox,
                n_worms: estimator.estimate(b.component.area),
                area: b.component.area,
                label: b.region,
            })
            .collect();
        let results = CountResults {
            single_worm_area: estimator.single_worm_area(),
            records,
        };
        let results_path = dir.join(CountResults::FILE_NAME);
        timings.time("save_results", || results.save(&results_path))?;

        let annotations: Vec<Annotation> = results
            .records
            .iter()
            .map(|r| {
                let mut a = Annotation::boxed(r.bbox, class_color(None, false));
                if r.n_worms > 1 {
                    a.caption = Some(r.n_worms.to_string());
                }
                a
            })
            .collect();
        let components: Vec<&Component> = detection.blobs.iter().map(|b| &b.component).collect();
        self.write_outputs(&detection, &annotations, &components, &mut timings)?;

        timings.log_summary(&dir.display().to_string());
        Ok(PlateReport {
            dir: dir.to_path_buf(),
            variant: Variant::Count,
            records: results.records.len(),
            worms: results.particle_count(),
            males: 0,
            herms: 0,
            suspicious: detection.stats.clusters,
            rejected: 0,
            stats: detection.stats,
            results_path,
            timings,
        })
    }

    /// Gender variant: measure, profile and classify every kept blob.
    #[instrument(skip(self, model), fields(dir = %dir.display()))]
    pub fn gender_plate(&self, dir: &Path, model: &ClassifierModel) -> Result<PlateReport> {
        let mut timings = PipelineTimings::new();
        let detection = self.detect_timed(dir, &mut timings)?;

        let extractor =
            MorphometricExtractor::new(self.config.morphometry.clone(), detection.calibration);
        let components: Vec<&Component> = detection.blobs.iter().map(|b| &b.component).collect();
        let measured = timings.time("morphometry", || {
            extractor.extract_all(&components, &detection.plate)
        });

        let profiler = DiameterProfiler::new(self.config.diameter, detection.calibration);
        let mut blobs = Vec::with_capacity(measured.len());
        let mut rejected = 0;
        let timer = Timer::start("classify");
        for (matched, result) in detection.blobs.iter().zip(measured) {
            let _span = info_span!("blob", label = matched.component.label).entered();
            let morphometrics = match result {
                Ok(m) => Some(m),
                Err(rejection) if matched.is_cluster() => {
                    debug!(%rejection, "cluster kept for review");
                    None
                }
                Err(rejection) => {
                    debug!(%rejection, "blob rejected");
                    rejected += 1;
                    continue;
                }
            };
            blobs.push(self.classify_blob(matched.clone(), morphometrics, &profiler, model)?);
        }
        let (name, duration) = timer.stop();
        timings.add_step(name, duration);

        let records: Vec<GenderRecord> = blobs.iter().map(gender_record).collect();
        let results = GenderResults::new(records, InspectionStatus::NotInspected);
        let results_path = dir.join(GenderResults::FILE_NAME);
        timings.time("save_results", || results.save(&results_path))?;

        let annotations: Vec<Annotation> = blobs.iter().map(annotation).collect();
        let kept: Vec<&Component> = blobs.iter().map(|b| &b.matched.component).collect();
        self.write_outputs(&detection, &annotations, &kept, &mut timings)?;

        timings.log_summary(&dir.display().to_string());
        let suspicious = blobs.iter().filter(|b| b.suspicious).count();
        info!(
            males = results.male_count(),
            herms = results.herm_count(),
            suspicious,
            rejected,
            "classified plate"
        );
        Ok(PlateReport {
            dir: dir.to_path_buf(),
            variant: Variant::Gender,
            records: results.records.len(),
            worms: results.male_count() + results.herm_count(),
            males: results.male_count(),
            herms: results.herm_count(),
            suspicious,
            rejected,
            stats: detection.stats,
            results_path,
            timings,
        })
    }

    fn classify_blob(
        &self,
        matched: MatchedBlob,
        morphometrics: Option<Morphometrics>,
        profiler: &DiameterProfiler,
        model: &ClassifierModel,
    ) -> Result<Blob> {
        let mut blob = Blob {
            suspicious: matched.is_cluster(),
            matched,
            morphometrics: None,
            diameters: None,
            class: None,
        };
        let Some(m) = morphometrics else {
            blob.suspicious = true;
            return Ok(blob);
        };
        if m.suspicious {
            blob.suspicious = true;
        }
        if !blob.suspicious {
            match profiler.profile(&m) {
                Ok(profile) => blob.diameters = Some(profile),
                Err(e) if e.is_geometric() => {
                    debug!(reason = %e, "diameter profile failed");
                    blob.suspicious = true;
                }
                Err(e) => return Err(e),
            }
        }
        if let Some(profile) = &blob.diameters {
            let features = model.feature_set().project(&Measurements {
                true_length: m.true_length,
                e1: profile.e1,
                e2: profile.e2,
                fatness: m.fatness,
            });
            blob.class = Some(model.classify(&features)?);
        }
        blob.morphometrics = Some(m);
        Ok(blob)
    }

    /// Annotated image and label map. Label map ids are the 1-based row
    /// index of each blob in the saved results.
    fn write_outputs(
        &self,
        detection: &PlateDetection,
        annotations: &[Annotation],
        components: &[&Component],
        timings: &mut PipelineTimings,
    ) -> Result<()> {
        let out = &self.config.output;
        if out.annotate {
            let timer = Timer::start("annotate");
            let image = self.annotator.render(&detection.plate, annotations);
            self.annotator
                .save(&image, &detection.dir.join(ANNOTATED_FILE_NAME))?;
            let (name, duration) = timer.stop();
            timings.add_step(name, duration);
        }
        if out.label_map {
            let timer = Timer::start("label_map");
            let (w, h) = detection.plate.dimensions();
            let map = ordinal_label_map(components.iter().copied(), w, h);
            let path = detection.dir.join(LABEL_MAP_FILE_NAME);
            let mut file = BufWriter::new(File::create(&path)?);
            self.writer.write_label_map(&map, &mut file)?;
            let (name, duration) = timer.stop();
            timings.add_step(name, duration);
        }
        Ok(())
    }

    /// Count variant over every plate directory below `root`.
    pub fn count_batch(&self, root: &Path, cancel: &CancelToken) -> BatchReport {
        run_batch(PlateDirs::new(root), cancel, |dir| self.count_plate(dir))
    }

    /// Gender variant over every plate directory below `root`.
    pub fn gender_batch(
        &self,
        root: &Path,
        model: &ClassifierModel,
        cancel: &CancelToken,
    ) -> BatchReport {
        run_batch(PlateDirs::new(root), cancel, |dir| self.gender_plate(dir, model))
    }
}

fn gender_record(blob: &Blob) -> GenderRecord {
    let (n_male, n_herm) = match (blob.suspicious, blob.class) {
        (false, Some(WormClass::Male)) => (1, 0),
        (false, Some(WormClass::Hermaphrodite)) => (0, 1),
        _ => (0, 0),
    };
    let (true_length, fatness) = blob
        .morphometrics
        .as_ref()
        .map_or((0.0, 0.0), |m| (m.true_length, m.fatness));
    let (e1, e2) = blob.diameters.map_or((0.0, 0.0), |d| (d.e1, d.e2));
    GenderRecord {
        bbox: blob.matched.component.bbox,
        n_herm,
        n_male,
        true_length,
        fatness,
        e1,
        e2,
        mask_image_id: blob.matched.region,
        suspicious: blob.suspicious,
    }
}

fn annotation(blob: &Blob) -> Annotation {
    let mut a = Annotation::boxed(
        blob.matched.component.bbox,
        class_color(blob.class, blob.suspicious),
    );
    if let Some(m) = &blob.morphometrics {
        a.outline = m.outline.iter().filter_map(|&p| m.to_plate(p)).collect();
    }
    a.caption = Some(
        match (blob.suspicious, blob.class) {
            (true, _) => "?",
            (false, Some(WormClass::Male)) => "M",
            (false, Some(WormClass::Hermaphrodite)) => "H",
            (false, Some(WormClass::Larva)) => "L",
            (false, None) => "-",
        }
        .to_string(),
    );
    a
}
