use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use nematode_plate_rs::logger;
use nematode_plate_rs::plate_pipeline::{
    AdaptiveParams, AnalysisConfig, BatchReport, CancelToken, Checkpoint, FeatureSet,
    LabelingStrategy, MaskSource, PlatePipeline, SegmentationMethod, TrainingSet, WormClass,
    train,
};
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "nematode-plate")]
#[command(about = "Count and sex nematodes on scanned culture plates")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate worm counts for every plate directory below ROOT.
    Count {
        root: PathBuf,
        #[command(flatten)]
        analysis: AnalysisArgs,
    },

    /// Classify worms by sex for every plate directory below ROOT.
    Gender {
        root: PathBuf,
        /// Tab-separated training file with class-marked source paths.
        #[arg(long)]
        training: PathBuf,
        /// Measurements fed to the classifier.
        #[arg(long, value_enum, default_value_t = FeaturesArg::Full)]
        features: FeaturesArg,
        #[command(flatten)]
        analysis: AnalysisArgs,
    },

    /// Train on FILE and report class means and self-classification accuracy.
    TrainCheck {
        file: PathBuf,
        #[arg(long, value_enum, default_value_t = FeaturesArg::Full)]
        features: FeaturesArg,
    },
}

#[derive(Debug, Clone, Args)]
struct AnalysisArgs {
    /// Extension of the tile images (`piece_<n>.<ext>`).
    #[arg(long, default_value = "jpeg")]
    tile_extension: String,

    /// Do not write assembled.<ext> next to the tiles.
    #[arg(long)]
    no_cache: bool,

    /// Micrometers per scanner step when the plate log omits it.
    #[arg(long, default_value = "1.0")]
    microns_per_step: f64,

    /// Use local mean thresholding instead of the global cutoff.
    #[arg(long)]
    adaptive: bool,

    /// Keep objects touching the plate border.
    #[arg(long)]
    keep_border: bool,

    #[arg(long, value_enum, default_value_t = LabelingArg::Flood)]
    labeling: LabelingArg,

    /// Smallest accepted blob area, in pixels.
    #[arg(long, default_value = "50")]
    min_worm_size: u32,

    /// Largest accepted blob area, in pixels.
    #[arg(long, default_value = "6000")]
    max_worm_size: u32,

    /// Region mask image shared by every plate.
    #[arg(long)]
    mask: Option<PathBuf>,

    /// Regions in the mask image are dark rather than bright.
    #[arg(long, requires = "mask")]
    mask_dark: bool,

    /// Diameter checkpoint distance in micrometers (default: percent).
    #[arg(long, conflicts_with = "checkpoint_percent")]
    checkpoint_microns: Option<f64>,

    /// Diameter checkpoint as percent of true length.
    #[arg(long)]
    checkpoint_percent: Option<f64>,

    /// Process blobs one at a time.
    #[arg(long)]
    no_parallel: bool,

    /// Skip the annotated JPEG.
    #[arg(long)]
    no_annotate: bool,

    /// TrueType font for annotation captions.
    #[arg(long)]
    font: Option<PathBuf>,

    /// Also export a 16-bit TIFF label map.
    #[arg(long)]
    label_map: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LabelingArg {
    Flood,
    Raster,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FeaturesArg {
    Diameters,
    DiametersFatness,
    Full,
}

impl From<FeaturesArg> for FeatureSet {
    fn from(arg: FeaturesArg) -> Self {
        match arg {
            FeaturesArg::Diameters => FeatureSet::Diameters,
            FeaturesArg::DiametersFatness => FeatureSet::DiametersFatness,
            FeaturesArg::Full => FeatureSet::Full,
        }
    }
}

impl AnalysisArgs {
    fn config(&self, features: FeatureSet) -> anyhow::Result<AnalysisConfig> {
        if self.min_worm_size > self.max_worm_size {
            bail!(
                "--min-worm-size {} exceeds --max-worm-size {}",
                self.min_worm_size,
                self.max_worm_size
            );
        }

        let segmentation = if self.adaptive {
            SegmentationMethod::Adaptive(AdaptiveParams::default())
        } else {
            SegmentationMethod::Global
        };
        let labeling = match self.labeling {
            LabelingArg::Flood => LabelingStrategy::FloodTrace,
            LabelingArg::Raster => LabelingStrategy::RasterScan,
        };
        let mask = match &self.mask {
            Some(path) => MaskSource::File {
                path: path.clone(),
                foreground_dark: self.mask_dark,
            },
            None => MaskSource::WholePlate,
        };

        let mut builder = AnalysisConfig::builder()
            .tile_extension(self.tile_extension.as_str())
            .cache_assembled(!self.no_cache)
            .default_microns_per_step(self.microns_per_step)
            .segmentation(segmentation)
            .clear_border(!self.keep_border)
            .labeling(labeling)
            .worm_size(self.min_worm_size, self.max_worm_size)
            .mask(mask)
            .parallel_blobs(!self.no_parallel)
            .feature_set(features)
            .annotate(!self.no_annotate)
            .font(self.font.clone())
            .label_map(self.label_map);

        if let Some(microns) = self.checkpoint_microns {
            builder = builder.checkpoint(Checkpoint::Microns(microns));
        } else if let Some(percent) = self.checkpoint_percent {
            builder = builder.checkpoint(Checkpoint::Percent(percent));
        }

        Ok(builder.build())
    }
}

fn main() -> anyhow::Result<()> {
    logger::init();

    let cli = Cli::parse();
    let cancel = CancelToken::new();

    match cli.command {
        Commands::Count { root, analysis } => {
            let config = analysis.config(FeatureSet::default())?;
            let pipeline = PlatePipeline::new(config).context("initializing pipeline")?;
            info!(root = %root.display(), "Counting worms");
            let report = pipeline.count_batch(&root, &cancel);
            summarize(&report);
            finish(&report)
        }
        Commands::Gender {
            root,
            training,
            features,
            analysis,
        } => {
            let config = analysis.config(features.into())?;
            let set = TrainingSet::read(&training)
                .with_context(|| format!("reading training set {}", training.display()))?;
            let model = train(&set.exemplars, config.feature_set).context("training classifier")?;
            info!(
                exemplars = model.exemplar_count(),
                features = ?model.feature_set(),
                "Classifier trained"
            );

            let pipeline = PlatePipeline::new(config).context("initializing pipeline")?;
            info!(root = %root.display(), "Classifying worms");
            let report = pipeline.gender_batch(&root, &model, &cancel);
            summarize(&report);
            finish(&report)
        }
        Commands::TrainCheck { file, features } => train_check(&file, features.into()),
    }
}

fn train_check(file: &Path, features: FeatureSet) -> anyhow::Result<()> {
    let set = TrainingSet::read(file)
        .with_context(|| format!("reading training set {}", file.display()))?;
    for class in WormClass::ALL {
        info!(%class, exemplars = set.count(class), "Training class");
    }

    let model = train(&set.exemplars, features).context("training classifier")?;
    for class in WormClass::ALL {
        let mean: Vec<String> = model
            .mean(class)
            .iter()
            .map(|v| format!("{v:.3}"))
            .collect();
        println!("{class}\tmean [{}]", mean.join(", "));
    }

    let mut correct = 0usize;
    for exemplar in &set.exemplars {
        let predicted = model.classify(&features.project(&exemplar.measurements))?;
        if predicted == exemplar.class {
            correct += 1;
        } else {
            warn!(
                source = %exemplar.source,
                expected = %exemplar.class,
                %predicted,
                "Misclassified exemplar"
            );
        }
    }
    println!(
        "self-classification: {correct}/{} ({:.1}%)",
        set.len(),
        100.0 * correct as f64 / set.len() as f64
    );
    Ok(())
}

fn summarize(report: &BatchReport) {
    for plate in &report.processed {
        println!(
            "{}\t{}\tworms={}\tmales={}\therms={}\tsuspicious={}\trejected={}",
            plate.dir.display(),
            plate.variant,
            plate.worms,
            plate.males,
            plate.herms,
            plate.suspicious,
            plate.rejected
        );
    }
    for failure in &report.failures {
        error!(dir = %failure.dir.display(), "{}", failure.error);
    }
    info!(
        plates = report.processed.len(),
        failed = report.failures.len(),
        worms = report.total_worms(),
        "Batch finished"
    );
}

fn finish(report: &BatchReport) -> anyhow::Result<()> {
    if report.processed.is_empty() && !report.failures.is_empty() {
        bail!("all {} plates failed", report.failures.len());
    }
    Ok(())
}
