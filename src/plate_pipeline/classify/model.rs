use nalgebra::{DMatrix, DVector};
use tracing::{debug, instrument};

use crate::plate_pipeline::classify::types::{
    FeatureSet, FeatureVector, TrainingExemplar, WormClass,
};
use crate::plate_pipeline::common::error::{AnalysisError, Result};

const CLASS_COUNT: usize = WormClass::ALL.len();

/// Trained class means and the shared covariance root.
///
/// `r` is the upper-triangular R factor of the QR decomposition of all
/// class-centred exemplars, scaled by `1/sqrt(N - 3)`, so that `rᵀr` is the
/// pooled within-class covariance.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierModel {
    feature_set: FeatureSet,
    means: [DVector<f64>; CLASS_COUNT],
    r: DMatrix<f64>,
    exemplar_count: usize,
}

/// Builds a model from labelled exemplars.
///
/// Every class needs at least one exemplar, and there must be at least
/// `3 + d` exemplars in total for a `d`-dimensional feature set.
#[instrument(skip(exemplars), fields(exemplars = exemplars.len()))]
pub fn train(exemplars: &[TrainingExemplar], feature_set: FeatureSet) -> Result<ClassifierModel> {
    let d = feature_set.dimension();
    let n = exemplars.len();

    let vectors: Vec<(WormClass, DVector<f64>)> = exemplars
        .iter()
        .map(|e| (e.class, feature_set.project(&e.measurements).0))
        .collect();

    let mut sums: [DVector<f64>; CLASS_COUNT] = std::array::from_fn(|_| DVector::zeros(d));
    let mut counts = [0usize; CLASS_COUNT];
    for (class, v) in &vectors {
        sums[class.index()] += v;
        counts[class.index()] += 1;
    }
    for class in WormClass::ALL {
        if counts[class.index()] == 0 {
            return Err(AnalysisError::Training(format!("no {class} exemplars")));
        }
    }
    if n < CLASS_COUNT + d {
        return Err(AnalysisError::Training(format!(
            "{n} exemplars are too few for {d} features"
        )));
    }
    let means: [DVector<f64>; CLASS_COUNT] =
        std::array::from_fn(|i| &sums[i] / counts[i] as f64);

    let mut residuals = DMatrix::<f64>::zeros(n, d);
    for (row, (class, v)) in vectors.iter().enumerate() {
        let centred = v - &means[class.index()];
        residuals.row_mut(row).copy_from(&centred.transpose());
    }

    let r = residuals.qr().r() / ((n - CLASS_COUNT) as f64).sqrt();
    let scale = r.diagonal().amax();
    if scale == 0.0 || r.diagonal().iter().any(|v| v.abs() <= scale * 1e-12) {
        return Err(AnalysisError::Training(
            "pooled covariance is singular".to_string(),
        ));
    }

    debug!(
        dimension = d,
        male = counts[0],
        herm = counts[1],
        larva = counts[2],
        "trained classifier"
    );
    Ok(ClassifierModel {
        feature_set,
        means,
        r,
        exemplar_count: n,
    })
}

/// Nearest class under the model's metric. Ties go to the class listed
/// first in [`WormClass::ALL`].
pub fn classify(model: &ClassifierModel, features: &FeatureVector) -> Result<WormClass> {
    let distances = model.distances(features)?;
    let mut best = WormClass::ALL[0];
    for class in WormClass::ALL.into_iter().skip(1) {
        if distances[class.index()] < distances[best.index()] {
            best = class;
        }
    }
    Ok(best)
}

impl ClassifierModel {
    pub fn feature_set(&self) -> FeatureSet {
        self.feature_set
    }

    pub fn mean(&self, class: WormClass) -> &DVector<f64> {
        &self.means[class.index()]
    }

    pub fn exemplar_count(&self) -> usize {
        self.exemplar_count
    }

    /// Squared generalized distance from `features` to each class mean,
    /// indexed by [`WormClass::index`].
    pub fn distances(&self, features: &FeatureVector) -> Result<[f64; CLASS_COUNT]> {
        let d = self.feature_set.dimension();
        if features.dimension() != d {
            return Err(AnalysisError::Training(format!(
                "feature vector has {} values, model expects {d}",
                features.dimension()
            )));
        }
        let rt = self.r.transpose();
        let mut out = [0.0; CLASS_COUNT];
        for class in WormClass::ALL {
            let diff = &features.0 - &self.means[class.index()];
            let z = rt.solve_lower_triangular(&diff).ok_or_else(|| {
                AnalysisError::Training("covariance root is not invertible".to_string())
            })?;
            out[class.index()] = z.norm_squared();
        }
        Ok(out)
    }

    pub fn classify(&self, features: &FeatureVector) -> Result<WormClass> {
        classify(self, features)
    }
}
