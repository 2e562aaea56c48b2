//! Generalized (pooled-covariance) Mahalanobis classifier for worm sex and
//! stage.
//!
//! [`train`] turns a set of labelled exemplars into an immutable
//! [`ClassifierModel`]; [`classify`] assigns the class whose mean is nearest
//! under the shared within-class metric. Loading a new training set means
//! training a new model; nothing is updated in place.

mod model;
mod training_set;
mod types;

pub use model::{ClassifierModel, classify, train};
pub use training_set::TrainingSet;
pub use types::{FeatureSet, FeatureVector, Measurements, TrainingExemplar, WormClass};
