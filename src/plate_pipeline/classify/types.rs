use std::fmt;

use nalgebra::DVector;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WormClass {
    Male,
    Hermaphrodite,
    /// L3/L4 larva.
    Larva,
}

impl WormClass {
    /// Iteration order of the classifier, which is also its tie-break order.
    pub const ALL: [WormClass; 3] = [WormClass::Male, WormClass::Hermaphrodite, WormClass::Larva];

    pub fn index(self) -> usize {
        match self {
            WormClass::Male => 0,
            WormClass::Hermaphrodite => 1,
            WormClass::Larva => 2,
        }
    }

    /// Class encoded in an exemplar's image path (`/male/`, `/herm/`,
    /// `/l3l4/`). Backslashes count as separators.
    pub fn from_path(path: &str) -> Option<Self> {
        let path = path.replace('\\', "/").to_ascii_lowercase();
        if path.contains("/male/") {
            Some(WormClass::Male)
        } else if path.contains("/herm/") {
            Some(WormClass::Hermaphrodite)
        } else if path.contains("/l3l4/") {
            Some(WormClass::Larva)
        } else {
            None
        }
    }
}

impl fmt::Display for WormClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WormClass::Male => "male",
            WormClass::Hermaphrodite => "hermaphrodite",
            WormClass::Larva => "larva",
        };
        f.write_str(name)
    }
}

/// Which measurements enter the feature vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeatureSet {
    /// `e1, e2`
    Diameters,
    /// `e1, e2, fatness`
    DiametersFatness,
    /// `e1, e2, true_length, fatness`
    #[default]
    Full,
}

impl FeatureSet {
    pub fn dimension(self) -> usize {
        match self {
            FeatureSet::Diameters => 2,
            FeatureSet::DiametersFatness => 3,
            FeatureSet::Full => 4,
        }
    }

    pub fn project(self, m: &Measurements) -> FeatureVector {
        let values = match self {
            FeatureSet::Diameters => vec![m.e1, m.e2],
            FeatureSet::DiametersFatness => vec![m.e1, m.e2, m.fatness],
            FeatureSet::Full => vec![m.e1, m.e2, m.true_length, m.fatness],
        };
        FeatureVector(DVector::from_vec(values))
    }
}

/// Raw per-worm measurements, before a [`FeatureSet`] picks from them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurements {
    pub true_length: f64,
    pub e1: f64,
    pub e2: f64,
    pub fatness: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector(pub DVector<f64>);

impl FeatureVector {
    pub fn from_slice(values: &[f64]) -> Self {
        Self(DVector::from_column_slice(values))
    }

    pub fn dimension(&self) -> usize {
        self.0.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainingExemplar {
    pub source: String,
    pub measurements: Measurements,
    pub class: WormClass,
}
