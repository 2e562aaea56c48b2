/// Where a chord is cut, measured along the curve from each end.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Checkpoint {
    /// Fixed distance in micrometers.
    Microns(f64),
    /// Percent of the curve's true length.
    Percent(f64),
}

impl Checkpoint {
    /// Arc distance from an end, in micrometers, for a curve of `total`.
    pub fn distance(&self, total: f64) -> f64 {
        match *self {
            Checkpoint::Microns(d) => d,
            Checkpoint::Percent(p) => total * p / 100.0,
        }
    }
}

impl Default for Checkpoint {
    fn default() -> Self {
        Checkpoint::Percent(20.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiameterParams {
    pub checkpoint: Checkpoint,
    /// Farthest a checkpoint may lie from its end, in skeleton pixels.
    pub trace_window: u32,
    /// Half-width of the chord used to estimate the local tangent.
    pub tangent_half_window: u32,
    /// Sampling step of the perpendicular walk, in pixels.
    pub step: f64,
}

impl Default for DiameterParams {
    fn default() -> Self {
        Self {
            checkpoint: Checkpoint::default(),
            trace_window: 400,
            tangent_half_window: 3,
            step: 0.5,
        }
    }
}

/// Chord widths in micrometers and the derived ratio pair, `e1 <= e2`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiameterProfile {
    pub d1: f64,
    pub d2: f64,
    pub d_mid: f64,
    pub e1: f64,
    pub e2: f64,
}

impl DiameterProfile {
    pub(crate) fn from_chords(d1: f64, d2: f64, d_mid: f64) -> Self {
        let (r1, r2) = (d1 / d_mid, d2 / d_mid);
        Self {
            d1,
            d2,
            d_mid,
            e1: r1.min(r2),
            e2: r1.max(r2),
        }
    }
}
