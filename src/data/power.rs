//! Power readings and the combined power figure.

use serde::Serialize;

use super::metric::{extract, Metric, ANE_POWER, CPU_POWER, GPU_POWER};
use super::units::milliwatts_to_watts;

/// CPU, GPU and ANE power as found in one sample record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PowerReadings {
    pub cpu: Option<Metric>,
    pub gpu: Option<Metric>,
    pub ane: Option<Metric>,
}

impl PowerReadings {
    pub fn from_record(text: &str) -> Self {
        Self {
            cpu: extract(text, &CPU_POWER),
            gpu: extract(text, &GPU_POWER),
            ane: extract(text, &ANE_POWER),
        }
    }

    /// Sum of all three components; an absent component contributes zero.
    pub fn combined_milliwatts(&self) -> f64 {
        // Folding from +0.0: an empty f64 sum is -0.0 and would print as "-0.00 W"
        [self.cpu, self.gpu, self.ane]
            .iter()
            .flatten()
            .fold(0.0, |total, m| total + m.value)
    }

    pub fn combined_watts(&self) -> f64 {
        milliwatts_to_watts(self.combined_milliwatts())
    }
}

/// A single component in watts, if it was reported.
pub fn watts(metric: Option<Metric>) -> Option<f64> {
    metric.map(|m| milliwatts_to_watts(m.value))
}
