//! Metric extraction from free-form telemetry text.
//!
//! The telemetry source prints readings as `Label: value unit` lines, e.g.
//!
//! ```text
//! E-Cluster HW active frequency: 1020 MHz
//! E-Cluster HW active residency:  12.34% (600 MHz: 18% 972 MHz: 23% ...)
//! CPU Power: 1234 mW
//! ```
//!
//! Extraction tokenizes the first such line for a given label instead of
//! interpreting the whole report, so unrelated or reordered output does not
//! matter. A missing label yields `None`; a present label with an unreadable
//! value yields zero.

use serde::Serialize;

/// Unit attached to an extracted reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Unit {
    Megahertz,
    Percent,
    Milliwatts,
}

impl Unit {
    /// The token the telemetry source prints after the number.
    pub fn symbol(&self) -> &'static str {
        match self {
            Unit::Megahertz => "MHz",
            Unit::Percent => "%",
            Unit::Milliwatts => "mW",
        }
    }
}

/// A single named reading taken from a sample record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Metric {
    pub name: &'static str,
    pub value: f64,
    pub unit: Unit,
}

/// The known textual shape of one metric: a literal label and its unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricPattern {
    pub name: &'static str,
    pub label: &'static str,
    pub unit: Unit,
}

impl MetricPattern {
    pub const fn new(name: &'static str, label: &'static str, unit: Unit) -> Self {
        Self { name, label, unit }
    }
}

pub const E_CLUSTER_FREQUENCY: MetricPattern = MetricPattern::new(
    "E-Cluster frequency",
    "E-Cluster HW active frequency",
    Unit::Megahertz,
);
pub const E_CLUSTER_RESIDENCY: MetricPattern = MetricPattern::new(
    "E-Cluster residency",
    "E-Cluster HW active residency",
    Unit::Percent,
);
pub const P_CLUSTER_FREQUENCY: MetricPattern = MetricPattern::new(
    "P-Cluster frequency",
    "P-Cluster HW active frequency",
    Unit::Megahertz,
);
pub const P_CLUSTER_RESIDENCY: MetricPattern = MetricPattern::new(
    "P-Cluster residency",
    "P-Cluster HW active residency",
    Unit::Percent,
);
pub const GPU_FREQUENCY: MetricPattern =
    MetricPattern::new("GPU frequency", "GPU HW active frequency", Unit::Megahertz);
pub const GPU_RESIDENCY: MetricPattern =
    MetricPattern::new("GPU residency", "GPU HW active residency", Unit::Percent);
pub const CPU_POWER: MetricPattern = MetricPattern::new("CPU Power", "CPU Power", Unit::Milliwatts);
pub const GPU_POWER: MetricPattern = MetricPattern::new("GPU Power", "GPU Power", Unit::Milliwatts);
pub const ANE_POWER: MetricPattern = MetricPattern::new("ANE Power", "ANE Power", Unit::Milliwatts);

/// Find the first reading for `pattern` anywhere in `text`.
///
/// # Example
///
/// ```
/// use powerwatch::data::metric::{extract, Unit, CPU_POWER, GPU_POWER};
///
/// let record = "*** Sampled system activity ***\nCPU Power: 1234 mW\n";
/// let cpu = extract(record, &CPU_POWER).unwrap();
/// assert_eq!(cpu.value, 1234.0);
/// assert_eq!(cpu.unit, Unit::Milliwatts);
/// assert!(extract(record, &GPU_POWER).is_none());
/// ```
pub fn extract(text: &str, pattern: &MetricPattern) -> Option<Metric> {
    let raw = labelled_value(text, pattern.label)?;
    Some(Metric {
        name: pattern.name,
        value: parse_value(raw, pattern.unit),
        unit: pattern.unit,
    })
}

/// Returns the trimmed remainder of the line after the first `label:`.
///
/// The label only counts when it starts a word, so `"GPU Power"` never
/// matches inside `"XGPU Power"`.
pub fn labelled_value<'a>(text: &'a str, label: &str) -> Option<&'a str> {
    if label.is_empty() {
        return None;
    }

    text.match_indices(label).find_map(|(idx, _)| {
        if !starts_word(text, idx) {
            return None;
        }
        let rest = text[idx + label.len()..].strip_prefix(':')?;
        let end = rest.find(['\n', '\r']).unwrap_or(rest.len());
        Some(rest[..end].trim())
    })
}

fn starts_word(text: &str, idx: usize) -> bool {
    text[..idx]
        .chars()
        .next_back()
        .map_or(true, |c| !(c.is_alphanumeric() || c == '-' || c == '_'))
}

/// Parse the leading number of `raw`, tolerating a glued unit ("12.3%").
fn parse_value(raw: &str, unit: Unit) -> f64 {
    let token = raw.split_whitespace().next().unwrap_or("");
    let token = token.strip_suffix(unit.symbol()).unwrap_or(token);

    match token.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => value,
        _ => 0.0,
    }
}
