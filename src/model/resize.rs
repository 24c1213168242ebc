// ABOUTME: Resize strategy and instance-count resolution.
// ABOUTME: Percentage math uses integer ceiling so small percentages never round to zero.

use serde::{Deserialize, Serialize};

/// Order in which capacity moves during a deploy step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizeStrategy {
    /// Upsize the new scale set, then downsize the old one.
    #[default]
    ResizeNewFirst,

    /// Downsize the old scale set before the new one takes capacity.
    DownsizeOldFirst,
}

/// How a deploy step expresses its target capacity.
///
/// A count and a percentage can never both apply: the variant carries
/// exactly one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "unit", content = "value")]
pub enum InstanceSpec {
    /// Absolute instance count.
    Count(u32),

    /// Percentage of the setup phase's desired capacity.
    Percentage(u32),
}

impl InstanceSpec {
    /// Resolve the spec against the total capacity established by Setup.
    pub fn resolve(&self, total_instances: u32) -> u32 {
        match *self {
            InstanceSpec::Count(n) => n,
            InstanceSpec::Percentage(p) => total_expected_count(total_instances, p),
        }
    }
}

/// Ceiling of `total * percent / 100`.
///
/// Truncating here would scale a small fleet to zero instances on low
/// percentages, so the division always rounds up.
pub fn total_expected_count(total_instances: u32, percent: u32) -> u32 {
    let product = u64::from(total_instances) * u64::from(percent);
    ((product + 99) / 100) as u32
}
