//! Allocation input and output records.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::AllocError;

/// Default header of the reagent A column.
pub const DEFAULT_COMPONENT_A_COLUMN: &str = "Cu Values";

/// Default header of the reagent B column.
pub const DEFAULT_COMPONENT_B_COLUMN: &str = "Glycine Values";

/// Volumes (µL) of the two reagents for one well.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReagentRow {
    pub component_a: f64,
    pub component_b: f64,
}

impl ReagentRow {
    pub fn new(component_a: f64, component_b: f64) -> Self {
        Self {
            component_a,
            component_b,
        }
    }

    /// Combined reagent volume.
    pub fn total(&self) -> f64 {
        self.component_a + self.component_b
    }
}

/// Dispense volumes (µL) for one well.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AllocationResult {
    pub component_a: f64,
    pub component_b: f64,
    /// `component_a + component_b`.
    pub total: f64,
    /// Diluent needed to reach the target, never negative.
    pub remaining: f64,
}

impl AllocationResult {
    /// Returns true if the reagents alone exceed `target`.
    pub fn is_overfilled(&self, target: TargetVolume) -> bool {
        self.total > target.as_ul()
    }

    /// Volume the well ends up holding once every component is dispensed.
    pub fn final_volume(&self) -> f64 {
        self.total + self.remaining
    }
}

/// Desired total volume (µL) per well.
///
/// Always finite and non-negative.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct TargetVolume(f64);

impl TargetVolume {
    /// Validate a target volume.
    pub fn new(ul: f64) -> Result<Self, AllocError> {
        if ul.is_finite() && ul >= 0.0 {
            Ok(Self(ul))
        } else {
            Err(AllocError::InvalidTarget(ul.to_string()))
        }
    }

    /// Volume in microlitres.
    pub fn as_ul(&self) -> f64 {
        self.0
    }
}

impl Default for TargetVolume {
    fn default() -> Self {
        Self(100.0)
    }
}

impl TryFrom<f64> for TargetVolume {
    type Error = AllocError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TargetVolume> for f64 {
    fn from(value: TargetVolume) -> Self {
        value.0
    }
}

impl FromStr for TargetVolume {
    type Err = AllocError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ul: f64 = s
            .trim()
            .parse()
            .map_err(|_| AllocError::InvalidTarget(s.to_string()))?;
        Self::new(ul)
    }
}

impl fmt::Display for TargetVolume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} µL", self.0)
    }
}

/// Which input columns hold each reagent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnNames {
    #[serde(default = "default_component_a")]
    pub component_a: String,

    #[serde(default = "default_component_b")]
    pub component_b: String,
}

fn default_component_a() -> String {
    DEFAULT_COMPONENT_A_COLUMN.to_string()
}

fn default_component_b() -> String {
    DEFAULT_COMPONENT_B_COLUMN.to_string()
}

impl ColumnNames {
    pub fn new(component_a: impl Into<String>, component_b: impl Into<String>) -> Self {
        Self {
            component_a: component_a.into(),
            component_b: component_b.into(),
        }
    }
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            component_a: default_component_a(),
            component_b: default_component_b(),
        }
    }
}
