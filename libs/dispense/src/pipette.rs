//! The pipette boundary.

use serde::{Deserialize, Serialize};

use crate::{DispenseError, Location};

/// When a transfer picks up a fresh tip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TipPolicy {
    /// Use the tip already attached.
    Never,
    /// Pick up one tip for the transfer and drop it afterwards.
    #[default]
    Once,
    /// Pick up a fresh tip for every aspirate/dispense pair.
    Always,
}

/// A mixing step: `repetitions` cycles of `volume` µL.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Mix {
    pub repetitions: u32,
    pub volume: f64,
}

/// Options for a single transfer.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TransferOptions {
    pub new_tip: TipPolicy,
    /// Blow out into the trash after dispensing.
    #[serde(default)]
    pub blow_out: bool,
    /// Touch the tip to the side of the destination after dispensing.
    #[serde(default)]
    pub touch_tip: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mix_before: Option<Mix>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mix_after: Option<Mix>,
}

impl TransferOptions {
    /// Reuse the attached tip, nothing else.
    pub fn reuse_tip() -> Self {
        Self {
            new_tip: TipPolicy::Never,
            ..Self::default()
        }
    }
}

/// A single- or multi-channel pipette mounted on the robot.
///
/// Implementations issue the operation on the hardware and return once it
/// has completed. Operations are never reordered.
pub trait Pipette {
    /// Instrument name, e.g. `p1000_single_gen2`.
    fn name(&self) -> &str;

    /// Largest volume (µL) a single aspirate can hold.
    fn max_volume(&self) -> f64;

    fn pick_up_tip(&mut self) -> Result<(), DispenseError>;

    /// Discard the attached tip into the trash.
    fn drop_tip(&mut self) -> Result<(), DispenseError>;

    /// Put the attached tip back into its rack position.
    fn return_tip(&mut self) -> Result<(), DispenseError>;

    /// Blow out residual liquid. `None` targets the trash.
    fn blow_out(&mut self, location: Option<&Location>) -> Result<(), DispenseError>;

    /// Move `volume` µL from `source` to `destination`.
    fn transfer(
        &mut self,
        volume: f64,
        source: &Location,
        destination: &Location,
        options: &TransferOptions,
    ) -> Result<(), DispenseError>;
}
