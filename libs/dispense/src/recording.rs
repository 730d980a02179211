//! A pipette that records operations instead of moving hardware.

use serde::Serialize;
use tracing::debug;

use crate::{DispenseError, Location, Mix, Pipette, TipPolicy, TransferOptions};

/// Tips in a standard rack.
const RACK_TIPS: usize = 96;

/// One recorded operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    PickUpTip {
        /// Zero-based pick-up count.
        tip: usize,
    },
    DropTip,
    ReturnTip,
    BlowOut {
        /// `None` means the trash.
        location: Option<Location>,
    },
    /// One aspirate/dispense pair.
    Transfer {
        volume: f64,
        source: Location,
        destination: Location,
        blow_out: bool,
        touch_tip: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        mix_before: Option<Mix>,
        #[serde(skip_serializing_if = "Option::is_none")]
        mix_after: Option<Mix>,
    },
}

/// Records every operation as a [`Step`], enforcing the same tip and volume
/// rules the robot does.
///
/// A transfer larger than the pipette's maximum volume is split into equal
/// aspirate/dispense pairs, each recorded as its own [`Step::Transfer`].
#[derive(Debug, Clone)]
pub struct RecordingPipette {
    name: String,
    max_volume: f64,
    /// Pick-ups available before the racks run dry.
    tip_capacity: usize,
    tips_used: usize,
    has_tip: bool,
    steps: Vec<Step>,
}

impl RecordingPipette {
    /// A single-channel pipette with one full tip rack.
    pub fn new(name: impl Into<String>, max_volume: f64) -> Self {
        Self {
            name: name.into(),
            max_volume,
            tip_capacity: RACK_TIPS,
            tips_used: 0,
            has_tip: false,
            steps: Vec::new(),
        }
    }

    /// A multi-channel pipette picks up `channels` tips at a time.
    pub fn with_channels(mut self, channels: usize) -> Self {
        self.tip_capacity = RACK_TIPS / channels.max(1);
        self
    }

    /// Number of tip racks available.
    pub fn with_racks(mut self, racks: usize) -> Self {
        self.tip_capacity *= racks;
        self
    }

    /// Recorded operations, in order.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn into_steps(self) -> Vec<Step> {
        self.steps
    }

    /// Tip pick-ups so far.
    pub fn tips_used(&self) -> usize {
        self.tips_used
    }

    pub fn has_tip(&self) -> bool {
        self.has_tip
    }

    /// Number of recorded aspirate/dispense pairs.
    pub fn transfer_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|step| matches!(step, Step::Transfer { .. }))
            .count()
    }

    fn out_of_range(&self, volume: f64) -> DispenseError {
        DispenseError::VolumeOutOfRange {
            volume,
            pipette: self.name.clone(),
            max: self.max_volume,
        }
    }

    fn check_volume(&self, volume: f64) -> Result<(), DispenseError> {
        if volume.is_finite() && volume > 0.0 && volume <= self.max_volume {
            Ok(())
        } else {
            Err(self.out_of_range(volume))
        }
    }

    /// Number of equal aspirations needed to move `volume`.
    fn aspirations(&self, volume: f64) -> Result<usize, DispenseError> {
        let usable = self.max_volume.is_finite() && self.max_volume > 0.0;
        if !(usable && volume.is_finite() && volume > 0.0) {
            return Err(self.out_of_range(volume));
        }
        Ok((volume / self.max_volume).ceil().max(1.0) as usize)
    }

    fn require_tip(&self) -> Result<(), DispenseError> {
        if self.has_tip {
            Ok(())
        } else {
            Err(DispenseError::NoTipAttached(self.name.clone()))
        }
    }
}

impl Pipette for RecordingPipette {
    fn name(&self) -> &str {
        &self.name
    }

    fn max_volume(&self) -> f64 {
        self.max_volume
    }

    fn pick_up_tip(&mut self) -> Result<(), DispenseError> {
        if self.has_tip {
            return Err(DispenseError::TipAlreadyAttached(self.name.clone()));
        }
        if self.tips_used >= self.tip_capacity {
            return Err(DispenseError::OutOfTips {
                pipette: self.name.clone(),
                used: self.tips_used,
            });
        }
        self.steps.push(Step::PickUpTip {
            tip: self.tips_used,
        });
        self.tips_used += 1;
        self.has_tip = true;
        Ok(())
    }

    fn drop_tip(&mut self) -> Result<(), DispenseError> {
        self.require_tip()?;
        self.steps.push(Step::DropTip);
        self.has_tip = false;
        Ok(())
    }

    fn return_tip(&mut self) -> Result<(), DispenseError> {
        self.require_tip()?;
        self.steps.push(Step::ReturnTip);
        self.has_tip = false;
        Ok(())
    }

    fn blow_out(&mut self, location: Option<&Location>) -> Result<(), DispenseError> {
        self.require_tip()?;
        self.steps.push(Step::BlowOut {
            location: location.cloned(),
        });
        Ok(())
    }

    fn transfer(
        &mut self,
        volume: f64,
        source: &Location,
        destination: &Location,
        options: &TransferOptions,
    ) -> Result<(), DispenseError> {
        let aspirations = self.aspirations(volume)?;
        for mix in options.mix_before.iter().chain(&options.mix_after) {
            self.check_volume(mix.volume)?;
        }

        match options.new_tip {
            TipPolicy::Never => self.require_tip()?,
            TipPolicy::Once => self.pick_up_tip()?,
            TipPolicy::Always => {}
        }

        let each = volume / aspirations as f64;
        if aspirations > 1 {
            debug!(
                pipette = %self.name,
                volume,
                aspirations,
                "[DRY RUN] volume above pipette maximum; splitting transfer"
            );
        }
        for _ in 0..aspirations {
            if options.new_tip == TipPolicy::Always {
                self.pick_up_tip()?;
            }
            debug!(
                pipette = %self.name,
                volume = each,
                source = %source,
                destination = %destination,
                "[DRY RUN] transfer"
            );
            self.steps.push(Step::Transfer {
                volume: each,
                source: source.clone(),
                destination: destination.clone(),
                blow_out: options.blow_out,
                touch_tip: options.touch_tip,
                mix_before: options.mix_before,
                mix_after: options.mix_after,
            });
            if options.new_tip == TipPolicy::Always {
                self.drop_tip()?;
            }
        }

        if options.new_tip == TipPolicy::Once {
            self.drop_tip()?;
        }
        Ok(())
    }
}
