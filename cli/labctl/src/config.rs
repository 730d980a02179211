//! Run configuration.
//!
//! Handles:
//! - Input workbook, sheet and column names
//! - Target volume per well
//! - Deck layout (labware, reagent source wells, pipettes)
//! - Speaker self-test player and audio file
//!
//! A run reads its configuration once at start-up: from `--config PATH`, else
//! from `run.toml` in the user config directory, else built-in defaults.
//! Command-line flags override file values for that run only.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use labplan_accuracy::AccuracyColumns;
use labplan_alloc::{ColumnNames, TargetVolume};
use labplan_dispense::{
    DispenseSources, Labware, Reagent, RecordingPipette, DEFAULT_CALIBRATION_SLOTS,
    DEFAULT_CALIBRATION_STEP_UL, DEFAULT_CLEAN_CYCLES,
};
use serde::{Deserialize, Serialize};

/// Configuration file name.
const CONFIG_FILE: &str = "run.toml";

/// Get the config directory path.
fn config_dir() -> Result<PathBuf> {
    ProjectDirs::from("org", "labplan", "labplan")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
}

/// Default location of the run configuration.
pub fn default_config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE))
}

/// Configuration for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Desired total volume per well (µL).
    #[serde(default)]
    pub target_volume_ul: TargetVolume,

    #[serde(default)]
    pub input: InputConfig,

    #[serde(default)]
    pub labware: LabwareSection,

    #[serde(default)]
    pub reagents: ReagentSection,

    /// Pipette used for dispensing and calibration.
    #[serde(default = "default_pipette")]
    pub pipette: PipetteConfig,

    #[serde(default)]
    pub calibration: CalibrationConfig,

    #[serde(default)]
    pub cleaning: CleaningConfig,

    #[serde(default)]
    pub accuracy: AccuracyColumns,

    #[serde(default)]
    pub speaker: SpeakerConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            target_volume_ul: TargetVolume::default(),
            input: InputConfig::default(),
            labware: LabwareSection::default(),
            reagents: ReagentSection::default(),
            pipette: default_pipette(),
            calibration: CalibrationConfig::default(),
            cleaning: CleaningConfig::default(),
            accuracy: AccuracyColumns::default(),
            speaker: SpeakerConfig::default(),
        }
    }
}

impl RunConfig {
    /// Load the run configuration.
    ///
    /// An explicit path must exist. The default path is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let path = default_config_path()?;
                if !path.exists() {
                    return Ok(Self::default());
                }
                path
            }
        };

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;

        Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to parse config from {:?}", path))
    }

    /// Parse a configuration document.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the deck layout.
    pub fn validate(&self) -> Result<()> {
        let labware = [
            ("plate", self.plate()),
            ("reservoir", self.reservoir()),
            ("tube_rack", self.tube_rack()),
        ];
        for (role, labware) in labware {
            labware
                .validate()
                .with_context(|| format!("Invalid labware.{role}"))?;
        }
        Ok(())
    }

    /// Render as TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }

    /// Write the configuration to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(path, self.to_toml_string()?)
            .with_context(|| format!("Failed to write config to {:?}", path))
    }

    pub fn plate(&self) -> Labware {
        self.labware.plate.to_labware()
    }

    pub fn reservoir(&self) -> Labware {
        self.labware.reservoir.to_labware()
    }

    pub fn tube_rack(&self) -> Labware {
        self.labware.tube_rack.to_labware()
    }

    /// Source wells for the three components, resolved against the reservoir.
    pub fn sources(&self) -> Result<DispenseSources> {
        let reservoir = self.reservoir();
        let resolve = |reagent: &ReagentConfig| -> Result<Reagent> {
            Ok(Reagent {
                name: reagent.name.clone(),
                location: reservoir
                    .well_by_name(&reagent.well)
                    .with_context(|| format!("Invalid source well for {}", reagent.name))?,
                loaded_ul: reagent.loaded_ul,
            })
        };
        Ok(DispenseSources {
            component_a: resolve(&self.reagents.component_a)?,
            component_b: resolve(&self.reagents.component_b)?,
            diluent: resolve(&self.reagents.diluent)?,
        })
    }
}

/// Where allocation input comes from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputConfig {
    /// CSV file, or directory of `<sheet>.csv` files.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sheet: Option<String>,

    #[serde(default)]
    pub columns: ColumnNames,
}

/// A piece of labware on the deck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabwareConfig {
    pub load_name: String,
    pub slot: u8,
    pub rows: u8,
    pub columns: u8,
}

impl LabwareConfig {
    fn to_labware(&self) -> Labware {
        Labware::new(self.load_name.clone(), self.slot, self.rows, self.columns)
    }
}

/// Deck layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabwareSection {
    #[serde(default = "default_plate")]
    pub plate: LabwareConfig,

    #[serde(default = "default_reservoir")]
    pub reservoir: LabwareConfig,

    #[serde(default = "default_tube_rack")]
    pub tube_rack: LabwareConfig,
}

impl Default for LabwareSection {
    fn default() -> Self {
        Self {
            plate: default_plate(),
            reservoir: default_reservoir(),
            tube_rack: default_tube_rack(),
        }
    }
}

fn default_plate() -> LabwareConfig {
    LabwareConfig {
        load_name: "nest_96_wellplate_100ul_pcr_full_skirt".to_string(),
        slot: 2,
        rows: 8,
        columns: 12,
    }
}

fn default_reservoir() -> LabwareConfig {
    LabwareConfig {
        load_name: "nest_12_reservoir_15ml".to_string(),
        slot: 5,
        rows: 1,
        columns: 12,
    }
}

fn default_tube_rack() -> LabwareConfig {
    LabwareConfig {
        load_name: "opentrons_24_tuberack_nest_1.5ml_snapcap".to_string(),
        slot: 3,
        rows: 4,
        columns: 6,
    }
}

/// A reagent held in a reservoir well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReagentConfig {
    pub name: String,
    pub well: String,
    /// Volume (µL) loaded before the run.
    pub loaded_ul: f64,
}

/// Reservoir contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReagentSection {
    #[serde(default = "default_component_a")]
    pub component_a: ReagentConfig,

    #[serde(default = "default_component_b")]
    pub component_b: ReagentConfig,

    #[serde(default = "default_diluent")]
    pub diluent: ReagentConfig,
}

impl Default for ReagentSection {
    fn default() -> Self {
        Self {
            component_a: default_component_a(),
            component_b: default_component_b(),
            diluent: default_diluent(),
        }
    }
}

fn default_component_a() -> ReagentConfig {
    ReagentConfig {
        name: "Cu Stock Solution".to_string(),
        well: "A2".to_string(),
        loaded_ul: 10_000.0,
    }
}

fn default_component_b() -> ReagentConfig {
    ReagentConfig {
        name: "Glycine Stock Solution".to_string(),
        well: "A3".to_string(),
        loaded_ul: 10_000.0,
    }
}

fn default_diluent() -> ReagentConfig {
    ReagentConfig {
        name: "DI Water".to_string(),
        well: "A1".to_string(),
        loaded_ul: 120_000.0,
    }
}

/// A mounted pipette and its tip supply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipetteConfig {
    pub name: String,
    pub max_volume_ul: f64,
    #[serde(default = "default_channels")]
    pub channels: usize,
    #[serde(default = "default_tip_racks")]
    pub tip_racks: usize,
}

impl PipetteConfig {
    /// A dry-run pipette with the configured limits.
    pub fn recording(&self) -> RecordingPipette {
        RecordingPipette::new(self.name.clone(), self.max_volume_ul)
            .with_channels(self.channels)
            .with_racks(self.tip_racks)
    }
}

fn default_channels() -> usize {
    1
}

fn default_tip_racks() -> usize {
    1
}

fn default_pipette() -> PipetteConfig {
    PipetteConfig {
        name: "p1000_single_gen2".to_string(),
        max_volume_ul: 1000.0,
        channels: 1,
        tip_racks: 1,
    }
}

/// Calibration ladder settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    pub step_ul: f64,
    pub slots: usize,
    /// Reservoir well holding the calibration water.
    pub source_well: String,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            step_ul: DEFAULT_CALIBRATION_STEP_UL,
            slots: DEFAULT_CALIBRATION_SLOTS,
            source_well: "A1".to_string(),
        }
    }
}

/// Tip blow-out clean settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningConfig {
    pub cycles: usize,
    pub pipette: PipetteConfig,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            cycles: DEFAULT_CLEAN_CYCLES,
            pipette: PipetteConfig {
                name: "p300_multi_gen2".to_string(),
                max_volume_ul: 300.0,
                channels: 8,
                tip_racks: 1,
            },
        }
    }
}

/// Speaker self-test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeakerConfig {
    /// Audio player executable.
    pub player: String,
    pub audio_file: PathBuf,
}

impl Default for SpeakerConfig {
    fn default() -> Self {
        Self {
            player: "mpg123".to_string(),
            audio_file: PathBuf::from("etc/audio/speaker-test.mp3"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use labplan_dispense::DispenseError;

    #[test]
    fn test_config_default() {
        let config = RunConfig::default();
        assert_eq!(config.target_volume_ul.as_ul(), 100.0);
        assert_eq!(config.input.columns.component_a, "Cu Values");
        assert_eq!(config.plate().well_count(), 96);
        assert_eq!(config.pipette.name, "p1000_single_gen2");
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config = RunConfig::from_toml_str(
            r#"
target_volume_ul = 150.0

[input]
path = "LabData.csv"
sheet = "OT-2 Input"

[reagents.diluent]
name = "Buffer"
well = "A4"
loaded_ul = 5000.0
"#,
        )
        .unwrap();

        assert_eq!(config.target_volume_ul.as_ul(), 150.0);
        assert_eq!(config.input.sheet.as_deref(), Some("OT-2 Input"));
        assert_eq!(config.input.columns, ColumnNames::default());
        assert_eq!(config.reagents.diluent.name, "Buffer");
        assert_eq!(config.reagents.component_a.well, "A2");
        assert_eq!(config.cleaning.pipette.channels, 8);
    }

    #[test]
    fn test_negative_target_rejected() {
        assert!(RunConfig::from_toml_str("target_volume_ul = -1.0").is_err());
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(RunConfig::from_toml_str("target_volume = 100.0").is_err());
    }

    #[test]
    fn test_labware_rows_beyond_z_rejected() {
        let err = RunConfig::from_toml_str(
            r#"
[labware.plate]
load_name = "custom_27_row_plate"
slot = 2
rows = 27
columns = 1
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("labware.plate"));
        assert!(matches!(
            err.downcast_ref::<DispenseError>(),
            Some(DispenseError::InvalidGeometry { rows: 27, .. })
        ));
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = RunConfig::default();
        let text = config.to_toml_string().unwrap();
        assert_eq!(RunConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_sources_resolve_against_reservoir() {
        let sources = RunConfig::default().sources().unwrap();
        assert_eq!(sources.component_a.location.well.to_string(), "A2");
        assert_eq!(sources.diluent.location.slot, 5);
    }

    #[test]
    fn test_invalid_source_well() {
        let mut config = RunConfig::default();
        config.reagents.component_b.well = "Z99".to_string();
        assert!(config.sources().is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("run.toml");
        let mut config = RunConfig::default();
        config.input.path = Some(PathBuf::from("data.csv"));
        config.save(&path).unwrap();
        assert_eq!(RunConfig::load(Some(&path)).unwrap(), config);
    }

    #[test]
    fn test_explicit_missing_path_is_error() {
        assert!(RunConfig::load(Some(Path::new("/nonexistent/run.toml"))).is_err());
    }
}
