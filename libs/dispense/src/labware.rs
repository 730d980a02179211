//! Labware and well addressing.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::DispenseError;

/// Rows are labelled `A` to `Z`.
pub const MAX_ROWS: u8 = 26;

/// A well label such as `A1` (row letter, 1-based column).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WellName {
    /// Zero-based row (`A` = 0).
    row: u8,
    /// Zero-based column (`1` = 0).
    column: u8,
}

impl WellName {
    /// Build from zero-based row and column indices. `row` must be below
    /// [`MAX_ROWS`].
    pub fn from_indices(row: u8, column: u8) -> Self {
        Self { row, column }
    }

    pub fn row(&self) -> u8 {
        self.row
    }

    pub fn column(&self) -> u8 {
        self.column
    }
}

impl FromStr for WellName {
    type Err = DispenseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DispenseError::InvalidWell(s.to_string());
        let trimmed = s.trim();

        let mut chars = trimmed.chars();
        let letter = chars.next().ok_or_else(invalid)?.to_ascii_uppercase();
        if !letter.is_ascii_uppercase() {
            return Err(invalid());
        }

        let number: u8 = chars.as_str().parse().map_err(|_| invalid())?;
        if number == 0 {
            return Err(invalid());
        }

        Ok(Self {
            row: letter as u8 - b'A',
            column: number - 1,
        })
    }
}

impl TryFrom<String> for WellName {
    type Error = DispenseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<WellName> for String {
    fn from(value: WellName) -> Self {
        value.to_string()
    }
}

impl fmt::Display for WellName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", (b'A' + self.row) as char, self.column + 1)
    }
}

/// A piece of labware on the deck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Labware {
    /// Labware definition name, e.g. `nest_12_reservoir_15ml`.
    pub load_name: String,
    /// Deck slot (1-11).
    pub slot: u8,
    pub rows: u8,
    pub columns: u8,
}

impl Labware {
    pub fn new(load_name: impl Into<String>, slot: u8, rows: u8, columns: u8) -> Self {
        Self {
            load_name: load_name.into(),
            slot,
            rows,
            columns,
        }
    }

    /// A 96-well plate (8 x 12).
    pub fn plate_96(load_name: impl Into<String>, slot: u8) -> Self {
        Self::new(load_name, slot, 8, 12)
    }

    /// A 12-channel reservoir (1 x 12).
    pub fn reservoir_12(load_name: impl Into<String>, slot: u8) -> Self {
        Self::new(load_name, slot, 1, 12)
    }

    /// A 24-tube rack (4 x 6).
    pub fn tube_rack_24(load_name: impl Into<String>, slot: u8) -> Self {
        Self::new(load_name, slot, 4, 6)
    }

    /// Check that every well has a label: 1 to [`MAX_ROWS`] rows and at
    /// least one column.
    pub fn validate(&self) -> Result<(), DispenseError> {
        if (1..=MAX_ROWS).contains(&self.rows) && self.columns > 0 {
            Ok(())
        } else {
            Err(DispenseError::InvalidGeometry {
                labware: self.load_name.clone(),
                rows: self.rows,
                columns: self.columns,
            })
        }
    }

    /// Number of wells.
    pub fn well_count(&self) -> usize {
        usize::from(self.rows) * usize::from(self.columns)
    }

    /// All wells, column by column (`A1, B1, ... H1, A2, ...`).
    pub fn wells(&self) -> Vec<WellName> {
        let rows = self.rows.min(MAX_ROWS);
        (0..self.columns)
            .flat_map(move |column| (0..rows).map(move |row| WellName::from_indices(row, column)))
            .collect()
    }

    /// Location of a well, checked against the labware geometry.
    pub fn well(&self, name: WellName) -> Result<Location, DispenseError> {
        if name.row >= self.rows || name.column >= self.columns {
            return Err(DispenseError::WellOutOfRange {
                well: name.to_string(),
                labware: self.load_name.clone(),
                rows: self.rows,
                columns: self.columns,
            });
        }
        Ok(Location {
            labware: self.load_name.clone(),
            slot: self.slot,
            well: name,
            position: WellPosition::Default,
        })
    }

    /// Location of a well given by label.
    pub fn well_by_name(&self, name: &str) -> Result<Location, DispenseError> {
        self.well(name.parse()?)
    }
}

/// Where in the well liquid is aspirated or dispensed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WellPosition {
    /// The SDK default (near the bottom).
    #[default]
    Default,
    /// The top of the well.
    Top,
}

/// A well on a specific piece of labware.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub labware: String,
    pub slot: u8,
    pub well: WellName,
    #[serde(default)]
    pub position: WellPosition,
}

impl Location {
    /// The same well, addressed at its top.
    pub fn top(&self) -> Self {
        Self {
            position: WellPosition::Top,
            ..self.clone()
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]@{}", self.labware, self.well, self.slot)?;
        if self.position == WellPosition::Top {
            write!(f, " top")?;
        }
        Ok(())
    }
}
