//! IC50 → pIC50 conversion.
//!
//! pIC50 is the negative decadic log of the molar IC50. For values already in
//! nanomolar this is `9 - log10(ic50)`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use ferroscreen_common::ScreenError;

const SUPPORTED_UNITS: &str = "nM, µM, mM, M";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConcentrationUnit {
    Nanomolar,
    Micromolar,
    Millimolar,
    Molar,
}

impl ConcentrationUnit {
    /// Factor converting a value in this unit to mol/L.
    pub fn molar_factor(self) -> f64 {
        match self {
            ConcentrationUnit::Nanomolar => 1e-9,
            ConcentrationUnit::Micromolar => 1e-6,
            ConcentrationUnit::Millimolar => 1e-3,
            ConcentrationUnit::Molar => 1.0,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            ConcentrationUnit::Nanomolar => "nM",
            ConcentrationUnit::Micromolar => "µM",
            ConcentrationUnit::Millimolar => "mM",
            ConcentrationUnit::Molar => "M",
        }
    }
}

impl fmt::Display for ConcentrationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for ConcentrationUnit {
    type Err = ScreenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // micro sign (U+00B5) and greek mu (U+03BC) both occur in the wild
        match s.trim() {
            "nM" => Ok(ConcentrationUnit::Nanomolar),
            "µM" | "μM" | "uM" => Ok(ConcentrationUnit::Micromolar),
            "mM" => Ok(ConcentrationUnit::Millimolar),
            "M" => Ok(ConcentrationUnit::Molar),
            other => Err(ScreenError::InvalidPotencyInput(format!(
                "Invalid unit '{other}'. Supported units are: {SUPPORTED_UNITS}."
            ))),
        }
    }
}

fn check_positive(value: f64) -> Result<(), ScreenError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ScreenError::InvalidPotencyInput("IC50 value must be a positive number.".into()))
    }
}

fn check_result(pic50: f64) -> Result<f64, ScreenError> {
    if pic50.is_finite() {
        Ok(pic50)
    } else {
        Err(ScreenError::InvalidPotencyInput(format!("pIC50 is not finite ({pic50})")))
    }
}

/// pIC50 from an IC50 in nanomolar.
pub fn convert(ic50_nm: f64) -> Result<f64, ScreenError> {
    check_positive(ic50_nm)?;
    check_result(9.0 - ic50_nm.log10())
}

/// pIC50 from an IC50 in the given unit.
pub fn convert_with_unit(value: f64, unit: &str) -> Result<f64, ScreenError> {
    let unit: ConcentrationUnit = unit.parse()?;
    check_positive(value)?;
    match unit {
        ConcentrationUnit::Nanomolar => convert(value),
        other => check_result(-(value * other.molar_factor()).log10()),
    }
}

/// pIC50 from a raw textual IC50, as served by the registry.
pub fn parse_and_convert(raw: &str, unit: &str) -> Result<f64, ScreenError> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| ScreenError::InvalidPotencyInput(format!("IC50 value '{raw}' is not numeric.")))?;
    convert_with_unit(value, unit)
}
