//! Caller options for a run.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use txcap_core::TxcapError;

/// Which thermal rating a branch contributes, with fallbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RatingPreference {
    #[default]
    A,
    B,
    C,
}

/// One of the three MATPOWER rating columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingColumn {
    RateA,
    RateB,
    RateC,
}

impl RatingPreference {
    /// Columns tried in order. B falls back to A before C, and C falls back
    /// to B before A.
    pub fn ladder(&self) -> [RatingColumn; 3] {
        use RatingColumn::*;
        match self {
            RatingPreference::A => [RateA, RateB, RateC],
            RatingPreference::B => [RateB, RateA, RateC],
            RatingPreference::C => [RateC, RateB, RateA],
        }
    }
}

impl FromStr for RatingPreference {
    type Err = TxcapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(RatingPreference::A),
            "B" => Ok(RatingPreference::B),
            "C" => Ok(RatingPreference::C),
            other => Err(TxcapError::InvalidOption(format!(
                "rating preference must be A, B or C, got '{other}'"
            ))),
        }
    }
}

impl fmt::Display for RatingPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            RatingPreference::A => "A",
            RatingPreference::B => "B",
            RatingPreference::C => "C",
        };
        f.write_str(letter)
    }
}

/// MVA -> MW conversion rule.
///
/// Parsed from `none`, `const:<pf>` or `bykv`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PowerFactorMode {
    /// Ratings are taken as MW (DC transport convention)
    #[default]
    None,
    /// One power factor for every circuit
    Constant(f64),
    /// Power factor by the lower endpoint voltage class
    ByVoltage,
}

impl PowerFactorMode {
    pub fn is_by_voltage(&self) -> bool {
        matches!(self, PowerFactorMode::ByVoltage)
    }
}

impl FromStr for PowerFactorMode {
    type Err = TxcapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let lower = trimmed.to_ascii_lowercase();
        if lower == "none" {
            return Ok(PowerFactorMode::None);
        }
        if lower == "bykv" {
            return Ok(PowerFactorMode::ByVoltage);
        }
        if let Some(value) = lower.strip_prefix("const:") {
            let pf: f64 = value.trim().parse().map_err(|_| {
                TxcapError::InvalidOption(format!("power factor in '{trimmed}' is not a number"))
            })?;
            if !(pf > 0.0 && pf <= 1.0) {
                return Err(TxcapError::InvalidOption(format!(
                    "power factor must be in (0, 1], got {pf}"
                )));
            }
            return Ok(PowerFactorMode::Constant(pf));
        }
        Err(TxcapError::InvalidOption(format!(
            "power factor mode must be none, const:<pf> or bykv, got '{trimmed}'"
        )))
    }
}

impl fmt::Display for PowerFactorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PowerFactorMode::None => f.write_str("none"),
            PowerFactorMode::Constant(pf) => write!(f, "const:{pf}"),
            PowerFactorMode::ByVoltage => f.write_str("bykv"),
        }
    }
}

impl TryFrom<String> for PowerFactorMode {
    type Error = TxcapError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PowerFactorMode> for String {
    fn from(mode: PowerFactorMode) -> Self {
        mode.to_string()
    }
}

/// Aggregation switches. Defaults: rating A, ratings taken as MW,
/// transformers excluded, intra-county circuits dropped, HVDC included.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationOptions {
    pub rate: RatingPreference,
    pub pf: PowerFactorMode,
    pub include_transformers: bool,
    pub keep_intra_county: bool,
    pub include_hvdc: bool,
}

impl Default for AggregationOptions {
    fn default() -> Self {
        Self {
            rate: RatingPreference::A,
            pf: PowerFactorMode::None,
            include_transformers: false,
            keep_intra_county: false,
            include_hvdc: true,
        }
    }
}
