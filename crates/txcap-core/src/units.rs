//! Unit newtypes for the quantities that flow through capacity aggregation.
//!
//! Branch ratings arrive in MVA, aggregated capacity leaves in MW, voltage
//! classes are in kV and the reactance reduction works in per-unit. Keeping
//! them apart at the type level stops a rating from being summed into a
//! capacity column before the power-factor conversion has been applied.
//!
//! ```
//! use txcap_core::units::{MegavoltAmperes, Megawatts};
//!
//! let rating = MegavoltAmperes(1000.0);
//! let capacity: Megawatts = rating.active_power(0.97);
//! assert!((capacity.value() - 970.0).abs() < 1e-9);
//! ```

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Div, Mul, Sub};

/// Arithmetic shared by every unit type.
macro_rules! impl_unit_ops {
    ($type:ty, $unit_name:literal) => {
        impl Add for $type {
            type Output = Self;
            fn add(self, rhs: Self) -> Self::Output {
                Self(self.0 + rhs.0)
            }
        }

        impl AddAssign for $type {
            fn add_assign(&mut self, rhs: Self) {
                self.0 += rhs.0;
            }
        }

        impl Sub for $type {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self::Output {
                Self(self.0 - rhs.0)
            }
        }

        impl Mul<f64> for $type {
            type Output = Self;
            fn mul(self, rhs: f64) -> Self::Output {
                Self(self.0 * rhs)
            }
        }

        impl Div<f64> for $type {
            type Output = Self;
            fn div(self, rhs: f64) -> Self::Output {
                Self(self.0 / rhs)
            }
        }

        impl std::fmt::Display for $type {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{:.4} {}", self.0, $unit_name)
            }
        }

        impl $type {
            /// Create a new value
            #[inline]
            pub const fn new(value: f64) -> Self {
                Self(value)
            }

            /// Get the raw numeric value
            #[inline]
            pub const fn value(self) -> f64 {
                self.0
            }

            /// Check if value is finite
            #[inline]
            pub fn is_finite(self) -> bool {
                self.0.is_finite()
            }

            /// Minimum of two values
            #[inline]
            pub fn min(self, other: Self) -> Self {
                Self(self.0.min(other.0))
            }
        }

        impl std::iter::Sum for $type {
            fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
                Self(iter.map(|x| x.0).sum())
            }
        }

        impl<'a> std::iter::Sum<&'a $type> for $type {
            fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
                Self(iter.map(|x| x.0).sum())
            }
        }
    };
}

// =============================================================================
// Power Units
// =============================================================================

/// Active power in megawatts (MW)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Megawatts(pub f64);

impl_unit_ops!(Megawatts, "MW");

/// Apparent power in megavolt-amperes (MVA)
///
/// Branch thermal ratings (rateA/B/C) are expressed in MVA. A rating of
/// exactly zero means "not specified" in MATPOWER tables.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct MegavoltAmperes(pub f64);

impl_unit_ops!(MegavoltAmperes, "MVA");

impl MegavoltAmperes {
    /// Extract active power given power factor: P = S × pf
    #[inline]
    pub fn active_power(self, power_factor: f64) -> Megawatts {
        Megawatts(self.0 * power_factor)
    }
}

// =============================================================================
// Voltage Units
// =============================================================================

/// Nominal voltage in kilovolts (kV)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Kilovolts(pub f64);

impl_unit_ops!(Kilovolts, "kV");

// =============================================================================
// Impedance Units
// =============================================================================

/// Series reactance in per-unit (pu)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct ReactancePu(pub f64);

impl_unit_ops!(ReactancePu, "pu");

/// Series susceptance in per-unit (pu), B = 1/x
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct SusceptancePu(pub f64);

impl_unit_ops!(SusceptancePu, "pu");

impl ReactancePu {
    /// Reciprocal susceptance, `None` for a zero or non-finite reactance.
    #[inline]
    pub fn to_susceptance(self) -> Option<SusceptancePu> {
        if self.0 == 0.0 || !self.0.is_finite() {
            None
        } else {
            Some(SusceptancePu(1.0 / self.0))
        }
    }
}

impl SusceptancePu {
    /// Equivalent reactance of parallel circuits, `None` when the summed
    /// susceptance is zero or non-finite.
    #[inline]
    pub fn to_reactance(self) -> Option<ReactancePu> {
        if self.0 == 0.0 || !self.0.is_finite() {
            None
        } else {
            Some(ReactancePu(1.0 / self.0))
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_megawatts_arithmetic() {
        let p1 = Megawatts(100.0);
        let p2 = Megawatts(50.0);

        assert_eq!((p1 + p2).value(), 150.0);
        assert_eq!((p1 - p2).value(), 50.0);
        assert_eq!((p1 * 2.0).value(), 200.0);
        assert_eq!((p1 / 2.0).value(), 50.0);
    }

    #[test]
    fn test_active_power_from_rating() {
        let s = MegavoltAmperes(1000.0);
        assert!((s.active_power(0.97).value() - 970.0).abs() < 1e-10);
    }

    #[test]
    fn test_reactance_susceptance() {
        let x = ReactancePu(0.1);
        let b = x.to_susceptance().unwrap();
        assert!((b.value() - 10.0).abs() < 1e-10);
        assert!((b.to_reactance().unwrap().value() - 0.1).abs() < 1e-10);
    }

    #[test]
    fn test_zero_reactance_is_undefined() {
        assert!(ReactancePu(0.0).to_susceptance().is_none());
        assert!(SusceptancePu(0.0).to_reactance().is_none());
        assert!(ReactancePu(f64::NAN).to_susceptance().is_none());
    }

    #[test]
    fn test_sum_iterator() {
        let powers = vec![Megawatts(10.0), Megawatts(20.0), Megawatts(30.0)];
        let total: Megawatts = powers.iter().sum();

        assert_eq!(total.value(), 60.0);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Megawatts(100.0)), "100.0000 MW");
        assert_eq!(format!("{}", Kilovolts(230.0)), "230.0000 kV");
    }
}
