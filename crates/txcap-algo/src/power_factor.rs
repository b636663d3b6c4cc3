//! MVA -> MW conversion.
//!
//! Voltage classes (lower endpoint nominal voltage):
//!
//! | Class | Power factor |
//! |-------|--------------|
//! | >= 500 kV | 0.99 |
//! | >= 230 kV | 0.97 |
//! | below 230 kV, or unknown | 0.95 |

use txcap_core::Kilovolts;

use crate::options::PowerFactorMode;

pub const PF_EHV: f64 = 0.99;
pub const PF_HV: f64 = 0.97;
pub const PF_DEFAULT_CLASS: f64 = 0.95;

const EHV_KV: f64 = 500.0;
const HV_KV: f64 = 230.0;
const KV_EPS: f64 = 1e-6;

/// Power factor of a voltage class. Unknown voltage gets the lowest class.
pub fn pf_for_kv(kv: Option<Kilovolts>) -> f64 {
    match kv.map(Kilovolts::value).filter(|v| v.is_finite()) {
        Some(v) if v >= EHV_KV - KV_EPS => PF_EHV,
        Some(v) if v >= HV_KV - KV_EPS => PF_HV,
        _ => PF_DEFAULT_CLASS,
    }
}

/// Lower of two endpoint voltages, using whichever one is known.
pub fn lower_kv(from: Option<Kilovolts>, to: Option<Kilovolts>) -> Option<Kilovolts> {
    let from = from.filter(|kv| kv.is_finite());
    let to = to.filter(|kv| kv.is_finite());
    match (from, to) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

/// Factor applied to one circuit, plus the voltage it was derived from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircuitPowerFactor {
    pub pf: f64,
    pub kv_min: Option<Kilovolts>,
}

/// Resolves the per-circuit power factor for a run.
#[derive(Debug, Clone, Copy)]
pub struct PowerFactorRule {
    mode: PowerFactorMode,
    voltages_known: bool,
}

impl PowerFactorRule {
    /// `voltages_known` is false when the bus table has no nominal-voltage
    /// column; by-voltage mode then degrades to a factor of 1.0.
    pub fn new(mode: PowerFactorMode, voltages_known: bool) -> Self {
        Self {
            mode,
            voltages_known,
        }
    }

    /// True when by-voltage mode was requested but cannot be honored.
    pub fn is_degraded(&self) -> bool {
        self.mode.is_by_voltage() && !self.voltages_known
    }

    pub fn for_circuit(
        &self,
        from: Option<Kilovolts>,
        to: Option<Kilovolts>,
    ) -> CircuitPowerFactor {
        match self.mode {
            PowerFactorMode::None => CircuitPowerFactor {
                pf: 1.0,
                kv_min: None,
            },
            PowerFactorMode::Constant(pf) => CircuitPowerFactor { pf, kv_min: None },
            PowerFactorMode::ByVoltage if !self.voltages_known => CircuitPowerFactor {
                pf: 1.0,
                kv_min: None,
            },
            PowerFactorMode::ByVoltage => {
                let kv_min = lower_kv(from, to);
                CircuitPowerFactor {
                    pf: pf_for_kv(kv_min),
                    kv_min,
                }
            }
        }
    }
}
