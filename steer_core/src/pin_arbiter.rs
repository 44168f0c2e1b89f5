//! Pin-ownership arbiter (§5): every hardware resource — GPIO pin, ADC
//! module, PWM timer group, I²C bus — has exactly one owner at a time.
//! Claims are granted or refused at boot (and, for the rare hot-path
//! transfer, at runtime via [`PinArbiter::transfer`]); nothing here is
//! called from inside the 100 Hz tick.

use std::collections::HashMap;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArbiterError {
    #[error("resource '{resource}' already owned by '{current_owner}'")]
    AlreadyOwned {
        resource: String,
        current_owner: String,
    },
    #[error("resource '{resource}' has no owner to release")]
    NotOwned { resource: String },
    #[error("resource '{resource}' owned by '{current_owner}', not '{requested_owner}'")]
    WrongOwner {
        resource: String,
        current_owner: String,
        requested_owner: String,
    },
    #[error("bus '{bus}' frequency conflict: held at {current_hz} Hz, requested {requested_hz} Hz")]
    FrequencyConflict {
        bus: String,
        current_hz: u32,
        requested_hz: u32,
    },
}

/// A granted claim: who owns a resource and in what mode.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Claim {
    owner_id: String,
    mode: String,
}

/// Shared-bus coherence record (ADC module / PWM timer group / I²C bus).
#[derive(Debug, Clone, Copy)]
struct BusCoherence {
    frequency_hz: u32,
    resolution_bits: u8,
}

/// Single-owner registry over an arbitrary set of named resources, plus
/// frequency/resolution coherence tracking for shared buses.
#[derive(Debug, Default)]
pub struct PinArbiter {
    claims: HashMap<String, Claim>,
    buses: HashMap<String, BusCoherence>,
}

impl PinArbiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim a pin for exclusive use. Fails if already owned by anyone
    /// else; re-claiming by the same owner in the same mode is allowed
    /// (idempotent boot-order re-entry).
    pub fn claim_pin(&mut self, pin: &str, owner_id: &str, mode: &str) -> Result<(), ArbiterError> {
        if let Some(existing) = self.claims.get(pin) {
            if existing.owner_id == owner_id && existing.mode == mode {
                return Ok(());
            }
            return Err(ArbiterError::AlreadyOwned {
                resource: pin.to_string(),
                current_owner: existing.owner_id.clone(),
            });
        }
        self.claims.insert(
            pin.to_string(),
            Claim {
                owner_id: owner_id.to_string(),
                mode: mode.to_string(),
            },
        );
        Ok(())
    }

    /// Release a pin claimed by `owner_id`.
    pub fn release_pin(&mut self, pin: &str, owner_id: &str) -> Result<(), ArbiterError> {
        match self.claims.get(pin) {
            Some(claim) if claim.owner_id == owner_id => {
                self.claims.remove(pin);
                Ok(())
            }
            Some(claim) => Err(ArbiterError::WrongOwner {
                resource: pin.to_string(),
                current_owner: claim.owner_id.clone(),
                requested_owner: owner_id.to_string(),
            }),
            None => Err(ArbiterError::NotOwned {
                resource: pin.to_string(),
            }),
        }
    }

    /// Transfer a pin from its current owner to `new_owner_id`, running
    /// `leave_safe` against the old mode before the new claim is granted.
    pub fn transfer(
        &mut self,
        pin: &str,
        new_owner_id: &str,
        new_mode: &str,
        leave_safe: impl FnOnce(&str),
    ) -> Result<(), ArbiterError> {
        let old_mode = match self.claims.get(pin) {
            Some(claim) => claim.mode.clone(),
            None => {
                return Err(ArbiterError::NotOwned {
                    resource: pin.to_string(),
                })
            }
        };
        leave_safe(&old_mode);
        self.claims.remove(pin);
        self.claim_pin(pin, new_owner_id, new_mode)
    }

    pub fn owner_of(&self, pin: &str) -> Option<&str> {
        self.claims.get(pin).map(|c| c.owner_id.as_str())
    }

    /// Claim a shared bus (ADC module / PWM timer group / I²C) at a given
    /// frequency/resolution. A later conflicting frequency is rejected,
    /// except I²C buses may raise frequency (logged, not refused) per §5.
    pub fn claim_bus(
        &mut self,
        bus: &str,
        owner_id: &str,
        mode: &str,
        frequency_hz: u32,
        resolution_bits: u8,
        is_i2c: bool,
    ) -> Result<(), ArbiterError> {
        if let Some(existing) = self.buses.get(bus).copied() {
            if existing.frequency_hz != frequency_hz {
                if is_i2c && frequency_hz > existing.frequency_hz {
                    tracing::warn!(
                        bus,
                        from_hz = existing.frequency_hz,
                        to_hz = frequency_hz,
                        "raising I2C bus frequency for new claimant"
                    );
                } else {
                    return Err(ArbiterError::FrequencyConflict {
                        bus: bus.to_string(),
                        current_hz: existing.frequency_hz,
                        requested_hz: frequency_hz,
                    });
                }
            }
        }

        self.claim_pin(bus, owner_id, mode)?;
        self.buses.insert(
            bus.to_string(),
            BusCoherence {
                frequency_hz,
                resolution_bits,
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claim_then_conflicting_claim_is_refused() {
        let mut a = PinArbiter::new();
        a.claim_pin("PA0", "was", "analog_in").unwrap();
        let err = a.claim_pin("PA0", "pwm", "pwm_out").unwrap_err();
        assert!(matches!(err, ArbiterError::AlreadyOwned { .. }));
    }

    #[test]
    fn release_then_reclaim_by_another_owner_succeeds() {
        let mut a = PinArbiter::new();
        a.claim_pin("PA0", "was", "analog_in").unwrap();
        a.release_pin("PA0", "was").unwrap();
        a.claim_pin("PA0", "pwm", "pwm_out").unwrap();
        assert_eq!(a.owner_of("PA0"), Some("pwm"));
    }

    #[test]
    fn release_by_non_owner_is_refused() {
        let mut a = PinArbiter::new();
        a.claim_pin("PA0", "was", "analog_in").unwrap();
        let err = a.release_pin("PA0", "pwm").unwrap_err();
        assert!(matches!(err, ArbiterError::WrongOwner { .. }));
    }

    #[test]
    fn transfer_runs_cleanup_then_reassigns() {
        let mut a = PinArbiter::new();
        a.claim_pin("PA0", "was", "analog_in").unwrap();
        let mut cleaned_up_mode = None;
        a.transfer("PA0", "pwm", "pwm_out", |old_mode| {
            cleaned_up_mode = Some(old_mode.to_string());
        })
        .unwrap();
        assert_eq!(cleaned_up_mode.as_deref(), Some("analog_in"));
        assert_eq!(a.owner_of("PA0"), Some("pwm"));
    }

    #[test]
    fn bus_conflicting_frequency_is_rejected() {
        let mut a = PinArbiter::new();
        a.claim_bus("adc0", "was", "adc", 1_000_000, 12, false).unwrap();
        let err = a
            .claim_bus("adc0", "current", "adc", 2_000_000, 12, false)
            .unwrap_err();
        assert!(matches!(err, ArbiterError::FrequencyConflict { .. }));
    }

    #[test]
    fn i2c_bus_allows_raising_frequency() {
        let mut a = PinArbiter::new();
        a.claim_bus("i2c0", "eeprom", "i2c", 100_000, 8, true).unwrap();
        a.release_pin("i2c0", "eeprom").unwrap();
        a.claim_bus("i2c0", "display", "i2c", 400_000, 8, true).unwrap();
    }
}
