//! Conversion between differential energy flux and phase space density.
//!
//! Fluxes are measured in keV/(s cm² sr keV) against energy bins in keV;
//! phase space density is expressed in s³ m⁻⁶ against velocity bins in m/s.
//! PSD is invariant along a particle trajectory in the absence of sources
//! and sinks, which makes it the quantity of choice for distribution
//! function fitting.

use crate::constants::SI;

/// Fixed unit-conversion factor between flux·(m/v²) and PSD in s³ m⁻⁶.
pub const FLUX_TO_PSD: f64 = 10.0 / SI::ELEMENTARY_CHARGE;

/// Speed of a particle of the given rest mass at an energy in keV.
///
/// `v = sqrt(2·E·q/m)` with E converted from keV to J. A negative energy
/// (possible when a bin's lower bound `E - w/2` underflows zero) yields
/// `NaN`, which downstream statistics treat as missing.
pub fn velocity_from_energy(energy_kev: f64, mass_kg: f64) -> f64 {
    (2000.0 * SI::ELEMENTARY_CHARGE * energy_kev / mass_kg).sqrt()
}

/// Convert differential energy flux to phase space density.
pub fn flux_to_psd(flux: f64, velocity: f64, mass_kg: f64) -> f64 {
    flux * (mass_kg / (velocity * velocity)) * FLUX_TO_PSD
}
