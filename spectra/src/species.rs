//! Species tags for spectral data.
//!
//! A series is tagged with the species it measures. The tag fixes the
//! particle rest mass used by the phase space density conversion; wave
//! (frequency) products carry no mass and no velocity-space quantities.

use crate::constants::{HELIUM_AMU, OXYGEN_AMU, SI};

/// The measured species of a spectral series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Species {
    /// Wave products binned by frequency rather than energy
    Frequency,
    Electron,
    Proton,
    Helium,
    Oxygen,
    MolecularOxygen,
}

impl Species {
    /// Parse one of the conventional product tags
    /// (`freq`, `e`, `H`, `He`, `O`, `O2`).
    ///
    /// Unrecognised tags default to `Electron`.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "freq" => Species::Frequency,
            "H" => Species::Proton,
            "He" => Species::Helium,
            "O" => Species::Oxygen,
            "O2" => Species::MolecularOxygen,
            _ => Species::Electron,
        }
    }

    /// Rest mass in kg, or `None` for frequency products.
    pub fn mass(&self) -> Option<f64> {
        match self {
            Species::Frequency => None,
            Species::Electron => Some(SI::ELECTRON_MASS),
            Species::Proton => Some(SI::PROTON_MASS),
            Species::Helium => Some(HELIUM_AMU * SI::ATOMIC_MASS_UNIT),
            Species::Oxygen => Some(OXYGEN_AMU * SI::ATOMIC_MASS_UNIT),
            Species::MolecularOxygen => Some(2.0 * OXYGEN_AMU * SI::ATOMIC_MASS_UNIT),
        }
    }

    /// True for species with a rest mass, i.e. everything except `Frequency`.
    pub fn is_particle(&self) -> bool {
        self.mass().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_parsing() {
        assert_eq!(Species::from_tag("freq"), Species::Frequency);
        assert_eq!(Species::from_tag("e"), Species::Electron);
        assert_eq!(Species::from_tag("H"), Species::Proton);
        assert_eq!(Species::from_tag("He"), Species::Helium);
        assert_eq!(Species::from_tag("O"), Species::Oxygen);
        assert_eq!(Species::from_tag("O2"), Species::MolecularOxygen);
    }

    #[test]
    fn test_unknown_tag_defaults_to_electron() {
        assert_eq!(Species::from_tag("ions?"), Species::Electron);
        assert_eq!(Species::from_tag(""), Species::Electron);
    }

    #[test]
    fn test_masses() {
        assert!(Species::Frequency.mass().is_none());
        assert!(!Species::Frequency.is_particle());
        assert_eq!(Species::Electron.mass(), Some(SI::ELECTRON_MASS));

        // O2 is exactly two oxygen masses
        let o = Species::Oxygen.mass().unwrap();
        let o2 = Species::MolecularOxygen.mass().unwrap();
        assert_eq!(o2, 2.0 * o);
    }
}
