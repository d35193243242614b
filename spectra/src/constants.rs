//! Physical constants for particle energy and flux conversions.

/// Constants in SI units
pub struct SI {}

impl SI {
    /// Elementary charge
    /// Units: 1.6022e-19 C
    pub const ELEMENTARY_CHARGE: f64 = 1.6022e-19;

    /// Electron rest mass
    /// Units: 9.10938356e-31 kg
    pub const ELECTRON_MASS: f64 = 9.10938356e-31;

    /// Proton rest mass
    /// Units: 1.6726219e-27 kg
    pub const PROTON_MASS: f64 = 1.6726219e-27;

    /// Atomic mass unit
    /// Units: 1.6605e-27 kg
    pub const ATOMIC_MASS_UNIT: f64 = 1.6605e-27;
}

/// Relative atomic mass of helium
pub const HELIUM_AMU: f64 = 4.002602;

/// Relative atomic mass of oxygen
pub const OXYGEN_AMU: f64 = 15.999;
