//! Shared numeric constants for source placement and card writing.

pub const PI: f64 = std::f64::consts::PI;
pub const PI2: f64 = 2.0 * PI;
pub const RADDEG: f64 = 180.0 / PI;
pub const DEGRAD: f64 = PI / 180.0;

/// Tolerance used when deciding whether a vector is aligned with a world axis.
pub const ZERO_TOL: f64 = 1.0e-5;
/// Rotation round-off below this is written as an exact zero.
pub const ROUND_OFF_TOL: f64 = 1.0e-12;
/// Fractions below this are treated as an exact hit on a table boundary.
pub const CUT_TOL: f64 = 1.0e-12;

pub const MEV_PER_GEV: f64 = 1.0e3;
pub const MRAD_PER_RAD: f64 = 1.0e3;
/// FLUKA treats any divergence above 2000*pi mrad as isotropic.
pub const FLUKA_ISOTROPIC_MRAD: f64 = 2.0e3 * PI;
/// Electron rest mass energy in MeV.
pub const ELECTRON_MASS_MEV: f64 = 0.510_998_95;
/// Critical photon energy prefactor: Ec[keV] = 0.665 E[GeV]^2 B[T].
pub const CRITICAL_ENERGY_KEV: f64 = 0.665;

#[cfg(test)]
mod tests {
    use super::{DEGRAD, FLUKA_ISOTROPIC_MRAD, PI, PI2, RADDEG};

    #[test]
    fn angle_conversions_are_inverse() {
        assert!((PI2 - 2.0 * PI).abs() <= 1.0e-15);
        assert!((RADDEG * DEGRAD - 1.0).abs() <= 1.0e-15);
        assert!((90.0 * DEGRAD - PI / 2.0).abs() <= 1.0e-15);
        assert!(FLUKA_ISOTROPIC_MRAD > 6283.0);
    }
}
