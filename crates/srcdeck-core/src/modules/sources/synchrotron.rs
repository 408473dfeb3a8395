use super::base::{BaseDefaults, SourceBase};
use crate::common::constants::{CRITICAL_ENERGY_KEV, ELECTRON_MASS_MEV, MEV_PER_GEV};
use crate::common::particle::Particle;
use crate::common::values::ValueTable;
use crate::domain::{SourceError, SourceKind, SourceResult};
use crate::modules::card::SourceCard;
use crate::modules::dependent::DsTerm;
use crate::modules::distribution::{SourceInfo, SourceProb};
use crate::modules::record::SourceData;
use crate::modules::traits::{CardEmitter, McnpEmitter};
use tracing::debug;

const KEV_PER_MEV: f64 = 1.0e3;

/// Bending-magnet photon beam: spectrum from the electron energy and field,
/// with the opening angle of each energy bin as a dependent cosine.
#[derive(Debug, Clone, PartialEq)]
pub struct SynchrotronSource {
    /// Electron energy in GeV.
    pub electron_energy: f64,
    /// Dipole field in tesla.
    pub magnetic_field: f64,
    pub low_kev: f64,
    pub high_kev: f64,
    pub n_points: usize,
}

impl Default for SynchrotronSource {
    fn default() -> Self {
        Self {
            electron_energy: 3.0,
            magnetic_field: 0.5,
            low_kev: 1.0,
            high_kev: 100.0,
            n_points: 20,
        }
    }
}

/// `G1(y) ~ 1.8 y^0.3 exp(-y)`, good to a few percent over the useful range.
pub fn g1_approx(y: f64) -> f64 {
    1.8 * y.powf(0.3) * (-y).exp()
}

impl SynchrotronSource {
    /// Recognized keys: `<key>ElectronEnergy`, `<key>MagField`,
    /// `<key>KeVMin`, `<key>KeVMax`, `<key>NPoints`.
    pub fn from_table(table: &ValueTable, key: &str) -> SourceResult<Self> {
        let mut source = Self::default();
        source.populate(table, key)?;
        Ok(source)
    }

    pub fn critical_kev(&self) -> f64 {
        CRITICAL_ENERGY_KEV * self.electron_energy * self.electron_energy * self.magnetic_field
    }

    pub fn gamma(&self) -> f64 {
        self.electron_energy * MEV_PER_GEV / ELECTRON_MASS_MEV
    }

    /// Log-spaced bin edges in keV.
    pub fn energy_edges_kev(&self) -> Vec<f64> {
        let ratio = (self.high_kev / self.low_kev).ln() / self.n_points as f64;
        (0..=self.n_points)
            .map(|point| self.low_kev * (ratio * point as f64).exp())
            .collect()
    }

    /// Photon count per bin (number spectrum `G1(y)/y` times bin width).
    pub fn bin_weights(&self, edges: &[f64]) -> Vec<f64> {
        let critical = self.critical_kev();
        edges
            .windows(2)
            .map(|pair| {
                let mid = 0.5 * (pair[0] + pair[1]);
                let y = mid / critical;
                g1_approx(y) / y * (pair[1] - pair[0])
            })
            .collect()
    }

    /// Characteristic vertical opening angle `(Ec/E)^(1/3) / gamma`.
    pub fn opening_angle(&self, energy_kev: f64) -> f64 {
        (self.critical_kev() / energy_kev).cbrt() / self.gamma()
    }
}

impl CardEmitter for SynchrotronSource {
    const KIND: SourceKind = SourceKind::Synchrotron;

    fn base_defaults() -> BaseDefaults {
        BaseDefaults {
            particle: Particle::Photon,
            energy: 0.01,
        }
    }

    fn populate(&mut self, table: &ValueTable, key: &str) -> SourceResult<()> {
        self.electron_energy =
            table.evaluate_or(&format!("{key}ElectronEnergy"), self.electron_energy)?;
        self.magnetic_field = table.evaluate_or(&format!("{key}MagField"), self.magnetic_field)?;
        self.low_kev = table.evaluate_or(&format!("{key}KeVMin"), self.low_kev)?;
        self.high_kev = table.evaluate_or(&format!("{key}KeVMax"), self.high_kev)?;
        self.n_points = table.evaluate_or(&format!("{key}NPoints"), self.n_points)?;
        if self.electron_energy <= 0.0 || self.magnetic_field <= 0.0 {
            return Err(SourceError::configuration(
                "CONFIG.SYNCHROTRON",
                format!("{key}ElectronEnergy and {key}MagField must be positive"),
            ));
        }
        if self.low_kev <= 0.0 || self.high_kev <= self.low_kev || self.n_points == 0 {
            return Err(SourceError::configuration(
                "CONFIG.ENERGY_GRID",
                format!("{key}KeVMin < {key}KeVMax and {key}NPoints > 0 are required"),
            ));
        }
        debug!(
            key,
            critical_kev = self.critical_kev(),
            "synchrotron spectrum configured"
        );
        Ok(())
    }
}

impl McnpEmitter for SynchrotronSource {
    fn create_source(&self, base: &SourceBase, card: &mut SourceCard) -> SourceResult<()> {
        let frame = base.frame();
        let edges = self.energy_edges_kev();
        let mut weights = vec![0.0];
        weights.extend(self.bin_weights(&edges));
        let mut prob = SourceProb::from_values(weights);
        prob.normalize();

        let cosines = edges
            .iter()
            .map(|edge| self.opening_angle(*edge).cos())
            .collect::<Vec<_>>();

        base.particle_components(card);
        card.set_comp("pos", frame.origin);
        card.set_comp("vec", frame.y);
        card.set_data(
            "erg",
            SourceData::new(1)
                .with_info(SourceInfo::from_values(
                    'h',
                    edges.iter().map(|kev| kev / KEV_PER_MEV).collect(),
                ))
                .with_prob(prob),
        );
        card.set_data(
            "dir",
            SourceData::new(2).with_dependent(DsTerm::with_values('l', "erg", cosines)),
        );
        Ok(())
    }
}
