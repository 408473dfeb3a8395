use super::base::{BaseDefaults, SourceBase};
use crate::common::constants::DEGRAD;
use crate::common::particle::Particle;
use crate::common::values::ValueTable;
use crate::domain::{SourceError, SourceKind, SourceResult};
use crate::modules::card::SourceCard;
use crate::modules::dependent::{DsIndex, DsTableEntry};
use crate::modules::distribution::{SourceInfo, SourceProb};
use crate::modules::record::SourceData;
use crate::modules::traits::{CardEmitter, McnpEmitter};

/// One polar bin of the electron beam: upper opening angle, relative
/// weight and the energy scale applied to the base spectrum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngleBin {
    pub angle: f64,
    pub weight: f64,
    pub energy_scale: f64,
}

/// Electron beam whose energy spectrum depends on the polar angle bin:
/// `dir=d1` picks the bin, `erg=fdir=d2` picks the spectrum.
#[derive(Debug, Clone, PartialEq)]
pub struct TdcSource {
    pub bins: Vec<AngleBin>,
}

impl Default for TdcSource {
    fn default() -> Self {
        Self {
            bins: vec![AngleBin {
                angle: 1.0,
                weight: 1.0,
                energy_scale: 1.0,
            }],
        }
    }
}

impl TdcSource {
    /// Recognized keys: `<key>NAngle`, `<key>Angle<i>` (required per bin),
    /// `<key>AngleProb<i>`, `<key>EScale<i>`.
    pub fn from_table(table: &ValueTable, key: &str) -> SourceResult<Self> {
        let mut source = Self::default();
        source.populate(table, key)?;
        Ok(source)
    }

    /// Base spectrum scaled for one bin, cut at the base cut energy.
    fn spectrum(&self, base: &SourceBase, index: usize, scale: f64) -> SourceResult<DsTableEntry> {
        let energy = base.energy().iter().map(|e| e * scale).collect::<Vec<_>>();
        let option = if energy.len() == 1 { 'l' } else { 'a' };
        let mut prob = SourceProb::from_values(base.weights().to_vec());
        prob.normalize();
        let mut record = SourceData::new(index)
            .with_info(SourceInfo::from_values(option, energy))
            .with_prob(prob);
        if base.cut_energy() > 0.0 {
            record.cut_value(base.cut_energy())?;
        }

        let mut entry = DsTableEntry::new(index);
        entry.info = record.info().cloned();
        entry.prob = record.prob().cloned();
        Ok(entry)
    }
}

impl CardEmitter for TdcSource {
    const KIND: SourceKind = SourceKind::Tdc;

    fn base_defaults() -> BaseDefaults {
        BaseDefaults {
            particle: Particle::Electron,
            energy: 3000.0,
        }
    }

    fn populate(&mut self, table: &ValueTable, key: &str) -> SourceResult<()> {
        let count: usize = table.evaluate_or(&format!("{key}NAngle"), 0)?;
        if count == 0 {
            return Ok(());
        }
        let mut bins = Vec::with_capacity(count);
        for index in 0..count {
            bins.push(AngleBin {
                angle: table.evaluate(&format!("{key}Angle{index}"))?,
                weight: table.evaluate_or(&format!("{key}AngleProb{index}"), 1.0)?,
                energy_scale: table.evaluate_or(&format!("{key}EScale{index}"), 1.0)?,
            });
        }
        let increasing = bins.windows(2).all(|pair| pair[1].angle > pair[0].angle);
        if !increasing || bins[0].angle <= 0.0 || bins[count - 1].angle > 180.0 {
            return Err(SourceError::configuration(
                "CONFIG.ANGLE_BINS",
                format!("{key}Angle<i> must increase within (0, 180] degrees"),
            ));
        }
        self.bins = bins;
        Ok(())
    }
}

impl McnpEmitter for TdcSource {
    fn create_source(&self, base: &SourceBase, card: &mut SourceCard) -> SourceResult<()> {
        let frame = base.frame();
        base.particle_components(card);
        card.set_comp("pos", frame.origin);
        card.set_comp("vec", frame.y);

        // Cosine bins run from the widest angle up to the axis, so the
        // table is written in reverse bin order.
        let mut cosines = self
            .bins
            .iter()
            .rev()
            .map(|bin| (bin.angle * DEGRAD).cos())
            .collect::<Vec<_>>();
        cosines.push(1.0);
        let mut weights = vec![0.0];
        weights.extend(self.bins.iter().rev().map(|bin| bin.weight));
        let mut prob = SourceProb::from_values(weights);
        prob.normalize();
        card.set_data(
            "dir",
            SourceData::new(1)
                .with_info(SourceInfo::from_values('h', cosines))
                .with_prob(prob),
        );

        let mut table = DsIndex::new("dir");
        table.add_entry(DsTableEntry::new(0));
        for (offset, bin) in self.bins.iter().rev().enumerate() {
            table.add_entry(self.spectrum(base, 3 + offset, bin.energy_scale)?);
        }
        card.set_data("erg", SourceData::new(2).with_dependent(table));
        Ok(())
    }
}
