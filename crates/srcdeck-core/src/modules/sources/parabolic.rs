use super::base::SourceBase;
use super::direction_components;
use super::rectangle::transverse_components;
use crate::common::geometry::CoordinateFrame;
use crate::common::values::ValueTable;
use crate::domain::{SourceError, SourceKind, SourceResult};
use crate::modules::card::SourceCard;
use crate::modules::distribution::{SourceInfo, SourceProb};
use crate::modules::record::SourceData;
use crate::modules::traits::{CardEmitter, McnpEmitter};

/// Beam whose transverse density falls off as `1 - |x/half|^power`,
/// tabulated point-wise across the width and height.
#[derive(Debug, Clone, PartialEq)]
pub struct ParabolicSource {
    pub width: f64,
    pub height: f64,
    pub n_width: usize,
    pub n_height: usize,
    pub decay_power: f64,
    pub angle_spread: f64,
}

impl Default for ParabolicSource {
    fn default() -> Self {
        Self {
            width: 1.0,
            height: 1.0,
            n_width: 10,
            n_height: 10,
            decay_power: 2.0,
            angle_spread: 0.0,
        }
    }
}

impl ParabolicSource {
    /// Recognized keys: `<key>Width`, `<key>Height`, `<key>NWidth`,
    /// `<key>NHeight`, `<key>DecayPower`, `<key>ASpread`.
    pub fn from_table(table: &ValueTable, key: &str) -> SourceResult<Self> {
        let mut source = Self::default();
        source.populate(table, key)?;
        Ok(source)
    }
}

/// `n + 1` evenly spaced points across `extent` about `centre`.
pub(crate) fn parabolic_record(
    index: usize,
    centre: f64,
    extent: f64,
    steps: usize,
    power: f64,
) -> SourceData {
    let half = extent / 2.0;
    let step = extent / steps as f64;
    let mut xs = Vec::with_capacity(steps + 1);
    let mut ps = Vec::with_capacity(steps + 1);
    for point in 0..=steps {
        let offset = -half + step * point as f64;
        xs.push(centre + offset);
        ps.push((1.0 - (offset / half).abs().powf(power)).max(0.0));
    }
    let mut prob = SourceProb::from_values(ps);
    prob.normalize();
    SourceData::new(index)
        .with_info(SourceInfo::from_values('a', xs))
        .with_prob(prob)
}

impl CardEmitter for ParabolicSource {
    const KIND: SourceKind = SourceKind::Parabolic;

    fn populate(&mut self, table: &ValueTable, key: &str) -> SourceResult<()> {
        self.width = table.evaluate_or(&format!("{key}Width"), self.width)?;
        self.height = table.evaluate_or(&format!("{key}Height"), self.height)?;
        self.n_width = table.evaluate_or(&format!("{key}NWidth"), self.n_width)?;
        self.n_height = table.evaluate_or(&format!("{key}NHeight"), self.n_height)?;
        self.decay_power = table.evaluate_or(&format!("{key}DecayPower"), self.decay_power)?;
        self.angle_spread = table.evaluate_or(&format!("{key}ASpread"), self.angle_spread)?;
        if self.width <= 0.0 || self.height <= 0.0 {
            return Err(SourceError::configuration(
                "CONFIG.BEAM_WIDTH",
                format!("{key}Width and {key}Height must be positive"),
            ));
        }
        if self.n_width < 2 || self.n_height < 2 {
            return Err(SourceError::configuration(
                "CONFIG.SAMPLE_COUNT",
                format!("{key}NWidth and {key}NHeight need at least two steps"),
            ));
        }
        if self.decay_power <= 0.0 {
            return Err(SourceError::configuration(
                "CONFIG.DECAY_POWER",
                format!("{key}DecayPower must be positive (got {})", self.decay_power),
            ));
        }
        Ok(())
    }

    fn needs_transform(&self, frame: &CoordinateFrame) -> bool {
        !frame.is_axis_aligned()
    }
}

impl McnpEmitter for ParabolicSource {
    fn create_source(&self, base: &SourceBase, card: &mut SourceCard) -> SourceResult<()> {
        base.particle_components(card);
        base.energy_components(card, 4)?;
        let extents = [(self.width, self.n_width), (self.height, self.n_height)];
        let axis = transverse_components(base, card, |index, centre, slot| {
            let (extent, steps) = extents[slot];
            Ok(parabolic_record(index, centre, extent, steps, self.decay_power))
        })?;
        direction_components(card, axis, self.angle_spread, 3);
        Ok(())
    }
}
