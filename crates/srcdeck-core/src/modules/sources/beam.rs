use super::base::SourceBase;
use super::{direction_components, fluka_divergence, phits_direction};
use crate::common::values::ValueTable;
use crate::domain::{SourceError, SourceKind, SourceResult};
use crate::modules::card::SourceCard;
use crate::modules::distribution::{ParametricLaw, SourceInfo, SourceProb};
use crate::modules::record::SourceData;
use crate::modules::serialization::phits_double;
use crate::modules::traits::{CardEmitter, FlukaEmitter, McnpEmitter, PhitsEmitter};

/// Uniform disk beam travelling along local Y.
#[derive(Debug, Clone, PartialEq)]
pub struct BeamSource {
    pub radius: f64,
    pub angle_spread: f64,
}

impl Default for BeamSource {
    fn default() -> Self {
        Self {
            radius: 1.0,
            angle_spread: 0.0,
        }
    }
}

impl BeamSource {
    /// Recognized keys: `<key>Radius`, `<key>ASpread`.
    pub fn from_table(table: &ValueTable, key: &str) -> SourceResult<Self> {
        let mut source = Self::default();
        source.populate(table, key)?;
        Ok(source)
    }
}

/// `si 0 r` with `sp -21 1`: radius density proportional to r, so uniform
/// per unit area.
pub(crate) fn disk_record(index: usize, inner: f64, outer: f64) -> SourceResult<SourceData> {
    let mut info = SourceInfo::new();
    info.set_data(vec![inner, outer]);
    Ok(SourceData::new(index)
        .with_info(info)
        .with_prob(SourceProb::from_law(ParametricLaw::PowerLaw, &[1.0])?))
}

impl CardEmitter for BeamSource {
    const KIND: SourceKind = SourceKind::Beam;

    fn populate(&mut self, table: &ValueTable, key: &str) -> SourceResult<()> {
        self.radius = table.evaluate_or(&format!("{key}Radius"), self.radius)?;
        self.angle_spread = table.evaluate_or(&format!("{key}ASpread"), self.angle_spread)?;
        if self.radius <= 0.0 {
            return Err(SourceError::configuration(
                "CONFIG.BEAM_RADIUS",
                format!("{key}Radius must be positive (got {})", self.radius),
            ));
        }
        Ok(())
    }
}

impl McnpEmitter for BeamSource {
    fn create_source(&self, base: &SourceBase, card: &mut SourceCard) -> SourceResult<()> {
        let frame = base.frame();
        base.particle_components(card);
        base.energy_components(card, 3)?;
        card.set_comp("pos", frame.origin);
        card.set_comp("axs", frame.y);
        card.set_data("rad", disk_record(1, 0.0, self.radius)?);
        direction_components(card, frame.y, self.angle_spread, 2);
        Ok(())
    }
}

impl PhitsEmitter for BeamSource {
    fn write_phits(&self, base: &SourceBase, lines: &mut Vec<String>) -> SourceResult<()> {
        base.phits_header(1, "cylindrical beam", lines);
        lines.push(phits_double("x0", 0.0, ""));
        lines.push(phits_double("y0", 0.0, ""));
        lines.push(phits_double("r0", self.radius, "radius [cm]"));
        lines.push(phits_double("z0", 0.0, ""));
        lines.push(phits_double("z1", 0.0, ""));
        phits_direction(self.angle_spread, lines);
        base.phits_energy(lines);
        Ok(())
    }
}

impl FlukaEmitter for BeamSource {
    fn write_fluka(&self, base: &SourceBase, lines: &mut Vec<String>) -> SourceResult<()> {
        base.fluka_beam_cards(
            base.fluka_energy()?,
            fluka_divergence(self.angle_spread),
            [self.radius, 0.0],
            true,
            lines,
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::BeamSource;
    use crate::common::values::ValueTable;
    use crate::modules::card::SourceCard;
    use crate::modules::sources::{BaseDefaults, SourceBase};
    use crate::modules::traits::{CardEmitter, FlukaEmitter, McnpEmitter};

    #[test]
    fn disk_radius_uses_power_law_record() {
        let base = SourceBase::new("beam", BaseDefaults::default());
        let source = BeamSource {
            radius: 2.5,
            angle_spread: 0.0,
        };
        let mut card = SourceCard::new();
        card.set_active();
        source.create_source(&base, &mut card).expect("create");

        assert_eq!(
            card.header_line(),
            "sdef par=n erg=14.0 pos=0.0 0.0 0.0 axs=0.0 1.0 0.0 rad=d1 vec=0.0 1.0 0.0 dir=1.0"
        );
        let mut out = String::new();
        card.write(&mut out).expect("write");
        assert!(out.ends_with("\nsi1 0.0 2.5\nsp1 -21 1.0\n"));
        assert!(out.lines().all(|line| line.len() <= 72));
    }

    #[test]
    fn non_positive_radius_is_rejected() {
        let mut table = ValueTable::new();
        table.add_variable("beamRadius", 0.0);
        let error = BeamSource::default()
            .populate(&table, "beam")
            .expect_err("zero radius");
        assert_eq!(error.placeholder(), "CONFIG.BEAM_RADIUS");
    }

    #[test]
    fn fluka_beam_is_annular_with_radius() {
        let base = SourceBase::new("beam", BaseDefaults::default());
        let mut lines = Vec::new();
        BeamSource::default()
            .write_fluka(&base, &mut lines)
            .expect("fluka");
        assert!(lines[0].starts_with("BEAM"));
        assert!(lines[0].ends_with("NEUTRON"));
        assert!(lines.iter().any(|line| line.starts_with("BEAMAXES")));
    }
}
