use super::base::SourceBase;
use super::{direction_components, fluka_divergence, phits_direction};
use crate::common::values::ValueTable;
use crate::domain::{SourceKind, SourceResult};
use crate::modules::card::SourceCard;
use crate::modules::serialization::phits_double;
use crate::modules::traits::{CardEmitter, FlukaEmitter, McnpEmitter, PhitsEmitter};

/// Point emitter, isotropic or restricted to a cone about the local Y axis.
#[derive(Debug, Clone, PartialEq)]
pub struct PointSource {
    /// Cone half angle in degrees; 360 and above means isotropic.
    pub angle_spread: f64,
}

impl Default for PointSource {
    fn default() -> Self {
        Self {
            angle_spread: 360.0,
        }
    }
}

impl PointSource {
    /// Recognized keys: `<key>ASpread`.
    pub fn from_table(table: &ValueTable, key: &str) -> SourceResult<Self> {
        let mut source = Self::default();
        source.populate(table, key)?;
        Ok(source)
    }
}

impl CardEmitter for PointSource {
    const KIND: SourceKind = SourceKind::Point;

    fn populate(&mut self, table: &ValueTable, key: &str) -> SourceResult<()> {
        self.angle_spread = table.evaluate_or(&format!("{key}ASpread"), self.angle_spread)?;
        Ok(())
    }
}

impl McnpEmitter for PointSource {
    fn create_source(&self, base: &SourceBase, card: &mut SourceCard) -> SourceResult<()> {
        base.particle_components(card);
        base.energy_components(card, 2)?;
        card.set_comp("pos", base.frame().origin);
        direction_components(card, base.frame().y, self.angle_spread, 1);
        Ok(())
    }
}

impl PhitsEmitter for PointSource {
    fn write_phits(&self, base: &SourceBase, lines: &mut Vec<String>) -> SourceResult<()> {
        base.phits_header(1, "point source", lines);
        for name in ["x0", "y0", "r0", "z0", "z1"] {
            lines.push(phits_double(name, 0.0, ""));
        }
        phits_direction(self.angle_spread, lines);
        base.phits_energy(lines);
        Ok(())
    }
}

impl FlukaEmitter for PointSource {
    fn write_fluka(&self, base: &SourceBase, lines: &mut Vec<String>) -> SourceResult<()> {
        base.fluka_beam_cards(
            base.fluka_energy()?,
            fluka_divergence(self.angle_spread),
            [0.0, 0.0],
            false,
            lines,
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::PointSource;
    use crate::common::values::ValueTable;
    use crate::modules::card::{Component, SourceCard};
    use crate::modules::sources::{BaseDefaults, SourceBase};
    use crate::modules::traits::McnpEmitter;

    fn card_for(angle_spread: f64) -> SourceCard {
        let base = SourceBase::new("pt", BaseDefaults::default());
        let source = PointSource { angle_spread };
        let mut card = SourceCard::new();
        source.create_source(&base, &mut card).expect("create");
        card
    }

    #[test]
    fn full_sphere_omits_direction() {
        let card = card_for(360.0);
        assert!(card.component("dir").is_none());
        assert!(card.component("vec").is_none());
        assert_eq!(card.header_line(), "sdef par=n erg=14.0 pos=0.0 0.0 0.0");
    }

    #[test]
    fn zero_spread_is_a_literal_forward_direction() {
        let card = card_for(0.0);
        assert_eq!(card.component("dir"), Some(&Component::Double(1.0)));
        assert!(card.data("dir").is_none());
        assert!(card.header_line().ends_with("vec=0.0 1.0 0.0 dir=1.0"));
    }

    #[test]
    fn finite_spread_builds_cosine_table() {
        let card = card_for(60.0);
        assert_eq!(card.component("dir"), Some(&Component::Data(1)));
        let mut out = String::new();
        let mut active = card.clone();
        active.set_active();
        active.write(&mut out).expect("write");
        assert!(out.contains("si1 h 0.5 1.0\nsp1 0.0 1.0\n"));
    }

    #[test]
    fn spread_is_read_from_table() {
        let mut table = ValueTable::new();
        table.add_variable("ptASpread", 12.5);
        let source = PointSource::from_table(&table, "pt").expect("config");
        assert_eq!(source.angle_spread, 12.5);
    }
}
