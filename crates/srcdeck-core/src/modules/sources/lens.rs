use super::base::SourceBase;
use super::beam::disk_record;
use crate::common::values::ValueTable;
use crate::domain::{SourceError, SourceKind, SourceResult};
use crate::modules::card::SourceCard;
use crate::modules::traits::{CardEmitter, McnpEmitter};

/// Annular emitter behind a focusing lens: radius uniform in area between
/// the two radii, Lambertian (`p(mu) ~ mu`) into the forward hemisphere.
#[derive(Debug, Clone, PartialEq)]
pub struct LensSource {
    pub inner_radius: f64,
    pub outer_radius: f64,
}

impl Default for LensSource {
    fn default() -> Self {
        Self {
            inner_radius: 0.0,
            outer_radius: 1.0,
        }
    }
}

impl LensSource {
    /// Recognized keys: `<key>InnerRadius`, `<key>OuterRadius`.
    pub fn from_table(table: &ValueTable, key: &str) -> SourceResult<Self> {
        let mut source = Self::default();
        source.populate(table, key)?;
        Ok(source)
    }
}

impl CardEmitter for LensSource {
    const KIND: SourceKind = SourceKind::Lens;

    fn populate(&mut self, table: &ValueTable, key: &str) -> SourceResult<()> {
        self.inner_radius = table.evaluate_or(&format!("{key}InnerRadius"), self.inner_radius)?;
        self.outer_radius = table.evaluate_or(&format!("{key}OuterRadius"), self.outer_radius)?;
        if self.inner_radius < 0.0 || self.outer_radius <= self.inner_radius {
            return Err(SourceError::configuration(
                "CONFIG.BEAM_RADIUS",
                format!("{key}OuterRadius must exceed {key}InnerRadius >= 0"),
            ));
        }
        Ok(())
    }
}

impl McnpEmitter for LensSource {
    fn create_source(&self, base: &SourceBase, card: &mut SourceCard) -> SourceResult<()> {
        let frame = base.frame();
        base.particle_components(card);
        base.energy_components(card, 3)?;
        card.set_comp("pos", frame.origin);
        card.set_comp("axs", frame.y);
        card.set_comp("vec", frame.y);
        card.set_data(
            "rad",
            disk_record(1, self.inner_radius, self.outer_radius)?,
        );
        // p(mu) ~ mu on [0, 1]: the same -21 law as the radial record
        card.set_data("dir", disk_record(2, 0.0, 1.0)?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::LensSource;
    use crate::common::values::ValueTable;
    use crate::modules::card::SourceCard;
    use crate::modules::distribution::ParametricLaw;
    use crate::modules::sources::{BaseDefaults, SourceBase};
    use crate::modules::traits::McnpEmitter;

    #[test]
    fn annulus_with_lambertian_direction() {
        let source = LensSource {
            inner_radius: 2.0,
            outer_radius: 5.0,
        };
        let base = SourceBase::new("lens", BaseDefaults::default());
        let mut card = SourceCard::new();
        card.set_active();
        source.create_source(&base, &mut card).expect("create");

        let rad = card.data("rad").expect("rad");
        assert_eq!(rad.info().expect("si").values(), [2.0, 5.0]);
        let dir = card.data("dir").expect("dir");
        assert_eq!(dir.info().expect("si").values(), [0.0, 1.0]);
        let mut out = String::new();
        card.write(&mut out).expect("write");
        assert!(out.contains("sp1 -21 1.0\n"));
        assert!(out.contains("si2 0.0 1.0\nsp2 -21 1.0\n"));
        assert_eq!(dir.prob().expect("sp").law(), Some(ParametricLaw::PowerLaw));
    }

    #[test]
    fn outer_radius_must_exceed_inner() {
        let mut table = ValueTable::new();
        table.add_variable("lensInnerRadius", 3.0);
        table.add_variable("lensOuterRadius", 3.0);
        let error = LensSource::from_table(&table, "lens").expect_err("radii");
        assert_eq!(error.placeholder(), "CONFIG.BEAM_RADIUS");
    }
}
