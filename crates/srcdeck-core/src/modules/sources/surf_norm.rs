use super::base::SourceBase;
use super::cone_record;
use crate::common::constants::ZERO_TOL;
use crate::common::values::ValueTable;
use crate::domain::{SourceError, SourceKind, SourceResult};
use crate::modules::card::SourceCard;
use crate::modules::traits::{CardEmitter, McnpEmitter};

/// Emission from a named surface along its outward (or inward) normal.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SurfNormSource {
    /// Surface number; zero until populated.
    pub surface: i64,
    /// `true` for the `+` sense normal.
    pub positive_normal: bool,
    /// Cone half angle about the normal in degrees. From 90 upwards the
    /// card keeps the default cosine law over the hemisphere.
    pub angle_spread: f64,
}

impl SurfNormSource {
    /// Recognized keys: `<key>Surface` (required), `<key>Normal`,
    /// `<key>ASpread`.
    pub fn from_table(table: &ValueTable, key: &str) -> SourceResult<Self> {
        let mut source = Self::default();
        source.populate(table, key)?;
        Ok(source)
    }
}

impl CardEmitter for SurfNormSource {
    const KIND: SourceKind = SourceKind::SurfNorm;

    fn populate(&mut self, table: &ValueTable, key: &str) -> SourceResult<()> {
        self.surface = table.evaluate(&format!("{key}Surface"))?;
        if self.surface == 0 {
            return Err(SourceError::configuration(
                "CONFIG.SURFACE",
                format!("{key}Surface must name a non-zero surface"),
            ));
        }
        let normal: i64 = table.evaluate_or(&format!("{key}Normal"), 1)?;
        self.positive_normal = normal >= 0;
        self.angle_spread = table.evaluate_or(&format!("{key}ASpread"), 0.0)?;
        Ok(())
    }
}

impl McnpEmitter for SurfNormSource {
    fn create_source(&self, base: &SourceBase, card: &mut SourceCard) -> SourceResult<()> {
        if self.surface == 0 {
            return Err(SourceError::validation(
                "INPUT.SURFACE",
                format!("source '{}' has no emission surface", base.key()),
            ));
        }
        base.particle_components(card);
        base.energy_components(card, 2)?;
        card.set_comp("sur", self.surface);
        card.set_comp("nrm", if self.positive_normal { 1 } else { -1 });
        if self.angle_spread.abs() < ZERO_TOL {
            card.set_comp("dir", 1.0);
        } else if self.angle_spread < 90.0 {
            card.set_data("dir", cone_record(1, self.angle_spread));
        }
        Ok(())
    }
}
