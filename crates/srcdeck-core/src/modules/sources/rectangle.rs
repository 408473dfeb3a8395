use super::base::SourceBase;
use super::{direction_components, fluka_divergence, phits_direction};
use crate::common::geometry::{CoordinateFrame, Vec3, WorldAxis};
use crate::common::values::ValueTable;
use crate::domain::{SourceError, SourceKind, SourceResult};
use crate::modules::card::SourceCard;
use crate::modules::distribution::{SourceInfo, SourceProb};
use crate::modules::record::SourceData;
use crate::modules::serialization::phits_double;
use crate::modules::traits::{CardEmitter, FlukaEmitter, McnpEmitter, PhitsEmitter};

/// Flat rectangular beam: `width` across local X, `height` across local Z.
#[derive(Debug, Clone, PartialEq)]
pub struct RectangleSource {
    pub width: f64,
    pub height: f64,
    pub angle_spread: f64,
}

impl Default for RectangleSource {
    fn default() -> Self {
        Self {
            width: 1.0,
            height: 1.0,
            angle_spread: 0.0,
        }
    }
}

impl RectangleSource {
    /// Recognized keys: `<key>Width`, `<key>Height`, `<key>ASpread`.
    pub fn from_table(table: &ValueTable, key: &str) -> SourceResult<Self> {
        let mut source = Self::default();
        source.populate(table, key)?;
        Ok(source)
    }
}

/// Uniform `si h lo hi` / `sp 0 1` record.
pub(crate) fn flat_record(index: usize, centre: f64, extent: f64) -> SourceData {
    SourceData::new(index)
        .with_info(SourceInfo::from_values(
            'h',
            vec![centre - extent / 2.0, centre + extent / 2.0],
        ))
        .with_prob(SourceProb::from_values(vec![0.0, 1.0]))
}

/// Place the two transverse records and a literal on the beam axis.
/// `build(index, centre, slot)` makes the record for local X (slot 0) or
/// local Z (slot 1). Returns the direction vector for the card.
pub(crate) fn transverse_components(
    base: &SourceBase,
    card: &mut SourceCard,
    build: impl Fn(usize, f64, usize) -> SourceResult<SourceData>,
) -> SourceResult<Vec3> {
    if base.transform().is_some() {
        card.set_data("x", build(1, 0.0, 0)?);
        card.set_comp("y", 0.0);
        card.set_data("z", build(2, 0.0, 1)?);
        return Ok(Vec3::Y);
    }
    let map = base.axis_map().ok_or_else(|| {
        SourceError::internal(
            "LOGIC.AXIS_ALIGNMENT",
            format!(
                "source '{}' frame is not axis aligned and has no transform",
                base.key()
            ),
        )
    })?;
    let origin = base.frame().origin;
    let mut index = 1;
    for axis in WorldAxis::ALL {
        let centre = origin.component(axis);
        let slot = if axis == map.x {
            Some(0)
        } else if axis == map.z {
            Some(1)
        } else {
            None
        };
        match slot {
            Some(slot) => {
                card.set_data(axis.name(), build(index, centre, slot)?);
                index += 1;
            }
            None => card.set_comp(axis.name(), centre),
        }
    }
    Ok(base.frame().y)
}

impl CardEmitter for RectangleSource {
    const KIND: SourceKind = SourceKind::Rectangle;

    fn populate(&mut self, table: &ValueTable, key: &str) -> SourceResult<()> {
        self.width = table.evaluate_or(&format!("{key}Width"), self.width)?;
        self.height = table.evaluate_or(&format!("{key}Height"), self.height)?;
        self.angle_spread = table.evaluate_or(&format!("{key}ASpread"), self.angle_spread)?;
        if self.width <= 0.0 || self.height <= 0.0 {
            return Err(SourceError::configuration(
                "CONFIG.BEAM_WIDTH",
                format!("{key}Width and {key}Height must be positive"),
            ));
        }
        Ok(())
    }

    fn needs_transform(&self, frame: &CoordinateFrame) -> bool {
        !frame.is_axis_aligned()
    }
}

impl McnpEmitter for RectangleSource {
    fn create_source(&self, base: &SourceBase, card: &mut SourceCard) -> SourceResult<()> {
        base.particle_components(card);
        base.energy_components(card, 4)?;
        let extents = [self.width, self.height];
        let axis = transverse_components(base, card, |index, centre, slot| {
            Ok(flat_record(index, centre, extents[slot]))
        })?;
        direction_components(card, axis, self.angle_spread, 3);
        Ok(())
    }
}

impl PhitsEmitter for RectangleSource {
    fn write_phits(&self, base: &SourceBase, lines: &mut Vec<String>) -> SourceResult<()> {
        base.phits_header(2, "rectangular beam", lines);
        lines.push(phits_double("x0", -self.height / 2.0, ""));
        lines.push(phits_double("x1", self.height / 2.0, ""));
        lines.push(phits_double("y0", -self.width / 2.0, ""));
        lines.push(phits_double("y1", self.width / 2.0, ""));
        lines.push(phits_double("z0", 0.0, ""));
        lines.push(phits_double("z1", 0.0, ""));
        phits_direction(self.angle_spread, lines);
        base.phits_energy(lines);
        Ok(())
    }
}

impl FlukaEmitter for RectangleSource {
    fn write_fluka(&self, base: &SourceBase, lines: &mut Vec<String>) -> SourceResult<()> {
        base.fluka_beam_cards(
            base.fluka_energy()?,
            fluka_divergence(self.angle_spread),
            [self.width, self.height],
            false,
            lines,
        );
        Ok(())
    }
}
