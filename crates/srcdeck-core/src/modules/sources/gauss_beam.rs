use super::base::SourceBase;
use super::rectangle::transverse_components;
use super::{direction_components, fluka_divergence, phits_direction};
use crate::common::geometry::CoordinateFrame;
use crate::common::values::ValueTable;
use crate::domain::{SourceError, SourceKind, SourceResult};
use crate::modules::card::SourceCard;
use crate::modules::distribution::{ParametricLaw, SourceProb};
use crate::modules::record::SourceData;
use crate::modules::serialization::phits_double;
use crate::modules::traits::{CardEmitter, FlukaEmitter, McnpEmitter, PhitsEmitter};

/// Beam with independent Gaussian profiles across local X and Z.
///
/// Widths are full widths at half maximum. When the placed frame lines up
/// with the world axes the profiles are written straight onto the matching
/// world coordinates; otherwise the card samples in the local frame and a
/// transform card carries it into place.
#[derive(Debug, Clone, PartialEq)]
pub struct GaussBeamSource {
    pub x_width: f64,
    pub z_width: f64,
    pub angle_spread: f64,
}

impl Default for GaussBeamSource {
    fn default() -> Self {
        Self {
            x_width: 1.0,
            z_width: 1.0,
            angle_spread: 0.0,
        }
    }
}

impl GaussBeamSource {
    /// Recognized keys: `<key>XWidth`, `<key>ZWidth`, `<key>ASpread`.
    pub fn from_table(table: &ValueTable, key: &str) -> SourceResult<Self> {
        let mut source = Self::default();
        source.populate(table, key)?;
        Ok(source)
    }
}

pub(crate) fn gaussian_record(index: usize, width: f64, centre: f64) -> SourceResult<SourceData> {
    Ok(SourceData::new(index).with_prob(SourceProb::from_law(
        ParametricLaw::Gaussian,
        &[width, centre],
    )?))
}

impl CardEmitter for GaussBeamSource {
    const KIND: SourceKind = SourceKind::GaussBeam;

    fn populate(&mut self, table: &ValueTable, key: &str) -> SourceResult<()> {
        self.x_width = table.evaluate_or(&format!("{key}XWidth"), self.x_width)?;
        self.z_width = table.evaluate_or(&format!("{key}ZWidth"), self.z_width)?;
        self.angle_spread = table.evaluate_or(&format!("{key}ASpread"), self.angle_spread)?;
        if self.x_width <= 0.0 || self.z_width <= 0.0 {
            return Err(SourceError::configuration(
                "CONFIG.BEAM_WIDTH",
                format!(
                    "{key}XWidth and {key}ZWidth must be positive (got {} and {})",
                    self.x_width, self.z_width
                ),
            ));
        }
        Ok(())
    }

    fn needs_transform(&self, frame: &CoordinateFrame) -> bool {
        !frame.is_axis_aligned()
    }
}

impl McnpEmitter for GaussBeamSource {
    fn create_source(&self, base: &SourceBase, card: &mut SourceCard) -> SourceResult<()> {
        base.particle_components(card);
        base.energy_components(card, 4)?;

        let widths = [self.x_width, self.z_width];
        let axis = transverse_components(base, card, |index, centre, slot| {
            gaussian_record(index, widths[slot], centre)
        })?;
        direction_components(card, axis, self.angle_spread, 3);
        Ok(())
    }
}

impl PhitsEmitter for GaussBeamSource {
    fn write_phits(&self, base: &SourceBase, lines: &mut Vec<String>) -> SourceResult<()> {
        base.phits_header(3, "gaussian beam", lines);
        // PHITS x' is local Z and y' is local X.
        lines.push(phits_double("x0", 0.0, ""));
        lines.push(phits_double("x1", self.z_width, "FWHM [cm]"));
        lines.push(phits_double("y0", 0.0, ""));
        lines.push(phits_double("y1", self.x_width, "FWHM [cm]"));
        lines.push(phits_double("z0", 0.0, ""));
        lines.push(phits_double("z1", 0.0, ""));
        phits_direction(self.angle_spread, lines);
        base.phits_energy(lines);
        Ok(())
    }
}

impl FlukaEmitter for GaussBeamSource {
    fn write_fluka(&self, base: &SourceBase, lines: &mut Vec<String>) -> SourceResult<()> {
        base.fluka_beam_cards(
            base.fluka_energy()?,
            fluka_divergence(self.angle_spread),
            [-self.x_width, -self.z_width],
            false,
            lines,
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::GaussBeamSource;
    use crate::common::fixed::{FixedFrame, LinkIndex};
    use crate::common::geometry::{CoordinateFrame, Vec3, WorldAxis, WorldRotation};
    use crate::common::values::ValueTable;
    use crate::modules::card::{Component, SourceCard};
    use crate::modules::sources::{BaseDefaults, SourceBase};
    use crate::modules::traits::{CardEmitter, FlukaEmitter, McnpEmitter};

    fn placed(frame: &FixedFrame, source: &GaussBeamSource) -> SourceBase {
        let mut base = SourceBase::new("gb", BaseDefaults::default());
        base.populate(&ValueTable::new()).expect("populate");
        base.place(frame, LinkIndex::ORIGIN, |f| source.needs_transform(f))
            .expect("place");
        base
    }

    #[test]
    fn aligned_beam_writes_profiles_on_world_axes() {
        let source = GaussBeamSource {
            x_width: 5.887,
            z_width: 8.326,
            angle_spread: 0.0,
        };
        let base = placed(&FixedFrame::world("World"), &source);
        let mut card = SourceCard::new();
        source.create_source(&base, &mut card).expect("create");

        assert!(card.transform().is_none());
        assert_eq!(card.component("x"), Some(&Component::Data(1)));
        assert_eq!(card.component("y"), Some(&Component::Double(0.0)));
        assert_eq!(card.component("z"), Some(&Component::Data(2)));
    }

    #[test]
    fn beam_along_world_z_swaps_profile_axes() {
        let source = GaussBeamSource {
            x_width: 2.0,
            z_width: 3.0,
            angle_spread: 0.0,
        };
        let mut frame = FixedFrame::world("World");
        frame.origin = Vec3::new(1.0, 2.0, 3.0);
        frame.y = Vec3::Z;
        frame.z = -Vec3::Y;
        let base = placed(&frame, &source);
        let map = base.axis_map().expect("aligned");
        assert_eq!(map.y, WorldAxis::Z);

        let mut card = SourceCard::new();
        source.create_source(&base, &mut card).expect("create");
        assert_eq!(card.component("z"), Some(&Component::Double(3.0)));
        let y_profile = card.data("y").expect("y profile").prob().expect("law");
        assert_eq!(y_profile.values(), [3.0, 2.0]);
    }

    #[test]
    fn rotated_beam_samples_locally_with_transform() {
        let source = GaussBeamSource::default();
        let mut base = placed(&FixedFrame::world("World"), &source);
        base.rotate(&WorldRotation::about(WorldAxis::Z, 45.0), |f| {
            source.needs_transform(f)
        });
        assert!(base.transform().is_some());

        let mut card = SourceCard::new();
        source.create_source(&base, &mut card).expect("create");
        assert_eq!(card.component("vec"), Some(&Component::Vector(Vec3::Y)));
        assert!(source.needs_transform(&CoordinateFrame::from_beam_axis(
            Vec3::ZERO,
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::Z
        )));
    }

    #[test]
    fn fluka_widths_are_negative_fwhm() {
        let source = GaussBeamSource {
            x_width: 0.5,
            z_width: 0.25,
            angle_spread: 0.0,
        };
        let base = placed(&FixedFrame::world("World"), &source);
        let mut lines = Vec::new();
        source.write_fluka(&base, &mut lines).expect("fluka");
        assert!(lines[0].contains("      -0.5     -0.25"));
    }
}
