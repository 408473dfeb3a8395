use super::base::{BaseDefaults, SourceBase};
use super::beam::disk_record;
use super::rectangle::flat_record;
use super::{direction_components, phits_direction};
use crate::common::constants::{DEGRAD, ZERO_TOL};
use crate::common::geometry::{CoordinateFrame, Vec3};
use crate::common::particle::Particle;
use crate::common::values::ValueTable;
use crate::domain::{SourceError, SourceKind, SourceResult};
use crate::modules::card::SourceCard;
use crate::modules::serialization::phits_double;
use crate::modules::traits::{CardEmitter, McnpEmitter, PhitsEmitter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GammaShape {
    Point,
    Circle,
    Rectangle,
}

impl GammaShape {
    pub fn parse(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "point" => Some(Self::Point),
            "circle" => Some(Self::Circle),
            "rectangle" => Some(Self::Rectangle),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Point => "Point",
            Self::Circle => "Circle",
            Self::Rectangle => "Rectangle",
        }
    }
}

/// Photon emitter from a point, a disk or a rectangle. A finite angle
/// spread on the disk is modelled as a cone from a focus point behind the
/// aperture.
#[derive(Debug, Clone, PartialEq)]
pub struct GammaSource {
    pub shape: GammaShape,
    pub radius: f64,
    pub width: f64,
    pub height: f64,
    pub angle_spread: f64,
}

impl Default for GammaSource {
    fn default() -> Self {
        Self {
            shape: GammaShape::Circle,
            radius: 1.0,
            width: 1.0,
            height: 1.0,
            angle_spread: 0.0,
        }
    }
}

impl GammaSource {
    /// Recognized keys: `<key>Shape`, `<key>Radius`, `<key>Width`,
    /// `<key>Height`, `<key>ASpread`.
    pub fn from_table(table: &ValueTable, key: &str) -> SourceResult<Self> {
        let mut source = Self::default();
        source.populate(table, key)?;
        Ok(source)
    }

    /// Apex of the cone that opens to `radius` at the origin plane.
    pub fn focus_point(&self, frame: &CoordinateFrame) -> Vec3 {
        let tangent = (self.angle_spread * DEGRAD).tan();
        if self.angle_spread.abs() < ZERO_TOL || tangent.abs() < ZERO_TOL {
            return frame.origin;
        }
        frame.origin - frame.y * (self.radius / tangent)
    }
}

impl CardEmitter for GammaSource {
    const KIND: SourceKind = SourceKind::Gamma;

    fn base_defaults() -> BaseDefaults {
        BaseDefaults {
            particle: Particle::Photon,
            energy: 1.0,
        }
    }

    fn populate(&mut self, table: &ValueTable, key: &str) -> SourceResult<()> {
        let shape: String =
            table.evaluate_or(&format!("{key}Shape"), self.shape.as_str().to_string())?;
        self.shape = GammaShape::parse(&shape).ok_or_else(|| {
            SourceError::configuration(
                "CONFIG.SHAPE",
                format!("{key}Shape '{}' is not Point, Circle or Rectangle", shape),
            )
        })?;
        self.radius = table.evaluate_or(&format!("{key}Radius"), self.radius)?;
        self.width = table.evaluate_or(&format!("{key}Width"), self.width)?;
        self.height = table.evaluate_or(&format!("{key}Height"), self.height)?;
        self.angle_spread = table.evaluate_or(&format!("{key}ASpread"), self.angle_spread)?;
        Ok(())
    }

    fn needs_transform(&self, frame: &CoordinateFrame) -> bool {
        self.shape != GammaShape::Circle && !frame.is_identity()
    }
}

impl McnpEmitter for GammaSource {
    fn create_source(&self, base: &SourceBase, card: &mut SourceCard) -> SourceResult<()> {
        let frame = base.frame();
        let local = base.transform().is_some();
        let (origin, axis) = if local {
            (Vec3::ZERO, Vec3::Y)
        } else {
            (frame.origin, frame.y)
        };

        base.particle_components(card);
        base.energy_components(card, 3)?;
        match self.shape {
            GammaShape::Point => {
                card.set_comp("pos", origin);
                direction_components(card, axis, self.angle_spread, 1);
            }
            GammaShape::Circle if self.angle_spread.abs() >= ZERO_TOL => {
                card.set_comp("pos", self.focus_point(frame));
                direction_components(card, axis, self.angle_spread, 1);
            }
            GammaShape::Circle => {
                card.set_comp("pos", origin);
                card.set_comp("axs", axis);
                card.set_data("rad", disk_record(1, 0.0, self.radius)?);
                direction_components(card, axis, 0.0, 2);
            }
            GammaShape::Rectangle => {
                card.set_data("x", flat_record(1, origin.x, self.width));
                card.set_comp("y", origin.y);
                card.set_data("z", flat_record(2, origin.z, self.height));
                direction_components(card, axis, self.angle_spread, 4);
            }
        }
        Ok(())
    }
}

impl PhitsEmitter for GammaSource {
    fn write_phits(&self, base: &SourceBase, lines: &mut Vec<String>) -> SourceResult<()> {
        match self.shape {
            GammaShape::Point | GammaShape::Circle => {
                base.phits_header(1, "gamma source", lines);
                let radius = if self.shape == GammaShape::Circle {
                    self.radius
                } else {
                    0.0
                };
                lines.push(phits_double("x0", 0.0, ""));
                lines.push(phits_double("y0", 0.0, ""));
                lines.push(phits_double("r0", radius, "radius [cm]"));
                lines.push(phits_double("z0", 0.0, ""));
                lines.push(phits_double("z1", 0.0, ""));
            }
            GammaShape::Rectangle => {
                base.phits_header(2, "gamma source", lines);
                lines.push(phits_double("x0", -self.height / 2.0, ""));
                lines.push(phits_double("x1", self.height / 2.0, ""));
                lines.push(phits_double("y0", -self.width / 2.0, ""));
                lines.push(phits_double("y1", self.width / 2.0, ""));
                lines.push(phits_double("z0", 0.0, ""));
                lines.push(phits_double("z1", 0.0, ""));
            }
        }
        phits_direction(self.angle_spread, lines);
        base.phits_energy(lines);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{GammaShape, GammaSource};
    use crate::common::fixed::{FixedFrame, LinkIndex};
    use crate::common::geometry::{CoordinateFrame, Vec3, WorldAxis, WorldRotation};
    use crate::common::values::ValueTable;
    use crate::modules::card::{Component, SourceCard};
    use crate::modules::sources::SourceBase;
    use crate::modules::traits::{CardEmitter, McnpEmitter};

    fn placed(source: &GammaSource, rotation: Option<WorldRotation>) -> SourceBase {
        let mut base = SourceBase::new("gam", GammaSource::base_defaults());
        base.populate(&ValueTable::new()).expect("populate");
        base.place(&FixedFrame::world("World"), LinkIndex::ORIGIN, |f| {
            source.needs_transform(f)
        })
        .expect("place");
        if let Some(rotation) = rotation {
            base.rotate(&rotation, |f| source.needs_transform(f));
        }
        base
    }

    #[test]
    fn focus_point_sits_behind_aperture() {
        let source = GammaSource {
            radius: 2.0,
            angle_spread: 45.0,
            ..GammaSource::default()
        };
        let focus = source.focus_point(&CoordinateFrame::world());
        assert!(focus.distance(Vec3::new(0.0, -2.0, 0.0)) < 1.0e-9);
    }

    #[test]
    fn unknown_shape_is_a_configuration_error() {
        let mut table = ValueTable::new();
        table.add_variable("gamShape", "Hexagon");
        let error = GammaSource::from_table(&table, "gam").expect_err("bad shape");
        assert_eq!(error.placeholder(), "CONFIG.SHAPE");
    }

    #[test]
    fn only_non_circular_shapes_need_a_transform_when_rotated() {
        let rotation = Some(WorldRotation::about(WorldAxis::X, 30.0));
        let circle = GammaSource::default();
        assert!(placed(&circle, rotation).transform().is_none());

        let rectangle = GammaSource {
            shape: GammaShape::Rectangle,
            ..GammaSource::default()
        };
        assert!(placed(&rectangle, rotation).transform().is_some());
        assert!(placed(&rectangle, None).transform().is_none());
    }

    #[test]
    fn collimated_disk_uses_radial_record() {
        let source = GammaSource::default();
        let base = placed(&source, None);
        let mut card = SourceCard::new();
        source.create_source(&base, &mut card).expect("create");
        assert!(card.header_line().starts_with("sdef par=p erg=1.0 pos="));
        assert_eq!(card.component("rad"), Some(&Component::Data(1)));
        assert_eq!(card.component("dir"), Some(&Component::Double(1.0)));
    }
}
