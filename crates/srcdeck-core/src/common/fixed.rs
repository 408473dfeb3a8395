//! Coordinate-frame provider used for source placement.
//!
//! Geometry components expose an origin, local axes and a list of link
//! points; a source picks one link and builds its own frame from it.

use super::geometry::{CoordinateFrame, Vec3};
use super::values::{ValueError, ValueTable};
use crate::domain::{SourceError, SourceResult};
use serde::{Deserialize, Serialize};

/// Signed link selector: 0 is the component origin, `+n` link n, `-n` link n
/// with its axis reversed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LinkIndex(pub i64);

impl LinkIndex {
    pub const ORIGIN: LinkIndex = LinkIndex(0);

    pub const fn is_origin(self) -> bool {
        self.0 == 0
    }

    pub const fn is_reversed(self) -> bool {
        self.0 < 0
    }

    /// Zero-based slot into the link list, when this is not the origin.
    pub fn slot(self) -> Option<usize> {
        (self.0 != 0).then(|| (self.0.unsigned_abs() - 1) as usize)
    }
}

pub trait FixedComp {
    fn key_name(&self) -> &str;

    fn frame(&self) -> CoordinateFrame;

    fn link_count(&self) -> usize;

    fn link_point(&self, slot: usize) -> Option<Vec3>;

    fn link_axis(&self, slot: usize) -> Option<Vec3>;

    /// Frame at a link: origin at the link point, Y along the (possibly
    /// reversed) link axis, Z kept as close to the component Z as possible.
    fn link_frame(&self, link: LinkIndex) -> SourceResult<CoordinateFrame> {
        let base = self.frame();
        let (origin, axis) = match link.slot() {
            None => (base.origin, base.y),
            Some(slot) => {
                let out_of_range = || {
                    SourceError::configuration(
                        "CONFIG.LINK_INDEX",
                        format!(
                            "link index {} out of range for '{}' ({} links)",
                            link.0,
                            self.key_name(),
                            self.link_count()
                        ),
                    )
                };
                let point = self.link_point(slot).ok_or_else(out_of_range)?;
                let axis = self.link_axis(slot).ok_or_else(out_of_range)?;
                (point, axis)
            }
        };
        let axis = if link.is_reversed() { -axis } else { axis };
        Ok(CoordinateFrame::from_beam_axis(origin, axis, base.z))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinkPoint {
    pub point: Vec3,
    pub axis: Vec3,
}

/// Plain frame with explicit links, used when no geometry kernel is attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixedFrame {
    pub name: String,
    pub origin: Vec3,
    pub x: Vec3,
    pub y: Vec3,
    pub z: Vec3,
    pub links: Vec<LinkPoint>,
}

impl Default for FixedFrame {
    fn default() -> Self {
        Self::world("World")
    }
}

impl FixedFrame {
    pub fn world(name: impl Into<String>) -> Self {
        let frame = CoordinateFrame::world();
        Self {
            name: name.into(),
            origin: frame.origin,
            x: frame.x,
            y: frame.y,
            z: frame.z,
            links: Vec::new(),
        }
    }

    pub fn with_link(mut self, point: Vec3, axis: Vec3) -> Self {
        self.links.push(LinkPoint { point, axis });
        self
    }

    pub fn from_json_str(source: &str) -> SourceResult<Self> {
        serde_json::from_str(source).map_err(|error| {
            SourceError::configuration(
                "CONFIG.FRAME",
                format!("frame JSON is invalid: {}", error),
            )
        })
    }
}

impl FixedComp for FixedFrame {
    fn key_name(&self) -> &str {
        &self.name
    }

    fn frame(&self) -> CoordinateFrame {
        CoordinateFrame {
            origin: self.origin,
            x: self.x.unit(),
            y: self.y.unit(),
            z: self.z.unit(),
        }
    }

    fn link_count(&self) -> usize {
        self.links.len()
    }

    fn link_point(&self, slot: usize) -> Option<Vec3> {
        self.links.get(slot).map(|link| link.point)
    }

    fn link_axis(&self, slot: usize) -> Option<Vec3> {
        self.links.get(slot).map(|link| link.axis.unit())
    }
}

/// Translational and rotational offset applied after picking a link frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FixedOffset {
    pub x_step: f64,
    pub y_step: f64,
    pub z_step: f64,
    pub xy_angle: f64,
    pub z_angle: f64,
}

impl FixedOffset {
    pub fn from_table(table: &ValueTable, key: &str) -> Result<Self, ValueError> {
        Ok(Self {
            x_step: table.evaluate_or(&format!("{key}XStep"), 0.0)?,
            y_step: table.evaluate_or(&format!("{key}YStep"), 0.0)?,
            z_step: table.evaluate_or(&format!("{key}ZStep"), 0.0)?,
            xy_angle: table.evaluate_or(&format!("{key}XYAngle"), 0.0)?,
            z_angle: table.evaluate_or(&format!("{key}ZAngle"), 0.0)?,
        })
    }

    /// Rotate by `xy_angle` about local Z, then `z_angle` about the new local
    /// X, then step along the rotated axes.
    pub fn apply(&self, frame: &mut CoordinateFrame) {
        if self.xy_angle != 0.0 {
            let axis = frame.z;
            frame.x = frame.x.rotate_about(axis, self.xy_angle);
            frame.y = frame.y.rotate_about(axis, self.xy_angle);
        }
        if self.z_angle != 0.0 {
            let axis = frame.x;
            frame.y = frame.y.rotate_about(axis, self.z_angle);
            frame.z = frame.z.rotate_about(axis, self.z_angle);
        }
        frame.origin += frame.x * self.x_step + frame.y * self.y_step + frame.z * self.z_step;
    }
}

#[cfg(test)]
mod tests {
    use super::{FixedComp, FixedFrame, FixedOffset, LinkIndex};
    use crate::common::geometry::{CoordinateFrame, Vec3};
    use crate::common::values::ValueTable;

    fn close(a: Vec3, b: Vec3) -> bool {
        a.distance(b) <= 1.0e-12
    }

    #[test]
    fn origin_link_uses_component_frame() {
        let frame = FixedFrame::world("target");
        let placed = frame.link_frame(LinkIndex::ORIGIN).expect("origin link");
        assert_eq!(placed, CoordinateFrame::world());
    }

    #[test]
    fn signed_links_select_point_and_direction() {
        let frame = FixedFrame::world("target")
            .with_link(Vec3::new(0.0, 10.0, 0.0), Vec3::Y)
            .with_link(Vec3::new(0.0, 0.0, 5.0), Vec3::Z);

        let forward = frame.link_frame(LinkIndex(1)).expect("link 1");
        assert!(close(forward.origin, Vec3::new(0.0, 10.0, 0.0)));
        assert!(close(forward.y, Vec3::Y));

        let reversed = frame.link_frame(LinkIndex(-1)).expect("link -1");
        assert!(close(reversed.y, -Vec3::Y));
        assert!(close(reversed.x.cross(reversed.y), reversed.z));

        let error = frame.link_frame(LinkIndex(3)).expect_err("missing link");
        assert_eq!(error.placeholder(), "CONFIG.LINK_INDEX");
    }

    #[test]
    fn offset_steps_along_rotated_axes() {
        let mut table = ValueTable::new();
        table.add_variable("srcYStep", 2.0);
        table.add_variable("srcXYAngle", 90.0);
        let offset = FixedOffset::from_table(&table, "src").expect("offset");

        let mut frame = CoordinateFrame::world();
        offset.apply(&mut frame);
        assert!(close(frame.y, -Vec3::X));
        assert!(close(frame.origin, Vec3::new(-2.0, 0.0, 0.0)));
    }

    #[test]
    fn frames_load_from_json() {
        let frame = FixedFrame::from_json_str(
            r#"{ "name": "cave", "origin": [1, 2, 3], "links": [ { "point": [0, 0, 0], "axis": [1, 0, 0] } ] }"#,
        )
        .expect("frame should parse");
        assert_eq!(frame.name, "cave");
        assert_eq!(frame.link_count(), 1);
        assert_eq!(frame.y, Vec3::Y);
    }
}
