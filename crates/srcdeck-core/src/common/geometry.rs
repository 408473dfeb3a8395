//! Vector and frame primitives used to place sources and describe their
//! transform cards.

use super::constants::{DEGRAD, ROUND_OFF_TOL, ZERO_TOL};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3::new(0.0, 0.0, 0.0);
    pub const X: Vec3 = Vec3::new(1.0, 0.0, 0.0);
    pub const Y: Vec3 = Vec3::new(0.0, 1.0, 0.0);
    pub const Z: Vec3 = Vec3::new(0.0, 0.0, 1.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub const fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    pub fn component(self, axis: WorldAxis) -> f64 {
        match axis {
            WorldAxis::X => self.x,
            WorldAxis::Y => self.y,
            WorldAxis::Z => self.z,
        }
    }

    pub fn dot(self, other: Vec3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(self, other: Vec3) -> Vec3 {
        Vec3::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    pub fn abs(self) -> f64 {
        self.dot(self).sqrt()
    }

    pub fn distance(self, other: Vec3) -> f64 {
        (self - other).abs()
    }

    /// Unit vector in the same direction; the zero vector stays zero.
    pub fn unit(self) -> Vec3 {
        let length = self.abs();
        if length <= f64::EPSILON {
            self
        } else {
            self * (1.0 / length)
        }
    }

    /// Components within `tolerance` of zero become exactly zero.
    pub fn snapped(self, tolerance: f64) -> Vec3 {
        let snap = |value: f64| if value.abs() <= tolerance { 0.0 } else { value };
        Vec3::new(snap(self.x), snap(self.y), snap(self.z))
    }

    pub fn is_zero(self, tolerance: f64) -> bool {
        self.abs() <= tolerance
    }

    /// Rotate about `axis` (through the origin) by `angle_deg`, right-handed.
    pub fn rotate_about(self, axis: Vec3, angle_deg: f64) -> Vec3 {
        let k = axis.unit();
        let (sin, cos) = (angle_deg * DEGRAD).sin_cos();
        self * cos + k.cross(self) * sin + k * (k.dot(self) * (1.0 - cos))
    }

    /// World axis this vector points along, if any.
    pub fn master_dir(self, tolerance: f64) -> Option<AxisAlignment> {
        let u = self.unit();
        WorldAxis::ALL.into_iter().find_map(|axis| {
            let c = u.component(axis);
            ((c.abs() - 1.0).abs() <= tolerance).then_some(AxisAlignment {
                axis,
                positive: c > 0.0,
            })
        })
    }
}

impl From<[f64; 3]> for Vec3 {
    fn from(value: [f64; 3]) -> Self {
        Vec3::new(value[0], value[1], value[2])
    }
}

impl From<Vec3> for [f64; 3] {
    fn from(value: Vec3) -> Self {
        value.to_array()
    }
}

impl Add for Vec3 {
    type Output = Vec3;

    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vec3 {
    fn add_assign(&mut self, rhs: Vec3) {
        *self = *self + rhs;
    }
}

impl Sub for Vec3 {
    type Output = Vec3;

    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Vec3;

    fn mul(self, rhs: f64) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for Vec3 {
    type Output = Vec3;

    fn neg(self) -> Vec3 {
        Vec3::new(-self.x, -self.y, -self.z)
    }
}

impl Display for Vec3 {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorldAxis {
    X,
    Y,
    Z,
}

impl WorldAxis {
    pub const ALL: [WorldAxis; 3] = [Self::X, Self::Y, Self::Z];

    pub const fn name(self) -> &'static str {
        match self {
            Self::X => "x",
            Self::Y => "y",
            Self::Z => "z",
        }
    }

    pub const fn unit(self) -> Vec3 {
        match self {
            Self::X => Vec3::X,
            Self::Y => Vec3::Y,
            Self::Z => Vec3::Z,
        }
    }

    pub fn parse(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "x" => Some(Self::X),
            "y" => Some(Self::Y),
            "z" => Some(Self::Z),
            _ => None,
        }
    }
}

/// Signed world axis a local axis coincides with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AxisAlignment {
    pub axis: WorldAxis,
    pub positive: bool,
}

impl AxisAlignment {
    pub const fn sign(self) -> f64 {
        if self.positive { 1.0 } else { -1.0 }
    }
}

/// Origin plus right-handed local axes of a placed object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateFrame {
    pub origin: Vec3,
    pub x: Vec3,
    pub y: Vec3,
    pub z: Vec3,
}

impl Default for CoordinateFrame {
    fn default() -> Self {
        Self::world()
    }
}

impl CoordinateFrame {
    pub const fn world() -> Self {
        Self {
            origin: Vec3::ZERO,
            x: Vec3::X,
            y: Vec3::Y,
            z: Vec3::Z,
        }
    }

    /// Build a frame whose Y is `beam`; X and Z are rebuilt orthogonal to it
    /// keeping `z_hint` as close as possible.
    pub fn from_beam_axis(origin: Vec3, beam: Vec3, z_hint: Vec3) -> Self {
        let y = beam.unit();
        let mut z = z_hint - y * z_hint.dot(y);
        if z.is_zero(ZERO_TOL) {
            let fallback = if y.master_dir(ZERO_TOL).map(|a| a.axis) == Some(WorldAxis::Z) {
                Vec3::X
            } else {
                Vec3::Z
            };
            z = fallback - y * fallback.dot(y);
        }
        let z = z.unit();
        let x = y.cross(z).unit();
        Self { origin, x, y, z }
    }

    /// True when every local axis lies along the matching world axis with a
    /// positive sign.
    pub fn is_identity(&self) -> bool {
        [(self.x, WorldAxis::X), (self.y, WorldAxis::Y), (self.z, WorldAxis::Z)]
            .into_iter()
            .all(|(axis, world)| {
                axis.master_dir(ZERO_TOL) == Some(AxisAlignment {
                    axis: world,
                    positive: true,
                })
            })
    }

    /// True when every local axis lies along some world axis.
    pub fn is_axis_aligned(&self) -> bool {
        [self.x, self.y, self.z]
            .into_iter()
            .all(|axis| axis.master_dir(ZERO_TOL).is_some())
    }

    pub fn apply_rotation(&mut self, rotation: &WorldRotation) {
        self.origin = rotation.apply_point(self.origin).snapped(ROUND_OFF_TOL);
        self.x = rotation.apply_direction(self.x).snapped(ROUND_OFF_TOL);
        self.y = rotation.apply_direction(self.y).snapped(ROUND_OFF_TOL);
        self.z = rotation.apply_direction(self.z).snapped(ROUND_OFF_TOL);
    }
}

/// Global rotation applied after placement (about a world axis through `centre`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldRotation {
    pub axis: Vec3,
    pub angle_deg: f64,
    pub centre: Vec3,
}

impl WorldRotation {
    pub fn about(axis: WorldAxis, angle_deg: f64) -> Self {
        Self {
            axis: axis.unit(),
            angle_deg,
            centre: Vec3::ZERO,
        }
    }

    pub fn apply_point(&self, point: Vec3) -> Vec3 {
        (point - self.centre).rotate_about(self.axis, self.angle_deg) + self.centre
    }

    pub fn apply_direction(&self, direction: Vec3) -> Vec3 {
        direction.rotate_about(self.axis, self.angle_deg)
    }
}

/// Transform card mapping a local emission frame onto the world frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateTransform {
    number: usize,
    frame: CoordinateFrame,
}

impl CoordinateTransform {
    pub fn new(number: usize, frame: CoordinateFrame) -> Self {
        Self { number, frame }
    }

    pub const fn number(&self) -> usize {
        self.number
    }

    pub const fn frame(&self) -> &CoordinateFrame {
        &self.frame
    }

    /// Origin followed by the nine direction cosines, local X row first.
    pub fn values(&self) -> [f64; 12] {
        let CoordinateFrame { origin, x, y, z } = self.frame;
        [
            origin.x, origin.y, origin.z, x.x, x.y, x.z, y.x, y.y, y.z, z.x, z.y, z.z,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::{CoordinateFrame, CoordinateTransform, Vec3, WorldAxis, WorldRotation};

    fn assert_close(actual: Vec3, expected: Vec3) {
        assert!(
            actual.distance(expected) <= 1.0e-12,
            "expected {} got {}",
            expected,
            actual
        );
    }

    #[test]
    fn master_dir_reports_signed_world_axis() {
        let aligned = Vec3::new(0.0, -3.0, 0.0).master_dir(1.0e-5).expect("aligned");
        assert_eq!(aligned.axis, WorldAxis::Y);
        assert!(!aligned.positive);
        assert_eq!(aligned.sign(), -1.0);

        assert!(Vec3::new(1.0, 1.0, 0.0).master_dir(1.0e-5).is_none());
    }

    #[test]
    fn rotation_about_z_turns_x_into_y() {
        let rotated = Vec3::X.rotate_about(Vec3::Z, 90.0);
        assert_close(rotated, Vec3::Y);
    }

    #[test]
    fn beam_axis_frame_is_right_handed() {
        let frame = CoordinateFrame::from_beam_axis(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0), Vec3::Z);
        assert_close(frame.y, Vec3::X);
        assert_close(frame.z, Vec3::Z);
        assert_close(frame.x.cross(frame.y), frame.z);
        assert!(frame.is_axis_aligned());
        assert!(!frame.is_identity());

        let vertical =
            CoordinateFrame::from_beam_axis(Vec3::ZERO, Vec3::new(0.0, 0.0, 2.0), Vec3::Z);
        assert_close(vertical.y, Vec3::Z);
        assert_close(vertical.x.cross(vertical.y), vertical.z);
    }

    #[test]
    fn rotated_frame_loses_alignment() {
        let mut frame = CoordinateFrame::world();
        assert!(frame.is_identity());
        frame.apply_rotation(&WorldRotation::about(WorldAxis::Z, 45.0));
        assert!(!frame.is_axis_aligned());
        assert_close(frame.z, Vec3::Z);
    }

    #[test]
    fn rotation_there_and_back_leaves_exact_zeros() {
        let mut frame = CoordinateFrame {
            origin: Vec3::new(3.0, 0.0, 0.0),
            ..CoordinateFrame::world()
        };
        frame.apply_rotation(&WorldRotation::about(WorldAxis::Z, 30.0));
        frame.apply_rotation(&WorldRotation::about(WorldAxis::Z, -30.0));
        assert_eq!(frame.origin.y, 0.0);
        assert_eq!(frame.x.y, 0.0);
        assert_eq!(frame.y.x, 0.0);
        assert_eq!((frame.z.x, frame.z.y), (0.0, 0.0));
        assert!(frame.is_axis_aligned());
    }

    #[test]
    fn transform_values_list_origin_then_axes() {
        let frame = CoordinateFrame {
            origin: Vec3::new(1.0, 2.0, 3.0),
            ..CoordinateFrame::world()
        };
        let transform = CoordinateTransform::new(7, frame);
        assert_eq!(transform.number(), 7);
        assert_eq!(
            transform.values(),
            [1.0, 2.0, 3.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0]
        );
    }
}
