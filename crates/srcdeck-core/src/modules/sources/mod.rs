//! Source models: one closed sum type over every emission kind, sharing a
//! [`SourceBase`] for particle, energy and placement.

mod activation;
mod base;
mod beam;
mod fluka;
mod gamma;
mod gauss_beam;
mod kcode;
mod lens;
mod parabolic;
mod point;
mod rectangle;
mod surf_norm;
mod synchrotron;
mod tdc;

pub use activation::{
    ActivationBias, ActivationField, ActivationSource, CellBox, CellLocator, SamplePoint,
};
pub use base::{AxisMap, BaseDefaults, SourceBase};
pub use beam::BeamSource;
pub use fluka::{FlukaExternalSource, FlukaSource};
pub use gamma::{GammaShape, GammaSource};
pub use gauss_beam::GaussBeamSource;
pub use kcode::{KCodeSource, KCodeValue};
pub use lens::LensSource;
pub use parabolic::ParabolicSource;
pub use point::PointSource;
pub use rectangle::RectangleSource;
pub use surf_norm::SurfNormSource;
pub use synchrotron::SynchrotronSource;
pub use tdc::{AngleBin, TdcSource};

use crate::common::constants::{DEGRAD, FLUKA_ISOTROPIC_MRAD, MRAD_PER_RAD, ZERO_TOL};
use crate::common::fixed::{FixedComp, LinkIndex};
use crate::common::geometry::{CoordinateFrame, CoordinateTransform, Vec3, WorldRotation};
use crate::common::values::ValueTable;
use crate::domain::{Lifecycle, SourceError, SourceKind, SourceResult, TargetCode};
use crate::modules::card::SourceCard;
use crate::modules::distribution::{SourceInfo, SourceProb};
use crate::modules::record::SourceData;
use crate::modules::serialization::{phits_double, phits_line};
use crate::modules::traits::{CardEmitter, DeckWriter, FlukaEmitter, McnpEmitter, PhitsEmitter};
use base::lifecycle_error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub enum SourceVariant {
    Point(PointSource),
    Beam(BeamSource),
    GaussBeam(GaussBeamSource),
    Rectangle(RectangleSource),
    Parabolic(ParabolicSource),
    Gamma(GammaSource),
    SurfNorm(SurfNormSource),
    FlukaSource(FlukaSource),
    FlukaExternal(FlukaExternalSource),
    Tdc(TdcSource),
    Synchrotron(SynchrotronSource),
    Lens(LensSource),
    Activation(ActivationSource),
    KCode(KCodeSource),
}

macro_rules! each_variant {
    ($value:expr, $source:ident => $body:expr) => {
        match $value {
            SourceVariant::Point($source) => $body,
            SourceVariant::Beam($source) => $body,
            SourceVariant::GaussBeam($source) => $body,
            SourceVariant::Rectangle($source) => $body,
            SourceVariant::Parabolic($source) => $body,
            SourceVariant::Gamma($source) => $body,
            SourceVariant::SurfNorm($source) => $body,
            SourceVariant::FlukaSource($source) => $body,
            SourceVariant::FlukaExternal($source) => $body,
            SourceVariant::Tdc($source) => $body,
            SourceVariant::Synchrotron($source) => $body,
            SourceVariant::Lens($source) => $body,
            SourceVariant::Activation($source) => $body,
            SourceVariant::KCode($source) => $body,
        }
    };
}

impl SourceVariant {
    /// Variant with its compile-time defaults.
    pub fn new(kind: SourceKind) -> Self {
        match kind {
            SourceKind::Point => Self::Point(PointSource::default()),
            SourceKind::Beam => Self::Beam(BeamSource::default()),
            SourceKind::GaussBeam => Self::GaussBeam(GaussBeamSource::default()),
            SourceKind::Rectangle => Self::Rectangle(RectangleSource::default()),
            SourceKind::Parabolic => Self::Parabolic(ParabolicSource::default()),
            SourceKind::Gamma => Self::Gamma(GammaSource::default()),
            SourceKind::SurfNorm => Self::SurfNorm(SurfNormSource::default()),
            SourceKind::FlukaSource => Self::FlukaSource(FlukaSource::default()),
            SourceKind::FlukaExternal => Self::FlukaExternal(FlukaExternalSource::default()),
            SourceKind::Tdc => Self::Tdc(TdcSource::default()),
            SourceKind::Synchrotron => Self::Synchrotron(SynchrotronSource::default()),
            SourceKind::Lens => Self::Lens(LensSource::default()),
            SourceKind::Activation => Self::Activation(ActivationSource::default()),
            SourceKind::KCode => Self::KCode(KCodeSource::default()),
        }
    }

    pub fn kind(&self) -> SourceKind {
        fn kind_of<E: CardEmitter>(_: &E) -> SourceKind {
            E::KIND
        }
        each_variant!(self, source => kind_of(source))
    }

    fn base_defaults(&self) -> BaseDefaults {
        fn defaults_of<E: CardEmitter>(_: &E) -> BaseDefaults {
            E::base_defaults()
        }
        each_variant!(self, source => defaults_of(source))
    }

    fn populate(&mut self, table: &ValueTable, key: &str) -> SourceResult<()> {
        each_variant!(self, source => source.populate(table, key))
    }

    fn needs_transform(&self, frame: &CoordinateFrame) -> bool {
        each_variant!(self, source => source.needs_transform(frame))
    }
}

/// One registered source: shared base state plus the kind-specific payload.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceModel {
    base: SourceBase,
    variant: SourceVariant,
}

impl SourceModel {
    pub fn new(kind: SourceKind, key: impl Into<String>) -> Self {
        let variant = SourceVariant::new(kind);
        let base = SourceBase::new(key, variant.base_defaults());
        Self { base, variant }
    }

    pub fn kind(&self) -> SourceKind {
        self.variant.kind()
    }

    pub fn key(&self) -> &str {
        self.base.key()
    }

    pub fn base(&self) -> &SourceBase {
        &self.base
    }

    pub fn base_mut(&mut self) -> &mut SourceBase {
        &mut self.base
    }

    pub fn variant(&self) -> &SourceVariant {
        &self.variant
    }

    pub fn variant_mut(&mut self) -> &mut SourceVariant {
        &mut self.variant
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.base.lifecycle()
    }

    pub fn transform(&self) -> Option<&CoordinateTransform> {
        self.base.transform()
    }

    pub fn activation_mut(&mut self) -> Option<&mut ActivationSource> {
        match &mut self.variant {
            SourceVariant::Activation(source) => Some(source),
            _ => None,
        }
    }

    pub fn populate(&mut self, table: &ValueTable) -> SourceResult<()> {
        self.base.populate(table)?;
        let key = self.base.key().to_string();
        self.variant.populate(table, &key)
    }

    pub fn place(&mut self, fixed: &dyn FixedComp, link: LinkIndex) -> SourceResult<()> {
        let variant = &self.variant;
        self.base
            .place(fixed, link, |frame| variant.needs_transform(frame))
    }

    /// Populate from the table then place at `link` of `fixed`.
    pub fn create_all(
        &mut self,
        table: &ValueTable,
        fixed: &dyn FixedComp,
        link: LinkIndex,
    ) -> SourceResult<()> {
        self.populate(table)?;
        self.place(fixed, link)
    }

    /// Rotate the placed frame; the transform card is rebuilt or dropped.
    pub fn rotate(&mut self, rotation: &WorldRotation) -> SourceResult<()> {
        if self.lifecycle() < Lifecycle::Placed {
            return Err(lifecycle_error(self.key(), "rotated before placement"));
        }
        let variant = &self.variant;
        self.base
            .rotate(rotation, |frame| variant.needs_transform(frame));
        debug!(key = %self.key(), transform = self.transform().is_some(), "source rotated");
        Ok(())
    }

    fn check_ready(&self, code: TargetCode) -> SourceResult<()> {
        let kind = self.kind();
        if !kind.supports(code) {
            return Err(unsupported(kind, self.key(), code));
        }
        let required = if kind.requires_placement() {
            Lifecycle::Placed
        } else {
            Lifecycle::Populated
        };
        if self.lifecycle() < required {
            return Err(lifecycle_error(
                self.key(),
                &format!(
                    "is {} but must be {} before writing",
                    self.lifecycle().as_str(),
                    required.as_str()
                ),
            ));
        }
        Ok(())
    }

    /// Fill an `sdef` card; the transform reference goes last.
    pub fn create_source(&self, card: &mut SourceCard) -> SourceResult<()> {
        self.check_ready(TargetCode::Mcnp)?;
        let base = &self.base;
        match &self.variant {
            SourceVariant::Point(source) => source.create_source(base, card),
            SourceVariant::Beam(source) => source.create_source(base, card),
            SourceVariant::GaussBeam(source) => source.create_source(base, card),
            SourceVariant::Rectangle(source) => source.create_source(base, card),
            SourceVariant::Parabolic(source) => source.create_source(base, card),
            SourceVariant::Gamma(source) => source.create_source(base, card),
            SourceVariant::SurfNorm(source) => source.create_source(base, card),
            SourceVariant::Tdc(source) => source.create_source(base, card),
            SourceVariant::Synchrotron(source) => source.create_source(base, card),
            SourceVariant::Lens(source) => source.create_source(base, card),
            SourceVariant::Activation(source) => source.create_source(base, card),
            SourceVariant::KCode(_)
            | SourceVariant::FlukaSource(_)
            | SourceVariant::FlukaExternal(_) => Err(SourceError::unsupported_target(
                "TARGET.UNSUPPORTED",
                format!("{} source '{}' does not build an sdef card", self.kind(), self.key()),
            )),
        }?;
        if let Some(transform) = base.transform() {
            card.set_transform(*transform);
        }
        Ok(())
    }

    pub fn write_mcnp(&self) -> SourceResult<String> {
        self.check_ready(TargetCode::Mcnp)?;
        let mut out = String::new();
        if let SourceVariant::KCode(source) = &self.variant {
            source.write(&mut out);
            return Ok(out);
        }
        let mut card = SourceCard::new();
        card.set_active();
        self.create_source(&mut card)?;
        card.write(&mut out)?;
        Ok(out)
    }

    pub fn write_phits(&self) -> SourceResult<String> {
        self.check_ready(TargetCode::Phits)?;
        let base = &self.base;
        let mut lines = Vec::new();
        match &self.variant {
            SourceVariant::Point(source) => source.write_phits(base, &mut lines),
            SourceVariant::Beam(source) => source.write_phits(base, &mut lines),
            SourceVariant::GaussBeam(source) => source.write_phits(base, &mut lines),
            SourceVariant::Rectangle(source) => source.write_phits(base, &mut lines),
            SourceVariant::Gamma(source) => source.write_phits(base, &mut lines),
            SourceVariant::Parabolic(_)
            | SourceVariant::SurfNorm(_)
            | SourceVariant::FlukaSource(_)
            | SourceVariant::FlukaExternal(_)
            | SourceVariant::Tdc(_)
            | SourceVariant::Synchrotron(_)
            | SourceVariant::Lens(_)
            | SourceVariant::Activation(_)
            | SourceVariant::KCode(_) => Err(unsupported(self.kind(), self.key(), TargetCode::Phits)),
        }?;
        base.phits_transform(&mut lines);
        Ok(join_lines(lines))
    }

    pub fn write_fluka(&self) -> SourceResult<String> {
        self.check_ready(TargetCode::Fluka)?;
        let base = &self.base;
        let mut lines = Vec::new();
        match &self.variant {
            SourceVariant::Point(source) => source.write_fluka(base, &mut lines),
            SourceVariant::Beam(source) => source.write_fluka(base, &mut lines),
            SourceVariant::GaussBeam(source) => source.write_fluka(base, &mut lines),
            SourceVariant::Rectangle(source) => source.write_fluka(base, &mut lines),
            SourceVariant::FlukaSource(source) => source.write_fluka(base, &mut lines),
            SourceVariant::FlukaExternal(source) => source.write_fluka(base, &mut lines),
            SourceVariant::Parabolic(_)
            | SourceVariant::Gamma(_)
            | SourceVariant::SurfNorm(_)
            | SourceVariant::Tdc(_)
            | SourceVariant::Synchrotron(_)
            | SourceVariant::Lens(_)
            | SourceVariant::Activation(_)
            | SourceVariant::KCode(_) => Err(unsupported(self.kind(), self.key(), TargetCode::Fluka)),
        }?;
        Ok(join_lines(lines))
    }

    pub fn write(&self, code: TargetCode) -> SourceResult<String> {
        match code {
            TargetCode::Mcnp => self.write_mcnp(),
            TargetCode::Phits => self.write_phits(),
            TargetCode::Fluka => self.write_fluka(),
        }
    }
}

impl DeckWriter for SourceModel {
    fn write_deck(&self, code: TargetCode) -> SourceResult<String> {
        self.write(code)
    }
}

fn unsupported(kind: SourceKind, key: &str, code: TargetCode) -> SourceError {
    SourceError::unsupported_target(
        "TARGET.UNSUPPORTED",
        format!("{} source '{}' cannot be written for {}", kind, key, code),
    )
}

fn join_lines(lines: Vec<String>) -> String {
    let mut out = lines.join("\n");
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

/// `si h cos(a) 1` / `sp 0 1`: uniform in cosine inside a cone of half
/// angle `angle_deg`.
pub(crate) fn cone_record(index: usize, angle_deg: f64) -> SourceData {
    SourceData::new(index)
        .with_info(SourceInfo::from_values(
            'h',
            vec![(angle_deg * DEGRAD).cos(), 1.0],
        ))
        .with_prob(SourceProb::from_values(vec![0.0, 1.0]))
}

/// Direction about `axis`: isotropic (no `dir`) from 360 degrees up, a
/// literal `dir=1.0` for no spread, otherwise a cone record.
pub(crate) fn direction_components(
    card: &mut SourceCard,
    axis: Vec3,
    angle_spread: f64,
    index: usize,
) {
    if angle_spread >= 360.0 {
        return;
    }
    card.set_comp("vec", axis);
    if angle_spread.abs() < ZERO_TOL {
        card.set_comp("dir", 1.0);
    } else {
        card.set_data("dir", cone_record(index, angle_spread));
    }
}

pub(crate) fn phits_direction(angle_spread: f64, lines: &mut Vec<String>) {
    if angle_spread >= 360.0 {
        lines.push(phits_line("dir", "all", "isotropic"));
        return;
    }
    lines.push(phits_double("dir", 1.0, "along beam axis"));
    if angle_spread.abs() >= ZERO_TOL {
        lines.push(phits_double("dom", angle_spread, "cone half angle [deg]"));
    }
}

/// BEAM WHAT(3): isotropic above 2000 pi mrad, negative for a flat
/// (rectangular) angular profile of full width `2 * angle_spread`.
pub(crate) fn fluka_divergence(angle_spread: f64) -> f64 {
    if angle_spread >= 360.0 {
        FLUKA_ISOTROPIC_MRAD.ceil()
    } else {
        -2.0 * angle_spread * DEGRAD * MRAD_PER_RAD
    }
}
