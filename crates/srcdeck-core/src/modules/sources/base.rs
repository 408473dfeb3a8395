//! State shared by every source variant: particle, energy grid, weight,
//! polarization, placement frame and the optional transform card.

use crate::common::constants::{MEV_PER_GEV, ZERO_TOL};
use crate::common::fixed::{FixedComp, FixedOffset, LinkIndex};
use crate::common::geometry::{CoordinateFrame, CoordinateTransform, Vec3, WorldAxis, WorldRotation};
use crate::common::particle::Particle;
use crate::common::values::ValueTable;
use crate::domain::{Lifecycle, SourceError, SourceResult};
use crate::modules::card::SourceCard;
use crate::modules::distribution::{SourceInfo, SourceProb};
use crate::modules::record::SourceData;
use crate::modules::serialization::{fluka_card, format_general, phits_double, phits_line};
use tracing::debug;

/// Per-variant fallbacks for the shared keys.
#[derive(Debug, Clone, Copy)]
pub struct BaseDefaults {
    pub particle: Particle,
    pub energy: f64,
}

impl Default for BaseDefaults {
    fn default() -> Self {
        Self {
            particle: Particle::Neutron,
            energy: 14.0,
        }
    }
}

/// World axes the local X, Y and Z lie along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisMap {
    pub x: WorldAxis,
    pub y: WorldAxis,
    pub z: WorldAxis,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceBase {
    key: String,
    particle: Particle,
    cut_energy: f64,
    energy: Vec<f64>,
    weights: Vec<f64>,
    start_weight: f64,
    polarization_axis: Vec3,
    polarization_fraction: f64,
    transform_number: usize,
    offset: FixedOffset,
    frame: CoordinateFrame,
    transform: Option<CoordinateTransform>,
    lifecycle: Lifecycle,
}

impl SourceBase {
    pub fn new(key: impl Into<String>, defaults: BaseDefaults) -> Self {
        Self {
            key: key.into(),
            particle: defaults.particle,
            cut_energy: 0.0,
            energy: vec![defaults.energy],
            weights: vec![1.0],
            start_weight: 1.0,
            polarization_axis: Vec3::ZERO,
            polarization_fraction: 0.0,
            transform_number: 1,
            offset: FixedOffset::default(),
            frame: CoordinateFrame::world(),
            transform: None,
            lifecycle: Lifecycle::Unpopulated,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Variable name `<key><suffix>`.
    pub fn var(&self, suffix: &str) -> String {
        format!("{}{}", self.key, suffix)
    }

    pub fn particle(&self) -> Particle {
        self.particle
    }

    pub fn set_particle(&mut self, particle: Particle) {
        self.particle = particle;
    }

    pub fn cut_energy(&self) -> f64 {
        self.cut_energy
    }

    pub fn energy(&self) -> &[f64] {
        &self.energy
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn start_weight(&self) -> f64 {
        self.start_weight
    }

    pub fn polarization(&self) -> (Vec3, f64) {
        (self.polarization_axis, self.polarization_fraction)
    }

    pub fn frame(&self) -> &CoordinateFrame {
        &self.frame
    }

    pub fn transform(&self) -> Option<&CoordinateTransform> {
        self.transform.as_ref()
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// Replace the energy grid; grid and weights must pair up one to one.
    pub fn set_energy(&mut self, energy: Vec<f64>, weights: Vec<f64>) -> SourceResult<()> {
        if energy.is_empty() || energy.len() != weights.len() {
            return Err(SourceError::configuration(
                "CONFIG.ENERGY_WEIGHT_LENGTH",
                format!(
                    "source '{}' has {} energies but {} weights",
                    self.key,
                    energy.len(),
                    weights.len()
                ),
            ));
        }
        if energy.windows(2).any(|pair| pair[1] <= pair[0]) {
            return Err(SourceError::configuration(
                "CONFIG.ENERGY_GRID",
                format!("source '{}' energy grid is not increasing", self.key),
            ));
        }
        if energy.iter().any(|value| *value <= 0.0) || weights.iter().any(|w| *w < 0.0) {
            return Err(SourceError::configuration(
                "CONFIG.ENERGY_GRID",
                format!(
                    "source '{}' needs positive energies and non-negative weights",
                    self.key
                ),
            ));
        }
        self.energy = energy;
        self.weights = weights;
        Ok(())
    }

    pub fn populate(&mut self, table: &ValueTable) -> SourceResult<()> {
        let particle_name: String =
            table.evaluate_or(&self.var("ParticleType"), self.particle.name().to_string())?;
        self.particle = Particle::parse(&particle_name)?;
        self.cut_energy = table.evaluate_or(&self.var("CutEnergy"), self.cut_energy)?;
        self.start_weight = table.evaluate_or(&self.var("Weight"), self.start_weight)?;
        self.polarization_axis =
            table.evaluate_or(&self.var("PolarizationAxis"), self.polarization_axis)?;
        self.polarization_fraction =
            table.evaluate_or(&self.var("PolarizationFraction"), self.polarization_fraction)?;
        self.transform_number = table.evaluate_or(&self.var("TransNumber"), self.transform_number)?;
        self.offset = FixedOffset::from_table(table, &self.key)?;

        let count: usize = table.evaluate_or(&self.var("NE"), 0)?;
        if count == 0 {
            let energy = table.evaluate_or(&self.var("Energy"), self.energy[0])?;
            self.set_energy(vec![energy], vec![1.0])?;
        } else {
            let mut energy = Vec::with_capacity(count);
            let mut weights = Vec::with_capacity(count);
            for index in 0..count {
                energy.push(table.evaluate::<f64>(&self.var(&format!("Energy{index}")))?);
                let weight_key = self.var(&format!("EProb{index}"));
                if table.has(&weight_key) {
                    weights.push(table.evaluate::<f64>(&weight_key)?);
                }
            }
            if weights.is_empty() {
                weights = vec![1.0; count];
            }
            self.set_energy(energy, weights)?;
        }

        self.lifecycle = Lifecycle::Populated;
        debug!(key = %self.key, particle = self.particle.name(), points = self.energy.len(), "source populated");
        Ok(())
    }

    /// Frame from the link, then the configured offset; rebuilds the
    /// transform when `needs_transform` says the frame requires one.
    pub fn place(
        &mut self,
        fixed: &dyn FixedComp,
        link: LinkIndex,
        needs_transform: impl Fn(&CoordinateFrame) -> bool,
    ) -> SourceResult<()> {
        if self.lifecycle < Lifecycle::Populated {
            return Err(lifecycle_error(&self.key, "placed before populate"));
        }
        let mut frame = fixed.link_frame(link)?;
        self.offset.apply(&mut frame);
        self.frame = frame;
        self.rebuild_transform(needs_transform(&self.frame));
        self.lifecycle = Lifecycle::Placed;
        debug!(key = %self.key, link = link.0, origin = %self.frame.origin, "source placed");
        Ok(())
    }

    pub fn rotate(
        &mut self,
        rotation: &WorldRotation,
        needs_transform: impl Fn(&CoordinateFrame) -> bool,
    ) {
        self.frame.apply_rotation(rotation);
        self.rebuild_transform(needs_transform(&self.frame));
    }

    fn rebuild_transform(&mut self, needed: bool) {
        self.transform =
            needed.then(|| CoordinateTransform::new(self.transform_number, self.frame));
    }

    pub fn axis_map(&self) -> Option<AxisMap> {
        Some(AxisMap {
            x: self.frame.x.master_dir(ZERO_TOL)?.axis,
            y: self.frame.y.master_dir(ZERO_TOL)?.axis,
            z: self.frame.z.master_dir(ZERO_TOL)?.axis,
        })
    }

    /// `par`, plus `wgt` when it differs from unity.
    pub fn particle_components(&self, card: &mut SourceCard) {
        card.set_comp("par", self.particle.mcnp_symbol());
        if (self.start_weight - 1.0).abs() > f64::EPSILON {
            card.set_comp("wgt", self.start_weight);
        }
    }

    /// Single energy as `erg=E`, a grid as a point-wise record cut at the
    /// cut energy.
    pub fn energy_components(&self, card: &mut SourceCard, index: usize) -> SourceResult<()> {
        if self.energy.len() == 1 {
            card.set_comp("erg", self.energy[0]);
            return Ok(());
        }
        let mut prob = SourceProb::from_values(self.weights.clone());
        prob.normalize();
        let mut record = SourceData::new(index)
            .with_info(SourceInfo::from_values('a', self.energy.clone()))
            .with_prob(prob);
        if self.cut_energy > 0.0 {
            record.cut_value(self.cut_energy)?;
        }
        card.set_data("erg", record);
        Ok(())
    }

    /// PHITS frame: beam along local z' = Y, with x' = Z and y' = X.
    pub fn phits_frame(&self) -> CoordinateFrame {
        CoordinateFrame {
            origin: self.frame.origin,
            x: self.frame.z,
            y: self.frame.x,
            z: self.frame.y,
        }
    }

    pub fn phits_needs_transform(&self) -> bool {
        let frame = self.phits_frame();
        !(frame.origin.is_zero(ZERO_TOL) && frame.is_identity())
    }

    pub fn phits_header(&self, s_type: u32, comment: &str, lines: &mut Vec<String>) {
        lines.push("[source]".to_string());
        lines.push(phits_line("s-type", &s_type.to_string(), comment));
        lines.push(phits_line("proj", self.particle.phits_name(), "incident particle"));
        if (self.start_weight - 1.0).abs() > f64::EPSILON {
            lines.push(phits_double("wgt", self.start_weight, "start weight"));
        }
        if self.phits_needs_transform() {
            lines.push(phits_line(
                "trcl",
                &self.transform_number.to_string(),
                "local beam frame",
            ));
        }
    }

    pub fn phits_energy(&self, lines: &mut Vec<String>) {
        if self.energy.len() == 1 {
            lines.push(phits_double("e0", self.energy[0], "energy [MeV]"));
            return;
        }
        let total: f64 = self.weights.iter().sum();
        lines.push(phits_line("e-type", "1", "energy bins"));
        lines.push(phits_line(
            "ne",
            &(self.energy.len() - 1).to_string(),
            "number of groups",
        ));
        for (energy, weight) in self.energy.iter().zip(&self.weights).take(self.energy.len() - 1) {
            lines.push(format!(
                "    {}  {}",
                format_general(*energy, 6),
                format_general(weight / total, 6)
            ));
        }
        if let Some(last) = self.energy.last() {
            lines.push(format!("    {}", format_general(*last, 6)));
        }
    }

    /// `[transform]` section carrying the PHITS beam frame, when one is needed.
    pub fn phits_transform(&self, lines: &mut Vec<String>) {
        if !self.phits_needs_transform() {
            return;
        }
        let transform = CoordinateTransform::new(self.transform_number, self.phits_frame());
        let values = transform
            .values()
            .iter()
            .map(|value| format_general(*value, 8))
            .collect::<Vec<_>>()
            .join(" ");
        lines.push("[transform]".to_string());
        lines.push(format!("  tr{} {}", transform.number(), values));
    }

    pub fn fluka_energy(&self) -> SourceResult<f64> {
        match self.energy.as_slice() {
            [single] => Ok(*single),
            _ => Err(SourceError::unsupported_target(
                "TARGET.FLUKA_SPECTRUM",
                format!(
                    "source '{}' has a {}-point energy spectrum; the FLUKA BEAM card takes one energy",
                    self.key,
                    self.energy.len()
                ),
            )),
        }
    }

    /// BEAM, BEAMPOS and (for a non-default frame) BEAMAXES cards.
    pub fn fluka_beam_cards(
        &self,
        energy_mev: f64,
        divergence_mrad: f64,
        widths: [f64; 2],
        annular: bool,
        lines: &mut Vec<String>,
    ) {
        let energy_gev = energy_mev / MEV_PER_GEV;
        lines.push(fluka_card(
            "BEAM",
            [
                Some(-energy_gev),
                Some(0.0),
                Some(divergence_mrad),
                Some(widths[0]),
                Some(widths[1]),
                Some(if annular { 1.0 } else { 0.0 }),
            ],
            self.particle.fluka_name(),
        ));

        let frame = &self.frame;
        let default_axes = frame.x.master_dir(ZERO_TOL).is_some_and(|a| a.axis == WorldAxis::X && a.positive)
            && frame.y.master_dir(ZERO_TOL).is_some_and(|a| a.axis == WorldAxis::Z && a.positive);
        if default_axes {
            let direction = frame.y;
            lines.push(fluka_card(
                "BEAMPOS",
                [
                    Some(frame.origin.x),
                    Some(frame.origin.y),
                    Some(frame.origin.z),
                    Some(direction.x),
                    Some(direction.y),
                    None,
                ],
                "",
            ));
        } else {
            let beam_x = frame.x;
            let beam_z = frame.y;
            let beam_y = beam_z.cross(beam_x);
            lines.push(fluka_card(
                "BEAMAXES",
                [
                    Some(beam_x.x),
                    Some(beam_x.y),
                    Some(beam_x.z),
                    Some(beam_z.x),
                    Some(beam_z.y),
                    Some(beam_z.z),
                ],
                "",
            ));
            lines.push(fluka_card(
                "BEAMPOS",
                [
                    Some(frame.origin.dot(beam_x)),
                    Some(frame.origin.dot(beam_y)),
                    Some(frame.origin.dot(beam_z)),
                    Some(0.0),
                    Some(0.0),
                    None,
                ],
                "",
            ));
        }

        if self.polarization_fraction > 0.0 && !self.polarization_axis.is_zero(ZERO_TOL) {
            let axis = self.polarization_axis.unit();
            lines.push(fluka_card(
                "POLARIZA",
                [Some(axis.x), Some(axis.y), Some(axis.z), None, None, None],
                "",
            ));
        }
    }
}

pub(crate) fn lifecycle_error(key: &str, detail: &str) -> SourceError {
    SourceError::validation(
        "INPUT.SOURCE_LIFECYCLE",
        format!("source '{}' {}", key, detail),
    )
}

#[cfg(test)]
mod tests {
    use super::{BaseDefaults, SourceBase};
    use crate::common::fixed::{FixedFrame, LinkIndex};
    use crate::common::geometry::{WorldAxis, WorldRotation};
    use crate::common::particle::Particle;
    use crate::common::values::ValueTable;
    use crate::domain::Lifecycle;
    use crate::modules::card::{Component, SourceCard};

    fn base() -> SourceBase {
        SourceBase::new("src", BaseDefaults::default())
    }

    #[test]
    fn populate_reads_energy_grid_and_weights() {
        let mut table = ValueTable::new();
        table.add_variable("srcParticleType", "photon");
        table.add_variable("srcNE", 3_usize);
        for (index, (energy, prob)) in [(1.0, 1.0), (2.0, 2.0), (3.0, 1.0)].into_iter().enumerate() {
            table.add_variable(format!("srcEnergy{index}"), energy);
            table.add_variable(format!("srcEProb{index}"), prob);
        }

        let mut source = base();
        source.populate(&table).expect("populate");
        assert_eq!(source.particle(), Particle::Photon);
        assert_eq!(source.energy(), [1.0, 2.0, 3.0]);
        assert_eq!(source.weights(), [1.0, 2.0, 1.0]);
        assert_eq!(source.lifecycle(), Lifecycle::Populated);
    }

    #[test]
    fn partial_weight_lists_are_rejected() {
        let mut table = ValueTable::new();
        table.add_variable("srcNE", 2_usize);
        table.add_variable("srcEnergy0", 1.0);
        table.add_variable("srcEnergy1", 2.0);
        table.add_variable("srcEProb0", 1.0);

        let error = base().populate(&table).expect_err("mismatch");
        assert_eq!(error.placeholder(), "CONFIG.ENERGY_WEIGHT_LENGTH");
    }

    #[test]
    fn missing_grid_point_is_a_missing_variable() {
        let mut table = ValueTable::new();
        table.add_variable("srcNE", 2_usize);
        table.add_variable("srcEnergy0", 1.0);
        let error = base().populate(&table).expect_err("missing energy");
        assert_eq!(error.placeholder(), "CONFIG.MISSING_VARIABLE");
    }

    #[test]
    fn place_requires_populate_and_rotation_builds_transform() {
        let frame = FixedFrame::world("cave");
        let mut source = base();
        let error = source
            .place(&frame, LinkIndex::ORIGIN, |f| !f.is_axis_aligned())
            .expect_err("not populated");
        assert_eq!(error.placeholder(), "INPUT.SOURCE_LIFECYCLE");

        source.populate(&ValueTable::new()).expect("populate");
        source
            .place(&frame, LinkIndex::ORIGIN, |f| !f.is_axis_aligned())
            .expect("place");
        assert!(source.transform().is_none());

        source.rotate(&WorldRotation::about(WorldAxis::Z, 45.0), |f| !f.is_axis_aligned());
        assert_eq!(source.transform().map(|t| t.number()), Some(1));

        source.rotate(&WorldRotation::about(WorldAxis::Z, -45.0), |f| !f.is_axis_aligned());
        assert!(source.transform().is_none());
    }

    #[test]
    fn energy_grid_becomes_normalized_pointwise_record() {
        let mut source = base();
        source
            .set_energy(vec![1.0, 2.0, 4.0], vec![1.0, 1.0, 2.0])
            .expect("grid");
        let mut card = SourceCard::new();
        source.energy_components(&mut card, 4).expect("energy");

        assert_eq!(card.component("erg"), Some(&Component::Data(4)));
        let record = card.data("erg").expect("record");
        assert_eq!(record.prob().expect("prob").values(), [0.25, 0.25, 0.5]);
        assert!(source.set_energy(vec![2.0, 1.0], vec![1.0, 1.0]).is_err());
    }
}
