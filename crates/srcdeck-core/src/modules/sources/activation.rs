use super::base::SourceBase;
use crate::common::geometry::Vec3;
use crate::common::values::ValueTable;
use crate::domain::{SourceError, SourceKind, SourceResult};
use crate::modules::card::SourceCard;
use crate::modules::distribution::{SourceBias, SourceInfo, SourceProb};
use crate::modules::record::SourceData;
use crate::modules::traits::{CardEmitter, McnpEmitter};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Maps a world point to the cell that contains it.
pub trait CellLocator {
    fn cell_at(&self, point: Vec3) -> Option<i64>;
}

/// Axis-aligned box standing in for one cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellBox {
    pub cell: i64,
    pub min: Vec3,
    pub max: Vec3,
}

impl CellBox {
    pub fn contains(&self, point: Vec3) -> bool {
        (point.x >= self.min.x && point.x <= self.max.x)
            && (point.y >= self.min.y && point.y <= self.max.y)
            && (point.z >= self.min.z && point.z <= self.max.z)
    }
}

/// First box in list order wins.
impl CellLocator for Vec<CellBox> {
    fn cell_at(&self, point: Vec3) -> Option<i64> {
        self.iter()
            .find(|cell| cell.contains(point))
            .map(|cell| cell.cell)
    }
}

/// Activity per cell, one entry per time step.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivationField {
    cells: BTreeMap<i64, Vec<f64>>,
}

impl ActivationField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, cell: i64, activity: Vec<f64>) {
        self.cells.insert(cell, activity);
    }

    pub fn activity(&self, cell: i64, time_step: usize) -> Option<f64> {
        self.cells
            .get(&cell)
            .and_then(|steps| steps.get(time_step))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActivationBias {
    None,
    /// `1 / (d^2 + r0^2)` about `point`.
    InverseSquare { point: Vec3, distance: f64 },
    /// Keep only points on the `normal` side of the plane.
    Plane { point: Vec3, normal: Vec3 },
}

impl ActivationBias {
    /// Sampling weight for `point`; `None` rejects it.
    pub fn weight(&self, point: Vec3) -> Option<f64> {
        match *self {
            Self::None => Some(1.0),
            Self::InverseSquare {
                point: centre,
                distance,
            } => {
                let d = point.distance(centre);
                Some(1.0 / (d * d + distance * distance))
            }
            Self::Plane {
                point: on_plane,
                normal,
            } => ((point - on_plane).dot(normal) >= 0.0).then_some(1.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplePoint {
    pub point: Vec3,
    pub cell: i64,
    pub activity: f64,
    pub bias: f64,
}

/// Discretized activation field: uniformly sampled points inside a box,
/// weighted by the activity of the cell they land in.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivationSource {
    pub box_min: Vec3,
    pub box_max: Vec3,
    pub n_points: usize,
    pub seed: u64,
    pub time_step: usize,
    pub bias: ActivationBias,
    samples: Vec<SamplePoint>,
}

impl Default for ActivationSource {
    fn default() -> Self {
        Self {
            box_min: Vec3::new(-1.0, -1.0, -1.0),
            box_max: Vec3::new(1.0, 1.0, 1.0),
            n_points: 1000,
            seed: 12345,
            time_step: 0,
            bias: ActivationBias::None,
            samples: Vec::new(),
        }
    }
}

impl ActivationSource {
    /// Recognized keys: `<key>BoxMin`, `<key>BoxMax`, `<key>NPoints`,
    /// `<key>Seed`, `<key>TimeStep`, `<key>Bias` (`none`, `r2`, `plane`),
    /// `<key>WeightPoint`, `<key>WeightDistance`, `<key>PlanePoint`,
    /// `<key>PlaneNorm`.
    pub fn from_table(table: &ValueTable, key: &str) -> SourceResult<Self> {
        let mut source = Self::default();
        source.populate(table, key)?;
        Ok(source)
    }

    pub fn samples(&self) -> &[SamplePoint] {
        &self.samples
    }

    /// Draw up to `n_points` accepted points, trying at most ten times as
    /// many. Points outside every cell, in cells with no activity at the
    /// chosen time step, or rejected by the bias are skipped.
    pub fn sample(&mut self, locator: &dyn CellLocator, field: &ActivationField) -> usize {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let attempts = self.n_points.saturating_mul(10);
        self.samples.clear();
        for _ in 0..attempts {
            if self.samples.len() >= self.n_points {
                break;
            }
            let point = Vec3::new(
                draw(&mut rng, self.box_min.x, self.box_max.x),
                draw(&mut rng, self.box_min.y, self.box_max.y),
                draw(&mut rng, self.box_min.z, self.box_max.z),
            );
            let Some(cell) = locator.cell_at(point) else {
                continue;
            };
            let Some(activity) = field.activity(cell, self.time_step).filter(|a| *a > 0.0)
            else {
                continue;
            };
            let Some(bias) = self.bias.weight(point) else {
                continue;
            };
            self.samples.push(SamplePoint {
                point,
                cell,
                activity,
                bias,
            });
        }
        if self.samples.len() < self.n_points {
            warn!(
                accepted = self.samples.len(),
                requested = self.n_points,
                "activation sampling ran out of attempts"
            );
        }
        debug!(accepted = self.samples.len(), seed = self.seed, "activation sampled");
        self.samples.len()
    }
}

fn draw(rng: &mut StdRng, lo: f64, hi: f64) -> f64 {
    if lo < hi { rng.gen_range(lo..hi) } else { lo }
}

impl CardEmitter for ActivationSource {
    const KIND: SourceKind = SourceKind::Activation;

    fn populate(&mut self, table: &ValueTable, key: &str) -> SourceResult<()> {
        self.box_min = table.evaluate_or(&format!("{key}BoxMin"), self.box_min)?;
        self.box_max = table.evaluate_or(&format!("{key}BoxMax"), self.box_max)?;
        self.n_points = table.evaluate_or(&format!("{key}NPoints"), self.n_points)?;
        let seed: usize = table.evaluate_or(&format!("{key}Seed"), self.seed as usize)?;
        self.seed = seed as u64;
        self.time_step = table.evaluate_or(&format!("{key}TimeStep"), self.time_step)?;

        let inverted = self.box_max.x < self.box_min.x
            || self.box_max.y < self.box_min.y
            || self.box_max.z < self.box_min.z;
        if inverted || self.n_points == 0 {
            return Err(SourceError::configuration(
                "CONFIG.ACTIVATION_BOX",
                format!("{key}BoxMax must not be below {key}BoxMin and {key}NPoints > 0"),
            ));
        }

        let bias: String = table.evaluate_or(&format!("{key}Bias"), "none".to_string())?;
        self.bias = match bias.trim().to_ascii_lowercase().as_str() {
            "none" => ActivationBias::None,
            "r2" => ActivationBias::InverseSquare {
                point: table.evaluate(&format!("{key}WeightPoint"))?,
                distance: table.evaluate_or(&format!("{key}WeightDistance"), 1.0)?,
            },
            "plane" => ActivationBias::Plane {
                point: table.evaluate(&format!("{key}PlanePoint"))?,
                normal: table.evaluate::<Vec3>(&format!("{key}PlaneNorm"))?.unit(),
            },
            other => {
                return Err(SourceError::configuration(
                    "CONFIG.ACTIVATION_BIAS",
                    format!("{key}Bias '{}' is not none, r2 or plane", other),
                ));
            }
        };
        self.samples.clear();
        Ok(())
    }
}

impl McnpEmitter for ActivationSource {
    fn create_source(&self, base: &SourceBase, card: &mut SourceCard) -> SourceResult<()> {
        if self.samples.is_empty() {
            return Err(SourceError::validation(
                "INPUT.ACTIVATION_EMPTY",
                format!("activation source '{}' has no sampled points", base.key()),
            ));
        }
        base.particle_components(card);
        base.energy_components(card, 2)?;

        let points = self
            .samples
            .iter()
            .flat_map(|sample| sample.point.to_array())
            .collect::<Vec<_>>();
        let mut prob = SourceProb::from_values(
            self.samples.iter().map(|sample| sample.activity).collect(),
        );
        prob.normalize();
        let mut record = SourceData::new(1)
            .with_info(SourceInfo::from_values('l', points))
            .with_prob(prob);
        if self.bias != ActivationBias::None {
            let mut bias =
                SourceBias::from_values(self.samples.iter().map(|sample| sample.bias).collect());
            bias.normalize();
            record = record.with_bias(bias);
        }
        card.set_data("pos", record);
        Ok(())
    }
}
