//! `sdef` card assembler: named scalar components plus the numbered
//! distribution records they reference.

use super::record::SourceData;
use super::serialization::{format_double, format_general, write_mcnp_card};
use crate::common::geometry::{CoordinateTransform, Vec3};
use crate::domain::{SourceError, SourceResult};
use std::collections::BTreeSet;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum Component {
    Double(f64),
    Int(i64),
    Vector(Vec3),
    Text(String),
    /// `name=d<n>`
    Data(usize),
    /// `name=f<on>=d<n>`
    Dependent { on: String, index: usize },
}

impl Component {
    pub fn card_text(&self) -> String {
        match self {
            Self::Double(value) => format_double(*value),
            Self::Int(value) => value.to_string(),
            Self::Vector(value) => format!(
                "{} {} {}",
                format_double(value.x),
                format_double(value.y),
                format_double(value.z)
            ),
            Self::Text(value) => value.clone(),
            Self::Data(index) => format!("d{}", index),
            Self::Dependent { on, index } => format!("f{}=d{}", on, index),
        }
    }

    pub fn is_data(&self) -> bool {
        matches!(self, Self::Data(_) | Self::Dependent { .. })
    }
}

impl From<f64> for Component {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<i64> for Component {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Component {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<usize> for Component {
    fn from(value: usize) -> Self {
        Self::Int(value as i64)
    }
}

impl From<Vec3> for Component {
    fn from(value: Vec3) -> Self {
        Self::Vector(value)
    }
}

impl From<&str> for Component {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SourceCard {
    active: bool,
    components: Vec<(String, Component)>,
    records: Vec<(String, SourceData)>,
    transform: Option<CoordinateTransform>,
}

impl SourceCard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_active(&mut self) {
        self.active = true;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Store or replace a named component; a replaced name keeps its slot.
    pub fn set_comp(&mut self, name: &str, value: impl Into<Component>) {
        let value = value.into();
        if !value.is_data() {
            self.records.retain(|(key, _)| key != name);
        }
        match self.components.iter_mut().find(|(key, _)| key == name) {
            Some((_, slot)) => *slot = value,
            None => self.components.push((name.to_string(), value)),
        }
    }

    /// Attach a distribution record to `name`; the component becomes a
    /// `d<n>` (or `f<key>=d<n>`) reference.
    pub fn set_data(&mut self, name: &str, record: SourceData) {
        let reference = match record.dependent() {
            Some(term) => Component::Dependent {
                on: term.key().to_string(),
                index: record.index(),
            },
            None => Component::Data(record.index()),
        };
        self.set_comp(name, reference);
        match self.records.iter_mut().find(|(key, _)| key == name) {
            Some((_, slot)) => *slot = record,
            None => self.records.push((name.to_string(), record)),
        }
    }

    /// Emit `tr=<n>` and write the transform card after the distributions.
    pub fn set_transform(&mut self, transform: CoordinateTransform) {
        self.set_comp("tr", transform.number());
        self.transform = Some(transform);
    }

    pub fn component(&self, name: &str) -> Option<&Component> {
        self.components
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    pub fn component_names(&self) -> impl Iterator<Item = &str> {
        self.components.iter().map(|(name, _)| name.as_str())
    }

    pub fn data(&self, name: &str) -> Option<&SourceData> {
        self.records
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, record)| record)
    }

    pub fn data_mut(&mut self, name: &str) -> Option<&mut SourceData> {
        self.records
            .iter_mut()
            .find(|(key, _)| key == name)
            .map(|(_, record)| record)
    }

    pub fn transform(&self) -> Option<&CoordinateTransform> {
        self.transform.as_ref()
    }

    pub fn header_line(&self) -> String {
        let mut line = String::from("sdef");
        for (name, value) in &self.components {
            line.push_str(&format!(" {}={}", name, value.card_text()));
        }
        line
    }

    fn check_card_numbers(&self) -> SourceResult<()> {
        let mut seen = BTreeSet::new();
        for (name, record) in &self.records {
            for number in record.card_numbers() {
                if !seen.insert(number) {
                    return Err(SourceError::validation(
                        "INPUT.DUPLICATE_CARD_NUMBER",
                        format!(
                            "distribution number {} used twice (component '{}')",
                            number, name
                        ),
                    ));
                }
            }
        }
        Ok(())
    }

    /// `sdef` line, then the records by ascending number, then the transform.
    /// An inactive card writes nothing.
    pub fn write(&self, out: &mut String) -> SourceResult<()> {
        if !self.active {
            warn!("source card is inactive; nothing written");
            return Ok(());
        }
        self.check_card_numbers()?;

        write_mcnp_card(&self.header_line(), out);
        let mut records = self.records.iter().map(|(_, record)| record).collect::<Vec<_>>();
        records.sort_by_key(|record| record.index());
        for record in &records {
            record.write(out);
        }
        if let Some(transform) = &self.transform {
            let values = transform
                .values()
                .iter()
                .map(|value| format_general(*value, 8))
                .collect::<Vec<_>>()
                .join(" ");
            write_mcnp_card(&format!("tr{} {}", transform.number(), values), out);
        }
        debug!(
            components = self.components.len(),
            records = records.len(),
            "sdef card written"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Component, SourceCard};
    use crate::common::geometry::{CoordinateFrame, CoordinateTransform, Vec3};
    use crate::modules::dependent::DsTerm;
    use crate::modules::distribution::{ParametricLaw, SourceInfo, SourceProb};
    use crate::modules::record::SourceData;

    fn gaussian(index: usize, width: f64) -> SourceData {
        SourceData::new(index)
            .with_prob(SourceProb::from_law(ParametricLaw::Gaussian, &[width, 0.0]).expect("law"))
    }

    #[test]
    fn inactive_card_writes_nothing() {
        let mut card = SourceCard::new();
        card.set_comp("par", "n");
        let mut out = String::new();
        card.write(&mut out).expect("write");
        assert!(out.is_empty());
    }

    #[test]
    fn header_keeps_registration_order_and_references_records() {
        let mut card = SourceCard::new();
        card.set_active();
        card.set_comp("par", "h");
        card.set_comp("erg", 50.0);
        card.set_data("z", gaussian(2, 8.326));
        card.set_data("x", gaussian(1, 5.887));
        card.set_comp("y", 0.0);

        let mut out = String::new();
        card.write(&mut out).expect("write");
        assert_eq!(
            out,
            "sdef par=h erg=50.0 z=d2 x=d1 y=0.0\nsp1 -41 5.887 0.0\nsp2 -41 8.326 0.0\n"
        );
    }

    #[test]
    fn replacing_a_component_keeps_its_position_and_drops_stale_records() {
        let mut card = SourceCard::new();
        card.set_active();
        card.set_data("dir", gaussian(1, 1.0));
        card.set_comp("pos", Vec3::new(1.0, 2.0, 3.0));
        card.set_comp("dir", 1.0);

        assert_eq!(card.component_names().collect::<Vec<_>>(), vec!["dir", "pos"]);
        assert_eq!(card.component("dir"), Some(&Component::Double(1.0)));
        assert!(card.data("dir").is_none());
        assert_eq!(card.header_line(), "sdef dir=1.0 pos=1.0 2.0 3.0");
    }

    #[test]
    fn dependent_records_reference_their_key() {
        let mut card = SourceCard::new();
        card.set_active();
        let dir = SourceData::new(1)
            .with_info(SourceInfo::from_values('h', vec![0.5, 0.9, 1.0]))
            .with_prob(SourceProb::from_values(vec![0.0, 0.5, 0.5]));
        card.set_data("erg", dir);
        let dependent =
            SourceData::new(2).with_dependent(DsTerm::with_values('l', "erg", vec![0.9, 1.0]));
        card.set_data("dir", dependent);

        assert_eq!(card.header_line(), "sdef erg=d1 dir=ferg=d2");
    }

    #[test]
    fn duplicate_card_numbers_fail_before_writing() {
        let mut card = SourceCard::new();
        card.set_active();
        card.set_data("x", gaussian(1, 1.0));
        card.set_data("z", gaussian(1, 2.0));

        let mut out = String::new();
        let error = card.write(&mut out).expect_err("duplicate numbers");
        assert_eq!(error.placeholder(), "INPUT.DUPLICATE_CARD_NUMBER");
        assert!(out.is_empty());
    }

    #[test]
    fn transform_is_referenced_and_written_last() {
        let mut card = SourceCard::new();
        card.set_active();
        card.set_comp("x", 0.0);
        let frame = CoordinateFrame {
            origin: Vec3::new(0.0, 5.0, 0.0),
            ..CoordinateFrame::world()
        };
        card.set_transform(CoordinateTransform::new(3, frame));

        let mut out = String::new();
        card.write(&mut out).expect("write");
        assert_eq!(out, "sdef x=0.0 tr=3\ntr3 0 5 0 1 0 0 0 1 0 0 0 1\n");
    }
}
