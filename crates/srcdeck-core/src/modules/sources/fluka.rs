use super::base::SourceBase;
use crate::common::values::ValueTable;
use crate::domain::{SourceError, SourceKind, SourceResult};
use crate::modules::serialization::fluka_card;
use crate::modules::traits::{CardEmitter, FlukaEmitter};

pub const SOURCE_WHATS: usize = 18;

/// `SOURCE` card plus the `&` (WHAT 7-12) and `&&` (WHAT 13-18)
/// continuations, each written only when one of its fields is set.
fn source_cards(whats: &[Option<f64>; SOURCE_WHATS], sdum: &str, lines: &mut Vec<String>) {
    for (block, continuation) in ["", "&", "&&"].into_iter().enumerate() {
        let mut fields = [None; 6];
        fields.copy_from_slice(&whats[block * 6..block * 6 + 6]);
        if block == 0 {
            lines.push(fluka_card("SOURCE", fields, sdum));
        } else if fields.iter().any(Option::is_some) {
            lines.push(fluka_card("SOURCE", fields, continuation));
        }
    }
}

/// User `source.f` routine driven by up to 18 WHAT values and an SDUM.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FlukaSource {
    pub whats: [Option<f64>; SOURCE_WHATS],
    pub sdum: String,
}

impl FlukaSource {
    /// Recognized keys: `<key>What1` .. `<key>What18`, `<key>SDum`.
    pub fn from_table(table: &ValueTable, key: &str) -> SourceResult<Self> {
        let mut source = Self::default();
        source.populate(table, key)?;
        Ok(source)
    }
}

impl CardEmitter for FlukaSource {
    const KIND: SourceKind = SourceKind::FlukaSource;

    fn populate(&mut self, table: &ValueTable, key: &str) -> SourceResult<()> {
        for (index, what) in self.whats.iter_mut().enumerate() {
            let name = format!("{key}What{}", index + 1);
            if table.has(&name) {
                *what = Some(table.evaluate(&name)?);
            }
        }
        self.sdum = table.evaluate_or(&format!("{key}SDum"), self.sdum.clone())?;
        Ok(())
    }
}

impl FlukaEmitter for FlukaSource {
    fn write_fluka(&self, base: &SourceBase, lines: &mut Vec<String>) -> SourceResult<()> {
        base.fluka_beam_cards(base.fluka_energy()?, 0.0, [0.0, 0.0], false, lines);
        source_cards(&self.whats, &self.sdum, lines);
        Ok(())
    }
}

/// Externally compiled source routine selected by type name; the BEAM card
/// carries the top of the energy grid so FLUKA sizes its tables.
#[derive(Debug, Clone, PartialEq)]
pub struct FlukaExternalSource {
    pub external_type: String,
    pub values: Vec<f64>,
}

impl Default for FlukaExternalSource {
    fn default() -> Self {
        Self {
            external_type: "EXTERN".to_string(),
            values: Vec::new(),
        }
    }
}

impl FlukaExternalSource {
    /// Recognized keys: `<key>ExtType`, `<key>NValue`, `<key>Value1` ..
    pub fn from_table(table: &ValueTable, key: &str) -> SourceResult<Self> {
        let mut source = Self::default();
        source.populate(table, key)?;
        Ok(source)
    }
}

impl CardEmitter for FlukaExternalSource {
    const KIND: SourceKind = SourceKind::FlukaExternal;

    fn populate(&mut self, table: &ValueTable, key: &str) -> SourceResult<()> {
        self.external_type =
            table.evaluate_or(&format!("{key}ExtType"), self.external_type.clone())?;
        let count: usize = table.evaluate_or(&format!("{key}NValue"), self.values.len())?;
        if count > SOURCE_WHATS {
            return Err(SourceError::configuration(
                "CONFIG.FLUKA_WHAT",
                format!("{key}NValue is {count}; SOURCE takes at most {SOURCE_WHATS} values"),
            ));
        }
        self.values = (1..=count)
            .map(|index| table.evaluate::<f64>(&format!("{key}Value{index}")))
            .collect::<Result<_, _>>()?;
        Ok(())
    }
}

impl FlukaEmitter for FlukaExternalSource {
    fn write_fluka(&self, base: &SourceBase, lines: &mut Vec<String>) -> SourceResult<()> {
        let energy = base.energy().iter().copied().fold(f64::MIN, f64::max);
        base.fluka_beam_cards(energy, 0.0, [0.0, 0.0], false, lines);
        let mut whats = [None; SOURCE_WHATS];
        for (slot, value) in whats.iter_mut().zip(&self.values) {
            *slot = Some(*value);
        }
        source_cards(&whats, &self.external_type, lines);
        Ok(())
    }
}
