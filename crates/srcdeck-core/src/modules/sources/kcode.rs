use crate::common::geometry::Vec3;
use crate::common::values::ValueTable;
use crate::domain::{SourceError, SourceKind, SourceResult};
use crate::modules::serialization::{format_general, write_mcnp_card};
use crate::modules::traits::CardEmitter;

pub const KCODE_FIELDS: usize = 8;
const KEFF_FIELD: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KCodeValue {
    Int(i64),
    Double(f64),
}

impl KCodeValue {
    fn card_text(self) -> String {
        match self {
            Self::Int(value) => value.to_string(),
            Self::Double(value) => format_general(value, 5),
        }
    }
}

/// Criticality cycle control: the `kcode` line and optional `ksrc` sites.
///
/// Field 2 is the initial k-eff guess and is always a real number; every
/// other field is an integer. `j` leaves a field at the code default.
#[derive(Debug, Clone, PartialEq)]
pub struct KCodeSource {
    fields: [Option<KCodeValue>; KCODE_FIELDS],
    points: Vec<Vec3>,
}

impl Default for KCodeSource {
    fn default() -> Self {
        let mut source = Self {
            fields: [None; KCODE_FIELDS],
            points: Vec::new(),
        };
        source.fields[0] = Some(KCodeValue::Int(1000));
        source.fields[1] = Some(KCodeValue::Double(1.0));
        source.fields[2] = Some(KCodeValue::Int(5));
        source.fields[3] = Some(KCodeValue::Int(50));
        source
    }
}

impl KCodeSource {
    /// Recognized keys: `<key>Line`, `<key>NPts`, `<key>Pt<i>`.
    pub fn from_table(table: &ValueTable, key: &str) -> SourceResult<Self> {
        let mut source = Self::default();
        source.populate(table, key)?;
        Ok(source)
    }

    pub fn fields(&self) -> &[Option<KCodeValue>; KCODE_FIELDS] {
        &self.fields
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    pub fn add_point(&mut self, point: Vec3) {
        self.points.push(point);
    }

    /// Replace the fields from a whitespace separated line.
    pub fn set_line(&mut self, line: &str) -> SourceResult<()> {
        let tokens = line.split_whitespace().collect::<Vec<_>>();
        if tokens.len() > KCODE_FIELDS {
            return Err(SourceError::validation(
                "INPUT.KCODE_FIELD",
                format!(
                    "kcode line has {} fields; at most {} are allowed",
                    tokens.len(),
                    KCODE_FIELDS
                ),
            ));
        }
        let mut fields = [None; KCODE_FIELDS];
        for (index, token) in tokens.into_iter().enumerate() {
            if token.eq_ignore_ascii_case("j") {
                continue;
            }
            let parsed = if index == KEFF_FIELD {
                token.parse::<f64>().ok().map(KCodeValue::Double)
            } else {
                token.parse::<i64>().ok().map(KCodeValue::Int)
            };
            fields[index] = Some(parsed.ok_or_else(|| {
                SourceError::validation(
                    "INPUT.KCODE_FIELD",
                    format!("kcode field {} '{}' is not a valid number", index + 1, token),
                )
            })?);
        }
        self.fields = fields;
        Ok(())
    }

    pub fn line(&self) -> String {
        let last = self.fields.iter().rposition(Option::is_some);
        let mut line = String::from("kcode");
        if let Some(last) = last {
            for field in &self.fields[..=last] {
                line.push(' ');
                match field {
                    Some(value) => line.push_str(&value.card_text()),
                    None => line.push('j'),
                }
            }
        }
        line
    }

    pub fn write(&self, out: &mut String) {
        write_mcnp_card(&self.line(), out);
        if self.points.is_empty() {
            return;
        }
        let sites = self
            .points
            .iter()
            .flat_map(|point| point.to_array())
            .map(|value| format_general(value, 5))
            .collect::<Vec<_>>()
            .join(" ");
        write_mcnp_card(&format!("ksrc {}", sites), out);
    }
}

impl CardEmitter for KCodeSource {
    const KIND: SourceKind = SourceKind::KCode;

    fn populate(&mut self, table: &ValueTable, key: &str) -> SourceResult<()> {
        let line_key = format!("{key}Line");
        if table.has(&line_key) {
            let line: String = table.evaluate(&line_key)?;
            self.set_line(&line)?;
        }
        let count: usize = table.evaluate_or(&format!("{key}NPts"), 0)?;
        self.points = (0..count)
            .map(|index| table.evaluate::<Vec3>(&format!("{key}Pt{index}")))
            .collect::<Result<_, _>>()?;
        Ok(())
    }
}
