//! Dependent-distribution terms (`ds` cards): a variable whose value, or whose
//! whole distribution, is picked by the realized bin of another variable.

use super::distribution::{SourceBias, SourceInfo, SourceProb};
use super::serialization::{format_double, write_mcnp_card};

pub trait CardValue: Clone {
    fn card_text(&self) -> String;
}

impl CardValue for f64 {
    fn card_text(&self) -> String {
        format_double(*self)
    }
}

impl CardValue for i64 {
    fn card_text(&self) -> String {
        self.to_string()
    }
}

impl CardValue for String {
    fn card_text(&self) -> String {
        self.clone()
    }
}

/// "Take the Nth value when `key` realized its Nth bin."
#[derive(Debug, Clone, PartialEq)]
pub struct DsTerm<T> {
    option: char,
    key: String,
    values: Vec<T>,
}

impl<T: CardValue> DsTerm<T> {
    pub fn new(option: char, key: impl Into<String>) -> Self {
        Self {
            option: option.to_ascii_lowercase(),
            key: key.into(),
            values: Vec::new(),
        }
    }

    pub fn with_values(option: char, key: impl Into<String>, values: Vec<T>) -> Self {
        Self {
            values,
            ..Self::new(option, key)
        }
    }

    pub fn add_data(&mut self, value: T) {
        self.values.push(value);
    }

    pub fn set_data(&mut self, values: Vec<T>) {
        self.values = values;
    }

    pub fn option(&self) -> char {
        self.option
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn card_line(&self, index: usize) -> String {
        let mut line = format!("ds{} {}", index, self.option);
        for value in &self.values {
            line.push(' ');
            line.push_str(&value.card_text());
        }
        line
    }
}

/// One nested distribution of a [`DsIndex`] table, written under its own
/// card number.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DsTableEntry {
    pub index: usize,
    pub info: Option<SourceInfo>,
    pub bias: Option<SourceBias>,
    pub prob: Option<SourceProb>,
}

impl DsTableEntry {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            ..Self::default()
        }
    }

    pub fn with_info(mut self, info: SourceInfo) -> Self {
        self.info = Some(info);
        self
    }

    pub fn with_prob(mut self, prob: SourceProb) -> Self {
        self.prob = Some(prob);
        self
    }

    pub fn with_bias(mut self, bias: SourceBias) -> Self {
        self.bias = Some(bias);
        self
    }

    fn write(&self, out: &mut String) {
        if let Some(info) = &self.info {
            info.write(self.index, out);
        }
        if let Some(prob) = &self.prob {
            prob.write(self.index, out);
        }
        if let Some(bias) = &self.bias {
            bias.write(self.index, out);
        }
    }
}

/// `ds<n> s i1 i2 ...`: the outer variable's bin selects a whole nested
/// distribution.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DsIndex {
    key: String,
    table: Vec<DsTableEntry>,
}

impl DsIndex {
    pub const OPTION: char = 's';

    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            table: Vec::new(),
        }
    }

    pub fn add_entry(&mut self, entry: DsTableEntry) {
        self.table.push(entry);
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn entries(&self) -> &[DsTableEntry] {
        &self.table
    }

    pub fn card_line(&self, index: usize) -> String {
        let mut line = format!("ds{} {}", index, Self::OPTION);
        for entry in &self.table {
            line.push_str(&format!(" {}", entry.index));
        }
        line
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DependentTerm {
    Double(DsTerm<f64>),
    Int(DsTerm<i64>),
    Index(DsIndex),
}

impl DependentTerm {
    /// Name of the independent variable (`erg`, `dir`, ...).
    pub fn key(&self) -> &str {
        match self {
            Self::Double(term) => term.key(),
            Self::Int(term) => term.key(),
            Self::Index(table) => table.key(),
        }
    }

    /// Card numbers of nested distributions written alongside this term.
    pub fn nested_indices(&self) -> Vec<usize> {
        match self {
            Self::Index(table) => table.entries().iter().map(|entry| entry.index).collect(),
            Self::Double(_) | Self::Int(_) => Vec::new(),
        }
    }

    pub fn write(&self, index: usize, out: &mut String) {
        match self {
            Self::Double(term) => write_mcnp_card(&term.card_line(index), out),
            Self::Int(term) => write_mcnp_card(&term.card_line(index), out),
            Self::Index(table) => {
                write_mcnp_card(&table.card_line(index), out);
                for entry in table.entries() {
                    entry.write(out);
                }
            }
        }
    }
}

impl From<DsTerm<f64>> for DependentTerm {
    fn from(term: DsTerm<f64>) -> Self {
        Self::Double(term)
    }
}

impl From<DsTerm<i64>> for DependentTerm {
    fn from(term: DsTerm<i64>) -> Self {
        Self::Int(term)
    }
}

impl From<DsIndex> for DependentTerm {
    fn from(table: DsIndex) -> Self {
        Self::Index(table)
    }
}

#[cfg(test)]
mod tests {
    use super::{DependentTerm, DsIndex, DsTableEntry, DsTerm};
    use crate::modules::distribution::{SourceInfo, SourceProb};

    #[test]
    fn simple_term_lists_option_and_values() {
        let term = DsTerm::with_values('L', "erg", vec![0.9, 0.95, 1.0]);
        assert_eq!(term.card_line(2), "ds2 l 0.9 0.95 1.0");

        let mut ints = DsTerm::<i64>::new('s', "dir");
        ints.add_data(3);
        ints.add_data(4);
        assert_eq!(DependentTerm::from(ints).key(), "dir");
    }

    #[test]
    fn index_table_writes_nested_distributions() {
        let mut table = DsIndex::new("dir");
        for (index, energy) in [(3, 10.0), (4, 20.0)] {
            table.add_entry(
                DsTableEntry::new(index)
                    .with_info(SourceInfo::from_values('h', vec![0.0, energy]))
                    .with_prob(SourceProb::from_values(vec![0.0, 1.0])),
            );
        }
        let term = DependentTerm::from(table);
        assert_eq!(term.nested_indices(), vec![3, 4]);

        let mut out = String::new();
        term.write(2, &mut out);
        assert_eq!(
            out,
            "ds2 s 3 4\nsi3 h 0.0 10.0\nsp3 0.0 1.0\nsi4 h 0.0 20.0\nsp4 0.0 1.0\n"
        );
    }
}
