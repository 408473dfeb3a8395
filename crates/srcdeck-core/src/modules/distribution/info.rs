use crate::modules::serialization::{format_doubles, write_mcnp_card};

/// Abscissa unit of a distribution (`si` card).
///
/// Holds either numeric points or symbolic entries, never both: setting one
/// clears the other.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SourceInfo {
    option: Option<char>,
    values: Vec<f64>,
    strings: Vec<String>,
}

impl SourceInfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// `h` histogram bounds, `a` point-wise density, `l` discrete values,
    /// `s` distribution numbers.
    pub fn with_option(option: char) -> Self {
        Self {
            option: Some(option.to_ascii_lowercase()),
            ..Self::default()
        }
    }

    pub fn from_values(option: char, values: Vec<f64>) -> Self {
        let mut info = Self::with_option(option);
        info.set_data(values);
        info
    }

    pub fn option(&self) -> Option<char> {
        self.option
    }

    pub fn set_option(&mut self, option: Option<char>) {
        self.option = option.map(|c| c.to_ascii_lowercase());
    }

    pub fn set_data(&mut self, values: Vec<f64>) {
        self.strings.clear();
        self.values = values;
    }

    pub fn add_data(&mut self, value: f64) {
        self.strings.clear();
        self.values.push(value);
    }

    pub fn set_strings(&mut self, strings: Vec<String>) {
        self.values.clear();
        self.strings = strings;
    }

    pub fn add_string(&mut self, entry: impl Into<String>) {
        self.values.clear();
        self.strings.push(entry.into());
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub(crate) fn values_mut(&mut self) -> &mut Vec<f64> {
        &mut self.values
    }

    pub fn strings(&self) -> &[String] {
        &self.strings
    }

    pub fn len(&self) -> usize {
        self.values.len().max(self.strings.len())
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.strings.is_empty()
    }

    pub fn card_line(&self, index: usize) -> String {
        let mut line = format!("si{}", index);
        if let Some(option) = self.option {
            line.push(' ');
            line.push(option);
        }
        let body = if self.strings.is_empty() {
            format_doubles(&self.values)
        } else {
            self.strings.join(" ")
        };
        if !body.is_empty() {
            line.push(' ');
            line.push_str(&body);
        }
        line
    }

    pub fn write(&self, index: usize, out: &mut String) {
        write_mcnp_card(&self.card_line(index), out);
    }
}
