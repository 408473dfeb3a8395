use super::law::ParametricLaw;
use crate::domain::SourceResult;
use crate::modules::serialization::{format_doubles, write_mcnp_card};
use std::marker::PhantomData;

pub trait WeightCard {
    const PREFIX: &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProbabilityCard;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BiasCard;

impl WeightCard for ProbabilityCard {
    const PREFIX: &'static str = "sp";
}

impl WeightCard for BiasCard {
    const PREFIX: &'static str = "sb";
}

/// Weight unit of a distribution: an explicit table or a parametric law,
/// never both.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Weights<C> {
    option: Option<char>,
    law: Option<ParametricLaw>,
    values: Vec<f64>,
    card: PhantomData<C>,
}

pub type SourceProb = Weights<ProbabilityCard>;
pub type SourceBias = Weights<BiasCard>;

impl<C: WeightCard> Weights<C> {
    pub fn new() -> Self {
        Self {
            option: None,
            law: None,
            values: Vec::new(),
            card: PhantomData,
        }
    }

    /// `d` density (default), `c` cumulative, `v` cell volume, `w` weights.
    pub fn with_option(option: char) -> Self {
        Self {
            option: Some(option.to_ascii_lowercase()),
            ..Self::new()
        }
    }

    pub fn from_values(values: Vec<f64>) -> Self {
        let mut weights = Self::new();
        weights.set_data(values);
        weights
    }

    pub fn from_law(law: ParametricLaw, params: &[f64]) -> SourceResult<Self> {
        let mut weights = Self::new();
        weights.set_law(law, params)?;
        Ok(weights)
    }

    pub fn option(&self) -> Option<char> {
        self.option
    }

    pub fn set_option(&mut self, option: Option<char>) {
        self.option = option.map(|c| c.to_ascii_lowercase());
    }

    /// Explicit table mode; drops any parametric law.
    pub fn set_data(&mut self, values: Vec<f64>) {
        self.law = None;
        self.values = values;
    }

    pub fn add_data(&mut self, value: f64) {
        if self.law.take().is_some() {
            self.values.clear();
        }
        self.values.push(value);
    }

    /// Parametric mode from a raw negative code. Nothing changes on error.
    pub fn set_fminus(&mut self, code: i32, params: &[f64]) -> SourceResult<()> {
        let law = ParametricLaw::parse_code(code)?;
        self.set_law(law, params)
    }

    pub fn set_law(&mut self, law: ParametricLaw, params: &[f64]) -> SourceResult<()> {
        law.check_parameters(params)?;
        self.law = Some(law);
        self.values = params.to_vec();
        Ok(())
    }

    pub fn law(&self) -> Option<ParametricLaw> {
        self.law
    }

    /// Negative law code, or 0 in explicit table mode.
    pub fn minus_f(&self) -> i32 {
        self.law.map_or(0, ParametricLaw::code)
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub(crate) fn values_mut(&mut self) -> &mut Vec<f64> {
        &mut self.values
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Scale explicit values to unit sum. Returns false when there is nothing
    /// to normalize (law mode, empty, or zero total).
    pub fn normalize(&mut self) -> bool {
        if self.law.is_some() {
            return false;
        }
        let total: f64 = self.values.iter().sum();
        if total.abs() <= f64::MIN_POSITIVE {
            return false;
        }
        for value in &mut self.values {
            *value /= total;
        }
        true
    }

    pub fn card_line(&self, index: usize) -> String {
        let mut line = format!("{}{}", C::PREFIX, index);
        match self.law {
            Some(law) => {
                line.push_str(&format!(" {}", law.code()));
            }
            None => {
                if let Some(option) = self.option {
                    line.push(' ');
                    line.push(option);
                }
            }
        }
        if !self.values.is_empty() {
            line.push(' ');
            line.push_str(&format_doubles(&self.values));
        }
        line
    }

    pub fn write(&self, index: usize, out: &mut String) {
        write_mcnp_card(&self.card_line(index), out);
    }
}
