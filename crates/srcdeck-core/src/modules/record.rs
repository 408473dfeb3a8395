//! Numbered distribution record: the `si`/`sp`/`sb`/`ds` cards behind one
//! `d<n>` reference on the sdef line.

use super::dependent::DependentTerm;
use super::distribution::{SourceBias, SourceInfo, SourceProb};
use crate::common::constants::CUT_TOL;
use crate::domain::{SourceError, SourceResult};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct SourceData {
    index: usize,
    info: Option<SourceInfo>,
    bias: Option<SourceBias>,
    prob: Option<SourceProb>,
    dependent: Option<DependentTerm>,
}

impl SourceData {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            info: None,
            bias: None,
            prob: None,
            dependent: None,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    pub fn set_info(&mut self, info: SourceInfo) {
        self.info = Some(info);
    }

    pub fn set_prob(&mut self, prob: SourceProb) {
        self.prob = Some(prob);
    }

    pub fn set_bias(&mut self, bias: SourceBias) {
        self.bias = Some(bias);
    }

    pub fn set_dependent(&mut self, term: impl Into<DependentTerm>) {
        self.dependent = Some(term.into());
    }

    pub fn with_info(mut self, info: SourceInfo) -> Self {
        self.set_info(info);
        self
    }

    pub fn with_prob(mut self, prob: SourceProb) -> Self {
        self.set_prob(prob);
        self
    }

    pub fn with_bias(mut self, bias: SourceBias) -> Self {
        self.set_bias(bias);
        self
    }

    pub fn with_dependent(mut self, term: impl Into<DependentTerm>) -> Self {
        self.set_dependent(term);
        self
    }

    pub fn info(&self) -> Option<&SourceInfo> {
        self.info.as_ref()
    }

    pub fn prob(&self) -> Option<&SourceProb> {
        self.prob.as_ref()
    }

    pub fn bias(&self) -> Option<&SourceBias> {
        self.bias.as_ref()
    }

    pub fn dependent(&self) -> Option<&DependentTerm> {
        self.dependent.as_ref()
    }

    pub fn is_dependent(&self) -> bool {
        self.dependent.is_some()
    }

    /// Every card number this record writes, its own first.
    pub fn card_numbers(&self) -> Vec<usize> {
        let mut numbers = vec![self.index];
        if let Some(term) = &self.dependent {
            numbers.extend(term.nested_indices());
        }
        numbers
    }

    /// Scale explicit probabilities to unit sum; laws are left alone.
    pub fn normalize(&mut self) -> bool {
        self.prob.as_mut().is_some_and(SourceProb::normalize)
    }

    /// Drop the part of the table below `cut`.
    ///
    /// The bin holding `cut` keeps the fraction of its mass above the cut, the
    /// first abscissa becomes exactly `cut` and the remainder is renormalized.
    /// Point-wise (`a`) tables interpolate the density at `cut` instead.
    /// Absent tables, laws and cuts outside the table are no-ops; a
    /// length mismatch is a logic error and leaves the record untouched.
    /// So does a cut that leaves no mass above it (`INPUT.CUT_EMPTY`).
    pub fn cut_value(&mut self, cut: f64) -> SourceResult<()> {
        let (Some(info), Some(prob)) = (self.info.as_mut(), self.prob.as_mut()) else {
            return Ok(());
        };
        if prob.law().is_some() {
            debug!(index = self.index, "cut skipped: parametric law in use");
            return Ok(());
        }
        let xs = info.values();
        if xs.len() != prob.values().len() {
            return Err(SourceError::internal(
                "LOGIC.CUT_SIZE_MISMATCH",
                format!(
                    "si{} has {} entries but sp{} has {}",
                    self.index,
                    xs.len(),
                    self.index,
                    prob.values().len()
                ),
            ));
        }
        let Some(bin) = (0..xs.len().saturating_sub(1)).find(|&i| xs[i] <= cut && cut < xs[i + 1])
        else {
            warn!(index = self.index, cut, "cut value outside table; nothing removed");
            return Ok(());
        };

        let pointwise = info.option() == Some('a');
        let width = xs[bin + 1] - xs[bin];
        let upper_fraction = (xs[bin + 1] - cut) / width;
        let saved = (xs.to_vec(), prob.values().to_vec());

        let xs = info.values_mut();
        let ps = prob.values_mut();
        if pointwise {
            let lower_fraction = 1.0 - upper_fraction;
            ps[bin] += (ps[bin + 1] - ps[bin]) * lower_fraction;
            xs[bin] = cut;
            xs.drain(..bin);
            ps.drain(..bin);
        } else if upper_fraction <= CUT_TOL {
            xs.drain(..=bin);
            ps.drain(..=bin);
            xs[0] = cut;
            ps[0] = 0.0;
        } else {
            ps[bin + 1] *= upper_fraction;
            xs[bin] = cut;
            xs.drain(..bin);
            ps.drain(..bin);
            ps[0] = 0.0;
        }
        let remaining = xs.len();
        if !prob.normalize() {
            *info.values_mut() = saved.0;
            *prob.values_mut() = saved.1;
            return Err(SourceError::validation(
                "INPUT.CUT_EMPTY",
                format!(
                    "sp{} has no probability above the cut at {}",
                    self.index, cut
                ),
            ));
        }
        debug!(index = self.index, cut, remaining, "table cut");
        Ok(())
    }

    /// Cards in the order `si`, `sp`, `sb`, `ds` (plus nested tables).
    pub fn write(&self, out: &mut String) {
        if let Some(info) = &self.info {
            info.write(self.index, out);
        }
        if let Some(prob) = &self.prob {
            prob.write(self.index, out);
        }
        if let Some(bias) = &self.bias {
            bias.write(self.index, out);
        }
        if let Some(term) = &self.dependent {
            term.write(self.index, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SourceData;
    use crate::modules::dependent::{DsIndex, DsTableEntry, DsTerm};
    use crate::modules::distribution::{ParametricLaw, SourceInfo, SourceProb};

    fn histogram(xs: Vec<f64>, ps: Vec<f64>) -> SourceData {
        SourceData::new(1)
            .with_info(SourceInfo::from_values('h', xs))
            .with_prob(SourceProb::from_values(ps))
    }

    fn total(record: &SourceData) -> f64 {
        record.prob().expect("prob").values().iter().sum()
    }

    #[test]
    fn cut_inside_bin_keeps_upper_fraction_and_renormalizes() {
        let mut record = histogram(vec![0.0, 1.0, 2.0, 4.0], vec![0.0, 0.2, 0.3, 0.5]);
        record.cut_value(1.5).expect("cut");

        let info = record.info().expect("info");
        assert_eq!(info.values(), [1.5, 2.0, 4.0]);
        assert!((total(&record) - 1.0).abs() < 1.0e-6);

        let ps = record.prob().expect("prob").values();
        assert_eq!(ps[0], 0.0);
        assert!((ps[1] - 0.15 / 0.65).abs() < 1.0e-12);
        assert!((ps[2] - 0.5 / 0.65).abs() < 1.0e-12);
    }

    #[test]
    fn cut_property_holds_over_many_positions() {
        let xs = vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 20.0];
        let ps = vec![0.0, 3.0, 1.0, 4.0, 1.0, 5.0, 9.0];
        for step in 1..200 {
            let cut = 0.1 + (20.0 - 0.1) * step as f64 / 200.0;
            let mut record = histogram(xs.clone(), ps.clone());
            record.cut_value(cut).expect("cut");
            assert_eq!(record.info().expect("info").values()[0], cut);
            assert!(
                (total(&record) - 1.0).abs() < 1.0e-6,
                "cut {} left total {}",
                cut,
                total(&record)
            );
        }
    }

    #[test]
    fn cut_on_bin_boundary_moves_to_next_entry() {
        let mut record = histogram(vec![0.0, 1.0, 2.0], vec![0.0, 0.5, 0.5]);
        record.cut_value(1.0).expect("cut");
        assert_eq!(record.info().expect("info").values(), [1.0, 2.0]);
        assert_eq!(record.prob().expect("prob").values(), [0.0, 1.0]);
    }

    #[test]
    fn pointwise_tables_interpolate_density() {
        let mut record = SourceData::new(2)
            .with_info(SourceInfo::from_values('a', vec![0.0, 2.0, 4.0]))
            .with_prob(SourceProb::from_values(vec![1.0, 3.0, 5.0]));
        record.cut_value(1.0).expect("cut");
        assert_eq!(record.info().expect("info").values(), [1.0, 2.0, 4.0]);
        let ps = record.prob().expect("prob").values();
        assert!((ps[0] - 2.0 / 10.0).abs() < 1.0e-12);
        assert!((total(&record) - 1.0).abs() < 1.0e-9);
    }

    #[test]
    fn cut_outside_table_or_with_law_is_noop() {
        let original = histogram(vec![1.0, 2.0], vec![0.0, 1.0]);
        for cut in [0.5, 2.0, 7.0] {
            let mut record = original.clone();
            record.cut_value(cut).expect("noop");
            assert_eq!(record, original);
        }

        let mut law = SourceData::new(1)
            .with_info(SourceInfo::from_values('h', vec![0.0, 3.0]))
            .with_prob(SourceProb::from_law(ParametricLaw::PowerLaw, &[1.0]).expect("law"));
        let before = law.clone();
        law.cut_value(1.0).expect("noop");
        assert_eq!(law, before);

        let mut empty = SourceData::new(9);
        empty.cut_value(1.0).expect("noop");
    }

    #[test]
    fn cut_with_mismatched_lengths_is_a_logic_error() {
        let mut record = histogram(vec![0.0, 1.0, 2.0], vec![0.0, 1.0]);
        let before = record.clone();
        let error = record.cut_value(0.5).expect_err("mismatch");
        assert_eq!(error.placeholder(), "LOGIC.CUT_SIZE_MISMATCH");
        assert_eq!(record, before);
    }

    #[test]
    fn cut_with_no_mass_above_fails_and_keeps_table() {
        let mut record = histogram(vec![0.0, 1.0, 2.0], vec![0.0, 1.0, 0.0]);
        let before = record.clone();
        let error = record.cut_value(1.5).expect_err("nothing above the cut");
        assert_eq!(error.placeholder(), "INPUT.CUT_EMPTY");
        assert_eq!(record, before);

        let mut pointwise = SourceData::new(2)
            .with_info(SourceInfo::from_values('a', vec![0.0, 1.0, 2.0]))
            .with_prob(SourceProb::from_values(vec![1.0, 0.0, 0.0]));
        let before = pointwise.clone();
        assert!(pointwise.cut_value(1.0).is_err());
        assert_eq!(pointwise, before);
    }

    #[test]
    fn write_emits_cards_in_fixed_order() {
        let record = SourceData::new(3)
            .with_info(SourceInfo::from_values('h', vec![-1.0, 1.0]))
            .with_prob(SourceProb::from_values(vec![0.0, 1.0]))
            .with_dependent(DsTerm::with_values('l', "erg", vec![0.5, 1.0]));
        assert!(record.is_dependent());

        let mut out = String::new();
        record.write(&mut out);
        assert_eq!(out, "si3 h -1.0 1.0\nsp3 0.0 1.0\nds3 l 0.5 1.0\n");
    }

    #[test]
    fn card_numbers_include_nested_tables() {
        let mut table = DsIndex::new("dir");
        table.add_entry(DsTableEntry::new(5));
        table.add_entry(DsTableEntry::new(6));
        let record = SourceData::new(2).with_dependent(table);
        assert_eq!(record.card_numbers(), vec![2, 5, 6]);
    }
}
