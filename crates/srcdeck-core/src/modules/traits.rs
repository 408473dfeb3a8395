use crate::common::geometry::CoordinateFrame;
use crate::common::values::ValueTable;
use crate::domain::{SourceKind, SourceResult};
use crate::modules::card::SourceCard;
use crate::modules::sources::{BaseDefaults, SourceBase};

/// Variant-specific half of a source model: its typed configuration and
/// whether its sampling needs a transform card in a given frame.
pub trait CardEmitter {
    const KIND: SourceKind;

    fn base_defaults() -> BaseDefaults {
        BaseDefaults::default()
    }

    /// Read every `<key>...` variable this variant recognizes.
    fn populate(&mut self, table: &ValueTable, key: &str) -> SourceResult<()>;

    fn needs_transform(&self, _frame: &CoordinateFrame) -> bool {
        false
    }
}

pub trait McnpEmitter: CardEmitter {
    fn create_source(&self, base: &SourceBase, card: &mut SourceCard) -> SourceResult<()>;
}

pub trait PhitsEmitter: CardEmitter {
    fn write_phits(&self, base: &SourceBase, lines: &mut Vec<String>) -> SourceResult<()>;
}

pub trait FlukaEmitter: CardEmitter {
    fn write_fluka(&self, base: &SourceBase, lines: &mut Vec<String>) -> SourceResult<()>;
}

/// Renders a complete deck fragment for one transport code.
pub trait DeckWriter {
    fn write_deck(&self, code: crate::domain::TargetCode) -> SourceResult<String>;
}
