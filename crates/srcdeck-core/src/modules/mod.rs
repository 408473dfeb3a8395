pub mod card;
pub mod dependent;
pub mod distribution;
pub mod record;
pub mod registry;
pub mod serialization;
pub mod sources;
pub mod traits;

pub use registry::BuildContext;
pub use sources::{SourceModel, SourceVariant};
pub use traits::{CardEmitter, DeckWriter, FlukaEmitter, McnpEmitter, PhitsEmitter};
