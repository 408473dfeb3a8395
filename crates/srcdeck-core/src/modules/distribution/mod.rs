//! One independent-variable distribution: abscissa points (`si`), weights
//! (`sp`/`sb`) and the named parametric laws that replace an explicit table.

mod info;
mod law;
mod prob;

pub use info::SourceInfo;
pub use law::ParametricLaw;
pub use prob::{SourceBias, SourceProb};
