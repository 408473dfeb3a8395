pub mod constants;
pub mod fixed;
pub mod geometry;
pub mod particle;
pub mod values;
