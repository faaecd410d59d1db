//! Data structures for expression analysis

mod count_matrix;
mod design;

pub use count_matrix::CountMatrix;
pub use design::{Condition, SampleDesign};
