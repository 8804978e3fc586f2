// Domain layer: value types and the seams (traits) the model engine is built on.

pub mod model;
pub mod ports;
pub mod tri_state;
