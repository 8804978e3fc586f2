pub mod converters;
pub mod date;
pub mod key_path;
pub mod property;
pub mod submodel;
pub mod wrap_model;

pub use crate::domain::model::{JsonMap, ModelArchive, SerializeMode};
pub use crate::domain::ports::{Convert, ModelSerializing};
pub use crate::utils::error::Result;
pub use property::{AnyProperty, Location, Property};
pub use wrap_model::{Model, WrapModel};
