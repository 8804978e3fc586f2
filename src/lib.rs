//! Typed, lazily decoded views over JSON object data.
//!
//! A model type declares its properties as statics and keeps a [`WrapModel`]
//! handle. Values are decoded on first read and cached; mutable models record
//! changes in the same cache, and exports merge them back into JSON.

pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use crate::config::WrapConfig;
pub use crate::core::converters::{
    Array, Bool, BoolOutput, ConvertibleEnum, Dict, Double, Enum, Float, Int, IntFromString,
    OptArray, OptBool, OptDict, OptInt, OptIntFromString, OptStr, Str,
};
pub use crate::core::date::{Date, DateFormat};
pub use crate::core::submodel::{Group, ModelArray, ModelMap, OptModelArray, OptModelMap, Submodel};
pub use crate::core::{AnyProperty, Model, Property, WrapModel};
pub use crate::domain::model::{JsonMap, ModelArchive, SerializeMode};
pub use crate::domain::ports::{Convert, DecodeContext, EncodeContext, ModelSerializing};
pub use crate::domain::tri_state::{install_truthy_tokens, truthy_tokens, TriStateBool, TruthyTokens};
pub use crate::utils::error::{Result, WrapError};
