use crate::domain::model::JsonMap;
use crate::utils::error::Result;
use serde_json::Value;

/// Construction from, and export to, a decoded JSON object.
pub trait ModelSerializing: Sized {
    /// Builds a complete instance or fails; never yields a partial one.
    fn from_json_map(map: JsonMap, mutable: bool) -> Result<Self>;

    /// Exports current values. With `without_nulls`, absent values are left out
    /// instead of written as `null`.
    fn to_json_map(&self, without_nulls: bool) -> JsonMap;

    /// Export used when nested inside another model. `for_serialization == false`
    /// asks for values that are normally kept out of serialized output.
    fn to_json_map_for(&self, without_nulls: bool, _for_serialization: bool) -> JsonMap {
        self.to_json_map(without_nulls)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeContext {
    /// Mutability of the model doing the decoding; submodels inherit it.
    pub mutable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeContext {
    pub for_serialization: bool,
}

/// Two-way conversion between a raw JSON value and a typed model value.
pub trait Convert: Send + Sync + 'static {
    type Value: Clone + Send + Sync + 'static;

    fn default_value(&self) -> Self::Value;

    /// `None` when the raw value has no usable conversion.
    fn decode(&self, raw: &Value, ctx: DecodeContext) -> Option<Self::Value>;

    /// `None` stands for null.
    fn encode(&self, value: &Self::Value, ctx: EncodeContext) -> Option<Value>;

    /// Whether values are nested models, which share state with whoever holds
    /// a handle to them.
    fn holds_models(&self) -> bool {
        false
    }
}
