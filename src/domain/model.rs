use serde::{Deserialize, Serialize};

/// The generic key-value structure at the JSON boundary.
pub type JsonMap = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SerializeMode {
    #[default]
    Always,
    /// Kept in the model and in equality checks, left out of serialized output.
    Never,
}

/// Archived form of a model: current data for mutable models, original data
/// for immutable ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArchive {
    pub mutable: bool,
    pub data: JsonMap,
}
