use crate::core::key_path;
use crate::core::property::{AnyProperty, CacheKey, Location, Property};
use crate::domain::model::{JsonMap, ModelArchive, SerializeMode};
use crate::domain::ports::{Convert, DecodeContext, EncodeContext, ModelSerializing};
use crate::utils::error::{Result, WrapError};
use serde_json::Value;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Clone)]
enum CacheEntry {
    /// Decoded as, or set to, nothing.
    Null,
    Value(Arc<dyn Any + Send + Sync>),
}

type Cache = HashMap<CacheKey, CacheEntry>;

struct ModelState {
    type_name: &'static str,
    data: JsonMap,
    mutable: bool,
    properties: Vec<&'static dyn AnyProperty>,
    cache: RwLock<Cache>,
}

/// Shared state behind every model: the original data, the mutability flag,
/// the property table, and a cache of decoded or mutated values.
///
/// Clones share state, so a submodel handed out by a parent and then mutated is
/// seen by the parent's export.
#[derive(Clone)]
pub struct WrapModel {
    state: Arc<ModelState>,
}

impl WrapModel {
    pub fn new<M: Model>(data: JsonMap, mutable: bool) -> Self {
        let mut properties = M::properties();
        properties.sort_by_key(|property| property.location().depth_key());
        Self::from_parts(
            std::any::type_name::<M>(),
            data,
            mutable,
            properties,
            Cache::new(),
        )
    }

    fn from_parts(
        type_name: &'static str,
        data: JsonMap,
        mutable: bool,
        properties: Vec<&'static dyn AnyProperty>,
        cache: Cache,
    ) -> Self {
        Self {
            state: Arc::new(ModelState {
                type_name,
                data,
                mutable,
                properties,
                cache: RwLock::new(cache),
            }),
        }
    }

    fn read_cache(&self) -> RwLockReadGuard<'_, Cache> {
        self.state.cache.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_cache(&self) -> RwLockWriteGuard<'_, Cache> {
        self.state.cache.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_mutable(&self) -> bool {
        self.state.mutable
    }

    pub fn type_name(&self) -> &'static str {
        self.state.type_name
    }

    /// Whether both handles point at the same model state.
    pub fn same_instance(&self, other: &WrapModel) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }

    // ========================================================================
    // PROPERTY ACCESS
    // ========================================================================

    /// Current value of `property`, or the converter's default when it has none.
    pub fn get<C: Convert>(&self, property: &Property<C>) -> C::Value {
        self.lookup(property)
            .unwrap_or_else(|| property.converter().default_value())
    }

    /// Replaces the value of `property`. Fails on immutable models.
    pub fn set<C: Convert>(&self, property: &Property<C>, value: C::Value) -> Result<()> {
        let location = property.location();
        if !self.state.mutable {
            tracing::warn!(
                "Attempt to mutate immutable model {} at '{}'",
                self.state.type_name,
                location
            );
            return Err(WrapError::ImmutableModel {
                key_path: location.to_string(),
            });
        }
        self.write_cache()
            .insert(property.cache_key(), CacheEntry::Value(Arc::new(value)));
        Ok(())
    }

    pub fn has_value<C: Convert>(&self, property: &Property<C>) -> bool {
        let ctx = EncodeContext {
            for_serialization: false,
        };
        self.lookup(property)
            .map(|value| property.converter().encode(&value, ctx).is_some())
            .unwrap_or(false)
    }

    /// Returns `property` to its value in the original data.
    pub fn clear_mutation<C: Convert>(&self, property: &Property<C>) {
        self.write_cache().remove(&property.cache_key());
    }

    pub fn clear_mutations(&self) {
        self.write_cache().clear();
    }

    fn lookup<C: Convert>(&self, property: &Property<C>) -> Option<C::Value> {
        let location = property.location();
        let key = property.cache_key();
        let cached = self.read_cache().get(&key).cloned();
        let entry = match cached {
            Some(entry) => entry,
            None => {
                let decoded = self.decode_entry(property, location);
                // Racing readers keep whichever entry landed first.
                self.write_cache().entry(key).or_insert(decoded).clone()
            }
        };

        match entry {
            CacheEntry::Null => None,
            CacheEntry::Value(value) => {
                let typed = value.downcast_ref::<C::Value>().cloned();
                if typed.is_none() {
                    tracing::debug!(
                        "Cached value at '{}' does not match the property type",
                        location
                    );
                }
                typed
            }
        }
    }

    fn decode_entry<C: Convert>(&self, property: &Property<C>, location: Location) -> CacheEntry {
        let ctx = DecodeContext {
            mutable: self.state.mutable,
        };
        let decoded = match location {
            Location::Path(path) => key_path::value_at(&self.state.data, path).and_then(|raw| {
                let value = property.converter().decode(raw, ctx);
                if value.is_none() && !raw.is_null() {
                    tracing::debug!(
                        "Could not convert value at '{}' in {}",
                        path,
                        self.state.type_name
                    );
                }
                value
            }),
            Location::Inline(_) => property
                .converter()
                .decode(&Value::Object(self.state.data.clone()), ctx),
        };

        match decoded {
            Some(value) => CacheEntry::Value(Arc::new(value)),
            None => CacheEntry::Null,
        }
    }

    // ========================================================================
    // EXPORT
    // ========================================================================

    pub fn original_model_data(&self) -> &JsonMap {
        &self.state.data
    }

    pub fn original_model_data_as_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.state.data)?)
    }

    /// Builds a fresh object from current property values.
    ///
    /// Only declared properties are written. With `for_serialization`,
    /// properties marked [`SerializeMode::Never`] are skipped.
    pub fn current_model_data(&self, with_nulls: bool, for_serialization: bool) -> JsonMap {
        let ctx = EncodeContext { for_serialization };
        let mut data = JsonMap::with_capacity(self.state.properties.len());

        for property in &self.state.properties {
            if for_serialization && property.serialize_mode() == SerializeMode::Never {
                continue;
            }
            match (property.location(), property.raw_value(self, ctx)) {
                (Location::Path(path), Some(value)) => {
                    key_path::set_at(&mut data, path, value, true);
                }
                (Location::Path(path), None) if with_nulls => {
                    key_path::set_at(&mut data, path, Value::Null, true);
                }
                (Location::Inline(_), Some(Value::Object(fields))) => data.extend(fields),
                _ => {}
            }
        }
        data
    }

    pub fn current_model_data_as_json(&self, with_nulls: bool) -> Result<String> {
        let data = Value::Object(self.current_model_data(with_nulls, true));
        Ok(serde_json::to_string_pretty(&data)?)
    }

    // ========================================================================
    // COPIES
    // ========================================================================

    /// A new model over the same original data; `with_mutations` carries the
    /// cache across.
    ///
    /// Cached nested models are rebuilt with the new mutability, so the copy
    /// never shares a child with this model.
    pub fn duplicate(&self, mutable: bool, with_mutations: bool) -> WrapModel {
        let mut cache = if with_mutations {
            self.read_cache().clone()
        } else {
            Cache::new()
        };
        for property in self.state.properties.iter().filter(|p| p.holds_models()) {
            let key = property.cache_key();
            if cache.contains_key(&key) {
                let entry = match property.detached_value(self, mutable) {
                    Some(value) => CacheEntry::Value(value),
                    None => CacheEntry::Null,
                };
                cache.insert(key, entry);
            }
        }
        Self::from_parts(
            self.state.type_name,
            self.state.data.clone(),
            mutable,
            self.state.properties.clone(),
            cache,
        )
    }

    pub fn archive(&self) -> ModelArchive {
        let data = if self.state.mutable {
            self.current_model_data(false, false)
        } else {
            self.state.data.clone()
        };
        ModelArchive {
            mutable: self.state.mutable,
            data,
        }
    }
}

/// Equal when the current data (nulls left out, every property included)
/// matches.
impl PartialEq for WrapModel {
    fn eq(&self, other: &Self) -> bool {
        if self.same_instance(other) {
            return true;
        }
        self.current_model_data(false, false) == other.current_model_data(false, false)
    }
}

impl fmt::Display for WrapModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Model {} mutable: {}",
            self.state.type_name, self.state.mutable
        )?;
        let json = self
            .current_model_data_as_json(true)
            .unwrap_or_else(|_| "{}".to_string());
        write!(f, "{}", json)
    }
}

impl fmt::Debug for WrapModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WrapModel")
            .field("type", &self.state.type_name)
            .field("mutable", &self.state.mutable)
            .field("data", &self.current_model_data(false, false))
            .finish()
    }
}

/// A concrete model type backed by a [`WrapModel`].
///
/// ```ignore
/// static PHONE: Property<OptStr> = Property::new("phoneNumber", OptStr);
///
/// #[derive(Clone)]
/// struct Contact(WrapModel);
///
/// impl Model for Contact {
///     fn properties() -> Vec<&'static dyn AnyProperty> { vec![&PHONE] }
///     fn from_wrap(wrap: WrapModel) -> Self { Contact(wrap) }
///     fn wrap(&self) -> &WrapModel { &self.0 }
/// }
/// ```
pub trait Model: Clone + Send + Sync + Sized + 'static {
    fn properties() -> Vec<&'static dyn AnyProperty>;

    fn from_wrap(wrap: WrapModel) -> Self;

    fn wrap(&self) -> &WrapModel;

    fn with_data(data: JsonMap, mutable: bool) -> Self {
        Self::from_wrap(WrapModel::new::<Self>(data, mutable))
    }

    /// A mutable model with no data.
    fn empty() -> Self {
        Self::with_data(JsonMap::new(), true)
    }

    fn from_json(json: &str, mutable: bool) -> Result<Self> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| WrapError::construction(format!("Invalid JSON: {}", e)))?;
        match value {
            Value::Object(map) => Ok(Self::with_data(map, mutable)),
            other => Err(WrapError::construction(format!(
                "Expected a JSON object, found {}",
                json_kind(&other)
            ))),
        }
    }

    fn from_json_bytes(bytes: &[u8], mutable: bool) -> Result<Self> {
        let json = std::str::from_utf8(bytes)
            .map_err(|e| WrapError::construction(format!("JSON is not UTF-8: {}", e)))?;
        Self::from_json(json, mutable)
    }

    fn is_mutable(&self) -> bool {
        self.wrap().is_mutable()
    }

    /// Immutable copy of the current state. Immutable models hand back the
    /// same shared instance.
    fn copy(&self) -> Self {
        if !self.is_mutable() {
            return self.clone();
        }
        Self::from_wrap(self.wrap().duplicate(false, true))
    }

    fn mutable_copy(&self) -> Self {
        Self::from_wrap(self.wrap().duplicate(true, true))
    }

    fn copy_of(other: &Self, with_mutations: bool, mutable: bool) -> Self {
        Self::from_wrap(other.wrap().duplicate(mutable, with_mutations))
    }

    fn clear_mutations(&self) {
        self.wrap().clear_mutations();
    }

    fn is_equal_to_model(&self, other: &Self) -> bool {
        self.wrap() == other.wrap()
    }

    fn archive(&self) -> ModelArchive {
        self.wrap().archive()
    }

    fn from_archive(archive: ModelArchive) -> Self {
        Self::with_data(archive.data, archive.mutable)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

impl<M: Model> ModelSerializing for M {
    fn from_json_map(map: JsonMap, mutable: bool) -> Result<Self> {
        Ok(Self::with_data(map, mutable))
    }

    fn to_json_map(&self, without_nulls: bool) -> JsonMap {
        self.wrap().current_model_data(!without_nulls, true)
    }

    fn to_json_map_for(&self, without_nulls: bool, for_serialization: bool) -> JsonMap {
        self.wrap()
            .current_model_data(!without_nulls, for_serialization)
    }
}
