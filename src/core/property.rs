use crate::core::wrap_model::WrapModel;
use crate::domain::model::SerializeMode;
use crate::domain::ports::{Convert, DecodeContext, EncodeContext};
use serde_json::Value;
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// Where a property's raw value lives in the model data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Location {
    /// A dotted key path.
    Path(&'static str),
    /// The model's own object, shared with a property group. The label only
    /// tells groups apart.
    Inline(&'static str),
}

impl Location {
    /// Ordering weight for export: inline groups first, then shorter paths, so
    /// parent objects are written before their children.
    pub(crate) fn depth_key(&self) -> usize {
        match self {
            Location::Inline(_) => 0,
            Location::Path(path) => path.len(),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Path(path) => write!(f, "{}", path),
            Location::Inline(label) => write!(f, "<inline:{}>", label),
        }
    }
}

/// A typed, statically declared model property.
///
/// ```ignore
/// static FIRST_NAME: Property<OptStr> = Property::new("firstName", OptStr);
/// ```
pub struct Property<C> {
    location: Location,
    converter: C,
    serialize: SerializeMode,
}

impl<C> Property<C> {
    pub const fn new(key_path: &'static str, converter: C) -> Self {
        Self::with_mode(key_path, converter, SerializeMode::Always)
    }

    pub const fn with_mode(key_path: &'static str, converter: C, serialize: SerializeMode) -> Self {
        Self {
            location: Location::Path(key_path),
            converter,
            serialize,
        }
    }

    /// A property that reads the model's own object instead of a key below it.
    pub const fn inline(label: &'static str, converter: C) -> Self {
        Self {
            location: Location::Inline(label),
            converter,
            serialize: SerializeMode::Always,
        }
    }

    pub fn location(&self) -> Location {
        match self.location {
            Location::Path(path) => Location::Path(path.trim_matches('_')),
            inline => inline,
        }
    }

    pub fn converter(&self) -> &C {
        &self.converter
    }

    pub fn serialize_mode(&self) -> SerializeMode {
        self.serialize
    }
}

impl<C: Convert> Property<C> {
    /// Cache slot of this property. Properties on the same location only share
    /// a cached value when they also share a converter type.
    pub fn cache_key(&self) -> CacheKey {
        (self.location(), TypeId::of::<C>())
    }
}

pub type CacheKey = (Location, TypeId);

impl<C> fmt::Debug for Property<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("location", &self.location())
            .field("serialize", &self.serialize)
            .finish()
    }
}

/// Type-erased view of a property, used for export.
pub trait AnyProperty: Send + Sync {
    fn location(&self) -> Location;
    fn serialize_mode(&self) -> SerializeMode;
    fn cache_key(&self) -> CacheKey;
    /// The current value as it would appear in the data; `None` for null.
    fn raw_value(&self, model: &WrapModel, ctx: EncodeContext) -> Option<Value>;
    fn holds_models(&self) -> bool;
    /// The current value rebuilt from its data form with the given mutability,
    /// sharing no state with `model`. `None` for null.
    fn detached_value(
        &self,
        model: &WrapModel,
        mutable: bool,
    ) -> Option<Arc<dyn Any + Send + Sync>>;
}

impl<C: Convert> AnyProperty for Property<C> {
    fn location(&self) -> Location {
        Property::location(self)
    }

    fn serialize_mode(&self) -> SerializeMode {
        self.serialize
    }

    fn cache_key(&self) -> CacheKey {
        Property::cache_key(self)
    }

    fn raw_value(&self, model: &WrapModel, ctx: EncodeContext) -> Option<Value> {
        let value = model.get(self);
        self.converter.encode(&value, ctx)
    }

    fn holds_models(&self) -> bool {
        self.converter.holds_models()
    }

    fn detached_value(
        &self,
        model: &WrapModel,
        mutable: bool,
    ) -> Option<Arc<dyn Any + Send + Sync>> {
        let raw = self.raw_value(
            model,
            EncodeContext {
                for_serialization: false,
            },
        )?;
        let value = self.converter.decode(&raw, DecodeContext { mutable })?;
        let value: Arc<dyn Any + Send + Sync> = Arc::new(value);
        Some(value)
    }
}
