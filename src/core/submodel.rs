use crate::core::wrap_model::Model;
use crate::domain::model::JsonMap;
use crate::domain::ports::{Convert, DecodeContext, EncodeContext, ModelSerializing};
use serde_json::Value;
use std::collections::BTreeMap;
use std::marker::PhantomData;

/// Anything that can be nested inside a model.
pub trait NestedModel: ModelSerializing + Clone + Send + Sync + 'static {}

impl<T: ModelSerializing + Clone + Send + Sync + 'static> NestedModel for T {}

fn decode_model<M: NestedModel>(raw: &Value, ctx: DecodeContext) -> Option<M> {
    let map = raw.as_object()?;
    // Children inherit the parent's mutability.
    match M::from_json_map(map.clone(), ctx.mutable) {
        Ok(model) => Some(model),
        Err(e) => {
            tracing::debug!("Nested model construction failed: {}", e);
            None
        }
    }
}

fn encode_model<M: NestedModel>(model: &M, ctx: EncodeContext) -> Value {
    Value::Object(model.to_json_map_for(true, ctx.for_serialization))
}

fn decode_model_array<M: NestedModel>(raw: &Value, ctx: DecodeContext) -> Option<Vec<M>> {
    raw.as_array()?
        .iter()
        .map(|item| decode_model(item, ctx))
        .collect()
}

fn encode_model_array<M: NestedModel>(models: &[M], ctx: EncodeContext) -> Value {
    Value::Array(models.iter().map(|m| encode_model(m, ctx)).collect())
}

fn decode_model_map<M: NestedModel>(
    raw: &Value,
    ctx: DecodeContext,
) -> Option<BTreeMap<String, M>> {
    raw.as_object()?
        .iter()
        .map(|(key, item)| decode_model(item, ctx).map(|model| (key.clone(), model)))
        .collect()
}

fn encode_model_map<M: NestedModel>(models: &BTreeMap<String, M>, ctx: EncodeContext) -> Value {
    let mut map = JsonMap::with_capacity(models.len());
    for (key, model) in models {
        map.insert(key.clone(), encode_model(model, ctx));
    }
    Value::Object(map)
}

macro_rules! phantom_converter {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        pub struct $name<M>(PhantomData<fn() -> M>);

        impl<M> $name<M> {
            pub const fn new() -> Self {
                Self(PhantomData)
            }
        }

        impl<M> Default for $name<M> {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

phantom_converter!(
    /// An optional nested object.
    Submodel
);
phantom_converter!(
    /// An array of nested objects; any non-object element voids the array.
    ModelArray
);
phantom_converter!(OptModelArray);
phantom_converter!(
    /// An object whose values are all nested objects.
    ModelMap
);
phantom_converter!(OptModelMap);
phantom_converter!(
    /// A submodel that reads its fields from the parent's own level.
    ///
    /// Declare with [`Property::inline`](crate::core::property::Property::inline).
    Group
);

impl<M: NestedModel> Convert for Submodel<M> {
    type Value = Option<M>;

    fn default_value(&self) -> Option<M> {
        None
    }

    fn decode(&self, raw: &Value, ctx: DecodeContext) -> Option<Option<M>> {
        decode_model(raw, ctx).map(Some)
    }

    fn encode(&self, value: &Option<M>, ctx: EncodeContext) -> Option<Value> {
        value.as_ref().map(|model| encode_model(model, ctx))
    }

    fn holds_models(&self) -> bool {
        true
    }
}

impl<M: NestedModel> Convert for ModelArray<M> {
    type Value = Vec<M>;

    fn default_value(&self) -> Vec<M> {
        Vec::new()
    }

    fn decode(&self, raw: &Value, ctx: DecodeContext) -> Option<Vec<M>> {
        decode_model_array(raw, ctx)
    }

    fn encode(&self, value: &Vec<M>, ctx: EncodeContext) -> Option<Value> {
        Some(encode_model_array(value, ctx))
    }

    fn holds_models(&self) -> bool {
        true
    }
}

impl<M: NestedModel> Convert for OptModelArray<M> {
    type Value = Option<Vec<M>>;

    fn default_value(&self) -> Option<Vec<M>> {
        None
    }

    fn decode(&self, raw: &Value, ctx: DecodeContext) -> Option<Option<Vec<M>>> {
        decode_model_array(raw, ctx).map(Some)
    }

    fn encode(&self, value: &Option<Vec<M>>, ctx: EncodeContext) -> Option<Value> {
        value
            .as_deref()
            .map(|models| encode_model_array(models, ctx))
    }

    fn holds_models(&self) -> bool {
        true
    }
}

impl<M: NestedModel> Convert for ModelMap<M> {
    type Value = BTreeMap<String, M>;

    fn default_value(&self) -> BTreeMap<String, M> {
        BTreeMap::new()
    }

    fn decode(&self, raw: &Value, ctx: DecodeContext) -> Option<BTreeMap<String, M>> {
        decode_model_map(raw, ctx)
    }

    fn encode(&self, value: &BTreeMap<String, M>, ctx: EncodeContext) -> Option<Value> {
        Some(encode_model_map(value, ctx))
    }

    fn holds_models(&self) -> bool {
        true
    }
}

impl<M: NestedModel> Convert for OptModelMap<M> {
    type Value = Option<BTreeMap<String, M>>;

    fn default_value(&self) -> Option<BTreeMap<String, M>> {
        None
    }

    fn decode(&self, raw: &Value, ctx: DecodeContext) -> Option<Option<BTreeMap<String, M>>> {
        decode_model_map(raw, ctx).map(Some)
    }

    fn encode(&self, value: &Option<BTreeMap<String, M>>, ctx: EncodeContext) -> Option<Value> {
        value
            .as_ref()
            .map(|models| encode_model_map(models, ctx))
    }

    fn holds_models(&self) -> bool {
        true
    }
}

impl<M: Model> Convert for Group<M> {
    type Value = M;

    fn default_value(&self) -> M {
        M::with_data(JsonMap::new(), false)
    }

    fn decode(&self, raw: &Value, ctx: DecodeContext) -> Option<M> {
        raw.as_object()
            .map(|map| M::with_data(map.clone(), ctx.mutable))
    }

    fn encode(&self, value: &M, ctx: EncodeContext) -> Option<Value> {
        Some(Value::Object(
            value.wrap().current_model_data(false, ctx.for_serialization),
        ))
    }

    fn holds_models(&self) -> bool {
        true
    }
}
