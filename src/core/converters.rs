use crate::domain::model::JsonMap;
use crate::domain::ports::{Convert, DecodeContext, EncodeContext};
use crate::domain::tri_state::{truthy_tokens, TriStateBool};
use serde_json::Value;
use std::marker::PhantomData;

// ============================================================================
// NUMBER HELPERS
// ============================================================================

fn round_to_i64(value: f64) -> Option<i64> {
    if !value.is_finite() {
        return None;
    }
    let rounded = value.round();
    if rounded < i64::MIN as f64 || rounded >= i64::MAX as f64 {
        return None;
    }
    Some(rounded as i64)
}

/// Integers, rounded floats and numeric strings.
fn lenient_i64(raw: &Value) -> Option<i64> {
    match raw {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(round_to_i64)),
        Value::String(s) => {
            let trimmed = s.trim();
            trimmed
                .parse::<i64>()
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().and_then(round_to_i64))
        }
        _ => None,
    }
}

fn lenient_f64(raw: &Value) -> Option<f64> {
    match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn float_value(value: f64) -> Option<Value> {
    serde_json::Number::from_f64(value).map(Value::Number)
}

/// Widens through the shortest text that reads back as `value`, so `1.23f32`
/// exports as `1.23`.
fn widen_f32(value: f32) -> Option<f64> {
    value.to_string().parse::<f64>().ok()
}

// ============================================================================
// STRINGS
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub struct Str {
    default: &'static str,
}

impl Str {
    pub const fn new() -> Self {
        Self { default: "" }
    }

    pub const fn with_default(default: &'static str) -> Self {
        Self { default }
    }
}

impl Default for Str {
    fn default() -> Self {
        Self::new()
    }
}

impl Convert for Str {
    type Value = String;

    fn default_value(&self) -> String {
        self.default.to_string()
    }

    fn decode(&self, raw: &Value, _ctx: DecodeContext) -> Option<String> {
        raw.as_str().map(str::to_string)
    }

    fn encode(&self, value: &String, _ctx: EncodeContext) -> Option<Value> {
        Some(Value::String(value.clone()))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OptStr;

impl Convert for OptStr {
    type Value = Option<String>;

    fn default_value(&self) -> Option<String> {
        None
    }

    fn decode(&self, raw: &Value, _ctx: DecodeContext) -> Option<Option<String>> {
        raw.as_str().map(|s| Some(s.to_string()))
    }

    fn encode(&self, value: &Option<String>, _ctx: EncodeContext) -> Option<Value> {
        value.clone().map(Value::String)
    }
}

// ============================================================================
// INTEGERS
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub struct Int {
    default: i64,
}

impl Int {
    pub const fn new() -> Self {
        Self { default: 0 }
    }

    pub const fn with_default(default: i64) -> Self {
        Self { default }
    }
}

impl Default for Int {
    fn default() -> Self {
        Self::new()
    }
}

impl Convert for Int {
    type Value = i64;

    fn default_value(&self) -> i64 {
        self.default
    }

    fn decode(&self, raw: &Value, _ctx: DecodeContext) -> Option<i64> {
        lenient_i64(raw)
    }

    fn encode(&self, value: &i64, _ctx: EncodeContext) -> Option<Value> {
        Some(Value::from(*value))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OptInt;

impl Convert for OptInt {
    type Value = Option<i64>;

    fn default_value(&self) -> Option<i64> {
        None
    }

    fn decode(&self, raw: &Value, _ctx: DecodeContext) -> Option<Option<i64>> {
        lenient_i64(raw).map(Some)
    }

    fn encode(&self, value: &Option<i64>, _ctx: EncodeContext) -> Option<Value> {
        value.map(Value::from)
    }
}

/// An integer that the remote side stores as a string. Always written back as
/// a string.
#[derive(Debug, Clone, Copy)]
pub struct IntFromString {
    default: i64,
}

impl IntFromString {
    pub const fn new() -> Self {
        Self { default: 0 }
    }

    pub const fn with_default(default: i64) -> Self {
        Self { default }
    }
}

impl Default for IntFromString {
    fn default() -> Self {
        Self::new()
    }
}

impl Convert for IntFromString {
    type Value = i64;

    fn default_value(&self) -> i64 {
        self.default
    }

    fn decode(&self, raw: &Value, _ctx: DecodeContext) -> Option<i64> {
        lenient_i64(raw)
    }

    fn encode(&self, value: &i64, _ctx: EncodeContext) -> Option<Value> {
        Some(Value::String(value.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OptIntFromString;

impl Convert for OptIntFromString {
    type Value = Option<i64>;

    fn default_value(&self) -> Option<i64> {
        None
    }

    fn decode(&self, raw: &Value, _ctx: DecodeContext) -> Option<Option<i64>> {
        lenient_i64(raw).map(Some)
    }

    fn encode(&self, value: &Option<i64>, _ctx: EncodeContext) -> Option<Value> {
        value.map(|v| Value::String(v.to_string()))
    }
}

// ============================================================================
// FLOATING POINT
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub struct Float {
    default: f32,
}

impl Float {
    pub const fn new() -> Self {
        Self { default: 0.0 }
    }

    pub const fn with_default(default: f32) -> Self {
        Self { default }
    }
}

impl Default for Float {
    fn default() -> Self {
        Self::new()
    }
}

impl Convert for Float {
    type Value = f32;

    fn default_value(&self) -> f32 {
        self.default
    }

    fn decode(&self, raw: &Value, _ctx: DecodeContext) -> Option<f32> {
        lenient_f64(raw).map(|v| v as f32)
    }

    fn encode(&self, value: &f32, _ctx: EncodeContext) -> Option<Value> {
        widen_f32(*value).and_then(float_value)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Double {
    default: f64,
}

impl Double {
    pub const fn new() -> Self {
        Self { default: 0.0 }
    }

    pub const fn with_default(default: f64) -> Self {
        Self { default }
    }
}

impl Default for Double {
    fn default() -> Self {
        Self::new()
    }
}

impl Convert for Double {
    type Value = f64;

    fn default_value(&self) -> f64 {
        self.default
    }

    fn decode(&self, raw: &Value, _ctx: DecodeContext) -> Option<f64> {
        lenient_f64(raw)
    }

    fn encode(&self, value: &f64, _ctx: EncodeContext) -> Option<Value> {
        float_value(*value)
    }
}

// ============================================================================
// BOOLEANS
// ============================================================================

/// How a boolean is written back to the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoolOutput {
    /// Native JSON true/false
    #[default]
    Boolean,
    /// "yes" / "no"
    YesNo,
    /// "T" / "F"
    TfString,
    /// 1 / 0
    Numeric,
}

impl BoolOutput {
    pub fn to_value(self, value: bool) -> Value {
        match self {
            BoolOutput::Boolean => Value::Bool(value),
            BoolOutput::YesNo => Value::from(if value { "yes" } else { "no" }),
            BoolOutput::TfString => Value::from(if value { "T" } else { "F" }),
            BoolOutput::Numeric => Value::from(if value { 1 } else { 0 }),
        }
    }
}

fn decode_tri_state(raw: &Value) -> TriStateBool {
    match raw {
        Value::Bool(b) => TriStateBool::from_bool(*b),
        Value::String(s) => truthy_tokens().parse_tri_state(s),
        Value::Number(n) => match n.as_i64() {
            Some(i) => TriStateBool::from_bool(i != 0),
            None => match n.as_u64() {
                Some(u) => TriStateBool::from_bool(u != 0),
                None => TriStateBool::NotSet,
            },
        },
        _ => TriStateBool::NotSet,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Bool {
    output: BoolOutput,
    default: bool,
}

impl Bool {
    pub const fn new() -> Self {
        Self {
            output: BoolOutput::Boolean,
            default: false,
        }
    }

    pub const fn with_output(output: BoolOutput) -> Self {
        Self {
            output,
            default: false,
        }
    }

    pub const fn default_to(self, default: bool) -> Self {
        Self {
            output: self.output,
            default,
        }
    }
}

impl Default for Bool {
    fn default() -> Self {
        Self::new()
    }
}

impl Convert for Bool {
    type Value = bool;

    fn default_value(&self) -> bool {
        self.default
    }

    fn decode(&self, raw: &Value, _ctx: DecodeContext) -> Option<bool> {
        // An empty string reads as false here, unlike the tri-state form.
        if let Value::String(s) = raw {
            return Some(truthy_tokens().is_truthy(s));
        }
        match decode_tri_state(raw) {
            TriStateBool::NotSet => None,
            state => Some(state.is_true()),
        }
    }

    fn encode(&self, value: &bool, _ctx: EncodeContext) -> Option<Value> {
        Some(self.output.to_value(*value))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OptBool {
    output: BoolOutput,
}

impl OptBool {
    pub const fn new() -> Self {
        Self {
            output: BoolOutput::Boolean,
        }
    }

    pub const fn with_output(output: BoolOutput) -> Self {
        Self { output }
    }
}

impl Convert for OptBool {
    type Value = TriStateBool;

    fn default_value(&self) -> TriStateBool {
        TriStateBool::NotSet
    }

    fn decode(&self, raw: &Value, _ctx: DecodeContext) -> Option<TriStateBool> {
        match decode_tri_state(raw) {
            TriStateBool::NotSet => None,
            state => Some(state),
        }
    }

    fn encode(&self, value: &TriStateBool, _ctx: EncodeContext) -> Option<Value> {
        Option::<bool>::from(*value).map(|b| self.output.to_value(b))
    }
}

// ============================================================================
// OBJECTS
// ============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct Dict;

impl Convert for Dict {
    type Value = JsonMap;

    fn default_value(&self) -> JsonMap {
        JsonMap::new()
    }

    fn decode(&self, raw: &Value, _ctx: DecodeContext) -> Option<JsonMap> {
        raw.as_object().cloned()
    }

    fn encode(&self, value: &JsonMap, _ctx: EncodeContext) -> Option<Value> {
        Some(Value::Object(value.clone()))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OptDict;

impl Convert for OptDict {
    type Value = Option<JsonMap>;

    fn default_value(&self) -> Option<JsonMap> {
        None
    }

    fn decode(&self, raw: &Value, _ctx: DecodeContext) -> Option<Option<JsonMap>> {
        raw.as_object().cloned().map(Some)
    }

    fn encode(&self, value: &Option<JsonMap>, _ctx: EncodeContext) -> Option<Value> {
        value.clone().map(Value::Object)
    }
}

// ============================================================================
// ARRAYS
// ============================================================================

/// A value that can sit in a homogeneous JSON array.
pub trait ArrayElement: Sized + Clone + Send + Sync + 'static {
    fn from_json(raw: &Value) -> Option<Self>;
    fn to_json(&self) -> Value;
}

impl ArrayElement for i64 {
    fn from_json(raw: &Value) -> Option<Self> {
        raw.as_i64()
    }

    fn to_json(&self) -> Value {
        Value::from(*self)
    }
}

impl ArrayElement for f32 {
    fn from_json(raw: &Value) -> Option<Self> {
        raw.as_f64().map(|v| v as f32)
    }

    fn to_json(&self) -> Value {
        widen_f32(*self)
            .and_then(float_value)
            .unwrap_or(Value::Null)
    }
}

impl ArrayElement for f64 {
    fn from_json(raw: &Value) -> Option<Self> {
        raw.as_f64()
    }

    fn to_json(&self) -> Value {
        float_value(*self).unwrap_or(Value::Null)
    }
}

impl ArrayElement for String {
    fn from_json(raw: &Value) -> Option<Self> {
        raw.as_str().map(str::to_string)
    }

    fn to_json(&self) -> Value {
        Value::String(self.clone())
    }
}

impl ArrayElement for bool {
    fn from_json(raw: &Value) -> Option<Self> {
        raw.as_bool()
    }

    fn to_json(&self) -> Value {
        Value::Bool(*self)
    }
}

impl ArrayElement for JsonMap {
    fn from_json(raw: &Value) -> Option<Self> {
        raw.as_object().cloned()
    }

    fn to_json(&self) -> Value {
        Value::Object(self.clone())
    }
}

/// All elements must convert, otherwise the whole array has no value.
fn decode_elements<T: ArrayElement>(raw: &Value) -> Option<Vec<T>> {
    raw.as_array()?.iter().map(T::from_json).collect()
}

fn encode_elements<T: ArrayElement>(values: &[T]) -> Value {
    Value::Array(values.iter().map(ArrayElement::to_json).collect())
}

pub struct Array<T>(PhantomData<fn() -> T>);

impl<T> Array<T> {
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for Array<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ArrayElement> Convert for Array<T> {
    type Value = Vec<T>;

    fn default_value(&self) -> Vec<T> {
        Vec::new()
    }

    fn decode(&self, raw: &Value, _ctx: DecodeContext) -> Option<Vec<T>> {
        decode_elements(raw)
    }

    fn encode(&self, value: &Vec<T>, _ctx: EncodeContext) -> Option<Value> {
        Some(encode_elements(value))
    }
}

pub struct OptArray<T>(PhantomData<fn() -> T>);

impl<T> OptArray<T> {
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for OptArray<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ArrayElement> Convert for OptArray<T> {
    type Value = Option<Vec<T>>;

    fn default_value(&self) -> Option<Vec<T>> {
        None
    }

    fn decode(&self, raw: &Value, _ctx: DecodeContext) -> Option<Option<Vec<T>>> {
        decode_elements(raw).map(Some)
    }

    fn encode(&self, value: &Option<Vec<T>>, _ctx: EncodeContext) -> Option<Value> {
        value.as_deref().map(encode_elements)
    }
}

// ============================================================================
// ENUMS
// ============================================================================

/// An enum stored in the data as one of a fixed set of strings.
pub trait ConvertibleEnum: Copy + PartialEq + Send + Sync + 'static {
    fn conversion_table() -> &'static [(&'static str, Self)];

    fn from_string(text: &str) -> Option<Self> {
        Self::conversion_table()
            .iter()
            .find(|(key, _)| *key == text)
            .map(|(_, value)| *value)
    }

    fn string_value(self) -> Option<&'static str> {
        Self::conversion_table()
            .iter()
            .find(|(_, value)| *value == self)
            .map(|(key, _)| *key)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Enum<E> {
    default: E,
}

impl<E> Enum<E> {
    pub const fn new(default: E) -> Self {
        Self { default }
    }
}

impl<E: ConvertibleEnum> Convert for Enum<E> {
    type Value = E;

    fn default_value(&self) -> E {
        self.default
    }

    fn decode(&self, raw: &Value, _ctx: DecodeContext) -> Option<E> {
        let text = raw.as_str()?;
        let converted = E::from_string(text);
        if converted.is_none() {
            tracing::debug!("Unknown enum string '{}'", text);
        }
        converted
    }

    fn encode(&self, value: &E, _ctx: EncodeContext) -> Option<Value> {
        value.string_value().map(Value::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const DECODE: DecodeContext = DecodeContext { mutable: false };
    const ENCODE: EncodeContext = EncodeContext {
        for_serialization: true,
    };

    #[test]
    fn test_int_decoding() {
        let conv = Int::new();
        assert_eq!(conv.decode(&json!(3), DECODE), Some(3));
        assert_eq!(conv.decode(&json!(2.5), DECODE), Some(3));
        assert_eq!(conv.decode(&json!(-2.5), DECODE), Some(-3));
        assert_eq!(conv.decode(&json!("42"), DECODE), Some(42));
        assert_eq!(conv.decode(&json!("4.4"), DECODE), Some(4));
        assert_eq!(conv.decode(&json!("abc"), DECODE), None);
        assert_eq!(conv.decode(&json!(true), DECODE), None);
        assert_eq!(Int::with_default(7).default_value(), 7);
    }

    #[test]
    fn test_int_from_string_encodes_string() {
        let conv = IntFromString::new();
        assert_eq!(conv.decode(&json!(2), DECODE), Some(2));
        assert_eq!(conv.encode(&2, ENCODE), Some(json!("2")));
        assert_eq!(OptIntFromString.encode(&None, ENCODE), None);
    }

    #[test]
    fn test_float_encodes_as_double() {
        let conv = Float::new();
        assert_eq!(conv.decode(&json!(1.23), DECODE), Some(1.23f32));
        assert_eq!(conv.decode(&json!("2.5"), DECODE), Some(2.5f32));
        let encoded = conv.encode(&2.5, ENCODE).unwrap();
        assert_eq!(encoded.as_f64(), Some(2.5));
        assert_eq!(conv.encode(&1.23, ENCODE), Some(json!(1.23)));
        assert_eq!(conv.encode(&f32::NAN, ENCODE), None);
    }

    #[test]
    fn test_int_rejects_out_of_range() {
        let conv = Int::new();
        assert_eq!(conv.decode(&json!(9223372036854775808u64), DECODE), None);
        assert_eq!(conv.decode(&json!(1e19), DECODE), None);
        assert_eq!(conv.decode(&json!("9223372036854775808"), DECODE), None);
        assert_eq!(conv.decode(&json!(i64::MAX), DECODE), Some(i64::MAX));
        assert_eq!(conv.decode(&json!(i64::MIN), DECODE), Some(i64::MIN));
    }

    #[test]
    fn test_bool_decoding() {
        let conv = Bool::new();
        assert_eq!(conv.decode(&json!(true), DECODE), Some(true));
        assert_eq!(conv.decode(&json!("Yes"), DECODE), Some(true));
        assert_eq!(conv.decode(&json!("no"), DECODE), Some(false));
        assert_eq!(conv.decode(&json!(""), DECODE), Some(false));
        assert_eq!(conv.decode(&json!(0), DECODE), Some(false));
        assert_eq!(conv.decode(&json!(5), DECODE), Some(true));
        assert_eq!(conv.decode(&json!(null), DECODE), None);
        assert!(Bool::new().default_to(true).default_value());
    }

    #[test]
    fn test_bool_outputs() {
        assert_eq!(BoolOutput::Boolean.to_value(true), json!(true));
        assert_eq!(BoolOutput::YesNo.to_value(false), json!("no"));
        assert_eq!(BoolOutput::TfString.to_value(true), json!("T"));
        assert_eq!(BoolOutput::Numeric.to_value(true), json!(1));
    }

    #[test]
    fn test_opt_bool() {
        let conv = OptBool::with_output(BoolOutput::YesNo);
        assert_eq!(conv.decode(&json!(""), DECODE), None);
        assert_eq!(conv.decode(&json!("t"), DECODE), Some(TriStateBool::True));
        assert_eq!(conv.decode(&json!(0), DECODE), Some(TriStateBool::False));
        assert_eq!(conv.decode(&json!({}), DECODE), None);
        assert_eq!(conv.encode(&TriStateBool::NotSet, ENCODE), None);
        assert_eq!(conv.encode(&TriStateBool::True, ENCODE), Some(json!("yes")));
    }

    #[test]
    fn test_array_requires_every_element() {
        let ints: Array<i64> = Array::new();
        assert_eq!(ints.decode(&json!([1, 2, 3]), DECODE), Some(vec![1, 2, 3]));
        assert_eq!(ints.decode(&json!([1, "2"]), DECODE), None);
        assert!(ints.default_value().is_empty());

        let floats: OptArray<f32> = OptArray::new();
        assert_eq!(floats.decode(&json!([1.5, 2]), DECODE), Some(Some(vec![1.5, 2.0])));
        assert_eq!(floats.encode(&None, ENCODE), None);
        assert_eq!(
            floats.encode(&Some(vec![1.2, 1.3, 2.0]), ENCODE),
            Some(json!([1.2, 1.3, 2.0]))
        );
    }

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Level {
        Bronze,
        Gold,
    }

    impl ConvertibleEnum for Level {
        fn conversion_table() -> &'static [(&'static str, Self)] {
            &[("Bronze", Level::Bronze), ("Gold", Level::Gold)]
        }
    }

    #[test]
    fn test_enum_conversion() {
        let conv = Enum::new(Level::Bronze);
        assert_eq!(conv.decode(&json!("Gold"), DECODE), Some(Level::Gold));
        assert_eq!(conv.decode(&json!("Platinum"), DECODE), None);
        assert_eq!(conv.encode(&Level::Gold, ENCODE), Some(json!("Gold")));
        assert_eq!(conv.default_value(), Level::Bronze);
    }
}
