//! Request parameters and the rule table that governs their wire encoding.
//!
//! A [`RequestParameters`] bag is loosely typed on purpose: resource methods
//! and pagination both funnel into it. Names listed in [`ParameterRules`] are
//! validated and converted before a request is built; every other name is
//! passed through untouched.

use chrono::{DateTime, FixedOffset, TimeZone};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::timestamp;
use crate::types::{EventType, SortOrder};

/// A single parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// No value; the entry is dropped before serialization.
    Unset,
    /// Free text.
    Text(String),
    /// Whole number.
    Integer(i64),
    /// Floating point number.
    Float(f64),
    /// Boolean.
    Bool(bool),
    /// Date-time carrying the offset it will be encoded with.
    Timestamp(DateTime<FixedOffset>),
    /// Structured JSON, only meaningful in request bodies.
    Json(Value),
}

impl ParamValue {
    /// Returns true for [`ParamValue::Unset`].
    #[must_use]
    pub const fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }

    /// Human readable kind, used in log output.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Unset => "unset",
            Self::Text(_) => "string",
            Self::Integer(_) | Self::Float(_) => "number",
            Self::Bool(_) => "boolean",
            Self::Timestamp(_) => "date",
            Self::Json(_) => "json",
        }
    }

    /// Renders the value as it appears in a query string.
    #[must_use]
    pub fn to_query_value(&self) -> String {
        match self {
            Self::Unset => String::new(),
            Self::Text(text) => text.clone(),
            Self::Integer(number) => number.to_string(),
            Self::Float(number) => format_float(*number),
            Self::Bool(flag) => flag.to_string(),
            Self::Timestamp(value) => timestamp::encode(value),
            Self::Json(value) => value.to_string(),
        }
    }

    /// Renders the value as a JSON body field.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Unset => Value::Null,
            Self::Text(text) => Value::String(text.clone()),
            Self::Integer(number) => Value::from(*number),
            Self::Float(number) => serde_json::Number::from_f64(*number)
                .map_or(Value::Null, Value::Number),
            Self::Bool(flag) => Value::Bool(*flag),
            Self::Timestamp(value) => Value::String(timestamp::encode(value)),
            Self::Json(value) => value.clone(),
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn format_float(number: f64) -> String {
    if number.is_finite() && number.fract() == 0.0 && number.abs() < 9_007_199_254_740_992.0 {
        (number as i64).to_string()
    } else {
        number.to_string()
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&String> for ParamValue {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Keeps the date's own offset: a `DateTime<Utc>` is sent as `+0000`. Use
/// [`timestamp::encode_local`] and pass the text for the process-local offset.
impl<Tz: TimeZone> From<DateTime<Tz>> for ParamValue {
    fn from(value: DateTime<Tz>) -> Self {
        Self::Timestamp(value.fixed_offset())
    }
}

impl From<SortOrder> for ParamValue {
    fn from(value: SortOrder) -> Self {
        Self::Text(value.as_str().to_string())
    }
}

impl From<EventType> for ParamValue {
    fn from(value: EventType) -> Self {
        Self::Text(value.internal_name().to_string())
    }
}

impl From<Value> for ParamValue {
    fn from(value: Value) -> Self {
        match value {
            Value::String(text) => Self::Text(text),
            Value::Bool(flag) => Self::Bool(flag),
            Value::Number(number) => number
                .as_i64()
                .map(Self::Integer)
                .or_else(|| number.as_f64().map(Self::Float))
                .unwrap_or(Self::Json(Value::Number(number))),
            other => Self::Json(other),
        }
    }
}

impl<T> From<Option<T>> for ParamValue
where
    T: Into<ParamValue>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Unset, Into::into)
    }
}

/// Ordered mapping from parameter name to value.
///
/// Inserting an existing name replaces its value in place, so the original
/// ordering is kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestParameters {
    entries: Vec<(String, ParamValue)>,
}

impl RequestParameters {
    /// Create an empty parameter bag.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace a value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        let key = key.into();
        let value = value.into();

        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Look up a value by name.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value)
    }

    /// Remove a value by name, returning it.
    pub fn remove(&mut self, key: &str) -> Option<ParamValue> {
        let index = self.entries.iter().position(|(existing, _)| existing == key)?;
        Some(self.entries.remove(index).1)
    }

    /// Returns true when `key` is present with a value other than [`ParamValue::Unset`].
    #[must_use]
    pub fn is_set(&self, key: &str) -> bool {
        self.get(key).is_some_and(|value| !value.is_unset())
    }

    /// Iterate over entries in insertion order, unset ones included.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Number of entries, unset ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no entries have been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merge another bag into this one; later values win.
    pub fn merge(&mut self, other: Self) {
        for (key, value) in other.entries {
            self.insert(key, value);
        }
    }

    /// Build a parameter bag from the top-level fields of a serializable value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when the value does not serialize to a
    /// JSON object, naming it with `what`.
    pub fn from_serializable<T>(what: &str, value: &T) -> Result<Self>
    where
        T: Serialize + ?Sized,
    {
        match serde_json::to_value(value)? {
            Value::Object(fields) => Ok(Self::from(fields)),
            _ => Err(Error::validation(format!("{what} must be an Object."))),
        }
    }
}

impl From<Map<String, Value>> for RequestParameters {
    fn from(fields: Map<String, Value>) -> Self {
        fields.into_iter().collect()
    }
}

impl<K, V> FromIterator<(K, V)> for RequestParameters
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (key, value) in iter {
            params.insert(key, value);
        }
        params
    }
}

/// How a named parameter is validated and encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    /// Must be `asc` or `desc`.
    SortOrder,
    /// Must be numeric.
    Number,
    /// Must be boolean; sent as `"true"` or `"false"`.
    Boolean,
    /// Must be boolean; sent as `"true"`, omitted entirely when false.
    BooleanWhenTrue,
    /// Must be a date-time or an already encoded wire timestamp.
    Timestamp,
}

/// Names that receive special handling when encoding and decoding parameters.
///
/// The same table is used when building a request and when turning an action
/// URI back into parameters, so both directions agree on every name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterRules {
    rules: BTreeMap<String, ParamKind>,
}

impl ParameterRules {
    /// The rules understood by the Carvoyant API.
    #[must_use]
    pub fn standard() -> Self {
        Self::empty()
            .with_rule("sortOrder", ParamKind::SortOrder)
            .with_rule("searchLimit", ParamKind::Number)
            .with_rule("searchOffset", ParamKind::Number)
            .with_rule("activeOnly", ParamKind::Boolean)
            .with_rule("includeData", ParamKind::Boolean)
            .with_rule("mostRecentOnly", ParamKind::BooleanWhenTrue)
            .with_rule("startTime", ParamKind::Timestamp)
            .with_rule("endTime", ParamKind::Timestamp)
    }

    /// A table with no rules; every parameter passes through.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            rules: BTreeMap::new(),
        }
    }

    /// Add or replace a rule.
    #[must_use]
    pub fn with_rule(mut self, name: impl Into<String>, kind: ParamKind) -> Self {
        self.rules.insert(name.into(), kind);
        self
    }

    /// The rule for `name`, if any.
    #[must_use]
    pub fn kind_of(&self, name: &str) -> Option<ParamKind> {
        self.rules.get(name).copied()
    }

    /// Iterate over every rule, ordered by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, ParamKind)> {
        self.rules.iter().map(|(name, kind)| (name.as_str(), *kind))
    }

    /// Validate every set parameter and convert it to its wire representation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] naming the first parameter that breaks its rule.
    pub fn serialize(&self, params: &RequestParameters) -> Result<SerializedParameters> {
        let mut entries = Vec::with_capacity(params.len());

        for (key, value) in params.iter() {
            if value.is_unset() {
                continue;
            }

            let encoded = match self.kind_of(key) {
                Some(kind) => encode_value(key, kind, value)?,
                None => Some(value.clone()),
            };

            if let Some(encoded) = encoded {
                entries.push((key.to_string(), encoded));
            }
        }

        Ok(SerializedParameters { entries })
    }

    /// Convert one decoded query-string pair back into a typed value.
    ///
    /// # Errors
    ///
    /// Returns an error when a numeric field holds no digits or does not fit
    /// an `i64`, or when a timestamp field cannot be parsed.
    pub fn decode_value(&self, key: &str, raw: &str) -> Result<ParamValue> {
        match self.kind_of(key) {
            Some(ParamKind::Boolean | ParamKind::BooleanWhenTrue) => Ok(ParamValue::Bool(raw == "true")),
            Some(ParamKind::Timestamp) => {
                let parsed = timestamp::parse_lenient(raw)?;
                Ok(ParamValue::Text(timestamp::encode(&parsed)))
            }
            Some(ParamKind::Number) => {
                let digits = leading_integer(raw)
                    .ok_or_else(|| Error::validation(format!("{key} must be a Number.")))?;
                digits
                    .parse()
                    .map(ParamValue::Integer)
                    .map_err(|_| Error::validation(format!("{key} is out of range.")))
            }
            Some(ParamKind::SortOrder) | None => Ok(ParamValue::Text(raw.to_string())),
        }
    }
}

impl Default for ParameterRules {
    fn default() -> Self {
        Self::standard()
    }
}

fn encode_value(key: &str, kind: ParamKind, value: &ParamValue) -> Result<Option<ParamValue>> {
    match (kind, value) {
        (ParamKind::SortOrder, ParamValue::Text(text))
            if SortOrder::ALL.iter().any(|order| order.as_str() == text.as_str()) =>
        {
            Ok(Some(value.clone()))
        }
        (ParamKind::SortOrder, _) => Err(Error::validation(format!(
            "{key} must be one of the following: {}",
            SortOrder::ALL.map(|order| order.as_str()).join(", ")
        ))),
        (ParamKind::Number, ParamValue::Integer(_) | ParamValue::Float(_)) => Ok(Some(value.clone())),
        (ParamKind::Number, _) => Err(Error::validation(format!("{key} must be a Number."))),
        (ParamKind::Boolean, ParamValue::Bool(flag)) => Ok(Some(ParamValue::Text(flag.to_string()))),
        (ParamKind::BooleanWhenTrue, ParamValue::Bool(true)) => {
            Ok(Some(ParamValue::Text("true".to_string())))
        }
        (ParamKind::BooleanWhenTrue, ParamValue::Bool(false)) => Ok(None),
        (ParamKind::Boolean | ParamKind::BooleanWhenTrue, _) => {
            Err(Error::validation(format!("{key} must be a Boolean.")))
        }
        (ParamKind::Timestamp, ParamValue::Timestamp(date)) => {
            Ok(Some(ParamValue::Text(timestamp::encode(date))))
        }
        (ParamKind::Timestamp, ParamValue::Text(text)) if timestamp::is_exact_wire_timestamp(text) => {
            Ok(Some(value.clone()))
        }
        (ParamKind::Timestamp, _) => Err(Error::validation(format!("{key} must be a Date."))),
    }
}

/// Slices an optional sign followed by digits, ignoring anything after them.
fn leading_integer(raw: &str) -> Option<&str> {
    let raw = raw.trim_start();
    let sign_len = usize::from(raw.starts_with(|c: char| c == '+' || c == '-'));
    let digits = raw[sign_len..]
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(raw.len() - sign_len);

    if digits == 0 {
        return None;
    }

    Some(&raw[..sign_len + digits])
}

/// Parameters that passed validation, in wire form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SerializedParameters {
    entries: Vec<(String, ParamValue)>,
}

impl SerializedParameters {
    /// Key/value pairs for a query string.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.clone(), value.to_query_value()))
            .collect()
    }

    /// A JSON object for a request body.
    #[must_use]
    pub fn json_body(&self) -> Value {
        let body: Map<String, Value> = self
            .entries
            .iter()
            .map(|(key, value)| (key.clone(), value.to_json()))
            .collect();
        Value::Object(body)
    }

    /// Returns true if no parameters survived serialization.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns true if `key` will be sent.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(existing, _)| existing == key)
    }
}
