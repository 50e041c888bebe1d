//! Core Carvoyant domain types.
//!
//! HTTP verbs accepted by the request builder, paging sort orders and the
//! event types used in event subscription and notification paths.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// HTTP verbs understood by the Carvoyant API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    /// Read a resource or collection
    Get,
    /// Create or update a resource
    Post,
    /// Delete a resource
    Delete,
}

impl HttpMethod {
    /// Returns the lowercase verb name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Post => "post",
            Self::Delete => "delete",
        }
    }

    /// Whether parameters travel in the request body rather than the query string.
    #[must_use]
    pub const fn sends_body(&self) -> bool {
        matches!(self, Self::Post)
    }
}

impl FromStr for HttpMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "get" => Ok(Self::Get),
            "post" => Ok(Self::Post),
            "delete" | "del" => Ok(Self::Delete),
            _ => Err(Error::validation(
                "method must be one of the following: get, post, delete",
            )),
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => Self::GET,
            HttpMethod::Post => Self::POST,
            HttpMethod::Delete => Self::DELETE,
        }
    }
}

impl TryFrom<&reqwest::Method> for HttpMethod {
    type Error = Error;

    fn try_from(method: &reqwest::Method) -> Result<Self> {
        method.as_str().parse()
    }
}

/// Sort order accepted by paged collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Ascending
    Asc,
    /// Descending
    Desc,
}

impl SortOrder {
    /// Every accepted sort order, in the order they are reported in errors.
    pub const ALL: [Self; 2] = [Self::Asc, Self::Desc];

    /// Returns the wire value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl FromStr for SortOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|order| order.as_str() == s)
            .ok_or_else(|| {
                Error::validation(format!(
                    "sortOrder must be one of the following: {}",
                    Self::ALL.map(|o| o.as_str()).join(", ")
                ))
            })
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event types used by event subscriptions and notifications.
///
/// Response bodies carry the internal upper-case name (`_type`), while URL
/// paths use the camel-cased external name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventType {
    /// Vehicle entered or left a geofence
    Geofence,
    /// Battery voltage dropped below a threshold
    LowBattery,
    /// A numeric data key crossed a threshold
    NumericDataKey,
    /// Vehicle was driven during a time window
    TimeOfDay,
    /// Vehicle reported a diagnostic trouble code
    TroubleCode,
    /// Any type this client does not know about
    Other(String),
}

const EVENT_TYPE_NAMES: [(&str, &str); 5] = [
    ("GEOFENCE", "geoFence"),
    ("LOWBATTERY", "lowBattery"),
    ("NUMERICDATAKEY", "numericDataKey"),
    ("TIMEOFDAY", "timeOfDay"),
    ("TROUBLECODE", "troubleCode"),
];

impl EventType {
    /// Returns the internal name found in `_type` fields.
    #[must_use]
    pub fn internal_name(&self) -> &str {
        match self {
            Self::Geofence => EVENT_TYPE_NAMES[0].0,
            Self::LowBattery => EVENT_TYPE_NAMES[1].0,
            Self::NumericDataKey => EVENT_TYPE_NAMES[2].0,
            Self::TimeOfDay => EVENT_TYPE_NAMES[3].0,
            Self::TroubleCode => EVENT_TYPE_NAMES[4].0,
            Self::Other(name) => name,
        }
    }

    /// Returns the name used in URL paths.
    #[must_use]
    pub fn external_name(&self) -> &str {
        match self {
            Self::Geofence => EVENT_TYPE_NAMES[0].1,
            Self::LowBattery => EVENT_TYPE_NAMES[1].1,
            Self::NumericDataKey => EVENT_TYPE_NAMES[2].1,
            Self::TimeOfDay => EVENT_TYPE_NAMES[3].1,
            Self::TroubleCode => EVENT_TYPE_NAMES[4].1,
            Self::Other(name) => name,
        }
    }

    /// Parses either the internal or the external name.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        let index = EVENT_TYPE_NAMES
            .iter()
            .position(|(internal, external)| *internal == name || *external == name);

        match index {
            Some(0) => Self::Geofence,
            Some(1) => Self::LowBattery,
            Some(2) => Self::NumericDataKey,
            Some(3) => Self::TimeOfDay,
            Some(4) => Self::TroubleCode,
            _ => Self::Other(name.to_string()),
        }
    }
}

impl From<String> for EventType {
    fn from(name: String) -> Self {
        Self::from_name(&name)
    }
}

impl From<&str> for EventType {
    fn from(name: &str) -> Self {
        Self::from_name(name)
    }
}

impl From<EventType> for String {
    fn from(event_type: EventType) -> Self {
        event_type.internal_name().to_string()
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.external_name())
    }
}

/// Converts an internal event type name (`GEOFENCE`) to its path form (`geoFence`).
///
/// Unknown names are returned unchanged.
#[must_use]
pub fn externalize_event_type(internal: &str) -> String {
    EventType::from_name(internal).external_name().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_method_parse_is_case_insensitive() {
        assert_eq!("GET".parse::<HttpMethod>().unwrap(), HttpMethod::Get);
        assert_eq!("Post".parse::<HttpMethod>().unwrap(), HttpMethod::Post);
        assert_eq!("delete".parse::<HttpMethod>().unwrap(), HttpMethod::Delete);
    }

    #[test]
    fn test_http_method_rejects_unknown_verbs() {
        let err = "put".parse::<HttpMethod>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "method must be one of the following: get, post, delete"
        );
    }

    #[test]
    fn test_http_method_maps_to_reqwest() {
        assert_eq!(reqwest::Method::from(HttpMethod::Delete), reqwest::Method::DELETE);
        assert_eq!(
            HttpMethod::try_from(&reqwest::Method::POST).unwrap(),
            HttpMethod::Post
        );
        assert!(HttpMethod::Post.sends_body());
        assert!(!HttpMethod::Delete.sends_body());
    }

    #[test]
    fn test_sort_order_parse() {
        assert_eq!("asc".parse::<SortOrder>().unwrap(), SortOrder::Asc);
        assert_eq!("desc".parse::<SortOrder>().unwrap(), SortOrder::Desc);

        let err = "DESC".parse::<SortOrder>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "sortOrder must be one of the following: asc, desc"
        );
    }

    #[test]
    fn test_externalize_event_type() {
        let expected = [
            ("GEOFENCE", "geoFence"),
            ("LOWBATTERY", "lowBattery"),
            ("NUMERICDATAKEY", "numericDataKey"),
            ("TIMEOFDAY", "timeOfDay"),
            ("TROUBLECODE", "troubleCode"),
            ("UNKNOWN", "UNKNOWN"),
        ];

        for (internal, external) in expected {
            assert_eq!(externalize_event_type(internal), external);
        }
    }

    #[test]
    fn test_event_type_serde_uses_internal_name() {
        let parsed: EventType = serde_json::from_str("\"LOWBATTERY\"").unwrap();
        assert_eq!(parsed, EventType::LowBattery);
        assert_eq!(serde_json::to_string(&parsed).unwrap(), "\"LOWBATTERY\"");
        assert_eq!(parsed.to_string(), "lowBattery");

        let from_path = EventType::from("timeOfDay");
        assert_eq!(from_path, EventType::TimeOfDay);
    }
}
