//! Response wrapper, typed queries and light Carvoyant resource models.

use carvoyant_core::action::{self, Action};
use carvoyant_core::params::RequestParameters;
use carvoyant_core::timestamp;
use carvoyant_core::types::{HttpMethod, SortOrder};
use carvoyant_core::Error;
use chrono::{DateTime, FixedOffset};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::Result;

/// The request that produced a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestInfo {
    /// HTTP verb.
    pub method: HttpMethod,
    /// URL path of the request, without its query string.
    pub path: String,
}

impl RequestInfo {
    /// Create request details.
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
        }
    }
}

/// A completed Carvoyant call.
///
/// Non-2xx statuses are not errors at this level; call
/// [`ApiResponse::error_for_status`] to opt into status mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Parsed JSON body. `Null` for an empty body, a JSON string holding the
    /// raw text when the body is not JSON.
    pub body: Value,
    /// The request that produced this response.
    pub request: RequestInfo,
}

impl ApiResponse {
    /// Create a response.
    #[must_use]
    pub const fn new(status: u16, body: Value, request: RequestInfo) -> Self {
        Self {
            status,
            body,
            request,
        }
    }

    /// Build a response from raw body text.
    #[must_use]
    pub fn from_text(status: u16, text: &str, request: RequestInfo) -> Self {
        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
        };

        Self::new(status, body, request)
    }

    /// Returns true for 2xx statuses.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Deserialize the whole body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParseError`] if the body does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.body.clone()).map_err(Error::from)
    }

    /// Deserialize one top-level field of the body, e.g. `vehicle` or `trip`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParseError`] if the field is missing or does not match `T`.
    pub fn payload<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        let value = self
            .body
            .get(key)
            .ok_or_else(|| Error::ParseError(format!("response has no `{key}` field")))?;

        serde_json::from_value(value.clone()).map_err(Error::from)
    }

    /// Hypermedia actions carried by the body.
    #[must_use]
    pub fn actions(&self) -> Vec<Action> {
        action::actions(&self.body)
    }

    /// Returns true if the body declares an action called `name`.
    #[must_use]
    pub fn has_action(&self, name: &str) -> bool {
        self.actions().iter().any(|action| action.name == name)
    }

    /// Turn a non-2xx status into an error.
    ///
    /// # Errors
    ///
    /// Returns the error matching the status class, carrying the body text.
    pub fn error_for_status(self) -> Result<Self> {
        if self.is_success() {
            return Ok(self);
        }

        let text = match &self.body {
            Value::String(raw) => raw.clone(),
            Value::Null => "Unknown error".to_string(),
            other => other.to_string(),
        };

        Err(map_status_to_error(self.status, text))
    }
}

fn map_status_to_error(status: u16, text: String) -> Error {
    let Ok(status) = StatusCode::from_u16(status) else {
        return Error::HttpError(format!("Carvoyant error {status}: {text}"));
    };

    match status {
        StatusCode::NOT_FOUND => Error::NotFound(text),
        StatusCode::BAD_REQUEST => Error::BadRequest(text),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Error::InvalidRequest(format!("Carvoyant authentication failed: {text}"))
        }
        StatusCode::CONFLICT => Error::Conflict(text),
        StatusCode::TOO_MANY_REQUESTS
        | StatusCode::BAD_GATEWAY
        | StatusCode::SERVICE_UNAVAILABLE
        | StatusCode::GATEWAY_TIMEOUT => {
            Error::ServiceUnavailable(format!("Carvoyant temporarily unavailable: {text}"))
        }
        status if status.is_server_error() => {
            Error::ServiceUnavailable(format!("Carvoyant server error {status}: {text}"))
        }
        _ => Error::HttpError(format!("Carvoyant error {status}: {text}")),
    }
}

/// Search, sort and pagination parameters shared by collection endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageQuery {
    search_limit: Option<u32>,
    search_offset: Option<u32>,
    sort_order: Option<SortOrder>,
}

impl PageQuery {
    /// Create an empty query.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            search_limit: None,
            search_offset: None,
            sort_order: None,
        }
    }

    /// Maximum number of records to return.
    #[must_use]
    pub const fn with_limit(mut self, limit: u32) -> Self {
        self.search_limit = Some(limit);
        self
    }

    /// Number of records to skip.
    #[must_use]
    pub const fn with_offset(mut self, offset: u32) -> Self {
        self.search_offset = Some(offset);
        self
    }

    /// Result ordering.
    #[must_use]
    pub const fn with_sort_order(mut self, order: SortOrder) -> Self {
        self.sort_order = Some(order);
        self
    }

    fn to_parameters(&self) -> RequestParameters {
        RequestParameters::new()
            .with("searchLimit", self.search_limit)
            .with("searchOffset", self.search_offset)
            .with("sortOrder", self.sort_order)
    }
}

impl From<PageQuery> for RequestParameters {
    fn from(query: PageQuery) -> Self {
        query.to_parameters()
    }
}

/// Filters for a vehicle's trip list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TripQuery {
    page: PageQuery,
    include_data: Option<bool>,
    start_time: Option<DateTime<FixedOffset>>,
    end_time: Option<DateTime<FixedOffset>>,
}

impl TripQuery {
    /// Create an empty query.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pagination and sorting.
    #[must_use]
    pub fn with_page(mut self, page: PageQuery) -> Self {
        self.page = page;
        self
    }

    /// Include the data points collected during each trip.
    #[must_use]
    pub const fn include_data(mut self, include: bool) -> Self {
        self.include_data = Some(include);
        self
    }

    /// Only trips that started after `start`, sent with `start`'s own offset.
    #[must_use]
    pub fn with_start_time<Tz: chrono::TimeZone>(mut self, start: &DateTime<Tz>) -> Self {
        self.start_time = Some(start.fixed_offset());
        self
    }

    /// Only trips that started before `end`.
    #[must_use]
    pub fn with_end_time<Tz: chrono::TimeZone>(mut self, end: &DateTime<Tz>) -> Self {
        self.end_time = Some(end.fixed_offset());
        self
    }
}

impl From<TripQuery> for RequestParameters {
    fn from(query: TripQuery) -> Self {
        query
            .page
            .to_parameters()
            .with("includeData", query.include_data)
            .with("startTime", query.start_time)
            .with("endTime", query.end_time)
    }
}

/// Filters for raw vehicle data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataQuery {
    page: PageQuery,
    key: Option<String>,
    most_recent_only: Option<bool>,
}

impl DataQuery {
    /// Create an empty query.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pagination and sorting. Ignored by the server with `mostRecentOnly`.
    #[must_use]
    pub fn with_page(mut self, page: PageQuery) -> Self {
        self.page = page;
        self
    }

    /// Only data points of this key, e.g. `GEN_SPEED`.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Only the latest data point of every key.
    #[must_use]
    pub const fn most_recent_only(mut self, enabled: bool) -> Self {
        self.most_recent_only = Some(enabled);
        self
    }
}

impl From<DataQuery> for RequestParameters {
    fn from(query: DataQuery) -> Self {
        query
            .page
            .to_parameters()
            .with("key", query.key)
            .with("mostRecentOnly", query.most_recent_only)
    }
}

/// Filters for the deprecated constraint list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstraintQuery {
    page: PageQuery,
    active_only: Option<bool>,
    constraint_type: Option<String>,
}

impl ConstraintQuery {
    /// Create an empty query.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pagination and sorting.
    #[must_use]
    pub fn with_page(mut self, page: PageQuery) -> Self {
        self.page = page;
        self
    }

    /// Only constraints currently enforced.
    #[must_use]
    pub const fn active_only(mut self, enabled: bool) -> Self {
        self.active_only = Some(enabled);
        self
    }

    /// Only constraints of this type. Not checked locally.
    #[must_use]
    pub fn with_type(mut self, constraint_type: impl Into<String>) -> Self {
        self.constraint_type = Some(constraint_type.into());
        self
    }
}

impl From<ConstraintQuery> for RequestParameters {
    fn from(query: ConstraintQuery) -> Self {
        query
            .page
            .to_parameters()
            .with("activeOnly", query.active_only)
            .with("type", query.constraint_type)
    }
}

fn decode_optional(value: Option<&str>) -> Option<Result<DateTime<FixedOffset>>> {
    value.map(timestamp::decode)
}

/// A position report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    /// Wire timestamp of the report.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Latitude in degrees.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    /// Longitude in degrees.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

impl Waypoint {
    /// Decoded report time, if present.
    #[must_use]
    pub fn recorded_at(&self) -> Option<Result<DateTime<FixedOffset>>> {
        decode_optional(self.timestamp.as_deref())
    }
}

/// A vehicle registered with Carvoyant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    /// Vehicle identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle_id: Option<Value>,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Free-form label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Odometer reading.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mileage: Option<f64>,
    /// Identifier of the installed device.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    /// Last known position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_waypoint: Option<Waypoint>,
    /// Any field not modelled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A single trip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    /// Trip identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    /// Wire timestamp of the trip start.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    /// Wire timestamp of the trip end.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    /// Distance covered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mileage: Option<f64>,
    /// Where the trip started.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_waypoint: Option<Waypoint>,
    /// Where the trip ended.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_waypoint: Option<Waypoint>,
    /// Data points, present with `includeData=true`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data: Vec<DataPoint>,
    /// Any field not modelled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Trip {
    /// Decoded start time, if present.
    #[must_use]
    pub fn started_at(&self) -> Option<Result<DateTime<FixedOffset>>> {
        decode_optional(self.start_time.as_deref())
    }

    /// Decoded end time, if present.
    #[must_use]
    pub fn ended_at(&self) -> Option<Result<DateTime<FixedOffset>>> {
        decode_optional(self.end_time.as_deref())
    }
}

/// One raw sensor reading.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataPoint {
    /// Data point identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    /// Wire timestamp of the reading.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Data key, e.g. `GEN_SPEED`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Raw value as reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// Human-readable value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translated_value: Option<Value>,
    /// Any field not modelled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An account.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Account identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    /// First name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    /// Last name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// Login name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Contact email.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Any field not modelled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A webhook subscription for vehicle events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSubscription {
    /// Subscription identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    /// Event type, internal name on the wire.
    #[serde(rename = "_type", default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<carvoyant_core::EventType>,
    /// Minimum minutes between notifications.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_time: Option<u32>,
    /// Webhook URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_url: Option<String>,
    /// Notification period, e.g. `STATECHANGE`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_period: Option<String>,
    /// Any field not modelled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A delivered event notification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventNotification {
    /// Notification identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    /// Event type, internal name on the wire.
    #[serde(rename = "_type", default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<carvoyant_core::EventType>,
    /// Wire timestamp of the event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Subscription that produced the notification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_subscription_id: Option<Value>,
    /// Vehicle the event concerns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle_id: Option<Value>,
    /// Any field not modelled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EventNotification {
    /// Decoded event time, if present.
    #[must_use]
    pub fn occurred_at(&self) -> Option<Result<DateTime<FixedOffset>>> {
        decode_optional(self.timestamp.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carvoyant_core::params::ParamValue;
    use carvoyant_core::EventType;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn request() -> RequestInfo {
        RequestInfo::new(HttpMethod::Get, "/v1/api/vehicle/")
    }

    #[test]
    fn test_body_from_text() {
        assert_eq!(ApiResponse::from_text(204, "", request()).body, Value::Null);
        assert_eq!(
            ApiResponse::from_text(200, "{\"vehicle\":[]}", request()).body,
            json!({ "vehicle": [] })
        );
        assert_eq!(
            ApiResponse::from_text(596, "Service Not Found", request()).body,
            json!("Service Not Found")
        );
    }

    #[test]
    fn test_payload_extracts_field() {
        let response = ApiResponse::new(
            200,
            json!({
                "vehicle": {
                    "vehicleId": 12,
                    "name": "Work Truck",
                    "mileage": 1520.5,
                    "lastWaypoint": { "timestamp": "20130526T204840+0000", "latitude": 39.7, "longitude": -104.9 },
                    "year": "2012"
                }
            }),
            request(),
        );

        let vehicle: Vehicle = response.payload("vehicle").unwrap();
        assert_eq!(vehicle.vehicle_id, Some(json!(12)));
        assert_eq!(vehicle.name.as_deref(), Some("Work Truck"));
        assert_eq!(vehicle.extra.get("year"), Some(&json!("2012")));

        let recorded = vehicle.last_waypoint.unwrap().recorded_at().unwrap().unwrap();
        assert_eq!(recorded.timestamp_millis(), 1_369_601_320_000);
    }

    #[test]
    fn test_payload_missing_field() {
        let response = ApiResponse::new(200, json!({ "trip": [] }), request());
        let err = response.payload::<Vec<Trip>>("vehicle").unwrap_err();
        assert!(matches!(err, Error::ParseError(_)));
    }

    #[test]
    fn test_event_subscription_type() {
        let subscription: EventSubscription = serde_json::from_value(json!({
            "id": 88,
            "_type": "LOWBATTERY",
            "minimumTime": 10,
            "postUrl": "https://example.com/hook"
        }))
        .unwrap();

        assert_eq!(subscription.event_type, Some(EventType::LowBattery));
        assert_eq!(
            serde_json::to_value(&subscription).unwrap()["_type"],
            json!("LOWBATTERY")
        );
    }

    #[test]
    fn test_error_for_status() {
        let ok = ApiResponse::new(200, json!({}), request());
        assert!(ok.error_for_status().is_ok());

        let cases = [
            (404, "Not found: missing"),
            (400, "Bad request: missing"),
            (401, "Invalid request: Carvoyant authentication failed: missing"),
            (409, "Conflict: missing"),
            (503, "Service unavailable: Carvoyant temporarily unavailable: missing"),
        ];

        for (status, expected) in cases {
            let response = ApiResponse::new(status, json!("missing"), request());
            assert_eq!(response.error_for_status().unwrap_err().to_string(), expected);
        }

        let not_found = ApiResponse::new(596, Value::Null, request());
        assert!(matches!(
            not_found.error_for_status(),
            Err(Error::ServiceUnavailable(_))
        ));
    }

    #[test]
    fn test_trip_query_parameters() {
        let start = Utc.with_ymd_and_hms(2013, 6, 27, 9, 0, 0).unwrap();
        let params: RequestParameters = TripQuery::new()
            .with_page(PageQuery::new().with_limit(2).with_sort_order(SortOrder::Desc))
            .include_data(true)
            .with_start_time(&start)
            .into();

        assert_eq!(params.get("searchLimit"), Some(&ParamValue::Integer(2)));
        assert_eq!(params.get("sortOrder"), Some(&ParamValue::Text("desc".into())));
        assert_eq!(params.get("includeData"), Some(&ParamValue::Bool(true)));
        assert!(matches!(params.get("startTime"), Some(ParamValue::Timestamp(_))));
        assert!(!params.is_set("endTime"));
        assert!(!params.is_set("searchOffset"));
    }

    #[test]
    fn test_data_query_parameters() {
        let params: RequestParameters = DataQuery::new()
            .with_key("GEN_SPEED")
            .most_recent_only(false)
            .into();

        assert_eq!(params.get("key"), Some(&ParamValue::Text("GEN_SPEED".into())));
        assert_eq!(params.get("mostRecentOnly"), Some(&ParamValue::Bool(false)));
    }

    #[test]
    fn test_constraint_query_parameters() {
        let params: RequestParameters = ConstraintQuery::new()
            .active_only(true)
            .with_type("SPEEDING")
            .into();

        assert_eq!(params.get("activeOnly"), Some(&ParamValue::Bool(true)));
        assert_eq!(params.get("type"), Some(&ParamValue::Text("SPEEDING".into())));
    }
}
