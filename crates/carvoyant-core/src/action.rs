//! Hypermedia actions embedded in Carvoyant responses.
//!
//! Collection responses carry an `actions` array of `{ name, uri }` entries
//! describing follow-up requests, most notably the `next` and `previous`
//! pages. This module finds an action by name and recovers the parameters
//! needed to replay it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::params::{ParameterRules, RequestParameters};
use crate::query::{decode_query, query_string, strip_query};

/// Action name the server uses for the following page.
pub const NEXT_PAGE_ACTION: &str = "next";

/// Action name the server uses for the preceding page.
pub const PREVIOUS_PAGE_ACTION: &str = "previous";

/// A server-declared follow-up request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// Action name, e.g. `next`.
    pub name: String,
    /// Absolute URI of the follow-up request.
    pub uri: String,
}

impl Action {
    /// Create an action.
    pub fn new(name: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            uri: uri.into(),
        }
    }

    /// The action URI's query string.
    #[must_use]
    pub fn query(&self) -> &str {
        query_string(&self.uri)
    }

    /// Decode the action URI's query string into request parameters.
    ///
    /// # Errors
    ///
    /// Returns an error when a numeric or timestamp field cannot be converted.
    pub fn parameters(&self, rules: &ParameterRules) -> Result<RequestParameters> {
        decode_query(self.query(), rules)
    }
}

/// Every well-formed action in a response body, in order.
///
/// Entries missing a string `name` or `uri` are skipped.
#[must_use]
pub fn actions(body: &Value) -> Vec<Action> {
    body.get("actions")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| Action::deserialize(entry).ok())
                .collect()
        })
        .unwrap_or_default()
}

/// The first action in `body` whose name equals `name`.
///
/// # Errors
///
/// Returns [`Error::ActionNotFound`] when no action matches, including when the
/// body has no `actions` array at all.
pub fn find_action(body: &Value, name: &str) -> Result<Action> {
    actions(body)
        .into_iter()
        .find(|action| action.name == name)
        .ok_or_else(|| Error::ActionNotFound(name.to_string()))
}

/// Parameters for replaying the action called `name`.
///
/// # Errors
///
/// Returns [`Error::ActionNotFound`] when no action matches, or a conversion
/// error from the action's query string.
pub fn action_parameters(
    body: &Value,
    name: &str,
    rules: &ParameterRules,
) -> Result<RequestParameters> {
    find_action(body, name)?.parameters(rules)
}

/// Turns the path of a previous request into a path relative to the API root.
///
/// `api_prefix` is the path component of the configured base URL (for example
/// `/v1/api`). When the request path does not start with it, everything up to
/// and including the first `/api` segment is dropped instead. Any query string
/// is removed.
#[must_use]
pub fn replay_path(request_path: &str, api_prefix: &str) -> String {
    let path = strip_query(request_path);
    let prefix = api_prefix.trim_end_matches('/');

    if !prefix.is_empty() {
        if let Some(rest) = path.strip_prefix(prefix) {
            if rest.is_empty() || rest.starts_with('/') {
                return rest.to_string();
            }
        }
    }

    match path.find("/api") {
        Some(index) => path[index + "/api".len()..].to_string(),
        None => path.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamValue;
    use crate::timestamp;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn trip_page() -> Value {
        json!({
            "trip": [],
            "actions": [
                {
                    "name": "previous",
                    "uri": "https://dash.carvoyant.com/api/vehicle/C201200001/trip?searchOffset=0&searchLimit=2"
                },
                {
                    "name": "next",
                    "uri": "https://dash.carvoyant.com/api/vehicle/C201200001/trip?includeData=true&sortOrder=desc&startTime=2013-06-27+09%3A00%3A00%2B0000&searchOffset=4&searchLimit=2"
                }
            ]
        })
    }

    #[test]
    fn next_action_parameters() {
        let params =
            action_parameters(&trip_page(), NEXT_PAGE_ACTION, &ParameterRules::standard()).unwrap();
        let start = Utc.with_ymd_and_hms(2013, 6, 27, 9, 0, 0).unwrap();

        let expected = RequestParameters::new()
            .with("includeData", true)
            .with("sortOrder", "desc")
            .with("startTime", timestamp::encode(&start))
            .with("searchOffset", 4)
            .with("searchLimit", 2);

        assert_eq!(params, expected);
        assert_eq!(
            params.get("startTime"),
            Some(&ParamValue::Text("20130627T090000+0000".to_string()))
        );
    }

    #[test]
    fn first_matching_action_wins() {
        let body = json!({
            "actions": [
                { "name": "next", "uri": "/api/vehicle?searchOffset=10" },
                { "name": "next", "uri": "/api/vehicle?searchOffset=20" }
            ]
        });
        let action = find_action(&body, "next").unwrap();
        assert_eq!(action.uri, "/api/vehicle?searchOffset=10");
    }

    #[test]
    fn missing_action_is_reported_by_name() {
        let err = action_parameters(&trip_page(), "missing", &ParameterRules::standard())
            .unwrap_err();
        assert_eq!(err, Error::ActionNotFound("missing".to_string()));
        assert_eq!(err.to_string(), "No action found for name: missing");
    }

    #[test]
    fn body_without_actions_has_no_action() {
        for body in [json!({}), json!({ "actions": [] }), json!(null), json!({ "actions": "next" })] {
            let err = find_action(&body, NEXT_PAGE_ACTION).unwrap_err();
            assert_eq!(err.to_string(), "No action found for name: next");
        }
    }

    #[test]
    fn malformed_entries_are_skipped() {
        let body = json!({
            "actions": [
                { "name": "next" },
                { "name": 7, "uri": "/api/x" },
                { "name": "next", "uri": "/api/vehicle/" }
            ]
        });
        assert_eq!(actions(&body), vec![Action::new("next", "/api/vehicle/")]);
    }

    #[test]
    fn action_without_query_yields_no_parameters() {
        let action = Action::new("self", "https://api.carvoyant.com/v1/api/vehicle/");
        assert_eq!(action.query(), "");
        assert!(action.parameters(&ParameterRules::standard()).unwrap().is_empty());
    }

    #[test]
    fn replay_path_strips_prefix_and_query() {
        assert_eq!(
            replay_path("/v1/api/vehicle/12/trip/?searchLimit=2", "/v1/api"),
            "/vehicle/12/trip/"
        );
        assert_eq!(replay_path("/api/vehicle/12/trip", "/api/"), "/vehicle/12/trip");
        assert_eq!(replay_path("/api/vehicle/12/trip", "/v1/api"), "/vehicle/12/trip");
        assert_eq!(replay_path("/vehicle/12", ""), "/vehicle/12");
    }
}
