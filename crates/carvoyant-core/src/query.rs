//! Query-string helpers for server-provided URIs.
//!
//! Action URIs embed the parameters of the follow-up request in their query
//! string. These helpers cut that string out of a URI and turn it back into a
//! typed [`RequestParameters`] bag using the shared [`ParameterRules`].

use url::form_urlencoded;

use crate::error::Result;
use crate::params::{ParameterRules, RequestParameters};

/// Returns the query portion of `uri`: after the first `?` and before any `#`.
///
/// A URI without `?` has an empty query string.
#[must_use]
pub fn query_string(uri: &str) -> &str {
    let Some((_, rest)) = uri.split_once('?') else {
        return "";
    };

    rest.split_once('#').map_or(rest, |(query, _)| query)
}

/// Returns `uri` without its query string or fragment.
#[must_use]
pub fn strip_query(uri: &str) -> &str {
    let end = uri.find(|c: char| c == '?' || c == '#').unwrap_or(uri.len());
    &uri[..end]
}

/// Decodes a form-encoded query string into typed parameters.
///
/// Keys and values are percent-decoded with `+` read as a space. Names with a
/// rule are converted to their typed form; every other name is kept as text.
/// Pairs with an empty key are skipped.
///
/// # Errors
///
/// Returns the first conversion error raised by [`ParameterRules::decode_value`].
pub fn decode_query(query: &str, rules: &ParameterRules) -> Result<RequestParameters> {
    let mut params = RequestParameters::new();

    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        if key.is_empty() {
            continue;
        }

        let decoded = rules.decode_value(&key, &value)?;
        params.insert(key.into_owned(), decoded);
    }

    Ok(params)
}
