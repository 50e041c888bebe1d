//! Per-resource operations: accounts, vehicles, trips, data, constraints and events.
//!
//! Every method is a thin mapping onto [`CarvoyantClient::send_request`]; ids
//! become percent-encoded path segments and entity payloads become JSON bodies.

use carvoyant_core::params::{ParamValue, RequestParameters};
use carvoyant_core::types::{externalize_event_type, EventType, HttpMethod};
use carvoyant_core::Error;
use serde::Serialize;
use url::Url;

use crate::client::CarvoyantClient;
use crate::models::ApiResponse;
use crate::Result;

fn require(value: &str, name: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::validation(format!("{name} must be defined.")));
    }
    if value == "." || value == ".." {
        return Err(Error::validation(format!("{name} is not a valid identifier.")));
    }
    Ok(())
}

fn entity<T: Serialize + ?Sized>(what: &str, data: &T) -> Result<RequestParameters> {
    RequestParameters::from_serializable(what, data)
}

fn required_field(params: &RequestParameters, what: &str, field: &str) -> Result<String> {
    match params.get(field) {
        None | Some(ParamValue::Unset | ParamValue::Json(serde_json::Value::Null)) => Err(
            Error::validation(format!("{what}.{field} must be defined.")),
        ),
        Some(value) => {
            let value = value.to_query_value();
            require(&value, &format!("{what}.{field}"))?;
            Ok(value)
        }
    }
}

/// Joins segments into an absolute path, escaping `/`, `?`, `#` and `%` in each.
/// A trailing empty segment yields a trailing slash.
fn resource_path(segments: &[&str]) -> Result<String> {
    let mut url = Url::parse("http://localhost/")?;
    url.path_segments_mut()
        .map_err(|()| Error::InvalidEndpoint("cannot build a Carvoyant path".to_string()))?
        .clear()
        .extend(segments);
    Ok(url.path().to_string())
}

fn event_path(
    vehicle_id: &str,
    collection: &str,
    event_type: Option<&EventType>,
    id: Option<&str>,
) -> Result<String> {
    let mut segments = vec!["vehicle", vehicle_id, collection];
    if let Some(event_type) = event_type {
        require(event_type.external_name(), "eventType")?;
        segments.push(event_type.external_name());
    }
    segments.extend(id);
    resource_path(&segments)
}

impl CarvoyantClient {
    /// List every visible account.
    pub async fn accounts(&self) -> Result<ApiResponse> {
        let path = resource_path(&["account", ""])?;
        self.send_request(&path, HttpMethod::Get, RequestParameters::new())
            .await
    }

    /// Fetch one account.
    pub async fn account_details(&self, account_id: &str) -> Result<ApiResponse> {
        require(account_id, "accountId")?;
        let path = resource_path(&["account", account_id])?;
        self.send_request(&path, HttpMethod::Get, RequestParameters::new())
            .await
    }

    /// Create an account. Partner keys only.
    pub async fn create_account<T>(&self, account_data: &T) -> Result<ApiResponse>
    where
        T: Serialize + ?Sized,
    {
        let params = entity("accountData", account_data)?;
        let path = resource_path(&["account", ""])?;
        self.send_request(&path, HttpMethod::Post, params).await
    }

    /// Update an account identified by its `id` field. Partner keys only.
    pub async fn update_account<T>(&self, account_data: &T) -> Result<ApiResponse>
    where
        T: Serialize + ?Sized,
    {
        let params = entity("accountData", account_data)?;
        let id = required_field(&params, "accountData", "id")?;
        let path = resource_path(&["account", &id])?;
        self.send_request(&path, HttpMethod::Post, params).await
    }

    /// Delete an account. Partner keys only.
    pub async fn delete_account(&self, account_id: &str) -> Result<ApiResponse> {
        require(account_id, "accountId")?;
        let path = resource_path(&["account", account_id])?;
        self.send_request(&path, HttpMethod::Delete, RequestParameters::new())
            .await
    }

    /// List vehicles.
    pub async fn vehicles(&self) -> Result<ApiResponse> {
        let path = resource_path(&["vehicle"])?;
        self.send_request(&path, HttpMethod::Get, RequestParameters::new())
            .await
    }

    /// Fetch one vehicle.
    pub async fn vehicle(&self, vehicle_id: &str) -> Result<ApiResponse> {
        require(vehicle_id, "vehicleId")?;
        let path = resource_path(&["vehicle", vehicle_id])?;
        self.send_request(&path, HttpMethod::Get, RequestParameters::new())
            .await
    }

    /// Register a vehicle.
    pub async fn create_vehicle<T>(&self, vehicle_data: &T) -> Result<ApiResponse>
    where
        T: Serialize + ?Sized,
    {
        let params = entity("vehicleData", vehicle_data)?;
        let path = resource_path(&["vehicle", ""])?;
        self.send_request(&path, HttpMethod::Post, params).await
    }

    /// Update a vehicle identified by its `vehicleId` field.
    pub async fn update_vehicle<T>(&self, vehicle_data: &T) -> Result<ApiResponse>
    where
        T: Serialize + ?Sized,
    {
        let params = entity("vehicleData", vehicle_data)?;
        let vehicle_id = required_field(&params, "vehicleData", "vehicleId")?;
        let path = resource_path(&["vehicle", &vehicle_id])?;
        self.send_request(&path, HttpMethod::Post, params).await
    }

    /// Remove a vehicle.
    pub async fn delete_vehicle(&self, vehicle_id: &str) -> Result<ApiResponse> {
        require(vehicle_id, "vehicleId")?;
        let path = resource_path(&["vehicle", vehicle_id])?;
        self.send_request(&path, HttpMethod::Delete, RequestParameters::new())
            .await
    }

    /// Paged trips of a vehicle. Accepts a [`TripQuery`](crate::TripQuery) or raw parameters.
    pub async fn vehicle_trips(
        &self,
        vehicle_id: &str,
        query: impl Into<RequestParameters>,
    ) -> Result<ApiResponse> {
        require(vehicle_id, "vehicleId")?;
        let path = resource_path(&["vehicle", vehicle_id, "trip"])?;
        self.send_request(&path, HttpMethod::Get, query.into()).await
    }

    /// Fetch one trip.
    pub async fn trip_details(&self, vehicle_id: &str, trip_id: &str) -> Result<ApiResponse> {
        require(vehicle_id, "vehicleId")?;
        require(trip_id, "tripId")?;
        let path = resource_path(&["vehicle", vehicle_id, "trip", trip_id])?;
        self.send_request(&path, HttpMethod::Get, RequestParameters::new())
            .await
    }

    /// Raw data points of a vehicle. Accepts a [`DataQuery`](crate::DataQuery) or raw parameters.
    pub async fn vehicle_data(
        &self,
        vehicle_id: &str,
        query: impl Into<RequestParameters>,
    ) -> Result<ApiResponse> {
        require(vehicle_id, "vehicleId")?;
        let path = resource_path(&["vehicle", vehicle_id, "data"])?;
        self.send_request(&path, HttpMethod::Get, query.into()).await
    }

    /// Related data points grouped into sets.
    pub async fn vehicle_data_set(
        &self,
        vehicle_id: &str,
        query: impl Into<RequestParameters>,
    ) -> Result<ApiResponse> {
        require(vehicle_id, "vehicleId")?;
        let path = resource_path(&["vehicle", vehicle_id, "dataSet"])?;
        self.send_request(&path, HttpMethod::Get, query.into()).await
    }

    /// Constraints of a vehicle. Constraint types are not checked locally.
    #[deprecated(note = "constraints have been replaced by event subscriptions")]
    pub async fn vehicle_constraints(
        &self,
        vehicle_id: &str,
        query: impl Into<RequestParameters>,
    ) -> Result<ApiResponse> {
        require(vehicle_id, "vehicleId")?;
        let path = resource_path(&["vehicle", vehicle_id, "constraint"])?;
        self.send_request(&path, HttpMethod::Get, query.into()).await
    }

    /// Fetch one constraint.
    #[deprecated(note = "constraints have been replaced by event subscriptions")]
    pub async fn constraint_details(
        &self,
        vehicle_id: &str,
        constraint_id: &str,
    ) -> Result<ApiResponse> {
        require(vehicle_id, "vehicleId")?;
        require(constraint_id, "constraintId")?;
        let path = resource_path(&["vehicle", vehicle_id, "constraint", constraint_id])?;
        self.send_request(&path, HttpMethod::Get, RequestParameters::new())
            .await
    }

    /// Event subscriptions of a vehicle, optionally of one type.
    pub async fn event_subscriptions(
        &self,
        vehicle_id: &str,
        event_type: Option<&EventType>,
    ) -> Result<ApiResponse> {
        require(vehicle_id, "vehicleId")?;
        let path = event_path(vehicle_id, "eventSubscription", event_type, None)?;
        self.send_request(&path, HttpMethod::Get, RequestParameters::new())
            .await
    }

    /// Fetch one event subscription.
    pub async fn event_subscription_details(
        &self,
        vehicle_id: &str,
        subscription_id: &str,
        event_type: Option<&EventType>,
    ) -> Result<ApiResponse> {
        require(vehicle_id, "vehicleId")?;
        require(subscription_id, "eventSubscriptionId")?;
        let path = event_path(vehicle_id, "eventSubscription", event_type, Some(subscription_id))?;
        self.send_request(&path, HttpMethod::Get, RequestParameters::new())
            .await
    }

    /// Subscribe to events of `event_type`.
    pub async fn create_event_subscription<T>(
        &self,
        vehicle_id: &str,
        event_type: &EventType,
        subscription: &T,
    ) -> Result<ApiResponse>
    where
        T: Serialize + ?Sized,
    {
        require(vehicle_id, "vehicleId")?;
        let params = entity("eventSubscription", subscription)?;
        let path = event_path(vehicle_id, "eventSubscription", Some(event_type), None)?;
        self.send_request(&path, HttpMethod::Post, params).await
    }

    /// Update a subscription identified by its `_type` and `id` fields.
    pub async fn update_event_subscription<T>(
        &self,
        vehicle_id: &str,
        subscription: &T,
    ) -> Result<ApiResponse>
    where
        T: Serialize + ?Sized,
    {
        require(vehicle_id, "vehicleId")?;
        let params = entity("eventSubscription", subscription)?;
        let event_type = required_field(&params, "eventSubscription", "_type")?;
        let id = required_field(&params, "eventSubscription", "id")?;
        let event_type = externalize_event_type(&event_type);
        let path = resource_path(&["vehicle", vehicle_id, "eventSubscription", &event_type, &id])?;
        self.send_request(&path, HttpMethod::Post, params).await
    }

    /// Cancel an event subscription.
    pub async fn delete_event_subscription(
        &self,
        vehicle_id: &str,
        subscription_id: &str,
        event_type: Option<&EventType>,
    ) -> Result<ApiResponse> {
        require(vehicle_id, "vehicleId")?;
        require(subscription_id, "eventSubscriptionId")?;
        let path = event_path(vehicle_id, "eventSubscription", event_type, Some(subscription_id))?;
        self.send_request(&path, HttpMethod::Delete, RequestParameters::new())
            .await
    }

    /// Notifications delivered for a vehicle, optionally of one type.
    pub async fn event_notifications(
        &self,
        vehicle_id: &str,
        event_type: Option<&EventType>,
    ) -> Result<ApiResponse> {
        require(vehicle_id, "vehicleId")?;
        let path = event_path(vehicle_id, "eventNotification", event_type, None)?;
        self.send_request(&path, HttpMethod::Get, RequestParameters::new())
            .await
    }

    /// Fetch one notification.
    pub async fn event_notification_details(
        &self,
        vehicle_id: &str,
        notification_id: &str,
        event_type: Option<&EventType>,
    ) -> Result<ApiResponse> {
        require(vehicle_id, "vehicleId")?;
        require(notification_id, "eventNotificationId")?;
        let path = event_path(vehicle_id, "eventNotification", event_type, Some(notification_id))?;
        self.send_request(&path, HttpMethod::Get, RequestParameters::new())
            .await
    }
}
