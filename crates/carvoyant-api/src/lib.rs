//! Asynchronous client for the Carvoyant vehicle telematics API.
//!
//! [`CarvoyantClient`] validates request parameters, authenticates with either a
//! bearer access token or an API key pair, and follows the pagination actions
//! embedded in collection responses.
//!
//! ```no_run
//! use carvoyant_api::{CarvoyantClient, PageQuery, TripQuery};
//! use carvoyant_core::CarvoyantConfig;
//!
//! # async fn run() -> carvoyant_api::Result<()> {
//! let client = CarvoyantClient::from_config(&CarvoyantConfig::new_bearer("access-token"))?;
//! let first = client
//!     .vehicle_trips("C201200001", TripQuery::new().with_page(PageQuery::new().with_limit(10)))
//!     .await?;
//! if first.has_action("next") {
//!     let second = client.next_page(&first).await?;
//!     println!("{}", second.body);
//! }
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]

pub mod client;
pub mod models;
pub mod resources;
pub mod transport;

pub use client::{Callback, CarvoyantClient, CarvoyantClientBuilder};
pub use models::{
    Account, ApiResponse, ConstraintQuery, DataPoint, DataQuery, EventNotification,
    EventSubscription, PageQuery, RequestInfo, Trip, TripQuery, Vehicle, Waypoint,
};
pub use transport::{HttpRequest, ReqwestTransport, Transport};

/// Version of this client library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Convenient result alias that reuses the shared Carvoyant error type.
pub type Result<T> = carvoyant_core::Result<T>;
