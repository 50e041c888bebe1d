//! # carvoyant-core
//!
//! Core types and utilities for working with the Carvoyant vehicle telematics API.
//!
//! This crate holds everything that can be decided without touching the
//! network: configuration and credential resolution, request parameter
//! validation, the wire timestamp codec and pagination action decoding.
//!
//! ## Modules
//!
//! - [`error`] - Error type shared by every Carvoyant crate
//! - [`config`] - Client configuration and authentication strategy
//! - [`client`] - HTTP client tuning
//! - [`types`] - HTTP verbs, sort orders and event types
//! - [`timestamp`] - Wire timestamp encoding and decoding
//! - [`params`] - Request parameters and their validation rules
//! - [`query`] - Query-string decoding
//! - [`action`] - Hypermedia actions and pagination parameters

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod action;
pub mod client;
pub mod config;
pub mod error;
pub mod params;
pub mod query;
pub mod timestamp;
pub mod types;

// Re-export commonly used types
pub use action::Action;
pub use config::{AuthStrategy, CarvoyantConfig};
pub use error::{Error, Result};
pub use params::{ParamKind, ParamValue, ParameterRules, RequestParameters};
pub use types::{EventType, HttpMethod, SortOrder};
