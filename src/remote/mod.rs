//! # Remote Module
//!
//! Client side of the roster REST API.
//!
//! ```text
//! ListQueryController
//!          ↓
//! CatalogSource (list / search endpoints)
//!          ↓
//! HttpClient ──401──→ RefreshCoordinator ──→ POST /auth/refresh
//!          ↓                   ↓
//!      reqwest           SessionStore
//! ```
//!
//! - [`client`] attaches the access credential and replays a request once
//!   after a refresh. Transport failures are surfaced as-is.
//! - [`refresh`] makes sure concurrent 401s share a single refresh exchange.
//! - [`auth`] wraps login, logout and the raw refresh exchange.
//! - [`catalog`] maps a query signature onto the trainees, companies and
//!   admin user endpoints.

pub mod auth;
pub mod catalog;
pub mod client;
pub mod refresh;

pub use catalog::{CatalogSource, Resource};
pub use client::{ApiRequest, Attempt, HttpClient};
pub use refresh::RefreshCoordinator;
