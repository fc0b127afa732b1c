//! # CLI Module
//!
//! User-facing commands of rostercli. This layer stands in for the
//! presentation layer: it only talks to a list view through the
//! [`ListQueryController`](crate::management::ListQueryController) surface
//! (results, pagination, loading, error and the mutation methods) and prints
//! what it gets back.
//!
//! ## Commands
//!
//! - [`login`] / [`logout`] / [`whoami`] - session lifecycle
//! - [`list`] - fetch one page of a catalog and print it as a table
//! - [`browse`] - interactive view driven by stdin, with debounced search
//!
//! ```text
//! CLI Layer (tables, prompts)
//!     ↓
//! ListQueryController (filters, cache, pagination)
//!     ↓
//! Remote Layer (HttpClient, refresh)
//! ```
//!
//! ## Usage Patterns
//!
//! ```bash
//! rostercli login --email ada@example.org
//! rostercli trainees --filter major=CS --search ann
//! rostercli companies --page 2
//! rostercli browse trainees
//! ```

mod auth;
mod browse;
mod list;

use std::sync::Arc;

pub use auth::login;
pub use auth::logout;
pub use auth::whoami;
pub use browse::BrowseCommand;
pub use browse::browse;
pub use list::ListArgs;
pub use list::list;

use crate::{
    config::Settings,
    error,
    management::{ListView, SessionStore},
    remote::HttpClient,
    types::Listable,
    utils, warning,
};

/// Restores the persisted session and builds the shared client.
async fn connect(settings: &Settings) -> Arc<HttpClient> {
    let sessions = SessionStore::persisted(&settings.session_file);
    sessions.restore().await;

    match HttpClient::new(settings, sessions) {
        Ok(client) => Arc::new(client),
        Err(e) => error!("Cannot create HTTP client. Err: {}", e),
    }
}

/// Prints a list view: table, pagination footer and any error.
fn render<T: Listable>(view: &ListView<T>) {
    match utils::render_table(&view.results) {
        Some(table) => println!("{}", table),
        None if view.loading => println!("Loading..."),
        None => println!("No results."),
    }
    println!("{}", utils::pagination_footer(&view.pagination));

    if let Some(err) = &view.error {
        if err.requires_login() {
            warning!("Your session has expired. Please run rostercli login");
        } else {
            warning!("{}", err.message);
        }
    }
}
