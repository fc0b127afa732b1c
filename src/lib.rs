//! Roster Catalog CLI Library
//!
//! This library provides the client side of a roster API: browsing the
//! trainee and company catalogs and the admin user list with filters,
//! free-text search and pagination, behind an authenticated session.
//!
//! # Modules
//!
//! - `cli` - Command-line interface implementations
//! - `config` - Configuration management and environment variables
//! - `error` - Error taxonomy shared by the client and the list views
//! - `logging` - `tracing` subscriber setup for the binary
//! - `management` - Session store, filters, result cache, pagination and the
//!   list controller that ties them together
//! - `remote` - HTTP client, refresh coordination and API endpoints
//! - `types` - Data structures and type definitions
//! - `utils` - Utility functions and helpers
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use rostercli::{config::Settings, management::*, remote::*, types::Trainee};
//!
//! #[tokio::main]
//! async fn main() -> rostercli::Res<()> {
//!     let settings = Settings::from_env();
//!     let sessions = SessionStore::persisted(&settings.session_file);
//!     sessions.restore().await;
//!
//!     let client = Arc::new(HttpClient::new(&settings, sessions)?);
//!     let source = CatalogSource::<Trainee>::new(client, Resource::Trainees);
//!     let view = ListQueryController::new(
//!         source,
//!         Resource::Trainees.filter_keys(),
//!         ListOptions::from(&settings),
//!     );
//!     view.set_filter("major", "Computer Science").await?;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod management;
pub mod remote;
pub mod types;
pub mod utils;

/// A convenient Result type alias for operations that may fail.
///
/// Used at the edges of the binary where errors from different layers meet.
/// The boxed error keeps Send + Sync bounds for async contexts.
///
/// # Example
///
/// ```
/// use rostercli::Res;
///
/// async fn fetch_data() -> Res<String> {
///     Ok("data".to_string())
/// }
/// ```
pub type Res<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Prints an informational message with a blue bullet point.
///
/// # Example
///
/// ```
/// info!("Fetching trainees...");
/// info!("Found {} companies", count);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
///
/// # Example
///
/// ```
/// success!("Logged in as {}", email);
/// ```
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits the program.
///
/// Only for fatal errors at the binary edge; library code returns errors
/// instead.
///
/// # Example
///
/// ```
/// error!("Failed to load configuration");
/// // Program exits here - code after this will not execute
/// ```
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
///
/// # Example
///
/// ```
/// warning!("Session expired, please log in again");
/// ```
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
