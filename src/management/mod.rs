mod cache;
mod controller;
mod debounce;
mod filter;
mod pagination;
mod session;

pub use cache::CacheEntry;
pub use cache::QuerySignature;
pub use cache::ResultCache;
pub use controller::ListOptions;
pub use controller::ListQueryController;
pub use controller::ListView;
pub use controller::LoadOutcome;
pub use controller::PageSource;
pub use controller::ViewError;
pub use controller::ViewErrorKind;
pub use debounce::Debouncer;
pub use filter::FilterState;
pub use filter::FilterValue;
pub use pagination::PaginationState;
pub use pagination::total_pages;
pub use session::Session;
pub use session::SessionStore;
