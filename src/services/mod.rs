pub mod auth;
pub mod catalog_filter;
pub mod preferences;
pub mod providers;

pub use auth::{AccessToken, Claims, TokenIssuer};
pub use catalog_filter::{apply_filter, filter_catalog, CatalogFilter, FilterOutcome};
pub use preferences::{MemoryStore, PgStore, PreferenceStore, Store, UserStore};
pub use providers::{MetadataProvider, TmdbProvider, UpstreamError};
