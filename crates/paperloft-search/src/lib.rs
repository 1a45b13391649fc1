//! # paperloft-search
//!
//! Client for the OpenAlex scholarly metadata API.
//!
//! - [`OpenAlexClient`]: raw `/works`, `/authors` and `/sources` requests
//! - [`SearchSession`]: cursor pagination, busy tracking, name→ID resolution
//! - [`reconstruct_abstract`]: rebuild abstract text from an inverted index
//!
//! ```no_run
//! use std::sync::Arc;
//! use paperloft_search::{OpenAlexClient, SearchFilters, SearchSession, SortOrder};
//!
//! # async fn example() -> Result<(), paperloft_search::SearchError> {
//! let session = SearchSession::new(Arc::new(OpenAlexClient::from_env()?));
//! let filters = SearchFilters {
//!     query: "graph neural networks".to_string(),
//!     from_year: "2019".to_string(),
//!     ..Default::default()
//! };
//! let first = session.search(&filters, Some(SortOrder::CiteDesc)).await?;
//! if first.has_more {
//!     let _next = session.load_more().await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod abstract_index;
pub mod client;
pub mod config;
pub mod error;
pub mod query;
pub mod session;
pub mod types;

pub use abstract_index::reconstruct_abstract;
pub use client::{OpenAlexClient, WorksQuery, INITIAL_CURSOR};
pub use config::OpenAlexConfig;
pub use error::SearchError;
pub use query::{
    build_filter, describe_filters, normalize_openalex_id, safe_year_to_date_end,
    safe_year_to_date_start, ResolvedEntity, SearchFilters, SortOrder,
};
pub use session::{PageState, SearchPage, SearchSession};
pub use types::{Work, WorksResponse};
