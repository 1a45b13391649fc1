//! # paperloft-jobs
//!
//! Background enrichment for saved bookmarks.
//!
//! - [`GoogleLinkFinder`]: candidate source links via Google Custom Search
//! - [`Enricher`]: enrich one bookmark and patch the results into the library
//! - [`EnrichmentWorker`]: queue-driven worker with bounded concurrency

pub mod enrich;
pub mod google;
pub mod worker;

pub use enrich::{EnrichmentOutcome, Enricher, NoteService};
pub use google::{build_queries, normalize_link, rank_links, score_hit, GoogleLinkFinder, GoogleSearchConfig};
pub use worker::{EnrichmentQueue, EnrichmentWorker, WorkerConfig, WorkerEvent, WorkerHandle};
