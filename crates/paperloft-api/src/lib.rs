//! # paperloft-api
//!
//! HTTP surface of paperloft: metadata search, the local bookmark library,
//! AI notes, source links, accounts and cloud sync.

pub mod config;
pub mod error;
pub mod handlers;
pub mod state;

use std::sync::Arc;

use axum::http::{header, Method};
use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use paperloft_core::{DocumentStore, Library};
use paperloft_inference::NoteWriter;
use paperloft_jobs::{Enricher, EnrichmentQueue, GoogleLinkFinder};
use paperloft_search::OpenAlexClient;
use paperloft_sync::{IdentityClient, UserSession};

pub use config::ApiConfig;
pub use error::ApiError;
pub use state::{AppState, SearchSessions};

use handlers::{account, bookmarks, projects, search, settings};

/// External clients the application state is assembled from.
pub struct Services {
    pub openalex: OpenAlexClient,
    pub links: GoogleLinkFinder,
    pub notes: NoteWriter,
    pub identity: IdentityClient,
}

impl Services {
    pub fn from_env() -> paperloft_core::Result<Self> {
        Ok(Self {
            openalex: OpenAlexClient::from_env()?,
            links: GoogleLinkFinder::from_env()?,
            notes: NoteWriter::from_env(),
            identity: IdentityClient::from_env()?,
        })
    }
}

impl AppState {
    pub fn new(library: Arc<Library>, store: Arc<dyn DocumentStore>, services: Services) -> Self {
        let notes = services.notes;
        let enricher = Enricher::new(
            Arc::clone(&library),
            Arc::new(services.links),
            Arc::new(notes.clone()),
        );
        Self {
            search: Arc::new(SearchSessions::new(Arc::new(services.openalex))),
            notes,
            enricher,
            queue: None,
            session: Arc::new(UserSession::new(services.identity, store, Arc::clone(&library))),
            library,
        }
    }

    pub fn with_queue(mut self, queue: EnrichmentQueue) -> Self {
        self.queue = Some(queue);
        self
    }
}

/// All API routes.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        // Search
        .route("/api/v1/search", post(search::search))
        .route("/api/v1/search/more", post(search::load_more))
        // Bookmarks
        .route("/api/v1/bookmarks", get(bookmarks::list_bookmarks))
        .route("/api/v1/bookmarks/toggle", post(bookmarks::toggle_bookmark))
        .route("/api/v1/bookmarks/export", get(bookmarks::export_bookmarks))
        .route(
            "/api/v1/bookmarks/:id",
            get(bookmarks::get_bookmark).delete(bookmarks::delete_bookmark),
        )
        .route("/api/v1/bookmarks/:id/note", put(bookmarks::update_note))
        .route("/api/v1/bookmarks/:id/ai-note", post(bookmarks::generate_ai_note))
        .route("/api/v1/bookmarks/:id/links", post(bookmarks::refresh_links))
        // Projects
        .route(
            "/api/v1/projects",
            get(projects::list_projects).post(projects::create_project),
        )
        .route(
            "/api/v1/projects/:id",
            get(projects::get_project)
                .patch(projects::update_project)
                .delete(projects::delete_project),
        )
        .route("/api/v1/projects/:id/papers", get(projects::project_papers))
        .route(
            "/api/v1/projects/:id/papers/:bookmark_id",
            put(projects::add_paper).delete(projects::remove_paper),
        )
        // Settings and local data
        .route(
            "/api/v1/settings/google",
            get(settings::get_google_settings).put(settings::put_google_settings),
        )
        .route(
            "/api/v1/settings/openai",
            get(settings::get_openai_settings).put(settings::put_openai_settings),
        )
        .route("/api/v1/local-data", delete(settings::clear_local_data))
        // Account
        .route("/api/v1/auth/sign-in", post(account::sign_in))
        .route("/api/v1/auth/sign-up", post(account::sign_up))
        .route("/api/v1/auth/sign-out", post(account::sign_out))
        .route("/api/v1/auth/me", get(account::current_user))
        // Cloud sync
        .route("/api/v1/sync/sign-in", post(account::sync_on_sign_in))
        .route("/api/v1/sync/push", post(account::push_local))
        .route("/api/v1/sync/load", post(account::load_remote))
        .route("/api/v1/sync/settings/push", post(account::push_settings))
        .route("/api/v1/sync/settings/pull", post(account::pull_settings))
        .route(
            "/api/v1/sync/live",
            post(account::start_live).delete(account::stop_live),
        )
        .route("/api/v1/sync/artifacts/:id", delete(account::delete_artifact))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS policy for the configured origins.
pub fn cors_layer(config: &ApiConfig) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(config.allowed_origins()))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::HeaderName::from_static(handlers::search::SESSION_HEADER),
        ])
        .max_age(std::time::Duration::from_secs(3600))
}
