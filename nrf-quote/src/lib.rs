//! nrf-quote library - Nature Restoration Fund quote wizard
//!
//! Serves the multi-page quote form: boundary upload, building-type counts,
//! waste water, SuDS and email questions, a check-answers summary and
//! submission. Session state lives behind [`session::SessionStore`].

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::get,
    Router,
};
use nrf_common::config::ServiceConfig;
use nrf_common::constants::FORM_SLUG;
use nrf_common::navigation::PageGraph;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod error;
pub mod pages;
pub mod session;
pub mod views;

use error::ApiError;
use pages::PageRegistry;
use session::{SessionStates, SessionStore};

/// Request body limit; a 10MB boundary file grows by a third when base64
/// encoded and again when form-urlencoded
pub const MAX_BODY_BYTES: usize = 20 * 1024 * 1024;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Merging writer over the session store
    pub sessions: SessionStates,
    /// Wizard page controllers
    pub pages: Arc<PageRegistry>,
    /// Name of the session cookie
    pub cookie_name: String,
}

impl AppState {
    /// Create application state from resolved configuration
    ///
    /// Fails when the configured building-type list is unusable.
    pub fn new(config: &ServiceConfig, store: Arc<dyn SessionStore>) -> nrf_common::Result<Self> {
        let fields = config.building_fields()?;
        Ok(Self {
            sessions: SessionStates::new(store),
            pages: Arc::new(PageRegistry::wizard(fields, PageGraph::wizard())),
            cookie_name: config.session.cookie_name.clone(),
        })
    }
}

async fn not_found() -> ApiError {
    ApiError::NotFound("No such page".to_string())
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let form = Router::new()
        .route(&format!("/{}", FORM_SLUG), get(pages::form_root))
        .route(
            &format!("/{}/:page", FORM_SLUG),
            get(pages::get_page).post(pages::post_page),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            session::session_middleware,
        ));

    let public = Router::new()
        .route("/", get(api::serve_home))
        .route("/public/boundary-file-upload.js", get(api::serve_boundary_upload_js))
        .merge(api::health_routes());

    Router::new()
        .merge(form)
        .merge(public)
        .fallback(not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(DefaultBodyLimit::max(MAX_BODY_BYTES)),
        )
        .with_state(state)
}
