//! Page-controller contract and dispatch
//!
//! Each wizard page is a [`PageController`]. Controllers are synchronous and
//! never touch the session store: `get` returns a view or redirect, and
//! `post` additionally returns the [`StateUpdate`] to persist. The async
//! handlers here load session state, invoke the controller, apply any update
//! through [`crate::session::SessionStates::apply`] and send the response.

mod building_types;
mod notice;
mod question;
mod start;
mod summary;
mod upload;

pub use building_types::BuildingTypesPage;
pub use notice::{NonResidentialNoticePage, StatusPage};
pub use question::{QuestionKind, QuestionPage};
pub use start::StartPage;
pub use summary::SummaryPage;
pub use upload::BoundaryUploadPage;

use axum::{
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    Extension, Form,
};
use nrf_common::building_types::BuildingTypeFields;
use nrf_common::constants::{fields, form_path, routes, WASTE_WATER_OPTIONS};
use nrf_common::navigation::{safe_return_url, PageGraph};
use nrf_common::FormState;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::session::{SessionId, StateUpdate};
use crate::AppState;

/// Submitted form fields
pub type FormPayload = HashMap<String, String>;

/// Query parameters understood by every page
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    #[serde(rename = "returnUrl")]
    pub return_url: Option<String>,
}

/// Everything a controller may read for one request
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    /// Absolute path of the current page, e.g. `/nrf-quote/building-types`
    pub path: String,
    pub query: PageQuery,
    pub state: FormState,
    pub last_submission_id: Option<String>,
}

impl PageContext {
    pub fn return_url(&self) -> Option<&str> {
        self.query.return_url.as_deref()
    }

    /// Form action for this page, carrying a safe returnUrl through the POST
    pub fn form_action(&self) -> String {
        match safe_return_url(self.return_url()) {
            Some(url) => format!("{}?returnUrl={}", self.path, urlencoding::encode(&url)),
            None => self.path.clone(),
        }
    }
}

/// What a controller wants sent back
#[derive(Debug, Clone)]
pub enum PageResponse {
    View(Html<String>),
    Redirect(String),
}

impl IntoResponse for PageResponse {
    fn into_response(self) -> Response {
        match self {
            PageResponse::View(html) => html.into_response(),
            PageResponse::Redirect(path) => Redirect::to(&path).into_response(),
        }
    }
}

/// Result of a POST: an optional state write, then a response
#[derive(Debug, Clone)]
pub struct PageOutcome {
    pub update: Option<StateUpdate>,
    pub response: PageResponse,
}

impl PageOutcome {
    /// Respond without writing state
    pub fn respond(response: PageResponse) -> Self {
        Self {
            update: None,
            response,
        }
    }

    /// Write state, then respond
    pub fn write(update: StateUpdate, response: PageResponse) -> Self {
        Self {
            update: Some(update),
            response,
        }
    }
}

/// GET/POST contract for one page type
pub trait PageController: Send + Sync {
    /// Route relative to the form slug, e.g. `/building-types`
    fn route(&self) -> &'static str;

    fn get(&self, ctx: &PageContext) -> ApiResult<PageResponse>;

    fn post(&self, ctx: &PageContext, _payload: &FormPayload) -> ApiResult<PageOutcome> {
        Err(ApiError::MethodNotAllowed(format!(
            "POST is not supported on {}",
            ctx.path
        )))
    }
}

/// Controllers by page segment (the route without its leading slash)
pub struct PageRegistry {
    pages: HashMap<&'static str, Arc<dyn PageController>>,
}

impl PageRegistry {
    pub fn new(controllers: Vec<Arc<dyn PageController>>) -> Self {
        let pages = controllers
            .into_iter()
            .map(|c| (c.route().trim_start_matches('/'), c))
            .collect();
        Self { pages }
    }

    /// Every page of the quote wizard
    pub fn wizard(building_fields: BuildingTypeFields, graph: PageGraph) -> Self {
        let controllers: Vec<Arc<dyn PageController>> = vec![
            Arc::new(StartPage::new(graph.clone())),
            Arc::new(BoundaryUploadPage::new(graph.clone())),
            Arc::new(BuildingTypesPage::new(building_fields.clone(), graph.clone())),
            Arc::new(NonResidentialNoticePage),
            Arc::new(QuestionPage::new(
                routes::WASTE_WATER,
                fields::WASTE_WATER,
                "How will your development deal with waste water?",
                QuestionKind::Radios(WASTE_WATER_OPTIONS),
                graph.clone(),
            )),
            Arc::new(QuestionPage::new(
                routes::SUDS,
                fields::SUDS,
                "Are you using any SuDS design details (Sustainable Drainage Systems (reed beds, ponds, swales))?",
                QuestionKind::YesNo,
                graph.clone(),
            )),
            Arc::new(QuestionPage::new(
                routes::EMAIL,
                fields::EMAIL,
                "Enter the email address you would like the estimate sent to",
                QuestionKind::Email,
                graph,
            )),
            Arc::new(SummaryPage::new(building_fields)),
            Arc::new(StatusPage),
        ];
        Self::new(controllers)
    }

    pub fn get(&self, segment: &str) -> Option<&Arc<dyn PageController>> {
        self.pages.get(segment)
    }

    fn lookup(&self, segment: &str) -> ApiResult<&Arc<dyn PageController>> {
        self.get(segment)
            .ok_or_else(|| ApiError::NotFound(format!("Page not found: {}", form_path(&format!("/{}", segment)))))
    }
}

async fn load_context(
    state: &AppState,
    session: SessionId,
    segment: &str,
    query: PageQuery,
) -> ApiResult<PageContext> {
    let record = state.sessions.record(session).await?;
    Ok(PageContext {
        path: form_path(&format!("/{}", segment)),
        query,
        state: record.form,
        last_submission_id: record.last_submission_id,
    })
}

/// GET /nrf-quote/:page
pub async fn get_page(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
    Path(segment): Path<String>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Response> {
    let controller = state.pages.lookup(&segment)?.clone();
    let ctx = load_context(&state, session, &segment, query).await?;

    Ok(controller.get(&ctx)?.into_response())
}

/// POST /nrf-quote/:page
pub async fn post_page(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
    Path(segment): Path<String>,
    Query(query): Query<PageQuery>,
    Form(payload): Form<FormPayload>,
) -> ApiResult<Response> {
    let controller = state.pages.lookup(&segment)?.clone();
    let ctx = load_context(&state, session, &segment, query).await?;

    let outcome = controller.post(&ctx, &payload)?;
    if let Some(update) = outcome.update {
        state.sessions.apply(session, update).await?;
    }
    if let PageResponse::Redirect(to) = &outcome.response {
        debug!(session = %session, from = %ctx.path, to = %to, "Redirecting after POST");
    }

    Ok(outcome.response.into_response())
}

/// GET /nrf-quote
pub async fn form_root() -> Redirect {
    Redirect::to(&form_path(routes::START))
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use nrf_common::state::StateMap;

    pub fn context(route: &str, state: FormState, return_url: Option<&str>) -> PageContext {
        PageContext {
            path: form_path(route),
            query: PageQuery {
                return_url: return_url.map(str::to_string),
            },
            state,
            last_submission_id: None,
        }
    }

    pub fn payload(pairs: &[(&str, &str)]) -> FormPayload {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    pub fn map(value: serde_json::Value) -> StateMap {
        serde_json::from_value(value).unwrap()
    }

    pub fn html(response: &PageResponse) -> &str {
        match response {
            PageResponse::View(Html(body)) => body.as_str(),
            PageResponse::Redirect(to) => panic!("expected view, got redirect to {to}"),
        }
    }

    pub fn redirect(response: &PageResponse) -> &str {
        match response {
            PageResponse::Redirect(to) => to.as_str(),
            PageResponse::View(_) => panic!("expected redirect, got view"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_form_action_carries_safe_return_url() {
        let ctx = context(routes::BUILDINGS, FormState::new(), Some("/nrf-quote/summary"));
        assert_eq!(
            ctx.form_action(),
            "/nrf-quote/building-types?returnUrl=%2Fnrf-quote%2Fsummary"
        );

        let unsafe_ctx = context(routes::BUILDINGS, FormState::new(), Some("https://evil.example/"));
        assert_eq!(unsafe_ctx.form_action(), "/nrf-quote/building-types");
    }

    #[test]
    fn test_registry_has_every_page() {
        let registry = PageRegistry::wizard(BuildingTypeFields::default(), PageGraph::wizard());
        for segment in [
            "start",
            "upload-boundary",
            "building-types",
            "non-residential-not-supported",
            "waste-water",
            "suds",
            "email",
            "summary",
            "status",
        ] {
            assert!(registry.get(segment).is_some(), "missing page {segment}");
        }
        assert!(registry.get("admin").is_none());
    }

    #[test]
    fn test_get_only_pages_reject_post() {
        let ctx = context(routes::NON_RESIDENTIAL_NOTICE, FormState::new(), None);
        let result = NonResidentialNoticePage.post(&ctx, &payload(&[]));
        assert!(matches!(result, Err(ApiError::MethodNotAllowed(_))));
    }
}
