//! Home page and static script serving

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use nrf_common::constants::{form_path, routes};

use crate::views;

const BOUNDARY_UPLOAD_JS: &str = include_str!("../../ui/boundary-file-upload.js");

/// GET /
pub async fn serve_home() -> Html<String> {
    let body = format!(
        r#"<h1 class="govuk-heading-xl">Nature Restoration Fund</h1>
<p class="govuk-body">Find out how much the Nature Restoration Fund levy could cost for your development.</p>
<a href="{}" role="button" draggable="false" class="govuk-button govuk-button--start" data-module="govuk-button">Start now</a>"#,
        views::escape(&form_path(routes::START)),
    );
    views::page("Home", None, &[], &body)
}

/// GET /public/boundary-file-upload.js
pub async fn serve_boundary_upload_js() -> Response {
    (
        StatusCode::OK,
        [("content-type", "application/javascript")],
        BOUNDARY_UPLOAD_JS,
    )
        .into_response()
}
