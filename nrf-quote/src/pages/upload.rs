//! Red-line boundary upload page
//!
//! The file input is never submitted as multipart. The page script reads the
//! file, base64-encodes it and posts a JSON `fileData` field instead. A POST
//! is one of three actions:
//!
//! - `removeFile`: clear the stored file and show the page again
//! - `fileData`: validate and store the file, then show the page again
//! - neither: continue (returnUrl, else the next page)

use chrono::Utc;
use nrf_common::boundary_file::BoundaryFile;
use nrf_common::constants::routes;
use nrf_common::navigation::{resolve_next_path, safe_return_url, PageGraph};
use nrf_common::validation::{parse_file_payload, validate_boundary_file, FILE_FIELD};
use nrf_common::FieldError;
use tracing::{info, warn};

use super::{FormPayload, PageContext, PageController, PageOutcome, PageResponse};
use crate::error::ApiResult;
use crate::session::StateUpdate;
use crate::views::{self, escape};

const TITLE: &str = "Upload a red line boundary file";
const SCRIPT_PATH: &str = "/public/boundary-file-upload.js";

pub struct BoundaryUploadPage {
    graph: PageGraph,
}

impl BoundaryUploadPage {
    pub fn new(graph: PageGraph) -> Self {
        Self { graph }
    }

    fn render(&self, ctx: &PageContext, errors: &[FieldError]) -> PageResponse {
        let action = escape(&ctx.form_action());
        let error = views::error_for(errors, FILE_FIELD);

        let uploaded = match BoundaryFile::from_state(&ctx.state).map(|f| f.formatted()) {
            Some(file) => format!(
                r#"<dl class="govuk-summary-list">
    <div class="govuk-summary-list__row"><dt class="govuk-summary-list__key">File</dt><dd class="govuk-summary-list__value">{filename}</dd></div>
    <div class="govuk-summary-list__row"><dt class="govuk-summary-list__key">Size</dt><dd class="govuk-summary-list__value">{size}</dd></div>
    <div class="govuk-summary-list__row"><dt class="govuk-summary-list__key">Uploaded</dt><dd class="govuk-summary-list__value">{uploaded_at}</dd></div>
</dl>
<details class="govuk-details"><summary class="govuk-details__summary"><span class="govuk-details__summary-text">View file contents</span></summary>
    <div class="govuk-details__text"><pre>{content}</pre></div>
</details>
<form method="post" action="{action}" novalidate>
    <input type="hidden" name="removeFile" value="true">
    <button type="submit" class="govuk-button govuk-button--warning" data-module="govuk-button">Remove file</button>
</form>"#,
                filename = escape(&file.filename),
                size = escape(&file.formatted_size),
                uploaded_at = escape(&file.uploaded_at),
                content = escape(&file.content),
                action = action,
            ),
            None => format!(
                r#"<form method="post" action="{action}" novalidate>
    <div class="{group}">
        <label class="govuk-label" for="file">Upload a file</label>
        <div class="govuk-hint">GeoJSON, JSON or KML, smaller than 10MB</div>
        {message}
        <input class="govuk-file-upload" id="file" name="file" type="file" accept=".geojson,.json,.kml">
    </div>
    <button type="submit" id="upload-button" class="govuk-button govuk-button--secondary" data-module="govuk-button">Upload file</button>
</form>"#,
                action = action,
                group = views::group_class(error),
                message = views::error_message(error),
            ),
        };

        let body = format!(
            r#"<h1 class="govuk-heading-l">{title}</h1>
<p class="govuk-body">If you have a boundary for your development you can upload it now. You can continue without one.</p>
{uploaded}
<form method="post" action="{action}" novalidate>
    {button}
</form>
<script type="module" src="{script}"></script>"#,
            title = TITLE,
            uploaded = uploaded,
            action = action,
            button = views::button("Continue"),
            script = SCRIPT_PATH,
        );

        let back = safe_return_url(ctx.return_url()).or_else(|| self.graph.previous(routes::UPLOAD));
        PageResponse::View(views::page(TITLE, back.as_deref(), errors, &body))
    }
}

fn present<'a>(payload: &'a FormPayload, key: &str) -> Option<&'a str> {
    payload
        .get(key)
        .map(String::as_str)
        .filter(|value| !value.trim().is_empty())
}

impl PageController for BoundaryUploadPage {
    fn route(&self) -> &'static str {
        routes::UPLOAD
    }

    fn get(&self, ctx: &PageContext) -> ApiResult<PageResponse> {
        Ok(self.render(ctx, &[]))
    }

    fn post(&self, ctx: &PageContext, payload: &FormPayload) -> ApiResult<PageOutcome> {
        if present(payload, "removeFile").is_some() {
            info!("Removing boundary file");
            return Ok(PageOutcome::write(
                StateUpdate::Bucket(BoundaryFile::removal_update()),
                PageResponse::Redirect(ctx.form_action()),
            ));
        }

        if let Some(raw) = present(payload, "fileData") {
            let validated = parse_file_payload(raw).and_then(|value| validate_boundary_file(&value, Utc::now()));
            return Ok(match validated {
                Ok(file) => {
                    info!(filename = %file.filename, size = file.size, "Boundary file uploaded");
                    PageOutcome::write(
                        StateUpdate::Bucket(file.to_bucket_update()),
                        PageResponse::Redirect(ctx.form_action()),
                    )
                }
                Err(error) => {
                    warn!(reason = %error.text, "Boundary file rejected");
                    PageOutcome::respond(self.render(ctx, &[error]))
                }
            });
        }

        let next = resolve_next_path(&self.graph, routes::UPLOAD, ctx.return_url())?;
        Ok(PageOutcome::respond(PageResponse::Redirect(next)))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use nrf_common::validation::UPLOAD_PROBLEM_MESSAGE;
    use nrf_common::FormState;
    use serde_json::json;

    fn page() -> BoundaryUploadPage {
        BoundaryUploadPage::new(PageGraph::wizard())
    }

    fn file_data(content_type: &str, size: u64) -> String {
        json!({
            "filename": "site.geojson",
            "size": size,
            "contentType": content_type,
            "content": "eyJ0eXBlIjoiRmVhdHVyZUNvbGxlY3Rpb24ifQ==",
            "uploadedAt": "2025-01-15T10:30:00.000Z"
        })
        .to_string()
    }

    #[test]
    fn test_valid_upload_stored_in_bucket() {
        let ctx = context(routes::UPLOAD, FormState::new(), None);
        let data = file_data("application/geo+json", 1024);
        let outcome = page().post(&ctx, &payload(&[("fileData", data.as_str())])).unwrap();

        match outcome.update {
            Some(StateUpdate::Bucket(update)) => {
                assert_eq!(update["boundaryFile"]["filename"], "site.geojson");
                assert_eq!(update["boundaryFile"]["size"], 1024);
            }
            other => panic!("unexpected update {other:?}"),
        }
        assert_eq!(redirect(&outcome.response), "/nrf-quote/upload-boundary");
    }

    #[test]
    fn test_unsupported_type_rejected_without_write() {
        let ctx = context(routes::UPLOAD, FormState::new(), None);
        let data = file_data("image/png", 1024);
        let outcome = page().post(&ctx, &payload(&[("fileData", data.as_str())])).unwrap();

        assert!(outcome.update.is_none());
        assert!(html(&outcome.response).contains("image/png"));
    }

    #[test]
    fn test_malformed_file_data_gets_generic_error() {
        let ctx = context(routes::UPLOAD, FormState::new(), None);
        let outcome = page().post(&ctx, &payload(&[("fileData", "{not json")])).unwrap();

        assert!(outcome.update.is_none());
        assert!(html(&outcome.response).contains(UPLOAD_PROBLEM_MESSAGE));
    }

    #[test]
    fn test_remove_nulls_file_and_keeps_return_url() {
        let ctx = context(routes::UPLOAD, FormState::new(), Some("/nrf-quote/summary"));
        let outcome = page().post(&ctx, &payload(&[("removeFile", "true")])).unwrap();

        assert_eq!(outcome.update, Some(StateUpdate::Bucket(BoundaryFile::removal_update())));
        assert_eq!(
            redirect(&outcome.response),
            "/nrf-quote/upload-boundary?returnUrl=%2Fnrf-quote%2Fsummary"
        );
    }

    #[test]
    fn test_continue_without_file() {
        let ctx = context(routes::UPLOAD, FormState::new(), None);
        let outcome = page().post(&ctx, &payload(&[])).unwrap();

        assert!(outcome.update.is_none());
        assert_eq!(redirect(&outcome.response), "/nrf-quote/building-types");

        let ctx = context(routes::UPLOAD, FormState::new(), Some("/nrf-quote/summary"));
        let outcome = page().post(&ctx, &payload(&[])).unwrap();
        assert_eq!(redirect(&outcome.response), "/nrf-quote/summary");
    }

    #[test]
    fn test_get_shows_stored_file() {
        let state = FormState::new().merge_bucket(&map(json!({
            "boundaryFile": {
                "filename": "site.geojson",
                "size": 2048,
                "contentType": "application/geo+json",
                "content": "eyJ0eXBlIjoiRmVhdHVyZUNvbGxlY3Rpb24ifQ==",
                "uploadedAt": "2025-01-15T10:30:00.000Z"
            }
        })));
        let ctx = context(routes::UPLOAD, state, None);

        let body = html(&page().get(&ctx).unwrap()).to_string();
        assert!(body.contains("site.geojson"));
        assert!(body.contains("2.00 KB"));
        assert!(body.contains("Remove file"));
        assert!(!body.contains(r#"id="upload-button""#));
    }
}
