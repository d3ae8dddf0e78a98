//! Informational pages with no form: the non-residential notice and the
//! post-submission status page

use nrf_common::constants::{form_path, routes};

use super::{PageContext, PageController, PageResponse};
use crate::error::ApiResult;
use crate::views;

/// Shown when only non-residential development was entered
pub struct NonResidentialNoticePage;

impl PageController for NonResidentialNoticePage {
    fn route(&self) -> &'static str {
        routes::NON_RESIDENTIAL_NOTICE
    }

    fn get(&self, _ctx: &PageContext) -> ApiResult<PageResponse> {
        let back = form_path(routes::BUILDINGS);
        let body = format!(
            r#"<h1 class="govuk-heading-l">Non-residential developments not supported</h1>
<p class="govuk-body">This service can only give a quote for developments that include residential buildings.</p>
<p class="govuk-body"><a href="{back}" class="govuk-link">Change the building types</a></p>"#,
            back = views::escape(&back),
        );
        Ok(PageResponse::View(views::page(
            "Non-residential developments not supported",
            Some(&back),
            &[],
            &body,
        )))
    }
}

/// Confirmation after a quote request is submitted
pub struct StatusPage;

impl PageController for StatusPage {
    fn route(&self) -> &'static str {
        routes::STATUS
    }

    fn get(&self, ctx: &PageContext) -> ApiResult<PageResponse> {
        let Some(reference) = ctx.last_submission_id.as_deref() else {
            return Ok(PageResponse::Redirect(form_path(routes::START)));
        };

        let body = format!(
            r#"<div class="govuk-panel govuk-panel--confirmation">
    <h1 class="govuk-panel__title">Quote request submitted</h1>
    <div class="govuk-panel__body">Your reference number<br><strong>{reference}</strong></div>
</div>
<p class="govuk-body">We will send your estimate to the email address you gave.</p>
<p class="govuk-body"><a href="{start}" class="govuk-link">Start another quote</a></p>"#,
            reference = views::escape(reference),
            start = views::escape(&form_path(routes::START)),
        );
        Ok(PageResponse::View(views::page("Quote request submitted", None, &[], &body)))
    }
}
