//! Check-answers page and quote submission

use chrono::Utc;
use nrf_common::building_types::BuildingTypeFields;
use nrf_common::constants::{form_path, routes};
use nrf_common::submission::{generate_reference, Submission};
use nrf_common::summary::{change_link, first_incomplete_page, summarise, QuoteSummary};
use tracing::{info, warn};

use super::{FormPayload, PageContext, PageController, PageOutcome, PageResponse};
use crate::error::ApiResult;
use crate::session::StateUpdate;
use crate::views::{self, escape};

const TITLE: &str = "Check your answers";

pub struct SummaryPage {
    fields: BuildingTypeFields,
}

impl SummaryPage {
    pub fn new(fields: BuildingTypeFields) -> Self {
        Self { fields }
    }
}

fn summary_row(key: &str, value: &str, change_href: &str, visually_hidden: &str) -> String {
    format!(
        r#"<div class="govuk-summary-list__row">
        <dt class="govuk-summary-list__key">{key}</dt>
        <dd class="govuk-summary-list__value">{value}</dd>
        <dd class="govuk-summary-list__actions"><a class="govuk-link" href="{href}">Change<span class="govuk-visually-hidden"> {hidden}</span></a></dd>
    </div>"#,
        key = escape(key),
        value = value,
        href = escape(change_href),
        hidden = escape(visually_hidden),
    )
}

fn render_summary(summary: &QuoteSummary) -> String {
    let building_rows: String = summary
        .buildings
        .rows
        .iter()
        .map(|row| {
            format!(
                r#"<tr class="govuk-table__row"><td class="govuk-table__cell">{}</td><td class="govuk-table__cell govuk-table__cell--numeric">{}</td></tr>"#,
                escape(&row.type_label),
                row.quantity
            )
        })
        .collect();

    let boundary = summary
        .boundary_file
        .as_ref()
        .map(|file| {
            format!(
                r#"<h2 class="govuk-heading-m">Red line boundary</h2>
<dl class="govuk-summary-list">
    {}
</dl>"#,
                summary_row(
                    "Boundary file",
                    &format!(
                        "{}<br>{}<br>Uploaded {}",
                        escape(&file.filename),
                        escape(&file.formatted_size),
                        escape(&file.uploaded_at)
                    ),
                    &summary.boundary_change_href,
                    "boundary file",
                )
            )
        })
        .unwrap_or_default();

    let answers: String = summary
        .answers
        .iter()
        .map(|row| {
            let value = row.value.as_deref().map(escape).unwrap_or_else(|| "Not answered".to_string());
            summary_row(&row.label, &value, &row.change_href, &row.label.to_lowercase())
        })
        .collect();

    format!(
        r#"{boundary}
<h2 class="govuk-heading-m">Buildings</h2>
<table class="govuk-table">
    <thead class="govuk-table__head"><tr class="govuk-table__row"><th scope="col" class="govuk-table__header">Building type</th><th scope="col" class="govuk-table__header govuk-table__header--numeric">Quantity</th></tr></thead>
    <tbody class="govuk-table__body">{building_rows}
        <tr class="govuk-table__row"><th scope="row" class="govuk-table__header">Total</th><td class="govuk-table__cell govuk-table__cell--numeric">{total}</td></tr>
    </tbody>
</table>
<p class="govuk-body"><a class="govuk-link" href="{buildings_href}">Change<span class="govuk-visually-hidden"> building types</span></a></p>
<h2 class="govuk-heading-m">Your development</h2>
<dl class="govuk-summary-list">
    {answers}
</dl>"#,
        boundary = boundary,
        building_rows = building_rows,
        total = summary.buildings.total,
        buildings_href = escape(&summary.buildings_change_href),
        answers = answers,
    )
}

impl PageController for SummaryPage {
    fn route(&self) -> &'static str {
        routes::SUMMARY
    }

    fn get(&self, ctx: &PageContext) -> ApiResult<PageResponse> {
        let summary = summarise(&self.fields, &ctx.state);
        let body = format!(
            r#"<h1 class="govuk-heading-l">{title}</h1>
{summary}
<h2 class="govuk-heading-m">Now send your request</h2>
<form method="post" action="{action}" novalidate>
    {button}
</form>"#,
            title = TITLE,
            summary = render_summary(&summary),
            action = escape(&form_path(routes::SUMMARY)),
            button = views::button("Accept and send"),
        );
        Ok(PageResponse::View(views::page(
            TITLE,
            Some(&form_path(routes::EMAIL)),
            &[],
            &body,
        )))
    }

    fn post(&self, ctx: &PageContext, _payload: &FormPayload) -> ApiResult<PageOutcome> {
        if let Some(route) = first_incomplete_page(&self.fields, &ctx.state) {
            warn!(page = route, "Quote submitted before all answers were given");
            return Ok(PageOutcome::respond(PageResponse::Redirect(change_link(route))));
        }

        let now = Utc::now();
        let reference = generate_reference(now, &mut rand::thread_rng());
        let submission = Submission::from_state(&self.fields, &ctx.state, reference, now);
        info!(reference = %submission.id, "Quote request submitted");

        Ok(PageOutcome::write(
            StateUpdate::Submit(submission),
            PageResponse::Redirect(form_path(routes::STATUS)),
        ))
    }
}
