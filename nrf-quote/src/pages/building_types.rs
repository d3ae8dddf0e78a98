//! Building-type count page
//!
//! One numeric input per configured building type, named by list position
//! (`buildingType-1` ..). Accepted counts are merged into the auxiliary
//! bucket so a stored boundary file survives.

use nrf_common::building_types::{BuildingCounts, BuildingTypeFields};
use nrf_common::constants::routes;
use nrf_common::navigation::{next_after_building_counts, safe_return_url, PageGraph};
use nrf_common::validation::validate_building_counts;
use nrf_common::FieldError;
use std::collections::HashMap;
use tracing::debug;

use super::{FormPayload, PageContext, PageController, PageOutcome, PageResponse};
use crate::error::ApiResult;
use crate::session::StateUpdate;
use crate::views::{self, escape};

const TITLE: &str = "How many of each building type are in the development?";

pub struct BuildingTypesPage {
    fields: BuildingTypeFields,
    graph: PageGraph,
}

impl BuildingTypesPage {
    pub fn new(fields: BuildingTypeFields, graph: PageGraph) -> Self {
        Self { fields, graph }
    }

    /// Input values from the stored bucket, 0 where nothing is stored
    fn stored_values(&self, ctx: &PageContext) -> HashMap<String, String> {
        let counts = BuildingCounts::from_bucket(&self.fields, ctx.state.bucket());
        counts
            .entries(&self.fields)
            .map(|(field, count)| (field.name.clone(), count.to_string()))
            .collect()
    }

    fn render(&self, ctx: &PageContext, values: &HashMap<String, String>, errors: &[FieldError]) -> PageResponse {
        let inputs: String = self
            .fields
            .iter()
            .map(|field| {
                let error = views::error_for(errors, &field.name);
                let input_class = if error.is_some() {
                    "govuk-input govuk-input--width-4 govuk-input--error"
                } else {
                    "govuk-input govuk-input--width-4"
                };
                format!(
                    r#"<div class="{group}">
        <label class="govuk-label" for="{name}">{label}</label>
        {message}
        <input class="{input_class}" id="{name}" name="{name}" type="text" inputmode="numeric" value="{value}">
    </div>"#,
                    group = views::group_class(error),
                    name = escape(&field.name),
                    label = escape(field.label()),
                    message = views::error_message(error),
                    input_class = input_class,
                    value = escape(values.get(&field.name).map(String::as_str).unwrap_or("0")),
                )
            })
            .collect();

        let body = format!(
            r#"<h1 class="govuk-heading-l">{title}</h1>
<form method="post" action="{action}" novalidate>
    {inputs}
    {button}
</form>"#,
            title = TITLE,
            action = escape(&ctx.form_action()),
            inputs = inputs,
            button = views::button("Continue"),
        );

        let back = safe_return_url(ctx.return_url()).or_else(|| self.graph.previous(routes::BUILDINGS));
        PageResponse::View(views::page(TITLE, back.as_deref(), errors, &body))
    }
}

impl PageController for BuildingTypesPage {
    fn route(&self) -> &'static str {
        routes::BUILDINGS
    }

    fn get(&self, ctx: &PageContext) -> ApiResult<PageResponse> {
        Ok(self.render(ctx, &self.stored_values(ctx), &[]))
    }

    fn post(&self, ctx: &PageContext, payload: &FormPayload) -> ApiResult<PageOutcome> {
        match validate_building_counts(&self.fields, payload) {
            Ok(counts) => {
                debug!(total = counts.total(), "Building counts accepted");
                let next = next_after_building_counts(&self.graph, &self.fields, &counts, ctx.return_url())?;
                Ok(PageOutcome::write(
                    StateUpdate::Bucket(counts.to_bucket_update(&self.fields)),
                    PageResponse::Redirect(next),
                ))
            }
            Err(errors) => {
                debug!(errors = errors.len(), "Building counts rejected");
                Ok(PageOutcome::respond(self.render(ctx, payload, &errors)))
            }
        }
    }
}
