//! Single-answer question pages: waste water, SuDS and email
//!
//! Answers are written to the top level of the form state with
//! [`StateUpdate::Answers`], which keeps the auxiliary bucket intact.

use nrf_common::navigation::{resolve_next_path, safe_return_url, PageGraph};
use nrf_common::state::StateMap;
use nrf_common::validation::is_plausible_email;
use nrf_common::{FieldError, FormState};
use serde_json::Value;

use super::{FormPayload, PageContext, PageController, PageOutcome, PageResponse};
use crate::error::ApiResult;
use crate::session::StateUpdate;
use crate::views::{self, escape};

/// Input shape of a question
#[derive(Debug, Clone, Copy)]
pub enum QuestionKind {
    /// One of a fixed list of options, stored as the option text
    Radios(&'static [&'static str]),
    /// Yes or no, stored as a boolean
    YesNo,
    /// Email address, stored trimmed
    Email,
}

pub struct QuestionPage {
    route: &'static str,
    key: &'static str,
    title: &'static str,
    kind: QuestionKind,
    graph: PageGraph,
}

impl QuestionPage {
    pub fn new(
        route: &'static str,
        key: &'static str,
        title: &'static str,
        kind: QuestionKind,
        graph: PageGraph,
    ) -> Self {
        Self {
            route,
            key,
            title,
            kind,
            graph,
        }
    }

    /// Stored answer as the string the form would submit
    fn current_value(&self, state: &FormState) -> Option<String> {
        match self.kind {
            QuestionKind::YesNo => state.flag(self.key).map(|v| if v { "true" } else { "false" }.to_string()),
            QuestionKind::Radios(_) | QuestionKind::Email => state.answer(self.key).map(str::to_string),
        }
    }

    fn parse(&self, raw: Option<&str>) -> Result<Value, FieldError> {
        let raw = raw.map(str::trim).unwrap_or_default();
        match self.kind {
            QuestionKind::Radios(options) => options
                .iter()
                .find(|option| **option == raw)
                .map(|option| Value::from(*option))
                .ok_or_else(|| FieldError::new(self.key, "Select how your development will deal with waste water")),
            QuestionKind::YesNo => match raw {
                "true" | "yes" => Ok(Value::Bool(true)),
                "false" | "no" => Ok(Value::Bool(false)),
                _ => Err(FieldError::new(self.key, "Select yes if you are using any SuDS design details")),
            },
            QuestionKind::Email if raw.is_empty() => Err(FieldError::new(self.key, "Enter an email address")),
            QuestionKind::Email if !is_plausible_email(raw) => Err(FieldError::new(
                self.key,
                "Enter an email address in the correct format, like name@example.com",
            )),
            QuestionKind::Email => Ok(Value::from(raw)),
        }
    }

    fn back_link(&self, ctx: &PageContext) -> Option<String> {
        safe_return_url(ctx.return_url()).or_else(|| self.graph.previous(self.route))
    }

    fn render(&self, ctx: &PageContext, value: Option<&str>, errors: &[FieldError]) -> PageResponse {
        let error = views::error_for(errors, self.key);
        let input = match self.kind {
            QuestionKind::Radios(options) => self.radios(options.iter().map(|o| (*o, *o)), value),
            QuestionKind::YesNo => self.radios([("true", "Yes"), ("false", "No")].into_iter(), value),
            QuestionKind::Email => format!(
                r#"<input class="govuk-input" id="{key}" name="{key}" type="email" spellcheck="false" autocomplete="email" value="{value}">"#,
                key = self.key,
                value = escape(value.unwrap_or_default()),
            ),
        };

        let body = format!(
            r#"<form method="post" action="{action}" novalidate>
    <div class="{group}">
        <h1 class="govuk-label-wrapper"><label class="govuk-label govuk-label--l" for="{key}">{title}</label></h1>
        {message}
        {input}
    </div>
    {button}
</form>"#,
            action = escape(&ctx.form_action()),
            group = views::group_class(error),
            key = self.key,
            title = escape(self.title),
            message = views::error_message(error),
            input = input,
            button = views::button("Continue"),
        );

        PageResponse::View(views::page(self.title, self.back_link(ctx).as_deref(), errors, &body))
    }

    fn radios<'a>(&self, options: impl Iterator<Item = (&'a str, &'a str)>, selected: Option<&str>) -> String {
        let items: String = options
            .enumerate()
            .map(|(i, (value, label))| {
                let id = if i == 0 { self.key.to_string() } else { format!("{}-{}", self.key, i + 1) };
                let checked = if selected == Some(value) { " checked" } else { "" };
                format!(
                    r#"<div class="govuk-radios__item"><input class="govuk-radios__input" id="{id}" name="{key}" type="radio" value="{value}"{checked}><label class="govuk-label govuk-radios__label" for="{id}">{label}</label></div>"#,
                    id = id,
                    key = self.key,
                    value = escape(value),
                    checked = checked,
                    label = escape(label),
                )
            })
            .collect();
        format!(r#"<div class="govuk-radios" data-module="govuk-radios">{}</div>"#, items)
    }
}

impl PageController for QuestionPage {
    fn route(&self) -> &'static str {
        self.route
    }

    fn get(&self, ctx: &PageContext) -> ApiResult<PageResponse> {
        let value = self.current_value(&ctx.state);
        Ok(self.render(ctx, value.as_deref(), &[]))
    }

    fn post(&self, ctx: &PageContext, payload: &FormPayload) -> ApiResult<PageOutcome> {
        let raw = payload.get(self.key).map(String::as_str);
        match self.parse(raw) {
            Ok(value) => {
                let mut answers = StateMap::new();
                answers.insert(self.key.to_string(), value);
                let next = resolve_next_path(&self.graph, self.route, ctx.return_url())?;
                Ok(PageOutcome::write(StateUpdate::Answers(answers), PageResponse::Redirect(next)))
            }
            Err(error) => Ok(PageOutcome::respond(self.render(ctx, raw, &[error]))),
        }
    }
}
