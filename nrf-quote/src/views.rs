//! HTML rendering helpers shared by the page controllers
//!
//! Pages are rendered server-side with GOV.UK Frontend class names; the
//! stylesheet itself is not served by this service.

use axum::response::Html;
use nrf_common::FieldError;

const SERVICE_NAME: &str = "Nature Restoration Fund";

/// Escape text for HTML element and attribute content
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Full page shell
pub fn page(title: &str, back_link: Option<&str>, errors: &[FieldError], body: &str) -> Html<String> {
    let title_prefix = if errors.is_empty() { "" } else { "Error: " };
    let back = back_link
        .map(|href| format!(r#"<a href="{}" class="govuk-back-link">Back</a>"#, escape(href)))
        .unwrap_or_default();

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en" class="govuk-template">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title_prefix}{title} - {service}</title>
</head>
<body class="govuk-template__body">
    <header class="govuk-header"><div class="govuk-header__container govuk-width-container">
        <span class="govuk-header__service-name">{service}</span>
    </div></header>
    <div class="govuk-width-container">
        {back}
        <main class="govuk-main-wrapper" id="main-content">
            {summary}
            {body}
        </main>
    </div>
</body>
</html>"#,
        title_prefix = title_prefix,
        title = escape(title),
        service = SERVICE_NAME,
        back = back,
        summary = error_summary(errors),
        body = body,
    ))
}

/// Error summary box linking to each failing field
pub fn error_summary(errors: &[FieldError]) -> String {
    if errors.is_empty() {
        return String::new();
    }

    let items: String = errors
        .iter()
        .map(|e| format!(r#"<li><a href="{}">{}</a></li>"#, escape(&e.href), escape(&e.text)))
        .collect();

    format!(
        r#"<div class="govuk-error-summary" data-module="govuk-error-summary">
    <div role="alert">
        <h2 class="govuk-error-summary__title">There is a problem</h2>
        <div class="govuk-error-summary__body"><ul class="govuk-list govuk-error-summary__list">{}</ul></div>
    </div>
</div>"#,
        items
    )
}

/// Error for a specific field, if any
pub fn error_for<'a>(errors: &'a [FieldError], name: &str) -> Option<&'a FieldError> {
    errors.iter().find(|e| e.name == name)
}

/// Inline error message under a field label
pub fn error_message(error: Option<&FieldError>) -> String {
    error
        .map(|e| {
            format!(
                r#"<p id="{}-error" class="govuk-error-message"><span class="govuk-visually-hidden">Error:</span> {}</p>"#,
                escape(&e.name),
                escape(&e.text)
            )
        })
        .unwrap_or_default()
}

/// Form group class, with the error modifier when needed
pub fn group_class(error: Option<&FieldError>) -> &'static str {
    if error.is_some() {
        "govuk-form-group govuk-form-group--error"
    } else {
        "govuk-form-group"
    }
}

/// Primary submit button
pub fn button(label: &str) -> String {
    format!(
        r#"<button type="submit" class="govuk-button" data-module="govuk-button">{}</button>"#,
        escape(label)
    )
}
