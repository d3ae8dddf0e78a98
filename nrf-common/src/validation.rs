//! Field validators
//!
//! Validators never fail with an `Err` of the crate error type: a rejected
//! answer is a [`FieldError`] carrying enough to render an accessible error
//! summary (`path`, `name`, `href`, `text`).

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

use crate::boundary_file::BoundaryFile;
use crate::building_types::{BuildingCounts, BuildingTypeField, BuildingTypeFields};

/// Field name errors on the upload page attach to
pub const FILE_FIELD: &str = "file";

/// Accepted boundary file extensions (matched case-insensitively)
pub const ALLOWED_EXTENSIONS: &[&str] = &[".geojson", ".json", ".kml"];

/// Accepted content types; a declared type is accepted when it contains one
/// of these, ignoring case
pub const ALLOWED_CONTENT_TYPES: &[&str] = &[
    "application/geo+json",
    "application/vnd.geo+json",
    "application/json",
    "application/vnd.google-earth.kml+xml",
    "application/xml",
    "text/xml",
];

/// Largest accepted declared file size
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Largest accepted count per building type
pub const MAX_BUILDING_COUNT: i64 = 5000;

pub const UPLOAD_PROBLEM_MESSAGE: &str =
    "There was a problem uploading your file. Please try again.";

/// A single field-scoped validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub path: String,
    pub name: String,
    pub href: String,
    pub text: String,
}

impl FieldError {
    pub fn new(name: &str, text: impl Into<String>) -> Self {
        Self {
            path: name.to_string(),
            name: name.to_string(),
            href: format!("#{}", name),
            text: text.into(),
        }
    }
}

// ============================================================================
// Boundary file
// ============================================================================

/// Parse the raw `fileData` form field
///
/// Unparseable JSON is a structural problem and gets the generic upload message.
pub fn parse_file_payload(raw: &str) -> Result<Value, FieldError> {
    serde_json::from_str::<Value>(raw)
        .ok()
        .filter(Value::is_object)
        .ok_or_else(|| FieldError::new(FILE_FIELD, UPLOAD_PROBLEM_MESSAGE))
}

/// Validate a decoded upload payload against declared metadata only
///
/// Checks, in order: required fields, extension, content type, size. The
/// declared `size` is trusted; the decoded content length is not measured.
/// A missing or unparseable `uploadedAt` is replaced with `now`.
pub fn validate_boundary_file(payload: &Value, now: DateTime<Utc>) -> Result<BoundaryFile, FieldError> {
    let text = |key: &str| payload.get(key).and_then(Value::as_str);

    let filename = text("filename").map(str::trim).filter(|s| !s.is_empty());
    let size = payload.get("size").and_then(Value::as_u64);
    let content_type = text("contentType");
    let content = text("content").or_else(|| text("buffer"));

    let (Some(filename), Some(size), Some(content_type), Some(content)) =
        (filename, size, content_type, content)
    else {
        return Err(FieldError::new(
            FILE_FIELD,
            "The selected file is missing its name, size, type or content",
        ));
    };

    let lower_name = filename.to_ascii_lowercase();
    if !ALLOWED_EXTENSIONS.iter().any(|ext| lower_name.ends_with(ext)) {
        return Err(FieldError::new(
            FILE_FIELD,
            "The selected file must be a .geojson, .json or .kml file",
        ));
    }

    let lower_type = content_type.to_ascii_lowercase();
    if !ALLOWED_CONTENT_TYPES.iter().any(|t| lower_type.contains(t)) {
        return Err(FieldError::new(
            FILE_FIELD,
            format!(
                "The selected file type ({}) is not supported. Upload a GeoJSON, JSON or KML file",
                if content_type.is_empty() { "unknown" } else { content_type }
            ),
        ));
    }

    if size > MAX_FILE_SIZE {
        return Err(FieldError::new(
            FILE_FIELD,
            "The selected file must be smaller than 10MB",
        ));
    }

    let uploaded_at = text("uploadedAt")
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|ts| ts.with_timezone(&Utc))
        .unwrap_or(now)
        .to_rfc3339_opts(SecondsFormat::Millis, true);

    Ok(BoundaryFile {
        filename: filename.to_string(),
        size,
        content_type: content_type.to_string(),
        content: content.to_string(),
        uploaded_at,
    })
}

// ============================================================================
// Building counts
// ============================================================================

fn is_integer_literal(value: &str) -> bool {
    let digits = value
        .strip_prefix('-')
        .or_else(|| value.strip_prefix('+'))
        .unwrap_or(value);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Validate one building-count field
pub fn validate_building_count(field: &BuildingTypeField, raw: &str) -> Result<u32, FieldError> {
    let label = field.label();
    let value = raw.trim();

    if value.contains('.') {
        return Err(FieldError::new(
            &field.name,
            format!("{} must be a whole number", label),
        ));
    }

    let parsed = match value.parse::<i64>() {
        Ok(parsed) => parsed,
        // Digits only but too long for i64: out of range, not malformed
        Err(_) if is_integer_literal(value) => {
            if value.starts_with('-') {
                i64::MIN
            } else {
                i64::MAX
            }
        }
        Err(_) => {
            return Err(FieldError::new(
                &field.name,
                format!("{} must be a number", label),
            ))
        }
    };

    if parsed < 0 {
        return Err(FieldError::new(
            &field.name,
            format!("{} must be 0 or more", label),
        ));
    }

    if parsed > MAX_BUILDING_COUNT {
        return Err(FieldError::new(
            &field.name,
            format!("{} must be {} or fewer", label, MAX_BUILDING_COUNT),
        ));
    }

    // Bounded by MAX_BUILDING_COUNT above
    Ok(parsed as u32)
}

/// Validate a whole building-count submission
///
/// Only configured fields are read; unknown submitted names are ignored and
/// a configured field that was not submitted counts as 0. Per-field errors
/// are all reported together. When every field passes but the total is
/// zero, a single error is attached to the first field.
pub fn validate_building_counts(
    fields: &BuildingTypeFields,
    submitted: &HashMap<String, String>,
) -> Result<BuildingCounts, Vec<FieldError>> {
    let mut counts = Vec::with_capacity(fields.len());
    let mut errors = Vec::new();

    for field in fields.iter() {
        let raw = submitted.get(&field.name).map(String::as_str).unwrap_or("0");
        match validate_building_count(field, raw) {
            Ok(count) => counts.push(count),
            Err(error) => errors.push(error),
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    let counts = BuildingCounts::from_values(counts);
    if counts.total() == 0 {
        let first = fields.first().map(|f| f.name.as_str()).unwrap_or_default();
        return Err(vec![FieldError::new(
            first,
            "Enter the number of buildings for at least one building type",
        )]);
    }

    Ok(counts)
}

// ============================================================================
// Simple question answers
// ============================================================================

/// Basic email shape check: one `@`, non-empty local part, dotted domain
pub fn is_plausible_email(value: &str) -> bool {
    let value = value.trim();
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !value.chars().any(char::is_whitespace)
        && domain
            .split('.')
            .filter(|part| !part.is_empty())
            .count()
            >= 2
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-10-17T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn payload(filename: &str, content_type: &str, size: u64) -> Value {
        json!({
            "filename": filename,
            "size": size,
            "contentType": content_type,
            "content": "e30=",
            "uploadedAt": "2026-10-17T11:59:00.000Z"
        })
    }

    #[test]
    fn test_valid_geojson_accepted() {
        let file = validate_boundary_file(&payload("site.geojson", "application/geo+json", 1024 * 1024), now())
            .unwrap();
        assert_eq!(file.filename, "site.geojson");
        assert_eq!(file.size, 1_048_576);
        assert_eq!(file.uploaded_at, "2026-10-17T11:59:00.000Z");
    }

    #[test]
    fn test_content_type_match_is_case_insensitive_substring() {
        let ok = validate_boundary_file(
            &payload("site.KML", "Application/Vnd.Google-Earth.KML+XML; charset=utf-8", 10),
            now(),
        );
        assert!(ok.is_ok());
    }

    #[test]
    fn test_png_content_type_rejected() {
        let err = validate_boundary_file(&payload("site.json", "image/png", 10), now()).unwrap_err();
        assert_eq!(err.name, "file");
        assert!(err.text.contains("image/png"));
    }

    #[test]
    fn test_bad_extension_rejected() {
        let err = validate_boundary_file(&payload("site.shp", "application/json", 10), now()).unwrap_err();
        assert!(err.text.contains(".geojson"));
    }

    #[test]
    fn test_oversize_rejected() {
        assert!(validate_boundary_file(&payload("a.json", "application/json", MAX_FILE_SIZE), now()).is_ok());
        let err = validate_boundary_file(&payload("a.json", "application/json", MAX_FILE_SIZE + 1), now())
            .unwrap_err();
        assert!(err.text.contains("10MB"));
    }

    #[test]
    fn test_missing_fields_rejected() {
        let err = validate_boundary_file(&json!({ "filename": "a.json", "size": 3 }), now()).unwrap_err();
        assert!(err.text.contains("missing"));

        let negative = json!({
            "filename": "a.json", "size": -1, "contentType": "application/json", "content": ""
        });
        assert!(validate_boundary_file(&negative, now()).is_err());
    }

    #[test]
    fn test_missing_uploaded_at_uses_now() {
        let value = json!({
            "filename": "a.json", "size": 3, "contentType": "application/json", "content": "e30="
        });
        let file = validate_boundary_file(&value, now()).unwrap();
        assert_eq!(file.uploaded_at, "2026-10-17T12:00:00.000Z");
    }

    #[test]
    fn test_parse_file_payload_structural_error() {
        let err = parse_file_payload("{not json").unwrap_err();
        assert_eq!(err.text, UPLOAD_PROBLEM_MESSAGE);
        assert!(parse_file_payload("[1,2]").is_err());
        assert!(parse_file_payload(r#"{"filename":"a"}"#).is_ok());
    }

    fn field(index: usize) -> BuildingTypeField {
        BuildingTypeFields::default().by_index(index).unwrap().clone()
    }

    #[test]
    fn test_building_count_decimal_is_whole_number_error() {
        let err = validate_building_count(&field(3), "1.5").unwrap_err();
        assert_eq!(err.name, "buildingType-3");
        assert_eq!(err.href, "#buildingType-3");
        assert_eq!(err.text, "House of multiple occupation (HMO) must be a whole number");
    }

    #[test]
    fn test_building_count_bounds() {
        assert_eq!(validate_building_count(&field(1), " 0 "), Ok(0));
        assert_eq!(validate_building_count(&field(1), "5000"), Ok(5000));
        assert!(validate_building_count(&field(1), "5001").unwrap_err().text.contains("5000 or fewer"));
        assert!(validate_building_count(&field(1), "-2").unwrap_err().text.contains("0 or more"));
        assert!(validate_building_count(&field(1), "two").unwrap_err().text.contains("must be a number"));
        assert!(validate_building_count(&field(1), "").is_err());
    }

    #[test]
    fn test_building_count_overflow_is_range_error() {
        let err = validate_building_count(&field(1), "99999999999999999999").unwrap_err();
        assert!(err.text.contains("must be 5000 or fewer"), "got: {}", err.text);

        let err = validate_building_count(&field(1), "-99999999999999999999").unwrap_err();
        assert!(err.text.contains("must be 0 or more"), "got: {}", err.text);

        let err = validate_building_count(&field(1), "9999999999999999999x").unwrap_err();
        assert!(err.text.contains("must be a number"), "got: {}", err.text);
    }

    fn submitted(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_building_counts_collects_all_field_errors() {
        let fields = BuildingTypeFields::default();
        let errors = validate_building_counts(
            &fields,
            &submitted(&[("buildingType-1", "x"), ("buildingType-2", "2.5"), ("buildingType-3", "1")]),
        )
        .unwrap_err();
        let names: Vec<_> = errors.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["buildingType-1", "buildingType-2"]);
    }

    #[test]
    fn test_building_counts_all_zero_single_error_on_first_field() {
        let fields = BuildingTypeFields::default();
        let errors = validate_building_counts(&fields, &submitted(&[("buildingType-2", "0")])).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].name, "buildingType-1");
    }

    #[test]
    fn test_building_counts_ignores_unknown_fields() {
        let fields = BuildingTypeFields::default();
        let counts = validate_building_counts(
            &fields,
            &submitted(&[("buildingType-1", "2"), ("buildingType-99", "oops"), ("admin", "1")]),
        )
        .unwrap();
        assert_eq!(counts.total(), 2);
    }

    #[test]
    fn test_plausible_email() {
        assert!(is_plausible_email("someone@example.com"));
        assert!(is_plausible_email(" first.last@sub.example.org "));
        assert!(!is_plausible_email("someone"));
        assert!(!is_plausible_email("@example.com"));
        assert!(!is_plausible_email("a@b"));
        assert!(!is_plausible_email("a@@b.com"));
        assert!(!is_plausible_email("a b@c.com"));
        assert!(!is_plausible_email("a@.com"));
    }
}
