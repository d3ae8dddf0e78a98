//! Quote submissions and reference numbers

use chrono::{DateTime, SecondsFormat, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::boundary_file::BoundaryFile;
use crate::building_types::{BuildingCounts, BuildingTypeFields};
use crate::constants::{fields as keys, FORM_NAME};
use crate::state::FormState;

const REFERENCE_PREFIX: &str = "NRF";
const REFERENCE_SUFFIX_LEN: usize = 6;
const BASE36: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Human-readable reference, `NRF-{epoch millis}-{6 base-36 chars}`
pub fn generate_reference<R: Rng + ?Sized>(now: DateTime<Utc>, rng: &mut R) -> String {
    let suffix: String = (0..REFERENCE_SUFFIX_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("{}-{}-{}", REFERENCE_PREFIX, now.timestamp_millis(), suffix)
}

/// One submitted answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionItem {
    pub label: String,
    pub value: Value,
}

impl SubmissionItem {
    fn new(label: &str, value: impl Into<Value>) -> Self {
        Self {
            label: label.to_string(),
            value: value.into(),
        }
    }
}

/// Terminal record of a completed quote request; never modified once built
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: String,
    pub date: String,
    pub form_name: String,
    pub form_data: BTreeMap<String, SubmissionItem>,
}

impl Submission {
    /// Normalise accumulated answers into a submission record
    pub fn from_state(
        fields: &BuildingTypeFields,
        state: &FormState,
        reference: String,
        now: DateTime<Utc>,
    ) -> Self {
        let mut form_data = BTreeMap::new();

        let boundary = BoundaryFile::from_state(state)
            .map(|file| Value::String(file.filename))
            .unwrap_or(Value::Null);
        form_data.insert(
            keys::BOUNDARY_FILE.to_string(),
            SubmissionItem::new("Red line boundary", boundary),
        );

        let counts = BuildingCounts::from_bucket(fields, state.bucket());
        for (field, count) in counts.entries(fields) {
            form_data.insert(field.name.clone(), SubmissionItem::new(field.label(), count));
        }

        form_data.insert(
            keys::WASTE_WATER.to_string(),
            SubmissionItem::new(
                "Dealing with waste water",
                state.answer(keys::WASTE_WATER).map(Value::from).unwrap_or(Value::Null),
            ),
        );
        form_data.insert(
            keys::SUDS.to_string(),
            SubmissionItem::new(
                "Using any SuDS",
                state.flag(keys::SUDS).map(Value::from).unwrap_or(Value::Null),
            ),
        );
        form_data.insert(
            keys::EMAIL.to_string(),
            SubmissionItem::new(
                "Email address",
                state.answer(keys::EMAIL).map(Value::from).unwrap_or(Value::Null),
            ),
        );

        Self {
            id: reference,
            date: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            form_name: FORM_NAME.to_string(),
            form_data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::StateMap;
    use rand::{rngs::StdRng, SeedableRng};
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-10-17T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_reference_format() {
        let mut rng = StdRng::seed_from_u64(7);
        let reference = generate_reference(now(), &mut rng);

        let parts: Vec<_> = reference.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "NRF");
        assert_eq!(parts[1], now().timestamp_millis().to_string());
        assert_eq!(parts[2].len(), 6);
        assert!(parts[2].chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn test_references_differ() {
        let mut rng = StdRng::seed_from_u64(1);
        let a = generate_reference(now(), &mut rng);
        let b = generate_reference(now(), &mut rng);
        assert_ne!(a, b);
    }

    #[test]
    fn test_submission_from_state() {
        let fields = BuildingTypeFields::default();
        let bucket: StateMap = serde_json::from_value(json!({ "buildingType-1": 4 })).unwrap();
        let answers: StateMap = serde_json::from_value(json!({
            "wasteWater": "Public waste water treatment works",
            "suds": true,
            "email": "someone@example.com"
        }))
        .unwrap();
        let state = FormState::new().merge_bucket(&bucket).merge_answers(&answers);

        let submission = Submission::from_state(&fields, &state, "NRF-1-ABCDEF".to_string(), now());

        assert_eq!(submission.id, "NRF-1-ABCDEF");
        assert_eq!(submission.form_name, "Nature Restoration Fund Quote");
        assert_eq!(submission.date, "2026-10-17T12:00:00.000Z");
        assert_eq!(submission.form_data["buildingType-1"].label, "Dwelling house");
        assert_eq!(submission.form_data["buildingType-1"].value, json!(4));
        assert_eq!(submission.form_data["suds"].value, json!(true));
        assert_eq!(submission.form_data["boundaryFile"].value, Value::Null);

        let encoded = serde_json::to_value(&submission).unwrap();
        assert!(encoded.get("formData").is_some());
    }
}
