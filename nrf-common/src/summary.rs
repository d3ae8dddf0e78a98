//! Check-your-answers aggregation
//!
//! Read-only views over form state for the summary page: a building table
//! listing every configured type (zero quantities included) with a grand
//! total, the stored boundary file if any, and one row per question with a
//! "change" link that loops back to the summary.

use serde::Serialize;

use crate::boundary_file::{BoundaryFile, FormattedBoundaryFile};
use crate::building_types::{BuildingCounts, BuildingTypeFields};
use crate::constants::{fields as keys, form_path, routes};
use crate::state::FormState;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildingRow {
    pub type_label: String,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildingSummary {
    pub rows: Vec<BuildingRow>,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerRow {
    pub key: String,
    pub label: String,
    /// `None` when the question has not been answered yet
    pub value: Option<String>,
    pub change_href: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuoteSummary {
    pub buildings: BuildingSummary,
    pub buildings_change_href: String,
    pub boundary_file: Option<FormattedBoundaryFile>,
    pub boundary_change_href: String,
    pub answers: Vec<AnswerRow>,
}

/// Link to an editable page carrying `returnUrl` back to the summary
pub fn change_link(route: &str) -> String {
    format!(
        "{}?returnUrl={}",
        form_path(route),
        urlencoding::encode(&form_path(routes::SUMMARY))
    )
}

pub fn summarise_building_counts(fields: &BuildingTypeFields, state: &FormState) -> BuildingSummary {
    let counts = BuildingCounts::from_bucket(fields, state.bucket());
    let rows = counts
        .entries(fields)
        .map(|(field, quantity)| BuildingRow {
            type_label: field.label().to_string(),
            quantity,
        })
        .collect();

    BuildingSummary {
        rows,
        total: counts.total(),
    }
}

fn yes_no(value: bool) -> String {
    if value { "Yes" } else { "No" }.to_string()
}

pub fn summarise(fields: &BuildingTypeFields, state: &FormState) -> QuoteSummary {
    let answers = vec![
        AnswerRow {
            key: keys::WASTE_WATER.to_string(),
            label: "Dealing with waste water".to_string(),
            value: state.answer(keys::WASTE_WATER).map(str::to_string),
            change_href: change_link(routes::WASTE_WATER),
        },
        AnswerRow {
            key: keys::SUDS.to_string(),
            label: "Using any SuDS".to_string(),
            value: state.flag(keys::SUDS).map(yes_no),
            change_href: change_link(routes::SUDS),
        },
        AnswerRow {
            key: keys::EMAIL.to_string(),
            label: "Email address".to_string(),
            value: state.answer(keys::EMAIL).map(str::to_string),
            change_href: change_link(routes::EMAIL),
        },
    ];

    QuoteSummary {
        buildings: summarise_building_counts(fields, state),
        buildings_change_href: change_link(routes::BUILDINGS),
        boundary_file: BoundaryFile::from_state(state).map(|file| file.formatted()),
        boundary_change_href: change_link(routes::UPLOAD),
        answers,
    }
}

/// First required page still unanswered, in wizard order
///
/// The boundary upload is optional and never reported.
pub fn first_incomplete_page(fields: &BuildingTypeFields, state: &FormState) -> Option<&'static str> {
    if BuildingCounts::from_bucket(fields, state.bucket()).total() == 0 {
        return Some(routes::BUILDINGS);
    }
    if state.answer(keys::WASTE_WATER).is_none() {
        return Some(routes::WASTE_WATER);
    }
    if state.flag(keys::SUDS).is_none() {
        return Some(routes::SUDS);
    }
    if state.answer(keys::EMAIL).is_none() {
        return Some(routes::EMAIL);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::StateMap;
    use serde_json::json;

    fn map(value: serde_json::Value) -> StateMap {
        serde_json::from_value(value).unwrap()
    }

    fn complete_state() -> FormState {
        FormState::new()
            .merge_bucket(&map(json!({ "buildingType-1": 2, "buildingType-3": 1 })))
            .merge_answers(&map(json!({
                "wasteWater": "On-site system",
                "suds": false,
                "email": "someone@example.com"
            })))
    }

    #[test]
    fn test_change_link_encodes_return_url() {
        assert_eq!(
            change_link(routes::BUILDINGS),
            "/nrf-quote/building-types?returnUrl=%2Fnrf-quote%2Fsummary"
        );
    }

    #[test]
    fn test_building_summary_lists_every_type() {
        let fields = BuildingTypeFields::default();
        let summary = summarise_building_counts(&fields, &complete_state());

        assert_eq!(summary.rows.len(), 6);
        assert_eq!(summary.rows[0].quantity, 2);
        assert_eq!(summary.rows[1].quantity, 0);
        assert_eq!(summary.rows[2].type_label, "House of multiple occupation (HMO)");
        assert_eq!(summary.total, 3);
    }

    #[test]
    fn test_summary_omits_absent_boundary_file() {
        let fields = BuildingTypeFields::default();
        let summary = summarise(&fields, &complete_state());
        assert!(summary.boundary_file.is_none());
        assert_eq!(summary.answers[1].value.as_deref(), Some("No"));
    }

    #[test]
    fn test_first_incomplete_page() {
        let fields = BuildingTypeFields::default();
        assert_eq!(first_incomplete_page(&fields, &FormState::new()), Some(routes::BUILDINGS));
        assert_eq!(first_incomplete_page(&fields, &complete_state()), None);

        let no_email = complete_state().merge_answers(&map(json!({ "email": "" })));
        assert_eq!(first_incomplete_page(&fields, &no_email), Some(routes::EMAIL));
    }
}
