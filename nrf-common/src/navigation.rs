//! Page graph and branch decisions
//!
//! Navigation after a successful POST is resolved in this order:
//! 1. A branch override computed from accepted answers (building counts
//!    holding only non-residential development divert to a notice page)
//! 2. A same-site relative `returnUrl` (summary "change" links)
//! 3. The static next edge for the current page

use tracing::{debug, warn};

use crate::building_types::{BuildingCounts, BuildingTypeFields};
use crate::constants::{form_path, routes};
use crate::{Error, Result};

/// Static default edge from one page to the next (paths relative to the form slug)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationEdge {
    pub from: String,
    pub to: String,
}

impl NavigationEdge {
    pub fn new(from: &str, to: &str) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

/// Default next-page edges for the wizard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageGraph {
    edges: Vec<NavigationEdge>,
}

impl PageGraph {
    pub fn new(edges: Vec<NavigationEdge>) -> Self {
        Self { edges }
    }

    /// start → upload → building types → waste water → SuDS → email → summary
    pub fn wizard() -> Self {
        let order = [
            routes::START,
            routes::UPLOAD,
            routes::BUILDINGS,
            routes::WASTE_WATER,
            routes::SUDS,
            routes::EMAIL,
            routes::SUMMARY,
        ];
        Self::new(
            order
                .windows(2)
                .map(|pair| NavigationEdge::new(pair[0], pair[1]))
                .collect(),
        )
    }

    /// Absolute path of the default next page
    ///
    /// A page with no outgoing edge that is asked to advance is a
    /// configuration defect, reported as [`Error::Configuration`].
    pub fn next(&self, from: &str) -> Result<String> {
        self.edges
            .iter()
            .find(|edge| edge.from == from)
            .map(|edge| form_path(&edge.to))
            .ok_or_else(|| Error::Configuration(format!("No next page configured for {}", from)))
    }

    /// Absolute path of the page whose default edge leads to `to`, for back links
    pub fn previous(&self, to: &str) -> Option<String> {
        self.edges
            .iter()
            .find(|edge| edge.to == to)
            .map(|edge| form_path(&edge.from))
    }
}

impl Default for PageGraph {
    fn default() -> Self {
        Self::wizard()
    }
}

/// Accept a return url only when it is a same-site relative path
///
/// Rejects absolute and scheme-relative urls (`https://..`, `//host`),
/// backslash tricks (`/\host`), control characters and non-ASCII text
/// (it would reach the `Location` header unencoded).
pub fn safe_return_url(raw: Option<&str>) -> Option<String> {
    let candidate = raw?.trim();
    if candidate.is_empty() {
        return None;
    }

    let relative = candidate.is_ascii()
        && candidate.starts_with('/')
        && !candidate.starts_with("//")
        && !candidate.contains('\\')
        && !candidate.chars().any(char::is_control);

    if relative {
        Some(candidate.to_string())
    } else {
        warn!("Rejected non-relative returnUrl: {:?}", candidate);
        None
    }
}

/// Next path after a page with no branch logic: returnUrl, else default edge
pub fn resolve_next_path(graph: &PageGraph, current: &str, return_url: Option<&str>) -> Result<String> {
    if let Some(url) = safe_return_url(return_url) {
        debug!("Returning to {} after {}", url, current);
        return Ok(url);
    }
    graph.next(current)
}

/// Which kinds of building were entered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CountClassification {
    pub has_non_residential: bool,
    pub has_residential_types: bool,
}

impl CountClassification {
    /// Only non-residential development entered: the wizard cannot quote it
    pub fn non_residential_only(&self) -> bool {
        self.has_non_residential && !self.has_residential_types
    }
}

pub fn classify_counts(fields: &BuildingTypeFields, counts: &BuildingCounts) -> CountClassification {
    counts
        .entries(fields)
        .filter(|(_, count)| *count > 0)
        .fold(CountClassification::default(), |mut acc, (field, _)| {
            if field.non_residential {
                acc.has_non_residential = true;
            } else {
                acc.has_residential_types = true;
            }
            acc
        })
}

/// Next path after accepted building counts
///
/// The non-residential diversion takes priority over any returnUrl.
pub fn next_after_building_counts(
    graph: &PageGraph,
    fields: &BuildingTypeFields,
    counts: &BuildingCounts,
    return_url: Option<&str>,
) -> Result<String> {
    let classification = classify_counts(fields, counts);
    if classification.non_residential_only() {
        debug!("Only non-residential development entered, diverting to notice page");
        return Ok(form_path(routes::NON_RESIDENTIAL_NOTICE));
    }
    resolve_next_path(graph, routes::BUILDINGS, return_url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wizard_edges() {
        let graph = PageGraph::wizard();
        assert_eq!(graph.next(routes::START).unwrap(), "/nrf-quote/upload-boundary");
        assert_eq!(graph.next(routes::BUILDINGS).unwrap(), "/nrf-quote/waste-water");
        assert_eq!(graph.next(routes::EMAIL).unwrap(), "/nrf-quote/summary");
    }

    #[test]
    fn test_previous_page() {
        let graph = PageGraph::wizard();
        assert_eq!(graph.previous(routes::SUDS).as_deref(), Some("/nrf-quote/waste-water"));
        assert_eq!(graph.previous(routes::START), None);
    }

    #[test]
    fn test_missing_edge_is_configuration_error() {
        let graph = PageGraph::wizard();
        assert!(matches!(graph.next(routes::SUMMARY), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_safe_return_url() {
        assert_eq!(safe_return_url(Some("/nrf-quote/summary")).as_deref(), Some("/nrf-quote/summary"));
        assert_eq!(safe_return_url(Some("https://evil.example/")), None);
        assert_eq!(safe_return_url(Some("//evil.example/")), None);
        assert_eq!(safe_return_url(Some("/\\evil.example")), None);
        assert_eq!(safe_return_url(Some("/\t/evil.example")), None);
        assert_eq!(safe_return_url(Some("javascript:alert(1)")), None);
        assert_eq!(safe_return_url(Some("/nrf-quote/summ\u{e9}ry")), None);
        assert_eq!(safe_return_url(Some("/nrf-quote/summary?x=%C3%A9")).as_deref(), Some("/nrf-quote/summary?x=%C3%A9"));
        assert_eq!(safe_return_url(Some("summary")), None);
        assert_eq!(safe_return_url(Some("")), None);
        assert_eq!(safe_return_url(None), None);
    }

    #[test]
    fn test_resolve_next_path_prefers_return_url() {
        let graph = PageGraph::wizard();
        assert_eq!(
            resolve_next_path(&graph, routes::SUDS, Some("/nrf-quote/summary")).unwrap(),
            "/nrf-quote/summary"
        );
        assert_eq!(
            resolve_next_path(&graph, routes::SUDS, Some("https://evil.example/")).unwrap(),
            "/nrf-quote/email"
        );
    }

    #[test]
    fn test_classify_counts() {
        let fields = BuildingTypeFields::default();

        let only_non_res = BuildingCounts::from_values(vec![0, 0, 0, 3, 0, 0]);
        assert!(classify_counts(&fields, &only_non_res).non_residential_only());

        let mixed = BuildingCounts::from_values(vec![1, 0, 0, 3, 0, 0]);
        let c = classify_counts(&fields, &mixed);
        assert!(c.has_non_residential && c.has_residential_types);
        assert!(!c.non_residential_only());

        let residential = BuildingCounts::from_values(vec![2, 0, 0, 0, 0, 0]);
        assert!(!classify_counts(&fields, &residential).has_non_residential);
    }

    #[test]
    fn test_non_residential_branch_overrides_return_url() {
        let graph = PageGraph::wizard();
        let fields = BuildingTypeFields::default();
        let counts = BuildingCounts::from_values(vec![0, 0, 0, 3, 0, 0]);

        let next = next_after_building_counts(&graph, &fields, &counts, Some("/nrf-quote/summary")).unwrap();
        assert_eq!(next, "/nrf-quote/non-residential-not-supported");
    }

    #[test]
    fn test_building_counts_default_edge_and_return_url() {
        let graph = PageGraph::wizard();
        let fields = BuildingTypeFields::default();
        let counts = BuildingCounts::from_values(vec![2, 0, 0, 0, 0, 0]);

        assert_eq!(
            next_after_building_counts(&graph, &fields, &counts, None).unwrap(),
            "/nrf-quote/waste-water"
        );
        assert_eq!(
            next_after_building_counts(&graph, &fields, &counts, Some("/nrf-quote/summary")).unwrap(),
            "/nrf-quote/summary"
        );
    }
}
