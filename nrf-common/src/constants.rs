//! Form identifiers, page routes and reserved state keys

/// URL slug every wizard page lives under
pub const FORM_SLUG: &str = "nrf-quote";

/// Display name recorded on submissions
pub const FORM_NAME: &str = "Nature Restoration Fund Quote";

/// Reserved state namespace for data not owned by a single page's
/// default write path (boundary file, building counts).
pub const PROTOTYPE_BUCKET: &str = "nrf-quote-prototype-01";

/// Question and bucket field names
pub mod fields {
    pub const BOUNDARY_FILE: &str = "boundaryFile";
    pub const WASTE_WATER: &str = "wasteWater";
    pub const SUDS: &str = "suds";
    pub const EMAIL: &str = "email";
}

/// Page paths relative to the form slug
pub mod routes {
    pub const START: &str = "/start";
    pub const UPLOAD: &str = "/upload-boundary";
    pub const BUILDINGS: &str = "/building-types";
    pub const NON_RESIDENTIAL_NOTICE: &str = "/non-residential-not-supported";
    pub const WASTE_WATER: &str = "/waste-water";
    pub const SUDS: &str = "/suds";
    pub const EMAIL: &str = "/email";
    pub const SUMMARY: &str = "/summary";
    pub const STATUS: &str = "/status";
}

/// Options for the waste-water radios question
pub const WASTE_WATER_OPTIONS: &[&str] = &[
    "Public waste water treatment works",
    "On-site system",
];

/// Absolute path of a page under the form slug, e.g. `/nrf-quote/summary`
pub fn form_path(route: &str) -> String {
    format!("/{}{}", FORM_SLUG, route)
}
