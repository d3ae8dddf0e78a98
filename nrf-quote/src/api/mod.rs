//! HTTP handlers outside the wizard pages

pub mod health;
pub mod ui;

pub use health::health_routes;
pub use ui::{serve_boundary_upload_js, serve_home};
