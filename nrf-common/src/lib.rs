//! # NRF Common Library
//!
//! Core of the Nature Restoration Fund quote wizard, shared by the HTTP service:
//! - Session form state and the non-destructive namespaced merge
//! - Field validators (boundary file metadata, building counts)
//! - Building-type field descriptors built from configuration
//! - Branch decision engine and safe return-url resolution
//! - Summary aggregation and submission/reference generation
//! - Configuration loading

pub mod boundary_file;
pub mod building_types;
pub mod config;
pub mod constants;
pub mod error;
pub mod format;
pub mod navigation;
pub mod state;
pub mod submission;
pub mod summary;
pub mod validation;

pub use error::{Error, Result};
pub use state::FormState;
pub use validation::FieldError;
