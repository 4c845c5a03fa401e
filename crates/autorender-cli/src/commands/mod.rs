//! CLI command implementations

pub mod doctor;
pub mod render;
pub mod validate;

mod reporting;

pub use reporting::Diagnostic;
