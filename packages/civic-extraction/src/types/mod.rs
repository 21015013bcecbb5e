//! Data types for the extraction library.

pub mod config;
pub mod draft;
pub mod extraction;
pub mod record;
pub mod report;
pub mod validation;
