//! Core trait abstractions for the extraction library.
//!
//! These traits define the interfaces that applications implement
//! to plug a model provider into the pipeline.

pub mod backend;
