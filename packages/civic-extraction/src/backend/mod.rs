//! Backend implementations for the extraction library.
//!
//! This module provides a reference implementation of the `Backend` trait.
//! Users can use it directly or implement their own.

#[cfg(feature = "anthropic")]
mod anthropic;

#[cfg(feature = "anthropic")]
pub use anthropic::AnthropicBackend;
