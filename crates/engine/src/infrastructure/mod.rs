//! Infrastructure implementations.
//!
//! Contains port trait implementations for external dependencies.

pub mod clock;
pub mod config;
pub mod image_origin;
pub mod persistence;
pub mod ports;
pub mod wikidata;
