//! # Configuration
//!
//! Layered gateway configuration: defaults, an optional YAML/JSON file,
//! `LASTSHOW_*` environment variables, and command-line overrides.

pub mod server;
