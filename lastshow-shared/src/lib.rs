#![cfg_attr(not(test), forbid(unsafe_code))]

//! Types shared between the gateway server and its tests: configuration,
//! remote API payloads, form validation, and form result values.

pub mod config;
pub mod models;
