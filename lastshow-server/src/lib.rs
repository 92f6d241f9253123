#![cfg_attr(not(test), forbid(unsafe_code))]

//! The Last Show web gateway.
//!
//! Serves the web client, gates every request on the session cookie and turns
//! form submissions into calls against the remote obituary API.

pub mod app_state;
pub mod auth;
pub mod commands;
mod handlers;
pub mod http;
pub mod middleware;
pub mod openapi;
mod routes;
pub mod server;
pub mod services;
mod tracer;
