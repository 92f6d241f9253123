pub mod api_client;
pub mod auth_flow;
pub mod error_normalizer;
pub mod obituary_flow;
pub mod view_cache;
