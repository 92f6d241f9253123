pub mod request_context;
pub mod route_guard;
