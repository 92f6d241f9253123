use axum::{
    body::Body,
    http::{Request, Response},
};
use std::time::Duration;
use tower_http::classify::{ServerErrorsAsFailures, ServerErrorsFailureClass, SharedClassifier};
use tower_http::trace::{DefaultOnBodyChunk, DefaultOnEos, MakeSpan, TraceLayer};
use tracing::{Span, error, field, info};

use crate::middleware::request_context::RequestContext;

type GatewayTraceLayer = TraceLayer<
    SharedClassifier<ServerErrorsAsFailures>,
    GatewaySpan,
    fn(&Request<Body>, &Span),
    fn(&Response<Body>, Duration, &Span),
    DefaultOnBodyChunk,
    DefaultOnEos,
    fn(ServerErrorsFailureClass, Duration, &Span),
>;

/// Opens one `http_request` span per request.
///
/// The route guard fills `guard` and `session_present`; `status_code` is
/// filled once the response is ready. Bypassed paths leave the guard fields
/// empty.
#[derive(Clone, Default)]
pub(crate) struct GatewaySpan;

impl<B> MakeSpan<B> for GatewaySpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        let request_id = request
            .extensions()
            .get::<RequestContext>()
            .map_or("n/a", |ctx| ctx.request_id.as_str());

        // Path only; query strings may carry form data.
        tracing::info_span!(
            "http_request",
            method = %request.method(),
            path = %request.uri().path(),
            request_id = %request_id,
            guard = field::Empty,
            session_present = field::Empty,
            status_code = field::Empty
        )
    }
}

fn on_request(request: &Request<Body>, span: &Span) {
    span.in_scope(|| info!(version = ?request.version(), "request received"));
}

fn on_response(response: &Response<Body>, latency: Duration, span: &Span) {
    let status = response.status();
    span.record("status_code", status.as_u16());
    span.in_scope(|| {
        if status.is_redirection() {
            let location = response
                .headers()
                .get(axum::http::header::LOCATION)
                .and_then(|value| value.to_str().ok())
                .unwrap_or_default();
            info!(status = status.as_u16(), location, ?latency, "request redirected");
        } else {
            info!(status = status.as_u16(), ?latency, "request finished");
        }
    });
}

fn on_failure(failure: ServerErrorsFailureClass, latency: Duration, span: &Span) {
    span.in_scope(|| error!(%failure, ?latency, "request failed"));
}

/// Request/response logging for the gateway router.
pub fn create_trace_layer() -> GatewayTraceLayer {
    TraceLayer::new_for_http()
        .make_span_with(GatewaySpan)
        .on_request(on_request as fn(&Request<Body>, &Span))
        .on_response(on_response as fn(&Response<Body>, Duration, &Span))
        .on_failure(on_failure as fn(ServerErrorsFailureClass, Duration, &Span))
}
