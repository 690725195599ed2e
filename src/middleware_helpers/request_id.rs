//! Correlates dashboard calls with server logs: every response, including the
//! `ErrorResponse` of a failed order or report, carries the same
//! `x-request-id` that tagged its log lines.

use crate::tracing::RequestId;
use axum::{
    extract::Request,
    http::{header::HeaderName, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::Instrument;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Id sent by the dashboard, or a fresh UUID when absent or blank
fn resolve_request_id(headers: &HeaderMap) -> RequestId {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(RequestId::new)
        .unwrap_or_default()
}

fn stamp(headers: &mut HeaderMap, value: &Option<HeaderValue>) {
    if let Some(value) = value {
        headers.insert(HeaderName::from_static(REQUEST_ID_HEADER), value.clone());
    }
}

/// Outermost layer of the router. Handlers and `ServiceError` responses
/// read the id from the task-local scope set up here.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = resolve_request_id(request.headers());
    let header_value = HeaderValue::from_str(request_id.as_str()).ok();

    stamp(request.headers_mut(), &header_value);
    request.extensions_mut().insert(request_id.clone());

    let span = tracing::info_span!(
        "dashboard_request",
        request_id = %request_id,
        method = %request.method(),
        path = %request.uri().path(),
    );

    let mut response = crate::tracing::scope_request_id(request_id, next.run(request))
        .instrument(span)
        .await;

    stamp(response.headers_mut(), &header_value);
    response
}
