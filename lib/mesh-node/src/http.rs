//! HTTP surface of a service node

use crate::metrics::MetricsCollector;
use crate::node::ServiceNode;
use http_body_util::Full;
use hyper::header::{HeaderValue, ALLOW, CONTENT_TYPE};
use hyper::{body::Bytes, Method, Request, Response, StatusCode};
use mesh_core::CallResult;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{debug, warn};

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const PROMETHEUS_TEXT: &str = "text/plain; version=0.0.4";

/// Route a request to the node operation it names.
///
/// Every outcome is answered with a response; the error type is never produced.
pub async fn handle_request<B>(
    req: Request<B>,
    node: Arc<ServiceNode>,
    metrics: Arc<MetricsCollector>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    debug!("{} {}", method, path);

    let (route, response) = if method != Method::GET {
        ("other", method_not_allowed())
    } else if path == "/health" {
        ("health", text_response(StatusCode::OK, node.health()))
    } else if path == "/" {
        ("root", text_response(StatusCode::OK, node.greeting()))
    } else if path == "/metrics" {
        ("metrics", metrics_response(&metrics))
    } else if let Some(target) = call_target(&path) {
        let result = node.call(target).await;
        metrics.record_call(&result);
        ("call", call_response(node.identity().name.as_str(), target, result))
    } else {
        ("other", text_response(StatusCode::NOT_FOUND, "Not Found".to_string()))
    };

    metrics.record_request(route, response.status());
    Ok(response)
}

/// Extract `{target}` from `/call/{target}`
fn call_target(path: &str) -> Option<&str> {
    let target = path.strip_prefix("/call/")?;
    if target.is_empty() || target.contains('/') {
        None
    } else {
        Some(target)
    }
}

/// Map a call outcome onto the HTTP response the caller sees
pub fn call_response(caller: &str, target: &str, result: CallResult) -> Response<Full<Bytes>> {
    match result {
        CallResult::Success(body) => text_response(StatusCode::OK, body),
        CallResult::NotFound => text_response(
            StatusCode::NOT_FOUND,
            format!("{} not found in service registry", target),
        ),
        CallResult::UpstreamError(message) => {
            warn!("{} -> {} failed: {}", caller, target, message);
            text_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("{} -> {} failed: {}", caller, target, message),
            )
        }
    }
}

fn metrics_response(metrics: &MetricsCollector) -> Response<Full<Bytes>> {
    match metrics.gather() {
        Ok(text) => {
            let mut response = text_response(StatusCode::OK, text);
            response
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static(PROMETHEUS_TEXT));
            response
        }
        Err(e) => {
            warn!("Failed to gather metrics: {}", e);
            text_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to gather metrics".to_string(),
            )
        }
    }
}

fn method_not_allowed() -> Response<Full<Bytes>> {
    let mut response = text_response(
        StatusCode::METHOD_NOT_ALLOWED,
        "Method Not Allowed".to_string(),
    );
    response.headers_mut().insert(ALLOW, HeaderValue::from_static("GET"));
    response
}

/// Plain-text response with the given status
pub fn text_response(status: StatusCode, body: String) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(TEXT_PLAIN));
    response
}
