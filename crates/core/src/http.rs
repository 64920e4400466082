//! 请求/响应类型与请求属性

use std::time::{SystemTime, UNIX_EPOCH};

use axum::http::{header, HeaderValue, StatusCode};
use serde::Serialize;

use crate::diagnostics::PhaseRecord;

pub use axum::body::Body;

pub type Request = axum::http::Request<Body>;
pub type Response = axum::http::Response<Body>;

/// 请求到达时间（请求扩展属性）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestStartTime(pub SystemTime);

impl RequestStartTime {
    pub fn now() -> Self {
        Self(SystemTime::now())
    }

    /// Unix 时间戳（秒，带小数）
    pub fn as_secs_f64(&self) -> f64 {
        self.0
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or_default()
    }
}

/// 请求摘要
///
/// 请求本体交给下游处理后，日志边界只能看到这份摘要。
#[derive(Debug, Clone, Serialize)]
pub struct RequestSummary {
    pub method: String,
    pub uri: String,
    pub path: String,
    /// Unix 时间戳（秒）
    pub start_time: Option<f64>,
    pub phases: Vec<PhaseRecord>,
}

impl RequestSummary {
    pub fn from_request(request: &Request) -> Self {
        Self {
            method: request.method().to_string(),
            uri: request.uri().to_string(),
            path: request.uri().path().to_string(),
            start_time: request
                .extensions()
                .get::<RequestStartTime>()
                .map(RequestStartTime::as_secs_f64),
            phases: Vec::new(),
        }
    }

    pub fn with_phases(mut self, phases: &[PhaseRecord]) -> Self {
        self.phases = phases.to_vec();
        self
    }
}

/// 构造重定向响应
///
/// 非 3xx 状态码按 302 处理；无法放进 header 的地址退回站点根路径。
pub fn redirect_response(location: &str, status: u16) -> Response {
    let status = StatusCode::from_u16(status)
        .ok()
        .filter(StatusCode::is_redirection)
        .unwrap_or(StatusCode::FOUND);
    let location =
        HeaderValue::from_str(location).unwrap_or_else(|_| HeaderValue::from_static("/"));

    let mut response = Response::new(Body::empty());
    *response.status_mut() = status;
    response.headers_mut().insert(header::LOCATION, location);
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_response() {
        let response = redirect_response("/blog?page=2", 301);
        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/blog?page=2"
        );
    }

    #[test]
    fn test_redirect_invalid_status_falls_back() {
        let response = redirect_response("/blog", 200);
        assert_eq!(response.status(), StatusCode::FOUND);
    }

    #[test]
    fn test_summary_reads_start_time() {
        let mut request = Request::new(Body::empty());
        *request.uri_mut() = "/docs/intro?x=1".parse().unwrap();
        request.extensions_mut().insert(RequestStartTime(UNIX_EPOCH));

        let summary = RequestSummary::from_request(&request);
        assert_eq!(summary.method, "GET");
        assert_eq!(summary.path, "/docs/intro");
        assert_eq!(summary.uri, "/docs/intro?x=1");
        assert_eq!(summary.start_time, Some(0.0));
    }
}
