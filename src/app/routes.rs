//! 路由处理

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header, HeaderValue, StatusCode, Uri};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use preflight_core::clock;
use serde_json::json;

use crate::pages::StaticPages;
use crate::session::{SessionId, SESSION_COOKIE};

pub async fn home() -> impl IntoResponse {
    Json(json!({
        "now": clock::now().to_rfc3339(),
        "timezone": clock::timezone().name(),
        "locale": clock::locale(),
    }))
}

pub async fn page(State(pages): State<Arc<StaticPages>>, uri: Uri) -> Response {
    match pages.lookup(uri.path()) {
        Some(page) => Json(page).into_response(),
        None => (StatusCode::NOT_FOUND, "Not Found").into_response(),
    }
}

/// 读取或分配会话 ID，新会话在响应上设置 cookie
pub async fn session_cookie(mut request: Request, next: Next) -> Response {
    let existing = request
        .headers()
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(SessionId::from_cookie_header);

    let is_new = existing.is_none();
    let id = existing.unwrap_or_else(SessionId::generate);
    request.extensions_mut().insert(id.clone());

    let mut response = next.run(request).await;
    if is_new {
        let cookie = format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, id.as_str());
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
    response
}
