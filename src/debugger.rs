//! Clockwork 调试器
//!
//! 每个请求一个 `ClockworkDebugger` 实例，收集本请求的消息和阶段时间线，
//! 请求结束时写入进程共享的 `ClockworkStore`。
//! `/__clockwork/{id}` 和 `/__clockwork/latest` 以 JSON 返回记录。

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::http::{header, HeaderValue, StatusCode};
use parking_lot::{Mutex, RwLock};
use preflight_core::{
    keys, Body, Config, Message, PhaseRecord, Request, RequestSummary, Response, Severity,
};
use preflight_processor::phases::CLOCKWORK_SEGMENT;
use preflight_processor::{Debugger, ProfileScope};
use serde::Serialize;

pub const CLOCKWORK_ID_HEADER: &str = "x-clockwork-id";
pub const CLOCKWORK_PROVIDER: &str = "clockwork";

const DEFAULT_CAPACITY: usize = 100;

/// 单个请求的调试记录
#[derive(Debug, Clone, Serialize)]
pub struct ClockworkRecord {
    pub id: String,
    pub method: String,
    pub uri: String,
    /// 请求到达时间（Unix 秒）
    pub time: Option<f64>,
    pub status: u16,
    /// 下游处理耗时（毫秒）
    pub response_duration_ms: Option<f64>,
    pub timeline: Vec<PhaseRecord>,
    pub messages: Vec<Message>,
}

/// 最近的调试记录，超出容量时丢弃最旧的
pub struct ClockworkStore {
    capacity: usize,
    records: RwLock<VecDeque<ClockworkRecord>>,
}

impl Default for ClockworkStore {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl ClockworkStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            records: RwLock::new(VecDeque::new()),
        }
    }

    pub fn push(&self, record: ClockworkRecord) {
        let mut records = self.records.write();
        while records.len() >= self.capacity {
            records.pop_front();
        }
        records.push_back(record);
    }

    pub fn get(&self, id: &str) -> Option<ClockworkRecord> {
        self.records.read().iter().find(|r| r.id == id).cloned()
    }

    pub fn latest(&self) -> Option<ClockworkRecord> {
        self.records.read().back().cloned()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub struct ClockworkDebugger {
    store: Arc<ClockworkStore>,
    id: String,
    enabled: AtomicBool,
    messages: Mutex<Vec<Message>>,
    downstream_ms: Mutex<Option<f64>>,
}

impl ClockworkDebugger {
    pub fn new(store: Arc<ClockworkStore>) -> Self {
        Self {
            store,
            id: uuid::Uuid::new_v4().to_string(),
            enabled: AtomicBool::new(false),
            messages: Mutex::new(Vec::new()),
            downstream_ms: Mutex::new(None),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

/// 读取调试器开关，类型不对的值记一条警告并按关闭处理
fn is_enabled(config: &Config) -> bool {
    let enabled = match config.get_or(keys::DEBUGGER_ENABLED, false) {
        Ok(enabled) => enabled,
        Err(e) => {
            tracing::warn!(
                "[Clockwork] {} 配置无效，调试器关闭: {}",
                keys::DEBUGGER_ENABLED,
                e
            );
            return false;
        }
    };
    let provider = config.get_or(keys::DEBUGGER_PROVIDER, CLOCKWORK_PROVIDER.to_string());
    let provider = match provider {
        Ok(provider) => provider,
        Err(e) => {
            tracing::warn!(
                "[Clockwork] {} 配置无效，调试器关闭: {}",
                keys::DEBUGGER_PROVIDER,
                e
            );
            return false;
        }
    };
    enabled && provider == CLOCKWORK_PROVIDER
}

fn json_response(status: StatusCode, value: &impl Serialize) -> Response {
    let (status, body) = match serde_json::to_vec(value) {
        Ok(body) => (status, body),
        Err(e) => {
            tracing::error!("[Clockwork] 序列化失败: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, b"{}".to_vec())
        }
    };
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

impl Debugger for ClockworkDebugger {
    fn init(&self, config: &Config) {
        self.enabled.store(is_enabled(config), Ordering::SeqCst);
    }

    fn live_inspection(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn debugger_request(&self, request: &Request) -> Response {
        let path = request.uri().path();
        let requested = path
            .split_once(CLOCKWORK_SEGMENT)
            .map(|(_, rest)| rest.trim_end_matches('/'))
            .unwrap_or_default();

        let record = match requested {
            "latest" => self.store.latest(),
            id => self.store.get(id),
        };
        match record {
            Some(record) => json_response(StatusCode::OK, &record),
            None => json_response(
                StatusCode::NOT_FOUND,
                &serde_json::json!({"error": "request not found"}),
            ),
        }
    }

    fn add_message(&self, message: &str, severity: Severity) {
        self.messages.lock().push(Message {
            text: message.to_string(),
            severity,
        });
    }

    fn end_profile(&self, scope: ProfileScope) {
        *self.downstream_ms.lock() = Some(scope.elapsed().as_secs_f64() * 1000.0);
    }

    fn log_request(&self, request: &RequestSummary, mut response: Response) -> Response {
        if !self.live_inspection() {
            return response;
        }

        self.store.push(ClockworkRecord {
            id: self.id.clone(),
            method: request.method.clone(),
            uri: request.uri.clone(),
            time: request.start_time,
            status: response.status().as_u16(),
            response_duration_ms: *self.downstream_ms.lock(),
            timeline: request.phases.clone(),
            messages: self.messages.lock().clone(),
        });

        if let Ok(value) = HeaderValue::from_str(&self.id) {
            response.headers_mut().insert(CLOCKWORK_ID_HEADER, value);
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn enabled_config() -> Config {
        Config::from_value(json!({"system": {"debugger": {"enabled": true}}}))
    }

    fn request(uri: &str) -> Request {
        axum::http::Request::builder()
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    fn summary(uri: &str) -> RequestSummary {
        RequestSummary::from_request(&request(uri))
    }

    #[test]
    fn test_enabled_only_for_clockwork_provider() {
        let debugger = ClockworkDebugger::new(Arc::default());
        debugger.init(&Config::default());
        assert!(!debugger.live_inspection());

        debugger.init(&enabled_config());
        assert!(debugger.live_inspection());

        debugger.init(&Config::from_value(json!({
            "system": {"debugger": {"enabled": true, "provider": "other"}}
        })));
        assert!(!debugger.live_inspection());
    }

    #[test]
    fn test_mistyped_switch_disables() {
        assert!(!is_enabled(&Config::from_value(json!({
            "system": {"debugger": {"enabled": "yes"}}
        }))));
        assert!(!is_enabled(&Config::from_value(json!({
            "system": {"debugger": {"enabled": true, "provider": 7}}
        }))));
        assert!(is_enabled(&enabled_config()));
    }

    #[test]
    fn test_log_request_records_and_stamps_id() {
        let store = Arc::new(ClockworkStore::default());
        let debugger = ClockworkDebugger::new(store.clone());
        debugger.init(&enabled_config());
        debugger.add_message("hello", Severity::Info);

        let response = debugger.log_request(&summary("/blog"), Response::new(Body::empty()));
        assert_eq!(
            response.headers().get(CLOCKWORK_ID_HEADER).unwrap(),
            debugger.id()
        );

        let record = store.latest().unwrap();
        assert_eq!(record.uri, "/blog");
        assert_eq!(record.messages.len(), 1);
    }

    #[test]
    fn test_disabled_does_not_record() {
        let store = Arc::new(ClockworkStore::default());
        let debugger = ClockworkDebugger::new(store.clone());
        debugger.init(&Config::default());

        let response = debugger.log_request(&summary("/blog"), Response::new(Body::empty()));
        assert!(response.headers().get(CLOCKWORK_ID_HEADER).is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_serves_records() {
        let store = Arc::new(ClockworkStore::default());
        let first = ClockworkDebugger::new(store.clone());
        first.init(&enabled_config());
        first.log_request(&summary("/first"), Response::new(Body::empty()));

        let api = ClockworkDebugger::new(store.clone());
        let response = api.debugger_request(&request(&format!("/__clockwork/{}", first.id())));
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), 1 << 16).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["uri"], "/first");

        let latest = api.debugger_request(&request("/__clockwork/latest"));
        assert_eq!(latest.status(), StatusCode::OK);

        let missing = api.debugger_request(&request("/__clockwork/nope"));
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_store_capacity() {
        let store = ClockworkStore::new(2);
        for id in ["a", "b", "c"] {
            store.push(ClockworkRecord {
                id: id.to_string(),
                method: "GET".into(),
                uri: "/".into(),
                time: None,
                status: 200,
                response_duration_ms: None,
                timeline: Vec::new(),
                messages: Vec::new(),
            });
        }
        assert_eq!(store.len(), 2);
        assert!(store.get("a").is_none());
        assert_eq!(store.latest().unwrap().id, "c");
    }
}
