//! 测试用协作方
//!
//! 每个 mock 都记录调用次数，失败行为通过方法开关注入。

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::HeaderValue;
use chrono_tz::Tz;
use parking_lot::Mutex;
use preflight_core::{
    Body, Config, MemorySource, ProcessEnvironment, Request, RequestStartTime, RequestSummary,
    Response, Severity,
};
use serde_json::Value;

use crate::collaborators::{Debugger, ErrorHandlers, PageRegistry, PluginRegistry, Session};
use crate::context::{RuntimeContext, Services};
use crate::delegate::Delegate;
use crate::error::{PageError, PluginError, SessionError};

pub fn request(uri: &str) -> Request {
    let mut request = Request::new(Body::empty());
    *request.uri_mut() = uri.parse().expect("测试 URI 无效");
    request
}

#[derive(Default)]
pub struct MockPlugins {
    setup: AtomicUsize,
    init: AtomicUsize,
    fail_init: AtomicBool,
}

impl MockPlugins {
    pub fn setup_calls(&self) -> usize {
        self.setup.load(Ordering::SeqCst)
    }

    pub fn init_calls(&self) -> usize {
        self.init.load(Ordering::SeqCst)
    }

    pub fn fail_init(&self) {
        self.fail_init.store(true, Ordering::SeqCst);
    }
}

impl PluginRegistry for MockPlugins {
    fn setup(&self, _config: &Config) -> Result<(), PluginError> {
        self.setup.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn init(&self) -> Result<(), PluginError> {
        self.init.fetch_add(1, Ordering::SeqCst);
        if self.fail_init.load(Ordering::SeqCst) {
            return Err(PluginError::Boot {
                plugin: "broken".into(),
                message: "boom".into(),
            });
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MockPages {
    register: AtomicUsize,
    fail: AtomicBool,
}

impl MockPages {
    pub fn register_calls(&self) -> usize {
        self.register.load(Ordering::SeqCst)
    }

    pub fn fail_register(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }
}

impl PageRegistry for MockPages {
    fn register(&self) -> Result<(), PageError> {
        self.register.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(PageError::Register("pages missing".into()));
        }
        Ok(())
    }
}

/// 按脚本依次返回结果，脚本耗尽后返回成功
#[derive(Default)]
pub struct ScriptedSession {
    script: Mutex<VecDeque<Result<(), SessionError>>>,
    calls: AtomicUsize,
}

impl ScriptedSession {
    pub fn new(script: Vec<Result<(), SessionError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Session for ScriptedSession {
    fn init(&self) -> Result<(), SessionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script.lock().pop_front().unwrap_or(Ok(()))
    }
}

#[derive(Default)]
pub struct MockDebugger {
    live: AtomicBool,
    init: AtomicUsize,
    intercepted: AtomicUsize,
    profiles: AtomicUsize,
    messages: Mutex<Vec<(String, Severity)>>,
    logged: Mutex<Vec<RequestSummary>>,
}

impl MockDebugger {
    pub fn set_live(&self, live: bool) {
        self.live.store(live, Ordering::SeqCst);
    }

    pub fn init_calls(&self) -> usize {
        self.init.load(Ordering::SeqCst)
    }

    pub fn intercepted(&self) -> usize {
        self.intercepted.load(Ordering::SeqCst)
    }

    pub fn profiles(&self) -> usize {
        self.profiles.load(Ordering::SeqCst)
    }

    pub fn messages(&self) -> Vec<(String, Severity)> {
        self.messages.lock().clone()
    }

    pub fn logged(&self) -> Vec<RequestSummary> {
        self.logged.lock().clone()
    }
}

impl Debugger for MockDebugger {
    fn init(&self, _config: &Config) {
        self.init.fetch_add(1, Ordering::SeqCst);
    }

    fn live_inspection(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    fn debugger_request(&self, _request: &Request) -> Response {
        self.intercepted.fetch_add(1, Ordering::SeqCst);
        let mut response = Response::new(Body::from("{}"));
        response
            .headers_mut()
            .insert("x-debugger", HeaderValue::from_static("intercepted"));
        response
    }

    fn add_message(&self, message: &str, severity: Severity) {
        self.messages.lock().push((message.to_string(), severity));
    }

    fn end_profile(&self, _scope: crate::collaborators::ProfileScope) {
        self.profiles.fetch_add(1, Ordering::SeqCst);
    }

    fn log_request(&self, request: &RequestSummary, mut response: Response) -> Response {
        self.logged.lock().push(request.clone());
        response
            .headers_mut()
            .insert("x-debugger-logged", HeaderValue::from_static("1"));
        response
    }
}

#[derive(Default)]
pub struct RecordingEnvironment {
    timezone: Mutex<Option<Tz>>,
    locale: Mutex<Option<String>>,
}

impl RecordingEnvironment {
    pub fn timezone(&self) -> Option<Tz> {
        *self.timezone.lock()
    }

    pub fn locale(&self) -> Option<String> {
        self.locale.lock().clone()
    }
}

impl ProcessEnvironment for RecordingEnvironment {
    fn set_timezone(&self, timezone: Tz) {
        *self.timezone.lock() = Some(timezone);
    }

    fn set_locale(&self, locale: &str) {
        *self.locale.lock() = Some(locale.to_string());
    }
}

#[derive(Default)]
pub struct CountingErrors {
    resets: AtomicUsize,
}

impl CountingErrors {
    pub fn resets(&self) -> usize {
        self.resets.load(Ordering::SeqCst)
    }
}

impl ErrorHandlers for CountingErrors {
    fn reset_handlers(&self) {
        self.resets.fetch_add(1, Ordering::SeqCst);
    }
}

/// 下游处理器：记录调用次数和收到请求时的开始时间
pub struct CountingDelegate {
    calls: AtomicUsize,
    start_time: Mutex<Option<RequestStartTime>>,
    body: &'static str,
}

impl CountingDelegate {
    pub fn new(body: &'static str) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            start_time: Mutex::new(None),
            body,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn start_time(&self) -> Option<RequestStartTime> {
        *self.start_time.lock()
    }
}

#[async_trait]
impl Delegate for CountingDelegate {
    async fn handle(&self, request: Request) -> Response {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.start_time.lock() = request.extensions().get::<RequestStartTime>().copied();
        Response::new(Body::from(self.body))
    }
}

/// 由 mock 协作方组装的测试环境
pub struct Harness {
    pub services: Services,
    pub plugins: Arc<MockPlugins>,
    pub pages: Arc<MockPages>,
    pub debugger: Arc<MockDebugger>,
    pub environment: Arc<RecordingEnvironment>,
    pub errors: Arc<CountingErrors>,
    session: Option<Arc<ScriptedSession>>,
}

impl Harness {
    pub fn new(config: Value) -> Self {
        let plugins = Arc::new(MockPlugins::default());
        let pages = Arc::new(MockPages::default());
        let debugger = Arc::new(MockDebugger::default());
        let environment = Arc::new(RecordingEnvironment::default());
        let errors = Arc::new(CountingErrors::default());

        let services = Services::new(Arc::new(MemorySource::new(config)))
            .with_plugins(plugins.clone())
            .with_pages(pages.clone())
            .with_debugger(debugger.clone())
            .with_environment(environment.clone())
            .with_errors(errors.clone());

        Self {
            services,
            plugins,
            pages,
            debugger,
            environment,
            errors,
            session: None,
        }
    }

    pub fn with_session(mut self, script: Vec<Result<(), SessionError>>) -> Self {
        self.session = Some(Arc::new(ScriptedSession::new(script)));
        self
    }

    pub fn session(&self) -> &ScriptedSession {
        self.session.as_deref().expect("未注册会话")
    }

    pub fn context(&self) -> RuntimeContext {
        let session = self
            .session
            .clone()
            .map(|session| session as Arc<dyn Session>);
        RuntimeContext::new(&self.services).with_session(session)
    }
}
