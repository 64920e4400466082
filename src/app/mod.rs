//! 应用装配
//!
//! 把插件、页面、会话、调试器接到引导管道上，再用 `BootstrapLayer` 包住路由。

mod routes;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::middleware;
use axum::routing::get;
use axum::Router;
use preflight_core::{ConfigSource, Request};
use preflight_processor::{RuntimeContext, Services, Session};
use preflight_server::{BootstrapLayer, ContextFactory, ServerConfig};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::timeout::TimeoutLayer;

use crate::debugger::{ClockworkDebugger, ClockworkStore};
use crate::pages::{Page, StaticPages};
use crate::plugins::{builtin_plugins, StaticPluginRegistry};
use crate::session::{CookieSession, MemorySessionStore, SessionId};

/// 进程级应用状态
#[derive(Clone)]
pub struct App {
    pub services: Services,
    pub plugins: Arc<StaticPluginRegistry>,
    pub pages: Arc<StaticPages>,
    pub sessions: Arc<MemorySessionStore>,
    pub clockwork: Arc<ClockworkStore>,
    request_timeout: std::time::Duration,
}

impl App {
    pub fn new(config_source: Arc<dyn ConfigSource>, server: &ServerConfig) -> Self {
        let plugins = Arc::new(StaticPluginRegistry::new(builtin_plugins()));
        let pages = Arc::new(StaticPages::new(default_pages(), plugins.clone()));

        let services = Services::new(config_source)
            .with_plugins(plugins.clone())
            .with_pages(pages.clone())
            .with_output_limit(server.max_body_size);

        Self {
            services,
            plugins,
            pages,
            sessions: Arc::new(MemorySessionStore::new()),
            clockwork: Arc::new(ClockworkStore::default()),
            request_timeout: server.request_timeout(),
        }
    }

    /// 每个请求：新的调试器实例，按 cookie 绑定会话
    pub fn context_factory(&self) -> ContextFactory {
        let services = self.services.clone();
        let sessions = self.sessions.clone();
        let clockwork = self.clockwork.clone();

        Arc::new(move |request: &Request| {
            let session = request.extensions().get::<SessionId>().map(|id| {
                Arc::new(CookieSession::new(sessions.clone(), id.clone())) as Arc<dyn Session>
            });

            let mut ctx = RuntimeContext::new(&services).with_session(session);
            ctx.debugger = Arc::new(ClockworkDebugger::new(clockwork.clone()));
            ctx
        })
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/", get(routes::home))
            .fallback(routes::page)
            .with_state(self.pages.clone())
            .layer(BootstrapLayer::with_factory(self.context_factory()))
            .layer(middleware::from_fn(routes::session_cookie))
            .layer(DefaultBodyLimit::max(self.services.output_limit))
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                self.request_timeout,
            ))
            .layer(CatchPanicLayer::new())
    }
}

fn default_pages() -> Vec<Page> {
    vec![Page::new("/about", "About", "A site bootstrapped per request")]
}
