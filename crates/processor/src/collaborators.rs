//! 外部协作方接口
//!
//! 引导管道只通过这些 trait 调用插件系统、页面树、会话存储、调试器和错误处理器。
//! 所有实现都必须是 `Send + Sync`，在进程内通过 `Arc` 共享。

use std::sync::{Arc, Once};
use std::time::{Duration, Instant};

use preflight_core::{Config, Logger, Request, RequestSummary, Response, Severity};

use crate::error::{PageError, PluginError, SessionError};

/// 插件注册表
pub trait PluginRegistry: Send + Sync {
    /// 准备插件清单，不执行插件代码
    fn setup(&self, config: &Config) -> Result<(), PluginError>;

    /// 按依赖顺序加载并启动插件
    fn init(&self) -> Result<(), PluginError>;
}

/// 页面注册表
pub trait PageRegistry: Send + Sync {
    /// 注册页面树（可以延迟解析内容）
    fn register(&self) -> Result<(), PageError>;
}

/// 会话能力
pub trait Session: Send + Sync {
    fn init(&self) -> Result<(), SessionError>;
}

/// 错误处理器
pub trait ErrorHandlers: Send + Sync {
    /// 恢复到基线处理器，替换上一个请求可能遗留的处理器
    fn reset_handlers(&self);
}

/// 一次性能剖析的范围
#[derive(Debug, Clone)]
pub struct ProfileScope {
    pub label: String,
    pub started: Instant,
}

impl ProfileScope {
    pub fn begin(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            started: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// 调试器
pub trait Debugger: Send + Sync {
    fn init(&self, config: &Config);

    /// 是否启用实时检查集成（clockwork）
    fn live_inspection(&self) -> bool;

    /// 处理调试器自己的 API 请求
    fn debugger_request(&self, request: &Request) -> Response;

    fn add_message(&self, message: &str, severity: Severity);

    fn begin_profile(&self) -> ProfileScope {
        ProfileScope::begin("downstream")
    }

    fn end_profile(&self, _scope: ProfileScope) {}

    /// 记录请求与响应，返回（可能附加了信息的）响应
    fn log_request(&self, request: &RequestSummary, response: Response) -> Response;
}

/// 不做任何事情的调试器
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDebugger;

impl Debugger for NullDebugger {
    fn init(&self, _config: &Config) {}

    fn live_inspection(&self) -> bool {
        false
    }

    fn debugger_request(&self, _request: &Request) -> Response {
        let mut response = Response::default();
        *response.status_mut() = axum::http::StatusCode::NOT_FOUND;
        response
    }

    fn add_message(&self, message: &str, severity: Severity) {
        tracing::debug!("[Debugger] {}: {}", severity.as_str(), message);
    }

    fn log_request(&self, _request: &RequestSummary, response: Response) -> Response {
        response
    }
}

/// 没有插件
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyPluginRegistry;

impl PluginRegistry for EmptyPluginRegistry {
    fn setup(&self, _config: &Config) -> Result<(), PluginError> {
        Ok(())
    }

    fn init(&self) -> Result<(), PluginError> {
        Ok(())
    }
}

/// 没有页面
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyPageRegistry;

impl PageRegistry for EmptyPageRegistry {
    fn register(&self) -> Result<(), PageError> {
        Ok(())
    }
}

/// 基线错误处理器：安装 panic hook，把 panic 写入应用日志通道
///
/// hook 只安装一次，之前的 hook 会被保留并在记录日志后调用，
/// 所以每个请求调用 `reset_handlers` 不会层层嵌套。
pub struct PanicHookHandlers {
    logger: Arc<Logger>,
    installed: Once,
}

impl PanicHookHandlers {
    pub fn new(logger: Arc<Logger>) -> Self {
        Self {
            logger,
            installed: Once::new(),
        }
    }
}

impl ErrorHandlers for PanicHookHandlers {
    fn reset_handlers(&self) {
        self.installed.call_once(|| {
            let logger = self.logger.clone();
            let previous = std::panic::take_hook();
            std::panic::set_hook(Box::new(move |info| {
                let location = info
                    .location()
                    .map(|l| format!("{}:{}", l.file(), l.line()))
                    .unwrap_or_else(|| "unknown".to_string());
                let payload = info
                    .payload()
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| info.payload().downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "non-string panic payload".to_string());
                logger.error(format!("panic at {}: {}", location, payload));
                previous(info);
            }));
            tracing::debug!("[Errors] panic hook 已安装");
        });
    }
}
