//! 应用日志通道
//!
//! `Logger` 持有一个处理器栈（后进先出），引导阶段可以整体替换当前处理器。
//! 默认处理器 `TracingHandler` 把记录转发为 `tracing` 事件，
//! 由宿主安装的 subscriber 决定最终落地位置。

mod formatter;
mod syslog;

use std::any::Any;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use formatter::{LineFormatter, SYSLOG_LINE_FORMAT};
pub use syslog::{Facility, SyslogHandler, SYSLOG_IDENT};

/// 日志级别（RFC 5424 严重度）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Debug,
    Info,
    Notice,
    Warning,
    Error,
    Critical,
    Alert,
    Emergency,
}

impl Level {
    /// 大写名称（如 `WARNING`）
    pub fn name(&self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Notice => "NOTICE",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
            Level::Critical => "CRITICAL",
            Level::Alert => "ALERT",
            Level::Emergency => "EMERGENCY",
        }
    }

    /// syslog 严重度编码
    pub fn syslog_severity(&self) -> u8 {
        match self {
            Level::Emergency => 0,
            Level::Alert => 1,
            Level::Critical => 2,
            Level::Error => 3,
            Level::Warning => 4,
            Level::Notice => 5,
            Level::Info => 6,
            Level::Debug => 7,
        }
    }
}

/// 日志记录
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub channel: String,
    pub level: Level,
    pub message: String,
    pub context: Map<String, Value>,
    pub extra: Map<String, Value>,
    pub datetime: DateTime<Utc>,
}

impl LogRecord {
    pub fn new(channel: &str, level: Level, message: impl Into<String>) -> Self {
        Self {
            channel: channel.to_string(),
            level,
            message: message.into(),
            context: Map::new(),
            extra: Map::new(),
            datetime: Utc::now(),
        }
    }

    pub fn with_extra(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.extra.insert(key.to_string(), value.into());
        self
    }
}

/// 日志处理器
pub trait LogHandler: Send + Sync + Any {
    /// 处理器名称（如 "tracing", "syslog"）
    fn name(&self) -> &str;

    fn handle(&self, record: &LogRecord);

    /// 转换为 Any，用于向下转型
    fn as_any(&self) -> &dyn Any;
}

/// 默认处理器：转发为 `tracing` 事件
#[derive(Debug, Clone, Default)]
pub struct TracingHandler;

impl LogHandler for TracingHandler {
    fn name(&self) -> &str {
        "tracing"
    }

    fn handle(&self, record: &LogRecord) {
        let extra = Value::Object(record.extra.clone());
        match record.level {
            Level::Debug => {
                tracing::debug!(channel = %record.channel, extra = %extra, "{}", record.message)
            }
            Level::Info | Level::Notice => {
                tracing::info!(channel = %record.channel, extra = %extra, "{}", record.message)
            }
            Level::Warning => {
                tracing::warn!(channel = %record.channel, extra = %extra, "{}", record.message)
            }
            Level::Error | Level::Critical | Level::Alert | Level::Emergency => {
                tracing::error!(channel = %record.channel, extra = %extra, "{}", record.message)
            }
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// 日志通道
pub struct Logger {
    channel: String,
    handlers: RwLock<Vec<Arc<dyn LogHandler>>>,
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<String> = self
            .handlers
            .read()
            .iter()
            .map(|h| h.name().to_string())
            .collect();
        f.debug_struct("Logger")
            .field("channel", &self.channel)
            .field("handlers", &names)
            .finish()
    }
}

impl Logger {
    /// 创建不带处理器的通道
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            handlers: RwLock::new(Vec::new()),
        }
    }

    /// 创建带默认 `TracingHandler` 的通道
    pub fn with_default_handler(channel: impl Into<String>) -> Self {
        let logger = Self::new(channel);
        logger.push_handler(Arc::new(TracingHandler));
        logger
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn push_handler(&self, handler: Arc<dyn LogHandler>) {
        self.handlers.write().push(handler);
    }

    pub fn pop_handler(&self) -> Option<Arc<dyn LogHandler>> {
        self.handlers.write().pop()
    }

    /// 在同一把写锁内弹出栈顶并压入新处理器
    pub fn replace_active(&self, handler: Arc<dyn LogHandler>) -> Option<Arc<dyn LogHandler>> {
        let mut handlers = self.handlers.write();
        let previous = handlers.pop();
        handlers.push(handler);
        previous
    }

    /// 当前栈顶处理器
    pub fn active_handler(&self) -> Option<Arc<dyn LogHandler>> {
        self.handlers.read().last().cloned()
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.read().len()
    }

    pub fn log_record(&self, record: &LogRecord) {
        let handlers = self.handlers.read().clone();
        for handler in handlers.iter().rev() {
            handler.handle(record);
        }
    }

    pub fn log(&self, level: Level, message: impl Into<String>) {
        self.log_record(&LogRecord::new(&self.channel, level, message));
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(Level::Info, message);
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.log(Level::Warning, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.log(Level::Error, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct CaptureHandler {
        lines: Mutex<Vec<String>>,
    }

    impl LogHandler for CaptureHandler {
        fn name(&self) -> &str {
            "capture"
        }

        fn handle(&self, record: &LogRecord) {
            self.lines
                .lock()
                .push(format!("{} {}", record.level.name(), record.message));
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn test_default_handler_installed() {
        let logger = Logger::with_default_handler("preflight");
        assert_eq!(logger.handler_count(), 1);
        assert_eq!(logger.active_handler().unwrap().name(), "tracing");
    }

    #[test]
    fn test_push_pop() {
        let logger = Logger::with_default_handler("preflight");
        let capture = Arc::new(CaptureHandler::default());
        logger.push_handler(capture.clone());
        logger.warning("disk almost full");

        assert_eq!(capture.lines.lock().as_slice(), ["WARNING disk almost full"]);
        assert_eq!(logger.pop_handler().unwrap().name(), "capture");
        assert_eq!(logger.active_handler().unwrap().name(), "tracing");
    }

    #[test]
    fn test_replace_active() {
        let logger = Logger::with_default_handler("preflight");
        let previous = logger.replace_active(Arc::new(CaptureHandler::default()));
        assert_eq!(previous.unwrap().name(), "tracing");
        assert_eq!(logger.handler_count(), 1);

        let active = logger.active_handler().unwrap();
        assert!(active.as_any().downcast_ref::<CaptureHandler>().is_some());
    }

    #[test]
    fn test_level_codes() {
        assert_eq!(Level::Error.syslog_severity(), 3);
        assert_eq!(Level::Debug.syslog_severity(), 7);
        assert_eq!(Level::Notice.name(), "NOTICE");
        assert!(Level::Critical > Level::Warning);
    }
}
