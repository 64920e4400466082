//! Preflight Core Crate
//!
//! 请求引导管道的基础类型：配置、日志通道、诊断计时、消息、进程环境、输出缓冲。
//! 阶段编排逻辑在 `preflight-processor` crate 中。

pub mod config;
pub mod diagnostics;
pub mod environment;
pub mod error;
pub mod http;
pub mod logging;
pub mod output;
pub mod settings;

pub use config::{Config, ConfigSource, MemorySource, YamlFileSource};
pub use diagnostics::{Message, Messages, PhaseRecord, Severity, TimerRecorder};
pub use environment::{clock, parse_timezone, ProcessEnvironment, SystemEnvironment};
pub use error::{ConfigError, ConfigResult};
pub use http::{redirect_response, Body, Request, RequestStartTime, RequestSummary, Response};
pub use logging::{
    Facility, Level, LineFormatter, LogHandler, LogRecord, Logger, SyslogHandler, TracingHandler,
    SYSLOG_IDENT, SYSLOG_LINE_FORMAT,
};
pub use output::{accepts_gzip, OutputBuffer, OutputEncoding, DEFAULT_BUFFER_LIMIT};
pub use settings::{keys, LogHandlerKind, SystemSettings};
