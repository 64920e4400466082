//! 运行时上下文
//!
//! `Services` 是进程级共享的协作方集合（克隆代价低，全部是 `Arc`）；
//! `RuntimeContext` 每个请求新建一份，计时、消息、路由状态、会话句柄都是请求本地的。
//!
//! 各阶段读写的字段：
//! - 配置初始化：写 `config` / `settings`
//! - 日志初始化：读 `settings`，替换 `logger` 的处理器
//! - 核心初始化：写 `output`，通过 `environment` 修改进程设置
//! - 页面注册：写 `uri`
//! - 调试器：写 `live_inspection`

use std::sync::Arc;

use preflight_core::{
    Config, ConfigSource, Logger, Messages, OutputBuffer, ProcessEnvironment, SystemEnvironment,
    SystemSettings, TimerRecorder, DEFAULT_BUFFER_LIMIT,
};

use crate::collaborators::{
    Debugger, EmptyPageRegistry, EmptyPluginRegistry, ErrorHandlers, NullDebugger, PageRegistry,
    PanicHookHandlers, PluginRegistry, Session,
};
use crate::uri::UriState;

/// 日志通道名称
pub const LOG_CHANNEL: &str = "preflight";

/// 进程级协作方
#[derive(Clone)]
pub struct Services {
    pub config_source: Arc<dyn ConfigSource>,
    pub logger: Arc<Logger>,
    pub errors: Arc<dyn ErrorHandlers>,
    pub debugger: Arc<dyn Debugger>,
    pub environment: Arc<dyn ProcessEnvironment>,
    pub plugins: Arc<dyn PluginRegistry>,
    pub pages: Arc<dyn PageRegistry>,
    /// 输出缓冲上限（字节）
    pub output_limit: usize,
}

impl Services {
    /// 使用默认协作方创建：tracing 日志、panic hook、空调试器、空插件、空页面
    pub fn new(config_source: Arc<dyn ConfigSource>) -> Self {
        let logger = Arc::new(Logger::with_default_handler(LOG_CHANNEL));
        Self {
            config_source,
            errors: Arc::new(PanicHookHandlers::new(logger.clone())),
            logger,
            debugger: Arc::new(NullDebugger),
            environment: Arc::new(SystemEnvironment),
            plugins: Arc::new(EmptyPluginRegistry),
            pages: Arc::new(EmptyPageRegistry),
            output_limit: DEFAULT_BUFFER_LIMIT,
        }
    }

    pub fn with_logger(mut self, logger: Arc<Logger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_errors(mut self, errors: Arc<dyn ErrorHandlers>) -> Self {
        self.errors = errors;
        self
    }

    pub fn with_debugger(mut self, debugger: Arc<dyn Debugger>) -> Self {
        self.debugger = debugger;
        self
    }

    pub fn with_environment(mut self, environment: Arc<dyn ProcessEnvironment>) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_plugins(mut self, plugins: Arc<dyn PluginRegistry>) -> Self {
        self.plugins = plugins;
        self
    }

    pub fn with_pages(mut self, pages: Arc<dyn PageRegistry>) -> Self {
        self.pages = pages;
        self
    }

    pub fn with_output_limit(mut self, limit: usize) -> Self {
        self.output_limit = limit;
        self
    }
}

/// 单个请求的运行时上下文
pub struct RuntimeContext {
    pub config_source: Arc<dyn ConfigSource>,
    pub config: Config,
    pub settings: SystemSettings,
    pub logger: Arc<Logger>,
    pub errors: Arc<dyn ErrorHandlers>,
    pub debugger: Arc<dyn Debugger>,
    pub environment: Arc<dyn ProcessEnvironment>,
    pub plugins: Arc<dyn PluginRegistry>,
    pub pages: Arc<dyn PageRegistry>,
    pub session: Option<Arc<dyn Session>>,
    pub uri: UriState,
    pub messages: Messages,
    pub timers: TimerRecorder,
    pub output: OutputBuffer,
    pub output_limit: usize,
    /// 调试器实时检查是否对本请求生效
    pub live_inspection: bool,
}

impl RuntimeContext {
    pub fn new(services: &Services) -> Self {
        Self {
            config_source: services.config_source.clone(),
            config: Config::default(),
            settings: SystemSettings::default(),
            logger: services.logger.clone(),
            errors: services.errors.clone(),
            debugger: services.debugger.clone(),
            environment: services.environment.clone(),
            plugins: services.plugins.clone(),
            pages: services.pages.clone(),
            session: None,
            uri: UriState::default(),
            messages: Messages::new(),
            timers: TimerRecorder::new(),
            output: OutputBuffer::plain(services.output_limit),
            output_limit: services.output_limit,
            live_inspection: false,
        }
    }

    pub fn with_session(mut self, session: Option<Arc<dyn Session>>) -> Self {
        self.session = session;
        self
    }
}
