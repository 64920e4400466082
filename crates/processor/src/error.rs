//! 引导错误类型
//!
//! 致命错误一律向上传播，由外层（HTTP 传输层）生成通用错误响应。
//! 会话损坏（`SessionError::Corruption`）是唯一可自愈的错误。

use preflight_core::ConfigError;
use thiserror::Error;

/// 插件错误
#[derive(Error, Debug)]
pub enum PluginError {
    #[error("插件依赖缺失: {plugin} 依赖 {dependency}")]
    MissingDependency { plugin: String, dependency: String },

    #[error("插件依赖存在循环: {0}")]
    DependencyCycle(String),

    #[error("插件初始化失败 {plugin}: {message}")]
    Boot { plugin: String, message: String },

    #[error("插件清单无效: {0}")]
    Manifest(String),
}

/// 页面注册错误
#[derive(Error, Debug)]
pub enum PageError {
    #[error("页面注册失败: {0}")]
    Register(String),
}

/// 会话错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("会话数据损坏: {0}")]
    Corruption(String),

    #[error("会话初始化失败: {0}")]
    Other(String),
}

impl SessionError {
    pub fn is_corruption(&self) -> bool {
        matches!(self, SessionError::Corruption(_))
    }
}

/// 引导管道致命错误
#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Plugin(#[from] PluginError),

    #[error(transparent)]
    Page(#[from] PageError),

    #[error(transparent)]
    Session(#[from] SessionError),
}
