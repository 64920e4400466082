//! 配置错误类型

use std::path::PathBuf;

use thiserror::Error;

/// 配置加载与取值错误
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("读取配置文件失败 {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML 解析失败: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("配置根节点必须是映射，实际为 {0}")]
    NotAMapping(&'static str),

    #[error("配置项 {key} 无效: {message}")]
    InvalidValue { key: String, message: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;
