//! 配置树
//!
//! 以点分键（如 `system.log.handler`）访问的配置，底层是一棵 `serde_json::Value`。
//! 加载时先铺内置默认值，再把配置源的内容深度合并上去。

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::error::{ConfigError, ConfigResult};

/// 配置源
///
/// 每次 `load` 都重新读取，返回的根节点必须是映射。
pub trait ConfigSource: Send + Sync {
    fn load(&self) -> ConfigResult<Value>;

    /// 用于日志的来源描述
    fn describe(&self) -> String;
}

/// YAML 文件配置源
#[derive(Debug, Clone)]
pub struct YamlFileSource {
    path: PathBuf,
}

impl YamlFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigSource for YamlFileSource {
    fn load(&self) -> ConfigResult<Value> {
        let content = std::fs::read_to_string(&self.path).map_err(|source| ConfigError::Read {
            path: self.path.clone(),
            source,
        })?;
        parse_yaml(&content)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// 内存配置源（嵌入式场景与测试）
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    value: Value,
}

impl MemorySource {
    pub fn new(value: Value) -> Self {
        Self { value }
    }
}

impl ConfigSource for MemorySource {
    fn load(&self) -> ConfigResult<Value> {
        ensure_mapping(self.value.clone())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

/// 解析 YAML 文本，空文档视为空映射
pub fn parse_yaml(content: &str) -> ConfigResult<Value> {
    if content.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }
    let value: Value = serde_yaml::from_str(content)?;
    ensure_mapping(value)
}

fn ensure_mapping(value: Value) -> ConfigResult<Value> {
    match value {
        Value::Object(_) => Ok(value),
        Value::Null => Ok(Value::Object(Map::new())),
        Value::Bool(_) => Err(ConfigError::NotAMapping("bool")),
        Value::Number(_) => Err(ConfigError::NotAMapping("number")),
        Value::String(_) => Err(ConfigError::NotAMapping("string")),
        Value::Array(_) => Err(ConfigError::NotAMapping("sequence")),
    }
}

/// 内置默认值
fn defaults() -> Value {
    json!({
        "system": {
            "log": {
                "handler": "file",
                "syslog": { "facility": "local6" }
            },
            "cache": { "gzip": false },
            "pages": {
                "redirect_trailing_slash": false,
                "redirect_default_code": 302
            },
            "session": { "initialize": true },
            "debugger": {
                "enabled": false,
                "provider": "clockwork"
            }
        },
        "plugins": {}
    })
}

/// 深度合并：映射递归合并，其他值直接覆盖
fn merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

/// 配置
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    root: Value,
}

impl Default for Config {
    fn default() -> Self {
        Self { root: defaults() }
    }
}

impl Config {
    /// 从配置源加载，合并到默认值之上
    pub fn load(source: &dyn ConfigSource) -> ConfigResult<Self> {
        let loaded = source.load()?;
        Ok(Self::from_value(loaded))
    }

    pub fn from_value(value: Value) -> Self {
        let mut root = defaults();
        merge(&mut root, value);
        Self { root }
    }

    /// 按点分键取原始值
    pub fn get(&self, key: &str) -> Option<&Value> {
        key.split('.')
            .try_fold(&self.root, |node, segment| node.get(segment))
    }

    /// 按点分键取值并反序列化，缺失或 null 返回 `None`
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> ConfigResult<Option<T>> {
        match self.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => T::deserialize(value)
                .map(Some)
                .map_err(|e| ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: e.to_string(),
                }),
        }
    }

    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> ConfigResult<T> {
        Ok(self.get_as(key)?.unwrap_or(default))
    }

    /// 按点分键写入，沿途缺失的节点自动创建
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        let mut node = &mut self.root;
        for segment in key.split('.') {
            if !node.is_object() {
                *node = Value::Object(Map::new());
            }
            let Value::Object(map) = node else {
                unreachable!("node was just replaced with an object");
            };
            node = map.entry(segment.to_string()).or_insert(Value::Null);
        }
        *node = value.into();
    }

    pub fn as_value(&self) -> &Value {
        &self.root
    }
}
