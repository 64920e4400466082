//! 插件注册表
//!
//! 插件在编译期注册，通过 `plugins.<name>.enabled` 启用。
//! `setup` 只根据配置计算启动顺序（依赖在前），`init` 才执行插件代码。
//! 每个插件在进程内只启动一次。

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use preflight_core::Config;
use preflight_processor::{PluginError, PluginRegistry};

use crate::pages::Page;

/// 插件接口
pub trait Plugin: Send + Sync {
    /// 插件名称，对应配置键 `plugins.<name>`
    fn name(&self) -> &str;

    /// 依赖的插件名称
    fn dependencies(&self) -> Vec<String> {
        Vec::new()
    }

    /// 启动插件
    fn boot(&self, config: &Config) -> anyhow::Result<()>;

    /// 插件提供的页面
    fn pages(&self) -> Vec<Page> {
        Vec::new()
    }
}

#[derive(Default)]
struct RegistryState {
    config: Config,
    /// 已启用插件的启动顺序
    manifest: Vec<Arc<dyn Plugin>>,
    booted: HashSet<String>,
}

/// 静态插件注册表
pub struct StaticPluginRegistry {
    available: Vec<Arc<dyn Plugin>>,
    state: RwLock<RegistryState>,
    /// 每启动一个插件加一，页面索引据此判断是否需要重建
    generation: AtomicU64,
}

impl StaticPluginRegistry {
    pub fn new(available: Vec<Arc<dyn Plugin>>) -> Self {
        Self {
            available,
            state: RwLock::new(RegistryState::default()),
            generation: AtomicU64::new(0),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// 当前启动顺序中的插件名称
    pub fn manifest(&self) -> Vec<String> {
        self.state
            .read()
            .manifest
            .iter()
            .map(|p| p.name().to_string())
            .collect()
    }

    pub fn is_booted(&self, name: &str) -> bool {
        self.state.read().booted.contains(name)
    }

    /// 已启动插件提供的页面
    pub fn pages(&self) -> Vec<Page> {
        let state = self.state.read();
        state
            .manifest
            .iter()
            .filter(|p| state.booted.contains(p.name()))
            .flat_map(|p| p.pages())
            .collect()
    }

    fn enabled(&self, config: &Config) -> Result<Vec<Arc<dyn Plugin>>, PluginError> {
        let mut enabled = Vec::new();
        for plugin in &self.available {
            let key = format!("plugins.{}.enabled", plugin.name());
            let on: bool = config
                .get_or(&key, false)
                .map_err(|e| PluginError::Manifest(e.to_string()))?;
            if on {
                enabled.push(plugin.clone());
            }
        }
        Ok(enabled)
    }
}

/// 按依赖排序，依赖在前；同层保持注册顺序
fn resolve_order(plugins: &[Arc<dyn Plugin>]) -> Result<Vec<Arc<dyn Plugin>>, PluginError> {
    let by_name: HashMap<&str, &Arc<dyn Plugin>> =
        plugins.iter().map(|p| (p.name(), p)).collect();

    for plugin in plugins {
        for dependency in plugin.dependencies() {
            if !by_name.contains_key(dependency.as_str()) {
                return Err(PluginError::MissingDependency {
                    plugin: plugin.name().to_string(),
                    dependency,
                });
            }
        }
    }

    let mut ordered: Vec<Arc<dyn Plugin>> = Vec::with_capacity(plugins.len());
    let mut done: HashSet<String> = HashSet::new();
    let mut visiting: Vec<String> = Vec::new();

    fn visit(
        plugin: &Arc<dyn Plugin>,
        by_name: &HashMap<&str, &Arc<dyn Plugin>>,
        done: &mut HashSet<String>,
        visiting: &mut Vec<String>,
        ordered: &mut Vec<Arc<dyn Plugin>>,
    ) -> Result<(), PluginError> {
        let name = plugin.name().to_string();
        if done.contains(&name) {
            return Ok(());
        }
        if let Some(start) = visiting.iter().position(|n| *n == name) {
            let mut cycle = visiting[start..].to_vec();
            cycle.push(name);
            return Err(PluginError::DependencyCycle(cycle.join(" -> ")));
        }

        visiting.push(name.clone());
        for dependency in plugin.dependencies() {
            if let Some(dep) = by_name.get(dependency.as_str()) {
                visit(dep, by_name, done, visiting, ordered)?;
            }
        }
        visiting.pop();

        done.insert(name);
        ordered.push(plugin.clone());
        Ok(())
    }

    for plugin in plugins {
        visit(plugin, &by_name, &mut done, &mut visiting, &mut ordered)?;
    }
    Ok(ordered)
}

impl PluginRegistry for StaticPluginRegistry {
    fn setup(&self, config: &Config) -> Result<(), PluginError> {
        let manifest = resolve_order(&self.enabled(config)?)?;
        let mut state = self.state.write();
        state.config = config.clone();
        state.manifest = manifest;
        Ok(())
    }

    fn init(&self) -> Result<(), PluginError> {
        let mut state = self.state.write();
        let pending: Vec<Arc<dyn Plugin>> = state
            .manifest
            .iter()
            .filter(|p| !state.booted.contains(p.name()))
            .cloned()
            .collect();

        for plugin in pending {
            plugin
                .boot(&state.config)
                .map_err(|e| PluginError::Boot {
                    plugin: plugin.name().to_string(),
                    message: e.to_string(),
                })?;
            tracing::info!("[Plugins] 插件已启动: {}", plugin.name());
            state.booted.insert(plugin.name().to_string());
            self.generation.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

/// 博客插件：提供 `/blog`
pub struct BlogPlugin;

impl Plugin for BlogPlugin {
    fn name(&self) -> &str {
        "blog"
    }

    fn boot(&self, _config: &Config) -> anyhow::Result<()> {
        Ok(())
    }

    fn pages(&self) -> Vec<Page> {
        vec![Page::new("/blog", "Blog", "Latest posts")]
    }
}

/// 归档插件：依赖博客插件，提供 `/blog/archive`
pub struct ArchivePlugin;

impl Plugin for ArchivePlugin {
    fn name(&self) -> &str {
        "archive"
    }

    fn dependencies(&self) -> Vec<String> {
        vec!["blog".to_string()]
    }

    fn boot(&self, config: &Config) -> anyhow::Result<()> {
        let per_page: u64 = config.get_or("plugins.archive.per_page", 20)?;
        anyhow::ensure!(per_page > 0, "per_page 必须大于 0");
        Ok(())
    }

    fn pages(&self) -> Vec<Page> {
        vec![Page::new("/blog/archive", "Archive", "All posts by month")]
    }
}

/// 内置插件
pub fn builtin_plugins() -> Vec<Arc<dyn Plugin>> {
    vec![Arc::new(BlogPlugin), Arc::new(ArchivePlugin)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Named {
        name: &'static str,
        deps: Vec<&'static str>,
    }

    impl Plugin for Named {
        fn name(&self) -> &str {
            self.name
        }

        fn dependencies(&self) -> Vec<String> {
            self.deps.iter().map(|d| d.to_string()).collect()
        }

        fn boot(&self, _config: &Config) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn named(name: &'static str, deps: Vec<&'static str>) -> Arc<dyn Plugin> {
        Arc::new(Named { name, deps })
    }

    fn enable_all(names: &[&str]) -> Config {
        let mut config = Config::default();
        for name in names {
            config.set(&format!("plugins.{}.enabled", name), json!(true));
        }
        config
    }

    #[test]
    fn test_dependencies_boot_first() {
        let registry = StaticPluginRegistry::new(vec![
            named("c", vec!["b"]),
            named("b", vec!["a"]),
            named("a", vec![]),
        ]);
        registry.setup(&enable_all(&["a", "b", "c"])).unwrap();
        assert_eq!(registry.manifest(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_disabled_plugins_skipped() {
        let registry = StaticPluginRegistry::new(builtin_plugins());
        registry.setup(&enable_all(&["blog"])).unwrap();
        registry.init().unwrap();

        assert_eq!(registry.manifest(), vec!["blog"]);
        assert!(registry.is_booted("blog"));
        assert!(!registry.is_booted("archive"));
    }

    #[test]
    fn test_missing_dependency() {
        let registry = StaticPluginRegistry::new(builtin_plugins());
        let result = registry.setup(&enable_all(&["archive"]));
        match result {
            Err(PluginError::MissingDependency { plugin, dependency }) => {
                assert_eq!(plugin, "archive");
                assert_eq!(dependency, "blog");
            }
            other => panic!("应该缺少依赖, 实际: {:?}", other),
        }
    }

    #[test]
    fn test_dependency_cycle() {
        let registry =
            StaticPluginRegistry::new(vec![named("a", vec!["b"]), named("b", vec!["a"])]);
        match registry.setup(&enable_all(&["a", "b"])) {
            Err(PluginError::DependencyCycle(path)) => assert_eq!(path, "a -> b -> a"),
            other => panic!("应该检测到循环, 实际: {:?}", other),
        }
    }

    #[test]
    fn test_boots_once() {
        let registry = StaticPluginRegistry::new(builtin_plugins());
        let config = enable_all(&["blog", "archive"]);

        registry.setup(&config).unwrap();
        registry.init().unwrap();
        assert_eq!(registry.generation(), 2);

        registry.setup(&config).unwrap();
        registry.init().unwrap();
        assert_eq!(registry.generation(), 2);
        assert_eq!(registry.pages().len(), 2);
    }

    #[test]
    fn test_boot_failure() {
        let registry = StaticPluginRegistry::new(builtin_plugins());
        let mut config = enable_all(&["blog", "archive"]);
        config.set("plugins.archive.per_page", json!(0));

        registry.setup(&config).unwrap();
        match registry.init() {
            Err(PluginError::Boot { plugin, .. }) => assert_eq!(plugin, "archive"),
            other => panic!("应该启动失败, 实际: {:?}", other),
        }
        assert!(registry.is_booted("blog"));
    }
}
