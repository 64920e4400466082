//! 页面树
//!
//! `register` 在每个请求上调用，但索引只在插件集合变化后才重建。

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use preflight_processor::{PageError, PageRegistry};
use serde::Serialize;

use crate::plugins::StaticPluginRegistry;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page {
    pub route: String,
    pub title: String,
    pub body: String,
}

impl Page {
    pub fn new(route: &str, title: &str, body: &str) -> Self {
        Self {
            route: route.to_string(),
            title: title.to_string(),
            body: body.to_string(),
        }
    }
}

struct PageIndex {
    generation: u64,
    routes: HashMap<String, Page>,
}

pub struct StaticPages {
    base: Vec<Page>,
    plugins: Arc<StaticPluginRegistry>,
    index: RwLock<Option<PageIndex>>,
}

impl StaticPages {
    pub fn new(base: Vec<Page>, plugins: Arc<StaticPluginRegistry>) -> Self {
        Self {
            base,
            plugins,
            index: RwLock::new(None),
        }
    }

    pub fn lookup(&self, route: &str) -> Option<Page> {
        self.index
            .read()
            .as_ref()
            .and_then(|index| index.routes.get(route).cloned())
    }

    pub fn routes(&self) -> Vec<String> {
        let mut routes: Vec<String> = self
            .index
            .read()
            .as_ref()
            .map(|index| index.routes.keys().cloned().collect())
            .unwrap_or_default();
        routes.sort();
        routes
    }
}

impl PageRegistry for StaticPages {
    fn register(&self) -> Result<(), PageError> {
        let generation = self.plugins.generation();
        if let Some(index) = self.index.read().as_ref() {
            if index.generation == generation {
                return Ok(());
            }
        }

        let mut routes = HashMap::new();
        for page in self.base.iter().cloned().chain(self.plugins.pages()) {
            if !page.route.starts_with('/') {
                return Err(PageError::Register(format!(
                    "页面路由必须以 / 开头: {}",
                    page.route
                )));
            }
            // 插件页面可以覆盖同名基础页面
            routes.insert(page.route.clone(), page);
        }

        tracing::debug!("[Pages] 页面索引已重建: {} 个路由", routes.len());
        *self.index.write() = Some(PageIndex { generation, routes });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::builtin_plugins;
    use preflight_core::Config;
    use preflight_processor::PluginRegistry;
    use serde_json::json;

    fn registry(enabled: &[&str]) -> Arc<StaticPluginRegistry> {
        let registry = Arc::new(StaticPluginRegistry::new(builtin_plugins()));
        let mut config = Config::default();
        for name in enabled {
            config.set(&format!("plugins.{}.enabled", name), json!(true));
        }
        registry.setup(&config).unwrap();
        registry.init().unwrap();
        registry
    }

    #[test]
    fn test_lookup_before_register() {
        let pages = StaticPages::new(vec![Page::new("/about", "About", "")], registry(&[]));
        assert_eq!(pages.lookup("/about"), None);

        pages.register().unwrap();
        assert_eq!(pages.lookup("/about").unwrap().title, "About");
    }

    #[test]
    fn test_includes_plugin_pages() {
        let pages = StaticPages::new(
            vec![Page::new("/about", "About", "")],
            registry(&["blog", "archive"]),
        );
        pages.register().unwrap();
        assert_eq!(pages.routes(), vec!["/about", "/blog", "/blog/archive"]);
    }

    #[test]
    fn test_rebuilds_after_new_plugin() {
        let plugins = Arc::new(StaticPluginRegistry::new(builtin_plugins()));
        let pages = StaticPages::new(Vec::new(), plugins.clone());
        pages.register().unwrap();
        assert!(pages.lookup("/blog").is_none());

        let mut config = Config::default();
        config.set("plugins.blog.enabled", json!(true));
        plugins.setup(&config).unwrap();
        plugins.init().unwrap();

        pages.register().unwrap();
        assert!(pages.lookup("/blog").is_some());
    }

    #[test]
    fn test_invalid_route() {
        let pages = StaticPages::new(vec![Page::new("about", "About", "")], registry(&[]));
        assert!(matches!(pages.register(), Err(PageError::Register(_))));
    }
}
