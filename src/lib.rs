//! Preflight
//!
//! 按请求运行的分阶段引导管道，以及一个基于 axum 的示例站点：
//! 插件注册表、页面树、内存会话和 clockwork 调试器。

pub mod app;
pub mod debugger;
pub mod pages;
pub mod plugins;
pub mod session;

pub use app::App;
pub use preflight_core as core;
pub use preflight_processor as processor;
pub use preflight_server as server;
