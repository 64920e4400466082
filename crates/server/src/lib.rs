//! Preflight Server Crate
//!
//! 把引导管道接入 tower/axum：`BootstrapLayer` 包住任意路由，
//! 每个请求先跑完初始化阶段，再交给被包装的服务。

pub mod config;
pub mod delegate;
pub mod layer;

pub use config::ServerConfig;
pub use delegate::ServiceDelegate;
pub use layer::{internal_error_response, BootstrapLayer, BootstrapService, ContextFactory};
