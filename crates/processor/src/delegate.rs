//! 下游处理器

use async_trait::async_trait;
use preflight_core::{Request, Response};

/// 引导完成后接手请求的下一阶段处理器，每次管道运行最多调用一次
#[async_trait]
pub trait Delegate: Send + Sync {
    async fn handle(&self, request: Request) -> Response;
}
