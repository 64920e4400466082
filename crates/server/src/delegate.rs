//! tower 服务适配为下游处理器

use std::convert::Infallible;

use async_trait::async_trait;
use preflight_core::{Request, Response};
use preflight_processor::Delegate;
use tower::{Service, ServiceExt};

/// 把任意 `Service<Request>`（例如 axum `Router`）当作下游处理器
#[derive(Clone)]
pub struct ServiceDelegate<S> {
    inner: S,
}

impl<S> ServiceDelegate<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<S> Delegate for ServiceDelegate<S>
where
    S: Service<Request, Response = Response, Error = Infallible> + Clone + Send + Sync + 'static,
    S::Future: Send,
{
    async fn handle(&self, request: Request) -> Response {
        match self.inner.clone().oneshot(request).await {
            Ok(response) => response,
            Err(never) => match never {},
        }
    }
}
