//! 引导中间件
//!
//! 每个请求新建一份 `RuntimeContext`，运行 `InitializeProcessor`，
//! 被包装的服务作为下游处理器。引导阶段的致命错误在这里变成
//! 不带内部细节的 500 响应。响应上附带的 `Messages` 写入日志后随响应继续向外传递。

use std::convert::Infallible;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::http::{header, HeaderValue, StatusCode};
use futures::future::BoxFuture;
use preflight_core::{Body, Messages, Request, RequestStartTime, Response};
use preflight_processor::{InitializeProcessor, RuntimeContext, Services};
use tower::{Layer, Service};

use crate::delegate::ServiceDelegate;

/// 为每个请求构造运行时上下文
pub type ContextFactory = Arc<dyn Fn(&Request) -> RuntimeContext + Send + Sync>;

/// 引导管道 tower layer
#[derive(Clone)]
pub struct BootstrapLayer {
    factory: ContextFactory,
}

impl BootstrapLayer {
    /// 每个请求从同一组共享协作方构造上下文，不带会话
    pub fn new(services: Services) -> Self {
        Self::with_factory(Arc::new(move |_request: &Request| {
            RuntimeContext::new(&services)
        }))
    }

    /// 自定义上下文构造（例如按 cookie 附加会话）
    pub fn with_factory(factory: ContextFactory) -> Self {
        Self { factory }
    }
}

impl<S> Layer<S> for BootstrapLayer {
    type Service = BootstrapService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        BootstrapService {
            inner,
            factory: self.factory.clone(),
        }
    }
}

/// 引导管道服务
#[derive(Clone)]
pub struct BootstrapService<S> {
    inner: S,
    factory: ContextFactory,
}

impl<S> Service<Request> for BootstrapService<S>
where
    S: Service<Request, Response = Response, Error = Infallible> + Clone + Send + Sync + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Response, Infallible>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request) -> Self::Future {
        if request.extensions().get::<RequestStartTime>().is_none() {
            request.extensions_mut().insert(RequestStartTime::now());
        }

        let mut ctx = (self.factory)(&request);
        // 使用已就绪的实例，留一个克隆给下一次调用
        let clone = self.inner.clone();
        let inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let delegate = ServiceDelegate::new(inner);
            let path = request.uri().path().to_string();
            match InitializeProcessor::new()
                .process(&mut ctx, request, &delegate)
                .await
            {
                Ok(response) => {
                    if let Some(messages) = response.extensions().get::<Messages>() {
                        for message in messages.all() {
                            tracing::warn!(
                                "[Bootstrap] {} {:?}: {}",
                                path,
                                message.severity,
                                message.text
                            );
                        }
                    }
                    Ok(response)
                }
                Err(e) => {
                    tracing::error!("[Bootstrap] 请求引导失败 {}: {}", path, e);
                    Ok(internal_error_response())
                }
            }
        })
    }
}

/// 通用 500 响应
pub fn internal_error_response() -> Response {
    let mut response = Response::new(Body::from("Internal Server Error"));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}
