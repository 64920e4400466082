//! 输出缓冲
//!
//! 下游响应体先完整收集，再按协商结果决定是否 gzip 压缩。
//! 压缩失败时退回原始内容。长度未知或超出上限的响应体不缓冲，原样透传。

use std::io::Write;

use axum::body::HttpBody;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use bytes::Bytes;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::http::{Body, Response};

/// 默认缓冲上限 10MB
pub const DEFAULT_BUFFER_LIMIT: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputEncoding {
    Plain,
    Gzip,
}

#[derive(Debug, Clone)]
pub struct OutputBuffer {
    encoding: OutputEncoding,
    limit: usize,
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::plain(DEFAULT_BUFFER_LIMIT)
    }
}

impl OutputBuffer {
    pub fn plain(limit: usize) -> Self {
        Self {
            encoding: OutputEncoding::Plain,
            limit,
        }
    }

    /// 根据配置和请求头协商编码：只有配置开启且客户端接受 gzip 时才压缩
    pub fn negotiate(gzip_enabled: bool, request_headers: &HeaderMap, limit: usize) -> Self {
        let accepts = request_headers
            .get(header::ACCEPT_ENCODING)
            .and_then(|v| v.to_str().ok())
            .map(accepts_gzip)
            .unwrap_or(false);

        let encoding = if gzip_enabled && accepts {
            OutputEncoding::Gzip
        } else {
            OutputEncoding::Plain
        };
        Self { encoding, limit }
    }

    pub fn encoding(&self) -> OutputEncoding {
        self.encoding
    }

    /// 把缓冲应用到下游响应上
    ///
    /// 是否压缩在收集响应体之前决定，下游响应在任何情况下都不会被丢弃。
    pub async fn flush(&self, response: Response) -> Response {
        if self.encoding == OutputEncoding::Plain || !should_compress(&response) {
            return response;
        }
        if !self.fits(&response) {
            tracing::debug!("[Output] 响应体长度未知或超出 {} 字节，跳过压缩", self.limit);
            return response;
        }

        let (mut parts, body) = response.into_parts();
        let bytes = match axum::body::to_bytes(body, self.limit).await {
            Ok(bytes) => bytes,
            Err(e) => {
                // 响应体已被消费，只能返回错误
                tracing::error!("[Output] 收集响应体失败: {}", e);
                let mut failed = Response::new(Body::empty());
                *failed.status_mut() = StatusCode::BAD_GATEWAY;
                return failed;
            }
        };

        match gzip(&bytes) {
            Ok(compressed) => {
                parts
                    .headers
                    .insert(header::CONTENT_ENCODING, HeaderValue::from_static("gzip"));
                parts
                    .headers
                    .append(header::VARY, HeaderValue::from_static("accept-encoding"));
                parts
                    .headers
                    .insert(header::CONTENT_LENGTH, HeaderValue::from(compressed.len()));
                Response::from_parts(parts, Body::from(compressed))
            }
            Err(e) => {
                tracing::warn!("[Output] gzip 压缩失败，按原始内容输出: {}", e);
                Response::from_parts(parts, Body::from(bytes))
            }
        }
    }
}

impl OutputBuffer {
    /// 响应体长度已知且不超过上限
    fn fits(&self, response: &Response) -> bool {
        let declared = response
            .headers()
            .get(header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());
        if declared.is_some_and(|len| len > self.limit as u64) {
            return false;
        }
        match response.body().size_hint().upper() {
            Some(upper) => upper <= self.limit as u64,
            None => false,
        }
    }
}

fn should_compress(response: &Response) -> bool {
    let status = response.status();
    if status == StatusCode::NO_CONTENT || status == StatusCode::NOT_MODIFIED {
        return false;
    }
    !response.headers().contains_key(header::CONTENT_ENCODING)
}

fn gzip(bytes: &Bytes) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(bytes.len() / 2), Compression::default());
    encoder.write_all(bytes)?;
    encoder.finish()
}

/// 解析 Accept-Encoding
///
/// 显式的 `gzip` 条目优先于 `*`，q 为 0 表示拒绝。
pub fn accepts_gzip(accept_encoding: &str) -> bool {
    let mut wildcard = None;
    for item in accept_encoding.split(',') {
        let mut pieces = item.split(';');
        let coding = pieces.next().unwrap_or("").trim().to_lowercase();
        let quality = pieces
            .filter_map(|p| p.trim().strip_prefix("q="))
            .filter_map(|q| q.trim().parse::<f32>().ok())
            .next()
            .unwrap_or(1.0);
        match coding.as_str() {
            "gzip" => return quality > 0.0,
            "*" => wildcard = Some(quality > 0.0),
            _ => {}
        }
    }
    wildcard.unwrap_or(false)
}
