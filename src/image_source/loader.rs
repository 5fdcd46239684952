//! # 网络加载模块
//!
//! ## 设计思路
//!
//! 通过 `ImageFetcher` 能力接口获取原始字节，便于在测试中替换为内存实现。
//! 默认实现 `HttpFetcher` 基于 `reqwest`，并在“尽可能早”的阶段执行校验：
//! 状态码 → 内容类型 → 声明长度 → 流式累计长度 → 文件签名。
//!
//! ## 实现思路
//!
//! - 原始 URL 拼接在跨域中转前缀之后，再由 `reqwest::Url` 统一解析与转义。
//! - 非 2xx、连接失败、超时统一映射为 `SourceUnavailable`。
//! - 内容不是图片映射为 `DecodeFailure`，超出体积映射为 `ResourceLimit`。
//! - 任何一步失败都不重试。

use std::future::Future;
use std::time::Duration;

use crate::config::FetchConfig;
use crate::error::RenderError;

const BUFFER_INITIAL_CAPACITY: usize = 16 * 1024;
const STREAM_SIGNATURE_HEAD_BYTES: usize = 4096;

/// 原始图片字节的获取能力。
pub trait ImageFetcher {
    /// 获取 `url` 指向的完整字节。
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, RenderError>> + Send;
}

/// 基于 `reqwest` 的 HTTP 获取实现。
pub struct HttpFetcher {
    client: reqwest::Client,
    config: FetchConfig,
}

impl HttpFetcher {
    /// 根据配置构建复用型 HTTP 客户端。
    ///
    /// # 示例
    /// ```rust,no_run
    /// use pixel_sheet::config::FetchConfig;
    /// use pixel_sheet::image_source::HttpFetcher;
    ///
    /// let fetcher = HttpFetcher::new(FetchConfig::direct())?;
    /// # Ok::<(), pixel_sheet::RenderError>(())
    /// ```
    pub fn new(config: FetchConfig) -> Result<Self, RenderError> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.download_timeout))
            .connect_timeout(Duration::from_secs(config.connect_timeout))
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()
            .map_err(|e| RenderError::SourceUnavailable(format!("无法创建 HTTP 客户端：{}", e)))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// 计算实际请求地址：中转前缀 + 原始地址。
    pub fn request_url(&self, url: &str) -> Result<reqwest::Url, RenderError> {
        let target = url.trim();
        let parsed = reqwest::Url::parse(target)
            .map_err(|e| RenderError::SourceUnavailable(format!("URL 格式错误：{}", e)))?;

        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(RenderError::SourceUnavailable(format!(
                "仅支持 HTTP/HTTPS：{}",
                parsed.scheme()
            )));
        }

        let Some(prefix) = self.config.relay_prefix.as_deref() else {
            return Ok(parsed);
        };

        reqwest::Url::parse(&format!("{}{}", prefix, target))
            .map_err(|e| RenderError::SourceUnavailable(format!("中转 URL 格式错误：{}", e)))
    }

    async fn download(&self, url: reqwest::Url) -> Result<Vec<u8>, RenderError> {
        log::debug!("📡 发送 HTTP 请求 - {}", redact_url_for_log(&url));

        let mut response = self
            .client
            .get(url.clone())
            .header(reqwest::header::ACCEPT, "image/avif,image/webp,image/apng,image/*,*/*;q=0.8")
            .send()
            .await
            .map_err(|e| self.map_reqwest_error(e, &url))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RenderError::SourceUnavailable(format!(
                "HTTP {}: {}",
                status.as_u16(),
                status_message(status.as_u16())
            )));
        }

        if let Some(ct) = response.headers().get(reqwest::header::CONTENT_TYPE) {
            if let Ok(ct_str) = ct.to_str() {
                if !is_acceptable_content_type(ct_str) {
                    return Err(RenderError::DecodeFailure(format!("不是图片类型：{}", ct_str)));
                }
            }
        }

        let total_len = response.content_length();
        if let Some(size) = total_len {
            if size > self.config.max_file_size {
                return Err(RenderError::ResourceLimit(format!(
                    "文件过大：{:.2} MB（限制：{:.2} MB）",
                    size as f64 / 1024.0 / 1024.0,
                    self.config.max_file_size as f64 / 1024.0 / 1024.0
                )));
            }
        }

        let initial_capacity = total_len
            .and_then(|len| usize::try_from(len).ok())
            .filter(|len| *len > 0)
            .unwrap_or(BUFFER_INITIAL_CAPACITY);
        let mut buffer = Vec::with_capacity(initial_capacity);
        let mut signature_validated = false;
        let chunk_timeout = Duration::from_millis(self.config.stream_chunk_timeout_ms);

        loop {
            let next_chunk = tokio::time::timeout(chunk_timeout, response.chunk())
                .await
                .map_err(|_| RenderError::SourceUnavailable("下载数据流读取超时".to_string()))?;

            let Some(chunk) =
                next_chunk.map_err(|e| RenderError::SourceUnavailable(format!("下载失败：{}", e)))?
            else {
                break;
            };

            if (buffer.len() + chunk.len()) as u64 > self.config.max_file_size {
                return Err(RenderError::ResourceLimit("下载后文件超过大小限制".to_string()));
            }
            buffer.extend_from_slice(&chunk);

            if !signature_validated {
                signature_validated =
                    validate_stream_signature_head(&buffer, STREAM_SIGNATURE_HEAD_BYTES)?;
            }
        }

        if !signature_validated {
            validate_image_signature(&buffer)?;
        }

        log::debug!("✅ 下载完成 - {} bytes", buffer.len());
        Ok(buffer)
    }

    fn map_reqwest_error(&self, e: reqwest::Error, url: &reqwest::Url) -> RenderError {
        let err_msg = e.to_string().replace(url.as_str(), &redact_url_for_log(url));

        if e.is_timeout() {
            RenderError::SourceUnavailable(format!("下载超时（{}秒）", self.config.download_timeout))
        } else if e.is_connect() {
            RenderError::SourceUnavailable(format!("无法连接：{}", err_msg))
        } else {
            RenderError::SourceUnavailable(format!("请求失败：{}", err_msg))
        }
    }
}

impl ImageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, RenderError> {
        let request_url = self.request_url(url)?;
        log::info!("🌐 开始下载图片 - URL: {}", redact_url_for_log(&request_url));
        self.download(request_url).await
    }
}

/// 去掉查询串与片段，避免日志泄露签名参数。
fn redact_url_for_log(url: &reqwest::Url) -> String {
    let host = url.host_str().unwrap_or("<unknown-host>");
    let port = url.port().map(|p| format!(":{}", p)).unwrap_or_default();
    format!("{}://{}{}{}", url.scheme(), host, port, url.path())
}

/// 允许 `image/*`，以及中转服务常见的通用二进制类型。
fn is_acceptable_content_type(content_type: &str) -> bool {
    let base = content_type
        .split(';')
        .next()
        .map(|base| base.trim().to_ascii_lowercase())
        .unwrap_or_default();

    base.starts_with("image/") || base == "application/octet-stream"
}

fn status_message(code: u16) -> &'static str {
    match code {
        404 => "未找到",
        403 => "访问被拒绝",
        429 => "请求过于频繁",
        500..=599 => "服务器错误",
        _ => "请求失败",
    }
}

/// 通过文件签名（magic bytes）校验输入是否为图片。
pub(crate) fn validate_image_signature(bytes: &[u8]) -> Result<(), RenderError> {
    if bytes.is_empty() {
        return Err(RenderError::DecodeFailure("图片内容为空".to_string()));
    }

    let kind = infer::get(bytes)
        .ok_or_else(|| RenderError::DecodeFailure("无法识别图片类型".to_string()))?;

    if kind.matcher_type() != infer::MatcherType::Image {
        return Err(RenderError::DecodeFailure(format!(
            "文件签名不是图片类型：{}",
            kind.mime_type()
        )));
    }

    Ok(())
}

/// 流式下载阶段的签名探测。
///
/// - `Ok(true)`：已识别为图片
/// - `Ok(false)`：字节不足以判断，继续下载
/// - `Err(...)`：已识别为非图片，或达到探测上限仍无法识别
fn validate_stream_signature_head(bytes: &[u8], head_limit: usize) -> Result<bool, RenderError> {
    if bytes.is_empty() {
        return Ok(false);
    }

    if let Some(kind) = infer::get(bytes) {
        if kind.matcher_type() != infer::MatcherType::Image {
            return Err(RenderError::DecodeFailure(format!(
                "下载内容不是图片类型：{}",
                kind.mime_type()
            )));
        }
        return Ok(true);
    }

    if bytes.len() >= head_limit {
        return Err(RenderError::DecodeFailure(format!(
            "下载前 {} 字节内无法识别图片类型",
            head_limit
        )));
    }

    Ok(false)
}
