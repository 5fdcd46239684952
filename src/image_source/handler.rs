//! # 获取编排模块
//!
//! ## 设计思路
//!
//! `ImageAcquirer` 只负责流程编排，三种能力（下载 / 解码 / 文字栅格化）全部由泛型注入，
//! 测试时可替换为内存实现，不依赖网络与字体文件。
//!
//! 处理链路：
//! - URL：下载 → 解码 → 计算目标尺寸 → 缩放
//! - 文字：草稿画布绘制 → 裁剪
//!
//! ## 实现思路
//!
//! - 记录 `fetch/decode/resample/total` 阶段耗时，便于性能诊断。
//! - 任何阶段失败都直接返回错误，不做重试；此时渲染器尚未接触表格。

use std::time::Instant;

use super::loader::ImageFetcher;
use super::pipeline::{prepare_raster, ImageDecoder};
use super::source::{ImageSource, RasterImage};
use super::text::{rasterize_text, MissingFont, Rasterizer};
use crate::config::{RenderConfig, TextStyle};
use crate::error::RenderError;

/// 图片获取器。
pub struct ImageAcquirer<F, D, R = MissingFont> {
    fetcher: F,
    decoder: D,
    rasterizer: R,
}

impl<F, D> ImageAcquirer<F, D, MissingFont>
where
    F: ImageFetcher,
    D: ImageDecoder,
{
    /// 仅处理 URL 来源的获取器；文字来源会以 `RasterizationFailure` 失败。
    ///
    /// # 示例
    /// ```rust,no_run
    /// use pixel_sheet::config::FetchConfig;
    /// use pixel_sheet::image_source::{HttpFetcher, ImageAcquirer, ImageCrateDecoder};
    ///
    /// let config = FetchConfig::default();
    /// let decoder = ImageCrateDecoder::from_config(&config);
    /// let acquirer = ImageAcquirer::for_urls(HttpFetcher::new(config)?, decoder);
    /// # Ok::<(), pixel_sheet::RenderError>(())
    /// ```
    pub fn for_urls(fetcher: F, decoder: D) -> Self {
        Self::new(fetcher, decoder, MissingFont)
    }
}

impl<F, D, R> ImageAcquirer<F, D, R>
where
    F: ImageFetcher,
    D: ImageDecoder,
    R: Rasterizer,
{
    pub fn new(fetcher: F, decoder: D, rasterizer: R) -> Self {
        Self {
            fetcher,
            decoder,
            rasterizer,
        }
    }

    /// 按来源类型分发获取流程。
    pub async fn acquire(
        &self,
        source: &ImageSource,
        config: &RenderConfig,
    ) -> Result<RasterImage, RenderError> {
        let total_started = Instant::now();
        log::info!("🚀 开始获取：source={}", source.hint());

        let result = match source {
            ImageSource::Url(url) => self.from_url(url, config).await,
            ImageSource::Text { text, style } => self.from_text(text, style),
        };

        match &result {
            Ok(image) => {
                log::info!(
                    "🖼️ 获取完成：source={}, {}, total={}ms",
                    source.hint(),
                    image.dimension_summary(),
                    total_started.elapsed().as_millis()
                );
            }
            Err(e) => {
                log::error!(
                    "❌ 获取失败：source={}, stage={}, code={}, error={}",
                    source.hint(),
                    e.stage(),
                    e.code(),
                    e
                );
            }
        }

        result
    }

    /// 下载、解码并缩放到 `config` 的尺寸上限之内。
    pub async fn from_url(&self, url: &str, config: &RenderConfig) -> Result<RasterImage, RenderError> {
        config.validate()?;

        let fetch_started = Instant::now();
        let bytes = self.fetcher.fetch(url).await?;
        let fetch_ms = fetch_started.elapsed().as_millis();

        let decode_started = Instant::now();
        let decoded = self.decoder.decode(&bytes)?;
        let decode_ms = decode_started.elapsed().as_millis();

        let resample_started = Instant::now();
        let image = prepare_raster(decoded, config)?;
        let resample_ms = resample_started.elapsed().as_millis();

        log::debug!(
            "⏱️ URL 获取阶段耗时：fetch={}ms, decode={}ms, resample={}ms, bytes={}",
            fetch_ms,
            decode_ms,
            resample_ms,
            bytes.len()
        );

        Ok(image)
    }

    /// 按样式将文字栅格化；结果不再缩放。
    pub fn from_text(&self, text: &str, style: &TextStyle) -> Result<RasterImage, RenderError> {
        let started = Instant::now();
        let image = rasterize_text(&self.rasterizer, text, style)?;
        log::debug!(
            "⏱️ 文字栅格化耗时：{}ms（{}x{}）",
            started.elapsed().as_millis(),
            image.width(),
            image.height()
        );
        Ok(image)
    }
}
