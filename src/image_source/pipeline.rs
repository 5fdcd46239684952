//! # 解码与缩放流水线模块
//!
//! ## 设计思路
//!
//! 将“字节 → 位图 → 目标尺寸 → RGBA”的过程集中管理，并在完整解码前做像素上限检查，
//! 降低异常输入触发高内存开销的风险。
//!
//! ## 实现思路
//!
//! 1. 猜测格式并读取 header 尺寸
//! 2. 按像素上限快速拒绝
//! 3. 完整解码
//! 4. 两段式等比缩放计算目标尺寸（先宽后高，第二段不回头检查宽度）
//! 5. `fast_image_resize` 平滑缩放，失败时回退 `image::imageops::resize`

use fast_image_resize as fr;
use image::imageops::FilterType;
use image::{ImageBuffer, ImageReader, Rgba, RgbaImage};
use std::io::Cursor;

use super::source::RasterImage;
use crate::config::{FetchConfig, RenderConfig, RoundingMode};
use crate::error::RenderError;

/// 原始字节 → 可寻址位图的解码能力。
pub trait ImageDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<RgbaImage, RenderError>;
}

/// 基于 `image` crate 的解码实现。
#[derive(Debug, Clone)]
pub struct ImageCrateDecoder {
    max_decoded_pixels: u64,
}

impl Default for ImageCrateDecoder {
    fn default() -> Self {
        Self::from_config(&FetchConfig::default())
    }
}

impl ImageCrateDecoder {
    pub fn new(max_decoded_pixels: u64) -> Self {
        Self { max_decoded_pixels }
    }

    pub fn from_config(config: &FetchConfig) -> Self {
        Self::new(config.max_decoded_pixels)
    }

    /// 仅通过图片头信息读取宽高，用于在完整解码前做像素限制检查。
    fn inspect_dimensions(bytes: &[u8]) -> Result<(u32, u32), RenderError> {
        ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| RenderError::DecodeFailure(format!("无法识别图片格式：{}", e)))?
            .into_dimensions()
            .map_err(|e| RenderError::DecodeFailure(format!("无法读取图片尺寸：{}", e)))
    }

    fn validate_pixel_limits(&self, width: u32, height: u32) -> Result<(), RenderError> {
        let pixels = u64::from(width) * u64::from(height);

        if pixels > self.max_decoded_pixels {
            return Err(RenderError::ResourceLimit(format!(
                "图片像素过大：{} 像素（限制：{} 像素）",
                pixels, self.max_decoded_pixels
            )));
        }

        Ok(())
    }
}

impl ImageDecoder for ImageCrateDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<RgbaImage, RenderError> {
        image::guess_format(bytes)
            .map_err(|e| RenderError::DecodeFailure(format!("不支持的图片格式：{}", e)))?;

        let (header_width, header_height) = Self::inspect_dimensions(bytes)?;
        self.validate_pixel_limits(header_width, header_height)?;

        let decoded = image::load_from_memory(bytes)
            .map_err(|e| RenderError::DecodeFailure(format!("图片解码失败：{}", e)))?;

        let rgba = decoded.to_rgba8();
        let (width, height) = rgba.dimensions();
        if width == 0 || height == 0 {
            return Err(RenderError::DecodeFailure("图片尺寸为 0".to_string()));
        }
        self.validate_pixel_limits(width, height)?;

        Ok(rgba)
    }
}

/// 两段式等比缩放：先按最大宽度修正，再按最大高度修正。
///
/// 第二段修正不会再次检查宽度；两段都按 `rounding` 取整，
/// 结果至少为 1 像素。原始尺寸为 0 时返回 `(0, 0)`。
///
/// # 示例
/// ```rust
/// use pixel_sheet::config::RoundingMode;
/// use pixel_sheet::image_source::fit_dimensions;
///
/// assert_eq!(fit_dimensions(240, 100, 120, 100, RoundingMode::Floor), (120, 50));
/// assert_eq!(fit_dimensions(100, 300, 120, 100, RoundingMode::Floor), (33, 100));
/// assert_eq!(fit_dimensions(100, 300, 120, 100, RoundingMode::Ceil), (34, 100));
/// ```
pub fn fit_dimensions(
    native_width: u32,
    native_height: u32,
    max_width: u32,
    max_height: u32,
    rounding: RoundingMode,
) -> (u32, u32) {
    if native_width == 0 || native_height == 0 {
        return (0, 0);
    }

    let (nw, nh) = (u64::from(native_width), u64::from(native_height));
    let (mut width, mut height) = (nw, nh);

    if width > u64::from(max_width) {
        width = u64::from(max_width);
        height = rounding.div(width * nh, nw);
    }

    if height > u64::from(max_height) {
        height = u64::from(max_height);
        width = rounding.div(height * nw, nh);
    }

    (to_dimension(width), to_dimension(height))
}

fn to_dimension(value: u64) -> u32 {
    u32::try_from(value.max(1)).unwrap_or(u32::MAX)
}

/// 计算目标尺寸并缩放，产出 `RasterImage`。
pub(crate) fn prepare_raster(
    decoded: RgbaImage,
    config: &RenderConfig,
) -> Result<RasterImage, RenderError> {
    let (original_width, original_height) = decoded.dimensions();
    let (target_width, target_height) = fit_dimensions(
        original_width,
        original_height,
        config.max_width,
        config.max_height,
        config.rounding,
    );

    if target_width == 0 || target_height == 0 {
        return Err(RenderError::ResampleFailure(format!(
            "目标尺寸无效：{}x{}",
            target_width, target_height
        )));
    }

    let resized = if (target_width, target_height) == (original_width, original_height) {
        decoded
    } else {
        resample(decoded, target_width, target_height, config.resize_filter)?
    };

    RasterImage::from_rgba_image(resized, original_width, original_height)
        .map_err(|e| RenderError::ResampleFailure(format!("缩放后像素数据异常：{}", e)))
}

/// 平滑缩放到目标尺寸。
///
/// 优先使用 `fast_image_resize`，失败时回退 `image::imageops::resize`。
pub fn resample(
    image: RgbaImage,
    target_width: u32,
    target_height: u32,
    filter: FilterType,
) -> Result<RgbaImage, RenderError> {
    if target_width == 0 || target_height == 0 {
        return Err(RenderError::ResampleFailure(format!(
            "目标尺寸无效：{}x{}",
            target_width, target_height
        )));
    }

    log::debug!(
        "🧩 缩放：{}x{} -> {}x{}（filter={:?}）",
        image.width(),
        image.height(),
        target_width,
        target_height,
        filter
    );

    match resize_with_fast_image_resize(&image, target_width, target_height, filter) {
        Ok(resized) => Ok(resized),
        Err(err) => {
            log::warn!("⚠️ fast_image_resize 缩放失败，回退 image::imageops::resize：{}", err);
            let resized = image::imageops::resize(&image, target_width, target_height, filter);
            if resized.dimensions() != (target_width, target_height) {
                return Err(RenderError::ResampleFailure("回退缩放输出尺寸异常".to_string()));
            }
            Ok(resized)
        }
    }
}

fn resize_with_fast_image_resize(
    image: &RgbaImage,
    target_width: u32,
    target_height: u32,
    filter: FilterType,
) -> Result<RgbaImage, RenderError> {
    let (src_width, src_height) = image.dimensions();

    let src_image = fr::images::Image::from_vec_u8(
        src_width,
        src_height,
        image.as_raw().clone(),
        fr::PixelType::U8x4,
    )
    .map_err(|e| RenderError::ResampleFailure(format!("构建源图像缓冲失败：{}", e)))?;

    let mut dst_image = fr::images::Image::new(target_width, target_height, fr::PixelType::U8x4);

    let mut resizer = fr::Resizer::new();
    let options =
        fr::ResizeOptions::new().resize_alg(fr::ResizeAlg::Convolution(to_fast_filter(filter)));

    resizer
        .resize(&src_image, &mut dst_image, Some(&options))
        .map_err(|e| RenderError::ResampleFailure(format!("fast_image_resize 执行失败：{}", e)))?;

    ImageBuffer::<Rgba<u8>, Vec<u8>>::from_raw(target_width, target_height, dst_image.into_vec())
        .ok_or_else(|| RenderError::ResampleFailure("fast_image_resize 输出缓冲长度异常".to_string()))
}

fn to_fast_filter(filter: FilterType) -> fr::FilterType {
    match filter {
        FilterType::Nearest => fr::FilterType::Box,
        FilterType::Triangle => fr::FilterType::Bilinear,
        FilterType::CatmullRom => fr::FilterType::CatmullRom,
        FilterType::Gaussian => fr::FilterType::Mitchell,
        FilterType::Lanczos3 => fr::FilterType::Lanczos3,
    }
}
