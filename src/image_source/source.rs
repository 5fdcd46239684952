//! # 数据源与中间模型
//!
//! ## 设计思路
//!
//! 将“外部输入类型”和“渲染输入”解耦：
//! - `ImageSource` 表示外部来源语义（网络图片 / 文字）
//! - `RasterImage` 表示获取阶段的唯一产物：RGBA 像素与尺寸
//!
//! `RasterImage` 在构造时校验 `pixels.len() == width * height * 4`，
//! 之后不可变；不存在“像素缺失”的实例，解码失败直接以错误返回。

use image::RgbaImage;

use crate::color::Rgb;
use crate::config::TextStyle;
use crate::error::RenderError;

/// 图片输入来源。
#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    /// 网络地址来源。
    Url(String),
    /// 文字来源，按样式栅格化为位图。
    Text { text: String, style: TextStyle },
}

impl ImageSource {
    /// 来源提示（用于日志与诊断）。
    pub fn hint(&self) -> &'static str {
        match self {
            Self::Url(_) => "url",
            Self::Text { .. } => "text",
        }
    }
}

/// 获取阶段输出：行优先的 RGBA 像素及其尺寸。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    pixels: Vec<u8>,
    original_width: u32,
    original_height: u32,
    width: u32,
    height: u32,
}

impl RasterImage {
    /// 以相同的原始尺寸与输出尺寸构造。
    pub fn new(pixels: Vec<u8>, width: u32, height: u32) -> Result<Self, RenderError> {
        Self::with_original(pixels, width, height, width, height)
    }

    /// 构造并记录缩放前的原始尺寸（仅用于诊断）。
    pub fn with_original(
        pixels: Vec<u8>,
        original_width: u32,
        original_height: u32,
        width: u32,
        height: u32,
    ) -> Result<Self, RenderError> {
        let expected_len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|pixels| pixels.checked_mul(4))
            .ok_or_else(|| RenderError::ResourceLimit("图片尺寸导致内存溢出风险".to_string()))?;

        if pixels.len() != expected_len {
            return Err(RenderError::DecodeFailure(format!(
                "像素数据长度异常：{}（期望 {}x{}x4 = {}）",
                pixels.len(),
                width,
                height,
                expected_len
            )));
        }

        Ok(Self {
            pixels,
            original_width,
            original_height,
            width,
            height,
        })
    }

    /// 用单一 RGBA 颜色填满指定尺寸。
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Result<Self, RenderError> {
        let count = (width as usize)
            .checked_mul(height as usize)
            .ok_or_else(|| RenderError::ResourceLimit("图片像素数溢出".to_string()))?;
        Self::new(rgba.repeat(count), width, height)
    }

    pub(crate) fn from_rgba_image(
        image: RgbaImage,
        original_width: u32,
        original_height: u32,
    ) -> Result<Self, RenderError> {
        let (width, height) = image.dimensions();
        Self::with_original(image.into_raw(), original_width, original_height, width, height)
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn original_width(&self) -> u32 {
        self.original_width
    }

    pub fn original_height(&self) -> u32 {
        self.original_height
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// 尺寸日志行：`original WxH -> resized WxH`。
    pub fn dimension_summary(&self) -> String {
        format!(
            "original {}x{} -> resized {}x{}",
            self.original_width, self.original_height, self.width, self.height
        )
    }

    /// 读取 `(row, column)` 处像素的 RGB；越界时返回 `None`。
    pub fn pixel(&self, row: u32, column: u32) -> Option<Rgb> {
        if row >= self.height || column >= self.width {
            return None;
        }
        let offset = (row as usize * self.width as usize + column as usize) * 4;
        self.pixels.get(offset..offset + 4).and_then(Rgb::from_rgba_slice)
    }
}
