//! # 文字栅格化模块
//!
//! ## 设计思路
//!
//! 文字没有“原始尺寸”，需要先画到一张足够大的白色草稿画布上，再按测量结果裁剪：
//! `(文字宽度 + 2 × 边距) × (字号 + 2 × 边距)`。
//!
//! 字形渲染通过 `Rasterizer` 能力接口注入：默认实现 `FontdueRasterizer` 基于 `fontdue`，
//! 字体由调用方提供（字体文件本身决定字族与粗斜体）。
//!
//! ## 实现思路
//!
//! - 基线采用 bottom 模式：传入的 y 坐标是字形外框的底边。
//! - 渐变沿 `(0, 0) → (文字宽度, 字号)` 方向展开，红@0、绿@0.5、蓝@1。
//! - 字形覆盖率作为 alpha 与画布现有颜色混合。

use image::{Rgba, RgbaImage};

use super::source::RasterImage;
use crate::color::Rgb;
use crate::config::{TextFill, TextStyle};
use crate::error::RenderError;

/// 草稿画布边长，足够容纳常见的单行文字。
pub const SCRATCH_CANVAS_SIZE: u32 = 2048;

/// 渐变色标：`(位置, 颜色)`，位置在 `[0, 1]` 内升序排列。
pub type ColorStop = (f32, Rgb);

/// 文字填充样式：纯色或多色标线性渐变。
#[derive(Debug, Clone, PartialEq)]
pub enum FillStyle {
    Solid(Rgb),
    Linear {
        start: (f32, f32),
        end: (f32, f32),
        stops: Vec<ColorStop>,
    },
}

impl FillStyle {
    /// 红 → 绿 → 蓝的彩虹渐变，从原点指向 `(width, height)`。
    pub fn rainbow(width: f32, height: f32) -> Self {
        Self::Linear {
            start: (0.0, 0.0),
            end: (width, height),
            stops: vec![(0.0, Rgb::RED), (0.5, Rgb::GREEN), (1.0, Rgb::BLUE)],
        }
    }

    /// 根据文字样式与测量结果构造填充样式。
    pub fn for_text(fill: TextFill, text_width: u32, text_height: u32) -> Self {
        match fill {
            TextFill::Solid(rgb) => Self::Solid(rgb),
            TextFill::Gradient => Self::rainbow(text_width as f32, text_height as f32),
        }
    }

    /// 计算画布坐标 `(x, y)` 处的填充颜色。
    pub fn color_at(&self, x: f32, y: f32) -> Rgb {
        match self {
            Self::Solid(rgb) => *rgb,
            Self::Linear { start, end, stops } => {
                let (dx, dy) = (end.0 - start.0, end.1 - start.1);
                let len_sq = dx * dx + dy * dy;
                let t = if len_sq > 0.0 {
                    ((x - start.0) * dx + (y - start.1) * dy) / len_sq
                } else {
                    0.0
                };
                sample_stops(stops, t)
            }
        }
    }
}

fn sample_stops(stops: &[ColorStop], t: f32) -> Rgb {
    let Some(&(first_pos, first_color)) = stops.first() else {
        return Rgb::BLACK;
    };
    if t <= first_pos {
        return first_color;
    }

    for pair in stops.windows(2) {
        if let [(p0, c0), (p1, c1)] = pair {
            if t <= *p1 {
                let span = p1 - p0;
                let local = if span > 0.0 { (t - p0) / span } else { 1.0 };
                return c0.lerp(*c1, local);
            }
        }
    }

    stops.last().map(|&(_, color)| color).unwrap_or(first_color)
}

/// 文字 → 位图的栅格化能力。
pub trait Rasterizer {
    /// 测量文字在给定字号下的渲染宽度（像素）。
    fn measure_text(&self, text: &str, font_size: f32) -> Result<f32, RenderError>;

    /// 以 bottom 基线模式在 `(x, bottom)` 处绘制文字。
    fn fill_text(
        &self,
        canvas: &mut RgbaImage,
        text: &str,
        font_size: f32,
        x: f32,
        bottom: f32,
        fill: &FillStyle,
    ) -> Result<(), RenderError>;
}

/// 未配置字体时使用的占位实现，任何文字来源都会失败。
#[derive(Debug, Clone, Copy, Default)]
pub struct MissingFont;

impl Rasterizer for MissingFont {
    fn measure_text(&self, _text: &str, _font_size: f32) -> Result<f32, RenderError> {
        Err(RenderError::RasterizationFailure("未配置字体，无法渲染文字".to_string()))
    }

    fn fill_text(
        &self,
        _canvas: &mut RgbaImage,
        _text: &str,
        _font_size: f32,
        _x: f32,
        _bottom: f32,
        _fill: &FillStyle,
    ) -> Result<(), RenderError> {
        Err(RenderError::RasterizationFailure("未配置字体，无法渲染文字".to_string()))
    }
}

/// 基于 `fontdue` 的栅格化实现。
pub struct FontdueRasterizer {
    font: fontdue::Font,
}

impl FontdueRasterizer {
    /// 从 TTF/OTF 字节构造。
    pub fn from_bytes(data: &[u8]) -> Result<Self, RenderError> {
        let font = fontdue::Font::from_bytes(data, fontdue::FontSettings::default())
            .map_err(|e| RenderError::RasterizationFailure(format!("字体解析失败：{}", e)))?;
        Ok(Self { font })
    }

    /// 字形外框底边到基线的距离（正数）。
    fn descent(&self, font_size: f32) -> f32 {
        self.font
            .horizontal_line_metrics(font_size)
            .map(|m| -m.descent)
            .unwrap_or(font_size * 0.2)
    }
}

impl Rasterizer for FontdueRasterizer {
    fn measure_text(&self, text: &str, font_size: f32) -> Result<f32, RenderError> {
        let mut width = 0.0;
        let mut prev: Option<char> = None;
        for ch in text.chars() {
            if let Some(p) = prev {
                width += self.font.horizontal_kern(p, ch, font_size).unwrap_or(0.0);
            }
            width += self.font.metrics(ch, font_size).advance_width;
            prev = Some(ch);
        }
        Ok(width)
    }

    fn fill_text(
        &self,
        canvas: &mut RgbaImage,
        text: &str,
        font_size: f32,
        x: f32,
        bottom: f32,
        fill: &FillStyle,
    ) -> Result<(), RenderError> {
        let baseline = (bottom - self.descent(font_size)).round() as i64;
        let (canvas_width, canvas_height) = (i64::from(canvas.width()), i64::from(canvas.height()));
        let mut pen_x = x;
        let mut prev: Option<char> = None;

        for ch in text.chars() {
            if let Some(p) = prev {
                pen_x += self.font.horizontal_kern(p, ch, font_size).unwrap_or(0.0);
            }
            let (metrics, coverage) = self.font.rasterize(ch, font_size);
            let glyph_left = pen_x.round() as i64 + i64::from(metrics.xmin);
            let glyph_top = baseline - i64::from(metrics.ymin) - metrics.height as i64;

            for gy in 0..metrics.height {
                for gx in 0..metrics.width {
                    let alpha = coverage.get(gy * metrics.width + gx).copied().unwrap_or(0);
                    if alpha == 0 {
                        continue;
                    }

                    let px = glyph_left + gx as i64;
                    let py = glyph_top + gy as i64;
                    if px < 0 || py < 0 || px >= canvas_width || py >= canvas_height {
                        continue;
                    }

                    let color = fill.color_at(px as f32 + 0.5, py as f32 + 0.5);
                    let pixel = canvas.get_pixel_mut(px as u32, py as u32);
                    *pixel = blend(*pixel, color, alpha);
                }
            }

            pen_x += metrics.advance_width;
            prev = Some(ch);
        }

        Ok(())
    }
}

/// 以覆盖率 `alpha` 将前景色混合到背景像素上，结果不透明。
fn blend(background: Rgba<u8>, foreground: Rgb, alpha: u8) -> Rgba<u8> {
    let a = u32::from(alpha);
    let inv_a = 255 - a;
    let mix = |fg: u8, bg: u8| ((u32::from(fg) * a + u32::from(bg) * inv_a) / 255) as u8;
    let [br, bg, bb, _] = background.0;
    Rgba([
        mix(foreground.r, br),
        mix(foreground.g, bg),
        mix(foreground.b, bb),
        255,
    ])
}

/// 将文字栅格化为 `RasterImage`。
///
/// 原始尺寸与输出尺寸相同（均为裁剪后的尺寸）。
pub fn rasterize_text<R: Rasterizer + ?Sized>(
    rasterizer: &R,
    text: &str,
    style: &TextStyle,
) -> Result<RasterImage, RenderError> {
    style.validate()?;

    let mut canvas =
        RgbaImage::from_pixel(SCRATCH_CANVAS_SIZE, SCRATCH_CANVAS_SIZE, Rgba([255, 255, 255, 255]));

    let measured = rasterizer.measure_text(text, style.font_size)?;
    if !measured.is_finite() || measured < 0.0 {
        return Err(RenderError::RasterizationFailure(format!(
            "文字测量结果无效：{}",
            measured
        )));
    }

    let text_width = measured.ceil().min(u32::MAX as f32) as u32;
    let text_height = style.line_height();

    let image_width = text_width.checked_add(style.margin.saturating_mul(2));
    let image_height = text_height.checked_add(style.margin.saturating_mul(2));
    let (image_width, image_height) = match (image_width, image_height) {
        (Some(w), Some(h)) if w <= SCRATCH_CANVAS_SIZE && h <= SCRATCH_CANVAS_SIZE => (w, h),
        _ => {
            return Err(RenderError::RasterizationFailure(format!(
                "文字超出草稿画布：{}x{}（上限 {}）",
                text_width, text_height, SCRATCH_CANVAS_SIZE
            )));
        }
    };

    let fill = FillStyle::for_text(style.fill, text_width, text_height);
    rasterizer.fill_text(
        &mut canvas,
        text,
        style.font_size,
        style.margin as f32,
        (text_height + style.margin) as f32,
        &fill,
    )?;

    let cropped = image::imageops::crop_imm(&canvas, 0, 0, image_width, image_height).to_image();

    RasterImage::new(cropped.into_raw(), image_width, image_height)
        .map_err(|e| RenderError::RasterizationFailure(format!("裁剪结果异常：{}", e)))
}
