//! # 配置模块
//!
//! ## 设计思路
//!
//! 将所有“可调策略”集中为不可变配置值，在进程启动时构造一次，
//! 以引用形式传入获取与渲染两个组件，不存在任何全局可变状态。
//!
//! - `RenderConfig`：输出尺寸上限、单元格外观、分块大小、偏移与节流间隔
//! - `FetchConfig`：中转地址、超时与体积/像素上限
//! - `TextStyle`：文字渲染的字号、边距与填充方式
//!
//! ## 实现思路
//!
//! - `Default` 对应生产默认值（120×100 输出、30×30 分块、3 秒间隔）。
//! - `validate()` 在开始工作前拒绝永远无法渲染的配置，返回 `InvalidConfig`。

use std::time::Duration;

use image::imageops::FilterType;

use crate::color::Rgb;
use crate::error::RenderError;

/// 表格行数上限（与主流电子表格一致）。
pub const SHEET_MAX_ROWS: u32 = 1_048_576;
/// 表格列数上限（`XFD`）。
pub const SHEET_MAX_COLUMNS: u32 = 16_384;

/// 等比缩放时高/宽的取整方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoundingMode {
    /// 向下取整（默认）。
    #[default]
    Floor,
    /// 向上取整。
    Ceil,
}

impl RoundingMode {
    /// 计算 `numerator / denominator` 并按模式取整；分母为 0 时返回 0。
    pub fn div(self, numerator: u64, denominator: u64) -> u64 {
        if denominator == 0 {
            return 0;
        }
        match self {
            Self::Floor => numerator / denominator,
            Self::Ceil => numerator.div_ceil(denominator),
        }
    }
}

/// 渲染配置。
///
/// 字段覆盖缩放上限、单元格外观、分块绘制与节流四个方面。
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// 输出最大宽度（列数）。
    pub max_width: u32,
    /// 输出最大高度（行数）。
    pub max_height: u32,
    /// 单元格列宽（仅影响外观）。
    pub cell_width: f64,
    /// 单元格行高（仅影响外观）。
    pub cell_height: f64,
    /// 单次绘制分块的宽度（像素）。
    pub tile_width: u32,
    /// 单次绘制分块的高度（像素）。
    pub tile_height: u32,
    /// 图像左上角所在行（从 0 开始）。
    pub offset_row: u32,
    /// 图像左上角所在列（从 0 开始）。
    pub offset_column: u32,
    /// 相邻分块之间的固定等待时间，用于规避宿主写入频率限制。
    pub breathing: Duration,
    /// 等比缩放的取整方式。
    pub rounding: RoundingMode,
    /// 是否跳过纯白像素（保持单元格无填充）。
    pub skip_blank: bool,
    /// 缩放滤镜。
    pub resize_filter: FilterType,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_width: 120,
            max_height: 100,
            cell_width: 4.0,
            cell_height: 4.0,
            tile_width: 30,
            tile_height: 30,
            offset_row: 0,
            offset_column: 0,
            breathing: Duration::from_millis(3_000),
            rounding: RoundingMode::Floor,
            skip_blank: true,
            resize_filter: FilterType::Triangle,
        }
    }
}

impl RenderConfig {
    /// 校验配置是否可用于渲染。
    ///
    /// # 示例
    /// ```rust
    /// use pixel_sheet::config::RenderConfig;
    ///
    /// let mut config = RenderConfig::default();
    /// assert!(config.validate().is_ok());
    ///
    /// config.tile_width = 0;
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), RenderError> {
        if self.max_width == 0 || self.max_height == 0 {
            return Err(RenderError::InvalidConfig(
                "max_width / max_height 必须大于 0".to_string(),
            ));
        }
        if self.tile_width == 0 || self.tile_height == 0 {
            return Err(RenderError::InvalidConfig(
                "tile_width / tile_height 必须大于 0".to_string(),
            ));
        }
        if !(self.cell_width.is_finite() && self.cell_width > 0.0)
            || !(self.cell_height.is_finite() && self.cell_height > 0.0)
        {
            return Err(RenderError::InvalidConfig(format!(
                "单元格尺寸无效：{}x{}",
                self.cell_width, self.cell_height
            )));
        }
        if self.offset_row >= SHEET_MAX_ROWS || self.offset_column >= SHEET_MAX_COLUMNS {
            return Err(RenderError::InvalidConfig(format!(
                "偏移超出表格范围：row={} column={}",
                self.offset_row, self.offset_column
            )));
        }
        Ok(())
    }
}

/// 网络获取配置。
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// 跨域中转前缀，拼接在原始 URL 之前；`None` 表示直连。
    pub relay_prefix: Option<String>,
    /// 下载总超时（秒）。
    pub download_timeout: u64,
    /// 建立连接超时（秒）。
    pub connect_timeout: u64,
    /// 下载分块读取超时（毫秒）。
    pub stream_chunk_timeout_ms: u64,
    /// 最大重定向次数。
    pub max_redirects: usize,
    /// 允许下载的最大载荷（字节）。
    pub max_file_size: u64,
    /// 解码后允许的最大像素数（`width * height`）。
    pub max_decoded_pixels: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            relay_prefix: Some("https://sofetch.glitch.me/".to_string()),
            download_timeout: 30,
            connect_timeout: 8,
            stream_chunk_timeout_ms: 15_000,
            max_redirects: 5,
            max_file_size: 20 * 1024 * 1024,
            max_decoded_pixels: 40_000_000,
        }
    }
}

impl FetchConfig {
    /// 直连配置（不经过中转）。
    pub fn direct() -> Self {
        Self {
            relay_prefix: None,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), RenderError> {
        if !(1..=300).contains(&self.download_timeout) {
            return Err(RenderError::InvalidConfig(
                "download_timeout 必须在 1~300 秒之间".to_string(),
            ));
        }
        if !(1..=120).contains(&self.connect_timeout) {
            return Err(RenderError::InvalidConfig(
                "connect_timeout 必须在 1~120 秒之间".to_string(),
            ));
        }
        if !(100..=120_000).contains(&self.stream_chunk_timeout_ms) {
            return Err(RenderError::InvalidConfig(
                "stream_chunk_timeout_ms 必须在 100~120000 毫秒之间".to_string(),
            ));
        }
        if self.max_file_size == 0 || self.max_decoded_pixels == 0 {
            return Err(RenderError::InvalidConfig(
                "max_file_size / max_decoded_pixels 必须大于 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// 文字填充方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextFill {
    /// 纯色填充。
    Solid(Rgb),
    /// 红 → 绿 → 蓝的线性渐变，沿文字外框对角方向展开。
    Gradient,
}

/// 文字渲染样式。
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    /// 字号（像素），同时作为文字行高。
    pub font_size: f32,
    /// 四周留白（像素）。
    pub margin: u32,
    pub fill: TextFill,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_size: 24.0,
            margin: 4,
            fill: TextFill::Gradient,
        }
    }
}

impl TextStyle {
    pub fn validate(&self) -> Result<(), RenderError> {
        if !(self.font_size.is_finite() && self.font_size >= 1.0) {
            return Err(RenderError::InvalidConfig(format!(
                "字号无效：{}",
                self.font_size
            )));
        }
        Ok(())
    }

    /// 字号向上取整后的像素高度。
    pub fn line_height(&self) -> u32 {
        self.font_size.ceil().clamp(1.0, u32::MAX as f32) as u32
    }
}
