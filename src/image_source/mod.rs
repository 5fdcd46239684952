//! # 图像获取模块（image_source）
//!
//! ## 设计思路
//!
//! 将“来源识别 → 下载校验 → 解码缩放 / 文字栅格化”按职责拆分为多个子模块，
//! 最终只产出一个不可变的 `RasterImage` 交给渲染器。
//!
//! - `source`：来源与中间数据模型
//! - `loader`：HTTP 下载、中转前缀与体积/类型校验
//! - `pipeline`：解码、像素限制、两段式等比缩放
//! - `text`：文字测量、渐变填充与裁剪
//! - `handler`：统一编排 + 阶段耗时日志
//!
//! ## 调用链
//!
//! ```text
//! ImageSource
//!    ↓
//! handler.rs（ImageAcquirer::acquire）
//!    ├─ Url  → loader.rs（ImageFetcher）→ pipeline.rs（ImageDecoder + fit_dimensions + resample）
//!    └─ Text → text.rs（Rasterizer + 草稿画布 + 裁剪）
//!    ↓
//! RasterImage
//! ```

mod handler;
mod loader;
mod pipeline;
mod source;
mod text;

pub use handler::ImageAcquirer;
pub use loader::{HttpFetcher, ImageFetcher};
pub use pipeline::{fit_dimensions, resample, ImageCrateDecoder, ImageDecoder};
pub use source::{ImageSource, RasterImage};
pub use text::{
    rasterize_text, ColorStop, FillStyle, FontdueRasterizer, MissingFont, Rasterizer, SCRATCH_CANVAS_SIZE,
};
