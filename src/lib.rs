//! # 像素表格：库入口
//!
//! 把一张图片（或一段文字）画进电子表格：每个像素对应一个单元格，
//! 像素颜色写成单元格背景色。
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  ImageSource (Url / Text)                                │
//! │       ↓                                                  │
//! │  image_source ── ImageAcquirer                           │
//! │   ├─ loader     HTTP 下载 · 中转前缀 · 类型/体积校验      │
//! │   ├─ pipeline   解码 · 像素限制 · 两段式等比缩放          │
//! │   └─ text       文字测量 · 渐变填充 · 草稿画布裁剪        │
//! │       ↓                                                  │
//! │  RasterImage (不可变 RGBA + 尺寸)                         │
//! │       ↓                                                  │
//! │  renderer ── GridRenderer                                │
//! │   ├─ tiling     行优先分块                                │
//! │   ├─ painter    逐格填色 · 固定节流 · 首错中止            │
//! │   └─ sink       GridSink (MemorySheet / 宿主表格)         │
//! │       ↓                                                  │
//! │  RenderOutcome (Completed / Aborted)                     │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `RenderError` |
//! | [`config`] | 渲染、下载与文字样式配置 |
//! | [`color`] | 颜色值、十六进制编码、是否写入的判定 |
//! | [`grid_address`] | 列号 ↔ 列标签、区域地址 |
//! | [`image_source`] | 从 URL 或文字获取 `RasterImage` |
//! | [`renderer`] | 将 `RasterImage` 分块写入 `GridSink` |

pub mod color;
pub mod config;
pub mod error;
pub mod grid_address;
pub mod image_source;
pub mod renderer;

pub use error::RenderError;
