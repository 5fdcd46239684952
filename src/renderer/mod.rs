//! # 表格渲染模块（renderer）
//!
//! 将 `RasterImage` 逐像素映射为单元格背景色：
//!
//! - `sink`：`GridSink` 写入接口与内存实现 `MemorySheet`
//! - `tiling`：行优先分块计划
//! - `painter`：分块绘制、固定节流与失败中止
//! - `outcome`：可序列化的渲染终态

mod outcome;
mod painter;
mod sink;
mod tiling;

pub use outcome::{PaintedCell, RenderOutcome};
pub use painter::GridRenderer;
pub use sink::{describe_range, GridSink, MemorySheet, RangeFormat};
pub use tiling::{Tile, TilePlan};
