//! # 表格写入接口
//!
//! `GridSink` 抽象“可寻址的单元格网格”：建立表面、设置区域尺寸、逐格填色。
//! 渲染器只依赖该接口，宿主表格与内存实现可互换。

use std::collections::HashMap;

use crate::config::{SHEET_MAX_COLUMNS, SHEET_MAX_ROWS};
use crate::error::RenderError;
use crate::grid_address::{parse_range_address, range_address};

/// 单元格网格写入能力。
///
/// 所有方法失败时返回 `SinkWriteFailure`。
pub trait GridSink {
    /// 创建并激活一张新的绘制表面。
    fn prepare_surface(&mut self) -> Result<(), RenderError>;

    /// 为 `address`（如 `"A1:D4"`）内的所有单元格设置列宽与行高。
    fn set_range_dimensions(
        &mut self,
        address: &str,
        column_width: f64,
        row_height: f64,
    ) -> Result<(), RenderError>;

    /// 将 `(row, column)` 单元格的背景设为 `color`（`#rrggbb`）。
    fn set_fill_color(&mut self, row: u32, column: u32, color: &str) -> Result<(), RenderError>;
}

/// 一次区域尺寸设置的记录。
#[derive(Debug, Clone, PartialEq)]
pub struct RangeFormat {
    pub address: String,
    pub column_width: f64,
    pub row_height: f64,
}

/// 内存表格实现，遵循主流电子表格的行列上限。
#[derive(Debug, Default)]
pub struct MemorySheet {
    active: bool,
    fills: HashMap<(u32, u32), String>,
    formats: Vec<RangeFormat>,
    writes: usize,
}

impl MemorySheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// 读取单元格填充色；未填充返回 `None`。
    pub fn fill_at(&self, row: u32, column: u32) -> Option<&str> {
        self.fills.get(&(row, column)).map(String::as_str)
    }

    pub fn fills(&self) -> &HashMap<(u32, u32), String> {
        &self.fills
    }

    pub fn formats(&self) -> &[RangeFormat] {
        &self.formats
    }

    /// 成功写入的填色次数（同一单元格重复写入也计数）。
    pub fn write_count(&self) -> usize {
        self.writes
    }

    fn ensure_active(&self) -> Result<(), RenderError> {
        if self.active {
            Ok(())
        } else {
            Err(RenderError::SinkWriteFailure("表格表面尚未激活".to_string()))
        }
    }

    fn ensure_in_bounds(row: u32, column: u32) -> Result<(), RenderError> {
        if row >= SHEET_MAX_ROWS || column >= SHEET_MAX_COLUMNS {
            return Err(RenderError::SinkWriteFailure(format!(
                "单元格超出表格范围：row={} column={}",
                row, column
            )));
        }
        Ok(())
    }
}

/// `#rrggbb` 格式校验。
fn is_hex_color(color: &str) -> bool {
    color.len() == 7
        && color.starts_with('#')
        && color.bytes().skip(1).all(|b| b.is_ascii_hexdigit())
}

impl GridSink for MemorySheet {
    fn prepare_surface(&mut self) -> Result<(), RenderError> {
        self.active = true;
        self.fills.clear();
        self.formats.clear();
        self.writes = 0;
        log::debug!("📄 已创建并激活新表格");
        Ok(())
    }

    fn set_range_dimensions(
        &mut self,
        address: &str,
        column_width: f64,
        row_height: f64,
    ) -> Result<(), RenderError> {
        self.ensure_active()?;

        let ((top, left), (bottom, right)) = parse_range_address(address)
            .ok_or_else(|| RenderError::SinkWriteFailure(format!("区域地址无效：{}", address)))?;
        if bottom < top || right < left {
            return Err(RenderError::SinkWriteFailure(format!(
                "区域地址方向无效：{}",
                address
            )));
        }
        Self::ensure_in_bounds(bottom, right)?;

        if !(column_width.is_finite() && column_width > 0.0 && row_height.is_finite() && row_height > 0.0) {
            return Err(RenderError::SinkWriteFailure(format!(
                "单元格尺寸无效：{}x{}",
                column_width, row_height
            )));
        }

        self.formats.push(RangeFormat {
            address: address.to_string(),
            column_width,
            row_height,
        });
        Ok(())
    }

    fn set_fill_color(&mut self, row: u32, column: u32, color: &str) -> Result<(), RenderError> {
        self.ensure_active()?;
        Self::ensure_in_bounds(row, column)?;

        if !is_hex_color(color) {
            return Err(RenderError::SinkWriteFailure(format!("颜色格式无效：{}", color)));
        }

        self.fills.insert((row, column), color.to_ascii_lowercase());
        self.writes += 1;
        Ok(())
    }
}

/// 便于日志输出的区域描述；零尺寸区域返回 `"(empty)"`。
pub fn describe_range(top_row: u32, left_column: u32, height: u32, width: u32) -> String {
    range_address(top_row, left_column, height, width).unwrap_or_else(|| "(empty)".to_string())
}
