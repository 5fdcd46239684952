//! # 分块规划
//!
//! 将 `width × height` 的图像按 `tile_width × tile_height` 切成行优先排列的矩形分块；
//! 边缘分块可能小于标准尺寸，所有分块恰好覆盖每个像素一次。

use std::ops::Range;

use crate::error::RenderError;

/// 单个分块：图像坐标下的行、列半开区间。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    /// 行优先序号，从 0 开始。
    pub index: usize,
    pub rows: Range<u32>,
    pub columns: Range<u32>,
}

impl Tile {
    pub fn pixel_count(&self) -> u64 {
        u64::from(self.rows.end - self.rows.start) * u64::from(self.columns.end - self.columns.start)
    }
}

/// 分块计划。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TilePlan {
    width: u32,
    height: u32,
    tile_width: u32,
    tile_height: u32,
}

impl TilePlan {
    /// # 示例
    /// ```rust
    /// use pixel_sheet::renderer::TilePlan;
    ///
    /// let plan = TilePlan::new(70, 65, 30, 30)?;
    /// assert_eq!((plan.row_passes(), plan.column_passes()), (3, 3));
    /// assert_eq!(plan.tile_count(), 9);
    /// # Ok::<(), pixel_sheet::RenderError>(())
    /// ```
    pub fn new(width: u32, height: u32, tile_width: u32, tile_height: u32) -> Result<Self, RenderError> {
        if tile_width == 0 || tile_height == 0 {
            return Err(RenderError::InvalidConfig(format!(
                "分块尺寸必须大于 0：{}x{}",
                tile_width, tile_height
            )));
        }
        Ok(Self {
            width,
            height,
            tile_width,
            tile_height,
        })
    }

    pub fn row_passes(&self) -> u32 {
        self.height.div_ceil(self.tile_height)
    }

    pub fn column_passes(&self) -> u32 {
        self.width.div_ceil(self.tile_width)
    }

    pub fn tile_count(&self) -> usize {
        self.row_passes() as usize * self.column_passes() as usize
    }

    pub fn is_last(&self, tile: &Tile) -> bool {
        tile.index + 1 == self.tile_count()
    }

    /// 行优先遍历所有分块。
    pub fn tiles(&self) -> impl Iterator<Item = Tile> + '_ {
        let columns = self.column_passes();
        (0..self.row_passes()).flat_map(move |row_pass| {
            (0..columns).map(move |column_pass| {
                let top = row_pass * self.tile_height;
                let left = column_pass * self.tile_width;
                Tile {
                    index: row_pass as usize * columns as usize + column_pass as usize,
                    rows: top..top.saturating_add(self.tile_height).min(self.height),
                    columns: left..left.saturating_add(self.tile_width).min(self.width),
                }
            })
        })
    }
}
