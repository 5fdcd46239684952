//! # 渲染结果
//!
//! 渲染要么完整结束，要么在第一次写入失败时中止；两种终态都以值的形式返回，
//! 并可序列化为 JSON 供命令行输出。

use serde::Serialize;

use crate::error::RenderError;

/// 一个成功写入的单元格（图像坐标，不含偏移）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaintedCell {
    pub row: u32,
    pub column: u32,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RenderOutcome {
    Completed {
        painted: u64,
        skipped: u64,
        tiles: usize,
        breaths: usize,
    },
    Aborted {
        /// 失败前最后一个成功写入的单元格；首个写入即失败时为 `None`。
        last: Option<PaintedCell>,
        cause: RenderError,
        painted: u64,
        tile_index: usize,
    },
}

impl RenderOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    pub fn painted(&self) -> u64 {
        match self {
            Self::Completed { painted, .. } | Self::Aborted { painted, .. } => *painted,
        }
    }

    /// 单行诊断信息。
    ///
    /// 中止时格式为 `"(column, row) - #rrggbb: 原因"`。
    pub fn diagnostic(&self) -> String {
        match self {
            Self::Completed {
                painted,
                skipped,
                tiles,
                breaths,
            } => format!(
                "DONE! painted={} skipped={} tiles={} breaths={}",
                painted, skipped, tiles, breaths
            ),
            Self::Aborted {
                last: Some(cell),
                cause,
                ..
            } => format!("({}, {}) - {}: {}", cell.column, cell.row, cell.color, cause),
            Self::Aborted { last: None, cause, .. } => format!("(none) - nothing painted: {}", cause),
        }
    }
}
