//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 定义全局统一的 `RenderError` 枚举，覆盖“获取图像 → 解码 → 缩放 → 文字栅格化 → 写入表格”
//! 整条链路的失败来源，替代字符串拼接式错误处理。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - `code()` / `stage()` 提供稳定的机器可读字段，便于日志检索与诊断输出。
//! - 实现 `Serialize` 将错误序列化为字符串，供渲染结果 JSON 输出使用。

use serde::Serialize;

/// 渲染链路统一错误类型。
///
/// 获取阶段的错误（`SourceUnavailable` / `DecodeFailure` / `RasterizationFailure` 等）
/// 会在写入表格之前中止；绘制阶段的 `SinkWriteFailure` 由渲染循环捕获并转为
/// [`RenderOutcome::Aborted`](crate::renderer::RenderOutcome::Aborted)。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    /// 网络请求失败（连接失败、超时、非 2xx 响应）
    #[error("图片源不可用：{0}")]
    SourceUnavailable(String),

    /// 载荷不是可解码的图片
    #[error("解码错误：{0}")]
    DecodeFailure(String),

    /// 缩放或裁剪失败
    #[error("缩放错误：{0}")]
    ResampleFailure(String),

    /// 文字转位图失败
    #[error("文字栅格化错误：{0}")]
    RasterizationFailure(String),

    /// 表格拒绝地址或颜色写入
    #[error("表格写入失败：{0}")]
    SinkWriteFailure(String),

    /// 体积或像素数超出上限
    #[error("资源限制：{0}")]
    ResourceLimit(String),

    /// 配置值无法用于渲染
    #[error("配置错误：{0}")]
    InvalidConfig(String),
}

impl RenderError {
    /// 稳定错误码，用于日志聚合与诊断输出。
    pub fn code(&self) -> &'static str {
        match self {
            Self::SourceUnavailable(_) => "E_SOURCE_UNAVAILABLE",
            Self::DecodeFailure(_) => "E_DECODE",
            Self::ResampleFailure(_) => "E_RESAMPLE",
            Self::RasterizationFailure(_) => "E_RASTERIZE",
            Self::SinkWriteFailure(_) => "E_SINK_WRITE",
            Self::ResourceLimit(_) => "E_RESOURCE_LIMIT",
            Self::InvalidConfig(_) => "E_INVALID_CONFIG",
        }
    }

    /// 出错所在的处理阶段。
    pub fn stage(&self) -> &'static str {
        match self {
            Self::SourceUnavailable(_) => "acquire",
            Self::DecodeFailure(_) | Self::ResourceLimit(_) => "decode",
            Self::ResampleFailure(_) => "resample",
            Self::RasterizationFailure(_) => "rasterize",
            Self::SinkWriteFailure(_) => "paint",
            Self::InvalidConfig(_) => "config",
        }
    }

    /// 是否属于获取阶段错误（发生时表格必须保持未修改）。
    pub fn is_acquisition_error(&self) -> bool {
        !matches!(self, Self::SinkWriteFailure(_) | Self::InvalidConfig(_))
    }
}

/// 将错误序列化为人类可读的字符串。
impl Serialize for RenderError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
