//! # 颜色工具
//!
//! 像素字节 → `#rrggbb` 字符串的转换，以及“是否需要上色”的判定。
//! 通道值一律钳制到 `[0, 255]`，绝不产出畸形的颜色字符串。

use std::fmt;

use serde::Serialize;

/// 将十进制通道值转换为两位小写十六进制，越界值先钳制。
///
/// # 示例
/// ```rust
/// use pixel_sheet::color::decimal_to_hex;
///
/// assert_eq!(decimal_to_hex(128), "80");
/// assert_eq!(decimal_to_hex(-10), "00");
/// assert_eq!(decimal_to_hex(300), "ff");
/// ```
pub fn decimal_to_hex(value: i32) -> String {
    format!("{:02x}", value.clamp(0, 255))
}

/// 一个 RGB 像素颜色（忽略 alpha）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const RED: Rgb = Rgb::new(255, 0, 0);
    pub const GREEN: Rgb = Rgb::new(0, 255, 0);
    pub const BLUE: Rgb = Rgb::new(0, 0, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// 从 RGBA 字节切片的前三个字节构造；不足三个字节时返回 `None`。
    pub fn from_rgba_slice(bytes: &[u8]) -> Option<Self> {
        match bytes {
            [r, g, b, ..] => Some(Self::new(*r, *g, *b)),
            _ => None,
        }
    }

    /// `#rrggbb` 形式（小写）。
    pub fn to_hex(self) -> String {
        format!(
            "#{}{}{}",
            decimal_to_hex(i32::from(self.r)),
            decimal_to_hex(i32::from(self.g)),
            decimal_to_hex(i32::from(self.b))
        )
    }

    /// CSS 基础颜色关键字（大小写不敏感）。
    pub fn named(name: &str) -> Option<Self> {
        let rgb = match name.trim().to_ascii_lowercase().as_str() {
            "black" => Self::BLACK,
            "white" => Self::WHITE,
            "red" => Self::RED,
            "lime" => Self::GREEN,
            "green" => Self::new(0, 128, 0),
            "blue" => Self::BLUE,
            "yellow" => Self::new(255, 255, 0),
            "cyan" | "aqua" => Self::new(0, 255, 255),
            "magenta" | "fuchsia" => Self::new(255, 0, 255),
            "gray" | "grey" => Self::new(128, 128, 128),
            "silver" => Self::new(192, 192, 192),
            "maroon" => Self::new(128, 0, 0),
            "olive" => Self::new(128, 128, 0),
            "purple" => Self::new(128, 0, 128),
            "teal" => Self::new(0, 128, 128),
            "navy" => Self::new(0, 0, 128),
            "orange" => Self::new(255, 165, 0),
            _ => return None,
        };
        Some(rgb)
    }

    /// 线性插值，`t` 会被钳制到 `[0, 1]`。
    pub fn lerp(self, other: Rgb, t: f32) -> Rgb {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let mix = |a: u8, b: u8| -> u8 {
            let v = f32::from(a) + (f32::from(b) - f32::from(a)) * t;
            v.round().clamp(0.0, 255.0) as u8
        };
        Rgb::new(mix(self.r, other.r), mix(self.g, other.g), mix(self.b, other.b))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// 判断一个像素是否需要写入单元格。
///
/// - `None` 表示通道值缺失（未定义），永远不写入。
/// - `skip_blank` 开启时纯白像素视为背景，保持单元格不着色。
pub fn is_paintable(color: Option<Rgb>, skip_blank: bool) -> bool {
    match color {
        None => false,
        Some(rgb) => !(skip_blank && rgb == Rgb::WHITE),
    }
}
