//! # 单元格地址工具
//!
//! 列号（从 0 开始）与表格列标签（A, B, …, Z, AA, …）之间的双向转换，
//! 以及 `A1:D4` 形式的区域地址拼接。

/// 将从 0 开始的列号转换为列标签。
///
/// # 示例
/// ```rust
/// use pixel_sheet::grid_address::column_to_canonical;
///
/// assert_eq!(column_to_canonical(0), "A");
/// assert_eq!(column_to_canonical(26), "AA");
/// assert_eq!(column_to_canonical(701), "ZZ");
/// ```
pub fn column_to_canonical(column: u32) -> String {
    let mut letters = Vec::new();
    let mut cur = u64::from(column) + 1;
    while cur > 0 {
        let rem = (cur - 1) % 26;
        letters.push(b'A' + rem as u8);
        cur = (cur - 1) / 26;
    }
    letters.iter().rev().map(|&b| char::from(b)).collect()
}

/// 将列标签解析回从 0 开始的列号（大小写不敏感）。
///
/// 空字符串、非字母字符或超出 `u32` 范围时返回 `None`。
pub fn canonical_to_column(label: &str) -> Option<u32> {
    if label.is_empty() {
        return None;
    }

    let mut col: u64 = 0;
    for b in label.bytes() {
        if !b.is_ascii_alphabetic() {
            return None;
        }
        let digit = u64::from(b.to_ascii_uppercase() - b'A') + 1;
        col = col.checked_mul(26)?.checked_add(digit)?;
        if col > u64::from(u32::MAX) + 1 {
            return None;
        }
    }

    u32::try_from(col - 1).ok()
}

/// 拼接单元格地址，行号从 0 开始传入、以 1 开始输出，如 `(0, 2) -> "C1"`。
pub fn cell_address(row: u32, column: u32) -> String {
    format!("{}{}", column_to_canonical(column), u64::from(row) + 1)
}

/// 计算覆盖 `[top, top + height) × [left, left + width)` 的区域地址。
///
/// 宽或高为 0 时没有可表示的区域，返回 `None`。
pub fn range_address(top_row: u32, left_column: u32, height: u32, width: u32) -> Option<String> {
    if height == 0 || width == 0 {
        return None;
    }

    let bottom_row = top_row.checked_add(height - 1)?;
    let right_column = left_column.checked_add(width - 1)?;

    Some(format!(
        "{}:{}",
        cell_address(top_row, left_column),
        cell_address(bottom_row, right_column)
    ))
}

/// 解析单个单元格地址（如 `"AB12"`）为从 0 开始的 `(row, column)`。
pub fn parse_cell_address(address: &str) -> Option<(u32, u32)> {
    let address = address.trim();
    let split = address.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = address.split_at(split);

    let column = canonical_to_column(letters)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let row: u32 = digits.parse().ok()?;
    if row == 0 {
        return None;
    }

    Some((row - 1, column))
}

/// 解析区域地址（如 `"A1:D4"`）为 `((top, left), (bottom, right))`。
pub fn parse_range_address(range: &str) -> Option<((u32, u32), (u32, u32))> {
    let (start, end) = range.split_once(':')?;
    Some((parse_cell_address(start)?, parse_cell_address(end)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_column_labels() {
        assert_eq!(column_to_canonical(0), "A");
        assert_eq!(column_to_canonical(25), "Z");
        assert_eq!(column_to_canonical(26), "AA");
        assert_eq!(column_to_canonical(27), "AB");
        assert_eq!(column_to_canonical(701), "ZZ");
        assert_eq!(column_to_canonical(702), "AAA");
        assert_eq!(column_to_canonical(16_383), "XFD");
    }

    #[test]
    fn labels_parse_back() {
        assert_eq!(canonical_to_column("A"), Some(0));
        assert_eq!(canonical_to_column("zz"), Some(701));
        assert_eq!(canonical_to_column("XFD"), Some(16_383));
        assert_eq!(canonical_to_column(""), None);
        assert_eq!(canonical_to_column("A1"), None);
    }

    #[test]
    fn extreme_column_round_trips() {
        let label = column_to_canonical(u32::MAX);
        assert_eq!(canonical_to_column(&label), Some(u32::MAX));
        assert_eq!(canonical_to_column("ZZZZZZZZ"), None);
    }

    #[test]
    fn range_address_uses_one_based_rows() {
        assert_eq!(range_address(0, 0, 10, 4).as_deref(), Some("A1:D10"));
        assert_eq!(range_address(2, 26, 1, 1).as_deref(), Some("AA3:AA3"));
        assert_eq!(range_address(0, 0, 0, 5), None);
        assert_eq!(range_address(0, 0, 5, 0), None);
    }

    #[test]
    fn parse_range_address_round_trip() {
        assert_eq!(parse_range_address("B2:C5"), Some(((1, 1), (4, 2))));
        assert_eq!(parse_range_address("A0:B1"), None);
        assert_eq!(parse_range_address("A1"), None);
        assert_eq!(parse_cell_address("1A"), None);
    }
}
