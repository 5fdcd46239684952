//! # 分块绘制
//!
//! ## 设计思路
//!
//! 渲染分为两步：
//! 1. 建立表面并一次性设置整块区域的单元格尺寸
//! 2. 按行优先逐块写入，块内像素同样行优先；块与块之间固定等待 `breathing`
//!
//! ## 实现思路
//!
//! - 等待时间固定，与本块写入量无关；最后一块之后不等待。
//! - 第一次写入失败立即中止，不重试也不回滚，已写入的单元格保持原样。
//! - 中止时返回最后一个成功写入的单元格，便于定位失败位置。

use std::time::Instant;

use super::outcome::{PaintedCell, RenderOutcome};
use super::sink::{describe_range, GridSink};
use super::tiling::TilePlan;
use crate::color::{is_paintable, Rgb};
use crate::config::RenderConfig;
use crate::error::RenderError;
use crate::grid_address::range_address;
use crate::image_source::RasterImage;

/// 非 `SinkWriteFailure` 的写入错误统一归类为写入失败。
fn as_sink_failure(error: RenderError) -> RenderError {
    match error {
        RenderError::SinkWriteFailure(_) => error,
        other => RenderError::SinkWriteFailure(other.to_string()),
    }
}

/// 表格渲染器。
pub struct GridRenderer<'a> {
    config: &'a RenderConfig,
}

impl<'a> GridRenderer<'a> {
    pub fn new(config: &'a RenderConfig) -> Result<Self, RenderError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &RenderConfig {
        self.config
    }

    /// 将图像绘制到 `sink`。
    ///
    /// 建立表面或设置区域尺寸失败时返回 `Err(SinkWriteFailure)`，此时没有任何单元格被写入；
    /// 绘制过程中的失败以 `Ok(RenderOutcome::Aborted)` 返回。
    pub async fn render<S>(&self, sink: &mut S, image: &RasterImage) -> Result<RenderOutcome, RenderError>
    where
        S: GridSink + ?Sized,
    {
        let config = self.config;
        let (width, height) = (image.width(), image.height());
        let plan = TilePlan::new(width, height, config.tile_width, config.tile_height)?;

        if image.is_empty() {
            log::warn!("⚠️ 图像尺寸为 {}x{}，无需绘制", width, height);
            return Ok(RenderOutcome::Completed {
                painted: 0,
                skipped: 0,
                tiles: 0,
                breaths: 0,
            });
        }

        self.setup(sink, width, height)?;

        let started = Instant::now();
        let mut painted: u64 = 0;
        let mut skipped: u64 = 0;
        let mut breaths: usize = 0;
        let mut last: Option<(u32, u32, Rgb)> = None;

        for tile in plan.tiles() {
            log::debug!(
                "🧱 绘制分块 {}/{}：{}",
                tile.index + 1,
                plan.tile_count(),
                describe_range(
                    tile.rows.start,
                    tile.columns.start,
                    tile.rows.end - tile.rows.start,
                    tile.columns.end - tile.columns.start
                )
            );

            for row in tile.rows.clone() {
                for column in tile.columns.clone() {
                    let color = image.pixel(row, column);
                    let rgb = match color {
                        Some(rgb) if is_paintable(color, config.skip_blank) => rgb,
                        _ => {
                            skipped += 1;
                            continue;
                        }
                    };

                    let target_row = row.saturating_add(config.offset_row);
                    let target_column = column.saturating_add(config.offset_column);

                    if let Err(e) = sink.set_fill_color(target_row, target_column, &rgb.to_hex()) {
                        let outcome = RenderOutcome::Aborted {
                            last: last.map(|(row, column, rgb)| PaintedCell {
                                row,
                                column,
                                color: rgb.to_hex(),
                            }),
                            cause: as_sink_failure(e),
                            painted,
                            tile_index: tile.index,
                        };
                        log::error!("{}", outcome.diagnostic());
                        log::info!("DONE!");
                        return Ok(outcome);
                    }

                    painted += 1;
                    last = Some((row, column, rgb));
                }
            }

            if !plan.is_last(&tile) {
                log::debug!("Breathing...");
                tokio::time::sleep(config.breathing).await;
                breaths += 1;
            }
        }

        let outcome = RenderOutcome::Completed {
            painted,
            skipped,
            tiles: plan.tile_count(),
            breaths,
        };
        log::info!(
            "✅ 绘制完成：{}x{}，写入 {} 格，跳过 {} 格，耗时 {}ms",
            width,
            height,
            painted,
            skipped,
            started.elapsed().as_millis()
        );
        log::info!("DONE!");

        Ok(outcome)
    }

    fn setup<S>(&self, sink: &mut S, width: u32, height: u32) -> Result<(), RenderError>
    where
        S: GridSink + ?Sized,
    {
        let config = self.config;
        let address = range_address(config.offset_row, config.offset_column, height, width).ok_or_else(|| {
            RenderError::SinkWriteFailure(format!(
                "区域超出可寻址范围：offset=({}, {}) size={}x{}",
                config.offset_row, config.offset_column, width, height
            ))
        })?;

        sink.prepare_surface().map_err(as_sink_failure)?;
        sink.set_range_dimensions(&address, config.cell_width, config.cell_height)
            .map_err(as_sink_failure)?;

        log::info!("📐 已设置区域 {} 的单元格尺寸：{}x{}", address, config.cell_width, config.cell_height);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::MemorySheet;
    use std::time::Duration;

    /// 在第 `fail_on_write` 次填色（从 1 开始）时失败的表格。
    struct FlakySheet {
        inner: MemorySheet,
        fail_on_write: Option<usize>,
        fail_setup: bool,
        attempts: usize,
        prepared: bool,
    }

    impl FlakySheet {
        fn failing_at(write: usize) -> Self {
            Self {
                inner: MemorySheet::new(),
                fail_on_write: Some(write),
                fail_setup: false,
                attempts: 0,
                prepared: false,
            }
        }

        fn failing_setup() -> Self {
            Self {
                fail_on_write: None,
                fail_setup: true,
                ..Self::failing_at(0)
            }
        }
    }

    impl GridSink for FlakySheet {
        fn prepare_surface(&mut self) -> Result<(), RenderError> {
            self.prepared = true;
            self.inner.prepare_surface()
        }

        fn set_range_dimensions(&mut self, address: &str, w: f64, h: f64) -> Result<(), RenderError> {
            if self.fail_setup {
                return Err(RenderError::ResourceLimit("host refused format".to_string()));
            }
            self.inner.set_range_dimensions(address, w, h)
        }

        fn set_fill_color(&mut self, row: u32, column: u32, color: &str) -> Result<(), RenderError> {
            self.attempts += 1;
            if Some(self.attempts) == self.fail_on_write {
                return Err(RenderError::SinkWriteFailure("rate limited".to_string()));
            }
            self.inner.set_fill_color(row, column, color)
        }
    }

    /// 左半白、右半黑的图像。
    fn half_white(width: u32, height: u32) -> RasterImage {
        let mut pixels = Vec::with_capacity((width * height * 4) as usize);
        for _row in 0..height {
            for column in 0..width {
                let value = if column < width / 2 { 255 } else { 0 };
                pixels.extend_from_slice(&[value, value, value, 255]);
            }
        }
        RasterImage::new(pixels, width, height).expect("valid image")
    }

    #[tokio::test(start_paused = true)]
    async fn single_tile_paints_every_cell_without_breathing() {
        let config = RenderConfig::default();
        let image = RasterImage::filled(10, 10, [255, 0, 0, 255]).expect("image");
        let mut sheet = MemorySheet::new();

        let started = tokio::time::Instant::now();
        let outcome = GridRenderer::new(&config)
            .expect("renderer")
            .render(&mut sheet, &image)
            .await
            .expect("render");

        assert_eq!(
            outcome,
            RenderOutcome::Completed {
                painted: 100,
                skipped: 0,
                tiles: 1,
                breaths: 0,
            }
        );
        assert_eq!(sheet.fills().len(), 100);
        assert!(sheet.fills().values().all(|c| c == "#ff0000"));
        assert_eq!(sheet.formats()[0].address, "A1:J10");
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn breathes_between_tiles_but_not_after_last() {
        let config = RenderConfig {
            tile_width: 5,
            tile_height: 5,
            ..RenderConfig::default()
        };
        let image = RasterImage::filled(10, 10, [0, 0, 255, 255]).expect("image");
        let mut sheet = MemorySheet::new();

        let started = tokio::time::Instant::now();
        let outcome = GridRenderer::new(&config)
            .expect("renderer")
            .render(&mut sheet, &image)
            .await
            .expect("render");

        assert_eq!(
            outcome,
            RenderOutcome::Completed {
                painted: 100,
                skipped: 0,
                tiles: 4,
                breaths: 3,
            }
        );
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(9_000), "elapsed {:?}", elapsed);
        assert!(elapsed < Duration::from_millis(12_000), "elapsed {:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn white_cells_are_skipped_by_default() {
        let config = RenderConfig::default();
        let image = half_white(8, 3);
        let mut sheet = MemorySheet::new();

        let outcome = GridRenderer::new(&config)
            .expect("renderer")
            .render(&mut sheet, &image)
            .await
            .expect("render");

        assert_eq!(
            outcome,
            RenderOutcome::Completed {
                painted: 12,
                skipped: 12,
                tiles: 1,
                breaths: 0,
            }
        );
        assert_eq!(sheet.fill_at(0, 0), None);
        assert_eq!(sheet.fill_at(0, 4), Some("#000000"));
    }

    #[tokio::test(start_paused = true)]
    async fn white_cells_are_painted_when_skipping_disabled() {
        let config = RenderConfig {
            skip_blank: false,
            ..RenderConfig::default()
        };
        let image = half_white(8, 3);
        let mut sheet = MemorySheet::new();

        let outcome = GridRenderer::new(&config)
            .expect("renderer")
            .render(&mut sheet, &image)
            .await
            .expect("render");

        assert_eq!(outcome.painted(), 24);
        assert_eq!(sheet.fill_at(0, 0), Some("#ffffff"));
    }

    #[tokio::test(start_paused = true)]
    async fn offsets_shift_setup_range_and_cells() {
        let config = RenderConfig {
            offset_row: 2,
            offset_column: 3,
            ..RenderConfig::default()
        };
        let image = RasterImage::filled(10, 10, [0, 255, 0, 255]).expect("image");
        let mut sheet = MemorySheet::new();

        GridRenderer::new(&config)
            .expect("renderer")
            .render(&mut sheet, &image)
            .await
            .expect("render");

        assert_eq!(sheet.formats()[0].address, "D3:M12");
        assert_eq!(sheet.fill_at(2, 3), Some("#00ff00"));
        assert_eq!(sheet.fill_at(11, 12), Some("#00ff00"));
        assert_eq!(sheet.fill_at(0, 0), None);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_reports_last_successful_cell() {
        let config = RenderConfig::default();
        let image = RasterImage::filled(10, 10, [255, 0, 0, 255]).expect("image");
        let mut sheet = FlakySheet::failing_at(5);

        let outcome = GridRenderer::new(&config)
            .expect("renderer")
            .render(&mut sheet, &image)
            .await
            .expect("render");

        match &outcome {
            RenderOutcome::Aborted {
                last,
                cause,
                painted,
                tile_index,
            } => {
                assert_eq!(
                    last.as_ref(),
                    Some(&PaintedCell {
                        row: 0,
                        column: 3,
                        color: "#ff0000".to_string(),
                    })
                );
                assert!(matches!(cause, RenderError::SinkWriteFailure(_)));
                assert_eq!(*painted, 4);
                assert_eq!(*tile_index, 0);
            }
            other => panic!("expected abort, got {:?}", other),
        }
        assert_eq!(outcome.diagnostic(), "(3, 0) - #ff0000: 表格写入失败：rate limited");
        assert_eq!(sheet.inner.write_count(), 4);
        assert_eq!(sheet.attempts, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn nine_tile_render_at_offset_aborts_on_fifth_cell() {
        let config = RenderConfig {
            offset_row: 3,
            offset_column: 700,
            ..RenderConfig::default()
        };
        let image = RasterImage::filled(70, 65, [1, 2, 3, 255]).expect("image");
        let mut sheet = FlakySheet::failing_at(5);

        assert_eq!(
            TilePlan::new(70, 65, config.tile_width, config.tile_height)
                .expect("plan")
                .tile_count(),
            9
        );

        let started = tokio::time::Instant::now();
        let outcome = GridRenderer::new(&config)
            .expect("renderer")
            .render(&mut sheet, &image)
            .await
            .expect("render");

        assert_eq!(sheet.inner.formats().len(), 1);
        assert_eq!(sheet.inner.formats()[0].address, "ZY4:ACP68");
        match &outcome {
            RenderOutcome::Aborted {
                last,
                painted,
                tile_index,
                ..
            } => {
                assert_eq!(
                    last.as_ref(),
                    Some(&PaintedCell {
                        row: 0,
                        column: 3,
                        color: "#010203".to_string(),
                    })
                );
                assert_eq!(*painted, 4);
                assert_eq!(*tile_index, 0);
            }
            other => panic!("expected abort, got {:?}", other),
        }
        assert_eq!(outcome.diagnostic(), "(3, 0) - #010203: 表格写入失败：rate limited");
        // 写入位置带偏移，诊断坐标不带
        assert_eq!(sheet.inner.fill_at(3, 703), Some("#010203"));
        assert_eq!(sheet.inner.fill_at(3, 704), None);
        assert_eq!(sheet.inner.write_count(), 4);
        assert!(started.elapsed() < Duration::from_millis(3_000), "no breath after abort");
    }

    #[tokio::test(start_paused = true)]
    async fn first_write_failure_has_no_last_cell() {
        let config = RenderConfig::default();
        let image = RasterImage::filled(2, 2, [1, 2, 3, 255]).expect("image");
        let mut sheet = FlakySheet::failing_at(1);

        let outcome = GridRenderer::new(&config)
            .expect("renderer")
            .render(&mut sheet, &image)
            .await
            .expect("render");

        assert!(matches!(outcome, RenderOutcome::Aborted { last: None, painted: 0, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn abort_stops_before_later_tiles_and_breaths() {
        let config = RenderConfig {
            tile_width: 2,
            tile_height: 2,
            ..RenderConfig::default()
        };
        let image = RasterImage::filled(4, 2, [9, 9, 9, 255]).expect("image");
        // 第二块的第一个写入失败
        let mut sheet = FlakySheet::failing_at(5);

        let started = tokio::time::Instant::now();
        let outcome = GridRenderer::new(&config)
            .expect("renderer")
            .render(&mut sheet, &image)
            .await
            .expect("render");

        assert!(matches!(outcome, RenderOutcome::Aborted { tile_index: 1, painted: 4, .. }));
        assert_eq!(sheet.attempts, 5);
        assert!(started.elapsed() >= Duration::from_millis(3_000));
        assert!(started.elapsed() < Duration::from_millis(6_000));
    }

    #[tokio::test(start_paused = true)]
    async fn setup_failure_is_an_error_and_paints_nothing() {
        let config = RenderConfig::default();
        let image = RasterImage::filled(3, 3, [0, 0, 0, 255]).expect("image");
        let mut sheet = FlakySheet::failing_setup();

        let result = GridRenderer::new(&config)
            .expect("renderer")
            .render(&mut sheet, &image)
            .await;

        assert!(matches!(result, Err(RenderError::SinkWriteFailure(_))));
        assert_eq!(sheet.attempts, 0);
        assert!(sheet.inner.fills().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn empty_image_never_touches_sink() {
        let config = RenderConfig::default();
        let image = RasterImage::new(Vec::new(), 0, 5).expect("image");
        let mut sheet = FlakySheet::failing_at(1);

        let outcome = GridRenderer::new(&config)
            .expect("renderer")
            .render(&mut sheet, &image)
            .await
            .expect("render");

        assert_eq!(
            outcome,
            RenderOutcome::Completed {
                painted: 0,
                skipped: 0,
                tiles: 0,
                breaths: 0,
            }
        );
        assert!(!sheet.prepared);
        assert_eq!(sheet.attempts, 0);
    }

    #[test]
    fn rejects_invalid_config() {
        let config = RenderConfig {
            tile_width: 0,
            ..RenderConfig::default()
        };
        assert!(matches!(GridRenderer::new(&config), Err(RenderError::InvalidConfig(_))));
    }
}
