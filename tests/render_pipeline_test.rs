//! End-to-end checks: bytes → acquisition → tiled painting into a `MemorySheet`.

use std::io::Cursor;
use std::time::Duration;

use image::{Rgba, RgbaImage};
use pixel_sheet::color::Rgb;
use pixel_sheet::config::{RenderConfig, TextFill, TextStyle};
use pixel_sheet::image_source::{
    FillStyle, ImageAcquirer, ImageCrateDecoder, ImageFetcher, ImageSource, Rasterizer,
};
use pixel_sheet::renderer::{GridRenderer, GridSink, MemorySheet, RenderOutcome};
use pixel_sheet::RenderError;

struct InMemoryFetcher {
    bytes: Vec<u8>,
}

impl ImageFetcher for InMemoryFetcher {
    async fn fetch(&self, _url: &str) -> Result<Vec<u8>, RenderError> {
        Ok(self.bytes.clone())
    }
}

/// Draws each character as a filled square of `font_size` pixels.
struct SquareGlyphs;

impl Rasterizer for SquareGlyphs {
    fn measure_text(&self, text: &str, font_size: f32) -> Result<f32, RenderError> {
        Ok(text.chars().count() as f32 * font_size)
    }

    fn fill_text(
        &self,
        canvas: &mut RgbaImage,
        text: &str,
        font_size: f32,
        x: f32,
        bottom: f32,
        fill: &FillStyle,
    ) -> Result<(), RenderError> {
        let width = self.measure_text(text, font_size)? as u32;
        let (left, top) = (x as u32, (bottom - font_size) as u32);
        for py in top..bottom as u32 {
            for px in left..left + width {
                let c = fill.color_at(px as f32, py as f32);
                canvas.put_pixel(px, py, Rgba([c.r, c.g, c.b, 255]));
            }
        }
        Ok(())
    }
}

/// Resampling may move a channel by one step.
fn is_near(hex: Option<&str>, expected: Rgb) -> bool {
    let Some(hex) = hex else { return false };
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).unwrap_or(0);
    let (r, g, b) = (channel(1), channel(3), channel(5));
    r.abs_diff(expected.r) <= 1 && g.abs_diff(expected.g) <= 1 && b.abs_diff(expected.b) <= 1
}

/// Left half red, right half white.
fn split_png(width: u32, height: u32) -> Vec<u8> {
    let image = RgbaImage::from_fn(width, height, |x, _| {
        if x < width / 2 {
            Rgba([255, 0, 0, 255])
        } else {
            Rgba([255, 255, 255, 255])
        }
    });
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .expect("encode png");
    bytes
}

#[tokio::test(start_paused = true)]
async fn url_image_is_downscaled_and_painted_in_tiles() {
    let config = RenderConfig::default();
    let acquirer = ImageAcquirer::for_urls(
        InMemoryFetcher {
            bytes: split_png(480, 200),
        },
        ImageCrateDecoder::default(),
    );

    let image = acquirer
        .acquire(&ImageSource::Url("https://example.com/split.png".into()), &config)
        .await
        .expect("acquire");
    assert_eq!((image.width(), image.height()), (120, 50));

    let mut sheet = MemorySheet::new();
    let started = tokio::time::Instant::now();
    let outcome = GridRenderer::new(&config)
        .expect("renderer")
        .render(&mut sheet, &image)
        .await
        .expect("render");

    // 120x50 with 30x30 tiles: 4 columns × 2 rows
    let RenderOutcome::Completed {
        painted,
        skipped,
        tiles,
        breaths,
    } = outcome
    else {
        panic!("expected completion, got {:?}", outcome);
    };
    assert_eq!(tiles, 8);
    assert_eq!(breaths, 7);
    assert_eq!(painted + skipped, 120 * 50);
    assert_eq!(painted as usize, sheet.write_count());
    assert!(started.elapsed() >= Duration::from_millis(7 * 3_000));

    assert_eq!(sheet.formats()[0].address, "A1:DP50");
    assert!(is_near(sheet.fill_at(0, 0), Rgb::RED));
    assert!(is_near(sheet.fill_at(49, 10), Rgb::RED));
    let background = sheet.fill_at(0, 119);
    assert!(background.is_none() || is_near(background, Rgb::WHITE), "got {:?}", background);
}

#[tokio::test(start_paused = true)]
async fn text_image_is_painted_at_native_size() {
    let config = RenderConfig {
        breathing: Duration::from_millis(10),
        ..RenderConfig::default()
    };
    let acquirer = ImageAcquirer::new(
        InMemoryFetcher { bytes: Vec::new() },
        ImageCrateDecoder::default(),
        SquareGlyphs,
    );
    let source = ImageSource::Text {
        text: "Hi".into(),
        style: TextStyle {
            font_size: 8.0,
            margin: 1,
            fill: TextFill::Solid(Rgb::named("purple").expect("css keyword")),
        },
    };

    let image = acquirer.acquire(&source, &config).await.expect("acquire");
    assert_eq!((image.width(), image.height()), (18, 10));

    let mut sheet = MemorySheet::new();
    let outcome = GridRenderer::new(&config)
        .expect("renderer")
        .render(&mut sheet, &image)
        .await
        .expect("render");

    assert_eq!(
        outcome,
        RenderOutcome::Completed {
            painted: 16 * 8,
            skipped: 18 * 10 - 16 * 8,
            tiles: 1,
            breaths: 0,
        }
    );
    assert_eq!(sheet.fill_at(1, 1), Some("#800080"));
    assert_eq!(sheet.fill_at(0, 0), None);
}

#[tokio::test(start_paused = true)]
async fn small_red_image_is_painted_unscaled() {
    let config = RenderConfig {
        max_width: 20,
        max_height: 20,
        ..RenderConfig::default()
    };
    let red = RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255]));
    let mut bytes = Vec::new();
    red.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .expect("encode png");
    let acquirer = ImageAcquirer::for_urls(InMemoryFetcher { bytes }, ImageCrateDecoder::default());

    let image = acquirer
        .acquire(&ImageSource::Url("https://example.com/red.png".into()), &config)
        .await
        .expect("acquire");
    assert_eq!(image.dimension_summary(), "original 10x10 -> resized 10x10");

    let mut sheet = MemorySheet::new();
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
    assert_eq!(sheet.formats()[0].address, "A1:J10");
    assert_eq!(sheet.write_count(), 100);
    assert!(sheet.fills().values().all(|hex| hex == "#ff0000"));
    assert_eq!(sheet.fill_at(9, 9), Some("#ff0000"));
    assert_eq!(sheet.fill_at(10, 10), None);
}

#[tokio::test]
async fn truncated_image_is_an_acquisition_error() {
    let config = RenderConfig::default();
    let acquirer = ImageAcquirer::for_urls(
        InMemoryFetcher {
            bytes: b"GIF89a-truncated".to_vec(),
        },
        ImageCrateDecoder::default(),
    );

    let result = acquirer
        .acquire(&ImageSource::Url("https://example.com/broken.gif".into()), &config)
        .await;

    let err = result.expect_err("truncated gif should not decode");
    assert!(err.is_acquisition_error(), "unexpected error {:?}", err);
}

#[tokio::test(start_paused = true)]
async fn renderer_accepts_trait_object_sinks() {
    let config = RenderConfig::default();
    let image = pixel_sheet::image_source::RasterImage::filled(3, 2, [0, 0, 0, 255]).expect("image");

    let mut sheet = MemorySheet::new();
    let sink: &mut dyn GridSink = &mut sheet;
    let outcome = GridRenderer::new(&config)
        .expect("renderer")
        .render(sink, &image)
        .await
        .expect("render");

    assert_eq!(outcome.painted(), 6);
    assert_eq!(sheet.fill_at(1, 2), Some("#000000"));
}
