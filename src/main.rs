//! # 像素表格：命令行入口
//!
//! 下载固定的示例图片，缩放后绘制到内存表格，并以 JSON 输出渲染结果。
//! 业务逻辑分布在各子模块中，详见 `lib.rs` 架构文档。

use std::process::ExitCode;

use pixel_sheet::config::{FetchConfig, RenderConfig};
use pixel_sheet::image_source::{HttpFetcher, ImageAcquirer, ImageCrateDecoder, ImageSource};
use pixel_sheet::renderer::{GridRenderer, MemorySheet};
use pixel_sheet::RenderError;

const IMAGE_URL: &str =
    "https://upload.wikimedia.org/wikipedia/commons/thumb/8/81/Embroidery-christmas-candles.jpg/120px-Embroidery-christmas-candles.jpg";

async fn run() -> Result<bool, RenderError> {
    let render_config = RenderConfig::default();
    let fetch_config = FetchConfig::default();

    let decoder = ImageCrateDecoder::from_config(&fetch_config);
    let acquirer = ImageAcquirer::for_urls(HttpFetcher::new(fetch_config)?, decoder);
    let image = acquirer
        .acquire(&ImageSource::Url(IMAGE_URL.to_string()), &render_config)
        .await?;

    let mut sheet = MemorySheet::new();
    let outcome = GridRenderer::new(&render_config)?
        .render(&mut sheet, &image)
        .await?;

    match serde_json::to_string_pretty(&outcome) {
        Ok(json) => log::info!("渲染结果：\n{}", json),
        Err(err) => log::warn!("渲染结果序列化失败：{err}"),
    }

    Ok(outcome.is_completed())
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run().await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            log::error!("❌ 渲染失败 [{}]：{err}", err.code());
            ExitCode::FAILURE
        }
    }
}
