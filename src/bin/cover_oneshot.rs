// 该文件是 Tianyan （田眼） 项目的一部分。
// src/bin/cover_oneshot.rs - 单张图像的杂草与覆盖率分析
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use url::Url;

use tianyan::{
  FromUrl,
  cover::{VEGETATION_THRESHOLD, extract_cover_features},
  harvest,
  input::ImageFileInput,
  model::{Model, WeedSegmenter},
  output::{PngOverlay, Render},
  task::WeedReport,
};
use tracing::info;

/// 单张图像分析参数
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 杂草分割模型，例如 onnx:///models/weed_unet.onnx
  #[arg(long, value_name = "MODEL")]
  pub model: Url,
  /// 输入图像，例如 image:///data/field.jpg
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,
  /// 叠加图输出路径 (PNG)
  #[arg(long, value_name = "OUTPUT")]
  pub output: PathBuf,
  /// 超绿指数阈值
  #[arg(long, default_value_t = VEGETATION_THRESHOLD)]
  pub vegetation_threshold: f32,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("模型文件路径: {}", args.model);
  info!("输入来源: {}", args.input);
  info!("输出路径: {}", args.output.display());

  let input_image = ImageFileInput::from_url(&args.input)?;
  let model = WeedSegmenter::from_url(&args.model)?;
  let overlay = PngOverlay::new()?;

  info!("开始推理...");
  let now = std::time::Instant::now();
  let frame = input_image.frame();
  let report = WeedReport::from_probabilities(model.infer(frame)?);
  info!("推理完成，耗时: {:.2?}", now.elapsed());

  let cover = extract_cover_features(frame, &report.mask, args.vegetation_threshold);
  let canopy = harvest::canopy_yield(&cover);
  info!("杂草占比: {:.2}%", report.percentage);
  info!(
    "植被覆盖: {:.2}%, 杂草覆盖: {:.2}%, 作物覆盖: {:.2}%",
    cover.vegetation, cover.weed, cover.crop
  );
  info!("冠层产量: {:.2} t/ha", canopy);

  let png = overlay.render_result(frame, &report)?;
  std::fs::write(&args.output, png)?;
  info!("结果已保存: {}", args.output.display());

  Ok(())
}
