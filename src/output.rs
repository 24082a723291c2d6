// 该文件是 Tianyan （田眼） 项目的一部分。
// src/output.rs - 输出定义
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

use std::io::Cursor;

use image::{ImageFormat, RgbImage};
use thiserror::Error;

use crate::frame::FrameError;

pub trait Render<Frame, Output> {
  type Rendered;
  type Error;
  fn render_result(&self, frame: &Frame, result: &Output) -> Result<Self::Rendered, Self::Error>;
}

pub mod draw;
pub mod html;

pub use self::draw::{Draw, PngOverlay};

#[derive(Error, Debug)]
pub enum RenderError {
  #[error("图像错误: {0}")]
  ImageError(#[from] image::ImageError),
  #[error("嵌入字体无效")]
  InvalidFont,
  #[error("掩码与图像尺寸不一致: {0}")]
  ShapeMismatch(#[from] FrameError),
}

/// 编码为 PNG 字节
pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>, RenderError> {
  let mut buffer = Cursor::new(Vec::new());
  image.write_to(&mut buffer, ImageFormat::Png)?;
  Ok(buffer.into_inner())
}
