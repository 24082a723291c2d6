// 该文件是 Tianyan （田眼） 项目的一部分。
// src/input.rs - 图像输入
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

use thiserror::Error;

use crate::frame::RgbFrame;

mod image_directory;
mod read_image_file;

pub use self::image_directory::ImageDirectory;
pub use self::read_image_file::ImageFileInput;

#[derive(Error, Debug)]
pub enum InputError {
  #[error("URI scheme mismatch: expected '{expected}', found '{found}'")]
  SchemeMismatch { expected: String, found: String },
  #[error("I/O error: {0}")]
  IoError(#[from] std::io::Error),
  #[error("Image loading error: {0}")]
  ImageLoadError(#[from] image::ImageError),
  #[error("Empty image data")]
  EmptyImage,
  #[error("No images found in {0}")]
  NoImages(String),
}

/// 解码上传的图像字节，统一转为 RGB
pub fn decode_image(bytes: &[u8]) -> Result<RgbFrame, InputError> {
  if bytes.is_empty() {
    return Err(InputError::EmptyImage);
  }
  let image = image::load_from_memory(bytes)?;
  Ok(RgbFrame::from(image.to_rgb8()))
}
