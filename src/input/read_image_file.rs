// 该文件是 Tianyan （田眼） 项目的一部分。
// src/input/read_image_file.rs - 读取图像文件
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

use std::path::Path;

use image::ImageReader;
use tracing::error;
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, frame::RgbFrame, input::InputError, url_file_path};

/// 单张图像文件输入
pub struct ImageFileInput {
  path: String,
  frame: RgbFrame,
}

impl FromUrlWithScheme for ImageFileInput {
  const SCHEME: &'static str = "image";
}

impl FromUrl for ImageFileInput {
  type Error = InputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(InputError::SchemeMismatch {
        expected: Self::SCHEME.to_string(),
        found: url.scheme().to_string(),
      });
    }

    Self::open(url_file_path(url))
  }
}

impl ImageFileInput {
  pub fn open(path: impl AsRef<Path>) -> Result<Self, InputError> {
    let path = path.as_ref();
    let image = ImageReader::open(path)?.decode()?;
    Ok(ImageFileInput {
      path: path.display().to_string(),
      frame: RgbFrame::from(image.to_rgb8()),
    })
  }

  pub fn path(&self) -> &str {
    &self.path
  }

  pub fn frame(&self) -> &RgbFrame {
    &self.frame
  }

  pub fn into_frame(self) -> RgbFrame {
    self.frame
  }
}

#[cfg(test)]
mod tests {
  use image::{Rgb, RgbImage};

  use super::*;

  #[test]
  fn reads_image_from_url() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("field.png");
    RgbImage::from_pixel(4, 3, Rgb([0, 200, 0])).save(&path).unwrap();

    let url = Url::parse(&format!("image://{}", path.display())).unwrap();
    let input = ImageFileInput::from_url(&url).unwrap();
    assert_eq!(input.frame().width(), 4);
    assert_eq!(input.frame().pixel(0, 0), [0, 200, 0]);
  }

  #[test]
  fn rejects_other_scheme() {
    let url = Url::parse("video:///tmp/a.mp4").unwrap();
    assert!(matches!(
      ImageFileInput::from_url(&url),
      Err(InputError::SchemeMismatch { .. })
    ));
  }
}
