// 该文件是 Tianyan （田眼） 项目的一部分。
// src/input/image_directory.rs - 从目录中随机取图
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

use rand::{Rng, seq::SliceRandom};
use tracing::debug;

use crate::input::{ImageFileInput, InputError};

const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// 样例图像目录，每次调用重新列目录
#[derive(Debug, Clone)]
pub struct ImageDirectory {
  root: PathBuf,
}

impl ImageDirectory {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  /// 目录下扩展名为 png/jpg/jpeg（不区分大小写）的文件
  pub fn list(&self) -> Result<Vec<PathBuf>, InputError> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(&self.root)? {
      let path = entry?.path();
      let is_image = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
          IMAGE_EXTENSIONS
            .iter()
            .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false);
      if is_image && path.is_file() {
        files.push(path);
      }
    }
    files.sort();
    Ok(files)
  }

  pub fn random_image<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<ImageFileInput, InputError> {
    let files = self.list()?;
    let path = files
      .choose(rng)
      .ok_or_else(|| InputError::NoImages(self.root.display().to_string()))?;
    debug!("随机选取图像: {}", path.display());
    ImageFileInput::open(path)
  }
}

#[cfg(test)]
mod tests {
  use image::{Rgb, RgbImage};
  use rand::{SeedableRng, rngs::StdRng};

  use super::*;

  #[test]
  fn lists_only_images() {
    let dir = tempfile::tempdir().unwrap();
    RgbImage::from_pixel(2, 2, Rgb([1, 1, 1]))
      .save(dir.path().join("a.png"))
      .unwrap();
    std::fs::write(dir.path().join("notes.txt"), "x").unwrap();

    let files = ImageDirectory::new(dir.path()).list().unwrap();
    assert_eq!(files.len(), 1);
  }

  #[test]
  fn empty_directory_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut rng = StdRng::seed_from_u64(7);
    let result = ImageDirectory::new(dir.path()).random_image(&mut rng);
    assert!(matches!(result, Err(InputError::NoImages(_))));
  }

  #[test]
  fn random_image_decodes() {
    let dir = tempfile::tempdir().unwrap();
    RgbImage::from_pixel(3, 3, Rgb([5, 6, 7]))
      .save(dir.path().join("b.jpg"))
      .unwrap();
    let mut rng = StdRng::seed_from_u64(7);
    let input = ImageDirectory::new(dir.path())
      .random_image(&mut rng)
      .unwrap();
    assert_eq!(input.frame().width(), 3);
  }
}
