// 该文件是 Tianyan （田眼） 项目的一部分。
// src/mask.rs - 像素网格：概率图与二值掩码
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

use image::{ImageBuffer, Luma, imageops::FilterType};

use crate::frame::FrameError;

/// 行优先的二维网格
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T> {
  width: usize,
  height: usize,
  data: Box<[T]>,
}

/// 每像素的 [0,1] 概率或归一化指数
pub type ProbabilityMap = Grid<f32>;

/// 每像素的布尔分类结果
pub type Mask = Grid<bool>;

impl<T: Copy> Grid<T> {
  pub fn new(width: usize, height: usize, data: Vec<T>) -> Result<Self, FrameError> {
    if data.len() != width * height {
      return Err(FrameError::LengthMismatch {
        expected: width * height,
        actual: data.len(),
      });
    }
    Ok(Self {
      width,
      height,
      data: data.into_boxed_slice(),
    })
  }

  pub fn filled(width: usize, height: usize, value: T) -> Self {
    Self {
      width,
      height,
      data: vec![value; width * height].into_boxed_slice(),
    }
  }

  pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
    let data = (0..height)
      .flat_map(|y| (0..width).map(move |x| (x, y)))
      .map(|(x, y)| f(x, y))
      .collect();
    Self {
      width,
      height,
      data,
    }
  }

  pub fn map<U>(&self, f: impl FnMut(T) -> U) -> Grid<U> {
    Grid {
      width: self.width,
      height: self.height,
      data: self.data.iter().copied().map(f).collect(),
    }
  }

  pub fn width(&self) -> usize {
    self.width
  }

  pub fn height(&self) -> usize {
    self.height
  }

  pub fn get(&self, x: usize, y: usize) -> T {
    self.data[y * self.width + x]
  }

  pub fn as_slice(&self) -> &[T] {
    &self.data
  }
}

impl Grid<f32> {
  /// 严格大于阈值的像素记为真
  pub fn threshold(&self, cutoff: f32) -> Mask {
    self.map(|v| v > cutoff)
  }

  /// 双线性缩放到目标尺寸
  pub fn resize(&self, width: usize, height: usize) -> Self {
    if width == self.width && height == self.height {
      return self.clone();
    }

    let source = ImageBuffer::<Luma<f32>, Vec<f32>>::from_fn(
      self.width as u32,
      self.height as u32,
      |x, y| Luma([self.get(x as usize, y as usize)]),
    );
    let resized = image::imageops::resize(&source, width as u32, height as u32, FilterType::Triangle);

    Grid {
      width,
      height,
      data: resized.into_raw().into_boxed_slice(),
    }
  }
}

impl Grid<bool> {
  pub fn count(&self) -> usize {
    self.data.iter().filter(|&&v| v).count()
  }

  /// 100 × 真像素数 / 总像素数，空网格记为 0
  pub fn coverage_percent(&self) -> f64 {
    if self.data.is_empty() {
      return 0.0;
    }
    100.0 * self.count() as f64 / self.data.len() as f64
  }
}
