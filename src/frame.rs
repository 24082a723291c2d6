// 该文件是 Tianyan （田眼） 项目的一部分。
// src/frame.rs - RGB 帧定义
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

use image::{ImageBuffer, Rgb, RgbImage};
use thiserror::Error;

pub const RGB_CHANNELS: usize = 3;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FrameError {
  #[error("通道数不匹配: 期望 {expected}, 实际 {actual}")]
  ChannelMismatch { expected: usize, actual: usize },
  #[error("数据长度不匹配: 期望长度 {expected}, 实际长度 {actual}")]
  LengthMismatch { expected: usize, actual: usize },
  #[error("尺寸不匹配: 期望 {expected:?}, 实际 {actual:?}")]
  ShapeMismatch {
    expected: (usize, usize),
    actual: (usize, usize),
  },
}

/// HWC 排布的 RGB 帧，生命周期为一次请求
#[derive(Debug, Clone)]
pub struct RgbFrame {
  width: usize,
  height: usize,
  data: Box<[u8]>,
}

impl RgbFrame {
  /// 从原始字节构造，通道数必须为 3
  pub fn from_raw(
    width: usize,
    height: usize,
    channels: usize,
    data: Vec<u8>,
  ) -> Result<Self, FrameError> {
    if channels != RGB_CHANNELS {
      return Err(FrameError::ChannelMismatch {
        expected: RGB_CHANNELS,
        actual: channels,
      });
    }

    let expected = RGB_CHANNELS * width * height;
    if data.len() != expected {
      return Err(FrameError::LengthMismatch {
        expected,
        actual: data.len(),
      });
    }

    Ok(Self {
      width,
      height,
      data: data.into_boxed_slice(),
    })
  }

  pub fn with_shape(height: usize, width: usize) -> Self {
    let size = RGB_CHANNELS * width * height;
    Self {
      width,
      height,
      data: vec![0u8; size].into_boxed_slice(),
    }
  }

  /// 用同一个颜色填满整帧
  pub fn filled(height: usize, width: usize, color: [u8; 3]) -> Self {
    let data = color
      .iter()
      .copied()
      .cycle()
      .take(RGB_CHANNELS * width * height)
      .collect::<Vec<_>>();
    Self {
      width,
      height,
      data: data.into_boxed_slice(),
    }
  }

  pub fn height(&self) -> usize {
    self.height
  }

  pub fn width(&self) -> usize {
    self.width
  }

  pub fn pixel_count(&self) -> usize {
    self.width * self.height
  }

  pub fn pixel(&self, x: usize, y: usize) -> [u8; 3] {
    let idx = (y * self.width + x) * RGB_CHANNELS;
    [self.data[idx], self.data[idx + 1], self.data[idx + 2]]
  }

  pub fn set_pixel(&mut self, x: usize, y: usize, color: [u8; 3]) {
    let idx = (y * self.width + x) * RGB_CHANNELS;
    self.data[idx..idx + RGB_CHANNELS].copy_from_slice(&color);
  }

  /// 按行优先顺序遍历像素
  pub fn pixels(&self) -> impl Iterator<Item = [u8; 3]> + '_ {
    self
      .data
      .chunks_exact(RGB_CHANNELS)
      .map(|px| [px[0], px[1], px[2]])
  }

  pub fn to_rgb_image(&self) -> RgbImage {
    ImageBuffer::from_fn(self.width as u32, self.height as u32, |x, y| {
      Rgb(self.pixel(x as usize, y as usize))
    })
  }
}

impl From<RgbImage> for RgbFrame {
  fn from(image: RgbImage) -> Self {
    let (width, height) = image.dimensions();
    Self {
      width: width as usize,
      height: height as usize,
      data: image.into_raw().into_boxed_slice(),
    }
  }
}
