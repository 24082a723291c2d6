// 该文件是 Tianyan （田眼） 项目的一部分。
// src/model/preprocess.rs - 模型输入预处理
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

use image::imageops::FilterType;

use crate::frame::RgbFrame;

pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// 缩放到模型输入尺寸，转为 NCHW 排布、ImageNet 归一化的 f32 数据
pub fn to_normalized_nchw(frame: &RgbFrame, width: u32, height: u32) -> Vec<f32> {
  let image = frame.to_rgb_image();
  let resized = if image.dimensions() == (width, height) {
    image
  } else {
    image::imageops::resize(&image, width, height, FilterType::Triangle)
  };

  let plane = (width * height) as usize;
  let mut data = vec![0f32; plane * 3];

  for (x, y, pixel) in resized.enumerate_pixels() {
    let idx = (y * width + x) as usize;
    for c in 0..3 {
      let value = pixel[c] as f32 / 255.0;
      data[c * plane + idx] = (value - IMAGENET_MEAN[c]) / IMAGENET_STD[c];
    }
  }

  data
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn layout_is_channel_planar() {
    let frame = RgbFrame::filled(2, 2, [255, 0, 128]);
    let data = to_normalized_nchw(&frame, 2, 2);
    assert_eq!(data.len(), 12);

    let red = (1.0 - IMAGENET_MEAN[0]) / IMAGENET_STD[0];
    let green = (0.0 - IMAGENET_MEAN[1]) / IMAGENET_STD[1];
    assert!(data[..4].iter().all(|v| (v - red).abs() < 1e-5));
    assert!(data[4..8].iter().all(|v| (v - green).abs() < 1e-5));
  }

  #[test]
  fn resizes_to_model_input() {
    let frame = RgbFrame::filled(7, 5, [10, 20, 30]);
    let data = to_normalized_nchw(&frame, 4, 4);
    assert_eq!(data.len(), 3 * 16);
  }
}
