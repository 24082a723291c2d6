// 该文件是 Tianyan （田眼） 项目的一部分。
// src/output/draw.rs - 杂草分割结果可视化
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

#[cfg(feature = "draw_label")]
use ab_glyph::{FontRef, PxScale};
use image::{Rgb, RgbImage};
#[cfg(feature = "draw_label")]
use imageproc::drawing::draw_text_mut;

use crate::{
  frame::{FrameError, RgbFrame},
  mask::Mask,
  output::{Render, RenderError, encode_png},
  task::WeedReport,
};

// 文本渲染常量
const LABEL_FONT_SIZE: f32 = 36.0;
const LABEL_X: i32 = 30;
const LABEL_Y: i32 = 10;
const LABEL_COLOR: [u8; 3] = [255, 255, 255]; // 白色
const OVERLAY_COLOR: [u8; 3] = [0, 255, 0]; // 绿色
const OVERLAY_ALPHA: f32 = 0.5;

pub struct Draw {
  font_size: f32,
  label_origin: (i32, i32),
  label_color: [u8; 3],
  overlay_color: [u8; 3],
  overlay_alpha: f32,
  #[cfg(feature = "draw_label")]
  font: FontRef<'static>,
}

impl Draw {
  pub fn new() -> Result<Self, RenderError> {
    #[cfg(feature = "draw_label")]
    let font = {
      let font_data: &'static [u8] = include_bytes!("../../assets/font.ttf");
      FontRef::try_from_slice(font_data).map_err(|_| RenderError::InvalidFont)?
    };

    Ok(Self {
      font_size: LABEL_FONT_SIZE,
      label_origin: (LABEL_X, LABEL_Y),
      label_color: LABEL_COLOR,
      overlay_color: OVERLAY_COLOR,
      overlay_alpha: OVERLAY_ALPHA,
      #[cfg(feature = "draw_label")]
      font,
    })
  }

  /// 掩码为真的像素与覆盖色按比例混合，其余像素不变
  pub fn blend_mask(&self, image: &mut RgbImage, mask: &Mask) -> Result<(), RenderError> {
    let (w, h) = image.dimensions();
    if mask.width() != w as usize || mask.height() != h as usize {
      return Err(RenderError::ShapeMismatch(FrameError::ShapeMismatch {
        expected: (w as usize, h as usize),
        actual: (mask.width(), mask.height()),
      }));
    }

    let alpha = self.overlay_alpha;
    for (x, y, pixel) in image.enumerate_pixels_mut() {
      if !mask.get(x as usize, y as usize) {
        continue;
      }
      let mut blended = [0u8; 3];
      for c in 0..3 {
        let value =
          pixel[c] as f32 * (1.0 - alpha) + self.overlay_color[c] as f32 * alpha;
        blended[c] = value.round().clamp(0.0, 255.0) as u8;
      }
      *pixel = Rgb(blended);
    }
    Ok(())
  }

  #[cfg(feature = "draw_label")]
  pub fn draw_label(&self, image: &mut RgbImage, label: &str) {
    let scale = PxScale::from(self.font_size);
    let (x, y) = self.label_origin;
    draw_text_mut(image, Rgb(self.label_color), x, y, scale, &self.font, label);
  }

  #[cfg(not(feature = "draw_label"))]
  pub fn draw_label(&self, _image: &mut RgbImage, _label: &str) {}

  /// 叠加杂草区域并标注杂草占比
  pub fn draw_weeds(&self, frame: &RgbFrame, report: &WeedReport) -> Result<RgbImage, RenderError> {
    let mut image = frame.to_rgb_image();
    self.blend_mask(&mut image, &report.mask)?;
    self.draw_label(&mut image, &format!("Weed: {:.2}%", report.percentage));
    Ok(image)
  }
}

/// 渲染为 PNG 字节的杂草叠加图
pub struct PngOverlay {
  draw: Draw,
}

impl PngOverlay {
  pub fn new() -> Result<Self, RenderError> {
    Ok(Self { draw: Draw::new()? })
  }
}

impl Render<RgbFrame, WeedReport> for PngOverlay {
  type Rendered = Vec<u8>;
  type Error = RenderError;

  fn render_result(&self, frame: &RgbFrame, result: &WeedReport) -> Result<Vec<u8>, RenderError> {
    let image = self.draw.draw_weeds(frame, result)?;
    encode_png(&image)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::mask::ProbabilityMap;

  fn report(mask: Mask) -> WeedReport {
    let probabilities = ProbabilityMap::filled(mask.width(), mask.height(), 0.0);
    WeedReport::from_parts(probabilities, mask)
  }

  #[test]
  fn blend_only_touches_masked_pixels() {
    let draw = Draw::new().unwrap();
    let mut image = RgbImage::from_pixel(2, 1, Rgb([100, 100, 100]));
    let mask = Mask::new(2, 1, vec![true, false]).unwrap();
    draw.blend_mask(&mut image, &mask).unwrap();

    assert_eq!(image.get_pixel(0, 0).0, [50, 178, 50]);
    assert_eq!(image.get_pixel(1, 0).0, [100, 100, 100]);
  }

  #[test]
  fn blend_rejects_mismatched_mask() {
    let draw = Draw::new().unwrap();
    let mut image = RgbImage::new(2, 2);
    let mask = Mask::filled(3, 3, true);
    assert!(matches!(
      draw.blend_mask(&mut image, &mask),
      Err(RenderError::ShapeMismatch(_))
    ));
  }

  #[test]
  fn png_overlay_round_trips_dimensions() {
    let overlay = PngOverlay::new().unwrap();
    let frame = RgbFrame::filled(60, 200, [30, 30, 30]);
    let bytes = overlay
      .render_result(&frame, &report(Mask::filled(200, 60, true)))
      .unwrap();

    let decoded = image::load_from_memory(&bytes).unwrap().to_rgb8();
    assert_eq!(decoded.dimensions(), (200, 60));
    // 远离标签的角落只受绿色叠加影响
    assert_eq!(decoded.get_pixel(199, 59).0, [15, 143, 15]);
  }
}
