// 该文件是 Tianyan （田眼） 项目的一部分。
// src/cover.rs - 植被指数与覆盖率
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

use serde::Serialize;
use tracing::debug;

use crate::{
  frame::RgbFrame,
  mask::{Mask, ProbabilityMap},
};

/// 植被掩码的默认阈值
pub const VEGETATION_THRESHOLD: f32 = 0.4;
const NORMALIZE_EPSILON: f32 = 1e-8;

/// 超绿指数 2G - R - B
pub struct ExcessGreen;

impl ExcessGreen {
  /// 单像素的原始指数
  pub fn pixel_index([r, g, b]: [u8; 3]) -> f32 {
    2.0 * g as f32 - r as f32 - b as f32
  }

  /// 全图指数，按最小最大值归一化到 [0,1]
  pub fn compute(frame: &RgbFrame) -> ProbabilityMap {
    let raw = ProbabilityMap::from_fn(frame.width(), frame.height(), |x, y| {
      Self::pixel_index(frame.pixel(x, y))
    });

    let (min, max) = raw
      .as_slice()
      .iter()
      .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
        (lo.min(v), hi.max(v))
      });
    let range = max - min + NORMALIZE_EPSILON;
    debug!("超绿指数范围: [{}, {}]", min, max);

    raw.map(|v| (v - min) / range)
  }

  /// 按阈值得到植被掩码
  pub fn vegetation_mask(frame: &RgbFrame, threshold: f32) -> Mask {
    Self::compute(frame).threshold(threshold)
  }
}

/// 植被、杂草、作物三项覆盖率（百分比）
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CoverFeatures {
  pub vegetation: f64,
  pub weed: f64,
  pub crop: f64,
}

impl CoverFeatures {
  /// 作物覆盖率 = max(0, 植被 - 杂草)
  pub fn new(vegetation: f64, weed: f64) -> Self {
    Self {
      vegetation,
      weed,
      crop: (vegetation - weed).max(0.0),
    }
  }
}

/// 由图像和杂草掩码计算覆盖率，两个掩码各自按自身像素数计算
pub fn extract_cover_features(frame: &RgbFrame, weed_mask: &Mask, threshold: f32) -> CoverFeatures {
  let vegetation_mask = ExcessGreen::vegetation_mask(frame, threshold);
  let features = CoverFeatures::new(
    vegetation_mask.coverage_percent(),
    weed_mask.coverage_percent(),
  );
  debug!(
    "覆盖率: 植被 {:.2}%, 杂草 {:.2}%, 作物 {:.2}%",
    features.vegetation, features.weed, features.crop
  );
  features
}
