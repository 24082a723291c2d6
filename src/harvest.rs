// 该文件是 Tianyan （田眼） 项目的一部分。
// src/harvest.rs - 产量估计与混合
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

use crate::cover::CoverFeatures;

const CROP_WEIGHT: f64 = 0.6;
const WEED_WEIGHT: f64 = 0.3;
const VEGETATION_WEIGHT: f64 = 0.1;
/// 冠层产量上限（吨/公顷）
pub const CANOPY_YIELD_MAX: f64 = 5.0;

const HYBRID_CANOPY_WEIGHT: f64 = 0.6;
const HYBRID_ENVIRONMENT_WEIGHT: f64 = 0.4;

/// 环境回归模型输出的默认缩放除数
pub const DEFAULT_ENV_YIELD_DIVISOR: f64 = 10000.0;

/// 由覆盖率得到的冠层产量，取值在 [0, 5]
pub fn canopy_yield(cover: &CoverFeatures) -> f64 {
  let score =
    CROP_WEIGHT * cover.crop - WEED_WEIGHT * cover.weed + VEGETATION_WEIGHT * cover.vegetation;
  score.max(0.0) / 100.0 * CANOPY_YIELD_MAX
}

pub fn environment_yield(raw: f64, divisor: f64) -> f64 {
  raw / divisor
}

pub fn hybrid_yield(canopy: f64, environment: f64) -> f64 {
  HYBRID_CANOPY_WEIGHT * canopy + HYBRID_ENVIRONMENT_WEIGHT * environment
}

/// 零个、一个或两个分量估计；混合值只在两者都存在时出现
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum YieldEstimate {
  None,
  Canopy {
    canopy: f64,
  },
  Environment {
    environment: f64,
  },
  Both {
    canopy: f64,
    environment: f64,
    hybrid: f64,
  },
}

impl YieldEstimate {
  pub fn from_parts(canopy: Option<f64>, environment: Option<f64>) -> Self {
    match (canopy, environment) {
      (None, None) => YieldEstimate::None,
      (Some(canopy), None) => YieldEstimate::Canopy { canopy },
      (None, Some(environment)) => YieldEstimate::Environment { environment },
      (Some(canopy), Some(environment)) => YieldEstimate::Both {
        canopy,
        environment,
        hybrid: hybrid_yield(canopy, environment),
      },
    }
  }

  pub fn canopy(&self) -> Option<f64> {
    match *self {
      YieldEstimate::Canopy { canopy } | YieldEstimate::Both { canopy, .. } => Some(canopy),
      _ => None,
    }
  }

  pub fn environment(&self) -> Option<f64> {
    match *self {
      YieldEstimate::Environment { environment } | YieldEstimate::Both { environment, .. } => {
        Some(environment)
      }
      _ => None,
    }
  }

  pub fn hybrid(&self) -> Option<f64> {
    match *self {
      YieldEstimate::Both { hybrid, .. } => Some(hybrid),
      _ => None,
    }
  }

  pub fn is_none(&self) -> bool {
    matches!(self, YieldEstimate::None)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
  }

  #[test]
  fn canopy_yield_example() {
    let cover = CoverFeatures::new(80.0, 30.0);
    assert!(approx(canopy_yield(&cover), 1.45));
  }

  #[test]
  fn canopy_yield_clamps_negative_score() {
    let cover = CoverFeatures::new(0.0, 100.0);
    assert_eq!(canopy_yield(&cover), 0.0);
  }

  #[test]
  fn canopy_yield_is_bounded() {
    for veg in (0..=100).step_by(5) {
      for weed in (0..=100).step_by(5) {
        let y = canopy_yield(&CoverFeatures::new(veg as f64, weed as f64));
        assert!((0.0..=CANOPY_YIELD_MAX).contains(&y), "veg={veg} weed={weed} y={y}");
      }
    }
  }

  #[test]
  fn environment_yield_divides() {
    assert!(approx(environment_yield(2000.0, DEFAULT_ENV_YIELD_DIVISOR), 0.2));
  }

  #[test]
  fn hybrid_example() {
    assert!(approx(hybrid_yield(1.45, 0.20), 0.95));
  }

  #[test]
  fn estimate_variants() {
    assert!(YieldEstimate::from_parts(None, None).is_none());

    let canopy_only = YieldEstimate::from_parts(Some(1.0), None);
    assert_eq!(canopy_only.canopy(), Some(1.0));
    assert_eq!(canopy_only.hybrid(), None);

    let env_only = YieldEstimate::from_parts(None, Some(0.5));
    assert_eq!(env_only.environment(), Some(0.5));
    assert_eq!(env_only.hybrid(), None);

    let both = YieldEstimate::from_parts(Some(1.45), Some(0.2));
    assert!(approx(both.hybrid().unwrap(), 0.95));
  }

  #[test]
  fn hybrid_is_not_clamped() {
    let both = YieldEstimate::from_parts(Some(0.0), Some(-1.0));
    assert!(approx(both.hybrid().unwrap(), -0.4));
  }
}
