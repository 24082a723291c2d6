// 该文件是 Tianyan （田眼） 项目的一部分。
// src/model.rs - 模型
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

use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use url::Url;

use crate::{FromUrl, frame::RgbFrame, mask::ProbabilityMap};

pub trait Model {
  type Input;
  type Output;
  type Error;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error>;
}

#[derive(Error, Debug)]
pub enum ModelError {
  #[error("模型加载错误: {0}")]
  ModelLoadError(#[from] std::io::Error),
  #[error("ONNX 运行时错误: {0}")]
  OrtError(#[from] ort::Error),
  #[error("模型路径错误: {0}")]
  ModelPathError(String),
  #[error("模型输出无效: {0}")]
  InvalidOutput(String),
  #[error("模型推理失败: {0}")]
  InferenceFailed(String),
}

/// 植株健康分类结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
  #[serde(rename = "Healthy")]
  Healthy,
  #[serde(rename = "Not Healthy")]
  NotHealthy,
}

impl HealthStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      HealthStatus::Healthy => "Healthy",
      HealthStatus::NotHealthy => "Not Healthy",
    }
  }
}

impl fmt::Display for HealthStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// 环境回归模型的输入
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EnvironmentSample {
  /// 平均气温（摄氏度）
  pub avg_temp: f32,
  /// 农药用量（吨）
  pub pesticides: f32,
  /// 年均降雨量（毫米）
  pub rainfall: f32,
}

impl EnvironmentSample {
  /// 三项全为 0 视为未提供
  pub fn is_provided(&self) -> bool {
    self.avg_temp != 0.0 || self.pesticides != 0.0 || self.rainfall != 0.0
  }

  pub fn as_row(&self) -> [f32; 3] {
    [self.avg_temp, self.pesticides, self.rainfall]
  }
}

pub type DynSegmenter =
  dyn Model<Input = RgbFrame, Output = ProbabilityMap, Error = ModelError> + Send + Sync;
pub type DynClassifier =
  dyn Model<Input = RgbFrame, Output = HealthStatus, Error = ModelError> + Send + Sync;
pub type DynRegressor =
  dyn Model<Input = EnvironmentSample, Output = f64, Error = ModelError> + Send + Sync;

/// 进程内只加载一次的三个模型
#[derive(Clone)]
pub struct Models {
  pub segmenter: Arc<DynSegmenter>,
  pub classifier: Arc<DynClassifier>,
  pub regressor: Arc<DynRegressor>,
}

impl Models {
  pub fn new(
    segmenter: Arc<DynSegmenter>,
    classifier: Arc<DynClassifier>,
    regressor: Arc<DynRegressor>,
  ) -> Self {
    Self {
      segmenter,
      classifier,
      regressor,
    }
  }

  pub fn load(weed: &Url, health: &Url, environment: &Url) -> Result<Self, ModelError> {
    info!("加载杂草分割模型: {}", weed);
    let segmenter = WeedSegmenter::from_url(weed)?;
    info!("加载健康分类模型: {}", health);
    let classifier = HealthClassifier::from_url(health)?;
    info!("加载环境产量模型: {}", environment);
    let regressor = YieldRegressor::from_url(environment)?;
    info!("模型加载完成");

    Ok(Self::new(
      Arc::new(segmenter),
      Arc::new(classifier),
      Arc::new(regressor),
    ))
  }
}

pub(crate) fn sigmoid(x: f32) -> f32 {
  1.0 / (1.0 + (-x).exp())
}

mod health;
mod onnx;
pub mod preprocess;
mod regression;
mod segmentation;

pub use self::health::HealthClassifier;
pub use self::onnx::{OnnxSession, OnnxSessionBuilder};
pub use self::regression::YieldRegressor;
pub use self::segmentation::WeedSegmenter;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn health_status_display() {
    assert_eq!(HealthStatus::Healthy.to_string(), "Healthy");
    assert_eq!(HealthStatus::NotHealthy.to_string(), "Not Healthy");
    assert_eq!(
      serde_json::to_string(&HealthStatus::NotHealthy).unwrap(),
      "\"Not Healthy\""
    );
  }

  #[test]
  fn zero_environment_is_not_provided() {
    assert!(!EnvironmentSample::default().is_provided());
    let sample = EnvironmentSample {
      rainfall: 800.0,
      ..Default::default()
    };
    assert!(sample.is_provided());
    assert_eq!(sample.as_row(), [0.0, 0.0, 800.0]);
  }

  #[test]
  fn sigmoid_midpoint() {
    assert_eq!(sigmoid(0.0), 0.5);
    assert!(sigmoid(10.0) > 0.99);
    assert!(sigmoid(-10.0) < 0.01);
  }
}
