// 该文件是 Tianyan （田眼） 项目的一部分。
// src/model/health.rs - 植株健康分类模型
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

use tracing::debug;
use url::Url;

use crate::{
  FromUrl,
  frame::RgbFrame,
  model::{HealthStatus, Model, ModelError, OnnxSession, OnnxSessionBuilder, preprocess, sigmoid},
};

const HEALTH_INPUT_W: u32 = 224;
const HEALTH_INPUT_H: u32 = 224;
const NOT_HEALTHY_THRESH: f32 = 0.5;

pub struct HealthClassifier {
  session: OnnxSession,
}

impl FromUrl for HealthClassifier {
  type Error = ModelError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    let session = OnnxSessionBuilder::from_url(url)?.build()?;
    Ok(HealthClassifier { session })
  }
}

impl HealthClassifier {
  /// 单个 logit，sigmoid 后大于 0.5 判为不健康
  pub fn postprocess(logits: &[f32]) -> Result<HealthStatus, ModelError> {
    let logit = logits
      .first()
      .copied()
      .ok_or_else(|| ModelError::InvalidOutput("分类输出为空".to_string()))?;

    let score = sigmoid(logit);
    debug!("健康分类得分: {:.4}", score);
    if score > NOT_HEALTHY_THRESH {
      Ok(HealthStatus::NotHealthy)
    } else {
      Ok(HealthStatus::Healthy)
    }
  }
}

impl Model for HealthClassifier {
  type Input = RgbFrame;
  type Output = HealthStatus;
  type Error = ModelError;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    let data = preprocess::to_normalized_nchw(input, HEALTH_INPUT_W, HEALTH_INPUT_H);
    debug!("执行健康分类推理");
    let logits = self.session.run(
      [1, 3, HEALTH_INPUT_H as usize, HEALTH_INPUT_W as usize],
      data,
    )?;
    Self::postprocess(&logits)
  }
}
