// 该文件是 Tianyan （田眼） 项目的一部分。
// src/model/regression.rs - 环境产量回归模型
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
  model::{EnvironmentSample, Model, ModelError, OnnxSession, OnnxSessionBuilder},
};

/// 表格回归：(气温, 农药, 降雨) -> 原始产量
pub struct YieldRegressor {
  session: OnnxSession,
}

impl FromUrl for YieldRegressor {
  type Error = ModelError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    let session = OnnxSessionBuilder::from_url(url)?.build()?;
    Ok(YieldRegressor { session })
  }
}

impl YieldRegressor {
  /// 取第一个输出元素作为原始产量
  pub fn postprocess(output: &[f32]) -> Result<f64, ModelError> {
    let value = output
      .first()
      .copied()
      .ok_or_else(|| ModelError::InvalidOutput("回归输出为空".to_string()))?;
    debug!("环境回归输出: {}", value);
    Ok(value as f64)
  }
}

impl Model for YieldRegressor {
  type Input = EnvironmentSample;
  type Output = f64;
  type Error = ModelError;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    debug!("环境回归输入: {:?}", input);
    let output = self.session.run([1, 3], input.as_row().to_vec())?;
    Self::postprocess(&output)
  }
}
