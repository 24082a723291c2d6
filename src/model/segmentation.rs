// 该文件是 Tianyan （田眼） 项目的一部分。
// src/model/segmentation.rs - 杂草分割模型
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
  mask::ProbabilityMap,
  model::{Model, ModelError, OnnxSession, OnnxSessionBuilder, preprocess, sigmoid},
};

const WEED_INPUT_W: u32 = 512;
const WEED_INPUT_H: u32 = 512;

/// 单类 U-Net 分割：输出每像素杂草概率
pub struct WeedSegmenter {
  session: OnnxSession,
}

impl FromUrl for WeedSegmenter {
  type Error = ModelError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    let session = OnnxSessionBuilder::from_url(url)?.build()?;
    Ok(WeedSegmenter { session })
  }
}

impl WeedSegmenter {
  /// logits 转概率，并缩放回原图尺寸
  pub fn postprocess(
    logits: &[f32],
    width: usize,
    height: usize,
  ) -> Result<ProbabilityMap, ModelError> {
    let expected = (WEED_INPUT_W * WEED_INPUT_H) as usize;
    if logits.len() != expected {
      return Err(ModelError::InvalidOutput(format!(
        "分割输出长度为 {}, 期望 {}",
        logits.len(),
        expected
      )));
    }

    let probabilities = logits.iter().map(|&x| sigmoid(x)).collect();
    let map = ProbabilityMap::new(WEED_INPUT_W as usize, WEED_INPUT_H as usize, probabilities)
      .map_err(|e| ModelError::InvalidOutput(e.to_string()))?;

    Ok(map.resize(width, height))
  }
}

impl Model for WeedSegmenter {
  type Input = RgbFrame;
  type Output = ProbabilityMap;
  type Error = ModelError;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    debug!("设置分割模型输入");
    let data = preprocess::to_normalized_nchw(input, WEED_INPUT_W, WEED_INPUT_H);

    debug!("执行分割模型推理");
    let logits = self.session.run(
      [1, 3, WEED_INPUT_H as usize, WEED_INPUT_W as usize],
      data,
    )?;

    Self::postprocess(&logits, input.width(), input.height())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn postprocess_rejects_wrong_length() {
    let err = WeedSegmenter::postprocess(&[0.0; 16], 4, 4).unwrap_err();
    assert!(matches!(err, ModelError::InvalidOutput(_)));
  }

  #[test]
  fn postprocess_resizes_back_to_frame() {
    let logits = vec![10.0f32; 512 * 512];
    let map = WeedSegmenter::postprocess(&logits, 64, 48).unwrap();
    assert_eq!((map.width(), map.height()), (64, 48));
    assert_eq!(map.threshold(0.5).coverage_percent(), 100.0);
  }
}
