// 该文件是 Tianyan （田眼） 项目的一部分。
// src/model/onnx.rs - ONNX 推理会话
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

use ort::{
  session::{Session, builder::GraphOptimizationLevel},
  value::Tensor,
};
use parking_lot::Mutex;
use tracing::{debug, info};
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, model::ModelError, url_file_path};

const ONNX_INTRA_THREADS: usize = 4;

/// 运行时要求独占会话，同一模型的请求在锁上串行
pub struct OnnxSession {
  path: String,
  session: Mutex<Session>,
}

pub struct OnnxSessionBuilder {
  model_path: String,
}

impl FromUrlWithScheme for OnnxSessionBuilder {
  const SCHEME: &'static str = "onnx";
}

impl FromUrl for OnnxSessionBuilder {
  type Error = ModelError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(ModelError::ModelPathError(format!(
        "模型路径必须使用 {} 方案, 实际为 '{}'",
        Self::SCHEME,
        url.scheme()
      )));
    }

    Ok(OnnxSessionBuilder {
      model_path: url_file_path(url),
    })
  }
}

impl OnnxSessionBuilder {
  pub fn build(self) -> Result<OnnxSession, ModelError> {
    info!("加载模型文件: {}", self.model_path);
    let metadata = std::fs::metadata(&self.model_path)?;
    debug!(
      "模型文件大小: {:.2} MB",
      metadata.len() as f64 / (1024.0 * 1024.0)
    );

    let session = Session::builder()?
      .with_optimization_level(GraphOptimizationLevel::Level3)?
      .with_intra_threads(ONNX_INTRA_THREADS)?
      .commit_from_file(&self.model_path)?;

    debug!("模型输入数量: {}", session.inputs.len());
    debug!("模型输出数量: {}", session.outputs.len());
    if session.inputs.is_empty() || session.outputs.is_empty() {
      return Err(ModelError::ModelPathError(format!(
        "模型 {} 缺少输入或输出",
        self.model_path
      )));
    }

    Ok(OnnxSession {
      path: self.model_path,
      session: Mutex::new(session),
    })
  }
}

impl OnnxSession {
  /// 以单个 f32 张量运行，返回第一个输出的扁平数据
  pub fn run<const N: usize>(&self, shape: [usize; N], data: Vec<f32>) -> Result<Vec<f32>, ModelError> {
    let tensor = Tensor::from_array((shape, data))?;

    let mut session = self.session.lock();
    let outputs = session.run(ort::inputs![tensor])?;
    let (out_shape, values) = outputs[0].try_extract_tensor::<f32>()?;
    debug!("模型 {} 输出形状: {:?}", self.path, out_shape);

    Ok(values.to_vec())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn rejects_non_onnx_scheme() {
    let url = Url::parse("image:///m/weed.onnx").unwrap();
    assert!(matches!(
      OnnxSessionBuilder::from_url(&url),
      Err(ModelError::ModelPathError(_))
    ));
  }

  #[test]
  fn missing_checkpoint_fails_to_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("weed.onnx");
    let url = Url::parse(&format!("onnx://{}", path.display())).unwrap();

    let builder = OnnxSessionBuilder::from_url(&url).unwrap_or_else(|_| panic!("onnx 方案应被接受"));
    assert!(matches!(builder.build(), Err(ModelError::ModelLoadError(_))));
  }
}
