// 该文件是 Tianyan （田眼） 项目的一部分。
// src/server/form.rs - multipart 表单读取
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

use std::collections::HashMap;

use axum::{body::Bytes, extract::Multipart};
use tracing::debug;

use crate::{
  frame::RgbFrame,
  input::decode_image,
  model::EnvironmentSample,
  server::ApiError,
};

const IMAGE_FIELD: &str = "image";

/// 已读入内存的上传表单
#[derive(Debug, Default)]
pub struct UploadForm {
  image: Option<Bytes>,
  fields: HashMap<String, String>,
}

impl UploadForm {
  pub async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
    let mut form = UploadForm::default();
    while let Some(field) = multipart.next_field().await? {
      let Some(name) = field.name().map(str::to_owned) else {
        continue;
      };
      if name == IMAGE_FIELD {
        let bytes = field.bytes().await?;
        debug!("收到图像: {} 字节", bytes.len());
        // 浏览器未选文件时也会提交空的文件字段
        if !bytes.is_empty() {
          form.image = Some(bytes);
        }
      } else {
        let text = field.text().await?;
        form.fields.insert(name, text);
      }
    }
    Ok(form)
  }

  pub fn has_image(&self) -> bool {
    self.image.is_some()
  }

  pub fn take_image(&mut self) -> Option<Bytes> {
    self.image.take()
  }

  pub fn require_image(&mut self) -> Result<Bytes, ApiError> {
    self
      .take_image()
      .ok_or_else(|| ApiError::InvalidInput("No image uploaded".to_string()))
  }

  /// 数值字段：缺失或空白视为 0，非数字报错
  pub fn number(&self, name: &str) -> Result<f32, ApiError> {
    match self.fields.get(name).map(|value| value.trim()) {
      None | Some("") => Ok(0.0),
      Some(value) => value
        .parse::<f32>()
        .ok()
        .filter(|parsed| parsed.is_finite())
        .ok_or_else(|| ApiError::InvalidInput(format!("{} must be a number, got '{}'", name, value))),
    }
  }

  pub fn environment(&self) -> Result<EnvironmentSample, ApiError> {
    Ok(EnvironmentSample {
      avg_temp: self.number("avg_temp")?,
      pesticides: self.number("pesticides")?,
      rainfall: self.number("rainfall")?,
    })
  }
}

pub fn decode_upload(bytes: &[u8]) -> Result<RgbFrame, ApiError> {
  decode_image(bytes).map_err(|err| ApiError::InvalidInput(format!("无法解码图像: {}", err)))
}
