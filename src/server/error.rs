// 该文件是 Tianyan （田眼） 项目的一部分。
// src/server/error.rs - HTTP 错误映射
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

use axum::{
  Json,
  extract::multipart::MultipartError,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tokio::task::JoinError;
use tracing::{error, warn};

use crate::{input::InputError, output::RenderError, task::TaskError};

#[derive(Error, Debug)]
pub enum ApiError {
  #[error("{0}")]
  InvalidInput(String),
  #[error("{0}")]
  ExternalModelFailure(String),
  #[error("{0}")]
  Internal(String),
}

impl ApiError {
  pub fn status(&self) -> StatusCode {
    match self {
      ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
      ApiError::ExternalModelFailure(_) | ApiError::Internal(_) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
    }
  }
}

impl From<InputError> for ApiError {
  fn from(err: InputError) -> Self {
    match err {
      // 样例目录为空属于部署问题
      InputError::NoImages(_) | InputError::IoError(_) => ApiError::Internal(err.to_string()),
      _ => ApiError::InvalidInput(err.to_string()),
    }
  }
}

impl From<RenderError> for ApiError {
  fn from(err: RenderError) -> Self {
    ApiError::Internal(err.to_string())
  }
}

impl From<TaskError> for ApiError {
  fn from(err: TaskError) -> Self {
    match err {
      TaskError::Model(err) => ApiError::ExternalModelFailure(err.to_string()),
      TaskError::Input(err) => err.into(),
      TaskError::Render(err) => err.into(),
    }
  }
}

impl From<MultipartError> for ApiError {
  fn from(err: MultipartError) -> Self {
    ApiError::InvalidInput(format!("表单解析失败: {}", err.body_text()))
  }
}

impl From<JoinError> for ApiError {
  fn from(err: JoinError) -> Self {
    ApiError::Internal(format!("后台任务失败: {}", err))
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      error!("请求处理失败: {}", self);
    } else {
      warn!("请求无效: {}", self);
    }
    (status, Json(json!({ "error": self.to_string() }))).into_response()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::ModelError;

  #[test]
  fn task_errors_map_to_status() {
    let model: ApiError = TaskError::Model(ModelError::InferenceFailed("x".into())).into();
    assert_eq!(model.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(matches!(model, ApiError::ExternalModelFailure(_)));

    let input: ApiError = TaskError::Input(InputError::EmptyImage).into();
    assert_eq!(input.status(), StatusCode::BAD_REQUEST);

    let empty_dir: ApiError = TaskError::Input(InputError::NoImages("/tmp".into())).into();
    assert!(matches!(empty_dir, ApiError::Internal(_)));
  }
}
