// 该文件是 Tianyan （田眼） 项目的一部分。
// src/server.rs - HTTP 服务
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

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  extract::DefaultBodyLimit,
  routing::{get, post},
};
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::{
  input::ImageDirectory,
  model::Models,
  output::{PngOverlay, RenderError},
  task::YieldSettings,
};

mod error;
mod form;
mod routes;

pub use self::error::ApiError;
pub use self::form::UploadForm;

#[derive(Debug, Clone)]
pub struct ServerConfig {
  pub weed_images_dir: PathBuf,
  pub health_images_dir: PathBuf,
  pub yield_settings: YieldSettings,
  pub max_upload_bytes: usize,
}

#[derive(Clone)]
pub struct AppState {
  pub models: Models,
  pub overlay: Arc<PngOverlay>,
  pub config: Arc<ServerConfig>,
}

impl AppState {
  pub fn new(models: Models, config: ServerConfig) -> Result<Self, RenderError> {
    Ok(Self {
      models,
      overlay: Arc::new(PngOverlay::new()?),
      config: Arc::new(config),
    })
  }

  pub fn weed_images(&self) -> ImageDirectory {
    ImageDirectory::new(&self.config.weed_images_dir)
  }

  pub fn health_images(&self) -> ImageDirectory {
    ImageDirectory::new(&self.config.health_images_dir)
  }
}

pub fn router(state: AppState) -> Router {
  let limit = state.config.max_upload_bytes;

  Router::new()
    .route("/", get(routes::home))
    .route("/weed-form", get(routes::weed_form))
    .route("/health-form", get(routes::health_form))
    .route("/yield-form", get(routes::yield_form))
    .route("/predict-weed", post(routes::predict_weed))
    .route("/health", post(routes::health))
    .route("/predict-yield", post(routes::predict_yield))
    .route("/api/predict-yield", post(routes::api_predict_yield))
    .route("/analyze", post(routes::analyze))
    .layer(DefaultBodyLimit::disable())
    .layer(RequestBodyLimitLayer::new(limit))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}
