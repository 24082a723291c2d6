// 该文件是 Tianyan （田眼） 项目的一部分。
// src/server/routes.rs - 路由处理
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
  body::Bytes,
  extract::{Multipart, State},
  http::header,
  response::{Html, IntoResponse},
};
use rand::{SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use crate::{
  output::{Render, html},
  round2,
  server::{
    AppState, ApiError, UploadForm,
    form::decode_upload,
  },
  task::{HealthTask, SurveyReport, SurveyTask, Task, WeedTask, YieldReport, YieldTask},
};

/// 在阻塞线程池上执行推理
async fn run_blocking<T, F>(f: F) -> Result<T, ApiError>
where
  T: Send + 'static,
  F: FnOnce() -> Result<T, ApiError> + Send + 'static,
{
  tokio::task::spawn_blocking(f).await?
}

pub async fn home() -> Html<&'static str> {
  Html(html::HOME_PAGE)
}

pub async fn weed_form() -> Html<&'static str> {
  Html(html::WEED_FORM)
}

pub async fn health_form() -> Html<&'static str> {
  Html(html::HEALTH_FORM)
}

pub async fn yield_form() -> Html<&'static str> {
  Html(html::YIELD_FORM)
}

pub async fn predict_weed(
  State(state): State<AppState>,
  multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
  let image = UploadForm::read(multipart).await?.require_image()?;

  let png = run_blocking(move || {
    let frame = decode_upload(&image)?;
    let (frame, report) = WeedTask::new(frame).run_task(&state.models)?;
    Ok(state.overlay.render_result(&frame, &report)?)
  })
  .await?;

  Ok(([(header::CONTENT_TYPE, "image/png")], png))
}

pub async fn health(
  State(state): State<AppState>,
  multipart: Multipart,
) -> Result<Html<String>, ApiError> {
  let image = UploadForm::read(multipart).await?.require_image()?;

  let status = run_blocking(move || {
    let frame = decode_upload(&image)?;
    Ok(HealthTask::new(frame).run_task(&state.models)?)
  })
  .await?;

  Ok(Html(html::health_result(status)))
}

async fn yield_report(state: AppState, multipart: Multipart) -> Result<YieldReport, ApiError> {
  let mut form = UploadForm::read(multipart).await?;
  let environment = form.environment()?;
  let image = form.take_image();

  run_blocking(move || {
    let canopy = image.as_deref().map(decode_upload).transpose()?;
    let task = YieldTask::new(canopy, Some(environment), state.config.yield_settings);
    Ok(task.run_task(&state.models)?)
  })
  .await
}

pub async fn predict_yield(
  State(state): State<AppState>,
  multipart: Multipart,
) -> Result<Html<String>, ApiError> {
  let report = yield_report(state, multipart).await?;
  Ok(Html(html::yield_result(&report)))
}

/// JSON 形式的产量结果，缺失的分量不输出
#[derive(Debug, Serialize, PartialEq)]
pub struct YieldResponse {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub vegetation_cover_percent: Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub weed_cover_percent: Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub crop_cover_percent: Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub yield_canopy_t_ha: Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub yield_env_t_ha: Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub yield_hybrid_t_ha: Option<f64>,
}

impl From<&YieldReport> for YieldResponse {
  fn from(report: &YieldReport) -> Self {
    let cover = report.cover.as_ref();
    Self {
      vegetation_cover_percent: cover.map(|c| round2(c.vegetation)),
      weed_cover_percent: cover.map(|c| round2(c.weed)),
      crop_cover_percent: cover.map(|c| round2(c.crop)),
      yield_canopy_t_ha: report.estimate.canopy().map(round2),
      yield_env_t_ha: report.estimate.environment().map(round2),
      yield_hybrid_t_ha: report.estimate.hybrid().map(round2),
    }
  }
}

pub async fn api_predict_yield(
  State(state): State<AppState>,
  multipart: Multipart,
) -> Result<Json<YieldResponse>, ApiError> {
  let report = yield_report(state, multipart).await?;
  if report.estimate.is_none() {
    return Err(ApiError::InvalidInput(html::NO_INPUTS.to_string()));
  }
  Ok(Json(YieldResponse::from(&report)))
}

#[derive(Debug, Default, Deserialize)]
pub struct AnalyzeRequest {
  #[serde(default)]
  pub altitude_meters: Option<f64>,
}

/// 请求体可为空，此时使用默认高度
pub async fn analyze(
  State(state): State<AppState>,
  body: Bytes,
) -> Result<Json<SurveyReport>, ApiError> {
  let request = if body.iter().all(u8::is_ascii_whitespace) {
    AnalyzeRequest::default()
  } else {
    serde_json::from_slice::<AnalyzeRequest>(&body)
      .map_err(|err| ApiError::InvalidInput(format!("JSON 解析失败: {}", err)))?
  };

  let report = run_blocking(move || {
    let task = SurveyTask::new(
      request.altitude_meters,
      state.weed_images(),
      state.health_images(),
      state.config.yield_settings,
      StdRng::from_entropy(),
    );
    Ok(task.run_task(&state.models)?)
  })
  .await?;

  Ok(Json(report))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{cover::CoverFeatures, harvest::YieldEstimate};

  #[test]
  fn yield_response_skips_missing_parts() {
    let report = YieldReport {
      cover: None,
      estimate: YieldEstimate::from_parts(None, Some(0.1234)),
    };
    let value = serde_json::to_value(YieldResponse::from(&report)).unwrap();
    assert_eq!(value, serde_json::json!({ "yield_env_t_ha": 0.12 }));
  }

  #[test]
  fn yield_response_rounds_everything() {
    let report = YieldReport {
      cover: Some(CoverFeatures::new(80.004, 30.0)),
      estimate: YieldEstimate::from_parts(Some(1.45), Some(0.2)),
    };
    let response = YieldResponse::from(&report);
    assert_eq!(response.vegetation_cover_percent, Some(80.0));
    assert_eq!(response.crop_cover_percent, Some(50.0));
    assert_eq!(response.yield_hybrid_t_ha, Some(0.95));
  }
}
