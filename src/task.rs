// 该文件是 Tianyan （田眼） 项目的一部分。
// src/task.rs - 单次请求的推理任务
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

use std::time::Instant;

use rand::Rng;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::{
  cover::{CoverFeatures, VEGETATION_THRESHOLD, extract_cover_features},
  frame::RgbFrame,
  harvest::{self, DEFAULT_ENV_YIELD_DIVISOR, YieldEstimate},
  input::{ImageDirectory, InputError},
  mask::{Mask, ProbabilityMap},
  model::{EnvironmentSample, HealthStatus, ModelError, Models},
  output::RenderError,
  round2,
};

/// 杂草概率二值化阈值
pub const WEED_THRESHOLD: f32 = 0.5;
/// 低于该高度（米）时才做健康检查
pub const HEALTH_ALTITUDE_LIMIT: f64 = 20.0;
pub const DEFAULT_ALTITUDE: f64 = 50.0;

pub trait Task: Sized {
  type Output;
  type Error;
  fn run_task(self, models: &Models) -> Result<Self::Output, Self::Error>;
}

#[derive(Error, Debug)]
pub enum TaskError {
  #[error(transparent)]
  Model(#[from] ModelError),
  #[error(transparent)]
  Input(#[from] InputError),
  #[error(transparent)]
  Render(#[from] RenderError),
}

/// 产量相关的可调参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YieldSettings {
  pub vegetation_threshold: f32,
  pub env_yield_divisor: f64,
}

impl Default for YieldSettings {
  fn default() -> Self {
    Self {
      vegetation_threshold: VEGETATION_THRESHOLD,
      env_yield_divisor: DEFAULT_ENV_YIELD_DIVISOR,
    }
  }
}

#[derive(Debug, Clone)]
pub struct WeedReport {
  pub probabilities: ProbabilityMap,
  pub mask: Mask,
  pub percentage: f64,
}

impl WeedReport {
  pub fn from_parts(probabilities: ProbabilityMap, mask: Mask) -> Self {
    let percentage = mask.coverage_percent();
    Self {
      probabilities,
      mask,
      percentage,
    }
  }

  pub fn from_probabilities(probabilities: ProbabilityMap) -> Self {
    let mask = probabilities.threshold(WEED_THRESHOLD);
    Self::from_parts(probabilities, mask)
  }
}

fn segment_weeds(models: &Models, frame: &RgbFrame) -> Result<WeedReport, ModelError> {
  let now = Instant::now();
  let probabilities = models.segmenter.infer(frame)?;
  info!("杂草分割完成，耗时: {:.2?}", now.elapsed());
  Ok(WeedReport::from_probabilities(probabilities))
}

/// 上传图像的杂草检测
pub struct WeedTask {
  frame: RgbFrame,
}

impl WeedTask {
  pub fn new(frame: RgbFrame) -> Self {
    Self { frame }
  }
}

impl Task for WeedTask {
  type Output = (RgbFrame, WeedReport);
  type Error = TaskError;

  fn run_task(self, models: &Models) -> Result<Self::Output, Self::Error> {
    info!(
      "开始杂草检测任务: {}x{}",
      self.frame.width(),
      self.frame.height()
    );
    let report = segment_weeds(models, &self.frame)?;
    info!("杂草占比: {:.2}%", report.percentage);
    Ok((self.frame, report))
  }
}

/// 单张图像的健康分类
pub struct HealthTask {
  frame: RgbFrame,
}

impl HealthTask {
  pub fn new(frame: RgbFrame) -> Self {
    Self { frame }
  }
}

impl Task for HealthTask {
  type Output = HealthStatus;
  type Error = TaskError;

  fn run_task(self, models: &Models) -> Result<Self::Output, Self::Error> {
    let now = Instant::now();
    let status = models.classifier.infer(&self.frame)?;
    info!("健康分类完成: {}，耗时: {:.2?}", status, now.elapsed());
    Ok(status)
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YieldReport {
  pub cover: Option<CoverFeatures>,
  pub estimate: YieldEstimate,
}

impl YieldReport {
  /// 页面展示的键值行，顺序固定
  pub fn rows(&self) -> Vec<(&'static str, f64)> {
    let mut rows = Vec::new();
    if let Some(cover) = &self.cover {
      rows.push(("Vegetation Cover (%)", cover.vegetation));
      rows.push(("Weed Cover (%)", cover.weed));
      rows.push(("Crop Cover (%)", cover.crop));
    }
    if let Some(canopy) = self.estimate.canopy() {
      rows.push(("Yield from Canopy (t/ha)", canopy));
    }
    if let Some(environment) = self.estimate.environment() {
      rows.push(("Yield from Environment (t/ha)", environment));
    }
    if let Some(hybrid) = self.estimate.hybrid() {
      rows.push(("Hybrid Yield (t/ha)", hybrid));
    }
    rows
  }
}

/// 冠层图像路径：分割 -> 覆盖率 -> 冠层产量
///
/// 与杂草检测共用同一个分割模型（ImageNet 归一化输入，输出缩放回原图尺寸）。
fn canopy_estimate(
  models: &Models,
  frame: &RgbFrame,
  settings: &YieldSettings,
) -> Result<(WeedReport, CoverFeatures, f64), ModelError> {
  let weeds = segment_weeds(models, frame)?;
  let cover = extract_cover_features(frame, &weeds.mask, settings.vegetation_threshold);
  let canopy = harvest::canopy_yield(&cover);
  debug!("冠层产量: {:.4} t/ha", canopy);
  Ok((weeds, cover, canopy))
}

fn environment_estimate(
  models: &Models,
  sample: &EnvironmentSample,
  settings: &YieldSettings,
) -> Result<f64, ModelError> {
  let now = Instant::now();
  let raw = models.regressor.infer(sample)?;
  info!("环境回归完成，耗时: {:.2?}", now.elapsed());
  Ok(harvest::environment_yield(raw, settings.env_yield_divisor))
}

/// 冠层图像与环境数据均可选
pub struct YieldTask {
  canopy: Option<RgbFrame>,
  environment: Option<EnvironmentSample>,
  settings: YieldSettings,
}

impl YieldTask {
  /// 三项全为 0 的环境数据视为未提供
  pub fn new(
    canopy: Option<RgbFrame>,
    environment: Option<EnvironmentSample>,
    settings: YieldSettings,
  ) -> Self {
    Self {
      canopy,
      environment: environment.filter(EnvironmentSample::is_provided),
      settings,
    }
  }
}

impl Task for YieldTask {
  type Output = YieldReport;
  type Error = TaskError;

  fn run_task(self, models: &Models) -> Result<Self::Output, Self::Error> {
    info!(
      "开始产量预测任务: 冠层图像 {}, 环境数据 {}",
      self.canopy.is_some(),
      self.environment.is_some()
    );

    let (cover, canopy) = match &self.canopy {
      Some(frame) => {
        let (_, cover, canopy) = canopy_estimate(models, frame, &self.settings)?;
        (Some(cover), Some(canopy))
      }
      None => (None, None),
    };

    let environment = self
      .environment
      .as_ref()
      .map(|sample| environment_estimate(models, sample, &self.settings))
      .transpose()?;

    Ok(YieldReport {
      cover,
      estimate: YieldEstimate::from_parts(canopy, environment),
    })
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurveyReport {
  pub weed_coverage_percent: f64,
  pub yield_canopy_t_ha: f64,
  pub yield_env_t_ha: f64,
  #[serde(rename = "yieldScore")]
  pub yield_score: f64,
  pub vegetation_cover_percent: f64,
  #[serde(rename = "weedScore")]
  pub weed_score: f64,
  pub crop_cover_percent: f64,
  #[serde(rename = "infectionScore")]
  pub infection_score: Option<HealthStatus>,
}

/// 巡田演示：从样例目录随机取图，环境数据随机生成
pub struct SurveyTask<R> {
  altitude_meters: f64,
  weed_images: ImageDirectory,
  health_images: ImageDirectory,
  settings: YieldSettings,
  rng: R,
}

impl<R: Rng> SurveyTask<R> {
  pub fn new(
    altitude_meters: Option<f64>,
    weed_images: ImageDirectory,
    health_images: ImageDirectory,
    settings: YieldSettings,
    rng: R,
  ) -> Self {
    Self {
      altitude_meters: altitude_meters.unwrap_or(DEFAULT_ALTITUDE),
      weed_images,
      health_images,
      settings,
      rng,
    }
  }
}

impl<R: Rng> Task for SurveyTask<R> {
  type Output = SurveyReport;
  type Error = TaskError;

  fn run_task(mut self, models: &Models) -> Result<Self::Output, Self::Error> {
    info!("开始巡田任务，高度: {} 米", self.altitude_meters);

    let field = self.weed_images.random_image(&mut self.rng)?;
    info!("田间图像: {}", field.path());
    let (weeds, cover, canopy) = canopy_estimate(models, field.frame(), &self.settings)?;

    let sample = EnvironmentSample {
      avg_temp: self.rng.gen_range(20.0..35.0),
      pesticides: self.rng.gen_range(0.0..1.0),
      rainfall: self.rng.gen_range(500.0..1200.0),
    };
    let environment = environment_estimate(models, &sample, &self.settings)?;
    let hybrid = harvest::hybrid_yield(canopy, environment);

    let infection_score = if self.altitude_meters < HEALTH_ALTITUDE_LIMIT {
      let leaf = self.health_images.random_image(&mut self.rng)?;
      info!("叶片图像: {}", leaf.path());
      Some(HealthTask::new(leaf.into_frame()).run_task(models)?)
    } else {
      None
    };

    Ok(SurveyReport {
      weed_coverage_percent: round2(weeds.percentage),
      yield_canopy_t_ha: round2(canopy),
      yield_env_t_ha: round2(environment),
      yield_score: round2(hybrid),
      vegetation_cover_percent: round2(cover.vegetation),
      weed_score: round2(cover.weed),
      crop_cover_percent: round2(cover.crop),
      infection_score,
    })
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
  };

  use image::{Rgb, RgbImage};
  use rand::{SeedableRng, rngs::StdRng};

  use super::*;
  use crate::model::Model;

  /// 左半边为杂草的分割桩
  pub struct LeftHalfWeeds;

  impl Model for LeftHalfWeeds {
    type Input = RgbFrame;
    type Output = ProbabilityMap;
    type Error = ModelError;

    fn infer(&self, input: &RgbFrame) -> Result<ProbabilityMap, ModelError> {
      let half = input.width() / 2;
      Ok(ProbabilityMap::from_fn(input.width(), input.height(), |x, _| {
        if x < half { 0.9 } else { 0.1 }
      }))
    }
  }

  pub struct FixedHealth(pub HealthStatus);

  impl Model for FixedHealth {
    type Input = RgbFrame;
    type Output = HealthStatus;
    type Error = ModelError;

    fn infer(&self, _input: &RgbFrame) -> Result<HealthStatus, ModelError> {
      Ok(self.0)
    }
  }

  /// 返回固定值并记录调用次数的回归桩
  pub struct FixedRegressor {
    pub value: f64,
    pub calls: AtomicUsize,
  }

  impl Model for FixedRegressor {
    type Input = EnvironmentSample;
    type Output = f64;
    type Error = ModelError;

    fn infer(&self, _input: &EnvironmentSample) -> Result<f64, ModelError> {
      self.calls.fetch_add(1, Ordering::SeqCst);
      Ok(self.value)
    }
  }

  pub struct FailingRegressor;

  impl Model for FailingRegressor {
    type Input = EnvironmentSample;
    type Output = f64;
    type Error = ModelError;

    fn infer(&self, _input: &EnvironmentSample) -> Result<f64, ModelError> {
      Err(ModelError::InferenceFailed("regressor offline".to_string()))
    }
  }

  fn models_with(regressor: Arc<FixedRegressor>) -> Models {
    Models::new(
      Arc::new(LeftHalfWeeds),
      Arc::new(FixedHealth(HealthStatus::NotHealthy)),
      regressor,
    )
  }

  fn regressor(value: f64) -> Arc<FixedRegressor> {
    Arc::new(FixedRegressor {
      value,
      calls: AtomicUsize::new(0),
    })
  }

  /// 全图绿色的左半边 + 土色右半边
  fn field_frame() -> RgbFrame {
    let mut frame = RgbFrame::filled(4, 4, [120, 90, 60]);
    for y in 0..4 {
      for x in 0..2 {
        frame.set_pixel(x, y, [20, 200, 20]);
      }
    }
    frame
  }

  #[test]
  fn weed_task_reports_percentage() {
    let models = models_with(regressor(0.0));
    let (frame, report) = WeedTask::new(field_frame()).run_task(&models).unwrap();
    assert_eq!(frame.width(), 4);
    assert_eq!(report.percentage, 50.0);
  }

  #[test]
  fn yield_task_with_both_inputs_blends() {
    let reg = regressor(2000.0);
    let models = models_with(reg.clone());
    let sample = EnvironmentSample {
      avg_temp: 25.0,
      pesticides: 0.5,
      rainfall: 900.0,
    };
    let report = YieldTask::new(Some(field_frame()), Some(sample), YieldSettings::default())
      .run_task(&models)
      .unwrap();

    let cover = report.cover.unwrap();
    assert_eq!(cover.vegetation, 50.0);
    assert_eq!(cover.weed, 50.0);
    assert_eq!(cover.crop, 0.0);

    // 0.6*0 - 0.3*50 + 0.1*50 < 0，冠层产量截断为 0
    assert_eq!(report.estimate.canopy(), Some(0.0));
    assert!((report.estimate.environment().unwrap() - 0.2).abs() < 1e-9);
    assert!((report.estimate.hybrid().unwrap() - 0.08).abs() < 1e-9);
    assert_eq!(reg.calls.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn zero_environment_skips_regressor() {
    let reg = regressor(2000.0);
    let models = models_with(reg.clone());
    let report = YieldTask::new(
      None,
      Some(EnvironmentSample::default()),
      YieldSettings::default(),
    )
    .run_task(&models)
    .unwrap();

    assert!(report.estimate.is_none());
    assert!(report.rows().is_empty());
    assert_eq!(reg.calls.load(Ordering::SeqCst), 0);
  }

  #[test]
  fn regressor_failure_propagates() {
    let models = Models::new(
      Arc::new(LeftHalfWeeds),
      Arc::new(FixedHealth(HealthStatus::Healthy)),
      Arc::new(FailingRegressor),
    );
    let sample = EnvironmentSample {
      avg_temp: 25.0,
      ..Default::default()
    };
    let result = YieldTask::new(None, Some(sample), YieldSettings::default()).run_task(&models);
    assert!(matches!(result, Err(TaskError::Model(_))));
  }

  #[test]
  fn custom_divisor_is_applied() {
    let models = models_with(regressor(50.0));
    let settings = YieldSettings {
      env_yield_divisor: 100.0,
      ..Default::default()
    };
    let sample = EnvironmentSample {
      rainfall: 700.0,
      ..Default::default()
    };
    let report = YieldTask::new(None, Some(sample), settings)
      .run_task(&models)
      .unwrap();
    assert_eq!(report.estimate.environment(), Some(0.5));
    assert_eq!(report.rows(), vec![("Yield from Environment (t/ha)", 0.5)]);
  }

  fn image_dir(color: [u8; 3]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    RgbImage::from_pixel(8, 8, Rgb(color))
      .save(dir.path().join("sample.png"))
      .unwrap();
    dir
  }

  #[test]
  fn survey_checks_health_only_when_low() {
    let weeds = image_dir([20, 200, 20]);
    let leaves = image_dir([30, 160, 40]);
    let models = models_with(regressor(3000.0));

    let high = SurveyTask::new(
      None,
      ImageDirectory::new(weeds.path()),
      ImageDirectory::new(leaves.path()),
      YieldSettings::default(),
      StdRng::seed_from_u64(1),
    )
    .run_task(&models)
    .unwrap();
    assert_eq!(high.infection_score, None);
    assert_eq!(high.weed_coverage_percent, 50.0);
    assert_eq!(high.yield_env_t_ha, 0.3);

    let low = SurveyTask::new(
      Some(10.0),
      ImageDirectory::new(weeds.path()),
      ImageDirectory::new(leaves.path()),
      YieldSettings::default(),
      StdRng::seed_from_u64(1),
    )
    .run_task(&models)
    .unwrap();
    assert_eq!(low.infection_score, Some(HealthStatus::NotHealthy));
  }

  #[test]
  fn survey_without_images_fails() {
    let empty = tempfile::tempdir().unwrap();
    let models = models_with(regressor(0.0));
    let result = SurveyTask::new(
      None,
      ImageDirectory::new(empty.path()),
      ImageDirectory::new(empty.path()),
      YieldSettings::default(),
      StdRng::seed_from_u64(1),
    )
    .run_task(&models);
    assert!(matches!(result, Err(TaskError::Input(InputError::NoImages(_)))));
  }
}
