// 该文件是 Tianyan （田眼） 项目的一部分。
// src/args.rs - 服务参数配置
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

use std::{net::SocketAddr, path::PathBuf};

use clap::Parser;
use url::Url;

use crate::{
  cover::VEGETATION_THRESHOLD, harvest::DEFAULT_ENV_YIELD_DIVISOR, server::ServerConfig,
  task::YieldSettings,
};

/// Tianyan 服务参数配置
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 监听地址
  #[arg(long, default_value = "0.0.0.0", env = "TIANYAN_HOST")]
  pub host: String,

  /// 监听端口
  #[arg(short, long, default_value_t = 5000, env = "TIANYAN_PORT")]
  pub port: u16,

  /// 杂草分割模型，例如 onnx:///models/weed_unet.onnx
  #[arg(long, value_name = "MODEL", env = "TIANYAN_WEED_MODEL")]
  pub weed_model: Url,

  /// 健康分类模型
  #[arg(long, value_name = "MODEL", env = "TIANYAN_HEALTH_MODEL")]
  pub health_model: Url,

  /// 环境产量回归模型
  #[arg(long, value_name = "MODEL", env = "TIANYAN_ENV_MODEL")]
  pub env_model: Url,

  /// 巡田演示使用的田间图像目录
  #[arg(long, default_value = "./CoFly-WeedDB/images", env = "TIANYAN_WEED_IMAGES")]
  pub weed_images_dir: PathBuf,

  /// 巡田演示使用的叶片图像目录
  #[arg(long, default_value = "./PlantVillage", env = "TIANYAN_HEALTH_IMAGES")]
  pub health_images_dir: PathBuf,

  /// 超绿指数阈值 (0.0 - 1.0)
  #[arg(long, default_value_t = VEGETATION_THRESHOLD, value_name = "THRESHOLD")]
  pub vegetation_threshold: f32,

  /// 环境回归输出的缩放除数
  #[arg(long, default_value_t = DEFAULT_ENV_YIELD_DIVISOR, value_name = "DIVISOR")]
  pub env_yield_divisor: f64,

  /// 上传请求体上限（MB）
  #[arg(long, default_value_t = 32, value_name = "MB")]
  pub max_upload_mb: usize,
}

impl Args {
  pub fn listen_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
    format!("{}:{}", self.host, self.port).parse()
  }

  pub fn server_config(&self) -> ServerConfig {
    ServerConfig {
      weed_images_dir: self.weed_images_dir.clone(),
      health_images_dir: self.health_images_dir.clone(),
      yield_settings: YieldSettings {
        vegetation_threshold: self.vegetation_threshold,
        env_yield_divisor: self.env_yield_divisor,
      },
      max_upload_bytes: self.max_upload_mb * 1024 * 1024,
    }
  }
}
