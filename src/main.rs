// 该文件是 Tianyan （田眼） 项目的一部分。
// src/main.rs - HTTP 服务主程序
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

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tianyan::{
  args::Args,
  model::Models,
  server::{self, AppState},
};

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .init();

  let args = Args::parse();

  info!("Tianyan 田间图像服务 v{}", env!("CARGO_PKG_VERSION"));
  info!("杂草图像目录: {}", args.weed_images_dir.display());
  info!("叶片图像目录: {}", args.health_images_dir.display());
  info!("超绿阈值: {}", args.vegetation_threshold);
  info!("环境产量除数: {}", args.env_yield_divisor);

  // 模型无法加载时直接退出
  let models = Models::load(&args.weed_model, &args.health_model, &args.env_model)
    .context("模型加载失败")?;
  let state = AppState::new(models, args.server_config()).context("初始化渲染器失败")?;
  let app = server::router(state);

  let addr = args.listen_addr().context("监听地址无效")?;
  let listener = TcpListener::bind(addr)
    .await
    .with_context(|| format!("无法绑定 {}", addr))?;
  info!("服务已启动: http://{}", addr);

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;

  info!("服务已停止");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(err) = tokio::signal::ctrl_c().await {
    tracing::error!("无法监听退出信号: {}", err);
    std::future::pending::<()>().await;
  }
  info!("收到退出信号，正在停止服务...");
}
