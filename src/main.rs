// 该文件是 Xishan （西山晴雪） 项目的一部分。
// src/main.rs - 项目主程序
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use url::Url;

use xishan::FromUrl;
use xishan::camera::{CameraInput, CameraSource};
use xishan::canvas::{ImageCanvas, Layout};
use xishan::controller::FrameController;
use xishan::model::ReplayModel;
use xishan::task::{ContinuousTask, Task};

/// Xishan 项目参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 检测模型来源（replay:///path/to/records.json）
  #[arg(long, value_name = "MODEL")]
  pub model: Url,

  /// 输入来源（v4l2:///dev/video0?alt=/dev/video1 或 still:///path/to/image.png）
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,

  /// 画布帧记录目录，不设置则只在内存表面绘制
  #[arg(long, value_name = "DIR")]
  pub record: Option<PathBuf>,

  /// 指标记录文件（JSON 行）
  #[arg(long, value_name = "FILE")]
  pub metrics_record: Option<PathBuf>,

  /// 标签文本字体文件
  #[arg(long, value_name = "FONT")]
  pub font: Option<PathBuf>,

  /// 视口宽度
  #[arg(long, default_value = "640", value_name = "WIDTH")]
  pub viewport_width: f32,

  /// 视口高度
  #[arg(long, default_value = "480", value_name = "HEIGHT")]
  pub viewport_height: f32,

  /// 处理帧数上限
  #[arg(long, value_name = "FRAME_NUMBER")]
  pub frame_number: Option<usize>,

  /// 启动时翻转摄像头
  #[arg(long)]
  pub flip: bool,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("模型来源: {}", args.model);
  info!("输入来源: {}", args.input);
  info!("视口尺寸: {}x{}", args.viewport_width, args.viewport_height);

  let model = ReplayModel::from_url(&args.model).context("无法加载检测模型")?;
  info!("模型加载完成");

  let mut camera = CameraInput::from_url(&args.input).context("无法打开输入源")?;
  info!("输入源已打开: {}x{}", camera.width(), camera.height());

  if args.flip {
    camera.flip().context("无法翻转摄像头")?;
  }

  let layout = Layout::new(args.viewport_width, args.viewport_height);
  let mut canvas = ImageCanvas::new(layout);
  if let Some(dir) = args.record {
    canvas = canvas.with_record_dir(dir);
  }
  if let Some(font) = &args.font {
    canvas = canvas.with_font_file(font).context("无法加载字体")?;
  }

  let mut controller = FrameController::new();
  controller.set_model(model);
  controller.set_canvas(canvas);
  controller.set_layout(layout);

  ContinuousTask::default()
    .with_frame_number(args.frame_number)
    .with_metrics_record(args.metrics_record)
    .run_task(camera, &mut controller)?;

  Ok(())
}
