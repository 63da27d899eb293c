// 该文件是 Xishan （西山晴雪） 项目的一部分。
// src/controller.rs - 帧控制器
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use tracing::{error, warn};

use crate::camera::CameraFrame;
use crate::canvas::{CanvasContext, Layout};
use crate::metrics::{Clock, Measurement, Metrics, Stage, SystemClock};
use crate::model::{DetectionModel, run_inference};
use crate::overlay;
use crate::pack::{Normalize, pack};
use crate::unpack::unpack;

/// 模态告警能力，生产实现只写日志，测试实现记录调用
pub trait AlertSink {
  fn alert(&mut self, title: &str, message: &str);
}

/// 默认告警实现
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAlert;

impl AlertSink for TracingAlert {
  fn alert(&mut self, title: &str, message: &str) {
    warn!("[{}] {}", title, message);
  }
}

/// 帧被丢弃的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
  /// 上一帧仍在处理，按单槽丢弃策略放弃本帧
  Busy,
  ModelNotLoaded,
  CanvasNotInitialized,
  LayoutNotInitialized,
  InferenceFailed,
  RenderFailed,
}

/// 单帧处理的终态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
  Completed { metrics: Metrics, detections: usize },
  Skipped(SkipReason),
}

/// 帧控制器
///
/// 对每个到达的帧顺序执行 pack -> 推理 -> unpack -> 渲染，各阶段耗时
/// 记入耗时记录器。模型、画布与布局在初始化阶段写入一次，帧处理路径
/// 只读。无论在哪条路径终止，帧都恰好被释放一次。
pub struct FrameController<M, C, A = TracingAlert, K = SystemClock> {
  model: Option<M>,
  canvas: Option<C>,
  layout: Option<Layout>,
  alert: A,
  measurement: Measurement<K>,
  normalize: Normalize,
  busy: bool,
}

impl<M, C> FrameController<M, C> {
  pub fn new() -> Self {
    Self::with_parts(TracingAlert, SystemClock)
  }
}

impl<M, C> Default for FrameController<M, C> {
  fn default() -> Self {
    Self::new()
  }
}

impl<M, C, A, K: Clock> FrameController<M, C, A, K> {
  pub fn with_parts(alert: A, clock: K) -> Self {
    Self {
      model: None,
      canvas: None,
      layout: None,
      alert,
      measurement: Measurement::with_clock(clock),
      normalize: Normalize::default(),
      busy: false,
    }
  }

  /// 模型加载完成后写入句柄
  pub fn set_model(&mut self, model: M) {
    self.model = Some(model);
  }

  /// 模型是否就绪
  pub fn is_model_ready(&self) -> bool {
    self.model.is_some()
  }

  pub fn set_canvas(&mut self, canvas: C) {
    self.canvas = Some(canvas);
  }

  pub fn canvas(&self) -> Option<&C> {
    self.canvas.as_ref()
  }

  /// 布局变更通知写入视口尺寸
  pub fn set_layout(&mut self, layout: Layout) {
    self.layout = Some(layout);
  }

  pub fn set_normalize(&mut self, normalize: Normalize) {
    self.normalize = normalize;
  }
}

impl<M, C, A, K> FrameController<M, C, A, K>
where
  M: DetectionModel,
  C: CanvasContext,
  A: AlertSink,
  K: Clock,
{
  /// 处理一帧
  ///
  /// 帧在返回前恰好被释放一次，与处理结果无关。处理中又有新帧到达时，
  /// 新帧被直接释放并丢弃（单在途槽策略）。
  pub fn handle_frame<F: CameraFrame>(&mut self, frame: F) -> FrameOutcome {
    if self.busy {
      frame.release();
      return FrameOutcome::Skipped(SkipReason::Busy);
    }

    self.busy = true;
    let outcome = self.process(&frame);
    frame.release();
    self.busy = false;

    outcome
  }

  fn process<F: CameraFrame>(&mut self, frame: &F) -> FrameOutcome {
    let Some(model) = self.model.as_ref() else {
      self.alert.alert("Model", "Model not loaded");
      return FrameOutcome::Skipped(SkipReason::ModelNotLoaded);
    };

    if self.canvas.is_none() {
      self.alert.alert("Canvas", "The canvas is not initialized");
      return FrameOutcome::Skipped(SkipReason::CanvasNotInitialized);
    }

    let Some(layout) = self.layout else {
      self.alert.alert("Layout", "The layout is not initialized");
      return FrameOutcome::Skipped(SkipReason::LayoutNotInitialized);
    };

    self.measurement.mark(Stage::Pack);
    let input = pack(frame, &self.normalize);
    self.measurement.measure(Stage::Pack);

    self.measurement.mark(Stage::Inference);
    let output = run_inference(model, input);
    self.measurement.measure(Stage::Inference);

    let Some(output) = output else {
      self.alert.alert("Inference", "Inference not successful");
      return FrameOutcome::Skipped(SkipReason::InferenceFailed);
    };

    self.measurement.mark(Stage::Unpack);
    let results = unpack(&output);
    self.measurement.measure(Stage::Unpack);

    let metrics = self.measurement.get_metrics();

    if let Some(canvas) = self.canvas.as_mut() {
      if let Err(e) = overlay::render(canvas, &layout, frame, &results) {
        error!("渲染失败: {}", e);
        return FrameOutcome::Skipped(SkipReason::RenderFailed);
      }
    }

    FrameOutcome::Completed {
      metrics,
      detections: results.len(),
    }
  }
}
