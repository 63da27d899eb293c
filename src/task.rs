// 该文件是 Xishan （西山晴雪） 项目的一部分。
// src/task.rs - 任务循环
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::{thread, time::Duration};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use crate::camera::Frame;
use crate::canvas::CanvasContext;
use crate::controller::{AlertSink, FrameController, FrameOutcome};
use crate::metrics::{Clock, Metrics};
use crate::model::DetectionModel;

pub trait Task<I, P>: Sized {
  type Error;
  fn run_task(self, input: I, pipeline: P) -> Result<(), Self::Error>;
}

fn report_outcome(frame_index: usize, outcome: &FrameOutcome) {
  match outcome {
    FrameOutcome::Completed {
      metrics,
      detections,
    } => {
      info!("第 {} 帧检测到 {} 个物体", frame_index, detections);
      info!("Total time: {}", metrics.total_time);
      info!("Pack time: {}", metrics.pack_time);
      info!("Inference time: {}", metrics.inference_time);
      info!("Unpack time: {}", metrics.unpack_time);
    }
    FrameOutcome::Skipped(reason) => {
      warn!("第 {} 帧被丢弃: {:?}", frame_index, reason);
    }
  }
}

pub struct OneShotTask;

impl<I, M, C, A, K> Task<I, &mut FrameController<M, C, A, K>> for OneShotTask
where
  I: Iterator<Item = Result<Frame>>,
  M: DetectionModel,
  C: CanvasContext,
  A: AlertSink,
  K: Clock,
{
  type Error = anyhow::Error;

  fn run_task(
    self,
    mut input: I,
    pipeline: &mut FrameController<M, C, A, K>,
  ) -> Result<(), Self::Error> {
    info!("开始任务...");
    let frame = input
      .next()
      .ok_or_else(|| anyhow::anyhow!("没有输入帧"))??;

    let outcome = pipeline.handle_frame(frame);
    report_outcome(0, &outcome);

    info!("任务完成，退出");
    Ok(())
  }
}

/// 每帧指标的落盘记录
#[derive(Serialize)]
struct MetricsRecord<'a> {
  frame: usize,
  timestamp: String,
  detections: usize,
  metrics: &'a Metrics,
}

#[derive(Default, Debug)]
pub struct ContinuousTask {
  frame_number: Option<usize>,
  metrics_record: Option<PathBuf>,
}

impl ContinuousTask {
  pub fn with_frame_number(mut self, frame_number: Option<usize>) -> Self {
    self.frame_number = frame_number;
    self
  }

  /// 配置指标记录文件，按 JSON 行追加
  pub fn with_metrics_record(mut self, path: Option<PathBuf>) -> Self {
    self.metrics_record = path;
    self
  }
}

impl<I, M, C, A, K> Task<I, &mut FrameController<M, C, A, K>> for ContinuousTask
where
  I: Iterator<Item = Result<Frame>>,
  M: DetectionModel,
  C: CanvasContext,
  A: AlertSink,
  K: Clock,
{
  type Error = anyhow::Error;

  fn run_task(
    self,
    input: I,
    pipeline: &mut FrameController<M, C, A, K>,
  ) -> Result<(), Self::Error> {
    info!("开始任务...");
    let (tx, rx) = std::sync::mpsc::channel();

    ctrlc::set_handler(move || {
      info!("收到中断信号，准备退出...");
      let _ = tx.send(());
      thread::spawn(|| {
        thread::sleep(Duration::from_secs(30));
        warn!("强制退出程序");
        std::process::exit(1);
      });
    })
    .expect("Error setting Ctrl-C handler");

    let mut record_file = match &self.metrics_record {
      Some(path) => Some(
        OpenOptions::new()
          .create(true)
          .append(true)
          .open(path)
          .with_context(|| format!("无法打开指标记录文件: {}", path.display()))?,
      ),
      None => None,
    };

    let mut frame_index = 0;
    for frame in input {
      let frame = frame?;
      frame_index = (frame_index + 1) % usize::MAX;

      let outcome = pipeline.handle_frame(frame);
      report_outcome(frame_index, &outcome);

      if let (
        Some(file),
        FrameOutcome::Completed {
          metrics,
          detections,
        },
      ) = (record_file.as_mut(), &outcome)
      {
        let record = MetricsRecord {
          frame: frame_index,
          timestamp: chrono::Utc::now().to_rfc3339(),
          detections: *detections,
          metrics,
        };
        let line = serde_json::to_string(&record).context("无法序列化指标记录")?;
        writeln!(file, "{}", line).context("无法写入指标记录")?;
      }

      if self.frame_number.map(|n| frame_index >= n).unwrap_or(false) {
        info!("达到指定帧数 {}, 退出任务循环", frame_index);
        break;
      }
      if rx.try_recv().is_ok() {
        warn!("中断信号接收，退出任务循环");
        break;
      }
    }

    info!("任务完成，退出");
    Ok(())
  }
}
