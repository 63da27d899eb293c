// 该文件是 Xishan （西山晴雪） 项目的一部分。
// src/model/mod.rs - 检测模型能力与推理调用
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

mod replay;

use ndarray::{Array1, Array2, Array3, ArrayD};
use tracing::error;

pub use replay::{ReplayModel, ReplayModelError};

/// 模型的具名输出流
#[derive(Debug, Clone)]
pub struct DetectionOutput {
  /// 边界框，形状 [N, 4]，源图像像素坐标 (left, top, right, bottom)
  pub boxes: Array2<f32>,
  /// 置信度，形状 [N]
  pub scores: Array1<f32>,
  /// 类别标签 id，形状 [N]
  pub labels: Array1<i64>,
}

/// 模型前向计算的结构化结果
///
/// 对应原始模型的 `[Tensor, [输出流映射]]`：第一个位置元素是训练期的
/// 损失张量（推理时为空），第二个位置元素是每个输入对应的输出流。
#[derive(Debug, Clone)]
pub struct ForwardResult {
  pub losses: ArrayD<f32>,
  pub detections: Vec<DetectionOutput>,
}

/// 检测模型能力
///
/// 模型本体是不透明的外部协作者，流水线只依赖这一特征，
/// 因此可以用任意替身在无真实模型的环境下测试。
pub trait DetectionModel {
  type Error: std::error::Error + Send + Sync + 'static;

  fn forward(&self, inputs: &[Array3<f32>]) -> Result<ForwardResult, Self::Error>;
}

/// 调用模型并提取首个输出流
///
/// 张量被包装为长度为 1 的输入序列。调用期间的任何失败都会被捕获、
/// 记录日志并折叠为 `None`——这是推理失败的唯一恢复路径。
pub fn run_inference<M: DetectionModel>(
  model: &M,
  input: Array3<f32>,
) -> Option<DetectionOutput> {
  let inputs = [input];
  match model.forward(&inputs) {
    Ok(result) => match result.detections.into_iter().next() {
      Some(output) => Some(output),
      None => {
        error!("模型结果缺少输出流");
        None
      }
    },
    Err(e) => {
      error!("推理失败: {}", e);
      None
    }
  }
}
