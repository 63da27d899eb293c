// 该文件是 Xishan （西山晴雪） 项目的一部分。
// src/unpack.rs - 检测结果后处理（unpack）
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use serde::Serialize;

use crate::labels;
use crate::model::DetectionOutput;

/// 报告检测所需的最低置信度
pub const SCORE_THRESHOLD: f32 = 0.5;

/// 边界框坐标 (left, top, right, bottom)，源图像像素坐标系
pub type Rect = [f32; 4];

/// 一个带标签与置信度的检测框
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundingBox {
  /// 检测到的物体标签
  pub label: &'static str,
  /// 置信度
  pub score: f32,
  /// 物体边界
  pub rect: Rect,
}

/// 把模型输出流解码为检测框列表
///
/// 按模型原始顺序遍历；严格低于阈值的检测被跳过（恰好等于阈值的保留），
/// 输出不排序、不限制数量。标签 id 从 64 位收窄到 32 位整数，
/// 下游不支持 64 位整数。
pub fn unpack(output: &DetectionOutput) -> Vec<BoundingBox> {
  let labels = output.labels.mapv(|id| id as i32);

  let mut results = Vec::new();
  for i in 0..output.scores.len() {
    let score = output.scores[i];
    if score < SCORE_THRESHOLD {
      continue;
    }

    results.push(BoundingBox {
      label: labels::label_for(labels[i]),
      score,
      rect: [
        output.boxes[[i, 0]],
        output.boxes[[i, 1]],
        output.boxes[[i, 2]],
        output.boxes[[i, 3]],
      ],
    });
  }

  results
}
