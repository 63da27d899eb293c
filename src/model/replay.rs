// 该文件是 Xishan （西山晴雪） 项目的一部分。
// src/model/replay.rs - 回放检测模型
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use std::cell::Cell;

use ndarray::{Array1, Array2, Array3, ArrayD, IxDyn};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use super::{DetectionModel, DetectionOutput, ForwardResult};
use crate::{FromUrl, FromUrlWithScheme};

const REPLAY_SCHEME: &str = "replay";

#[derive(Error, Debug)]
pub enum ReplayModelError {
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("无法读取模型记录文件: {0}")]
  IoError(#[from] std::io::Error),
  #[error("模型记录文件格式错误: {0}")]
  JsonError(#[from] serde_json::Error),
  #[error("模型记录文件为空")]
  EmptyRecords,
  #[error("预期输入序列长度为 1, 实际为 {0}")]
  BadInputArity(usize),
}

/// 单帧的检测记录
#[derive(Debug, Clone, Deserialize)]
struct ReplayRecord {
  boxes: Vec<[f32; 4]>,
  scores: Vec<f32>,
  labels: Vec<i64>,
}

impl ReplayRecord {
  fn to_output(&self) -> DetectionOutput {
    let n = self.scores.len();
    let flat: Vec<f32> = self.boxes.iter().flatten().copied().collect();

    DetectionOutput {
      boxes: Array2::from_shape_vec((n, 4), flat)
        .unwrap_or_else(|_| panic!("记录中 boxes 与 scores 数量不一致")),
      scores: Array1::from_vec(self.scores.clone()),
      labels: Array1::from_vec(self.labels.clone()),
    }
  }
}

/// 回放检测模型
///
/// 从 JSON 文件按帧循环回放预先录制的检测结果，充当不透明检测模型的
/// 运行时替身：接口与真实模型一致，但不做任何数值计算。
pub struct ReplayModel {
  records: Vec<ReplayRecord>,
  cursor: Cell<usize>,
}

impl FromUrlWithScheme for ReplayModel {
  const SCHEME: &'static str = REPLAY_SCHEME;
}

impl FromUrl for ReplayModel {
  type Error = ReplayModelError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(ReplayModelError::SchemeMismatch(url.scheme().to_string()));
    }

    Self::load(url.path())
  }
}

impl ReplayModel {
  pub fn load(path: &str) -> Result<Self, ReplayModelError> {
    info!("加载模型记录文件: {}", path);
    let data = std::fs::read_to_string(path)?;
    let records: Vec<ReplayRecord> = serde_json::from_str(&data)?;

    if records.is_empty() {
      return Err(ReplayModelError::EmptyRecords);
    }

    debug!("模型记录加载完成, 共 {} 帧", records.len());
    Ok(Self {
      records,
      cursor: Cell::new(0),
    })
  }
}

impl DetectionModel for ReplayModel {
  type Error = ReplayModelError;

  fn forward(&self, inputs: &[Array3<f32>]) -> Result<ForwardResult, Self::Error> {
    if inputs.len() != 1 {
      return Err(ReplayModelError::BadInputArity(inputs.len()));
    }

    let index = self.cursor.get();
    self.cursor.set((index + 1) % self.records.len());
    let record = &self.records[index];

    Ok(ForwardResult {
      losses: ArrayD::zeros(IxDyn(&[0])),
      detections: vec![record.to_output()],
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Write;

  const RECORDS: &str = r#"[
    {"boxes": [[0.0, 0.0, 10.0, 10.0]], "scores": [0.9], "labels": [1]},
    {"boxes": [], "scores": [], "labels": []}
  ]"#;

  fn write_records() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(RECORDS.as_bytes()).expect("write records");
    file
  }

  #[test]
  fn loads_from_replay_url() {
    let file = write_records();
    let url = Url::parse(&format!("replay://{}", file.path().display())).expect("url");
    let model = ReplayModel::from_url(&url).expect("model");
    assert_eq!(model.records.len(), 2);
  }

  #[test]
  fn rejects_other_schemes() {
    let url = Url::parse("file:///tmp/records.json").expect("url");
    assert!(matches!(
      ReplayModel::from_url(&url),
      Err(ReplayModelError::SchemeMismatch(_))
    ));
  }

  #[test]
  fn cycles_through_records() {
    let model = ReplayModel::load(write_records().path().to_str().expect("path")).expect("model");
    let input = [Array3::zeros((3, 2, 2))];

    let first = model.forward(&input).expect("forward");
    assert_eq!(first.detections[0].scores.len(), 1);

    let second = model.forward(&input).expect("forward");
    assert_eq!(second.detections[0].scores.len(), 0);

    let third = model.forward(&input).expect("forward");
    assert_eq!(third.detections[0].scores.len(), 1);
  }

  #[test]
  fn rejects_bad_input_arity() {
    let model = ReplayModel::load(write_records().path().to_str().expect("path")).expect("model");
    let inputs = [Array3::zeros((3, 2, 2)), Array3::zeros((3, 2, 2))];
    assert!(matches!(
      model.forward(&inputs),
      Err(ReplayModelError::BadInputArity(2))
    ));
  }
}
