// 该文件是 Xishan （西山晴雪） 项目的一部分。
// src/camera/mod.rs - 摄像头能力与帧定义
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

mod still_source;
mod v4l2_source;

use anyhow::Result;
use image::RgbImage;
use tracing::debug;
use url::Url;

use crate::FromUrl;

pub use still_source::StillSource;
pub use v4l2_source::V4l2Source;

/// 摄像头帧能力
///
/// 帧像素数据以 HWC 字节序（即 blob）暴露。帧底层可能持有原生内存，
/// 处理结束后必须调用一次 `release` 归还。
pub trait CameraFrame {
  fn width(&self) -> u32;
  fn height(&self) -> u32;

  /// HWC 字节序的像素数据
  fn to_blob(&self) -> &[u8];

  /// 释放帧底层资源，按所有权语义保证恰好调用一次
  fn release(self);
}

/// 帧数据
pub struct Frame {
  /// RGB 图像数据
  image: RgbImage,
  /// 帧索引
  pub index: u64,
  /// 时间戳（毫秒）
  pub timestamp_ms: u64,
}

impl Frame {
  pub fn new(image: RgbImage, index: u64, timestamp_ms: u64) -> Self {
    Self {
      image,
      index,
      timestamp_ms,
    }
  }
}

impl CameraFrame for Frame {
  fn width(&self) -> u32 {
    self.image.width()
  }

  fn height(&self) -> u32 {
    self.image.height()
  }

  fn to_blob(&self) -> &[u8] {
    self.image.as_raw()
  }

  fn release(self) {
    debug!("释放第 {} 帧", self.index);
    drop(self);
  }
}

/// 摄像头能力：按帧迭代，并支持前后镜头翻转
pub trait CameraSource: Iterator<Item = Result<Frame>> {
  /// 切换前后摄像头
  fn flip(&mut self) -> Result<()>;

  /// 帧宽度
  fn width(&self) -> u32;

  /// 帧高度
  fn height(&self) -> u32;

  /// 帧率（如果适用）
  fn fps(&self) -> Option<f64>;
}

/// 输入源包装，按 URL 方案分发
pub enum CameraInput {
  V4l2(V4l2Source),
  Still(StillSource),
}

impl CameraInput {
  pub fn from_url(url: &Url) -> Result<Self> {
    match url.scheme() {
      v4l2_source::V4L2_SCHEME => Ok(CameraInput::V4l2(V4l2Source::from_url(url)?)),
      still_source::STILL_SCHEME | "file" => Ok(CameraInput::Still(StillSource::from_url(url)?)),
      other => Err(anyhow::anyhow!("不支持的输入源方案: {}", other)),
    }
  }
}

impl Iterator for CameraInput {
  type Item = Result<Frame>;

  fn next(&mut self) -> Option<Self::Item> {
    match self {
      CameraInput::V4l2(source) => source.next(),
      CameraInput::Still(source) => source.next(),
    }
  }
}

impl CameraSource for CameraInput {
  fn flip(&mut self) -> Result<()> {
    match self {
      CameraInput::V4l2(source) => source.flip(),
      CameraInput::Still(source) => source.flip(),
    }
  }

  fn width(&self) -> u32 {
    match self {
      CameraInput::V4l2(source) => source.width(),
      CameraInput::Still(source) => source.width(),
    }
  }

  fn height(&self) -> u32 {
    match self {
      CameraInput::V4l2(source) => source.height(),
      CameraInput::Still(source) => source.height(),
    }
  }

  fn fps(&self) -> Option<f64> {
    match self {
      CameraInput::V4l2(source) => source.fps(),
      CameraInput::Still(source) => source.fps(),
    }
  }
}
