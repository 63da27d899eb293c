// 该文件是 Xishan （西山晴雪） 项目的一部分。
// src/camera/still_source.rs - 静态图片摄像头输入源
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use std::time::Instant;

use anyhow::Result;
use image::{ImageReader, RgbImage};
use thiserror::Error;
use tracing::debug;
use url::Url;

use super::{CameraSource, Frame};
use crate::{FromUrl, FromUrlWithScheme};

pub(crate) const STILL_SCHEME: &str = "still";

#[derive(Error, Debug)]
pub enum StillSourceError {
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("无法打开图片文件: {0}")]
  IoError(#[from] std::io::Error),
  #[error("无法解码图片文件: {0}")]
  ImageError(#[from] image::ImageError),
}

/// 静态图片输入源
///
/// 把一张图片当作无限帧流回放，用于无摄像头硬件时的联调。
/// `flip` 在这里表现为水平镜像，模拟前后镜头切换。
pub struct StillSource {
  /// 图片数据
  image: RgbImage,
  /// 帧索引
  frame_index: u64,
  /// 开始时间
  start_time: Instant,
}

impl FromUrlWithScheme for StillSource {
  const SCHEME: &'static str = STILL_SCHEME;
}

impl FromUrl for StillSource {
  type Error = StillSourceError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME && url.scheme() != "file" {
      return Err(StillSourceError::SchemeMismatch(url.scheme().to_string()));
    }

    Self::open(url.path())
  }
}

impl StillSource {
  pub fn open(path: &str) -> Result<Self, StillSourceError> {
    let image = ImageReader::open(path)?.decode()?.to_rgb8();
    debug!("图片输入源已加载: {} ({}x{})", path, image.width(), image.height());

    Ok(Self {
      image,
      frame_index: 0,
      start_time: Instant::now(),
    })
  }
}

impl Iterator for StillSource {
  type Item = Result<Frame>;

  fn next(&mut self) -> Option<Self::Item> {
    let timestamp_ms = self.start_time.elapsed().as_millis() as u64;
    let frame = Frame::new(self.image.clone(), self.frame_index, timestamp_ms);
    self.frame_index += 1;
    Some(Ok(frame))
  }
}

impl CameraSource for StillSource {
  fn flip(&mut self) -> Result<()> {
    self.image = image::imageops::flip_horizontal(&self.image);
    Ok(())
  }

  fn width(&self) -> u32 {
    self.image.width()
  }

  fn height(&self) -> u32 {
    self.image.height()
  }

  fn fps(&self) -> Option<f64> {
    None
  }
}
