// 该文件是 Xishan （西山晴雪） 项目的一部分。
// src/camera/v4l2_source.rs - V4L2 摄像头输入源
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use std::pin::Pin;
use std::time::Instant;

use anyhow::Result;
use image::RgbImage;
use thiserror::Error;
use tracing::{info, warn};
use url::Url;
use v4l::FourCC;
use v4l::buffer::Type;
use v4l::io::mmap::Stream;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;

use super::{CameraSource, Frame};
use crate::{FromUrl, FromUrlWithScheme};

pub(crate) const V4L2_SCHEME: &str = "v4l2";

const CAPTURE_WIDTH: u32 = 640;
const CAPTURE_HEIGHT: u32 = 480;
const CAPTURE_BUFFERS: u32 = 4;

#[derive(Error, Debug)]
pub enum V4l2SourceError {
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("V4L2 错误: {0}")]
  V4l(String),
  #[error("不支持的像素格式: {0}")]
  UnsupportedPixelFormat(String),
}

/// 已打开的 V4L2 设备与其捕获流
///
/// v4l 库的 Stream 需要引用 Device，这里用 Pin<Box> 固定 Device 的内存
/// 地址，从而可以安全地创建引用它的 Stream。
struct OpenDevice {
  /// V4L2 设备（使用 Pin<Box> 固定内存位置）
  device: Pin<Box<Device>>,
  /// 捕获流（生命周期与 device 关联）
  stream: Option<Stream<'static>>,
  width: u32,
  height: u32,
}

impl OpenDevice {
  fn open(device_path: &str) -> Result<Self, V4l2SourceError> {
    let device = Box::pin(
      Device::with_path(device_path)
        .map_err(|e| V4l2SourceError::V4l(format!("无法打开设备 {}: {}", device_path, e)))?,
    );

    // 设置视频格式
    let mut format = device
      .format()
      .map_err(|e| V4l2SourceError::V4l(e.to_string()))?;
    format.width = CAPTURE_WIDTH;
    format.height = CAPTURE_HEIGHT;
    format.fourcc = FourCC::new(b"YUYV");
    let format = device
      .set_format(&format)
      .map_err(|e| V4l2SourceError::V4l(e.to_string()))?;

    if format.fourcc != FourCC::new(b"YUYV") {
      return Err(V4l2SourceError::UnsupportedPixelFormat(
        format.fourcc.to_string(),
      ));
    }

    let mut open = Self {
      device,
      stream: None,
      width: format.width,
      height: format.height,
    };

    // SAFETY: device 被 Pin<Box> 固定，不会移动，所以引用始终有效
    // 1. device 固定在堆上，直到整个 OpenDevice 被 drop
    // 2. stream 存储在同一个结构体中，Drop 中先被 take
    let device_ref: &Device = &open.device;
    let stream = unsafe {
      let device_static: &'static Device = std::mem::transmute(device_ref);
      Stream::with_buffers(device_static, Type::VideoCapture, CAPTURE_BUFFERS)
        .map_err(|e| V4l2SourceError::V4l(format!("无法创建捕获流: {}", e)))?
    };

    open.stream = Some(stream);
    Ok(open)
  }
}

impl Drop for OpenDevice {
  fn drop(&mut self) {
    // 确保 stream 在 device 之前被 drop
    self.stream.take();
  }
}

/// V4L2 摄像头输入源
///
/// 可选地配置备用设备路径（URL 查询参数 `alt`），`flip` 会在主备设备
/// 之间切换，对应移动端前后摄像头的翻转操作。
pub struct V4l2Source {
  open: OpenDevice,
  device_path: String,
  alt_path: Option<String>,
  /// 帧索引
  frame_index: u64,
  /// 开始时间
  start_time: Instant,
}

impl FromUrlWithScheme for V4l2Source {
  const SCHEME: &'static str = V4L2_SCHEME;
}

impl FromUrl for V4l2Source {
  type Error = V4l2SourceError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(V4l2SourceError::SchemeMismatch(url.scheme().to_string()));
    }

    // 形如 v4l2:///dev/video0?alt=/dev/video1
    let device_path = if url.path().is_empty() {
      "/dev/video0".to_string()
    } else {
      url.path().to_string()
    };

    let alt_path = url
      .query_pairs()
      .find(|(k, _)| k == "alt")
      .map(|(_, v)| v.into_owned());

    Self::with_paths(device_path, alt_path)
  }
}

impl V4l2Source {
  pub fn with_paths(
    device_path: String,
    alt_path: Option<String>,
  ) -> Result<Self, V4l2SourceError> {
    let open = OpenDevice::open(&device_path)?;
    info!(
      "摄像头已打开: {} ({}x{})",
      device_path, open.width, open.height
    );

    Ok(Self {
      open,
      device_path,
      alt_path,
      frame_index: 0,
      start_time: Instant::now(),
    })
  }

  /// 将 YUYV 格式转换为 RGB
  fn yuyv_to_rgb(yuyv: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(yuyv.len() / 2 * 3);

    for chunk in yuyv.chunks_exact(4) {
      let y0 = chunk[0] as f32;
      let u = chunk[1] as f32 - 128.0;
      let y1 = chunk[2] as f32;
      let v = chunk[3] as f32 - 128.0;

      for y in [y0, y1] {
        let r = (y + 1.402 * v).clamp(0.0, 255.0) as u8;
        let g = (y - 0.344 * u - 0.714 * v).clamp(0.0, 255.0) as u8;
        let b = (y + 1.772 * u).clamp(0.0, 255.0) as u8;
        rgb.extend_from_slice(&[r, g, b]);
      }
    }

    rgb
  }
}

impl Iterator for V4l2Source {
  type Item = Result<Frame>;

  fn next(&mut self) -> Option<Self::Item> {
    let stream = self.open.stream.as_mut()?;

    match stream.next() {
      Ok((buffer, _meta)) => {
        let rgb_data = Self::yuyv_to_rgb(buffer);

        let image = match RgbImage::from_raw(self.open.width, self.open.height, rgb_data) {
          Some(img) => img,
          None => {
            return Some(Err(anyhow::anyhow!("捕获缓冲区大小不匹配")));
          }
        };

        let timestamp_ms = self.start_time.elapsed().as_millis() as u64;
        let frame = Frame::new(image, self.frame_index, timestamp_ms);
        self.frame_index += 1;
        Some(Ok(frame))
      }
      Err(e) => Some(Err(anyhow::anyhow!("无法捕获帧: {}", e))),
    }
  }
}

impl CameraSource for V4l2Source {
  fn flip(&mut self) -> Result<()> {
    let Some(alt_path) = self.alt_path.take() else {
      warn!("未配置备用摄像头设备，忽略翻转请求");
      return Ok(());
    };

    let open = OpenDevice::open(&alt_path)?;
    info!("摄像头已切换: {} -> {}", self.device_path, alt_path);

    self.open = open;
    self.alt_path = Some(std::mem::replace(&mut self.device_path, alt_path));
    Ok(())
  }

  fn width(&self) -> u32 {
    self.open.width
  }

  fn height(&self) -> u32 {
    self.open.height
  }

  fn fps(&self) -> Option<f64> {
    Some(30.0) // V4L2 默认帧率
  }
}
