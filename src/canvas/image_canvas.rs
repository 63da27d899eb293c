// 该文件是 Xishan （西山晴雪） 项目的一部分。
// src/canvas/image_canvas.rs - 内存图像画布
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use std::path::{Path, PathBuf};

use ab_glyph::{FontArc, PxScale};
use chrono::Utc;
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use thiserror::Error;
use tracing::{debug, warn};

use super::{CanvasContext, Layout};

const DEFAULT_FONT_PX: f32 = 16.0;

#[derive(Error, Debug)]
pub enum ImageCanvasError {
  #[error("blob 长度与图像尺寸不匹配")]
  InvalidBlob,
  #[error("图像错误: {0}")]
  Image(#[from] image::ImageError),
  #[error("I/O 错误: {0}")]
  Io(#[from] std::io::Error),
  #[error("无法加载字体: {0}")]
  Font(#[from] ab_glyph::InvalidFont),
}

/// 内存图像画布
///
/// 用一张 RGB 图像充当绘图表面，`invalidate` 在配置了记录目录时把
/// 当前表面落盘为 PNG，否则内存表面本身就是呈现结果。
pub struct ImageCanvas {
  surface: RgbImage,
  fill: Rgb<u8>,
  stroke: Rgb<u8>,
  line_width: f32,
  font_px: f32,
  font: Option<FontArc>,
  record_dir: Option<PathBuf>,
  frame_counter: u64,
}

impl ImageCanvas {
  pub fn new(layout: Layout) -> Self {
    let width = (layout.width.max(1.0)) as u32;
    let height = (layout.height.max(1.0)) as u32;

    Self {
      surface: RgbImage::new(width, height),
      fill: Rgb([255, 255, 255]),
      stroke: Rgb([255, 255, 255]),
      line_width: 1.0,
      font_px: DEFAULT_FONT_PX,
      font: None,
      record_dir: None,
      frame_counter: 0,
    }
  }

  /// 配置帧记录目录，每次提交落盘一张 PNG
  pub fn with_record_dir(mut self, dir: PathBuf) -> Self {
    self.record_dir = Some(dir);
    self
  }

  /// 从字体文件加载标签文本用的字体
  pub fn with_font_file(mut self, path: &Path) -> Result<Self, ImageCanvasError> {
    let data = std::fs::read(path)?;
    self.font = Some(FontArc::try_from_vec(data)?);
    Ok(self)
  }

  /// 当前绘图表面
  pub fn surface(&self) -> &RgbImage {
    &self.surface
  }

  /// 解析 CSS 风格的颜色字符串
  fn parse_color(style: &str) -> Rgb<u8> {
    match style {
      "white" => Rgb([255, 255, 255]),
      "black" => Rgb([0, 0, 0]),
      "red" => Rgb([255, 0, 0]),
      "green" => Rgb([0, 255, 0]),
      "blue" => Rgb([0, 0, 255]),
      "yellow" => Rgb([255, 255, 0]),
      hex if hex.len() == 7 && hex.starts_with('#') => {
        let parse = |range| u8::from_str_radix(&hex[range], 16).unwrap_or(0);
        Rgb([parse(1..3), parse(3..5), parse(5..7)])
      }
      other => {
        warn!("无法解析颜色样式 {:?}, 回退为白色", other);
        Rgb([255, 255, 255])
      }
    }
  }

  fn frame_path(&self, dir: &Path) -> PathBuf {
    dir.join(format!(
      "{}-{:04X}.png",
      Utc::now().format("%Y%m%d-%H%M%S"),
      self.frame_counter
    ))
  }
}

impl CanvasContext for ImageCanvas {
  type Error = ImageCanvasError;

  fn set_fill_style(&mut self, style: &str) {
    self.fill = Self::parse_color(style);
  }

  fn set_stroke_style(&mut self, style: &str) {
    self.stroke = Self::parse_color(style);
  }

  fn set_font(&mut self, font: &str) {
    // 只取 "16px sans-serif" 这类描述中的像素大小
    self.font_px = font
      .split("px")
      .next()
      .and_then(|px| px.trim().parse().ok())
      .unwrap_or(DEFAULT_FONT_PX);
  }

  fn set_line_width(&mut self, width: f32) {
    self.line_width = width.max(1.0);
  }

  fn draw_image(
    &mut self,
    blob: &[u8],
    src_width: u32,
    src_height: u32,
    dst_width: f32,
    dst_height: f32,
  ) -> Result<(), Self::Error> {
    let source = RgbImage::from_raw(src_width, src_height, blob.to_vec())
      .ok_or(ImageCanvasError::InvalidBlob)?;

    let dst_width = (dst_width.round() as u32).max(1);
    let dst_height = (dst_height.round() as u32).max(1);
    let scaled = image::imageops::resize(
      &source,
      dst_width,
      dst_height,
      image::imageops::FilterType::Triangle,
    );

    image::imageops::replace(&mut self.surface, &scaled, 0, 0);
    Ok(())
  }

  fn stroke_rect(&mut self, left: f32, top: f32, width: f32, height: f32) {
    let left = left.floor() as i32;
    let top = top.floor() as i32;
    let width = width.ceil() as i32;
    let height = height.ceil() as i32;

    // 线宽通过向内收缩的同心空心矩形实现
    let thickness = self.line_width.round() as i32;
    for t in 0..thickness {
      let w = width - 2 * t;
      let h = height - 2 * t;
      if w <= 0 || h <= 0 {
        break;
      }
      let rect = Rect::at(left + t, top + t).of_size(w as u32, h as u32);
      draw_hollow_rect_mut(&mut self.surface, rect, self.stroke);
    }
  }

  fn fill_text(&mut self, text: &str, x: f32, y: f32) {
    let Some(font) = self.font.as_ref() else {
      debug!("未加载字体, 跳过文本绘制: {:?}", text);
      return;
    };

    draw_text_mut(
      &mut self.surface,
      self.fill,
      x as i32,
      y as i32,
      PxScale::from(self.font_px),
      font,
      text,
    );
  }

  fn invalidate(&mut self) -> Result<(), Self::Error> {
    self.frame_counter += 1;

    if let Some(dir) = self.record_dir.clone() {
      std::fs::create_dir_all(&dir)?;
      let path = self.frame_path(&dir);
      self.surface.save(&path)?;
      debug!("画布已提交: {}", path.display());
    }

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_named_and_hex_colors() {
    assert_eq!(ImageCanvas::parse_color("red"), Rgb([255, 0, 0]));
    assert_eq!(ImageCanvas::parse_color("white"), Rgb([255, 255, 255]));
    assert_eq!(ImageCanvas::parse_color("#102030"), Rgb([16, 32, 48]));
    assert_eq!(ImageCanvas::parse_color("no-such"), Rgb([255, 255, 255]));
  }

  #[test]
  fn stroke_rect_colors_the_outline() {
    let mut canvas = ImageCanvas::new(Layout::new(40.0, 40.0));
    canvas.set_stroke_style("red");
    canvas.set_line_width(2.0);
    canvas.stroke_rect(5.0, 5.0, 10.0, 10.0);

    let red = Rgb([255, 0, 0]);
    // 外圈四角
    assert_eq!(canvas.surface().get_pixel(5, 5), &red);
    assert_eq!(canvas.surface().get_pixel(14, 5), &red);
    assert_eq!(canvas.surface().get_pixel(5, 14), &red);
    assert_eq!(canvas.surface().get_pixel(14, 14), &red);
    // 线宽 2: 内圈也被描边
    assert_eq!(canvas.surface().get_pixel(6, 6), &red);
    // 矩形内部保持背景色
    assert_eq!(canvas.surface().get_pixel(10, 10), &Rgb([0, 0, 0]));
  }

  #[test]
  fn draw_image_scales_to_destination() {
    let mut canvas = ImageCanvas::new(Layout::new(8.0, 8.0));
    let blob = vec![255u8; 2 * 2 * 3]; // 2x2 全白
    canvas.draw_image(&blob, 2, 2, 4.0, 4.0).expect("draw");

    assert_eq!(canvas.surface().get_pixel(0, 0), &Rgb([255, 255, 255]));
    assert_eq!(canvas.surface().get_pixel(3, 3), &Rgb([255, 255, 255]));
    // 目标区域之外未被触碰
    assert_eq!(canvas.surface().get_pixel(5, 5), &Rgb([0, 0, 0]));
  }

  #[test]
  fn draw_image_rejects_bad_blob() {
    let mut canvas = ImageCanvas::new(Layout::new(8.0, 8.0));
    let result = canvas.draw_image(&[0u8; 5], 2, 2, 4.0, 4.0);
    assert!(matches!(result, Err(ImageCanvasError::InvalidBlob)));
  }

  #[test]
  fn invalidate_records_png_when_configured() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut canvas =
      ImageCanvas::new(Layout::new(4.0, 4.0)).with_record_dir(dir.path().to_path_buf());

    canvas.invalidate().expect("invalidate");

    let entries: Vec<_> = std::fs::read_dir(dir.path())
      .expect("read dir")
      .collect::<Result<_, _>>()
      .expect("entries");
    assert_eq!(entries.len(), 1);
    assert_eq!(
      entries[0].path().extension().and_then(|e| e.to_str()),
      Some("png")
    );
  }
}
