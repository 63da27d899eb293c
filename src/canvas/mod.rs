// 该文件是 Xishan （西山晴雪） 项目的一部分。
// src/canvas/mod.rs - 画布能力定义
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

mod image_canvas;

pub use image_canvas::{ImageCanvas, ImageCanvasError};

/// 视口布局尺寸，由布局变更通知写入，帧处理路径只读
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
  pub width: f32,
  pub height: f32,
}

impl Layout {
  pub fn new(width: f32, height: f32) -> Self {
    Self { width, height }
  }
}

/// 2D 画布能力
///
/// 对应宿主画布的绘图上下文：样式属性、图像位块传送、矩形描边、
/// 文本填充，以及显式的提交（present）操作。
pub trait CanvasContext {
  type Error: std::error::Error + Send + Sync + 'static;

  fn set_fill_style(&mut self, style: &str);
  fn set_stroke_style(&mut self, style: &str);
  fn set_font(&mut self, font: &str);
  fn set_line_width(&mut self, width: f32);

  /// 把 HWC 字节 blob 缩放绘制到画布原点
  fn draw_image(
    &mut self,
    blob: &[u8],
    src_width: u32,
    src_height: u32,
    dst_width: f32,
    dst_height: f32,
  ) -> Result<(), Self::Error>;

  /// 按当前描边样式与线宽描画矩形轮廓
  fn stroke_rect(&mut self, left: f32, top: f32, width: f32, height: f32);

  /// 按当前填充样式在 (x, y) 处绘制文本
  fn fill_text(&mut self, text: &str, x: f32, y: f32);

  /// 提交画布内容，返回前保证完成，之后帧才可以被安全释放
  fn invalidate(&mut self) -> Result<(), Self::Error>;
}
