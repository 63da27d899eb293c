// 该文件是 Xishan （西山晴雪） 项目的一部分。
// src/overlay.rs - 检测结果叠加渲染
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use crate::camera::CameraFrame;
use crate::canvas::{CanvasContext, Layout};
use crate::unpack::BoundingBox;

// 叠加层固定样式
const BOX_FILL_STYLE: &str = "white";
const BOX_STROKE_STYLE: &str = "red";
const BOX_LINE_WIDTH: f32 = 3.0;
const LABEL_FONT: &str = "16px sans-serif";

/// 等比缩放系数：保持宽高比，完整放入视口
pub fn scale_to_fit(layout: &Layout, frame_width: u32, frame_height: u32) -> f32 {
  let sx = layout.width / frame_width as f32;
  let sy = layout.height / frame_height as f32;
  sx.min(sy)
}

/// 把摄像头帧与检测框绘制到画布并提交
///
/// 帧按缩放系数绘制在原点；每个检测框的四个坐标乘以同一系数后描边，
/// 标签文本绘制在框的左上角。全部绘制完成后提交画布并等待完成，
/// 之后调用方才可以安全释放帧。
pub fn render<C: CanvasContext, F: CameraFrame>(
  ctx: &mut C,
  layout: &Layout,
  frame: &F,
  results: &[BoundingBox],
) -> Result<(), C::Error> {
  let width = frame.width();
  let height = frame.height();
  let scale = scale_to_fit(layout, width, height);

  ctx.draw_image(
    frame.to_blob(),
    width,
    height,
    width as f32 * scale,
    height as f32 * scale,
  )?;

  ctx.set_fill_style(BOX_FILL_STYLE);
  ctx.set_stroke_style(BOX_STROKE_STYLE);
  ctx.set_font(LABEL_FONT);
  ctx.set_line_width(BOX_LINE_WIDTH);

  for result in results {
    let [left, top, right, bottom] = result.rect;
    let left = left * scale;
    let top = top * scale;
    let right = right * scale;
    let bottom = bottom * scale;

    ctx.stroke_rect(left, top, right - left, bottom - top);
    ctx.fill_text(result.label, left, top);
  }

  ctx.invalidate()
}
