// 该文件是 Xishan （西山晴雪） 项目的一部分。
// tests/pipeline.rs - 流水线端到端测试
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use std::io::Write;
use std::path::PathBuf;

use image::{Rgb, RgbImage};

use xishan::camera::StillSource;
use xishan::canvas::{ImageCanvas, Layout};
use xishan::controller::{FrameController, FrameOutcome};
use xishan::model::ReplayModel;
use xishan::task::{OneShotTask, Task};

/// 白色 8x6 图片，作为静态摄像头输入
fn write_frame_image(dir: &std::path::Path) -> PathBuf {
  let path = dir.join("frame.png");
  let image = RgbImage::from_pixel(8, 6, Rgb([255, 255, 255]));
  image.save(&path).expect("save frame image");
  path
}

/// 一条高于阈值、一条低于阈值的检测记录
fn write_replay_records(dir: &std::path::Path) -> PathBuf {
  let path = dir.join("records.json");
  let mut file = std::fs::File::create(&path).expect("create records");
  file
    .write_all(
      br#"[{
        "boxes": [[2.0, 2.0, 6.0, 6.0], [0.0, 0.0, 1.0, 1.0]],
        "scores": [0.9, 0.3],
        "labels": [1, 2]
      }]"#,
    )
    .expect("write records");
  path
}

fn build_controller(
  dir: &std::path::Path,
  layout: Layout,
) -> FrameController<ReplayModel, ImageCanvas> {
  let records = write_replay_records(dir);
  let model = ReplayModel::load(records.to_str().expect("path")).expect("load model");

  let mut controller = FrameController::new();
  controller.set_model(model);
  controller.set_canvas(ImageCanvas::new(layout));
  controller.set_layout(layout);
  controller
}

#[test]
fn one_shot_task_draws_scaled_boxes_on_canvas() {
  let dir = tempfile::tempdir().expect("tempdir");
  let frame_path = write_frame_image(dir.path());

  // 8x6 帧放入 4x4 视口：缩放系数 0.5，绘制区域 4x3
  let layout = Layout::new(4.0, 4.0);
  let mut controller = build_controller(dir.path(), layout);

  let camera = StillSource::open(frame_path.to_str().expect("path")).expect("camera");
  OneShotTask.run_task(camera, &mut controller).expect("task");

  let surface = controller.canvas().expect("canvas").surface();
  let red = Rgb([255, 0, 0]);
  let white = Rgb([255, 255, 255]);
  let black = Rgb([0, 0, 0]);

  // 检测框 [2,2,6,6] 缩放为 [1,1,3,3]，在 (1,1) 处描出 2x2 轮廓
  assert_eq!(surface.get_pixel(1, 1), &red);
  assert_eq!(surface.get_pixel(2, 1), &red);
  assert_eq!(surface.get_pixel(1, 2), &red);
  assert_eq!(surface.get_pixel(2, 2), &red);

  // 帧画面本身按比例铺在原点
  assert_eq!(surface.get_pixel(0, 0), &white);
  assert_eq!(surface.get_pixel(3, 0), &white);

  // 绘制区域之外保持画布底色
  assert_eq!(surface.get_pixel(0, 3), &black);
  assert_eq!(surface.get_pixel(3, 3), &black);
}

#[test]
fn completed_frame_filters_by_threshold_and_sums_metrics() {
  let dir = tempfile::tempdir().expect("tempdir");
  let frame_path = write_frame_image(dir.path());

  let layout = Layout::new(4.0, 4.0);
  let mut controller = build_controller(dir.path(), layout);

  let mut camera = StillSource::open(frame_path.to_str().expect("path")).expect("camera");
  let frame = camera.next().expect("frame").expect("frame");

  match controller.handle_frame(frame) {
    FrameOutcome::Completed {
      metrics,
      detections,
    } => {
      // 0.3 低于阈值，只剩一个检测
      assert_eq!(detections, 1);
      assert_eq!(
        metrics.total_time,
        metrics.pack_time + metrics.inference_time + metrics.unpack_time
      );
    }
    other => panic!("预期完成, 实际 {:?}", other),
  }
}
