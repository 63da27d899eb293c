// 该文件是 Xishan （西山晴雪） 项目的一部分。
// src/pack.rs - 帧预处理（pack）
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use ndarray::Array3;

use crate::camera::CameraFrame;

const RGB_CHANNELS: usize = 3;

/// 按通道的归一化变换
///
/// 当前配置（均值 0、标准差 1）是恒等变换，保留它是为了之后可以
/// 直接换成模型训练时的统计值。
#[derive(Debug, Clone, Copy)]
pub struct Normalize {
  mean: [f32; 3],
  std: [f32; 3],
}

impl Default for Normalize {
  fn default() -> Self {
    Self {
      mean: [0.0; 3],
      std: [1.0; 3],
    }
  }
}

impl Normalize {
  pub fn new(mean: [f32; 3], std: [f32; 3]) -> Self {
    Self { mean, std }
  }

  pub fn apply(&self, tensor: &mut Array3<f32>) {
    for (c, mut plane) in tensor.outer_iter_mut().enumerate() {
      let (mean, std) = (self.mean[c], self.std[c]);
      plane.mapv_inplace(|v| (v - mean) / std);
    }
  }
}

/// 把摄像头帧打包为模型输入张量
///
/// HWC 字节 blob -> `[H, W, 3]` -> 转置为 `[3, H, W]` -> 除以 255 映射到
/// `[0, 1]` -> 按通道归一化。不添加批维度，也不改动输入帧。
pub fn pack<F: CameraFrame>(frame: &F, normalize: &Normalize) -> Array3<f32> {
  let width = frame.width() as usize;
  let height = frame.height() as usize;
  let blob = frame.to_blob();

  let hwc = Array3::from_shape_vec((height, width, RGB_CHANNELS), blob.to_vec())
    .unwrap_or_else(|_| {
      panic!(
        "帧数据长度不匹配: 期望长度 {}, 实际长度 {}",
        RGB_CHANNELS * width * height,
        blob.len()
      )
    });

  let mut tensor = hwc.permuted_axes([2, 0, 1]).mapv(|v| v as f32);
  tensor /= 255.0;
  normalize.apply(&mut tensor);

  tensor
}
