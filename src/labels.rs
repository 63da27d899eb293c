// 该文件是 Xishan （西山晴雪） 项目的一部分。
// src/labels.rs - 检测类别标签表
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

/// 越界或负数标签 id 对应的保留标签
pub const UNKNOWN_LABEL: &str = "unknown";

/// 检测模型的类别标签表，下标 0 为背景占位
///
/// 顺序与模型输出的整数标签 id 一一对应，进程生命周期内不可变。
pub const CLASSES: [&str; 92] = [
  "",
  "person",
  "bicycle",
  "car",
  "motorcycle",
  "airplane",
  "bus",
  "train",
  "truck",
  "boat",
  "traffic light",
  "fire hydrant",
  "street sign",
  "stop sign",
  "parking meter",
  "bench",
  "bird",
  "cat",
  "dog",
  "horse",
  "sheep",
  "cow",
  "elephant",
  "bear",
  "zebra",
  "giraffe",
  "hat",
  "backpack",
  "umbrella",
  "shoe",
  "eye glasses",
  "handbag",
  "tie",
  "suitcase",
  "frisbee",
  "skis",
  "snowboard",
  "sports ball",
  "kite",
  "baseball bat",
  "baseball glove",
  "skateboard",
  "surfboard",
  "tennis racket",
  "bottle",
  "plate",
  "wine glass",
  "cup",
  "fork",
  "knife",
  "spoon",
  "bowl",
  "banana",
  "apple",
  "sandwich",
  "orange",
  "broccoli",
  "carrot",
  "hot dog",
  "pizza",
  "donut",
  "cake",
  "chair",
  "couch",
  "potted plant",
  "bed",
  "mirror",
  "dining table",
  "window",
  "desk",
  "toilet",
  "door",
  "tv",
  "laptop",
  "mouse",
  "remote",
  "keyboard",
  "cell phone",
  "microwave",
  "oven",
  "toaster",
  "sink",
  "refrigerator",
  "blender",
  "book",
  "clock",
  "vase",
  "scissors",
  "teddy bear",
  "hair drier",
  "toothbrush",
  "hair brush",
];

/// 按模型输出的标签 id 查询标签名，越界时回退到 [`UNKNOWN_LABEL`]
pub fn label_for(id: i32) -> &'static str {
  usize::try_from(id)
    .ok()
    .and_then(|idx| CLASSES.get(idx).copied())
    .unwrap_or(UNKNOWN_LABEL)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn table_layout_matches_model_ids() {
    assert_eq!(CLASSES.len(), 92);
    assert_eq!(CLASSES[0], "");
    assert_eq!(CLASSES[1], "person");
    assert_eq!(CLASSES[3], "car");
    assert_eq!(CLASSES[91], "hair brush");
  }

  #[test]
  fn out_of_range_ids_fall_back_to_unknown() {
    assert_eq!(label_for(92), UNKNOWN_LABEL);
    assert_eq!(label_for(i32::MAX), UNKNOWN_LABEL);
    assert_eq!(label_for(-1), UNKNOWN_LABEL);
  }
}
