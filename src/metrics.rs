// 该文件是 Xishan （西山晴雪） 项目的一部分。
// src/metrics.rs - 各流水线阶段的耗时统计
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use std::time::{Duration, Instant};

use serde::Serialize;

/// 时钟抽象，便于在测试中注入可控时间
pub trait Clock {
  fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> Instant {
    Instant::now()
  }
}

/// 流水线阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
  Pack,
  Inference,
  Unpack,
}

impl Stage {
  pub const ALL: [Stage; 3] = [Stage::Pack, Stage::Inference, Stage::Unpack];

  fn index(self) -> usize {
    match self {
      Stage::Pack => 0,
      Stage::Inference => 1,
      Stage::Unpack => 2,
    }
  }

  pub fn name(self) -> &'static str {
    match self {
      Stage::Pack => "pack",
      Stage::Inference => "inference",
      Stage::Unpack => "unpack",
    }
  }
}

/// 单帧的耗时汇总（毫秒，向下取整）
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
  pub pack_time: u64,
  pub inference_time: u64,
  pub unpack_time: u64,
  pub total_time: u64,
}

/// 耗时记录器
///
/// 每个阶段内部保存一个相对记录器纪元的时间值：`mark` 写入当前时刻，
/// `measure` 用当前时刻减去所写值，得到该阶段耗时。
///
/// 已知边界情况：未先 `mark` 就调用 `measure` 时，基线是未设置的零值，
/// 得到的是相对记录器纪元的流逝时间。此行为保留自原始实现，不做防护。
pub struct Measurement<K = SystemClock> {
  epoch: Instant,
  marks: [Duration; 3],
  clock: K,
}

impl Measurement<SystemClock> {
  pub fn new() -> Self {
    Self::with_clock(SystemClock)
  }
}

impl Default for Measurement<SystemClock> {
  fn default() -> Self {
    Self::new()
  }
}

impl<K: Clock> Measurement<K> {
  pub fn with_clock(clock: K) -> Self {
    Self {
      epoch: clock.now(),
      marks: [Duration::ZERO; 3],
      clock,
    }
  }

  /// 记录阶段起点
  pub fn mark(&mut self, stage: Stage) {
    self.marks[stage.index()] = self.clock.now() - self.epoch;
  }

  /// 用流逝时间覆盖阶段起点
  pub fn measure(&mut self, stage: Stage) {
    let since_epoch = self.clock.now() - self.epoch;
    let slot = &mut self.marks[stage.index()];
    *slot = since_epoch.saturating_sub(*slot);
  }

  /// 返回毫秒级汇总并清空全部记录
  pub fn get_metrics(&mut self) -> Metrics {
    let pack_time = self.marks[Stage::Pack.index()].as_millis() as u64;
    let inference_time = self.marks[Stage::Inference.index()].as_millis() as u64;
    let unpack_time = self.marks[Stage::Unpack.index()].as_millis() as u64;

    for stage in Stage::ALL {
      self.marks[stage.index()] = Duration::ZERO;
    }

    Metrics {
      pack_time,
      inference_time,
      unpack_time,
      total_time: pack_time + inference_time + unpack_time,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::cell::Cell;
  use std::rc::Rc;

  /// 手动推进的测试时钟
  #[derive(Clone)]
  struct ManualClock {
    now: Rc<Cell<Instant>>,
  }

  impl ManualClock {
    fn start() -> Self {
      Self {
        now: Rc::new(Cell::new(Instant::now())),
      }
    }

    fn advance(&self, duration: Duration) {
      self.now.set(self.now.get() + duration);
    }
  }

  impl Clock for ManualClock {
    fn now(&self) -> Instant {
      self.now.get()
    }
  }

  #[test]
  fn measure_truncates_to_whole_milliseconds() {
    let clock = ManualClock::start();
    let mut measurement = Measurement::with_clock(clock.clone());

    measurement.mark(Stage::Pack);
    clock.advance(Duration::from_micros(12_700));
    measurement.measure(Stage::Pack);

    assert_eq!(measurement.get_metrics().pack_time, 12);
  }

  #[test]
  fn get_metrics_resets_all_marks() {
    let clock = ManualClock::start();
    let mut measurement = Measurement::with_clock(clock.clone());

    measurement.mark(Stage::Inference);
    clock.advance(Duration::from_millis(42));
    measurement.measure(Stage::Inference);

    let first = measurement.get_metrics();
    assert_eq!(first.inference_time, 42);

    let second = measurement.get_metrics();
    assert_eq!(second, Metrics::default());
  }

  #[test]
  fn total_is_sum_of_stage_times() {
    let clock = ManualClock::start();
    let mut measurement = Measurement::with_clock(clock.clone());

    let durations = [(Stage::Pack, 3), (Stage::Inference, 250), (Stage::Unpack, 7)];
    for (stage, millis) in durations {
      measurement.mark(stage);
      clock.advance(Duration::from_millis(millis));
      measurement.measure(stage);
    }

    let metrics = measurement.get_metrics();
    assert_eq!(metrics.pack_time, 3);
    assert_eq!(metrics.inference_time, 250);
    assert_eq!(metrics.unpack_time, 7);
    assert_eq!(
      metrics.total_time,
      metrics.pack_time + metrics.inference_time + metrics.unpack_time
    );
  }

  #[test]
  fn measure_without_mark_uses_epoch_baseline() {
    // 未 mark 直接 measure：基线为零，得到相对纪元的流逝时间
    let clock = ManualClock::start();
    let mut measurement = Measurement::with_clock(clock.clone());

    clock.advance(Duration::from_millis(5));
    measurement.measure(Stage::Unpack);

    assert_eq!(measurement.get_metrics().unpack_time, 5);
  }
}
