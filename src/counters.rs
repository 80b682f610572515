//! 帧计数器
//!
//! 只统计数据帧；RTS/CTS/ACK 等控制帧与管理帧不进入任何计数。

use crate::engine::{DeviceContext, DeviceEventObserver};
use crate::net::Frame;
use serde::{Deserialize, Serialize};
use tracing::trace;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventCounters {
    pub tx_ok: u64,
    pub rx_ok: u64,
    pub rx_error: u64,
}

/// 挂在引擎事件流上的计数观察者。每次实验新建一个。
#[derive(Debug, Default)]
pub struct EventCounterSink {
    counters: EventCounters,
}

impl EventCounterSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前计数快照
    pub fn snapshot(&self) -> EventCounters {
        self.counters
    }
}

impl DeviceEventObserver for EventCounterSink {
    fn on_tx(&mut self, ctx: &DeviceContext, frame: &Frame, _tx_power_dbm: f64) {
        if frame.is_data() {
            self.counters.tx_ok += 1;
            trace!(node = %ctx.node, frame = frame.id, "tx");
        }
    }

    fn on_rx_ok(&mut self, ctx: &DeviceContext, frame: &Frame, _snr: f64) {
        if frame.is_data() {
            self.counters.rx_ok += 1;
            trace!(node = %ctx.node, frame = frame.id, "rx ok");
        }
    }

    fn on_rx_error(&mut self, ctx: &DeviceContext, frame: &Frame, _snr: f64) {
        if frame.is_data() {
            self.counters.rx_error += 1;
            trace!(node = %ctx.node, frame = frame.id, "rx error");
        }
    }
}
