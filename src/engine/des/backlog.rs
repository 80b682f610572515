//! 设备发送队列（尾丢弃）
//!
//! 信道在发送时就被预约，因此队列里保存的是已预约但尚未开始发送的帧的起始时间。

use crate::sim::SimTime;
use std::collections::VecDeque;

#[derive(Debug)]
pub struct TxBacklog {
    max_frames: usize,
    starts: VecDeque<SimTime>,
}

impl TxBacklog {
    pub fn new(max_frames: usize) -> Self {
        Self {
            max_frames,
            starts: VecDeque::new(),
        }
    }

    /// 丢掉已经开始发送的条目
    fn prune(&mut self, now: SimTime) {
        while self.starts.front().is_some_and(|&t| t <= now) {
            self.starts.pop_front();
        }
    }

    /// 预约一次在 `start` 开始的发送；队列已满返回 false
    pub fn try_reserve(&mut self, now: SimTime, start: SimTime) -> bool {
        self.prune(now);
        if self.starts.len() >= self.max_frames {
            return false;
        }
        self.starts.push_back(start);
        true
    }
}
