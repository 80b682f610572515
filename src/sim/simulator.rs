//! 仿真器
//!
//! 单线程事件循环：维护当前时间与按时间排序的事件队列。
//! 回调严格按仿真时间顺序串行执行，彼此之间不会并发。

use super::event::Event;
use super::scheduled_event::ScheduledEvent;
use super::time::SimTime;
use super::world::World;
use std::collections::BinaryHeap;
use tracing::{info, trace};

#[derive(Default)]
pub struct Simulator {
    now: SimTime,
    next_seq: u64,
    executed: u64,
    q: BinaryHeap<ScheduledEvent>,
}

impl Simulator {
    /// 当前仿真时间
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// 已执行的事件总数
    pub fn executed(&self) -> u64 {
        self.executed
    }

    /// 在绝对时间 `at` 调度事件；早于当前时间的请求按当前时间处理。
    pub fn schedule<E: Event>(&mut self, at: SimTime, ev: E) {
        let at = at.max(self.now);
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        trace!(now = ?self.now, ?at, seq, event_type = std::any::type_name::<E>(), "调度事件");
        self.q.push(ScheduledEvent {
            at,
            seq,
            ev: Box::new(ev),
        });
    }

    /// 在当前时间之后 `delay` 调度事件。
    pub fn schedule_in<E: Event>(&mut self, delay: SimTime, ev: E) {
        let at = self.now.saturating_add(delay);
        self.schedule(at, ev);
    }

    /// 运行直到事件队列为空或到达 `until`；`until` 时刻的事件会被执行。
    /// 返回时当前时间至少推进到 `until`。
    #[tracing::instrument(skip(self, world), fields(until = %until))]
    pub fn run_until(&mut self, until: SimTime, world: &mut dyn World) {
        info!(queued = self.q.len(), "▶️  开始运行仿真");
        let start_count = self.executed;
        while let Some(top) = self.q.peek() {
            if top.at > until {
                break;
            }
            let Some(item) = self.q.pop() else {
                break;
            };
            self.now = item.at;
            self.executed += 1;
            item.ev.execute(self, world);
        }
        self.now = self.now.max(until);
        info!(
            events = self.executed - start_count,
            remaining = self.q.len(),
            final_time = %self.now,
            "✅ 仿真完成"
        );
    }
}
