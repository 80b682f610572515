//! 引擎给出的逐流记录（只读）

use crate::net::{FiveTuple, FlowId, FlowCounters};
use crate::sim::SimTime;

#[derive(Debug, Clone, PartialEq)]
pub struct FlowRecord {
    pub flow_id: FlowId,
    /// 分类器解析出的五元组；解析失败时为 `None`
    pub tuple: Option<FiveTuple>,
    pub counters: FlowCounters,
    /// 吞吐量的统计窗口
    pub duration: SimTime,
}

impl FlowRecord {
    pub fn rx_bytes(&self) -> u64 {
        self.counters.rx_bytes
    }
}
