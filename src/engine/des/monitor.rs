//! 流监视器
//!
//! 按五元组给 IP 包分类，每个新五元组分配一个从 1 开始的流 id，并累计收发计数。

use crate::net::{FiveTuple, FlowCounters, FlowId};
use crate::sim::SimTime;
use crate::stats::FlowRecord;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Default)]
pub struct FlowMonitor {
    ids: HashMap<FiveTuple, FlowId>,
    tuples: Vec<FiveTuple>,
    flows: BTreeMap<FlowId, FlowCounters>,
}

impl FlowMonitor {
    pub fn classify(&mut self, tuple: &FiveTuple) -> FlowId {
        if let Some(&id) = self.ids.get(tuple) {
            return id;
        }
        self.tuples.push(*tuple);
        let id = FlowId(self.tuples.len() as u32);
        self.ids.insert(*tuple, id);
        id
    }

    /// 流 id 对应的五元组
    pub fn find_flow(&self, id: FlowId) -> Option<FiveTuple> {
        let idx = (id.0 as usize).checked_sub(1)?;
        self.tuples.get(idx).copied()
    }

    fn counters(&mut self, tuple: &FiveTuple) -> &mut FlowCounters {
        let id = self.classify(tuple);
        self.flows.entry(id).or_default()
    }

    pub fn on_tx(&mut self, tuple: &FiveTuple, bytes: u32) {
        self.counters(tuple).track_tx(bytes);
    }

    pub fn on_rx(&mut self, tuple: &FiveTuple, bytes: u32, delay: SimTime) {
        self.counters(tuple).track_rx(bytes, delay);
    }

    pub fn on_lost(&mut self, tuple: &FiveTuple) {
        self.counters(tuple).track_lost();
    }

    pub fn flow_count(&self) -> usize {
        self.flows.len()
    }

    /// 以 `window` 作为统计窗口导出全部流记录，按流 id 升序
    pub fn records(&self, window: SimTime) -> Vec<FlowRecord> {
        self.flows
            .iter()
            .map(|(&flow_id, &counters)| FlowRecord {
                flow_id,
                tuple: self.find_flow(flow_id),
                counters,
                duration: window,
            })
            .collect()
    }
}
