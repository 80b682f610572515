//! 统计信息
//!
//! 单条流在引擎内累计的收发计数。

use crate::sim::SimTime;

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct FlowCounters {
    pub tx_packets: u64,
    pub tx_bytes: u64,
    pub rx_packets: u64,
    pub rx_bytes: u64,
    pub lost_packets: u64,
    /// 已送达数据包的端到端时延之和
    pub delay_sum: SimTime,
}

impl FlowCounters {
    pub fn track_tx(&mut self, bytes: u32) {
        self.tx_packets += 1;
        self.tx_bytes += u64::from(bytes);
    }

    pub fn track_rx(&mut self, bytes: u32, delay: SimTime) {
        self.rx_packets += 1;
        self.rx_bytes += u64::from(bytes);
        self.delay_sum = self.delay_sum.saturating_add(delay);
    }

    pub fn track_lost(&mut self) {
        self.lost_packets += 1;
    }
}
