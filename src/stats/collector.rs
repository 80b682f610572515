//! 逐流吞吐量汇总
//!
//! throughput = rx_bytes·8 / duration_secs / 1_048_576 (Mbps，二进制兆)。
//! 无法解析五元组的流不计入总和，但以 `FlowResolutionError` 保留在结果中。

use super::record::FlowRecord;
use crate::counters::EventCounters;
use crate::error::FlowResolutionError;
use crate::net::{FiveTuple, FlowId};
use crate::traffic::Direction;
use tracing::{debug, warn};

const BITS_PER_MEGABIT: f64 = 1_048_576.0;

/// rx_bytes 在 `duration_secs` 内对应的吞吐量；窗口为 0 时记为 0。
pub fn throughput_mbps(rx_bytes: u64, duration_secs: f64) -> f64 {
    if duration_secs <= 0.0 {
        return 0.0;
    }
    rx_bytes as f64 * 8.0 / duration_secs / BITS_PER_MEGABIT
}

#[derive(Debug, Clone, PartialEq)]
pub enum FlowStatus {
    Complete,
    Incomplete(FlowResolutionError),
}

/// 单条流的统计结果
#[derive(Debug, Clone, PartialEq)]
pub struct FlowThroughput {
    /// 未被引擎调度成功的流没有 id
    pub flow_id: Option<FlowId>,
    pub tuple: Option<FiveTuple>,
    pub throughput_mbps: f64,
    /// rx_packets / tx_packets
    pub delivery_ratio: Option<f64>,
    pub mean_delay_secs: Option<f64>,
    pub status: FlowStatus,
}

impl FlowThroughput {
    pub fn is_complete(&self) -> bool {
        matches!(self.status, FlowStatus::Complete)
    }

    fn incomplete(flow_id: Option<FlowId>, err: FlowResolutionError) -> Self {
        Self {
            flow_id,
            tuple: None,
            throughput_mbps: 0.0,
            delivery_ratio: None,
            mean_delay_secs: None,
            status: FlowStatus::Incomplete(err),
        }
    }
}

/// 生成 `ExperimentResult` 所需的场景信息
#[derive(Debug, Clone, PartialEq)]
pub struct ResultMeta {
    pub ap_count: usize,
    pub client_count: usize,
    pub radius: f64,
    pub direction: Direction,
    pub rate_mode: String,
    pub scheduled_flows: usize,
}

/// 一次实验的最终结果，生成后不再修改
#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentResult {
    pub ap_count: usize,
    pub client_count: usize,
    pub radius: f64,
    pub direction: Direction,
    pub rate_mode: String,
    pub scheduled_flows: usize,
    pub aggregate_throughput_mbps: f64,
    pub flows: Vec<FlowThroughput>,
    pub counters: EventCounters,
}

impl ExperimentResult {
    pub fn incomplete_flows(&self) -> impl Iterator<Item = &FlowThroughput> {
        self.flows.iter().filter(|f| !f.is_complete())
    }
}

#[derive(Debug, Default)]
pub struct FlowStatsCollector {
    flows: Vec<FlowThroughput>,
}

impl FlowStatsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一条未能调度的流
    pub fn record_failure(&mut self, err: FlowResolutionError) {
        warn!(error = %err, "流不完整");
        self.flows.push(FlowThroughput::incomplete(None, err));
    }

    /// 读取引擎的逐流记录
    pub fn collect(&mut self, records: &[FlowRecord]) {
        for rec in records {
            let Some(tuple) = rec.tuple else {
                let err = FlowResolutionError::UnresolvedTuple(rec.flow_id);
                warn!(error = %err, "流不完整");
                self.flows
                    .push(FlowThroughput::incomplete(Some(rec.flow_id), err));
                continue;
            };

            let c = &rec.counters;
            let throughput = throughput_mbps(c.rx_bytes, rec.duration.as_secs_f64());
            let delivery_ratio =
                (c.tx_packets > 0).then(|| c.rx_packets as f64 / c.tx_packets as f64);
            let mean_delay_secs =
                (c.rx_packets > 0).then(|| c.delay_sum.as_secs_f64() / c.rx_packets as f64);
            debug!(flow = %rec.flow_id, %tuple, throughput, "流吞吐量");

            self.flows.push(FlowThroughput {
                flow_id: Some(rec.flow_id),
                tuple: Some(tuple),
                throughput_mbps: throughput,
                delivery_ratio,
                mean_delay_secs,
                status: FlowStatus::Complete,
            });
        }
    }

    /// 所有完整流的吞吐量之和
    pub fn aggregate_mbps(&self) -> f64 {
        self.flows
            .iter()
            .filter(|f| f.is_complete())
            .map(|f| f.throughput_mbps)
            .sum()
    }

    pub fn finish(self, meta: ResultMeta, counters: EventCounters) -> ExperimentResult {
        let aggregate_throughput_mbps = self.aggregate_mbps();
        let ResultMeta {
            ap_count,
            client_count,
            radius,
            direction,
            rate_mode,
            scheduled_flows,
        } = meta;
        ExperimentResult {
            ap_count,
            client_count,
            radius,
            direction,
            rate_mode,
            scheduled_flows,
            aggregate_throughput_mbps,
            flows: self.flows,
            counters,
        }
    }
}
