//! 流量规划
//!
//! 为每个客户端生成一条 CBR 流和一条探测流。时间都用整毫秒计算，
//! "k/100 秒" 的错开量因此是精确的 10·k 毫秒。

use super::flow::{Direction, FlowKind, FlowSpec};
use crate::net::NodeId;
use crate::sim::SimTime;
use crate::topo::Topology;
use tracing::debug;

/// 每个客户端下标带来的码率增量（bit/s）
pub const RATE_STEP_BPS: u64 = 100;
/// 探测包载荷字节数
pub const PROBE_PACKET_SIZE: u32 = 10;

const CBR_START_MS: u64 = 1_000;
const CBR_STOP_MS: u64 = 50_000;
const PROBE_START_MS: u64 = 1;
const PROBE_STOP_MS: u64 = 50_001;
const STAGGER_MS: u64 = 10;

fn endpoints(direction: Direction, ap: NodeId, client: NodeId) -> (NodeId, NodeId) {
    match direction {
        Direction::Downlink => (ap, client),
        Direction::Uplink => (client, ap),
    }
}

/// 生成全部流：先是所有客户端的 CBR 流，再是所有探测流，均按 AP 分块、客户端顺序。
pub fn generate_flows(
    topology: &Topology,
    direction: Direction,
    packet_size: u32,
    base_data_rate: u64,
) -> Vec<FlowSpec> {
    let mut cbr = Vec::with_capacity(topology.client_count);
    let mut probes = Vec::with_capacity(topology.client_count);

    for (k, client) in topology.clients().iter().enumerate() {
        let j = topology.block_of(k);
        let ap = topology.aps()[j].id;
        let (src, dst) = endpoints(direction, ap, client.id);
        let k_ms = STAGGER_MS * k as u64;

        // 上下行用同一个码率公式，只与客户端下标有关。
        let data_rate = base_data_rate.saturating_add(RATE_STEP_BPS * k as u64);
        let (start, stop) = match direction {
            Direction::Downlink => (
                SimTime::from_millis(CBR_START_MS + k_ms),
                SimTime::from_millis(CBR_STOP_MS + k_ms),
            ),
            Direction::Uplink => (
                SimTime::from_millis(CBR_START_MS),
                SimTime::from_millis(CBR_STOP_MS + STAGGER_MS * j as u64),
            ),
        };
        debug!(client = k, ap = j, data_rate, %start, %stop, "规划 CBR 流");

        cbr.push(FlowSpec {
            src,
            dst,
            direction,
            kind: FlowKind::Cbr,
            packet_size,
            data_rate,
            start,
            stop,
            client_index: k,
            ap_index: j,
        });
        probes.push(FlowSpec {
            src,
            dst,
            direction,
            kind: FlowKind::Probe,
            packet_size: PROBE_PACKET_SIZE,
            data_rate: 0,
            start: SimTime::from_millis(PROBE_START_MS),
            stop: SimTime::from_millis(PROBE_STOP_MS),
            client_index: k,
            ap_index: j,
        });
    }

    cbr.extend(probes);
    cbr
}
