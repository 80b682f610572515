//! 流规格

use crate::net::NodeId;
use crate::sim::SimTime;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// CBR 流的目的端口
pub const CBR_PORT: u16 = 12345;
/// echo 探测的目的端口
pub const ECHO_PORT: u16 = 9;
/// 单个 UDP 数据报的最大载荷：65535 - 20(IPv4) - 8(UDP)
pub const MAX_PACKET_SIZE: u32 = 65_507;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// 客户端 -> AP
    Uplink,
    /// AP -> 客户端
    Downlink,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Uplink => f.write_str("uplink"),
            Direction::Downlink => f.write_str("downlink"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowKind {
    /// 恒定码率（on/off 中 on 恒为 1、off 恒为 0）
    Cbr,
    /// 单包 echo 探测
    Probe,
}

impl FlowKind {
    pub fn dst_port(&self) -> u16 {
        match self {
            FlowKind::Cbr => CBR_PORT,
            FlowKind::Probe => ECHO_PORT,
        }
    }
}

/// 一条待调度的流
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowSpec {
    pub src: NodeId,
    pub dst: NodeId,
    pub direction: Direction,
    pub kind: FlowKind,
    /// 应用层载荷字节数
    pub packet_size: u32,
    /// bit/s；探测流为 0（只发一个包）
    pub data_rate: u64,
    pub start: SimTime,
    pub stop: SimTime,
    /// 生成该流的客户端全局下标
    pub client_index: usize,
    /// 客户端所属的 AP 分块下标
    pub ap_index: usize,
}

impl FlowSpec {
    pub fn dst_port(&self) -> u16 {
        self.kind.dst_port()
    }

    /// 替换端点（拓扑下标 -> 引擎节点句柄）
    pub fn with_endpoints(&self, src: NodeId, dst: NodeId) -> FlowSpec {
        FlowSpec {
            src,
            dst,
            ..self.clone()
        }
    }

    /// CBR 发包间隔：packet_size·8 / data_rate 秒，向上取整到纳秒
    pub fn packet_interval(&self) -> Option<SimTime> {
        if self.data_rate == 0 {
            return None;
        }
        let bits = u128::from(self.packet_size) * 8;
        let nanos = (bits * 1_000_000_000 + u128::from(self.data_rate) - 1)
            / u128::from(self.data_rate);
        Some(SimTime(nanos.min(u64::MAX as u128) as u64))
    }
}
