//! 错误类型
//!
//! 配置错误在触碰引擎之前抛出；引擎错误分为"单条流"与"整组实验"两级。

use crate::net::{FlowId, NodeId};
use std::net::Ipv4Addr;
use thiserror::Error;

/// 参数组合不合法（对应 `InvalidConfig`）
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("ap_count must be at least 1")]
    NoAccessPoints,

    #[error("client_count {clients} is smaller than ap_count {aps}")]
    TooFewClients { aps: usize, clients: usize },

    #[error("client_count {clients} is not a multiple of ap_count {aps}")]
    UnevenClients { aps: usize, clients: usize },

    #[error("radius must be a finite, non-negative number (got {0})")]
    InvalidRadius(f64),

    #[error("packet_size must be positive")]
    ZeroPacketSize,

    #[error("packet_size {size} exceeds the UDP payload limit of {max} bytes")]
    PacketTooLarge { size: u32, max: u32 },

    #[error("data_rate must be positive")]
    ZeroDataRate,

    #[error("simulation time must be positive")]
    ZeroSimTime,

    #[error("unknown rate mode {0:?}")]
    UnknownRateMode(String),

    #[error("sweep has no {0}")]
    EmptySweepAxis(&'static str),
}

/// 引擎调用失败
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    #[error("node {0} has no mobility model installed")]
    NoMobility(NodeId),

    #[error("node {0} has no network stack installed")]
    NoNetworkStack(NodeId),

    #[error("node {0} has no wireless device")]
    NoDevice(NodeId),

    #[error("node {0} has no IPv4 address")]
    Unaddressed(NodeId),

    #[error("address {0} assigned twice")]
    AddressCollision(Ipv4Addr),

    #[error("subnet {subnet} exhausted after {capacity} addresses")]
    SubnetExhausted { subnet: String, capacity: u64 },

    #[error("flow {src} -> {dst} has a zero data rate")]
    ZeroRate { src: NodeId, dst: NodeId },

    #[error("packet of {size} bytes does not fit in one UDP datagram")]
    OversizedPacket { size: u32 },

    #[error("engine initialization failed: {0}")]
    Init(String),
}

impl EngineError {
    /// 只影响单条流的错误：记录为 `FlowResolutionError`，实验继续。
    pub fn is_flow_level(&self) -> bool {
        matches!(
            self,
            EngineError::Unaddressed(_)
                | EngineError::NoDevice(_)
                | EngineError::ZeroRate { .. }
                | EngineError::OversizedPacket { .. }
        )
    }
}

/// 某条流无法解析到五元组，在结果中标记为不完整。
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FlowResolutionError {
    #[error("flow {0}: five-tuple could not be resolved by the classifier")]
    UnresolvedTuple(FlowId),

    #[error("flow {src} -> {dst} could not be scheduled: {source}")]
    NotScheduled {
        src: NodeId,
        dst: NodeId,
        source: EngineError,
    },
}

/// 单次实验失败
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExperimentError {
    #[error("invalid config: {0}")]
    InvalidConfig(#[from] ConfigError),

    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}

/// 参数扫描因某个组合失败而中止
#[derive(Debug, Clone, PartialEq, Error)]
#[error("combination {params} failed: {source}")]
pub struct SweepError {
    pub params: String,
    pub source: ExperimentError,
}
