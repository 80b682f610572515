//! 外部仿真引擎接口
//!
//! 实验驱动只通过 `NetworkEngine` 与引擎交互：创建节点、安装移动模型/协议栈/
//! 无线设备、分配地址、调度流、订阅设备事件、运行、读取流记录。
//! `DesEngine` 是基于本 crate 事件内核的实现。

mod channel;
pub mod des;
mod observer;

pub use channel::{ChannelConfig, PLCP_OVERHEAD, RTS_THRESHOLD_OFF, RTS_THRESHOLD_ON, RateMode};
pub use des::DesEngine;
pub use observer::{DeviceContext, DeviceEventObserver, DevicePattern, SharedObserver};

use crate::error::EngineError;
use crate::net::{DeviceId, NodeId, Position, Subnet};
use crate::sim::SimTime;
use crate::stats::FlowRecord;
use crate::traffic::FlowSpec;
use std::net::Ipv4Addr;

pub trait NetworkEngine {
    /// 创建 `count` 个节点，返回其句柄
    fn create_nodes(&mut self, count: usize) -> Result<Vec<NodeId>, EngineError>;

    /// 为节点安装固定位置
    fn install_mobility(&mut self, node: NodeId, position: Position) -> Result<(), EngineError>;

    /// 安装 IP/UDP 协议栈
    fn install_network_stack(&mut self, nodes: &[NodeId]) -> Result<(), EngineError>;

    /// 在共享信道上为每个节点安装一块无线设备
    fn install_link_layer(
        &mut self,
        nodes: &[NodeId],
        channel: &ChannelConfig,
        rate: RateMode,
    ) -> Result<Vec<DeviceId>, EngineError>;

    /// 从 `base` 子网顺序分配地址，结果与 `devices` 一一对应
    fn assign_addresses(
        &mut self,
        devices: &[DeviceId],
        base: Subnet,
    ) -> Result<Vec<Ipv4Addr>, EngineError>;

    /// 安装一对流量发生器/接收器
    fn schedule_flow(&mut self, flow: &FlowSpec) -> Result<(), EngineError>;

    fn subscribe_device_events(&mut self, pattern: DevicePattern, observer: SharedObserver);

    /// 从当前时间运行到 `duration`
    fn run_until(&mut self, duration: SimTime);

    /// 运行结束后的逐流记录
    fn flow_records(&self) -> Vec<FlowRecord>;
}
