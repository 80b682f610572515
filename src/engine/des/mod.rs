//! 离散事件无线引擎
//!
//! 一条共享的 ad-hoc 信道：帧在解码范围内被正确接收，在检测范围内解码失败，
//! 范围外不可见。信道串行占用，不建模竞争与重传。

mod backlog;
mod events;
mod monitor;
mod world;

pub use events::IpPacket;
pub use monitor::FlowMonitor;
pub use world::{
    ACK_BYTES, CTS_BYTES, DIFS, EPHEMERAL_PORT_BASE, IP_UDP_OVERHEAD, MAC_OVERHEAD, RTS_BYTES,
    SIFS, WlanWorld,
};

use self::backlog::TxBacklog;
use self::events::AppSend;
use self::world::{App, DeviceState, Medium, NodeState};
use super::{ChannelConfig, DevicePattern, NetworkEngine, RateMode, SharedObserver};
use crate::error::EngineError;
use crate::net::{DeviceId, FiveTuple, NodeId, Position, Subnet};
use crate::sim::{SimTime, Simulator};
use crate::stats::FlowRecord;
use crate::traffic::{FlowKind, FlowSpec, MAX_PACKET_SIZE};
use std::net::Ipv4Addr;
use tracing::{debug, info};

/// echo 客户端的发包间隔（只发一个包时无实际作用）
pub const ECHO_INTERVAL: SimTime = SimTime(100_000_000);

#[derive(Default)]
pub struct DesEngine {
    sim: Simulator,
    world: WlanWorld,
    next_host: u64,
    window: SimTime,
}

impl DesEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> SimTime {
        self.sim.now()
    }

    /// 运行期间执行的事件数
    pub fn events_executed(&self) -> u64 {
        self.sim.executed()
    }

    pub fn monitor(&self) -> &FlowMonitor {
        &self.world.monitor
    }

    /// 设备当前的地址
    pub fn address_of(&self, device: DeviceId) -> Option<Ipv4Addr> {
        self.world.devices.get(device.0)?.addr
    }

    fn node_mut(&mut self, node: NodeId) -> Result<&mut NodeState, EngineError> {
        self.world
            .nodes
            .get_mut(node.0)
            .ok_or(EngineError::UnknownNode(node))
    }

    /// 节点的设备与地址
    fn endpoint(&self, node: NodeId) -> Result<(DeviceId, Ipv4Addr), EngineError> {
        let state = self
            .world
            .nodes
            .get(node.0)
            .ok_or(EngineError::UnknownNode(node))?;
        let device = state.device.ok_or(EngineError::NoDevice(node))?;
        let addr = self.world.devices[device.0]
            .addr
            .ok_or(EngineError::Unaddressed(node))?;
        Ok((device, addr))
    }
}

impl NetworkEngine for DesEngine {
    fn create_nodes(&mut self, count: usize) -> Result<Vec<NodeId>, EngineError> {
        let first = self.world.nodes.len();
        self.world
            .nodes
            .extend((0..count).map(|_| NodeState::default()));
        debug!(count, "创建节点");
        Ok((first..first + count).map(NodeId).collect())
    }

    fn install_mobility(&mut self, node: NodeId, position: Position) -> Result<(), EngineError> {
        self.node_mut(node)?.position = Some(position);
        Ok(())
    }

    fn install_network_stack(&mut self, nodes: &[NodeId]) -> Result<(), EngineError> {
        for &node in nodes {
            self.node_mut(node)?.stack = true;
        }
        Ok(())
    }

    #[tracing::instrument(skip(self, nodes, channel), fields(nodes = nodes.len(), rate = %rate))]
    fn install_link_layer(
        &mut self,
        nodes: &[NodeId],
        channel: &ChannelConfig,
        rate: RateMode,
    ) -> Result<Vec<DeviceId>, EngineError> {
        if channel.decode_range_m.is_nan() || channel.decode_range_m > channel.detect_range_m {
            return Err(EngineError::Init(format!(
                "decode range {} m exceeds detect range {} m",
                channel.decode_range_m, channel.detect_range_m
            )));
        }
        self.world.medium = Some(Medium {
            config: channel.clone(),
            rate,
            busy_until: SimTime::ZERO,
        });

        let mut devices = Vec::with_capacity(nodes.len());
        for &node in nodes {
            let state = self.node_mut(node)?;
            if state.position.is_none() {
                return Err(EngineError::NoMobility(node));
            }
            let device = DeviceId(self.world.devices.len());
            self.node_mut(node)?.device = Some(device);
            self.world.devices.push(DeviceState {
                node,
                addr: None,
                backlog: TxBacklog::new(channel.max_queue_frames),
            });
            devices.push(device);
        }
        info!(devices = devices.len(), "安装无线设备");
        Ok(devices)
    }

    fn assign_addresses(
        &mut self,
        devices: &[DeviceId],
        base: Subnet,
    ) -> Result<Vec<Ipv4Addr>, EngineError> {
        let mut out = Vec::with_capacity(devices.len());
        for &device in devices {
            let node = self
                .world
                .devices
                .get(device.0)
                .map(|d| d.node)
                .ok_or_else(|| EngineError::Init(format!("unknown device {device}")))?;
            if !self.world.nodes[node.0].stack {
                return Err(EngineError::NoNetworkStack(node));
            }
            let addr = base
                .host(self.next_host)
                .ok_or_else(|| EngineError::SubnetExhausted {
                    subnet: base.to_string(),
                    capacity: base.host_capacity(),
                })?;
            if self.world.by_addr.contains_key(&addr) {
                return Err(EngineError::AddressCollision(addr));
            }
            self.next_host += 1;
            self.world.by_addr.insert(addr, device);
            self.world.devices[device.0].addr = Some(addr);
            out.push(addr);
        }
        debug!(base = %base, assigned = out.len(), "分配地址");
        Ok(out)
    }

    fn schedule_flow(&mut self, flow: &FlowSpec) -> Result<(), EngineError> {
        let (src_dev, src_addr) = self.endpoint(flow.src)?;
        let (_, dst_addr) = self.endpoint(flow.dst)?;
        if flow.packet_size > MAX_PACKET_SIZE {
            return Err(EngineError::OversizedPacket {
                size: flow.packet_size,
            });
        }
        let (interval, remaining) = match flow.kind {
            FlowKind::Cbr => {
                let interval = flow.packet_interval().ok_or(EngineError::ZeroRate {
                    src: flow.src,
                    dst: flow.dst,
                })?;
                (interval, None)
            }
            FlowKind::Probe => (ECHO_INTERVAL, Some(1)),
        };

        let src_port = self.node_mut(flow.src)?.allocate_port();
        let tuple = FiveTuple::udp(src_addr, src_port, dst_addr, flow.dst_port());

        let app = self.world.apps.len();
        self.world.apps.push(App {
            device: src_dev,
            tuple,
            ip_bytes: flow.packet_size.saturating_add(IP_UDP_OVERHEAD),
            interval,
            stop: flow.stop,
            remaining,
        });
        self.sim.schedule(flow.start, AppSend { app });
        debug!(%tuple, kind = ?flow.kind, start = %flow.start, stop = %flow.stop, "调度流");
        Ok(())
    }

    fn subscribe_device_events(&mut self, pattern: DevicePattern, observer: SharedObserver) {
        self.world.observers.push((pattern, observer));
    }

    fn run_until(&mut self, duration: SimTime) {
        self.sim.run_until(duration, &mut self.world);
        self.window = self.window.max(duration);
    }

    fn flow_records(&self) -> Vec<FlowRecord> {
        self.world.monitor.records(self.window)
    }
}
