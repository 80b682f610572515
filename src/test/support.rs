//! 测试用的脚本化引擎：记录调用，运行时注入预设的帧事件，返回预设的流记录。

use crate::engine::{
    ChannelConfig, DeviceContext, DevicePattern, NetworkEngine, RateMode, SharedObserver,
};
use crate::error::EngineError;
use crate::net::{
    ControlKind, DeviceId, FiveTuple, FlowCounters, FlowId, Frame, MacHeader, ManagementKind,
    NodeId, Position, Subnet,
};
use crate::sim::SimTime;
use crate::stats::FlowRecord;
use crate::traffic::FlowSpec;
use std::net::Ipv4Addr;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Injected {
    Tx(MacHeader),
    RxOk(MacHeader),
    RxError(MacHeader),
}

#[derive(Default)]
pub struct ScriptedEngine {
    pub calls: Vec<&'static str>,
    pub positions: Vec<(NodeId, Position)>,
    pub scheduled: Vec<FlowSpec>,
    pub observers: Vec<(DevicePattern, SharedObserver)>,
    pub script: Vec<Injected>,
    pub records: Vec<FlowRecord>,
    /// 对这些节点的流调度返回 `Unaddressed`
    pub unaddressed: Vec<NodeId>,
    pub fail_link_layer: bool,
    pub ran_for: Option<SimTime>,
    nodes: usize,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }
}

pub fn data() -> MacHeader {
    MacHeader::data()
}

pub fn control_frames() -> Vec<MacHeader> {
    vec![
        MacHeader::control(ControlKind::Rts),
        MacHeader::control(ControlKind::Cts),
        MacHeader::control(ControlKind::Ack),
        MacHeader::management(ManagementKind::Beacon),
        MacHeader::management(ManagementKind::ProbeRequest),
        MacHeader::management(ManagementKind::ProbeResponse),
    ]
}

pub fn tuple(src: u8, dst: u8, dst_port: u16) -> FiveTuple {
    FiveTuple::udp(
        Ipv4Addr::new(10, 0, 0, src),
        49_153,
        Ipv4Addr::new(10, 0, 0, dst),
        dst_port,
    )
}

pub fn record(id: u32, tuple: Option<FiveTuple>, rx_bytes: u64, secs: u64) -> FlowRecord {
    FlowRecord {
        flow_id: FlowId(id),
        tuple,
        counters: FlowCounters {
            rx_bytes,
            ..FlowCounters::default()
        },
        duration: SimTime::from_secs(secs),
    }
}

impl NetworkEngine for ScriptedEngine {
    fn create_nodes(&mut self, count: usize) -> Result<Vec<NodeId>, EngineError> {
        self.calls.push("create_nodes");
        let first = self.nodes;
        self.nodes += count;
        Ok((first..first + count).map(NodeId).collect())
    }

    fn install_mobility(&mut self, node: NodeId, position: Position) -> Result<(), EngineError> {
        self.calls.push("install_mobility");
        self.positions.push((node, position));
        Ok(())
    }

    fn install_network_stack(&mut self, _nodes: &[NodeId]) -> Result<(), EngineError> {
        self.calls.push("install_network_stack");
        Ok(())
    }

    fn install_link_layer(
        &mut self,
        nodes: &[NodeId],
        _channel: &ChannelConfig,
        _rate: RateMode,
    ) -> Result<Vec<DeviceId>, EngineError> {
        self.calls.push("install_link_layer");
        if self.fail_link_layer {
            return Err(EngineError::Init("no channel".into()));
        }
        Ok(nodes.iter().map(|n| DeviceId(n.0)).collect())
    }

    fn assign_addresses(
        &mut self,
        devices: &[DeviceId],
        base: Subnet,
    ) -> Result<Vec<Ipv4Addr>, EngineError> {
        self.calls.push("assign_addresses");
        devices
            .iter()
            .map(|d| {
                base.host(d.0 as u64).ok_or(EngineError::SubnetExhausted {
                    subnet: base.to_string(),
                    capacity: base.host_capacity(),
                })
            })
            .collect()
    }

    fn schedule_flow(&mut self, flow: &FlowSpec) -> Result<(), EngineError> {
        self.calls.push("schedule_flow");
        for node in [flow.src, flow.dst] {
            if self.unaddressed.contains(&node) {
                return Err(EngineError::Unaddressed(node));
            }
        }
        self.scheduled.push(flow.clone());
        Ok(())
    }

    fn subscribe_device_events(&mut self, pattern: DevicePattern, observer: SharedObserver) {
        self.calls.push("subscribe_device_events");
        self.observers.push((pattern, observer));
    }

    fn run_until(&mut self, duration: SimTime) {
        self.calls.push("run_until");
        self.ran_for = Some(duration);
        for (i, injected) in self.script.iter().enumerate() {
            let ctx = DeviceContext {
                node: NodeId(i % self.nodes.max(1)),
                device: DeviceId(i % self.nodes.max(1)),
                at: SimTime::from_millis(i as u64),
            };
            let header = match injected {
                Injected::Tx(h) | Injected::RxOk(h) | Injected::RxError(h) => *h,
            };
            let frame = Frame {
                id: i as u64,
                header,
                size_bytes: 100,
                tuple: None,
            };
            for (pattern, observer) in &self.observers {
                if !pattern.matches(ctx.node, ctx.device) {
                    continue;
                }
                let mut observer = observer.borrow_mut();
                match injected {
                    Injected::Tx(_) => observer.on_tx(&ctx, &frame, 23.0),
                    Injected::RxOk(_) => observer.on_rx_ok(&ctx, &frame, 20.0),
                    Injected::RxError(_) => observer.on_rx_error(&ctx, &frame, 1.0),
                }
            }
        }
    }

    fn flow_records(&self) -> Vec<FlowRecord> {
        self.records.clone()
    }
}
