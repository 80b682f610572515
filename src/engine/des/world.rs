//! 无线世界
//!
//! `DesEngine` 的全部可变状态：节点、设备、共享信道、应用、观察者与流监视器。

use super::backlog::TxBacklog;
use super::events::{FrameTx, IpPacket};
use super::monitor::FlowMonitor;
use crate::engine::{ChannelConfig, DeviceContext, DevicePattern, RateMode, SharedObserver};
use crate::net::{ControlKind, DeviceId, FiveTuple, Frame, MacHeader, NodeId, Position};
use crate::sim::{SimTime, Simulator, World};
use crate::traffic::ECHO_PORT;
use std::any::Any;
use std::collections::HashMap;
use std::net::Ipv4Addr;
use tracing::{debug, trace};

/// UDP(8) + IPv4(20) 头部
pub const IP_UDP_OVERHEAD: u32 = 28;
/// MAC 头(24) + LLC/SNAP(8) + FCS(4)
pub const MAC_OVERHEAD: u32 = 36;
pub const RTS_BYTES: u32 = 20;
pub const CTS_BYTES: u32 = 14;
pub const ACK_BYTES: u32 = 14;
pub const SIFS: SimTime = SimTime(10_000);
pub const DIFS: SimTime = SimTime(50_000);
/// 第一个临时端口
pub const EPHEMERAL_PORT_BASE: u16 = 49_153;

#[derive(Debug)]
pub(crate) struct NodeState {
    pub position: Option<Position>,
    pub stack: bool,
    pub device: Option<DeviceId>,
    pub next_port: u16,
}

impl Default for NodeState {
    fn default() -> Self {
        Self {
            position: None,
            stack: false,
            device: None,
            next_port: EPHEMERAL_PORT_BASE,
        }
    }
}

impl NodeState {
    pub fn allocate_port(&mut self) -> u16 {
        let port = self.next_port;
        self.next_port = self.next_port.checked_add(1).unwrap_or(EPHEMERAL_PORT_BASE);
        port
    }
}

#[derive(Debug)]
pub(crate) struct DeviceState {
    pub node: NodeId,
    pub addr: Option<Ipv4Addr>,
    pub backlog: TxBacklog,
}

#[derive(Debug)]
pub(crate) struct Medium {
    pub config: ChannelConfig,
    pub rate: RateMode,
    pub busy_until: SimTime,
}

/// 流量发生器：CBR 或单包 echo 客户端
#[derive(Debug, Clone)]
pub(crate) struct App {
    pub device: DeviceId,
    pub tuple: FiveTuple,
    /// IP 层包长
    pub ip_bytes: u32,
    pub interval: SimTime,
    pub stop: SimTime,
    /// `None` 表示不限包数
    pub remaining: Option<u32>,
}

/// 一次信道预约中的帧序列
struct Exchange {
    rate: RateMode,
    frames: Vec<(SimTime, FrameTx)>,
}

impl Exchange {
    fn new(rate: RateMode) -> Self {
        Self {
            rate,
            frames: Vec::with_capacity(4),
        }
    }

    /// 追加一帧，返回其发送结束时间
    fn push(&mut self, at: SimTime, tx: FrameTx) -> SimTime {
        let end = at.saturating_add(self.rate.tx_time(tx.frame.size_bytes));
        self.frames.push((at, tx));
        end
    }
}

#[derive(Default)]
pub struct WlanWorld {
    pub(crate) nodes: Vec<NodeState>,
    pub(crate) devices: Vec<DeviceState>,
    pub(crate) by_addr: HashMap<Ipv4Addr, DeviceId>,
    pub(crate) medium: Option<Medium>,
    pub(crate) observers: Vec<(DevicePattern, SharedObserver)>,
    pub(crate) monitor: FlowMonitor,
    pub(crate) apps: Vec<App>,
    next_frame_id: u64,
}

impl World for WlanWorld {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// 观察者回调类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Notify {
    Tx,
    RxOk,
    RxError,
}

impl WlanWorld {
    pub(crate) fn position_of(&self, device: DeviceId) -> Option<Position> {
        let node = self.devices.get(device.0)?.node;
        self.nodes.get(node.0)?.position
    }

    fn frame_tx(
        &mut self,
        sender: DeviceId,
        receiver: DeviceId,
        header: MacHeader,
        size_bytes: u32,
        packet: Option<IpPacket>,
    ) -> FrameTx {
        let id = self.next_frame_id;
        self.next_frame_id = self.next_frame_id.wrapping_add(1);
        let frame = Frame {
            id,
            header,
            size_bytes,
            tuple: packet.as_ref().map(|p| p.tuple),
        };
        FrameTx {
            sender,
            receiver,
            frame,
            packet,
        }
    }

    /// 按订阅模式把事件分发给观察者
    pub(crate) fn notify(&self, kind: Notify, device: DeviceId, at: SimTime, frame: &Frame, value: f64) {
        let Some(dev) = self.devices.get(device.0) else {
            return;
        };
        let ctx = DeviceContext {
            node: dev.node,
            device,
            at,
        };
        for (pattern, observer) in &self.observers {
            if !pattern.matches(ctx.node, device) {
                continue;
            }
            let mut observer = observer.borrow_mut();
            match kind {
                Notify::Tx => observer.on_tx(&ctx, frame, value),
                Notify::RxOk => observer.on_rx_ok(&ctx, frame, value),
                Notify::RxError => observer.on_rx_error(&ctx, frame, value),
            }
        }
    }

    /// 把一个 IP 包交给 `src` 设备发送。
    ///
    /// 信道在此刻就被整段预约（[RTS, CTS,] DATA[, ACK]），帧事件按各自的开始时间调度。
    /// 目的地超出解码范围的包在预约时即记为丢失。
    pub(crate) fn send_packet(&mut self, src: DeviceId, pkt: IpPacket, sim: &mut Simulator) {
        let now = sim.now();
        self.monitor.on_tx(&pkt.tuple, pkt.size_bytes);

        let Some(dst) = self.by_addr.get(&pkt.tuple.dst).copied() else {
            debug!(tuple = %pkt.tuple, "目的地址不存在，丢弃");
            self.monitor.on_lost(&pkt.tuple);
            return;
        };
        let (Some(src_pos), Some(dst_pos)) = (self.position_of(src), self.position_of(dst)) else {
            self.monitor.on_lost(&pkt.tuple);
            return;
        };
        let Some(medium) = self.medium.as_ref() else {
            self.monitor.on_lost(&pkt.tuple);
            return;
        };
        let rate = medium.rate;
        let reachable = src_pos.distance(&dst_pos) <= medium.config.decode_range_m;
        let use_rts = pkt.size_bytes.saturating_add(MAC_OVERHEAD) > medium.config.rts_threshold_bytes;
        let mut t = now.max(medium.busy_until).saturating_add(DIFS);

        if !self.devices[src.0].backlog.try_reserve(now, t) {
            debug!(device = %src, tuple = %pkt.tuple, "发送队列已满，尾丢弃");
            self.monitor.on_lost(&pkt.tuple);
            return;
        }

        let mut exchange = Exchange::new(rate);
        let mut delivered = true;
        if use_rts {
            let rts = self.frame_tx(src, dst, MacHeader::control(ControlKind::Rts), RTS_BYTES, None);
            t = exchange.push(t, rts).saturating_add(SIFS);
            if reachable {
                let cts = self.frame_tx(dst, src, MacHeader::control(ControlKind::Cts), CTS_BYTES, None);
                t = exchange.push(t, cts).saturating_add(SIFS);
            } else {
                delivered = false;
            }
        }
        if delivered {
            let data_bytes = pkt.size_bytes.saturating_add(MAC_OVERHEAD);
            let data = self.frame_tx(src, dst, MacHeader::data(), data_bytes, Some(pkt.clone()));
            t = exchange.push(t, data);
            if reachable {
                let ack = self.frame_tx(dst, src, MacHeader::control(ControlKind::Ack), ACK_BYTES, None);
                t = exchange.push(t.saturating_add(SIFS), ack);
            }
        }
        if !reachable {
            self.monitor.on_lost(&pkt.tuple);
        }

        if let Some(medium) = self.medium.as_mut() {
            medium.busy_until = t;
        }
        trace!(tuple = %pkt.tuple, frames = exchange.frames.len(), busy_until = %t, "预约信道");
        for (at, ev) in exchange.frames {
            sim.schedule(at, ev);
        }
    }

    /// 目的设备收到 IP 包：记入流统计；echo 请求立即原路回送。
    pub(crate) fn deliver(&mut self, device: DeviceId, pkt: IpPacket, sim: &mut Simulator) {
        let now = sim.now();
        let delay = now.saturating_sub(pkt.sent_at);
        self.monitor.on_rx(&pkt.tuple, pkt.size_bytes, delay);
        trace!(device = %device, tuple = %pkt.tuple, delay = %delay, "交付 IP 包");

        if pkt.tuple.dst_port == ECHO_PORT {
            let reply = IpPacket {
                tuple: pkt.tuple.reversed(),
                size_bytes: pkt.size_bytes,
                sent_at: now,
            };
            self.send_packet(device, reply, sim);
        }
    }
}
