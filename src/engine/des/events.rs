//! 引擎事件
//!
//! 应用发包、帧开始发送、帧到达接收端。

use super::world::{Notify, WlanWorld};
use crate::net::{DeviceId, FiveTuple, Frame};
use crate::sim::{Event, SimTime, Simulator, World};
use tracing::trace;

/// 在途的 IP 包
#[derive(Debug, Clone, PartialEq)]
pub struct IpPacket {
    pub tuple: FiveTuple,
    /// IP 层字节数（载荷 + UDP/IP 头）
    pub size_bytes: u32,
    pub sent_at: SimTime,
}

fn wlan(world: &mut dyn World) -> &mut WlanWorld {
    world
        .as_any_mut()
        .downcast_mut::<WlanWorld>()
        .expect("world must be WlanWorld")
}

/// 事件：应用 `app` 发送下一个包
#[derive(Debug)]
pub struct AppSend {
    pub app: usize,
}

impl Event for AppSend {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let w = wlan(world);
        let now = sim.now();
        let Some(app) = w.apps.get_mut(self.app) else {
            return;
        };
        if now >= app.stop || app.remaining == Some(0) {
            return;
        }
        if let Some(n) = app.remaining.as_mut() {
            *n -= 1;
        }
        let (device, pkt) = (
            app.device,
            IpPacket {
                tuple: app.tuple,
                size_bytes: app.ip_bytes,
                sent_at: now,
            },
        );
        let interval = app.interval;
        let more = now.saturating_add(interval) < app.stop && app.remaining != Some(0);

        w.send_packet(device, pkt, sim);
        if more {
            sim.schedule_in(interval, AppSend { app: self.app });
        }
    }
}

/// 事件：`sender` 开始发送一帧
#[derive(Debug)]
pub struct FrameTx {
    pub sender: DeviceId,
    pub receiver: DeviceId,
    pub frame: Frame,
    /// 数据帧承载的 IP 包
    pub packet: Option<IpPacket>,
}

impl Event for FrameTx {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let FrameTx {
            sender,
            receiver,
            frame,
            packet,
        } = *self;
        let w = wlan(world);
        let now = sim.now();
        let Some(medium) = w.medium.as_ref() else {
            return;
        };
        let (rate, config) = (medium.rate, medium.config.clone());
        w.notify(Notify::Tx, sender, now, &frame, config.tx_power_dbm);

        let Some(origin) = w.position_of(sender) else {
            return;
        };
        let end = now.saturating_add(rate.tx_time(frame.size_bytes));
        for idx in 0..w.devices.len() {
            let device = DeviceId(idx);
            if device == sender {
                continue;
            }
            let Some(pos) = w.position_of(device) else {
                continue;
            };
            let d = origin.distance(&pos);
            if d > config.detect_range_m {
                continue;
            }
            let ok = d <= config.decode_range_m;
            let at = end.saturating_add(config.propagation_delay(d));
            let packet = (device == receiver).then(|| packet.clone()).flatten();
            trace!(from = %sender, to = %device, ok, distance = d, "调度帧到达");
            sim.schedule(
                at,
                FrameRx {
                    device,
                    frame: frame.clone(),
                    ok,
                    snr_db: snr_margin_db(d, config.decode_range_m),
                    packet,
                },
            );
        }
    }
}

/// 相对解码门限的余量：在解码边界处为 10 dB，随距离四次方衰减。
fn snr_margin_db(distance_m: f64, decode_range_m: f64) -> f64 {
    let d = distance_m.max(1.0);
    10.0 + 40.0 * (decode_range_m.max(1.0) / d).log10()
}

/// 事件：帧到达 `device`
#[derive(Debug)]
pub struct FrameRx {
    pub device: DeviceId,
    pub frame: Frame,
    pub ok: bool,
    pub snr_db: f64,
    /// 仅当 `device` 是目的设备时携带
    pub packet: Option<IpPacket>,
}

impl Event for FrameRx {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let FrameRx {
            device,
            frame,
            ok,
            snr_db,
            packet,
        } = *self;
        let w = wlan(world);
        let now = sim.now();
        if !ok {
            w.notify(Notify::RxError, device, now, &frame, snr_db);
            return;
        }
        w.notify(Notify::RxOk, device, now, &frame, snr_db);
        if let Some(pkt) = packet {
            w.deliver(device, pkt, sim);
        }
    }
}
