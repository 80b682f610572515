//! 设备事件订阅
//!
//! 引擎在每次帧发送、成功接收、接收出错时回调观察者。观察者作为显式的
//! trait 对象交给 `NetworkEngine::subscribe_device_events`，没有全局注册表。

use crate::net::{DeviceId, Frame, NodeId};
use crate::sim::SimTime;
use std::cell::RefCell;
use std::rc::Rc;

/// 回调发生的位置与时间
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceContext {
    pub node: NodeId,
    pub device: DeviceId,
    pub at: SimTime,
}

/// 帧级事件观察者。所有方法默认不做任何事。
pub trait DeviceEventObserver {
    /// 设备开始发送一帧
    fn on_tx(&mut self, _ctx: &DeviceContext, _frame: &Frame, _tx_power_dbm: f64) {}

    /// 设备成功解码一帧
    fn on_rx_ok(&mut self, _ctx: &DeviceContext, _frame: &Frame, _snr: f64) {}

    /// 设备检测到一帧但解码失败
    fn on_rx_error(&mut self, _ctx: &DeviceContext, _frame: &Frame, _snr: f64) {}
}

/// 引擎持有的观察者句柄；回调只在事件循环内串行发生。
pub type SharedObserver = Rc<RefCell<dyn DeviceEventObserver>>;

/// 订阅匹配哪些设备
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DevicePattern {
    /// 所有节点的所有设备
    #[default]
    All,
    Node(NodeId),
    Device(DeviceId),
}

impl DevicePattern {
    pub fn matches(&self, node: NodeId, device: DeviceId) -> bool {
        match *self {
            DevicePattern::All => true,
            DevicePattern::Node(n) => n == node,
            DevicePattern::Device(d) => d == device,
        }
    }
}
