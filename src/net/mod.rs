//! 网络基础类型
//!
//! 标识符、坐标、IPv4 地址与五元组、无线帧以及逐流计数。

mod addr;
mod frame;
mod id;
mod position;
mod stats;

pub use addr::{FiveTuple, PROTO_UDP, Subnet};
pub use frame::{ControlKind, Frame, FrameKind, MacHeader, ManagementKind};
pub use id::{DeviceId, FlowId, NodeId};
pub use position::Position;
pub use stats::FlowCounters;
