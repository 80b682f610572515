//! 拓扑构建
//!
//! AP 均匀分布在圆周上，客户端按连续分块归属各 AP，并在 AP 周围随机抖动。

pub mod ring;
pub mod rng;

pub use ring::{AP_HEIGHT, Node, NodeRole, Topology, TopologyOpts, create_topology};
pub use rng::{MAX_CLIENT_OFFSET, PlacementRng};
