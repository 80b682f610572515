//! 流量模块
//!
//! 流规格类型与按拓扑生成流的规划器。

mod flow;
mod planner;

pub use flow::{CBR_PORT, Direction, ECHO_PORT, FlowKind, FlowSpec, MAX_PACKET_SIZE};
pub use planner::{PROBE_PACKET_SIZE, RATE_STEP_BPS, generate_flows};
