//! 运行结束后的流统计

mod collector;
mod record;

pub use collector::{
    ExperimentResult, FlowStatsCollector, FlowStatus, FlowThroughput, ResultMeta, throughput_mbps,
};
pub use record::FlowRecord;
