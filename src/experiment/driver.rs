//! 实验驱动
//!
//! 单次实验：校验 -> 拓扑 -> 安装 -> 规划并调度流 -> 订阅计数器 -> 运行 -> 统计。
//! 扫描：每个组合使用全新的引擎实例，组合之间不共享任何状态。

use super::config::{ExperimentConfig, Sweep};
use crate::counters::EventCounterSink;
use crate::engine::{DevicePattern, NetworkEngine};
use crate::error::{EngineError, ExperimentError, FlowResolutionError, SweepError};
use crate::stats::{ExperimentResult, FlowStatsCollector, ResultMeta};
use crate::topo::{PlacementRng, create_topology};
use crate::traffic::generate_flows;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{error, info, warn};

/// 在给定引擎上运行一个参数组合
#[tracing::instrument(skip_all, fields(aps = cfg.ap_count, clients = cfg.client_count, radius = cfg.radius))]
pub fn run_experiment<E: NetworkEngine + ?Sized>(
    engine: &mut E,
    cfg: &ExperimentConfig,
) -> Result<ExperimentResult, ExperimentError> {
    cfg.validate()?;

    let mut rng = PlacementRng::new(cfg.seed);
    let topology = create_topology(&cfg.topology_opts(), &mut rng)?;
    let nodes = topology.nodes();

    let handles = engine.create_nodes(nodes.len())?;
    if handles.len() != nodes.len() {
        return Err(EngineError::Init(format!(
            "requested {} nodes, engine created {}",
            nodes.len(),
            handles.len()
        ))
        .into());
    }
    for node in nodes {
        engine.install_mobility(handles[node.id.0], node.position)?;
    }
    engine.install_network_stack(&handles)?;
    let devices = engine.install_link_layer(&handles, &cfg.effective_channel(), cfg.rate_mode)?;
    let addrs = engine.assign_addresses(&devices, cfg.subnet)?;
    info!(nodes = handles.len(), addresses = addrs.len(), "🏗️  拓扑安装完成");

    let flows = generate_flows(&topology, cfg.direction, cfg.packet_size, cfg.data_rate);
    let mut collector = FlowStatsCollector::new();
    let mut scheduled = 0;
    for flow in &flows {
        let (src, dst) = (handles[flow.src.0], handles[flow.dst.0]);
        match engine.schedule_flow(&flow.with_endpoints(src, dst)) {
            Ok(()) => scheduled += 1,
            Err(source) if source.is_flow_level() => {
                collector.record_failure(FlowResolutionError::NotScheduled { src, dst, source });
            }
            Err(e) => return Err(e.into()),
        }
    }
    info!(planned = flows.len(), scheduled, "流已调度");

    let sink = Rc::new(RefCell::new(EventCounterSink::new()));
    engine.subscribe_device_events(DevicePattern::All, sink.clone());
    engine.run_until(cfg.sim_time);

    collector.collect(&engine.flow_records());
    let counters = sink.borrow().snapshot();
    let result = collector.finish(
        ResultMeta {
            ap_count: cfg.ap_count,
            client_count: cfg.client_count,
            radius: cfg.radius,
            direction: cfg.direction,
            rate_mode: cfg.rate_mode.to_string(),
            scheduled_flows: scheduled,
        },
        counters,
    );
    info!(
        throughput_mbps = result.aggregate_throughput_mbps,
        tx_ok = counters.tx_ok,
        rx_ok = counters.rx_ok,
        rx_error = counters.rx_error,
        "📊 实验完成"
    );
    Ok(result)
}

/// 某个组合失败后是否继续
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SweepErrorPolicy {
    /// 立即中止整个扫描
    #[default]
    Abort,
    /// 记录失败并继续下一个组合
    Continue,
}

#[derive(Debug, Default)]
pub struct SweepOutcome {
    pub results: Vec<ExperimentResult>,
    pub failures: Vec<SweepError>,
}

/// 按顺序运行扫描中的每个组合。
///
/// `make_engine` 为每个组合创建新引擎；`on_result` 在每个组合完成后立即被调用，
/// 用于流式输出报告。
pub fn run_sweep<E, F, R>(
    sweep: &Sweep,
    policy: SweepErrorPolicy,
    mut make_engine: F,
    mut on_result: R,
) -> Result<SweepOutcome, SweepError>
where
    E: NetworkEngine,
    F: FnMut(&ExperimentConfig) -> Result<E, EngineError>,
    R: FnMut(&ExperimentConfig, &ExperimentResult),
{
    let mut outcome = SweepOutcome::default();
    for (idx, cfg) in sweep.combinations.iter().enumerate() {
        info!(combination = idx + 1, total = sweep.len(), params = %cfg, "▶️  运行组合");
        let run = make_engine(cfg)
            .map_err(ExperimentError::from)
            .and_then(|mut engine| run_experiment(&mut engine, cfg));
        match run {
            Ok(result) => {
                on_result(cfg, &result);
                outcome.results.push(result);
            }
            Err(source) => {
                let err = SweepError {
                    params: cfg.to_string(),
                    source,
                };
                match policy {
                    SweepErrorPolicy::Abort => {
                        error!(error = %err, "扫描中止");
                        return Err(err);
                    }
                    SweepErrorPolicy::Continue => {
                        warn!(error = %err, "组合失败，继续");
                        outcome.failures.push(err);
                    }
                }
            }
        }
    }
    Ok(outcome)
}
