//! 报告输出
//!
//! 每个参数组合一行：文本为 `key=value` 形式，JSON 为一行一个对象。

use crate::stats::{ExperimentResult, FlowStatus};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{self, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

/// 单条流的报告
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowLine {
    pub flow_id: Option<u32>,
    pub src: Option<String>,
    pub dst: Option<String>,
    pub throughput_mbps: f64,
    pub complete: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// 每个组合一行的结构化报告
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportLine {
    pub ap_count: usize,
    pub client_count: usize,
    pub radius: f64,
    pub aggregate_throughput_mbps: f64,
    pub tx_ok: u64,
    pub rx_ok: u64,
    pub rx_error: u64,
    pub incomplete_flows: usize,
    pub direction: String,
    pub rate_mode: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flows: Vec<FlowLine>,
}

impl ReportLine {
    pub fn new(result: &ExperimentResult, per_flow: bool) -> Self {
        let flows = if per_flow {
            result
                .flows
                .iter()
                .map(|f| FlowLine {
                    flow_id: f.flow_id.map(|id| id.0),
                    src: f.tuple.map(|t| t.src.to_string()),
                    dst: f.tuple.map(|t| t.dst.to_string()),
                    throughput_mbps: f.throughput_mbps,
                    complete: f.is_complete(),
                    error: match &f.status {
                        FlowStatus::Complete => None,
                        FlowStatus::Incomplete(e) => Some(e.to_string()),
                    },
                })
                .collect()
        } else {
            Vec::new()
        };
        Self {
            ap_count: result.ap_count,
            client_count: result.client_count,
            radius: result.radius,
            aggregate_throughput_mbps: result.aggregate_throughput_mbps,
            tx_ok: result.counters.tx_ok,
            rx_ok: result.counters.rx_ok,
            rx_error: result.counters.rx_error,
            incomplete_flows: result.incomplete_flows().count(),
            direction: result.direction.to_string(),
            rate_mode: result.rate_mode.clone(),
            flows,
        }
    }
}

impl fmt::Display for FlowLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = self
            .flow_id
            .map_or_else(|| "-".to_string(), |id| id.to_string());
        let src = self.src.as_deref().unwrap_or("?");
        let dst = self.dst.as_deref().unwrap_or("?");
        write!(
            f,
            "flow {id} ({src} -> {dst}) throughput_mbps={:.6}",
            self.throughput_mbps
        )?;
        if let Some(err) = &self.error {
            write!(f, " incomplete=\"{err}\"")?;
        }
        Ok(())
    }
}

impl fmt::Display for ReportLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for flow in &self.flows {
            writeln!(f, "{flow}")?;
        }
        write!(
            f,
            "ap_count={} client_count={} radius={} aggregate_throughput_mbps={:.6} tx_ok={} rx_ok={} rx_error={} incomplete_flows={} direction={} rate_mode={}",
            self.ap_count,
            self.client_count,
            self.radius,
            self.aggregate_throughput_mbps,
            self.tx_ok,
            self.rx_ok,
            self.rx_error,
            self.incomplete_flows,
            self.direction,
            self.rate_mode
        )
    }
}

/// 把一个组合的报告写入 `out`
pub fn write_report<W: Write>(
    out: &mut W,
    result: &ExperimentResult,
    format: ReportFormat,
    per_flow: bool,
) -> io::Result<()> {
    let line = ReportLine::new(result, per_flow);
    match format {
        ReportFormat::Text => writeln!(out, "{line}")?,
        ReportFormat::Json => {
            serde_json::to_writer(&mut *out, &line)?;
            writeln!(out)?;
        }
    }
    out.flush()
}
