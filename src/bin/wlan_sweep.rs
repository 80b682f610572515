//! 无线参数扫描
//!
//! AP 数 × 客户端数 × 半径 × 速率模式，每个组合运行一次固定时长的仿真并输出一行报告。

use clap::Parser;
use std::io;
use std::process::ExitCode;
use tracing::error;
use wlan_sweep::engine::{ChannelConfig, DesEngine, RateMode};
use wlan_sweep::experiment::{ExperimentConfig, SweepErrorPolicy, SweepSpec, run_sweep};
use wlan_sweep::report::{ReportFormat, write_report};
use wlan_sweep::sim::SimTime;
use wlan_sweep::traffic::Direction;

#[derive(Debug, Parser)]
#[command(name = "wlan-sweep", about = "AP 环形拓扑的上/下行吞吐量参数扫描")]
struct Args {
    /// AP 数量（逗号分隔）
    #[arg(long, value_delimiter = ',', default_value = "1,2")]
    ap_counts: Vec<usize>,
    /// 客户端总数（逗号分隔），必须是 AP 数的整数倍
    #[arg(long, value_delimiter = ',', default_value = "2")]
    client_counts: Vec<usize>,
    /// AP 所在圆的半径（逗号分隔）
    #[arg(long, value_delimiter = ',', default_value = "60")]
    radii: Vec<f64>,
    /// 速率模式（逗号分隔），如 DsssRate5_5Mbps
    #[arg(long, value_delimiter = ',', default_value = "DsssRate5_5Mbps")]
    rate_modes: Vec<RateMode>,
    #[arg(long, value_enum, default_value_t = Direction::Downlink)]
    direction: Direction,
    /// CBR 载荷字节数
    #[arg(long, default_value_t = 1024)]
    packet_size: u32,
    /// CBR 基础码率（bit/s）
    #[arg(long, default_value_t = 5_500_000)]
    data_rate: u64,
    /// 仿真时长（秒）
    #[arg(long, default_value_t = 60)]
    sim_secs: u64,
    #[arg(long, default_value_t = 1)]
    seed: u64,
    /// 开启 RTS/CTS 握手
    #[arg(long)]
    rts_cts: bool,
    /// 可解码距离（米）
    #[arg(long, default_value_t = 250.0)]
    decode_range: f64,
    /// 可检测距离（米）
    #[arg(long, default_value_t = 400.0)]
    detect_range: f64,
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    format: ReportFormat,
    /// 同时输出逐流吞吐量
    #[arg(long)]
    per_flow: bool,
    /// 某个组合失败时继续运行其余组合
    #[arg(long)]
    keep_going: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .init();

    let args = Args::parse();

    let base = ExperimentConfig {
        direction: args.direction,
        packet_size: args.packet_size,
        data_rate: args.data_rate,
        rts_cts: args.rts_cts,
        sim_time: SimTime::from_secs(args.sim_secs),
        seed: args.seed,
        channel: ChannelConfig {
            decode_range_m: args.decode_range,
            detect_range_m: args.detect_range,
            ..ChannelConfig::default()
        },
        ..ExperimentConfig::default()
    };
    let spec = SweepSpec {
        ap_counts: args.ap_counts,
        client_counts: args.client_counts,
        radii: args.radii,
        rate_modes: args.rate_modes,
        base,
    };
    let sweep = match spec.combinations() {
        Ok(sweep) => sweep,
        Err(e) => {
            error!(error = %e, "参数扫描配置无效");
            return ExitCode::FAILURE;
        }
    };

    let policy = if args.keep_going {
        SweepErrorPolicy::Continue
    } else {
        SweepErrorPolicy::Abort
    };
    let (format, per_flow) = (args.format, args.per_flow);
    let mut stdout = io::stdout().lock();
    let outcome = run_sweep(
        &sweep,
        policy,
        |_| Ok(DesEngine::new()),
        |_, result| {
            if let Err(e) = write_report(&mut stdout, result, format, per_flow) {
                error!(error = %e, "写报告失败");
            }
        },
    );

    match outcome {
        Ok(outcome) if outcome.failures.is_empty() => ExitCode::SUCCESS,
        Ok(outcome) => {
            for failure in &outcome.failures {
                eprintln!("failed: {failure}");
            }
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("sweep aborted: {e}");
            ExitCode::FAILURE
        }
    }
}
