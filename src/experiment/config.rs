//! 实验参数与参数扫描

use crate::engine::{ChannelConfig, RateMode};
use crate::error::ConfigError;
use crate::net::Subnet;
use crate::sim::SimTime;
use crate::topo::TopologyOpts;
use crate::traffic::{Direction, MAX_PACKET_SIZE};
use std::fmt;

/// 单个参数组合。默认值即参考场景：1 个 AP、2 个客户端、半径 60、下行、60 秒。
#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentConfig {
    pub ap_count: usize,
    pub client_count: usize,
    pub radius: f64,
    pub direction: Direction,
    /// CBR 载荷字节数
    pub packet_size: u32,
    /// CBR 基础码率（bit/s）
    pub data_rate: u64,
    pub rate_mode: RateMode,
    pub rts_cts: bool,
    pub sim_time: SimTime,
    /// 客户端摆放的随机种子
    pub seed: u64,
    pub subnet: Subnet,
    pub channel: ChannelConfig,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            ap_count: 1,
            client_count: 2,
            radius: 60.0,
            direction: Direction::Downlink,
            packet_size: 1024,
            data_rate: 5_500_000,
            rate_mode: RateMode::DsssRate5_5Mbps,
            rts_cts: false,
            sim_time: SimTime::from_secs(60),
            seed: 1,
            subnet: Subnet::default(),
            channel: ChannelConfig::default(),
        }
    }
}

impl ExperimentConfig {
    pub fn topology_opts(&self) -> TopologyOpts {
        TopologyOpts {
            ap_count: self.ap_count,
            client_count: self.client_count,
            radius: self.radius,
        }
    }

    /// 在分配任何引擎资源之前调用
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.topology_opts().validate()?;
        if self.packet_size == 0 {
            return Err(ConfigError::ZeroPacketSize);
        }
        if self.packet_size > MAX_PACKET_SIZE {
            return Err(ConfigError::PacketTooLarge {
                size: self.packet_size,
                max: MAX_PACKET_SIZE,
            });
        }
        if self.data_rate == 0 {
            return Err(ConfigError::ZeroDataRate);
        }
        if self.sim_time == SimTime::ZERO {
            return Err(ConfigError::ZeroSimTime);
        }
        Ok(())
    }

    /// 按 RTS/CTS 开关调整后的信道参数
    pub fn effective_channel(&self) -> ChannelConfig {
        self.channel.clone().with_rts_cts(self.rts_cts)
    }
}

impl fmt::Display for ExperimentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ap_count={} client_count={} radius={} rate_mode={} direction={}",
            self.ap_count, self.client_count, self.radius, self.rate_mode, self.direction
        )
    }
}

/// 参数扫描的各个维度；其余参数取自 `base`。
#[derive(Debug, Clone, PartialEq)]
pub struct SweepSpec {
    pub ap_counts: Vec<usize>,
    pub client_counts: Vec<usize>,
    pub radii: Vec<f64>,
    pub rate_modes: Vec<RateMode>,
    pub base: ExperimentConfig,
}

impl Default for SweepSpec {
    fn default() -> Self {
        Self {
            ap_counts: vec![1, 2],
            client_counts: vec![2],
            radii: vec![60.0],
            rate_modes: vec![RateMode::DsssRate5_5Mbps],
            base: ExperimentConfig::default(),
        }
    }
}

impl SweepSpec {
    /// 笛卡尔积，嵌套顺序：AP 数 > 客户端数 > 半径 > 速率模式。
    /// 单个组合是否合法留到运行时检查。
    pub fn combinations(&self) -> Result<Sweep, ConfigError> {
        if self.ap_counts.is_empty() {
            return Err(ConfigError::EmptySweepAxis("ap counts"));
        }
        if self.client_counts.is_empty() {
            return Err(ConfigError::EmptySweepAxis("client counts"));
        }
        if self.radii.is_empty() {
            return Err(ConfigError::EmptySweepAxis("radii"));
        }
        if self.rate_modes.is_empty() {
            return Err(ConfigError::EmptySweepAxis("rate modes"));
        }

        let mut combinations = Vec::with_capacity(
            self.ap_counts.len() * self.client_counts.len() * self.radii.len() * self.rate_modes.len(),
        );
        for &ap_count in &self.ap_counts {
            for &client_count in &self.client_counts {
                for &radius in &self.radii {
                    for &rate_mode in &self.rate_modes {
                        combinations.push(ExperimentConfig {
                            ap_count,
                            client_count,
                            radius,
                            rate_mode,
                            ..self.base.clone()
                        });
                    }
                }
            }
        }
        Ok(Sweep { combinations })
    }
}

/// 一组按顺序执行的参数组合
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sweep {
    pub combinations: Vec<ExperimentConfig>,
}

impl Sweep {
    pub fn new(combinations: Vec<ExperimentConfig>) -> Self {
        Self { combinations }
    }

    pub fn len(&self) -> usize {
        self.combinations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.combinations.is_empty()
    }
}
