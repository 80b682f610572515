//! 信道与速率配置
//!
//! 802.11b DSSS 的恒定速率模式，数据帧与控制帧使用同一速率。

use crate::error::ConfigError;
use crate::sim::SimTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// DSSS 长前导 + PLCP 头的持续时间
pub const PLCP_OVERHEAD: SimTime = SimTime(192_000);
/// 开启 RTS/CTS 时的阈值（字节）：几乎所有数据帧都走握手
pub const RTS_THRESHOLD_ON: u32 = 10;
/// 关闭 RTS/CTS 时的阈值：大于任何可能的帧
pub const RTS_THRESHOLD_OFF: u32 = 22_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RateMode {
    DsssRate1Mbps,
    DsssRate2Mbps,
    #[default]
    DsssRate5_5Mbps,
    DsssRate11Mbps,
}

impl RateMode {
    pub const ALL: [RateMode; 4] = [
        RateMode::DsssRate1Mbps,
        RateMode::DsssRate2Mbps,
        RateMode::DsssRate5_5Mbps,
        RateMode::DsssRate11Mbps,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            RateMode::DsssRate1Mbps => "DsssRate1Mbps",
            RateMode::DsssRate2Mbps => "DsssRate2Mbps",
            RateMode::DsssRate5_5Mbps => "DsssRate5_5Mbps",
            RateMode::DsssRate11Mbps => "DsssRate11Mbps",
        }
    }

    pub fn bits_per_sec(&self) -> u64 {
        match self {
            RateMode::DsssRate1Mbps => 1_000_000,
            RateMode::DsssRate2Mbps => 2_000_000,
            RateMode::DsssRate5_5Mbps => 5_500_000,
            RateMode::DsssRate11Mbps => 11_000_000,
        }
    }

    /// 在该速率下发送 `bytes` 字节所占用的信道时间（含 PLCP 开销）
    pub fn tx_time(&self, bytes: u32) -> SimTime {
        let bits = u128::from(bytes) * 8;
        let bps = u128::from(self.bits_per_sec());
        let nanos = (bits * 1_000_000_000 + bps - 1) / bps;
        PLCP_OVERHEAD.saturating_add(SimTime(nanos.min(u64::MAX as u128) as u64))
    }
}

impl fmt::Display for RateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RateMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RateMode::ALL
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ConfigError::UnknownRateMode(s.to_string()))
    }
}

/// 共享无线信道参数
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelConfig {
    /// 可正确解码的最大距离（米）
    pub decode_range_m: f64,
    /// 能检测到帧（但可能解码失败）的最大距离（米）
    pub detect_range_m: f64,
    pub tx_power_dbm: f64,
    /// 帧长超过该值时先做 RTS/CTS 握手
    pub rts_threshold_bytes: u32,
    /// 每个设备发送队列的最大帧数，超出即尾丢弃
    pub max_queue_frames: usize,
    pub propagation_speed_mps: f64,
}

impl ChannelConfig {
    pub fn with_rts_cts(mut self, enabled: bool) -> Self {
        self.rts_threshold_bytes = if enabled {
            RTS_THRESHOLD_ON
        } else {
            RTS_THRESHOLD_OFF
        };
        self
    }

    /// 传播时延
    pub fn propagation_delay(&self, distance_m: f64) -> SimTime {
        if self.propagation_speed_mps <= 0.0 {
            return SimTime::ZERO;
        }
        SimTime::from_secs_f64(distance_m / self.propagation_speed_mps)
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            decode_range_m: 250.0,
            detect_range_m: 400.0,
            tx_power_dbm: 23.0,
            rts_threshold_bytes: RTS_THRESHOLD_OFF,
            max_queue_frames: 500,
            propagation_speed_mps: 299_792_458.0,
        }
    }
}
