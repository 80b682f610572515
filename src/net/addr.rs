//! IPv4 地址分配与五元组

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;

pub const PROTO_UDP: u8 = 17;

/// IPv4 子网（网络地址 + 前缀长度）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subnet {
    pub network: Ipv4Addr,
    pub prefix_len: u8,
}

impl Subnet {
    pub const fn new(network: Ipv4Addr, prefix_len: u8) -> Self {
        Self {
            network,
            prefix_len,
        }
    }

    fn mask(&self) -> u32 {
        match self.prefix_len {
            0 => 0,
            p if p >= 32 => u32::MAX,
            p => u32::MAX << (32 - p),
        }
    }

    /// 可分配的主机地址个数（去掉网络地址与广播地址）
    pub fn host_capacity(&self) -> u64 {
        let host_bits = 32u32.saturating_sub(self.prefix_len as u32);
        (1u64 << host_bits).saturating_sub(2)
    }

    /// 第 `index` 个主机地址（从 0 起，对应 .1）
    pub fn host(&self, index: u64) -> Option<Ipv4Addr> {
        if index >= self.host_capacity() {
            return None;
        }
        let base = u32::from(self.network) & self.mask();
        Some(Ipv4Addr::from(base + index as u32 + 1))
    }
}

impl Default for Subnet {
    /// 10.0.0.0/8
    fn default() -> Self {
        Subnet::new(Ipv4Addr::new(10, 0, 0, 0), 8)
    }
}

impl fmt::Display for Subnet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix_len)
    }
}

/// 流的五元组：源/目的地址、源/目的端口与协议号
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FiveTuple {
    pub src: Ipv4Addr,
    pub dst: Ipv4Addr,
    pub src_port: u16,
    pub dst_port: u16,
    pub protocol: u8,
}

impl FiveTuple {
    pub fn udp(src: Ipv4Addr, src_port: u16, dst: Ipv4Addr, dst_port: u16) -> Self {
        Self {
            src,
            dst,
            src_port,
            dst_port,
            protocol: PROTO_UDP,
        }
    }

    /// 反方向（用于 echo 回包）
    pub fn reversed(&self) -> Self {
        Self {
            src: self.dst,
            dst: self.src,
            src_port: self.dst_port,
            dst_port: self.src_port,
            protocol: self.protocol,
        }
    }
}

impl fmt::Display for FiveTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} -> {}:{}",
            self.src, self.src_port, self.dst, self.dst_port
        )
    }
}
