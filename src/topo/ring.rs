//! 环形 AP 拓扑
//!
//! 节点顺序：先是 `ap_count` 个 AP（下标 0..ap_count），再是按 AP 分块排列的客户端。

use super::rng::PlacementRng;
use crate::error::ConfigError;
use crate::net::{NodeId, Position};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use tracing::debug;

/// 所有节点的固定高度
pub const AP_HEIGHT: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", content = "ap", rename_all = "snake_case")]
pub enum NodeRole {
    AccessPoint,
    /// 客户端及其归属 AP
    Client(NodeId),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub role: NodeRole,
    pub position: Position,
}

impl Node {
    pub fn is_ap(&self) -> bool {
        matches!(self.role, NodeRole::AccessPoint)
    }

    /// 客户端的归属 AP；AP 自身返回 `None`
    pub fn home_ap(&self) -> Option<NodeId> {
        match self.role {
            NodeRole::AccessPoint => None,
            NodeRole::Client(ap) => Some(ap),
        }
    }
}

/// 拓扑参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TopologyOpts {
    pub ap_count: usize,
    pub client_count: usize,
    pub radius: f64,
}

impl TopologyOpts {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (aps, clients) = (self.ap_count, self.client_count);
        if aps == 0 {
            return Err(ConfigError::NoAccessPoints);
        }
        if clients < aps {
            return Err(ConfigError::TooFewClients { aps, clients });
        }
        if clients % aps != 0 {
            return Err(ConfigError::UnevenClients { aps, clients });
        }
        if !self.radius.is_finite() || self.radius < 0.0 {
            return Err(ConfigError::InvalidRadius(self.radius));
        }
        Ok(())
    }

    /// 每个 AP 分到的客户端数
    pub fn block_size(&self) -> usize {
        self.client_count / self.ap_count
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topology {
    pub ap_count: usize,
    pub client_count: usize,
    pub radius: f64,
    nodes: Vec<Node>,
}

impl Topology {
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn aps(&self) -> &[Node] {
        &self.nodes[..self.ap_count]
    }

    pub fn clients(&self) -> &[Node] {
        &self.nodes[self.ap_count..]
    }

    /// 第 `k` 个客户端（全局客户端下标，从 0 起）
    pub fn client(&self, k: usize) -> Option<&Node> {
        self.clients().get(k)
    }

    pub fn block_size(&self) -> usize {
        self.client_count / self.ap_count
    }

    /// 第 `k` 个客户端所属的 AP 分块下标
    pub fn block_of(&self, k: usize) -> usize {
        k / self.block_size()
    }
}

/// AP `i` 在圆周上的角度
fn ap_angle(i: usize, ap_count: usize) -> f64 {
    TAU * i as f64 / ap_count as f64
}

/// 构建拓扑
///
/// AP `i` 位于角度 2π·i/ap_count、半径 `radius` 的圆周上；客户端 `k` 归属
/// AP ⌊k / (client_count/ap_count)⌋，在其 AP 位置附近做极坐标随机偏移。
pub fn create_topology(
    opts: &TopologyOpts,
    rng: &mut PlacementRng,
) -> Result<Topology, ConfigError> {
    opts.validate()?;
    let TopologyOpts {
        ap_count,
        client_count,
        radius,
    } = *opts;
    let block = opts.block_size();

    let mut nodes = Vec::with_capacity(ap_count + client_count);
    for i in 0..ap_count {
        let angle = ap_angle(i, ap_count);
        nodes.push(Node {
            id: NodeId(i),
            role: NodeRole::AccessPoint,
            position: Position::new(radius * angle.cos(), radius * angle.sin(), AP_HEIGHT),
        });
    }

    for k in 0..client_count {
        let home = k / block;
        let anchor = nodes[home].position;
        let (offset, theta) = rng.polar_offset();
        let position = Position::new(
            anchor.x + offset * theta.cos(),
            anchor.y + offset * theta.sin(),
            AP_HEIGHT,
        );
        debug!(client = k, home, offset, "摆放客户端");
        nodes.push(Node {
            id: NodeId(ap_count + k),
            role: NodeRole::Client(NodeId(home)),
            position,
        });
    }

    Ok(Topology {
        ap_count,
        client_count,
        radius,
        nodes,
    })
}
