//! 无线帧
//!
//! 引擎在设备事件回调中交出的帧。只建模计数器需要区分的 MAC 头部类别。

use super::addr::FiveTuple;
use serde::{Deserialize, Serialize};

/// 控制帧子类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlKind {
    Rts,
    Cts,
    Ack,
}

/// 管理帧子类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManagementKind {
    Beacon,
    ProbeRequest,
    ProbeResponse,
}

/// MAC 头部类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "class", content = "subtype", rename_all = "snake_case")]
pub enum FrameKind {
    Data,
    Control(ControlKind),
    Management(ManagementKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacHeader {
    pub kind: FrameKind,
}

impl MacHeader {
    pub fn data() -> Self {
        Self {
            kind: FrameKind::Data,
        }
    }

    pub fn control(kind: ControlKind) -> Self {
        Self {
            kind: FrameKind::Control(kind),
        }
    }

    pub fn management(kind: ManagementKind) -> Self {
        Self {
            kind: FrameKind::Management(kind),
        }
    }

    pub fn is_data(&self) -> bool {
        matches!(self.kind, FrameKind::Data)
    }
}

/// 一帧：MAC 头部 + 字节数，数据帧额外携带所承载 IP 包的五元组。
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub id: u64,
    pub header: MacHeader,
    pub size_bytes: u32,
    pub tuple: Option<FiveTuple>,
}

impl Frame {
    pub fn is_data(&self) -> bool {
        self.header.is_data()
    }
}
