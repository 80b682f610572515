//! 世界 trait
//!
//! 事件执行时能看到的全部可变状态（节点、信道、流量监视器……）。

use std::any::Any;

/// 仿真世界：由引擎实现，事件通过 `as_any_mut` 向下转型取得具体类型。
pub trait World: Any {
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
