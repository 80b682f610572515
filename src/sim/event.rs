//! 事件 trait
//!
//! 引擎内部调度的一切动作（应用发包、帧到达……）都实现此 trait。

use super::simulator::Simulator;
use super::world::World;

/// 事件：可被调度执行。使用 `self: Box<Self>` 以便事件把自身状态移交给下一次调度。
pub trait Event: 'static {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World);
}
