//! 仿真核心模块
//!
//! 事件驱动仿真的最小内核：仿真时间、事件、世界与仿真器。
//! `DesEngine` 在此之上实现共享无线信道。

mod event;
mod scheduled_event;
mod simulator;
mod time;
mod world;

pub use event::Event;
pub use scheduled_event::ScheduledEvent;
pub use simulator::Simulator;
pub use time::SimTime;
pub use world::World;
