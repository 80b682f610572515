pub mod counters;
pub mod engine;
pub mod error;
pub mod experiment;
pub mod net;
pub mod report;
pub mod sim;
pub mod stats;
pub mod topo;
pub mod traffic;

#[cfg(test)]
mod test;
