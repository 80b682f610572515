mod des_engine;
mod sim_time;
mod support;
