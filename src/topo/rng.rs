//! 可播种的随机源
//!
//! 客户端抖动只依赖这里的 `SmallRng`；同一个种子总是得到同样的摆放。

use rand::distributions::{Distribution, Uniform};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::f64::consts::TAU;

/// 客户端相对其归属 AP 的最大径向偏移（不含上界）
pub const MAX_CLIENT_OFFSET: f64 = 120.0;

/// 拓扑摆放用的随机源。
pub struct PlacementRng {
    rng: SmallRng,
    radial: Uniform<f64>,
    angle: Uniform<f64>,
}

impl PlacementRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
            radial: Uniform::new(0.0, MAX_CLIENT_OFFSET),
            angle: Uniform::new(0.0, TAU),
        }
    }

    /// 抽取一个极坐标偏移 `(半径, 角度)`，二者独立且各自均匀分布。
    pub fn polar_offset(&mut self) -> (f64, f64) {
        let r = self.radial.sample(&mut self.rng);
        let theta = self.angle.sample(&mut self.rng);
        (r, theta)
    }
}
