//! Math types transferred by archives
//!
//! Positions and velocities use [`glam::Vec3`]. Orientations are kept as
//! plain yaw/pitch/roll angles because that is how they travel on the wire.

use serde::{Deserialize, Serialize};

pub use glam::Vec3 as Vector3;

/// Euler orientation in radians
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Orientation {
    pub yaw: f32,
    pub pitch: f32,
    pub roll: f32,
}

impl Orientation {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(yaw: f32, pitch: f32, roll: f32) -> Self {
        Self { yaw, pitch, roll }
    }

    /// Orientation with only a heading set
    pub const fn from_yaw(yaw: f32) -> Self {
        Self::new(yaw, 0.0, 0.0)
    }
}
