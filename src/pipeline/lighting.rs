//! Lighting stage: ambient plus Lambertian diffuse from a bounded light set.
use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};

use super::Varyings;
use crate::light::{LightCount, LightRaw};

/// Ambient term added to every lit fragment.
pub const DEFAULT_AMBIENT: Vec3 = Vec3::splat(0.05);

/// Per-fragment shading. One stage serves both count policies; only the
/// [`LightCount`] handed to [`LightingStage::shade`] differs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightingStage {
    pub ambient: Vec3,
}

impl Default for LightingStage {
    fn default() -> Self {
        Self {
            ambient: DEFAULT_AMBIENT,
        }
    }
}

impl LightingStage {
    pub fn new(ambient: Vec3) -> Self {
        Self { ambient }
    }

    /// Shades one fragment.
    ///
    /// Reads at most `count` records from `lights`, never past the slice. The sum is
    /// not clamped and alpha is always 1. A fragment without a normal gets ambient only.
    pub fn shade(&self, input: &Varyings, lights: &[LightRaw], count: LightCount) -> Vec4 {
        let mut accumulated = self.ambient;

        if let Some(normal) = input.world_normal {
            let normal = normal.normalize();
            let position = input.world_position.truncate();
            for light in lights.iter().take(count.get()) {
                accumulated += diffuse(normal, position, light) * light.colour();
            }
        }

        (accumulated * input.base_colour).extend(1.0)
    }
}

/// Lambertian factor `max(0, N . L)` for a unit normal. No attenuation.
pub fn diffuse(normal: Vec3, position: Vec3, light: &LightRaw) -> f32 {
    let light_dir = (light.position() - position).normalize();
    normal.dot(light_dir).max(0.0)
}
