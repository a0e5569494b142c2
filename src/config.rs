use anyhow::{anyhow, Context, Result};
use glam::Vec3;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::light::{LightSnapshot, MAX_LIGHTS};
use crate::pipeline::{DepthConvention, LightingStage, DEFAULT_AMBIENT};

/// Tunables of the shading pipeline that do not change the algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadingConfig {
    pub ambient: Vec3,
    pub depth: DepthConvention,
    /// Replaces the active count the light set would upload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub light_count: Option<u32>,
}

impl Default for ShadingConfig {
    fn default() -> Self {
        Self {
            ambient: DEFAULT_AMBIENT,
            depth: DepthConvention::Remap,
            light_count: None,
        }
    }
}

impl ShadingConfig {
    pub fn lighting(&self) -> LightingStage {
        LightingStage::new(self.ambient)
    }

    /// Applies the count override, if any.
    pub fn apply_light_count(&self, lights: LightSnapshot) -> LightSnapshot {
        match self.light_count {
            Some(count) => {
                if count as usize > MAX_LIGHTS {
                    warn!("light count {count} exceeds {MAX_LIGHTS}; the lighting stage will clamp it");
                }
                lights.with_active_count(count)
            }
            None => lights,
        }
    }
}

/// Parses `r,g,b` (commas or whitespace) into a vector. Components must be finite.
pub fn parse_triple(value: &str) -> Result<Vec3> {
    let components = value
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(|part| {
            let number = part
                .parse::<f32>()
                .with_context(|| format!("invalid number {part:?}"))?;
            if number.is_finite() {
                Ok(number)
            } else {
                Err(anyhow!("component {part:?} is not finite"))
            }
        })
        .collect::<Result<Vec<f32>>>()?;
    match components.as_slice() {
        [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
        _ => Err(anyhow!(
            "expected three components, found {}",
            components.len()
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_lighting_stage() {
        let config = ShadingConfig::default();
        assert_eq!(config.lighting(), LightingStage::default());
        assert_eq!(config.depth, DepthConvention::Remap);
    }

    #[test]
    fn parse_triple_accepts_commas_and_spaces() {
        assert_eq!(parse_triple("0.1,0.2,0.3").unwrap(), Vec3::new(0.1, 0.2, 0.3));
        assert_eq!(parse_triple("1 2 3").unwrap(), Vec3::new(1.0, 2.0, 3.0));
        assert!(parse_triple("1,2").is_err());
        assert!(parse_triple("1,x,3").is_err());
    }

    #[test]
    fn parse_triple_rejects_non_finite_components() {
        assert!(parse_triple("inf,0,0").is_err());
        assert!(parse_triple("0,NaN,0").is_err());
        assert!(parse_triple("0 0 -infinity").is_err());
    }

    #[test]
    fn light_count_override_is_stored_unclamped() {
        let config = ShadingConfig {
            light_count: Some(15),
            ..ShadingConfig::default()
        };
        let lights = config.apply_light_count(LightSnapshot::empty());
        assert_eq!(lights.active_count(), 15);
        assert_eq!(lights.count().get(), MAX_LIGHTS);
    }
}
