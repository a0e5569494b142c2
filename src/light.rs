//! Light descriptions and the per-frame light block consumed by the lighting stage.
use std::mem;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Capacity of the light block read by the dynamic-count lighting variant.
pub const MAX_LIGHTS: usize = 10;

/// Capacity of the light block read by the fixed-count lighting variant.
pub const FIXED_LIGHTS: usize = 2;

/// Point light placed by the host. Converted to a [`LightRaw`] record before upload.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Light {
    pub position: Vec3,
    pub colour: Vec3,
    /// Vertical field of view of the light frustum, in degrees.
    #[serde(default = "default_fov")]
    pub fov: f32,
    #[serde(default = "default_near")]
    pub near: f32,
    #[serde(default = "default_far")]
    pub far: f32,
}

fn default_fov() -> f32 {
    60.0
}

fn default_near() -> f32 {
    1.0
}

fn default_far() -> f32 {
    20.0
}

impl Light {
    /// Creates a light with the default frustum (60 degrees, depth 1..20).
    pub fn new(position: Vec3, colour: Vec3) -> Self {
        Self {
            position,
            colour,
            fov: default_fov(),
            near: default_near(),
            far: default_far(),
        }
    }

    /// Replaces the frustum used to derive the reserved projection matrix.
    pub fn with_frustum(mut self, fov: f32, near: f32, far: f32) -> Self {
        self.fov = fov;
        self.near = near;
        self.far = far;
        self
    }

    /// Builds the record uploaded to the light block.
    ///
    /// The projection looks from the light towards the origin. Lighting never reads it.
    pub fn to_raw(&self) -> LightRaw {
        let mut up = -Vec3::Z;
        if self.position.cross(up).length_squared() <= f32::EPSILON {
            up = Vec3::Y;
        }
        let view = Mat4::look_at_rh(self.position, Vec3::ZERO, up);
        let projection =
            Mat4::perspective_rh_gl(self.fov.to_radians(), 1.0, self.near, self.far);

        LightRaw {
            projection: (projection * view).to_cols_array_2d(),
            position: self.position.extend(1.0).into(),
            colour: self.colour.extend(1.0).into(),
        }
    }
}

/// Light record as laid out in the uniform block: `{ projection, position, colour }`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LightRaw {
    pub projection: [[f32; 4]; 4],
    pub position: [f32; 4],
    pub colour: [f32; 4],
}

impl LightRaw {
    pub const SIZE: usize = mem::size_of::<LightRaw>();

    pub fn position(&self) -> Vec3 {
        Vec3::new(self.position[0], self.position[1], self.position[2])
    }

    pub fn colour(&self) -> Vec3 {
        Vec3::new(self.colour[0], self.colour[1], self.colour[2])
    }
}

/// Where the lighting stage takes its loop bound from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CountPolicy {
    /// The host uploads an active count next to a block of [`MAX_LIGHTS`] records.
    Dynamic,
    /// No count is uploaded; all [`FIXED_LIGHTS`] records are always read.
    Fixed,
}

impl CountPolicy {
    pub const fn capacity(self) -> usize {
        match self {
            CountPolicy::Dynamic => MAX_LIGHTS,
            CountPolicy::Fixed => FIXED_LIGHTS,
        }
    }
}

/// Effective number of lights the lighting stage iterates over.
///
/// Always within `0..=MAX_LIGHTS`; records at or past this index are never read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightCount(usize);

impl LightCount {
    /// Clamps a host supplied count against the block capacity.
    pub fn clamped(requested: u32, capacity: usize) -> Self {
        let requested = usize::try_from(requested).unwrap_or(usize::MAX);
        Self(requested.min(capacity).min(MAX_LIGHTS))
    }

    /// Loop bound of the fixed-count variant.
    pub const fn fixed() -> Self {
        Self(FIXED_LIGHTS)
    }

    pub const fn get(self) -> usize {
        self.0
    }
}

/// Host-side contract violations when populating a light set.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LightSetError {
    #[error("light set is full ({capacity} lights)")]
    CapacityExceeded { capacity: usize },
    #[error("fixed light set needs exactly {expected} lights, found {found}")]
    Incomplete { expected: usize, found: usize },
}

/// Host-owned, bounded collection of lights for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct LightSet {
    policy: CountPolicy,
    lights: Vec<Light>,
}

impl LightSet {
    pub fn new(policy: CountPolicy) -> Self {
        Self {
            policy,
            lights: Vec::with_capacity(policy.capacity()),
        }
    }

    pub fn dynamic() -> Self {
        Self::new(CountPolicy::Dynamic)
    }

    pub fn fixed() -> Self {
        Self::new(CountPolicy::Fixed)
    }

    /// Collects lights, keeping only the first `capacity` of them.
    pub fn from_lights(policy: CountPolicy, lights: impl IntoIterator<Item = Light>) -> Self {
        let mut lights: Vec<Light> = lights.into_iter().collect();
        let capacity = policy.capacity();
        if lights.len() > capacity {
            warn!(
                "dropping {} light(s) past the block capacity of {capacity}",
                lights.len() - capacity
            );
            lights.truncate(capacity);
        }
        Self { policy, lights }
    }

    pub fn push(&mut self, light: Light) -> Result<(), LightSetError> {
        let capacity = self.capacity();
        if self.lights.len() >= capacity {
            return Err(LightSetError::CapacityExceeded { capacity });
        }
        self.lights.push(light);
        Ok(())
    }

    pub fn policy(&self) -> CountPolicy {
        self.policy
    }

    pub fn capacity(&self) -> usize {
        self.policy.capacity()
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn len(&self) -> usize {
        self.lights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }

    /// Freezes the set into the block layout uploaded for a frame.
    pub fn snapshot(&self) -> Result<LightSnapshot, LightSetError> {
        if self.policy == CountPolicy::Fixed && self.lights.len() != FIXED_LIGHTS {
            return Err(LightSetError::Incomplete {
                expected: FIXED_LIGHTS,
                found: self.lights.len(),
            });
        }
        let raw: Vec<LightRaw> = self.lights.iter().map(Light::to_raw).collect();
        Ok(LightSnapshot::from_raw(
            self.policy,
            &raw,
            self.lights.len() as u32,
        ))
    }
}

/// Immutable light block for one frame: `capacity` records plus the host supplied count.
#[derive(Debug, Clone, PartialEq)]
pub struct LightSnapshot {
    policy: CountPolicy,
    records: Vec<LightRaw>,
    active_count: u32,
}

impl LightSnapshot {
    /// Builds a block from raw records. Unused slots are zeroed, extra records dropped.
    ///
    /// `active_count` is stored as given; it is clamped only when the count is resolved.
    pub fn from_raw(policy: CountPolicy, raw: &[LightRaw], active_count: u32) -> Self {
        let mut records = vec![LightRaw::zeroed(); policy.capacity()];
        for (slot, record) in records.iter_mut().zip(raw) {
            *slot = *record;
        }
        Self {
            policy,
            records,
            active_count,
        }
    }

    /// Dynamic block with no active lights.
    pub fn empty() -> Self {
        Self::from_raw(CountPolicy::Dynamic, &[], 0)
    }

    /// Overrides the host supplied count. Ignored by the fixed policy.
    pub fn with_active_count(mut self, active_count: u32) -> Self {
        self.active_count = active_count;
        self
    }

    pub fn policy(&self) -> CountPolicy {
        self.policy
    }

    /// Every record of the block, including slots past the active count.
    pub fn records(&self) -> &[LightRaw] {
        &self.records
    }

    /// Count as supplied by the host, unclamped.
    pub fn active_count(&self) -> u32 {
        self.active_count
    }

    /// Loop bound for the lighting stage.
    pub fn count(&self) -> LightCount {
        match self.policy {
            CountPolicy::Dynamic => LightCount::clamped(self.active_count, self.records.len()),
            CountPolicy::Fixed => LightCount::fixed(),
        }
    }
}
