use bevy::prelude::*;

use crate::xr::HitTestResult;

/// The live surface point under the hit-test ray for the current frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfacePoint {
    pub position: Vec3,
    pub orientation: Quat,
    pub valid: bool,
    /// Whether the platform can persist an anchor at this hit.
    pub supports_anchor: bool,
}

impl SurfacePoint {
    pub fn from_hit(hit: &HitTestResult) -> Self {
        Self {
            position: hit.transform.translation,
            orientation: hit.transform.rotation,
            valid: true,
            supports_anchor: hit.supports_anchor,
        }
    }

    pub fn transform(&self) -> Transform {
        Transform::from_translation(self.position).with_rotation(self.orientation)
    }
}

/// Keeps the single trackable surface point.
#[derive(Resource, Default, Debug)]
pub struct SurfaceTracker {
    current: Option<SurfacePoint>,
}

impl SurfaceTracker {
    /// Take the best (first) candidate of this frame; everything else,
    /// including earlier frames, is dropped.
    pub fn update(&mut self, hits: &[HitTestResult]) -> Option<SurfacePoint> {
        self.current = hits.first().map(SurfacePoint::from_hit);
        self.current
    }

    pub fn current(&self) -> Option<&SurfacePoint> {
        self.current.as_ref()
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}
