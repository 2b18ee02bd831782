use std::collections::HashSet;

use bevy::prelude::*;
use chrono::{DateTime, Utc};

use super::surface::SurfacePoint;
use super::visuals::{MarkerHandle, MarkerRole, MeasurementVisuals};

/// Stable anchor identifier, never reused within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnchorId(pub u64);

impl std::fmt::Display for AnchorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Ticket for an outstanding anchor-persistence request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnchorRequestId(pub u64);

/// A committed point in physical space with its marker.
#[derive(Debug)]
pub struct Anchor {
    pub id: AnchorId,
    pub position: Vec3,
    pub orientation: Quat,
    pub created_at: DateTime<Utc>,
    marker: MarkerHandle,
}

impl Anchor {
    pub fn marker(&self) -> &MarkerHandle {
        &self.marker
    }

    /// Apply a tracking refinement and move the marker along with it.
    pub fn refine(&mut self, transform: Transform, visuals: &mut impl MeasurementVisuals) {
        self.position = transform.translation;
        self.orientation = transform.rotation;
        visuals.place_marker(&self.marker, self.position, self.orientation);
    }

    /// Release the marker together with the anchor.
    pub fn dispose(self, visuals: &mut impl MeasurementVisuals) {
        visuals.dispose_marker(self.marker);
    }
}

/// How a tap should be turned into an anchor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TapRoute {
    /// No valid surface point at tap time.
    Ignore,
    /// Commit the tracked point right away.
    Immediate(SurfacePoint),
    /// Ask the platform to persist the anchor; it arrives later.
    Persist(AnchorRequestId, SurfacePoint),
}

/// Turns surface points into anchors.
#[derive(Resource, Debug, Default)]
pub struct AnchorBinder {
    next_anchor: u64,
    next_request: u64,
    persistence_available: bool,
    pending: HashSet<AnchorRequestId>,
}

impl AnchorBinder {
    pub fn new(persistence_available: bool) -> Self {
        Self {
            persistence_available,
            ..default()
        }
    }

    pub fn pending_requests(&self) -> usize {
        self.pending.len()
    }

    /// Decide which commit pathway a tap takes. Persisted anchors win when
    /// both the service and the hit allow it.
    pub fn route_tap(&mut self, current: Option<&SurfacePoint>) -> TapRoute {
        let Some(point) = current.filter(|p| p.valid) else {
            return TapRoute::Ignore;
        };

        if self.persistence_available && point.supports_anchor {
            let request = AnchorRequestId(self.next_request);
            self.next_request += 1;
            self.pending.insert(request);
            TapRoute::Persist(request, *point)
        } else {
            TapRoute::Immediate(*point)
        }
    }

    /// Consume a pending request. Results nobody is waiting for any more
    /// (for instance after a teardown) are rejected.
    pub fn accept_persisted(&mut self, request: AnchorRequestId) -> bool {
        self.pending.remove(&request)
    }

    /// Commit a tracked point. Invalid points are a silent no-op.
    pub fn commit(
        &mut self,
        point: &SurfacePoint,
        visuals: &mut impl MeasurementVisuals,
    ) -> Option<Anchor> {
        if !point.valid {
            debug!("Ignoring commit of an invalid surface point");
            return None;
        }
        Some(self.bind(point.transform(), visuals))
    }

    /// Commit a platform-persisted anchor; its transform is authoritative.
    pub fn commit_persisted(
        &mut self,
        transform: Transform,
        visuals: &mut impl MeasurementVisuals,
    ) -> Anchor {
        self.bind(transform, visuals)
    }

    /// Forget outstanding requests.
    pub fn reset(&mut self) {
        self.pending.clear();
    }

    fn bind(&mut self, transform: Transform, visuals: &mut impl MeasurementVisuals) -> Anchor {
        let id = AnchorId(self.next_anchor);
        self.next_anchor += 1;

        let marker = visuals.spawn_marker(MarkerRole::Anchor, transform.translation, transform.rotation);
        debug!("Anchor {} bound at {:?}", id, transform.translation);

        Anchor {
            id,
            position: transform.translation,
            orientation: transform.rotation,
            created_at: Utc::now(),
            marker,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measure::testing::RecordingVisuals;

    fn point(position: Vec3, supports_anchor: bool) -> SurfacePoint {
        SurfacePoint {
            position,
            orientation: Quat::IDENTITY,
            valid: true,
            supports_anchor,
        }
    }

    #[test]
    fn commit_places_marker_at_point() {
        let mut visuals = RecordingVisuals::default();
        let mut binder = AnchorBinder::new(false);
        let rotation = Quat::from_rotation_y(1.0);
        let p = SurfacePoint {
            orientation: rotation,
            ..point(Vec3::new(1.0, 0.0, 3.0), false)
        };

        let anchor = binder.commit(&p, &mut visuals).unwrap();

        assert_eq!(anchor.position, p.position);
        assert_eq!(anchor.orientation, rotation);
        assert_eq!(visuals.marker_pose(anchor.marker()), Some((p.position, rotation)));
    }

    #[test]
    fn invalid_point_is_ignored() {
        let mut visuals = RecordingVisuals::default();
        let mut binder = AnchorBinder::new(false);
        let p = SurfacePoint {
            valid: false,
            ..point(Vec3::ZERO, false)
        };
        assert!(binder.commit(&p, &mut visuals).is_none());
        assert_eq!(visuals.live_markers(), 0);
    }

    #[test]
    fn every_commit_yields_a_new_anchor() {
        let mut visuals = RecordingVisuals::default();
        let mut binder = AnchorBinder::new(false);
        let p = point(Vec3::ONE, false);
        let a = binder.commit(&p, &mut visuals).unwrap();
        let b = binder.commit(&p, &mut visuals).unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(visuals.live_markers(), 2);
    }

    #[test]
    fn tap_without_surface_is_ignored() {
        let mut binder = AnchorBinder::new(true);
        assert_eq!(binder.route_tap(None), TapRoute::Ignore);
    }

    #[test]
    fn persisted_pathway_takes_precedence() {
        let mut binder = AnchorBinder::new(true);
        let p = point(Vec3::X, true);
        let TapRoute::Persist(request, _) = binder.route_tap(Some(&p)) else {
            panic!("expected a persistence request");
        };
        assert_eq!(binder.pending_requests(), 1);
        assert!(binder.accept_persisted(request));
        assert!(!binder.accept_persisted(request));
    }

    #[test]
    fn falls_back_to_immediate_when_hit_cannot_anchor() {
        let mut binder = AnchorBinder::new(true);
        let p = point(Vec3::X, false);
        assert_eq!(binder.route_tap(Some(&p)), TapRoute::Immediate(p));
    }

    #[test]
    fn falls_back_to_immediate_without_service() {
        let mut binder = AnchorBinder::new(false);
        let p = point(Vec3::X, true);
        assert_eq!(binder.route_tap(Some(&p)), TapRoute::Immediate(p));
    }

    #[test]
    fn reset_drops_pending_requests() {
        let mut binder = AnchorBinder::new(true);
        let p = point(Vec3::X, true);
        let TapRoute::Persist(request, _) = binder.route_tap(Some(&p)) else {
            panic!("expected a persistence request");
        };
        binder.reset();
        assert!(!binder.accept_persisted(request));
    }

    #[test]
    fn persisted_transform_is_authoritative() {
        let mut visuals = RecordingVisuals::default();
        let mut binder = AnchorBinder::new(true);
        let anchor = binder.commit_persisted(Transform::from_xyz(0.0, 0.0, 4.0), &mut visuals);
        assert_eq!(anchor.position, Vec3::new(0.0, 0.0, 4.0));
    }

    #[test]
    fn refine_moves_marker() {
        let mut visuals = RecordingVisuals::default();
        let mut binder = AnchorBinder::new(false);
        let mut anchor = binder.commit(&point(Vec3::ZERO, false), &mut visuals).unwrap();
        anchor.refine(Transform::from_xyz(0.1, 0.0, 0.0), &mut visuals);
        assert_eq!(anchor.position, Vec3::new(0.1, 0.0, 0.0));
        assert_eq!(
            visuals.marker_pose(anchor.marker()).map(|(p, _)| p),
            Some(Vec3::new(0.1, 0.0, 0.0))
        );
        anchor.dispose(&mut visuals);
        assert_eq!(visuals.live_markers(), 0);
    }
}
