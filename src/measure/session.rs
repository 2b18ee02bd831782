use bevy::prelude::*;

use super::anchors::{Anchor, AnchorId};
use super::surface::SurfacePoint;
use super::visuals::{
    clear_line, rebuild_optional_line, LabelHandle, LineHandle, MarkerHandle, MarkerRole,
    MeasurementVisuals,
};
use crate::units::Meters;

/// Pairing state of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No measurement in progress.
    Idle,
    /// One anchor committed, waiting for the second.
    Pairing,
}

/// A measurement with only its start anchor.
#[derive(Debug)]
pub struct OpenPair {
    start: AnchorId,
    label: LabelHandle,
}

impl OpenPair {
    pub fn start(&self) -> AnchorId {
        self.start
    }

    pub fn label(&self) -> &LabelHandle {
        &self.label
    }

    fn close(self, end: AnchorId, line: LineHandle, distance: Meters) -> ClosedPair {
        ClosedPair {
            start: self.start,
            end,
            label: self.label,
            line,
            distance,
        }
    }
}

/// A completed two-anchor measurement.
#[derive(Debug)]
pub struct ClosedPair {
    start: AnchorId,
    end: AnchorId,
    label: LabelHandle,
    pub(super) line: LineHandle,
    distance: Meters,
}

impl ClosedPair {
    pub fn start(&self) -> AnchorId {
        self.start
    }

    pub fn end(&self) -> AnchorId {
        self.end
    }

    /// Distance at the moment the second anchor was committed.
    pub fn distance(&self) -> Meters {
        self.distance
    }

    pub fn label(&self) -> &LabelHandle {
        &self.label
    }

    pub fn line(&self) -> &LineHandle {
        &self.line
    }

    fn dispose(self, visuals: &mut impl MeasurementVisuals) {
        visuals.dispose_line(self.line);
        visuals.dispose_label(self.label);
    }
}

/// Borrowed view over both kinds of pair, in display order.
#[derive(Debug, Clone, Copy)]
pub enum MeasurementPair<'a> {
    Open(&'a OpenPair),
    Closed(&'a ClosedPair),
}

/// Everything the measurement tool has placed in the world.
///
/// Owns the anchors, the completed pairs, at most one open pair, the
/// transient marker and the live preview.
#[derive(Resource, Debug, Default)]
pub struct MeasurementSession {
    pub(super) anchors: Vec<Anchor>,
    pub(super) completed: Vec<ClosedPair>,
    pub(super) open: Option<OpenPair>,
    pub(super) preview: Option<LineHandle>,
    pub(super) surface: Option<SurfacePoint>,
    transient: Option<MarkerHandle>,
    readout: Option<String>,
}

impl MeasurementSession {
    pub fn state(&self) -> SessionState {
        if self.open.is_some() {
            SessionState::Pairing
        } else {
            SessionState::Idle
        }
    }

    pub fn anchors(&self) -> &[Anchor] {
        &self.anchors
    }

    pub fn anchor(&self, id: AnchorId) -> Option<&Anchor> {
        self.anchors.iter().find(|a| a.id == id)
    }

    pub fn completed(&self) -> &[ClosedPair] {
        &self.completed
    }

    pub fn open_pair(&self) -> Option<&OpenPair> {
        self.open.as_ref()
    }

    pub fn pairs(&self) -> impl Iterator<Item = MeasurementPair<'_>> {
        self.completed
            .iter()
            .map(MeasurementPair::Closed)
            .chain(self.open.iter().map(MeasurementPair::Open))
    }

    /// Latest live distance text for the display sink.
    pub fn readout(&self) -> Option<&str> {
        self.readout.as_deref()
    }

    pub fn surface(&self) -> Option<&SurfacePoint> {
        self.surface.as_ref()
    }

    pub fn transient_marker(&self) -> Option<&MarkerHandle> {
        self.transient.as_ref()
    }

    pub fn preview_line(&self) -> Option<&LineHandle> {
        self.preview.as_ref()
    }

    /// Feed a freshly committed anchor into the pairing state machine.
    pub fn on_anchor_committed(&mut self, anchor: Anchor, visuals: &mut impl MeasurementVisuals) {
        let Some(open) = self.open.take() else {
            let label = visuals.spawn_label();
            info!("Measurement started at anchor {}", anchor.id);
            self.open = Some(OpenPair {
                start: anchor.id,
                label,
            });
            self.anchors.push(anchor);
            return;
        };

        let Some(start) = self.anchor(open.start).map(|a| a.position) else {
            // Start anchor vanished underneath us; begin over from this one.
            warn!("Open measurement lost its start anchor {}", open.start);
            visuals.dispose_label(open.label);
            return self.on_anchor_committed(anchor, visuals);
        };

        let end = anchor.position;
        let distance = Meters::between(start, end);
        let text = distance.readout().multi_line();
        let line = visuals.spawn_line(start, end);
        visuals.set_label(&open.label, &text, Some(start.lerp(end, 0.5)));

        info!(
            "Measurement {} closed: anchors {} -> {} = {}",
            self.completed.len() + 1,
            open.start,
            anchor.id,
            distance
        );

        self.completed.push(open.close(anchor.id, line, distance));
        self.anchors.push(anchor);
        clear_line(visuals, &mut self.preview);
        self.readout = Some(text);
    }

    /// Track the live surface point, or its absence.
    pub fn on_surface_update(
        &mut self,
        point: Option<SurfacePoint>,
        visuals: &mut impl MeasurementVisuals,
    ) {
        self.surface = point.filter(|p| p.valid);

        let Some(point) = self.surface else {
            if let Some(marker) = &self.transient {
                visuals.set_marker_visible(marker, false);
            }
            clear_line(visuals, &mut self.preview);
            if let Some(open) = &self.open {
                visuals.set_label(&open.label, "", None);
            }
            self.readout = None;
            return;
        };

        match &self.transient {
            Some(marker) => {
                visuals.place_marker(marker, point.position, point.orientation);
                visuals.set_marker_visible(marker, true);
            }
            None => {
                self.transient = Some(visuals.spawn_marker(
                    MarkerRole::Transient,
                    point.position,
                    point.orientation,
                ));
            }
        }

        self.refresh_preview(visuals);
    }

    /// Rebuild the live line between the open pair's start and the surface
    /// point. Does nothing unless both exist.
    pub(super) fn refresh_preview(&mut self, visuals: &mut impl MeasurementVisuals) -> bool {
        let Self {
            anchors,
            open,
            preview,
            surface,
            readout,
            ..
        } = self;

        let (Some(open), Some(point)) = (open.as_ref(), surface.as_ref()) else {
            return false;
        };
        let Some(start) = anchors.iter().find(|a| a.id == open.start).map(|a| a.position) else {
            return false;
        };

        rebuild_optional_line(visuals, preview, start, point.position);
        let text = Meters::between(start, point.position).readout().multi_line();
        visuals.set_label(&open.label, &text, Some(start.lerp(point.position, 0.5)));
        *readout = Some(text);
        true
    }

    /// Apply a positional refinement from the tracking system.
    pub fn refine_anchor(
        &mut self,
        id: AnchorId,
        transform: Transform,
        visuals: &mut impl MeasurementVisuals,
    ) -> bool {
        match self.anchors.iter_mut().find(|a| a.id == id) {
            Some(anchor) => {
                anchor.refine(transform, visuals);
                true
            }
            None => false,
        }
    }

    /// Abandon the open pair and its start anchor. Returns whether anything
    /// was cancelled.
    pub fn cancel_pairing(&mut self, visuals: &mut impl MeasurementVisuals) -> bool {
        let Some(open) = self.open.take() else {
            return false;
        };
        clear_line(visuals, &mut self.preview);
        self.remove_anchor(open.start, visuals);
        visuals.dispose_label(open.label);
        self.readout = None;
        info!("Measurement in progress cancelled");
        true
    }

    /// Delete the most recent completed measurement and its anchors.
    pub fn remove_last(&mut self, visuals: &mut impl MeasurementVisuals) -> Option<Meters> {
        let pair = self.completed.pop()?;
        let distance = pair.distance;
        self.remove_anchor(pair.start, visuals);
        self.remove_anchor(pair.end, visuals);
        pair.dispose(visuals);
        info!("Removed measurement of {}", distance);
        Some(distance)
    }

    /// Release every visual and forget all state.
    pub fn teardown(&mut self, visuals: &mut impl MeasurementVisuals) {
        let measurements = self.completed.len();
        let anchors = self.anchors.len();

        for pair in self.completed.drain(..) {
            pair.dispose(visuals);
        }
        if let Some(open) = self.open.take() {
            visuals.dispose_label(open.label);
        }
        for anchor in self.anchors.drain(..) {
            anchor.dispose(visuals);
        }
        if let Some(marker) = self.transient.take() {
            visuals.dispose_marker(marker);
        }
        clear_line(visuals, &mut self.preview);
        self.surface = None;
        self.readout = None;

        info!("Measurement session torn down ({} measurements, {} anchors)", measurements, anchors);
    }

    fn remove_anchor(&mut self, id: AnchorId, visuals: &mut impl MeasurementVisuals) {
        if let Some(index) = self.anchors.iter().position(|a| a.id == id) {
            self.anchors.remove(index).dispose(visuals);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measure::anchors::AnchorBinder;
    use crate::measure::testing::RecordingVisuals;

    struct Rig {
        visuals: RecordingVisuals,
        binder: AnchorBinder,
        session: MeasurementSession,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                visuals: RecordingVisuals::default(),
                binder: AnchorBinder::new(false),
                session: MeasurementSession::default(),
            }
        }

        fn surface(&mut self, position: Vec3) -> SurfacePoint {
            let point = SurfacePoint {
                position,
                orientation: Quat::IDENTITY,
                valid: true,
                supports_anchor: false,
            };
            self.session.on_surface_update(Some(point), &mut self.visuals);
            point
        }

        fn lose_surface(&mut self) {
            self.session.on_surface_update(None, &mut self.visuals);
        }

        fn commit_at(&mut self, position: Vec3) {
            let point = self.surface(position);
            let anchor = self.binder.commit(&point, &mut self.visuals).unwrap();
            self.session.on_anchor_committed(anchor, &mut self.visuals);
        }
    }

    #[test]
    fn first_commit_opens_a_pair() {
        let mut rig = Rig::new();
        rig.commit_at(Vec3::ZERO);

        assert_eq!(rig.session.state(), SessionState::Pairing);
        assert!(rig.session.completed().is_empty());
        let open = rig.session.open_pair().unwrap();
        assert_eq!(rig.session.anchor(open.start()).unwrap().position, Vec3::ZERO);
    }

    #[test]
    fn open_label_starts_empty_and_unattached() {
        let mut visuals = RecordingVisuals::default();
        let mut binder = AnchorBinder::new(false);
        let mut session = MeasurementSession::default();
        let point = SurfacePoint {
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            valid: true,
            supports_anchor: false,
        };
        let anchor = binder.commit(&point, &mut visuals).unwrap();
        session.on_anchor_committed(anchor, &mut visuals);

        let label = visuals.label(session.open_pair().unwrap().label()).unwrap();
        assert_eq!(label.text, "");
        assert_eq!(label.position, None);
    }

    #[test]
    fn two_commits_close_one_pair() {
        let mut rig = Rig::new();
        rig.commit_at(Vec3::ZERO);
        rig.commit_at(Vec3::new(3.0, 0.0, 4.0));

        assert_eq!(rig.session.state(), SessionState::Idle);
        assert_eq!(rig.session.completed().len(), 1);
        assert!(rig.session.open_pair().is_none());
        assert_eq!(rig.session.completed()[0].distance(), Meters(5.0));
    }

    #[test]
    fn commit_survey_scenario() {
        let mut rig = Rig::new();
        rig.commit_at(Vec3::ZERO);
        rig.surface(Vec3::new(0.0, 0.0, 2.0));
        rig.commit_at(Vec3::new(0.0, 0.0, 2.0));

        let pair = &rig.session.completed()[0];
        assert_eq!(pair.distance(), Meters(2.0));
        let label = rig.visuals.label(pair.label()).unwrap();
        assert_eq!(label.text, "2m\n6.56ft\n78.74in\n200cm");
        assert_eq!(label.position, Some(Vec3::new(0.0, 0.0, 1.0)));
        assert_eq!(
            rig.visuals.line(pair.line()),
            Some((Vec3::ZERO, Vec3::new(0.0, 0.0, 2.0)))
        );
    }

    #[test]
    fn distance_independent_of_commit_order() {
        let a = Vec3::new(1.0, 0.0, -2.0);
        let b = Vec3::new(-0.5, 0.25, 3.0);

        let mut forward = Rig::new();
        forward.commit_at(a);
        forward.commit_at(b);

        let mut backward = Rig::new();
        backward.commit_at(b);
        backward.commit_at(a);

        assert_eq!(
            forward.session.completed()[0].distance(),
            backward.session.completed()[0].distance()
        );
    }

    #[test]
    fn completed_pairs_keep_insertion_order() {
        let mut rig = Rig::new();
        for i in 1..=3 {
            rig.commit_at(Vec3::ZERO);
            rig.commit_at(Vec3::new(i as f32, 0.0, 0.0));
        }
        let distances: Vec<f64> = rig.session.completed().iter().map(|p| p.distance().0).collect();
        assert_eq!(distances, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn surface_update_previews_open_pair() {
        let mut rig = Rig::new();
        rig.commit_at(Vec3::ZERO);
        rig.surface(Vec3::new(1.0, 0.0, 0.0));

        assert_eq!(rig.session.readout(), Some("1m\n3.28ft\n39.37in\n100cm"));
        let preview = rig.session.preview_line().unwrap();
        assert_eq!(rig.visuals.line(preview), Some((Vec3::ZERO, Vec3::X)));
        assert!(rig.session.completed().is_empty());
    }

    #[test]
    fn preview_is_replaced_not_accumulated() {
        let mut rig = Rig::new();
        rig.commit_at(Vec3::ZERO);
        for x in 1..10 {
            rig.surface(Vec3::new(x as f32, 0.0, 0.0));
        }
        assert_eq!(rig.visuals.live_lines(), 1);
    }

    #[test]
    fn losing_surface_clears_preview_but_keeps_open_pair() {
        let mut rig = Rig::new();
        rig.commit_at(Vec3::ZERO);
        rig.surface(Vec3::X);
        rig.lose_surface();

        assert_eq!(rig.session.state(), SessionState::Pairing);
        assert!(rig.session.preview_line().is_none());
        assert!(rig.session.readout().is_none());
        assert_eq!(rig.visuals.live_lines(), 0);
        let marker = rig.session.transient_marker().unwrap();
        assert!(!rig.visuals.marker(marker).unwrap().visible);
        let label = rig.visuals.label(rig.session.open_pair().unwrap().label()).unwrap();
        assert_eq!(label.text, "");

        rig.surface(Vec3::new(0.0, 0.0, 2.0));
        assert_eq!(rig.session.readout(), Some("2m\n6.56ft\n78.74in\n200cm"));
        assert!(rig.visuals.marker(rig.session.transient_marker().unwrap()).unwrap().visible);
    }

    #[test]
    fn surface_without_open_pair_has_no_preview() {
        let mut rig = Rig::new();
        rig.surface(Vec3::X);
        assert!(rig.session.preview_line().is_none());
        assert!(rig.session.readout().is_none());
        assert_eq!(rig.visuals.live_markers(), 1);
    }

    #[test]
    fn transient_marker_follows_surface() {
        let mut rig = Rig::new();
        rig.surface(Vec3::X);
        rig.surface(Vec3::Z);
        let marker = rig.session.transient_marker().unwrap();
        let recorded = rig.visuals.marker(marker).unwrap();
        assert_eq!(recorded.role, MarkerRole::Transient);
        assert_eq!(recorded.position, Vec3::Z);
    }

    #[test]
    fn refine_unknown_anchor_is_rejected() {
        let mut rig = Rig::new();
        assert!(!rig.session.refine_anchor(AnchorId(42), Transform::IDENTITY, &mut rig.visuals));
    }

    #[test]
    fn cancel_pairing_discards_start_anchor() {
        let mut rig = Rig::new();
        rig.commit_at(Vec3::ZERO);
        rig.surface(Vec3::X);

        assert!(rig.session.cancel_pairing(&mut rig.visuals));
        assert_eq!(rig.session.state(), SessionState::Idle);
        assert!(rig.session.anchors().is_empty());
        assert_eq!(rig.visuals.live_lines(), 0);
        assert_eq!(rig.visuals.live_labels(), 0);
        // Only the transient marker is left.
        assert_eq!(rig.visuals.live_markers(), 1);
        assert!(!rig.session.cancel_pairing(&mut rig.visuals));
    }

    #[test]
    fn remove_last_drops_pair_and_its_anchors() {
        let mut rig = Rig::new();
        rig.commit_at(Vec3::ZERO);
        rig.commit_at(Vec3::X);
        rig.commit_at(Vec3::ZERO);
        rig.commit_at(Vec3::new(2.0, 0.0, 0.0));

        assert_eq!(rig.session.remove_last(&mut rig.visuals), Some(Meters(2.0)));
        assert_eq!(rig.session.completed().len(), 1);
        assert_eq!(rig.session.anchors().len(), 2);
        assert_eq!(rig.visuals.live_lines(), 1);
        assert_eq!(rig.visuals.live_labels(), 1);
    }

    #[test]
    fn teardown_releases_everything() {
        let mut rig = Rig::new();
        rig.commit_at(Vec3::ZERO);
        rig.commit_at(Vec3::X);
        rig.commit_at(Vec3::Z);
        rig.surface(Vec3::ONE);

        rig.session.teardown(&mut rig.visuals);

        assert_eq!(rig.session.state(), SessionState::Idle);
        assert!(rig.session.completed().is_empty());
        assert!(rig.session.anchors().is_empty());
        assert!(rig.session.readout().is_none());
        assert_eq!(rig.visuals.live_markers(), 0);
        assert_eq!(rig.visuals.live_lines(), 0);
        assert_eq!(rig.visuals.live_labels(), 0);
        assert_eq!(rig.visuals.stale_disposals, 0);
    }

    #[test]
    fn pairs_lists_closed_then_open() {
        let mut rig = Rig::new();
        rig.commit_at(Vec3::ZERO);
        rig.commit_at(Vec3::X);
        rig.commit_at(Vec3::Z);

        let kinds: Vec<bool> = rig
            .session
            .pairs()
            .map(|p| matches!(p, MeasurementPair::Closed(_)))
            .collect();
        assert_eq!(kinds, vec![true, false]);
    }
}
