//! In-memory visual factory for exercising the measurement core without a
//! renderer. Entities come from a private `World` so handles are real ids.

use std::collections::HashMap;

use bevy::prelude::*;

use super::visuals::{LabelHandle, LineHandle, MarkerHandle, MarkerRole, MeasurementVisuals};

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedMarker {
    pub role: MarkerRole,
    pub position: Vec3,
    pub orientation: Quat,
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecordedLabel {
    pub text: String,
    pub position: Option<Vec3>,
}

#[derive(Default)]
pub struct RecordingVisuals {
    world: World,
    markers: HashMap<Entity, RecordedMarker>,
    lines: HashMap<Entity, (Vec3, Vec3)>,
    labels: HashMap<Entity, RecordedLabel>,
    pub lines_spawned: usize,
    pub lines_disposed: usize,
    pub stale_disposals: usize,
}

impl RecordingVisuals {
    pub fn live_markers(&self) -> usize {
        self.markers.len()
    }

    pub fn live_lines(&self) -> usize {
        self.lines.len()
    }

    pub fn live_labels(&self) -> usize {
        self.labels.len()
    }

    pub fn marker_pose(&self, marker: &MarkerHandle) -> Option<(Vec3, Quat)> {
        self.markers
            .get(&marker.entity())
            .map(|m| (m.position, m.orientation))
    }

    pub fn marker(&self, marker: &MarkerHandle) -> Option<&RecordedMarker> {
        self.markers.get(&marker.entity())
    }

    pub fn line(&self, line: &LineHandle) -> Option<(Vec3, Vec3)> {
        self.lines.get(&line.entity()).copied()
    }

    pub fn label(&self, label: &LabelHandle) -> Option<&RecordedLabel> {
        self.labels.get(&label.entity())
    }

    fn next_entity(&mut self) -> Entity {
        self.world.spawn_empty().id()
    }
}

impl MeasurementVisuals for RecordingVisuals {
    fn spawn_marker(&mut self, role: MarkerRole, position: Vec3, orientation: Quat) -> MarkerHandle {
        let entity = self.next_entity();
        self.markers.insert(
            entity,
            RecordedMarker {
                role,
                position,
                orientation,
                visible: true,
            },
        );
        MarkerHandle::new(entity)
    }

    fn place_marker(&mut self, marker: &MarkerHandle, position: Vec3, orientation: Quat) {
        if let Some(m) = self.markers.get_mut(&marker.entity()) {
            m.position = position;
            m.orientation = orientation;
        }
    }

    fn set_marker_visible(&mut self, marker: &MarkerHandle, visible: bool) {
        if let Some(m) = self.markers.get_mut(&marker.entity()) {
            m.visible = visible;
        }
    }

    fn dispose_marker(&mut self, marker: MarkerHandle) {
        self.markers.remove(&marker.entity());
    }

    fn spawn_line(&mut self, from: Vec3, to: Vec3) -> LineHandle {
        let entity = self.next_entity();
        self.lines.insert(entity, (from, to));
        self.lines_spawned += 1;
        LineHandle::new(entity)
    }

    fn dispose_line(&mut self, line: LineHandle) {
        if self.lines.remove(&line.entity()).is_some() {
            self.lines_disposed += 1;
        } else {
            self.stale_disposals += 1;
        }
    }

    fn spawn_label(&mut self) -> LabelHandle {
        let entity = self.next_entity();
        self.labels.insert(entity, RecordedLabel::default());
        LabelHandle::new(entity)
    }

    fn set_label(&mut self, label: &LabelHandle, text: &str, position: Option<Vec3>) {
        if let Some(l) = self.labels.get_mut(&label.entity()) {
            l.text = text.to_string();
            l.position = position;
        }
    }

    fn dispose_label(&mut self, label: LabelHandle) {
        self.labels.remove(&label.entity());
    }
}
