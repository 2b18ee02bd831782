use bevy::prelude::*;

/// Which kind of point a marker stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerRole {
    /// Follows the live, uncommitted surface point.
    Transient,
    /// Sits on a committed anchor.
    Anchor,
}

/// Owned handle to a marker in the scene.
///
/// Handles are neither `Clone` nor `Copy`: disposing one
/// consumes it, so each visual is released exactly once.
#[derive(Debug, PartialEq, Eq)]
pub struct MarkerHandle(Entity);

/// Owned handle to a line segment in the scene.
#[derive(Debug, PartialEq, Eq)]
pub struct LineHandle(Entity);

/// Owned handle to a floating text label.
#[derive(Debug, PartialEq, Eq)]
pub struct LabelHandle(Entity);

macro_rules! entity_handle {
    ($name:ident) => {
        impl $name {
            pub fn new(entity: Entity) -> Self {
                Self(entity)
            }

            pub fn entity(&self) -> Entity {
                self.0
            }
        }
    };
}

entity_handle!(MarkerHandle);
entity_handle!(LineHandle);
entity_handle!(LabelHandle);

/// Factory for the scene objects the measurement core creates.
///
/// The core never looks inside what these produce; it only positions and
/// disposes them.
pub trait MeasurementVisuals {
    fn spawn_marker(&mut self, role: MarkerRole, position: Vec3, orientation: Quat) -> MarkerHandle;

    fn place_marker(&mut self, marker: &MarkerHandle, position: Vec3, orientation: Quat);

    fn set_marker_visible(&mut self, marker: &MarkerHandle, visible: bool);

    fn dispose_marker(&mut self, marker: MarkerHandle);

    fn spawn_line(&mut self, from: Vec3, to: Vec3) -> LineHandle;

    /// Best-effort: a stale handle must not panic.
    fn dispose_line(&mut self, line: LineHandle);

    /// Creates an empty label that is not attached anywhere yet.
    fn spawn_label(&mut self) -> LabelHandle;

    /// `position: None` detaches the label from the scene.
    fn set_label(&mut self, label: &LabelHandle, text: &str, position: Option<Vec3>);

    fn dispose_label(&mut self, label: LabelHandle);
}

/// Swap `slot`'s line for a fresh one between `from` and `to`, releasing the
/// old geometry in the same step.
pub fn rebuild_line<V: MeasurementVisuals + ?Sized>(
    visuals: &mut V,
    slot: &mut LineHandle,
    from: Vec3,
    to: Vec3,
) {
    let fresh = visuals.spawn_line(from, to);
    let stale = std::mem::replace(slot, fresh);
    visuals.dispose_line(stale);
}

/// Like [`rebuild_line`] for an optional slot (the live preview).
pub fn rebuild_optional_line<V: MeasurementVisuals + ?Sized>(
    visuals: &mut V,
    slot: &mut Option<LineHandle>,
    from: Vec3,
    to: Vec3,
) {
    match slot {
        Some(line) => rebuild_line(visuals, line, from, to),
        None => *slot = Some(visuals.spawn_line(from, to)),
    }
}

/// Dispose the line in `slot`, if any.
pub fn clear_line<V: MeasurementVisuals + ?Sized>(visuals: &mut V, slot: &mut Option<LineHandle>) {
    if let Some(line) = slot.take() {
        visuals.dispose_line(line);
    }
}
