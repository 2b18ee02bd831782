//! AR distance measurement.
//!
//! Surface hits and taps become anchors, anchors pair up into measurements,
//! and every measurement is redrawn each frame from live anchor positions.
//! The core (`surface`, `anchors`, `session`, `renderer`) only talks to the
//! scene through [`MeasurementVisuals`]; the systems below drive it from
//! XR messages.

mod anchors;
mod renderer;
mod scene;
mod session;
mod surface;
mod visuals;

#[cfg(test)]
pub(crate) mod testing;

pub use anchors::*;
pub use renderer::*;
pub use scene::*;
pub use session::*;
pub use surface::*;
pub use visuals::*;

use bevy::prelude::*;

use crate::xr::{
    AnchorPersisted, AnchorPersistence, AnchorRefined, HitTestResults, SelectInput, XrInputSet,
    XrSessionEnded, XrSupport,
};

/// Display sink for the latest live distance.
#[derive(Resource, Default, Debug, Clone, PartialEq)]
pub struct LiveReadout {
    pub text: Option<String>,
}

pub struct MeasurementPlugin;

impl Plugin for MeasurementPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SurfaceTracker>()
            .init_resource::<AnchorBinder>()
            .init_resource::<MeasurementSession>()
            .init_resource::<MeasurementRenderer>()
            .init_resource::<LiveReadout>()
            .add_systems(
                Startup,
                (
                    setup_measurement_assets,
                    init_anchor_binder.after(crate::xr::negotiate_session),
                ),
            )
            .add_systems(
                Update,
                (
                    teardown_on_session_end,
                    track_surface,
                    handle_select,
                    commit_persisted_anchors,
                    apply_anchor_refinements,
                    render_measurements,
                    sync_live_readout,
                    draw_measurement_lines,
                )
                    .chain()
                    .after(XrInputSet)
                    .run_if(resource_exists::<MeasurementAssets>),
            );
    }
}

fn init_anchor_binder(mut commands: Commands, support: Res<XrSupport>) {
    commands.insert_resource(AnchorBinder::new(support.anchors()));
}

/// Feed the latest hit-test candidates of this frame to the tracker and the
/// session.
pub fn track_surface(
    mut results: MessageReader<HitTestResults>,
    mut tracker: ResMut<SurfaceTracker>,
    mut session: ResMut<MeasurementSession>,
    assets: Res<MeasurementAssets>,
    mut commands: Commands,
) {
    let Some(latest) = results.read().last() else {
        return;
    };

    let point = tracker.update(&latest.0);
    let mut visuals = SceneVisuals::new(&mut commands, &assets);
    session.on_surface_update(point, &mut visuals);
}

/// Turn select input into anchors, either right away or through the
/// persistence service.
pub fn handle_select(
    mut selects: MessageReader<SelectInput>,
    tracker: Res<SurfaceTracker>,
    mut binder: ResMut<AnchorBinder>,
    mut session: ResMut<MeasurementSession>,
    persistence: Option<Res<AnchorPersistence>>,
    assets: Res<MeasurementAssets>,
    mut commands: Commands,
) {
    let mut visuals = SceneVisuals::new(&mut commands, &assets);

    for _ in selects.read() {
        let point = match binder.route_tap(tracker.current()) {
            TapRoute::Ignore => {
                debug!("Tap ignored, no surface under the pointer");
                continue;
            }
            TapRoute::Immediate(point) => point,
            TapRoute::Persist(request, point) => {
                let queued = persistence
                    .as_ref()
                    .is_some_and(|service| service.request(request, point.transform()));
                if queued {
                    debug!(
                        "Requested persisted anchor {:?} ({} pending)",
                        request,
                        binder.pending_requests()
                    );
                    continue;
                }
                warn!("Anchor persistence unavailable, committing tap directly");
                binder.accept_persisted(request);
                point
            }
        };

        if let Some(anchor) = binder.commit(&point, &mut visuals) {
            session.on_anchor_committed(anchor, &mut visuals);
        }
    }
}

/// Commit anchors the platform finished persisting.
pub fn commit_persisted_anchors(
    mut persisted: MessageReader<AnchorPersisted>,
    mut binder: ResMut<AnchorBinder>,
    mut session: ResMut<MeasurementSession>,
    assets: Res<MeasurementAssets>,
    mut commands: Commands,
) {
    let mut visuals = SceneVisuals::new(&mut commands, &assets);

    for result in persisted.read() {
        if !binder.accept_persisted(result.request) {
            debug!("Dropping stale persisted anchor {:?}", result.request);
            continue;
        }
        let anchor = binder.commit_persisted(result.transform, &mut visuals);
        session.on_anchor_committed(anchor, &mut visuals);
    }
}

pub fn apply_anchor_refinements(
    mut refined: MessageReader<AnchorRefined>,
    mut session: ResMut<MeasurementSession>,
    assets: Res<MeasurementAssets>,
    mut commands: Commands,
) {
    let mut visuals = SceneVisuals::new(&mut commands, &assets);

    for refinement in refined.read() {
        if !session.refine_anchor(refinement.id, refinement.transform, &mut visuals) {
            debug!("Refinement for unknown anchor {}", refinement.id);
        }
    }
}

/// Discard everything when the XR session ends.
pub fn teardown_on_session_end(
    mut ended: MessageReader<XrSessionEnded>,
    mut tracker: ResMut<SurfaceTracker>,
    mut binder: ResMut<AnchorBinder>,
    mut session: ResMut<MeasurementSession>,
    assets: Res<MeasurementAssets>,
    mut commands: Commands,
) {
    if ended.read().count() == 0 {
        return;
    }

    let mut visuals = SceneVisuals::new(&mut commands, &assets);
    session.teardown(&mut visuals);
    tracker.clear();
    binder.reset();
}

pub fn render_measurements(
    mut renderer: ResMut<MeasurementRenderer>,
    mut session: ResMut<MeasurementSession>,
    assets: Res<MeasurementAssets>,
    mut commands: Commands,
) {
    let mut visuals = SceneVisuals::new(&mut commands, &assets);
    let stats = renderer.on_frame(&mut session, &mut visuals);
    trace!(
        "Frame {}: {} lines rebuilt, preview {}",
        renderer.frames(),
        stats.lines_rebuilt,
        stats.preview_rebuilt
    );
}

pub fn sync_live_readout(session: Res<MeasurementSession>, mut readout: ResMut<LiveReadout>) {
    let text = session.readout();
    if readout.text.as_deref() != text {
        readout.text = text.map(str::to_string);
    }
}
