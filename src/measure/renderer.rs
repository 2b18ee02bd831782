use bevy::prelude::*;

use super::anchors::{Anchor, AnchorId};
use super::session::MeasurementSession;
use super::visuals::{rebuild_line, MeasurementVisuals};

/// Per-frame bookkeeping, reported at trace level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub lines_rebuilt: usize,
    pub preview_rebuilt: bool,
}

/// Redraws every measurement from live anchor positions once per frame.
///
/// There is no dirty tracking: anchors drift under continuous tracking, so
/// every line is rebuilt every frame.
#[derive(Resource, Debug, Default)]
pub struct MeasurementRenderer {
    frames: u64,
}

impl MeasurementRenderer {
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn on_frame(
        &mut self,
        session: &mut MeasurementSession,
        visuals: &mut impl MeasurementVisuals,
    ) -> FrameStats {
        self.frames += 1;
        let mut stats = FrameStats::default();

        let anchors = &session.anchors;
        for pair in session.completed.iter_mut() {
            let (Some(start), Some(end)) = (position(anchors, pair.start()), position(anchors, pair.end()))
            else {
                continue;
            };
            rebuild_line(visuals, &mut pair.line, start, end);
            visuals.set_label(
                pair.label(),
                &pair.distance().readout().multi_line(),
                Some(start.lerp(end, 0.5)),
            );
            stats.lines_rebuilt += 1;
        }

        stats.preview_rebuilt = session.refresh_preview(visuals);
        stats
    }
}

fn position(anchors: &[Anchor], id: AnchorId) -> Option<Vec3> {
    anchors.iter().find(|a| a.id == id).map(|a| a.position)
}
