//! XR platform boundary.
//!
//! Everything the measurement tool needs from the platform arrives as
//! messages: ranked hit-test candidates each frame, select (tap) input,
//! persisted and refined anchors, and the end of the session. The desktop
//! build feeds these from the mouse in [`simulated`].

mod persistence;
pub mod simulated;

pub use persistence::*;

use bevy::prelude::*;

use crate::config::AppConfig;
use crate::measure::{AnchorId, AnchorRequestId};

/// A candidate real-world surface detected for the current frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitTestResult {
    pub transform: Transform,
    /// The platform can persist an anchor at this hit.
    pub supports_anchor: bool,
}

/// This frame's hit-test candidates, best first. Empty means no surface.
#[derive(Message, Debug, Clone, Default)]
pub struct HitTestResults(pub Vec<HitTestResult>);

/// Tap/select input. Carries nothing; the tracked point is read when handled.
#[derive(Message, Debug, Clone, Copy, Default)]
pub struct SelectInput;

/// The platform finished persisting an anchor requested by a tap.
#[derive(Message, Debug, Clone, Copy)]
pub struct AnchorPersisted {
    pub request: AnchorRequestId,
    pub transform: Transform,
}

/// Tracking refined the pose of an existing anchor.
#[derive(Message, Debug, Clone, Copy)]
pub struct AnchorRefined {
    pub id: AnchorId,
    pub transform: Transform,
}

/// The XR session ended; all anchors and visuals are discarded.
#[derive(Message, Debug, Clone, Copy, Default)]
pub struct XrSessionEnded;

/// What the platform turned out to support.
#[derive(Resource, Debug, Clone, PartialEq, Eq)]
pub enum XrSupport {
    Supported { hit_test: bool, anchors: bool },
    Unsupported(String),
}

impl XrSupport {
    pub fn from_config(config: &AppConfig) -> Self {
        if !config.xr.enabled {
            return XrSupport::Unsupported("XR disabled in configuration".to_string());
        }
        XrSupport::Supported {
            hit_test: config.xr.hit_test,
            anchors: config.xr.hit_test && config.xr.anchors,
        }
    }

    pub fn hit_test(&self) -> bool {
        matches!(self, XrSupport::Supported { hit_test: true, .. })
    }

    pub fn anchors(&self) -> bool {
        matches!(self, XrSupport::Supported { anchors: true, .. })
    }

    /// Short status line for the overlay.
    pub fn status(&self) -> String {
        match self {
            XrSupport::Supported { hit_test: true, anchors: true } => "AR: hit-test + anchors".to_string(),
            XrSupport::Supported { hit_test: true, anchors: false } => "AR: hit-test".to_string(),
            XrSupport::Supported { hit_test: false, .. } => "AR: no surface detection".to_string(),
            XrSupport::Unsupported(_) => "AR not supported".to_string(),
        }
    }
}

/// Run condition for systems that need surface detection.
pub fn hit_test_supported(support: Option<Res<XrSupport>>) -> bool {
    support.is_some_and(|s| s.hit_test())
}

/// Systems that turn platform input into this frame's messages.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct XrInputSet;

pub struct XrPlugin;

impl Plugin for XrPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<HitTestResults>()
            .add_message::<SelectInput>()
            .add_message::<AnchorPersisted>()
            .add_message::<AnchorRefined>()
            .add_message::<XrSessionEnded>()
            .add_systems(Startup, negotiate_session)
            .add_systems(
                Update,
                (
                    simulated::emit_hit_tests.run_if(hit_test_supported),
                    simulated::emit_select.run_if(hit_test_supported),
                    simulated::end_session_on_key,
                    poll_anchor_persistence,
                )
                    .in_set(XrInputSet),
            );
    }
}

/// Decide capabilities from config and start the anchor service if allowed.
pub fn negotiate_session(mut commands: Commands, config: Res<AppConfig>) {
    let support = XrSupport::from_config(&config);

    match &support {
        XrSupport::Unsupported(reason) => {
            warn!("Not supported: {}", reason);
        }
        XrSupport::Supported { hit_test, anchors } => {
            info!("XR session started (hit-test: {}, anchors: {})", hit_test, anchors);
            if !hit_test {
                warn!("Hit-testing unavailable, measurements cannot be placed");
            }
        }
    }

    if support.anchors() {
        commands.insert_resource(AnchorPersistence::spawn(config.xr.anchor_latency_ms));
    }
    commands.insert_resource(support);
}
