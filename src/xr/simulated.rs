//! Desktop stand-in for an AR device: the cursor ray against a detected
//! horizontal surface replaces the platform hit-test, and a click or touch
//! replaces the select gesture.

use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use bevy_egui::EguiContexts;

use super::{HitTestResult, HitTestResults, SelectInput, XrSessionEnded, XrSupport};
use crate::camera::SceneCamera;
use crate::config::AppConfig;

/// Intersect `ray` with the horizontal surface at `surface_height`.
pub fn cast_onto_surface(ray: Ray3d, surface_height: f32, supports_anchor: bool) -> Option<HitTestResult> {
    let distance = ray.intersect_plane(Vec3::Y * surface_height, InfinitePlane3d::new(Vec3::Y))?;
    Some(HitTestResult {
        transform: Transform::from_translation(ray.get_point(distance)),
        supports_anchor,
    })
}

/// Publish this frame's hit-test candidates. Always writes exactly one
/// message so "no surface" is reported explicitly.
pub fn emit_hit_tests(
    windows: Query<&Window, With<PrimaryWindow>>,
    cameras: Query<(&Camera, &GlobalTransform), With<SceneCamera>>,
    config: Res<AppConfig>,
    support: Res<XrSupport>,
    mut contexts: EguiContexts,
    mut hits: MessageWriter<HitTestResults>,
) {
    let over_ui = contexts
        .ctx_mut()
        .map(|ctx| ctx.is_pointer_over_area())
        .unwrap_or(false);

    let hit = if over_ui {
        None
    } else {
        windows
            .single()
            .ok()
            .and_then(|window| window.cursor_position())
            .zip(cameras.single().ok())
            .and_then(|(cursor, (camera, camera_transform))| {
                camera.viewport_to_world(camera_transform, cursor).ok()
            })
            .and_then(|ray| cast_onto_surface(ray, config.xr.surface_height, support.anchors()))
    };

    hits.write(HitTestResults(hit.into_iter().collect()));
}

/// Left click or a new touch is a select gesture.
pub fn emit_select(
    mouse_button: Res<ButtonInput<MouseButton>>,
    touches: Res<Touches>,
    mut contexts: EguiContexts,
    mut select: MessageWriter<SelectInput>,
) {
    if let Ok(ctx) = contexts.ctx_mut() {
        if ctx.wants_pointer_input() {
            return;
        }
    }

    if mouse_button.just_pressed(MouseButton::Left) || touches.any_just_pressed() {
        select.write(SelectInput);
    }
}

/// `X` ends the session, like leaving immersive mode on a headset.
pub fn end_session_on_key(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut contexts: EguiContexts,
    mut ended: MessageWriter<XrSessionEnded>,
) {
    if let Ok(ctx) = contexts.ctx_mut() {
        if ctx.wants_keyboard_input() {
            return;
        }
    }

    if keyboard.just_pressed(KeyCode::KeyX) {
        info!("XR session ended by user");
        ended.write(XrSessionEnded);
    }
}
