use bevy::input::mouse::{AccumulatedMouseMotion, AccumulatedMouseScroll};
use bevy::prelude::*;
use bevy_egui::EguiContexts;

use crate::constants;

// =============================================================================
// Components and Resources
// =============================================================================

/// Marker for the camera the hit-test ray is cast from.
#[derive(Component)]
pub struct SceneCamera;

/// Orbit parameters around a fixed target (yaw/pitch in radians).
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct OrbitCamera {
    pub target: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub radius: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            yaw: constants::CAMERA_START_YAW,
            pitch: constants::CAMERA_START_PITCH,
            radius: constants::CAMERA_START_RADIUS,
        }
    }
}

impl OrbitCamera {
    /// Camera transform for the current orbit, looking at the target.
    pub fn transform(&self) -> Transform {
        let offset = Vec3::new(
            self.radius * self.pitch.cos() * self.yaw.sin(),
            self.radius * self.pitch.sin(),
            self.radius * self.pitch.cos() * self.yaw.cos(),
        );
        Transform::from_translation(self.target + offset).looking_at(self.target, Vec3::Y)
    }

    pub fn rotate(&mut self, delta: Vec2) {
        self.yaw -= delta.x * constants::ORBIT_SENSITIVITY;
        self.pitch = (self.pitch + delta.y * constants::ORBIT_SENSITIVITY)
            .clamp(constants::MIN_CAMERA_PITCH, constants::MAX_CAMERA_PITCH);
    }

    pub fn zoom(&mut self, scroll: f32) {
        self.radius = (self.radius * (1.0 - scroll * constants::ZOOM_SENSITIVITY))
            .clamp(constants::MIN_CAMERA_RADIUS, constants::MAX_CAMERA_RADIUS);
    }
}

// =============================================================================
// Systems
// =============================================================================

pub fn setup_camera(mut commands: Commands) {
    let orbit = OrbitCamera::default();
    commands.spawn((
        Name::new("Scene Camera"),
        Camera3d::default(),
        orbit.transform(),
        orbit,
        SceneCamera,
    ));
}

/// Right-drag orbits, the wheel zooms.
pub fn orbit_camera(
    mouse_button: Res<ButtonInput<MouseButton>>,
    motion: Res<AccumulatedMouseMotion>,
    scroll: Res<AccumulatedMouseScroll>,
    mut contexts: EguiContexts,
    mut camera_query: Query<(&mut OrbitCamera, &mut Transform), With<SceneCamera>>,
) {
    if let Ok(ctx) = contexts.ctx_mut() {
        if ctx.wants_pointer_input() {
            return;
        }
    }

    let Ok((mut orbit, mut transform)) = camera_query.single_mut() else {
        return;
    };

    if mouse_button.pressed(MouseButton::Right) && motion.delta != Vec2::ZERO {
        orbit.rotate(motion.delta);
    }
    if scroll.delta.y != 0.0 {
        orbit.zoom(scroll.delta.y);
    }

    if orbit.is_changed() {
        *transform = orbit.transform();
    }
}
