use bevy::prelude::*;
use bevy_egui::EguiPlugin;

mod camera;
mod config;
mod export;
mod keyboard;
mod measure;
mod overlay;
mod paths;
mod units;
mod xr;

use config::{AppConfig, ConfigPlugin};
use export::ExportPlugin;
use measure::MeasurementPlugin;
use overlay::OverlayPlugin;
use xr::XrPlugin;

// =============================================================================
// Constants - All magic numbers centralized here
// =============================================================================

mod constants {
    // Orbit camera start pose (radians / meters)
    pub const CAMERA_START_YAW: f32 = 0.6;
    pub const CAMERA_START_PITCH: f32 = 0.5;
    pub const CAMERA_START_RADIUS: f32 = 2.5;

    // Orbit camera input
    pub const ORBIT_SENSITIVITY: f32 = 0.005;
    pub const ZOOM_SENSITIVITY: f32 = 0.1;

    // Keep the camera above the surface and off the zenith
    pub const MIN_CAMERA_PITCH: f32 = 0.05;
    pub const MAX_CAMERA_PITCH: f32 = 1.5;

    // Camera distance bounds
    pub const MIN_CAMERA_RADIUS: f32 = 0.3;
    pub const MAX_CAMERA_RADIUS: f32 = 20.0;

    // Half extent of the visible floor (meters)
    pub const FLOOR_HALF_SIZE: f32 = 2.0;
}

fn main() {
    App::new()
        .add_plugins((
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "AR Measure".to_string(),
                        resolution: (1280, 720).into(),
                        ..default()
                    }),
                    ..default()
                })
                .set(AssetPlugin {
                    file_path: paths::assets_dir().to_string_lossy().into_owned(),
                    ..default()
                }),
            EguiPlugin::default(),
            ConfigPlugin,
            XrPlugin,
            MeasurementPlugin,
            OverlayPlugin,
            ExportPlugin,
        ))
        .add_systems(Startup, (camera::setup_camera, setup_scene))
        .add_systems(Update, camera::orbit_camera)
        .add_systems(
            Update,
            keyboard::handle_keyboard_shortcuts.after(xr::XrInputSet),
        )
        .run();
}

/// Lights, the floor the simulated hit-test lands on, and the model that is
/// being measured.
fn setup_scene(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    config: Res<AppConfig>,
) {
    commands.spawn((
        Name::new("Key Light"),
        DirectionalLight {
            illuminance: 8_000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(2.0, 4.0, 2.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
    commands.spawn((
        Name::new("Fill Light"),
        DirectionalLight {
            illuminance: 2_000.0,
            ..default()
        },
        Transform::from_xyz(-3.0, 2.0, -1.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    commands.spawn((
        Name::new("Floor"),
        Mesh3d(meshes.add(Plane3d::new(
            Vec3::Y,
            Vec2::splat(constants::FLOOR_HALF_SIZE),
        ))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgb(0.35, 0.35, 0.38),
            perceptual_roughness: 0.9,
            ..default()
        })),
        Transform::from_xyz(0.0, config.xr.surface_height, 0.0),
    ));

    let model = asset_server.load(GltfAssetLabel::Scene(0).from_asset(config.model.path.clone()));
    commands.spawn((
        Name::new("Model"),
        SceneRoot(model),
        Transform::from_xyz(0.0, config.xr.surface_height, 0.0)
            .with_scale(Vec3::splat(config.model.scale)),
    ));
    info!("Loading model {}", config.model.path);
}
