use bevy::prelude::*;

use super::visuals::{LabelHandle, LineHandle, MarkerHandle, MarkerRole, MeasurementVisuals};
use crate::config::AppConfig;

/// Marker mesh on an anchor or following the live surface point.
#[derive(Component, Debug)]
pub struct MeasurementMarker {
    pub role: MarkerRole,
}

/// Segment drawn with gizmos every frame while the entity lives.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct MeasurementLine {
    pub from: Vec3,
    pub to: Vec3,
}

/// World-anchored text, projected to the screen by the overlay.
#[derive(Component, Debug, Clone, Default, PartialEq)]
pub struct MeasurementLabel {
    pub text: String,
    pub position: Option<Vec3>,
}

/// Shared meshes and materials for measurement visuals.
#[derive(Resource)]
pub struct MeasurementAssets {
    pub anchor_mesh: Handle<Mesh>,
    pub anchor_material: Handle<StandardMaterial>,
    pub transient_mesh: Handle<Mesh>,
    pub transient_material: Handle<StandardMaterial>,
    pub line_color: Color,
}

/// Startup system that builds the measurement meshes and materials.
pub fn setup_measurement_assets(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    config: Res<AppConfig>,
) {
    let radius = config.measurement.marker_radius;
    let [r, g, b, a] = config.measurement.line_color;

    let anchor_material = materials.add(StandardMaterial {
        base_color: Color::srgb(1.0, 1.0, 1.0),
        emissive: LinearRgba::new(1.0, 1.0, 1.0, 1.0),
        unlit: true,
        ..default()
    });

    let transient_material = materials.add(StandardMaterial {
        base_color: Color::srgba(0.0, 1.0, 0.4, 0.8),
        unlit: true,
        alpha_mode: AlphaMode::Blend,
        ..default()
    });

    commands.insert_resource(MeasurementAssets {
        anchor_mesh: meshes.add(Sphere::new(radius)),
        anchor_material,
        transient_mesh: meshes.add(Torus::new(radius * 1.5, radius * 2.5)),
        transient_material,
        line_color: Color::srgba(r, g, b, a),
    });
}

/// [`MeasurementVisuals`] backed by ECS entities, issued through `Commands`.
pub struct SceneVisuals<'a, 'w, 's> {
    commands: &'a mut Commands<'w, 's>,
    assets: &'a MeasurementAssets,
}

impl<'a, 'w, 's> SceneVisuals<'a, 'w, 's> {
    pub fn new(commands: &'a mut Commands<'w, 's>, assets: &'a MeasurementAssets) -> Self {
        Self { commands, assets }
    }

    fn despawn(&mut self, entity: Entity) {
        // Stale handles are fine; the replacement never depends on this.
        if let Ok(mut ec) = self.commands.get_entity(entity) {
            ec.try_despawn();
        }
    }
}

impl MeasurementVisuals for SceneVisuals<'_, '_, '_> {
    fn spawn_marker(&mut self, role: MarkerRole, position: Vec3, orientation: Quat) -> MarkerHandle {
        let (name, mesh, material) = match role {
            MarkerRole::Anchor => (
                "Anchor Marker",
                self.assets.anchor_mesh.clone(),
                self.assets.anchor_material.clone(),
            ),
            MarkerRole::Transient => (
                "Surface Marker",
                self.assets.transient_mesh.clone(),
                self.assets.transient_material.clone(),
            ),
        };

        let entity = self
            .commands
            .spawn((
                Name::new(name),
                MeasurementMarker { role },
                Mesh3d(mesh),
                MeshMaterial3d(material),
                Transform::from_translation(position).with_rotation(orientation),
                Visibility::Visible,
            ))
            .id();
        MarkerHandle::new(entity)
    }

    fn place_marker(&mut self, marker: &MarkerHandle, position: Vec3, orientation: Quat) {
        if let Ok(mut ec) = self.commands.get_entity(marker.entity()) {
            ec.try_insert(Transform::from_translation(position).with_rotation(orientation));
        }
    }

    fn set_marker_visible(&mut self, marker: &MarkerHandle, visible: bool) {
        let visibility = if visible {
            Visibility::Visible
        } else {
            Visibility::Hidden
        };
        if let Ok(mut ec) = self.commands.get_entity(marker.entity()) {
            ec.try_insert(visibility);
        }
    }

    fn dispose_marker(&mut self, marker: MarkerHandle) {
        self.despawn(marker.entity());
    }

    fn spawn_line(&mut self, from: Vec3, to: Vec3) -> LineHandle {
        let entity = self
            .commands
            .spawn((Name::new("Measurement Line"), MeasurementLine { from, to }))
            .id();
        LineHandle::new(entity)
    }

    fn dispose_line(&mut self, line: LineHandle) {
        self.despawn(line.entity());
    }

    fn spawn_label(&mut self) -> LabelHandle {
        let entity = self
            .commands
            .spawn((Name::new("Measurement Label"), MeasurementLabel::default()))
            .id();
        LabelHandle::new(entity)
    }

    fn set_label(&mut self, label: &LabelHandle, text: &str, position: Option<Vec3>) {
        if let Ok(mut ec) = self.commands.get_entity(label.entity()) {
            ec.try_insert(MeasurementLabel {
                text: text.to_string(),
                position,
            });
        }
    }

    fn dispose_label(&mut self, label: LabelHandle) {
        self.despawn(label.entity());
    }
}

/// Draw every live measurement line.
pub fn draw_measurement_lines(
    mut gizmos: Gizmos,
    assets: Option<Res<MeasurementAssets>>,
    lines: Query<&MeasurementLine>,
) {
    let Some(assets) = assets else {
        return;
    };
    for line in lines.iter() {
        gizmos.line(line.from, line.to, assets.line_color);
    }
}
